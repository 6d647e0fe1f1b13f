//! Darkness field derived from an RGBA8 image
//!
//! Each pixel contributes `1 - luminance / 254` of probability mass, so
//! black pixels attract sites and white pixels repel them.

use crate::error::{Result, StippleError};

/// Luminance weights for the red, green and blue channels
pub const LUMA_WEIGHTS: [f64; 3] = [0.299, 0.587, 0.114];

/// Divisor mapping luminance to darkness
///
/// Slightly below 255; the few brightest levels clamp to zero weight.
pub const LUMINANCE_DIVISOR: f64 = 254.0;

/// Read-only `width x height` grid of per-pixel darkness weights
#[derive(Debug, Clone, PartialEq)]
pub struct DarknessField {
    width: usize,
    height: usize,
    weights: Vec<f64>,
}

/// Darkness of a single RGB pixel, in `[0, 1]`
#[inline]
pub fn darkness(r: u8, g: u8, b: u8) -> f64 {
    let luminance =
        LUMA_WEIGHTS[0] * r as f64 + LUMA_WEIGHTS[1] * g as f64 + LUMA_WEIGHTS[2] * b as f64;
    (1.0 - luminance / LUMINANCE_DIVISOR).max(0.0)
}

impl DarknessField {
    /// Build a field from a row-major RGBA8 buffer
    ///
    /// Extra trailing bytes are ignored; the alpha channel is not used.
    ///
    /// # Errors
    ///
    /// Returns `InvalidImage` if the buffer holds fewer than
    /// `width * height * 4` bytes or the size overflows.
    pub fn from_rgba(width: usize, height: usize, rgba: &[u8]) -> Result<Self> {
        let len = pixel_count(width, height)?;
        let needed = len.checked_mul(4).ok_or_else(|| {
            StippleError::InvalidImage(format!("{}x{} image is too large", width, height))
        })?;
        if rgba.len() < needed {
            return Err(StippleError::InvalidImage(format!(
                "expected at least {} bytes for {}x{} RGBA, got {}",
                needed,
                width,
                height,
                rgba.len()
            )));
        }

        let weights = rgba[..needed]
            .chunks_exact(4)
            .map(|px| darkness(px[0], px[1], px[2]))
            .collect();

        Ok(Self { width, height, weights })
    }

    /// Build a field from precomputed row-major weights
    ///
    /// # Errors
    ///
    /// Returns `InvalidImage` if `weights.len() != width * height`.
    pub fn from_weights(width: usize, height: usize, weights: Vec<f64>) -> Result<Self> {
        let len = pixel_count(width, height)?;
        if weights.len() != len {
            return Err(StippleError::InvalidImage(format!(
                "expected {} weights for {}x{} field, got {}",
                len,
                width,
                height,
                weights.len()
            )));
        }
        Ok(Self { width, height, weights })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// True when the field has no pixels
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Weight of the pixel at `(x, y)`
    ///
    /// Panics if the coordinates are out of range.
    #[inline]
    pub fn weight(&self, x: usize, y: usize) -> f64 {
        self.weights[y * self.width + x]
    }

    /// Weight by row-major pixel index
    #[inline]
    pub fn weight_at(&self, index: usize) -> f64 {
        self.weights[index]
    }

    /// All weights in row-major order
    #[inline]
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Sum of every pixel weight
    pub fn total_weight(&self) -> f64 {
        self.weights.iter().sum()
    }
}

fn pixel_count(width: usize, height: usize) -> Result<usize> {
    width.checked_mul(height).ok_or_else(|| {
        StippleError::InvalidImage(format!("{}x{} image is too large", width, height))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_black_and_white_pixels() {
        assert_relative_eq!(darkness(0, 0, 0), 1.0);
        assert_eq!(darkness(255, 255, 255), 0.0);
        assert_eq!(darkness(254, 255, 255), 0.0);
        assert!(darkness(250, 250, 250) > 0.0);
    }

    #[test]
    fn test_luma_weighting() {
        // Green dominates perceived brightness
        assert!(darkness(0, 255, 0) < darkness(255, 0, 0));
        assert!(darkness(255, 0, 0) < darkness(0, 0, 255));
    }

    #[test]
    fn test_from_rgba() {
        let rgba = [
            0, 0, 0, 255, //
            255, 255, 255, 255, //
            127, 127, 127, 0, //
            0, 0, 0, 0,
        ];
        let field = DarknessField::from_rgba(2, 2, &rgba).unwrap();

        assert_eq!(field.width(), 2);
        assert_eq!(field.height(), 2);
        assert_relative_eq!(field.weight(0, 0), 1.0);
        assert_relative_eq!(field.weight(0, 1), 1.0 - 127.0 / 254.0, epsilon = 1e-12);
        assert_relative_eq!(field.weight_at(3), 1.0);
    }

    #[test]
    fn test_from_rgba_short_buffer() {
        let result = DarknessField::from_rgba(2, 2, &[0; 15]);
        assert!(matches!(result, Err(StippleError::InvalidImage(_))));
    }

    #[test]
    fn test_from_rgba_ignores_trailing_bytes() {
        let field = DarknessField::from_rgba(1, 1, &[0, 0, 0, 255, 9, 9]).unwrap();
        assert_eq!(field.weights().len(), 1);
    }

    #[test]
    fn test_from_weights() {
        let field = DarknessField::from_weights(3, 1, vec![0.0, 0.5, 1.0]).unwrap();
        assert_relative_eq!(field.total_weight(), 1.5);
        assert!(DarknessField::from_weights(3, 1, vec![0.0; 2]).is_err());
    }

    #[test]
    fn test_empty_field() {
        let field = DarknessField::from_rgba(0, 10, &[]).unwrap();
        assert!(field.is_empty());
        assert_eq!(field.total_weight(), 0.0);
    }
}
