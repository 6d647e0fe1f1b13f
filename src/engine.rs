//! Weighted Lloyd relaxation over a darkness field
//!
//! Each pass assigns every pixel to its nearest site, moves each site past
//! the darkness-weighted centroid of its pixels, wiggles it by an annealed
//! jitter and rebuilds the locator.
//!
//! # Algorithm
//!
//! For each pass `k`:
//! 1. Reset the per-site centroid accumulators
//! 2. Scan pixels in raster order, locating each pixel center's site
//! 3. Move site `i` to `p + (c - p) * factor + jitter(k)`
//! 4. Rebuild the Delaunay topology against the moved sites

use std::time::Instant;

use glam::DVec2;
use log::{debug, info};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::config::StippleConfig;
use crate::density::DarknessField;
use crate::error::{Result, StippleError};
use crate::locator::{Bounds, NearestSiteLocator};

/// Final (or intermediate) stippling result
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct StippleInfo {
    /// Interleaved site coordinates `[x0, y0, x1, y1, ...]`
    pub points: Vec<f64>,
    pub width: usize,
    pub height: usize,
    /// Number of relaxation passes performed
    pub iteration: usize,
}

impl StippleInfo {
    /// Number of sites
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len() / 2
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Site positions as vectors
    pub fn positions(&self) -> impl Iterator<Item = DVec2> + '_ {
        self.points.chunks_exact(2).map(|p| DVec2::new(p[0], p[1]))
    }
}

/// Statistics for one relaxation pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassStats {
    /// 0-based pass index
    pub iteration: usize,
    /// Sum of every site's accumulated weight
    pub total_weight: f64,
    /// Sites that received zero weight and only jittered
    pub empty_cells: usize,
    /// Largest distance any site moved, jitter included
    pub max_displacement: f64,
}

/// Stippling state: sites, locator, accumulators and random source
///
/// Each engine owns everything it mutates, so independent runs share nothing.
pub struct StippleEngine<'a> {
    config: StippleConfig,
    field: &'a DarknessField,
    locator: NearestSiteLocator,
    rng: ChaCha8Rng,
    centroids: Vec<DVec2>,
    weights: Vec<f64>,
    passes: usize,
}

impl<'a> StippleEngine<'a> {
    /// Place the initial sites by rejection sampling the darkness field
    ///
    /// Every site draws up to `max_sample_attempts` random pixels and keeps
    /// the first one accepted with probability equal to its darkness, or the
    /// last draw if none was accepted.
    pub fn initialize(config: StippleConfig, field: &'a DarknessField) -> Result<Self> {
        let (width, height) = (field.width(), field.height());
        let count = config.point_count_for(width, height);
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let mut points = vec![0.0; count * 2];
        for site in points.chunks_exact_mut(2) {
            for _ in 0..config.max_sample_attempts {
                let x = rng.gen_range(0..width);
                let y = rng.gen_range(0..height);
                site[0] = x as f64;
                site[1] = y as f64;
                if rng.gen::<f64>() < field.weight(x, y) {
                    break;
                }
            }
        }

        Self::from_parts(config, field, points, rng)
    }

    /// Start from explicit site coordinates instead of sampling
    ///
    /// # Errors
    ///
    /// Returns `SiteCountMismatch` when `points` is not exactly two
    /// coordinates per configured site (or has odd length when no point
    /// count is configured).
    pub fn with_sites(
        config: StippleConfig,
        field: &'a DarknessField,
        points: Vec<f64>,
    ) -> Result<Self> {
        let expected = 2 * config.point_count.unwrap_or(points.len() / 2);
        if points.len() != expected {
            return Err(StippleError::SiteCountMismatch {
                expected,
                actual: points.len(),
            });
        }
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self::from_parts(config, field, points, rng)
    }

    fn from_parts(
        config: StippleConfig,
        field: &'a DarknessField,
        points: Vec<f64>,
        rng: ChaCha8Rng,
    ) -> Result<Self> {
        let bounds = Bounds::new(0.0, 0.0, field.width() as f64, field.height() as f64)?;
        let locator = NearestSiteLocator::build(points, bounds)?;
        let count = locator.len();

        Ok(Self {
            config,
            field,
            locator,
            rng,
            centroids: vec![DVec2::ZERO; count],
            weights: vec![0.0; count],
            passes: 0,
        })
    }

    /// Run one Lloyd step for pass `iteration`
    ///
    /// Pixels are scanned in row-major order and each lookup is hinted with
    /// the previous pixel's site. The locator's amortized O(1) query cost
    /// depends on that spatial coherence; any other scan order stays correct
    /// but degrades toward O(n) per pixel.
    pub fn relax(&mut self, iteration: usize) -> PassStats {
        let start = Instant::now();
        let (width, height) = (self.field.width(), self.field.height());

        self.centroids.fill(DVec2::ZERO);
        self.weights.fill(0.0);

        let mut hint = 0;
        for y in 0..height {
            for x in 0..width {
                let center = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let Some(i) = self.locator.find(center.x, center.y, hint) else {
                    continue;
                };
                hint = i;

                let w = self.field.weight(x, y);
                self.weights[i] += w;
                self.centroids[i] += center * w;
            }
        }

        let amplitude = self.config.jitter_amplitude(iteration);
        let factor = self.config.relaxation_factor;
        let mut empty_cells = 0;
        let mut max_displacement: f64 = 0.0;

        let points = self.locator.points_mut();
        for (i, site) in points.chunks_exact_mut(2).enumerate() {
            let current = DVec2::new(site[0], site[1]);
            let target = if self.weights[i] != 0.0 {
                self.centroids[i] / self.weights[i]
            } else {
                empty_cells += 1;
                current
            };
            let jitter = DVec2::new(
                self.rng.gen_range(-0.5..0.5),
                self.rng.gen_range(-0.5..0.5),
            ) * amplitude;

            let next = current + (target - current) * factor + jitter;
            max_displacement = max_displacement.max(next.distance(current));
            site[0] = next.x;
            site[1] = next.y;
        }

        self.locator.update();
        self.passes += 1;

        let stats = PassStats {
            iteration,
            total_weight: self.weights.iter().sum(),
            empty_cells,
            max_displacement,
        };
        debug!(
            "pass {}: {:?}, weight={:.3}, empty={}, max_disp={:.4}",
            iteration,
            start.elapsed(),
            stats.total_weight,
            empty_cells,
            max_displacement
        );
        stats
    }

    /// Run every configured pass, reporting progress after each one
    ///
    /// `on_progress` receives the current site coordinates and the 0-based
    /// pass index. Passes are strictly sequential.
    pub fn run_with_progress<F>(mut self, mut on_progress: F) -> StippleInfo
    where
        F: FnMut(&[f64], usize),
    {
        let total_start = Instant::now();
        let iterations = self.config.iterations;
        info!(
            "stippling {}x{} field with {} sites, {} passes",
            self.field.width(),
            self.field.height(),
            self.locator.len(),
            iterations
        );

        for k in 0..iterations {
            self.relax(k);
            on_progress(self.locator.points(), k);
        }

        info!(
            "finished {} passes in {:?}",
            self.passes,
            total_start.elapsed()
        );
        self.into_info()
    }

    /// Run every configured pass
    pub fn run(self) -> StippleInfo {
        self.run_with_progress(|_, _| {})
    }

    /// Snapshot the current state as a result
    pub fn info(&self) -> StippleInfo {
        StippleInfo {
            points: self.locator.points().to_vec(),
            width: self.field.width(),
            height: self.field.height(),
            iteration: self.passes,
        }
    }

    fn into_info(self) -> StippleInfo {
        StippleInfo {
            width: self.field.width(),
            height: self.field.height(),
            iteration: self.passes,
            points: self.locator.into_points(),
        }
    }

    /// Current site coordinates
    #[inline]
    pub fn points(&self) -> &[f64] {
        self.locator.points()
    }

    #[inline]
    pub fn locator(&self) -> &NearestSiteLocator {
        &self.locator
    }

    #[inline]
    pub fn config(&self) -> &StippleConfig {
        &self.config
    }

    /// Number of passes completed so far
    #[inline]
    pub fn passes(&self) -> usize {
        self.passes
    }
}

/// Stipple a darkness field in one call
///
/// # Example
///
/// ```
/// use voronoi_stipple::*;
///
/// let field = DarknessField::from_weights(20, 20, vec![1.0; 400]).unwrap();
/// let config = StippleConfigBuilder::new()
///     .seed(1)
///     .point_count(8)
///     .unwrap()
///     .iterations(5)
///     .unwrap()
///     .build()
///     .unwrap();
///
/// let info = stipple(&config, &field).unwrap();
/// assert_eq!(info.len(), 8);
/// assert_eq!(info.iteration, 5);
/// ```
pub fn stipple(config: &StippleConfig, field: &DarknessField) -> Result<StippleInfo> {
    Ok(StippleEngine::initialize(*config, field)?.run())
}

/// Stipple a darkness field, reporting each pass to `on_progress`
pub fn stipple_with_progress<F>(
    config: &StippleConfig,
    field: &DarknessField,
    on_progress: F,
) -> Result<StippleInfo>
where
    F: FnMut(&[f64], usize),
{
    Ok(StippleEngine::initialize(*config, field)?.run_with_progress(on_progress))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StippleConfigBuilder;
    use approx::assert_relative_eq;

    fn config(points: usize, iterations: usize, seed: u64) -> StippleConfig {
        StippleConfigBuilder::new()
            .seed(seed)
            .point_count(points)
            .unwrap()
            .iterations(iterations)
            .unwrap()
            .build()
            .unwrap()
    }

    fn gradient(width: usize, height: usize) -> DarknessField {
        let weights = (0..width * height)
            .map(|i| (i % width) as f64 / (width - 1) as f64)
            .collect();
        DarknessField::from_weights(width, height, weights).unwrap()
    }

    #[test]
    fn test_initialize_places_sites_on_pixels() {
        let field = gradient(40, 30);
        let engine = StippleEngine::initialize(config(100, 1, 42), &field).unwrap();

        assert_eq!(engine.points().len(), 200);
        for p in engine.points().chunks_exact(2) {
            assert!(p[0] >= 0.0 && p[0] < 40.0);
            assert!(p[1] >= 0.0 && p[1] < 30.0);
            assert_eq!(p[0].fract(), 0.0);
            assert_eq!(p[1].fract(), 0.0);
        }
    }

    #[test]
    fn test_initialize_prefers_dark_pixels() {
        // Left half white, right half black
        let weights = (0..100 * 10)
            .map(|i| if i % 100 < 50 { 0.0 } else { 1.0 })
            .collect();
        let field = DarknessField::from_weights(100, 10, weights).unwrap();
        let engine = StippleEngine::initialize(config(200, 0, 9), &field).unwrap();

        // Only sites that exhausted all 60 draws can land on white
        let dark = engine.points().chunks_exact(2).filter(|p| p[0] >= 50.0).count();
        assert_eq!(dark, 200);
    }

    #[test]
    fn test_sampling_gives_up_on_blank_field() {
        let field = DarknessField::from_weights(10, 10, vec![0.0; 100]).unwrap();
        let engine = StippleEngine::initialize(config(20, 0, 5), &field).unwrap();
        assert_eq!(engine.locator().len(), 20);
    }

    #[test]
    fn test_accumulated_weight_partitions_field() {
        let field = gradient(32, 24);
        let mut engine = StippleEngine::initialize(config(40, 5, 3), &field).unwrap();

        for k in 0..5 {
            let stats = engine.relax(k);
            assert_eq!(stats.iteration, k);
            assert_relative_eq!(stats.total_weight, field.total_weight(), epsilon = 1e-9);
        }
        assert_eq!(engine.passes(), 5);
        assert_eq!(engine.locator().generation(), 5);
    }

    #[test]
    fn test_site_without_pixels_stays_put() {
        let field = DarknessField::from_weights(4, 4, vec![1.0; 16]).unwrap();
        let config = StippleConfigBuilder::new()
            .seed(0)
            .jitter_scale(0.0)
            .unwrap()
            .build()
            .unwrap();
        // Site 2 is far outside the field, so no pixel is nearest to it
        let sites = vec![1.0, 1.0, 3.0, 3.0, 500.0, -400.0];
        let mut engine = StippleEngine::with_sites(config, &field, sites).unwrap();

        let stats = engine.relax(0);
        assert_eq!(stats.empty_cells, 1);
        assert_eq!(&engine.points()[4..6], &[500.0, -400.0]);
    }

    #[test]
    fn test_with_sites_checks_length() {
        let field = gradient(8, 8);
        let result = StippleEngine::with_sites(config(3, 1, 0), &field, vec![1.0; 4]);
        assert!(matches!(
            result,
            Err(StippleError::SiteCountMismatch { expected: 6, actual: 4 })
        ));

        let open = StippleConfigBuilder::new().seed(0).build().unwrap();
        assert!(StippleEngine::with_sites(open, &field, vec![1.0; 5]).is_err());
    }

    #[test]
    fn test_run_reports_every_pass() {
        let field = gradient(20, 20);
        let mut seen = Vec::new();
        let info = stipple_with_progress(&config(10, 7, 11), &field, |points, k| {
            assert_eq!(points.len(), 20);
            seen.push(k);
        })
        .unwrap();

        assert_eq!(seen, (0..7).collect::<Vec<_>>());
        assert_eq!(info.iteration, 7);
        assert_eq!(info.width, 20);
        assert_eq!(info.height, 20);
        assert_eq!(info.positions().count(), 10);
    }

    #[test]
    fn test_progress_does_not_change_result() {
        let field = gradient(24, 16);
        let plain = stipple(&config(15, 6, 77), &field).unwrap();
        let watched = stipple_with_progress(&config(15, 6, 77), &field, |_, _| {}).unwrap();
        assert_eq!(plain, watched);
    }

    #[test]
    fn test_same_seed_is_deterministic() {
        let field = gradient(30, 30);
        let a = stipple(&config(25, 4, 1234), &field).unwrap();
        let b = stipple(&config(25, 4, 1234), &field).unwrap();
        let c = stipple(&config(25, 4, 4321), &field).unwrap();

        assert_eq!(a, b);
        assert_ne!(a.points, c.points);
    }

    #[test]
    fn test_zero_iterations_returns_initial_sites() {
        let field = gradient(16, 16);
        let engine = StippleEngine::initialize(config(12, 0, 8), &field).unwrap();
        let initial = engine.info();
        let info = engine.run();

        assert_eq!(info.iteration, 0);
        assert_eq!(info.points, initial.points);
    }

    #[test]
    fn test_empty_field() {
        let field = DarknessField::from_weights(0, 0, Vec::new()).unwrap();
        let default = StippleConfigBuilder::new()
            .seed(1)
            .iterations(3)
            .unwrap()
            .build()
            .unwrap();
        let info = stipple(&default, &field).unwrap();

        assert!(info.is_empty());
        assert_eq!(info.iteration, 3);
    }
}
