//! Error types for stippling

use thiserror::Error;

/// Errors that can occur while building a locator or running the stippler
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StippleError {
    /// Locator bounds with `xmax < xmin` or `ymax < ymin` (or NaN extents)
    #[error("invalid bounds: ({xmin}, {ymin}, {xmax}, {ymax})")]
    InvalidBounds {
        xmin: f64,
        ymin: f64,
        xmax: f64,
        ymax: f64,
    },
    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Pixel buffer does not describe a `width x height` image
    #[error("invalid image: {0}")]
    InvalidImage(String),
    /// An explicit site buffer does not match the expected site count
    #[error("site buffer holds {actual} coordinates, expected {expected}")]
    SiteCountMismatch { expected: usize, actual: usize },
}

/// Result type alias for stippling operations
pub type Result<T> = std::result::Result<T, StippleError>;
