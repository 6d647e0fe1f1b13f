//! Weighted Voronoi stippling
//!
//! Approximates a grayscale image with dots by relaxing a point set toward
//! the darkness-weighted centroids of its Voronoi cells (Lloyd's algorithm).
//! Pixel-to-cell assignment uses a greedy walk over a Delaunay
//! triangulation that is rebuilt after every pass.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use voronoi_stipple::*;
//!
//! # let (width, height) = (320, 240);
//! # let rgba = vec![0u8; width * height * 4];
//! let field = DarknessField::from_rgba(width, height, &rgba).unwrap();
//!
//! let config = StippleConfigBuilder::new()
//!     .seed(42)
//!     .point_count(2_000)
//!     .unwrap()
//!     .iterations(60)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let info = stipple(&config, &field).unwrap();
//! println!("Placed {} dots after {} passes", info.len(), info.iteration);
//! ```
//!
//! # Features
//!
//! - `serde`: Enables serialization support for configuration and results

// Modules
pub mod error;
pub mod config;
pub mod density;
pub mod triangulation;
pub mod locator;
pub mod engine;

// Re-export core types for convenience
pub use error::{StippleError, Result};
pub use config::{StippleConfig, StippleConfigBuilder};
pub use density::DarknessField;
pub use triangulation::{Delaunator, Triangulation, TriangulationProvider};
pub use locator::{Bounds, NearestSiteLocator};
pub use engine::{stipple, stipple_with_progress, PassStats, StippleEngine, StippleInfo};

// Re-export glam::DVec2 for convenience
pub use glam::DVec2;
