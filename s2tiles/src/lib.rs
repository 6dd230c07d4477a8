//! s2tiles - Spherical cell indexing, vector tile pyramids and tile archives
//!
//! The crate has three parts that are usable on their own:
//!
//! - [`cell`]: 64-bit hierarchical cell ids over the six faces of a cube
//!   projected onto the sphere, with Hilbert ordering, containment and
//!   neighbour queries.
//! - [`pyramid`]: slices face-tagged vector features into a simplified,
//!   clipped tile pyramid, eagerly up to an index zoom and lazily beyond it.
//! - [`archive`]: reads and writes PMTiles v3 and S2PMTiles v1 archives.
//!
//! # Example
//!
//! ```
//! use s2tiles::cell::CellId;
//! use s2tiles::geometry::{Feature, FeatureCollection, Geometry};
//! use s2tiles::pyramid::{BuilderConfig, S2TilePyramid};
//!
//! let features = FeatureCollection::new(vec![Feature::new(0, Geometry::Point([0.25, 0.25]))]);
//! let mut pyramid = S2TilePyramid::new(&features, BuilderConfig::new().with_maxzoom(4))?;
//!
//! let tile = pyramid.get_tile(CellId::from_face(0)).expect("face 0 has data");
//! assert_eq!(tile.feature_count(), 1);
//! # Ok::<(), s2tiles::pyramid::BuilderError>(())
//! ```

pub mod archive;
pub mod cell;
pub mod geometry;
pub mod logging;
pub mod pyramid;

/// Version of the s2tiles library.
///
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
