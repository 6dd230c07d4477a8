//! Vector tile pyramid builder.
//!
//! Turns a collection of face-tagged features into a quadtree of vector tiles
//! per cube face (or a single Web Mercator tree for [`PlanarTileId`] keys).
//!
//! # Pipeline
//!
//! 1. **Convert**: project input coordinates into the unit square, rank every
//!    line vertex by Douglas-Peucker importance and compute feature bounds.
//! 2. **Split**: starting from each face root, clip features into the four
//!    child quadrants (with a buffer) using an explicit stack.
//! 3. **Create**: each tile keeps the vertices important enough for its zoom,
//!    bucketed by layer.
//! 4. **Transform**: on first access a tile is quantised to integer
//!    coordinates in `[0, extent]` and its polygon rings are rewound.
//!
//! Only the top of the pyramid is built eagerly. Tiles below
//! `index_maxzoom` are cut from their nearest unsplit ancestor on request.

mod builder;
mod clip;
mod config;
mod error;
mod feature;
mod key;
mod shared;
mod simplify;
mod tile;

pub use builder::{PlanarTilePyramid, S2TilePyramid, TilePyramid};
pub use config::{
    BuilderConfig, IdStrategy, DEFAULT_BUFFER, DEFAULT_EXTENT, DEFAULT_INDEX_MAXZOOM,
    DEFAULT_INDEX_MAX_POINTS, DEFAULT_MAXZOOM, DEFAULT_MINZOOM, DEFAULT_TOLERANCE, MAX_EXTENT,
    MAX_ZOOM_LIMIT,
};
pub use error::BuilderError;
pub use feature::DEFAULT_LAYER;
pub use key::{PlanarTileId, TileKey};
pub use shared::SharedTilePyramid;
pub use tile::{Layer, Tile, TileFeature, TileGeometry, TilePoint, TileState};
