//! Error types for the tile pyramid builder.

use thiserror::Error;

/// Configuration rejected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BuilderError {
    #[error("maxzoom must be within 0..={max}, got {value}")]
    MaxZoomOutOfRange { value: u8, max: u8 },

    #[error("minzoom {minzoom} is greater than maxzoom {maxzoom}")]
    MinZoomAboveMaxZoom { minzoom: u8, maxzoom: u8 },

    #[error("indexMaxzoom must be within 0..={max}, got {index_maxzoom}")]
    IndexMaxZoomOutOfRange { index_maxzoom: u8, max: u8 },

    #[error("promoteId and generateId cannot both be set")]
    ConflictingIdStrategy,

    #[error("extent must be within 1..={max}, got {extent}")]
    InvalidExtent { extent: u32, max: u32 },

    #[error("tolerance must be a finite, non-negative number, got {0}")]
    InvalidTolerance(f64),

    #[error("buffer {buffer} must be smaller than the extent {extent}")]
    InvalidBuffer { buffer: u32, extent: u32 },

    #[error("feature {index} is on face {face}, expected one of 0..{faces}")]
    InvalidFace { index: usize, face: u8, faces: u8 },
}
