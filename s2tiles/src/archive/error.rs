//! Error types for archive reading and writing.

use thiserror::Error;

/// Errors raised by the archive codec.
///
/// A tile that is simply absent is not an error; lookups return `Ok(None)`.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("not a PMTiles or S2PMTiles archive (magic {0:?})")]
    BadMagic([u8; 2]),

    #[error("archive truncated: needed {needed} bytes, got {available}")]
    Truncated { needed: u64, available: u64 },

    #[error("directory at offset {offset} is empty")]
    EmptyDirectory { offset: u64 },

    #[error("maximum directory depth exceeded")]
    DirectoryDepthExceeded,

    #[error("malformed directory: {0}")]
    MalformedDirectory(&'static str),

    #[error("tile {zoom}/{x}/{y} is outside the zoom level bounds")]
    InvalidTileCoordinates { zoom: u8, x: u32, y: u32 },

    #[error("tile id {0} exceeds the maximum zoom")]
    TileIdOutOfRange(u64),

    #[error("invalid face {0}")]
    InvalidFace(u8),

    #[error("invalid JSON metadata: {0}")]
    InvalidMetadata(#[from] serde_json::Error),

    #[error("malformed varint")]
    Varint,

    #[error("decompression failed: {0}")]
    Decompression(#[source] std::io::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decompression task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// Result alias for archive operations.
pub type Result<T> = std::result::Result<T, ArchiveError>;
