//! PMTiles v3 and S2PMTiles v1 archives.
//!
//! An archive is a header, one root directory per face, JSON metadata, leaf
//! directories and tile data. Directories map Hilbert tile ids to byte ranges
//! in the tile data section:
//!
//! ```text
//! header → root directory (face f) → leaf directory … → tile bytes
//! ```
//!
//! Planar archives have a single face addressed by Web Mercator `z/x/y`.
//! Spherical archives carry six faces, each with its own directory tree but
//! sharing the tile data section.
//!
//! [`ArchiveReader`] resolves tiles over any [`RangeReader`], caching decoded
//! leaf directories. [`ArchiveWriter`] builds archives in memory.

mod archive_reader;
mod cache;
mod compression;
mod directory;
mod error;
mod header;
mod hilbert;
mod reader;
mod varint;
mod writer;

pub use archive_reader::{ArchiveReader, ReaderConfig, TileLocation};
pub use cache::{Directory, DirectoryCache, DirectoryCacheStats, DEFAULT_DIR_CACHE_CAPACITY};
pub use compression::{compress, decompress, Compression, TileType};
pub use directory::{deserialize_directory, find_tile, serialize_directory, Entry};
pub use error::{ArchiveError, Result};
pub use header::{ByteRange, Header, Projection, HEADER_SIZE, ROOT_SIZE, S2_HEADER_SIZE, S2_ROOT_SIZE};
pub use hilbert::{tile_id_to_zxy, zxy_to_tile_id, MAX_TILE_ZOOM};
pub use reader::{FileReader, MemoryReader, RangeReader};
pub use writer::{ArchiveWriter, DEFAULT_LEAF_SIZE};
