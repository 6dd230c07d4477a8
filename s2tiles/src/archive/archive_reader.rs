//! Random-access tile reads from PMTiles and S2PMTiles archives.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace};

use super::cache::{Directory, DirectoryCache, DirectoryCacheStats, DEFAULT_DIR_CACHE_CAPACITY};
use super::compression::decompress;
use super::directory::{deserialize_directory, find_tile};
use super::error::{ArchiveError, Result};
use super::header::{ByteRange, Header, S2_ROOT_SIZE};
use super::hilbert::zxy_to_tile_id;
use super::reader::RangeReader;

/// Directory levels followed before an archive is considered malformed.
const MAX_DIRECTORY_DEPTH: usize = 4;

/// Options for [`ArchiveReader`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReaderConfig {
    dir_cache_capacity: usize,
}

impl ReaderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set how many leaf directories are kept decoded.
    pub fn with_dir_cache_capacity(mut self, capacity: usize) -> Self {
        self.dir_cache_capacity = capacity;
        self
    }

    pub fn dir_cache_capacity(&self) -> usize {
        self.dir_cache_capacity
    }
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            dir_cache_capacity: DEFAULT_DIR_CACHE_CAPACITY,
        }
    }
}

/// Where a tile's bytes live in the archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileLocation {
    pub offset: u64,
    pub length: u64,
}

/// Reader for planar and spherical tile archives.
///
/// Opening reads the header, metadata and every root directory; leaf
/// directories are fetched lazily and cached.
pub struct ArchiveReader<R: RangeReader> {
    reader: R,
    header: Header,
    metadata: serde_json::Value,
    roots: Vec<Directory>,
    cache: DirectoryCache,
}

impl<R: RangeReader> ArchiveReader<R> {
    pub async fn open(reader: R) -> Result<Self> {
        Self::open_with_config(reader, ReaderConfig::default()).await
    }

    pub async fn open_with_config(reader: R, config: ReaderConfig) -> Result<Self> {
        let prefix = reader.read_range(0, S2_ROOT_SIZE as u64).await?;
        let header = Header::from_bytes(&prefix)?;
        debug!(
            projection = ?header.projection,
            version = header.spec_version,
            min_zoom = header.min_zoom,
            max_zoom = header.max_zoom,
            "Opened tile archive"
        );

        let metadata = if header.json_metadata.length == 0 {
            serde_json::Value::Object(serde_json::Map::new())
        } else {
            let raw = read_section(&reader, &prefix, header.json_metadata).await?;
            let json = decompress(raw, header.internal_compression)?;
            serde_json::from_slice(&json)?
        };

        let mut roots = Vec::with_capacity(header.projection.num_faces() as usize);
        for face in 0..header.projection.num_faces() {
            let range = header.root_directory_for(face).unwrap_or_default();
            let raw = read_section(&reader, &prefix, range).await?;
            let entries = deserialize_directory(&decompress(raw, header.internal_compression)?)?;
            trace!(face, entries = entries.len(), "Loaded root directory");
            roots.push(Arc::new(entries));
        }

        Ok(Self {
            reader,
            header,
            metadata,
            roots,
            cache: DirectoryCache::new(config.dir_cache_capacity()),
        })
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The archive's JSON metadata; an empty object when none is stored.
    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn cache_stats(&self) -> DirectoryCacheStats {
        self.cache.stats()
    }

    pub async fn has_tile(&self, zoom: u8, x: u32, y: u32) -> Result<bool> {
        Ok(self.get_tile_entry(0, zoom, x, y).await?.is_some())
    }

    /// Decompressed bytes of the planar tile `zoom/x/y`.
    pub async fn get_tile(&self, zoom: u8, x: u32, y: u32) -> Result<Option<Bytes>> {
        self.get_tile_s2(0, zoom, x, y).await
    }

    pub async fn has_tile_s2(&self, face: u8, zoom: u8, x: u32, y: u32) -> Result<bool> {
        Ok(self.get_tile_entry(face, zoom, x, y).await?.is_some())
    }

    /// Decompressed bytes of tile `zoom/x/y` on `face`.
    pub async fn get_tile_s2(&self, face: u8, zoom: u8, x: u32, y: u32) -> Result<Option<Bytes>> {
        let Some(location) = self.get_tile_entry(face, zoom, x, y).await? else {
            return Ok(None);
        };
        let raw = self.read_exact(location.offset, location.length).await?;
        let compression = self.header.tile_compression;
        let data = tokio::task::spawn_blocking(move || decompress(raw, compression)).await??;
        Ok(Some(data))
    }

    /// Resolve the byte range of a tile through the directory tree.
    pub async fn get_tile_entry(&self, face: u8, zoom: u8, x: u32, y: u32) -> Result<Option<TileLocation>> {
        if face > 5 {
            return Err(ArchiveError::InvalidFace(face));
        }
        let tile_id = zxy_to_tile_id(zoom, x, y)?;
        if zoom < self.header.min_zoom || zoom > self.header.max_zoom {
            return Ok(None);
        }
        let (Some(root), Some(leaves)) = (
            self.roots.get(face as usize),
            self.header.leaf_directories_for(face),
        ) else {
            return Ok(None);
        };

        let mut directory = Arc::clone(root);
        for depth in 0..MAX_DIRECTORY_DEPTH {
            let Some(entry) = find_tile(&directory, tile_id).copied() else {
                return Ok(None);
            };
            if entry.run_length > 0 {
                return Ok(Some(TileLocation {
                    offset: self.header.tile_data.offset + entry.offset,
                    length: entry.length,
                }));
            }
            if depth + 1 == MAX_DIRECTORY_DEPTH {
                break;
            }
            directory = self.leaf_directory(leaves.offset + entry.offset, entry.length).await?;
        }
        Err(ArchiveError::DirectoryDepthExceeded)
    }

    async fn leaf_directory(&self, offset: u64, length: u64) -> Result<Directory> {
        self.cache
            .get_or_fetch(offset, move || async move {
                let raw = self.read_exact(offset, length).await?;
                let entries = deserialize_directory(&decompress(raw, self.header.internal_compression)?)?;
                if entries.is_empty() {
                    return Err(ArchiveError::EmptyDirectory { offset });
                }
                trace!(offset, entries = entries.len(), "Loaded leaf directory");
                Ok(Arc::new(entries))
            })
            .await
    }

    async fn read_exact(&self, offset: u64, length: u64) -> Result<Bytes> {
        let data = self.reader.read_range(offset, length).await?;
        if (data.len() as u64) < length {
            return Err(ArchiveError::Truncated {
                needed: length,
                available: data.len() as u64,
            });
        }
        Ok(data)
    }
}

/// Take `range` from the already-read prefix, falling back to a new read.
async fn read_section<R: RangeReader>(reader: &R, prefix: &Bytes, range: ByteRange) -> Result<Bytes> {
    if range.end() <= prefix.len() as u64 {
        return Ok(prefix.slice(range.offset as usize..range.end() as usize));
    }
    let data = reader.read_range(range.offset, range.length).await?;
    if (data.len() as u64) < range.length {
        return Err(ArchiveError::Truncated {
            needed: range.end(),
            available: range.offset + data.len() as u64,
        });
    }
    Ok(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::compression::Compression;
    use crate::archive::directory::{serialize_directory, Entry};
    use crate::archive::header::{Projection, HEADER_SIZE};
    use crate::archive::reader::{FileReader, MemoryReader};
    use crate::archive::writer::ArchiveWriter;
    use std::io::Write;

    /// A planar archive with uncompressed directories and no tile data.
    fn handmade(root: &[u8], leaves: &[u8]) -> Vec<u8> {
        let mut header = Header::new(Projection::Planar);
        header.internal_compression = Compression::None;
        header.root_directory = ByteRange::new(HEADER_SIZE as u64, root.len() as u64);
        header.leaf_directories = ByteRange::new(header.root_directory.end(), leaves.len() as u64);
        header.tile_data = ByteRange::new(header.leaf_directories.end(), 0);

        let mut bytes = header.to_bytes();
        bytes.extend_from_slice(root);
        bytes.extend_from_slice(leaves);
        bytes
    }

    async fn open(bytes: Vec<u8>) -> Result<ArchiveReader<MemoryReader>> {
        ArchiveReader::open(MemoryReader::new(bytes)).await
    }

    #[tokio::test]
    async fn test_self_referencing_leaf_exceeds_depth() {
        // Five bytes: one leaf pointer at offset 0 covering these same bytes.
        let pointer = serialize_directory(&[Entry::new(0, 0, 5, 0)]);
        assert_eq!(pointer.len(), 5);
        let reader = open(handmade(&pointer, &pointer)).await.unwrap();
        assert!(matches!(
            reader.get_tile(0, 0, 0).await,
            Err(ArchiveError::DirectoryDepthExceeded)
        ));
    }

    #[tokio::test]
    async fn test_empty_leaf_directory_is_an_error() {
        let root = serialize_directory(&[Entry::new(0, 0, 1, 0)]);
        let leaf = serialize_directory(&[]);
        let reader = open(handmade(&root, &leaf)).await.unwrap();
        let offset = reader.header().leaf_directories.offset;
        assert!(matches!(
            reader.get_tile(0, 0, 0).await,
            Err(ArchiveError::EmptyDirectory { offset: o }) if o == offset
        ));
    }

    #[tokio::test]
    async fn test_truncated_tile_data() {
        let root = serialize_directory(&[Entry::new(0, 0, 50, 1)]);
        let reader = open(handmade(&root, &[])).await.unwrap();
        assert!(matches!(
            reader.get_tile(0, 0, 0).await,
            Err(ArchiveError::Truncated { needed: 50, available: 0 })
        ));
    }

    #[tokio::test]
    async fn test_bad_magic() {
        let mut bytes = handmade(&serialize_directory(&[]), &[]);
        bytes[..2].copy_from_slice(b"ZZ");
        assert!(matches!(open(bytes).await, Err(ArchiveError::BadMagic(_))));
    }

    #[tokio::test]
    async fn test_missing_metadata_is_empty_object() {
        let reader = open(handmade(&serialize_directory(&[]), &[])).await.unwrap();
        assert_eq!(reader.metadata(), &serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_lookup_gates() {
        let mut writer = ArchiveWriter::new(Projection::Planar);
        writer.add_tile(3, 2, 2, &b"x"[..]).unwrap();
        let reader = open(writer.finish().unwrap()).await.unwrap();

        assert!(reader.get_tile_entry(0, 2, 0, 0).await.unwrap().is_none());
        assert!(matches!(
            reader.get_tile(3, 8, 0).await,
            Err(ArchiveError::InvalidTileCoordinates { .. })
        ));
        assert!(reader.get_tile_s2(1, 3, 2, 2).await.unwrap().is_none());
        assert!(matches!(
            reader.get_tile_s2(6, 3, 2, 2).await,
            Err(ArchiveError::InvalidFace(6))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_lookups_share_leaf_fetch() {
        let mut writer = ArchiveWriter::new(Projection::Planar)
            .with_leaf_size(4)
            .with_max_root_bytes(0);
        for x in 0..4u32 {
            for y in 0..4u32 {
                writer.add_tile(2, x, y, vec![(x * 4 + y) as u8; 8]).unwrap();
            }
        }
        let reader = ArchiveReader::open_with_config(
            MemoryReader::new(writer.finish().unwrap()),
            ReaderConfig::new().with_dir_cache_capacity(8),
        )
        .await
        .unwrap();

        let (a, b) = tokio::join!(reader.get_tile(2, 0, 0), reader.get_tile(2, 0, 0));
        assert_eq!(a.unwrap(), b.unwrap());
        let stats = reader.cache_stats();
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits + stats.coalesced, 1);
    }

    #[tokio::test]
    async fn test_file_backed_archive() {
        let mut writer = ArchiveWriter::new(Projection::S2)
            .with_metadata(serde_json::json!({ "faces": [0, 1, 2, 3, 4, 5] }));
        writer.add_tile_s2(2, 0, 0, 0, &b"face two"[..]).unwrap();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&writer.finish().unwrap()).unwrap();
        file.flush().unwrap();

        let reader = ArchiveReader::open(FileReader::open(file.path()).await.unwrap())
            .await
            .unwrap();
        assert_eq!(reader.metadata()["faces"][5], 5);
        assert_eq!(reader.get_tile_s2(2, 0, 0, 0).await.unwrap().unwrap(), &b"face two"[..]);
        assert!(reader.get_tile_s2(1, 0, 0, 0).await.unwrap().is_none());
    }
}
