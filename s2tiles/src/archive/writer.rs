//! In-memory archive builder.
//!
//! Tiles are collected per face, then [`ArchiveWriter::finish`] lays the
//! archive out as header, root directories, metadata, leaf directories and
//! tile data. Identical blobs are stored once and consecutive tile ids that
//! share a blob collapse into one run-length entry.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use tracing::{debug, trace};

use super::compression::{compress, Compression, TileType};
use super::directory::{serialize_directory, Entry};
use super::error::{ArchiveError, Result};
use super::header::{ByteRange, Header, Projection, HEADER_SIZE, ROOT_SIZE, S2_HEADER_SIZE, S2_ROOT_SIZE};
use super::hilbert::zxy_to_tile_id;

/// Entries per leaf directory before the writer starts doubling it.
pub const DEFAULT_LEAF_SIZE: usize = 4096;

/// Builder for planar and spherical archives.
///
/// # Example
///
/// ```
/// use s2tiles::archive::{ArchiveWriter, Projection};
///
/// let mut writer = ArchiveWriter::new(Projection::Planar);
/// writer.add_tile(0, 0, 0, &b"tile"[..]).unwrap();
/// let bytes = writer.finish().unwrap();
/// assert_eq!(&bytes[..7], b"PMTiles");
/// ```
#[derive(Debug, Clone)]
pub struct ArchiveWriter {
    projection: Projection,
    tile_type: TileType,
    tile_compression: Compression,
    internal_compression: Compression,
    metadata: serde_json::Value,
    leaf_size: usize,
    max_root_bytes: usize,
    bounds_e7: [i32; 4],
    center_zoom: u8,
    center_e7: [i32; 2],
    zoom_range: Option<(u8, u8)>,
    faces: Vec<BTreeMap<u64, Bytes>>,
}

impl ArchiveWriter {
    pub fn new(projection: Projection) -> Self {
        let max_root_bytes = match projection {
            Projection::Planar => ROOT_SIZE - HEADER_SIZE,
            Projection::S2 => (S2_ROOT_SIZE - S2_HEADER_SIZE) / projection.num_faces() as usize,
        };
        Self {
            projection,
            tile_type: TileType::Pbf,
            tile_compression: Compression::Gzip,
            internal_compression: Compression::Gzip,
            metadata: serde_json::Value::Object(serde_json::Map::new()),
            leaf_size: DEFAULT_LEAF_SIZE,
            max_root_bytes,
            bounds_e7: [0; 4],
            center_zoom: 0,
            center_e7: [0; 2],
            zoom_range: None,
            faces: vec![BTreeMap::new(); projection.num_faces() as usize],
        }
    }

    pub fn with_tile_type(mut self, tile_type: TileType) -> Self {
        self.tile_type = tile_type;
        self
    }

    /// Compression applied to every tile blob.
    pub fn with_tile_compression(mut self, compression: Compression) -> Self {
        self.tile_compression = compression;
        self
    }

    /// Compression applied to directories and metadata.
    pub fn with_internal_compression(mut self, compression: Compression) -> Self {
        self.internal_compression = compression;
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Initial number of entries per leaf directory.
    pub fn with_leaf_size(mut self, leaf_size: usize) -> Self {
        self.leaf_size = leaf_size.max(1);
        self
    }

    /// Largest compressed root directory, per face, kept without leaves.
    pub fn with_max_root_bytes(mut self, max_root_bytes: usize) -> Self {
        self.max_root_bytes = max_root_bytes;
        self
    }

    /// Geographic bounds in degrees, stored by planar archives.
    pub fn with_bounds(mut self, min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        self.bounds_e7 = [to_e7(min_lon), to_e7(min_lat), to_e7(max_lon), to_e7(max_lat)];
        self
    }

    /// Initial view, stored by planar archives.
    pub fn with_center(mut self, zoom: u8, lon: f64, lat: f64) -> Self {
        self.center_zoom = zoom;
        self.center_e7 = [to_e7(lon), to_e7(lat)];
        self
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    /// Number of tiles added so far.
    pub fn len(&self) -> usize {
        self.faces.iter().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add the planar tile `zoom/x/y`, replacing any earlier one.
    pub fn add_tile(&mut self, zoom: u8, x: u32, y: u32, data: impl Into<Bytes>) -> Result<()> {
        self.add_tile_s2(0, zoom, x, y, data)
    }

    /// Add tile `zoom/x/y` on `face`, replacing any earlier one.
    pub fn add_tile_s2(&mut self, face: u8, zoom: u8, x: u32, y: u32, data: impl Into<Bytes>) -> Result<()> {
        if face >= self.projection.num_faces() {
            return Err(ArchiveError::InvalidFace(face));
        }
        let tile_id = zxy_to_tile_id(zoom, x, y)?;
        self.zoom_range = Some(match self.zoom_range {
            Some((min, max)) => (min.min(zoom), max.max(zoom)),
            None => (zoom, zoom),
        });
        self.faces[face as usize].insert(tile_id, data.into());
        Ok(())
    }

    /// Lay out the archive.
    pub fn finish(self) -> Result<Vec<u8>> {
        let mut tile_data = Vec::new();
        let mut blobs: HashMap<Bytes, (u64, u64)> = HashMap::new();
        let mut face_entries = Vec::with_capacity(self.faces.len());
        let mut num_addressed_tiles = 0u64;

        for tiles in &self.faces {
            let mut entries: Vec<Entry> = Vec::new();
            for (&tile_id, data) in tiles {
                num_addressed_tiles += 1;
                let (offset, length) = match blobs.get(data) {
                    Some(&location) => location,
                    None => {
                        let blob = compress(data, self.tile_compression)?;
                        let location = (tile_data.len() as u64, blob.len() as u64);
                        tile_data.extend_from_slice(&blob);
                        blobs.insert(data.clone(), location);
                        location
                    }
                };

                if let Some(last) = entries.last_mut() {
                    let extends_run = last.offset == offset
                        && last.length == length
                        && last.tile_id + last.run_length as u64 == tile_id
                        && last.run_length < u32::MAX;
                    if extends_run {
                        last.run_length += 1;
                        continue;
                    }
                }
                entries.push(Entry::new(tile_id, offset, length, 1));
            }
            face_entries.push(entries);
        }

        let mut roots = Vec::with_capacity(face_entries.len());
        let mut leaves = Vec::with_capacity(face_entries.len());
        for (face, entries) in face_entries.iter().enumerate() {
            let (root, leaf) = self.build_directories(entries)?;
            trace!(
                face,
                entries = entries.len(),
                root_bytes = root.len(),
                leaf_bytes = leaf.len(),
                "Built face directories"
            );
            roots.push(root);
            leaves.push(leaf);
        }

        let metadata = compress(&serde_json::to_vec(&self.metadata)?, self.internal_compression)?;

        let mut header = Header::new(self.projection);
        header.internal_compression = self.internal_compression;
        header.tile_compression = self.tile_compression;
        header.tile_type = self.tile_type;
        header.clustered = true;
        header.num_addressed_tiles = num_addressed_tiles;
        header.num_tile_entries = face_entries.iter().map(|e| e.len() as u64).sum();
        header.num_tile_contents = blobs.len() as u64;
        if let Some((min_zoom, max_zoom)) = self.zoom_range {
            header.min_zoom = min_zoom;
            header.max_zoom = max_zoom;
        }
        header.bounds_e7 = self.bounds_e7;
        header.center_zoom = self.center_zoom;
        header.center_e7 = self.center_e7;

        let mut cursor = self.projection.header_size() as u64;
        for (face, root) in roots.iter().enumerate() {
            let range = ByteRange::new(cursor, root.len() as u64);
            match face {
                0 => header.root_directory = range,
                _ => header.face_root_directories[face - 1] = range,
            }
            cursor = range.end();
        }
        header.json_metadata = ByteRange::new(cursor, metadata.len() as u64);
        cursor = header.json_metadata.end();
        for (face, leaf) in leaves.iter().enumerate() {
            let range = ByteRange::new(cursor, leaf.len() as u64);
            match face {
                0 => header.leaf_directories = range,
                _ => header.face_leaf_directories[face - 1] = range,
            }
            cursor = range.end();
        }
        header.tile_data = ByteRange::new(cursor, tile_data.len() as u64);

        let mut out = header.to_bytes();
        out.reserve((header.tile_data.end() as usize).saturating_sub(out.len()));
        roots.iter().for_each(|root| out.extend_from_slice(root));
        out.extend_from_slice(&metadata);
        leaves.iter().for_each(|leaf| out.extend_from_slice(leaf));
        out.extend_from_slice(&tile_data);

        debug!(
            projection = ?self.projection,
            tiles = header.num_addressed_tiles,
            entries = header.num_tile_entries,
            contents = header.num_tile_contents,
            bytes = out.len(),
            "Wrote tile archive"
        );
        Ok(out)
    }

    /// Compressed root and leaf directory bytes for one face.
    ///
    /// Leaves are only introduced when the root would exceed its budget, and
    /// grow until the root of leaf pointers fits or a single leaf remains.
    fn build_directories(&self, entries: &[Entry]) -> Result<(Vec<u8>, Vec<u8>)> {
        let root = compress(&serialize_directory(entries), self.internal_compression)?;
        if root.len() <= self.max_root_bytes {
            return Ok((root, Vec::new()));
        }

        let mut leaf_size = self.leaf_size;
        loop {
            let (root, leaves) = self.split_directories(entries, leaf_size)?;
            if root.len() <= self.max_root_bytes || leaf_size >= entries.len() {
                return Ok((root, leaves));
            }
            leaf_size = leaf_size.saturating_mul(2);
        }
    }

    fn split_directories(&self, entries: &[Entry], leaf_size: usize) -> Result<(Vec<u8>, Vec<u8>)> {
        let mut leaves = Vec::new();
        let mut pointers = Vec::with_capacity(entries.len().div_ceil(leaf_size));
        for chunk in entries.chunks(leaf_size) {
            let leaf = compress(&serialize_directory(chunk), self.internal_compression)?;
            pointers.push(Entry::new(chunk[0].tile_id, leaves.len() as u64, leaf.len() as u64, 0));
            leaves.extend_from_slice(&leaf);
        }
        let root = compress(&serialize_directory(&pointers), self.internal_compression)?;
        Ok((root, leaves))
    }
}

fn to_e7(degrees: f64) -> i32 {
    (degrees * 1e7).round() as i32
}
