//! PMTiles v3 and S2PMTiles v1 headers.
//!
//! Both layouts share bytes 8..102. The planar header continues with bounds
//! and center; the spherical one with root and leaf directory ranges for
//! faces 1 to 5 (face 0 uses the shared slots).

use bytes::{Buf, BufMut};

use super::compression::{Compression, TileType};
use super::error::{ArchiveError, Result};

/// Size of a PMTiles v3 header.
pub const HEADER_SIZE: usize = 127;

/// Size of an S2PMTiles v1 header.
pub const S2_HEADER_SIZE: usize = 262;

/// Bytes read up front from a planar archive.
pub const ROOT_SIZE: usize = 16_384;

/// Bytes read up front from a spherical archive, enough for any header.
pub const S2_ROOT_SIZE: usize = 98_304;

const PM_MAGIC: &[u8; 7] = b"PMTiles";
const PM_VERSION: u8 = 3;
const S2_MAGIC: &[u8; 2] = b"S2";
const S2_VERSION: u8 = 1;

/// Tiling scheme of an archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Projection {
    /// Web Mercator `z/x/y` tiles under one root directory.
    Planar,
    /// Six cube faces, each with its own root and leaf directories.
    S2,
}

impl Projection {
    pub fn num_faces(self) -> u8 {
        match self {
            Projection::Planar => 1,
            Projection::S2 => 6,
        }
    }

    pub fn header_size(self) -> usize {
        match self {
            Projection::Planar => HEADER_SIZE,
            Projection::S2 => S2_HEADER_SIZE,
        }
    }
}

/// A byte range within the archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteRange {
    pub offset: u64,
    pub length: u64,
}

impl ByteRange {
    pub fn new(offset: u64, length: u64) -> Self {
        Self { offset, length }
    }

    pub fn end(&self) -> u64 {
        self.offset + self.length
    }
}

/// Archive header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub projection: Projection,
    pub spec_version: u8,
    pub root_directory: ByteRange,
    pub json_metadata: ByteRange,
    pub leaf_directories: ByteRange,
    pub tile_data: ByteRange,
    pub num_addressed_tiles: u64,
    pub num_tile_entries: u64,
    pub num_tile_contents: u64,
    pub clustered: bool,
    pub internal_compression: Compression,
    pub tile_compression: Compression,
    pub tile_type: TileType,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Planar only: `[min_lon, min_lat, max_lon, max_lat]` in 1e-7 degrees.
    pub bounds_e7: [i32; 4],
    pub center_zoom: u8,
    /// Planar only: `[lon, lat]` in 1e-7 degrees.
    pub center_e7: [i32; 2],
    /// S2 only: root directories of faces 1 to 5.
    pub face_root_directories: [ByteRange; 5],
    /// S2 only: leaf directories of faces 1 to 5.
    pub face_leaf_directories: [ByteRange; 5],
}

impl Header {
    /// An empty header of the current version for `projection`.
    pub fn new(projection: Projection) -> Self {
        Self {
            projection,
            spec_version: match projection {
                Projection::Planar => PM_VERSION,
                Projection::S2 => S2_VERSION,
            },
            root_directory: ByteRange::default(),
            json_metadata: ByteRange::default(),
            leaf_directories: ByteRange::default(),
            tile_data: ByteRange::default(),
            num_addressed_tiles: 0,
            num_tile_entries: 0,
            num_tile_contents: 0,
            clustered: false,
            internal_compression: Compression::Gzip,
            tile_compression: Compression::Gzip,
            tile_type: TileType::Pbf,
            min_zoom: 0,
            max_zoom: 0,
            bounds_e7: [0; 4],
            center_zoom: 0,
            center_e7: [0; 2],
            face_root_directories: [ByteRange::default(); 5],
            face_leaf_directories: [ByteRange::default(); 5],
        }
    }

    /// Parse a header, detecting the variant from its magic.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 2 {
            return Err(ArchiveError::Truncated {
                needed: 2,
                available: bytes.len() as u64,
            });
        }
        let projection = match [bytes[0], bytes[1]] {
            [b'P', b'M'] => Projection::Planar,
            [b'S', b'2'] => Projection::S2,
            magic => return Err(ArchiveError::BadMagic(magic)),
        };
        let size = projection.header_size();
        if bytes.len() < size {
            return Err(ArchiveError::Truncated {
                needed: size as u64,
                available: bytes.len() as u64,
            });
        }

        let mut header = Header::new(projection);
        header.spec_version = match projection {
            Projection::Planar => bytes[7],
            Projection::S2 => bytes[2],
        };

        let mut buf = &bytes[8..size];
        header.root_directory = read_range(&mut buf);
        header.json_metadata = read_range(&mut buf);
        header.leaf_directories = read_range(&mut buf);
        header.tile_data = read_range(&mut buf);
        header.num_addressed_tiles = buf.get_u64_le();
        header.num_tile_entries = buf.get_u64_le();
        header.num_tile_contents = buf.get_u64_le();
        header.clustered = buf.get_u8() == 1;
        header.internal_compression = Compression::from(buf.get_u8());
        header.tile_compression = Compression::from(buf.get_u8());
        header.tile_type = TileType::from(buf.get_u8());
        header.min_zoom = buf.get_u8();
        header.max_zoom = buf.get_u8();

        match projection {
            Projection::Planar => {
                for value in header.bounds_e7.iter_mut() {
                    *value = buf.get_i32_le();
                }
                header.center_zoom = buf.get_u8();
                for value in header.center_e7.iter_mut() {
                    *value = buf.get_i32_le();
                }
            }
            Projection::S2 => {
                for range in header.face_root_directories.iter_mut() {
                    *range = read_range(&mut buf);
                }
                for range in header.face_leaf_directories.iter_mut() {
                    *range = read_range(&mut buf);
                }
            }
        }
        Ok(header)
    }

    /// Serialize into the layout of [`projection`](Self::projection).
    pub fn to_bytes(&self) -> Vec<u8> {
        let size = self.projection.header_size();
        let mut out = Vec::with_capacity(size);
        match self.projection {
            Projection::Planar => {
                out.put_slice(PM_MAGIC);
                out.put_u8(self.spec_version);
            }
            Projection::S2 => {
                out.put_slice(S2_MAGIC);
                out.put_u8(self.spec_version);
                out.put_bytes(0, 5);
            }
        }

        for range in [
            self.root_directory,
            self.json_metadata,
            self.leaf_directories,
            self.tile_data,
        ] {
            write_range(&mut out, range);
        }
        out.put_u64_le(self.num_addressed_tiles);
        out.put_u64_le(self.num_tile_entries);
        out.put_u64_le(self.num_tile_contents);
        out.put_u8(u8::from(self.clustered));
        out.put_u8(self.internal_compression as u8);
        out.put_u8(self.tile_compression as u8);
        out.put_u8(self.tile_type as u8);
        out.put_u8(self.min_zoom);
        out.put_u8(self.max_zoom);

        match self.projection {
            Projection::Planar => {
                self.bounds_e7.iter().for_each(|v| out.put_i32_le(*v));
                out.put_u8(self.center_zoom);
                self.center_e7.iter().for_each(|v| out.put_i32_le(*v));
            }
            Projection::S2 => {
                self.face_root_directories
                    .iter()
                    .chain(&self.face_leaf_directories)
                    .for_each(|range| write_range(&mut out, *range));
            }
        }
        debug_assert_eq!(out.len(), size);
        out
    }

    /// Root directory of `face`; `None` if the archive has no such face.
    pub fn root_directory_for(&self, face: u8) -> Option<ByteRange> {
        match face {
            0 => Some(self.root_directory),
            1..=5 if self.projection == Projection::S2 => {
                Some(self.face_root_directories[face as usize - 1])
            }
            _ => None,
        }
    }

    /// Leaf directory section of `face`.
    pub fn leaf_directories_for(&self, face: u8) -> Option<ByteRange> {
        match face {
            0 => Some(self.leaf_directories),
            1..=5 if self.projection == Projection::S2 => {
                Some(self.face_leaf_directories[face as usize - 1])
            }
            _ => None,
        }
    }
}

fn read_range(buf: &mut &[u8]) -> ByteRange {
    let offset = buf.get_u64_le();
    let length = buf.get_u64_le();
    ByteRange::new(offset, length)
}

fn write_range(out: &mut Vec<u8>, range: ByteRange) {
    out.put_u64_le(range.offset);
    out.put_u64_le(range.length);
}
