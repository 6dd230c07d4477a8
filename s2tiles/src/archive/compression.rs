//! Compression and tile type codes.

use std::io::{Read, Write};

use bytes::Bytes;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;

use super::error::{ArchiveError, Result};

/// Compression applied to tiles or to directories and metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Compression {
    #[default]
    Unknown = 0,
    None = 1,
    Gzip = 2,
    Brotli = 3,
    Zstd = 4,
}

impl From<u8> for Compression {
    fn from(value: u8) -> Self {
        match value {
            1 => Compression::None,
            2 => Compression::Gzip,
            3 => Compression::Brotli,
            4 => Compression::Zstd,
            _ => Compression::Unknown,
        }
    }
}

/// Format of the tiles stored in an archive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TileType {
    #[default]
    Unknown = 0,
    Pbf = 1,
    Png = 2,
    Jpeg = 3,
    Webp = 4,
    Avif = 5,
}

impl From<u8> for TileType {
    fn from(value: u8) -> Self {
        match value {
            1 => TileType::Pbf,
            2 => TileType::Png,
            3 => TileType::Jpeg,
            4 => TileType::Webp,
            5 => TileType::Avif,
            _ => TileType::Unknown,
        }
    }
}

/// Brotli stream buffer size.
const BROTLI_BUFFER_SIZE: usize = 4096;

/// Brotli quality, 0 (fastest) to 11 (smallest).
const BROTLI_QUALITY: u32 = 11;

/// Brotli window size as a power of two.
const BROTLI_LG_WINDOW: u32 = 22;

/// Zstd level; 0 selects the library default.
const ZSTD_LEVEL: i32 = 0;

/// Decode `data` compressed with `compression`.
///
/// `Unknown` is treated like `None`: the bytes are returned as stored.
pub fn decompress(data: Bytes, compression: Compression) -> Result<Bytes> {
    let decoded = match compression {
        Compression::None | Compression::Unknown => return Ok(data),
        Compression::Gzip => {
            let mut out = Vec::with_capacity(data.len() * 4);
            GzDecoder::new(&data[..]).read_to_end(&mut out).map(|_| out)
        }
        Compression::Brotli => {
            let mut out = Vec::with_capacity(data.len() * 4);
            brotli::Decompressor::new(&data[..], BROTLI_BUFFER_SIZE)
                .read_to_end(&mut out)
                .map(|_| out)
        }
        Compression::Zstd => zstd::decode_all(&data[..]),
    };
    decoded.map(Bytes::from).map_err(ArchiveError::Decompression)
}

/// Encode `data` with `compression`.
///
/// `Unknown` stores the bytes unchanged, like `None`.
pub fn compress(data: &[u8], compression: Compression) -> Result<Vec<u8>> {
    match compression {
        Compression::None | Compression::Unknown => Ok(data.to_vec()),
        Compression::Gzip => {
            let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
            encoder.write_all(data)?;
            Ok(encoder.finish()?)
        }
        Compression::Brotli => {
            let mut encoder = brotli::CompressorWriter::new(
                Vec::new(),
                BROTLI_BUFFER_SIZE,
                BROTLI_QUALITY,
                BROTLI_LG_WINDOW,
            );
            encoder.write_all(data)?;
            Ok(encoder.into_inner())
        }
        Compression::Zstd => Ok(zstd::encode_all(data, ZSTD_LEVEL)?),
    }
}
