//! Directory entries and their columnar varint encoding.

use bytes::Buf;

use super::error::{ArchiveError, Result};
use super::varint::{read_varint, write_varint};

/// One directory record.
///
/// `run_length > 0` addresses that many consecutive tile ids sharing one
/// blob. `run_length == 0` points at a leaf directory instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub tile_id: u64,
    pub offset: u64,
    pub length: u64,
    pub run_length: u32,
}

impl Entry {
    pub fn new(tile_id: u64, offset: u64, length: u64, run_length: u32) -> Self {
        Self {
            tile_id,
            offset,
            length,
            run_length,
        }
    }

    pub fn is_leaf_pointer(&self) -> bool {
        self.run_length == 0
    }
}

/// Encode `entries`, which must be sorted by tile id.
///
/// Columns are written in order: tile id deltas, run lengths, lengths and
/// offsets. An offset of 0 after the first entry means "directly after the
/// previous entry"; any other value is stored plus one.
pub fn serialize_directory(entries: &[Entry]) -> Vec<u8> {
    let mut out = Vec::with_capacity(entries.len() * 8 + 4);
    write_varint(&mut out, entries.len() as u64);

    let mut last_id = 0;
    for entry in entries {
        write_varint(&mut out, entry.tile_id - last_id);
        last_id = entry.tile_id;
    }
    for entry in entries {
        write_varint(&mut out, entry.run_length as u64);
    }
    for entry in entries {
        write_varint(&mut out, entry.length);
    }
    for (i, entry) in entries.iter().enumerate() {
        let contiguous = i > 0 && entry.offset == entries[i - 1].offset + entries[i - 1].length;
        write_varint(&mut out, if contiguous { 0 } else { entry.offset + 1 });
    }
    out
}

/// Decode a directory written by [`serialize_directory`].
pub fn deserialize_directory(mut buf: &[u8]) -> Result<Vec<Entry>> {
    let count = read_varint(&mut buf)?;
    // Every entry takes at least four bytes.
    if count > (buf.remaining() / 4) as u64 {
        return Err(ArchiveError::MalformedDirectory("entry count exceeds directory size"));
    }
    let count = count as usize;

    let mut entries = Vec::with_capacity(count);
    let mut last_id = 0u64;
    for _ in 0..count {
        last_id = last_id
            .checked_add(read_varint(&mut buf)?)
            .ok_or(ArchiveError::MalformedDirectory("tile id overflow"))?;
        entries.push(Entry::new(last_id, 0, 0, 1));
    }
    for entry in entries.iter_mut() {
        entry.run_length = u32::try_from(read_varint(&mut buf)?)
            .map_err(|_| ArchiveError::MalformedDirectory("run length overflow"))?;
    }
    for entry in entries.iter_mut() {
        entry.length = read_varint(&mut buf)?;
    }
    for i in 0..count {
        let value = read_varint(&mut buf)?;
        entries[i].offset = match (value, i) {
            (0, 0) => return Err(ArchiveError::MalformedDirectory("first entry has no offset")),
            (0, _) => entries[i - 1].offset + entries[i - 1].length,
            (v, _) => v - 1,
        };
    }
    Ok(entries)
}

/// Find the entry addressing `tile_id`.
///
/// Falls back to the closest preceding entry when it is a leaf pointer or
/// its run covers `tile_id`.
pub fn find_tile(entries: &[Entry], tile_id: u64) -> Option<&Entry> {
    match entries.binary_search_by_key(&tile_id, |e| e.tile_id) {
        Ok(index) => Some(&entries[index]),
        Err(0) => None,
        Err(index) => {
            let entry = &entries[index - 1];
            (entry.is_leaf_pointer() || tile_id - entry.tile_id < entry.run_length as u64)
                .then_some(entry)
        }
    }
}
