//! LEB128 unsigned varints.

use bytes::{Buf, BufMut};

use super::error::{ArchiveError, Result};

const MAX_VARINT_LEN: usize = 10;

/// Read one varint from the front of `buf`.
pub(crate) fn read_varint(buf: &mut impl Buf) -> Result<u64> {
    let mut value = 0u64;
    for i in 0..MAX_VARINT_LEN {
        if !buf.has_remaining() {
            return Err(ArchiveError::Varint);
        }
        let byte = buf.get_u8();
        let bits = (byte & 0x7f) as u64;
        if i == MAX_VARINT_LEN - 1 && bits > 1 {
            return Err(ArchiveError::Varint);
        }
        value |= bits << (7 * i);
        if byte & 0x80 == 0 {
            return Ok(value);
        }
    }
    Err(ArchiveError::Varint)
}

pub(crate) fn write_varint(buf: &mut impl BufMut, mut value: u64) {
    while value >= 0x80 {
        buf.put_u8((value as u8 & 0x7f) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}
