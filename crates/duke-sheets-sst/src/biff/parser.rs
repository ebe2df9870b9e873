//! Low-level binary helpers for BIFF8 record bodies.
//!
//! All multi-byte integers in BIFF8 are little-endian.

use crate::error::{SstError, SstResult};

fn truncated(offset: usize, need: usize, len: usize) -> SstError {
    SstError::TruncatedStream(format!(
        "unexpected end of data at offset {offset}, need {need} byte(s), have {}",
        len.saturating_sub(offset)
    ))
}

/// Read a `u8` from a byte slice at `offset`, advancing `offset`.
#[inline]
pub fn read_u8(data: &[u8], offset: &mut usize) -> SstResult<u8> {
    let v = *data.get(*offset).ok_or_else(|| truncated(*offset, 1, data.len()))?;
    *offset += 1;
    Ok(v)
}

/// Read a `u16` (little-endian) from a byte slice at `offset`, advancing `offset`.
#[inline]
pub fn read_u16(data: &[u8], offset: &mut usize) -> SstResult<u16> {
    let bytes = read_bytes(data, offset, 2)?;
    Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
}

/// Read a `u32` (little-endian) from a byte slice at `offset`, advancing `offset`.
#[inline]
pub fn read_u32(data: &[u8], offset: &mut usize) -> SstResult<u32> {
    let bytes = read_bytes(data, offset, 4)?;
    Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Borrow `len` bytes at `offset`, advancing `offset`.
#[inline]
pub fn read_bytes<'a>(data: &'a [u8], offset: &mut usize, len: usize) -> SstResult<&'a [u8]> {
    let end = offset
        .checked_add(len)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| truncated(*offset, len, data.len()))?;
    let bytes = &data[*offset..end];
    *offset = end;
    Ok(bytes)
}
