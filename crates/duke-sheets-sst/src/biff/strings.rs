//! BIFF8 Unicode string wire pieces.
//!
//! An SST entry (`XLUnicodeRichExtendedString`) is laid out as:
//! - `char_count` (2 bytes) + flags (1 byte)
//! - Flags bit 0 (`fHighByte`): 0 = compressed Latin-1, 1 = uncompressed UTF-16LE
//! - Flags bit 2 (`fExtSt`): extended string data follows (Asian phonetic)
//! - Flags bit 3 (`fRichSt`): rich text run array follows
//! - If fRichSt: 2-byte run count follows the flags
//! - If fExtSt: 4-byte extended data size follows
//! - Then the character data
//! - Then the rich text runs (4 bytes each) if fRichSt
//! - Then the extended data if fExtSt
//!
//! The frame codec may cut a string between any two of these pieces (and
//! inside the character data, run table or extension block), so this module
//! only provides the individual pieces.

use super::parser::{read_bytes, read_u16, read_u32, read_u8};
use crate::error::SstResult;
use crate::string::{CharWidth, FormatRun, StringFlags, UnicodeString};

pub const FLAG_HIGH_BYTE: u8 = 0x01;
pub const FLAG_EXT: u8 = 0x04;
pub const FLAG_RICH_TEXT: u8 = 0x08;

/// Pack the named flags into the on-wire option byte.
pub fn pack_flags(flags: StringFlags) -> u8 {
    let mut byte = 0;
    if flags.is_wide {
        byte |= FLAG_HIGH_BYTE;
    }
    if flags.has_extension {
        byte |= FLAG_EXT;
    }
    if flags.is_rich_text {
        byte |= FLAG_RICH_TEXT;
    }
    byte
}

/// Unpack the on-wire option byte. Reserved bits are ignored.
pub fn unpack_flags(byte: u8) -> StringFlags {
    StringFlags {
        is_wide: byte & FLAG_HIGH_BYTE != 0,
        has_extension: byte & FLAG_EXT != 0,
        is_rich_text: byte & FLAG_RICH_TEXT != 0,
    }
}

/// The fixed-position fields that precede a string's character data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringHeader {
    pub char_count: u16,
    pub flags: StringFlags,
    pub run_count: u16,
    pub ext_len: u32,
}

impl StringHeader {
    pub fn of(s: &UnicodeString) -> Self {
        Self {
            char_count: s.char_count(),
            flags: s.flags(),
            run_count: s.format_runs().len() as u16,
            ext_len: s.extension_data().len() as u32,
        }
    }

    pub fn width(&self) -> CharWidth {
        if self.flags.is_wide {
            CharWidth::Wide
        } else {
            CharWidth::Compressed
        }
    }

    /// Bytes from the flags byte onwards (the count excluded).
    pub fn body_len(&self) -> usize {
        let mut len = 1;
        if self.flags.is_rich_text {
            len += 2;
        }
        if self.flags.has_extension {
            len += 4;
        }
        len
    }

    /// Append the header; `with_count` false omits the leading count, for a
    /// body whose count was committed to an earlier frame.
    pub fn write(&self, out: &mut Vec<u8>, with_count: bool) {
        if with_count {
            out.extend_from_slice(&self.char_count.to_le_bytes());
        }
        out.push(pack_flags(self.flags));
        if self.flags.is_rich_text {
            out.extend_from_slice(&self.run_count.to_le_bytes());
        }
        if self.flags.has_extension {
            out.extend_from_slice(&self.ext_len.to_le_bytes());
        }
    }

    /// Read the header body (flags onwards) of a string whose count is known.
    pub fn read_body(data: &[u8], offset: &mut usize, char_count: u16) -> SstResult<Self> {
        let flags = unpack_flags(read_u8(data, offset)?);
        let run_count = if flags.is_rich_text {
            read_u16(data, offset)?
        } else {
            0
        };
        let ext_len = if flags.has_extension {
            read_u32(data, offset)?
        } else {
            0
        };
        Ok(Self {
            char_count,
            flags,
            run_count,
            ext_len,
        })
    }
}

/// Append code units in the given width.
///
/// Compressed strings only hold units below 0x100, so dropping the high
/// byte is lossless.
pub fn write_code_units(out: &mut Vec<u8>, units: &[u16], width: CharWidth) {
    match width {
        CharWidth::Compressed => out.extend(units.iter().map(|&u| u as u8)),
        CharWidth::Wide => {
            out.reserve(units.len() * 2);
            for u in units {
                out.extend_from_slice(&u.to_le_bytes());
            }
        }
    }
}

/// Read `count` code units stored in `width`, appending them to `units`.
pub fn read_code_units(
    data: &[u8],
    offset: &mut usize,
    count: usize,
    width: CharWidth,
    units: &mut Vec<u16>,
) -> SstResult<()> {
    let bytes = read_bytes(data, offset, count * width.bytes_per_char())?;
    match width {
        CharWidth::Compressed => units.extend(bytes.iter().map(|&b| b as u16)),
        CharWidth::Wide => units.extend(
            bytes
                .chunks_exact(2)
                .map(|pair| u16::from_le_bytes([pair[0], pair[1]])),
        ),
    }
    Ok(())
}

pub fn write_runs(out: &mut Vec<u8>, runs: &[FormatRun]) {
    for run in runs {
        out.extend_from_slice(&run.position.to_le_bytes());
        out.extend_from_slice(&run.font_index.to_le_bytes());
    }
}

/// Read `count` 4-byte run entries, appending them to `runs`.
pub fn read_runs(
    data: &[u8],
    offset: &mut usize,
    count: usize,
    runs: &mut Vec<FormatRun>,
) -> SstResult<()> {
    for _ in 0..count {
        let position = read_u16(data, offset)?;
        let font_index = read_u16(data, offset)?;
        runs.push(FormatRun::new(position, font_index));
    }
    Ok(())
}
