//! In-memory model of one pooled string (`XLUnicodeRichExtendedString`).

use std::fmt;

use crate::error::{SstError, SstResult};
use crate::layout::{RUN_ENTRY_SIZE, STRING_MIN_OVERHEAD};

/// Storage width of a string's characters on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum CharWidth {
    /// One byte per character (Latin-1, high byte dropped)
    Compressed,
    /// Two bytes per character (UTF-16LE)
    Wide,
}

impl CharWidth {
    /// Bytes used by one code unit.
    #[inline]
    pub fn bytes_per_char(self) -> usize {
        match self {
            CharWidth::Compressed => 1,
            CharWidth::Wide => 2,
        }
    }

    /// Width needed to store `text` losslessly.
    pub fn for_text(text: &str) -> Self {
        if text.chars().any(|c| c as u32 > 0xFF) {
            CharWidth::Wide
        } else {
            CharWidth::Compressed
        }
    }
}

/// A formatting run: from `position` onwards the text uses font `font_index`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FormatRun {
    /// Index of the first character the run applies to
    pub position: u16,
    /// Index into the workbook font table
    pub font_index: u16,
}

impl FormatRun {
    pub fn new(position: u16, font_index: u16) -> Self {
        Self {
            position,
            font_index,
        }
    }
}

/// Option flags of a string, as named booleans.
///
/// The packed byte form only exists inside the wire codec
/// (see [`crate::biff::strings`]).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StringFlags {
    pub is_wide: bool,
    pub has_extension: bool,
    pub is_rich_text: bool,
}

/// One entry of the shared string table.
///
/// Equality and ordering compare the text, then the run list, then the
/// extension bytes. Width and character count are derived from the text.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UnicodeString {
    text: String,
    runs: Vec<FormatRun>,
    extension: Vec<u8>,
    char_count: u16,
    width: CharWidth,
}

impl UnicodeString {
    /// Create a plain string.
    ///
    /// Fails with [`SstError::StringTooLong`] when the text needs more than
    /// 65535 UTF-16 code units.
    pub fn new<S: Into<String>>(text: S) -> SstResult<Self> {
        let text = text.into();
        let char_count = count_units(&text)?;
        let width = CharWidth::for_text(&text);
        Ok(Self {
            text,
            runs: Vec::new(),
            extension: Vec::new(),
            char_count,
            width,
        })
    }

    /// Rebuild a string from decoded parts.
    ///
    /// Unpaired surrogates are replaced (the code unit count is unchanged).
    pub(crate) fn from_parts(
        units: &[u16],
        runs: Vec<FormatRun>,
        extension: Vec<u8>,
    ) -> SstResult<Self> {
        let text = String::from_utf16(units).unwrap_or_else(|_| {
            log::warn!("SST string contains invalid UTF-16, replacing unpaired surrogates");
            String::from_utf16_lossy(units)
        });
        let mut s = Self::new(text)?;
        for run in runs {
            s.add_format_run(run);
        }
        s.extension = extension;
        Ok(s)
    }

    /// Builder-style: add a formatting run.
    pub fn with_run(mut self, position: u16, font_index: u16) -> Self {
        self.add_format_run(FormatRun::new(position, font_index));
        self
    }

    /// Builder-style: attach extension (phonetic) bytes.
    pub fn with_extension(mut self, data: Vec<u8>) -> Self {
        self.extension = data;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Replace the text, re-deriving width and character count.
    pub fn set_text<S: Into<String>>(&mut self, text: S) -> SstResult<()> {
        let text = text.into();
        self.char_count = count_units(&text)?;
        self.width = CharWidth::for_text(&text);
        self.text = text;
        Ok(())
    }

    /// Append one character to the text.
    pub(crate) fn push_char(&mut self, c: char) -> SstResult<()> {
        let units = self.char_count as usize + c.len_utf16();
        if units > u16::MAX as usize {
            return Err(SstError::StringTooLong(units));
        }
        self.text.push(c);
        self.char_count = units as u16;
        if c as u32 > 0xFF {
            self.width = CharWidth::Wide;
        }
        Ok(())
    }

    /// Number of UTF-16 code units (the on-wire character count).
    pub fn char_count(&self) -> u16 {
        self.char_count
    }

    pub fn width(&self) -> CharWidth {
        self.width
    }

    pub fn is_wide(&self) -> bool {
        self.width == CharWidth::Wide
    }

    pub fn is_rich_text(&self) -> bool {
        !self.runs.is_empty()
    }

    pub fn has_extension(&self) -> bool {
        !self.extension.is_empty()
    }

    pub fn flags(&self) -> StringFlags {
        StringFlags {
            is_wide: self.is_wide(),
            has_extension: self.has_extension(),
            is_rich_text: self.is_rich_text(),
        }
    }

    /// Formatting runs, sorted by position.
    pub fn format_runs(&self) -> &[FormatRun] {
        &self.runs
    }

    /// Insert a run, keeping the list sorted. A run at an existing position
    /// replaces it.
    pub fn add_format_run(&mut self, run: FormatRun) {
        match self.runs.binary_search_by_key(&run.position, |r| r.position) {
            Ok(idx) => self.runs[idx] = run,
            Err(idx) => {
                if self.runs.len() == u16::MAX as usize {
                    log::warn!("dropping formatting run at {}: run table is full", run.position);
                    return;
                }
                self.runs.insert(idx, run);
            }
        }
    }

    /// Remove the run starting at `position`, returning it.
    pub fn remove_format_run(&mut self, position: u16) -> Option<FormatRun> {
        let idx = self
            .runs
            .binary_search_by_key(&position, |r| r.position)
            .ok()?;
        Some(self.runs.remove(idx))
    }

    pub fn clear_format_runs(&mut self) {
        self.runs.clear();
    }

    /// Raw extension (far-east phonetic) bytes; empty when absent.
    pub fn extension_data(&self) -> &[u8] {
        &self.extension
    }

    pub fn set_extension_data(&mut self, data: Vec<u8>) {
        self.extension = data;
    }

    /// The text as the code units that go on the wire.
    ///
    /// For compressed strings every unit fits in one byte.
    pub fn code_units(&self) -> Vec<u16> {
        self.text.encode_utf16().collect()
    }

    /// Header size: count, flags, and the optional run count / extension length.
    pub fn header_len(&self) -> usize {
        let mut len = STRING_MIN_OVERHEAD;
        if self.is_rich_text() {
            len += 2;
        }
        if self.has_extension() {
            len += 4;
        }
        len
    }

    /// Bytes of character data.
    pub fn char_data_len(&self) -> usize {
        self.char_count as usize * self.width.bytes_per_char()
    }

    /// Size of the string when written without being split.
    pub fn encoded_len(&self) -> usize {
        self.header_len()
            + self.char_data_len()
            + self.runs.len() * RUN_ENTRY_SIZE
            + self.extension.len()
    }
}

impl fmt::Display for UnicodeString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

fn count_units(text: &str) -> SstResult<u16> {
    let units = text.encode_utf16().count();
    u16::try_from(units).map_err(|_| SstError::StringTooLong(units))
}
