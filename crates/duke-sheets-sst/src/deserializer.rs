//! Frame deserializer: rebuilds a [`StringTable`] from an SST head frame and
//! its continuation frames.
//!
//! The only state crossing a frame boundary is the string being assembled.
//! It lives in [`DecodeState`], which [`decode_frame`] takes and returns, so
//! each frame is processed by a plain function of (state, bytes).

use crate::biff::parser::{read_bytes, read_u16, read_u32, read_u8};
use crate::biff::strings::{read_code_units, read_runs, unpack_flags, StringHeader};
use crate::error::{SstError, SstResult};
use crate::layout::RUN_ENTRY_SIZE;
use crate::options::SstOptions;
use crate::string::{CharWidth, FormatRun, UnicodeString};
use crate::table::StringTable;

/// Parser state carried from one frame to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DecodeState {
    /// No string is mid-flight; the next frame starts with a string count.
    #[default]
    Idle,
    /// A string was cut at the end of the previous frame.
    InFlight(PendingString),
}

impl DecodeState {
    pub fn is_idle(&self) -> bool {
        matches!(self, DecodeState::Idle)
    }

    /// Characters still owed to the in-flight string (0 when idle).
    pub fn expected_continuation_chars(&self) -> usize {
        match self {
            DecodeState::Idle => 0,
            DecodeState::InFlight(p) => p.expected_continuation_chars(),
        }
    }
}

/// Which part of the in-flight string the next frame resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingPart {
    /// Only the count has been read; the next frame starts with the flags byte.
    Body,
    /// Character data; the next frame starts with a restated flags byte.
    Chars,
    /// Run table entries.
    Runs,
    /// Extension bytes.
    Extension,
}

/// A string whose bytes span more than one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingString {
    char_count: u16,
    part: PendingPart,
    width: CharWidth,
    run_count: u16,
    ext_len: u32,
    units: Vec<u16>,
    runs: Vec<FormatRun>,
    extension: Vec<u8>,
}

impl PendingString {
    fn deferred(char_count: u16) -> Self {
        Self {
            char_count,
            part: PendingPart::Body,
            width: CharWidth::Compressed,
            run_count: 0,
            ext_len: 0,
            units: Vec::new(),
            runs: Vec::new(),
            extension: Vec::new(),
        }
    }

    fn apply_header(&mut self, header: StringHeader) {
        self.width = header.width();
        self.run_count = header.run_count;
        self.ext_len = header.ext_len;
        self.units.reserve(self.char_count as usize);
        self.runs.reserve(header.run_count as usize);
        self.part = PendingPart::Chars;
    }

    pub fn part(&self) -> PendingPart {
        self.part
    }

    /// Width the last fragment of character data was stored in.
    pub fn width(&self) -> CharWidth {
        self.width
    }

    pub fn char_count(&self) -> u16 {
        self.char_count
    }

    pub fn expected_continuation_chars(&self) -> usize {
        self.char_count as usize - self.units.len()
    }

    /// Text assembled so far.
    pub fn partial_text(&self) -> String {
        String::from_utf16_lossy(&self.units)
    }

    pub fn runs(&self) -> &[FormatRun] {
        &self.runs
    }

    /// Consume as much of `frame` as belongs to this string.
    ///
    /// Returns `true` once the string is complete.
    fn fill(&mut self, frame: &[u8], offset: &mut usize) -> SstResult<bool> {
        loop {
            let avail = frame.len() - *offset;
            match self.part {
                PendingPart::Body => {
                    let header = StringHeader::read_body(frame, offset, self.char_count)?;
                    self.apply_header(header);
                }
                PendingPart::Chars => {
                    let owed = self.expected_continuation_chars();
                    if owed == 0 {
                        self.part = PendingPart::Runs;
                        continue;
                    }
                    if avail == 0 {
                        return Ok(false);
                    }
                    if *offset == 0 {
                        // continuation fragments restate the width
                        let flags = unpack_flags(read_u8(frame, offset)?);
                        self.width = if flags.is_wide {
                            CharWidth::Wide
                        } else {
                            CharWidth::Compressed
                        };
                        continue;
                    }
                    let count = (avail / self.width.bytes_per_char()).min(owed);
                    if count == 0 {
                        return Err(SstError::TruncatedStream(format!(
                            "frame ends inside a wide character ({owed} characters owed)"
                        )));
                    }
                    read_code_units(frame, offset, count, self.width, &mut self.units)?;
                }
                PendingPart::Runs => {
                    let owed = self.run_count as usize - self.runs.len();
                    if owed == 0 {
                        self.part = PendingPart::Extension;
                        continue;
                    }
                    if avail == 0 {
                        return Ok(false);
                    }
                    let count = (avail / RUN_ENTRY_SIZE).min(owed);
                    if count == 0 {
                        return Err(SstError::TruncatedStream(format!(
                            "frame ends inside a formatting run ({owed} runs owed)"
                        )));
                    }
                    read_runs(frame, offset, count, &mut self.runs)?;
                }
                PendingPart::Extension => {
                    let owed = self.ext_len as usize - self.extension.len();
                    if owed == 0 {
                        return Ok(true);
                    }
                    if avail == 0 {
                        return Ok(false);
                    }
                    let bytes = read_bytes(frame, offset, avail.min(owed))?;
                    self.extension.extend_from_slice(bytes);
                }
            }
        }
    }

    fn finish(self) -> SstResult<UnicodeString> {
        UnicodeString::from_parts(&self.units, self.runs, self.extension)
    }
}

/// Decode the string payload of one frame.
///
/// `frame` is the record body, minus the 8 count bytes for the head frame.
/// Completed strings are appended to `out`; decoding stops once `out` holds
/// `wanted` strings. Returns the state to pass with the next frame.
pub fn decode_frame(
    state: DecodeState,
    frame: &[u8],
    out: &mut Vec<UnicodeString>,
    wanted: usize,
) -> SstResult<DecodeState> {
    let mut offset = 0;
    let mut pending = match state {
        DecodeState::Idle => None,
        DecodeState::InFlight(p) => Some(p),
    };

    loop {
        let mut p = match pending.take() {
            Some(p) => p,
            None => {
                let remaining = frame.len() - offset;
                if out.len() >= wanted {
                    if remaining > 0 {
                        log::warn!("ignoring {remaining} byte(s) after the last SST string");
                    }
                    return Ok(DecodeState::Idle);
                }
                match remaining {
                    0 => return Ok(DecodeState::Idle),
                    1 => {
                        return Err(SstError::TruncatedStream(
                            "1 byte left where a string length is expected".into(),
                        ))
                    }
                    2 => {
                        let char_count = read_u16(frame, &mut offset)?;
                        return Ok(DecodeState::InFlight(PendingString::deferred(char_count)));
                    }
                    _ => {
                        let char_count = read_u16(frame, &mut offset)?;
                        let header = StringHeader::read_body(frame, &mut offset, char_count)?;
                        let mut p = PendingString::deferred(char_count);
                        p.apply_header(header);
                        p
                    }
                }
            }
        };

        if p.fill(frame, &mut offset)? {
            out.push(p.finish()?);
        } else {
            return Ok(DecodeState::InFlight(p));
        }
    }
}

/// Decode a whole SST: the head record body followed by the continuation
/// record bodies.
pub fn decode_sst<'a, I>(head: &[u8], continuations: I, options: &SstOptions) -> SstResult<StringTable>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut offset = 0;
    let total = read_u32(head, &mut offset)?;
    let unique = read_u32(head, &mut offset)? as usize;

    let mut strings = Vec::with_capacity(unique.min(u16::MAX as usize));
    let mut state = decode_frame(DecodeState::Idle, &head[offset..], &mut strings, unique)?;

    for (i, frame) in continuations.into_iter().enumerate() {
        if state.is_idle() && strings.len() >= unique {
            log::warn!("ignoring SST continuation frame {} past the last string", i + 1);
            continue;
        }
        state = decode_frame(state, frame, &mut strings, unique)?;
    }

    if let DecodeState::InFlight(p) = &state {
        return Err(SstError::TruncatedStream(format!(
            "string {} is missing {} of {} characters at the end of the SST",
            strings.len(),
            p.expected_continuation_chars(),
            p.char_count()
        )));
    }
    if strings.len() < unique {
        return Err(SstError::TruncatedStream(format!(
            "SST declares {unique} unique strings but holds {}",
            strings.len()
        )));
    }

    let mut table = StringTable::with_options(options.clone());
    for s in strings {
        table.insert_decoded(s)?;
    }
    table.set_total_reference_count(total);
    Ok(table)
}
