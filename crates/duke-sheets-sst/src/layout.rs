//! Frame layout rules shared by the size planner and the frame serializer.
//!
//! Both walk the table with a [`Layout`], asking for the next piece that fits
//! in the room left in the current frame. Keeping the split rules in one
//! place means the plan and the emitted bytes cannot disagree unless they are
//! run against different tables.
//!
//! Split rules, applied per string:
//! 1. The header (count, flags, run count, extension length) is never split.
//!    If it does not fit but at least 2 bytes remain, only the count is
//!    written and the frame is closed; the next frame starts with the flags
//!    byte. With less than 2 bytes left the frame is closed short.
//! 2. Character data may be split on a code unit boundary. Each continuation
//!    frame that resumes character data starts with a restated flags byte.
//! 3. Run entries (4 bytes) are never split.
//! 4. Extension bytes may be split anywhere.

use crate::string::UnicodeString;

/// Largest frame, 4-byte record header included.
pub const MAX_FRAME_SIZE: usize = 8228;
/// Head frame overhead: tag, length, total count, unique count.
pub const HEAD_OVERHEAD: usize = 12;
/// Continuation frame overhead: tag, length.
pub const CONT_OVERHEAD: usize = 4;
/// Character count plus flags byte.
pub const STRING_MIN_OVERHEAD: usize = 3;
/// One formatting run: position + font index.
pub const RUN_ENTRY_SIZE: usize = 4;

/// String payload bytes available in the head frame.
pub const HEAD_CAPACITY: usize = MAX_FRAME_SIZE - HEAD_OVERHEAD;
/// String payload bytes available in a continuation frame.
pub const CONT_CAPACITY: usize = MAX_FRAME_SIZE - CONT_OVERHEAD;

const CHAR_COUNT_SIZE: usize = 2;

/// A contiguous part of one string's encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Piece {
    /// The 2-byte count alone; the body moves to the next frame.
    CharCount,
    /// The header; without the count when it was already written.
    Header { with_count: bool },
    /// Flags byte at the top of a frame that resumes character data.
    RestatedFlags,
    /// Code units `start..start + count`.
    Chars { start: usize, count: usize },
    /// Run entries `start..start + count`.
    Runs { start: usize, count: usize },
    /// Extension bytes `start..start + len`.
    Extension { start: usize, len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    /// Place `piece` of string `string`; it occupies `len` bytes.
    Piece {
        string: usize,
        piece: Piece,
        len: usize,
    },
    /// Nothing more fits; close the frame and open a continuation.
    CloseFrame,
    /// Every string has been placed.
    Finished,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Start,
    BodyDeferred,
    Chars(usize),
    Runs(usize),
    Extension(usize),
    Done,
}

/// Cursor over the pieces of a table, in emission order.
#[derive(Debug, Clone)]
pub(crate) struct Layout<'a> {
    strings: &'a [UnicodeString],
    index: usize,
    phase: Phase,
}

impl<'a> Layout<'a> {
    pub(crate) fn new(strings: &'a [UnicodeString]) -> Self {
        Self {
            strings,
            index: 0,
            phase: Phase::Start,
        }
    }

    /// Next piece given `room` free bytes in the current frame.
    ///
    /// `fresh` is true when nothing has been placed in the current frame.
    pub(crate) fn next(&mut self, room: usize, fresh: bool) -> Step {
        loop {
            let Some(s) = self.strings.get(self.index) else {
                return Step::Finished;
            };
            let string = self.index;

            match self.phase {
                Phase::Start => {
                    let header = s.header_len();
                    if room >= header {
                        self.phase = Phase::Chars(0);
                        return piece(string, Piece::Header { with_count: true }, header);
                    }
                    if room >= CHAR_COUNT_SIZE {
                        self.phase = Phase::BodyDeferred;
                        return piece(string, Piece::CharCount, CHAR_COUNT_SIZE);
                    }
                    return Step::CloseFrame;
                }
                Phase::BodyDeferred => {
                    if !fresh {
                        return Step::CloseFrame;
                    }
                    self.phase = Phase::Chars(0);
                    let len = s.header_len() - CHAR_COUNT_SIZE;
                    return piece(string, Piece::Header { with_count: false }, len);
                }
                Phase::Chars(done) => {
                    let total = s.char_count() as usize;
                    if done == total {
                        self.phase = Phase::Runs(0);
                        continue;
                    }
                    if fresh {
                        return piece(string, Piece::RestatedFlags, 1);
                    }
                    let width = s.width().bytes_per_char();
                    let count = (room / width).min(total - done);
                    if count == 0 {
                        return Step::CloseFrame;
                    }
                    self.phase = Phase::Chars(done + count);
                    return piece(string, Piece::Chars { start: done, count }, count * width);
                }
                Phase::Runs(done) => {
                    let total = s.format_runs().len();
                    if done == total {
                        self.phase = Phase::Extension(0);
                        continue;
                    }
                    let count = (room / RUN_ENTRY_SIZE).min(total - done);
                    if count == 0 {
                        return Step::CloseFrame;
                    }
                    self.phase = Phase::Runs(done + count);
                    return piece(
                        string,
                        Piece::Runs { start: done, count },
                        count * RUN_ENTRY_SIZE,
                    );
                }
                Phase::Extension(done) => {
                    let total = s.extension_data().len();
                    if done == total {
                        self.phase = Phase::Done;
                        continue;
                    }
                    let len = room.min(total - done);
                    if len == 0 {
                        return Step::CloseFrame;
                    }
                    self.phase = Phase::Extension(done + len);
                    return piece(string, Piece::Extension { start: done, len }, len);
                }
                Phase::Done => {
                    self.index += 1;
                    self.phase = Phase::Start;
                }
            }
        }
    }

    /// Walk the remaining pieces as if laid out from a fresh frame onwards,
    /// returning the frame payload lengths they would occupy.
    pub(crate) fn remaining_frames(&mut self, first_capacity: usize) -> Vec<usize> {
        let mut frames = Vec::new();
        let mut capacity = first_capacity;
        let mut used = 0;
        loop {
            match self.next(capacity - used, used == 0) {
                Step::Piece { len, .. } => used += len,
                Step::CloseFrame => {
                    // capacity always exceeds the largest unsplittable piece
                    debug_assert!(used > 0, "frame closed before anything was placed");
                    frames.push(used);
                    used = 0;
                    capacity = CONT_CAPACITY;
                }
                Step::Finished => {
                    frames.push(used);
                    return frames;
                }
            }
        }
    }
}

fn piece(string: usize, piece: Piece, len: usize) -> Step {
    Step::Piece { string, piece, len }
}
