//! Frame serializer: emits the SST head frame and its continuation frames
//! following a [`FramePlan`].

use crate::biff::records;
use crate::biff::strings::{pack_flags, write_code_units, write_runs, StringHeader};
use crate::error::{SstError, SstResult};
use crate::layout::{Layout, Piece, Step, CONT_CAPACITY};
use crate::plan::{plan_frames, FramePlan};
use crate::string::{StringFlags, UnicodeString};
use crate::table::StringTable;

/// Which record a frame body belongs in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    /// The SST record itself
    Head,
    /// A CONTINUE record
    Continuation,
}

impl FrameKind {
    pub fn record_type(self) -> u16 {
        match self {
            FrameKind::Head => records::SST,
            FrameKind::Continuation => records::CONTINUE,
        }
    }
}

/// Where a string's first byte (its count) landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StringAnchor {
    /// Frame index (0 = head)
    pub frame: usize,
    /// Offset inside the frame body; for the head this includes the 8 count bytes.
    pub offset: usize,
}

/// Emit the frames of `table` as laid out by `plan`.
///
/// `emit` receives each record body in order (head first, record header not
/// included). Returns the anchor of every string, in table order.
///
/// Fails with [`SstError::PlanSerializeMismatch`] if `plan` was not computed
/// for this table; nothing past the diverging frame is emitted.
pub fn serialize_frames<F>(
    table: &StringTable,
    plan: &FramePlan,
    mut emit: F,
) -> SstResult<Vec<StringAnchor>>
where
    F: FnMut(FrameKind, &[u8]) -> SstResult<()>,
{
    let strings = table.as_slice();
    let mut layout = Layout::new(strings);
    let mut anchors = Vec::with_capacity(strings.len());
    let mut units = CodeUnits::default();

    for (frame, &planned) in plan.frame_lengths().iter().enumerate() {
        let (kind, mut body) = if frame == 0 {
            let mut body = Vec::with_capacity(planned + 8);
            body.extend_from_slice(&table.total_reference_count().to_le_bytes());
            body.extend_from_slice(&table.unique_count().to_le_bytes());
            (FrameKind::Head, body)
        } else {
            (FrameKind::Continuation, Vec::with_capacity(planned))
        };
        let base = body.len();

        loop {
            let used = body.len() - base;
            match layout.next(planned.saturating_sub(used), used == 0) {
                Step::Piece { string, piece, .. } => {
                    let s = &strings[string];
                    if matches!(piece, Piece::CharCount | Piece::Header { with_count: true }) {
                        anchors.push(StringAnchor {
                            frame,
                            offset: body.len(),
                        });
                    }
                    write_piece(&mut body, s, piece, units.get(string, s));
                }
                Step::CloseFrame | Step::Finished => break,
            }
        }

        let written = body.len() - base;
        if written != planned {
            return Err(SstError::PlanSerializeMismatch {
                frame,
                planned,
                written,
            });
        }
        log::trace!("SST frame {frame}: {:?}, {} bytes", kind, body.len());
        emit(kind, &body)?;
    }

    let leftover: usize = layout.remaining_frames(CONT_CAPACITY).iter().sum();
    if leftover > 0 {
        return Err(SstError::PlanSerializeMismatch {
            frame: plan.frame_count(),
            planned: 0,
            written: leftover,
        });
    }

    Ok(anchors)
}

/// Plan and serialize `table`, returning the record bodies in order.
pub fn encode_sst(table: &StringTable) -> SstResult<Vec<Vec<u8>>> {
    let plan = plan_frames(table);
    let mut bodies = Vec::with_capacity(plan.frame_count());
    serialize_frames(table, &plan, |_, body| {
        bodies.push(body.to_vec());
        Ok(())
    })?;
    Ok(bodies)
}

fn write_piece(out: &mut Vec<u8>, s: &UnicodeString, piece: Piece, units: &[u16]) {
    match piece {
        Piece::CharCount => out.extend_from_slice(&s.char_count().to_le_bytes()),
        Piece::Header { with_count } => StringHeader::of(s).write(out, with_count),
        Piece::RestatedFlags => out.push(pack_flags(StringFlags {
            is_wide: s.is_wide(),
            ..Default::default()
        })),
        Piece::Chars { start, count } => {
            write_code_units(out, &units[start..start + count], s.width())
        }
        Piece::Runs { start, count } => write_runs(out, &s.format_runs()[start..start + count]),
        Piece::Extension { start, len } => {
            out.extend_from_slice(&s.extension_data()[start..start + len])
        }
    }
}

/// Code units of the string currently being written.
#[derive(Default)]
struct CodeUnits {
    index: Option<usize>,
    units: Vec<u16>,
}

impl CodeUnits {
    fn get(&mut self, index: usize, s: &UnicodeString) -> &[u16] {
        if self.index != Some(index) {
            self.units.clear();
            self.units.extend(s.text().encode_utf16());
            self.index = Some(index);
        }
        &self.units
    }
}
