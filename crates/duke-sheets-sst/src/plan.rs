//! Size planner: how many frames a table occupies and how long each one is.

use crate::layout::{Layout, CONT_OVERHEAD, HEAD_CAPACITY, HEAD_OVERHEAD};
use crate::table::StringTable;

/// Payload length of every frame of one SST, head frame first.
///
/// Lengths count string bytes only; the head frame's two count fields and
/// each frame's record header are overhead on top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FramePlan {
    frames: Vec<usize>,
}

impl FramePlan {
    /// String payload length of each frame.
    pub fn frame_lengths(&self) -> &[usize] {
        &self.frames
    }

    /// Number of frames (1 head + continuations).
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Length field of frame `index`'s record (counts included for the head).
    pub fn record_body_len(&self, index: usize) -> Option<usize> {
        let payload = *self.frames.get(index)?;
        Some(if index == 0 {
            payload + HEAD_OVERHEAD - CONT_OVERHEAD
        } else {
            payload
        })
    }

    /// Bytes occupied by all frames, record headers included.
    pub fn total_record_bytes(&self) -> usize {
        let continuations = self.frames.len().saturating_sub(1);
        HEAD_OVERHEAD + continuations * CONT_OVERHEAD + self.frames.iter().sum::<usize>()
    }
}

/// Compute the frame plan for `table` without producing any bytes.
pub fn plan_frames(table: &StringTable) -> FramePlan {
    let strings = table.as_slice();
    let unsplit: usize = strings.iter().map(|s| s.encoded_len()).sum();

    let frames = if unsplit <= HEAD_CAPACITY {
        vec![unsplit]
    } else {
        Layout::new(strings).remaining_frames(HEAD_CAPACITY)
    };

    let plan = FramePlan { frames };
    log::debug!(
        "SST plan: {} strings in {} frame(s), {} bytes",
        strings.len(),
        plan.frame_count(),
        plan.total_record_bytes()
    );
    plan
}
