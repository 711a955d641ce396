//! Work/break sequencing.
//!
//! Decides which block follows one that finished or was skipped, and owns the
//! work-set counter that promotes every N-th break to a long break.

use serde::{Deserialize, Serialize};

use crate::block::{BlockKind, BlockStore};

/// Why a block left the `active` state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndReason {
    /// The countdown reached zero.
    Completed,
    /// The user skipped ahead.
    Skipped,
}

/// Restart-survivable progress through a work set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetProgress {
    pub completed_work_blocks_in_set: u32,
    pub is_next_break_long: bool,
}

/// What the engine should do once a block has ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextStep {
    /// Start the block at this store index.
    Start(usize),
    /// Return to idle.
    Idle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencingPolicy {
    pub work_intervals_in_set: u32,
    pub stop_after_break: bool,
}

impl Default for SequencingPolicy {
    fn default() -> Self {
        Self {
            work_intervals_in_set: 4,
            stop_after_break: false,
        }
    }
}

impl SequencingPolicy {
    /// Count a finished/skipped block against the current set.
    pub fn record_end(&self, kind: BlockKind, progress: &mut SetProgress) {
        if kind != BlockKind::Work {
            return;
        }
        progress.completed_work_blocks_in_set += 1;
        if progress.completed_work_blocks_in_set >= self.work_intervals_in_set.max(1) {
            progress.is_next_break_long = true;
            progress.completed_work_blocks_in_set = 0;
        } else {
            progress.is_next_break_long = false;
        }
    }

    /// Kind of block to run after `ended`, or `None` to stop.
    pub fn target_kind(&self, ended: BlockKind, progress: &SetProgress) -> Option<BlockKind> {
        match ended {
            BlockKind::Work if progress.is_next_break_long => Some(BlockKind::LongBreak),
            BlockKind::Work => Some(BlockKind::ShortBreak),
            BlockKind::ShortBreak | BlockKind::LongBreak if self.stop_after_break => None,
            BlockKind::ShortBreak | BlockKind::LongBreak => Some(BlockKind::Work),
        }
    }

    /// Record the end of a block and pick its successor: the first block in
    /// store order of the target kind.
    pub fn next(&self, ended: BlockKind, progress: &mut SetProgress, blocks: &BlockStore) -> NextStep {
        self.record_end(ended, progress);
        self.target_kind(ended, progress)
            .and_then(|kind| blocks.first_of_kind(kind))
            .map_or(NextStep::Idle, NextStep::Start)
    }
}
