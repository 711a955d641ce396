use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::BlockKind;
use crate::timer::{BlockState, EndReason};

/// Every state change in the engine produces an Event.
/// Commands and ticks return them; the runtime re-broadcasts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    BlockStarted {
        block_id: Uuid,
        index: usize,
        kind: BlockKind,
        remaining_secs: u64,
        deadline: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    BlockPaused {
        block_id: Uuid,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    BlockResumed {
        block_id: Uuid,
        remaining_secs: u64,
        deadline: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    /// The countdown of the current block reached zero.
    TimeUp {
        block_id: Uuid,
        index: usize,
        at: DateTime<Utc>,
    },
    BlockEnded {
        block_id: Uuid,
        kind: BlockKind,
        reason: EndReason,
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    ReminderFired {
        block_id: Uuid,
        reminder_id: Uuid,
        message: String,
        sound_enabled: bool,
        at: DateTime<Utc>,
    },
    /// Returned to idle with progress saved on the block.
    Stopped {
        block_id: Option<Uuid>,
        at: DateTime<Utc>,
    },
    Reset {
        at: DateTime<Utc>,
    },
    /// The current block was deleted from the store.
    CurrentBlockRemoved {
        block_id: Uuid,
        at: DateTime<Utc>,
    },
    DailyStatsRolledOver {
        date: NaiveDate,
        at: DateTime<Utc>,
    },
    BlocksRefreshed {
        at: DateTime<Utc>,
    },
    ConfigApplied {
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: BlockState,
        current_block_index: Option<usize>,
        block_id: Option<Uuid>,
        block_name: Option<String>,
        kind: Option<BlockKind>,
        remaining_secs: u64,
        formatted_remaining: String,
        completed_work_blocks_in_set: u32,
        is_next_break_long: bool,
        at: DateTime<Utc>,
    },
}
