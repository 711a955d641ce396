//! Per-activation reminder tracking.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::Block;

/// A reminder that came due during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FiredReminder {
    pub block_id: Uuid,
    pub reminder_id: Uuid,
    pub message: String,
    pub sound_enabled: bool,
}

/// Remembers which reminders already fired in the current activation.
///
/// Cleared on a fresh start only; pause/resume keeps the set, so a reminder
/// fires at most once per activation. A trigger second that is never ticked
/// through (e.g. paused across it) is simply missed.
#[derive(Debug, Clone, Default)]
pub struct ReminderScheduler {
    fired: HashSet<Uuid>,
}

impl ReminderScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Begin a new activation.
    pub fn reset(&mut self) {
        self.fired.clear();
    }

    pub fn has_fired(&self, reminder_id: Uuid) -> bool {
        self.fired.contains(&reminder_id)
    }

    /// Collect the reminders of `block` due at `remaining_seconds`.
    pub fn evaluate(&mut self, block: &Block, remaining_seconds: u64) -> Vec<FiredReminder> {
        let mut due = Vec::new();
        for reminder in &block.reminders {
            if !reminder.enabled || self.fired.contains(&reminder.id) {
                continue;
            }
            if reminder.is_due(remaining_seconds, block.duration_minutes) {
                self.fired.insert(reminder.id);
                due.push(FiredReminder {
                    block_id: block.id,
                    reminder_id: reminder.id,
                    message: reminder.message.clone(),
                    sound_enabled: reminder.sound_enabled,
                });
            }
        }
        due
    }
}
