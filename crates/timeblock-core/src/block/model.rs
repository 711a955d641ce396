use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BlockKind {
    Work,
    ShortBreak,
    LongBreak,
}

impl BlockKind {
    pub fn is_break(self) -> bool {
        !matches!(self, BlockKind::Work)
    }

    pub fn label(self) -> &'static str {
        match self {
            BlockKind::Work => "Work",
            BlockKind::ShortBreak => "Short Break",
            BlockKind::LongBreak => "Long Break",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockColor {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Gray,
}

/// A mid-block reminder, fired once per activation when the elapsed time
/// equals `trigger_time_seconds`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: Uuid,
    /// Seconds from block start.
    pub trigger_time_seconds: u64,
    pub message: String,
    #[serde(default = "default_true")]
    pub sound_enabled: bool,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Reminder {
    pub fn new(trigger_time_seconds: u64, message: impl Into<String>, sound_enabled: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            trigger_time_seconds,
            message: message.into(),
            sound_enabled,
            enabled: true,
        }
    }

    /// Whether this reminder is due at `remaining_seconds` into a block of
    /// `duration_minutes`. Exact match only.
    pub fn is_due(&self, remaining_seconds: u64, duration_minutes: u32) -> bool {
        if !self.enabled {
            return false;
        }
        let total = minutes_to_secs(duration_minutes);
        match total.checked_sub(remaining_seconds) {
            Some(elapsed) => elapsed == self.trigger_time_seconds,
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Block {
    pub id: Uuid,
    pub name: String,
    /// Duration in minutes. 0 means "use the configured default for this kind".
    pub duration_minutes: u32,
    pub kind: BlockKind,
    pub color: BlockColor,
    #[serde(default)]
    pub is_active: bool,
    /// Unfinished progress carried between activations.
    #[serde(default)]
    pub saved_remaining_seconds: Option<u64>,
    #[serde(default)]
    pub reminders: Vec<Reminder>,
}

impl Block {
    pub fn new(name: impl Into<String>, duration_minutes: u32, kind: BlockKind, color: BlockColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            duration_minutes,
            kind,
            color,
            is_active: false,
            saved_remaining_seconds: None,
            reminders: Vec::new(),
        }
    }

    /// The canonical starter block for a kind.
    pub fn starter(kind: BlockKind) -> Self {
        match kind {
            BlockKind::Work => Self::new("Work", 0, kind, BlockColor::Red),
            BlockKind::ShortBreak => Self::new("Short Break", 5, kind, BlockColor::Green),
            BlockKind::LongBreak => Self::new("Long Break", 15, kind, BlockColor::Blue),
        }
    }

    pub fn duration_secs(&self) -> u64 {
        minutes_to_secs(self.duration_minutes)
    }

    /// Seconds a fresh activation should count down from.
    ///
    /// A block that was run to completion (`Some(0)`) starts over.
    pub fn starting_seconds(&self) -> u64 {
        match self.saved_remaining_seconds {
            Some(saved) if saved > 0 => saved.min(self.duration_secs()),
            _ => self.duration_secs(),
        }
    }

    /// Pull saved progress and reminder triggers back within the block's
    /// length. Returns whether anything changed.
    pub fn clamp_to_duration(&mut self) -> bool {
        let full = self.duration_secs();
        let mut changed = false;
        if let Some(saved) = self.saved_remaining_seconds.filter(|&saved| saved > full) {
            tracing::warn!(block_id = %self.id, saved, full, "saved progress beyond block length");
            self.saved_remaining_seconds = Some(full);
            changed = true;
        }
        for reminder in &mut self.reminders {
            if reminder.trigger_time_seconds > full {
                reminder.trigger_time_seconds = full;
                changed = true;
            }
        }
        changed
    }

    pub fn reminder(&self, id: Uuid) -> Option<&Reminder> {
        self.reminders.iter().find(|r| r.id == id)
    }
}

/// Partial update for [`Block`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockPatch {
    pub name: Option<String>,
    pub duration_minutes: Option<u32>,
    pub kind: Option<BlockKind>,
    pub color: Option<BlockColor>,
}

impl BlockPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.duration_minutes.is_none()
            && self.kind.is_none()
            && self.color.is_none()
    }
}

/// Partial update for [`Reminder`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderPatch {
    pub trigger_time_seconds: Option<u64>,
    pub message: Option<String>,
    pub sound_enabled: Option<bool>,
    pub enabled: Option<bool>,
}

pub(crate) fn minutes_to_secs(minutes: u32) -> u64 {
    u64::from(minutes).saturating_mul(60)
}

fn default_true() -> bool {
    true
}
