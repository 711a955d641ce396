//! Ordered, id-addressed collection of blocks and their reminders.
//!
//! The store is pure data: it knows nothing about the running countdown.
//! Callers that track a current block by index use the returned
//! [`BlockUpdate`] / removal index to keep their reference valid.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::{minutes_to_secs, Block, BlockColor, BlockKind, BlockPatch, Reminder, ReminderPatch};

/// Outcome of a successful [`BlockStore::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockUpdate {
    pub index: usize,
    /// Previous duration when the patch changed it.
    pub previous_duration: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockStore {
    blocks: Vec<Block>,
}

impl BlockStore {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    /// Work, short break, long break.
    pub fn starter() -> Self {
        Self::new(vec![
            Block::starter(BlockKind::Work),
            Block::starter(BlockKind::ShortBreak),
            Block::starter(BlockKind::LongBreak),
        ])
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn get(&self, id: Uuid) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == id)
    }

    pub fn at(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    pub(crate) fn at_mut(&mut self, index: usize) -> Option<&mut Block> {
        self.blocks.get_mut(index)
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Block> {
        self.blocks.iter_mut()
    }

    pub fn index_of(&self, id: Uuid) -> Option<usize> {
        self.blocks.iter().position(|b| b.id == id)
    }

    /// First block in store order with the given kind.
    pub fn first_of_kind(&self, kind: BlockKind) -> Option<usize> {
        self.blocks.iter().position(|b| b.kind == kind)
    }

    /// Sum of work block durations, in minutes.
    pub fn work_target_minutes(&self) -> u32 {
        self.blocks
            .iter()
            .filter(|b| b.kind == BlockKind::Work)
            .map(|b| b.duration_minutes)
            .sum()
    }

    // ── Block mutations ──────────────────────────────────────────────

    pub fn add(&mut self, name: impl Into<String>, duration_minutes: u32, kind: BlockKind, color: BlockColor) -> Uuid {
        let block = Block::new(name, duration_minutes, kind, color);
        let id = block.id;
        self.blocks.push(block);
        id
    }

    /// Apply a partial update. Returns `None` for an unknown id.
    ///
    /// A duration change rescales `saved_remaining_seconds` to keep the
    /// elapsed fraction and clamps reminder triggers to the new length.
    pub fn update(&mut self, id: Uuid, patch: BlockPatch) -> Option<BlockUpdate> {
        let index = self.index_of(id)?;
        let block = &mut self.blocks[index];

        if let Some(name) = patch.name {
            block.name = name;
        }

        let mut previous_duration = None;
        if let Some(duration) = patch.duration_minutes {
            let old = block.duration_minutes;
            block.duration_minutes = duration;
            block.saved_remaining_seconds = Some(rescale_saved(block.saved_remaining_seconds, old, duration));
            let max_trigger = block.duration_secs();
            for reminder in &mut block.reminders {
                reminder.trigger_time_seconds = reminder.trigger_time_seconds.min(max_trigger);
            }
            previous_duration = Some(old);
        }

        if let Some(kind) = patch.kind {
            block.kind = kind;
        }
        if let Some(color) = patch.color {
            block.color = color;
        }

        Some(BlockUpdate { index, previous_duration })
    }

    /// Remove a block. Returns its former index.
    pub fn delete(&mut self, id: Uuid) -> Option<(usize, Block)> {
        let index = self.index_of(id)?;
        Some((index, self.blocks.remove(index)))
    }

    /// Move the block at `from` so it ends up at `to`. Returns `None`
    /// without reordering when either index is out of range.
    pub fn move_block(&mut self, from: usize, to: usize) -> Option<usize> {
        if from >= self.blocks.len() || to >= self.blocks.len() {
            return None;
        }
        let block = self.blocks.remove(from);
        self.blocks.insert(to, block);
        Some(to)
    }

    /// Every block back to its full duration.
    pub fn refresh_all(&mut self) {
        for block in &mut self.blocks {
            block.saved_remaining_seconds = Some(block.duration_secs());
        }
    }

    // ── Reminder mutations ───────────────────────────────────────────

    /// Returns `None` when the block is unknown or the trigger falls beyond
    /// the block's duration.
    pub fn add_reminder(
        &mut self,
        block_id: Uuid,
        trigger_time_seconds: u64,
        message: impl Into<String>,
        sound_enabled: bool,
    ) -> Option<Uuid> {
        let index = self.index_of(block_id)?;
        let block = &mut self.blocks[index];
        if trigger_time_seconds > block.duration_secs() {
            return None;
        }
        let reminder = Reminder::new(trigger_time_seconds, message, sound_enabled);
        let id = reminder.id;
        block.reminders.push(reminder);
        Some(id)
    }

    pub fn update_reminder(&mut self, block_id: Uuid, reminder_id: Uuid, patch: ReminderPatch) -> bool {
        let Some(index) = self.index_of(block_id) else {
            return false;
        };
        let block = &mut self.blocks[index];
        let max_trigger = block.duration_secs();
        let Some(reminder) = block.reminders.iter_mut().find(|r| r.id == reminder_id) else {
            return false;
        };
        if matches!(patch.trigger_time_seconds, Some(t) if t > max_trigger) {
            return false;
        }

        if let Some(trigger) = patch.trigger_time_seconds {
            reminder.trigger_time_seconds = trigger;
        }
        if let Some(message) = patch.message {
            reminder.message = message;
        }
        if let Some(sound) = patch.sound_enabled {
            reminder.sound_enabled = sound;
        }
        if let Some(enabled) = patch.enabled {
            reminder.enabled = enabled;
        }
        true
    }

    pub fn delete_reminder(&mut self, block_id: Uuid, reminder_id: Uuid) -> bool {
        let Some(index) = self.index_of(block_id) else {
            return false;
        };
        let reminders = &mut self.blocks[index].reminders;
        let before = reminders.len();
        reminders.retain(|r| r.id != reminder_id);
        reminders.len() != before
    }
}

/// Carry saved progress across a duration change.
///
/// Keeps the elapsed fraction of the old duration, except that an unstarted
/// block (saved == old full length), a missing value, or an old duration of
/// zero snap to the new full length.
pub fn rescale_saved(saved: Option<u64>, old_minutes: u32, new_minutes: u32) -> u64 {
    let new_full = minutes_to_secs(new_minutes);
    let old_full = minutes_to_secs(old_minutes);
    match saved {
        Some(saved) if saved != old_full && old_minutes > 0 => {
            let scaled = u128::from(saved) * u128::from(new_minutes) / u128::from(old_minutes);
            u64::try_from(scaled).unwrap_or(u64::MAX).min(new_full)
        }
        _ => new_full,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn store_with_work(duration: u32) -> (BlockStore, Uuid) {
        let mut store = BlockStore::default();
        let id = store.add("Focus", duration, BlockKind::Work, BlockColor::Red);
        (store, id)
    }

    #[test]
    fn starter_set_has_one_of_each_kind() {
        let store = BlockStore::starter();
        assert_eq!(store.len(), 3);
        assert_eq!(store.first_of_kind(BlockKind::Work), Some(0));
        assert_eq!(store.first_of_kind(BlockKind::ShortBreak), Some(1));
        assert_eq!(store.first_of_kind(BlockKind::LongBreak), Some(2));
        assert_eq!(store.blocks()[0].duration_minutes, 0);
    }

    #[test]
    fn rescale_keeps_elapsed_fraction() {
        // 10 min block, half done -> 20 min block, half done
        assert_eq!(rescale_saved(Some(300), 10, 20), 600);
    }

    #[test]
    fn rescale_snaps_unstarted_and_zero_duration() {
        assert_eq!(rescale_saved(Some(600), 10, 25), 1500);
        assert_eq!(rescale_saved(Some(0), 0, 25), 1500);
        assert_eq!(rescale_saved(None, 10, 25), 1500);
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let (mut store, _) = store_with_work(25);
        let before = store.clone();
        assert!(store.update(Uuid::new_v4(), BlockPatch { name: Some("x".into()), ..Default::default() }).is_none());
        assert_eq!(store, before);
    }

    #[test]
    fn update_duration_rescales_and_clamps_reminders() {
        let (mut store, id) = store_with_work(10);
        let reminder = store.add_reminder(id, 540, "almost", true).unwrap();
        store.at_mut(0).unwrap().saved_remaining_seconds = Some(150);

        let outcome = store
            .update(id, BlockPatch { duration_minutes: Some(5), ..Default::default() })
            .unwrap();
        assert_eq!(outcome, BlockUpdate { index: 0, previous_duration: Some(10) });

        let block = store.get(id).unwrap();
        assert_eq!(block.saved_remaining_seconds, Some(75));
        assert_eq!(block.reminder(reminder).unwrap().trigger_time_seconds, 300);
    }

    #[test]
    fn move_block_reorders() {
        let mut store = BlockStore::starter();
        let work = store.blocks()[0].id;
        assert_eq!(store.move_block(0, 2), Some(2));
        assert_eq!(store.index_of(work), Some(2));
        assert_eq!(store.move_block(7, 0), None);
    }

    #[test]
    fn move_block_out_of_range_target_is_noop() {
        let mut store = BlockStore::starter();
        let before = store.clone();
        assert_eq!(store.move_block(0, 3), None);
        assert_eq!(store.move_block(0, 99), None);
        assert_eq!(store, before);
    }

    #[test]
    fn delete_returns_former_index() {
        let mut store = BlockStore::starter();
        let id = store.blocks()[1].id;
        let (index, block) = store.delete(id).unwrap();
        assert_eq!(index, 1);
        assert_eq!(block.kind, BlockKind::ShortBreak);
        assert!(store.delete(id).is_none());
    }

    #[test]
    fn reminder_beyond_duration_rejected() {
        let (mut store, id) = store_with_work(1);
        assert!(store.add_reminder(id, 61, "late", false).is_none());
        let rid = store.add_reminder(id, 60, "on time", false).unwrap();
        assert!(!store.update_reminder(id, rid, ReminderPatch { trigger_time_seconds: Some(61), ..Default::default() }));
        assert!(store.update_reminder(id, rid, ReminderPatch { enabled: Some(false), ..Default::default() }));
        assert!(!store.get(id).unwrap().reminder(rid).unwrap().enabled);
        assert!(store.delete_reminder(id, rid));
        assert!(!store.delete_reminder(id, rid));
    }

    #[test]
    fn refresh_all_restores_full_durations() {
        let mut store = BlockStore::starter();
        store.at_mut(1).unwrap().saved_remaining_seconds = Some(12);
        store.refresh_all();
        assert_eq!(store.blocks()[1].saved_remaining_seconds, Some(300));
        assert_eq!(store.blocks()[0].saved_remaining_seconds, Some(0));
    }

    proptest! {
        #[test]
        fn saved_remaining_stays_within_duration(
            start in 0u32..600,
            edits in proptest::collection::vec(0u32..600, 1..8),
            progress in 0.0f64..1.0,
        ) {
            let (mut store, id) = store_with_work(start);
            let full = u64::from(start) * 60;
            store.at_mut(0).unwrap().saved_remaining_seconds = Some((full as f64 * progress) as u64);
            for duration in edits {
                store.update(id, BlockPatch { duration_minutes: Some(duration), ..Default::default() });
                let block = store.get(id).unwrap();
                let saved = block.saved_remaining_seconds.unwrap();
                prop_assert!(saved <= block.duration_secs());
            }
        }
    }
}
