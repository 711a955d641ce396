//! Block engine.
//!
//! The engine owns the block store, the lifecycle state machine, the live
//! countdown counter, set progress, reminder tracking, stats and the owned
//! configuration. It does not use internal threads: the caller drives it by
//! calling `tick()` once per second while [`BlockEngine::countdown_running`]
//! is true, and by calling `take_due_writes()` periodically to collect
//! coalesced persistence writes.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = BlockEngine::new(Config::default());
//! engine.start(0);
//! // Once per second:
//! for event in engine.tick() { /* ... */ }
//! ```
//!
//! Commands given stale indices or unknown ids return no events and leave
//! the engine unchanged.

use std::time::Instant;

use chrono::{DateTime, Local, NaiveDate, Utc};
use uuid::Uuid;

use super::countdown::Countdown;
use super::format::{format_minutes, format_remaining};
use super::reminders::ReminderScheduler;
use super::sequencing::{EndReason, NextStep, SequencingPolicy, SetProgress};
use super::state::{BlockEvent, BlockState, StateMachine};
use crate::block::{Block, BlockColor, BlockKind, BlockPatch, BlockStore, ReminderPatch};
use crate::control::ControlCommand;
use crate::error::{ConfigError, StoreError};
use crate::events::Event;
use crate::sinks::{AudioCues, Cue, Notification, NotificationAction, NotificationCategory, Notifier, NullSink};
use crate::stats::{DailyStats, HistoricalStats, Stats};
use crate::storage::documents::{load_blocks, load_run_state, load_stats};
use crate::storage::{Config, Document, DocumentStore, PendingWrite, RunStateSnapshot, WriteScheduler};

pub struct BlockEngine {
    blocks: BlockStore,
    machine: StateMachine,
    current_index: Option<usize>,
    remaining_seconds: u64,
    progress: SetProgress,
    countdown: Countdown,
    reminders: ReminderScheduler,
    stats: Stats,
    config: Config,
    policy: SequencingPolicy,
    writes: WriteScheduler,
    notifier: Box<dyn Notifier>,
    audio: Box<dyn AudioCues>,
}

impl BlockEngine {
    /// A fresh engine with the starter blocks and zeroed stats.
    pub fn new(config: Config) -> Self {
        Self::from_parts(
            config,
            BlockStore::starter(),
            SetProgress::default(),
            Stats {
                daily: DailyStats::new(Local::now().date_naive()),
                historical: HistoricalStats::default(),
            },
        )
    }

    /// Restore from `store`. Missing or corrupt documents fall back to
    /// defaults; the engine always comes up idle with only the set progress
    /// carried over.
    pub fn load(store: &dyn DocumentStore, config: Config) -> Self {
        Self::load_on(store, config, Local::now().date_naive())
    }

    pub fn load_on(store: &dyn DocumentStore, config: Config, today: NaiveDate) -> Self {
        let mut blocks = load_blocks(store);
        for block in blocks.iter_mut() {
            block.is_active = false;
        }
        let run_state = load_run_state(store);
        let stats = load_stats(store, today);
        tracing::info!(
            blocks = blocks.len(),
            completed_work_blocks_in_set = run_state.completed_work_blocks_in_set,
            "engine state loaded"
        );
        let mut engine = Self::from_parts(config, blocks, run_state.set_progress(), stats);
        // Persist the idle run-state over whatever was running before.
        engine.writes.mark(Document::RunState);
        engine
    }

    fn from_parts(config: Config, blocks: BlockStore, progress: SetProgress, stats: Stats) -> Self {
        let p = &config.persistence;
        let writes = WriteScheduler::new(p.state_window(), p.state_max_wait(), p.stats_window(), p.stats_max_wait());
        let mut engine = Self {
            blocks,
            machine: StateMachine::new(),
            current_index: None,
            remaining_seconds: 0,
            progress,
            countdown: Countdown::new(),
            reminders: ReminderScheduler::new(),
            stats,
            policy: config.sequencing_policy(),
            config,
            writes,
            notifier: Box::new(NullSink),
            audio: Box::new(NullSink),
        };
        let resolved = engine.resolve_default_durations();
        let mut clamped = false;
        for block in engine.blocks.iter_mut() {
            clamped |= block.clamp_to_duration();
        }
        if resolved || clamped {
            engine.writes.mark(Document::Blocks);
        }
        engine
    }

    /// Replace the notification and audio sinks.
    pub fn with_sinks(mut self, notifier: Box<dyn Notifier>, audio: Box<dyn AudioCues>) -> Self {
        self.notifier = notifier;
        self.audio = audio;
        self
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn current_block(&self) -> Option<&Block> {
        self.current_index.and_then(|i| self.blocks.at(i))
    }

    pub fn current_block_index(&self) -> Option<usize> {
        self.current_index
    }

    pub fn current_state(&self) -> BlockState {
        self.machine.state()
    }

    pub fn remaining_seconds(&self) -> u64 {
        self.remaining_seconds
    }

    pub fn formatted_remaining(&self) -> String {
        format_remaining(self.remaining_seconds)
    }

    pub fn blocks(&self) -> &[Block] {
        self.blocks.blocks()
    }

    /// Live remaining time for the current block, saved progress (or the
    /// full length) for any other. `None` for an unknown id.
    pub fn remaining_seconds_for(&self, block_id: Uuid) -> Option<u64> {
        if self.current_block().is_some_and(|b| b.id == block_id) {
            return Some(self.remaining_seconds);
        }
        let block = self.blocks.get(block_id)?;
        Some(block.saved_remaining_seconds.unwrap_or_else(|| block.duration_secs()))
    }

    pub fn daily_stats(&self) -> &DailyStats {
        &self.stats.daily
    }

    pub fn historical_stats(&self) -> &HistoricalStats {
        &self.stats.historical
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn today_work_target_minutes(&self) -> u32 {
        self.blocks.work_target_minutes()
    }

    pub fn formatted_work_target(&self) -> String {
        format_minutes(self.today_work_target_minutes())
    }

    pub fn set_progress(&self) -> SetProgress {
        self.progress
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.countdown.deadline()
    }

    /// Whether the 1 Hz source should be live.
    pub fn countdown_running(&self) -> bool {
        self.countdown.is_running()
    }

    pub fn run_state(&self) -> RunStateSnapshot {
        RunStateSnapshot {
            state: self.machine.state(),
            current_block_index: self.current_index,
            remaining_seconds: self.remaining_seconds,
            completed_work_blocks_in_set: self.progress.completed_work_blocks_in_set,
            is_next_break_long: self.progress.is_next_break_long,
        }
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        let block = self.current_block();
        Event::StateSnapshot {
            state: self.machine.state(),
            current_block_index: self.current_index,
            block_id: block.map(|b| b.id),
            block_name: block.map(|b| b.name.clone()),
            kind: block.map(|b| b.kind),
            remaining_secs: self.remaining_seconds,
            formatted_remaining: self.formatted_remaining(),
            completed_work_blocks_in_set: self.progress.completed_work_blocks_in_set,
            is_next_break_long: self.progress.is_next_break_long,
            at: Utc::now(),
        }
    }

    // ── Lifecycle commands ───────────────────────────────────────────

    /// Start the block at `index`, stopping (and saving) any block that is
    /// currently running or paused.
    pub fn start(&mut self, index: usize) -> Vec<Event> {
        if self.blocks.at(index).is_none() {
            return Vec::new();
        }
        let mut events = Vec::new();
        if matches!(self.machine.state(), BlockState::Active | BlockState::Paused) {
            events.extend(self.stop());
        }
        events.extend(self.activate(index));
        events
    }

    pub fn pause(&mut self) -> Vec<Event> {
        if self.machine.state() != BlockState::Active {
            return Vec::new();
        }
        let Some(index) = self.current_index else {
            return Vec::new();
        };
        self.machine.apply(BlockEvent::Pause);
        self.countdown.stop();
        self.audio.stop_loop();
        self.notifier.cancel_pending();

        let remaining = self.remaining_seconds;
        let Some(block) = self.blocks.at_mut(index) else {
            return Vec::new();
        };
        block.saved_remaining_seconds = Some(remaining);
        let (block_id, name) = (block.id, block.name.clone());
        self.notify(&name, "Paused", NotificationCategory::BlockPaused);
        self.mark_state_dirty();

        tracing::info!(block_id = %block_id, remaining_secs = remaining, "block paused");
        vec![Event::BlockPaused {
            block_id,
            remaining_secs: remaining,
            at: Utc::now(),
        }]
    }

    pub fn resume(&mut self) -> Vec<Event> {
        if self.machine.state() != BlockState::Paused {
            return Vec::new();
        }
        let Some((block_id, kind)) = self.current_block().map(|b| (b.id, b.kind)) else {
            return Vec::new();
        };
        self.machine.apply(BlockEvent::Resume);
        let deadline = self.arm_countdown();
        self.start_ticking(kind);
        self.mark_state_dirty();

        tracing::info!(block_id = %block_id, remaining_secs = self.remaining_seconds, "block resumed");
        vec![Event::BlockResumed {
            block_id,
            remaining_secs: self.remaining_seconds,
            deadline,
            at: Utc::now(),
        }]
    }

    /// End the active block early and move on per the sequencing policy.
    pub fn skip(&mut self) -> Vec<Event> {
        if self.machine.state() != BlockState::Active {
            return Vec::new();
        }
        self.end_current(EndReason::Skipped)
    }

    /// Save progress on the current block and return to idle.
    pub fn stop(&mut self) -> Vec<Event> {
        let Some(index) = self.current_index else {
            return Vec::new();
        };
        let block_id = self.park_current(index);
        self.machine.apply(BlockEvent::Reset);
        tracing::info!(block_id = ?block_id, "block stopped");
        vec![Event::Stopped { block_id, at: Utc::now() }]
    }

    /// Like [`stop`](Self::stop), and also start a new work set.
    pub fn reset(&mut self) -> Vec<Event> {
        let mut events = self.stop();
        self.progress = SetProgress::default();
        self.mark_state_dirty();
        events.push(Event::Reset { at: Utc::now() });
        events
    }

    /// Hotkey action: start the first block when idle, otherwise pause or
    /// resume.
    pub fn toggle(&mut self) -> Vec<Event> {
        match self.machine.state() {
            BlockState::Idle | BlockState::Finished => self.start(0),
            BlockState::Active => self.pause(),
            BlockState::Paused => self.resume(),
        }
    }

    pub fn handle_notification_action(&mut self, action: NotificationAction) -> Vec<Event> {
        tracing::debug!(?action, "notification action");
        match action {
            NotificationAction::SkipRest => match self.current_block() {
                Some(block) if block.kind.is_break() => self.skip(),
                _ => Vec::new(),
            },
            NotificationAction::PauseBlock => self.pause(),
            NotificationAction::ResumeBlock => self.resume(),
            NotificationAction::SkipBlock => self.skip(),
            NotificationAction::DismissReminder => Vec::new(),
        }
    }

    /// Run a parsed `timeblock://` command.
    pub fn apply_control(&mut self, command: ControlCommand) -> Vec<Event> {
        tracing::debug!(%command, "control command");
        match command {
            ControlCommand::StartStop => self.toggle(),
            ControlCommand::Pause => self.pause(),
            ControlCommand::Resume => self.resume(),
            ControlCommand::Skip => self.skip(),
        }
    }

    // ── Tick ─────────────────────────────────────────────────────────

    /// Advance the active block by one second.
    pub fn tick(&mut self) -> Vec<Event> {
        self.tick_on(Local::now().date_naive())
    }

    /// [`tick`](Self::tick) with an explicit calendar day for the stats
    /// rollover check.
    pub fn tick_on(&mut self, today: NaiveDate) -> Vec<Event> {
        if self.machine.state() != BlockState::Active {
            return Vec::new();
        }
        let Some(index) = self.current_index else {
            return Vec::new();
        };
        let Some(block) = self.blocks.at(index) else {
            return Vec::new();
        };
        let (block_id, kind) = (block.id, block.kind);
        let mut events = Vec::new();

        self.remaining_seconds = self.remaining_seconds.saturating_sub(1);

        if self.stats.daily.roll_over_if_stale(today) {
            tracing::info!(%today, "daily stats rolled over");
            events.push(Event::DailyStatsRolledOver { date: today, at: Utc::now() });
        }
        self.stats.daily.record(kind, 1);
        self.stats.historical.record(block_id, 1);
        self.writes.mark(Document::Stats);
        self.writes.mark(Document::RunState);

        let fired = match self.blocks.at(index) {
            Some(block) => self.reminders.evaluate(block, self.remaining_seconds),
            None => Vec::new(),
        };
        for reminder in fired {
            tracing::info!(block_id = %reminder.block_id, reminder_id = %reminder.reminder_id, "reminder fired");
            if reminder.sound_enabled {
                self.play(Cue::Ding);
            }
            let title = self.blocks.at(index).map(|b| b.name.clone()).unwrap_or_default();
            self.notify(&title, &reminder.message, NotificationCategory::Reminder);
            events.push(Event::ReminderFired {
                block_id: reminder.block_id,
                reminder_id: reminder.reminder_id,
                message: reminder.message,
                sound_enabled: reminder.sound_enabled,
                at: Utc::now(),
            });
        }

        if self.remaining_seconds == 0 {
            if let Some(block) = self.blocks.at_mut(index) {
                block.saved_remaining_seconds = Some(0);
            }
            tracing::info!(block_id = %block_id, "time up");
            events.push(Event::TimeUp { block_id, index, at: Utc::now() });
            events.extend(self.end_current(EndReason::Completed));
        }
        events
    }

    // ── Block CRUD ───────────────────────────────────────────────────

    /// Append a block. A duration of 0 takes the configured default for
    /// `kind`.
    pub fn add_block(&mut self, name: impl Into<String>, duration_minutes: u32, kind: BlockKind, color: BlockColor) -> Uuid {
        let duration = self.resolve_duration(duration_minutes, kind);
        let id = self.blocks.add(name, duration, kind, color);
        self.writes.mark(Document::Blocks);
        id
    }

    /// Apply a partial update. Changing the length of the running or paused
    /// current block restarts its countdown at the new full length.
    pub fn update_block(&mut self, id: Uuid, mut patch: BlockPatch) -> bool {
        let Some(kind) = self.blocks.get(id).map(|b| patch.kind.unwrap_or(b.kind)) else {
            return false;
        };
        if let Some(duration) = patch.duration_minutes {
            patch.duration_minutes = Some(self.resolve_duration(duration, kind));
        }
        let Some(outcome) = self.blocks.update(id, patch) else {
            return false;
        };

        let live = self.current_index == Some(outcome.index)
            && matches!(self.machine.state(), BlockState::Active | BlockState::Paused);
        if live && outcome.previous_duration.is_some() {
            if let Some(block) = self.blocks.at_mut(outcome.index) {
                let full = block.duration_secs();
                block.saved_remaining_seconds = Some(full);
                self.remaining_seconds = full;
            }
            if self.machine.state() == BlockState::Active {
                self.arm_countdown();
            }
            self.writes.mark(Document::RunState);
        }
        self.writes.mark(Document::Blocks);
        true
    }

    /// Remove a block. Deleting the current block stops it and returns the
    /// engine to idle.
    pub fn delete_block(&mut self, id: Uuid) -> Vec<Event> {
        let Some((index, _)) = self.blocks.delete(id) else {
            return Vec::new();
        };
        self.writes.mark(Document::Blocks);

        match self.current_index {
            Some(current) if current == index => {
                self.current_index = None;
                self.remaining_seconds = 0;
                self.countdown.stop();
                self.audio.stop_loop();
                self.notifier.cancel_pending();
                self.reminders.reset();
                self.machine.apply(BlockEvent::Reset);
                self.writes.mark(Document::RunState);
                tracing::info!(block_id = %id, "current block removed");
                vec![Event::CurrentBlockRemoved { block_id: id, at: Utc::now() }]
            }
            Some(current) if index < current => {
                self.current_index = Some(current - 1);
                self.writes.mark(Document::RunState);
                Vec::new()
            }
            _ => Vec::new(),
        }
    }

    /// Move the block at `from` to `to`. The current block keeps pointing at
    /// the same block.
    pub fn move_block(&mut self, from: usize, to: usize) -> bool {
        let Some(dest) = self.blocks.move_block(from, to) else {
            return false;
        };
        if let Some(current) = self.current_index {
            let moved = if current == from {
                dest
            } else if from < current && dest >= current {
                current - 1
            } else if from > current && dest <= current {
                current + 1
            } else {
                current
            };
            if moved != current {
                self.current_index = Some(moved);
                self.writes.mark(Document::RunState);
            }
        }
        self.writes.mark(Document::Blocks);
        true
    }

    /// Reset every block to its full length and zero today's counters. A
    /// live block rewinds to its full length and its reminders fire again.
    pub fn refresh_all(&mut self) -> Vec<Event> {
        self.blocks.refresh_all();
        if let Some(full) = self.current_block().map(Block::duration_secs) {
            self.remaining_seconds = full;
            self.reminders.reset();
            if self.machine.state() == BlockState::Active {
                self.arm_countdown();
            }
        }
        self.stats.daily.reset(Local::now().date_naive());
        for document in Document::ALL {
            self.writes.mark(document);
        }
        tracing::info!("all blocks refreshed");
        vec![Event::BlocksRefreshed { at: Utc::now() }]
    }

    // ── Reminder CRUD ────────────────────────────────────────────────

    pub fn add_reminder(
        &mut self,
        block_id: Uuid,
        trigger_time_seconds: u64,
        message: impl Into<String>,
        sound_enabled: bool,
    ) -> Option<Uuid> {
        let id = self.blocks.add_reminder(block_id, trigger_time_seconds, message, sound_enabled)?;
        self.writes.mark(Document::Blocks);
        Some(id)
    }

    pub fn update_reminder(&mut self, block_id: Uuid, reminder_id: Uuid, patch: ReminderPatch) -> bool {
        let updated = self.blocks.update_reminder(block_id, reminder_id, patch);
        if updated {
            self.writes.mark(Document::Blocks);
        }
        updated
    }

    pub fn delete_reminder(&mut self, block_id: Uuid, reminder_id: Uuid) -> bool {
        let deleted = self.blocks.delete_reminder(block_id, reminder_id);
        if deleted {
            self.writes.mark(Document::Blocks);
        }
        deleted
    }

    // ── Configuration ────────────────────────────────────────────────

    /// Replace the owned configuration. The persistence backend is only
    /// read when a store is opened, so changing it takes effect on restart.
    ///
    /// When a default length changes, the first block of that kind takes the
    /// new length through [`update_block`](Self::update_block), so a live
    /// block restarts at it.
    ///
    /// # Errors
    ///
    /// Returns the validation error and leaves the engine unchanged when
    /// `config` is invalid.
    pub fn apply_config(&mut self, config: Config) -> Result<Vec<Event>, ConfigError> {
        config.validate()?;
        let sounds_changed = config.sounds != self.config.sounds;
        let changed_lengths: Vec<(BlockKind, u32)> = [BlockKind::Work, BlockKind::ShortBreak, BlockKind::LongBreak]
            .into_iter()
            .map(|kind| (kind, config.default_duration(kind)))
            .filter(|&(kind, minutes)| minutes != self.config.default_duration(kind))
            .collect();
        let p = &config.persistence;
        self.writes
            .set_windows(p.state_window(), p.state_max_wait(), p.stats_window(), p.stats_max_wait());
        self.policy = config.sequencing_policy();
        self.config = config;

        if self.resolve_default_durations() {
            self.writes.mark(Document::Blocks);
        }
        for (kind, minutes) in changed_lengths {
            let first = self.blocks.first_of_kind(kind).and_then(|i| self.blocks.at(i)).map(|b| b.id);
            if let Some(id) = first {
                tracing::debug!(block_id = %id, minutes, "default length pushed to block");
                self.update_block(id, BlockPatch { duration_minutes: Some(minutes), ..Default::default() });
            }
        }
        if sounds_changed && self.machine.state() == BlockState::Active {
            if let Some(kind) = self.current_block().map(|b| b.kind) {
                self.audio.stop_loop();
                self.start_ticking(kind);
            }
        }
        tracing::info!("configuration applied");
        Ok(vec![Event::ConfigApplied { at: Utc::now() }])
    }

    // ── Persistence ──────────────────────────────────────────────────

    pub fn mark_dirty(&mut self, document: Document) {
        self.writes.mark(document);
    }

    /// Encoded writes for every document whose debounce is due at `now`.
    pub fn take_due_writes(&mut self, now: Instant) -> Vec<PendingWrite> {
        let due = self.writes.due(now);
        self.encode(due)
    }

    /// Encoded writes for every dirty document, ignoring debounce timing.
    pub fn flush_all(&mut self) -> Vec<PendingWrite> {
        let dirty = self.writes.take_dirty();
        self.encode(dirty)
    }

    /// Write every dirty document to `store` now. Failed documents stay
    /// dirty.
    ///
    /// # Errors
    ///
    /// Returns the first write error.
    pub fn persist_now(&mut self, store: &dyn DocumentStore) -> Result<(), StoreError> {
        let mut first_err = None;
        for write in self.flush_all() {
            if let Err(e) = write.write_to(store) {
                tracing::error!(document = write.document.key(), error = %e, "failed to write document");
                self.writes.mark(write.document);
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn encode(&mut self, mut documents: Vec<Document>) -> Vec<PendingWrite> {
        if documents.is_empty() {
            return Vec::new();
        }
        // Any snapshot carries the live block's progress.
        if self.sync_live_progress() && !documents.contains(&Document::Blocks) {
            documents.push(Document::Blocks);
            documents.sort();
        }

        let mut writes = Vec::with_capacity(documents.len());
        for document in documents {
            let encoded = match document {
                Document::Blocks => PendingWrite::encode(document, &self.blocks),
                Document::RunState => PendingWrite::encode(document, &self.run_state()),
                Document::Stats => PendingWrite::encode(document, &self.stats),
            };
            match encoded {
                Ok(write) => writes.push(write),
                Err(e) => {
                    tracing::error!(document = document.key(), error = %e, "failed to encode document");
                    self.writes.mark(document);
                }
            }
        }
        writes
    }

    /// Copy the live countdown into the current block. Returns whether a
    /// block is live.
    fn sync_live_progress(&mut self) -> bool {
        if !matches!(self.machine.state(), BlockState::Active | BlockState::Paused) {
            return false;
        }
        let remaining = self.remaining_seconds;
        match self.current_index.and_then(|i| self.blocks.at_mut(i)) {
            Some(block) => {
                block.saved_remaining_seconds = Some(remaining);
                true
            }
            None => false,
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Full start sequence for the block at `index`. The machine must be
    /// idle or finished.
    fn activate(&mut self, index: usize) -> Vec<Event> {
        self.notifier.cancel_pending();
        self.audio.stop_loop();
        self.countdown.stop();

        let Some(block) = self.blocks.at(index) else {
            return Vec::new();
        };
        let (block_id, kind, name, remaining) = (block.id, block.kind, block.name.clone(), block.starting_seconds());
        if self.machine.apply(BlockEvent::Start).is_none() {
            return Vec::new();
        }

        for block in self.blocks.iter_mut() {
            block.is_active = block.id == block_id;
        }
        self.reminders.reset();
        self.current_index = Some(index);
        self.remaining_seconds = remaining;
        let deadline = self.arm_countdown();

        self.play(Cue::Windup);
        self.start_ticking(kind);
        match kind {
            BlockKind::Work => self.notify(&name, "Started", NotificationCategory::BlockStarted),
            BlockKind::ShortBreak => self.notify("Time's up", "It's time for a short break", NotificationCategory::RestStarted),
            BlockKind::LongBreak => self.notify("Time's up", "It's time for a long break", NotificationCategory::RestStarted),
        }
        self.mark_state_dirty();

        tracing::info!(block_id = %block_id, index, kind = kind.label(), remaining_secs = remaining, "block started");
        vec![Event::BlockStarted {
            block_id,
            index,
            kind,
            remaining_secs: remaining,
            deadline,
            at: Utc::now(),
        }]
    }

    /// Finish or skip the active block, then start its successor or go idle.
    fn end_current(&mut self, reason: EndReason) -> Vec<Event> {
        let Some(index) = self.current_index else {
            return Vec::new();
        };
        let Some((block_id, kind, name)) = self.blocks.at(index).map(|b| (b.id, b.kind, b.name.clone())) else {
            return Vec::new();
        };
        let transition = match reason {
            EndReason::Completed => BlockEvent::Finish,
            EndReason::Skipped => BlockEvent::Skip,
        };
        if self.machine.apply(transition).is_none() {
            return Vec::new();
        }

        self.countdown.stop();
        self.audio.stop_loop();
        self.notifier.cancel_pending();
        let remaining = self.remaining_seconds;
        if let Some(block) = self.blocks.at_mut(index) {
            block.saved_remaining_seconds = Some(remaining);
            block.is_active = false;
        }
        self.current_index = None;
        self.remaining_seconds = 0;
        self.mark_state_dirty();

        tracing::info!(block_id = %block_id, ?reason, remaining_secs = remaining, "block ended");
        let mut events = vec![Event::BlockEnded {
            block_id,
            kind,
            reason,
            remaining_secs: remaining,
            at: Utc::now(),
        }];

        if reason == EndReason::Completed {
            self.play(Cue::Ding);
            match kind {
                BlockKind::Work => self.notify(&name, "Finished", NotificationCategory::BlockFinished),
                _ => self.notify("Break is over", "Keep up the good work!", NotificationCategory::RestFinished),
            }
        }

        match self.policy.next(kind, &mut self.progress, &self.blocks) {
            NextStep::Start(next) => events.extend(self.activate(next)),
            NextStep::Idle => {
                self.machine.apply(BlockEvent::Reset);
                events.push(Event::Stopped { block_id: None, at: Utc::now() });
            }
        }
        events
    }

    /// Save progress on the block at `index`, tear the countdown down and
    /// clear the selection. The caller resets the machine.
    fn park_current(&mut self, index: usize) -> Option<Uuid> {
        let remaining = self.remaining_seconds;
        let block_id = self.blocks.at_mut(index).map(|block| {
            block.saved_remaining_seconds = Some(remaining.min(block.duration_secs()));
            block.is_active = false;
            block.id
        });
        self.countdown.stop();
        self.audio.stop_loop();
        self.notifier.cancel_pending();
        self.current_index = None;
        self.remaining_seconds = 0;
        self.mark_state_dirty();
        block_id
    }

    /// (Re)start the countdown source from the live counter.
    fn arm_countdown(&mut self) -> Option<DateTime<Utc>> {
        self.countdown.stop();
        match self.countdown.start(self.remaining_seconds, Utc::now()) {
            Ok(deadline) => Some(deadline),
            Err(e) => {
                tracing::error!(error = %e, "countdown failed to start");
                None
            }
        }
    }

    fn resolve_duration(&self, duration_minutes: u32, kind: BlockKind) -> u32 {
        if duration_minutes == 0 {
            self.config.default_duration(kind)
        } else {
            duration_minutes
        }
    }

    /// Replace duration-0 sentinels with the configured defaults. Returns
    /// whether any block changed.
    fn resolve_default_durations(&mut self) -> bool {
        let mut changed = false;
        for block in self.blocks.iter_mut() {
            if block.duration_minutes == 0 {
                block.duration_minutes = self.config.default_duration(block.kind);
                changed = true;
            }
        }
        changed
    }

    fn mark_state_dirty(&mut self) {
        self.writes.mark(Document::Blocks);
        self.writes.mark(Document::RunState);
    }

    fn notify(&self, title: &str, body: &str, category: NotificationCategory) {
        if self.config.notifications.enabled {
            self.notifier.send(Notification::new(title, body, category));
        }
    }

    fn play(&self, cue: Cue) {
        let sounds = &self.config.sounds;
        let (enabled, volume) = match cue {
            Cue::Windup => (sounds.windup_enabled, sounds.windup_volume),
            Cue::Ding => (sounds.ding_enabled, sounds.ding_volume),
        };
        if enabled {
            self.audio.play(cue, volume);
        }
    }

    fn start_ticking(&self, kind: BlockKind) {
        let sounds = &self.config.sounds;
        if kind == BlockKind::Work && sounds.ticking_enabled {
            self.audio.start_loop(sounds.ticking_volume);
        }
    }
}
