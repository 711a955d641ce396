//! # Timeblock Core Library
//!
//! This library provides the core logic for a time-block scheduler: an
//! ordered list of named work and break blocks, run one at a time through an
//! idle/active/paused/finished lifecycle and chained by a work/break policy.
//! All operations are available through the standalone CLI; any GUI is a thin
//! layer over the same library.
//!
//! ## Architecture
//!
//! - **Block Engine**: a caller-driven state machine. The caller invokes
//!   `tick()` once per second while the countdown runs; commands and ticks
//!   return [`Event`]s
//! - **Storage**: three JSON documents (blocks, run-state, stats) behind a
//!   [`DocumentStore`] trait, written to files or SQLite with debounced
//!   writes, plus TOML configuration
//! - **Runtime**: a tokio actor that owns the engine, drives the 1 Hz tick
//!   and persists in the background
//!
//! ## Key Components
//!
//! - [`BlockEngine`]: lifecycle, sequencing, reminders and stats
//! - [`BlockStore`]: block and reminder CRUD
//! - [`Config`]: application configuration management
//! - [`runtime::spawn`]: async host for an engine
//! - [`ControlCommand`]: `timeblock://` URLs for launchers and scripts

pub mod block;
pub mod control;
pub mod error;
pub mod events;
pub mod runtime;
pub mod sinks;
pub mod stats;
pub mod storage;
pub mod timer;

pub use block::{Block, BlockColor, BlockKind, BlockPatch, BlockStore, Reminder, ReminderPatch};
pub use control::ControlCommand;
pub use error::{ConfigError, ControlError, CoreError, Result, StoreError};
pub use events::Event;
pub use runtime::EngineHandle;
pub use sinks::{AudioCues, Cue, LogSink, Notification, NotificationAction, NotificationCategory, Notifier, NullSink};
pub use stats::{DailyStats, HistoricalStats, Stats};
pub use storage::{open_store, Config, Database, Document, DocumentStore, FileStore, StoreBackend};
pub use timer::{BlockEngine, BlockState, EndReason, SetProgress};
