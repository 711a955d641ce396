mod countdown;
mod engine;
mod format;
mod reminders;
mod sequencing;
mod state;

pub use countdown::Countdown;
pub use engine::BlockEngine;
pub use format::{format_minutes, format_remaining};
pub use reminders::{FiredReminder, ReminderScheduler};
pub use sequencing::{EndReason, NextStep, SequencingPolicy, SetProgress};
pub use state::{transition, BlockEvent, BlockState, StateMachine};
