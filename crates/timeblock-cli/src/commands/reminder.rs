use clap::Subcommand;
use timeblock_core::ReminderPatch;
use uuid::Uuid;

use super::{open_engine, print_json, save, CliResult};

#[derive(Subcommand)]
pub enum ReminderAction {
    /// List a block's reminders as JSON
    List {
        /// Block ID
        block_id: Uuid,
    },
    /// Add a reminder to a block
    Add {
        /// Block ID
        block_id: Uuid,
        /// Seconds from block start
        trigger: u64,
        /// Reminder text
        message: String,
        /// Do not play a sound when it fires
        #[arg(long)]
        silent: bool,
    },
    /// Update a reminder
    Update {
        /// Block ID
        block_id: Uuid,
        /// Reminder ID
        reminder_id: Uuid,
        #[arg(long)]
        trigger: Option<u64>,
        #[arg(long)]
        message: Option<String>,
        #[arg(long)]
        sound: Option<bool>,
        #[arg(long)]
        enabled: Option<bool>,
    },
    /// Delete a reminder
    Delete {
        /// Block ID
        block_id: Uuid,
        /// Reminder ID
        reminder_id: Uuid,
    },
}

pub fn run(action: ReminderAction) -> CliResult {
    let (mut engine, store) = open_engine()?;

    match action {
        ReminderAction::List { block_id } => {
            let block = engine
                .blocks()
                .iter()
                .find(|b| b.id == block_id)
                .ok_or_else(|| format!("unknown block: {block_id}"))?;
            print_json(&block.reminders)?;
        }
        ReminderAction::Add { block_id, trigger, message, silent } => {
            let id = engine
                .add_reminder(block_id, trigger, message, !silent)
                .ok_or("unknown block or trigger beyond the block's length")?;
            println!("{id}");
        }
        ReminderAction::Update { block_id, reminder_id, trigger, message, sound, enabled } => {
            let patch = ReminderPatch {
                trigger_time_seconds: trigger,
                message,
                sound_enabled: sound,
                enabled,
            };
            if !engine.update_reminder(block_id, reminder_id, patch) {
                return Err("unknown reminder or trigger beyond the block's length".into());
            }
            println!("ok");
        }
        ReminderAction::Delete { block_id, reminder_id } => {
            if !engine.delete_reminder(block_id, reminder_id) {
                return Err(format!("unknown reminder: {reminder_id}").into());
            }
            println!("ok");
        }
    }

    save(&mut engine, &*store)
}
