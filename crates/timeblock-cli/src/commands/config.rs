use clap::Subcommand;
use timeblock_core::{open_store, BlockEngine, Config};

use super::{print_json, save, CliResult};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Get a config value
    Get {
        /// Config key (e.g. "schedule.work_duration", "sounds.ding_volume")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
    /// List all config values
    List,
    /// Reset config to defaults
    Reset,
}

pub fn run(action: ConfigAction) -> CliResult {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => return Err(format!("unknown key: {key}").into()),
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            let previous = config.clone();
            config.set(&key, &value)?;
            config.save()?;
            // Block lengths follow the schedule defaults.
            if config.schedule != previous.schedule {
                let store = open_store(&previous)?;
                let mut engine = BlockEngine::load(&*store, previous);
                engine.apply_config(config)?;
                save(&mut engine, &*store)?;
            }
            println!("ok");
        }
        ConfigAction::List => {
            let config = Config::load()?;
            print_json(&config)?;
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            println!("config reset to defaults");
        }
    }
    Ok(())
}
