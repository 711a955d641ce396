pub mod block;
pub mod config;
pub mod reminder;
pub mod run;
pub mod stats;

use serde::Serialize;
use timeblock_core::{open_store, BlockEngine, Config, DocumentStore};

pub type CliResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Load the configuration and the engine from the configured store.
pub fn open_engine() -> CliResult<(BlockEngine, Box<dyn DocumentStore>)> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let engine = BlockEngine::load(&*store, config);
    Ok((engine, store))
}

/// Write every changed document before exiting.
pub fn save(engine: &mut BlockEngine, store: &dyn DocumentStore) -> CliResult {
    engine.persist_now(store)?;
    Ok(())
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn refresh() -> CliResult {
    let (mut engine, store) = open_engine()?;
    let events = engine.refresh_all();
    save(&mut engine, &*store)?;
    print_json(&events)
}

pub fn status() -> CliResult {
    let (mut engine, store) = open_engine()?;
    let snapshot = engine.snapshot();
    save(&mut engine, &*store)?;
    print_json(&snapshot)
}
