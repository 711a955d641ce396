//! Persist an engine and reload it into a fresh instance, against both
//! document store backends.

mod common;

use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use common::FlakyStore;
use timeblock_core::storage::documents::{load_blocks, load_run_state};
use timeblock_core::{
    BlockColor, BlockEngine, BlockKind, BlockState, Config, Database, Document, DocumentStore, FileStore,
    StoreError,
};

fn exercised_engine() -> BlockEngine {
    let mut engine = BlockEngine::new(Config::default());
    let reading = engine.add_block("Reading", 40, BlockKind::Work, BlockColor::Purple);
    engine.add_reminder(reading, 600, "Take notes", true).unwrap();
    engine.start(0);
    for _ in 0..30 {
        engine.tick();
    }
    engine.skip();
    for _ in 0..12 {
        engine.tick();
    }
    engine
}

fn assert_round_trip(store: &dyn DocumentStore) {
    let mut engine = exercised_engine();
    engine.persist_now(store).unwrap();

    let restored = BlockEngine::load(store, Config::default());

    let mut expected = engine.blocks().to_vec();
    for block in &mut expected {
        block.is_active = false;
    }
    assert_eq!(restored.blocks(), &expected[..]);
    // The running break's progress was captured with the snapshot.
    assert_eq!(restored.blocks()[1].saved_remaining_seconds, Some(288));

    assert_eq!(restored.stats(), engine.stats());
    assert_eq!(restored.daily_stats().work_time_seconds, 30);
    assert_eq!(restored.daily_stats().break_time_seconds, 12);

    assert_eq!(restored.current_state(), BlockState::Idle);
    assert_eq!(restored.current_block_index(), None);
    assert_eq!(restored.remaining_seconds(), 0);
    assert!(!restored.countdown_running());
    assert_eq!(restored.set_progress(), engine.set_progress());
    assert_eq!(restored.set_progress().completed_work_blocks_in_set, 1);
}

#[test]
fn json_files_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    assert_round_trip(&store);
    assert!(dir.path().join("blocks.json").exists());
    assert!(dir.path().join("run_state.json").exists());
    assert!(dir.path().join("stats.json").exists());
}

#[test]
fn sqlite_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("timeblock.db")).unwrap();
    assert_round_trip(&db);
}

#[test]
fn empty_store_loads_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    let engine = BlockEngine::load(&store, Config::default());
    let kinds: Vec<_> = engine.blocks().iter().map(|b| b.kind).collect();
    assert_eq!(kinds, [BlockKind::Work, BlockKind::ShortBreak, BlockKind::LongBreak]);
    assert_eq!(engine.blocks()[0].duration_minutes, 25);
    assert_eq!(engine.current_state(), BlockState::Idle);
    assert_eq!(engine.historical_stats().total_seconds(), 0);
}

#[test]
fn corrupt_documents_fall_back_independently() {
    let db = Database::open_memory().unwrap();
    let mut engine = exercised_engine();
    engine.persist_now(&db).unwrap();
    db.write(Document::Stats, "not json").unwrap();

    let restored = BlockEngine::load(&db, Config::default());
    assert_eq!(restored.blocks().len(), 4);
    assert_eq!(restored.historical_stats().total_seconds(), 0);
    assert_eq!(restored.set_progress().completed_work_blocks_in_set, 1);
}

#[test]
fn loaded_engine_writes_idle_run_state() {
    let db = Database::open_memory().unwrap();
    let mut engine = exercised_engine();
    engine.persist_now(&db).unwrap();
    assert_eq!(load_run_state(&db).state, BlockState::Active);

    let mut restored = BlockEngine::load(&db, Config::default());
    restored.persist_now(&db).unwrap();
    let snapshot = load_run_state(&db);
    assert_eq!(snapshot.state, BlockState::Idle);
    assert_eq!(snapshot.current_block_index, None);
    assert_eq!(snapshot.completed_work_blocks_in_set, 1);
}

#[test]
fn debounced_writes_coalesce_ticks() {
    let mut engine = BlockEngine::new(Config::default());
    let t0 = Instant::now();
    engine.flush_all();
    engine.start(0);
    assert!(engine.take_due_writes(t0).is_empty());

    // Ticking every second keeps the run-state changing; it still flushes
    // once the max wait passes. Stats wait for their longer window.
    let mut flushed = Vec::new();
    for second in 1..=6 {
        engine.tick();
        let due = engine.take_due_writes(t0 + Duration::from_secs(second));
        flushed.extend(due.into_iter().map(|w| (second, w.document)));
    }
    assert_eq!(
        flushed,
        vec![(1, Document::Blocks), (5, Document::Blocks), (5, Document::RunState)]
    );
}

#[test]
fn out_of_range_documents_are_clamped_on_load() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    let id = uuid::Uuid::new_v4();
    let blocks = serde_json::json!([{
        "id": id,
        "name": "Tiny",
        "durationMinutes": 1,
        "kind": "work",
        "color": "red",
        "savedRemainingSeconds": 9999,
        "reminders": [{
            "id": uuid::Uuid::new_v4(),
            "triggerTimeSeconds": 5000,
            "message": "late",
        }],
    }]);
    store.write(Document::Blocks, &blocks.to_string()).unwrap();

    let mut engine = BlockEngine::load(&store, Config::default());
    let block = &engine.blocks()[0];
    assert_eq!(block.saved_remaining_seconds, Some(60));
    assert_eq!(block.reminders[0].trigger_time_seconds, 60);
    assert_eq!(engine.remaining_seconds_for(id), Some(60));

    // The repaired document is written back.
    engine.persist_now(&store).unwrap();
    assert_eq!(load_blocks(&store).blocks()[0].saved_remaining_seconds, Some(60));
}

#[test]
fn failed_write_stays_dirty_until_a_later_flush() {
    let dir = tempfile::tempdir().unwrap();
    let (store, failures) = FlakyStore::new(FileStore::new(dir.path()).unwrap(), 1);
    let mut engine = BlockEngine::new(Config::default());
    engine.add_block("Reading", 40, BlockKind::Work, BlockColor::Purple);

    assert!(matches!(engine.persist_now(&store), Err(StoreError::Locked)));
    assert_eq!(failures.load(Ordering::SeqCst), 0);
    assert_eq!(load_blocks(&store).len(), 3);

    engine.persist_now(&store).unwrap();
    let saved = load_blocks(&store);
    assert_eq!(saved.len(), 4);
    assert_eq!(saved.blocks()[3].name, "Reading");
    assert!(engine.flush_all().is_empty());
}
