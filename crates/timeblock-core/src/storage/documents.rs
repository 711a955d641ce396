//! Persisted document shapes and tolerant loading.
//!
//! A missing or unreadable document never fails startup: each loader falls
//! back to its built-in default and logs why.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::{Document, DocumentStore};
use crate::block::BlockStore;
use crate::error::StoreError;
use crate::stats::{DailyStats, Stats};
use crate::timer::{BlockState, SetProgress};

/// The run-state record. Only the set progress is restored on load.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStateSnapshot {
    pub state: BlockState,
    pub current_block_index: Option<usize>,
    pub remaining_seconds: u64,
    pub completed_work_blocks_in_set: u32,
    pub is_next_break_long: bool,
}

impl RunStateSnapshot {
    pub fn set_progress(&self) -> SetProgress {
        SetProgress {
            completed_work_blocks_in_set: self.completed_work_blocks_in_set,
            is_next_break_long: self.is_next_break_long,
        }
    }
}

/// An encoded document ready to hand to a [`DocumentStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingWrite {
    pub document: Document,
    pub contents: String,
}

impl PendingWrite {
    pub fn encode<T: Serialize>(document: Document, value: &T) -> Result<Self, StoreError> {
        let contents = serde_json::to_string_pretty(value)
            .map_err(|source| StoreError::Encode { document: document.key(), source })?;
        Ok(Self { document, contents })
    }

    pub fn write_to(&self, store: &dyn DocumentStore) -> Result<(), StoreError> {
        store.write(self.document, &self.contents)
    }
}

fn load_or<T: DeserializeOwned>(store: &dyn DocumentStore, document: Document) -> Option<T> {
    let content = match store.read(document) {
        Ok(Some(content)) => content,
        Ok(None) => {
            tracing::info!(document = document.key(), "no saved document, using defaults");
            return None;
        }
        Err(e) => {
            tracing::warn!(document = document.key(), error = %e, "failed to read document, using defaults");
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(document = document.key(), error = %e, "corrupt document, using defaults");
            None
        }
    }
}

/// Saved blocks, or the starter set.
pub fn load_blocks(store: &dyn DocumentStore) -> BlockStore {
    load_or(store, Document::Blocks).unwrap_or_else(BlockStore::starter)
}

/// Saved run-state snapshot, or an idle one.
pub fn load_run_state(store: &dyn DocumentStore) -> RunStateSnapshot {
    load_or(store, Document::RunState).unwrap_or_default()
}

/// Saved stats with today's counters rolled over if stale, or zeroed stats.
pub fn load_stats(store: &dyn DocumentStore, today: NaiveDate) -> Stats {
    let mut stats: Stats = load_or(store, Document::Stats).unwrap_or_else(|| Stats {
        daily: DailyStats::new(today),
        historical: Default::default(),
    });
    if stats.daily.roll_over_if_stale(today) {
        tracing::info!(%today, "daily stats rolled over on load");
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Database;

    #[test]
    fn corrupt_blocks_fall_back_to_starter_set() {
        let db = Database::open_memory().unwrap();
        db.write(Document::Blocks, "{not json").unwrap();
        assert_eq!(load_blocks(&db).len(), 3);
    }

    #[test]
    fn missing_run_state_is_idle() {
        let db = Database::open_memory().unwrap();
        let snapshot = load_run_state(&db);
        assert_eq!(snapshot.state, BlockState::Idle);
        assert_eq!(snapshot.set_progress(), SetProgress::default());
    }

    #[test]
    fn stale_daily_stats_zeroed_on_load() {
        let db = Database::open_memory().unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let today = yesterday.succ_opt().unwrap();
        let mut stats = Stats { daily: DailyStats::new(yesterday), historical: Default::default() };
        stats.daily.work_time_seconds = 99;
        PendingWrite::encode(Document::Stats, &stats).unwrap().write_to(&db).unwrap();

        let loaded = load_stats(&db, today);
        assert_eq!(loaded.daily, DailyStats::new(today));
    }
}
