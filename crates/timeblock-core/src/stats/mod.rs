//! Usage counters: today's work/break seconds and lifetime seconds per block.

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::block::BlockKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyStats {
    pub date: NaiveDate,
    pub work_time_seconds: u64,
    pub break_time_seconds: u64,
}

impl DailyStats {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            work_time_seconds: 0,
            break_time_seconds: 0,
        }
    }

    pub fn is_today(&self, today: NaiveDate) -> bool {
        self.date == today
    }

    /// Zero the counters and move to `today`.
    pub fn reset(&mut self, today: NaiveDate) {
        *self = Self::new(today);
    }

    /// Reset if the stored date is stale. Returns whether it rolled over.
    pub fn roll_over_if_stale(&mut self, today: NaiveDate) -> bool {
        if self.is_today(today) {
            return false;
        }
        self.reset(today);
        true
    }

    pub fn record(&mut self, kind: BlockKind, seconds: u64) {
        if kind.is_break() {
            self.break_time_seconds += seconds;
        } else {
            self.work_time_seconds += seconds;
        }
    }
}

impl Default for DailyStats {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

/// Lifetime seconds per block id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoricalStats {
    pub usage: BTreeMap<Uuid, u64>,
}

impl HistoricalStats {
    pub fn record(&mut self, block_id: Uuid, seconds: u64) {
        *self.usage.entry(block_id).or_insert(0) += seconds;
    }

    pub fn seconds_for(&self, block_id: Uuid) -> u64 {
        self.usage.get(&block_id).copied().unwrap_or(0)
    }

    pub fn total_seconds(&self) -> u64 {
        self.usage.values().sum()
    }

    /// Share of the total for one block, 0.0 when nothing was recorded.
    pub fn percentage_of(&self, block_id: Uuid) -> f64 {
        let total = self.total_seconds();
        if total == 0 {
            return 0.0;
        }
        self.seconds_for(block_id) as f64 / total as f64
    }

    /// Share of the total for every block; empty when nothing was recorded.
    pub fn percentages(&self) -> BTreeMap<Uuid, f64> {
        let total = self.total_seconds();
        if total == 0 {
            return BTreeMap::new();
        }
        self.usage
            .iter()
            .map(|(id, secs)| (*id, *secs as f64 / total as f64))
            .collect()
    }
}

/// The persisted stats document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub daily: DailyStats,
    #[serde(default)]
    pub historical: HistoricalStats,
}
