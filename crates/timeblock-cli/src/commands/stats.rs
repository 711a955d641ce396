use chrono::NaiveDate;
use clap::Subcommand;
use serde::Serialize;
use uuid::Uuid;

use super::{open_engine, print_json, save, CliResult};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's work and break time
    Today,
    /// Lifetime time per block
    All,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TodayReport {
    date: NaiveDate,
    work_time_seconds: u64,
    break_time_seconds: u64,
    work_target_minutes: u32,
    work_target: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockUsage {
    block_id: Uuid,
    /// `None` once the block has been deleted.
    name: Option<String>,
    seconds: u64,
    percentage: f64,
}

pub fn run(action: StatsAction) -> CliResult {
    let (mut engine, store) = open_engine()?;

    match action {
        StatsAction::Today => {
            let daily = engine.daily_stats();
            print_json(&TodayReport {
                date: daily.date,
                work_time_seconds: daily.work_time_seconds,
                break_time_seconds: daily.break_time_seconds,
                work_target_minutes: engine.today_work_target_minutes(),
                work_target: engine.formatted_work_target(),
            })?;
        }
        StatsAction::All => {
            let historical = engine.historical_stats();
            let usage: Vec<BlockUsage> = historical
                .percentages()
                .into_iter()
                .map(|(block_id, percentage)| BlockUsage {
                    block_id,
                    name: engine.blocks().iter().find(|b| b.id == block_id).map(|b| b.name.clone()),
                    seconds: historical.seconds_for(block_id),
                    percentage,
                })
                .collect();
            print_json(&usage)?;
        }
    }

    save(&mut engine, &*store)
}
