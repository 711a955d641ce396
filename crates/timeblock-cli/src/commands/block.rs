use clap::{Subcommand, ValueEnum};
use serde::Serialize;
use timeblock_core::{Block, BlockColor, BlockKind, BlockPatch};
use uuid::Uuid;

use super::{open_engine, print_json, save, CliResult};

#[derive(Clone, Copy, ValueEnum)]
pub enum KindArg {
    Work,
    ShortBreak,
    LongBreak,
}

impl From<KindArg> for BlockKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Work => BlockKind::Work,
            KindArg::ShortBreak => BlockKind::ShortBreak,
            KindArg::LongBreak => BlockKind::LongBreak,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorArg {
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Gray,
}

impl From<ColorArg> for BlockColor {
    fn from(color: ColorArg) -> Self {
        match color {
            ColorArg::Red => BlockColor::Red,
            ColorArg::Orange => BlockColor::Orange,
            ColorArg::Yellow => BlockColor::Yellow,
            ColorArg::Green => BlockColor::Green,
            ColorArg::Blue => BlockColor::Blue,
            ColorArg::Purple => BlockColor::Purple,
            ColorArg::Gray => BlockColor::Gray,
        }
    }
}

#[derive(Subcommand)]
pub enum BlockAction {
    /// List blocks in order as JSON
    List,
    /// Add a block
    Add {
        /// Display name
        name: String,
        #[arg(long, value_enum, default_value = "work")]
        kind: KindArg,
        /// Length in minutes; 0 uses the configured default for the kind
        #[arg(long, default_value = "0")]
        duration: u32,
        #[arg(long, value_enum, default_value = "red")]
        color: ColorArg,
    },
    /// Update fields of a block
    Update {
        /// Block ID
        id: Uuid,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
        #[arg(long, value_enum)]
        color: Option<ColorArg>,
    },
    /// Delete a block
    Delete {
        /// Block ID
        id: Uuid,
    },
    /// Move a block to a new position
    Move {
        /// Current index
        from: usize,
        /// Target index
        to: usize,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BlockRow<'a> {
    index: usize,
    #[serde(flatten)]
    block: &'a Block,
    remaining_seconds: u64,
}

pub fn run(action: BlockAction) -> CliResult {
    let (mut engine, store) = open_engine()?;

    match action {
        BlockAction::List => {
            let rows: Vec<BlockRow> = engine
                .blocks()
                .iter()
                .enumerate()
                .map(|(index, block)| BlockRow {
                    index,
                    block,
                    remaining_seconds: engine.remaining_seconds_for(block.id).unwrap_or_default(),
                })
                .collect();
            print_json(&rows)?;
        }
        BlockAction::Add { name, kind, duration, color } => {
            let id = engine.add_block(name, duration, kind.into(), color.into());
            println!("{id}");
        }
        BlockAction::Update { id, name, duration, kind, color } => {
            let patch = BlockPatch {
                name,
                duration_minutes: duration,
                kind: kind.map(Into::into),
                color: color.map(Into::into),
            };
            if patch.is_empty() {
                return Err("nothing to update".into());
            }
            if !engine.update_block(id, patch) {
                return Err(format!("unknown block: {id}").into());
            }
            println!("ok");
        }
        BlockAction::Delete { id } => {
            if engine.blocks().iter().all(|b| b.id != id) {
                return Err(format!("unknown block: {id}").into());
            }
            engine.delete_block(id);
            println!("ok");
        }
        BlockAction::Move { from, to } => {
            if !engine.move_block(from, to) {
                return Err(format!("no block at index {from}").into());
            }
            println!("ok");
        }
    }

    save(&mut engine, &*store)
}
