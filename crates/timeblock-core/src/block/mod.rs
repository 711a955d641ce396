mod model;
mod store;

pub use model::{Block, BlockColor, BlockKind, BlockPatch, Reminder, ReminderPatch};
pub use store::{rescale_saved, BlockStore, BlockUpdate};
