mod config;
pub mod database;
pub mod debounce;
pub mod documents;
pub mod file_store;

pub use config::{Config, NotificationsConfig, PersistenceConfig, ScheduleConfig, SoundsConfig, StoreBackend};
pub use database::Database;
pub use debounce::{Debounce, WriteScheduler};
pub use documents::{PendingWrite, RunStateSnapshot};
pub use file_store::FileStore;

use std::path::PathBuf;

use crate::error::StoreError;

/// The three independently persisted records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Document {
    Blocks,
    RunState,
    Stats,
}

impl Document {
    pub const ALL: [Document; 3] = [Document::Blocks, Document::RunState, Document::Stats];

    pub fn key(self) -> &'static str {
        match self {
            Document::Blocks => "blocks",
            Document::RunState => "run_state",
            Document::Stats => "stats",
        }
    }
}

/// Durable storage for the three named documents.
///
/// Implementations are plain synchronous I/O; the runtime calls them off the
/// tick path.
pub trait DocumentStore: Send {
    /// `Ok(None)` when the document was never written.
    fn read(&self, document: Document) -> Result<Option<String>, StoreError>;
    fn write(&self, document: Document, contents: &str) -> Result<(), StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for Box<S> {
    fn read(&self, document: Document) -> Result<Option<String>, StoreError> {
        (**self).read(document)
    }

    fn write(&self, document: Document, contents: &str) -> Result<(), StoreError> {
        (**self).write(document, contents)
    }
}

/// Open the backend selected in `config`, rooted at [`data_dir`].
pub fn open_store(config: &Config) -> Result<Box<dyn DocumentStore>, StoreError> {
    let dir = data_dir()?;
    Ok(match config.persistence.backend {
        StoreBackend::Json => Box::new(FileStore::new(dir)?),
        StoreBackend::Sqlite => Box::new(Database::open_at(&dir.join("timeblock.db"))?),
    })
}

/// Returns the data directory.
///
/// `TIMEBLOCK_DATA_DIR` overrides the location; otherwise
/// `~/.config/timeblock[-dev]/` based on `TIMEBLOCK_ENV`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, StoreError> {
    let dir = match std::env::var_os("TIMEBLOCK_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");
            let env = std::env::var("TIMEBLOCK_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("timeblock-dev")
            } else {
                base_dir.join("timeblock")
            }
        }
    };

    std::fs::create_dir_all(&dir).map_err(|e| StoreError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
