//! JSON documents as files in a directory.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::{Document, DocumentStore};
use crate::error::StoreError;

/// Stores each document as `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create the store, making `dir` if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::File { path: dir.clone(), source })?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, document: Document) -> PathBuf {
        self.dir.join(format!("{}.json", document.key()))
    }
}

impl DocumentStore for FileStore {
    fn read(&self, document: Document) -> Result<Option<String>, StoreError> {
        let path = self.path_for(document);
        match std::fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StoreError::File { path, source }),
        }
    }

    /// Write through a temp file and rename so a crash never leaves a
    /// half-written document.
    fn write(&self, document: Document, contents: &str) -> Result<(), StoreError> {
        let path = self.path_for(document);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, contents).map_err(|source| StoreError::File { path: tmp.clone(), source })?;
        std::fs::rename(&tmp, &path).map_err(|source| StoreError::File { path, source })?;
        Ok(())
    }
}
