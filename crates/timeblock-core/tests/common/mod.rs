//! Shared helpers for the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use timeblock_core::{Document, DocumentStore, FileStore, StoreError};

/// A file store whose next `failures` writes fail as if the database were
/// locked.
pub struct FlakyStore {
    inner: FileStore,
    failures: Arc<AtomicUsize>,
}

impl FlakyStore {
    pub fn new(inner: FileStore, failures: usize) -> (Self, Arc<AtomicUsize>) {
        let failures = Arc::new(AtomicUsize::new(failures));
        (Self { inner, failures: Arc::clone(&failures) }, failures)
    }
}

impl DocumentStore for FlakyStore {
    fn read(&self, document: Document) -> Result<Option<String>, StoreError> {
        self.inner.read(document)
    }

    fn write(&self, document: Document, contents: &str) -> Result<(), StoreError> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StoreError::Locked);
        }
        self.inner.write(document, contents)
    }
}
