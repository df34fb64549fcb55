use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::collection::Document;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::store::{
    CollectionLoadReport, CollectionLog, LoadStatus, LoadedCollection, LogRecord, StoreProvider,
};

/// A store that keeps nothing on disk.
///
/// Used when the builder is given no data directory. Every collection
/// starts empty and its contents are gone once the store is closed.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore {
            inner: Arc::new(MemoryStoreInner::default()),
        }
    }
}

impl StoreProvider for MemoryStore {
    fn open_or_create(&self) -> StoreResult<()> {
        self.inner.closed.store(false, Ordering::Release);
        log::debug!("Opened in-memory store");
        Ok(())
    }

    fn open_log(&self, collection: &str) -> StoreResult<Box<dyn CollectionLog>> {
        if self.inner.closed.load(Ordering::Acquire) {
            log::error!("In-memory store is closed");
            return Err(StoreError::new(
                "In-memory store is closed",
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(Box::new(MemoryLog::new(collection)))
    }

    fn is_persistent(&self) -> bool {
        false
    }

    fn close(&self) -> StoreResult<()> {
        self.inner.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[derive(Default)]
struct MemoryStoreInner {
    closed: AtomicBool,
}

/// A log that accepts records without writing them anywhere.
pub(crate) struct MemoryLog {
    collection: String,
    records: usize,
}

impl MemoryLog {
    pub(crate) fn new(collection: &str) -> Self {
        MemoryLog {
            collection: collection.to_string(),
            records: 0,
        }
    }
}

impl CollectionLog for MemoryLog {
    fn load(&mut self) -> StoreResult<LoadedCollection> {
        Ok(LoadedCollection {
            documents: Vec::new(),
            report: CollectionLoadReport {
                collection: self.collection.clone(),
                status: LoadStatus::Empty,
                documents: 0,
                records: 0,
            },
        })
    }

    fn append(&mut self, _record: &LogRecord) -> StoreResult<()> {
        self.records += 1;
        Ok(())
    }

    fn compact(&mut self, _documents: &[Document]) -> StoreResult<()> {
        self.records = 0;
        Ok(())
    }

    fn records_since_compaction(&self) -> usize {
        self.records
    }
}
