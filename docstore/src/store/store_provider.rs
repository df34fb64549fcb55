use std::ops::Deref;
use std::sync::Arc;

use crate::collection::Document;
use crate::errors::StoreResult;

use super::{CollectionLoadReport, LogRecord};

/// Documents read back from a collection log at startup.
#[derive(Debug)]
pub struct LoadedCollection {
    pub documents: Vec<Document>,
    pub report: CollectionLoadReport,
}

/// The durable side of one collection.
///
/// A log is owned by the collection's writer thread, which is the only
/// caller, hence the `&mut self` receivers.
pub trait CollectionLog: Send {
    /// Replays the persisted records. Corruption is reported in the
    /// returned [CollectionLoadReport], never as an error; `Err` is kept for
    /// failures that leave the directory unusable.
    fn load(&mut self) -> StoreResult<LoadedCollection>;

    /// Appends one record; it is durable when this returns `Ok`.
    fn append(&mut self, record: &LogRecord) -> StoreResult<()>;

    /// Replaces the log with a single record holding `documents`.
    fn compact(&mut self, documents: &[Document]) -> StoreResult<()>;

    /// Records appended since the last compaction (or since load).
    fn records_since_compaction(&self) -> usize;
}

/// A storage backend: hands out one [CollectionLog] per collection.
pub trait StoreProvider: Send + Sync {
    /// Prepares the backend, e.g. creates and locks the data directory.
    fn open_or_create(&self) -> StoreResult<()>;

    fn open_log(&self, collection: &str) -> StoreResult<Box<dyn CollectionLog>>;

    /// `false` for backends that lose everything on close.
    fn is_persistent(&self) -> bool;

    /// Releases backend resources such as the directory lock.
    fn close(&self) -> StoreResult<()>;
}

/// Shared handle to a [StoreProvider].
#[derive(Clone)]
pub struct Store {
    inner: Arc<dyn StoreProvider>,
}

impl Store {
    pub fn new<T: StoreProvider + 'static>(inner: T) -> Self {
        Store {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for Store {
    type Target = Arc<dyn StoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
