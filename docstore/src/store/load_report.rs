use std::fmt::Display;
use std::path::PathBuf;

/// What happened when a collection was loaded at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No data existed; the collection starts empty.
    Empty,
    /// Every record replayed cleanly.
    Loaded,
    /// A torn final record was dropped and the log truncated.
    Recovered { dropped_bytes: u64 },
    /// The log was unreadable. It was moved aside and the collection
    /// starts empty.
    Quarantined { moved_to: PathBuf, reason: String },
}

/// Load outcome of one collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionLoadReport {
    pub collection: String,
    pub status: LoadStatus,
    pub documents: usize,
    pub records: usize,
}

impl CollectionLoadReport {
    pub fn is_quarantined(&self) -> bool {
        matches!(self.status, LoadStatus::Quarantined { .. })
    }
}

impl Display for CollectionLoadReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.status {
            LoadStatus::Empty => write!(f, "{}: empty", self.collection),
            LoadStatus::Loaded => write!(
                f,
                "{}: {} document(s) from {} record(s)",
                self.collection, self.documents, self.records
            ),
            LoadStatus::Recovered { dropped_bytes } => write!(
                f,
                "{}: {} document(s), dropped a torn tail of {} byte(s)",
                self.collection, self.documents, dropped_bytes
            ),
            LoadStatus::Quarantined { moved_to, reason } => write!(
                f,
                "{}: quarantined to {} ({})",
                self.collection,
                moved_to.display(),
                reason
            ),
        }
    }
}

/// Load outcome of every declared collection, in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    collections: Vec<CollectionLoadReport>,
}

impl LoadReport {
    pub(crate) fn new(collections: Vec<CollectionLoadReport>) -> Self {
        LoadReport { collections }
    }

    pub fn collections(&self) -> &[CollectionLoadReport] {
        &self.collections
    }

    pub fn get(&self, collection: &str) -> Option<&CollectionLoadReport> {
        self.collections.iter().find(|c| c.collection == collection)
    }

    /// `true` when no collection had to be quarantined.
    pub fn is_clean(&self) -> bool {
        !self.collections.iter().any(|c| c.is_quarantined())
    }
}
