use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};

/// One line of a collection log.
///
/// Every mutating call appends exactly one record. Updates carry full
/// post-images, so replaying a record twice gives the same state.
///
/// ```text
/// {"op":"insert","docs":[{"_id":"..","name":"Ana","createdAt":{"$date":"2024-05-01T10:00:00Z"}}]}
/// {"op":"update","docs":[{"_id":"..","name":"Ana","status":"inactive", ..}]}
/// {"op":"remove","ids":[".."]}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum LogRecord {
    Insert { docs: Vec<Document> },
    Update { docs: Vec<Document> },
    Remove { ids: Vec<Value> },
}

impl LogRecord {
    pub fn op_name(&self) -> &'static str {
        match self {
            LogRecord::Insert { .. } => "insert",
            LogRecord::Update { .. } => "update",
            LogRecord::Remove { .. } => "remove",
        }
    }
}

/// Applies log records in order, producing the live documents in insertion
/// order.
#[derive(Debug, Default)]
pub(crate) struct Replay {
    documents: IndexMap<String, Document>,
}

impl Replay {
    pub(crate) fn new() -> Self {
        Replay {
            documents: IndexMap::new(),
        }
    }

    pub(crate) fn apply(&mut self, record: LogRecord) -> StoreResult<()> {
        match record {
            LogRecord::Insert { docs } => {
                for doc in docs {
                    let key = id_key(&doc)?;
                    if self.documents.contains_key(&key) {
                        return Err(corrupt(format!("insert of existing id {}", key)));
                    }
                    self.documents.insert(key, doc);
                }
            }
            LogRecord::Update { docs } => {
                for doc in docs {
                    let key = id_key(&doc)?;
                    match self.documents.get_mut(&key) {
                        Some(slot) => *slot = doc,
                        None => return Err(corrupt(format!("update of unknown id {}", key))),
                    }
                }
            }
            LogRecord::Remove { ids } => {
                for id in ids {
                    self.documents.shift_remove(&id.canonical_key());
                }
            }
        }
        Ok(())
    }

    pub(crate) fn into_documents(self) -> Vec<Document> {
        self.documents.into_values().collect()
    }
}

fn id_key(doc: &Document) -> StoreResult<String> {
    doc.id()
        .map(|id| id.canonical_key())
        .ok_or_else(|| corrupt(format!("record document without _id: {}", doc)))
}

fn corrupt(message: String) -> StoreError {
    StoreError::new(&format!("Invalid log record: {}", message), ErrorKind::CollectionLoadError)
}
