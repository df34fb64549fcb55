use std::collections::HashMap;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Filter;

/// The in-memory documents of a collection, in insertion order, with an
/// `_id` → position map.
///
/// Readers share it under a read lock. Only the writer thread changes it,
/// by applying a [Mutation] that it planned against the same state.
#[derive(Debug, Default)]
pub(crate) struct CollectionState {
    documents: Vec<Document>,
    positions: HashMap<String, usize>,
}

/// A planned change, ready to be swapped into a [CollectionState].
#[derive(Debug)]
pub(crate) enum Mutation {
    Insert(Vec<Document>),
    Update(Vec<(usize, Document)>),
    Remove(Vec<usize>),
}

impl CollectionState {
    pub(crate) fn from_documents(documents: Vec<Document>) -> StoreResult<Self> {
        let mut positions = HashMap::with_capacity(documents.len());
        for (position, doc) in documents.iter().enumerate() {
            let key = id_key(doc)?;
            if positions.insert(key, position).is_some() {
                log::error!("Duplicate _id {:?} in stored documents", doc.id());
                return Err(StoreError::new(
                    &format!("Duplicate _id in stored documents: {}", doc),
                    ErrorKind::DuplicateKey,
                ));
            }
        }
        Ok(CollectionState {
            documents,
            positions,
        })
    }

    pub(crate) fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub(crate) fn len(&self) -> usize {
        self.documents.len()
    }

    pub(crate) fn contains_id(&self, id: &Value) -> bool {
        self.positions.contains_key(&id.canonical_key())
    }

    /// Positions of the documents matching `filter`, in insertion order,
    /// stopping after `limit` matches.
    pub(crate) fn matching_positions(&self, filter: &Filter, limit: Option<usize>) -> Vec<usize> {
        if limit == Some(0) {
            return Vec::new();
        }

        if let Some(id) = filter.id_lookup() {
            return match self.positions.get(&id.canonical_key()) {
                Some(&position) if filter.apply(&self.documents[position]) => vec![position],
                _ => Vec::new(),
            };
        }

        let matches = self
            .documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| filter.is_all() || filter.apply(doc))
            .map(|(position, _)| position);
        match limit {
            Some(limit) => matches.take(limit).collect(),
            None => matches.collect(),
        }
    }

    pub(crate) fn find(&self, filter: &Filter) -> Vec<Document> {
        self.matching_positions(filter, None)
            .into_iter()
            .map(|position| self.documents[position].clone())
            .collect()
    }

    pub(crate) fn count(&self, filter: &Filter) -> usize {
        if filter.is_all() {
            self.documents.len()
        } else {
            self.matching_positions(filter, None).len()
        }
    }

    pub(crate) fn apply(&mut self, mutation: Mutation) {
        match mutation {
            Mutation::Insert(docs) => {
                for doc in docs {
                    if let Some(id) = doc.id() {
                        self.positions.insert(id.canonical_key(), self.documents.len());
                    }
                    self.documents.push(doc);
                }
            }
            Mutation::Update(changes) => {
                for (position, doc) in changes {
                    self.documents[position] = doc;
                }
            }
            Mutation::Remove(mut positions) => {
                positions.sort_unstable();
                positions.dedup();
                for position in positions.into_iter().rev() {
                    self.documents.remove(position);
                }
                self.reindex();
            }
        }
    }

    fn reindex(&mut self) {
        self.positions.clear();
        for (position, doc) in self.documents.iter().enumerate() {
            if let Some(id) = doc.id() {
                self.positions.insert(id.canonical_key(), position);
            }
        }
    }
}

fn id_key(doc: &Document) -> StoreResult<String> {
    match doc.id() {
        Some(id) => Ok(id.canonical_key()),
        None => {
            log::error!("Stored document has no _id: {}", doc);
            Err(StoreError::new(
                &format!("Stored document has no _id: {}", doc),
                ErrorKind::InvalidDocument,
            ))
        }
    }
}
