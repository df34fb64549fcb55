use std::collections::HashSet;

use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, StoreError, StoreResult};

use super::IndexDescriptor;

/// Enforces the unique indexes of one collection.
///
/// Checks are linear scans over the in-memory documents; there is no
/// persistent index structure. They run on the writer thread before
/// anything is persisted, so a rejected mutation leaves no trace.
#[derive(Debug, Clone)]
pub(crate) struct UniqueIndexer {
    collection_name: String,
    descriptors: Vec<IndexDescriptor>,
}

impl UniqueIndexer {
    pub(crate) fn new(collection_name: &str, descriptors: &[IndexDescriptor]) -> Self {
        UniqueIndexer {
            collection_name: collection_name.to_string(),
            descriptors: descriptors.iter().filter(|d| d.is_unique()).cloned().collect(),
        }
    }

    pub(crate) fn has_constraints(&self) -> bool {
        !self.descriptors.is_empty()
    }

    /// Fails with [ErrorKind::DuplicateKey] when a document in `documents`,
    /// other than the one with `exclude_id`, already holds `values` on the
    /// fields of `descriptor`.
    pub(crate) fn check_unique(
        &self,
        documents: &[Document],
        descriptor: &IndexDescriptor,
        values: &[Value],
        exclude_id: Option<&Value>,
    ) -> StoreResult<()> {
        let conflict = documents.iter().any(|doc| {
            if exclude_id.is_some() && doc.id() == exclude_id {
                return false;
            }
            descriptor.key_values(doc).as_deref() == Some(values)
        });

        if conflict {
            Err(self.duplicate(descriptor, values))
        } else {
            Ok(())
        }
    }

    /// Checks `candidates` against `existing` and against each other.
    ///
    /// A candidate whose `_id` is also present in `existing` replaces that
    /// document (an update post-image), so the old version is not counted.
    pub(crate) fn check_documents(&self, existing: &[Document], candidates: &[Document]) -> StoreResult<()> {
        if !self.has_constraints() || candidates.is_empty() {
            return Ok(());
        }

        if let [candidate] = candidates {
            for descriptor in &self.descriptors {
                if let Some(values) = descriptor.key_values(candidate) {
                    self.check_unique(existing, descriptor, &values, candidate.id())?;
                }
            }
            return Ok(());
        }

        let replaced: HashSet<String> = candidates
            .iter()
            .filter_map(|doc| doc.id().map(|id| id.canonical_key()))
            .collect();

        for descriptor in &self.descriptors {
            let mut seen: HashSet<String> = HashSet::new();
            for doc in existing {
                let is_replaced = doc
                    .id()
                    .map(|id| replaced.contains(&id.canonical_key()))
                    .unwrap_or(false);
                if is_replaced {
                    continue;
                }
                if let Some(values) = descriptor.key_values(doc) {
                    seen.insert(IndexDescriptor::key_identity(&values));
                }
            }

            for doc in candidates {
                if let Some(values) = descriptor.key_values(doc) {
                    let identity = IndexDescriptor::key_identity(&values);
                    if !seen.insert(identity) {
                        return Err(self.duplicate(descriptor, &values));
                    }
                }
            }
        }
        Ok(())
    }

    /// Verifies that already stored documents satisfy every unique index.
    pub(crate) fn validate_existing(&self, documents: &[Document]) -> StoreResult<()> {
        self.check_documents(&[], documents)
    }

    fn duplicate(&self, descriptor: &IndexDescriptor, values: &[Value]) -> StoreError {
        let message = format!(
            "Unique constraint violated on {}[{}]: value {} already exists",
            self.collection_name,
            descriptor.field_names().join(", "),
            Value::Array(values.to_vec())
        );
        log::error!("{}", message);
        StoreError::new(&message, ErrorKind::DuplicateKey)
    }
}
