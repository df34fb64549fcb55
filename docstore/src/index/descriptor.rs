use std::fmt::Display;
use std::sync::Arc;

use crate::collection::Document;
use crate::common::Value;

use super::{IndexOptions, IndexType};

/// An index declared on a collection: its fields and whether it is unique.
///
/// A descriptor with more than one field is a compound index; a compound
/// unique index only rejects documents that match on *all* of its fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct IndexDescriptor {
    inner: Arc<IndexDescriptorInner>,
}

impl IndexDescriptor {
    pub fn new(collection_name: &str, fields: &[&str], options: &IndexOptions) -> Self {
        Self {
            inner: Arc::new(IndexDescriptorInner {
                index_type: options.index_type(),
                field_names: fields.iter().map(|f| f.to_string()).collect(),
                collection_name: collection_name.to_string(),
            }),
        }
    }

    pub fn index_type(&self) -> IndexType {
        self.inner.index_type
    }

    pub fn is_unique(&self) -> bool {
        self.inner.index_type == IndexType::Unique
    }

    pub fn field_names(&self) -> &[String] {
        &self.inner.field_names
    }

    pub fn collection_name(&self) -> &str {
        &self.inner.collection_name
    }

    pub fn is_compound_index(&self) -> bool {
        self.inner.field_names.len() > 1
    }

    /// The indexed values of `document`, or `None` when any of them is
    /// missing or `null`. Such documents never take part in a conflict.
    pub(crate) fn key_values(&self, document: &Document) -> Option<Vec<Value>> {
        let mut values = Vec::with_capacity(self.inner.field_names.len());
        for field in &self.inner.field_names {
            match document.get(field) {
                None | Some(Value::Null) => return None,
                Some(value) => values.push(value.clone()),
            }
        }
        Some(values)
    }

    /// A hashable identity for a key, equal for keys that are equal values.
    pub(crate) fn key_identity(values: &[Value]) -> String {
        values
            .iter()
            .map(|v| v.canonical_key())
            .collect::<Vec<_>>()
            .join("\u{1f}")
    }
}

impl Display for IndexDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:?} index on {}[{}]",
            self.inner.index_type,
            self.inner.collection_name,
            self.inner.field_names.join(", ")
        )
    }
}

#[derive(Debug, PartialEq, Eq, Hash)]
struct IndexDescriptorInner {
    index_type: IndexType,
    field_names: Vec<String>,
    collection_name: String,
}
