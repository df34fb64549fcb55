use crate::index::{non_unique_index, unique_index, IndexDescriptor};

/// Declaration of a collection and its indexes, registered on the
/// [DocStoreBuilder](crate::DocStoreBuilder) before the store is opened.
#[derive(Debug, Clone)]
pub struct CollectionSchema {
    name: String,
    indexes: Vec<IndexDescriptor>,
}

impl CollectionSchema {
    pub fn new(name: &str) -> Self {
        CollectionSchema {
            name: name.to_string(),
            indexes: Vec::new(),
        }
    }

    pub fn unique_index(mut self, field: &str) -> Self {
        self.indexes
            .push(IndexDescriptor::new(&self.name, &[field], &unique_index()));
        self
    }

    /// A unique index over the tuple of `fields`.
    pub fn unique_compound_index(mut self, fields: &[&str]) -> Self {
        self.indexes
            .push(IndexDescriptor::new(&self.name, fields, &unique_index()));
        self
    }

    /// A non-unique index. Recorded, never enforced.
    pub fn index(mut self, field: &str) -> Self {
        self.indexes
            .push(IndexDescriptor::new(&self.name, &[field], &non_unique_index()));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn indexes(&self) -> &[IndexDescriptor] {
        &self.indexes
    }
}
