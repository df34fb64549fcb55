/// Kind of an index declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// Rejects a mutation that would make two documents share a value.
    Unique,
    /// Recorded with the schema but never enforced.
    NonUnique,
}

/// Options for declaring an index on a collection schema.
///
/// # Examples
///
/// ```rust
/// use docstore::index::{non_unique_index, unique_index, IndexType};
///
/// assert_eq!(unique_index().index_type(), IndexType::Unique);
/// assert!(!non_unique_index().is_unique());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    index_type: IndexType,
}

impl IndexOptions {
    pub fn new(index_type: IndexType) -> IndexOptions {
        IndexOptions { index_type }
    }

    pub fn index_type(&self) -> IndexType {
        self.index_type
    }

    pub fn is_unique(&self) -> bool {
        self.index_type == IndexType::Unique
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        unique_index()
    }
}

pub fn unique_index() -> IndexOptions {
    IndexOptions::new(IndexType::Unique)
}

pub fn non_unique_index() -> IndexOptions {
    IndexOptions::new(IndexType::NonUnique)
}
