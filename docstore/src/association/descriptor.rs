use std::fmt::{Display, Formatter};

use crate::common::DOC_ID;

/// A one-hop reference from documents of one collection to another.
///
/// Resolving it looks up `target_collection` documents whose
/// `target_field` (`_id` unless set) equals the source document's
/// `foreign_key_field`, and attaches the match under `alias`. It is not a
/// constraint: a dangling reference resolves to `null`.
///
/// ```rust
/// use docstore::association::AssociationDescriptor;
///
/// let manager = AssociationDescriptor::new("employees", "managerId", "employees", "manager");
/// let company = AssociationDescriptor::new("employees", "companyCode", "companies", "company")
///     .target_field("code");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDescriptor {
    source_collection: String,
    foreign_key_field: String,
    target_collection: String,
    alias: String,
    target_field: String,
}

impl AssociationDescriptor {
    pub fn new(source_collection: &str, foreign_key_field: &str, target_collection: &str, alias: &str) -> Self {
        AssociationDescriptor {
            source_collection: source_collection.to_string(),
            foreign_key_field: foreign_key_field.to_string(),
            target_collection: target_collection.to_string(),
            alias: alias.to_string(),
            target_field: DOC_ID.to_string(),
        }
    }

    /// Matches on `field` of the target instead of `_id`.
    pub fn target_field(mut self, field: &str) -> Self {
        self.target_field = field.to_string();
        self
    }

    pub fn source_collection(&self) -> &str {
        &self.source_collection
    }

    pub fn foreign_key_field(&self) -> &str {
        &self.foreign_key_field
    }

    pub fn target_collection(&self) -> &str {
        &self.target_collection
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn target_field_name(&self) -> &str {
        &self.target_field
    }
}

impl Display for AssociationDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}.{} -> {}.{} as {}",
            self.source_collection, self.foreign_key_field, self.target_collection, self.target_field, self.alias
        )
    }
}
