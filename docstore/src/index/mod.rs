//! Index declarations and uniqueness enforcement.
//!
//! Indexes here are constraints, not lookup structures: a unique index makes
//! the store reject any insert or update that would give two documents the
//! same value (or, for a compound index, the same tuple of values). `null`
//! and missing values never conflict. Non-unique declarations are kept with
//! the schema for documentation only.
//!
//! ```rust
//! use docstore::collection::CollectionSchema;
//!
//! let employees = CollectionSchema::new("employees")
//!     .unique_index("email")
//!     .unique_compound_index(&["employeeNo", "companyId"])
//!     .index("departmentId");
//! assert_eq!(employees.indexes().len(), 3);
//! ```

mod descriptor;
mod options;
mod unique_indexer;

pub use descriptor::*;
pub use options::*;
pub(crate) use unique_indexer::*;
