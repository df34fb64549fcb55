//! Documents and declared collections.
//!
//! # Documents
//!
//! A [Document] is an insertion-ordered map of field names to
//! [Value](crate::common::Value)s. Nested fields are addressed with `.`
//! paths.
//!
//! ```rust
//! use docstore::collection::Document;
//! use docstore::common::Value;
//!
//! let mut doc = Document::new();
//! doc.put("name", "Alice").unwrap();
//! doc.put("address.city", "Pune").unwrap();
//! assert_eq!(doc.get("address.city"), Some(&Value::from("Pune")));
//! ```
//!
//! # Collections
//!
//! A [CollectionStore] is declared up front with a [CollectionSchema] and
//! owns one writer thread. Every mutation is validated, checked against the
//! unique indexes, persisted and only then made visible.
//!
//! # System fields
//!
//! - `_id` - unique, stable identifier; a UUID is generated when absent.
//! - `createdAt` - set once at insert.
//! - `updatedAt` - refreshed by every successful mutation, never decreasing.

mod collection_state;
mod collection_store;
mod document;
mod find_options;
mod schema;
mod update_options;
mod update_patch;
mod writer;

pub(crate) use collection_state::*;
pub use collection_store::*;
pub use document::*;
pub use find_options::*;
pub use schema::*;
pub use update_options::*;
pub use update_patch::*;
pub(crate) use writer::*;
