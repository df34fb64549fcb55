//! # docstore - an embedded, file-backed document store
//!
//! docstore keeps schema-less documents in declared collections, entirely
//! in process. Each collection is held in memory and persisted as an
//! append-only JSON Lines log that is compacted now and then. It offers:
//!
//! - Mongo-like filters (`$eq`, `$in`, `$regex`, `$gt`, `$or`, ...) as a
//!   fluent API or parsed from documents
//! - unique constraints on single fields and field tuples
//! - sorting and pagination
//! - batched one-hop associations between collections
//! - a small aggregation pipeline (`$match`, `$group`, `$sort`, `$skip`,
//!   `$limit`)
//!
//! ## Quick start
//!
//! ```rust
//! use docstore::collection::{CollectionSchema, UpdatePatch, update_all};
//! use docstore::filter::field;
//! use docstore::{doc, DocStore};
//!
//! let store = DocStore::builder()
//!     .collection(CollectionSchema::new("users").unique_index("email"))
//!     .open()
//!     .unwrap();
//!
//! store.insert("users", doc! { "email": "a@corp.io", "role": "admin" }).unwrap();
//! let patch = UpdatePatch::new().set("active", true);
//! let modified = store.update("users", &field("role").eq("admin"), &patch, &update_all()).unwrap();
//! assert_eq!(modified, 1);
//! store.close().unwrap();
//! ```
//!
//! Set a data directory with [DocStoreBuilder::data_dir] to persist; without
//! one the store lives in memory only.
//!
//! ## Concurrency
//!
//! Every collection has one writer thread. Mutations are queued to it and
//! the caller returns once the change is durable. Reads never wait for
//! disk I/O. A data directory can be opened by one process at a time.
//!
//! ## Module organization
//!
//! - [`collection`] - documents, collection handles, find and update options
//! - [`filter`] - query filters
//! - [`index`] - index declarations and uniqueness checks
//! - [`association`] - batched associations
//! - [`aggregate`] - aggregation pipelines
//! - [`store`] - persistence backends and load reports
//! - [`common`] - values, constants and utilities
//! - [`errors`] - error types

pub mod aggregate;
pub mod association;
pub mod collection;
pub mod common;
pub mod docstore;
pub mod docstore_builder;
pub mod docstore_config;
pub mod errors;
pub mod filter;
pub mod index;
pub mod store;

pub use crate::docstore::DocStore;
pub use docstore_builder::DocStoreBuilder;
pub use docstore_config::StoreConfig;
