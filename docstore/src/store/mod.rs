//! Storage backends.
//!
//! A backend implements [StoreProvider] and hands out one [CollectionLog]
//! per collection. Two backends ship with the crate:
//!
//! - [JsonLinesStore]: an append-only JSON Lines file per collection, every
//!   record `fsync`ed before the mutating call returns, compacted into a
//!   single record from time to time.
//! - [MemoryStore]: keeps nothing; used when no data directory is set.
//!
//! # On-disk format
//!
//! `<data_dir>/<collection>.jsonl` holds one [LogRecord] per line. Dates are
//! written as `{"$date": "<RFC 3339>"}`; every other value is plain JSON.
//! A torn final line is dropped at load time. Any other damage moves the file
//! to `<collection>.jsonl.corrupt-<unix-millis>` and the collection starts
//! empty; [LoadReport] tells which case applied.

mod jsonl;
mod load_report;
mod log_record;
pub mod memory;
mod store_provider;

pub use jsonl::*;
pub use load_report::*;
pub use log_record::*;
pub use memory::MemoryStore;
pub use store_provider::*;
