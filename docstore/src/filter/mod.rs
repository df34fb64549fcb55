//! Query filters for selecting documents from collections.
//!
//! Filters come from two places and produce the same [Filter] type:
//!
//! - the fluent API: `field("age").gte(30).and(field("status").eq("active"))`
//! - Mongo-shaped documents: `Filter::parse(&doc!{ "age": { "$gte": 30 } })`
//!
//! # Examples
//!
//! ```rust
//! use docstore::doc;
//! use docstore::filter::{all, by_id, field, Filter};
//!
//! let everything = all();
//! let one = by_id("E1");
//! let fluent = field("annualSalary").gt(50000).or(field("grade").eq("L7"));
//! let parsed = Filter::parse(&doc! { "name": { "$like": "%rao%" } }).unwrap();
//! ```
//!
//! # Supported Operators
//!
//! - **Equality**: literal, `$eq`, `$ne`
//! - **Comparison**: `$gt`, `$gte`, `$lt`, `$lte`
//! - **Membership**: `$in`, `$nin`
//! - **Pattern**: `$like`, `$regex` (with `$options: "i"`)
//! - **Presence**: `$exists`
//! - **Logical**: `$and`, `$or`, `$nor`, field-level `$not`

mod basic_filters;
mod filter;
mod fluent;
mod logical_filters;
mod parser;
mod pattern_filters;
mod range_filters;

pub(crate) use basic_filters::*;
pub use filter::*;
pub use fluent::*;
pub(crate) use logical_filters::*;
pub(crate) use pattern_filters::*;
pub(crate) use range_filters::*;
