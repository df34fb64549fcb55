//! A small aggregation pipeline: `$match`, `$group`, `$sort`, `$skip` and
//! `$limit`.
//!
//! Pipelines are built either with the fluent [Pipeline] builder or parsed
//! from Mongo-shaped stage documents with [Pipeline::parse]. Unknown stages
//! and malformed accumulators fail with
//! [ErrorKind::InvalidPipeline](crate::errors::ErrorKind::InvalidPipeline)
//! before anything runs.
//!
//! ```rust
//! use docstore::aggregate::Pipeline;
//! use docstore::doc;
//!
//! let pipeline = Pipeline::parse(&[
//!     doc! { "$match": { "status": "active" } },
//!     doc! { "$group": { "_id": "$department", "total": { "$sum": "$annualSalary" } } },
//! ]);
//! assert!(pipeline.is_ok());
//! ```

mod accumulator;
mod group;
mod pipeline;

pub use accumulator::{Accumulator, SumOperand};
pub use group::*;
pub use pipeline::*;

use crate::errors::{ErrorKind, StoreError};

pub(crate) fn invalid_pipeline(message: String) -> StoreError {
    log::error!("{}", message);
    StoreError::new(&message, ErrorKind::InvalidPipeline)
}
