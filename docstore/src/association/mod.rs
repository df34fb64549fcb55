//! Batched one-hop associations between collections.
//!
//! Descriptors are declared explicitly and resolved over a result set with
//! one lookup per descriptor, so listing pages never issue a query per row.

mod descriptor;
mod resolver;

pub use descriptor::*;
pub use resolver::*;
