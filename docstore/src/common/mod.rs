//! Common types and utilities shared by the store modules.

mod constants;
mod sort_order;
pub mod util;
mod value;

pub use constants::*;
pub use sort_order::*;
pub use util::*;
pub use value::*;
