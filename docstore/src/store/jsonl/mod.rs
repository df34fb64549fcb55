mod jsonl_log;
mod store;

pub(crate) use jsonl_log::*;
pub use store::*;
