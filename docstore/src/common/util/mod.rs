mod date_utils;
mod io_retry;
mod task_util;

pub use date_utils::*;
pub use io_retry::*;
pub(crate) use task_util::*;
