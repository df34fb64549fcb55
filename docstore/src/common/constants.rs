// doc constants
pub const DOC_ID: &str = "_id";
pub const DOC_CREATED_AT: &str = "createdAt";
pub const DOC_UPDATED_AT: &str = "updatedAt";
pub const RESERVED_FIELDS: [&str; 3] = [DOC_ID, DOC_CREATED_AT, DOC_UPDATED_AT];

// on-disk encoding of date values
pub const DATE_TAG: &str = "$date";

// store constants
pub const LOG_FILE_EXTENSION: &str = "jsonl";
pub const CORRUPT_FILE_MARKER: &str = "corrupt";
pub const COMPACT_TEMP_SUFFIX: &str = "compact.tmp";
pub const LOCK_FILE_NAME: &str = "LOCK";

// writer defaults
pub const DEFAULT_COMPACTION_THRESHOLD: usize = 1000;
pub const DEFAULT_WRITE_QUEUE_BOUND: usize = 1024;
pub const DEFAULT_IO_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_IO_RETRY_BACKOFF_MS: u64 = 20;

pub const DOCSTORE_VERSION: &str = env!("CARGO_PKG_VERSION");
