//! Configuration of a [DocStore](crate::DocStore).

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::util::RetryPolicy;
use crate::common::{
    DEFAULT_COMPACTION_THRESHOLD, DEFAULT_IO_RETRY_ATTEMPTS, DEFAULT_IO_RETRY_BACKOFF_MS,
    DEFAULT_WRITE_QUEUE_BOUND,
};
use crate::errors::{ErrorKind, StoreError, StoreResult};

/// Settings shared by every collection of a store.
///
/// Usually assembled through [DocStoreBuilder](crate::DocStoreBuilder);
/// setters validate their input and fail with
/// [ErrorKind::InvalidConfiguration].
#[derive(Debug, Clone)]
pub struct StoreConfig {
    data_dir: Option<PathBuf>,
    compaction_threshold: usize,
    compaction_interval: Option<Duration>,
    compact_on_close: bool,
    io_retry_attempts: u32,
    io_retry_backoff: Duration,
    write_queue_bound: usize,
    fsync: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            data_dir: None,
            compaction_threshold: DEFAULT_COMPACTION_THRESHOLD,
            compaction_interval: None,
            compact_on_close: true,
            io_retry_attempts: DEFAULT_IO_RETRY_ATTEMPTS,
            io_retry_backoff: Duration::from_millis(DEFAULT_IO_RETRY_BACKOFF_MS),
            write_queue_bound: DEFAULT_WRITE_QUEUE_BOUND,
            fsync: true,
        }
    }
}

impl StoreConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directory holding the collection logs. `None` means in-memory.
    pub fn data_dir(&self) -> Option<&Path> {
        self.data_dir.as_deref()
    }

    pub fn set_data_dir(&mut self, data_dir: &Path) -> StoreResult<()> {
        if data_dir.as_os_str().is_empty() {
            return Err(invalid_configuration("Data directory cannot be empty"));
        }
        self.data_dir = Some(data_dir.to_path_buf());
        Ok(())
    }

    /// Appended records after which a collection compacts itself.
    pub fn compaction_threshold(&self) -> usize {
        self.compaction_threshold
    }

    pub fn set_compaction_threshold(&mut self, threshold: usize) -> StoreResult<()> {
        if threshold == 0 {
            return Err(invalid_configuration("Compaction threshold must be at least 1"));
        }
        self.compaction_threshold = threshold;
        Ok(())
    }

    pub fn compaction_interval(&self) -> Option<Duration> {
        self.compaction_interval
    }

    pub fn set_compaction_interval(&mut self, interval: Duration) -> StoreResult<()> {
        if interval.is_zero() {
            return Err(invalid_configuration("Compaction interval must be greater than zero"));
        }
        self.compaction_interval = Some(interval);
        Ok(())
    }

    pub fn compact_on_close(&self) -> bool {
        self.compact_on_close
    }

    pub fn set_compact_on_close(&mut self, compact_on_close: bool) {
        self.compact_on_close = compact_on_close;
    }

    pub fn io_retry_attempts(&self) -> u32 {
        self.io_retry_attempts
    }

    pub fn set_io_retry_attempts(&mut self, attempts: u32) -> StoreResult<()> {
        if attempts == 0 {
            return Err(invalid_configuration("I/O retry attempts must be at least 1"));
        }
        self.io_retry_attempts = attempts;
        Ok(())
    }

    pub fn io_retry_backoff(&self) -> Duration {
        self.io_retry_backoff
    }

    pub fn set_io_retry_backoff(&mut self, backoff: Duration) {
        self.io_retry_backoff = backoff;
    }

    /// Capacity of each collection's writer queue; callers block when full.
    pub fn write_queue_bound(&self) -> usize {
        self.write_queue_bound
    }

    pub fn set_write_queue_bound(&mut self, bound: usize) -> StoreResult<()> {
        if bound == 0 {
            return Err(invalid_configuration("Write queue bound must be at least 1"));
        }
        self.write_queue_bound = bound;
        Ok(())
    }

    pub fn fsync(&self) -> bool {
        self.fsync
    }

    /// Turning fsync off trades crash durability for write speed.
    pub fn set_fsync(&mut self, fsync: bool) {
        self.fsync = fsync;
    }

    pub(crate) fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.io_retry_attempts, self.io_retry_backoff)
    }
}

fn invalid_configuration(message: &str) -> StoreError {
    log::error!("{}", message);
    StoreError::new(message, ErrorKind::InvalidConfiguration)
}
