use std::fs::{self, File, OpenOptions, TryLockError};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::util::RetryPolicy;
use crate::common::LOCK_FILE_NAME;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::store::{CollectionLog, StoreProvider};

use super::JsonLinesLog;

/// File-backed store: one JSON Lines log per collection inside a data
/// directory.
///
/// The directory is guarded by an advisory lock on `<dir>/LOCK`, held from
/// [StoreProvider::open_or_create] until [StoreProvider::close]. The OS
/// drops the lock when the process exits, so nothing needs cleaning up
/// after a crash.
#[derive(Clone)]
pub struct JsonLinesStore {
    inner: Arc<JsonLinesStoreInner>,
}

impl JsonLinesStore {
    pub fn new(data_dir: &Path, retry: RetryPolicy, fsync: bool) -> JsonLinesStore {
        JsonLinesStore {
            inner: Arc::new(JsonLinesStoreInner {
                data_dir: data_dir.to_path_buf(),
                retry,
                fsync,
                lock: Mutex::new(None),
            }),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.inner.data_dir
    }
}

impl StoreProvider for JsonLinesStore {
    fn open_or_create(&self) -> StoreResult<()> {
        self.inner.open_or_create()
    }

    fn open_log(&self, collection: &str) -> StoreResult<Box<dyn CollectionLog>> {
        self.inner.open_log(collection)
    }

    fn is_persistent(&self) -> bool {
        true
    }

    fn close(&self) -> StoreResult<()> {
        self.inner.close()
    }
}

struct JsonLinesStoreInner {
    data_dir: PathBuf,
    retry: RetryPolicy,
    fsync: bool,
    lock: Mutex<Option<File>>,
}

impl JsonLinesStoreInner {
    fn open_or_create(&self) -> StoreResult<()> {
        let mut guard = self.lock.lock();
        if guard.is_some() {
            return Ok(());
        }

        let dir = self.data_dir.clone();
        self.retry
            .run(&format!("create {}", dir.display()), || fs::create_dir_all(&dir))?;

        let lock_path = self.data_dir.join(LOCK_FILE_NAME);
        let lock_file = self.retry.run(&format!("open {}", lock_path.display()), || {
            OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(&lock_path)
        })?;

        match lock_file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                log::error!(
                    "Data directory {} is locked by another store instance",
                    self.data_dir.display()
                );
                return Err(StoreError::new(
                    &format!(
                        "Data directory {} is locked by another store instance",
                        self.data_dir.display()
                    ),
                    ErrorKind::StoreLocked,
                ));
            }
            Err(TryLockError::Error(err)) => {
                log::error!("Failed to lock {}: {}", lock_path.display(), err);
                return Err(StoreError::new_with_cause(
                    &format!("Failed to lock {}", lock_path.display()),
                    ErrorKind::IOError,
                    err.into(),
                ));
            }
        }

        log::debug!("Locked data directory {}", self.data_dir.display());
        *guard = Some(lock_file);
        Ok(())
    }

    fn open_log(&self, collection: &str) -> StoreResult<Box<dyn CollectionLog>> {
        if self.lock.lock().is_none() {
            log::error!("Store at {} is not open", self.data_dir.display());
            return Err(StoreError::new(
                &format!("Store at {} is not open", self.data_dir.display()),
                ErrorKind::StoreAlreadyClosed,
            ));
        }
        Ok(Box::new(JsonLinesLog::new(
            &self.data_dir,
            collection,
            self.retry,
            self.fsync,
        )))
    }

    fn close(&self) -> StoreResult<()> {
        if let Some(file) = self.lock.lock().take() {
            file.unlock()?;
            log::debug!("Released data directory {}", self.data_dir.display());
        }
        Ok(())
    }
}
