use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::collection::CollectionSchema;
use crate::docstore::DocStore;
use crate::docstore_config::StoreConfig;
use crate::errors::{ErrorKind, StoreError, StoreResult};

/// Fluent builder for a [DocStore].
///
/// Every setter validates its input. The first failure is kept and
/// returned by [DocStoreBuilder::open]; later setters are skipped.
///
/// ```rust,ignore
/// use docstore::collection::CollectionSchema;
/// use docstore::DocStore;
/// use std::time::Duration;
///
/// let store = DocStore::builder()
///     .data_dir("/var/lib/hr")
///     .compaction_interval(Duration::from_secs(300))
///     .collection(CollectionSchema::new("users").unique_index("email"))
///     .collection(CollectionSchema::new("employees").unique_index("employeeNo"))
///     .open()?;
/// ```
#[derive(Default)]
pub struct DocStoreBuilder {
    error: Option<StoreError>,
    config: StoreConfig,
    schemas: Vec<CollectionSchema>,
}

impl DocStoreBuilder {
    /// A builder for an in-memory store with default settings.
    pub fn new() -> Self {
        DocStoreBuilder {
            error: None,
            config: StoreConfig::new(),
            schemas: Vec::new(),
        }
    }

    /// Persists collections as JSON Lines files under `data_dir`.
    pub fn data_dir<P: AsRef<Path>>(self, data_dir: P) -> Self {
        self.try_configure(|config| config.set_data_dir(data_dir.as_ref()))
    }

    pub fn compaction_threshold(self, threshold: usize) -> Self {
        self.try_configure(|config| config.set_compaction_threshold(threshold))
    }

    /// Compacts every collection periodically in the background.
    pub fn compaction_interval(self, interval: Duration) -> Self {
        self.try_configure(|config| config.set_compaction_interval(interval))
    }

    pub fn compact_on_close(mut self, compact_on_close: bool) -> Self {
        self.config.set_compact_on_close(compact_on_close);
        self
    }

    pub fn io_retry_attempts(self, attempts: u32) -> Self {
        self.try_configure(|config| config.set_io_retry_attempts(attempts))
    }

    pub fn io_retry_backoff(mut self, backoff: Duration) -> Self {
        self.config.set_io_retry_backoff(backoff);
        self
    }

    pub fn write_queue_bound(self, bound: usize) -> Self {
        self.try_configure(|config| config.set_write_queue_bound(bound))
    }

    pub fn fsync(mut self, fsync: bool) -> Self {
        self.config.set_fsync(fsync);
        self
    }

    /// Declares a collection and its indexes. Only declared collections can
    /// be used once the store is open.
    pub fn collection(mut self, schema: CollectionSchema) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.validate_schema(&schema) {
                self.error = Some(e);
            } else {
                self.schemas.push(schema);
            }
        }
        self
    }

    /// Opens the store with the collected settings and declarations.
    pub fn open(self) -> StoreResult<DocStore> {
        if let Some(error) = self.error {
            return Err(error);
        }
        DocStore::open(self.config, self.schemas)
    }

    fn try_configure<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut StoreConfig) -> StoreResult<()>,
    {
        if self.error.is_none() {
            if let Err(e) = f(&mut self.config) {
                self.error = Some(e);
            }
        }
        self
    }

    fn validate_schema(&self, schema: &CollectionSchema) -> StoreResult<()> {
        validate_collection_name(schema.name())?;

        if self.schemas.iter().any(|s| s.name() == schema.name()) {
            log::error!("Collection {} is already declared", schema.name());
            return Err(StoreError::new(
                &format!("Collection {} is already declared", schema.name()),
                ErrorKind::CollectionAlreadyDeclared,
            ));
        }

        let mut seen = HashSet::new();
        for index in schema.indexes() {
            if index.field_names().is_empty() || index.field_names().iter().any(|f| f.is_empty()) {
                log::error!("Index on {} has an empty field name", schema.name());
                return Err(StoreError::new(
                    &format!("Index on {} has an empty field name", schema.name()),
                    ErrorKind::InvalidConfiguration,
                ));
            }
            if !seen.insert(index.field_names().to_vec()) {
                log::error!("Index {} is declared twice", index);
                return Err(StoreError::new(
                    &format!("Index {} is declared twice", index),
                    ErrorKind::InvalidConfiguration,
                ));
            }
        }
        Ok(())
    }
}

/// Collection names become file names, so they are restricted to ASCII
/// letters, digits, `_` and `-`.
fn validate_collection_name(name: &str) -> StoreResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !valid {
        log::error!("Invalid collection name {:?}", name);
        return Err(StoreError::new(
            &format!("Invalid collection name {:?}: use ASCII letters, digits, '_' or '-'", name),
            ErrorKind::InvalidConfiguration,
        ));
    }
    Ok(())
}
