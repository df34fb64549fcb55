use std::sync::Arc;

use parking_lot::RwLock;

use crate::aggregate::Pipeline;
use crate::collection::{
    CollectionSchema, CollectionState, CollectionWriter, CompactionTrigger, Document, FindOptions,
    RemoveOptions, UpdateOptions, UpdatePatch, WriteActor,
};
use crate::docstore_config::StoreConfig;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Filter;
use crate::index::UniqueIndexer;
use crate::store::{CollectionLoadReport, CollectionLog};

/// A declared collection: its documents in memory plus the writer thread
/// that persists every change.
///
/// Handles are cheap to clone and share one collection. Reads run against
/// the in-memory state under a read lock and never wait for disk I/O.
/// Writes are queued to the collection's writer and return once the
/// change is durable and visible to readers.
///
/// ```rust,ignore
/// let users = store.collection("users")?;
/// let stored = users.insert(doc! { "email": "a@corp.io", "role": "admin" })?;
/// let admins = users.find(&field("role").eq("admin"), &FindOptions::new())?;
/// ```
#[derive(Clone)]
pub struct CollectionStore {
    inner: Arc<CollectionStoreInner>,
}

impl CollectionStore {
    /// Loads `log`, validates the declared unique indexes over the loaded
    /// documents and starts the writer.
    pub(crate) fn open(
        schema: CollectionSchema,
        mut log: Box<dyn CollectionLog>,
        config: &StoreConfig,
    ) -> StoreResult<(CollectionStore, CollectionLoadReport)> {
        let name = schema.name().to_string();
        let loaded = log.load()?;
        log::debug!("{}", loaded.report);

        let state = CollectionState::from_documents(loaded.documents)?;
        let indexer = UniqueIndexer::new(&name, schema.indexes());
        if indexer.has_constraints() {
            indexer.validate_existing(state.documents())?;
        }

        if log.records_since_compaction() > 1 {
            log::debug!(
                "Compacting {} on open, {} record(s) replayed",
                name,
                log.records_since_compaction()
            );
            if let Err(err) = log.compact(state.documents()) {
                log::warn!("Compaction of {} on open failed: {}", name, err);
            }
        }

        let state = Arc::new(RwLock::new(state));
        let writer = CollectionWriter::new(
            &name,
            log,
            state.clone(),
            indexer,
            config.compaction_threshold(),
        );
        let actor = WriteActor::spawn(writer, config.write_queue_bound())?;

        let store = CollectionStore {
            inner: Arc::new(CollectionStoreInner {
                schema,
                state,
                writer: RwLock::new(Some(actor)),
            }),
        };
        Ok((store, loaded.report))
    }

    pub fn name(&self) -> &str {
        self.inner.schema.name()
    }

    pub fn schema(&self) -> &CollectionSchema {
        &self.inner.schema
    }

    /// Inserts one document and returns it as stored, with `_id`,
    /// `createdAt` and `updatedAt` set.
    pub fn insert(&self, document: Document) -> StoreResult<Document> {
        let mut stored = self.insert_many(vec![document])?;
        stored.pop().ok_or_else(|| {
            log::error!("Insert into {} returned no document", self.name());
            StoreError::new(
                &format!("Insert into {} returned no document", self.name()),
                ErrorKind::InternalError,
            )
        })
    }

    /// Inserts a batch atomically: either every document is stored or none.
    pub fn insert_many(&self, documents: Vec<Document>) -> StoreResult<Vec<Document>> {
        self.inner.with_writer(|writer| writer.insert(documents))
    }

    /// The first match in insertion order.
    pub fn find_one(&self, filter: &Filter) -> StoreResult<Option<Document>> {
        self.inner.ensure_open()?;
        let state = self.inner.state.read();
        Ok(state
            .matching_positions(filter, Some(1))
            .first()
            .map(|&position| state.documents()[position].clone()))
    }

    pub fn find(&self, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        self.inner.ensure_open()?;
        let state = self.inner.state.read();

        // without a sort the first skip + limit matches are all that is needed
        let scan_limit = match (options.sortable_fields(), options.limit_count()) {
            (None, Some(limit)) => Some(options.skip_count().unwrap_or(0).saturating_add(limit)),
            _ => None,
        };
        let documents: Vec<Document> = state
            .matching_positions(filter, scan_limit)
            .into_iter()
            .map(|position| state.documents()[position].clone())
            .collect();
        drop(state);

        Ok(options.apply(documents))
    }

    pub fn count(&self, filter: &Filter) -> StoreResult<usize> {
        self.inner.ensure_open()?;
        Ok(self.inner.state.read().count(filter))
    }

    /// Number of documents in the collection.
    pub fn size(&self) -> StoreResult<usize> {
        self.inner.ensure_open()?;
        Ok(self.inner.state.read().len())
    }

    /// Applies `patch` to the first match, or to every match with
    /// [UpdateOptions::is_multi]. Returns the number of modified documents.
    pub fn update(&self, filter: &Filter, patch: &UpdatePatch, options: &UpdateOptions) -> StoreResult<usize> {
        patch.validate()?;
        let (filter, patch) = (filter.clone(), patch.clone());
        self.inner
            .with_writer(|writer| writer.update(filter, patch, options.is_multi()))
    }

    /// Removes the first match, or every match with
    /// [RemoveOptions::is_multi]. Returns the number of removed documents.
    pub fn remove(&self, filter: &Filter, options: &RemoveOptions) -> StoreResult<usize> {
        let filter = filter.clone();
        self.inner
            .with_writer(|writer| writer.remove(filter, options.is_multi()))
    }

    pub fn aggregate(&self, pipeline: &Pipeline) -> StoreResult<Vec<Document>> {
        self.inner.ensure_open()?;
        let documents = self.inner.state.read().documents().to_vec();
        Ok(pipeline.execute(documents))
    }

    /// Rewrites the collection's log as a single record of its documents.
    pub fn compact(&self) -> StoreResult<()> {
        self.inner.with_writer(|writer| writer.compact())
    }

    pub fn is_closed(&self) -> bool {
        self.inner.writer.read().is_none()
    }

    pub(crate) fn compaction_trigger(&self) -> Option<CompactionTrigger> {
        self.inner
            .writer
            .read()
            .as_ref()
            .map(|writer| writer.compaction_trigger())
    }

    /// Drains pending writes, optionally compacts and stops the writer.
    /// Closing twice is a no-op.
    pub(crate) fn close(&self, compact: bool) -> StoreResult<()> {
        let writer = self.inner.writer.write().take();
        match writer {
            Some(mut writer) => {
                let result = writer.shutdown(compact);
                log::debug!("Closed collection {}", self.name());
                result
            }
            None => Ok(()),
        }
    }
}

struct CollectionStoreInner {
    schema: CollectionSchema,
    state: Arc<RwLock<CollectionState>>,
    writer: RwLock<Option<WriteActor>>,
}

impl CollectionStoreInner {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.writer.read().is_none() {
            return Err(self.closed_error());
        }
        Ok(())
    }

    fn with_writer<T, F>(&self, f: F) -> StoreResult<T>
    where
        F: FnOnce(&WriteActor) -> StoreResult<T>,
    {
        let guard = self.writer.read();
        match guard.as_ref() {
            Some(writer) => f(writer),
            None => Err(self.closed_error()),
        }
    }

    fn closed_error(&self) -> StoreError {
        log::error!("Collection {} is closed", self.schema.name());
        StoreError::new(
            &format!("Collection {} is closed", self.schema.name()),
            ErrorKind::StoreAlreadyClosed,
        )
    }
}
