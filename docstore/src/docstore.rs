use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;

use crate::aggregate::Pipeline;
use crate::association::{resolve, AssociationDescriptor, DocumentSource};
use crate::collection::{
    CollectionSchema, CollectionStore, Document, FindOptions, RemoveOptions, UpdateOptions, UpdatePatch,
};
use crate::common::util::Scheduler;
use crate::docstore_builder::DocStoreBuilder;
use crate::docstore_config::StoreConfig;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Filter;
use crate::store::{JsonLinesStore, LoadReport, MemoryStore, Store};

/// An open document store: the declared collections of one data directory.
///
/// `DocStore` is an explicit context object. It is built once with
/// [DocStore::builder] and cloned into whatever needs it; every clone
/// shares the same collections. The store closes when [DocStore::close]
/// is called or when the last clone is dropped.
///
/// ```rust
/// use docstore::collection::{CollectionSchema, FindOptions};
/// use docstore::filter::field;
/// use docstore::{doc, DocStore};
///
/// let store = DocStore::builder()
///     .collection(CollectionSchema::new("employees").unique_index("employeeNo"))
///     .open()
///     .unwrap();
///
/// store.insert("employees", doc! { "employeeNo": "E1", "name": "Asha" }).unwrap();
/// let found = store
///     .find("employees", &field("employeeNo").eq("E1"), &FindOptions::new())
///     .unwrap();
/// assert_eq!(found.len(), 1);
/// store.close().unwrap();
/// ```
#[derive(Clone)]
pub struct DocStore {
    inner: Arc<DocStoreInner>,
}

impl DocStore {
    pub fn builder() -> DocStoreBuilder {
        DocStoreBuilder::new()
    }

    /// Opens the backend, loads every declared collection and starts their
    /// writers.
    pub(crate) fn open(config: StoreConfig, schemas: Vec<CollectionSchema>) -> StoreResult<DocStore> {
        let store = match config.data_dir() {
            Some(dir) => Store::new(JsonLinesStore::new(dir, config.retry_policy(), config.fsync())),
            None => Store::new(MemoryStore::new()),
        };
        store.open_or_create()?;

        let mut collections = IndexMap::with_capacity(schemas.len());
        let mut reports = Vec::with_capacity(schemas.len());
        for schema in schemas {
            let name = schema.name().to_string();
            let opened = store
                .open_log(&name)
                .and_then(|log| CollectionStore::open(schema, log, &config));
            match opened {
                Ok((collection, report)) => {
                    collections.insert(name, collection);
                    reports.push(report);
                }
                Err(err) => {
                    for collection in collections.values() {
                        let _ = collection.close(false);
                    }
                    let _ = store.close();
                    return Err(err);
                }
            }
        }

        let scheduler = Scheduler::new();
        if let Some(interval) = config.compaction_interval() {
            for collection in collections.values() {
                let Some(trigger) = collection.compaction_trigger() else {
                    continue;
                };
                let task = format!("compaction of {}", collection.name());
                if let Err(err) = scheduler.schedule(&task, interval, move || trigger.fire()) {
                    scheduler.stop();
                    for collection in collections.values() {
                        let _ = collection.close(false);
                    }
                    let _ = store.close();
                    return Err(err);
                }
            }
        }

        log::debug!(
            "Opened store with {} collection(s) at {}",
            collections.len(),
            config
                .data_dir()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "<memory>".to_string())
        );

        Ok(DocStore {
            inner: Arc::new(DocStoreInner {
                config,
                store,
                collections,
                load_report: LoadReport::new(reports),
                scheduler,
                closed: AtomicBool::new(false),
            }),
        })
    }

    /// Handle to a declared collection.
    pub fn collection(&self, name: &str) -> StoreResult<CollectionStore> {
        self.inner.collection(name).cloned()
    }

    pub fn has_collection(&self, name: &str) -> bool {
        self.inner.collections.contains_key(name)
    }

    /// Declared collection names in declaration order.
    pub fn collection_names(&self) -> Vec<String> {
        self.inner.collections.keys().cloned().collect()
    }

    pub fn insert(&self, collection: &str, document: Document) -> StoreResult<Document> {
        self.inner.collection(collection)?.insert(document)
    }

    pub fn insert_many(&self, collection: &str, documents: Vec<Document>) -> StoreResult<Vec<Document>> {
        self.inner.collection(collection)?.insert_many(documents)
    }

    pub fn find_one(&self, collection: &str, filter: &Filter) -> StoreResult<Option<Document>> {
        self.inner.collection(collection)?.find_one(filter)
    }

    pub fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        self.inner.collection(collection)?.find(filter, options)
    }

    pub fn count(&self, collection: &str, filter: &Filter) -> StoreResult<usize> {
        self.inner.collection(collection)?.count(filter)
    }

    pub fn update(
        &self,
        collection: &str,
        filter: &Filter,
        patch: &UpdatePatch,
        options: &UpdateOptions,
    ) -> StoreResult<usize> {
        self.inner.collection(collection)?.update(filter, patch, options)
    }

    pub fn remove(&self, collection: &str, filter: &Filter, options: &RemoveOptions) -> StoreResult<usize> {
        self.inner.collection(collection)?.remove(filter, options)
    }

    pub fn aggregate(&self, collection: &str, pipeline: &Pipeline) -> StoreResult<Vec<Document>> {
        self.inner.collection(collection)?.aggregate(pipeline)
    }

    /// Attaches related documents to `results`, one lookup per descriptor.
    pub fn resolve(&self, results: Vec<Document>, descriptors: &[AssociationDescriptor]) -> StoreResult<Vec<Document>> {
        self.inner.check_opened()?;
        resolve(self, results, descriptors)
    }

    /// Compacts every collection.
    pub fn compact(&self) -> StoreResult<()> {
        self.inner.check_opened()?;
        for collection in self.inner.collections.values() {
            collection.compact()?;
        }
        Ok(())
    }

    /// What happened to each collection while loading.
    pub fn load_report(&self) -> &LoadReport {
        &self.inner.load_report
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    /// `false` for an in-memory store.
    pub fn is_persistent(&self) -> bool {
        self.inner.store.is_persistent()
    }

    /// Drains every writer queue, compacts when configured, and releases
    /// the data directory. Later calls fail with
    /// [ErrorKind::StoreAlreadyClosed]; closing again is a no-op.
    pub fn close(&self) -> StoreResult<()> {
        self.inner.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }
}

impl DocumentSource for DocStore {
    fn has_collection(&self, name: &str) -> bool {
        DocStore::has_collection(self, name)
    }

    fn find(&self, collection: &str, filter: &Filter, options: &FindOptions) -> StoreResult<Vec<Document>> {
        DocStore::find(self, collection, filter, options)
    }
}

struct DocStoreInner {
    config: StoreConfig,
    store: Store,
    collections: IndexMap<String, CollectionStore>,
    load_report: LoadReport,
    scheduler: Scheduler,
    closed: AtomicBool,
}

impl DocStoreInner {
    fn collection(&self, name: &str) -> StoreResult<&CollectionStore> {
        self.check_opened()?;
        self.collections.get(name).ok_or_else(|| {
            log::error!("Collection {} is not declared", name);
            StoreError::new(
                &format!("Collection {} is not declared", name),
                ErrorKind::CollectionNotFound,
            )
        })
    }

    fn check_opened(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::Acquire) {
            log::error!("Store is closed");
            return Err(StoreError::new("Store is closed", ErrorKind::StoreAlreadyClosed));
        }
        Ok(())
    }

    fn close(&self) -> StoreResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.scheduler.stop();

        let mut first_error = None;
        for collection in self.collections.values() {
            if let Err(err) = collection.close(self.config.compact_on_close()) {
                log::error!("Failed to close collection {}: {}", collection.name(), err);
                first_error.get_or_insert(err);
            }
        }
        if let Err(err) = self.store.close() {
            first_error.get_or_insert(err);
        }
        log::debug!("Store closed");

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

// Runs when the last handle goes away.
impl Drop for DocStoreInner {
    fn drop(&mut self) {
        if let Err(err) = self.close() {
            log::warn!("Failed to close store on drop: {}", err);
        }
    }
}
