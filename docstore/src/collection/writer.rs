use std::collections::HashSet;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender, TrySendError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use parking_lot::RwLock;
use uuid::Uuid;

use crate::collection::{CollectionState, Document, Mutation, UpdatePatch};
use crate::common::util::{monotonic_after, now_utc};
use crate::common::{Value, DOC_CREATED_AT, DOC_ID, DOC_UPDATED_AT};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Filter;
use crate::index::UniqueIndexer;
use crate::store::{CollectionLog, LogRecord};

/// Requests served by a collection's writer thread.
pub(crate) enum WriteCommand {
    Insert {
        documents: Vec<Document>,
        reply: Sender<StoreResult<Vec<Document>>>,
    },
    Update {
        filter: Filter,
        patch: UpdatePatch,
        multi: bool,
        reply: Sender<StoreResult<usize>>,
    },
    Remove {
        filter: Filter,
        multi: bool,
        reply: Sender<StoreResult<usize>>,
    },
    /// A compaction; scheduled ones carry no reply channel.
    Compact {
        reply: Option<Sender<StoreResult<()>>>,
    },
    /// Stops the thread once every earlier command has been served.
    Shutdown {
        compact: bool,
        reply: Sender<StoreResult<()>>,
    },
}

/// Handle to the single writer thread of one collection.
///
/// Commands queue on a bounded channel, so a burst of writers blocks on
/// `send` instead of growing memory. Each caller waits on its own reply
/// channel until the mutation is durable and visible.
pub(crate) struct WriteActor {
    collection: String,
    request_tx: SyncSender<WriteCommand>,
    thread_handle: Option<JoinHandle<()>>,
}

impl WriteActor {
    pub(crate) fn spawn(writer: CollectionWriter, queue_bound: usize) -> StoreResult<Self> {
        let collection = writer.collection.clone();
        let (request_tx, request_rx) = mpsc::sync_channel(queue_bound);

        let thread_handle = thread::Builder::new()
            .name(format!("docstore-writer-{}", collection))
            .spawn(move || writer.run(request_rx))
            .map_err(|e| {
                log::error!("Failed to spawn writer thread for {}: {}", collection, e);
                StoreError::new_with_cause(
                    &format!("Failed to spawn writer thread for {}", collection),
                    ErrorKind::InternalError,
                    e.into(),
                )
            })?;

        Ok(WriteActor {
            collection,
            request_tx,
            thread_handle: Some(thread_handle),
        })
    }

    pub(crate) fn insert(&self, documents: Vec<Document>) -> StoreResult<Vec<Document>> {
        self.request(|reply| WriteCommand::Insert { documents, reply })
    }

    pub(crate) fn update(&self, filter: Filter, patch: UpdatePatch, multi: bool) -> StoreResult<usize> {
        self.request(|reply| WriteCommand::Update {
            filter,
            patch,
            multi,
            reply,
        })
    }

    pub(crate) fn remove(&self, filter: Filter, multi: bool) -> StoreResult<usize> {
        self.request(|reply| WriteCommand::Remove {
            filter,
            multi,
            reply,
        })
    }

    pub(crate) fn compact(&self) -> StoreResult<()> {
        self.request(|reply| WriteCommand::Compact { reply: Some(reply) })
    }

    /// A sender for fire-and-forget compaction requests.
    pub(crate) fn compaction_trigger(&self) -> CompactionTrigger {
        CompactionTrigger {
            collection: self.collection.clone(),
            request_tx: self.request_tx.clone(),
        }
    }

    /// Drains the queue, optionally compacts, and joins the thread.
    pub(crate) fn shutdown(&mut self, compact: bool) -> StoreResult<()> {
        let result = self.request(|reply| WriteCommand::Shutdown { compact, reply });
        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                log::error!("Writer thread of {} panicked", self.collection);
                return Err(StoreError::new(
                    &format!("Writer thread of {} panicked", self.collection),
                    ErrorKind::InternalError,
                ));
            }
        }
        result
    }

    fn request<T, F>(&self, command: F) -> StoreResult<T>
    where
        F: FnOnce(Sender<StoreResult<T>>) -> WriteCommand,
    {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.request_tx.send(command(reply_tx)).map_err(|_| {
            log::error!("Writer of {} has shut down", self.collection);
            StoreError::new(
                &format!("Writer of {} has shut down", self.collection),
                ErrorKind::StoreAlreadyClosed,
            )
        })?;

        reply_rx.recv().map_err(|_| {
            log::error!("Writer of {} dropped the reply channel", self.collection);
            StoreError::new(
                &format!("Writer of {} dropped the reply channel", self.collection),
                ErrorKind::InternalError,
            )
        })?
    }
}

/// Enqueues compactions without waiting for them.
#[derive(Clone)]
pub(crate) struct CompactionTrigger {
    collection: String,
    request_tx: SyncSender<WriteCommand>,
}

impl CompactionTrigger {
    pub(crate) fn fire(&self) {
        match self.request_tx.try_send(WriteCommand::Compact { reply: None }) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::debug!("Writer queue of {} is full, skipping scheduled compaction", self.collection)
            }
            Err(TrySendError::Disconnected(_)) => {}
        }
    }
}

/// The state owned by a writer thread.
pub(crate) struct CollectionWriter {
    collection: String,
    log: Box<dyn CollectionLog>,
    state: Arc<RwLock<CollectionState>>,
    indexer: UniqueIndexer,
    compaction_threshold: usize,
}

impl CollectionWriter {
    pub(crate) fn new(
        collection: &str,
        log: Box<dyn CollectionLog>,
        state: Arc<RwLock<CollectionState>>,
        indexer: UniqueIndexer,
        compaction_threshold: usize,
    ) -> Self {
        CollectionWriter {
            collection: collection.to_string(),
            log,
            state,
            indexer,
            compaction_threshold,
        }
    }

    fn run(mut self, request_rx: Receiver<WriteCommand>) {
        log::debug!("Writer of {} started", self.collection);
        while let Ok(command) = request_rx.recv() {
            match command {
                WriteCommand::Insert { documents, reply } => {
                    let _ = reply.send(self.insert(documents));
                }
                WriteCommand::Update {
                    filter,
                    patch,
                    multi,
                    reply,
                } => {
                    let _ = reply.send(self.update(&filter, &patch, multi));
                }
                WriteCommand::Remove {
                    filter,
                    multi,
                    reply,
                } => {
                    let _ = reply.send(self.remove(&filter, multi));
                }
                WriteCommand::Compact { reply } => {
                    let result = self.compact();
                    match reply {
                        Some(reply) => {
                            let _ = reply.send(result);
                        }
                        None => {
                            if let Err(err) = result {
                                log::warn!("Scheduled compaction of {} failed: {}", self.collection, err);
                            }
                        }
                    }
                }
                WriteCommand::Shutdown { compact, reply } => {
                    let result = if compact { self.compact() } else { Ok(()) };
                    let _ = reply.send(result);
                    break;
                }
            }
        }
        log::debug!("Writer of {} stopped", self.collection);
    }

    fn insert(&mut self, documents: Vec<Document>) -> StoreResult<Vec<Document>> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let prepared = {
            let state = self.state.read();
            let prepared = self.prepare_inserts(&state, documents)?;
            self.indexer.check_documents(state.documents(), &prepared)?;
            prepared
        };

        self.log.append(&LogRecord::Insert {
            docs: prepared.clone(),
        })?;
        self.state.write().apply(Mutation::Insert(prepared.clone()));
        self.after_append();
        Ok(prepared)
    }

    fn prepare_inserts(&self, state: &CollectionState, documents: Vec<Document>) -> StoreResult<Vec<Document>> {
        let now = now_utc();
        let mut batch_ids = HashSet::with_capacity(documents.len());
        let mut prepared = Vec::with_capacity(documents.len());

        for document in documents {
            document.validate_field_names()?;
            let mut document = with_id(document)?;

            let id = document.id().cloned().unwrap_or(Value::Null);
            if state.contains_id(&id) || !batch_ids.insert(id.canonical_key()) {
                log::error!("Duplicate _id {} in collection {}", id, self.collection);
                return Err(StoreError::new(
                    &format!(
                        "Unique constraint violated on {}[{}]: value {} already exists",
                        self.collection, DOC_ID, id
                    ),
                    ErrorKind::DuplicateKey,
                ));
            }

            document.put(DOC_CREATED_AT, now)?;
            document.put(DOC_UPDATED_AT, now)?;
            prepared.push(document);
        }
        Ok(prepared)
    }

    fn update(&mut self, filter: &Filter, patch: &UpdatePatch, multi: bool) -> StoreResult<usize> {
        let changes = {
            let state = self.state.read();
            let positions = state.matching_positions(filter, if multi { None } else { Some(1) });
            if positions.is_empty() {
                return Ok(0);
            }

            let mut changes = Vec::with_capacity(positions.len());
            for position in positions {
                let mut document = state.documents()[position].clone();
                patch.apply(&mut document)?;
                let stamp = monotonic_after(document.updated_at());
                document.put(DOC_UPDATED_AT, stamp)?;
                changes.push((position, document));
            }

            let post_images: Vec<Document> = changes.iter().map(|(_, doc)| doc.clone()).collect();
            self.indexer.check_documents(state.documents(), &post_images)?;
            changes
        };

        let modified = changes.len();
        self.log.append(&LogRecord::Update {
            docs: changes.iter().map(|(_, doc)| doc.clone()).collect(),
        })?;
        self.state.write().apply(Mutation::Update(changes));
        self.after_append();
        Ok(modified)
    }

    fn remove(&mut self, filter: &Filter, multi: bool) -> StoreResult<usize> {
        let (positions, ids) = {
            let state = self.state.read();
            let positions = state.matching_positions(filter, if multi { None } else { Some(1) });
            let ids: Vec<Value> = positions
                .iter()
                .filter_map(|&position| state.documents()[position].id().cloned())
                .collect();
            (positions, ids)
        };
        if positions.is_empty() {
            return Ok(0);
        }

        let removed = positions.len();
        self.log.append(&LogRecord::Remove { ids })?;
        self.state.write().apply(Mutation::Remove(positions));
        self.after_append();
        Ok(removed)
    }

    fn compact(&mut self) -> StoreResult<()> {
        let state = self.state.read();
        self.log.compact(state.documents())
    }

    fn after_append(&mut self) {
        if self.log.records_since_compaction() > self.compaction_threshold {
            log::debug!(
                "{} record(s) appended to {} since the last compaction, compacting",
                self.log.records_since_compaction(),
                self.collection
            );
            if let Err(err) = self.compact() {
                log::warn!("Compaction of {} failed, the log stays as is: {}", self.collection, err);
            }
        }
    }
}

/// Returns `document` with a valid `_id` as its first field, generating one
/// when the caller supplied none.
fn with_id(document: Document) -> StoreResult<Document> {
    match document.id() {
        Some(Value::String(id)) if !id.is_empty() => Ok(document),
        Some(Value::Int(_)) => Ok(document),
        Some(other) => {
            log::error!("Invalid _id {}: only non-empty strings and integers are allowed", other);
            Err(StoreError::new(
                &format!("Invalid _id {}: only non-empty strings and integers are allowed", other),
                ErrorKind::InvalidDocument,
            ))
        }
        None => {
            let mut with_id = Document::new();
            with_id.insert_raw(
                DOC_ID.to_string(),
                Value::String(Uuid::new_v4().simple().to_string()),
            );
            for (key, value) in document.iter() {
                with_id.insert_raw(key.clone(), value.clone());
            }
            Ok(with_id)
        }
    }
}
