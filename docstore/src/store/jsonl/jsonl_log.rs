use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::collection::Document;
use crate::common::util::{unix_millis, RetryPolicy};
use crate::common::{COMPACT_TEMP_SUFFIX, CORRUPT_FILE_MARKER, LOG_FILE_EXTENSION};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::store::{
    CollectionLoadReport, CollectionLog, LoadStatus, LoadedCollection, LogRecord, Replay,
};

/// Append-only JSON Lines log of one collection: `<dir>/<collection>.jsonl`.
pub(crate) struct JsonLinesLog {
    collection: String,
    dir: PathBuf,
    path: PathBuf,
    file: Option<File>,
    len: u64,
    records: usize,
    retry: RetryPolicy,
    fsync: bool,
}

impl JsonLinesLog {
    pub(crate) fn new(dir: &Path, collection: &str, retry: RetryPolicy, fsync: bool) -> Self {
        JsonLinesLog {
            collection: collection.to_string(),
            dir: dir.to_path_buf(),
            path: dir.join(format!("{}.{}", collection, LOG_FILE_EXTENSION)),
            file: None,
            len: 0,
            records: 0,
            retry,
            fsync,
        }
    }

    pub(crate) fn path(&self) -> &Path {
        &self.path
    }

    fn open_for_append(&mut self) -> StoreResult<()> {
        let path = self.path.clone();
        let file = self.retry.run(&format!("open {}", path.display()), || {
            OpenOptions::new().create(true).append(true).open(&path)
        })?;
        self.len = file.metadata()?.len();
        self.file = Some(file);
        Ok(())
    }

    fn read_existing(&self) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path.clone();
        self.retry.run(&format!("read {}", path.display()), || match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        })
    }

    fn truncate_to(&self, len: u64) -> StoreResult<()> {
        let path = self.path.clone();
        let fsync = self.fsync;
        self.retry.run(&format!("truncate {}", path.display()), || {
            let file = OpenOptions::new().write(true).open(&path)?;
            file.set_len(len)?;
            if fsync {
                file.sync_all()?;
            }
            Ok(())
        })
    }

    fn quarantine(&self) -> StoreResult<PathBuf> {
        let target = self.dir.join(format!(
            "{}.{}.{}-{}",
            self.collection,
            LOG_FILE_EXTENSION,
            CORRUPT_FILE_MARKER,
            unix_millis()
        ));
        let (from, dir) = (self.path.clone(), self.dir.clone());
        self.retry.run(&format!("quarantine {}", from.display()), || {
            fs::rename(&from, &target)?;
            sync_dir(&dir)
        })?;
        Ok(target)
    }

    fn report(&self, status: LoadStatus, documents: usize) -> CollectionLoadReport {
        CollectionLoadReport {
            collection: self.collection.clone(),
            status,
            documents,
            records: self.records,
        }
    }
}

impl CollectionLog for JsonLinesLog {
    fn load(&mut self) -> StoreResult<LoadedCollection> {
        let bytes = match self.read_existing()? {
            Some(bytes) => bytes,
            None => {
                self.open_for_append()?;
                return Ok(LoadedCollection {
                    documents: Vec::new(),
                    report: self.report(LoadStatus::Empty, 0),
                });
            }
        };

        match parse_log(&bytes) {
            Ok(parsed) => {
                let status = if parsed.torn_bytes > 0 {
                    log::warn!(
                        "Dropping torn final record of {} ({} byte(s)) and truncating to {} byte(s)",
                        self.path.display(),
                        parsed.torn_bytes,
                        parsed.valid_len
                    );
                    self.truncate_to(parsed.valid_len)?;
                    LoadStatus::Recovered {
                        dropped_bytes: parsed.torn_bytes,
                    }
                } else if parsed.records == 0 {
                    LoadStatus::Empty
                } else {
                    LoadStatus::Loaded
                };

                self.open_for_append()?;
                self.records = parsed.records;
                let documents = parsed.documents;
                log::debug!(
                    "Loaded {} document(s) of {} from {} record(s)",
                    documents.len(),
                    self.collection,
                    self.records
                );
                Ok(LoadedCollection {
                    report: self.report(status, documents.len()),
                    documents,
                })
            }
            Err(err) => {
                log::error!(
                    "Collection {} cannot be loaded from {}: {}",
                    self.collection,
                    self.path.display(),
                    err
                );
                let moved_to = self.quarantine()?;
                log::error!(
                    "Moved unreadable log of {} to {}; the collection starts empty",
                    self.collection,
                    moved_to.display()
                );
                self.open_for_append()?;
                self.records = 0;
                Ok(LoadedCollection {
                    documents: Vec::new(),
                    report: self.report(
                        LoadStatus::Quarantined {
                            moved_to,
                            reason: err.message().to_string(),
                        },
                        0,
                    ),
                })
            }
        }
    }

    fn append(&mut self, record: &LogRecord) -> StoreResult<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let previous_len = self.len;
        let fsync = self.fsync;
        let what = format!("{} append to {}", record.op_name(), self.path.display());
        let file = self.file.as_mut().ok_or_else(|| {
            log::error!("Log of {} is not open", self.collection);
            StoreError::new(
                &format!("Log of {} is not open", self.collection),
                ErrorKind::InternalError,
            )
        })?;

        self.retry.run(&what, || {
            let result = file
                .write_all(&line)
                .and_then(|_| if fsync { file.sync_data() } else { Ok(()) });
            if result.is_err() {
                // never leave a partial record behind for the next attempt
                let _ = file.set_len(previous_len);
            }
            result
        })?;

        self.len = previous_len + line.len() as u64;
        self.records += 1;
        Ok(())
    }

    fn compact(&mut self, documents: &[Document]) -> StoreResult<()> {
        let mut content = Vec::new();
        if !documents.is_empty() {
            let record = LogRecord::Insert {
                docs: documents.to_vec(),
            };
            content = serde_json::to_vec(&record)?;
            content.push(b'\n');
        }

        let temp = self.dir.join(format!(
            "{}.{}.{}",
            self.collection, LOG_FILE_EXTENSION, COMPACT_TEMP_SUFFIX
        ));
        let (path, dir, fsync) = (self.path.clone(), self.dir.clone(), self.fsync);

        self.file = None;
        let result = self.retry.run(&format!("compact {}", path.display()), || {
            let mut file = File::create(&temp)?;
            file.write_all(&content)?;
            if fsync {
                file.sync_all()?;
            }
            fs::rename(&temp, &path)?;
            if fsync {
                sync_dir(&dir)?;
            }
            Ok(())
        });
        // reopen even when compaction failed, the old log is still intact
        self.open_for_append()?;
        result?;

        self.records = if documents.is_empty() { 0 } else { 1 };
        log::debug!(
            "Compacted {} to {} document(s), {} byte(s)",
            self.collection,
            documents.len(),
            self.len
        );
        Ok(())
    }

    fn records_since_compaction(&self) -> usize {
        self.records
    }
}

struct ParsedLog {
    documents: Vec<Document>,
    records: usize,
    valid_len: u64,
    torn_bytes: u64,
}

/// Replays raw log bytes.
///
/// An unterminated final line is a torn append and is reported through
/// `torn_bytes`; any other unreadable line is corruption.
fn parse_log(bytes: &[u8]) -> StoreResult<ParsedLog> {
    let mut replay = Replay::new();
    let mut records = 0;
    let mut offset = 0;
    let mut line_no = 0;

    while offset < bytes.len() {
        line_no += 1;
        let rest = &bytes[offset..];
        let (line, next, terminated) = match rest.iter().position(|b| *b == b'\n') {
            Some(end) => (&rest[..end], offset + end + 1, true),
            None => (rest, bytes.len(), false),
        };

        let decoded = std::str::from_utf8(line)
            .map_err(|e| e.to_string())
            .and_then(|text| {
                if text.trim().is_empty() {
                    Ok(None)
                } else {
                    serde_json::from_str::<LogRecord>(text)
                        .map(Some)
                        .map_err(|e| e.to_string())
                }
            });

        match (decoded, terminated) {
            (Ok(None), _) => {}
            (Ok(Some(record)), true) => {
                replay.apply(record)?;
                records += 1;
            }
            // an append writes its newline last, so only an unterminated
            // tail can be the leftover of a crash
            (_, false) => {
                return Ok(ParsedLog {
                    documents: replay.into_documents(),
                    records,
                    valid_len: offset as u64,
                    torn_bytes: (bytes.len() - offset) as u64,
                });
            }
            (Err(reason), true) => {
                return Err(StoreError::new(
                    &format!("line {} is not a valid record: {}", line_no, reason),
                    ErrorKind::CollectionLoadError,
                ))
            }
        }
        offset = next;
    }

    Ok(ParsedLog {
        documents: replay.into_documents(),
        records,
        valid_len: bytes.len() as u64,
        torn_bytes: 0,
    })
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
