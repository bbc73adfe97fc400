//! Record persistence.
//!
//! The service layer talks to storage through [`RecordStore`], keyed by
//! the record's natural key.  [`JsonFileStore`] keeps every record in a
//! single pretty-printed `{"records": [...]}` document; [`MemoryStore`]
//! backs tests and embedded use.  Both serialise writers behind a mutex
//! so concurrent saves of the same key cannot interleave.

use crate::error::QaResult;
use crate::models::{QaRecord, RecordKey};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

/// Storage for monthly records.  `put` is an upsert on the natural key.
///
/// Stores must be thread-safe (`Send + Sync`) because request handlers
/// share one instance.
pub trait RecordStore: Send + Sync {
    fn get(&self, key: &RecordKey) -> QaResult<Option<QaRecord>>;
    /// Insert or replace the record with the same id.
    fn put(&self, record: QaRecord) -> QaResult<()>;
    /// Returns `false` when nothing was stored under `key`.
    fn delete(&self, key: &RecordKey) -> QaResult<bool>;
    /// All records in insertion order.
    fn list(&self) -> QaResult<Vec<QaRecord>>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    // Poisoning is ignored: every write replaces whole records.
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// In-memory store.
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<QaRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn get(&self, key: &RecordKey) -> QaResult<Option<QaRecord>> {
        let id = key.id();
        Ok(lock(&self.records).iter().find(|r| r.id == id).cloned())
    }

    fn put(&self, record: QaRecord) -> QaResult<()> {
        upsert(&mut lock(&self.records), record);
        Ok(())
    }

    fn delete(&self, key: &RecordKey) -> QaResult<bool> {
        Ok(remove(&mut lock(&self.records), &key.id()))
    }

    fn list(&self) -> QaResult<Vec<QaRecord>> {
        Ok(lock(&self.records).clone())
    }
}

fn upsert(records: &mut Vec<QaRecord>, record: QaRecord) {
    match records.iter_mut().find(|r| r.id == record.id) {
        Some(existing) => *existing = record,
        None => records.push(record),
    }
}

fn remove(records: &mut Vec<QaRecord>, id: &str) -> bool {
    let before = records.len();
    records.retain(|r| r.id != id);
    records.len() < before
}

/// On-disk document layout.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreDocument {
    #[serde(default)]
    records: Vec<QaRecord>,
}

/// Store backed by one JSON document on disk.
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open the document at `path`, creating its directory and an empty
    /// document when they do not exist yet.
    pub fn open(path: impl Into<PathBuf>) -> QaResult<Self> {
        let store = JsonFileStore {
            path: path.into(),
            write_lock: Mutex::new(()),
        };
        if !store.path.exists() {
            store.write_document(&StoreDocument::default())?;
            tracing::info!(path = %store.path.display(), "created empty record store");
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_document(&self) -> QaResult<StoreDocument> {
        if !self.path.exists() {
            return Ok(StoreDocument::default());
        }
        let data = std::fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Reads treat an unreadable document as empty so dashboards keep
    /// working; writes refuse to overwrite it.
    fn read_or_empty(&self) -> StoreDocument {
        match self.read_document() {
            Ok(doc) => doc,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to read record store");
                StoreDocument::default()
            }
        }
    }

    fn write_document(&self, doc: &StoreDocument) -> QaResult<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        let json = serde_json::to_string_pretty(doc)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl RecordStore for JsonFileStore {
    fn get(&self, key: &RecordKey) -> QaResult<Option<QaRecord>> {
        let id = key.id();
        Ok(self.read_or_empty().records.into_iter().find(|r| r.id == id))
    }

    fn put(&self, record: QaRecord) -> QaResult<()> {
        let _guard = lock(&self.write_lock);
        let mut doc = self.read_document()?;
        upsert(&mut doc.records, record);
        self.write_document(&doc)
    }

    fn delete(&self, key: &RecordKey) -> QaResult<bool> {
        let _guard = lock(&self.write_lock);
        let mut doc = self.read_document()?;
        if !remove(&mut doc.records, &key.id()) {
            return Ok(false);
        }
        self.write_document(&doc)?;
        Ok(true)
    }

    fn list(&self) -> QaResult<Vec<QaRecord>> {
        Ok(self.read_or_empty().records)
    }
}
