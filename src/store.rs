//! Persistence collaborator.
//!
//! The core never talks to a database. Everything it persists goes through
//! [`GalleryStore`] as an [`ObjectRecord`], the data half of a gallery
//! object. [`MemoryStore`] is the reference implementation used by tests and
//! the CLI; it counts loads so callers can verify how often the store is
//! hit.

use crate::object::{ID_NOT_SET, ObjectRecord};
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("parent {0} does not exist")]
    MissingParent(i64),
    #[error("store lock poisoned")]
    Poisoned,
}

pub trait GalleryStore: Send + Sync {
    /// The record with `id`, or `None` when there is none.
    fn load(&self, id: i64) -> Result<Option<ObjectRecord>, StoreError>;

    /// Records whose parent is `album_id`.
    fn children(&self, album_id: i64) -> Result<Vec<ObjectRecord>, StoreError>;

    /// Insert (id unset) or update. Returns the record's id.
    fn save(&self, record: &ObjectRecord) -> Result<i64, StoreError>;

    /// Remove one record. Missing records are not an error.
    fn delete(&self, id: i64) -> Result<(), StoreError>;
}

#[derive(Debug)]
struct MemoryState {
    records: BTreeMap<i64, ObjectRecord>,
    next_id: i64,
}

/// In-memory store.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    loads: AtomicUsize,
    unavailable: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MemoryState {
                records: BTreeMap::new(),
                next_id: 1,
            }),
            loads: AtomicUsize::new(0),
            unavailable: AtomicBool::new(false),
        }
    }

    /// Number of `load` calls so far.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Make every call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Unavailable("memory store switched off".into()))
        } else {
            Ok(())
        }
    }

    fn state(&self) -> Result<std::sync::MutexGuard<'_, MemoryState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl GalleryStore for MemoryStore {
    fn load(&self, id: i64) -> Result<Option<ObjectRecord>, StoreError> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;
        Ok(self.state()?.records.get(&id).cloned())
    }

    fn children(&self, album_id: i64) -> Result<Vec<ObjectRecord>, StoreError> {
        self.check_available()?;
        Ok(self
            .state()?
            .records
            .values()
            .filter(|r| r.parent_id == album_id)
            .cloned()
            .collect())
    }

    fn save(&self, record: &ObjectRecord) -> Result<i64, StoreError> {
        self.check_available()?;
        let mut state = self.state()?;
        if record.parent_id != ID_NOT_SET && !state.records.contains_key(&record.parent_id) {
            return Err(StoreError::MissingParent(record.parent_id));
        }
        let id = if record.id == ID_NOT_SET {
            let id = state.next_id;
            state.next_id += 1;
            id
        } else {
            record.id
        };
        let mut stored = record.clone();
        stored.id = id;
        state.records.insert(id, stored);
        debug!(id, "record saved");
        Ok(id)
    }

    fn delete(&self, id: i64) -> Result<(), StoreError> {
        self.check_available()?;
        self.state()?.records.remove(&id);
        Ok(())
    }
}
