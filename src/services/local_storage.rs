//! Web storage area for LinkHub.
//!
//! A [`LocalStorage`] handle is a view of one origin's string key/value area,
//! opened from a particular tab. Cloning a handle stays in the same tab;
//! [`LocalStorage::open_tab`] opens the area from a new tab. Every change is
//! announced to the *other* tabs as a [`StorageEvent`], which they collect
//! through a [`StorageListener`].

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use rusqlite::{params, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use crate::database::Database;
use crate::types::errors::StorageError;

const EVENT_CAPACITY: usize = 64;

/// Raw key/value persistence behind a storage area.
pub trait StorageBackend: Send {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn delete(&mut self, key: &str) -> Result<(), StorageError>;
    fn keys(&self) -> Result<Vec<String>, StorageError>;
    /// Total size of all keys and values, in bytes.
    fn usage_bytes(&self) -> Result<usize, StorageError>;
}

/// Volatile backend, used by tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    items: HashMap<String, String>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageBackend for MemoryBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.items.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut keys: Vec<String> = self.items.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }

    fn usage_bytes(&self) -> Result<usize, StorageError> {
        Ok(self.items.iter().map(|(k, v)| k.len() + v.len()).sum())
    }
}

/// Backend persisting one origin's area in the `local_storage` table.
pub struct SqliteBackend {
    db: Database,
    origin: String,
}

impl SqliteBackend {
    pub fn new(db: Database, origin: &str) -> Self {
        Self {
            db,
            origin: origin.to_string(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

impl StorageBackend for SqliteBackend {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let value = self
            .db
            .connection()
            .query_row(
                "SELECT value FROM local_storage WHERE origin = ?1 AND key = ?2",
                params![self.origin, key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let now = chrono::Utc::now().timestamp_millis();
        self.db.connection().execute(
            "INSERT INTO local_storage (origin, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(origin, key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![self.origin, key, value, now],
        )?;
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<(), StorageError> {
        self.db.connection().execute(
            "DELETE FROM local_storage WHERE origin = ?1 AND key = ?2",
            params![self.origin, key],
        )?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let mut stmt = self
            .db
            .connection()
            .prepare("SELECT key FROM local_storage WHERE origin = ?1 ORDER BY key")?;
        let rows = stmt.query_map(params![self.origin], |row| row.get(0))?;

        let mut keys = Vec::new();
        for row in rows {
            keys.push(row?);
        }
        Ok(keys)
    }

    fn usage_bytes(&self) -> Result<usize, StorageError> {
        let total: i64 = self.db.connection().query_row(
            "SELECT COALESCE(SUM(LENGTH(CAST(key AS BLOB)) + LENGTH(CAST(value AS BLOB))), 0)
             FROM local_storage WHERE origin = ?1",
            params![self.origin],
            |row| row.get(0),
        )?;
        Ok(total.max(0) as usize)
    }
}

/// A change made to the area by another tab.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    /// `None` when the key was removed.
    pub new_value: Option<String>,
}

#[derive(Debug, Clone)]
struct Notice {
    source_tab: u64,
    event: StorageEvent,
}

struct Area {
    backend: Mutex<Box<dyn StorageBackend>>,
    quota: usize,
    events: broadcast::Sender<Notice>,
    next_tab: AtomicU64,
}

/// A tab's handle onto a shared storage area.
#[derive(Clone)]
pub struct LocalStorage {
    area: Arc<Area>,
    tab_id: u64,
}

impl LocalStorage {
    /// Creates a new area over `backend` and returns the first tab's handle.
    pub fn new<B: StorageBackend + 'static>(backend: B, quota: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let area = Area {
            backend: Mutex::new(Box::new(backend)),
            quota,
            events,
            next_tab: AtomicU64::new(1),
        };
        Self {
            area: Arc::new(area),
            tab_id: 0,
        }
    }

    pub fn in_memory(quota: usize) -> Self {
        Self::new(MemoryBackend::new(), quota)
    }

    /// Opens the same area from a new tab.
    pub fn open_tab(&self) -> Self {
        let tab_id = self.area.next_tab.fetch_add(1, Ordering::Relaxed);
        Self {
            area: Arc::clone(&self.area),
            tab_id,
        }
    }

    /// Starts listening for changes made by other tabs.
    ///
    /// Only changes made after this call are delivered.
    pub fn subscribe(&self) -> StorageListener {
        StorageListener {
            receiver: self.area.events.subscribe(),
            tab_id: self.tab_id,
            lagged: false,
        }
    }

    pub fn tab_id(&self) -> u64 {
        self.tab_id
    }

    pub fn quota(&self) -> usize {
        self.area.quota
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.area.backend.lock().read(key)
    }

    /// Stores `value` under `key`.
    ///
    /// Fails with [`StorageError::QuotaExceeded`] without touching the
    /// stored value when the write would exceed the area's quota.
    pub fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let old_value = {
            let mut backend = self.area.backend.lock();
            let old_value = backend.read(key)?;
            let used = backend.usage_bytes()?;
            let freed = old_value.as_ref().map(|v| key.len() + v.len()).unwrap_or(0);
            let needed = used.saturating_sub(freed) + key.len() + value.len();
            if needed > self.area.quota {
                warn!(key, needed, quota = self.area.quota, "storage quota exceeded");
                return Err(StorageError::QuotaExceeded {
                    needed,
                    quota: self.area.quota,
                });
            }
            backend.write(key, value)?;
            old_value
        };

        if old_value.as_deref() != Some(value) {
            self.announce(StorageEvent {
                key: key.to_string(),
                old_value,
                new_value: Some(value.to_string()),
            });
        }
        Ok(())
    }

    /// Removes `key`. Returns whether a value was present.
    pub fn remove_item(&self, key: &str) -> Result<bool, StorageError> {
        let old_value = {
            let mut backend = self.area.backend.lock();
            let old_value = backend.read(key)?;
            if old_value.is_some() {
                backend.delete(key)?;
            }
            old_value
        };

        match old_value {
            Some(old) => {
                self.announce(StorageEvent {
                    key: key.to_string(),
                    old_value: Some(old),
                    new_value: None,
                });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.area.backend.lock().keys()
    }

    pub fn usage_bytes(&self) -> Result<usize, StorageError> {
        self.area.backend.lock().usage_bytes()
    }

    /// Reads and decodes a JSON value. A value that fails to decode is
    /// reported as [`StorageError::Corrupted`] and left in place.
    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_item(key)? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| StorageError::Corrupted {
                    key: key.to_string(),
                    message: e.to_string(),
                }),
        }
    }

    pub fn set_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.set_item(key, &raw)
    }

    fn announce(&self, event: StorageEvent) {
        debug!(key = %event.key, tab = self.tab_id, "storage changed");
        // No listeners is not an error.
        let _ = self.area.events.send(Notice {
            source_tab: self.tab_id,
            event,
        });
    }
}

/// Receives changes made to the area by other tabs.
pub struct StorageListener {
    receiver: broadcast::Receiver<Notice>,
    tab_id: u64,
    /// Changes were dropped since the last `take_lagged`.
    lagged: bool,
}

impl StorageListener {
    /// Returns every pending change from other tabs, oldest first.
    ///
    /// When the listener fell behind, the oldest changes are lost and
    /// [`StorageListener::take_lagged`] reports it; the caller must then
    /// treat every key as changed.
    pub fn poll(&mut self) -> Vec<StorageEvent> {
        let mut events = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(notice) => {
                    if notice.source_tab != self.tab_id {
                        events.push(notice.event);
                    }
                }
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "storage listener lagged, older changes dropped");
                    self.lagged = true;
                }
                Err(broadcast::error::TryRecvError::Empty)
                | Err(broadcast::error::TryRecvError::Closed) => break,
            }
        }
        events
    }

    /// Returns whether changes were dropped, and resets the flag.
    pub fn take_lagged(&mut self) -> bool {
        std::mem::take(&mut self.lagged)
    }
}
