//! Favorites Store for LinkHub.
//!
//! Implements `FavoritesStoreTrait`: the ordered, URL-unique list of
//! favorites, mirrored to the web storage area under a single key.
//!
//! Mutations never persist on their own. Callers follow every mutating call
//! with [`FavoritesStoreTrait::persist`].

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::services::local_storage::LocalStorage;
use crate::types::bookmark::BookmarkRecord;
use crate::types::errors::{FavoritesError, StorageError};

/// Trait defining favorites store operations.
pub trait FavoritesStoreTrait {
    fn load(&mut self) -> LoadOutcome;
    fn is_favorite(&self, url: &str) -> bool;
    fn add(&mut self, record: BookmarkRecord) -> Result<(), FavoritesError>;
    fn remove(&mut self, url: &str) -> bool;
    fn reorder(&mut self, from_index: usize, to_index: usize) -> Result<(), FavoritesError>;
    fn clear(&mut self);
    fn get_all(&self) -> Vec<BookmarkRecord>;
    fn persist(&self) -> Result<(), FavoritesError>;
}

/// What a [`FavoritesStoreTrait::load`] call found in storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOutcome {
    pub loaded: usize,
    /// Entries discarded as invalid or as duplicate URLs.
    pub dropped: usize,
    /// The stored value was unreadable and has been removed.
    pub corrupted: bool,
    /// The cleaned list was written back.
    pub repaired: bool,
}

/// Result of cleaning a list of raw stored entries.
#[derive(Debug, Clone, Default)]
pub struct CleanedEntries {
    pub records: Vec<BookmarkRecord>,
    pub dropped: usize,
    /// Some surviving entry was trimmed or backfilled.
    pub modified: bool,
}

/// Validates, normalizes and dedupes raw entries, keeping the first
/// occurrence of each URL.
pub fn clean_entries(entries: &[Value]) -> CleanedEntries {
    let mut cleaned = CleanedEntries::default();
    let mut seen = HashSet::new();

    for entry in entries {
        match BookmarkRecord::from_stored(entry) {
            Some((record, changed)) => {
                if !seen.insert(record.url.clone()) {
                    cleaned.dropped += 1;
                    continue;
                }
                cleaned.modified |= changed;
                cleaned.records.push(record);
            }
            None => cleaned.dropped += 1,
        }
    }
    cleaned
}

/// The favorites list and its persistence.
pub struct FavoritesStore {
    favorites: Vec<BookmarkRecord>,
    storage: LocalStorage,
    storage_key: String,
}

impl FavoritesStore {
    /// Creates an empty store bound to `storage_key`. Call `load` to rehydrate.
    pub fn new(storage: LocalStorage, storage_key: &str) -> Self {
        Self {
            favorites: Vec::new(),
            storage,
            storage_key: storage_key.to_string(),
        }
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    pub fn len(&self) -> usize {
        self.favorites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.favorites.is_empty()
    }

    /// Borrowed view for read-only callers inside the crate's own components.
    pub fn as_slice(&self) -> &[BookmarkRecord] {
        &self.favorites
    }

    pub fn position(&self, url: &str) -> Option<usize> {
        self.favorites.iter().position(|fav| fav.url == url)
    }

    /// Replaces the whole list. Duplicate URLs after the first are dropped.
    pub fn replace_all(&mut self, records: Vec<BookmarkRecord>) {
        let mut seen = HashSet::new();
        self.favorites = records
            .into_iter()
            .filter(|r| r.is_valid() && seen.insert(r.url.clone()))
            .collect();
    }

    /// Puts `record` back at `index`, clamped to the end. Used to undo a removal.
    pub fn insert_at(&mut self, index: usize, record: BookmarkRecord) {
        if self.is_favorite(&record.url) {
            return;
        }
        let index = index.min(self.favorites.len());
        self.favorites.insert(index, record);
    }

    /// Appends every record whose URL is not stored yet. Returns how many were added.
    pub fn merge(&mut self, records: Vec<BookmarkRecord>) -> usize {
        let before = self.favorites.len();
        for record in records {
            // Rejections here are duplicates or invalid entries, both skipped.
            let _ = self.add(record);
        }
        self.favorites.len() - before
    }

    fn reset_to_empty(&mut self) {
        self.favorites.clear();
    }
}

impl FavoritesStoreTrait for FavoritesStore {
    /// Rehydrates from storage.
    ///
    /// A missing value gives an empty list. A value that is not JSON or not
    /// an array is removed and also gives an empty list. Invalid entries are
    /// dropped; when anything was dropped or normalized the cleaned list is
    /// written back immediately.
    fn load(&mut self) -> LoadOutcome {
        let mut outcome = LoadOutcome::default();

        let raw = match self.storage.get_item(&self.storage_key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.reset_to_empty();
                return outcome;
            }
            Err(e) => {
                error!(error = %e, "failed to read favorites");
                self.reset_to_empty();
                return outcome;
            }
        };

        let entries = match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) | Err(_) => {
                warn!(key = %self.storage_key, "stored favorites unreadable, clearing");
                if let Err(e) = self.storage.remove_item(&self.storage_key) {
                    warn!(error = %e, "failed to clear corrupted favorites");
                }
                self.reset_to_empty();
                outcome.corrupted = true;
                return outcome;
            }
        };

        let cleaned = clean_entries(&entries);
        self.favorites = cleaned.records;
        outcome.loaded = self.favorites.len();
        outcome.dropped = cleaned.dropped;

        if cleaned.dropped > 0 || cleaned.modified {
            info!(dropped = cleaned.dropped, "repairing stored favorites");
            match self.persist() {
                Ok(()) => outcome.repaired = true,
                Err(e) => warn!(error = %e, "failed to write repaired favorites"),
            }
        }

        debug!(loaded = outcome.loaded, "favorites loaded");
        outcome
    }

    fn is_favorite(&self, url: &str) -> bool {
        self.favorites.iter().any(|fav| fav.url == url)
    }

    /// Appends `record` (trimmed). Rejects invalid records and duplicate URLs.
    fn add(&mut self, record: BookmarkRecord) -> Result<(), FavoritesError> {
        let record = record.normalized();
        if !record.is_valid() {
            return Err(FavoritesError::InvalidRecord(
                "url and title are required".to_string(),
            ));
        }
        if self.is_favorite(&record.url) {
            return Err(FavoritesError::DuplicateUrl(record.url));
        }
        self.favorites.push(record);
        Ok(())
    }

    fn remove(&mut self, url: &str) -> bool {
        let before = self.favorites.len();
        self.favorites.retain(|fav| fav.url != url);
        self.favorites.len() != before
    }

    /// Moves the element at `from_index` to `to_index`, shifting the ones in between.
    fn reorder(&mut self, from_index: usize, to_index: usize) -> Result<(), FavoritesError> {
        let len = self.favorites.len();
        if from_index >= len || to_index >= len || from_index == to_index {
            return Err(FavoritesError::InvalidIndices {
                from: from_index,
                to: to_index,
                len,
            });
        }
        let moved = self.favorites.remove(from_index);
        self.favorites.insert(to_index, moved);
        Ok(())
    }

    fn clear(&mut self) {
        self.favorites.clear();
    }

    fn get_all(&self) -> Vec<BookmarkRecord> {
        self.favorites.clone()
    }

    /// Writes the list under the store's key. On failure the previously
    /// persisted value is untouched.
    fn persist(&self) -> Result<(), FavoritesError> {
        self.storage
            .set_json(&self.storage_key, &self.favorites)
            .map_err(|e| {
                if let StorageError::QuotaExceeded { .. } = e {
                    warn!("favorites not saved: storage full");
                }
                FavoritesError::from(e)
            })
    }
}
