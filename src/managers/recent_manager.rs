//! Recent Manager for LinkHub.
//!
//! Implements `RecentManagerTrait`: a bounded most-recent-first list of
//! opened links, unique by URL, persisted after every change.

use chrono::Utc;
use tracing::warn;

use crate::services::local_storage::LocalStorage;
use crate::types::bookmark::CardDescriptor;
use crate::types::errors::StorageError;
use crate::types::recent::RecentLink;

/// Trait defining recently-opened list operations.
pub trait RecentManagerTrait {
    fn load(&mut self);
    fn add(&mut self, link: RecentLink) -> Result<(), StorageError>;
    fn get(&self, limit: usize) -> Vec<RecentLink>;
    fn remove(&mut self, url: &str) -> Result<bool, StorageError>;
    fn clear(&mut self) -> Result<(), StorageError>;
}

pub struct RecentManager {
    entries: Vec<RecentLink>,
    storage: LocalStorage,
    storage_key: String,
    max_entries: usize,
}

impl RecentManager {
    pub fn new(storage: LocalStorage, storage_key: &str, max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            storage,
            storage_key: storage_key.to_string(),
            max_entries,
        }
    }

    /// Builds an entry for `card` stamped with the current time.
    pub fn link_for(card: &CardDescriptor) -> RecentLink {
        RecentLink {
            url: card.url.clone(),
            title: card.title.clone(),
            icon: card.icon.clone(),
            description: card.description.clone(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn storage_key(&self) -> &str {
        &self.storage_key
    }

    fn save(&self) -> Result<(), StorageError> {
        self.storage.set_json(&self.storage_key, &self.entries)
    }
}

impl RecentManagerTrait for RecentManager {
    /// Reads the stored list. Anything unreadable counts as empty.
    fn load(&mut self) {
        self.entries = match self.storage.get_json::<Vec<RecentLink>>(&self.storage_key) {
            Ok(Some(entries)) => entries,
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "discarding unreadable recent links");
                let _ = self.storage.remove_item(&self.storage_key);
                Vec::new()
            }
        };
        self.entries.truncate(self.max_entries);
    }

    /// Moves `link` to the front, dropping any older entry for the same URL
    /// and anything past the size limit.
    fn add(&mut self, link: RecentLink) -> Result<(), StorageError> {
        self.entries.retain(|entry| entry.url != link.url);
        self.entries.insert(0, link);
        self.entries.truncate(self.max_entries);
        self.save()
    }

    fn get(&self, limit: usize) -> Vec<RecentLink> {
        self.entries.iter().take(limit).cloned().collect()
    }

    fn remove(&mut self, url: &str) -> Result<bool, StorageError> {
        let before = self.entries.len();
        self.entries.retain(|entry| entry.url != url);
        let removed = self.entries.len() != before;
        self.save()?;
        Ok(removed)
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        self.save()
    }
}
