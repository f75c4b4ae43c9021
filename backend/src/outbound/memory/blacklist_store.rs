//! Map-backed blacklist record store.

use std::collections::BTreeMap;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{BlacklistRecordStore, BlacklistStoreError};
use crate::domain::{BlacklistEntry, PlayerId};

/// Blacklist store that keeps entries in memory for the process lifetime.
#[derive(Debug, Default)]
pub struct InMemoryBlacklistStore {
    entries: Mutex<BTreeMap<PlayerId, BlacklistEntry>>,
}

impl InMemoryBlacklistStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `entries`.
    pub fn with_entries(entries: impl IntoIterator<Item = BlacklistEntry>) -> Self {
        let map = entries
            .into_iter()
            .map(|entry| (entry.player_id().clone(), entry))
            .collect();
        Self {
            entries: Mutex::new(map),
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the store holds no entries.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<PlayerId, BlacklistEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl BlacklistRecordStore for InMemoryBlacklistStore {
    async fn get(&self, player_id: &PlayerId) -> Result<Option<BlacklistEntry>, BlacklistStoreError> {
        Ok(self.lock().get(player_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<BlacklistEntry>, BlacklistStoreError> {
        Ok(self.lock().values().cloned().collect())
    }

    async fn put(&self, entry: &BlacklistEntry) -> Result<(), BlacklistStoreError> {
        self.lock().insert(entry.player_id().clone(), entry.clone());
        Ok(())
    }

    async fn delete(&self, player_id: &PlayerId) -> Result<(), BlacklistStoreError> {
        self.lock().remove(player_id);
        Ok(())
    }
}
