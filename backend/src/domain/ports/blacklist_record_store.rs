//! Driven port for persisting blacklist entries keyed by player.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{BlacklistEntry, PlayerId};

define_port_error! {
    /// Errors raised by blacklist record store adapters.
    pub enum BlacklistStoreError {
        /// Store could not be reached.
        Connection { message: String } =>
            "blacklist store connection failed: {message}",
        /// Read or write was rejected by the store.
        Query { message: String } =>
            "blacklist store query failed: {message}",
        /// Stored payload could not be decoded into an entry.
        Decode { message: String } =>
            "blacklist store payload invalid: {message}",
    }
}

/// Key-value persistence for blacklist entries.
///
/// Adapters address entries by [`PlayerId`] only; the domain never relies on
/// transactions spanning more than one key.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlacklistRecordStore: Send + Sync {
    /// Fetch the entry stored for `player_id`, if any.
    async fn get(&self, player_id: &PlayerId) -> Result<Option<BlacklistEntry>, BlacklistStoreError>;

    /// Fetch every stored entry ordered by player identifier.
    async fn list_all(&self) -> Result<Vec<BlacklistEntry>, BlacklistStoreError>;

    /// Create or overwrite the entry under its player identifier.
    async fn put(&self, entry: &BlacklistEntry) -> Result<(), BlacklistStoreError>;

    /// Delete the entry stored for `player_id`.
    async fn delete(&self, player_id: &PlayerId) -> Result<(), BlacklistStoreError>;
}

/// Fixture implementation for code paths that never touch the store.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureBlacklistRecordStore;

#[async_trait]
impl BlacklistRecordStore for FixtureBlacklistRecordStore {
    async fn get(
        &self,
        _player_id: &PlayerId,
    ) -> Result<Option<BlacklistEntry>, BlacklistStoreError> {
        Ok(None)
    }

    async fn list_all(&self) -> Result<Vec<BlacklistEntry>, BlacklistStoreError> {
        Ok(Vec::new())
    }

    async fn put(&self, _entry: &BlacklistEntry) -> Result<(), BlacklistStoreError> {
        Ok(())
    }

    async fn delete(&self, _player_id: &PlayerId) -> Result<(), BlacklistStoreError> {
        Ok(())
    }
}
