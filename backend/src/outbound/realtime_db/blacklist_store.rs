//! Blacklist record store backed by the realtime database `Blacklist` tree.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::client::{map_realtime_db_error, RealtimeDbClient, RealtimeDbError};
use super::dto::BlacklistRecordDto;
use crate::domain::ports::{BlacklistRecordStore, BlacklistStoreError};
use crate::domain::{BlacklistEntry, PlayerId};

const BLACKLIST_TREE: &str = "Blacklist";

/// Realtime-database implementation of [`BlacklistRecordStore`].
pub struct RealtimeDbBlacklistStore {
    db: Arc<RealtimeDbClient>,
}

impl RealtimeDbBlacklistStore {
    pub fn new(db: Arc<RealtimeDbClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlacklistRecordStore for RealtimeDbBlacklistStore {
    async fn get(&self, player_id: &PlayerId) -> Result<Option<BlacklistEntry>, BlacklistStoreError> {
        let record = self
            .db
            .get::<BlacklistRecordDto>(&[BLACKLIST_TREE, player_id.as_ref()])
            .await
            .map_err(map_store_error)?;
        Ok(record.map(|dto| dto.into_entry(player_id.clone())))
    }

    async fn list_all(&self) -> Result<Vec<BlacklistEntry>, BlacklistStoreError> {
        let tree = self
            .db
            .get::<BTreeMap<String, Value>>(&[BLACKLIST_TREE])
            .await
            .map_err(map_store_error)?
            .unwrap_or_default();
        Ok(decode_tree(tree))
    }

    async fn put(&self, entry: &BlacklistEntry) -> Result<(), BlacklistStoreError> {
        self.db
            .put(
                &[BLACKLIST_TREE, entry.player_id().as_ref()],
                &BlacklistRecordDto::from(entry),
            )
            .await
            .map_err(map_store_error)
    }

    async fn delete(&self, player_id: &PlayerId) -> Result<(), BlacklistStoreError> {
        self.db
            .delete(&[BLACKLIST_TREE, player_id.as_ref()])
            .await
            .map_err(map_store_error)
    }
}

/// Decode every child keyed by a valid player id.
///
/// Object records always decode, with unreadable fields treated as absent.
/// Children with an invalid key or a non-object value are skipped.
fn decode_tree(tree: BTreeMap<String, Value>) -> Vec<BlacklistEntry> {
    let mut entries = tree
        .into_iter()
        .filter_map(|(key, value)| {
            let player_id = match PlayerId::new(&key) {
                Ok(player_id) => player_id,
                Err(error) => {
                    warn!(key = %key, %error, "skipping blacklist record with invalid key");
                    return None;
                }
            };
            match serde_json::from_value::<BlacklistRecordDto>(value) {
                Ok(dto) => Some(dto.into_entry(player_id)),
                Err(error) => {
                    warn!(player_id = %player_id, %error, "skipping undecodable blacklist record");
                    None
                }
            }
        })
        .collect::<Vec<_>>();
    entries.sort_by(|a, b| a.player_id().cmp(b.player_id()));
    entries
}

fn map_store_error(error: RealtimeDbError) -> BlacklistStoreError {
    map_realtime_db_error(
        error,
        BlacklistStoreError::connection,
        BlacklistStoreError::query,
        BlacklistStoreError::decode,
    )
}
