//! Player activity reader over the realtime database `Players` tree.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::warn;

use super::client::{map_realtime_db_error, RealtimeDbClient, RealtimeDbError};
use super::dto::PlayerRecordDto;
use crate::domain::ports::{
    PlayerActivityRecord, PlayerActivityRepository, PlayerActivityRepositoryError,
};
use crate::domain::PlayerId;

const PLAYERS_TREE: &str = "Players";

/// Realtime-database implementation of [`PlayerActivityRepository`].
pub struct RealtimeDbPlayerActivityRepository {
    db: Arc<RealtimeDbClient>,
}

impl RealtimeDbPlayerActivityRepository {
    pub fn new(db: Arc<RealtimeDbClient>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PlayerActivityRepository for RealtimeDbPlayerActivityRepository {
    async fn find_player(
        &self,
        player_id: &PlayerId,
    ) -> Result<Option<PlayerActivityRecord>, PlayerActivityRepositoryError> {
        let record = self
            .db
            .get::<PlayerRecordDto>(&[PLAYERS_TREE, player_id.as_ref()])
            .await
            .map_err(map_repository_error)?;
        Ok(record.map(|dto| dto.into_record(player_id.clone())))
    }

    async fn list_players(&self) -> Result<Vec<PlayerActivityRecord>, PlayerActivityRepositoryError> {
        let tree = self
            .db
            .get::<BTreeMap<String, Value>>(&[PLAYERS_TREE])
            .await
            .map_err(map_repository_error)?
            .unwrap_or_default();
        Ok(decode_players(tree))
    }
}

fn decode_players(tree: BTreeMap<String, Value>) -> Vec<PlayerActivityRecord> {
    let mut players = tree
        .into_iter()
        .filter_map(|(key, value)| {
            let player_id = PlayerId::new(&key)
                .inspect_err(|error| warn!(key = %key, %error, "skipping player with invalid key"))
                .ok()?;
            serde_json::from_value::<PlayerRecordDto>(value)
                .inspect_err(|error| {
                    warn!(player_id = %player_id, %error, "skipping undecodable player record");
                })
                .ok()
                .map(|dto| dto.into_record(player_id))
        })
        .collect::<Vec<_>>();
    players.sort_by(|a, b| a.player_id.cmp(&b.player_id));
    players
}

fn map_repository_error(error: RealtimeDbError) -> PlayerActivityRepositoryError {
    map_realtime_db_error(
        error,
        PlayerActivityRepositoryError::connection,
        PlayerActivityRepositoryError::query,
        PlayerActivityRepositoryError::decode,
    )
}
