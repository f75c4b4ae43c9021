//! Driven port for reading recorded player activity.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::PlayerId;

/// One recorded login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginRecord {
    /// Timestamp text exactly as recorded by the game client.
    pub timestamp: String,
    /// Two-letter country code, upper case.
    pub country_code: String,
    /// Timezone display name.
    pub timezone: String,
}

/// Activity recorded for one player.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerActivityRecord {
    /// Player identifier (record key).
    pub player_id: PlayerId,
    /// Display name, when recorded.
    pub username: Option<String>,
    /// Logins ordered oldest first.
    pub logins: Vec<LoginRecord>,
    /// Timezones the player has logged in from, in recorded order.
    pub timezones: Vec<String>,
}

define_port_error! {
    /// Errors raised while reading player activity.
    pub enum PlayerActivityRepositoryError {
        /// Store could not be reached.
        Connection { message: String } =>
            "player activity connection failed: {message}",
        /// Read was rejected by the store.
        Query { message: String } =>
            "player activity query failed: {message}",
        /// Stored payload could not be decoded.
        Decode { message: String } =>
            "player activity payload invalid: {message}",
    }
}

/// Read-only access to player activity records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlayerActivityRepository: Send + Sync {
    /// Fetch one player's activity record.
    async fn find_player(
        &self,
        player_id: &PlayerId,
    ) -> Result<Option<PlayerActivityRecord>, PlayerActivityRepositoryError>;

    /// Fetch every player's activity record ordered by player identifier.
    async fn list_players(&self) -> Result<Vec<PlayerActivityRecord>, PlayerActivityRepositoryError>;
}

/// Fixture implementation with no recorded players.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixturePlayerActivityRepository;

#[async_trait]
impl PlayerActivityRepository for FixturePlayerActivityRepository {
    async fn find_player(
        &self,
        _player_id: &PlayerId,
    ) -> Result<Option<PlayerActivityRecord>, PlayerActivityRepositoryError> {
        Ok(None)
    }

    async fn list_players(&self) -> Result<Vec<PlayerActivityRecord>, PlayerActivityRepositoryError> {
        Ok(Vec::new())
    }
}
