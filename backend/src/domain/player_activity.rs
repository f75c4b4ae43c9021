//! Read-only queries over recorded player activity.
//!
//! Logins are recorded oldest first by the game server; "most recent" always
//! means the last recorded login.

use std::sync::Arc;

use tracing::debug;

use crate::domain::ports::{
    LoginRecord, PlayerActivityRecord, PlayerActivityRepository, PlayerActivityRepositoryError,
};
use crate::domain::{Error, PlayerId, UNKNOWN_USERNAME};

/// Players listed per search before the remainder is summarised as a count.
pub const PLAYER_LIST_DISPLAY_LIMIT: usize = 20;
/// Logins returned by [`PlayerActivityService::login_history`] by default.
pub const DEFAULT_LOGIN_HISTORY_COUNT: usize = 10;
/// Largest accepted login history request.
pub const MAX_LOGIN_HISTORY_COUNT: usize = 50;

const UNKNOWN_COUNTRY: &str = "Unknown";

/// Overview of one player's recorded activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSummary {
    pub player_id: PlayerId,
    /// Recorded username or "Unknown".
    pub username: String,
    pub total_logins: usize,
    pub timezones: Vec<String>,
    /// Country of the most recent login or "Unknown".
    pub recent_country: String,
}

/// Activity values labelled with the player's display name.
///
/// The display name is the recorded username, falling back to the player id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labelled<T> {
    pub display_name: String,
    pub value: T,
}

/// One player matched by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerMatch {
    pub player_id: PlayerId,
    pub display_name: String,
}

/// Search results truncated to [`PLAYER_LIST_DISPLAY_LIMIT`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerMatches {
    /// Leading matches in player id order.
    pub players: Vec<PlayerMatch>,
    /// Exact number of matches.
    pub total: usize,
}

impl PlayerMatches {
    fn truncated(all: Vec<PlayerMatch>) -> Self {
        let total = all.len();
        let players = all.into_iter().take(PLAYER_LIST_DISPLAY_LIMIT).collect();
        Self { players, total }
    }

    /// Matches left out of `players`.
    pub fn overflow(&self) -> usize {
        self.total.saturating_sub(self.players.len())
    }
}

/// Player activity lookups used by the moderation command layer.
#[derive(Clone)]
pub struct PlayerActivityService {
    repository: Arc<dyn PlayerActivityRepository>,
}

impl PlayerActivityService {
    pub fn new(repository: Arc<dyn PlayerActivityRepository>) -> Self {
        Self { repository }
    }

    /// Summarise a player's recorded activity.
    ///
    /// # Errors
    ///
    /// `NotFound` when no record exists, `ServiceUnavailable` when the
    /// repository fails.
    pub async fn user_info(&self, player_id: &PlayerId) -> Result<PlayerSummary, Error> {
        let record = self.require_player(player_id).await?;
        let recent_country = record
            .logins
            .last()
            .map(|login| login.country_code.as_str())
            .filter(|code| !code.is_empty())
            .unwrap_or(UNKNOWN_COUNTRY)
            .to_owned();
        Ok(PlayerSummary {
            username: record
                .username
                .clone()
                .unwrap_or_else(|| UNKNOWN_USERNAME.to_owned()),
            total_logins: record.logins.len(),
            timezones: record.timezones,
            recent_country,
            player_id: record.player_id,
        })
    }

    /// Most recent login.
    ///
    /// # Errors
    ///
    /// `NotFound` when the player or their logins are missing.
    pub async fn last_login(&self, player_id: &PlayerId) -> Result<Labelled<LoginRecord>, Error> {
        let mut record = self.require_player(player_id).await?;
        let display_name = display_name(&record);
        let login = record.logins.pop().ok_or_else(|| no_login_data(player_id))?;
        Ok(Labelled {
            display_name,
            value: login,
        })
    }

    /// Every recorded timezone in recorded order.
    ///
    /// # Errors
    ///
    /// `NotFound` when the player or their timezones are missing.
    pub async fn timezone_history(
        &self,
        player_id: &PlayerId,
    ) -> Result<Labelled<Vec<String>>, Error> {
        let record = self.require_player(player_id).await?;
        if record.timezones.is_empty() {
            return Err(Error::not_found(format!(
                "no timezone data found for user ID: {player_id}"
            )));
        }
        Ok(Labelled {
            display_name: display_name(&record),
            value: record.timezones,
        })
    }

    /// Up to `count` most recent logins, newest first.
    ///
    /// `count` defaults to [`DEFAULT_LOGIN_HISTORY_COUNT`].
    ///
    /// # Errors
    ///
    /// `InvalidRequest` when `count` is outside `1..=50`; `NotFound` when the
    /// player or their logins are missing.
    pub async fn login_history(
        &self,
        player_id: &PlayerId,
        count: Option<usize>,
    ) -> Result<Labelled<Vec<LoginRecord>>, Error> {
        let count = count.unwrap_or(DEFAULT_LOGIN_HISTORY_COUNT);
        if !(1..=MAX_LOGIN_HISTORY_COUNT).contains(&count) {
            return Err(Error::invalid_request(format!(
                "login count must be between 1 and {MAX_LOGIN_HISTORY_COUNT}"
            )));
        }
        let record = self.require_player(player_id).await?;
        if record.logins.is_empty() {
            return Err(no_login_data(player_id));
        }
        let display_name = display_name(&record);
        let logins = record.logins.into_iter().rev().take(count).collect();
        Ok(Labelled {
            display_name,
            value: logins,
        })
    }

    /// Number of recorded logins; zero when none are recorded.
    ///
    /// # Errors
    ///
    /// `NotFound` when no record exists.
    pub async fn login_count(&self, player_id: &PlayerId) -> Result<Labelled<usize>, Error> {
        let record = self.require_player(player_id).await?;
        Ok(Labelled {
            display_name: display_name(&record),
            value: record.logins.len(),
        })
    }

    /// Players with at least one login from `country_code`, compared upper
    /// case.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a blank code, `ServiceUnavailable` when the
    /// repository fails.
    pub async fn players_from_country(&self, country_code: &str) -> Result<PlayerMatches, Error> {
        let code = country_code.trim().to_uppercase();
        if code.is_empty() {
            return Err(Error::invalid_request("country code must not be empty"));
        }
        self.search(|record| record.logins.iter().any(|login| login.country_code == code))
            .await
    }

    /// Players with a recorded timezone containing `fragment`, ignoring case.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for a blank fragment, `ServiceUnavailable` when the
    /// repository fails.
    pub async fn players_from_timezone(&self, fragment: &str) -> Result<PlayerMatches, Error> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Err(Error::invalid_request("timezone must not be empty"));
        }
        self.search(|record| {
            record
                .timezones
                .iter()
                .any(|timezone| timezone.to_lowercase().contains(&needle))
        })
        .await
    }

    async fn search(
        &self,
        predicate: impl Fn(&PlayerActivityRecord) -> bool,
    ) -> Result<PlayerMatches, Error> {
        let players = self
            .repository
            .list_players()
            .await
            .map_err(map_repository_error)?;
        let scanned = players.len();
        let matches = players
            .into_iter()
            .filter(|record| predicate(record))
            .map(|record| PlayerMatch {
                display_name: display_name(&record),
                player_id: record.player_id,
            })
            .collect::<Vec<_>>();
        debug!(scanned, matched = matches.len(), "player search finished");
        Ok(PlayerMatches::truncated(matches))
    }

    async fn require_player(&self, player_id: &PlayerId) -> Result<PlayerActivityRecord, Error> {
        self.repository
            .find_player(player_id)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("no data found for user ID: {player_id}")))
    }
}

fn display_name(record: &PlayerActivityRecord) -> String {
    record
        .username
        .clone()
        .unwrap_or_else(|| record.player_id.to_string())
}

fn no_login_data(player_id: &PlayerId) -> Error {
    Error::not_found(format!("no login data found for user ID: {player_id}"))
}

fn map_repository_error(error: PlayerActivityRepositoryError) -> Error {
    Error::service_unavailable(error.to_string())
}
