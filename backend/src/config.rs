//! Bot configuration loaded via OrthoConfig.
//!
//! Every field is optional at load time; accessors apply defaults and
//! validation so a partially configured bot can still run in local-only mode.

use std::fmt;
use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;
use zeroize::Zeroizing;

use crate::domain::{
    BlacklistSyncConfig, UniverseIdValidationError, UniverseTargets, DEFAULT_SYNC_BATCH_DELAY,
    DEFAULT_SYNC_BATCH_SIZE, DEFAULT_SYNC_ERROR_DISPLAY_LIMIT,
};
use crate::outbound::restriction::DEFAULT_RESTRICTION_API_BASE_URL;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// `universe_ids` contained an invalid identifier.
    #[error("invalid universe_ids: {0}")]
    UniverseIds(#[from] UniverseIdValidationError),
    /// A URL setting could not be parsed.
    #[error("invalid {field}: {message}")]
    Url {
        field: &'static str,
        message: String,
    },
}

/// Credentials and targets needed to reach the restriction fleet.
pub struct FleetSettings {
    pub api_key: Zeroizing<String>,
    pub base_url: Url,
    pub targets: UniverseTargets,
}

/// Realtime database location and credentials.
pub struct DatabaseSettings {
    pub url: Url,
    pub auth: Option<Zeroizing<String>>,
}

/// Configuration values for the moderation bot.
#[derive(Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "MODBOT")]
pub struct BotSettings {
    /// Open Cloud API key with user-restriction write access.
    #[ortho_config(skip_cli)]
    pub restriction_api_key: Option<Zeroizing<String>>,
    /// Comma-separated universe identifiers to restrict players in.
    pub universe_ids: Option<String>,
    /// Override for the restriction API host.
    pub restriction_api_base_url: Option<String>,
    /// Per-request timeout applied to outbound HTTP calls.
    pub request_timeout_secs: Option<u64>,
    /// Realtime database root URL.
    pub database_url: Option<String>,
    /// Realtime database secret or ID token.
    #[ortho_config(skip_cli)]
    pub database_auth: Option<Zeroizing<String>>,
    /// Users applied concurrently per sync batch.
    pub sync_batch_size: Option<usize>,
    /// Pause between sync batches in milliseconds.
    pub sync_batch_delay_ms: Option<u64>,
    /// Error lines kept in a sync summary.
    pub sync_error_display_limit: Option<usize>,
}

impl fmt::Debug for BotSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotSettings")
            .field("restriction_api_key", &redacted(self.restriction_api_key.as_deref()))
            .field("universe_ids", &self.universe_ids)
            .field("restriction_api_base_url", &self.restriction_api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("database_url", &self.database_url)
            .field("database_auth", &redacted(self.database_auth.as_deref()))
            .field("sync_batch_size", &self.sync_batch_size)
            .field("sync_batch_delay_ms", &self.sync_batch_delay_ms)
            .field("sync_error_display_limit", &self.sync_error_display_limit)
            .finish()
    }
}

fn redacted(secret: Option<&String>) -> Option<&'static str> {
    secret.map(|_| "<redacted>")
}

fn non_blank(value: Option<&String>) -> Option<&str> {
    value.map(|text| text.trim()).filter(|text| !text.is_empty())
}

fn parse_url(field: &'static str, raw: &str) -> Result<Url, SettingsError> {
    Url::parse(raw).map_err(|error| SettingsError::Url {
        field,
        message: error.to_string(),
    })
}

impl BotSettings {
    /// Return the outbound request timeout, falling back to ten seconds.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.request_timeout_secs
                .filter(|secs| *secs > 0)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }

    /// Parse the configured universe list; absent means no targets.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UniverseIds`] when an item is not numeric.
    pub fn universe_targets(&self) -> Result<UniverseTargets, SettingsError> {
        match self.universe_ids.as_deref() {
            Some(raw) => Ok(UniverseTargets::parse(raw)?),
            None => Ok(UniverseTargets::default()),
        }
    }

    /// Fleet settings, or `None` when the API key or every universe id is
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError`] when the universe list or base URL is invalid.
    pub fn fleet(&self) -> Result<Option<FleetSettings>, SettingsError> {
        let targets = self.universe_targets()?;
        let Some(api_key) = non_blank(self.restriction_api_key.as_deref()) else {
            return Ok(None);
        };
        if targets.is_empty() {
            return Ok(None);
        }
        let base_url = parse_url(
            "restriction_api_base_url",
            non_blank(self.restriction_api_base_url.as_ref())
                .unwrap_or(DEFAULT_RESTRICTION_API_BASE_URL),
        )?;
        Ok(Some(FleetSettings {
            api_key: Zeroizing::new(api_key.to_owned()),
            base_url,
            targets,
        }))
    }

    /// Realtime database settings, or `None` when no URL is configured.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Url`] when the URL cannot be parsed.
    pub fn database(&self) -> Result<Option<DatabaseSettings>, SettingsError> {
        let Some(raw) = non_blank(self.database_url.as_ref()) else {
            return Ok(None);
        };
        Ok(Some(DatabaseSettings {
            url: parse_url("database_url", raw)?,
            auth: non_blank(self.database_auth.as_deref())
                .map(|auth| Zeroizing::new(auth.to_owned())),
        }))
    }

    /// Return sync batching settings with defaults applied.
    pub fn sync_config(&self) -> BlacklistSyncConfig {
        BlacklistSyncConfig {
            batch_size: self
                .sync_batch_size
                .filter(|size| *size > 0)
                .unwrap_or(DEFAULT_SYNC_BATCH_SIZE),
            batch_delay: self
                .sync_batch_delay_ms
                .map_or(DEFAULT_SYNC_BATCH_DELAY, Duration::from_millis),
            error_display_limit: self
                .sync_error_display_limit
                .unwrap_or(DEFAULT_SYNC_ERROR_DISPLAY_LIMIT),
        }
    }
}
