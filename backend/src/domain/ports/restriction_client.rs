//! Driven port for changing a player's join restriction in one universe.
//!
//! The domain owns the request shape; adapters own transport and status
//! mapping. Implementations must not retry internally.

use async_trait::async_trait;

use super::define_port_error;
use crate::domain::{PlayerId, RestrictionReasons, UniverseId};

/// Restriction state change sent to one universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RestrictionChange {
    /// Bar the player from joining, with the supplied reasons.
    Apply(RestrictionReasons),
    /// Lift any active restriction, whether or not one is known locally.
    Clear,
}

impl RestrictionChange {
    /// Short label used in logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Apply(_) => "apply",
            Self::Clear => "clear",
        }
    }
}

define_port_error! {
    /// Errors surfaced by restriction API adapters.
    pub enum RestrictionApiError {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "restriction API transport failed: {message}",
        /// Request exceeded the client timeout.
        Timeout { message: String } =>
            "restriction API timeout: {message}",
        /// Remote side answered with a non-success status.
        Status { status: u16, body: String } =>
            "restriction API returned status {status}: {body}",
    }
}

impl RestrictionApiError {
    /// Remote HTTP status, when one was received.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Port issuing one restriction state change against one universe.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RestrictionClient: Send + Sync {
    /// Apply `change` for `player_id` in `universe_id`.
    ///
    /// # Examples
    ///
    /// ```rust,ignore
    /// use moderation_bot::domain::ports::{
    ///     FixtureRestrictionClient, RestrictionChange, RestrictionClient,
    /// };
    ///
    /// let client = FixtureRestrictionClient;
    /// client
    ///     .set_restriction(&universe_id, &player_id, &RestrictionChange::Clear)
    ///     .await?;
    /// # Ok::<(), moderation_bot::domain::ports::RestrictionApiError>(())
    /// ```
    async fn set_restriction(
        &self,
        universe_id: &UniverseId,
        player_id: &PlayerId,
        change: &RestrictionChange,
    ) -> Result<(), RestrictionApiError>;
}

/// Fixture implementation accepting every change.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureRestrictionClient;

#[async_trait]
impl RestrictionClient for FixtureRestrictionClient {
    async fn set_restriction(
        &self,
        _universe_id: &UniverseId,
        _player_id: &PlayerId,
        _change: &RestrictionChange,
    ) -> Result<(), RestrictionApiError> {
        Ok(())
    }
}
