//! Fleet coordinator mirroring one restriction change across every universe.
//!
//! Each configured universe receives its own spawned call; the coordinator
//! waits for all of them to settle and reduces the per-endpoint results into a
//! [`FleetOutcome`]. A failing or panicking endpoint never aborts its siblings.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::ports::{RestrictionApiError, RestrictionChange, RestrictionClient};
use crate::domain::{PlayerId, UniverseId, UniverseTargets};

/// Longest failure detail rendered in summaries, in characters.
const DETAIL_PREVIEW_CHAR_LIMIT: usize = 160;

/// Failure detail captured for one endpoint, kept opaque to the coordinator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointFailure {
    /// Remote HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Remote response body, or the transport message when no response
    /// arrived. Stored verbatim.
    pub detail: String,
}

impl From<RestrictionApiError> for EndpointFailure {
    fn from(error: RestrictionApiError) -> Self {
        match error {
            RestrictionApiError::Status { status, body } => Self {
                status: Some(status),
                detail: body,
            },
            other => Self {
                status: None,
                detail: other.to_string(),
            },
        }
    }
}

impl EndpointFailure {
    /// Whitespace-compacted detail cut to 160 characters, with `...`
    /// marking a cut.
    pub fn detail_preview(&self) -> String {
        let compact = self.detail.split_whitespace().collect::<Vec<_>>().join(" ");
        let mut chars = compact.chars();
        let preview = chars.by_ref().take(DETAIL_PREVIEW_CHAR_LIMIT).collect::<String>();
        if chars.next().is_some() {
            format!("{preview}...")
        } else {
            preview
        }
    }
}

impl fmt::Display for EndpointFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "[{status}] {}", self.detail_preview()),
            None => f.write_str(&self.detail_preview()),
        }
    }
}

/// Result of one restriction call against one universe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointOutcome {
    universe_id: UniverseId,
    failure: Option<EndpointFailure>,
}

impl EndpointOutcome {
    /// Successful call against `universe_id`.
    pub fn succeeded(universe_id: UniverseId) -> Self {
        Self {
            universe_id,
            failure: None,
        }
    }

    /// Failed call against `universe_id`.
    pub fn failed(universe_id: UniverseId, failure: EndpointFailure) -> Self {
        Self {
            universe_id,
            failure: Some(failure),
        }
    }

    /// Universe the call targeted.
    pub fn universe_id(&self) -> &UniverseId {
        &self.universe_id
    }

    /// Whether the remote change was accepted.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Failure detail for unsuccessful calls.
    pub fn failure(&self) -> Option<&EndpointFailure> {
        self.failure.as_ref()
    }
}

/// Tri-state reduction over a fleet-wide change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FleetStatus {
    /// Every targeted universe accepted the change (and at least one existed).
    Full,
    /// Some, but not all, universes accepted the change.
    Partial,
    /// No universe accepted the change, including the zero-target case.
    None,
}

impl FleetStatus {
    /// Derive the status from raw counts.
    ///
    /// # Examples
    /// ```
    /// use moderation_bot::domain::FleetStatus;
    ///
    /// assert_eq!(FleetStatus::from_counts(3, 3), FleetStatus::Full);
    /// assert_eq!(FleetStatus::from_counts(2, 3), FleetStatus::Partial);
    /// assert_eq!(FleetStatus::from_counts(0, 3), FleetStatus::None);
    /// assert_eq!(FleetStatus::from_counts(0, 0), FleetStatus::None);
    /// ```
    pub fn from_counts(success_count: usize, total_count: usize) -> Self {
        if success_count == 0 {
            Self::None
        } else if success_count >= total_count {
            Self::Full
        } else {
            Self::Partial
        }
    }
}

/// Ordered per-endpoint outcomes for one logical change.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FleetOutcome {
    outcomes: Vec<EndpointOutcome>,
}

impl FleetOutcome {
    /// Wrap outcomes listed in target order.
    pub fn new(outcomes: Vec<EndpointOutcome>) -> Self {
        Self { outcomes }
    }

    /// Per-endpoint outcomes in configuration order.
    pub fn outcomes(&self) -> &[EndpointOutcome] {
        &self.outcomes
    }

    /// Number of universes that accepted the change.
    pub fn success_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| outcome.is_success())
            .count()
    }

    /// Number of universes attempted.
    pub fn total_count(&self) -> usize {
        self.outcomes.len()
    }

    /// Derived tri-state status.
    pub fn status(&self) -> FleetStatus {
        FleetStatus::from_counts(self.success_count(), self.total_count())
    }

    /// Failed endpoints in configuration order.
    pub fn failures(&self) -> impl Iterator<Item = &EndpointOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.is_success())
    }

    /// One-line description of the failed endpoints, e.g.
    /// `"2/3 universes: 222 [500] boom"`.
    pub fn failure_summary(&self) -> String {
        let failed = self
            .failures()
            .filter_map(|outcome| {
                outcome
                    .failure()
                    .map(|failure| format!("{} {failure}", outcome.universe_id()))
            })
            .collect::<Vec<_>>();
        let counts = format!("{}/{} universes", self.success_count(), self.total_count());
        if failed.is_empty() {
            counts
        } else {
            format!("{counts}: {}", failed.join("; "))
        }
    }
}

/// Fans restriction changes out across the configured universes.
#[derive(Clone)]
pub struct FleetCoordinator {
    client: Arc<dyn RestrictionClient>,
    targets: UniverseTargets,
}

impl FleetCoordinator {
    /// Build a coordinator for `targets`.
    pub fn new(client: Arc<dyn RestrictionClient>, targets: UniverseTargets) -> Self {
        Self { client, targets }
    }

    /// Configured targets.
    pub fn targets(&self) -> &UniverseTargets {
        &self.targets
    }

    /// Apply `change` for `player_id` in every universe concurrently.
    ///
    /// Waits for every call to settle; the returned outcomes follow
    /// configuration order regardless of completion order.
    ///
    /// ```rust,ignore
    /// let outcome = coordinator
    ///     .apply_across_fleet(&player_id, &RestrictionChange::Clear)
    ///     .await;
    /// assert_eq!(outcome.total_count(), coordinator.targets().len());
    /// ```
    pub async fn apply_across_fleet(
        &self,
        player_id: &PlayerId,
        change: &RestrictionChange,
    ) -> FleetOutcome {
        let handles = self
            .targets
            .iter()
            .map(|universe_id| {
                let client = Arc::clone(&self.client);
                let universe = universe_id.clone();
                let player = player_id.clone();
                let change = change.clone();
                let handle = tokio::spawn(async move {
                    client.set_restriction(&universe, &player, &change).await
                });
                (universe_id.clone(), handle)
            })
            .collect::<Vec<_>>();

        let mut outcomes = Vec::with_capacity(handles.len());
        for (universe_id, handle) in handles {
            let outcome = match handle.await {
                Ok(Ok(())) => EndpointOutcome::succeeded(universe_id),
                Ok(Err(error)) => EndpointOutcome::failed(universe_id, error.into()),
                Err(join_error) => EndpointOutcome::failed(
                    universe_id,
                    EndpointFailure {
                        status: None,
                        detail: format!("restriction call aborted: {join_error}"),
                    },
                ),
            };
            if let Some(failure) = outcome.failure() {
                warn!(
                    player_id = %player_id,
                    universe_id = %outcome.universe_id(),
                    change = change.label(),
                    status = ?failure.status,
                    detail = %failure.detail,
                    "restriction change failed"
                );
            }
            outcomes.push(outcome);
        }

        let outcome = FleetOutcome::new(outcomes);
        debug!(
            player_id = %player_id,
            change = change.label(),
            succeeded = outcome.success_count(),
            total = outcome.total_count(),
            "fleet restriction change settled"
        );
        outcome
    }
}

#[cfg(test)]
mod tests;
