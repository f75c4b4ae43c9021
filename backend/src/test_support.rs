//! Shared test doubles for blacklist and fleet tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, Utc};
use mockable::Clock;

use crate::domain::ports::{RestrictionApiError, RestrictionChange, RestrictionClient};
use crate::domain::{PlayerId, SyncProgress, SyncProgressReporter, SyncSleeper, UniverseId};

/// Clock frozen at one instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.0.with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        self.0
    }
}

/// One call observed by [`ScriptedRestrictionClient`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRestrictionCall {
    /// Targeted universe.
    pub universe_id: String,
    /// Targeted player.
    pub player_id: String,
    /// `"apply"` or `"clear"`.
    pub change: &'static str,
}

/// Restriction client that accepts every call unless scripted to fail.
///
/// Failures can be scripted per universe (every player fails there) or per
/// player and universe pair. Concurrency is tracked so tests can assert on
/// the peak number of in-flight calls.
#[derive(Debug, Default)]
pub struct ScriptedRestrictionClient {
    failing_universes: HashSet<String>,
    failing_pairs: HashSet<(String, String)>,
    panicking_players: HashSet<String>,
    latency: Duration,
    calls: Mutex<Vec<RecordedRestrictionCall>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

impl ScriptedRestrictionClient {
    /// Client accepting every call.
    pub fn accepting() -> Self {
        Self::default()
    }

    /// Fail every call to `universe_id` with a 500 status.
    #[must_use]
    pub fn failing_universe(mut self, universe_id: &str) -> Self {
        self.failing_universes.insert(universe_id.to_owned());
        self
    }

    /// Fail calls for `player_id` in `universe_id` with a 500 status.
    #[must_use]
    pub fn failing_for(mut self, player_id: &str, universe_id: &str) -> Self {
        self.failing_pairs
            .insert((player_id.to_owned(), universe_id.to_owned()));
        self
    }

    /// Panic on every call for `player_id`.
    #[must_use]
    pub fn panicking_for(mut self, player_id: &str) -> Self {
        self.panicking_players.insert(player_id.to_owned());
        self
    }

    /// Suspend each call for `latency` before answering.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Calls observed so far, in arrival order.
    pub fn calls(&self) -> Vec<RecordedRestrictionCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Peak number of calls in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RestrictionClient for ScriptedRestrictionClient {
    async fn set_restriction(
        &self,
        universe_id: &UniverseId,
        player_id: &PlayerId,
        change: &RestrictionChange,
    ) -> Result<(), RestrictionApiError> {
        let universe = universe_id.to_string();
        let player = player_id.to_string();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(RecordedRestrictionCall {
                universe_id: universe.clone(),
                player_id: player.clone(),
                change: change.label(),
            });
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        assert!(
            !self.panicking_players.contains(&player),
            "scripted restriction panic for {player}"
        );
        if self.failing_universes.contains(&universe)
            || self.failing_pairs.contains(&(player, universe))
        {
            return Err(RestrictionApiError::status(500_u16, "scripted failure"));
        }
        Ok(())
    }
}

/// Sleeper that records requested delays and returns immediately.
#[derive(Debug, Default)]
pub struct RecordingSleeper(Mutex<Vec<Duration>>);

impl RecordingSleeper {
    /// Delays requested so far.
    pub fn delays(&self) -> Vec<Duration> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl SyncSleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}

/// Progress reporter that keeps every snapshot.
#[derive(Debug, Default)]
pub struct RecordingProgress(Mutex<Vec<SyncProgress>>);

impl RecordingProgress {
    /// Snapshots received so far.
    pub fn snapshots(&self) -> Vec<SyncProgress> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

#[async_trait]
impl SyncProgressReporter for RecordingProgress {
    async fn report(&self, progress: &SyncProgress) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(progress.clone());
    }
}

/// Count calls per player from a recorded call list.
pub fn calls_per_player(calls: &[RecordedRestrictionCall]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for call in calls {
        *counts.entry(call.player_id.clone()).or_insert(0) += 1;
    }
    counts
}
