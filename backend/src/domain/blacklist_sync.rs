//! Batch synchronizer replaying stored blacklist entries onto the fleet.
//!
//! Entries are read once from the record store and applied in fixed-size
//! batches. Batches run strictly in sequence with a pause between them; the
//! users inside one batch are applied concurrently. The record store is only
//! read, never written.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::domain::ports::{BlacklistRecordStore, RestrictionChange};
use crate::domain::{BlacklistEntry, Error, FleetCoordinator, FleetStatus};

/// Users applied concurrently per batch.
pub const DEFAULT_SYNC_BATCH_SIZE: usize = 3;
/// Pause inserted between consecutive batches.
pub const DEFAULT_SYNC_BATCH_DELAY: Duration = Duration::from_secs(2);
/// Error lines kept for display in a [`SyncRun`].
pub const DEFAULT_SYNC_ERROR_DISPLAY_LIMIT: usize = 5;

/// Batching and throttling settings for [`BlacklistSyncService`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistSyncConfig {
    /// Users applied concurrently per batch; zero is treated as one.
    pub batch_size: usize,
    /// Pause between consecutive batches.
    pub batch_delay: Duration,
    /// Error lines retained for display.
    pub error_display_limit: usize,
}

impl Default for BlacklistSyncConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_SYNC_BATCH_SIZE,
            batch_delay: DEFAULT_SYNC_BATCH_DELAY,
            error_display_limit: DEFAULT_SYNC_ERROR_DISPLAY_LIMIT,
        }
    }
}

/// Async sleeping abstraction so batch pauses can be observed in tests.
#[async_trait]
pub trait SyncSleeper: Send + Sync {
    /// Suspend execution for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Tokio-based sleeper implementation.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl SyncSleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Running counters emitted after each batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncProgress {
    /// One-based number of the batch just completed.
    pub batch: usize,
    /// Total number of batches in this run.
    pub batch_count: usize,
    /// Users processed so far.
    pub processed: usize,
    /// Users in this run.
    pub total_users: usize,
    /// Users restricted in every universe so far.
    pub full_success_count: usize,
    /// Users restricted in some universes so far.
    pub partial_count: usize,
    /// Users restricted nowhere so far.
    pub fail_count: usize,
}

/// Receiver for per-batch progress snapshots.
#[async_trait]
pub trait SyncProgressReporter: Send + Sync {
    /// Called once after each batch, before the next one starts.
    async fn report(&self, progress: &SyncProgress);
}

/// Reporter that discards progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSyncProgress;

#[async_trait]
impl SyncProgressReporter for NoOpSyncProgress {
    async fn report(&self, _progress: &SyncProgress) {}
}

/// Aggregate result of one synchronisation pass.
///
/// Only the first `error_display_limit` error lines are kept; `error_count`
/// stays exact.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncRun {
    /// Entries found in the record store.
    pub total_users: usize,
    /// Batches executed.
    pub batches: usize,
    /// Users restricted in every universe.
    pub full_success_count: usize,
    /// Users restricted in some universes.
    pub partial_count: usize,
    /// Users restricted nowhere, including aborted attempts.
    pub fail_count: usize,
    /// Leading `"username (userId): detail"` lines.
    pub errors: Vec<String>,
    /// Exact number of error lines produced.
    pub error_count: usize,
}

impl SyncRun {
    /// Error lines not retained for display.
    pub fn hidden_error_count(&self) -> usize {
        self.error_count.saturating_sub(self.errors.len())
    }

    fn progress(&self, batch: usize, batch_count: usize, processed: usize) -> SyncProgress {
        SyncProgress {
            batch,
            batch_count,
            processed,
            total_users: self.total_users,
            full_success_count: self.full_success_count,
            partial_count: self.partial_count,
            fail_count: self.fail_count,
        }
    }

    fn record(&mut self, entry: &BlacklistEntry, attempt: UserSyncAttempt, display_limit: usize) {
        let detail = match attempt {
            UserSyncAttempt::Full => {
                self.full_success_count += 1;
                return;
            }
            UserSyncAttempt::Partial(detail) => {
                self.partial_count += 1;
                detail
            }
            UserSyncAttempt::Failed(detail) => {
                self.fail_count += 1;
                detail
            }
        };
        self.error_count += 1;
        if self.errors.len() < display_limit {
            self.errors.push(format!(
                "{} ({}): {detail}",
                entry.username(),
                entry.player_id()
            ));
        }
    }
}

enum UserSyncAttempt {
    Full,
    Partial(String),
    Failed(String),
}

/// Replays every stored blacklist entry onto the restriction fleet.
pub struct BlacklistSyncService {
    store: Arc<dyn BlacklistRecordStore>,
    fleet: FleetCoordinator,
    sleeper: Arc<dyn SyncSleeper>,
    config: BlacklistSyncConfig,
}

impl BlacklistSyncService {
    /// Build a synchronizer that sleeps on the Tokio timer.
    pub fn new(
        store: Arc<dyn BlacklistRecordStore>,
        fleet: FleetCoordinator,
        config: BlacklistSyncConfig,
    ) -> Self {
        Self::with_sleeper(store, fleet, Arc::new(TokioSleeper), config)
    }

    /// Build a synchronizer with an injected sleeper.
    pub fn with_sleeper(
        store: Arc<dyn BlacklistRecordStore>,
        fleet: FleetCoordinator,
        sleeper: Arc<dyn SyncSleeper>,
        config: BlacklistSyncConfig,
    ) -> Self {
        Self {
            store,
            fleet,
            sleeper,
            config,
        }
    }

    /// Apply the stored restriction of every entry across the fleet.
    ///
    /// Failed users are counted and reported but never retried or rolled
    /// back; running the sync again picks them up.
    ///
    /// ```rust,ignore
    /// let run = sync.sync_all(&NoOpSyncProgress).await?;
    /// println!("{} of {} fully synced", run.full_success_count, run.total_users);
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `ServiceUnavailable` when the record store cannot be listed.
    pub async fn sync_all(&self, progress: &dyn SyncProgressReporter) -> Result<SyncRun, Error> {
        let entries = self
            .store
            .list_all()
            .await
            .map_err(|error| Error::service_unavailable(error.to_string()))?;

        let mut run = SyncRun {
            total_users: entries.len(),
            ..SyncRun::default()
        };
        if entries.is_empty() {
            info!("blacklist sync skipped: no stored entries");
            return Ok(run);
        }

        let batch_size = self.config.batch_size.max(1);
        let batch_count = entries.len().div_ceil(batch_size);
        info!(
            users = entries.len(),
            batch_size,
            batch_count,
            universes = self.fleet.targets().len(),
            "blacklist sync started"
        );

        let mut processed = 0;
        for (index, batch) in entries.chunks(batch_size).enumerate() {
            if index > 0 {
                self.sleeper.sleep(self.config.batch_delay).await;
            }

            for (entry, attempt) in batch.iter().zip(self.run_batch(batch).await) {
                run.record(entry, attempt, self.config.error_display_limit);
            }
            processed += batch.len();
            run.batches += 1;

            let snapshot = run.progress(index + 1, batch_count, processed);
            info!(
                batch = snapshot.batch,
                batch_count,
                processed,
                full = snapshot.full_success_count,
                partial = snapshot.partial_count,
                failed = snapshot.fail_count,
                "blacklist sync batch finished"
            );
            progress.report(&snapshot).await;
        }

        info!(
            users = run.total_users,
            full = run.full_success_count,
            partial = run.partial_count,
            failed = run.fail_count,
            "blacklist sync finished"
        );
        Ok(run)
    }

    async fn run_batch(&self, batch: &[BlacklistEntry]) -> Vec<UserSyncAttempt> {
        let handles = batch
            .iter()
            .map(|entry| {
                let fleet = self.fleet.clone();
                let player_id = entry.player_id().clone();
                let change = RestrictionChange::Apply(entry.restriction_reasons());
                tokio::spawn(async move { fleet.apply_across_fleet(&player_id, &change).await })
            })
            .collect::<Vec<_>>();

        let mut attempts = Vec::with_capacity(handles.len());
        for (entry, handle) in batch.iter().zip(handles) {
            let attempt = match handle.await {
                Ok(outcome) => match outcome.status() {
                    FleetStatus::Full => UserSyncAttempt::Full,
                    FleetStatus::Partial => UserSyncAttempt::Partial(outcome.failure_summary()),
                    FleetStatus::None => UserSyncAttempt::Failed(outcome.failure_summary()),
                },
                Err(join_error) => {
                    warn!(player_id = %entry.player_id(), %join_error, "blacklist sync attempt aborted");
                    UserSyncAttempt::Failed(format!("sync attempt aborted: {join_error}"))
                }
            };
            attempts.push(attempt);
        }
        attempts
    }
}
