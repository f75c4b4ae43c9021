//! Blacklist manager: keeps the record store and the restriction fleet in
//! step for add and remove requests.
//!
//! The two systems are not transactional with respect to each other. Once the
//! precondition check passes, the store write and the fleet sweep are both
//! attempted, concurrently and independently, and the combined result reports
//! what each side did.

use std::sync::Arc;

use mockable::Clock;
use tracing::{info, warn};

use super::keyed_lock::KeyedLocks;
use crate::domain::ports::{BlacklistRecordStore, BlacklistStoreError, RestrictionChange};
use crate::domain::{BlacklistEntry, Error, FleetCoordinator, FleetOutcome, FleetStatus, PlayerId};

/// Largest page returned by [`BlacklistService::list_entries`].
pub const MAX_PAGE_SIZE: usize = 50;

/// Input for [`BlacklistService::add_to_blacklist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddToBlacklistRequest {
    /// Player to restrict.
    pub player_id: PlayerId,
    /// Best-effort display name; blank becomes "Unknown".
    pub username: String,
    /// Reason shown to the player.
    pub public_reason: Option<String>,
    /// Moderator-only note.
    pub hidden_reason: Option<String>,
}

/// Presentation state for a completed add or remove.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeClassification {
    /// Store succeeded and every universe accepted the change.
    FullSuccess,
    /// Store succeeded but at least one universe did not accept the change.
    PartialRemoteSide,
    /// Every universe accepted the change but the store write failed.
    PartialLocalSide,
    /// Store failed and at least one universe did not accept the change.
    TotalFailure,
    /// Fleet integration is not configured and the store write succeeded.
    LocalOnlySuccess,
    /// Fleet integration is not configured and the store write failed.
    LocalOnlyFailure,
}

impl ChangeClassification {
    /// Whether the caller should present the change as fully done.
    pub fn is_success(self) -> bool {
        matches!(self, Self::FullSuccess | Self::LocalOnlySuccess)
    }
}

/// Outcome of one store mutation and, when configured, one fleet sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DualSystemResult {
    store: Result<(), BlacklistStoreError>,
    fleet: Option<FleetOutcome>,
}

impl DualSystemResult {
    /// Compose a result; `fleet` is `None` when fleet integration is off.
    pub fn new(store: Result<(), BlacklistStoreError>, fleet: Option<FleetOutcome>) -> Self {
        Self { store, fleet }
    }

    /// Whether the record store mutation succeeded.
    pub fn store_succeeded(&self) -> bool {
        self.store.is_ok()
    }

    /// Record store failure, if any.
    pub fn store_error(&self) -> Option<&BlacklistStoreError> {
        self.store.as_ref().err()
    }

    /// Fleet outcome, absent when fleet integration is not configured.
    pub fn fleet(&self) -> Option<&FleetOutcome> {
        self.fleet.as_ref()
    }

    /// Classify the combined result.
    ///
    /// # Examples
    /// ```
    /// use moderation_bot::domain::{ChangeClassification, DualSystemResult};
    ///
    /// let local_only = DualSystemResult::new(Ok(()), None);
    /// assert_eq!(local_only.classification(), ChangeClassification::LocalOnlySuccess);
    /// ```
    pub fn classification(&self) -> ChangeClassification {
        let Some(fleet) = &self.fleet else {
            return if self.store_succeeded() {
                ChangeClassification::LocalOnlySuccess
            } else {
                ChangeClassification::LocalOnlyFailure
            };
        };
        match (self.store_succeeded(), fleet.status() == FleetStatus::Full) {
            (true, true) => ChangeClassification::FullSuccess,
            (true, false) => ChangeClassification::PartialRemoteSide,
            (false, true) => ChangeClassification::PartialLocalSide,
            (false, false) => ChangeClassification::TotalFailure,
        }
    }
}

/// Result of an add or remove request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlacklistChange {
    /// Preconditions passed and both systems were attempted. `entry` is the
    /// created entry for adds and the removed entry for removes.
    Applied {
        entry: BlacklistEntry,
        result: DualSystemResult,
    },
    /// Add refused: an entry already exists. No writes occurred.
    AlreadyBlacklisted(BlacklistEntry),
    /// Remove refused: no entry exists. No writes occurred.
    NotBlacklisted,
    /// The existence check could not be completed. No writes occurred.
    LookupFailed(BlacklistStoreError),
}

/// One page of stored entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistPage {
    /// Entries on this page ordered by player identifier.
    pub entries: Vec<BlacklistEntry>,
    /// Total number of stored entries.
    pub total: usize,
    /// Offset to request for the following page, if any.
    pub next_offset: Option<usize>,
}

/// Orchestrates blacklist changes across the record store and the fleet.
pub struct BlacklistService {
    store: Arc<dyn BlacklistRecordStore>,
    fleet: Option<FleetCoordinator>,
    clock: Arc<dyn Clock>,
    key_locks: KeyedLocks,
}

impl BlacklistService {
    /// Build a manager. Pass `None` for `fleet` when restriction API
    /// credentials or universe targets are not configured.
    pub fn new(
        store: Arc<dyn BlacklistRecordStore>,
        fleet: Option<FleetCoordinator>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            fleet,
            clock,
            key_locks: KeyedLocks::default(),
        }
    }

    /// Whether changes are mirrored to the restriction fleet.
    pub fn fleet_enabled(&self) -> bool {
        self.fleet.is_some()
    }

    /// Blacklist a player in the store and across the fleet.
    ///
    /// ```rust,ignore
    /// let change = service.add_to_blacklist(request).await;
    /// if let BlacklistChange::Applied { result, .. } = change {
    ///     println!("{:?}", result.classification());
    /// }
    /// ```
    pub async fn add_to_blacklist(&self, request: AddToBlacklistRequest) -> BlacklistChange {
        let _key = self.key_locks.lock(&request.player_id).await;

        match self.store.get(&request.player_id).await {
            Ok(Some(existing)) => return BlacklistChange::AlreadyBlacklisted(existing),
            Ok(None) => {}
            Err(error) => {
                warn!(player_id = %request.player_id, %error, "blacklist lookup failed before add");
                return BlacklistChange::LookupFailed(error);
            }
        }

        let entry = BlacklistEntry::new(
            request.player_id,
            request.username,
            request.public_reason,
            request.hidden_reason,
            self.clock.utc(),
        );
        let change = RestrictionChange::Apply(entry.restriction_reasons());
        let (store, fleet) = tokio::join!(
            self.store.put(&entry),
            self.sweep_fleet(entry.player_id(), &change)
        );
        let result = DualSystemResult::new(store, fleet);
        log_change("add", &entry, &result);
        BlacklistChange::Applied { entry, result }
    }

    /// Remove a player from the store and lift the fleet restriction.
    pub async fn remove_from_blacklist(&self, player_id: &PlayerId) -> BlacklistChange {
        let _key = self.key_locks.lock(player_id).await;

        let entry = match self.store.get(player_id).await {
            Ok(Some(existing)) => existing,
            Ok(None) => return BlacklistChange::NotBlacklisted,
            Err(error) => {
                warn!(player_id = %player_id, %error, "blacklist lookup failed before remove");
                return BlacklistChange::LookupFailed(error);
            }
        };

        let (store, fleet) = tokio::join!(
            self.store.delete(player_id),
            self.sweep_fleet(player_id, &RestrictionChange::Clear)
        );
        let result = DualSystemResult::new(store, fleet);
        log_change("remove", &entry, &result);
        BlacklistChange::Applied { entry, result }
    }

    /// Look up the stored entry for `player_id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error`] with `ServiceUnavailable` when the store cannot be
    /// read.
    pub async fn find_entry(&self, player_id: &PlayerId) -> Result<Option<BlacklistEntry>, Error> {
        self.store.get(player_id).await.map_err(map_store_error)
    }

    /// Page through stored entries ordered by player identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` when `limit` is zero or above
    /// [`MAX_PAGE_SIZE`], and `ServiceUnavailable` when the store cannot be
    /// read.
    pub async fn list_entries(&self, offset: usize, limit: usize) -> Result<BlacklistPage, Error> {
        if limit == 0 || limit > MAX_PAGE_SIZE {
            return Err(Error::invalid_request(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let mut all = self.store.list_all().await.map_err(map_store_error)?;
        all.sort_by(|a, b| a.player_id().cmp(b.player_id()));
        let total = all.len();
        let entries = all.into_iter().skip(offset).take(limit).collect::<Vec<_>>();
        let end = offset.saturating_add(entries.len());
        let next_offset = (end < total).then_some(end);
        Ok(BlacklistPage {
            entries,
            total,
            next_offset,
        })
    }

    async fn sweep_fleet(
        &self,
        player_id: &PlayerId,
        change: &RestrictionChange,
    ) -> Option<FleetOutcome> {
        match &self.fleet {
            Some(fleet) => Some(fleet.apply_across_fleet(player_id, change).await),
            None => None,
        }
    }
}

fn log_change(action: &str, entry: &BlacklistEntry, result: &DualSystemResult) {
    let classification = result.classification();
    let (succeeded, total) = result
        .fleet()
        .map_or((0, 0), |fleet| (fleet.success_count(), fleet.total_count()));
    if classification.is_success() {
        info!(
            action,
            player_id = %entry.player_id(),
            universes_succeeded = succeeded,
            universes_total = total,
            ?classification,
            "blacklist change applied"
        );
    } else {
        warn!(
            action,
            player_id = %entry.player_id(),
            store_error = ?result.store_error(),
            universes_succeeded = succeeded,
            universes_total = total,
            ?classification,
            "blacklist change incomplete"
        );
    }
}

fn map_store_error(error: BlacklistStoreError) -> Error {
    Error::service_unavailable(error.to_string())
}
