//! Domain primitives and services.
//!
//! Purpose: keep the blacklist record store and the restriction fleet in step
//! without knowing how either is reached. Adapters live under `outbound` and
//! plug in through the traits in [`ports`].
//!
//! Public surface:
//! - Error (alias to `error::Error`): failure payload with a stable code.
//! - PlayerId / UniverseId: validated numeric identifiers.
//! - BlacklistEntry: stored record of one restricted player.
//! - FleetCoordinator: fans one restriction change out to every universe.
//! - BlacklistService: add/remove/lookup across store and fleet.
//! - BlacklistSyncService: batched replay of stored entries onto the fleet.
//! - PlayerActivityService: read-only login and timezone queries.

pub mod blacklist;
pub mod blacklist_service;
pub mod blacklist_sync;
pub mod error;
pub mod fleet;
mod keyed_lock;
pub mod player;
pub mod player_activity;
pub mod ports;
pub mod universe;

pub use self::blacklist::{
    BlacklistEntry, RestrictionReasons, DEFAULT_DISPLAY_REASON, PRIVATE_REASON_PREFIX,
    UNKNOWN_USERNAME,
};
pub use self::blacklist_service::{
    AddToBlacklistRequest, BlacklistChange, BlacklistPage, BlacklistService,
    ChangeClassification, DualSystemResult, MAX_PAGE_SIZE,
};
pub use self::blacklist_sync::{
    BlacklistSyncConfig, BlacklistSyncService, NoOpSyncProgress, SyncProgress,
    SyncProgressReporter, SyncRun, SyncSleeper, TokioSleeper, DEFAULT_SYNC_BATCH_DELAY,
    DEFAULT_SYNC_BATCH_SIZE, DEFAULT_SYNC_ERROR_DISPLAY_LIMIT,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::fleet::{
    EndpointFailure, EndpointOutcome, FleetCoordinator, FleetOutcome, FleetStatus,
};
pub use self::player::{PlayerId, PlayerIdValidationError};
pub use self::player_activity::{
    Labelled, PlayerActivityService, PlayerMatch, PlayerMatches, PlayerSummary,
    DEFAULT_LOGIN_HISTORY_COUNT, MAX_LOGIN_HISTORY_COUNT, PLAYER_LIST_DISPLAY_LIMIT,
};
pub use self::universe::{UniverseId, UniverseIdValidationError, UniverseTargets};

/// Convenient domain result alias.
///
/// # Examples
/// ```
/// use moderation_bot::domain::{DomainResult, Error};
///
/// fn lookup() -> DomainResult<()> {
///     Err(Error::not_found("no data found for user ID: 1"))
/// }
/// assert!(lookup().is_err());
/// ```
pub type DomainResult<T> = Result<T, Error>;
