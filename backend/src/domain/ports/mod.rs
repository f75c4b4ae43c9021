//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod blacklist_record_store;
mod player_activity_repository;
mod restriction_client;

#[cfg(test)]
pub use blacklist_record_store::MockBlacklistRecordStore;
pub use blacklist_record_store::{
    BlacklistRecordStore, BlacklistStoreError, FixtureBlacklistRecordStore,
};
#[cfg(test)]
pub use player_activity_repository::MockPlayerActivityRepository;
pub use player_activity_repository::{
    FixturePlayerActivityRepository, LoginRecord, PlayerActivityRecord, PlayerActivityRepository,
    PlayerActivityRepositoryError,
};
#[cfg(test)]
pub use restriction_client::MockRestrictionClient;
pub use restriction_client::{
    FixtureRestrictionClient, RestrictionApiError, RestrictionChange, RestrictionClient,
};

#[cfg(test)]
mod tests;
