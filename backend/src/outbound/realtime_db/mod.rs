//! Realtime database outbound adapters.
//!
//! One shared REST client backs both the blacklist record store and the
//! player activity reader.

mod blacklist_store;
mod client;
mod dto;
mod player_activity;

pub use blacklist_store::RealtimeDbBlacklistStore;
pub use client::{RealtimeDbClient, RealtimeDbError};
pub use player_activity::RealtimeDbPlayerActivityRepository;
