//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **restriction**: Open Cloud user-restrictions API over reqwest
//! - **realtime_db**: realtime JSON database REST adapters for the blacklist
//!   store and player activity
//! - **memory**: in-process blacklist store for development and tests
//!
//! Adapters are thin translators between domain types and wire
//! representations. They contain no business logic.

pub mod memory;
pub mod realtime_db;
pub mod restriction;
