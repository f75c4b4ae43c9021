//! In-process adapters used for local development and tests.

mod blacklist_store;

pub use blacklist_store::InMemoryBlacklistStore;
