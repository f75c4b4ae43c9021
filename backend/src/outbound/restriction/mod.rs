//! Restriction API outbound adapters.
//!
//! This module provides a thin HTTP implementation of the
//! `RestrictionClient` port against the Open Cloud user-restrictions API.

mod dto;
mod http_client;

pub use http_client::{OpenCloudRestrictionClient, DEFAULT_RESTRICTION_API_BASE_URL};
