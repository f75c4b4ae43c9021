//! Reqwest-backed restriction API adapter.
//!
//! This adapter owns transport details only: URL construction, the API key
//! header, timeout and HTTP status mapping. Error bodies are passed on
//! unmodified. It never retries.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::debug;
use zeroize::Zeroizing;

use super::dto::UserRestrictionPatchDto;
use crate::domain::ports::{RestrictionApiError, RestrictionChange, RestrictionClient};
use crate::domain::{PlayerId, UniverseId};

/// Public Open Cloud host.
pub const DEFAULT_RESTRICTION_API_BASE_URL: &str = "https://apis.roblox.com";

const API_KEY_HEADER: &str = "x-api-key";
const UPDATE_MASK: &str = "gameJoinRestriction";

/// Restriction client issuing `PATCH` requests against one API host.
pub struct OpenCloudRestrictionClient {
    client: Client,
    base_url: Url,
    api_key: Zeroizing<String>,
}

impl OpenCloudRestrictionClient {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    /// ```rust,ignore
    /// let client = OpenCloudRestrictionClient::new(base_url, api_key, timeout)?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        api_key: Zeroizing<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            api_key,
        })
    }
}

#[async_trait]
impl RestrictionClient for OpenCloudRestrictionClient {
    async fn set_restriction(
        &self,
        universe_id: &UniverseId,
        player_id: &PlayerId,
        change: &RestrictionChange,
    ) -> Result<(), RestrictionApiError> {
        let url = restriction_url(&self.base_url, universe_id, player_id)?;
        let response = self
            .client
            .patch(url)
            .header(API_KEY_HEADER, self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&UserRestrictionPatchDto::from(change))
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status.is_success() {
            debug!(
                universe_id = %universe_id,
                player_id = %player_id,
                change = change.label(),
                status = status.as_u16(),
                "restriction change accepted"
            );
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }
}

fn restriction_url(
    base_url: &Url,
    universe_id: &UniverseId,
    player_id: &PlayerId,
) -> Result<Url, RestrictionApiError> {
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|()| {
            RestrictionApiError::transport(format!("base URL {base_url} cannot carry a path"))
        })?
        .pop_if_empty()
        .extend([
            "cloud",
            "v2",
            "universes",
            universe_id.as_ref(),
            "user-restrictions",
            player_id.as_ref(),
        ]);
    url.query_pairs_mut()
        .clear()
        .append_pair("updateMask", UPDATE_MASK);
    Ok(url)
}

fn map_transport_error(error: reqwest::Error) -> RestrictionApiError {
    if error.is_timeout() {
        RestrictionApiError::timeout(error.to_string())
    } else {
        RestrictionApiError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> RestrictionApiError {
    let body = String::from_utf8_lossy(body);
    let body = if body.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_owned()
    } else {
        body.into_owned()
    };
    RestrictionApiError::status(status.as_u16(), body)
}
