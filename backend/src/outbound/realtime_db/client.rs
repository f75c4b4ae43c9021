//! Minimal REST client for a realtime JSON database.
//!
//! Every node is addressed as `{base}/{path}.json`, optionally authenticated
//! with an `auth` query parameter. A JSON `null` body means the node is absent.

use std::time::Duration;

use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use zeroize::Zeroizing;

/// Errors raised by [`RealtimeDbClient`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealtimeDbError {
    /// Request could not be completed.
    #[error("realtime database transport failed: {message}")]
    Transport { message: String },

    /// Database answered with a non-success status.
    #[error("realtime database returned status {status}: {body}")]
    Status { status: u16, body: String },

    /// Response body did not match the expected shape.
    #[error("realtime database payload invalid: {message}")]
    Decode { message: String },
}

impl RealtimeDbError {
    /// Create a transport error with the given message.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Create a decode error with the given message.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}

/// Map client errors onto a port error's connection, query and decode
/// constructors.
pub(super) fn map_realtime_db_error<E>(
    error: RealtimeDbError,
    connection: impl FnOnce(String) -> E,
    query: impl FnOnce(String) -> E,
    decode: impl FnOnce(String) -> E,
) -> E {
    match error {
        RealtimeDbError::Transport { .. } => connection(error.to_string()),
        RealtimeDbError::Status { .. } => query(error.to_string()),
        RealtimeDbError::Decode { message } => decode(message),
    }
}

/// Shared reqwest client bound to one database root.
pub struct RealtimeDbClient {
    client: Client,
    base_url: Url,
    auth: Option<Zeroizing<String>>,
}

impl RealtimeDbClient {
    /// Build a client using an explicit request timeout.
    /// ```rust,ignore
    /// let db = RealtimeDbClient::new(base_url, Some(secret), Duration::from_secs(10))?;
    /// ```
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: Url,
        auth: Option<Zeroizing<String>>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url,
            auth,
        })
    }

    /// Read the node at `path`, returning `None` when it is absent.
    pub async fn get<T: DeserializeOwned + Send>(
        &self,
        path: &[&str],
    ) -> Result<Option<T>, RealtimeDbError> {
        let url = self.node_url(path)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| RealtimeDbError::transport(error.to_string()))?;
        let body = checked_body(response).await?;
        serde_json::from_slice::<Option<T>>(&body)
            .map_err(|error| RealtimeDbError::decode(format!("{}: {error}", path.join("/"))))
    }

    /// Overwrite the node at `path` with `value`.
    pub async fn put<T: Serialize + Sync>(
        &self,
        path: &[&str],
        value: &T,
    ) -> Result<(), RealtimeDbError> {
        let url = self.node_url(path)?;
        let response = self
            .client
            .put(url)
            .json(value)
            .send()
            .await
            .map_err(|error| RealtimeDbError::transport(error.to_string()))?;
        checked_body(response).await?;
        debug!(path = %path.join("/"), "realtime database node written");
        Ok(())
    }

    /// Remove the node at `path`. Removing an absent node succeeds.
    pub async fn delete(&self, path: &[&str]) -> Result<(), RealtimeDbError> {
        let url = self.node_url(path)?;
        let response = self
            .client
            .delete(url)
            .send()
            .await
            .map_err(|error| RealtimeDbError::transport(error.to_string()))?;
        checked_body(response).await?;
        debug!(path = %path.join("/"), "realtime database node removed");
        Ok(())
    }

    fn node_url(&self, path: &[&str]) -> Result<Url, RealtimeDbError> {
        node_url(&self.base_url, path, self.auth.as_ref().map(|auth| auth.as_str()))
    }
}

fn node_url(base_url: &Url, path: &[&str], auth: Option<&str>) -> Result<Url, RealtimeDbError> {
    let Some((leaf, parents)) = path.split_last() else {
        return Err(RealtimeDbError::transport("node path must not be empty"));
    };
    let mut url = base_url.clone();
    url.path_segments_mut()
        .map_err(|()| RealtimeDbError::transport(format!("base URL {base_url} cannot carry a path")))?
        .pop_if_empty()
        .extend(parents)
        .push(&format!("{leaf}.json"));
    if let Some(auth) = auth {
        url.query_pairs_mut().clear().append_pair("auth", auth);
    }
    Ok(url)
}

async fn checked_body(response: Response) -> Result<Vec<u8>, RealtimeDbError> {
    let status = response.status();
    let body = response
        .bytes()
        .await
        .map_err(|error| RealtimeDbError::transport(error.to_string()))?;
    if status.is_success() {
        Ok(body.to_vec())
    } else {
        Err(RealtimeDbError::Status {
            status: status.as_u16(),
            body: String::from_utf8_lossy(&body).trim().to_owned(),
        })
    }
}
