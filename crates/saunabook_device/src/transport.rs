// --- File: crates/saunabook_device/src/transport.rs ---
//! How a terminal reaches the backend.

use reqwest::{Client, StatusCode};
use saunabook_common::{config_error, IslandRows, SaunaError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::protocol::{ConfigureRequest, DeviceSnapshot, PullRequest, SyncRequest, SyncResponse};

/// Type alias for a boxed future that returns a Result
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, SaunaError>> + Send + 'a>>;

/// The backend as seen from a terminal.
///
/// Any failure, including a rejection by the backend, is reported as
/// [`SaunaError::SyncFailed`].
pub trait SyncTransport: Send + Sync {
    /// Consumes a setup token and fetches the island snapshot.
    fn configure(&self, request: ConfigureRequest) -> BoxFuture<'_, DeviceSnapshot>;

    /// Fetches the island's rows.
    fn pull(&self, request: PullRequest) -> BoxFuture<'_, IslandRows>;

    /// Hands device rows to the backend.
    fn push(&self, request: SyncRequest) -> BoxFuture<'_, SyncResponse>;
}

/// Errors that can occur when talking to the backend over HTTP
#[derive(Error, Debug)]
pub enum TransportError {
    /// Connection, timeout or body errors
    #[error("HTTP request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("backend returned {status}: {body}")]
    StatusError { status: StatusCode, body: String },
}

impl From<TransportError> for SaunaError {
    fn from(err: TransportError) -> Self {
        SaunaError::SyncFailed(err.to_string())
    }
}

/// [`SyncTransport`] over the backend's JSON API.
#[derive(Debug, Clone)]
pub struct HttpSyncTransport {
    client: Client,
    base_url: String,
}

impl HttpSyncTransport {
    /// Every request is bounded by `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SaunaError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| config_error(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!(%url, "Calling backend");

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(%url, %status, "Backend rejected request");
            return Err(TransportError::StatusError { status, body });
        }
        Ok(response.json::<T>().await?)
    }
}

impl SyncTransport for HttpSyncTransport {
    fn configure(&self, request: ConfigureRequest) -> BoxFuture<'_, DeviceSnapshot> {
        Box::pin(async move { Ok(self.post("/devices/configure", &request).await?) })
    }

    fn pull(&self, request: PullRequest) -> BoxFuture<'_, IslandRows> {
        Box::pin(async move { Ok(self.post("/devices/pull", &request).await?) })
    }

    fn push(&self, request: SyncRequest) -> BoxFuture<'_, SyncResponse> {
        Box::pin(async move { Ok(self.post("/devices/sync", &request).await?) })
    }
}
