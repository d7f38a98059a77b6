//! HTTP transport.
//!
//! Glue between a signed [`RequestEnvelope`] and the network. Non-success
//! statuses are returned as data; only requests that never produced a
//! response are errors.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, ClientBuilder};
use tracing::{debug, instrument, warn};

use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::interceptor::RequestEnvelope;

/// Message used when the network could not be reached.
pub const NETWORK_ERROR_MESSAGE: &str =
    "Could not connect to the network. Please check your connection.";

/// Raw HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: Vec<u8>,
}

impl TransportResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends signed requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send `request` and return the response, whatever its status.
    async fn send(&self, request: RequestEnvelope) -> Result<TransportResponse, GuardError>;
}

/// HTTPS transport on `reqwest` with rustls.
pub struct HttpsTransport {
    client: Client,
}

impl HttpsTransport {
    /// Build a transport from the configuration.
    pub fn new(config: &GuardConfig) -> Result<Self, GuardError> {
        Self::with_timeout(config.timeout, &config.user_agent)
    }

    /// Build a transport with an explicit timeout.
    pub fn with_timeout(timeout: Duration, user_agent: &str) -> Result<Self, GuardError> {
        let client = ClientBuilder::new()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| GuardError::config(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpsTransport {
    #[instrument(skip_all, fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: RequestEnvelope) -> Result<TransportResponse, GuardError> {
        let mut builder = self.client.request(request.method, request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.send().await.map_err(|e| {
            warn!("Request failed: {}", e);
            if e.is_connect() || e.is_timeout() {
                GuardError::transport(NETWORK_ERROR_MESSAGE)
            } else {
                GuardError::transport(e.to_string())
            }
        })?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| GuardError::transport(e.to_string()))?
            .to_vec();

        debug!(status, body_len = body.len(), "Response received");
        Ok(TransportResponse { status, body })
    }
}
