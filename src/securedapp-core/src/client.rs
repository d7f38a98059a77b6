//! Client for the sensitive data endpoint.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, instrument, warn};

use crate::config::GuardConfig;
use crate::error::GuardError;
use crate::gate::TrustGate;
use crate::interceptor::{RequestEnvelope, SigningInterceptor};
use crate::transport::{Transport, TransportResponse};
use crate::types::{DataState, ErrorResponse, SensitiveData};

/// Message used when an error body carries no usable message.
pub const UNKNOWN_ERROR_MESSAGE: &str = "An unknown error occurred.";

/// Signed client for `GET api/v1/sensitive-data`.
///
/// Every fetch passes through the trust gate first; nothing is signed or sent
/// unless the current verdict is `Secure`.
pub struct SensitiveDataClient {
    url: String,
    gate: Arc<TrustGate>,
    interceptor: Arc<SigningInterceptor>,
    transport: Arc<dyn Transport>,
}

impl SensitiveDataClient {
    /// Create a client for the endpoint in `config`.
    pub fn new(
        config: &GuardConfig,
        gate: Arc<TrustGate>,
        interceptor: Arc<SigningInterceptor>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            url: config.sensitive_data_url(),
            gate,
            interceptor,
            transport,
        }
    }

    /// Endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Trust gate consulted before every fetch.
    pub fn gate(&self) -> &Arc<TrustGate> {
        &self.gate
    }

    /// Sign and send the request, then decode the response.
    ///
    /// An untrusted environment or a signing failure aborts before anything
    /// is sent.
    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn fetch(&self) -> Result<SensitiveData, GuardError> {
        self.gate.ensure_trusted()?;
        let request = self.interceptor.intercept(RequestEnvelope::get(&self.url))?;
        let response = self.transport.send(request).await?;
        decode_response(response)
    }

    /// Run [`fetch`](Self::fetch) and fold the outcome into a terminal state.
    pub async fn fetch_state(&self) -> DataState<SensitiveData> {
        match self.fetch().await {
            Ok(data) => {
                info!("Sensitive data received");
                DataState::Success(data)
            },
            Err(e) => {
                warn!("Sensitive data fetch failed: {}", e);
                DataState::Error(e.to_string())
            },
        }
    }

    /// Fetch in the background, streaming `Loading` then one terminal state.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch_states(self: &Arc<Self>) -> mpsc::Receiver<DataState<SensitiveData>> {
        let (tx, rx) = mpsc::channel(2);
        let client = Arc::clone(self);
        tokio::spawn(async move {
            if tx.send(DataState::Loading).await.is_err() {
                return;
            }
            let terminal = client.fetch_state().await;
            let _ = tx.send(terminal).await;
        });
        rx
    }
}

/// Map a raw response to data or a server error.
pub fn decode_response(response: TransportResponse) -> Result<SensitiveData, GuardError> {
    if response.is_success() {
        return serde_json::from_slice(&response.body).map_err(|e| GuardError::InvalidResponse {
            reason: e.to_string(),
        });
    }

    let message = serde_json::from_slice::<ErrorResponse>(&response.body)
        .map(|body| body.error)
        .unwrap_or_else(|_| UNKNOWN_ERROR_MESSAGE.to_string());

    Err(GuardError::ServerError {
        status: response.status,
        message,
    })
}
