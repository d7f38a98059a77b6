//! Presentation-facing session.
//!
//! Wraps the data client and its trust gate, exposing both states as watch
//! channels for the UI. The trust check runs when the session starts.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use crate::client::SensitiveDataClient;
use crate::error::GuardError;
use crate::gate::TrustGate;
use crate::types::{DataState, GateAction, SensitiveData, TrustVerdict};

/// A user session guarded by environment trust.
pub struct SecureSession {
    gate: Arc<TrustGate>,
    client: Arc<SensitiveDataClient>,
    data: watch::Sender<DataState<SensitiveData>>,
    terminated: AtomicBool,
}

impl SecureSession {
    /// Create the session and run the initial trust check on the client's gate.
    pub async fn start(client: Arc<SensitiveDataClient>) -> Self {
        let (data, _) = watch::channel(DataState::Idle);
        let session = Self {
            gate: Arc::clone(client.gate()),
            client,
            data,
            terminated: AtomicBool::new(false),
        };
        let verdict = session.gate.on_session_start().await;
        info!(%verdict, "Session started");
        session
    }

    /// Observe the trust verdict.
    pub fn trust_verdict(&self) -> watch::Receiver<TrustVerdict> {
        self.gate.subscribe()
    }

    /// Observe the sensitive data state.
    pub fn data_state(&self) -> watch::Receiver<DataState<SensitiveData>> {
        self.data.subscribe()
    }

    /// Actions the UI may offer right now.
    pub fn available_actions(&self) -> Vec<GateAction> {
        if self.is_terminated() {
            return Vec::new();
        }
        self.gate.available_actions()
    }

    /// Fetch the sensitive data, publishing each state as it happens.
    ///
    /// Refused unless the environment is trusted and the session is live.
    /// Resolves once the terminal state has been published.
    pub async fn fetch_sensitive_data(&self) -> Result<(), GuardError> {
        if self.is_terminated() {
            return Err(GuardError::EnvironmentUntrusted {
                verdict: "session terminated".into(),
            });
        }
        self.gate.ensure_trusted()?;

        let mut states = self.client.fetch_states();
        while let Some(state) = states.recv().await {
            self.data.send_replace(state);
        }
        Ok(())
    }

    /// Re-check trust after returning to the foreground.
    pub async fn on_foreground_resumed(&self) -> TrustVerdict {
        let verdict = self.gate.on_foreground_resumed().await;
        if !verdict.is_secure() {
            warn!(%verdict, "Environment no longer trusted");
        }
        verdict
    }

    /// End the session. Clears any fetched data.
    pub fn terminate(&self) {
        self.terminated.store(true, Ordering::SeqCst);
        self.data.send_replace(DataState::Idle);
        info!("Session terminated");
    }

    /// Whether [`terminate`](Self::terminate) has been called.
    pub fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::SeqCst)
    }
}
