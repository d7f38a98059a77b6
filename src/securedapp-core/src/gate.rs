//! Trust gate.
//!
//! Holds the current [`TrustVerdict`] and publishes it to any number of
//! observers. The verdict starts as `Unknown` and is replaced wholesale on
//! each trigger: session start and every return to the foreground. Between
//! triggers it is sticky. Overlapping triggers are serialized, so verdicts
//! are published in trigger order.
//!
//! Sensitive operations call [`TrustGate::ensure_trusted`], which only passes
//! on `Secure`. An `Unknown` verdict blocks just like `Insecure`.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::{error, info, instrument};

use crate::error::GuardError;
use crate::security::EnvironmentTrustEvaluator;
use crate::types::{GateAction, InsecureReason, TrustVerdict};

/// Publishes the trust verdict and blocks sensitive operations.
pub struct TrustGate {
    evaluator: Arc<EnvironmentTrustEvaluator>,
    verdict: watch::Sender<TrustVerdict>,
    evaluation: Mutex<()>,
}

impl TrustGate {
    /// Create a gate in the `Unknown` state.
    pub fn new(evaluator: Arc<EnvironmentTrustEvaluator>) -> Self {
        let (verdict, _) = watch::channel(TrustVerdict::Unknown);
        Self {
            evaluator,
            verdict,
            evaluation: Mutex::new(()),
        }
    }

    /// Observe verdict changes.
    pub fn subscribe(&self) -> watch::Receiver<TrustVerdict> {
        self.verdict.subscribe()
    }

    /// Current verdict.
    pub fn current(&self) -> TrustVerdict {
        *self.verdict.borrow()
    }

    /// Evaluate at session start.
    pub async fn on_session_start(&self) -> TrustVerdict {
        self.reevaluate("session_start").await
    }

    /// Re-evaluate when the app returns to the foreground.
    pub async fn on_foreground_resumed(&self) -> TrustVerdict {
        self.reevaluate("foreground_resumed").await
    }

    #[instrument(skip(self))]
    async fn reevaluate(&self, trigger: &'static str) -> TrustVerdict {
        // Held until the verdict is published; the lock is FIFO.
        let _serial = self.evaluation.lock().await;

        let evaluator = Arc::clone(&self.evaluator);
        let verdict = match tokio::task::spawn_blocking(move || evaluator.evaluate()).await {
            Ok(verdict) => verdict,
            Err(e) => {
                error!("Trust evaluation did not complete: {}", e);
                TrustVerdict::Insecure(InsecureReason::EvaluationFailed)
            },
        };

        let previous = self.verdict.send_replace(verdict);
        if previous != verdict {
            info!(%previous, %verdict, "Trust verdict changed");
        }
        verdict
    }

    /// Fail unless the current verdict is `Secure`.
    pub fn ensure_trusted(&self) -> Result<(), GuardError> {
        match self.current() {
            TrustVerdict::Secure => Ok(()),
            other => Err(GuardError::EnvironmentUntrusted {
                verdict: other.to_string(),
            }),
        }
    }

    /// Actions the presentation layer may offer under the current verdict.
    pub fn available_actions(&self) -> Vec<GateAction> {
        actions_for(self.current())
    }
}

/// Actions allowed under `verdict`.
pub fn actions_for(verdict: TrustVerdict) -> Vec<GateAction> {
    match verdict {
        TrustVerdict::Unknown => Vec::new(),
        TrustVerdict::Secure => vec![GateAction::FetchSensitiveData],
        TrustVerdict::Insecure(_) => vec![GateAction::TerminateSession],
    }
}
