//! Shared types for trust verdicts, data states and endpoint payloads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why the environment was judged insecure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsecureReason {
    /// Developer options are enabled.
    DeveloperMode,
    /// Build metadata or the kernel reports an emulator.
    Emulator,
    /// Root indicators were found.
    Rooted,
    /// The evaluation itself did not complete.
    EvaluationFailed,
}

impl fmt::Display for InsecureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::DeveloperMode => "developer mode enabled",
            Self::Emulator => "emulator detected",
            Self::Rooted => "root detected",
            Self::EvaluationFailed => "evaluation failed",
        };
        f.write_str(s)
    }
}

/// Outcome of an environment trust evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "verdict", content = "reason", rename_all = "snake_case")]
pub enum TrustVerdict {
    /// No evaluation has completed yet.
    #[default]
    Unknown,
    /// All checks passed.
    Secure,
    /// At least one check failed.
    Insecure(InsecureReason),
}

impl TrustVerdict {
    /// Whether sensitive operations are allowed.
    #[must_use]
    pub fn is_secure(&self) -> bool {
        matches!(self, Self::Secure)
    }

    /// Whether an evaluation has completed.
    #[must_use]
    pub fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for TrustVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => f.write_str("Unknown"),
            Self::Secure => f.write_str("Secure"),
            Self::Insecure(reason) => write!(f, "Insecure ({})", reason),
        }
    }
}

/// Actions the presentation layer may offer for the current verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GateAction {
    /// Fetch the sensitive data.
    FetchSensitiveData,
    /// End the session.
    TerminateSession,
}

/// State of an asynchronous data operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum DataState<T> {
    /// Nothing requested yet.
    Idle,
    /// Request in flight.
    Loading,
    /// Request completed with data.
    Success(T),
    /// Request failed with a user-facing message.
    Error(String),
}

impl<T> Default for DataState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> DataState<T> {
    /// Whether this state ends a fetch.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Success(_) | Self::Error(_))
    }
}

/// Payload of the sensitive data endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensitiveData {
    /// Server status message.
    pub message: String,
    /// The protected content.
    pub data: SecureData,
}

/// Protected content returned to trusted clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecureData {
    /// Title.
    pub title: String,
    /// Description.
    pub description: String,
}

/// Error body returned by the backend on non-success statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error.
    pub error: String,
}
