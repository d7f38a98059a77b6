//! Error types for the security layer.

use thiserror::Error;

/// Errors that can occur while gating, signing or sending a request.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Neither app identity nor key material could be obtained.
    #[error("Signing credentials unavailable")]
    CredentialsUnavailable,

    /// App identity is present but the key material is not.
    #[error("Signing key material unavailable")]
    KeyMaterialUnavailable,

    /// A sensitive operation was attempted while the environment is not trusted.
    #[error("Environment not trusted: {verdict}")]
    EnvironmentUntrusted {
        /// The verdict in effect when the operation was refused.
        verdict: String,
    },

    /// The request never produced an HTTP response.
    #[error("{message}")]
    TransportError {
        /// Error message.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("{message}")]
    ServerError {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the error body.
        message: String,
    },

    /// A success response could not be decoded.
    #[error("Invalid response: {reason}")]
    InvalidResponse {
        /// Reason the response is invalid.
        reason: String,
    },

    /// Configuration error.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Error message.
        message: String,
    },

    /// Cryptographic error.
    #[error("Crypto error: {0}")]
    CryptoError(#[from] securedapp_crypto::CryptoError),

    /// Keyring error.
    #[error("Keyring error: {0}")]
    KeyringError(#[from] securedapp_keyring::KeyringError),
}

impl GuardError {
    /// Create a config error from a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Create a transport error from a message.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }

    /// Check if this error aborts the request before dispatch.
    ///
    /// Fatal errors mean the request was never sent and retrying without a
    /// change in credentials cannot succeed.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::CredentialsUnavailable | Self::KeyMaterialUnavailable | Self::CryptoError(_)
        )
    }

    /// Check if this error should surface to the user as a retryable failure.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::TransportError { .. } | Self::ServerError { .. } | Self::InvalidResponse { .. }
        )
    }
}
