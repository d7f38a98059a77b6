//! Cryptographic error types.

use thiserror::Error;

/// Errors that can occur during cryptographic operations.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// The MAC key could not be used to initialize HMAC.
    #[error("Invalid MAC key: {reason}")]
    InvalidKey {
        /// Reason the key was rejected.
        reason: String,
    },

    /// A signature was not valid base64.
    #[error("Invalid signature encoding: {reason}")]
    InvalidEncoding {
        /// Reason decoding failed.
        reason: String,
    },
}

impl CryptoError {
    /// Create an invalid key error.
    #[must_use]
    pub fn invalid_key(reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            reason: reason.into(),
        }
    }

    /// Create an invalid encoding error.
    #[must_use]
    pub fn invalid_encoding(reason: impl Into<String>) -> Self {
        Self::InvalidEncoding {
            reason: reason.into(),
        }
    }
}
