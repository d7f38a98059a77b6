//! Error types for keyring operations.
//!
//! Providers never surface these to the signing path; they log them and
//! report the credential as absent. The errors exist for the places that do
//! propagate: loading certificates from disk and setting up JNI.

use thiserror::Error;

/// Errors that can occur while reading identity or key material.
#[derive(Debug, Error)]
pub enum KeyringError {
    /// No platform backend available on this target.
    #[error("No platform support for this operation")]
    NoPlatformSupport,

    /// Package or signing metadata could not be read.
    #[error("Package metadata unavailable: {reason}")]
    PackageInfoUnavailable {
        /// Reason the metadata could not be read.
        reason: String,
    },

    /// A certificate file could not be loaded.
    #[error("Certificate load failed for {path}: {reason}")]
    CertificateLoadFailed {
        /// Path that failed.
        path: String,
        /// Reason for the failure.
        reason: String,
    },

    /// Key material could not be reconstructed.
    #[error("Key material unavailable: {reason}")]
    KeyMaterialUnavailable {
        /// Reason for the failure.
        reason: String,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Platform-specific error.
    #[error("Platform error: {message}")]
    PlatformError {
        /// Error message from the platform.
        message: String,
    },
}

impl KeyringError {
    /// Create a platform error from a message.
    #[must_use]
    pub fn platform(message: impl Into<String>) -> Self {
        Self::PlatformError {
            message: message.into(),
        }
    }

    /// Create a package info error from a reason.
    #[must_use]
    pub fn package_info(reason: impl Into<String>) -> Self {
        Self::PackageInfoUnavailable {
            reason: reason.into(),
        }
    }
}

#[cfg(target_os = "android")]
impl From<jni::errors::Error> for KeyringError {
    fn from(err: jni::errors::Error) -> Self {
        Self::PlatformError {
            message: err.to_string(),
        }
    }
}
