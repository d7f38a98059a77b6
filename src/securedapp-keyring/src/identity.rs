//! App identity providers.
//!
//! The identity is the base64 SHA-256 digest of the APK signing certificate.
//! Providers are queries: any failure to read signing metadata is logged and
//! reported as `None`, and the caller decides policy.

use std::path::Path;

use securedapp_crypto::certificate_digest;
use tracing::{debug, warn};

use crate::error::KeyringError;
use crate::types::{AppIdentity, SignerPolicy};

/// Source of the installed build's identity.
pub trait AppIdentityProvider: Send + Sync {
    /// Compute the identity, or `None` if it is unavailable.
    fn app_identity(&self) -> Option<AppIdentity>;
}

/// Reduce a list of DER signing certificates to an identity.
///
/// Returns `None` for an empty list, and for multiple signers under
/// [`SignerPolicy::RequireSingleSigner`].
pub fn identity_from_signers(signers: &[Vec<u8>], policy: SignerPolicy) -> Option<AppIdentity> {
    let first = signers.first()?;

    if signers.len() > 1 {
        match policy {
            SignerPolicy::FirstSigner => {
                debug!(
                    signer_count = signers.len(),
                    "Multiple signing certificates, using the first"
                );
            },
            SignerPolicy::RequireSingleSigner => {
                warn!(
                    signer_count = signers.len(),
                    "Multiple signing certificates rejected by signer policy"
                );
                return None;
            },
        }
    }

    Some(AppIdentity::new(certificate_digest(first)))
}

/// Identity provider over a fixed list of DER certificates.
///
/// Used off-device, where the host hands over the certificates it read, and
/// in tests.
#[derive(Debug, Clone, Default)]
pub struct CertificateIdentityProvider {
    certificates: Vec<Vec<u8>>,
    policy: SignerPolicy,
}

impl CertificateIdentityProvider {
    /// Create a provider over the given signer certificates.
    #[must_use]
    pub fn new(certificates: Vec<Vec<u8>>) -> Self {
        Self {
            certificates,
            policy: SignerPolicy::default(),
        }
    }

    /// Set the multi-signer policy.
    #[must_use]
    pub fn with_policy(mut self, policy: SignerPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Load certificates from DER files, in order.
    pub fn from_der_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self, KeyringError> {
        let mut certificates = Vec::with_capacity(paths.len());
        for path in paths {
            let path = path.as_ref();
            let bytes = std::fs::read(path).map_err(|e| KeyringError::CertificateLoadFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
            certificates.push(bytes);
        }
        Ok(Self::new(certificates))
    }

    /// Number of certificates held.
    #[must_use]
    pub fn signer_count(&self) -> usize {
        self.certificates.len()
    }
}

impl AppIdentityProvider for CertificateIdentityProvider {
    fn app_identity(&self) -> Option<AppIdentity> {
        identity_from_signers(&self.certificates, self.policy)
    }
}
