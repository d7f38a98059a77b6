//! Identity and secret types.

use std::fmt;
use std::str::FromStr;

use zeroize::Zeroizing;

use crate::error::KeyringError;

/// Digest of the installed build's signing certificate.
///
/// Not secret. Sent verbatim in the `X-App-Signature` header so the server
/// can bind a request to a build lineage.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AppIdentity(String);

impl AppIdentity {
    /// Wrap an already-encoded digest.
    #[must_use]
    pub fn new(digest: impl Into<String>) -> Self {
        Self(digest.into())
    }

    /// The encoded digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Shared HMAC secret obtained from the native key provider.
///
/// Wiped from memory on drop. `Debug` is redacted and there is no `Clone`,
/// `Display` or serde support, so the value cannot leak through logging or
/// persistence by accident.
pub struct SecretKeyMaterial(Zeroizing<String>);

impl SecretKeyMaterial {
    /// Take ownership of a reconstructed secret.
    #[must_use]
    pub fn new(secret: String) -> Self {
        Self(Zeroizing::new(secret))
    }

    /// Raw bytes used as the HMAC key.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    /// Borrow the secret as text. Only for handing to a MAC or across FFI.
    #[must_use]
    pub fn expose_secret(&self) -> &str {
        self.0.as_str()
    }

    /// Length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the secret is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SecretKeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecretKeyMaterial([REDACTED])")
    }
}

/// Which signing certificate(s) make up the app identity.
///
/// APK signature scheme v3 allows key rotation and multiple signers. The
/// server contract digests one certificate, so a policy decides what to do
/// when the platform reports more than one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignerPolicy {
    /// Digest the first reported signer, ignore the rest.
    #[default]
    FirstSigner,
    /// Report no identity unless exactly one signer is present.
    RequireSingleSigner,
}

impl FromStr for SignerPolicy {
    type Err = KeyringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" | "first-signer" => Ok(Self::FirstSigner),
            "single" | "require-single-signer" => Ok(Self::RequireSingleSigner),
            other => Err(KeyringError::InvalidConfiguration {
                reason: format!("unknown signer policy '{}'", other),
            }),
        }
    }
}
