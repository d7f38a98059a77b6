//! # securedapp-crypto
//!
//! Request-signing primitives for the SecuredApp security layer.
//!
//! Every outbound API call carries an HMAC that binds the build identity to
//! a per-request nonce:
//!
//! ```text
//! signing_input = app_signature || "." || nonce
//! signature     = base64(HMAC-SHA256(secret, signing_input))
//! ```
//!
//! `app_signature` is itself a digest of the APK signing certificate, see
//! [`certificate_digest`].

#![warn(missing_docs)]
#![warn(clippy::all)]

mod digest;
mod error;
mod mac;

pub use digest::{certificate_digest, HASH_ALGORITHM};
pub use error::CryptoError;
pub use mac::{sign, verify, HMAC_ALGORITHM, MAC_LENGTH};

/// Constant-time byte comparison.
///
/// Uses the `subtle` crate's `ConstantTimeEq`. The length check still
/// returns early; lengths are not secret for MACs and digests.
#[must_use]
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;

    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
