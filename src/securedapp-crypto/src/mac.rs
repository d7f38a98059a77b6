//! HMAC-SHA256 request signing.
//!
//! The server recomputes the same MAC over `"<app_signature>.<nonce>"` with
//! the shared secret, so the encoding here is part of the wire contract:
//! standard base64 alphabet, padded, never line-wrapped.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CryptoError;

type HmacSha256 = Hmac<Sha256>;

/// Algorithm name advertised to peers that care.
pub const HMAC_ALGORITHM: &str = "HmacSHA256";

/// Length of a raw HMAC-SHA256 tag in bytes.
pub const MAC_LENGTH: usize = 32;

/// Compute the request signature.
///
/// HMAC-SHA256 over the UTF-8 bytes of `signing_input`, keyed with the raw
/// bytes of `key`, encoded as base64 without line wrapping.
///
/// Pure: identical arguments always yield identical output. Callers supply
/// non-empty arguments; nothing is validated here.
pub fn sign(signing_input: &str, key: &[u8]) -> Result<String, CryptoError> {
    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| CryptoError::invalid_key(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

/// Check a base64 signature against `signing_input` in constant time.
///
/// Returns `Ok(false)` for a well-formed signature that does not match and
/// an error only when `signature` is not valid base64.
pub fn verify(signing_input: &str, key: &[u8], signature: &str) -> Result<bool, CryptoError> {
    let tag = STANDARD
        .decode(signature)
        .map_err(|e| CryptoError::invalid_encoding(e.to_string()))?;

    let mut mac =
        HmacSha256::new_from_slice(key).map_err(|e| CryptoError::invalid_key(e.to_string()))?;
    mac.update(signing_input.as_bytes());
    Ok(mac.verify_slice(&tag).is_ok())
}
