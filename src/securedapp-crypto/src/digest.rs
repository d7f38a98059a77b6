//! Certificate digests used as the app identity.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use sha2::{Digest, Sha256};

/// Digest algorithm applied to signing certificates.
pub const HASH_ALGORITHM: &str = "SHA-256";

/// SHA-256 over the raw certificate bytes, base64 encoded without wrapping.
pub fn certificate_digest(certificate: &[u8]) -> String {
    let hash = Sha256::digest(certificate);
    STANDARD.encode(hash)
}
