//! Native key material provider.
//!
//! The shared HMAC secret is compiled into the binary as XOR-masked fragments
//! and reassembled on every request. This raises the cost of casual static
//! extraction (no contiguous plaintext in `.rodata`) but is not a protection
//! against an attacker with a debugger; the server treats the secret as
//! shared, not device-bound.
//!
//! ## Design Philosophy
//!
//! - The plaintext lives only in a [`SecretKeyMaterial`] and is wiped on drop
//! - Nothing is cached between calls
//! - Any reconstruction failure is reported as absent, never as an error

use tracing::warn;
use zeroize::Zeroize;

use crate::types::SecretKeyMaterial;

/// Source of the shared HMAC secret.
pub trait KeyMaterialProvider: Send + Sync {
    /// Reconstruct the secret, or `None` if it cannot be obtained.
    fn secret_key_material(&self) -> Option<SecretKeyMaterial>;
}

/// One masked slice of the secret.
#[derive(Debug, Clone, Copy)]
pub struct KeyFragment {
    masked: &'static [u8],
    mask: u8,
}

impl KeyFragment {
    /// Describe a fragment whose plaintext is `masked[i] ^ mask`.
    #[must_use]
    pub const fn new(masked: &'static [u8], mask: u8) -> Self {
        Self { masked, mask }
    }

    fn unmask_into(&self, out: &mut Vec<u8>) {
        out.extend(self.masked.iter().map(|b| b ^ self.mask));
    }
}

// ============================================================================
// Embedded fragments
// ============================================================================

const FRAGMENT_1: &[u8] = &[86, 127, 115, 51, 33, 127, 61];
const FRAGMENT_2: &[u8] = &[52, 44, 123, 59, 48, 111, 1];
const FRAGMENT_3: &[u8] = &[97, 78, 10, 66, 7, 24, 90, 8];
const FRAGMENT_4: &[u8] = &[32, 54, 90, 56, 34, 40, 43, 119, 50, 60];

/// Fragments of the production secret, in assembly order.
pub const EMBEDDED_FRAGMENTS: &[KeyFragment] = &[
    KeyFragment::new(FRAGMENT_1, 23),
    KeyFragment::new(FRAGMENT_2, 95),
    KeyFragment::new(FRAGMENT_3, 41),
    KeyFragment::new(FRAGMENT_4, 14),
];

/// Key provider backed by masked fragments embedded in the binary.
#[derive(Debug, Clone, Copy)]
pub struct NativeKeyProvider {
    fragments: &'static [KeyFragment],
}

impl NativeKeyProvider {
    /// Provider over the production fragments.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            fragments: EMBEDDED_FRAGMENTS,
        }
    }

    /// Provider over a custom fragment table.
    #[must_use]
    pub const fn from_fragments(fragments: &'static [KeyFragment]) -> Self {
        Self { fragments }
    }
}

impl Default for NativeKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyMaterialProvider for NativeKeyProvider {
    fn secret_key_material(&self) -> Option<SecretKeyMaterial> {
        let capacity = self.fragments.iter().map(|f| f.masked.len()).sum();
        let mut buffer = Vec::with_capacity(capacity);
        for fragment in self.fragments {
            fragment.unmask_into(&mut buffer);
        }

        if buffer.is_empty() {
            warn!("Native key fragments are empty");
            return None;
        }

        match String::from_utf8(buffer) {
            Ok(secret) => Some(SecretKeyMaterial::new(secret)),
            Err(e) => {
                let mut bytes = e.into_bytes();
                bytes.zeroize();
                warn!("Native key fragments did not decode to UTF-8");
                None
            },
        }
    }
}
