//! # securedapp-keyring
//!
//! Credential providers for SecuredApp request signing.
//!
//! Two credentials feed every signed request:
//!
//! | Credential | Secret | Source |
//! |------------|--------|--------|
//! | App identity | No | SHA-256 of the APK signing certificate |
//! | Key material | Yes | XOR-masked fragments in the native library |
//!
//! Both providers are queries that return `Option`: a provider never fails
//! the caller. Whether a missing credential is fatal is decided by the
//! signer in `securedapp-core`.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use securedapp_keyring::{
//!     AppIdentityProvider, CertificateIdentityProvider, KeyMaterialProvider, NativeKeyProvider,
//! };
//!
//! let identity = CertificateIdentityProvider::from_der_files(&["signer.der"])?
//!     .app_identity();
//! let key = NativeKeyProvider::new().secret_key_material();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)] // Too strict for production code
#![allow(clippy::doc_markdown)] // Allow product names without backticks
#![allow(clippy::missing_errors_doc)] // Error documentation not required
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type

mod error;
mod identity;
mod native;
mod types;

/// Platform-specific identity sources.
pub mod platform;

pub use error::KeyringError;
pub use identity::{identity_from_signers, AppIdentityProvider, CertificateIdentityProvider};
pub use native::{KeyFragment, KeyMaterialProvider, NativeKeyProvider, EMBEDDED_FRAGMENTS};
pub use types::{AppIdentity, SecretKeyMaterial, SignerPolicy};
