//! Platform-specific identity sources.
//!
//! - Android: package signing certificates and settings over JNI
//! - Elsewhere: certificates supplied by the host (see
//!   [`CertificateIdentityProvider`](crate::CertificateIdentityProvider))

#[cfg(target_os = "android")]
pub mod android;

#[cfg(target_os = "android")]
pub use android::{init_jni, AndroidContext, PackageSignatureProvider};
