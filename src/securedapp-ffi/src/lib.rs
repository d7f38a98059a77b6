//! # securedapp-ffi
//!
//! C-compatible FFI and JNI interface for the SecuredApp security layer.
//!
//! The host app owns the HTTP client. It asks this library for a trust
//! verdict before sensitive screens and for a fresh set of signing headers
//! before every request.
//!
//! ## Usage
//!
//! ```c
//! #include "securedapp.h"
//!
//! int main() {
//!     SecuredAppHandle* handle = securedapp_init(cert_der, cert_len);
//!     if (!handle) {
//!         return 1;
//!     }
//!
//!     int32_t verdict = 0;
//!     if (securedapp_evaluate(handle, &verdict) == 0 && verdict == 1) {
//!         uint8_t* headers = NULL;
//!         size_t headers_len = 0;
//!         if (securedapp_signed_headers(handle, &headers, &headers_len) == 0) {
//!             // JSON object: X-App-Signature, X-Nonce, X-Payload-Signature
//!             securedapp_free(headers);
//!         }
//!     }
//!
//!     securedapp_destroy(handle);
//!     return 0;
//! }
//! ```

#![allow(clippy::missing_safety_doc)] // FFI functions are inherently unsafe

use std::collections::BTreeMap;
use std::ffi::c_void;
use std::ptr;
use std::sync::Arc;

use securedapp_core::security::{
    EnvironmentTrustEvaluator, PlatformSignalProvider, SystemSignalProvider,
};
use securedapp_core::{GuardError, InsecureReason, SigningInterceptor, TrustGate, TrustVerdict};
use securedapp_keyring::{AppIdentityProvider, CertificateIdentityProvider, NativeKeyProvider};
use tokio::runtime::Runtime;

/// Opaque handle to a SecuredApp instance.
#[repr(C)]
pub struct SecuredAppHandle {
    runtime: Runtime,
    gate: Arc<TrustGate>,
    interceptor: Arc<SigningInterceptor>,
}

/// Error codes returned by FFI functions.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecuredAppError {
    /// Success.
    Success = 0,
    /// Invalid argument.
    InvalidArgument = -1,
    /// Initialization failed.
    InitializationFailed = -2,
    /// Neither identity nor key material available.
    CredentialsUnavailable = -3,
    /// Key material unavailable.
    KeyMaterialUnavailable = -4,
    /// Serialization error.
    SerializationError = -5,
    /// Environment not evaluated as trusted.
    EnvironmentUntrusted = -6,
    /// Internal error.
    InternalError = -99,
}

impl From<&GuardError> for SecuredAppError {
    fn from(err: &GuardError) -> Self {
        match err {
            GuardError::CredentialsUnavailable => Self::CredentialsUnavailable,
            GuardError::KeyMaterialUnavailable => Self::KeyMaterialUnavailable,
            GuardError::EnvironmentUntrusted { .. } => Self::EnvironmentUntrusted,
            _ => Self::InternalError,
        }
    }
}

/// Trust verdict codes written by [`securedapp_evaluate`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecuredAppVerdict {
    /// Not evaluated.
    Unknown = 0,
    /// Trusted.
    Secure = 1,
    /// Developer options enabled.
    DeveloperMode = 2,
    /// Emulator detected.
    Emulator = 3,
    /// Root detected.
    Rooted = 4,
    /// Evaluation did not complete.
    EvaluationFailed = 5,
}

impl From<TrustVerdict> for SecuredAppVerdict {
    fn from(verdict: TrustVerdict) -> Self {
        match verdict {
            TrustVerdict::Unknown => Self::Unknown,
            TrustVerdict::Secure => Self::Secure,
            TrustVerdict::Insecure(InsecureReason::DeveloperMode) => Self::DeveloperMode,
            TrustVerdict::Insecure(InsecureReason::Emulator) => Self::Emulator,
            TrustVerdict::Insecure(InsecureReason::Rooted) => Self::Rooted,
            TrustVerdict::Insecure(InsecureReason::EvaluationFailed) => Self::EvaluationFailed,
        }
    }
}

fn init_logging() {
    #[cfg(target_os = "android")]
    {
        android_logger::init_once(
            android_logger::Config::default()
                .with_max_level(log::LevelFilter::Info)
                .with_tag("SecuredApp"),
        );
    }
}

fn new_handle(
    identity: Arc<dyn AppIdentityProvider>,
    signals: Arc<dyn PlatformSignalProvider>,
) -> Option<Box<SecuredAppHandle>> {
    let evaluator = EnvironmentTrustEvaluator::for_system(signals);
    let interceptor = SigningInterceptor::new(identity, Arc::new(NativeKeyProvider::new()));
    handle_with(evaluator, interceptor)
}

fn handle_with(
    evaluator: EnvironmentTrustEvaluator,
    interceptor: SigningInterceptor,
) -> Option<Box<SecuredAppHandle>> {
    let runtime = match Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {}", e);
            return None;
        },
    };

    Some(Box::new(SecuredAppHandle {
        runtime,
        gate: Arc::new(TrustGate::new(Arc::new(evaluator))),
        interceptor: Arc::new(interceptor),
    }))
}

/// Signing headers, only while the gate reports `Secure`.
fn gated_headers(handle: &SecuredAppHandle) -> Result<BTreeMap<String, String>, GuardError> {
    handle.gate.ensure_trusted()?;
    handle.interceptor.signed_headers()
}

unsafe fn write_output(bytes: &[u8], out_data: *mut *mut u8, out_len: *mut usize) -> i32 {
    let len = bytes.len();
    let ptr = libc::malloc(len.max(1)) as *mut u8;
    if ptr.is_null() {
        return SecuredAppError::InternalError as i32;
    }

    ptr::copy_nonoverlapping(bytes.as_ptr(), ptr, len);
    *out_data = ptr;
    *out_len = len;
    SecuredAppError::Success as i32
}

/// Initialize a SecuredApp instance.
///
/// `cert_der` is the DER signing certificate used as app identity; pass
/// NULL to sign with an empty identity. Returns NULL on failure.
///
/// # Safety
///
/// `cert_der` must be NULL or point to `cert_len` readable bytes. The
/// returned handle must be freed with `securedapp_destroy`.
#[no_mangle]
pub unsafe extern "C" fn securedapp_init(
    cert_der: *const u8,
    cert_len: usize,
) -> *mut SecuredAppHandle {
    init_logging();

    let certificates = if cert_der.is_null() || cert_len == 0 {
        Vec::new()
    } else {
        vec![std::slice::from_raw_parts(cert_der, cert_len).to_vec()]
    };
    let identity = Arc::new(CertificateIdentityProvider::new(certificates));

    match new_handle(identity, Arc::new(SystemSignalProvider::new())) {
        Some(handle) => Box::into_raw(handle),
        None => ptr::null_mut(),
    }
}

/// Evaluate the environment and write the verdict code.
///
/// The first call counts as session start; later calls as a return to the
/// foreground.
///
/// # Returns
///
/// 0 on success, negative error code on failure.
///
/// # Safety
///
/// `handle` must come from `securedapp_init` and `verdict` must be writable.
#[no_mangle]
pub unsafe extern "C" fn securedapp_evaluate(
    handle: *mut SecuredAppHandle,
    verdict: *mut i32,
) -> i32 {
    if handle.is_null() || verdict.is_null() {
        return SecuredAppError::InvalidArgument as i32;
    }

    let handle = &*handle;
    let gate = &handle.gate;
    let result = handle.runtime.block_on(async {
        if gate.current().is_known() {
            gate.on_foreground_resumed().await
        } else {
            gate.on_session_start().await
        }
    });

    *verdict = SecuredAppVerdict::from(result) as i32;
    SecuredAppError::Success as i32
}

/// Produce signing headers for one request as a JSON object.
///
/// Refused with `EnvironmentUntrusted` unless the last evaluation returned
/// `Secure`; nothing is written to the outputs in that case.
///
/// # Arguments
///
/// * `handle` - Handle from `securedapp_init`
/// * `out_data` - Output pointer for the JSON bytes (free with `securedapp_free`)
/// * `out_len` - Output pointer for the length
///
/// # Safety
///
/// `handle` must come from `securedapp_init`; `out_data` and `out_len`
/// must be writable.
#[no_mangle]
pub unsafe extern "C" fn securedapp_signed_headers(
    handle: *mut SecuredAppHandle,
    out_data: *mut *mut u8,
    out_len: *mut usize,
) -> i32 {
    if handle.is_null() || out_data.is_null() || out_len.is_null() {
        return SecuredAppError::InvalidArgument as i32;
    }

    let handle = &*handle;
    let headers = match gated_headers(handle) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Signing failed: {}", e);
            return SecuredAppError::from(&e) as i32;
        },
    };

    let json = match serde_json::to_vec(&headers) {
        Ok(j) => j,
        Err(e) => {
            tracing::error!("Failed to serialize headers: {}", e);
            return SecuredAppError::SerializationError as i32;
        },
    };

    write_output(&json, out_data, out_len)
}

/// Free memory allocated by SecuredApp functions.
///
/// # Safety
///
/// `data` must be a pointer returned by a SecuredApp function, or NULL.
#[no_mangle]
pub unsafe extern "C" fn securedapp_free(data: *mut c_void) {
    if !data.is_null() {
        libc::free(data);
    }
}

/// Destroy the handle and release resources.
///
/// # Safety
///
/// `handle` must be a valid handle from `securedapp_init`.
/// After this call, the handle is invalid and must not be used.
#[no_mangle]
pub unsafe extern "C" fn securedapp_destroy(handle: *mut SecuredAppHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Get the library version.
#[no_mangle]
pub extern "C" fn securedapp_version() -> *const libc::c_char {
    concat!(env!("CARGO_PKG_VERSION"), "\0").as_ptr() as *const libc::c_char
}

// Android JNI bindings
#[cfg(target_os = "android")]
mod android {
    use jni::objects::{JClass, JObject};
    use jni::sys::{jint, jlong, jstring};
    use jni::{JNIEnv, JavaVM};
    use securedapp_keyring::platform::{init_jni, AndroidContext, PackageSignatureProvider};
    use securedapp_keyring::{KeyMaterialProvider, SignerPolicy};
    use tracing::{error, info};

    use super::*;

    /// Called by the runtime when the library is loaded.
    #[no_mangle]
    pub unsafe extern "system" fn JNI_OnLoad(
        vm: *mut jni::sys::JavaVM,
        _reserved: *mut c_void,
    ) -> jint {
        init_logging();

        // Safety: vm pointer is provided by the JVM and is valid
        let vm = match JavaVM::from_raw(vm) {
            Ok(vm) => vm,
            Err(e) => {
                error!("JNI_OnLoad: failed to wrap JavaVM: {}", e);
                return jni::sys::JNI_ERR;
            },
        };

        if let Err(e) = init_jni(vm) {
            error!("JNI_OnLoad: {}", e);
            return jni::sys::JNI_ERR;
        }

        info!("JNI_OnLoad: SecuredApp native library loaded");
        jni::sys::JNI_VERSION_1_6
    }

    #[no_mangle]
    pub extern "system" fn Java_com_lushan_securedapp_core_security_SecurityBridge_nativeInit(
        mut env: JNIEnv,
        _class: JClass,
        context: JObject,
    ) -> jlong {
        let context = match AndroidContext::new(&mut env, &context) {
            Ok(c) => Arc::new(c),
            Err(e) => {
                error!("nativeInit: {}", e);
                return 0;
            },
        };

        let identity = Arc::new(PackageSignatureProvider::new(
            Arc::clone(&context),
            SignerPolicy::default(),
        ));
        let signals = Arc::new(SystemSignalProvider::with_context(context));

        match new_handle(identity, signals) {
            Some(handle) => Box::into_raw(handle) as jlong,
            None => 0,
        }
    }

    #[no_mangle]
    pub unsafe extern "system" fn Java_com_lushan_securedapp_core_security_SecurityBridge_nativeEvaluate(
        _env: JNIEnv,
        _class: JClass,
        handle: jlong,
    ) -> jint {
        let mut verdict = SecuredAppVerdict::Unknown as i32;
        let rc = securedapp_evaluate(handle as *mut SecuredAppHandle, &mut verdict);
        if rc != SecuredAppError::Success as i32 {
            return rc;
        }
        verdict
    }

    #[no_mangle]
    pub unsafe extern "system" fn Java_com_lushan_securedapp_core_security_SecurityBridge_nativeSignedHeaders(
        env: JNIEnv,
        _class: JClass,
        handle: jlong,
    ) -> jstring {
        if handle == 0 {
            return ptr::null_mut();
        }
        let handle = &*(handle as *mut SecuredAppHandle);

        let json = match gated_headers(handle)
            .map_err(|e| e.to_string())
            .and_then(|h| serde_json::to_string(&h).map_err(|e| e.to_string()))
        {
            Ok(json) => json,
            Err(e) => {
                error!("nativeSignedHeaders: {}", e);
                return ptr::null_mut();
            },
        };

        match env.new_string(json) {
            Ok(s) => s.into_raw(),
            Err(e) => {
                error!("nativeSignedHeaders: {}", e);
                ptr::null_mut()
            },
        }
    }

    #[no_mangle]
    pub unsafe extern "system" fn Java_com_lushan_securedapp_core_security_SecurityBridge_nativeDestroy(
        _env: JNIEnv,
        _class: JClass,
        handle: jlong,
    ) {
        securedapp_destroy(handle as *mut SecuredAppHandle);
    }

    /// `Keys.getSecretKey()` for hosts that sign on the Kotlin side.
    ///
    /// The returned Java string cannot be wiped; prefer `nativeSignedHeaders`.
    #[no_mangle]
    pub extern "system" fn Java_com_lushan_securedapp_core_security_Keys_getSecretKey(
        env: JNIEnv,
        _this: JObject,
    ) -> jstring {
        let Some(secret) = NativeKeyProvider::new().secret_key_material() else {
            error!("getSecretKey: key material unavailable");
            return ptr::null_mut();
        };

        match env.new_string(secret.expose_secret()) {
            Ok(s) => s.into_raw(),
            Err(e) => {
                error!("getSecretKey: {}", e);
                ptr::null_mut()
            },
        }
    }
}
