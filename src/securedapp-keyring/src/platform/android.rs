//! Android package and settings access over JNI.
//!
//! Holds the process-wide `JavaVM` and a global reference to the host app's
//! `Context`. Both are installed once by the FFI layer: the VM from
//! `JNI_OnLoad`, the context from the app's native init call.

use std::sync::{Arc, OnceLock};

use jni::objects::{GlobalRef, JByteArray, JObject, JObjectArray, JValue};
use jni::{JNIEnv, JavaVM};
use tracing::{debug, error, info, warn};

use crate::error::KeyringError;
use crate::identity::{identity_from_signers, AppIdentityProvider};
use crate::types::{AppIdentity, SignerPolicy};

/// `PackageManager.GET_SIGNING_CERTIFICATES`.
const GET_SIGNING_CERTIFICATES: i32 = 0x0800_0000;

/// `Settings.Global.DEVELOPMENT_SETTINGS_ENABLED`.
const DEVELOPMENT_SETTINGS_ENABLED: &str = "development_settings_enabled";

/// Global JavaVM reference, set during JNI_OnLoad.
static JAVA_VM: OnceLock<JavaVM> = OnceLock::new();

/// Install the JavaVM reference.
pub fn init_jni(vm: JavaVM) -> Result<(), KeyringError> {
    info!("init_jni: installing JavaVM reference");
    JAVA_VM.set(vm).map_err(|_| {
        error!("init_jni: JavaVM already initialized");
        KeyringError::platform("JavaVM already initialized")
    })
}

fn java_vm() -> Result<&'static JavaVM, KeyringError> {
    JAVA_VM
        .get()
        .ok_or_else(|| KeyringError::platform("JNI not initialized"))
}

/// Capability handle to the host app's `Context`.
///
/// Every JNI-backed query in this crate goes through one of these, so code
/// that has no context cannot reach Android APIs at all.
pub struct AndroidContext {
    context: GlobalRef,
}

impl AndroidContext {
    /// Pin the given `Context` with a global reference.
    pub fn new(env: &mut JNIEnv, context: &JObject) -> Result<Self, KeyringError> {
        if context.is_null() {
            return Err(KeyringError::platform("null Context"));
        }
        let context = env.new_global_ref(context)?;
        Ok(Self { context })
    }

    /// Run `f` on an attached thread with the pinned context.
    ///
    /// A pending Java exception is cleared before returning so it cannot leak
    /// into the next JNI call on this thread.
    pub fn with_env<T>(
        &self,
        f: impl FnOnce(&mut JNIEnv, &JObject) -> Result<T, KeyringError>,
    ) -> Result<T, KeyringError> {
        let vm = java_vm()?;
        let mut env = vm
            .attach_current_thread()
            .map_err(|e| KeyringError::platform(format!("JNI attach failed: {}", e)))?;

        let result = f(&mut env, self.context.as_obj());

        if env.exception_check().unwrap_or(false) {
            let _ = env.exception_describe();
            let _ = env.exception_clear();
        }
        result
    }

    /// DER encodings of the APK content signers, in platform order.
    pub fn signing_certificates(&self) -> Result<Vec<Vec<u8>>, KeyringError> {
        self.with_env(|env, context| {
            let package_manager = env
                .call_method(
                    context,
                    "getPackageManager",
                    "()Landroid/content/pm/PackageManager;",
                    &[],
                )?
                .l()?;
            let package_name = env
                .call_method(context, "getPackageName", "()Ljava/lang/String;", &[])?
                .l()?;

            let package_info = env
                .call_method(
                    &package_manager,
                    "getPackageInfo",
                    "(Ljava/lang/String;I)Landroid/content/pm/PackageInfo;",
                    &[
                        JValue::Object(&package_name),
                        JValue::Int(GET_SIGNING_CERTIFICATES),
                    ],
                )
                .map_err(|e| KeyringError::package_info(format!("getPackageInfo: {}", e)))?
                .l()?;

            let signing_info = env
                .get_field(
                    &package_info,
                    "signingInfo",
                    "Landroid/content/pm/SigningInfo;",
                )?
                .l()?;
            if signing_info.is_null() {
                debug!("PackageInfo has no signingInfo");
                return Ok(Vec::new());
            }

            let signers = env
                .call_method(
                    &signing_info,
                    "getApkContentsSigners",
                    "()[Landroid/content/pm/Signature;",
                    &[],
                )?
                .l()?;
            if signers.is_null() {
                return Ok(Vec::new());
            }

            let signers: JObjectArray = signers.into();
            let length = env.get_array_length(&signers)?;
            let mut certificates = Vec::with_capacity(length as usize);
            for i in 0..length {
                let signature = env.get_object_array_element(&signers, i)?;
                let encoded = env
                    .call_method(&signature, "toByteArray", "()[B", &[])?
                    .l()?;
                let encoded: JByteArray = encoded.into();
                certificates.push(env.convert_byte_array(encoded)?);
            }

            debug!(signer_count = certificates.len(), "Read APK signers");
            Ok(certificates)
        })
    }

    /// Whether the system-wide developer options toggle is on.
    pub fn developer_settings_enabled(&self) -> Result<bool, KeyringError> {
        self.with_env(|env, context| {
            let resolver = env
                .call_method(
                    context,
                    "getContentResolver",
                    "()Landroid/content/ContentResolver;",
                    &[],
                )?
                .l()?;
            let name = env.new_string(DEVELOPMENT_SETTINGS_ENABLED)?;

            let value = env
                .call_static_method(
                    "android/provider/Settings$Global",
                    "getInt",
                    "(Landroid/content/ContentResolver;Ljava/lang/String;I)I",
                    &[
                        JValue::Object(&resolver),
                        JValue::Object(&name),
                        JValue::Int(0),
                    ],
                )?
                .i()?;

            Ok(value != 0)
        })
    }
}

/// Identity provider reading the installed package's signing certificates.
pub struct PackageSignatureProvider {
    context: Arc<AndroidContext>,
    policy: SignerPolicy,
}

impl PackageSignatureProvider {
    /// Create a provider over the given context.
    pub fn new(context: Arc<AndroidContext>, policy: SignerPolicy) -> Self {
        Self { context, policy }
    }
}

impl AppIdentityProvider for PackageSignatureProvider {
    fn app_identity(&self) -> Option<AppIdentity> {
        match self.context.signing_certificates() {
            Ok(signers) => identity_from_signers(&signers, self.policy),
            Err(e) => {
                warn!("Signing certificates unavailable: {}", e);
                None
            },
        }
    }
}
