//! Platform signal probes.
//!
//! Probes report raw signals and never interpret them; interpretation lives
//! in the emulator heuristics below and in the evaluator. A probe that cannot
//! complete reports the "not detected" value.
//!
//! ## Design Philosophy
//!
//! Each probe is fail-open on its own. The evaluator combining them is
//! fail-closed: any single positive makes the environment untrusted.

#[cfg(target_os = "android")]
use std::sync::Arc;

#[cfg(target_os = "android")]
use securedapp_keyring::platform::AndroidContext;
#[cfg(target_os = "android")]
use tracing::debug;

/// Kernel property set to `1` when running under QEMU.
pub const QEMU_KERNEL_PROPERTY: &str = "ro.kernel.qemu";

/// Device build metadata, as reported by `android.os.Build`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildInfo {
    /// `Build.FINGERPRINT` (`ro.build.fingerprint`).
    pub fingerprint: String,
    /// `Build.MODEL` (`ro.product.model`).
    pub model: String,
    /// `Build.MANUFACTURER` (`ro.product.manufacturer`).
    pub manufacturer: String,
    /// `Build.BRAND` (`ro.product.brand`).
    pub brand: String,
    /// `Build.DEVICE` (`ro.product.device`).
    pub device: String,
    /// `Build.PRODUCT` (`ro.product.name`).
    pub product: String,
}

impl BuildInfo {
    /// Populate from a system property lookup. Missing properties are empty.
    pub fn from_properties(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).unwrap_or_default();
        Self {
            fingerprint: get("ro.build.fingerprint"),
            model: get("ro.product.model"),
            manufacturer: get("ro.product.manufacturer"),
            brand: get("ro.product.brand"),
            device: get("ro.product.device"),
            product: get("ro.product.name"),
        }
    }
}

/// Source of low-level platform signals.
pub trait PlatformSignalProvider: Send + Sync {
    /// Whether the developer options toggle is on.
    fn developer_mode_enabled(&self) -> bool;

    /// Device build metadata.
    fn build_info(&self) -> BuildInfo;

    /// Read a system property, `None` if unset or unreadable.
    fn system_property(&self, name: &str) -> Option<String>;
}

/// Whether the build metadata looks like a stock emulator image.
///
/// Comparisons are case-sensitive.
pub fn matches_emulator_build(info: &BuildInfo) -> bool {
    info.fingerprint.starts_with("generic")
        || info.fingerprint.starts_with("unknown")
        || info.model.contains("google_sdk")
        || info.model.contains("Emulator")
        || info.model.contains("Android SDK built for x86")
        || info.manufacturer.contains("Genymotion")
        || (info.brand.starts_with("generic") && info.device.starts_with("generic"))
        || info.product == "google_sdk"
}

/// Whether the kernel reports running under QEMU.
pub fn is_qemu_kernel(signals: &dyn PlatformSignalProvider) -> bool {
    signals
        .system_property(QEMU_KERNEL_PROPERTY)
        .map(|v| v.trim() == "1")
        .unwrap_or(false)
}

// =============================================================================
// System provider
// =============================================================================

/// Signal provider for the current process.
///
/// On Android, properties are read natively and the developer options flag
/// through JNI when a context is attached. Elsewhere every probe reports
/// "not detected".
#[derive(Default)]
pub struct SystemSignalProvider {
    #[cfg(target_os = "android")]
    context: Option<Arc<AndroidContext>>,
}

impl SystemSignalProvider {
    /// Provider without an app context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Provider that can query app-level settings through `context`.
    #[cfg(target_os = "android")]
    pub fn with_context(context: Arc<AndroidContext>) -> Self {
        Self {
            context: Some(context),
        }
    }
}

impl PlatformSignalProvider for SystemSignalProvider {
    fn developer_mode_enabled(&self) -> bool {
        #[cfg(target_os = "android")]
        {
            let Some(context) = self.context.as_ref() else {
                debug!("Developer mode probe skipped: no app context");
                return false;
            };
            match context.developer_settings_enabled() {
                Ok(enabled) => enabled,
                Err(e) => {
                    debug!("Developer mode probe inconclusive: {}", e);
                    false
                },
            }
        }

        #[cfg(not(target_os = "android"))]
        {
            false
        }
    }

    fn build_info(&self) -> BuildInfo {
        BuildInfo::from_properties(|name| self.system_property(name))
    }

    fn system_property(&self, name: &str) -> Option<String> {
        read_system_property(name)
    }
}

// =============================================================================
// Android property access
// =============================================================================

/// `PROP_VALUE_MAX` from `<sys/system_properties.h>`.
#[cfg(target_os = "android")]
const PROP_VALUE_MAX: usize = 92;

#[cfg(target_os = "android")]
fn read_system_property(name: &str) -> Option<String> {
    let name = std::ffi::CString::new(name).ok()?;
    let mut value = [0u8; PROP_VALUE_MAX];

    // Safety: name is NUL-terminated and value has PROP_VALUE_MAX bytes,
    // the documented maximum the call writes.
    let len = unsafe {
        libc::__system_property_get(name.as_ptr(), value.as_mut_ptr() as *mut libc::c_char)
    };
    if len <= 0 {
        return None;
    }

    let len = (len as usize).min(PROP_VALUE_MAX);
    Some(String::from_utf8_lossy(&value[..len]).into_owned())
}

#[cfg(not(target_os = "android"))]
fn read_system_property(_name: &str) -> Option<String> {
    None
}
