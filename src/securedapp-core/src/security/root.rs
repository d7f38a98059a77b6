//! Root detection.
//!
//! Checks the filesystem and system properties for the usual marks of a
//! rooted Android device:
//! - `su` binaries in system and vendor paths
//! - Magisk installation artifacts
//! - Data directories of root management apps
//! - Dangerous build properties (`ro.debuggable=1`, `ro.secure=0`, test-keys)
//! - System partitions mounted read-write
//!
//! All paths are resolved under a configurable root so the detector can be
//! pointed at a synthetic tree.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::debug;

use super::platform::PlatformSignalProvider;

/// Root-detection capability.
pub trait RootDetector: Send + Sync {
    /// Whether root indicators were found.
    fn is_rooted(&self) -> bool;
}

const SU_PATHS: &[&str] = &[
    "/data/local/su",
    "/data/local/bin/su",
    "/data/local/xbin/su",
    "/sbin/su",
    "/su/bin/su",
    "/system/bin/su",
    "/system/bin/.ext/su",
    "/system/bin/failsafe/su",
    "/system/sd/xbin/su",
    "/system/usr/we-need-root/su",
    "/system/xbin/su",
    "/system/app/Superuser.apk",
    "/cache/su",
    "/data/su",
    "/dev/su",
    "/product/bin/su",
    "/system_ext/bin/su",
    "/odm/bin/su",
    "/vendor/bin/su",
    "/vendor/xbin/su",
];

const MAGISK_PATHS: &[&str] = &[
    "/data/adb/magisk",
    "/sbin/.magisk",
    "/sbin/magisk",
    "/system/bin/magisk",
    "/cache/.disable_magisk",
    "/dev/.magisk.unblock",
    "/data/magisk/magisk.db",
];

const ROOT_APP_PACKAGES: &[&str] = &[
    "com.topjohnwu.magisk",
    "eu.chainfire.supersu",
    "com.noshufou.android.su",
    "com.noshufou.android.su.elite",
    "com.koushikdutta.superuser",
    "com.thirdparty.superuser",
    "com.yellowes.su",
    "com.kingroot.kinguser",
    "com.kingo.root",
    "com.smedialink.oneclickroot",
    "com.zhiqupk.root.global",
    "com.alephzain.framaroot",
];

/// Properties whose value marks an insecure build.
const DANGEROUS_PROPS: &[(&str, &str)] = &[("ro.debuggable", "1"), ("ro.secure", "0")];

/// Mount points that are read-only on a stock device.
const READ_ONLY_MOUNTS: &[&str] = &[
    "/system",
    "/system/bin",
    "/system/sbin",
    "/system/xbin",
    "/vendor/bin",
    "/sbin",
    "/etc",
];

/// Filesystem and property based root detector.
pub struct FileSystemRootDetector {
    root: PathBuf,
    properties: Option<Arc<dyn PlatformSignalProvider>>,
}

impl FileSystemRootDetector {
    /// Detector over the real filesystem, without property checks.
    pub fn new() -> Self {
        Self::with_root("/")
    }

    /// Detector resolving every path under `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            properties: None,
        }
    }

    /// Also check system properties through `signals`.
    pub fn with_properties(mut self, signals: Arc<dyn PlatformSignalProvider>) -> Self {
        self.properties = Some(signals);
        self
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }

    fn first_existing(&self, paths: &[&str]) -> Option<PathBuf> {
        paths
            .iter()
            .map(|p| self.resolve(p))
            .find(|p| p.exists())
    }

    /// `su` binary present.
    pub fn has_su_binary(&self) -> bool {
        if let Some(path) = self.first_existing(SU_PATHS) {
            debug!(path = %path.display(), "su binary found");
            return true;
        }
        false
    }

    /// Magisk artifacts present.
    pub fn has_magisk(&self) -> bool {
        if let Some(path) = self.first_existing(MAGISK_PATHS) {
            debug!(path = %path.display(), "Magisk artifact found");
            return true;
        }
        false
    }

    /// A root management app is installed.
    pub fn has_root_app(&self) -> bool {
        let data = self.resolve("/data/data");
        for package in ROOT_APP_PACKAGES {
            if data.join(package).exists() {
                debug!(package, "Root management app found");
                return true;
            }
        }
        false
    }

    /// Build properties mark a debug or test-signed build.
    pub fn has_dangerous_props(&self) -> bool {
        let Some(signals) = self.properties.as_ref() else {
            return false;
        };

        for (name, bad) in DANGEROUS_PROPS {
            if signals.system_property(name).as_deref().map(str::trim) == Some(*bad) {
                debug!(property = name, "Dangerous property value");
                return true;
            }
        }

        let tags = signals.system_property("ro.build.tags").unwrap_or_default();
        if tags.contains("test-keys") {
            debug!("Build signed with test-keys");
            return true;
        }
        false
    }

    /// A normally read-only partition is mounted read-write.
    pub fn has_rw_system_mount(&self) -> bool {
        let mounts = match std::fs::read_to_string(self.resolve("/proc/mounts")) {
            Ok(m) => m,
            Err(e) => {
                debug!("Mount table unreadable: {}", e);
                return false;
            },
        };
        find_rw_system_mount(&mounts).is_some()
    }
}

impl Default for FileSystemRootDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl RootDetector for FileSystemRootDetector {
    fn is_rooted(&self) -> bool {
        self.has_su_binary()
            || self.has_magisk()
            || self.has_root_app()
            || self.has_dangerous_props()
            || self.has_rw_system_mount()
    }
}

/// Find a read-only system mount point that is mounted `rw`.
fn find_rw_system_mount(mounts: &str) -> Option<&str> {
    for line in mounts.lines() {
        let mut fields = line.split_whitespace();
        let (Some(_device), Some(mount_point), Some(_fs), Some(options)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            continue;
        };

        if READ_ONLY_MOUNTS.contains(&mount_point) && options.split(',').any(|o| o == "rw") {
            debug!(mount_point, "System path mounted read-write");
            return Some(mount_point);
        }
    }
    None
}
