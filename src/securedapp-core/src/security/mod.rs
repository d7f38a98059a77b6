//! Environment trust evaluation.
//!
//! Combines the platform probes and the root detector into a single
//! [`TrustVerdict`]. The checks run in a fixed order and stop at the first
//! positive:
//!
//! 1. Developer mode
//! 2. Emulator (build metadata or QEMU kernel)
//! 3. Root
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use securedapp_core::security::{
//!     EnvironmentTrustEvaluator, FileSystemRootDetector, SystemSignalProvider,
//! };
//!
//! let evaluator = EnvironmentTrustEvaluator::new(
//!     Arc::new(SystemSignalProvider::new()),
//!     Arc::new(FileSystemRootDetector::new()),
//! );
//! if !evaluator.evaluate().is_secure() {
//!     // Block sensitive operations
//! }
//! ```

mod platform;
mod root;

use std::sync::Arc;

use tracing::{info, warn};

use crate::types::{InsecureReason, TrustVerdict};

pub use platform::{
    is_qemu_kernel, matches_emulator_build, BuildInfo, PlatformSignalProvider,
    SystemSignalProvider, QEMU_KERNEL_PROPERTY,
};
pub use root::{FileSystemRootDetector, RootDetector};

/// Produces a trust verdict from the platform probes and root detector.
#[derive(Clone)]
pub struct EnvironmentTrustEvaluator {
    signals: Arc<dyn PlatformSignalProvider>,
    root: Arc<dyn RootDetector>,
}

impl EnvironmentTrustEvaluator {
    /// Create an evaluator over the given probes.
    pub fn new(signals: Arc<dyn PlatformSignalProvider>, root: Arc<dyn RootDetector>) -> Self {
        Self { signals, root }
    }

    /// Evaluator for the current process.
    ///
    /// The root detector also checks system properties through the same
    /// signal provider.
    pub fn for_system(signals: Arc<dyn PlatformSignalProvider>) -> Self {
        let root = FileSystemRootDetector::new().with_properties(Arc::clone(&signals));
        Self::new(signals, Arc::new(root))
    }

    /// Whether the device looks like an emulator.
    pub fn is_emulator(&self) -> bool {
        matches_emulator_build(&self.signals.build_info()) || is_qemu_kernel(self.signals.as_ref())
    }

    /// Run all checks and return the verdict.
    ///
    /// Never returns [`TrustVerdict::Unknown`]. Later checks are skipped once
    /// one reports positive.
    pub fn evaluate(&self) -> TrustVerdict {
        let reason = if self.signals.developer_mode_enabled() {
            Some(InsecureReason::DeveloperMode)
        } else if self.is_emulator() {
            Some(InsecureReason::Emulator)
        } else if self.root.is_rooted() {
            Some(InsecureReason::Rooted)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                warn!(%reason, "Environment is not trusted");
                TrustVerdict::Insecure(reason)
            },
            None => {
                info!("Environment trusted");
                TrustVerdict::Secure
            },
        }
    }
}
