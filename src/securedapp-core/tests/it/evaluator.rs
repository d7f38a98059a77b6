//! Environment trust evaluator behavior.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use securedapp_core::security::{BuildInfo, EnvironmentTrustEvaluator, FileSystemRootDetector};
use securedapp_core::{InsecureReason, TrustVerdict};

use crate::support::{RecordingRoot, RecordingSignals};

fn evaluator(signals: &Arc<RecordingSignals>, root: &Arc<RecordingRoot>) -> EnvironmentTrustEvaluator {
    EnvironmentTrustEvaluator::new(signals.clone(), root.clone())
}

#[test]
fn all_negative_is_secure() {
    let signals = RecordingSignals::clean();
    let root = RecordingRoot::new(false);
    assert_eq!(evaluator(&signals, &root).evaluate(), TrustVerdict::Secure);
    assert_eq!(root.calls(), 1);
}

#[test]
fn developer_mode_alone_is_insecure() {
    let signals = RecordingSignals::clean();
    signals.set_developer_mode(true);
    let root = RecordingRoot::new(false);
    assert_eq!(
        evaluator(&signals, &root).evaluate(),
        TrustVerdict::Insecure(InsecureReason::DeveloperMode)
    );
}

#[test]
fn emulator_build_alone_is_insecure() {
    let signals = RecordingSignals::clean();
    let base = signals.build.lock().unwrap().clone();
    signals.set_build(BuildInfo {
        model: "Android SDK built for x86_64".into(),
        ..base
    });
    let root = RecordingRoot::new(false);
    assert_eq!(
        evaluator(&signals, &root).evaluate(),
        TrustVerdict::Insecure(InsecureReason::Emulator)
    );
}

#[test]
fn qemu_kernel_alone_is_insecure() {
    let signals = RecordingSignals::clean();
    signals.set_property("ro.kernel.qemu", "1");
    let root = RecordingRoot::new(false);
    assert_eq!(
        evaluator(&signals, &root).evaluate(),
        TrustVerdict::Insecure(InsecureReason::Emulator)
    );
}

#[test]
fn qemu_kernel_zero_is_not_emulator() {
    let signals = RecordingSignals::clean();
    signals.set_property("ro.kernel.qemu", "0");
    let root = RecordingRoot::new(false);
    assert!(!evaluator(&signals, &root).is_emulator());
}

#[test]
fn root_alone_is_insecure() {
    let signals = RecordingSignals::clean();
    let root = RecordingRoot::new(true);
    assert_eq!(
        evaluator(&signals, &root).evaluate(),
        TrustVerdict::Insecure(InsecureReason::Rooted)
    );
}

#[test]
fn developer_mode_short_circuits_later_checks() {
    let signals = RecordingSignals::clean();
    signals.set_developer_mode(true);
    signals.set_property("ro.kernel.qemu", "1");
    let root = RecordingRoot::new(true);

    let verdict = evaluator(&signals, &root).evaluate();

    assert_eq!(verdict, TrustVerdict::Insecure(InsecureReason::DeveloperMode));
    assert_eq!(root.calls(), 0);
    assert_eq!(signals.build_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn emulator_short_circuits_root_check() {
    let signals = RecordingSignals::clean();
    signals.set_property("ro.kernel.qemu", "1");
    let root = RecordingRoot::new(true);

    let verdict = evaluator(&signals, &root).evaluate();

    assert_eq!(verdict, TrustVerdict::Insecure(InsecureReason::Emulator));
    assert_eq!(root.calls(), 0);
    assert_eq!(signals.developer_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn evaluation_never_returns_unknown() {
    let signals = RecordingSignals::clean();
    let root = RecordingRoot::new(false);
    let evaluator = evaluator(&signals, &root);
    for rooted in [false, true] {
        root.set_rooted(rooted);
        assert!(evaluator.evaluate().is_known());
    }
}

#[test]
fn filesystem_detector_composes_with_evaluator() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir_all(dir.path().join("sbin")).unwrap();
    std::fs::write(dir.path().join("sbin/su"), b"").unwrap();

    let signals = RecordingSignals::clean();
    let detector = FileSystemRootDetector::with_root(dir.path()).with_properties(signals.clone());
    let evaluator = EnvironmentTrustEvaluator::new(signals.clone(), Arc::new(detector));

    assert_eq!(
        evaluator.evaluate(),
        TrustVerdict::Insecure(InsecureReason::Rooted)
    );
}

#[test]
fn test_keys_property_marks_root() {
    let dir = tempfile::tempdir().unwrap();
    let signals = RecordingSignals::clean();
    signals.set_property("ro.build.tags", "test-keys");
    let detector = FileSystemRootDetector::with_root(dir.path()).with_properties(signals.clone());
    let evaluator = EnvironmentTrustEvaluator::new(signals.clone(), Arc::new(detector));

    assert_eq!(
        evaluator.evaluate(),
        TrustVerdict::Insecure(InsecureReason::Rooted)
    );
}
