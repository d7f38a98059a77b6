//! Trust gate state machine.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use securedapp_core::security::{EnvironmentTrustEvaluator, RootDetector};
use tokio::sync::Notify;
use securedapp_core::{GateAction, GuardError, InsecureReason, TrustGate, TrustVerdict};

use crate::support::{RecordingRoot, RecordingSignals};

fn gate(signals: &Arc<RecordingSignals>, root: &Arc<RecordingRoot>) -> TrustGate {
    let evaluator = EnvironmentTrustEvaluator::new(signals.clone(), root.clone());
    TrustGate::new(Arc::new(evaluator))
}

#[tokio::test]
async fn starts_unknown_and_blocks() {
    let gate = gate(&RecordingSignals::clean(), &RecordingRoot::new(false));
    assert_eq!(gate.current(), TrustVerdict::Unknown);
    assert!(matches!(
        gate.ensure_trusted(),
        Err(GuardError::EnvironmentUntrusted { .. })
    ));
    assert!(gate.available_actions().is_empty());
}

#[tokio::test]
async fn secure_then_insecure_on_resume() {
    let signals = RecordingSignals::clean();
    let root = RecordingRoot::new(false);
    let gate = gate(&signals, &root);
    let mut observer = gate.subscribe();

    assert_eq!(gate.on_session_start().await, TrustVerdict::Secure);
    assert!(observer.has_changed().unwrap());
    assert_eq!(*observer.borrow_and_update(), TrustVerdict::Secure);
    assert!(gate.ensure_trusted().is_ok());
    assert_eq!(gate.available_actions(), vec![GateAction::FetchSensitiveData]);

    root.set_rooted(true);
    let verdict = gate.on_foreground_resumed().await;

    assert_eq!(verdict, TrustVerdict::Insecure(InsecureReason::Rooted));
    assert_eq!(*observer.borrow_and_update(), verdict);
    assert!(gate.ensure_trusted().is_err());
    assert_eq!(gate.available_actions(), vec![GateAction::TerminateSession]);
}

#[tokio::test]
async fn verdict_is_sticky_between_triggers() {
    let signals = RecordingSignals::clean();
    let root = RecordingRoot::new(false);
    let gate = gate(&signals, &root);

    gate.on_session_start().await;
    root.set_rooted(true);

    // No trigger has fired since the environment changed.
    assert_eq!(gate.current(), TrustVerdict::Secure);
    assert_eq!(root.calls(), 1);
}

#[tokio::test]
async fn insecure_can_recover_on_resume() {
    let signals = RecordingSignals::clean();
    signals.set_developer_mode(true);
    let root = RecordingRoot::new(false);
    let gate = gate(&signals, &root);

    assert_eq!(
        gate.on_session_start().await,
        TrustVerdict::Insecure(InsecureReason::DeveloperMode)
    );

    signals.set_developer_mode(false);
    assert_eq!(gate.on_foreground_resumed().await, TrustVerdict::Secure);
}

#[tokio::test]
async fn every_observer_sees_the_verdict() {
    let gate = gate(&RecordingSignals::clean(), &RecordingRoot::new(true));
    let first = gate.subscribe();
    let second = gate.subscribe();

    gate.on_session_start().await;

    let expected = TrustVerdict::Insecure(InsecureReason::Rooted);
    assert_eq!(*first.borrow(), expected);
    assert_eq!(*second.borrow(), expected);
}

/// Root detector whose first call stalls until released, then reports root.
/// Later calls report a clean device.
struct StalledRoot {
    entered: Arc<Notify>,
    release: Mutex<mpsc::Receiver<()>>,
    calls: AtomicUsize,
}

impl RootDetector for StalledRoot {
    fn is_rooted(&self) -> bool {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            self.entered.notify_one();
            let _ = self.release.lock().unwrap().recv();
            return true;
        }
        false
    }
}

#[tokio::test]
async fn overlapping_triggers_publish_in_trigger_order() {
    let entered = Arc::new(Notify::new());
    let (release, stalled) = mpsc::channel();
    let root = Arc::new(StalledRoot {
        entered: Arc::clone(&entered),
        release: Mutex::new(stalled),
        calls: AtomicUsize::new(0),
    });
    let evaluator = EnvironmentTrustEvaluator::new(RecordingSignals::clean(), root);
    let gate = Arc::new(TrustGate::new(Arc::new(evaluator)));

    let first = tokio::spawn({
        let gate = Arc::clone(&gate);
        async move { gate.on_session_start().await }
    });
    entered.notified().await;

    let second = tokio::spawn({
        let gate = Arc::clone(&gate);
        async move { gate.on_foreground_resumed().await }
    });
    // Give the resume trigger every chance to overtake the stalled one.
    tokio::time::sleep(Duration::from_millis(50)).await;
    release.send(()).unwrap();

    assert_eq!(
        first.await.unwrap(),
        TrustVerdict::Insecure(InsecureReason::Rooted)
    );
    assert_eq!(second.await.unwrap(), TrustVerdict::Secure);
    assert_eq!(gate.current(), TrustVerdict::Secure);
}
