//! Test doubles shared across the integration tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use securedapp_core::security::{BuildInfo, PlatformSignalProvider, RootDetector};
use securedapp_core::{Clock, GuardError, RequestEnvelope, Transport, TransportResponse};
use securedapp_keyring::{AppIdentity, AppIdentityProvider, KeyMaterialProvider, SecretKeyMaterial};

// =============================================================================
// Platform probes
// =============================================================================

/// Signal provider with settable values and call counters.
#[derive(Default)]
pub struct RecordingSignals {
    pub developer_mode: AtomicBool,
    pub build: Mutex<BuildInfo>,
    pub properties: Mutex<HashMap<String, String>>,
    pub developer_calls: AtomicUsize,
    pub build_calls: AtomicUsize,
}

impl RecordingSignals {
    pub fn clean() -> Arc<Self> {
        let signals = Self::default();
        *signals.build.lock().unwrap() = BuildInfo {
            fingerprint: "google/oriole/oriole:14/UQ1A/11269751:user/release-keys".into(),
            model: "Pixel 6".into(),
            manufacturer: "Google".into(),
            brand: "google".into(),
            device: "oriole".into(),
            product: "oriole".into(),
        };
        Arc::new(signals)
    }

    pub fn set_developer_mode(&self, on: bool) {
        self.developer_mode.store(on, Ordering::SeqCst);
    }

    pub fn set_build(&self, build: BuildInfo) {
        *self.build.lock().unwrap() = build;
    }

    pub fn set_property(&self, name: &str, value: &str) {
        self.properties
            .lock()
            .unwrap()
            .insert(name.to_string(), value.to_string());
    }
}

impl PlatformSignalProvider for RecordingSignals {
    fn developer_mode_enabled(&self) -> bool {
        self.developer_calls.fetch_add(1, Ordering::SeqCst);
        self.developer_mode.load(Ordering::SeqCst)
    }

    fn build_info(&self) -> BuildInfo {
        self.build_calls.fetch_add(1, Ordering::SeqCst);
        self.build.lock().unwrap().clone()
    }

    fn system_property(&self, name: &str) -> Option<String> {
        self.properties.lock().unwrap().get(name).cloned()
    }
}

/// Root detector with a settable answer and a call counter.
#[derive(Default)]
pub struct RecordingRoot {
    pub rooted: AtomicBool,
    pub calls: AtomicUsize,
}

impl RecordingRoot {
    pub fn new(rooted: bool) -> Arc<Self> {
        let detector = Self::default();
        detector.rooted.store(rooted, Ordering::SeqCst);
        Arc::new(detector)
    }

    pub fn set_rooted(&self, rooted: bool) {
        self.rooted.store(rooted, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RootDetector for RecordingRoot {
    fn is_rooted(&self) -> bool {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.rooted.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Credentials
// =============================================================================

pub struct StaticIdentity(pub Option<&'static str>);

impl AppIdentityProvider for StaticIdentity {
    fn app_identity(&self) -> Option<AppIdentity> {
        self.0.map(AppIdentity::new)
    }
}

/// Key provider that counts how often it is asked.
pub struct CountingKey {
    pub secret: Option<&'static str>,
    pub calls: AtomicUsize,
}

impl CountingKey {
    pub fn new(secret: Option<&'static str>) -> Arc<Self> {
        Arc::new(Self {
            secret,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl KeyMaterialProvider for CountingKey {
    fn secret_key_material(&self) -> Option<SecretKeyMaterial> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.secret.map(|s| SecretKeyMaterial::new(s.to_string()))
    }
}

/// Clock frozen at a settable instant.
pub struct FixedClock(pub AtomicU64);

impl FixedClock {
    pub fn at(millis: u64) -> Arc<Self> {
        Arc::new(Self(AtomicU64::new(millis)))
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

// =============================================================================
// Transport
// =============================================================================

/// Transport returning a canned answer and recording what it was sent.
pub struct MockTransport {
    pub answer: Mutex<Result<TransportResponse, String>>,
    pub sent: Mutex<Vec<RequestEnvelope>>,
}

impl MockTransport {
    pub fn responding(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Mutex::new(Ok(TransportResponse {
                status,
                body: body.as_bytes().to_vec(),
            })),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            answer: Mutex::new(Err(message.to_string())),
            sent: Mutex::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<RequestEnvelope> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: RequestEnvelope) -> Result<TransportResponse, GuardError> {
        self.sent.lock().unwrap().push(request);
        self.answer
            .lock()
            .unwrap()
            .clone()
            .map_err(GuardError::transport)
    }
}

pub const SENSITIVE_BODY: &str =
    r#"{"message":"Access granted","data":{"title":"Vault","description":"Top secret"}}"#;
