//! Request signing.
//!
//! Every outbound request carries three headers that let the server check it
//! came from a genuine build and was not replayed:
//!
//! | Header | Value |
//! |--------|-------|
//! | `X-App-Signature` | App identity digest, or empty if unavailable |
//! | `X-Nonce` | Decimal millisecond timestamp |
//! | `X-Payload-Signature` | base64 HMAC-SHA256 over `"<identity>.<nonce>"` |
//!
//! Only the identity and nonce are signed. The method, path and body are not
//! covered by the signature.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::Method;
use securedapp_keyring::{AppIdentity, AppIdentityProvider, KeyMaterialProvider, SecretKeyMaterial};
use tracing::{debug, error, warn};

use crate::error::GuardError;

/// Header carrying the app identity digest.
pub const HEADER_APP_SIGNATURE: &str = "X-App-Signature";
/// Header carrying the nonce.
pub const HEADER_NONCE: &str = "X-Nonce";
/// Header carrying the HMAC over identity and nonce.
pub const HEADER_PAYLOAD_SIGNATURE: &str = "X-Payload-Signature";

// =============================================================================
// Nonce clock
// =============================================================================

/// Wall-clock source in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Current time in milliseconds.
    fn now_millis(&self) -> u64;
}

/// System wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Issues strictly increasing nonces from a wall clock.
///
/// If the clock has not moved past the last issued value (two requests in
/// the same millisecond, or the clock stepped back), the previous value plus
/// one is issued instead.
pub struct NonceSource {
    clock: Arc<dyn Clock>,
    last: AtomicU64,
}

impl NonceSource {
    /// Nonce source over the given clock.
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last: AtomicU64::new(0),
        }
    }

    /// Next nonce.
    pub fn next(&self) -> u64 {
        let now = self.clock.now_millis();
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(previous.saturating_add(1));
            match self.last.compare_exchange_weak(
                previous,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return candidate,
                Err(actual) => previous = actual,
            }
        }
    }
}

impl Default for NonceSource {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock))
    }
}

// =============================================================================
// Signing context
// =============================================================================

/// Everything derived for one signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    /// App identity, empty if unavailable.
    pub app_identity: String,
    /// Decimal nonce.
    pub nonce: String,
    /// `app_identity + "." + nonce`.
    pub signing_input: String,
    /// base64 HMAC-SHA256 of `signing_input`.
    pub signature: String,
}

impl SigningContext {
    /// Derive the context for fixed inputs.
    pub fn build(
        identity: Option<&AppIdentity>,
        key: &SecretKeyMaterial,
        nonce: u64,
    ) -> Result<Self, GuardError> {
        let app_identity = identity.map(|i| i.as_str().to_string()).unwrap_or_default();
        let nonce = nonce.to_string();
        let signing_input = format!("{}.{}", app_identity, nonce);
        let signature = securedapp_crypto::sign(&signing_input, key.as_bytes())?;
        Ok(Self {
            app_identity,
            nonce,
            signing_input,
            signature,
        })
    }

    /// The three signing headers.
    pub fn headers(&self) -> [(&'static str, &str); 3] {
        [
            (HEADER_APP_SIGNATURE, self.app_identity.as_str()),
            (HEADER_NONCE, self.nonce.as_str()),
            (HEADER_PAYLOAD_SIGNATURE, self.signature.as_str()),
        ]
    }
}

// =============================================================================
// Request envelope
// =============================================================================

/// Outbound request as seen by the interceptor and transport.
#[derive(Debug, Clone)]
pub struct RequestEnvelope {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL.
    pub url: String,
    /// Header map.
    pub headers: BTreeMap<String, String>,
}

impl RequestEnvelope {
    /// Request with no headers.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
        }
    }

    /// GET request with no headers.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Set a header, replacing any previous value.
    pub fn set_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.insert(name.into(), value.into());
    }

    /// Look up a header.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

// =============================================================================
// Interceptor
// =============================================================================

/// Signs outbound requests.
///
/// Credentials are fetched fresh for every request; nothing is cached.
pub struct SigningInterceptor {
    identity: Arc<dyn AppIdentityProvider>,
    keys: Arc<dyn KeyMaterialProvider>,
    nonces: NonceSource,
}

impl SigningInterceptor {
    /// Interceptor over the given providers, using the system clock.
    pub fn new(identity: Arc<dyn AppIdentityProvider>, keys: Arc<dyn KeyMaterialProvider>) -> Self {
        Self::with_clock(identity, keys, Arc::new(SystemClock))
    }

    /// Interceptor with an explicit clock.
    pub fn with_clock(
        identity: Arc<dyn AppIdentityProvider>,
        keys: Arc<dyn KeyMaterialProvider>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            identity,
            keys,
            nonces: NonceSource::new(clock),
        }
    }

    /// Build a fresh signing context.
    ///
    /// Fails with [`GuardError::CredentialsUnavailable`] when both credentials
    /// are missing and [`GuardError::KeyMaterialUnavailable`] when only the key
    /// is. A missing identity alone is signed as the empty string.
    pub fn signing_context(&self) -> Result<SigningContext, GuardError> {
        let identity = self.identity.app_identity();
        let key = self.keys.secret_key_material();

        let key = match (identity.as_ref(), key) {
            (_, Some(key)) => key,
            (None, None) => {
                error!("Request aborted: no identity and no key material");
                return Err(GuardError::CredentialsUnavailable);
            },
            (Some(_), None) => {
                error!("Request aborted: key material unavailable");
                return Err(GuardError::KeyMaterialUnavailable);
            },
        };

        if identity.is_none() {
            warn!("App identity unavailable, signing with empty identity");
        }

        let nonce = self.nonces.next();
        let context = SigningContext::build(identity.as_ref(), &key, nonce)?;
        debug!(nonce = %context.nonce, "Request signed");
        Ok(context)
    }

    /// Attach the signing headers to `request`.
    pub fn intercept(&self, mut request: RequestEnvelope) -> Result<RequestEnvelope, GuardError> {
        let context = self.signing_context()?;
        for (name, value) in context.headers() {
            request.set_header(name, value);
        }
        Ok(request)
    }

    /// The signing headers for a fresh context, as an owned map.
    pub fn signed_headers(&self) -> Result<BTreeMap<String, String>, GuardError> {
        let context = self.signing_context()?;
        Ok(context
            .headers()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect())
    }
}
