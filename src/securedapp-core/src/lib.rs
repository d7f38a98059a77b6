//! # securedapp-core
//!
//! Environment trust evaluation and request signing for the SecuredApp
//! mobile client.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                       SecureSession                        │
//! │                                                            │
//! │  ┌────────────────────────┐   ┌──────────────────────────┐ │
//! │  │       TrustGate        │   │   SensitiveDataClient    │ │
//! │  │  Unknown/Secure/       │   │ ensure_trusted() first   │ │
//! │  │  Insecure (watch)      │   │  ┌────────────────────┐  │ │
//! │  └───────────┬────────────┘   │  │ SigningInterceptor │  │ │
//! │              │                │  │ identity + key +   │  │ │
//! │              ▼                │  │ nonce -> headers   │  │ │
//! │  ┌────────────────────────┐   │  └─────────┬──────────┘  │ │
//! │  │ EnvironmentTrust-      │   │            ▼             │ │
//! │  │ Evaluator              │   │  ┌────────────────────┐  │ │
//! │  │ dev mode > emulator >  │   │  │     Transport      │  │ │
//! │  │ root                   │   │  └────────────────────┘  │ │
//! │  └────────────────────────┘   └──────────────────────────┘ │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Security Properties
//!
//! - **Fail-closed**: any positive probe makes the environment untrusted,
//!   and an unevaluated environment is not trusted either
//! - **No signing without a key**: a missing key aborts the request before
//!   anything is sent
//! - **Fresh credentials**: key material is fetched per request and wiped
//!   after use

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::pedantic)] // Too strict for production code
#![allow(clippy::doc_markdown)] // Allow product names without backticks
#![allow(clippy::missing_errors_doc)] // Error documentation not required
#![allow(clippy::missing_panics_doc)] // Panic documentation not required
#![allow(clippy::module_name_repetitions)] // Allow Type in module::Type
#![allow(clippy::must_use_candidate)] // Not all functions need must_use

pub mod client;
pub mod config;
pub mod error;
pub mod gate;
pub mod interceptor;
pub mod security;
pub mod session;
pub mod transport;
pub mod types;

pub use client::SensitiveDataClient;
pub use config::GuardConfig;
pub use error::GuardError;
pub use gate::TrustGate;
pub use interceptor::{
    Clock, NonceSource, RequestEnvelope, SigningContext, SigningInterceptor, SystemClock,
    HEADER_APP_SIGNATURE, HEADER_NONCE, HEADER_PAYLOAD_SIGNATURE,
};
pub use security::EnvironmentTrustEvaluator;
pub use session::SecureSession;
pub use transport::{HttpsTransport, Transport, TransportResponse};
pub use types::{DataState, GateAction, InsecureReason, SecureData, SensitiveData, TrustVerdict};
