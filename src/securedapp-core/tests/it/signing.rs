//! Signing interceptor behavior.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use proptest::prelude::*;
use securedapp_core::{
    GuardError, RequestEnvelope, SigningInterceptor, HEADER_APP_SIGNATURE, HEADER_NONCE,
    HEADER_PAYLOAD_SIGNATURE,
};
use securedapp_keyring::{CertificateIdentityProvider, NativeKeyProvider};

use crate::support::{CountingKey, FixedClock, StaticIdentity};

fn interceptor(
    identity: Option<&'static str>,
    key: &Arc<CountingKey>,
    clock: &Arc<FixedClock>,
) -> SigningInterceptor {
    SigningInterceptor::with_clock(Arc::new(StaticIdentity(identity)), key.clone(), clock.clone())
}

#[test]
fn both_credentials_missing_aborts() {
    let key = CountingKey::new(None);
    let signer = interceptor(None, &key, &FixedClock::at(1000));
    let result = signer.intercept(RequestEnvelope::get("https://example.com/"));
    assert!(matches!(result, Err(GuardError::CredentialsUnavailable)));
}

#[test]
fn missing_key_with_identity_aborts() {
    let key = CountingKey::new(None);
    let signer = interceptor(Some("ABC123"), &key, &FixedClock::at(1000));
    let result = signer.signing_context();
    assert!(matches!(result, Err(GuardError::KeyMaterialUnavailable)));
    assert!(result.unwrap_err().is_fatal());
}

#[test]
fn missing_identity_signs_empty() {
    let key = CountingKey::new(Some("s3cr3t"));
    let signer = interceptor(None, &key, &FixedClock::at(1000));
    let request = signer
        .intercept(RequestEnvelope::get("https://example.com/"))
        .unwrap();
    assert_eq!(request.header(HEADER_APP_SIGNATURE), Some(""));
    assert_eq!(request.header(HEADER_NONCE), Some("1000"));
    assert_eq!(
        request.header(HEADER_PAYLOAD_SIGNATURE),
        Some("3JhTMMyNuAcx//26u/RkJuevGmKo7B/ChGUayuo93GU=")
    );
}

#[test]
fn reference_vector_through_interceptor() {
    let key = CountingKey::new(Some("s3cr3t"));
    let signer = interceptor(Some("ABC123"), &key, &FixedClock::at(1000));
    let context = signer.signing_context().unwrap();
    assert_eq!(context.signing_input, "ABC123.1000");
    assert_eq!(context.signature, "vffHOhl7hAevlXmuBqcl4TzaLdb/XOHMGMlJ/jG+xcc=");
}

#[test]
fn second_request_in_same_millisecond_gets_next_nonce() {
    let key = CountingKey::new(Some("s3cr3t"));
    let signer = interceptor(Some("ABC123"), &key, &FixedClock::at(1000));
    let first = signer.signing_context().unwrap();
    let second = signer.signing_context().unwrap();
    assert_eq!(first.nonce, "1000");
    assert_eq!(second.nonce, "1001");
    assert_eq!(second.signature, "X7I9TuFRCvigOHuIgSdBaqlnEc7iImSI86YTBDjySR8=");
}

#[test]
fn key_fetched_for_every_request() {
    let key = CountingKey::new(Some("s3cr3t"));
    let signer = interceptor(Some("ABC123"), &key, &FixedClock::at(1000));
    for _ in 0..3 {
        signer.signing_context().unwrap();
    }
    assert_eq!(key.calls(), 3);
}

#[test]
fn existing_headers_are_kept() {
    let key = CountingKey::new(Some("s3cr3t"));
    let signer = interceptor(Some("ABC123"), &key, &FixedClock::at(1000));
    let mut request = RequestEnvelope::get("https://example.com/");
    request.set_header("Accept", "application/json");
    let request = signer.intercept(request).unwrap();
    assert_eq!(request.header("Accept"), Some("application/json"));
    assert_eq!(request.headers.len(), 4);
}

#[test]
fn production_providers_sign_certificate_identity() {
    let identity = CertificateIdentityProvider::new(vec![b"test-certificate".to_vec()]);
    let signer = SigningInterceptor::with_clock(
        Arc::new(identity),
        Arc::new(NativeKeyProvider::new()),
        FixedClock::at(1000),
    );
    let headers = signer.signed_headers().unwrap();
    assert_eq!(
        headers[HEADER_APP_SIGNATURE],
        "UuapR5Pi80z89AZGsxZQy51y69p6BjAkw4WlytPvNT4="
    );
    assert_eq!(headers[HEADER_NONCE], "1000");
}

#[test]
fn native_key_reference_vector() {
    let signer = SigningInterceptor::with_clock(
        Arc::new(StaticIdentity(Some("ABC123"))),
        Arc::new(NativeKeyProvider::new()),
        FixedClock::at(1000),
    );
    let context = signer.signing_context().unwrap();
    assert_eq!(context.signature, "h/rwXdSI830m7Qvm4TYVLIHvJWslvniLx0MMJTmPMcY=");
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        max_shrink_iters: 200,
        ..ProptestConfig::default()
    })]

    /// Headers are always present and well-formed when a key exists.
    #[test]
    fn headers_well_formed(start in 1_600_000_000_000u64..2_000_000_000_000u64, requests in 1usize..16) {
        let key = CountingKey::new(Some("s3cr3t"));
        let clock = FixedClock::at(start);
        let signer = interceptor(Some("ABC123"), &key, &clock);

        let mut last = 0u64;
        for i in 0..requests {
            if i % 3 == 0 {
                clock.0.fetch_add(1, Ordering::SeqCst);
            }
            let headers = signer.signed_headers().unwrap();
            prop_assert_eq!(headers.len(), 3);
            prop_assert_eq!(&headers[HEADER_APP_SIGNATURE], "ABC123");

            let nonce: u64 = headers[HEADER_NONCE].parse().unwrap();
            prop_assert!(nonce > last);
            last = nonce;

            let tag = STANDARD.decode(&headers[HEADER_PAYLOAD_SIGNATURE]).unwrap();
            prop_assert_eq!(tag.len(), 32);
        }
    }
}
