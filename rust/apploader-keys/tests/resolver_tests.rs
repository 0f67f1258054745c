// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Key resolution: slot naming, session scoping and failure collapsing.

mod common;

use apploader_keys::{
    get_key, InMemoryKeyService, KeyResolveError, KeyResolver, KeyResolverSettings, KeyServiceError, KeySlotId,
    SessionHandle, MAX_KEY_SIZE,
};
use common::{p256_public_key_der, Call, Fetch, RecordingKeyService};

#[test]
fn slot_id_is_namespaced_operation_and_decimal_key_id() {
    assert_eq!(
        KeySlotId::for_operation("verify", 0).as_str(),
        "com.android.trusty.apploader.verify.key.0"
    );
    assert_eq!(
        KeySlotId::for_operation("decrypt", 255).to_string(),
        "com.android.trusty.apploader.decrypt.key.255"
    );
    assert_eq!(KeySlotId::new("test.", "verify", 12).as_str(), "test.verify.key.12");
}

#[test]
fn resolves_key_and_closes_session() {
    let der = p256_public_key_der();
    let service = RecordingKeyService::serving(&der);

    let key = get_key(&service, "verify", 1).expect("key");
    assert_eq!(key.as_bytes(), der.as_slice());
    assert_eq!(key.len(), der.len());
    assert_eq!(key.capacity(), MAX_KEY_SIZE);

    assert_eq!(
        service.calls(),
        vec![
            Call::Open,
            Call::Get {
                session: SessionHandle(7),
                slot: "com.android.trusty.apploader.verify.key.1".to_string(),
                capacity: MAX_KEY_SIZE,
            },
            Call::Close(SessionHandle(7)),
        ]
    );
}

#[test]
fn repeated_resolution_returns_identical_keys() {
    let der = p256_public_key_der();
    let service = InMemoryKeyService::new().with_key(KeySlotId::for_operation("verify", 3).to_string(), der.clone());
    let resolver = KeyResolver::new(&service);

    let first = resolver.resolve_key("verify", 3).expect("first");
    let second = resolver.resolve_key("verify", 3).expect("second");
    assert_eq!(first.as_bytes(), second.as_bytes());
    assert_eq!(first.len(), second.len());
    assert_eq!(first.as_bytes(), der.as_slice());

    assert_eq!(service.sessions_opened(), 2);
    assert_eq!(service.sessions_closed(), 2);
    assert_eq!(service.open_sessions(), 0);
}

#[test]
fn open_failure_yields_no_key_and_no_close() {
    let service = RecordingKeyService::failing_open(KeyServiceError::NoResources);
    assert!(get_key(&service, "verify", 0).is_none());
    assert_eq!(service.calls(), vec![Call::Open]);

    let err = KeyResolver::new(&service).try_resolve_key("verify", 0).unwrap_err();
    assert_eq!(err, KeyResolveError::ServiceUnavailable(KeyServiceError::NoResources));
}

#[test]
fn fetch_failure_still_closes_session() {
    let service = RecordingKeyService::with_fetch(Fetch::Fail(KeyServiceError::NotFound));
    assert!(get_key(&service, "verify", 9).is_none());
    assert_eq!(service.close_count(), 1);

    let err = KeyResolver::new(&service).try_resolve_key("verify", 9).unwrap_err();
    assert_eq!(
        err,
        KeyResolveError::KeyFetchFailure {
            slot: KeySlotId::for_operation("verify", 9),
            source: KeyServiceError::NotFound,
        }
    );
    assert_eq!(service.close_count(), 2);
}

#[test]
fn key_filling_the_whole_buffer_is_accepted() {
    let key = vec![0x5a; MAX_KEY_SIZE];
    let service = RecordingKeyService::serving(&key);
    let resolved = get_key(&service, "verify", 0).expect("key");
    assert_eq!(resolved.len(), MAX_KEY_SIZE);
    assert_eq!(resolved.as_bytes(), key.as_slice());
}

#[test]
fn reported_length_beyond_capacity_is_rejected() {
    let service = RecordingKeyService::with_fetch(Fetch::ReportLen(MAX_KEY_SIZE + 1));
    let err = KeyResolver::new(&service).try_resolve_key("verify", 0).unwrap_err();
    assert_eq!(
        err,
        KeyResolveError::KeyLengthOutOfBounds {
            slot: KeySlotId::for_operation("verify", 0),
            reported: MAX_KEY_SIZE + 1,
            capacity: MAX_KEY_SIZE,
        }
    );
    assert_eq!(service.close_count(), 1);
    assert!(get_key(&service, "verify", 0).is_none());
}

#[test]
fn reported_length_shorter_than_buffer_limits_exposed_bytes() {
    let service = RecordingKeyService::with_fetch(Fetch::ReportLen(0));
    let key = get_key(&service, "verify", 0).expect("key");
    assert!(key.is_empty());
    assert_eq!(key.as_bytes(), &[] as &[u8]);
    assert_eq!(key.capacity(), MAX_KEY_SIZE);
}

#[test]
fn allocation_failure_does_not_touch_the_service() {
    let service = RecordingKeyService::serving(b"key");
    let settings = KeyResolverSettings::default().with_max_key_size(usize::MAX);
    let resolver = KeyResolver::with_settings(&service, settings);

    assert_eq!(
        resolver.try_resolve_key("verify", 0).unwrap_err(),
        KeyResolveError::AllocationFailure { size: usize::MAX }
    );
    assert!(resolver.resolve_key("verify", 0).is_none());
    assert!(service.calls().is_empty());
}

#[test]
fn settings_control_prefix_and_buffer_size() {
    let service = RecordingKeyService::serving(b"0123456789");
    let settings = KeyResolverSettings::default()
        .with_slot_prefix("vendor.loader.")
        .with_max_key_size(16);
    let resolver = KeyResolver::with_settings(&service, settings);

    let key = resolver.resolve_key("verify", 2).expect("key");
    assert_eq!(key.capacity(), 16);
    assert_eq!(key.as_bytes(), b"0123456789");
    assert!(service.calls().contains(&Call::Get {
        session: SessionHandle(7),
        slot: "vendor.loader.verify.key.2".to_string(),
        capacity: 16,
    }));
}

#[test]
fn key_material_debug_does_not_print_bytes() {
    let service = RecordingKeyService::serving(&[0xde, 0xad, 0xbe, 0xef]);
    let key = get_key(&service, "verify", 0).expect("key");
    let debug = format!("{key:?}");
    assert!(debug.contains("len: 4"), "debug was: {debug}");
    assert!(!debug.contains("222"), "debug was: {debug}");
}
