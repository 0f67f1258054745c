// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Session scoping and the in-memory key service.

mod common;

use apploader_keys::{
    get_key, InMemoryKeyService, KeyService, KeyServiceError, KeySession, KeySlotId, SessionHandle,
};
use common::{Call, RecordingKeyService};

#[test]
fn session_closes_on_drop() {
    let service = RecordingKeyService::serving(b"k");
    {
        let session = KeySession::open(&service).expect("open");
        assert_eq!(session.handle(), SessionHandle(7));
        assert_eq!(service.close_count(), 0);
    }
    assert_eq!(service.calls(), vec![Call::Open, Call::Close(SessionHandle(7))]);
}

#[test]
fn failed_open_creates_no_session() {
    let service = RecordingKeyService::failing_open(KeyServiceError::Status(-5));
    let err = KeySession::open(&service).err().expect("open should fail");
    assert_eq!(err, KeyServiceError::Status(-5));
    assert_eq!(service.close_count(), 0);
}

#[test]
fn in_memory_service_enforces_session_pool() {
    let service = InMemoryKeyService::new().with_max_sessions(1);
    let first = KeySession::open(&service).expect("first");
    assert_eq!(
        KeySession::open(&service).err(),
        Some(KeyServiceError::NoResources)
    );
    drop(first);
    assert!(KeySession::open(&service).is_ok());
    assert_eq!(service.open_sessions(), 0);
}

#[test]
fn repeated_failures_do_not_leak_sessions() {
    let service = InMemoryKeyService::new().with_max_sessions(1);
    for key_id in 0..=10u8 {
        assert!(get_key(&service, "verify", key_id).is_none());
    }
    assert_eq!(service.sessions_opened(), 11);
    assert_eq!(service.sessions_closed(), 11);
    assert_eq!(service.open_sessions(), 0);
}

#[test]
fn in_memory_service_rejects_unknown_handles() {
    let service = InMemoryKeyService::new().with_key("slot", vec![1, 2, 3]);
    let mut out = [0u8; 8];
    let slot = KeySlotId::new("", "slot", 0);
    assert_eq!(
        service.get_keyslot_data(SessionHandle(42), &slot, &mut out),
        Err(KeyServiceError::BadHandle)
    );
}

#[test]
fn in_memory_service_never_overflows_the_buffer() {
    let slot = KeySlotId::for_operation("verify", 0);
    let service = InMemoryKeyService::new().with_key(slot.to_string(), vec![0xab; 16]);
    let session = KeySession::open(&service).expect("open");

    let mut small = [0u8; 8];
    assert_eq!(
        session.get_keyslot_data(&slot, &mut small),
        Err(KeyServiceError::BufferTooSmall { capacity: 8 })
    );
    assert_eq!(small, [0u8; 8]);

    let mut big = [0u8; 32];
    assert_eq!(session.get_keyslot_data(&slot, &mut big), Ok(16));
    assert_eq!(&big[..16], &[0xab; 16]);
    assert_eq!(&big[16..], &[0u8; 16]);
}

#[test]
fn oversized_stored_key_resolves_to_nothing() {
    let slot = KeySlotId::for_operation("verify", 0);
    let service = InMemoryKeyService::new().with_key(slot.to_string(), vec![0u8; 129]);
    assert!(get_key(&service, "verify", 0).is_none());
    assert_eq!(service.open_sessions(), 0);
}
