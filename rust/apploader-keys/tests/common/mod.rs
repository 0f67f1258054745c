// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Key service doubles for `apploader-keys` integration tests.

#![allow(dead_code)]

use std::cell::RefCell;

use apploader_keys::{KeyService, KeyServiceError, KeySlotId, SessionHandle};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Open,
    Get { session: SessionHandle, slot: String, capacity: usize },
    Close(SessionHandle),
}

/// What the fake service does when asked for a key.
#[derive(Debug, Clone)]
pub(crate) enum Fetch {
    /// Copy these bytes and report their length.
    Key(Vec<u8>),
    /// Fail with this error.
    Fail(KeyServiceError),
    /// Write nothing but report this length.
    ReportLen(usize),
}

/// A scripted key service that records every call made to it.
pub(crate) struct RecordingKeyService {
    pub(crate) open_result: Result<SessionHandle, KeyServiceError>,
    pub(crate) fetch: Fetch,
    pub(crate) calls: RefCell<Vec<Call>>,
}

impl RecordingKeyService {
    pub(crate) fn serving(key: &[u8]) -> Self {
        Self {
            open_result: Ok(SessionHandle(7)),
            fetch: Fetch::Key(key.to_vec()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub(crate) fn failing_open(err: KeyServiceError) -> Self {
        Self {
            open_result: Err(err),
            ..Self::serving(&[])
        }
    }

    pub(crate) fn with_fetch(fetch: Fetch) -> Self {
        Self {
            fetch,
            ..Self::serving(&[])
        }
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.calls.borrow().iter().filter(|c| matches!(c, Call::Close(_))).count()
    }
}

impl KeyService for RecordingKeyService {
    fn open(&self) -> Result<SessionHandle, KeyServiceError> {
        self.calls.borrow_mut().push(Call::Open);
        self.open_result
    }

    fn get_keyslot_data(
        &self,
        session: SessionHandle,
        slot: &KeySlotId,
        out: &mut [u8],
    ) -> Result<usize, KeyServiceError> {
        self.calls.borrow_mut().push(Call::Get {
            session,
            slot: slot.to_string(),
            capacity: out.len(),
        });
        match &self.fetch {
            Fetch::Key(key) => {
                out[..key.len()].copy_from_slice(key);
                Ok(key.len())
            }
            Fetch::Fail(err) => Err(*err),
            Fetch::ReportLen(len) => Ok(*len),
        }
    }

    fn close(&self, session: SessionHandle) {
        self.calls.borrow_mut().push(Call::Close(session));
    }
}

/// Deterministic stand-in for an uncompressed P-256 SubjectPublicKeyInfo.
pub(crate) fn p256_public_key_der() -> Vec<u8> {
    let mut der = vec![0x30, 0x59, 0x30, 0x13];
    der.extend((0..87u8).map(|i| i.wrapping_mul(31)));
    der
}
