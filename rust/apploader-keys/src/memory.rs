// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Key service backed by an in-process slot table.
//!
//! Used by host tooling and tests in place of the device key service. It keeps
//! the service-side rules the resolver relies on: a bounded session pool,
//! handle checks, and no writes past the caller's buffer.

use std::collections::{BTreeSet, HashMap};

use parking_lot::Mutex;
use zeroize::Zeroizing;

use crate::{KeyService, KeyServiceError, KeySlotId, SessionHandle};

#[derive(Default)]
struct Sessions {
    next_handle: u32,
    open: BTreeSet<u32>,
    opened: u64,
    closed: u64,
}

pub struct InMemoryKeyService {
    slots: HashMap<String, Zeroizing<Vec<u8>>>,
    max_sessions: usize,
    sessions: Mutex<Sessions>,
}

impl InMemoryKeyService {
    pub const DEFAULT_MAX_SESSIONS: usize = 4;

    pub fn new() -> Self {
        Self {
            slots: HashMap::new(),
            max_sessions: Self::DEFAULT_MAX_SESSIONS,
            sessions: Mutex::new(Sessions::default()),
        }
    }

    pub fn with_key(mut self, slot: impl Into<String>, key: impl Into<Vec<u8>>) -> Self {
        self.insert_key(slot, key);
        self
    }

    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    pub fn insert_key(&mut self, slot: impl Into<String>, key: impl Into<Vec<u8>>) {
        self.slots.insert(slot.into(), Zeroizing::new(key.into()));
    }

    /// Sessions currently open.
    pub fn open_sessions(&self) -> usize {
        self.sessions.lock().open.len()
    }

    pub fn sessions_opened(&self) -> u64 {
        self.sessions.lock().opened
    }

    pub fn sessions_closed(&self) -> u64 {
        self.sessions.lock().closed
    }
}

impl Default for InMemoryKeyService {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyService for InMemoryKeyService {
    fn open(&self) -> Result<SessionHandle, KeyServiceError> {
        let mut sessions = self.sessions.lock();
        if sessions.open.len() >= self.max_sessions {
            return Err(KeyServiceError::NoResources);
        }
        let handle = sessions.next_handle;
        sessions.next_handle = sessions.next_handle.wrapping_add(1);
        sessions.open.insert(handle);
        sessions.opened += 1;
        Ok(SessionHandle(handle))
    }

    fn get_keyslot_data(
        &self,
        session: SessionHandle,
        slot: &KeySlotId,
        out: &mut [u8],
    ) -> Result<usize, KeyServiceError> {
        if !self.sessions.lock().open.contains(&session.0) {
            return Err(KeyServiceError::BadHandle);
        }
        let key = self.slots.get(slot.as_str()).ok_or(KeyServiceError::NotFound)?;
        let capacity = out.len();
        let dst = out
            .get_mut(..key.len())
            .ok_or(KeyServiceError::BufferTooSmall { capacity })?;
        dst.copy_from_slice(key);
        Ok(key.len())
    }

    fn close(&self, session: SessionHandle) {
        let mut sessions = self.sessions.lock();
        if sessions.open.remove(&session.0) {
            sessions.closed += 1;
        } else {
            tracing::warn!(session = session.0, "close of a session that is not open");
        }
    }
}
