// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Verification key lookup.
//!
//! One call is one session: allocate the key buffer, open a session, fetch
//! the slot, close the session. Nothing is retried; any failure is logged and
//! reported to the caller as "no key".

use zeroize::Zeroizing;

use crate::{KeyMaterial, KeyService, KeyServiceError, KeySession, KeySlotId, DEFAULT_KEY_SLOT_PREFIX};

/// Upper bound on key size. P-256 public keys take about 90 bytes.
pub const MAX_KEY_SIZE: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyResolverSettings {
    pub slot_prefix: String,
    /// Size of the buffer handed to the key service.
    pub max_key_size: usize,
}

impl KeyResolverSettings {
    pub fn with_slot_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.slot_prefix = prefix.into();
        self
    }

    pub fn with_max_key_size(mut self, max_key_size: usize) -> Self {
        self.max_key_size = max_key_size;
        self
    }
}

impl Default for KeyResolverSettings {
    fn default() -> Self {
        Self {
            slot_prefix: DEFAULT_KEY_SLOT_PREFIX.to_string(),
            max_key_size: MAX_KEY_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyResolveError {
    #[error("failed to allocate {size} byte key buffer")]
    AllocationFailure { size: usize },

    #[error("failed to connect to key service: {0}")]
    ServiceUnavailable(#[source] KeyServiceError),

    #[error("failed to get key {slot}: {source}")]
    KeyFetchFailure {
        slot: KeySlotId,
        #[source]
        source: KeyServiceError,
    },

    #[error("key service reported {reported} bytes for {slot} but the buffer holds {capacity}")]
    KeyLengthOutOfBounds {
        slot: KeySlotId,
        reported: usize,
        capacity: usize,
    },
}

pub struct KeyResolver<S> {
    service: S,
    settings: KeyResolverSettings,
}

impl<S: KeyService> KeyResolver<S> {
    pub fn new(service: S) -> Self {
        Self::with_settings(service, KeyResolverSettings::default())
    }

    pub fn with_settings(service: S, settings: KeyResolverSettings) -> Self {
        Self { service, settings }
    }

    pub fn settings(&self) -> &KeyResolverSettings {
        &self.settings
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn key_slot(&self, operation: &str, key_id: u8) -> KeySlotId {
        KeySlotId::new(&self.settings.slot_prefix, operation, key_id)
    }

    /// Fetch the key for `operation`/`key_id`, or `None` on any failure.
    ///
    /// The cause of a failure is only visible in the log; use
    /// [`KeyResolver::try_resolve_key`] to inspect it.
    pub fn resolve_key(&self, operation: &str, key_id: u8) -> Option<KeyMaterial> {
        match self.try_resolve_key(operation, key_id) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::error!(operation, key_id, error = %e, "failed to resolve key");
                None
            }
        }
    }

    pub fn try_resolve_key(&self, operation: &str, key_id: u8) -> Result<KeyMaterial, KeyResolveError> {
        let slot = self.key_slot(operation, key_id);
        let mut buf = allocate_key_buffer(self.settings.max_key_size)?;

        let session = KeySession::open(&self.service).map_err(KeyResolveError::ServiceUnavailable)?;
        let fetched = session.get_keyslot_data(&slot, &mut buf);
        drop(session);

        let len = match fetched {
            Ok(len) => len,
            Err(source) => return Err(KeyResolveError::KeyFetchFailure { slot, source }),
        };
        if len > buf.len() {
            return Err(KeyResolveError::KeyLengthOutOfBounds {
                slot,
                reported: len,
                capacity: buf.len(),
            });
        }

        tracing::debug!(key_slot = %slot, key_len = len, "resolved key");
        Ok(KeyMaterial::new(buf, len))
    }
}

/// Resolve a key with default settings.
pub fn get_key<S: KeyService + ?Sized>(service: &S, operation: &str, key_id: u8) -> Option<KeyMaterial> {
    KeyResolver::new(service).resolve_key(operation, key_id)
}

fn allocate_key_buffer(size: usize) -> Result<Zeroizing<Vec<u8>>, KeyResolveError> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(size)
        .map_err(|_| KeyResolveError::AllocationFailure { size })?;
    buf.resize(size, 0);
    Ok(Zeroizing::new(buf))
}
