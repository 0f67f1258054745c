// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Seam to the key-management service.

use crate::KeySlotId;

/// Process-local handle for an open key-service session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionHandle(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum KeyServiceError {
    #[error("key slot not found")]
    NotFound,

    #[error("no key service sessions available")]
    NoResources,

    #[error("key does not fit in a {capacity} byte buffer")]
    BufferTooSmall { capacity: usize },

    #[error("session is not open")]
    BadHandle,

    /// Raw negative status from a service without a richer error model.
    #[error("key service returned status {0}")]
    Status(i64),
}

/// A key-management service.
///
/// Contract:
/// - `open` either returns a handle that the caller must later `close`, or an
///   error, in which case there is nothing to close.
/// - `get_keyslot_data` writes at most `out.len()` bytes and returns how many
///   bytes of `out` hold the key.
/// - `close` is called exactly once per successful `open`.
///
/// Use [`crate::KeySession`] rather than calling `open`/`close` directly.
pub trait KeyService {
    fn open(&self) -> Result<SessionHandle, KeyServiceError>;

    fn get_keyslot_data(
        &self,
        session: SessionHandle,
        slot: &KeySlotId,
        out: &mut [u8],
    ) -> Result<usize, KeyServiceError>;

    fn close(&self, session: SessionHandle);
}

impl<S: KeyService + ?Sized> KeyService for &S {
    fn open(&self) -> Result<SessionHandle, KeyServiceError> {
        (**self).open()
    }

    fn get_keyslot_data(
        &self,
        session: SessionHandle,
        slot: &KeySlotId,
        out: &mut [u8],
    ) -> Result<usize, KeyServiceError> {
        (**self).get_keyslot_data(session, slot, out)
    }

    fn close(&self, session: SessionHandle) {
        (**self).close(session)
    }
}
