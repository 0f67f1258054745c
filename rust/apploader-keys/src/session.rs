// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::{KeyService, KeyServiceError, KeySlotId, SessionHandle};

/// An open key-service session, closed when dropped.
///
/// A session only exists once `open` succeeded, so a failed open is never
/// followed by a close and a successful one is always closed exactly once.
pub struct KeySession<'s, S: KeyService + ?Sized> {
    service: &'s S,
    handle: SessionHandle,
}

impl<'s, S: KeyService + ?Sized> KeySession<'s, S> {
    pub fn open(service: &'s S) -> Result<Self, KeyServiceError> {
        let handle = service.open()?;
        tracing::trace!(session = handle.0, "opened key service session");
        Ok(Self { service, handle })
    }

    pub fn handle(&self) -> SessionHandle {
        self.handle
    }

    pub fn get_keyslot_data(&self, slot: &KeySlotId, out: &mut [u8]) -> Result<usize, KeyServiceError> {
        self.service.get_keyslot_data(self.handle, slot, out)
    }
}

impl<S: KeyService + ?Sized> Drop for KeySession<'_, S> {
    fn drop(&mut self) {
        self.service.close(self.handle);
        tracing::trace!(session = self.handle.0, "closed key service session");
    }
}
