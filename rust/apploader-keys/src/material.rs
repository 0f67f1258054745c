// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use zeroize::Zeroizing;

/// Key bytes fetched from the key service.
///
/// The backing buffer is always the full capacity the resolver allocated;
/// only the first [`KeyMaterial::len`] bytes are key data and only those are
/// exposed. The whole buffer is zeroed on drop.
pub struct KeyMaterial {
    buf: Zeroizing<Vec<u8>>,
    len: usize,
}

impl KeyMaterial {
    /// `len` must not exceed `buf.len()`; the resolver checks this first.
    pub(crate) fn new(buf: Zeroizing<Vec<u8>>, len: usize) -> Self {
        debug_assert!(len <= buf.len());
        Self { buf, len }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Size of the allocated buffer, i.e. the maximum key size in effect.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }
}

impl AsRef<[u8]> for KeyMaterial {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyMaterial")
            .field("len", &self.len)
            .field("capacity", &self.buf.len())
            .finish_non_exhaustive()
    }
}
