// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Zero-copy views into a caller-owned package buffer.

use std::ops::Range;

/// A borrowed byte string inside the package buffer.
///
/// The view records where the bytes start in the buffer handed to the parser,
/// so callers can report offsets without pointer arithmetic. It can never
/// outlive that buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ByteView<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteView<'a> {
    pub(crate) fn new(bytes: &'a [u8], offset: usize) -> Self {
        Self { bytes, offset }
    }

    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// Offset of the first byte relative to the start of the parsed buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Byte range of the view within the parsed buffer.
    pub fn range(&self) -> Range<usize> {
        self.offset..self.offset + self.bytes.len()
    }
}

impl AsRef<[u8]> for ByteView<'_> {
    fn as_ref(&self) -> &[u8] {
        self.bytes
    }
}
