// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Shared CBOR builders for `apploader-package` integration tests.
//!
//! Packages are encoded by hand with `minicbor::Encoder` rather than through
//! `PackageBuilder`, so malformed layouts can be expressed directly.

#![allow(dead_code)]

use apploader_package::{APPLOADER_PACKAGE_CBOR_TAG_APP, PACKAGE_FORMAT_VERSION_CURRENT};
use minicbor::data::Tag;
use minicbor::Encoder;

pub(crate) type Enc<'a> = Encoder<&'a mut Vec<u8>>;

/// Encode `tags` (outermost first) followed by whatever `body` writes.
pub(crate) fn encode_tagged(tags: &[u64], body: impl FnOnce(&mut Enc<'_>)) -> Vec<u8> {
    let mut out = Vec::new();
    let mut enc = Encoder::new(&mut out);
    for tag in tags {
        enc.tag(Tag::new(*tag)).unwrap();
    }
    body(&mut enc);
    out
}

/// Encode an app-tagged package array; `body` writes the elements.
pub(crate) fn encode_package_array(len: u64, body: impl FnOnce(&mut Enc<'_>)) -> Vec<u8> {
    encode_tagged(&[APPLOADER_PACKAGE_CBOR_TAG_APP], |enc| {
        enc.array(len).unwrap();
        body(enc);
    })
}

/// `#6.65536([1, {}, contents, manifest])`
pub(crate) fn valid_package(contents: &[u8], manifest: &[u8]) -> Vec<u8> {
    encode_package_array(4, |enc| {
        enc.u64(PACKAGE_FORMAT_VERSION_CURRENT).unwrap();
        enc.map(0).unwrap();
        enc.bytes(contents).unwrap();
        enc.bytes(manifest).unwrap();
    })
}

/// A valid package whose header map is written by `headers`.
pub(crate) fn package_with_headers(entries: u64, headers: impl FnOnce(&mut Enc<'_>)) -> Vec<u8> {
    encode_package_array(4, |enc| {
        enc.u64(PACKAGE_FORMAT_VERSION_CURRENT).unwrap();
        enc.map(entries).unwrap();
        headers(enc);
        enc.bytes(b"\x7fELF").unwrap();
        enc.bytes(b"{}").unwrap();
    })
}

/// Stand-in for an executable image large enough to span multi-byte bstr headers.
pub(crate) fn fake_elf(len: usize) -> Vec<u8> {
    let mut elf = b"\x7fELF".to_vec();
    elf.extend((0..len.saturating_sub(4)).map(|i| (i % 251) as u8));
    elf
}
