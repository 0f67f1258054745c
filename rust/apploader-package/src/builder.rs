// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Package encoding, the inverse of `parse_package_metadata`.

use minicbor::data::Tag;
use minicbor::Encoder;

use crate::error::EncodePackageError;
use crate::{APPLOADER_PACKAGE_CBOR_TAG_APP, PACKAGE_FORMAT_VERSION_CURRENT};

/// Header value to encode. The decoder does not interpret values, so any of
/// these round-trips through `PackageMetadata::headers`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValue {
    Uint(u64),
    Int(i64),
    Bytes(Vec<u8>),
    Text(String),
    Bool(bool),
    Null,
    Array(Vec<HeaderValue>),
}

#[derive(Debug, Clone)]
pub struct PackageBuilder<'a> {
    contents: &'a [u8],
    manifest: &'a [u8],
    headers: Vec<(u64, HeaderValue)>,
}

impl<'a> PackageBuilder<'a> {
    pub fn new(contents: &'a [u8], manifest: &'a [u8]) -> Self {
        Self {
            contents,
            manifest,
            headers: Vec::new(),
        }
    }

    /// Add a header entry. Labels are written in insertion order and are not
    /// checked here, so tooling can produce packages the decoder rejects.
    pub fn with_header(mut self, label: u64, value: HeaderValue) -> Self {
        self.headers.push((label, value));
        self
    }

    pub fn encode(&self) -> Result<Vec<u8>, EncodePackageError> {
        let mut out = Vec::with_capacity(32 + self.contents.len() + self.manifest.len());
        let mut enc = Encoder::new(&mut out);
        enc.tag(Tag::new(APPLOADER_PACKAGE_CBOR_TAG_APP)).map_err(encode_err)?;
        enc.array(4).map_err(encode_err)?;
        enc.u64(PACKAGE_FORMAT_VERSION_CURRENT).map_err(encode_err)?;
        enc.map(self.headers.len() as u64).map_err(encode_err)?;
        for (label, value) in &self.headers {
            enc.u64(*label).map_err(encode_err)?;
            encode_header_value(&mut enc, value)?;
        }
        enc.bytes(self.contents).map_err(encode_err)?;
        enc.bytes(self.manifest).map_err(encode_err)?;
        Ok(out)
    }
}

fn encode_header_value(enc: &mut Encoder<&mut Vec<u8>>, value: &HeaderValue) -> Result<(), EncodePackageError> {
    match value {
        HeaderValue::Uint(v) => {
            enc.u64(*v).map_err(encode_err)?;
        }
        HeaderValue::Int(v) => {
            enc.i64(*v).map_err(encode_err)?;
        }
        HeaderValue::Bytes(b) => {
            enc.bytes(b).map_err(encode_err)?;
        }
        HeaderValue::Text(s) => {
            enc.str(s).map_err(encode_err)?;
        }
        HeaderValue::Bool(b) => {
            enc.bool(*b).map_err(encode_err)?;
        }
        HeaderValue::Null => {
            enc.null().map_err(encode_err)?;
        }
        HeaderValue::Array(items) => {
            enc.array(items.len() as u64).map_err(encode_err)?;
            for item in items {
                encode_header_value(enc, item)?;
            }
        }
    }
    Ok(())
}

fn encode_err<E: std::fmt::Display>(e: E) -> EncodePackageError {
    EncodePackageError(e.to_string())
}
