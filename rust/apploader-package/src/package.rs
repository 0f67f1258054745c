// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Application package decoding.
//!
//! A package is a CBOR array with the single semantic tag
//! [`APPLOADER_PACKAGE_CBOR_TAG_APP`]:
//!
//! ```text
//! package = #6.65536([
//!     version:  uint,                ; PACKAGE_FORMAT_VERSION_CURRENT
//!     headers:  { * uint => any },   ; labels from recognized_labels(version)
//!     contents: bstr,                ; executable image
//!     manifest: bstr,
//! ])
//! ```
//!
//! Decoding is strict: the first violated rule rejects the whole package.

use std::collections::BTreeSet;

use crate::cbor::{parse_with_views, Item, Kind, ParseLimits};
use crate::error::{PackageError, ShapeError};
use crate::header_label::is_recognized_label;
use crate::view::ByteView;
use crate::{APPLOADER_PACKAGE_CBOR_TAG_APP, PACKAGE_FORMAT_VERSION_CURRENT};

const PACKAGE_ARRAY_LEN: usize = 4;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageParseOptions {
    pub limits: ParseLimits,
}

impl PackageParseOptions {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.limits.max_depth = max_depth;
        self
    }
}

/// A recognized header and its value, left uninterpreted.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageHeader<'a> {
    pub label: u64,
    pub value: Item<'a>,
}

/// Result of a successful decode.
///
/// Borrows the package buffer: `contents` and `manifest` point into it, so
/// the buffer must stay alive (and unchanged) while the metadata is in use.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageMetadata<'a> {
    pub version: u64,
    pub headers: Vec<PackageHeader<'a>>,
    pub contents: ByteView<'a>,
    pub manifest: ByteView<'a>,
}

impl<'a> PackageMetadata<'a> {
    pub fn header(&self, label: u64) -> Option<&Item<'a>> {
        self.headers.iter().find(|h| h.label == label).map(|h| &h.value)
    }
}

/// Decode and validate an application package with default options.
pub fn parse_package_metadata(package: &[u8]) -> Result<PackageMetadata<'_>, PackageError> {
    parse_package_metadata_with_options(package, &PackageParseOptions::default())
}

pub fn parse_package_metadata_with_options<'a>(
    package: &'a [u8],
    options: &PackageParseOptions,
) -> Result<PackageMetadata<'a>, PackageError> {
    match decode_package(package, options) {
        Ok(metadata) => {
            tracing::debug!(
                package_size = package.len(),
                contents_size = metadata.contents.len(),
                manifest_size = metadata.manifest.len(),
                header_count = metadata.headers.len(),
                "accepted application package"
            );
            Ok(metadata)
        }
        Err(e) => {
            tracing::error!(kind = ?e.kind(), error = %e, "rejected application package");
            Err(e)
        }
    }
}

fn decode_package<'a>(package: &'a [u8], options: &PackageParseOptions) -> Result<PackageMetadata<'a>, PackageError> {
    let root = parse_with_views(package, &options.limits)?;

    if root.semantic_tag_count() != 1 || root.semantic_tag() != Some(APPLOADER_PACKAGE_CBOR_TAG_APP) {
        return Err(PackageError::InvalidTag {
            expected: APPLOADER_PACKAGE_CBOR_TAG_APP,
            count: root.semantic_tag_count(),
            outermost: root.semantic_tag(),
        });
    }

    let elements = root.as_array().ok_or(ShapeError::WrongType {
        field: "package",
        expected: Kind::Array,
        actual: root.kind(),
    })?;
    let Some(version_item) = elements.first() else {
        return Err(ShapeError::EmptyArray.into());
    };

    // Version mismatch takes precedence over a wrong element count.
    let version = expect_uint(version_item, "version")?;
    if version != PACKAGE_FORMAT_VERSION_CURRENT {
        return Err(PackageError::UnsupportedVersion {
            expected: PACKAGE_FORMAT_VERSION_CURRENT,
            actual: version,
        });
    }

    let [_, headers_item, contents_item, manifest_item] = elements else {
        return Err(ShapeError::ElementCount {
            expected: PACKAGE_ARRAY_LEN,
            actual: elements.len(),
        }
        .into());
    };

    let headers = decode_headers(version, headers_item)?;
    let contents = expect_bstr(contents_item, "contents")?;
    let manifest = expect_bstr(manifest_item, "manifest")?;

    Ok(PackageMetadata {
        version,
        headers,
        contents,
        manifest,
    })
}

fn decode_headers<'a>(version: u64, item: &Item<'a>) -> Result<Vec<PackageHeader<'a>>, PackageError> {
    let entries = item.as_map().ok_or(ShapeError::WrongType {
        field: "headers",
        expected: Kind::Map,
        actual: item.kind(),
    })?;

    let mut seen = BTreeSet::new();
    let mut headers = Vec::with_capacity(entries.len());
    for (label_item, value) in entries {
        let label = expect_uint(label_item, "header label")?;
        if !is_recognized_label(version, label) {
            return Err(PackageError::UnknownHeaderLabel(label));
        }
        if !seen.insert(label) {
            return Err(ShapeError::DuplicateHeaderLabel(label).into());
        }
        headers.push(PackageHeader {
            label,
            value: value.clone(),
        });
    }

    Ok(headers)
}

fn expect_uint(item: &Item<'_>, field: &'static str) -> Result<u64, ShapeError> {
    item.as_uint().ok_or(ShapeError::WrongType {
        field,
        expected: Kind::Uint,
        actual: item.kind(),
    })
}

fn expect_bstr<'a>(item: &Item<'a>, field: &'static str) -> Result<ByteView<'a>, ShapeError> {
    item.as_view_bstr().ok_or(ShapeError::WrongType {
        field,
        expected: Kind::Bytes,
        actual: item.kind(),
    })
}
