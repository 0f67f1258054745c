// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Decoder and validator for trusted-application packages.
//!
//! Packages arrive from untrusted storage and are decoded inside the loader's
//! security boundary, so [`parse_package_metadata`] fails closed on any
//! malformed, mistagged or version-mismatched input. On success it returns
//! borrowed views into the caller's buffer; nothing is copied.

pub mod cbor;
mod builder;
mod error;
mod header_label;
mod package;
mod view;

/// CBOR semantic tag identifying an application package.
pub const APPLOADER_PACKAGE_CBOR_TAG_APP: u64 = 65536;

/// The only package format version this decoder accepts.
pub const PACKAGE_FORMAT_VERSION_CURRENT: u64 = 1;

pub use builder::{HeaderValue, PackageBuilder};
pub use cbor::{parse_with_views, CborParseError, Item, Kind, ParseLimits, Value};
pub use error::{EncodePackageError, PackageError, PackageErrorKind, ShapeError};
pub use header_label::{is_recognized_label, recognized_labels};
pub use package::{
    parse_package_metadata, parse_package_metadata_with_options, PackageHeader, PackageMetadata, PackageParseOptions,
};
pub use view::ByteView;
