// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use thiserror::Error;

use crate::cbor::{CborParseError, Kind};

/// Why a package was rejected. Every variant is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PackageError {
    #[error("malformed package encoding: {0}")]
    MalformedEncoding(#[from] CborParseError),

    #[error("invalid package semantic tag: expected exactly one tag {expected}, got {count} tag(s) (outermost: {outermost:?})")]
    InvalidTag {
        expected: u64,
        count: usize,
        outermost: Option<u64>,
    },

    #[error("invalid package shape: {0}")]
    InvalidShape(ShapeError),

    #[error("unsupported package version: expected {expected}, got {actual}")]
    UnsupportedVersion { expected: u64, actual: u64 },

    #[error("package headers contain unknown label {0}")]
    UnknownHeaderLabel(u64),
}

/// Fieldless discriminant of [`PackageError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageErrorKind {
    MalformedEncoding,
    InvalidTag,
    InvalidShape,
    UnsupportedVersion,
    UnknownHeaderLabel,
}

impl PackageError {
    pub fn kind(&self) -> PackageErrorKind {
        match self {
            PackageError::MalformedEncoding(_) => PackageErrorKind::MalformedEncoding,
            PackageError::InvalidTag { .. } => PackageErrorKind::InvalidTag,
            PackageError::InvalidShape(_) => PackageErrorKind::InvalidShape,
            PackageError::UnsupportedVersion { .. } => PackageErrorKind::UnsupportedVersion,
            PackageError::UnknownHeaderLabel(_) => PackageErrorKind::UnknownHeaderLabel,
        }
    }
}

/// The structural rule a package violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShapeError {
    #[error("expected {expected} for {field}, got {actual}")]
    WrongType {
        field: &'static str,
        expected: Kind,
        actual: Kind,
    },

    #[error("package array is empty")]
    EmptyArray,

    #[error("expected {expected} package array elements, got {actual}")]
    ElementCount { expected: usize, actual: usize },

    #[error("header label {0} appears more than once")]
    DuplicateHeaderLabel(u64),
}

impl From<ShapeError> for PackageError {
    fn from(e: ShapeError) -> Self {
        PackageError::InvalidShape(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to encode package: {0}")]
pub struct EncodePackageError(pub(crate) String);
