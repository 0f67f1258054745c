// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Recognized package header labels, per format version.
//!
//! A label is accepted only if it is a member of the set for the package's
//! format version. Anything else is rejected by the decoder. Version 1
//! defines no headers, so every label in a version 1 package is rejected.

use crate::PACKAGE_FORMAT_VERSION_CURRENT;

const LABELS_V1: &[u64] = &[];

/// Labels recognized by a given format version; empty for unknown versions.
pub fn recognized_labels(version: u64) -> &'static [u64] {
    match version {
        PACKAGE_FORMAT_VERSION_CURRENT => LABELS_V1,
        _ => &[],
    }
}

pub fn is_recognized_label(version: u64, label: u64) -> bool {
    recognized_labels(version).contains(&label)
}
