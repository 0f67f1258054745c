// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// Namespace every apploader key slot lives under.
pub const DEFAULT_KEY_SLOT_PREFIX: &str = "com.android.trusty.apploader.";

const KEY_ID_SEPARATOR: &str = ".key.";

/// Name of a key slot in the key-management service:
/// `<prefix><operation>.key.<key id>`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeySlotId(String);

impl KeySlotId {
    pub fn new(prefix: &str, operation: &str, key_id: u8) -> Self {
        Self(format!("{prefix}{operation}{KEY_ID_SEPARATOR}{key_id}"))
    }

    /// Slot under [`DEFAULT_KEY_SLOT_PREFIX`].
    pub fn for_operation(operation: &str, key_id: u8) -> Self {
        Self::new(DEFAULT_KEY_SLOT_PREFIX, operation, key_id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeySlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for KeySlotId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
