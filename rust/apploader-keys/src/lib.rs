// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Resolution of package verification keys from a key-management service.
//!
//! Keys live in named slots (`<prefix><operation>.key.<id>`). The service is
//! abstracted by [`KeyService`]; sessions are scoped by [`KeySession`] so a
//! handle is released on every exit path.

mod key_slot;
mod material;
mod memory;
mod resolver;
mod service;
mod session;

pub use key_slot::{KeySlotId, DEFAULT_KEY_SLOT_PREFIX};
pub use material::KeyMaterial;
pub use memory::InMemoryKeyService;
pub use resolver::{get_key, KeyResolveError, KeyResolver, KeyResolverSettings, MAX_KEY_SIZE};
pub use service::{KeyService, KeyServiceError, SessionHandle};
pub use session::KeySession;
