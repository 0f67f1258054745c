// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! C ABI for the apploader.
//!
//! Package metadata is returned as pointer/length pairs into the caller's
//! package buffer; they are valid for as long as that buffer is. Keys are
//! returned as an opaque `apploader_key` that must be released with
//! `apploader_key_free`, which zeroes it.

#![allow(clippy::missing_safety_doc)]
#![allow(non_camel_case_types)]

use std::ffi::{c_char, c_long, c_void, CStr, CString};

use apploader_keys::{KeyMaterial, KeyResolver, KeyService, KeyServiceError, KeySlotId, SessionHandle};
use apploader_package::parse_package_metadata;

/// Same field names and order as the loader's C `struct apploader_package_metadata`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct apploader_package_metadata {
    pub elf_start: *const u8,
    pub elf_size: usize,
    pub manifest_start: *const u8,
    pub manifest_size: usize,
}

/// Parse and validate `package`, filling `metadata` on success.
///
/// `metadata` is left untouched when the package is rejected.
#[no_mangle]
pub unsafe extern "C" fn apploader_parse_package_metadata(
    package: *const u8,
    package_size: usize,
    metadata: *mut apploader_package_metadata,
) -> bool {
    if package.is_null() || metadata.is_null() {
        tracing::error!("apploader_parse_package_metadata called with a null pointer");
        return false;
    }

    let bytes = std::slice::from_raw_parts(package, package_size);
    let Ok(md) = parse_package_metadata(bytes) else {
        return false;
    };

    *metadata = apploader_package_metadata {
        elf_start: md.contents.as_bytes().as_ptr(),
        elf_size: md.contents.len(),
        manifest_start: md.manifest.as_bytes().as_ptr(),
        manifest_size: md.manifest.len(),
    };
    true
}

/// Key-management service callbacks.
///
/// `open` returns a non-negative session handle or a negative status.
/// `get_keyslot_data` receives the buffer capacity in `*data_size` and stores
/// the key length there; it returns a negative status on failure.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct apploader_key_service {
    pub ctx: *mut c_void,
    pub open: Option<extern "C" fn(ctx: *mut c_void) -> c_long>,
    pub get_keyslot_data: Option<
        extern "C" fn(ctx: *mut c_void, session: u32, slot: *const c_char, data: *mut u8, data_size: *mut u32) -> c_long,
    >,
    pub close: Option<extern "C" fn(ctx: *mut c_void, session: u32)>,
}

pub type apploader_key = KeyMaterial;

struct CallbackKeyService {
    ctx: *mut c_void,
    open: extern "C" fn(ctx: *mut c_void) -> c_long,
    get_keyslot_data:
        extern "C" fn(ctx: *mut c_void, session: u32, slot: *const c_char, data: *mut u8, data_size: *mut u32) -> c_long,
    close: extern "C" fn(ctx: *mut c_void, session: u32),
}

impl CallbackKeyService {
    fn from_table(table: &apploader_key_service) -> Option<Self> {
        Some(Self {
            ctx: table.ctx,
            open: table.open?,
            get_keyslot_data: table.get_keyslot_data?,
            close: table.close?,
        })
    }
}

impl KeyService for CallbackKeyService {
    fn open(&self) -> Result<SessionHandle, KeyServiceError> {
        let rc = (self.open)(self.ctx);
        if rc < 0 {
            return Err(KeyServiceError::Status(i64::from(rc)));
        }
        u32::try_from(rc)
            .map(SessionHandle)
            .map_err(|_| KeyServiceError::Status(i64::from(rc)))
    }

    fn get_keyslot_data(
        &self,
        session: SessionHandle,
        slot: &KeySlotId,
        out: &mut [u8],
    ) -> Result<usize, KeyServiceError> {
        let slot = CString::new(slot.as_str()).map_err(|_| KeyServiceError::NotFound)?;
        let mut size = u32::try_from(out.len()).unwrap_or(u32::MAX);
        let rc = (self.get_keyslot_data)(self.ctx, session.0, slot.as_ptr(), out.as_mut_ptr(), &mut size);
        if rc < 0 {
            return Err(KeyServiceError::Status(i64::from(rc)));
        }
        Ok(size as usize)
    }

    fn close(&self, session: SessionHandle) {
        (self.close)(self.ctx, session.0)
    }
}

/// Fetch the key for `op`/`key_id` through `service`.
///
/// Returns null on any failure; the cause is logged.
#[no_mangle]
pub unsafe extern "C" fn apploader_get_key(
    service: *const apploader_key_service,
    op: *const c_char,
    key_id: u8,
) -> *mut apploader_key {
    if service.is_null() || op.is_null() {
        tracing::error!("apploader_get_key called with a null pointer");
        return std::ptr::null_mut();
    }
    let Some(service) = CallbackKeyService::from_table(&*service) else {
        tracing::error!("apploader_get_key called with an incomplete key service table");
        return std::ptr::null_mut();
    };
    let Ok(op) = CStr::from_ptr(op).to_str() else {
        tracing::error!("apploader_get_key operation name is not UTF-8");
        return std::ptr::null_mut();
    };

    match KeyResolver::new(service).resolve_key(op, key_id) {
        Some(key) => Box::into_raw(Box::new(key)),
        None => std::ptr::null_mut(),
    }
}

#[no_mangle]
pub unsafe extern "C" fn apploader_key_data(key: *const apploader_key) -> *const u8 {
    if key.is_null() {
        return std::ptr::null();
    }
    (*key).as_bytes().as_ptr()
}

#[no_mangle]
pub unsafe extern "C" fn apploader_key_len(key: *const apploader_key) -> usize {
    if key.is_null() {
        return 0;
    }
    (*key).len()
}

/// Release a key returned by `apploader_get_key`, zeroing its buffer.
#[no_mangle]
pub unsafe extern "C" fn apploader_key_free(key: *mut apploader_key) {
    if !key.is_null() {
        drop(Box::from_raw(key));
    }
}
