//! Backend that forwards every call to the loaded vendor library.
//!
//! Parameters are marshalled to the C ABI and the raw return code is mapped
//! back through [`ErrorCode::from_raw`]. No locking is added here: the vendor
//! API serialises access itself (`LockDeviceApi`), and blocking behaviour is
//! whatever the library does.

#![allow(unsafe_code)]

use std::borrow::Cow;
use std::os::raw::c_uint;
use std::sync::Arc;

use sdrplay_sys as sys;
use tracing::trace;

use crate::backend::{ApiBackend, BackendKind};
use crate::device::{
    c_string_lossy, CallbackContext, DeviceDescriptor, DeviceHandle, ParamsHandle,
    ReasonForUpdate, ReasonForUpdateExt1, TunerSelect,
};
use crate::error::ErrorCode;
use crate::loader::FunctionTable;

/// Dispatches through a fully resolved [`FunctionTable`].
#[derive(Debug, Clone)]
pub struct VendorBackend {
    table: Arc<FunctionTable>,
}

impl VendorBackend {
    /// Wrap a resolved table.
    pub fn new(table: Arc<FunctionTable>) -> Self {
        Self { table }
    }

    /// Where the library was loaded from.
    pub fn library_path(&self) -> &str {
        self.table.path()
    }
}

impl ApiBackend for VendorBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Vendor
    }

    fn open(&self) -> ErrorCode {
        // SAFETY: entry point resolved with the declared signature; no arguments.
        ErrorCode::from_raw(unsafe { (self.table.open)() })
    }

    fn close(&self) -> ErrorCode {
        // SAFETY: as above.
        ErrorCode::from_raw(unsafe { (self.table.close)() })
    }

    fn api_version(&self, version: &mut f32) -> ErrorCode {
        // SAFETY: `version` is a valid, writable f32 for the whole call.
        ErrorCode::from_raw(unsafe { (self.table.api_version)(version) })
    }

    fn lock_device_api(&self) -> ErrorCode {
        // SAFETY: no arguments.
        ErrorCode::from_raw(unsafe { (self.table.lock_device_api)() })
    }

    fn unlock_device_api(&self) -> ErrorCode {
        // SAFETY: no arguments.
        ErrorCode::from_raw(unsafe { (self.table.unlock_device_api)() })
    }

    fn get_devices(
        &self,
        devices: &mut [sys::sdrplay_api_DeviceT],
        num_devs: &mut u32,
        max_devs: u32,
    ) -> ErrorCode {
        let capacity = c_uint::try_from(devices.len()).unwrap_or(c_uint::MAX);
        let max_devs = max_devs.min(capacity);
        trace!(max_devs, "sdrplay_api_GetDevices");

        // SAFETY: the library writes at most `max_devs` records, and
        // `max_devs <= devices.len()`.
        let raw = unsafe { (self.table.get_devices)(devices.as_mut_ptr(), num_devs, max_devs) };
        *num_devs = (*num_devs).min(max_devs);
        ErrorCode::from_raw(raw)
    }

    fn select_device(&self, device: &mut DeviceDescriptor) -> ErrorCode {
        // SAFETY: the record came from GetDevices on this same library.
        let raw = unsafe { (self.table.select_device)(&mut device.raw.0) };
        ErrorCode::from_raw(raw)
    }

    fn release_device(&self, handle: &mut DeviceHandle) -> ErrorCode {
        // SAFETY: the record was selected through this library.
        let raw = unsafe { (self.table.release_device)(&mut handle.raw.0) };
        ErrorCode::from_raw(raw)
    }

    fn error_string(&self, code: ErrorCode) -> Cow<'static, str> {
        let Some(raw) = code.to_raw() else {
            return Cow::Owned(code.to_string());
        };

        // SAFETY: the library returns a pointer to a static string table (or null).
        let text = unsafe { c_string_lossy((self.table.get_error_string)(raw)) };
        match text {
            Some(text) if !text.is_empty() => Cow::Owned(text),
            _ => Cow::Owned(code.to_string()),
        }
    }

    fn device_params(&self, handle: &DeviceHandle, params: &mut Option<ParamsHandle>) -> ErrorCode {
        let mut ptr: *mut sys::sdrplay_api_DeviceParamsT = std::ptr::null_mut();
        // SAFETY: `handle.dev()` was produced by SelectDevice; `ptr` is writable.
        let raw = unsafe { (self.table.get_device_params)(handle.dev(), &mut ptr) };
        *params = ParamsHandle::new(ptr);
        ErrorCode::from_raw(raw)
    }

    fn init(
        &self,
        handle: &DeviceHandle,
        callbacks: &mut sys::sdrplay_api_CallbackFnsT,
        context: CallbackContext,
    ) -> ErrorCode {
        // SAFETY: the callback table is kept at a stable address by the caller
        // until Uninit; the context pointer is opaque to us and the library.
        let raw = unsafe { (self.table.init)(handle.dev(), callbacks, context.as_ptr()) };
        ErrorCode::from_raw(raw)
    }

    fn uninit(&self, handle: &DeviceHandle) -> ErrorCode {
        // SAFETY: handle produced by SelectDevice.
        ErrorCode::from_raw(unsafe { (self.table.uninit)(handle.dev()) })
    }

    fn update(
        &self,
        handle: &DeviceHandle,
        tuner: TunerSelect,
        reason: ReasonForUpdate,
        reason_ext: ReasonForUpdateExt1,
    ) -> ErrorCode {
        trace!(?tuner, reason = reason.bits(), reason_ext = reason_ext.bits(), "sdrplay_api_Update");
        // SAFETY: handle produced by SelectDevice; remaining arguments are plain values.
        let raw = unsafe {
            (self.table.update)(handle.dev(), tuner.as_raw(), reason.bits(), reason_ext.bits())
        };
        ErrorCode::from_raw(raw)
    }
}
