//! In-process stand-in for the vendor library, used by unit tests.
//!
//! Every entry point is a Rust `extern "C"` function with the vendor
//! signature. Call counts and behaviour switches are thread-local, so tests
//! running in parallel never see each other's calls.

#![allow(unsafe_code)]

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::os::raw::{c_char, c_float, c_uint, c_void};
use std::sync::Arc;

use sdrplay_sys as sys;

use crate::backend::Backend;
use crate::error::LoadError;
use crate::loader::FunctionTable;
use crate::vendor::VendorBackend;

/// Number of receivers the double reports, whatever the caller asks for.
pub(crate) const ATTACHED_DEVICES: u32 = 3;

/// Handle value written by `SelectDevice`.
pub(crate) const FAKE_DEV: usize = 0x5d8;

/// Text returned by `GetErrorString` for codes without a special case.
pub(crate) const DOUBLE_ERROR_TEXT: &str = "double: vendor error text";

#[derive(Debug, Default, Clone)]
pub(crate) struct Calls {
    pub open: u32,
    pub close: u32,
    pub lock: u32,
    pub unlock: u32,
    pub select: u32,
    pub release: u32,
    pub init: u32,
    pub uninit: u32,
    pub update: u32,
    pub last_max_devs: Option<u32>,
    pub last_reason: Option<(u32, u32)>,
}

thread_local! {
    static CALLS: RefCell<Calls> = RefCell::new(Calls::default());
    static VERSION: Cell<f32> = const { Cell::new(sys::SDRPLAY_API_VERSION) };
    static INIT_HOOK: RefCell<Option<Box<dyn FnOnce()>>> = RefCell::new(None);
    static SELECT_HOOK: RefCell<Option<Box<dyn FnOnce()>>> = RefCell::new(None);
}

/// Snapshot of this thread's call counts.
pub(crate) fn calls() -> Calls {
    CALLS.with(|c| c.borrow().clone())
}

/// Version the double reports from `ApiVersion`.
pub(crate) fn set_version(version: f32) {
    VERSION.with(|v| v.set(version));
}

/// Run `hook` inside the next `Init` call, before it returns.
pub(crate) fn on_next_init(hook: impl FnOnce() + 'static) {
    INIT_HOOK.with(|h| *h.borrow_mut() = Some(Box::new(hook)));
}

/// Run `hook` inside the next `SelectDevice` call, before it returns.
pub(crate) fn on_next_select(hook: impl FnOnce() + 'static) {
    SELECT_HOOK.with(|h| *h.borrow_mut() = Some(Box::new(hook)));
}

fn record(f: impl FnOnce(&mut Calls)) {
    CALLS.with(|c| f(&mut c.borrow_mut()));
}

extern "C" fn open() -> sys::sdrplay_api_ErrT {
    record(|c| c.open += 1);
    sys::sdrplay_api_Success
}

extern "C" fn close() -> sys::sdrplay_api_ErrT {
    record(|c| c.close += 1);
    sys::sdrplay_api_Success
}

unsafe extern "C" fn api_version(version: *mut c_float) -> sys::sdrplay_api_ErrT {
    *version = VERSION.with(Cell::get);
    sys::sdrplay_api_Success
}

extern "C" fn lock_device_api() -> sys::sdrplay_api_ErrT {
    record(|c| c.lock += 1);
    sys::sdrplay_api_Success
}

extern "C" fn unlock_device_api() -> sys::sdrplay_api_ErrT {
    record(|c| c.unlock += 1);
    sys::sdrplay_api_Success
}

/// Writes `min(max_devs, ATTACHED_DEVICES)` records but always reports
/// `ATTACHED_DEVICES` in `num_devs`.
unsafe extern "C" fn get_devices(
    devices: *mut sys::sdrplay_api_DeviceT,
    num_devs: *mut c_uint,
    max_devs: c_uint,
) -> sys::sdrplay_api_ErrT {
    record(|c| c.last_max_devs = Some(max_devs));
    for i in 0..max_devs.min(ATTACHED_DEVICES) {
        let mut dev = sys::sdrplay_api_DeviceT::default();
        let serial = format!("DBL{:04}", i + 1);
        for (dst, src) in dev.SerNo.iter_mut().zip(serial.bytes()) {
            *dst = src as c_char;
        }
        dev.hwVer = sys::SDRPLAY_RSP1A_ID;
        dev.tuner = sys::sdrplay_api_Tuner_A;
        dev.valid = 1;
        *devices.add(i as usize) = dev;
    }
    *num_devs = ATTACHED_DEVICES;
    sys::sdrplay_api_Success
}

unsafe extern "C" fn select_device(device: *mut sys::sdrplay_api_DeviceT) -> sys::sdrplay_api_ErrT {
    record(|c| c.select += 1);
    (*device).dev = FAKE_DEV as sys::HANDLE;
    if let Some(hook) = SELECT_HOOK.with(|h| h.borrow_mut().take()) {
        hook();
    }
    sys::sdrplay_api_Success
}

extern "C" fn release_device(_device: *mut sys::sdrplay_api_DeviceT) -> sys::sdrplay_api_ErrT {
    record(|c| c.release += 1);
    sys::sdrplay_api_Success
}

/// `Fail` yields null, `InvalidParam` an empty string, anything else fixed text.
extern "C" fn get_error_string(err: sys::sdrplay_api_ErrT) -> *const c_char {
    match err {
        sys::sdrplay_api_Fail => std::ptr::null(),
        sys::sdrplay_api_InvalidParam => b"\0".as_ptr().cast(),
        _ => b"double: vendor error text\0".as_ptr().cast(),
    }
}

unsafe extern "C" fn get_device_params(
    _dev: sys::HANDLE,
    params: *mut *mut sys::sdrplay_api_DeviceParamsT,
) -> sys::sdrplay_api_ErrT {
    *params = std::ptr::NonNull::dangling().as_ptr();
    sys::sdrplay_api_Success
}

extern "C" fn init(
    _dev: sys::HANDLE,
    _callbacks: *mut sys::sdrplay_api_CallbackFnsT,
    _context: *mut c_void,
) -> sys::sdrplay_api_ErrT {
    record(|c| c.init += 1);
    if let Some(hook) = INIT_HOOK.with(|h| h.borrow_mut().take()) {
        hook();
    }
    sys::sdrplay_api_Success
}

extern "C" fn uninit(_dev: sys::HANDLE) -> sys::sdrplay_api_ErrT {
    record(|c| c.uninit += 1);
    sys::sdrplay_api_Success
}

extern "C" fn update(
    _dev: sys::HANDLE,
    _tuner: sys::sdrplay_api_TunerSelectT,
    reason: sys::sdrplay_api_ReasonForUpdateT,
    reason_ext: sys::sdrplay_api_ReasonForUpdateExtension1T,
) -> sys::sdrplay_api_ErrT {
    record(|c| {
        c.update += 1;
        c.last_reason = Some((reason, reason_ext));
    });
    sys::sdrplay_api_Success
}

/// Exported name to address, like a symbol table of the real library.
pub(crate) fn exports() -> HashMap<&'static str, *mut c_void> {
    let open: sys::sdrplay_api_Open_t = open;
    let close: sys::sdrplay_api_Close_t = close;
    let api_version: sys::sdrplay_api_ApiVersion_t = api_version;
    let lock: sys::sdrplay_api_LockDeviceApi_t = lock_device_api;
    let unlock: sys::sdrplay_api_UnlockDeviceApi_t = unlock_device_api;
    let get_devices: sys::sdrplay_api_GetDevices_t = get_devices;
    let select: sys::sdrplay_api_SelectDevice_t = select_device;
    let release: sys::sdrplay_api_ReleaseDevice_t = release_device;
    let error_string: sys::sdrplay_api_GetErrorString_t = get_error_string;
    let params: sys::sdrplay_api_GetDeviceParams_t = get_device_params;
    let init: sys::sdrplay_api_Init_t = init;
    let uninit: sys::sdrplay_api_Uninit_t = uninit;
    let update: sys::sdrplay_api_Update_t = update;

    HashMap::from([
        (sys::SYM_OPEN, open as *mut c_void),
        (sys::SYM_CLOSE, close as *mut c_void),
        (sys::SYM_API_VERSION, api_version as *mut c_void),
        (sys::SYM_LOCK_DEVICE_API, lock as *mut c_void),
        (sys::SYM_UNLOCK_DEVICE_API, unlock as *mut c_void),
        (sys::SYM_GET_DEVICES, get_devices as *mut c_void),
        (sys::SYM_SELECT_DEVICE, select as *mut c_void),
        (sys::SYM_RELEASE_DEVICE, release as *mut c_void),
        (sys::SYM_GET_ERROR_STRING, error_string as *mut c_void),
        (sys::SYM_GET_DEVICE_PARAMS, params as *mut c_void),
        (sys::SYM_INIT, init as *mut c_void),
        (sys::SYM_UNINIT, uninit as *mut c_void),
        (sys::SYM_UPDATE, update as *mut c_void),
    ])
}

/// Resolve a table from the double's exports, leaving out `missing`.
pub(crate) fn table_without(missing: &[&str]) -> Result<FunctionTable, LoadError> {
    let mut exports = exports();
    for name in missing {
        exports.remove(*name);
    }
    FunctionTable::resolve_with("vendor-double", |name| exports.get(name).copied())
}

/// A vendor backend dispatching into the double.
pub(crate) fn backend() -> Arc<Backend> {
    match table_without(&[]) {
        Ok(table) => Arc::new(Backend::VendorLoaded(VendorBackend::new(Arc::new(table)))),
        Err(e) => panic!("double exports every entry point: {e}"),
    }
}
