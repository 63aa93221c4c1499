//! Fallback backend used when no vendor library is available.
//!
//! Every hardware-dependent call reports [`ErrorCode::NotInitialised`];
//! every cleanup call reports [`ErrorCode::Success`] so shutdown sequences
//! written for real hardware still run clean. Calls are pure: no state is
//! kept and nothing is allocated.

use std::borrow::Cow;

use sdrplay_sys as sys;

use crate::backend::{ApiBackend, BackendKind};
use crate::device::{
    CallbackContext, DeviceDescriptor, DeviceHandle, ParamsHandle, ReasonForUpdate,
    ReasonForUpdateExt1, TunerSelect,
};
use crate::error::ErrorCode;

/// Text returned by the stub for every error code.
pub const STUB_ERROR_STRING: &str = "SDRplay API not available (stub build)";

/// Backend that always reports "hardware not found".
#[derive(Debug, Clone, Copy, Default)]
pub struct StubBackend;

impl ApiBackend for StubBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Stub
    }

    fn open(&self) -> ErrorCode {
        ErrorCode::NotInitialised
    }

    fn close(&self) -> ErrorCode {
        ErrorCode::Success
    }

    fn api_version(&self, version: &mut f32) -> ErrorCode {
        *version = 0.0;
        ErrorCode::NotInitialised
    }

    fn lock_device_api(&self) -> ErrorCode {
        ErrorCode::NotInitialised
    }

    fn unlock_device_api(&self) -> ErrorCode {
        ErrorCode::Success
    }

    fn get_devices(
        &self,
        _devices: &mut [sys::sdrplay_api_DeviceT],
        num_devs: &mut u32,
        _max_devs: u32,
    ) -> ErrorCode {
        *num_devs = 0;
        ErrorCode::NotInitialised
    }

    fn select_device(&self, _device: &mut DeviceDescriptor) -> ErrorCode {
        ErrorCode::NotInitialised
    }

    fn release_device(&self, _handle: &mut DeviceHandle) -> ErrorCode {
        ErrorCode::Success
    }

    fn error_string(&self, _code: ErrorCode) -> Cow<'static, str> {
        Cow::Borrowed(STUB_ERROR_STRING)
    }

    fn device_params(&self, _handle: &DeviceHandle, _params: &mut Option<ParamsHandle>) -> ErrorCode {
        ErrorCode::NotInitialised
    }

    fn init(
        &self,
        _handle: &DeviceHandle,
        _callbacks: &mut sys::sdrplay_api_CallbackFnsT,
        _context: CallbackContext,
    ) -> ErrorCode {
        ErrorCode::NotInitialised
    }

    fn uninit(&self, _handle: &DeviceHandle) -> ErrorCode {
        ErrorCode::Success
    }

    fn update(
        &self,
        _handle: &DeviceHandle,
        _tuner: TunerSelect,
        _reason: ReasonForUpdate,
        _reason_ext: ReasonForUpdateExt1,
    ) -> ErrorCode {
        ErrorCode::NotInitialised
    }
}
