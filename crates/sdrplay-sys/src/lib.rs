//! Raw C ABI declarations for the SDRplay API.
//!
//! This crate mirrors the subset of `sdrplay_api.h` (API 3.x) needed to
//! control a receiver: return codes, the device record, callback tables and
//! the signatures of every exported entry point.
//!
//! Nothing here links against the vendor library. The entry points are
//! resolved by name at runtime (see the `sdrplay_binding` crate), which lets
//! the workspace build and test on machines without the SDRplay service
//! installed.
//!
//! # Safety
//!
//! All function pointer types are `unsafe extern "C"`. For a safe wrapper,
//! use the `sdrplay_binding` crate instead.

#![allow(non_upper_case_globals)]
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
#![allow(missing_docs)]

use std::os::raw::{c_char, c_double, c_float, c_int, c_short, c_uchar, c_uint, c_void};

/// API version these declarations were written against.
pub const SDRPLAY_API_VERSION: c_float = 3.15;

/// Maximum number of devices `sdrplay_api_GetDevices` can report.
pub const SDRPLAY_MAX_DEVICES: c_uint = 16;

/// Length of the serial number buffer inside [`sdrplay_api_DeviceT`].
pub const SDRPLAY_MAX_SER_NO_LEN: usize = 64;

/// Opaque device handle owned by the vendor service.
pub type HANDLE = *mut c_void;

// Return codes
pub type sdrplay_api_ErrT = c_int;

pub const sdrplay_api_Success: sdrplay_api_ErrT = 0;
pub const sdrplay_api_Fail: sdrplay_api_ErrT = 1;
pub const sdrplay_api_InvalidParam: sdrplay_api_ErrT = 2;
pub const sdrplay_api_OutOfRange: sdrplay_api_ErrT = 3;
pub const sdrplay_api_GainUpdateError: sdrplay_api_ErrT = 4;
pub const sdrplay_api_RfUpdateError: sdrplay_api_ErrT = 5;
pub const sdrplay_api_FsUpdateError: sdrplay_api_ErrT = 6;
pub const sdrplay_api_HwError: sdrplay_api_ErrT = 7;
pub const sdrplay_api_AliasingError: sdrplay_api_ErrT = 8;
pub const sdrplay_api_AlreadyInitialised: sdrplay_api_ErrT = 9;
pub const sdrplay_api_NotInitialised: sdrplay_api_ErrT = 10;
pub const sdrplay_api_NotEnabled: sdrplay_api_ErrT = 11;
pub const sdrplay_api_HwVerError: sdrplay_api_ErrT = 12;
pub const sdrplay_api_OutOfMemory: sdrplay_api_ErrT = 13;
pub const sdrplay_api_ServiceNotResponding: sdrplay_api_ErrT = 14;
pub const sdrplay_api_StartPending: sdrplay_api_ErrT = 15;
pub const sdrplay_api_StopPending: sdrplay_api_ErrT = 16;
pub const sdrplay_api_InvalidMode: sdrplay_api_ErrT = 17;
pub const sdrplay_api_FailedVerification1: sdrplay_api_ErrT = 18;
pub const sdrplay_api_FailedVerification2: sdrplay_api_ErrT = 19;
pub const sdrplay_api_FailedVerification3: sdrplay_api_ErrT = 20;
pub const sdrplay_api_FailedVerification4: sdrplay_api_ErrT = 21;
pub const sdrplay_api_FailedVerification5: sdrplay_api_ErrT = 22;
pub const sdrplay_api_FailedVerification6: sdrplay_api_ErrT = 23;
pub const sdrplay_api_InvalidServiceVersion: sdrplay_api_ErrT = 24;

// Hardware versions reported in sdrplay_api_DeviceT::hwVer
pub const SDRPLAY_RSP1_ID: c_uchar = 1;
pub const SDRPLAY_RSP2_ID: c_uchar = 2;
pub const SDRPLAY_RSPduo_ID: c_uchar = 3;
pub const SDRPLAY_RSPdx_ID: c_uchar = 4;
pub const SDRPLAY_RSP1B_ID: c_uchar = 6;
pub const SDRPLAY_RSPdxR2_ID: c_uchar = 7;
pub const SDRPLAY_RSP1A_ID: c_uchar = 255;

// Tuner selection
pub type sdrplay_api_TunerSelectT = c_int;

pub const sdrplay_api_Tuner_Neither: sdrplay_api_TunerSelectT = 0;
pub const sdrplay_api_Tuner_A: sdrplay_api_TunerSelectT = 1;
pub const sdrplay_api_Tuner_B: sdrplay_api_TunerSelectT = 2;
pub const sdrplay_api_Tuner_Both: sdrplay_api_TunerSelectT = 3;

// RSPduo operating mode
pub type sdrplay_api_RspDuoModeT = c_int;

pub const sdrplay_api_RspDuoMode_Unknown: sdrplay_api_RspDuoModeT = 0;
pub const sdrplay_api_RspDuoMode_Single_Tuner: sdrplay_api_RspDuoModeT = 1;
pub const sdrplay_api_RspDuoMode_Dual_Tuner: sdrplay_api_RspDuoModeT = 2;
pub const sdrplay_api_RspDuoMode_Master: sdrplay_api_RspDuoModeT = 4;
pub const sdrplay_api_RspDuoMode_Slave: sdrplay_api_RspDuoModeT = 8;

// Update reasons (bit masks)
pub type sdrplay_api_ReasonForUpdateT = c_uint;

pub const sdrplay_api_Update_None: sdrplay_api_ReasonForUpdateT = 0x0000_0000;
pub const sdrplay_api_Update_Dev_Fs: sdrplay_api_ReasonForUpdateT = 0x0000_0001;
pub const sdrplay_api_Update_Dev_Ppm: sdrplay_api_ReasonForUpdateT = 0x0000_0002;
pub const sdrplay_api_Update_Dev_SyncUpdate: sdrplay_api_ReasonForUpdateT = 0x0000_0004;
pub const sdrplay_api_Update_Dev_ResetFlags: sdrplay_api_ReasonForUpdateT = 0x0000_0008;
pub const sdrplay_api_Update_Rsp1a_BiasTControl: sdrplay_api_ReasonForUpdateT = 0x0000_0010;
pub const sdrplay_api_Update_Rsp1a_RfNotchControl: sdrplay_api_ReasonForUpdateT = 0x0000_0020;
pub const sdrplay_api_Update_Rsp1a_RfDabNotchControl: sdrplay_api_ReasonForUpdateT = 0x0000_0040;
pub const sdrplay_api_Update_Rsp2_BiasTControl: sdrplay_api_ReasonForUpdateT = 0x0000_0080;
pub const sdrplay_api_Update_Rsp2_AmPortSelect: sdrplay_api_ReasonForUpdateT = 0x0000_0100;
pub const sdrplay_api_Update_Rsp2_AntennaControl: sdrplay_api_ReasonForUpdateT = 0x0000_0200;
pub const sdrplay_api_Update_Rsp2_RfNotchControl: sdrplay_api_ReasonForUpdateT = 0x0000_0400;
pub const sdrplay_api_Update_Rsp2_ExtRefControl: sdrplay_api_ReasonForUpdateT = 0x0000_0800;
pub const sdrplay_api_Update_RspDuo_ExtRefControl: sdrplay_api_ReasonForUpdateT = 0x0000_1000;
pub const sdrplay_api_Update_Master_Spare_1: sdrplay_api_ReasonForUpdateT = 0x0000_2000;
pub const sdrplay_api_Update_Master_Spare_2: sdrplay_api_ReasonForUpdateT = 0x0000_4000;
pub const sdrplay_api_Update_Tuner_Gr: sdrplay_api_ReasonForUpdateT = 0x0000_8000;
pub const sdrplay_api_Update_Tuner_GrLimits: sdrplay_api_ReasonForUpdateT = 0x0001_0000;
pub const sdrplay_api_Update_Tuner_Frf: sdrplay_api_ReasonForUpdateT = 0x0002_0000;
pub const sdrplay_api_Update_Tuner_BwType: sdrplay_api_ReasonForUpdateT = 0x0004_0000;
pub const sdrplay_api_Update_Tuner_IfType: sdrplay_api_ReasonForUpdateT = 0x0008_0000;
pub const sdrplay_api_Update_Tuner_DcOffset: sdrplay_api_ReasonForUpdateT = 0x0010_0000;
pub const sdrplay_api_Update_Tuner_LoMode: sdrplay_api_ReasonForUpdateT = 0x0020_0000;
pub const sdrplay_api_Update_Ctrl_DCoffsetIQimbalance: sdrplay_api_ReasonForUpdateT = 0x0040_0000;
pub const sdrplay_api_Update_Ctrl_Decimation: sdrplay_api_ReasonForUpdateT = 0x0080_0000;
pub const sdrplay_api_Update_Ctrl_Agc: sdrplay_api_ReasonForUpdateT = 0x0100_0000;
pub const sdrplay_api_Update_Ctrl_AdsbMode: sdrplay_api_ReasonForUpdateT = 0x0200_0000;
pub const sdrplay_api_Update_Ctrl_OverloadMsgAck: sdrplay_api_ReasonForUpdateT = 0x0400_0000;
pub const sdrplay_api_Update_RspDuo_BiasTControl: sdrplay_api_ReasonForUpdateT = 0x0800_0000;
pub const sdrplay_api_Update_RspDuo_AmPortSelect: sdrplay_api_ReasonForUpdateT = 0x1000_0000;
pub const sdrplay_api_Update_RspDuo_Tuner1AmNotchControl: sdrplay_api_ReasonForUpdateT = 0x2000_0000;
pub const sdrplay_api_Update_RspDuo_RfNotchControl: sdrplay_api_ReasonForUpdateT = 0x4000_0000;
pub const sdrplay_api_Update_RspDuo_RfDabNotchControl: sdrplay_api_ReasonForUpdateT = 0x8000_0000;

pub type sdrplay_api_ReasonForUpdateExtension1T = c_uint;

pub const sdrplay_api_Update_Ext1_None: sdrplay_api_ReasonForUpdateExtension1T = 0x0000_0000;
pub const sdrplay_api_Update_RspDx_HdrEnable: sdrplay_api_ReasonForUpdateExtension1T = 0x0000_0001;
pub const sdrplay_api_Update_RspDx_BiasTControl: sdrplay_api_ReasonForUpdateExtension1T = 0x0000_0002;
pub const sdrplay_api_Update_RspDx_AmPortSelect: sdrplay_api_ReasonForUpdateExtension1T = 0x0000_0004;
pub const sdrplay_api_Update_RspDx_AntennaControl: sdrplay_api_ReasonForUpdateExtension1T = 0x0000_0008;
pub const sdrplay_api_Update_RspDx_RfNotchControl: sdrplay_api_ReasonForUpdateExtension1T = 0x0000_0010;
pub const sdrplay_api_Update_RspDx_RfDabNotchControl: sdrplay_api_ReasonForUpdateExtension1T = 0x0000_0020;
pub const sdrplay_api_Update_RspDx_HdrBw: sdrplay_api_ReasonForUpdateExtension1T = 0x0000_0040;
pub const sdrplay_api_Update_RspDuo_ResetSlaveFlags: sdrplay_api_ReasonForUpdateExtension1T = 0x0000_0080;

// Events delivered through EventCbFn
pub type sdrplay_api_EventT = c_int;

pub const sdrplay_api_GainChange: sdrplay_api_EventT = 0;
pub const sdrplay_api_PowerOverloadChange: sdrplay_api_EventT = 1;
pub const sdrplay_api_DeviceRemoved: sdrplay_api_EventT = 2;
pub const sdrplay_api_RspDuoModeChange: sdrplay_api_EventT = 3;
pub const sdrplay_api_DeviceFailure: sdrplay_api_EventT = 4;

/// One enumerated device as filled in by `sdrplay_api_GetDevices`.
#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct sdrplay_api_DeviceT {
    pub SerNo: [c_char; SDRPLAY_MAX_SER_NO_LEN],
    pub hwVer: c_uchar,
    pub tuner: sdrplay_api_TunerSelectT,
    pub rspDuoMode: sdrplay_api_RspDuoModeT,
    pub valid: c_uchar,
    pub rspDuoSampleFreq: c_double,
    pub dev: HANDLE,
}

impl Default for sdrplay_api_DeviceT {
    fn default() -> Self {
        Self {
            SerNo: [0; SDRPLAY_MAX_SER_NO_LEN],
            hwVer: 0,
            tuner: sdrplay_api_Tuner_Neither,
            rspDuoMode: sdrplay_api_RspDuoMode_Unknown,
            valid: 0,
            rspDuoSampleFreq: 0.0,
            dev: std::ptr::null_mut(),
        }
    }
}

/// Device parameter block. Layout is owned by the vendor; only pointers to it
/// cross this boundary.
#[repr(C)]
pub struct sdrplay_api_DeviceParamsT {
    _private: [u8; 0],
}

/// Per-callback stream metadata. Opaque to the binding layer.
#[repr(C)]
pub struct sdrplay_api_StreamCbParamsT {
    _private: [u8; 0],
}

/// Per-event payload. Opaque to the binding layer.
#[repr(C)]
pub struct sdrplay_api_EventParamsT {
    _private: [u8; 0],
}

pub type sdrplay_api_StreamCallback_t = Option<
    unsafe extern "C" fn(
        xi: *mut c_short,
        xq: *mut c_short,
        params: *mut sdrplay_api_StreamCbParamsT,
        numSamples: c_uint,
        reset: c_uint,
        cbContext: *mut c_void,
    ),
>;

pub type sdrplay_api_EventCallback_t = Option<
    unsafe extern "C" fn(
        eventId: sdrplay_api_EventT,
        tuner: sdrplay_api_TunerSelectT,
        params: *mut sdrplay_api_EventParamsT,
        cbContext: *mut c_void,
    ),
>;

/// Callback table handed to `sdrplay_api_Init`.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default)]
pub struct sdrplay_api_CallbackFnsT {
    pub StreamACbFn: sdrplay_api_StreamCallback_t,
    pub StreamBCbFn: sdrplay_api_StreamCallback_t,
    pub EventCbFn: sdrplay_api_EventCallback_t,
}

// Entry point signatures
pub type sdrplay_api_Open_t = unsafe extern "C" fn() -> sdrplay_api_ErrT;
pub type sdrplay_api_Close_t = unsafe extern "C" fn() -> sdrplay_api_ErrT;
pub type sdrplay_api_ApiVersion_t = unsafe extern "C" fn(apiVer: *mut c_float) -> sdrplay_api_ErrT;
pub type sdrplay_api_LockDeviceApi_t = unsafe extern "C" fn() -> sdrplay_api_ErrT;
pub type sdrplay_api_UnlockDeviceApi_t = unsafe extern "C" fn() -> sdrplay_api_ErrT;
pub type sdrplay_api_GetDevices_t = unsafe extern "C" fn(
    devices: *mut sdrplay_api_DeviceT,
    numDevs: *mut c_uint,
    maxDevs: c_uint,
) -> sdrplay_api_ErrT;
pub type sdrplay_api_SelectDevice_t =
    unsafe extern "C" fn(device: *mut sdrplay_api_DeviceT) -> sdrplay_api_ErrT;
pub type sdrplay_api_ReleaseDevice_t =
    unsafe extern "C" fn(device: *mut sdrplay_api_DeviceT) -> sdrplay_api_ErrT;
pub type sdrplay_api_GetErrorString_t =
    unsafe extern "C" fn(err: sdrplay_api_ErrT) -> *const c_char;
pub type sdrplay_api_GetDeviceParams_t = unsafe extern "C" fn(
    dev: HANDLE,
    deviceParams: *mut *mut sdrplay_api_DeviceParamsT,
) -> sdrplay_api_ErrT;
pub type sdrplay_api_Init_t = unsafe extern "C" fn(
    dev: HANDLE,
    callbackFns: *mut sdrplay_api_CallbackFnsT,
    cbContext: *mut c_void,
) -> sdrplay_api_ErrT;
pub type sdrplay_api_Uninit_t = unsafe extern "C" fn(dev: HANDLE) -> sdrplay_api_ErrT;
pub type sdrplay_api_Update_t = unsafe extern "C" fn(
    dev: HANDLE,
    tuner: sdrplay_api_TunerSelectT,
    reasonForUpdate: sdrplay_api_ReasonForUpdateT,
    reasonForUpdateExt1: sdrplay_api_ReasonForUpdateExtension1T,
) -> sdrplay_api_ErrT;

// Exported symbol names
pub const SYM_OPEN: &str = "sdrplay_api_Open";
pub const SYM_CLOSE: &str = "sdrplay_api_Close";
pub const SYM_API_VERSION: &str = "sdrplay_api_ApiVersion";
pub const SYM_LOCK_DEVICE_API: &str = "sdrplay_api_LockDeviceApi";
pub const SYM_UNLOCK_DEVICE_API: &str = "sdrplay_api_UnlockDeviceApi";
pub const SYM_GET_DEVICES: &str = "sdrplay_api_GetDevices";
pub const SYM_SELECT_DEVICE: &str = "sdrplay_api_SelectDevice";
pub const SYM_RELEASE_DEVICE: &str = "sdrplay_api_ReleaseDevice";
pub const SYM_GET_ERROR_STRING: &str = "sdrplay_api_GetErrorString";
pub const SYM_GET_DEVICE_PARAMS: &str = "sdrplay_api_GetDeviceParams";
pub const SYM_INIT: &str = "sdrplay_api_Init";
pub const SYM_UNINIT: &str = "sdrplay_api_Uninit";
pub const SYM_UPDATE: &str = "sdrplay_api_Update";

/// Every entry point a usable library must export, in resolution order.
pub const REQUIRED_ENTRY_POINTS: [&str; 13] = [
    SYM_OPEN,
    SYM_CLOSE,
    SYM_API_VERSION,
    SYM_LOCK_DEVICE_API,
    SYM_UNLOCK_DEVICE_API,
    SYM_GET_DEVICES,
    SYM_SELECT_DEVICE,
    SYM_RELEASE_DEVICE,
    SYM_GET_ERROR_STRING,
    SYM_GET_DEVICE_PARAMS,
    SYM_INIT,
    SYM_UNINIT,
    SYM_UPDATE,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_constants() {
        assert_eq!(sdrplay_api_Success, 0);
        assert_eq!(sdrplay_api_HwError, 7);
        assert_eq!(sdrplay_api_NotInitialised, 10);
        assert_eq!(sdrplay_api_InvalidServiceVersion, 24);
    }

    #[test]
    fn test_entry_points_unique() {
        let mut names = REQUIRED_ENTRY_POINTS.to_vec();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), REQUIRED_ENTRY_POINTS.len());
        assert!(names.iter().all(|n| n.starts_with("sdrplay_api_")));
    }

    #[test]
    fn test_default_device_is_empty() {
        let dev = sdrplay_api_DeviceT::default();
        assert!(dev.dev.is_null());
        assert_eq!(dev.valid, 0);
        assert!(dev.SerNo.iter().all(|&c| c == 0));
    }
}
