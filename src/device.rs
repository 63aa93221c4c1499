//! Device-facing types shared by both backends.
//!
//! [`DeviceDescriptor`] is a plain value describing one enumerated receiver.
//! [`DeviceHandle`] represents one selected receiver and is owned by the caller
//! that selected it; releasing the device consumes the handle.

#![allow(unsafe_code)]

use std::ffi::CStr;
use std::fmt;
use std::os::raw::c_void;
use std::ptr::NonNull;

use bitflags::bitflags;
use sdrplay_sys as sys;
use serde::Serialize;

/// Receiver model, derived from the hardware version byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HardwareModel {
    /// RSP1
    Rsp1,
    /// RSP1A
    Rsp1A,
    /// RSP1B
    Rsp1B,
    /// RSP2 / RSP2pro
    Rsp2,
    /// RSPduo (dual tuner)
    RspDuo,
    /// RSPdx
    RspDx,
    /// RSPdx-R2
    RspDxR2,
    /// Hardware version this crate does not know
    Unknown(u8),
}

impl HardwareModel {
    /// Convert from the raw `hwVer` value.
    pub fn from_hw_ver(hw_ver: u8) -> Self {
        match hw_ver {
            sys::SDRPLAY_RSP1_ID => Self::Rsp1,
            sys::SDRPLAY_RSP1A_ID => Self::Rsp1A,
            sys::SDRPLAY_RSP1B_ID => Self::Rsp1B,
            sys::SDRPLAY_RSP2_ID => Self::Rsp2,
            sys::SDRPLAY_RSPduo_ID => Self::RspDuo,
            sys::SDRPLAY_RSPdx_ID => Self::RspDx,
            sys::SDRPLAY_RSPdxR2_ID => Self::RspDxR2,
            other => Self::Unknown(other),
        }
    }
}

impl fmt::Display for HardwareModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rsp1 => write!(f, "RSP1"),
            Self::Rsp1A => write!(f, "RSP1A"),
            Self::Rsp1B => write!(f, "RSP1B"),
            Self::Rsp2 => write!(f, "RSP2"),
            Self::RspDuo => write!(f, "RSPduo"),
            Self::RspDx => write!(f, "RSPdx"),
            Self::RspDxR2 => write!(f, "RSPdx-R2"),
            Self::Unknown(v) => write!(f, "Unknown({})", v),
        }
    }
}

/// Tuner selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[repr(i32)]
pub enum TunerSelect {
    /// No tuner
    #[default]
    Neither = sys::sdrplay_api_Tuner_Neither,
    /// Tuner A
    A = sys::sdrplay_api_Tuner_A,
    /// Tuner B (RSPduo)
    B = sys::sdrplay_api_Tuner_B,
    /// Both tuners (RSPduo dual tuner mode)
    Both = sys::sdrplay_api_Tuner_Both,
}

impl TunerSelect {
    /// Convert from the raw vendor value.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            sys::sdrplay_api_Tuner_Neither => Some(Self::Neither),
            sys::sdrplay_api_Tuner_A => Some(Self::A),
            sys::sdrplay_api_Tuner_B => Some(Self::B),
            sys::sdrplay_api_Tuner_Both => Some(Self::Both),
            _ => None,
        }
    }

    /// Raw vendor value.
    pub fn as_raw(self) -> sys::sdrplay_api_TunerSelectT {
        self as sys::sdrplay_api_TunerSelectT
    }
}

/// RSPduo operating mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum RspDuoMode {
    /// Not an RSPduo, or mode not reported
    #[default]
    Unknown,
    /// One tuner, full bandwidth
    SingleTuner,
    /// Both tuners from one application
    DualTuner,
    /// Primary of a two-application pair
    Master,
    /// Secondary of a two-application pair
    Slave,
}

impl RspDuoMode {
    /// Convert from the raw vendor value. Unrecognised values map to `Unknown`.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            sys::sdrplay_api_RspDuoMode_Single_Tuner => Self::SingleTuner,
            sys::sdrplay_api_RspDuoMode_Dual_Tuner => Self::DualTuner,
            sys::sdrplay_api_RspDuoMode_Master => Self::Master,
            sys::sdrplay_api_RspDuoMode_Slave => Self::Slave,
            _ => Self::Unknown,
        }
    }
}

bitflags! {
    /// Which parameter groups an `update` call applies.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReasonForUpdate: u32 {
        /// `sdrplay_api_Update_Dev_Fs`
        const DEV_FS = sys::sdrplay_api_Update_Dev_Fs;
        /// `sdrplay_api_Update_Dev_Ppm`
        const DEV_PPM = sys::sdrplay_api_Update_Dev_Ppm;
        /// `sdrplay_api_Update_Dev_SyncUpdate`
        const DEV_SYNC_UPDATE = sys::sdrplay_api_Update_Dev_SyncUpdate;
        /// `sdrplay_api_Update_Dev_ResetFlags`
        const DEV_RESET_FLAGS = sys::sdrplay_api_Update_Dev_ResetFlags;
        /// `sdrplay_api_Update_Rsp1a_BiasTControl`
        const RSP1A_BIAS_T_CONTROL = sys::sdrplay_api_Update_Rsp1a_BiasTControl;
        /// `sdrplay_api_Update_Rsp1a_RfNotchControl`
        const RSP1A_RF_NOTCH_CONTROL = sys::sdrplay_api_Update_Rsp1a_RfNotchControl;
        /// `sdrplay_api_Update_Rsp1a_RfDabNotchControl`
        const RSP1A_RF_DAB_NOTCH_CONTROL = sys::sdrplay_api_Update_Rsp1a_RfDabNotchControl;
        /// `sdrplay_api_Update_Rsp2_BiasTControl`
        const RSP2_BIAS_T_CONTROL = sys::sdrplay_api_Update_Rsp2_BiasTControl;
        /// `sdrplay_api_Update_Rsp2_AmPortSelect`
        const RSP2_AM_PORT_SELECT = sys::sdrplay_api_Update_Rsp2_AmPortSelect;
        /// `sdrplay_api_Update_Rsp2_AntennaControl`
        const RSP2_ANTENNA_CONTROL = sys::sdrplay_api_Update_Rsp2_AntennaControl;
        /// `sdrplay_api_Update_Rsp2_RfNotchControl`
        const RSP2_RF_NOTCH_CONTROL = sys::sdrplay_api_Update_Rsp2_RfNotchControl;
        /// `sdrplay_api_Update_Rsp2_ExtRefControl`
        const RSP2_EXT_REF_CONTROL = sys::sdrplay_api_Update_Rsp2_ExtRefControl;
        /// `sdrplay_api_Update_RspDuo_ExtRefControl`
        const RSPDUO_EXT_REF_CONTROL = sys::sdrplay_api_Update_RspDuo_ExtRefControl;
        /// `sdrplay_api_Update_Master_Spare_1`
        const MASTER_SPARE_1 = sys::sdrplay_api_Update_Master_Spare_1;
        /// `sdrplay_api_Update_Master_Spare_2`
        const MASTER_SPARE_2 = sys::sdrplay_api_Update_Master_Spare_2;
        /// `sdrplay_api_Update_Tuner_Gr`
        const TUNER_GR = sys::sdrplay_api_Update_Tuner_Gr;
        /// `sdrplay_api_Update_Tuner_GrLimits`
        const TUNER_GR_LIMITS = sys::sdrplay_api_Update_Tuner_GrLimits;
        /// `sdrplay_api_Update_Tuner_Frf`
        const TUNER_FRF = sys::sdrplay_api_Update_Tuner_Frf;
        /// `sdrplay_api_Update_Tuner_BwType`
        const TUNER_BW_TYPE = sys::sdrplay_api_Update_Tuner_BwType;
        /// `sdrplay_api_Update_Tuner_IfType`
        const TUNER_IF_TYPE = sys::sdrplay_api_Update_Tuner_IfType;
        /// `sdrplay_api_Update_Tuner_DcOffset`
        const TUNER_DC_OFFSET = sys::sdrplay_api_Update_Tuner_DcOffset;
        /// `sdrplay_api_Update_Tuner_LoMode`
        const TUNER_LO_MODE = sys::sdrplay_api_Update_Tuner_LoMode;
        /// `sdrplay_api_Update_Ctrl_DCoffsetIQimbalance`
        const CTRL_DC_OFFSET_IQ_IMBALANCE = sys::sdrplay_api_Update_Ctrl_DCoffsetIQimbalance;
        /// `sdrplay_api_Update_Ctrl_Decimation`
        const CTRL_DECIMATION = sys::sdrplay_api_Update_Ctrl_Decimation;
        /// `sdrplay_api_Update_Ctrl_Agc`
        const CTRL_AGC = sys::sdrplay_api_Update_Ctrl_Agc;
        /// `sdrplay_api_Update_Ctrl_AdsbMode`
        const CTRL_ADSB_MODE = sys::sdrplay_api_Update_Ctrl_AdsbMode;
        /// `sdrplay_api_Update_Ctrl_OverloadMsgAck`
        const CTRL_OVERLOAD_MSG_ACK = sys::sdrplay_api_Update_Ctrl_OverloadMsgAck;
        /// `sdrplay_api_Update_RspDuo_BiasTControl`
        const RSPDUO_BIAS_T_CONTROL = sys::sdrplay_api_Update_RspDuo_BiasTControl;
        /// `sdrplay_api_Update_RspDuo_AmPortSelect`
        const RSPDUO_AM_PORT_SELECT = sys::sdrplay_api_Update_RspDuo_AmPortSelect;
        /// `sdrplay_api_Update_RspDuo_Tuner1AmNotchControl`
        const RSPDUO_TUNER1_AM_NOTCH_CONTROL = sys::sdrplay_api_Update_RspDuo_Tuner1AmNotchControl;
        /// `sdrplay_api_Update_RspDuo_RfNotchControl`
        const RSPDUO_RF_NOTCH_CONTROL = sys::sdrplay_api_Update_RspDuo_RfNotchControl;
        /// `sdrplay_api_Update_RspDuo_RfDabNotchControl`
        const RSPDUO_RF_DAB_NOTCH_CONTROL = sys::sdrplay_api_Update_RspDuo_RfDabNotchControl;
    }
}

bitflags! {
    /// Extension mask for `update` (RSPdx and RSPduo specific groups).
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ReasonForUpdateExt1: u32 {
        /// `sdrplay_api_Update_RspDx_HdrEnable`
        const RSPDX_HDR_ENABLE = sys::sdrplay_api_Update_RspDx_HdrEnable;
        /// `sdrplay_api_Update_RspDx_BiasTControl`
        const RSPDX_BIAS_T_CONTROL = sys::sdrplay_api_Update_RspDx_BiasTControl;
        /// `sdrplay_api_Update_RspDx_AmPortSelect`
        const RSPDX_AM_PORT_SELECT = sys::sdrplay_api_Update_RspDx_AmPortSelect;
        /// `sdrplay_api_Update_RspDx_AntennaControl`
        const RSPDX_ANTENNA_CONTROL = sys::sdrplay_api_Update_RspDx_AntennaControl;
        /// `sdrplay_api_Update_RspDx_RfNotchControl`
        const RSPDX_RF_NOTCH_CONTROL = sys::sdrplay_api_Update_RspDx_RfNotchControl;
        /// `sdrplay_api_Update_RspDx_RfDabNotchControl`
        const RSPDX_RF_DAB_NOTCH_CONTROL = sys::sdrplay_api_Update_RspDx_RfDabNotchControl;
        /// `sdrplay_api_Update_RspDx_HdrBw`
        const RSPDX_HDR_BW = sys::sdrplay_api_Update_RspDx_HdrBw;
        /// `sdrplay_api_Update_RspDuo_ResetSlaveFlags`
        const RSPDUO_RESET_SLAVE_FLAGS = sys::sdrplay_api_Update_RspDuo_ResetSlaveFlags;
    }
}

/// Raw vendor device record.
///
/// Carries the vendor's `dev` handle pointer, which is only ever passed back
/// to the library that produced it.
#[derive(Clone, Copy)]
pub(crate) struct RawDevice(pub(crate) sys::sdrplay_api_DeviceT);

// SAFETY: the embedded HANDLE is an opaque token owned by the vendor service.
// This crate never dereferences it; it is only handed back to the vendor API,
// which is callable from any thread.
unsafe impl Send for RawDevice {}
unsafe impl Sync for RawDevice {}

/// One enumerated receiver.
#[derive(Clone, Serialize)]
pub struct DeviceDescriptor {
    /// Serial number
    pub serial: String,
    /// Receiver model
    pub model: HardwareModel,
    /// Raw hardware version byte
    pub hw_ver: u8,
    /// Tuner(s) this entry refers to (RSPduo reports one entry per mode)
    pub tuner: Option<TunerSelect>,
    /// RSPduo mode, `Unknown` for other models
    pub rsp_duo_mode: RspDuoMode,
    /// RSPduo sample rate in Hz when running as slave
    pub rsp_duo_sample_freq: f64,
    /// Whether the vendor marked this entry usable
    pub valid: bool,
    #[serde(skip)]
    pub(crate) raw: RawDevice,
}

impl DeviceDescriptor {
    /// Build a descriptor from a vendor record.
    pub(crate) fn from_raw(raw: &sys::sdrplay_api_DeviceT) -> Self {
        let bytes: Vec<u8> = raw
            .SerNo
            .iter()
            .take_while(|&&c| c != 0)
            .map(|&c| c as u8)
            .collect();
        let serial = String::from_utf8_lossy(&bytes).into_owned();

        Self {
            serial,
            model: HardwareModel::from_hw_ver(raw.hwVer),
            hw_ver: raw.hwVer,
            tuner: TunerSelect::from_raw(raw.tuner),
            rsp_duo_mode: RspDuoMode::from_raw(raw.rspDuoMode),
            rsp_duo_sample_freq: raw.rspDuoSampleFreq,
            valid: raw.valid != 0,
            raw: RawDevice(*raw),
        }
    }
}

impl fmt::Debug for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceDescriptor")
            .field("serial", &self.serial)
            .field("model", &self.model)
            .field("tuner", &self.tuner)
            .field("rsp_duo_mode", &self.rsp_duo_mode)
            .field("valid", &self.valid)
            .finish_non_exhaustive()
    }
}

/// A selected receiver.
///
/// Owned by whoever called `select_device`. Not `Clone`: releasing the
/// device consumes the handle, so a released handle cannot be reused.
pub struct DeviceHandle {
    id: u64,
    serial: String,
    pub(crate) raw: RawDevice,
}

impl DeviceHandle {
    pub(crate) fn new(id: u64, serial: String, raw: RawDevice) -> Self {
        Self { id, serial, raw }
    }

    /// Facade-local identifier for this selection.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Serial number of the selected receiver.
    pub fn serial(&self) -> &str {
        &self.serial
    }

    /// Vendor device handle.
    pub(crate) fn dev(&self) -> sys::HANDLE {
        self.raw.0.dev
    }
}

impl fmt::Debug for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceHandle")
            .field("id", &self.id)
            .field("serial", &self.serial)
            .finish()
    }
}

/// Pointer to the vendor's parameter block for one device.
///
/// Valid until the device is released. Field layout belongs to the vendor
/// headers; this crate only passes the pointer through.
#[derive(Debug, Clone, Copy)]
pub struct ParamsHandle(NonNull<sys::sdrplay_api_DeviceParamsT>);

impl ParamsHandle {
    pub(crate) fn new(ptr: *mut sys::sdrplay_api_DeviceParamsT) -> Option<Self> {
        NonNull::new(ptr).map(Self)
    }

    /// Raw pointer for use with the vendor headers.
    pub fn as_ptr(&self) -> *mut sys::sdrplay_api_DeviceParamsT {
        self.0.as_ptr()
    }
}

/// Stream and event callbacks passed to `init`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Callbacks {
    /// Sample callback for tuner A
    pub stream_a: sys::sdrplay_api_StreamCallback_t,
    /// Sample callback for tuner B (RSPduo dual tuner only)
    pub stream_b: sys::sdrplay_api_StreamCallback_t,
    /// Event callback
    pub event: sys::sdrplay_api_EventCallback_t,
}

impl Callbacks {
    pub(crate) fn to_raw(self) -> sys::sdrplay_api_CallbackFnsT {
        sys::sdrplay_api_CallbackFnsT {
            StreamACbFn: self.stream_a,
            StreamBCbFn: self.stream_b,
            EventCbFn: self.event,
        }
    }
}

/// Opaque context pointer handed back to every callback invocation.
#[derive(Debug, Clone, Copy)]
pub struct CallbackContext(*mut c_void);

// SAFETY: the pointer is never dereferenced by this crate. The caller that
// created it is responsible for what its callbacks do with it.
unsafe impl Send for CallbackContext {}
unsafe impl Sync for CallbackContext {}

impl CallbackContext {
    /// Wrap a caller-owned pointer.
    pub fn new(ptr: *mut c_void) -> Self {
        Self(ptr)
    }

    /// A context carrying no data.
    pub fn null() -> Self {
        Self(std::ptr::null_mut())
    }

    /// The wrapped pointer.
    pub fn as_ptr(&self) -> *mut c_void {
        self.0
    }
}

impl Default for CallbackContext {
    fn default() -> Self {
        Self::null()
    }
}

/// Callbacks registered for one handle.
///
/// Lives inside the facade's entry for the handle and is dropped when the
/// handle is uninitialised or released.
#[derive(Debug, Clone, Copy)]
pub struct CallbackRegistration {
    /// Handle the callbacks belong to
    pub handle_id: u64,
    /// Registered callbacks
    pub callbacks: Callbacks,
    /// Context passed to each callback
    pub context: CallbackContext,
}

/// Read a NUL-terminated vendor string.
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string that outlives the call.
pub(crate) unsafe fn c_string_lossy(ptr: *const std::os::raw::c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(CStr::from_ptr(ptr).to_string_lossy().into_owned())
}
