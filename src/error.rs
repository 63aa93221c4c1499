//! Error types for the binding layer.
//!
//! Two families of failure exist and they never mix:
//!
//! - **`ErrorCode`**: the per-operation outcome returned by every API call.
//!   It mirrors the vendor's `sdrplay_api_ErrT` values one to one and adds two
//!   binding-level codes (`DeviceNotOpened`, `Unknown`). Codes are returned as
//!   values; nothing in this crate panics on a failing call.
//! - **`LoadError`**: why the vendor library could not be used. These are
//!   absorbed by backend selection (the stub takes over) and only surface
//!   through diagnostics such as `Backend::fallback_reason`.

use std::os::raw::c_int;

use sdrplay_sys as sys;
use thiserror::Error;

/// Outcome of a single API operation.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Operation completed.
    #[error("success")]
    Success,
    /// Generic failure.
    #[error("operation failed")]
    Fail,
    /// An argument was rejected.
    #[error("invalid parameter")]
    InvalidParam,
    /// A parameter is outside its allowed range.
    #[error("parameter out of range")]
    OutOfRange,
    /// Gain change could not be applied.
    #[error("gain update error")]
    GainUpdateError,
    /// RF frequency change could not be applied.
    #[error("RF frequency update error")]
    RfUpdateError,
    /// Sample rate change could not be applied.
    #[error("sample rate update error")]
    FsUpdateError,
    /// The receiver reported a hardware fault (vendor `HwError`).
    #[error("hardware error")]
    HardwareError,
    /// Sample rate and decimation alias.
    #[error("aliasing error")]
    AliasingError,
    /// Streaming is already running.
    #[error("already initialised")]
    AlreadyInitialised,
    /// The API or device is not initialised (also: no hardware).
    #[error("not initialised")]
    NotInitialised,
    /// Feature not enabled on this device.
    #[error("not enabled")]
    NotEnabled,
    /// Unsupported hardware version.
    #[error("hardware version error")]
    HwVerError,
    /// Vendor allocation failed.
    #[error("out of memory")]
    OutOfMemory,
    /// The API service did not answer.
    #[error("API service not responding")]
    ServiceNotResponding,
    /// Start request still in progress.
    #[error("start pending")]
    StartPending,
    /// Stop request still in progress.
    #[error("stop pending")]
    StopPending,
    /// Operation not valid in the current mode.
    #[error("invalid mode")]
    InvalidMode,
    /// Vendor verification failures 1 through 6.
    #[error("failed verification step {0}")]
    FailedVerification(u8),
    /// Service and library versions disagree.
    #[error("invalid API service version")]
    InvalidServiceVersion,
    /// The handle is not (or no longer) tracked by the facade.
    #[error("device not opened")]
    DeviceNotOpened,
    /// A raw code outside the known table.
    #[error("unknown error code {0}")]
    Unknown(i32),
}

/// Convenience alias for facade results.
pub type ApiResult<T> = std::result::Result<T, ErrorCode>;

impl ErrorCode {
    /// Every named code, including the binding-level `DeviceNotOpened`.
    pub const ALL: [ErrorCode; 26] = [
        Self::Success,
        Self::Fail,
        Self::InvalidParam,
        Self::OutOfRange,
        Self::GainUpdateError,
        Self::RfUpdateError,
        Self::FsUpdateError,
        Self::HardwareError,
        Self::AliasingError,
        Self::AlreadyInitialised,
        Self::NotInitialised,
        Self::NotEnabled,
        Self::HwVerError,
        Self::OutOfMemory,
        Self::ServiceNotResponding,
        Self::StartPending,
        Self::StopPending,
        Self::InvalidMode,
        Self::FailedVerification(1),
        Self::FailedVerification(2),
        Self::FailedVerification(3),
        Self::FailedVerification(4),
        Self::FailedVerification(5),
        Self::FailedVerification(6),
        Self::InvalidServiceVersion,
        Self::DeviceNotOpened,
    ];

    /// Convert a raw vendor return code.
    pub fn from_raw(raw: c_int) -> Self {
        match raw {
            sys::sdrplay_api_Success => Self::Success,
            sys::sdrplay_api_Fail => Self::Fail,
            sys::sdrplay_api_InvalidParam => Self::InvalidParam,
            sys::sdrplay_api_OutOfRange => Self::OutOfRange,
            sys::sdrplay_api_GainUpdateError => Self::GainUpdateError,
            sys::sdrplay_api_RfUpdateError => Self::RfUpdateError,
            sys::sdrplay_api_FsUpdateError => Self::FsUpdateError,
            sys::sdrplay_api_HwError => Self::HardwareError,
            sys::sdrplay_api_AliasingError => Self::AliasingError,
            sys::sdrplay_api_AlreadyInitialised => Self::AlreadyInitialised,
            sys::sdrplay_api_NotInitialised => Self::NotInitialised,
            sys::sdrplay_api_NotEnabled => Self::NotEnabled,
            sys::sdrplay_api_HwVerError => Self::HwVerError,
            sys::sdrplay_api_OutOfMemory => Self::OutOfMemory,
            sys::sdrplay_api_ServiceNotResponding => Self::ServiceNotResponding,
            sys::sdrplay_api_StartPending => Self::StartPending,
            sys::sdrplay_api_StopPending => Self::StopPending,
            sys::sdrplay_api_InvalidMode => Self::InvalidMode,
            sys::sdrplay_api_FailedVerification1..=sys::sdrplay_api_FailedVerification6 => {
                Self::FailedVerification((raw - sys::sdrplay_api_FailedVerification1 + 1) as u8)
            }
            sys::sdrplay_api_InvalidServiceVersion => Self::InvalidServiceVersion,
            other => Self::Unknown(other),
        }
    }

    /// Raw vendor value, if this code has one.
    ///
    /// `DeviceNotOpened` is produced by the binding itself and never crosses
    /// the C boundary.
    pub fn to_raw(self) -> Option<c_int> {
        let raw = match self {
            Self::Success => sys::sdrplay_api_Success,
            Self::Fail => sys::sdrplay_api_Fail,
            Self::InvalidParam => sys::sdrplay_api_InvalidParam,
            Self::OutOfRange => sys::sdrplay_api_OutOfRange,
            Self::GainUpdateError => sys::sdrplay_api_GainUpdateError,
            Self::RfUpdateError => sys::sdrplay_api_RfUpdateError,
            Self::FsUpdateError => sys::sdrplay_api_FsUpdateError,
            Self::HardwareError => sys::sdrplay_api_HwError,
            Self::AliasingError => sys::sdrplay_api_AliasingError,
            Self::AlreadyInitialised => sys::sdrplay_api_AlreadyInitialised,
            Self::NotInitialised => sys::sdrplay_api_NotInitialised,
            Self::NotEnabled => sys::sdrplay_api_NotEnabled,
            Self::HwVerError => sys::sdrplay_api_HwVerError,
            Self::OutOfMemory => sys::sdrplay_api_OutOfMemory,
            Self::ServiceNotResponding => sys::sdrplay_api_ServiceNotResponding,
            Self::StartPending => sys::sdrplay_api_StartPending,
            Self::StopPending => sys::sdrplay_api_StopPending,
            Self::InvalidMode => sys::sdrplay_api_InvalidMode,
            Self::FailedVerification(step @ 1..=6) => {
                sys::sdrplay_api_FailedVerification1 + c_int::from(step) - 1
            }
            Self::FailedVerification(_) => return None,
            Self::InvalidServiceVersion => sys::sdrplay_api_InvalidServiceVersion,
            Self::DeviceNotOpened => return None,
            Self::Unknown(raw) => raw,
        };
        Some(raw)
    }

    /// Check if this code reports success.
    pub fn is_success(self) -> bool {
        self == Self::Success
    }

    /// `Ok(())` for `Success`, otherwise `Err(self)`.
    pub fn into_result(self) -> ApiResult<()> {
        if self.is_success() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

/// Reasons the vendor library could not be bound.
///
/// Cloneable so the loader can cache the outcome of its single attempt.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No candidate library exists on this system.
    #[error("SDRplay API library not found (tried: {})", .tried.join(", "))]
    NotFound {
        /// Every candidate path or name that was tried
        tried: Vec<String>,
    },

    /// The library loaded but lacks a required entry point (incompatible version).
    #[error("SDRplay API library '{path}' is missing entry point '{symbol}'")]
    SymbolMissing {
        /// Library that was loaded
        path: String,
        /// First entry point that failed to resolve
        symbol: String,
    },

    /// The OS loader refused the library (permissions, architecture, bad image).
    #[error("SDRplay API library '{path}' was rejected by the loader: {reason}")]
    LoadRejected {
        /// Library that was rejected
        path: String,
        /// OS loader message
        reason: String,
    },
}

impl LoadError {
    /// Check if this is a "library not installed" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Name of the missing entry point, if that is why loading failed.
    pub fn missing_symbol(&self) -> Option<&str> {
        match self {
            Self::SymbolMissing { symbol, .. } => Some(symbol),
            _ => None,
        }
    }
}
