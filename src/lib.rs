//! # SDRplay API Bindings
//!
//! Runtime-pluggable access to the SDRplay receiver API. The vendor library
//! is never linked at build time: it is located and bound when the process
//! first needs it, and when it is missing or unusable every call is answered
//! by a stub that reports "hardware not found". Callers see one surface
//! either way.
//!
//! ## Crate Structure
//!
//! - **`api`**: the `SdrplayApi` facade every caller uses.
//! - **`backend`**: the `ApiBackend` contract and the once-per-process `Backend` choice.
//! - **`config`**: Figment-based configuration (`[loader]`, `[logging]`).
//! - **`device`**: descriptors, handles, tuner and update-reason types.
//! - **`error`**: `ErrorCode` (vendor outcomes) and `LoadError` (library discovery).
//! - **`loader`**: locating the shared library and resolving its entry points.
//! - **`logging`**: tracing subscriber setup for binaries.
//! - **`stub`**: the fixed fallback backend.
//! - **`vendor`**: dispatch into the loaded library.
//!
//! Raw ABI declarations live in the `sdrplay-sys` crate, re-exported as [`sys`].

pub mod api;
pub mod backend;
pub mod config;
pub mod device;
pub mod error;
pub mod loader;
pub mod logging;
pub mod stub;
pub mod vendor;

#[cfg(test)]
mod vendor_double;

pub use sdrplay_sys as sys;

pub use api::SdrplayApi;
pub use backend::{ApiBackend, Backend, BackendKind, BackendMode};
pub use config::BindingConfig;
pub use device::{
    CallbackContext, CallbackRegistration, Callbacks, DeviceDescriptor, DeviceHandle,
    HardwareModel, ParamsHandle, ReasonForUpdate, ReasonForUpdateExt1, RspDuoMode, TunerSelect,
};
pub use error::{ApiResult, ErrorCode, LoadError};
pub use loader::{try_load, Loader, LoaderOptions};
pub use stub::STUB_ERROR_STRING;
