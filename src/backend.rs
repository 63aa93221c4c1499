//! Backend contract and process-wide backend selection.
//!
//! [`ApiBackend`] is the one contract both implementations satisfy: the
//! vendor backend forwards each call through the resolved function table,
//! the stub answers from a fixed table. Signatures follow the vendor API
//! closely (status code plus out-parameters) so the stub can be checked
//! against the exact values the vendor contract defines.
//!
//! [`Backend`] is the tagged choice between the two. It is selected once;
//! after that it never changes for the lifetime of the process.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use sdrplay_sys as sys;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::LoaderConfig;
use crate::device::{
    CallbackContext, DeviceDescriptor, DeviceHandle, ParamsHandle, ReasonForUpdate,
    ReasonForUpdateExt1, TunerSelect,
};
use crate::error::{ErrorCode, LoadError};
use crate::loader::{Loader, LoaderOptions};
use crate::stub::StubBackend;
use crate::vendor::VendorBackend;

/// Which implementation is answering calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// The vendor library was loaded and fully resolved.
    Vendor,
    /// No usable vendor library; every hardware call reports absence.
    Stub,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Vendor => write!(f, "vendor"),
            BackendKind::Stub => write!(f, "stub"),
        }
    }
}

/// The operation set shared by the vendor and stub backends.
pub trait ApiBackend: Send + Sync {
    /// Which implementation this is.
    fn kind(&self) -> BackendKind;

    /// Connect to the API service.
    fn open(&self) -> ErrorCode;

    /// Disconnect from the API service.
    fn close(&self) -> ErrorCode;

    /// Query the service's API version into `version`.
    fn api_version(&self, version: &mut f32) -> ErrorCode;

    /// Take the device API lock.
    fn lock_device_api(&self) -> ErrorCode;

    /// Release the device API lock.
    fn unlock_device_api(&self) -> ErrorCode;

    /// Enumerate up to `max_devs` devices into `devices`, storing the count in `num_devs`.
    ///
    /// Never writes past `devices.len()`, whatever `max_devs` says.
    fn get_devices(
        &self,
        devices: &mut [sys::sdrplay_api_DeviceT],
        num_devs: &mut u32,
        max_devs: u32,
    ) -> ErrorCode;

    /// Claim a device. On success the descriptor carries the vendor handle.
    fn select_device(&self, device: &mut DeviceDescriptor) -> ErrorCode;

    /// Give a claimed device back.
    fn release_device(&self, handle: &mut DeviceHandle) -> ErrorCode;

    /// Human-readable text for `code`. Never empty.
    fn error_string(&self, code: ErrorCode) -> Cow<'static, str>;

    /// Fetch the parameter block of a selected device into `params`.
    fn device_params(&self, handle: &DeviceHandle, params: &mut Option<ParamsHandle>) -> ErrorCode;

    /// Start streaming with the given callbacks.
    ///
    /// `callbacks` must stay at the same address until `uninit`.
    fn init(
        &self,
        handle: &DeviceHandle,
        callbacks: &mut sys::sdrplay_api_CallbackFnsT,
        context: CallbackContext,
    ) -> ErrorCode;

    /// Stop streaming.
    fn uninit(&self, handle: &DeviceHandle) -> ErrorCode;

    /// Apply parameter changes selected by `reason` / `reason_ext`.
    fn update(
        &self,
        handle: &DeviceHandle,
        tuner: TunerSelect,
        reason: ReasonForUpdate,
        reason_ext: ReasonForUpdateExt1,
    ) -> ErrorCode;
}

/// Backend selection mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    /// Use the vendor library when it loads, the stub otherwise.
    #[default]
    Auto,
    /// Never touch the vendor library.
    Stub,
}

/// The active implementation behind the facade.
pub enum Backend {
    /// Vendor library loaded with every entry point resolved.
    VendorLoaded(VendorBackend),
    /// Stub only. `reason` records why the vendor library was not used
    /// (`None` when the stub was requested explicitly).
    StubOnly { reason: Option<LoadError> },
}

static PROCESS_BACKEND: OnceCell<Arc<Backend>> = OnceCell::new();

impl Backend {
    /// A stub backend chosen on purpose.
    pub fn stub() -> Self {
        Backend::StubOnly { reason: None }
    }

    /// Choose a backend from a loader's outcome. Load failures are absorbed.
    pub fn from_loader(loader: &Loader) -> Self {
        match loader.try_load() {
            Ok(table) => {
                info!(path = table.path(), "Using vendor SDRplay backend");
                Backend::VendorLoaded(VendorBackend::new(table))
            }
            Err(e) => {
                if e.is_not_found() {
                    info!(error = %e, "SDRplay API not installed; using stub backend");
                } else {
                    warn!(error = %e, "SDRplay API unusable; using stub backend");
                }
                Backend::StubOnly { reason: Some(e) }
            }
        }
    }

    /// Choose a backend according to `config`, using the process-wide loader.
    pub fn select(config: &LoaderConfig) -> Self {
        match config.backend {
            BackendMode::Stub => {
                info!("Stub backend forced by configuration");
                Backend::stub()
            }
            BackendMode::Auto => Backend::from_loader(Loader::global(LoaderOptions::from(config))),
        }
    }

    /// The process-wide backend, selected on first use.
    ///
    /// Concurrent first callers block until the single selection finishes.
    /// `config` only matters for that first call.
    pub fn global(config: &LoaderConfig) -> Arc<Backend> {
        PROCESS_BACKEND
            .get_or_init(|| Arc::new(Backend::select(config)))
            .clone()
    }

    /// The implementation to dispatch to.
    pub fn api(&self) -> &dyn ApiBackend {
        match self {
            Backend::VendorLoaded(vendor) => vendor,
            Backend::StubOnly { .. } => &StubBackend,
        }
    }

    /// Which implementation is active.
    pub fn kind(&self) -> BackendKind {
        self.api().kind()
    }

    /// Why the vendor library is not in use, if it was attempted and failed.
    pub fn fallback_reason(&self) -> Option<&LoadError> {
        match self {
            Backend::StubOnly { reason } => reason.as_ref(),
            Backend::VendorLoaded(_) => None,
        }
    }
}

impl fmt::Debug for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Backend::VendorLoaded(vendor) => f
                .debug_tuple("VendorLoaded")
                .field(&vendor.library_path())
                .finish(),
            Backend::StubOnly { reason } => f
                .debug_struct("StubOnly")
                .field("reason", reason)
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tracing_test::traced_test;

    #[test]
    fn test_forced_stub() {
        let config = LoaderConfig {
            backend: BackendMode::Stub,
            ..Default::default()
        };
        let backend = Backend::select(&config);
        assert_eq!(backend.kind(), BackendKind::Stub);
        assert!(backend.fallback_reason().is_none());
    }

    #[test]
    fn test_missing_library_falls_back() {
        let loader = Loader::new(LoaderOptions {
            library_path: Some(PathBuf::from("/nonexistent/libsdrplay_api.so.3")),
            search_paths: Vec::new(),
        });
        let backend = Backend::from_loader(&loader);
        assert_eq!(backend.kind(), BackendKind::Stub);
        assert!(backend.fallback_reason().is_some_and(LoadError::is_not_found));
    }

    #[test]
    #[traced_test]
    fn test_fallback_is_logged() {
        let loader = Loader::new(LoaderOptions::from_hint(Some(std::path::Path::new(
            "/nonexistent/libsdrplay_api.so.3",
        ))));
        let _backend = Backend::from_loader(&loader);
        assert!(logs_contain("SDRplay API not installed; using stub backend"));
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(BackendKind::Vendor.to_string(), "vendor");
        assert_eq!(BackendKind::Stub.to_string(), "stub");
    }
}
