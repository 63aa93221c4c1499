//! The API facade every caller uses.
//!
//! [`SdrplayApi`] exposes the fixed 13-operation surface with typed
//! arguments and `Result<_, ErrorCode>` returns. Which backend answers is
//! decided once, before the facade exists; callers never need to know.
//!
//! Cleanup operations (`close`, `unlock_device_api`, `release_device`,
//! `uninit`) always return `Ok(())`. A backend failure during cleanup is
//! logged and swallowed so unconditional shutdown sequences never fail.
//!
//! # Example
//!
//! ```no_run
//! use sdrplay_binding::SdrplayApi;
//!
//! let api = SdrplayApi::from_process();
//! match api.open() {
//!     Ok(()) => {
//!         for dev in api.get_devices(16).unwrap_or_default() {
//!             println!("{} {}", dev.model, dev.serial);
//!         }
//!     }
//!     Err(code) => println!("No receiver API: {}", api.error_string(code)),
//! }
//! api.close().ok();
//! ```

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use sdrplay_sys as sys;
use tracing::{debug, info, warn};

use crate::backend::{Backend, BackendKind};
use crate::config::{BindingConfig, LoaderConfig};
use crate::device::{
    CallbackContext, CallbackRegistration, Callbacks, DeviceDescriptor, DeviceHandle,
    ParamsHandle, RawDevice, ReasonForUpdate, ReasonForUpdateExt1, TunerSelect,
};
use crate::error::{ApiResult, ErrorCode};

/// Bookkeeping for one selected device.
struct HandleEntry {
    serial: String,
    raw: RawDevice,
    /// Present between a successful `init` and `uninit`/release.
    registration: Option<CallbackRegistration>,
    /// Callback table handed to the vendor; boxed so its address is stable.
    callback_table: Option<Box<sys::sdrplay_api_CallbackFnsT>>,
    /// Serial reserved, vendor `SelectDevice` still running.
    pending: bool,
}

/// Facade over the active backend.
pub struct SdrplayApi {
    backend: Arc<Backend>,
    handles: Mutex<HashMap<u64, HandleEntry>>,
    next_handle_id: AtomicU64,
    opened: AtomicBool,
    locked: AtomicBool,
}

impl SdrplayApi {
    /// Facade bound to the process-wide backend, selected with default configuration
    /// (plus `SDRPLAY_API_PATH`) if nothing selected it yet.
    pub fn from_process() -> Self {
        Self::with_backend(Backend::global(&LoaderConfig::default()))
    }

    /// Facade bound to the process-wide backend, selected with `config` if
    /// nothing selected it yet.
    pub fn from_config(config: &BindingConfig) -> Self {
        Self::with_backend(Backend::global(&config.loader))
    }

    /// Facade over an explicitly provided backend.
    pub fn with_backend(backend: Arc<Backend>) -> Self {
        debug!(backend = %backend.kind(), "Creating SDRplay API facade");
        Self {
            backend,
            handles: Mutex::new(HashMap::new()),
            next_handle_id: AtomicU64::new(1),
            opened: AtomicBool::new(false),
            locked: AtomicBool::new(false),
        }
    }

    /// Which backend answers calls. Diagnostics only.
    pub fn backend_kind(&self) -> BackendKind {
        self.backend.kind()
    }

    /// The backend this facade dispatches to.
    pub fn backend(&self) -> &Arc<Backend> {
        &self.backend
    }

    /// Connect to the API service.
    pub fn open(&self) -> ApiResult<()> {
        self.backend.api().open().into_result()?;
        self.opened.store(true, Ordering::SeqCst);

        if let Ok(version) = self.api_version() {
            let expected = sys::SDRPLAY_API_VERSION.trunc();
            if version.trunc() != expected {
                warn!(
                    service_version = version,
                    binding_version = sys::SDRPLAY_API_VERSION,
                    "SDRplay API major version differs from the bindings"
                );
            } else {
                info!(version, "SDRplay API opened");
            }
        }
        Ok(())
    }

    /// Disconnect from the API service. Always succeeds.
    pub fn close(&self) -> ApiResult<()> {
        self.opened.store(false, Ordering::SeqCst);
        self.forgive("close", self.backend.api().close());
        Ok(())
    }

    /// API version reported by the service.
    pub fn api_version(&self) -> ApiResult<f32> {
        let mut version = 0.0;
        self.backend.api().api_version(&mut version).into_result()?;
        Ok(version)
    }

    /// Take the device API lock (serialises enumeration/selection across processes).
    pub fn lock_device_api(&self) -> ApiResult<()> {
        self.backend.api().lock_device_api().into_result()?;
        self.locked.store(true, Ordering::SeqCst);
        Ok(())
    }

    /// Release the device API lock. Always succeeds.
    pub fn unlock_device_api(&self) -> ApiResult<()> {
        self.locked.store(false, Ordering::SeqCst);
        self.forgive("unlock_device_api", self.backend.api().unlock_device_api());
        Ok(())
    }

    /// Enumerate up to `max_devs` receivers (clamped to the vendor maximum).
    pub fn get_devices(&self, max_devs: u32) -> ApiResult<Vec<DeviceDescriptor>> {
        let max_devs = max_devs.min(sys::SDRPLAY_MAX_DEVICES);
        let mut raw = vec![sys::sdrplay_api_DeviceT::default(); max_devs as usize];
        let mut num_devs = 0;

        self.backend
            .api()
            .get_devices(&mut raw, &mut num_devs, max_devs)
            .into_result()?;

        let count = (num_devs as usize).min(raw.len());
        debug!(count, "Enumerated devices");
        Ok(raw[..count].iter().map(DeviceDescriptor::from_raw).collect())
    }

    /// Claim a receiver.
    ///
    /// Fails with `Fail` if this facade already holds a live handle for the
    /// same serial number.
    pub fn select_device(&self, descriptor: &DeviceDescriptor) -> ApiResult<DeviceHandle> {
        let id = self.next_handle_id.fetch_add(1, Ordering::SeqCst);
        {
            let mut handles = self.handles.lock();
            if handles.values().any(|e| e.serial == descriptor.serial) {
                warn!(serial = %descriptor.serial, "Device already selected");
                return Err(ErrorCode::Fail);
            }
            // Reserve the serial while the backend call runs.
            handles.insert(
                id,
                HandleEntry {
                    serial: descriptor.serial.clone(),
                    raw: descriptor.raw,
                    registration: None,
                    callback_table: None,
                    pending: true,
                },
            );
        }

        let mut selected = descriptor.clone();
        let code = self.backend.api().select_device(&mut selected);
        if let Err(code) = code.into_result() {
            self.handles.lock().remove(&id);
            return Err(code);
        }

        let still_tracked = match self.handles.lock().get_mut(&id) {
            Some(entry) => {
                entry.raw = selected.raw;
                entry.pending = false;
                true
            }
            None => false,
        };
        if !still_tracked {
            // Reservation drained by a concurrent shutdown.
            let mut orphan = DeviceHandle::new(id, selected.serial, selected.raw);
            self.forgive("release_device", self.backend.api().release_device(&mut orphan));
            return Err(ErrorCode::DeviceNotOpened);
        }
        info!(serial = %selected.serial, model = %selected.model, id, "Selected device");
        Ok(DeviceHandle::new(id, selected.serial, selected.raw))
    }

    /// Give a receiver back. Consumes the handle. Always succeeds.
    ///
    /// Streaming is stopped first if the handle is still initialised.
    pub fn release_device(&self, mut handle: DeviceHandle) -> ApiResult<()> {
        let Some(entry) = self.handles.lock().remove(&handle.id()) else {
            debug!(id = handle.id(), "Release of untracked handle ignored");
            return Ok(());
        };

        if entry.registration.is_some() {
            self.forgive("uninit", self.backend.api().uninit(&handle));
        }
        self.forgive("release_device", self.backend.api().release_device(&mut handle));
        drop(entry);

        info!(serial = handle.serial(), id = handle.id(), "Released device");
        Ok(())
    }

    /// Human-readable text for `code`. Never empty.
    pub fn error_string(&self, code: ErrorCode) -> Cow<'static, str> {
        self.backend.api().error_string(code)
    }

    /// Parameter block of a selected receiver.
    pub fn device_params(&self, handle: &DeviceHandle) -> ApiResult<ParamsHandle> {
        self.ensure_tracked(handle)?;
        let mut params = None;
        self.backend
            .api()
            .device_params(handle, &mut params)
            .into_result()?;
        params.ok_or(ErrorCode::Fail)
    }

    /// Start streaming. The registration lives until `uninit` or release.
    pub fn init(
        &self,
        handle: &DeviceHandle,
        callbacks: Callbacks,
        context: CallbackContext,
    ) -> ApiResult<()> {
        self.ensure_tracked(handle)?;

        let mut table = Box::new(callbacks.to_raw());
        self.backend
            .api()
            .init(handle, &mut table, context)
            .into_result()?;

        let orphaned = {
            let mut handles = self.handles.lock();
            match handles.get_mut(&handle.id()) {
                Some(entry) => {
                    entry.registration = Some(CallbackRegistration {
                        handle_id: handle.id(),
                        callbacks,
                        context,
                    });
                    entry.callback_table = Some(table);
                    None
                }
                None => Some(table),
            }
        };

        // Released concurrently while the vendor was starting the stream. The
        // vendor must stop using the table before it is freed.
        if let Some(table) = orphaned {
            warn!(id = handle.id(), "Device released during init; stopping stream");
            self.forgive("uninit", self.backend.api().uninit(handle));
            drop(table);
            return Err(ErrorCode::DeviceNotOpened);
        }

        debug!(id = handle.id(), "Streaming initialised");
        Ok(())
    }

    /// Stop streaming. Always succeeds, including on never-initialised handles.
    pub fn uninit(&self, handle: &DeviceHandle) -> ApiResult<()> {
        if !self.is_tracked(handle) {
            return Ok(());
        }
        self.forgive("uninit", self.backend.api().uninit(handle));

        let mut handles = self.handles.lock();
        if let Some(entry) = handles.get_mut(&handle.id()) {
            entry.registration = None;
            entry.callback_table = None;
        }
        Ok(())
    }

    /// Apply parameter changes to a streaming receiver.
    pub fn update(
        &self,
        handle: &DeviceHandle,
        tuner: TunerSelect,
        reason: ReasonForUpdate,
        reason_ext: ReasonForUpdateExt1,
    ) -> ApiResult<()> {
        self.ensure_tracked(handle)?;
        self.backend
            .api()
            .update(handle, tuner, reason, reason_ext)
            .into_result()
    }

    /// Current callback registration for `handle`, if streaming.
    pub fn registration(&self, handle: &DeviceHandle) -> Option<CallbackRegistration> {
        self.handles
            .lock()
            .get(&handle.id())
            .and_then(|entry| entry.registration)
    }

    /// Number of devices this facade currently holds.
    pub fn selected_count(&self) -> usize {
        self.handles.lock().len()
    }

    /// Unconditional cleanup: stop streaming, release every device, unlock, close.
    ///
    /// Handles still held by callers become stale; operations on them report
    /// `DeviceNotOpened` and releasing them is a no-op.
    ///
    /// Unlock and close act on the vendor service as a whole, so they also
    /// end the session for other facades sharing this backend. Dropping a
    /// facade only releases its own devices.
    pub fn shutdown(&self) {
        self.release_all();

        if self.locked.load(Ordering::SeqCst) {
            let _ = self.unlock_device_api();
        }
        if self.opened.load(Ordering::SeqCst) {
            let _ = self.close();
        }
    }

    /// Stop streaming on and release every device this facade holds.
    fn release_all(&self) {
        let entries: Vec<(u64, HandleEntry)> = self.handles.lock().drain().collect();
        for (id, entry) in entries {
            if entry.pending {
                // The selecting thread releases it once the vendor call returns.
                continue;
            }
            let mut handle = DeviceHandle::new(id, entry.serial.clone(), entry.raw);
            if entry.registration.is_some() {
                self.forgive("uninit", self.backend.api().uninit(&handle));
            }
            self.forgive("release_device", self.backend.api().release_device(&mut handle));
            debug!(id, serial = %entry.serial, "Released device");
        }
    }

    fn is_tracked(&self, handle: &DeviceHandle) -> bool {
        self.handles.lock().contains_key(&handle.id())
    }

    fn ensure_tracked(&self, handle: &DeviceHandle) -> ApiResult<()> {
        if self.is_tracked(handle) {
            Ok(())
        } else {
            Err(ErrorCode::DeviceNotOpened)
        }
    }

    /// Log a failed cleanup call instead of reporting it.
    fn forgive(&self, operation: &str, code: ErrorCode) {
        if !code.is_success() {
            warn!(operation, error = %code, "Cleanup call failed; ignoring");
        }
    }

    #[cfg(test)]
    pub(crate) fn track_for_test(&self, descriptor: &DeviceDescriptor) -> DeviceHandle {
        let id = self.next_handle_id.fetch_add(1, Ordering::SeqCst);
        self.handles.lock().insert(
            id,
            HandleEntry {
                serial: descriptor.serial.clone(),
                raw: descriptor.raw,
                registration: None,
                callback_table: None,
                pending: false,
            },
        );
        DeviceHandle::new(id, descriptor.serial.clone(), descriptor.raw)
    }
}

impl Drop for SdrplayApi {
    fn drop(&mut self) {
        if !self.handles.get_mut().is_empty() {
            self.release_all();
        }
    }
}

impl std::fmt::Debug for SdrplayApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SdrplayApi")
            .field("backend", &self.backend)
            .field("selected", &self.selected_count())
            .finish()
    }
}
