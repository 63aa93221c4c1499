//! Runtime discovery and binding of the vendor library.
//!
//! The SDRplay API ships as a shared library installed alongside the vendor
//! service. Nothing links against it at build time; instead [`Loader`]
//! searches for it when first asked, resolves every entry point listed in
//! [`sdrplay_sys::REQUIRED_ENTRY_POINTS`], and caches the outcome.
//!
//! ## Search order
//!
//! 1. An explicit path (configuration `loader.library_path` or a hint).
//! 2. The `SDRPLAY_API_PATH` environment variable.
//! 3. Each configured search directory joined with the platform file names.
//! 4. Platform defaults (bare names go through the OS loader's own search).
//!
//! Steps 1 and 2 are exclusive: when either names a path, nothing else is tried.
//!
//! ## Atomicity
//!
//! A library that loads but misses any required entry point is dropped and
//! reported as [`LoadError::SymbolMissing`]. No partially resolved table is
//! ever handed out.

#![allow(unsafe_code)]

use std::mem;
use std::os::raw::c_void;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use libloading::Library;
use once_cell::sync::OnceCell;
use sdrplay_sys as sys;
use tracing::{debug, info, warn};

use crate::error::LoadError;

/// Environment variable naming the library to load.
pub const LIBRARY_PATH_ENV: &str = "SDRPLAY_API_PATH";

/// Outcome of one load attempt, shared by every caller.
pub type LoadOutcome = Result<Arc<FunctionTable>, LoadError>;

/// Fully resolved entry points of a loaded vendor library.
///
/// Owns the library, so the function pointers stay valid for as long as the
/// table is alive.
pub struct FunctionTable {
    pub(crate) open: sys::sdrplay_api_Open_t,
    pub(crate) close: sys::sdrplay_api_Close_t,
    pub(crate) api_version: sys::sdrplay_api_ApiVersion_t,
    pub(crate) lock_device_api: sys::sdrplay_api_LockDeviceApi_t,
    pub(crate) unlock_device_api: sys::sdrplay_api_UnlockDeviceApi_t,
    pub(crate) get_devices: sys::sdrplay_api_GetDevices_t,
    pub(crate) select_device: sys::sdrplay_api_SelectDevice_t,
    pub(crate) release_device: sys::sdrplay_api_ReleaseDevice_t,
    pub(crate) get_error_string: sys::sdrplay_api_GetErrorString_t,
    pub(crate) get_device_params: sys::sdrplay_api_GetDeviceParams_t,
    pub(crate) init: sys::sdrplay_api_Init_t,
    pub(crate) uninit: sys::sdrplay_api_Uninit_t,
    pub(crate) update: sys::sdrplay_api_Update_t,
    path: String,
    /// `None` only for tables built from in-process functions.
    _library: Option<Library>,
}

impl FunctionTable {
    /// Resolve every required entry point from `library`.
    fn resolve(library: Library, path: &str) -> Result<Self, LoadError> {
        let mut table = Self::resolve_with(path, |name| {
            // SAFETY: the symbol is read as an untyped address; it is only
            // reinterpreted with the signature declared for `name`.
            let found = unsafe { library.get::<*mut c_void>(name.as_bytes()) };
            found.ok().map(|sym| *sym)
        })?;
        table._library = Some(library);
        Ok(table)
    }

    /// Build a table from a name-to-address lookup. All or nothing: the first
    /// name `lookup` cannot supply fails the whole table.
    pub(crate) fn resolve_with<F>(path: &str, mut lookup: F) -> Result<Self, LoadError>
    where
        F: FnMut(&'static str) -> Option<*mut c_void>,
    {
        Ok(Self {
            open: symbol(&mut lookup, path, sys::SYM_OPEN)?,
            close: symbol(&mut lookup, path, sys::SYM_CLOSE)?,
            api_version: symbol(&mut lookup, path, sys::SYM_API_VERSION)?,
            lock_device_api: symbol(&mut lookup, path, sys::SYM_LOCK_DEVICE_API)?,
            unlock_device_api: symbol(&mut lookup, path, sys::SYM_UNLOCK_DEVICE_API)?,
            get_devices: symbol(&mut lookup, path, sys::SYM_GET_DEVICES)?,
            select_device: symbol(&mut lookup, path, sys::SYM_SELECT_DEVICE)?,
            release_device: symbol(&mut lookup, path, sys::SYM_RELEASE_DEVICE)?,
            get_error_string: symbol(&mut lookup, path, sys::SYM_GET_ERROR_STRING)?,
            get_device_params: symbol(&mut lookup, path, sys::SYM_GET_DEVICE_PARAMS)?,
            init: symbol(&mut lookup, path, sys::SYM_INIT)?,
            uninit: symbol(&mut lookup, path, sys::SYM_UNINIT)?,
            update: symbol(&mut lookup, path, sys::SYM_UPDATE)?,
            path: path.to_string(),
            _library: None,
        })
    }

    /// Path (or bare name) the library was loaded from.
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl std::fmt::Debug for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FunctionTable")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Reinterpret the address of `name` as the function pointer type `T`.
///
/// `T` must be one of the `unsafe extern "C" fn` typedefs from sdrplay-sys.
fn symbol<T: Copy, F>(lookup: &mut F, path: &str, name: &'static str) -> Result<T, LoadError>
where
    F: FnMut(&'static str) -> Option<*mut c_void>,
{
    match lookup(name).filter(|addr| !addr.is_null()) {
        Some(addr) => {
            debug_assert_eq!(mem::size_of::<T>(), mem::size_of::<*mut c_void>());
            // SAFETY: `T` is a pointer-sized function pointer type and `addr`
            // is the non-null address of the export with that signature.
            Ok(unsafe { mem::transmute_copy::<*mut c_void, T>(&addr) })
        }
        None => {
            debug!(path, symbol = name, "Entry point not found");
            Err(LoadError::SymbolMissing {
                path: path.to_string(),
                symbol: name.to_string(),
            })
        }
    }
}

/// Where to look for the vendor library.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Load exactly this library and nothing else.
    pub library_path: Option<PathBuf>,
    /// Extra directories searched before the platform defaults.
    pub search_paths: Vec<PathBuf>,
}

impl LoaderOptions {
    /// Options that load `hint` when given, otherwise search normally.
    pub fn from_hint(hint: Option<&Path>) -> Self {
        Self {
            library_path: hint.map(Path::to_path_buf),
            search_paths: Vec::new(),
        }
    }

    /// Ordered list of library candidates.
    pub fn candidates(&self) -> Vec<PathBuf> {
        if let Some(path) = &self.library_path {
            return vec![path.clone()];
        }
        if let Some(path) = std::env::var_os(LIBRARY_PATH_ENV).filter(|p| !p.is_empty()) {
            return vec![PathBuf::from(path)];
        }

        let mut candidates = Vec::new();
        for dir in &self.search_paths {
            for name in platform_library_names() {
                candidates.push(dir.join(name));
            }
        }
        candidates.extend(platform_defaults());
        candidates
    }
}

/// File names the vendor installer uses on this platform.
pub fn platform_library_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["sdrplay_api.dll"]
    }
    #[cfg(not(target_os = "windows"))]
    {
        &["libsdrplay_api.so.3", "libsdrplay_api.so"]
    }
}

fn platform_defaults() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        if let Some(program_files) = std::env::var_os("ProgramFiles") {
            let arch = if cfg!(target_pointer_width = "64") { "x64" } else { "x86" };
            paths.push(
                PathBuf::from(program_files)
                    .join("SDRplay")
                    .join("API")
                    .join(arch)
                    .join("sdrplay_api.dll"),
            );
        }
        paths.push(PathBuf::from("sdrplay_api.dll"));
        paths
    }
    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/usr/local/lib/libsdrplay_api.so.3"),
            PathBuf::from("/usr/local/lib/libsdrplay_api.so"),
            PathBuf::from("libsdrplay_api.so.3"),
        ]
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        vec![
            PathBuf::from("libsdrplay_api.so.3"),
            PathBuf::from("libsdrplay_api.so"),
            PathBuf::from("/usr/local/lib/libsdrplay_api.so.3"),
            PathBuf::from("/usr/local/lib/libsdrplay_api.so"),
        ]
    }
}

/// A path with a directory component is checked on disk; bare names are left
/// to the OS loader's own search.
fn is_bare_name(path: &Path) -> bool {
    path.components().count() == 1 && !path.is_absolute()
}

/// Does an OS loader message describe a missing file?
fn is_missing_file_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("no such file")
        || lower.contains("not found")
        || lower.contains("could not be found")
        || lower.contains("cannot find")
        || lower.contains("os error 126")
}

/// Classify a failed `Library::new`.
///
/// A candidate named by path was already seen on disk, so any failure means
/// the file is there but unusable (bad image, wrong architecture, missing
/// dependency). Only bare names, which the OS loader searches for, can be
/// "not found".
fn classify_open_error(candidate: &Path, message: String) -> Option<LoadError> {
    if is_bare_name(candidate) && is_missing_file_message(&message) {
        None
    } else {
        Some(LoadError::LoadRejected {
            path: candidate.display().to_string(),
            reason: message,
        })
    }
}

/// Try each candidate once and build a table from the first usable library.
///
/// Failure priority when nothing loads: a present-but-incompatible library
/// (`SymbolMissing`) beats a rejected image (`LoadRejected`), which beats
/// nothing found at all.
pub fn load_uncached(options: &LoaderOptions) -> Result<FunctionTable, LoadError> {
    let mut tried = Vec::new();
    let mut rejected: Option<LoadError> = None;
    let mut incompatible: Option<LoadError> = None;

    for candidate in options.candidates() {
        let shown = candidate.display().to_string();
        tried.push(shown.clone());

        if !is_bare_name(&candidate) && !candidate.exists() {
            debug!(path = %shown, "Candidate does not exist");
            continue;
        }

        // SAFETY: loading runs the library's initialisers. We only load
        // candidates named by configuration or the vendor's install layout.
        let library = match unsafe { Library::new(&candidate) } {
            Ok(library) => library,
            Err(e) => {
                match classify_open_error(&candidate, e.to_string()) {
                    Some(err) => {
                        warn!(path = %shown, error = %err, "Library rejected by OS loader");
                        rejected.get_or_insert(err);
                    }
                    None => debug!(path = %shown, error = %e, "Candidate not loadable"),
                }
                continue;
            }
        };

        match FunctionTable::resolve(library, &shown) {
            Ok(table) => {
                info!(path = %shown, "Loaded SDRplay API library");
                return Ok(table);
            }
            Err(e) => {
                warn!(path = %shown, error = %e, "Library is not a compatible SDRplay API");
                incompatible.get_or_insert(e);
            }
        }
    }

    Err(incompatible
        .or(rejected)
        .unwrap_or(LoadError::NotFound { tried }))
}

/// Memoizing loader. The first call to [`Loader::try_load`] performs the
/// search; every later call returns the cached outcome.
#[derive(Debug)]
pub struct Loader {
    options: LoaderOptions,
    outcome: OnceCell<LoadOutcome>,
    attempts: AtomicUsize,
}

static GLOBAL_LOADER: OnceCell<Loader> = OnceCell::new();

impl Loader {
    /// Create a loader that has not attempted anything yet.
    pub fn new(options: LoaderOptions) -> Self {
        Self {
            options,
            outcome: OnceCell::new(),
            attempts: AtomicUsize::new(0),
        }
    }

    /// The process-wide loader.
    ///
    /// `options` only matter on the very first call; later calls get the
    /// instance created then.
    pub fn global(options: LoaderOptions) -> &'static Loader {
        GLOBAL_LOADER.get_or_init(|| Loader::new(options))
    }

    /// Load the library, or return the cached outcome of the earlier attempt.
    pub fn try_load(&self) -> LoadOutcome {
        self.outcome
            .get_or_init(|| {
                self.attempts.fetch_add(1, Ordering::SeqCst);
                load_uncached(&self.options).map(Arc::new)
            })
            .clone()
    }

    /// Number of real load attempts made (0 or 1).
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Options this loader searches with.
    pub fn options(&self) -> &LoaderOptions {
        &self.options
    }
}

/// Load the vendor library once per process.
///
/// The hint of the first caller wins; later hints are ignored.
pub fn try_load(path_hint: Option<&Path>) -> LoadOutcome {
    let loader = Loader::global(LoaderOptions::from_hint(path_hint));
    if path_hint.is_some() && loader.options().library_path.as_deref() != path_hint {
        debug!(hint = ?path_hint, "Loader already initialised; ignoring path hint");
    }
    loader.try_load()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_is_exclusive() {
        let options = LoaderOptions {
            library_path: Some(PathBuf::from("/opt/custom/libsdrplay_api.so.3")),
            search_paths: vec![PathBuf::from("/somewhere")],
        };
        assert_eq!(
            options.candidates(),
            vec![PathBuf::from("/opt/custom/libsdrplay_api.so.3")]
        );
    }

    #[test]
    fn test_search_paths_come_first() {
        let options = LoaderOptions {
            library_path: None,
            search_paths: vec![PathBuf::from("/first")],
        };
        let candidates = options.candidates();
        // The environment override would make the list a single entry.
        if std::env::var_os(LIBRARY_PATH_ENV).is_none() {
            assert!(candidates[0].starts_with("/first"));
            assert!(candidates.len() > platform_library_names().len());
        }
    }

    #[test]
    fn test_bare_name_detection() {
        assert!(is_bare_name(Path::new("libsdrplay_api.so.3")));
        assert!(!is_bare_name(Path::new("/usr/lib/libsdrplay_api.so")));
        assert!(!is_bare_name(Path::new("lib/libsdrplay_api.so")));
    }

    #[test]
    fn test_missing_file_messages() {
        assert!(is_missing_file_message(
            "libfoo.so: cannot open shared object file: No such file or directory"
        ));
        assert!(is_missing_file_message(
            "LoadLibraryExW failed: The specified module could not be found. (os error 126)"
        ));
        assert!(!is_missing_file_message("libfoo.so: invalid ELF header"));
    }

    #[test]
    fn test_missing_explicit_path_is_not_found() {
        let options = LoaderOptions::from_hint(Some(Path::new(
            "/nonexistent/sdrplay/libsdrplay_api.so.3",
        )));
        let err = load_uncached(&options).unwrap_err();
        assert_eq!(
            err,
            LoadError::NotFound {
                tried: vec!["/nonexistent/sdrplay/libsdrplay_api.so.3".to_string()]
            }
        );
    }

    #[test]
    fn test_outcome_is_memoized() {
        let loader = Loader::new(LoaderOptions::from_hint(Some(Path::new(
            "/nonexistent/sdrplay/libsdrplay_api.so.3",
        ))));
        assert_eq!(loader.attempts(), 0);

        let first = loader.try_load().unwrap_err();
        let second = loader.try_load().unwrap_err();

        assert_eq!(first, second);
        assert_eq!(loader.attempts(), 1);
    }

    #[test]
    fn test_open_failure_on_a_path_is_rejected() {
        // The file exists, so a loader message about a missing file points at
        // a dependency of the library, not the library itself.
        let err = classify_open_error(
            Path::new("/opt/sdrplay/libsdrplay_api.so.3"),
            "libusb-1.0.so.0: cannot open shared object file: No such file or directory"
                .to_string(),
        );
        assert!(matches!(
            err,
            Some(LoadError::LoadRejected { ref path, .. }) if path == "/opt/sdrplay/libsdrplay_api.so.3"
        ));
    }

    #[test]
    fn test_bare_name_classification() {
        let missing = classify_open_error(
            Path::new("libsdrplay_api.so.3"),
            "libsdrplay_api.so.3: cannot open shared object file: No such file or directory"
                .to_string(),
        );
        assert_eq!(missing, None);

        let broken = classify_open_error(
            Path::new("libsdrplay_api.so.3"),
            "libsdrplay_api.so.3: invalid ELF header".to_string(),
        );
        assert!(matches!(broken, Some(LoadError::LoadRejected { .. })));
    }

    #[test]
    fn test_every_entry_point_resolves() {
        let table = crate::vendor_double::table_without(&[]).unwrap();
        assert_eq!(table.path(), "vendor-double");
        assert!(table._library.is_none());
    }

    #[test]
    fn test_one_missing_entry_point_drops_the_table() {
        let err = crate::vendor_double::table_without(&[sys::SYM_UPDATE]).unwrap_err();
        assert_eq!(err.missing_symbol(), Some(sys::SYM_UPDATE));
        assert_eq!(
            err,
            LoadError::SymbolMissing {
                path: "vendor-double".to_string(),
                symbol: "sdrplay_api_Update".to_string(),
            }
        );
    }

    #[test]
    fn test_first_missing_entry_point_is_reported() {
        let err = crate::vendor_double::table_without(&[sys::SYM_UNINIT, sys::SYM_INIT])
            .unwrap_err();
        assert_eq!(err.missing_symbol(), Some(sys::SYM_INIT));
    }

    #[test]
    fn test_null_address_counts_as_missing() {
        let err = FunctionTable::resolve_with("null-exports", |name| {
            (name == sys::SYM_OPEN).then(std::ptr::null_mut)
        })
        .unwrap_err();
        assert_eq!(err.missing_symbol(), Some(sys::SYM_OPEN));
    }
}
