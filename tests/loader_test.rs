//! Library discovery against real files on disk.

use std::io::Write;
use std::path::{Path, PathBuf};

use sdrplay_binding::{
    loader::{load_uncached, LIBRARY_PATH_ENV},
    Backend, BackendKind, LoadError, Loader, LoaderOptions,
};
use serial_test::serial;

#[test]
fn test_memoized_outcome() {
    let loader = Loader::new(LoaderOptions::from_hint(Some(Path::new(
        "/nonexistent/libsdrplay_api.so.3",
    ))));
    assert_eq!(loader.attempts(), 0);

    let first = loader.try_load().unwrap_err();
    let second = loader.try_load().unwrap_err();
    assert_eq!(first, second);
    assert_eq!(loader.attempts(), 1);
}

#[test]
#[serial]
fn test_not_found_lists_candidates() {
    let options = LoaderOptions {
        library_path: None,
        search_paths: vec![PathBuf::from("/nonexistent/sdrplay")],
    };
    // Skip when the environment pins a library.
    if std::env::var_os(LIBRARY_PATH_ENV).is_some() {
        return;
    }
    match load_uncached(&options) {
        Err(LoadError::NotFound { tried }) => {
            assert!(tried[0].starts_with("/nonexistent/sdrplay"));
        }
        Err(other) => panic!("unexpected load error: {other}"),
        // A real installation on the test machine.
        Ok(_) => {}
    }
}

#[cfg(target_os = "linux")]
#[test]
fn test_foreign_library_is_symbol_missing() {
    let loader = Loader::new(LoaderOptions::from_hint(Some(Path::new("libc.so.6"))));
    let err = loader.try_load().unwrap_err();
    assert_eq!(err.missing_symbol(), Some("sdrplay_api_Open"));

    let backend = Backend::from_loader(&loader);
    assert_eq!(backend.kind(), BackendKind::Stub);
    assert!(matches!(
        backend.fallback_reason(),
        Some(LoadError::SymbolMissing { .. })
    ));
}

#[cfg(target_os = "linux")]
#[test]
fn test_corrupt_library_is_rejected() {
    let mut file = tempfile::Builder::new()
        .prefix("libsdrplay_api")
        .suffix(".so")
        .tempfile()
        .unwrap();
    file.write_all(b"this is not an ELF shared object, just text padding")
        .unwrap();
    file.flush().unwrap();

    let options = LoaderOptions::from_hint(Some(file.path()));
    let err = load_uncached(&options).unwrap_err();
    assert!(
        matches!(err, LoadError::LoadRejected { .. }),
        "expected LoadRejected, got {err:?}"
    );
}

#[test]
#[serial]
fn test_env_path_overrides_search() {
    let original = std::env::var_os(LIBRARY_PATH_ENV);
    std::env::set_var(LIBRARY_PATH_ENV, "/opt/env/libsdrplay_api.so.3");

    let options = LoaderOptions {
        library_path: None,
        search_paths: vec![PathBuf::from("/ignored")],
    };
    let candidates = options.candidates();

    match original {
        Some(value) => std::env::set_var(LIBRARY_PATH_ENV, value),
        None => std::env::remove_var(LIBRARY_PATH_ENV),
    }
    assert_eq!(candidates, vec![PathBuf::from("/opt/env/libsdrplay_api.so.3")]);
}

#[test]
#[serial]
fn test_explicit_path_beats_env() {
    let original = std::env::var_os(LIBRARY_PATH_ENV);
    std::env::set_var(LIBRARY_PATH_ENV, "/opt/env/libsdrplay_api.so.3");

    let options = LoaderOptions::from_hint(Some(Path::new("/opt/hint/libsdrplay_api.so.3")));
    let candidates = options.candidates();

    match original {
        Some(value) => std::env::set_var(LIBRARY_PATH_ENV, value),
        None => std::env::remove_var(LIBRARY_PATH_ENV),
    }
    assert_eq!(candidates, vec![PathBuf::from("/opt/hint/libsdrplay_api.so.3")]);
}
