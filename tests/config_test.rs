//! Configuration loading from files and the environment.

use std::io::Write;
use std::path::PathBuf;

use sdrplay_binding::{
    config::{BindingConfig, ConfigError},
    logging::OutputFormat,
    BackendMode, LoaderOptions,
};
use serial_test::serial;
use tempfile::NamedTempFile;

const ENV_KEYS: [&str; 3] = [
    "SDRPLAY_API_PATH",
    "SDRPLAY_LOADER__BACKEND",
    "SDRPLAY_LOGGING__LEVEL",
];

/// Clears binding variables for the duration of a test.
struct EnvGuard(Vec<(&'static str, Option<std::ffi::OsString>)>);

impl EnvGuard {
    fn clean() -> Self {
        let saved = ENV_KEYS
            .iter()
            .map(|key| (*key, std::env::var_os(key)))
            .collect();
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
        Self(saved)
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.0 {
            match value {
                Some(value) => std::env::set_var(key, value),
                None => std::env::remove_var(key),
            }
        }
    }
}

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
#[serial]
fn test_missing_file_uses_defaults() {
    let _env = EnvGuard::clean();
    let config = BindingConfig::load_from("/nonexistent/sdrplay.toml").unwrap();
    assert_eq!(config, BindingConfig::default());
}

#[test]
#[serial]
fn test_file_values() {
    let _env = EnvGuard::clean();
    let file = write_config(
        r#"
        [loader]
        library_path = "/opt/sdrplay/lib/libsdrplay_api.so.3"
        backend = "stub"

        [logging]
        level = "warn"
        format = "pretty"
        "#,
    );

    let config = BindingConfig::load_from(file.path()).unwrap();
    assert_eq!(
        config.loader.library_path,
        Some(PathBuf::from("/opt/sdrplay/lib/libsdrplay_api.so.3"))
    );
    assert_eq!(config.loader.backend, BackendMode::Stub);
    assert_eq!(config.logging.level, "warn");
    assert_eq!(config.logging.format, OutputFormat::Pretty);
}

#[test]
#[serial]
fn test_env_overrides_file() {
    let _env = EnvGuard::clean();
    let file = write_config(
        r#"
        [loader]
        backend = "auto"
        "#,
    );
    std::env::set_var("SDRPLAY_LOADER__BACKEND", "stub");
    std::env::set_var("SDRPLAY_LOGGING__LEVEL", "debug");

    let config = BindingConfig::load_from(file.path()).unwrap();
    assert_eq!(config.loader.backend, BackendMode::Stub);
    assert_eq!(config.logging.level, "debug");
}

#[test]
#[serial]
fn test_api_path_env_sets_library_path() {
    let _env = EnvGuard::clean();
    std::env::set_var("SDRPLAY_API_PATH", "/custom/libsdrplay_api.so");

    let config = BindingConfig::load_from("/nonexistent/sdrplay.toml").unwrap();
    assert_eq!(
        config.loader.library_path,
        Some(PathBuf::from("/custom/libsdrplay_api.so"))
    );
    let options = LoaderOptions::from(&config.loader);
    assert_eq!(options.candidates(), vec![PathBuf::from("/custom/libsdrplay_api.so")]);
}

#[test]
#[serial]
fn test_invalid_level_rejected() {
    let _env = EnvGuard::clean();
    let file = write_config(
        r#"
        [logging]
        level = "shouty"
        "#,
    );

    let err = BindingConfig::load_from(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
    assert!(err.to_string().contains("shouty"));
}

#[test]
#[serial]
fn test_unknown_backend_rejected() {
    let _env = EnvGuard::clean();
    let file = write_config(
        r#"
        [loader]
        backend = "hardware"
        "#,
    );

    let err = BindingConfig::load_from(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Figment(_)));
}
