//! Configuration loading using Figment.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Built-in defaults
//! 2. A TOML file (`config/sdrplay.toml` unless another path is given)
//! 3. Environment variables prefixed with `SDRPLAY_`, `__` separating
//!    sections (e.g. `SDRPLAY_LOADER__BACKEND=stub`)
//! 4. `SDRPLAY_API_PATH`, mapped onto `loader.library_path`
//!
//! # Example
//! ```no_run
//! use sdrplay_binding::config::BindingConfig;
//!
//! let config = BindingConfig::load()?;
//! println!("Backend mode: {:?}", config.loader.backend);
//! # Ok::<(), sdrplay_binding::config::ConfigError>(())
//! ```

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::BackendMode;
use crate::loader::{LoaderOptions, LIBRARY_PATH_ENV};
use crate::logging::OutputFormat;

/// Default configuration file location, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/sdrplay.toml";

/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "SDRPLAY_";

/// Errors produced while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A source could not be read or did not match the schema
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    /// Values parsed but failed validation
    #[error("Configuration validation error: {0}")]
    Invalid(String),
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BindingConfig {
    /// Library discovery and backend selection
    #[serde(default)]
    pub loader: LoaderConfig,
    /// Log output
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Library discovery settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Load exactly this library (path or bare file name)
    #[serde(default)]
    pub library_path: Option<PathBuf>,
    /// Extra directories searched before the platform defaults
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,
    /// `auto` tries the vendor library, `stub` never does
    #[serde(default)]
    pub backend: BackendMode,
}

/// Logging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Output format
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: OutputFormat::default(),
        }
    }
}

impl From<&LoaderConfig> for LoaderOptions {
    fn from(config: &LoaderConfig) -> Self {
        Self {
            library_path: config
                .library_path
                .clone()
                .filter(|p| !p.as_os_str().is_empty()),
            search_paths: config.search_paths.clone(),
        }
    }
}

impl BindingConfig {
    /// Load from `config/sdrplay.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    /// Load from a specific file path and the environment.
    ///
    /// A missing file is not an error; defaults and environment still apply.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// The provider stack, exposed so callers can merge their own sources.
    pub fn figment<P: AsRef<Path>>(path: P) -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .merge(
                Env::raw()
                    .only(&[LIBRARY_PATH_ENV])
                    .map(|_| "loader.library_path".into()),
            )
    }

    /// Validate configuration after loading.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::Invalid(format!(
                "Invalid logging level '{}'. Must be one of: {}",
                self.logging.level,
                valid_levels.join(", ")
            )));
        }

        for dir in &self.loader.search_paths {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::Invalid(
                    "Empty entry in loader.search_paths".to_string(),
                ));
            }
        }

        Ok(())
    }
}
