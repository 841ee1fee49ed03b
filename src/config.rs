//! Site configuration.
//!
//! Storage namespace, notification timing, deep-link retry policy and log
//! verbosity. Stored as JSON in the user's config directory (native) or in
//! `localStorage` (browser); anything missing falls back to defaults.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::navigation::RetryPolicy;
use crate::notify::DEFAULT_NOTIFICATION_MS;
use crate::store::DEFAULT_STORAGE_KEY;

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }

    /// Same as [`Self::to_level_filter`], as a `log::Level`.
    pub fn to_level(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
            LogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Site configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Namespace of the persisted image record
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// How long notifications stay visible, in milliseconds
    #[serde(default = "default_notification_ms")]
    pub notification_ms: u64,

    /// Deep-link retry policy
    #[serde(default)]
    pub navigation: RetryPolicy,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

fn default_notification_ms() -> u64 {
    DEFAULT_NOTIFICATION_MS
}

impl SiteConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            storage_key: default_storage_key(),
            notification_ms: default_notification_ms(),
            navigation: RetryPolicy::default(),
            log_level: LogLevel::default(),
        }
    }

    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "docs-config.json"
    }

    /// Get the default config file path for auto-load/save.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("rawteous-docs").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("rawteous-docs")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from `path`.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_path(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Load configuration from an explicit path or the default one,
    /// falling back to defaults when missing or unreadable.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_default(path: Option<&std::path::Path>) -> Self {
        let Some(path) = path.map(std::path::Path::to_path_buf).or_else(Self::default_path) else {
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::default();
        }

        match Self::load_from_path(&path) {
            Ok(config) => {
                log::info!("Loaded configuration from {:?}", path);
                config
            }
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Save configuration to `path`, creating parent directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_path(&self, path: &std::path::Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// LocalStorage key for WASM config persistence.
    #[cfg(target_arch = "wasm32")]
    const LOCALSTORAGE_KEY: &'static str = "rawteous-docs-config";

    /// Load configuration from localStorage, falling back to defaults
    /// (WASM only).
    #[cfg(target_arch = "wasm32")]
    pub fn load_from_local_storage() -> Self {
        use crate::store::{LocalStorage, Storage};

        let stored = LocalStorage::open().and_then(|s| s.get_item(Self::LOCALSTORAGE_KEY));
        match stored {
            Ok(Some(json)) => match Self::from_json(&json) {
                Ok(config) => {
                    log::info!("Loaded configuration from localStorage");
                    config
                }
                Err(e) => {
                    log::warn!("Failed to parse config from localStorage: {}", e);
                    Self::default()
                }
            },
            Ok(None) => {
                log::debug!("No config found in localStorage");
                Self::default()
            }
            Err(e) => {
                log::warn!("Failed to read from localStorage: {}", e);
                Self::default()
            }
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// No config directory could be determined
    #[error("Could not determine config directory")]
    NoLocation,

    /// Refusing to replace an existing file
    #[error("Configuration file {0:?} already exists")]
    AlreadyExists(std::path::PathBuf),
}
