//! core::config
//!
//! Configuration schema and loading.
//!
//! # Precedence
//!
//! 1. Default values
//! 2. The file named by `$BACKSTACK_CONFIG`, or a file passed explicitly
//!
//! Hosts that embed the back-stack usually build a [`Config`] in code or
//! from a bundled TOML string; file loading exists for hosts that keep
//! their settings on disk.
//!
//! # Example
//!
//! ```
//! use backstack::core::config::Config;
//! use backstack::host::CommitMode;
//!
//! let config = Config::from_toml_str(r#"back_press_mode = "deferred""#).unwrap();
//! assert_eq!(config.back_press_mode(), CommitMode::Deferred);
//! assert!(config.reordering_allowed());
//! ```

pub mod schema;

pub use schema::ConfigFile;

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::host::CommitMode;

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "BACKSTACK_CONFIG";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },
}

/// Resolved configuration.
///
/// Accessors apply the defaults for anything the file left unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Values as read from the file.
    pub file: ConfigFile,
    /// Path the file was loaded from, if any.
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Build a config from already-parsed values.
    pub fn new(file: ConfigFile) -> Self {
        Self {
            file,
            loaded_from: None,
        }
    }

    /// Parse a config from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ParseError` if the TOML is malformed or has
    /// unknown keys.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file = toml::from_str(contents).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            message: e.to_string(),
        })?;
        Ok(Self::new(file))
    }

    /// Load a config file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let file = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(Self {
            file,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// Load from `$BACKSTACK_CONFIG` if it names an existing file,
    /// otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the named file exists but cannot be parsed.
    pub fn load_default() -> Result<Self, ConfigError> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Self::load(&path);
            }
        }
        Ok(Self::default())
    }

    /// Whether transactions may be reordered by the host (default: true).
    pub fn reordering_allowed(&self) -> bool {
        self.file.reordering_allowed.unwrap_or(true)
    }

    /// Commit mode for back presses (default: immediate).
    pub fn back_press_mode(&self) -> CommitMode {
        self.file.back_press_mode.unwrap_or(CommitMode::Immediate)
    }

    /// Path the config was loaded from.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }
}
