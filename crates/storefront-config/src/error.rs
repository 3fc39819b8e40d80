//! Configuration error types.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("configuration file not found: {path}")]
    FileNotFound {
        /// Path that was looked up.
        path: PathBuf,
    },

    /// The file exists but could not be read.
    #[error("failed to read configuration file: {path}")]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension is neither `.toml` nor `.json`.
    #[error("unsupported configuration format: {0}")]
    UnsupportedFormat(String),

    /// TOML parse failure, unknown fields included.
    #[error("failed to parse TOML configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// JSON parse failure, unknown fields included.
    #[error("failed to parse JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    /// An override variable carries a value of the wrong shape.
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvValue {
        /// Variable name.
        var: String,
        /// What was expected.
        reason: String,
    },

    /// A loaded value breaks a cross-field rule.
    #[error("invalid configuration value for {field}: {reason}")]
    InvalidValue {
        /// Dotted path of the field.
        field: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    pub(crate) fn file_not_found(path: impl Into<PathBuf>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub(crate) fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid_env(var: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidEnvValue {
            var: var.into(),
            reason: reason.into(),
        }
    }

    /// Creates an [`InvalidValue`](Self::InvalidValue) error.
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}
