//! Errors raised while loading module-resolution configuration.
//!
//! These never reach `resolve` callers: a broken config is logged and the
//! resolver continues without its aliases.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolutionError {
    #[error("Failed to read {path}: {source}")]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {reason}\nSuggestion: Check JSON syntax, comments, and trailing commas")]
    InvalidConfig { path: PathBuf, reason: String },

    #[error("Circular extends chain detected at {path}")]
    CircularExtends { path: PathBuf },

    #[error("Invalid path pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

impl ResolutionError {
    pub fn config_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ConfigIo {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_config(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type ResolutionResult<T> = Result<T, ResolutionError>;
