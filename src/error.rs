//! Error types for indexing and query operations.
//!
//! File-level failures are caught at the file boundary by the indexer and
//! surface through `IndexStatus`. Only invalid-argument errors reach callers
//! of query operations.

use std::path::PathBuf;
use thiserror::Error;

use crate::parsing::ParseError;
use crate::storage::StorageError;

#[derive(Error, Debug)]
pub enum IndexError {
    #[error("Path escapes the repository root: {path}")]
    PathOutsideRoot { path: String },

    #[error("Invalid path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: ParseError,
    },

    #[error("Parsing {path} exceeded {timeout_ms}ms")]
    ParseTimeout { path: String, timeout_ms: u64 },

    #[error("Symbol '{name}' not found in {file}")]
    SymbolNotFound { name: String, file: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("{0}")]
    General(String),
}

impl IndexError {
    /// Invalid-argument class errors are the only ones queries propagate.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            IndexError::InvalidArgument(_)
                | IndexError::SymbolNotFound { .. }
                | IndexError::PathOutsideRoot { .. }
                | IndexError::InvalidPath { .. }
        )
    }
}

impl From<tokio::task::JoinError> for IndexError {
    fn from(e: tokio::task::JoinError) -> Self {
        IndexError::Task(e.to_string())
    }
}

pub type IndexResult<T> = Result<T, IndexError>;
