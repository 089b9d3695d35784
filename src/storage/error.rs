use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Snapshot version {found} does not match expected {expected}")]
    VersionMismatch { found: u32, expected: u32 },

    #[error("Snapshot was taken for {found}, not {expected}")]
    RootMismatch { found: PathBuf, expected: PathBuf },

    #[error("Snapshot is corrupt: {0}")]
    Corrupt(String),

    #[error("No snapshot at {0}")]
    NotFound(PathBuf),
}

impl StorageError {
    /// Errors that mean "discard the snapshot and rebuild" rather than a broken disk.
    pub fn requires_rebuild(&self) -> bool {
        matches!(
            self,
            StorageError::VersionMismatch { .. }
                | StorageError::RootMismatch { .. }
                | StorageError::Corrupt(_)
                | StorageError::NotFound(_)
        )
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_syntax() || e.is_eof() || e.is_data() {
            StorageError::Corrupt(e.to_string())
        } else {
            StorageError::Serialization(e.to_string())
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;
