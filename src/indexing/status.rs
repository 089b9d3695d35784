//! Diagnostics surface of the index.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::FilePath;

/// An import whose specifier did not map to a repository file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnresolvedImport {
    pub file: FilePath,
    pub specifier: String,
    pub line: u32,
}

impl fmt::Display for UnresolvedImport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: cannot resolve '{}'", self.file, self.line, self.specifier)
    }
}

/// A file-level failure recorded instead of being raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileError {
    pub file: FilePath,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IndexStatus {
    pub total_files: usize,
    pub indexed_files: usize,
    pub symbol_count: usize,
    pub stale_files: Vec<FilePath>,
    pub unresolved_imports: usize,
    pub resolution_errors: Vec<UnresolvedImport>,
    pub parse_errors: Vec<FileError>,
    /// Files invalidated and waiting for their edges to be rebuilt
    pub pending_rebuild: usize,
    pub last_rebuilt_at: Option<u64>,
}

impl IndexStatus {
    pub fn is_healthy(&self) -> bool {
        self.stale_files.is_empty() && self.parse_errors.is_empty() && self.pending_rebuild == 0
    }
}
