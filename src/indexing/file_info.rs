//! Change detection for individual files.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::UNIX_EPOCH;

use crate::utils::calculate_hash;

/// What the index remembers about a file's on-disk state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    pub mtime_ms: u64,
    pub size: u64,
    pub hash: String,
}

impl FileInfo {
    pub fn from_content(content: &[u8], mtime_ms: u64) -> Self {
        Self {
            mtime_ms,
            size: content.len() as u64,
            hash: calculate_hash(content),
        }
    }
}

pub fn mtime_ms(metadata: &std::fs::Metadata) -> u64 {
    metadata
        .modified()
        .ok()
        .and_then(|time| time.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_millis() as u64)
}

/// Result of comparing a file against its recorded state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// mtime and size match; trust the record
    Unchanged,
    /// Needs reading; the hash decides whether it really changed
    Suspect,
    /// Gone or unreadable
    Missing,
}

/// Cheap check: async `stat` plus `canonicalize`. A symlink that fails to
/// resolve falls back to the given path.
pub async fn check_freshness(path: &Path, recorded: Option<&FileInfo>) -> Freshness {
    let resolved = match tokio::fs::canonicalize(path).await {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::debug!("[indexer] canonicalize {} failed: {e}", path.display());
            path.to_path_buf()
        }
    };

    let metadata = match tokio::fs::metadata(&resolved).await {
        Ok(metadata) => metadata,
        Err(_) => return Freshness::Missing,
    };

    match recorded {
        Some(info) if info.mtime_ms == mtime_ms(&metadata) && info.size == metadata.len() => {
            Freshness::Unchanged
        }
        _ => Freshness::Suspect,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_freshness() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("a.ts");
        fs::write(&path, "export const a = 1;").unwrap();

        let metadata = fs::metadata(&path).unwrap();
        let info = FileInfo::from_content(b"export const a = 1;", mtime_ms(&metadata));

        assert_eq!(check_freshness(&path, Some(&info)).await, Freshness::Unchanged);
        assert_eq!(check_freshness(&path, None).await, Freshness::Suspect);

        let grown = FileInfo { size: 1, ..info.clone() };
        assert_eq!(check_freshness(&path, Some(&grown)).await, Freshness::Suspect);

        fs::remove_file(&path).unwrap();
        assert_eq!(check_freshness(&path, Some(&info)).await, Freshness::Missing);
    }
}
