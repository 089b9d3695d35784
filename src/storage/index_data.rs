//! Plain serializable snapshot of the index.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::parsing::{CallSite, ImportSpec};
use crate::types::{FilePath, Symbol};

/// Bumped whenever the on-disk layout changes; a mismatch forces a rebuild.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Everything needed to restore one file without re-parsing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub mtime_ms: u64,
    pub size: u64,
    pub hash: String,
    #[serde(default)]
    pub symbols: Vec<Symbol>,
    #[serde(default)]
    pub imports: Vec<ImportSpec>,
    #[serde(default)]
    pub exports: Vec<String>,
    #[serde(default)]
    pub call_sites: Vec<CallSite>,
    #[serde(default)]
    pub trigram_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub version: u32,
    pub root: PathBuf,
    pub saved_at: u64,
    pub files: IndexMap<FilePath, FileRecord>,
    #[serde(default)]
    pub reverse_imports: BTreeMap<FilePath, Vec<FilePath>>,
}

impl IndexSnapshot {
    pub fn new(root: PathBuf) -> Self {
        Self {
            version: SNAPSHOT_VERSION,
            root,
            saved_at: crate::utils::get_utc_timestamp(),
            files: IndexMap::new(),
            reverse_imports: BTreeMap::new(),
        }
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.files.values().map(|record| record.symbols.len()).sum()
    }
}

/// Read first so a version bump is reported as such rather than as a decode error.
#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotHeader {
    pub version: u32,
    pub root: PathBuf,
}
