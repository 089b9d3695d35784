//! Command implementations for the CLI.
//!
//! Each command lives in its own module and takes the shared [`Context`].

pub mod calls;
pub mod deps;
pub mod index;
pub mod init;
pub mod search;
pub mod status;
pub mod watch;

use anyhow::Context as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use reposcope::{FilePath, IncrementalIndexer, Settings, TypeScriptAdapter};

/// Resolved global options.
pub struct Context {
    pub settings: Arc<Settings>,
    pub root: PathBuf,
    pub json: bool,
}

impl Context {
    pub fn new(settings: Settings, root: Option<PathBuf>, json: bool) -> anyhow::Result<Self> {
        let root = match root.or_else(|| settings.workspace_root.clone()) {
            Some(root) => root,
            None => std::env::current_dir().context("cannot determine current directory")?,
        };
        Ok(Self {
            settings: Arc::new(settings),
            root,
            json,
        })
    }

    pub fn indexer(&self) -> anyhow::Result<IncrementalIndexer> {
        IncrementalIndexer::new(
            &self.root,
            self.settings.clone(),
            Arc::new(TypeScriptAdapter::new()),
        )
        .with_context(|| format!("cannot open repository at {}", self.root.display()))
    }

    /// Indexer brought up to date (restored from the snapshot where possible).
    pub async fn ready_indexer(&self) -> anyhow::Result<IncrementalIndexer> {
        let indexer = self.indexer()?;
        indexer.cold_start().await?;
        Ok(indexer)
    }
}

/// Accept a path relative to the root, relative to the current directory,
/// or absolute.
pub fn file_arg(indexer: &IncrementalIndexer, path: &Path) -> anyhow::Result<FilePath> {
    if path.is_absolute() {
        return Ok(indexer.file_path(path)?);
    }
    if indexer.root().join(path).is_file() {
        return Ok(indexer.file_path(path)?);
    }
    let from_cwd = std::env::current_dir()?.join(path);
    let canonical = std::fs::canonicalize(&from_cwd)
        .with_context(|| format!("no such file: {}", path.display()))?;
    Ok(indexer.file_path(canonical)?)
}
