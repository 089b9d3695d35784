//! Snapshot persistence.
//!
//! One JSON document per repository at `<index_path>/snapshot.json`. Saves
//! go to a temporary file that is renamed over the old snapshot while the
//! save mutex is held; readers keep working on in-memory state meanwhile.

use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::error::{StorageError, StorageResult};
use super::index_data::{IndexSnapshot, SNAPSHOT_VERSION, SnapshotHeader};

const SNAPSHOT_FILE: &str = "snapshot.json";

#[derive(Debug)]
pub struct IndexPersistence {
    base_path: PathBuf,
    save_lock: Mutex<()>,
}

impl IndexPersistence {
    pub fn new(base_path: PathBuf) -> Self {
        Self {
            base_path,
            save_lock: Mutex::new(()),
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.base_path.join(SNAPSHOT_FILE)
    }

    pub fn exists(&self) -> bool {
        self.snapshot_path().is_file()
    }

    #[must_use = "Save errors should be handled to ensure data is persisted"]
    pub async fn save(&self, snapshot: &IndexSnapshot) -> StorageResult<()> {
        let _guard = self.save_lock.lock().await;
        self.write(snapshot).await
    }

    /// Save whatever `capture` returns, calling it only once the save mutex
    /// is held. Concurrent saves then land in capture order and an older
    /// state never overwrites a newer one.
    #[must_use = "Save errors should be handled to ensure data is persisted"]
    pub async fn save_with(&self, capture: impl FnOnce() -> IndexSnapshot) -> StorageResult<()> {
        let _guard = self.save_lock.lock().await;
        let snapshot = capture();
        self.write(&snapshot).await
    }

    /// Caller holds `save_lock`.
    async fn write(&self, snapshot: &IndexSnapshot) -> StorageResult<()> {
        let bytes = serde_json::to_vec(snapshot)?;
        tokio::fs::create_dir_all(&self.base_path).await?;

        let target = self.snapshot_path();
        let tmp = self.base_path.join(format!("{SNAPSHOT_FILE}.tmp"));
        tokio::fs::write(&tmp, &bytes).await?;
        tokio::fs::rename(&tmp, &target).await?;

        crate::debug_event!(
            "persistence",
            "saved",
            "{} files, {} bytes to {}",
            snapshot.file_count(),
            bytes.len(),
            target.display()
        );
        Ok(())
    }

    /// Load and validate the snapshot taken for `root`.
    #[must_use = "Load errors should be handled appropriately"]
    pub async fn load(&self, root: &Path) -> StorageResult<IndexSnapshot> {
        let path = self.snapshot_path();
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(path));
            }
            Err(e) => return Err(e.into()),
        };

        let header: SnapshotHeader = serde_json::from_slice(&bytes)?;
        if header.version != SNAPSHOT_VERSION {
            return Err(StorageError::VersionMismatch {
                found: header.version,
                expected: SNAPSHOT_VERSION,
            });
        }
        if header.root != root {
            return Err(StorageError::RootMismatch {
                found: header.root,
                expected: root.to_path_buf(),
            });
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Delete the persisted snapshot.
    pub async fn clear(&self) -> StorageResult<()> {
        match tokio::fs::remove_file(self.snapshot_path()).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
