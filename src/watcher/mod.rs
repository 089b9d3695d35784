//! File watching for live index updates.
//!
//! ```text
//! notify::RecommendedWatcher (recursive on the root)
//!   -> mpsc channel
//!   -> Debouncer (changes only; removals pass straight through)
//!   -> FileEvent::{Changed, Removed}
//!   -> IncrementalIndexer::handle_event
//! ```

mod debouncer;
mod error;
mod file_watcher;

pub use debouncer::Debouncer;
pub use error::WatchError;
pub use file_watcher::FileWatcher;

use std::path::PathBuf;

/// A filesystem change, as the indexer consumes it. Paths are absolute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileEvent {
    /// Created or modified
    Changed(PathBuf),
    /// Deleted; may name a directory, which removes everything beneath it
    Removed(PathBuf),
}

impl FileEvent {
    pub fn path(&self) -> &PathBuf {
        match self {
            FileEvent::Changed(path) | FileEvent::Removed(path) => path,
        }
    }
}
