//! Errors raised while watching a repository root.

use std::path::PathBuf;
use thiserror::Error;

use crate::error::IndexError;

#[derive(Error, Debug)]
pub enum WatchError {
    /// The platform watcher could not be created.
    #[error("Failed to start the file system watcher: {0}")]
    Backend(#[from] notify::Error),

    #[error("Cannot watch root {path}: {source}")]
    WatchRoot {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// An event arrived as an error; the watch itself keeps running.
    #[error("Watcher reported an error: {0}")]
    Event(#[source] notify::Error),

    /// Applying a debounced change to the index failed.
    #[error("Failed to update the index for {path}: {source}")]
    Apply {
        path: PathBuf,
        #[source]
        source: IndexError,
    },

    #[error("Watcher event stream closed")]
    StreamClosed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_apply_keeps_index_error_as_source() {
        let error = WatchError::Apply {
            path: PathBuf::from("/repo/src/a.ts"),
            source: IndexError::PathOutsideRoot {
                path: "../a.ts".to_string(),
            },
        };
        assert!(error.to_string().contains("/repo/src/a.ts"));
        assert!(error.source().is_some());
    }

    #[test]
    fn test_backend_errors_convert() {
        let error = WatchError::from(notify::Error::generic("inotify limit reached"));
        assert!(matches!(error, WatchError::Backend(_)));
        assert!(error.to_string().contains("inotify limit reached"));
    }
}
