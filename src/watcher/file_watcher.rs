//! Recursive watcher on a repository root feeding the incremental indexer.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use notify::event::ModifyKind;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{Duration, interval};

use super::debouncer::Debouncer;
use super::error::WatchError;
use super::FileEvent;
use crate::indexing::IncrementalIndexer;

/// How often debounced changes are checked.
const TICK: Duration = Duration::from_millis(100);

/// What a raw notify event asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Change {
    /// Debounce, then re-index (or remove if gone by then)
    Touched(PathBuf),
    /// Apply immediately
    Deleted(PathBuf),
}

fn classify(event: Event) -> Vec<Change> {
    match event.kind {
        EventKind::Create(_) | EventKind::Modify(ModifyKind::Data(_) | ModifyKind::Any) => {
            event.paths.into_iter().map(Change::Touched).collect()
        }
        // Renames report both sides; whichever no longer exists is handled
        // as a deletion once debounced
        EventKind::Modify(ModifyKind::Name(_)) => {
            event.paths.into_iter().map(Change::Touched).collect()
        }
        EventKind::Remove(_) => event.paths.into_iter().map(Change::Deleted).collect(),
        _ => Vec::new(),
    }
}

/// Hidden paths (the index directory, VCS metadata) never reach the indexer.
fn is_hidden_below(root: &Path, path: &Path) -> bool {
    path.strip_prefix(root).map_or(true, |relative| {
        relative.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|segment| segment.starts_with('.'))
        })
    })
}

pub struct FileWatcher {
    indexer: Arc<IncrementalIndexer>,
    debouncer: Debouncer,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    _watcher: notify::RecommendedWatcher,
    root: PathBuf,
}

impl FileWatcher {
    /// Start a recursive watch on the indexer's root.
    pub fn new(indexer: Arc<IncrementalIndexer>) -> Result<Self, WatchError> {
        let root = indexer.root().to_path_buf();
        let debounce_ms = indexer.settings().watch.debounce_ms;

        let (tx, rx) = mpsc::channel(256);
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.blocking_send(res);
        })?;
        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|source| WatchError::WatchRoot {
                path: root.clone(),
                source,
            })?;

        Ok(Self {
            indexer,
            debouncer: Debouncer::new(debounce_ms),
            event_rx: rx,
            _watcher: watcher,
            root,
        })
    }

    /// Process events until `shutdown` resolves. Pending changes are
    /// flushed and the snapshot saved before returning.
    pub async fn run(mut self, shutdown: impl Future<Output = ()>) -> Result<(), WatchError> {
        crate::log_event!("watcher", "started", "{}", self.root.display());
        tokio::pin!(shutdown);
        let mut ticker = interval(TICK);

        loop {
            tokio::select! {
                received = self.event_rx.recv() => {
                    match received {
                        Some(Ok(event)) => self.handle_event(event).await,
                        Some(Err(e)) => tracing::error!("[watcher] {}", WatchError::Event(e)),
                        None => return Err(WatchError::StreamClosed),
                    }
                }

                _ = ticker.tick() => {
                    let ready = self.debouncer.take_ready();
                    if !ready.is_empty() {
                        self.process_changes(ready).await;
                    }
                }

                _ = &mut shutdown => {
                    let rest = self.debouncer.take_ready();
                    self.process_changes(rest).await;
                    crate::log_event!("watcher", "stopped");
                    return Ok(());
                }
            }
        }
    }

    async fn handle_event(&mut self, event: Event) {
        for change in classify(event) {
            match change {
                Change::Touched(path) => {
                    if is_hidden_below(&self.root, &path) {
                        continue;
                    }
                    self.debouncer.record(path);
                }
                Change::Deleted(path) => {
                    if is_hidden_below(&self.root, &path) {
                        continue;
                    }
                    self.debouncer.cancel(&path);
                    self.debouncer.cancel_under(&path);
                    self.apply(FileEvent::Removed(path)).await;
                    self.persist().await;
                }
            }
        }
    }

    async fn process_changes(&self, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        for path in paths {
            // Rename-as-modify: the old name no longer exists
            let event = if tokio::fs::try_exists(&path).await.unwrap_or(false) {
                FileEvent::Changed(path)
            } else {
                FileEvent::Removed(path)
            };
            self.apply(event).await;
        }
        self.persist().await;
    }

    async fn apply(&self, event: FileEvent) {
        let path = event.path().clone();
        match self.indexer.handle_event(event).await {
            Ok(0) => crate::debug_event!("watcher", "ignored", "{}", path.display()),
            Ok(n) => crate::log_event!("watcher", "applied", "{} ({n} files)", path.display()),
            Err(source) => {
                let error = WatchError::Apply { path, source };
                tracing::error!("[watcher] {error}");
            }
        }
    }

    async fn persist(&self) {
        if !self.indexer.settings().indexing.persist {
            return;
        }
        if let Err(e) = self.indexer.save_snapshot().await {
            tracing::warn!("[watcher] failed to save snapshot: {e}");
        }
    }
}
