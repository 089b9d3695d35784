//! Debouncing of file change events.
//!
//! Editors often write a file several times per save (auto-save, format on
//! save). A path is only handed on once it has been quiet for the
//! configured duration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Debounces change events by path.
#[derive(Debug)]
pub struct Debouncer {
    /// path -> last change timestamp
    pending: HashMap<PathBuf, Instant>,
    duration: Duration,
}

impl Debouncer {
    pub fn new(debounce_ms: u64) -> Self {
        Self {
            pending: HashMap::new(),
            duration: Duration::from_millis(debounce_ms),
        }
    }

    /// Record a change, restarting the quiet period for this path.
    pub fn record(&mut self, path: PathBuf) {
        self.pending.insert(path, Instant::now());
    }

    /// Forget a pending change (the path was deleted meanwhile).
    pub fn cancel(&mut self, path: &Path) -> bool {
        self.pending.remove(path).is_some()
    }

    /// Forget pending changes at or below `dir`.
    pub fn cancel_under(&mut self, dir: &Path) -> usize {
        let before = self.pending.len();
        self.pending.retain(|path, _| !path.starts_with(dir));
        before - self.pending.len()
    }

    /// Paths quiet for at least the debounce duration, sorted, removed
    /// from the pending set.
    pub fn take_ready(&mut self) -> Vec<PathBuf> {
        self.take_ready_at(Instant::now())
    }

    fn take_ready_at(&mut self, now: Instant) -> Vec<PathBuf> {
        let mut ready = Vec::new();
        self.pending.retain(|path, last_change| {
            if now.duration_since(*last_change) >= self.duration {
                ready.push(path.clone());
                false
            } else {
                true
            }
        });
        ready.sort();
        ready
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ready_after_quiet_period() {
        let mut debouncer = Debouncer::new(50);
        let path = PathBuf::from("/repo/src/app.ts");
        debouncer.record(path.clone());

        let recorded = debouncer.pending[&path];
        assert!(debouncer.take_ready_at(recorded).is_empty());
        assert!(debouncer.has_pending());

        let ready = debouncer.take_ready_at(recorded + Duration::from_millis(60));
        assert_eq!(ready, vec![path]);
        assert!(!debouncer.has_pending());
    }

    #[test]
    fn test_new_change_restarts_timer() {
        let mut debouncer = Debouncer::new(50);
        let path = PathBuf::from("/repo/a.ts");
        debouncer.record(path.clone());
        let first = debouncer.pending[&path];

        debouncer
            .pending
            .insert(path.clone(), first + Duration::from_millis(30));
        assert!(
            debouncer
                .take_ready_at(first + Duration::from_millis(60))
                .is_empty()
        );
        assert_eq!(
            debouncer.take_ready_at(first + Duration::from_millis(80)),
            vec![path]
        );
    }

    #[test]
    fn test_ready_paths_are_sorted() {
        let mut debouncer = Debouncer::new(0);
        debouncer.record(PathBuf::from("/repo/b.ts"));
        debouncer.record(PathBuf::from("/repo/a.ts"));
        let ready = debouncer.take_ready_at(Instant::now() + Duration::from_millis(1));
        assert_eq!(
            ready,
            vec![PathBuf::from("/repo/a.ts"), PathBuf::from("/repo/b.ts")]
        );
    }

    #[test]
    fn test_cancel() {
        let mut debouncer = Debouncer::new(50);
        debouncer.record(PathBuf::from("/repo/lib/x.ts"));
        debouncer.record(PathBuf::from("/repo/lib/y.ts"));
        debouncer.record(PathBuf::from("/repo/main.ts"));

        assert!(debouncer.cancel(Path::new("/repo/main.ts")));
        assert!(!debouncer.cancel(Path::new("/repo/main.ts")));
        assert_eq!(debouncer.cancel_under(Path::new("/repo/lib")), 2);
        assert_eq!(debouncer.pending_count(), 0);
    }
}
