//! File system walker for discovering files to index
//!
//! This module provides directory traversal with support for:
//! - .gitignore rules (also outside git repositories)
//! - Custom ignore patterns from configuration
//! - Extension filtering and a size cap
//! - Hidden file handling

use ignore::WalkBuilder;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::Settings;

/// Project-local ignore file, gitignore syntax.
pub const IGNORE_FILE: &str = ".reposcopeignore";

/// Walks directories to find files to index
pub struct FileWalker {
    settings: Arc<Settings>,
}

impl FileWalker {
    pub fn new(settings: Arc<Settings>) -> Self {
        Self { settings }
    }

    /// Files under `root` to index, sorted by path.
    pub fn walk(&self, root: &Path) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(root);

        builder
            .hidden(true) // Skip dotfiles and dot-directories
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .follow_links(false)
            .require_git(false) // Allow gitignore to work in non-git directories
            .add_custom_ignore_filename(IGNORE_FILE);

        let mut override_builder = ignore::overrides::OverrideBuilder::new(root);
        for pattern in &self.settings.indexing.ignore_patterns {
            // Overrides whitelist by default; `!` turns a glob into an exclusion
            if let Err(e) = override_builder.add(&format!("!{pattern}")) {
                tracing::warn!("[walker] invalid ignore pattern '{pattern}': {e}");
            }
        }
        match override_builder.build() {
            Ok(overrides) => {
                builder.overrides(overrides);
            }
            Err(e) => tracing::warn!("[walker] ignoring custom patterns: {e}"),
        }

        let extensions: HashSet<&str> = self
            .settings
            .indexing
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.'))
            .collect();

        let mut files: Vec<PathBuf> = builder
            .build()
            .filter_map(Result::ok) // Skip entries we can't access
            .filter(|entry| entry.file_type().is_some_and(|ft| ft.is_file()))
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| extensions.contains(ext))
            })
            .filter(|entry| {
                let fits = entry.metadata().map_or(true, |meta| self.within_size_cap(meta.len()));
                if !fits {
                    tracing::debug!("[walker] skipping oversized {}", entry.path().display());
                }
                fits
            })
            .map(|entry| entry.into_path())
            .collect();

        files.sort();
        files
    }

    /// Count files that would be indexed (useful for dry runs)
    pub fn count_files(&self, root: &Path) -> usize {
        self.walk(root).len()
    }

    /// Whether a single path under `root` passes the walk's filters.
    ///
    /// Used for watcher events, which arrive one path at a time. Hidden
    /// segments, configured ignore patterns (on the path or any parent
    /// directory) and the extension list apply; gitignore files do not.
    /// The size cap needs the file's metadata, see [`Self::within_size_cap`].
    pub fn is_indexable(&self, root: &Path, path: &Path) -> bool {
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };

        let hidden = relative.components().any(|component| {
            component
                .as_os_str()
                .to_str()
                .is_some_and(|segment| segment.starts_with('.'))
        });
        if hidden {
            return false;
        }

        let extension_ok = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| {
                self.settings
                    .indexing
                    .extensions
                    .iter()
                    .any(|allowed| allowed.trim_start_matches('.') == ext)
            });
        if !extension_ok {
            return false;
        }

        let mut override_builder = ignore::overrides::OverrideBuilder::new(root);
        for pattern in &self.settings.indexing.ignore_patterns {
            if let Err(e) = override_builder.add(&format!("!{pattern}")) {
                tracing::warn!("[walker] invalid ignore pattern '{pattern}': {e}");
            }
        }
        let overrides = match override_builder.build() {
            Ok(overrides) => overrides,
            Err(e) => {
                tracing::warn!("[walker] ignoring custom patterns: {e}");
                return true;
            }
        };

        let mut current = Some(relative);
        let mut is_dir = false;
        while let Some(candidate) = current.filter(|c| !c.as_os_str().is_empty()) {
            if overrides.matched(root.join(candidate), is_dir).is_ignore() {
                return false;
            }
            current = candidate.parent();
            is_dir = true;
        }
        true
    }

    /// Whether a file of `len` bytes is small enough to index.
    pub fn within_size_cap(&self, len: u64) -> bool {
        len <= self.settings.indexing.max_file_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn walker() -> FileWalker {
        FileWalker::new(Arc::new(Settings::default()))
    }

    #[test]
    fn test_walk_directory_filters_extensions() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("main.ts"), "export {}").unwrap();
        fs::write(root.join("lib.js"), "module.exports = {}").unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();
        fs::write(root.join("README.md"), "# Test").unwrap();

        let files = walker().walk(root);

        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("lib.js"));
        assert!(files[1].ends_with("main.ts"));
    }

    #[test]
    fn test_ignore_hidden_and_configured_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("node_modules/pkg")).unwrap();
        fs::create_dir_all(root.join(".cache")).unwrap();
        fs::write(root.join("node_modules/pkg/index.js"), "").unwrap();
        fs::write(root.join(".cache/x.ts"), "").unwrap();
        fs::write(root.join(".hidden.ts"), "").unwrap();
        fs::write(root.join("visible.ts"), "").unwrap();

        let files = walker().walk(root);

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("visible.ts"));
    }

    #[test]
    fn test_gitignore_and_custom_ignore_file() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join(".gitignore"), "ignored.ts\n").unwrap();
        fs::write(root.join(IGNORE_FILE), "generated/\n").unwrap();
        fs::create_dir_all(root.join("generated")).unwrap();

        fs::write(root.join("ignored.ts"), "").unwrap();
        fs::write(root.join("generated/api.ts"), "").unwrap();
        fs::write(root.join("included.ts"), "").unwrap();

        let files = walker().walk(root);

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("included.ts"));
    }

    #[test]
    fn test_is_indexable() {
        let root = Path::new("/repo");
        let walker = walker();
        assert!(walker.is_indexable(root, Path::new("/repo/src/app.ts")));
        assert!(!walker.is_indexable(root, Path::new("/repo/src/app.rs")));
        assert!(!walker.is_indexable(root, Path::new("/repo/.reposcope/index/x.json")));
        assert!(!walker.is_indexable(root, Path::new("/repo/node_modules/pkg/index.js")));
        assert!(!walker.is_indexable(root, Path::new("/elsewhere/app.ts")));
    }

    #[test]
    fn test_size_cap() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("big.ts"), "x".repeat(64)).unwrap();
        fs::write(root.join("small.ts"), "x").unwrap();

        let mut settings = Settings::default();
        settings.indexing.max_file_size = 16;
        let files = FileWalker::new(Arc::new(settings)).walk(root);

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("small.ts"));
    }
}
