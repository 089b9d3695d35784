//! Module resolution: import specifier + context file -> repository file.
//!
//! Relative and root-absolute specifiers are looked up on disk (exact, then
//! each configured extension, then the TypeScript twin of a `.js` path, then
//! `index.<ext>`). Bare specifiers go through the alias rules of the nearest
//! ancestor project config, then its `baseUrl`, then the optional bundler
//! root. Nothing here returns an error to callers; an unresolvable
//! specifier is `None` and the caller records it as a diagnostic.

pub mod error;
pub mod tsconfig;

pub use error::{ResolutionError, ResolutionResult};
pub use tsconfig::{AliasTable, PathRule};

use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ResolutionConfig;
use crate::types::{FilePath, lexical_normalize};

/// `.js`-family extension -> TypeScript sources that compile to it.
const TS_TWINS: &[(&str, &[&str])] = &[
    ("js", &["ts", "tsx"]),
    ("jsx", &["tsx"]),
    ("mjs", &["mts"]),
    ("cjs", &["cts"]),
];

pub struct ModuleResolver {
    root: PathBuf,
    config: ResolutionConfig,
    /// Config file -> compiled aliases (`None` when the file failed to load)
    alias_tables: DashMap<PathBuf, Option<Arc<AliasTable>>>,
    /// Root-relative directory -> nearest config file
    nearest_config: DashMap<String, Option<PathBuf>>,
}

impl ModuleResolver {
    pub fn new(root: impl Into<PathBuf>, config: ResolutionConfig) -> Self {
        Self {
            root: root.into(),
            config,
            alias_tables: DashMap::new(),
            nearest_config: DashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `specifier` as written in `context`.
    pub fn resolve(&self, context: &FilePath, specifier: &str) -> Option<FilePath> {
        let specifier = specifier.split(['?', '#']).next().unwrap_or(specifier);
        if specifier.is_empty() {
            return None;
        }

        if let Some(rooted) = specifier.strip_prefix('/') {
            return self.find_on_disk(&self.root.join(rooted));
        }

        if is_relative(specifier) {
            let base = context.to_path(&self.root);
            let dir = base.parent().unwrap_or(&self.root);
            return self.find_on_disk(&dir.join(specifier));
        }

        self.resolve_bare(context, specifier)
    }

    fn resolve_bare(&self, context: &FilePath, specifier: &str) -> Option<FilePath> {
        if let Some(table) = self.alias_table_for(context) {
            for candidate in table.candidates(specifier) {
                if let Some(found) = self.find_on_disk(&candidate) {
                    return Some(found);
                }
            }
            if let Some(base_url) = &table.base_url {
                if let Some(found) = self.find_on_disk(&base_url.join(specifier)) {
                    return Some(found);
                }
            }
        }

        let bundler_root = self.config.bundler_root.as_deref()?;
        self.find_on_disk(&self.root.join(bundler_root).join(specifier))
    }

    /// exact -> `+ext` -> TypeScript twin -> `dir/index.<ext>`.
    fn find_on_disk(&self, path: &Path) -> Option<FilePath> {
        let path = lexical_normalize(path);
        if !path.starts_with(&self.root) {
            return None;
        }

        if path.is_file() {
            return self.to_file_path(&path);
        }

        let raw = path.to_string_lossy();
        for ext in &self.config.extensions {
            let candidate = PathBuf::from(format!("{raw}{ext}"));
            if candidate.is_file() {
                return self.to_file_path(&candidate);
            }
        }

        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            if let Some((_, twins)) = TS_TWINS.iter().find(|(js, _)| *js == ext) {
                for twin in *twins {
                    let candidate = path.with_extension(twin);
                    if candidate.is_file() {
                        return self.to_file_path(&candidate);
                    }
                }
            }
        }

        if path.is_dir() {
            for ext in &self.config.extensions {
                let candidate = path.join(format!("index{ext}"));
                if candidate.is_file() {
                    return self.to_file_path(&candidate);
                }
            }
        }

        None
    }

    fn to_file_path(&self, path: &Path) -> Option<FilePath> {
        FilePath::from_absolute(&self.root, path).ok()
    }

    /// Aliases of the nearest ancestor config, loaded once per config file.
    pub fn alias_table_for(&self, context: &FilePath) -> Option<Arc<AliasTable>> {
        let config_path = self.nearest_config_for(context.dir_name())?;

        if let Some(cached) = self.alias_tables.get(&config_path) {
            return cached.clone();
        }

        let table = match AliasTable::load(&config_path) {
            Ok(table) => {
                crate::debug_event!(
                    "resolver",
                    "alias table",
                    "{} ({} rules)",
                    config_path.display(),
                    table.rules().len()
                );
                Some(Arc::new(table))
            }
            Err(e) => {
                tracing::warn!("[resolver] ignoring {}: {e}", config_path.display());
                None
            }
        };
        self.alias_tables.insert(config_path, table.clone());
        table
    }

    fn nearest_config_for(&self, rel_dir: &str) -> Option<PathBuf> {
        if let Some(cached) = self.nearest_config.get(rel_dir) {
            return cached.clone();
        }

        let start = self.root.join(rel_dir);
        let found = start
            .ancestors()
            .take_while(|dir| dir.starts_with(&self.root))
            .find_map(|dir| {
                self.config
                    .config_files
                    .iter()
                    .map(|name| dir.join(name))
                    .find(|candidate| candidate.is_file())
            });

        self.nearest_config.insert(rel_dir.to_string(), found.clone());
        found
    }

    /// Drop cached alias tables and config lookups.
    pub fn reload_config(&self) {
        self.alias_tables.clear();
        self.nearest_config.clear();
        crate::log_event!("resolver", "config reloaded");
    }

    /// True for files whose change should trigger `reload_config`.
    pub fn is_config_file(&self, path: &FilePath) -> bool {
        self.config
            .config_files
            .iter()
            .any(|name| path.file_name() == name)
    }
}

fn is_relative(specifier: &str) -> bool {
    specifier == "."
        || specifier == ".."
        || specifier.starts_with("./")
        || specifier.starts_with("../")
}
