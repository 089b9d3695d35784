//! Incremental indexer
//!
//! Owns the live index for one repository root: symbols, trigram postings,
//! the import graph and stored call sites, all behind a single
//! `parking_lot::RwLock`. Reading, hashing, parsing and module resolution
//! happen outside the lock; a file's new data is swapped in under one write
//! guard so queries never observe a half-updated file.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;

use super::file_info::{FileInfo, Freshness, check_freshness, mtime_ms};
use super::status::{FileError, IndexStatus, UnresolvedImport};
use super::walker::FileWalker;
use crate::Settings;
use crate::error::{IndexError, IndexResult};
use crate::parsing::{ImportSpec, LanguageAdapter, ParseError, ParsedFile};
use crate::relationship::{CallAnalysis, CallGraph};
use crate::resolver::ModuleResolver;
use crate::search::{
    ReadBudget, SearchOptions, SearchResponse, collect_candidates, normalize_keywords,
    read_documents, rank_documents,
};
use crate::storage::{
    DependencyGraph, FileRecord, IndexPersistence, IndexSnapshot, SpecifierResolver, StorageError,
    TransitiveResult,
};
use crate::symbol::{SymbolEntry, SymbolIndex};
use crate::trigram::TrigramIndex;
use crate::types::{Direction, FilePath, Symbol};
use crate::watcher::FileEvent;

/// Per-file bookkeeping that is not owned by one of the indexes.
#[derive(Debug, Clone)]
pub struct IndexedFile {
    pub info: FileInfo,
    pub exports: Vec<String>,
    pub parse_error: Option<String>,
}

/// Everything guarded by the indexer's lock.
#[derive(Debug, Default)]
pub struct IndexState {
    pub files: BTreeMap<FilePath, IndexedFile>,
    pub symbols: SymbolIndex,
    pub trigrams: TrigramIndex,
    pub deps: DependencyGraph,
    pub calls: CallGraph,
    /// Files that failed to index, with the reason
    pub stale: BTreeMap<FilePath, String>,
}

impl IndexState {
    /// Swap in a file's data. Without a resolver the imports are only
    /// recorded and wait for `DependencyGraph::build`.
    fn apply(&mut self, update: FileUpdate, resolver: Option<&dyn SpecifierResolver>) {
        let FileUpdate {
            file,
            info,
            text,
            parsed,
            parse_error,
            stale,
            ..
        } = update;
        let exports = parsed.exports();
        let ParsedFile {
            symbols,
            imports,
            call_sites,
        } = parsed;

        self.symbols.replace_file(&file, symbols);
        self.trigrams.index_file(&file, &text);
        self.calls.replace_file(&file, call_sites);
        match resolver {
            Some(resolver) => self.deps.update_file_dependencies(&file, imports, resolver),
            None => self.deps.set_imports(&file, imports),
        }
        match stale {
            Some(reason) => {
                self.stale.insert(file.clone(), reason);
            }
            None => {
                self.stale.remove(&file);
            }
        }
        self.files.insert(
            file,
            IndexedFile {
                info,
                exports,
                parse_error,
            },
        );
    }

    /// Drop a file everywhere. Returns the files that imported it.
    fn remove(&mut self, file: &FilePath) -> Vec<FilePath> {
        self.symbols.remove_file(file);
        self.trigrams.remove_file(file);
        self.calls.remove_file(file);
        self.stale.remove(file);
        self.files.remove(file);
        self.deps.remove_file(file)
    }

    /// `(file, specifiers)` for every file with recorded imports.
    fn import_specifiers<'a>(
        &self,
        files: impl Iterator<Item = &'a FilePath>,
    ) -> Vec<(FilePath, Vec<String>)> {
        files
            .map(|file| (file.clone(), specifiers(self.deps.imports_of(file))))
            .collect()
    }

    fn clear(&mut self) {
        *self = Self::default();
    }
}

fn specifiers(imports: &[ImportSpec]) -> Vec<String> {
    imports.iter().map(|import| import.specifier.clone()).collect()
}

/// Module resolutions computed ahead of taking the write lock.
#[derive(Debug, Default)]
struct Resolutions(HashMap<FilePath, HashMap<String, Option<FilePath>>>);

impl Resolutions {
    fn compute(resolver: &ModuleResolver, items: Vec<(FilePath, Vec<String>)>) -> Self {
        let mut out = HashMap::with_capacity(items.len());
        for (file, specs) in items {
            let mut resolved = HashMap::with_capacity(specs.len());
            for spec in specs {
                if !resolved.contains_key(&spec) {
                    let target = resolver.resolve(&file, &spec);
                    resolved.insert(spec, target);
                }
            }
            out.insert(file, resolved);
        }
        Self(out)
    }
}

impl SpecifierResolver for Resolutions {
    fn resolve_specifier(&self, context: &FilePath, specifier: &str) -> Option<FilePath> {
        self.0.get(context)?.get(specifier)?.clone()
    }
}

/// A file read (and parsed or restored) outside the lock.
#[derive(Debug)]
struct FileUpdate {
    file: FilePath,
    info: FileInfo,
    text: String,
    parsed: ParsedFile,
    parse_error: Option<String>,
    /// Set when the file should be retried later
    stale: Option<String>,
    restored: bool,
}

#[derive(Debug)]
enum LoadOutcome {
    Ready(FileUpdate),
    Missing(FilePath),
    Failed { file: FilePath, message: String },
}

impl LoadOutcome {
    fn file(&self) -> &FilePath {
        match self {
            LoadOutcome::Ready(update) => &update.file,
            LoadOutcome::Missing(file) | LoadOutcome::Failed { file, .. } => file,
        }
    }
}

/// Reads and parses single files. Cheap to clone into tasks.
#[derive(Clone)]
struct Loader {
    root: PathBuf,
    adapter: Arc<dyn LanguageAdapter>,
    parse_timeout: Duration,
}

impl Loader {
    /// Bring one file up to date. A snapshot record is reused when the
    /// file's mtime and size, or failing that its content hash, still match.
    async fn load(&self, file: FilePath, record: Option<FileRecord>) -> LoadOutcome {
        let path = file.to_path(&self.root);
        let recorded = record.as_ref().map(|r| FileInfo {
            mtime_ms: r.mtime_ms,
            size: r.size,
            hash: r.hash.clone(),
        });

        let freshness = check_freshness(&path, recorded.as_ref()).await;
        if freshness == Freshness::Missing {
            return LoadOutcome::Missing(file);
        }

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return LoadOutcome::Missing(file);
            }
            Err(e) => {
                let error = IndexError::FileRead { path, source: e };
                tracing::warn!("[indexer] {error}");
                return LoadOutcome::Failed {
                    file,
                    message: error.to_string(),
                };
            }
        };
        let mtime = match tokio::fs::metadata(&path).await {
            Ok(metadata) => mtime_ms(&metadata),
            Err(_) => 0,
        };
        let info = FileInfo::from_content(&bytes, mtime);
        let text = String::from_utf8_lossy(&bytes).into_owned();

        if let Some(record) = record {
            if freshness == Freshness::Unchanged || record.hash == info.hash {
                return LoadOutcome::Ready(FileUpdate {
                    file,
                    info,
                    text,
                    parsed: ParsedFile {
                        symbols: record.symbols,
                        imports: record.imports,
                        call_sites: record.call_sites,
                    },
                    parse_error: record.parse_error,
                    stale: None,
                    restored: true,
                });
            }
        }

        let (parsed, parse_error, stale) = match self.parse(&file, text.clone()).await {
            Ok(parsed) => (parsed, None, None),
            Err(error) => {
                tracing::warn!("[indexer] {error}");
                let retry = matches!(error, IndexError::ParseTimeout { .. } | IndexError::Task(_))
                    .then(|| error.to_string());
                (ParsedFile::default(), Some(error.to_string()), retry)
            }
        };

        LoadOutcome::Ready(FileUpdate {
            file,
            info,
            text,
            parsed,
            parse_error,
            stale,
            restored: false,
        })
    }

    /// Parse on the blocking pool under the configured timeout.
    async fn parse(&self, file: &FilePath, text: String) -> IndexResult<ParsedFile> {
        if !self.adapter.supports(file) {
            return Ok(ParsedFile::default());
        }

        let adapter = self.adapter.clone();
        let owned = file.clone();
        let task = tokio::task::spawn_blocking(move || adapter.parse(&owned, &text));

        match tokio::time::timeout(self.parse_timeout, task).await {
            Err(_) => Err(IndexError::ParseTimeout {
                path: file.to_string(),
                timeout_ms: self.parse_timeout.as_millis() as u64,
            }),
            Ok(joined) => match joined? {
                Ok(parsed) => Ok(parsed),
                Err(ParseError::Unsupported { .. }) => Ok(ParsedFile::default()),
                Err(source) => Err(IndexError::Parse {
                    path: file.to_string(),
                    source,
                }),
            },
        }
    }
}

/// Counters reported by [`IncrementalIndexer::cold_start`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ColdStartStats {
    pub discovered: usize,
    pub restored: usize,
    pub parsed: usize,
    pub failed: usize,
    /// Snapshot entries whose files no longer exist
    pub removed: usize,
    /// Files whose importers differ from the snapshot's reverse map
    pub relinked: usize,
    pub elapsed_ms: u64,
}

/// What happened to a single file update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    Indexed,
    Removed,
    Stale,
}

pub struct IncrementalIndexer {
    root: PathBuf,
    settings: Arc<Settings>,
    walker: FileWalker,
    loader: Loader,
    resolver: Arc<ModuleResolver>,
    persistence: IndexPersistence,
    state: Arc<RwLock<IndexState>>,
    /// Serializes read-parse-apply per file so the last read wins
    file_locks: DashMap<FilePath, Arc<Mutex<()>>>,
}

/// What a loaded snapshot contributes to a cold start.
#[derive(Default)]
struct Restored {
    records: HashMap<FilePath, FileRecord>,
    reverse_imports: Option<BTreeMap<FilePath, Vec<FilePath>>>,
}

/// Targets whose importer lists differ between two reverse-import maps.
fn relinked_targets(
    saved: &BTreeMap<FilePath, Vec<FilePath>>,
    current: &BTreeMap<FilePath, Vec<FilePath>>,
) -> Vec<FilePath> {
    let mut targets: Vec<FilePath> = saved
        .keys()
        .chain(current.keys())
        .filter(|target| saved.get(*target) != current.get(*target))
        .cloned()
        .collect();
    targets.sort();
    targets.dedup();
    targets
}

impl IncrementalIndexer {
    /// Create an indexer for `root`. The root is canonicalized once so every
    /// `FilePath` is relative to the same physical directory.
    pub fn new(
        root: impl AsRef<Path>,
        settings: Arc<Settings>,
        adapter: Arc<dyn LanguageAdapter>,
    ) -> IndexResult<Self> {
        let root = root.as_ref();
        let root = std::fs::canonicalize(root).map_err(|source| IndexError::FileRead {
            path: root.to_path_buf(),
            source,
        })?;

        let resolver = Arc::new(ModuleResolver::new(
            root.clone(),
            settings.resolution.clone(),
        ));
        let persistence = IndexPersistence::new(settings.index_dir(&root));
        let loader = Loader {
            root: root.clone(),
            adapter,
            parse_timeout: Duration::from_millis(settings.indexing.parse_timeout_ms.max(1)),
        };

        Ok(Self {
            walker: FileWalker::new(settings.clone()),
            root,
            settings,
            loader,
            resolver,
            persistence,
            state: Arc::new(RwLock::new(IndexState::default())),
            file_locks: DashMap::new(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn resolver(&self) -> &ModuleResolver {
        &self.resolver
    }

    /// Shared handle to the index state, for callers that batch reads.
    pub fn state(&self) -> Arc<RwLock<IndexState>> {
        self.state.clone()
    }

    /// Canonical identifier for a path, absolute or root-relative.
    pub fn file_path(&self, path: impl AsRef<Path>) -> IndexResult<FilePath> {
        let path = path.as_ref();
        if path.is_absolute() {
            FilePath::from_absolute(&self.root, path)
        } else {
            FilePath::new(&path.to_string_lossy())
        }
    }

    /// Discover, restore or parse every file, then build the import graph.
    pub async fn cold_start(&self) -> IndexResult<ColdStartStats> {
        let started = Instant::now();

        let walker = FileWalker::new(self.settings.clone());
        let root = self.root.clone();
        let paths = tokio::task::spawn_blocking(move || walker.walk(&root)).await?;
        let files: Vec<FilePath> = paths
            .iter()
            .filter_map(|path| match FilePath::from_absolute(&self.root, path) {
                Ok(file) => Some(file),
                Err(e) => {
                    tracing::warn!("[indexer] skipping {}: {e}", path.display());
                    None
                }
            })
            .collect();

        let Restored {
            mut records,
            reverse_imports: saved_reverse,
        } = self.load_snapshot().await;
        let items: Vec<(FilePath, Option<FileRecord>)> = files
            .iter()
            .map(|file| (file.clone(), records.remove(file)))
            .collect();

        let mut stats = ColdStartStats {
            discovered: files.len(),
            removed: records.len(),
            ..ColdStartStats::default()
        };

        let mut updates = Vec::with_capacity(items.len());
        let mut failures = Vec::new();
        for outcome in self.load_all(items).await {
            match outcome {
                LoadOutcome::Ready(update) => {
                    if update.restored {
                        stats.restored += 1;
                    } else {
                        stats.parsed += 1;
                    }
                    updates.push(update);
                }
                LoadOutcome::Missing(_) => stats.removed += 1,
                LoadOutcome::Failed { file, message } => {
                    stats.failed += 1;
                    failures.push((file, message));
                }
            }
        }

        let pending: Vec<(FilePath, Vec<String>)> = updates
            .iter()
            .map(|update| (update.file.clone(), specifiers(&update.parsed.imports)))
            .collect();
        let resolutions = self.resolve_all(pending).await?;

        {
            let mut state = self.state.write();
            state.clear();
            for update in updates {
                state.apply(update, None);
            }
            for (file, message) in failures {
                state.stale.insert(file, message);
            }
            state.deps.build(&resolutions);

            if let Some(saved) = &saved_reverse {
                let relinked = relinked_targets(saved, &state.deps.reverse_imports());
                stats.relinked = relinked.len();
                if !relinked.is_empty() {
                    crate::debug_event!(
                        "indexer",
                        "importers changed",
                        "{} files since the last snapshot: {:?}",
                        relinked.len(),
                        relinked
                    );
                }
            }
        }

        if self.settings.indexing.persist {
            if let Err(e) = self.save_snapshot().await {
                tracing::warn!("[indexer] failed to save snapshot: {e}");
            }
        }

        stats.elapsed_ms = started.elapsed().as_millis() as u64;
        crate::log_event!(
            "indexer",
            "cold start",
            "{} files ({} restored, {} parsed, {} failed) in {}ms",
            stats.discovered,
            stats.restored,
            stats.parsed,
            stats.failed,
            stats.elapsed_ms
        );
        Ok(stats)
    }

    /// Bounded fan-out over files; results come back in path order.
    async fn load_all(&self, items: Vec<(FilePath, Option<FileRecord>)>) -> Vec<LoadOutcome> {
        let semaphore = Arc::new(Semaphore::new(self.settings.indexing.concurrency.max(1)));
        let mut tasks = JoinSet::new();

        for (file, record) in items {
            let loader = self.loader.clone();
            let semaphore = semaphore.clone();
            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok();
                loader.load(file, record).await
            });
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => tracing::error!("[indexer] file task failed: {e}"),
            }
        }
        outcomes.sort_by(|a, b| a.file().cmp(b.file()));
        outcomes
    }

    async fn load_snapshot(&self) -> Restored {
        if !self.settings.indexing.persist {
            return Restored::default();
        }
        match self.persistence.load(&self.root).await {
            Ok(snapshot) => {
                crate::debug_event!(
                    "indexer",
                    "snapshot loaded",
                    "{} files",
                    snapshot.file_count()
                );
                Restored {
                    records: snapshot.files.into_iter().collect(),
                    reverse_imports: Some(snapshot.reverse_imports),
                }
            }
            Err(StorageError::NotFound(_)) => Restored::default(),
            Err(e) if e.requires_rebuild() => {
                crate::log_event!("indexer", "full rebuild", "{e}");
                Restored::default()
            }
            Err(e) => {
                tracing::warn!("[indexer] cannot load snapshot, rebuilding: {e}");
                Restored::default()
            }
        }
    }

    async fn resolve_all(&self, items: Vec<(FilePath, Vec<String>)>) -> IndexResult<Resolutions> {
        let resolver = self.resolver.clone();
        Ok(tokio::task::spawn_blocking(move || Resolutions::compute(&resolver, items)).await?)
    }

    fn file_lock(&self, file: &FilePath) -> Arc<Mutex<()>> {
        self.file_locks.entry(file.clone()).or_default().clone()
    }

    /// Re-read, re-parse and re-resolve one file, then swap its data in.
    ///
    /// Updates of the same file run one at a time, so the data applied last
    /// always comes from the most recent read.
    pub async fn update_file(&self, file: &FilePath) -> IndexResult<UpdateOutcome> {
        let lock = self.file_lock(file);
        let _serial = lock.lock().await;

        let update = match self.loader.load(file.clone(), None).await {
            LoadOutcome::Ready(update) => update,
            LoadOutcome::Missing(file) => {
                self.remove_file(&file);
                self.after_config_change(&file).await?;
                return Ok(UpdateOutcome::Removed);
            }
            LoadOutcome::Failed { file, message } => {
                self.state.write().stale.insert(file, message);
                return Ok(UpdateOutcome::Stale);
            }
        };
        let outcome = if update.stale.is_some() {
            UpdateOutcome::Stale
        } else {
            UpdateOutcome::Indexed
        };

        // A new file may satisfy imports that were dangling until now
        let waiting: Vec<(FilePath, Vec<String>)> = {
            let state = self.state.read();
            if state.files.contains_key(file) {
                Vec::new()
            } else {
                let importers = state.deps.importers_with_unresolved();
                state.import_specifiers(importers.iter().filter(|f| *f != file))
            }
        };

        let mut items = vec![(file.clone(), specifiers(&update.parsed.imports))];
        items.extend(waiting.iter().cloned());
        let resolutions = self.resolve_all(items).await?;

        {
            let mut state = self.state.write();
            state.apply(update, Some(&resolutions));
            for (importer, _) in &waiting {
                state.deps.rebuild_file(importer, &resolutions);
            }
        }

        crate::debug_event!(
            "indexer",
            "reindexed",
            "{file} ({} waiting importers)",
            waiting.len()
        );
        self.after_config_change(file).await?;
        Ok(outcome)
    }

    /// Alias rules changed: drop cached tables and re-resolve everything.
    async fn after_config_change(&self, file: &FilePath) -> IndexResult<()> {
        if !self.resolver.is_config_file(file) {
            return Ok(());
        }
        crate::log_event!("indexer", "config changed", "{file}");
        self.resolver.reload_config();
        self.rebuild_graph().await
    }

    /// Re-resolve every file's imports against the current config.
    pub async fn rebuild_graph(&self) -> IndexResult<()> {
        let items = {
            let state = self.state.read();
            state.import_specifiers(state.files.keys())
        };
        let resolutions = self.resolve_all(items).await?;
        self.state.write().deps.build(&resolutions);
        Ok(())
    }

    /// Drop a file's import edges; its data stays until the next update.
    pub fn invalidate_file(&self, file: &FilePath) -> bool {
        self.state.write().deps.invalidate_file(file)
    }

    /// Invalidate every file under `dir` (root-relative).
    pub fn invalidate_directory(&self, dir: &str) -> Vec<FilePath> {
        self.state.write().deps.invalidate_directory(dir)
    }

    /// Re-resolve files invalidated since their last update.
    pub async fn rebuild_pending(&self) -> IndexResult<usize> {
        let items = {
            let state = self.state.read();
            state.import_specifiers(state.deps.pending_files())
        };
        let resolutions = self.resolve_all(items).await?;
        Ok(self.state.write().deps.rebuild_pending(&resolutions))
    }

    /// Forget a file. Importers keep their edges as unresolved diagnostics.
    pub fn remove_file(&self, file: &FilePath) -> bool {
        let mut state = self.state.write();
        let known = state.files.contains_key(file) || state.stale.contains_key(file);
        if known {
            let importers = state.remove(file);
            crate::debug_event!(
                "indexer",
                "removed",
                "{file} ({} importers now unresolved)",
                importers.len()
            );
        }
        known
    }

    /// Forget every file under `dir` (root-relative).
    pub fn remove_directory(&self, dir: &str) -> Vec<FilePath> {
        let mut state = self.state.write();
        let mut doomed: Vec<FilePath> = state
            .files
            .keys()
            .chain(state.stale.keys())
            .filter(|file| file.is_within(dir))
            .cloned()
            .collect();
        doomed.sort();
        doomed.dedup();

        for file in &doomed {
            state.remove(file);
        }
        if !doomed.is_empty() {
            crate::debug_event!("indexer", "removed directory", "{dir}: {} files", doomed.len());
        }
        doomed
    }

    /// Re-index files that previously failed. Returns how many recovered.
    pub async fn retry_stale(&self) -> IndexResult<usize> {
        let stale: Vec<FilePath> = self.state.read().stale.keys().cloned().collect();
        let mut recovered = 0;
        for file in &stale {
            if self.update_file(file).await? == UpdateOutcome::Indexed {
                recovered += 1;
            }
        }
        if !stale.is_empty() {
            crate::log_event!("indexer", "retried stale", "{recovered}/{} recovered", stale.len());
        }
        Ok(recovered)
    }

    /// Apply a watcher event. Returns the number of files touched.
    pub async fn handle_event(&self, event: FileEvent) -> IndexResult<usize> {
        match event {
            FileEvent::Changed(path) => {
                if !self.walker.is_indexable(&self.root, &path) {
                    return Ok(0);
                }
                let file = FilePath::from_absolute(&self.root, &path)?;
                if let Ok(meta) = tokio::fs::metadata(&path).await {
                    if meta.is_dir() {
                        return Ok(0);
                    }
                    if !self.walker.within_size_cap(meta.len()) {
                        tracing::debug!("[indexer] skipping oversized {}", path.display());
                        // Grew past the cap: drop it as a fresh walk would
                        let lock = self.file_lock(&file);
                        let _serial = lock.lock().await;
                        return Ok(usize::from(self.remove_file(&file)));
                    }
                }
                self.update_file(&file).await?;
                Ok(1)
            }
            FileEvent::Removed(path) => {
                let file = FilePath::from_absolute(&self.root, &path)?;
                let lock = self.file_lock(&file);
                let _serial = lock.lock().await;
                if self.remove_file(&file) {
                    self.after_config_change(&file).await?;
                    return Ok(1);
                }
                Ok(self.remove_directory(file.as_str()).len())
            }
        }
    }

    /// Serializable copy of the current state. Stale files are left out so
    /// the next cold start parses them again.
    pub fn snapshot(&self) -> IndexSnapshot {
        let state = self.state.read();
        let mut snapshot = IndexSnapshot::new(self.root.clone());

        for (file, entry) in &state.files {
            if state.stale.contains_key(file) {
                continue;
            }
            snapshot.files.insert(
                file.clone(),
                FileRecord {
                    mtime_ms: entry.info.mtime_ms,
                    size: entry.info.size,
                    hash: entry.info.hash.clone(),
                    symbols: state.symbols.symbols_in_file(file).to_vec(),
                    imports: state.deps.imports_of(file).to_vec(),
                    exports: entry.exports.clone(),
                    call_sites: state.calls.sites_in_file(file).to_vec(),
                    trigram_count: state.trigrams.trigram_count(file),
                    parse_error: entry.parse_error.clone(),
                },
            );
        }
        snapshot.reverse_imports = state.deps.reverse_imports();
        snapshot
    }

    pub async fn save_snapshot(&self) -> IndexResult<()> {
        self.persistence.save_with(|| self.snapshot()).await?;
        Ok(())
    }

    /// Delete the saved snapshot so the next cold start parses everything.
    pub async fn clear_snapshot(&self) -> IndexResult<()> {
        self.persistence.clear().await?;
        Ok(())
    }

    /// Ranked hybrid search over the indexed files.
    pub async fn search<S: AsRef<str>>(
        &self,
        keywords: &[S],
        options: &SearchOptions,
    ) -> IndexResult<SearchResponse> {
        let keywords = normalize_keywords(keywords)?;
        let config = &self.settings.search;

        let candidates: Vec<(FilePath, Vec<Symbol>)> = {
            let state = self.state.read();
            collect_candidates(
                &state.symbols,
                &state.trigrams,
                state.files.keys(),
                &keywords,
                config,
            )
            .into_iter()
            .map(|candidate| {
                let symbols = state.symbols.symbols_in_file(&candidate.file).to_vec();
                (candidate.file, symbols)
            })
            .collect()
        };

        let candidate_count = candidates.len();
        let budget = ReadBudget::new(options, config);
        let (docs, degraded) = read_documents(&self.root, candidates, budget).await;
        let response = rank_documents(&docs, &keywords, options, config, candidate_count, degraded);

        crate::debug_event!(
            "search",
            "query",
            "{:?}: {} candidates, {} results{}",
            keywords,
            candidate_count,
            response.results.len(),
            if response.degraded { " (degraded)" } else { "" }
        );
        Ok(response)
    }

    pub fn dependencies(&self, file: &FilePath, direction: Direction) -> Vec<FilePath> {
        self.state.read().deps.dependencies(file, direction)
    }

    pub fn transitive_dependencies(
        &self,
        file: &FilePath,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> TransitiveResult {
        self.state
            .read()
            .deps
            .transitive_dependencies(file, direction, max_depth)
    }

    pub fn analyze_symbol(
        &self,
        name: &str,
        file: &FilePath,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> IndexResult<CallAnalysis> {
        let state = self.state.read();
        state
            .calls
            .analyze_symbol(&state.symbols, &state.deps, name, file, direction, max_depth)
    }

    pub fn index_status(&self) -> IndexStatus {
        let state = self.state.read();
        let mut status = state.deps.index_status();
        status.total_files = state.files.len();
        status.indexed_files = state
            .files
            .keys()
            .filter(|file| !state.stale.contains_key(*file))
            .count();
        status.symbol_count = state.symbols.symbol_count();
        status.stale_files = state.stale.keys().cloned().collect();
        status.parse_errors = state
            .files
            .iter()
            .filter_map(|(file, entry)| {
                entry.parse_error.as_ref().map(|message| FileError {
                    file: file.clone(),
                    message: message.clone(),
                })
            })
            .collect();
        status
    }

    pub fn unresolved_imports(&self) -> Vec<UnresolvedImport> {
        self.state.read().deps.unresolved_imports()
    }

    pub fn symbols_in_file(&self, file: &FilePath) -> Vec<Symbol> {
        self.state.read().symbols.symbols_in_file(file).to_vec()
    }

    /// Exact-name lookup across all files.
    pub fn find_symbol(&self, name: &str) -> Vec<SymbolEntry> {
        self.state
            .read()
            .symbols
            .find_by_name(name)
            .iter()
            .map(|found| found.to_entry())
            .collect()
    }

    pub fn file_count(&self) -> usize {
        self.state.read().files.len()
    }

    pub fn contains_file(&self, file: &FilePath) -> bool {
        self.state.read().files.contains_key(file)
    }
}
