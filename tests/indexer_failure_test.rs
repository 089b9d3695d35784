//! Indexer behavior when parsing is slow or fails, and when the saved
//! snapshot cannot be trusted.

use reposcope::parsing::ParseResult;
use reposcope::{
    Direction, FilePath, IncrementalIndexer, LanguageAdapter, ParseError, ParsedFile, Settings,
    TypeScriptAdapter, UpdateOutcome,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

/// Delegates to the TypeScript adapter, except that sources containing
/// `@slow` sleep for `delay_ms` first and sources containing `@broken` fail.
struct ScriptedAdapter {
    inner: TypeScriptAdapter,
    delay_ms: AtomicU64,
    parses: AtomicUsize,
}

impl ScriptedAdapter {
    fn new(delay_ms: u64) -> Arc<Self> {
        Arc::new(Self {
            inner: TypeScriptAdapter::new(),
            delay_ms: AtomicU64::new(delay_ms),
            parses: AtomicUsize::new(0),
        })
    }

    fn parses(&self) -> usize {
        self.parses.load(Ordering::SeqCst)
    }
}

impl LanguageAdapter for ScriptedAdapter {
    fn name(&self) -> &str {
        "scripted"
    }

    fn supports(&self, path: &FilePath) -> bool {
        self.inner.supports(path)
    }

    fn parse(&self, path: &FilePath, source: &str) -> ParseResult<ParsedFile> {
        self.parses.fetch_add(1, Ordering::SeqCst);
        if source.contains("@slow") {
            std::thread::sleep(Duration::from_millis(self.delay_ms.load(Ordering::SeqCst)));
        }
        if source.contains("@broken") {
            return Err(ParseError::Grammar {
                reason: "scripted failure".to_string(),
            });
        }
        self.inner.parse(path, source)
    }
}

fn write(root: &Path, rel: &str, content: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn fp(path: &str) -> FilePath {
    FilePath::new(path).unwrap()
}

fn settings(parse_timeout_ms: u64, index_path: Option<PathBuf>) -> Arc<Settings> {
    let mut settings = Settings::default();
    settings.indexing.concurrency = 2;
    settings.indexing.parse_timeout_ms = parse_timeout_ms;
    match index_path {
        Some(path) => settings.index_path = path,
        None => settings.indexing.persist = false,
    }
    Arc::new(settings)
}

#[tokio::test]
async fn test_slow_and_broken_files_do_not_abort_cold_start() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "a.ts", "// @slow\nexport function slowFn() {}\n");
    write(root, "b.ts", "export function fine() {}\n");
    write(root, "c.ts", "// @broken\nexport function never() {}\n");

    let adapter = ScriptedAdapter::new(400);
    let indexer = IncrementalIndexer::new(root, settings(100, None), adapter.clone()).unwrap();
    let stats = indexer.cold_start().await.unwrap();
    assert_eq!(stats.discovered, 3);
    assert_eq!(stats.failed, 0);

    let status = indexer.index_status();
    assert_eq!(status.stale_files, vec![fp("a.ts")]);
    assert_eq!(status.total_files, 3);
    assert_eq!(status.indexed_files, 2);
    assert_eq!(indexer.find_symbol("fine").len(), 1);
    assert!(indexer.find_symbol("slowFn").is_empty());

    let broken = status
        .parse_errors
        .iter()
        .find(|error| error.file == fp("c.ts"))
        .unwrap();
    assert!(broken.message.contains("scripted failure"));
    assert!(indexer.find_symbol("never").is_empty());

    // Parses are fast again: the stale file recovers, the broken one stays broken
    adapter.delay_ms.store(0, Ordering::SeqCst);
    assert_eq!(indexer.retry_stale().await.unwrap(), 1);

    let status = indexer.index_status();
    assert!(status.stale_files.is_empty());
    assert_eq!(status.indexed_files, 3);
    assert_eq!(indexer.find_symbol("slowFn").len(), 1);
    let failing: Vec<&FilePath> = status.parse_errors.iter().map(|error| &error.file).collect();
    assert_eq!(failing, vec![&fp("c.ts")]);
}

#[tokio::test]
async fn test_timed_out_update_reports_stale() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "a.ts", "export function before() {}\n");

    let adapter = ScriptedAdapter::new(400);
    let indexer = IncrementalIndexer::new(root, settings(100, None), adapter).unwrap();
    indexer.cold_start().await.unwrap();

    write(root, "a.ts", "// @slow\nexport function after() {}\n");
    let outcome = indexer.update_file(&fp("a.ts")).await.unwrap();
    assert_eq!(outcome, UpdateOutcome::Stale);
    assert_eq!(indexer.index_status().stale_files, vec![fp("a.ts")]);
    assert!(indexer.find_symbol("after").is_empty());
}

#[tokio::test]
async fn test_same_file_updates_apply_in_read_order() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "a.ts", "// @slow\nexport function first() {}\n");

    let adapter = ScriptedAdapter::new(0);
    let indexer = IncrementalIndexer::new(root, settings(5_000, None), adapter.clone()).unwrap();
    indexer.cold_start().await.unwrap();
    adapter.delay_ms.store(300, Ordering::SeqCst);

    let file = fp("a.ts");
    let path = indexer.root().join("a.ts");
    // The first update reads the slow content; the file changes mid-parse
    let slow = indexer.update_file(&file);
    let fast = async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        fs::write(&path, "export function second() {}\n").unwrap();
        indexer.update_file(&file).await
    };
    let (slow, fast) = tokio::join!(slow, fast);
    assert_eq!(slow.unwrap(), UpdateOutcome::Indexed);
    assert_eq!(fast.unwrap(), UpdateOutcome::Indexed);

    assert!(indexer.find_symbol("first").is_empty());
    assert_eq!(indexer.find_symbol("second").len(), 1);
}

fn persisted_repo() -> (TempDir, TempDir) {
    let repo = TempDir::new().unwrap();
    write(repo.path(), "src/a.ts", "import { b } from './b';\nexport const a = b;\n");
    write(repo.path(), "src/b.ts", "export const b = 1;\n");
    (repo, TempDir::new().unwrap())
}

#[tokio::test]
async fn test_corrupt_snapshot_falls_back_to_full_rebuild() {
    let (repo, index_dir) = persisted_repo();
    let settings = settings(5_000, Some(index_dir.path().to_path_buf()));

    let adapter = ScriptedAdapter::new(0);
    IncrementalIndexer::new(repo.path(), settings.clone(), adapter.clone())
        .unwrap()
        .cold_start()
        .await
        .unwrap();
    assert_eq!(adapter.parses(), 2);

    fs::write(index_dir.path().join("snapshot.json"), b"{ \"version\": 1, \"files\": [").unwrap();

    let indexer = IncrementalIndexer::new(repo.path(), settings.clone(), adapter.clone()).unwrap();
    let stats = indexer.cold_start().await.unwrap();
    assert_eq!(stats.restored, 0);
    assert_eq!(stats.parsed, 2);
    assert_eq!(adapter.parses(), 4);
    assert_eq!(
        indexer.dependencies(&fp("src/b.ts"), Direction::Incoming),
        vec![fp("src/a.ts")]
    );

    // The rebuild wrote a usable snapshot again
    let stats = IncrementalIndexer::new(repo.path(), settings, adapter.clone())
        .unwrap()
        .cold_start()
        .await
        .unwrap();
    assert_eq!(stats.restored, 2);
    assert_eq!(adapter.parses(), 4);
}

#[tokio::test]
async fn test_snapshot_version_mismatch_falls_back_to_full_rebuild() {
    let (repo, index_dir) = persisted_repo();
    let settings = settings(5_000, Some(index_dir.path().to_path_buf()));

    let adapter = ScriptedAdapter::new(0);
    IncrementalIndexer::new(repo.path(), settings.clone(), adapter.clone())
        .unwrap()
        .cold_start()
        .await
        .unwrap();

    let snapshot_path = index_dir.path().join("snapshot.json");
    let mut document: serde_json::Value =
        serde_json::from_slice(&fs::read(&snapshot_path).unwrap()).unwrap();
    document["version"] = serde_json::json!(999);
    fs::write(&snapshot_path, serde_json::to_vec(&document).unwrap()).unwrap();

    let indexer = IncrementalIndexer::new(repo.path(), settings, adapter.clone()).unwrap();
    let stats = indexer.cold_start().await.unwrap();
    assert_eq!(stats.restored, 0);
    assert_eq!(stats.parsed, 2);
    assert_eq!(adapter.parses(), 4);
    assert_eq!(
        indexer.dependencies(&fp("src/a.ts"), Direction::Outgoing),
        vec![fp("src/b.ts")]
    );
}
