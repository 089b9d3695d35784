//! End-to-end tests for dependency and call graph queries.

use reposcope::{Direction, FilePath, IncrementalIndexer, Settings, TypeScriptAdapter};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

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

fn indexer_with(root: &Path, concurrency: usize) -> IncrementalIndexer {
    let mut settings = Settings::default();
    settings.indexing.concurrency = concurrency;
    settings.indexing.persist = false;
    IncrementalIndexer::new(root, Arc::new(settings), Arc::new(TypeScriptAdapter::new())).unwrap()
}

/// a -> b -> c -> a, plus d -> a
fn cyclic_repo() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "src/a.ts", "import { b } from './b';\nexport function a() { return b(); }\n");
    write(root, "src/b.ts", "import { c } from './c';\nexport function b() { return c(); }\n");
    write(root, "src/c.ts", "import { a } from './a';\nexport function c() { return a(); }\n");
    write(root, "src/d.ts", "import { a } from './a';\nexport const d = a();\n");
    temp_dir
}

#[tokio::test]
async fn test_cycle_safe_transitive_queries() {
    let temp_dir = cyclic_repo();
    let indexer = indexer_with(temp_dir.path(), 2);
    indexer.cold_start().await.unwrap();

    let outgoing = indexer.transitive_dependencies(&fp("src/a.ts"), Direction::Outgoing, None);
    assert_eq!(outgoing.files, vec![fp("src/b.ts"), fp("src/c.ts")]);
    assert!(!outgoing.truncated);

    let incoming = indexer.transitive_dependencies(&fp("src/a.ts"), Direction::Incoming, None);
    assert_eq!(incoming.files.len(), 3);
    assert!(incoming.files.contains(&fp("src/d.ts")));
    assert!(!incoming.files.contains(&fp("src/a.ts")));
}

#[tokio::test]
async fn test_depth_limit_truncates() {
    let temp_dir = cyclic_repo();
    let indexer = indexer_with(temp_dir.path(), 2);
    indexer.cold_start().await.unwrap();

    let one_hop = indexer.transitive_dependencies(&fp("src/a.ts"), Direction::Outgoing, Some(1));
    assert_eq!(one_hop.files, vec![fp("src/b.ts")]);
    assert!(one_hop.truncated);

    let zero = indexer.transitive_dependencies(&fp("src/a.ts"), Direction::Outgoing, Some(0));
    assert!(zero.files.is_empty());
    assert!(zero.truncated);
}

#[tokio::test]
async fn test_rebuild_is_idempotent() {
    let temp_dir = cyclic_repo();
    let indexer = indexer_with(temp_dir.path(), 2);
    indexer.cold_start().await.unwrap();

    let files = ["src/a.ts", "src/b.ts", "src/c.ts", "src/d.ts"];
    let before: Vec<_> = files
        .iter()
        .map(|f| indexer.dependencies(&fp(f), Direction::Outgoing))
        .collect();

    indexer.rebuild_graph().await.unwrap();
    indexer.rebuild_graph().await.unwrap();

    let after: Vec<_> = files
        .iter()
        .map(|f| indexer.dependencies(&fp(f), Direction::Outgoing))
        .collect();
    assert_eq!(before, after);
    assert_eq!(indexer.index_status().unresolved_imports, 0);
}

#[tokio::test]
async fn test_invalidate_then_rebuild_restores_edges() {
    let temp_dir = cyclic_repo();
    let indexer = indexer_with(temp_dir.path(), 2);
    indexer.cold_start().await.unwrap();

    let original = indexer.dependencies(&fp("src/b.ts"), Direction::Outgoing);
    assert!(indexer.invalidate_file(&fp("src/b.ts")));
    assert_eq!(indexer.index_status().pending_rebuild, 1);
    assert!(!indexer.index_status().is_healthy());

    let rebuilt = indexer.rebuild_pending().await.unwrap();
    assert_eq!(rebuilt, 1);
    assert_eq!(indexer.dependencies(&fp("src/b.ts"), Direction::Outgoing), original);
    assert_eq!(indexer.index_status().pending_rebuild, 0);

    let invalidated = indexer.invalidate_directory("src");
    assert_eq!(invalidated.len(), 4);
    indexer.rebuild_pending().await.unwrap();
    assert_eq!(
        indexer.dependencies(&fp("src/a.ts"), Direction::Incoming),
        vec![fp("src/c.ts"), fp("src/d.ts")]
    );
}

#[tokio::test]
async fn test_removed_file_leaves_unresolved_importers() {
    let temp_dir = cyclic_repo();
    let indexer = indexer_with(temp_dir.path(), 2);
    indexer.cold_start().await.unwrap();

    fs::remove_file(indexer.root().join("src/c.ts")).unwrap();
    assert!(indexer.remove_file(&fp("src/c.ts")));

    let status = indexer.index_status();
    assert_eq!(status.unresolved_imports, 1);
    assert_eq!(status.resolution_errors[0].file, fp("src/b.ts"));
    assert!(indexer.dependencies(&fp("src/b.ts"), Direction::Outgoing).is_empty());
}

#[tokio::test]
async fn test_path_alias_resolution() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(
        root,
        "tsconfig.json",
        r#"{
            // aliases for shared code
            "compilerOptions": {
                "baseUrl": ".",
                "paths": { "@utils/*": ["utils/*"] },
            },
        }"#,
    );
    write(root, "utils/strings.ts", "export function slugify(s: string) { return s; }\n");
    write(
        root,
        "app/page.ts",
        "import { slugify } from '@utils/strings';\nexport function render() { return slugify('x'); }\n",
    );

    let indexer = indexer_with(root, 2);
    indexer.cold_start().await.unwrap();

    assert_eq!(
        indexer.dependencies(&fp("app/page.ts"), Direction::Outgoing),
        vec![fp("utils/strings.ts")]
    );
    assert_eq!(indexer.index_status().unresolved_imports, 0);

    let resolver = indexer.resolver();
    assert_eq!(
        resolver.resolve(&fp("app/page.ts"), "@utils/strings"),
        Some(fp("utils/strings.ts"))
    );
    assert_eq!(resolver.resolve(&fp("app/page.ts"), "@utils/missing"), None);
}

#[tokio::test]
async fn test_call_analysis_across_files() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    write(root, "lib/db.ts", "export function query() { return 1; }\n");
    write(
        root,
        "lib/repo.ts",
        "import { query } from './db';\nexport function findUser() { return query(); }\n",
    );
    write(
        root,
        "api/handler.ts",
        "import { findUser } from '../lib/repo';\nexport function handle() { return findUser(); }\n",
    );

    let indexer = indexer_with(root, 2);
    indexer.cold_start().await.unwrap();

    let down = indexer
        .analyze_symbol("handle", &fp("api/handler.ts"), Direction::Outgoing, None)
        .unwrap();
    let names: Vec<&str> = down.visited_nodes.iter().map(|n| n.id.name.as_str()).collect();
    assert_eq!(names, vec!["findUser", "query"]);
    assert_eq!(down.edges.len(), 2);
    assert!(!down.truncated);

    let up = indexer
        .analyze_symbol("query", &fp("lib/db.ts"), Direction::Incoming, Some(1))
        .unwrap();
    assert_eq!(up.visited_nodes.len(), 1);
    assert_eq!(up.visited_nodes[0].id.file, fp("lib/repo.ts"));
    assert!(up.truncated);

    let err = indexer
        .analyze_symbol("missing", &fp("lib/db.ts"), Direction::Outgoing, None)
        .unwrap_err();
    assert!(err.is_invalid_argument());
}

#[tokio::test]
async fn test_overloaded_function_calls_are_traced() {
    let temp_dir = TempDir::new().unwrap();
    write(
        temp_dir.path(),
        "a.ts",
        "export function fmt(x: string): string;\n\
         export function fmt(x: number): string;\n\
         export function fmt(x: any) { return helper(x); }\n\
         function helper(x: any) { return String(x); }\n",
    );

    let indexer = indexer_with(temp_dir.path(), 1);
    indexer.cold_start().await.unwrap();

    let down = indexer
        .analyze_symbol("fmt", &fp("a.ts"), Direction::Outgoing, None)
        .unwrap();
    let callees: Vec<&str> = down.visited_nodes.iter().map(|n| n.id.name.as_str()).collect();
    assert_eq!(callees, vec!["helper"]);

    let up = indexer
        .analyze_symbol("helper", &fp("a.ts"), Direction::Incoming, None)
        .unwrap();
    let callers: Vec<&str> = up.visited_nodes.iter().map(|n| n.id.name.as_str()).collect();
    assert_eq!(callers, vec!["fmt"]);
    assert_eq!(indexer.find_symbol("fmt").len(), 1);
}

#[tokio::test]
async fn test_concurrency_does_not_change_results() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();
    for i in 0..24 {
        let next = (i + 1) % 24;
        write(
            root,
            &format!("mod{i}/index.ts"),
            &format!(
                "import {{ f{next} }} from '../mod{next}';\nexport function f{i}() {{ return f{next}(); }}\n"
            ),
        );
    }

    let serial = indexer_with(root, 1);
    serial.cold_start().await.unwrap();
    let parallel = indexer_with(root, 8);
    parallel.cold_start().await.unwrap();

    assert_eq!(serial.file_count(), 24);
    assert_eq!(serial.file_count(), parallel.file_count());
    for i in 0..24 {
        let file = fp(&format!("mod{i}/index.ts"));
        assert_eq!(
            serial.transitive_dependencies(&file, Direction::Outgoing, None),
            parallel.transitive_dependencies(&file, Direction::Outgoing, None)
        );
        assert_eq!(serial.symbols_in_file(&file), parallel.symbols_in_file(&file));
    }
    let (a, b) = (serial.index_status(), parallel.index_status());
    assert_eq!(a.symbol_count, b.symbol_count);
    assert_eq!(a.resolution_errors, b.resolution_errors);
    assert_eq!(a.parse_errors, b.parse_errors);
}
