//! File-level import graph.
//!
//! Each file owns its outgoing edges. Raw import records are kept separately
//! from the resolved edges, so invalidation can drop edges cheaply and a
//! later rebuild re-resolves from what the parser reported.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

use crate::indexing::status::{IndexStatus, UnresolvedImport};
use crate::parsing::{ImportKind, ImportSpec};
use crate::resolver::ModuleResolver;
use crate::types::{Direction, FilePath};
use crate::utils::get_utc_timestamp;

/// Anything that can turn `(context, specifier)` into a repository file.
pub trait SpecifierResolver {
    fn resolve_specifier(&self, context: &FilePath, specifier: &str) -> Option<FilePath>;
}

impl SpecifierResolver for ModuleResolver {
    fn resolve_specifier(&self, context: &FilePath, specifier: &str) -> Option<FilePath> {
        self.resolve(context, specifier)
    }
}

impl<F> SpecifierResolver for F
where
    F: Fn(&FilePath, &str) -> Option<FilePath>,
{
    fn resolve_specifier(&self, context: &FilePath, specifier: &str) -> Option<FilePath> {
        self(context, specifier)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "status", content = "file", rename_all = "snake_case")]
pub enum ImportTarget {
    Resolved(FilePath),
    Unresolved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportEdge {
    pub from: FilePath,
    pub target: ImportTarget,
    pub specifier: String,
    pub kind: ImportKind,
    pub line: u32,
}

impl ImportEdge {
    pub fn resolved(&self) -> Option<&FilePath> {
        match &self.target {
            ImportTarget::Resolved(file) => Some(file),
            ImportTarget::Unresolved => None,
        }
    }
}

/// Outcome of a transitive query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TransitiveResult {
    /// Reachable files in breadth-first order, start node excluded
    pub files: Vec<FilePath>,
    pub truncated: bool,
}

#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Raw imports as reported by the adapter
    imports: BTreeMap<FilePath, Vec<ImportSpec>>,
    /// Resolved outgoing edges per file
    edges: BTreeMap<FilePath, Vec<ImportEdge>>,
    /// target -> importing files
    reverse: BTreeMap<FilePath, BTreeSet<FilePath>>,
    /// Files whose edges were dropped and await `update`/`build`
    invalidated: BTreeSet<FilePath>,
    last_rebuilt_at: Option<u64>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a file's imports without resolving them (resolved on `build`).
    pub fn set_imports(&mut self, file: &FilePath, imports: Vec<ImportSpec>) {
        self.drop_edges(file);
        self.imports.insert(file.clone(), imports);
        self.invalidated.insert(file.clone());
    }

    /// Re-resolve every file's imports from scratch.
    pub fn build(&mut self, resolver: &dyn SpecifierResolver) {
        self.edges.clear();
        self.reverse.clear();

        let files: Vec<FilePath> = self.imports.keys().cloned().collect();
        for file in &files {
            self.resolve_file(file, resolver);
        }

        self.invalidated.clear();
        self.last_rebuilt_at = Some(get_utc_timestamp());
        crate::debug_event!(
            "graph",
            "built",
            "{} files, {} edges",
            self.imports.len(),
            self.edge_count()
        );
    }

    /// Replace a file's imports and atomically swap its outgoing edges.
    pub fn update_file_dependencies(
        &mut self,
        file: &FilePath,
        imports: Vec<ImportSpec>,
        resolver: &dyn SpecifierResolver,
    ) {
        self.imports.insert(file.clone(), imports);
        self.rebuild_file(file, resolver);
    }

    /// Re-resolve a file from its retained imports.
    pub fn rebuild_file(&mut self, file: &FilePath, resolver: &dyn SpecifierResolver) {
        self.drop_edges(file);
        self.resolve_file(file, resolver);
        self.invalidated.remove(file);
    }

    /// Files invalidated since their last resolution.
    pub fn pending_files(&self) -> impl Iterator<Item = &FilePath> {
        self.invalidated.iter()
    }

    /// Re-resolve every invalidated file.
    pub fn rebuild_pending(&mut self, resolver: &dyn SpecifierResolver) -> usize {
        let pending: Vec<FilePath> = self.invalidated.iter().cloned().collect();
        for file in &pending {
            self.rebuild_file(file, resolver);
        }
        pending.len()
    }

    fn resolve_file(&mut self, file: &FilePath, resolver: &dyn SpecifierResolver) {
        let Some(imports) = self.imports.get(file) else {
            return;
        };

        let edges: Vec<ImportEdge> = imports
            .iter()
            .map(|import| {
                let target = match resolver.resolve_specifier(file, &import.specifier) {
                    Some(target) => ImportTarget::Resolved(target),
                    None => ImportTarget::Unresolved,
                };
                ImportEdge {
                    from: file.clone(),
                    target,
                    specifier: import.specifier.clone(),
                    kind: import.kind,
                    line: import.line,
                }
            })
            .collect();

        for target in edges.iter().filter_map(ImportEdge::resolved) {
            if target == file {
                continue;
            }
            self.reverse
                .entry(target.clone())
                .or_default()
                .insert(file.clone());
        }
        self.edges.insert(file.clone(), edges);
    }

    /// Remove a file's outgoing edges and their reverse entries.
    fn drop_edges(&mut self, file: &FilePath) {
        let Some(old) = self.edges.remove(file) else {
            return;
        };
        for target in old.iter().filter_map(ImportEdge::resolved) {
            if let Some(importers) = self.reverse.get_mut(target) {
                importers.remove(file);
                if importers.is_empty() {
                    self.reverse.remove(target);
                }
            }
        }
    }

    /// Direct neighbours, sorted and deduplicated.
    pub fn dependencies(&self, file: &FilePath, direction: Direction) -> Vec<FilePath> {
        self.neighbours(file, direction).into_iter().collect()
    }

    fn neighbours(&self, file: &FilePath, direction: Direction) -> BTreeSet<FilePath> {
        match direction {
            Direction::Outgoing => self
                .edges
                .get(file)
                .map(|edges| {
                    edges
                        .iter()
                        .filter_map(ImportEdge::resolved)
                        .filter(|target| *target != file)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            Direction::Incoming => self.reverse.get(file).cloned().unwrap_or_default(),
        }
    }

    /// Breadth-first reachability. Nodes beyond `max_depth` are left out and
    /// flag the result as truncated.
    pub fn transitive_dependencies(
        &self,
        file: &FilePath,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> TransitiveResult {
        let mut result = TransitiveResult::default();
        let mut visited = BTreeSet::from([file.clone()]);
        let mut queue = VecDeque::from([(file.clone(), 0usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            for next in self.neighbours(&current, direction) {
                if visited.contains(&next) {
                    continue;
                }
                if max_depth.is_some_and(|max| depth + 1 > max) {
                    result.truncated = true;
                    continue;
                }
                visited.insert(next.clone());
                result.files.push(next.clone());
                queue.push_back((next, depth + 1));
            }
        }

        result
    }

    /// Phase one of an update: drop edges, keep raw imports.
    pub fn invalidate_file(&mut self, file: &FilePath) -> bool {
        if !self.imports.contains_key(file) {
            return false;
        }
        self.drop_edges(file);
        self.invalidated.insert(file.clone());
        true
    }

    /// Invalidate every tracked file under `dir`.
    pub fn invalidate_directory(&mut self, dir: &str) -> Vec<FilePath> {
        let files: Vec<FilePath> = self
            .imports
            .keys()
            .filter(|file| file.is_within(dir))
            .cloned()
            .collect();
        for file in &files {
            self.invalidate_file(file);
        }
        files
    }

    /// Forget a file. Edges from other files into it become unresolved;
    /// those importers are returned.
    pub fn remove_file(&mut self, file: &FilePath) -> Vec<FilePath> {
        self.drop_edges(file);
        self.imports.remove(file);
        self.invalidated.remove(file);

        let importers: Vec<FilePath> = self
            .reverse
            .remove(file)
            .map(|set| set.into_iter().collect())
            .unwrap_or_default();

        for importer in &importers {
            if let Some(edges) = self.edges.get_mut(importer) {
                for edge in edges.iter_mut() {
                    if edge.resolved() == Some(file) {
                        edge.target = ImportTarget::Unresolved;
                    }
                }
            }
        }
        importers
    }

    pub fn unresolved_imports(&self) -> Vec<UnresolvedImport> {
        self.edges
            .values()
            .flatten()
            .filter(|edge| edge.target == ImportTarget::Unresolved)
            .map(|edge| UnresolvedImport {
                file: edge.from.clone(),
                specifier: edge.specifier.clone(),
                line: edge.line,
            })
            .collect()
    }

    /// Files holding at least one unresolved import.
    pub fn importers_with_unresolved(&self) -> Vec<FilePath> {
        self.edges
            .iter()
            .filter(|(_, edges)| edges.iter().any(|e| e.target == ImportTarget::Unresolved))
            .map(|(file, _)| file.clone())
            .collect()
    }

    /// target -> importers, for persistence.
    pub fn reverse_imports(&self) -> BTreeMap<FilePath, Vec<FilePath>> {
        self.reverse
            .iter()
            .map(|(target, importers)| (target.clone(), importers.iter().cloned().collect()))
            .collect()
    }

    /// Edges owned by a file.
    pub fn edges_from(&self, file: &FilePath) -> &[ImportEdge] {
        self.edges.get(file).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn imports_of(&self, file: &FilePath) -> &[ImportSpec] {
        self.imports.get(file).map(Vec::as_slice).unwrap_or_default()
    }

    /// File a specifier written in `file` currently resolves to.
    pub fn resolved_target(&self, file: &FilePath, specifier: &str) -> Option<&FilePath> {
        self.edges_from(file)
            .iter()
            .find(|edge| edge.specifier == specifier)
            .and_then(ImportEdge::resolved)
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }

    pub fn file_count(&self) -> usize {
        self.imports.len()
    }

    pub fn index_status(&self) -> IndexStatus {
        let resolution_errors = self.unresolved_imports();
        IndexStatus {
            total_files: self.imports.len(),
            indexed_files: self.edges.len(),
            unresolved_imports: resolution_errors.len(),
            resolution_errors,
            pending_rebuild: self.invalidated.len(),
            last_rebuilt_at: self.last_rebuilt_at,
            ..IndexStatus::default()
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fp(path: &str) -> FilePath {
        FilePath::new(path).unwrap()
    }

    fn import(specifier: &str) -> ImportSpec {
        ImportSpec::new(specifier, ImportKind::Named, 1)
    }

    /// `./x` in any file resolves to `x.ts` when listed.
    fn resolver(existing: &'static [&'static str]) -> impl Fn(&FilePath, &str) -> Option<FilePath> {
        move |_ctx: &FilePath, spec: &str| {
            let name = format!("{}.ts", spec.trim_start_matches("./"));
            existing.contains(&name.as_str()).then(|| fp(&name))
        }
    }

    fn graph(files: &[(&str, &[&str])]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (file, specs) in files {
            graph.set_imports(&fp(file), specs.iter().map(|s| import(s)).collect());
        }
        graph
    }

    fn set(files: &[FilePath]) -> HashSet<&str> {
        files.iter().map(FilePath::as_str).collect()
    }

    const ABC: &[&str] = &["a.ts", "b.ts", "c.ts"];

    #[test]
    fn test_build_is_idempotent() {
        let mut graph = graph(&[("a.ts", &["./b", "./missing"]), ("b.ts", &["./c"]), ("c.ts", &[])]);
        let resolve = resolver(ABC);

        graph.build(&resolve);
        let first: Vec<_> = graph.edges.values().flatten().cloned().collect();
        graph.build(&resolve);
        let second: Vec<_> = graph.edges.values().flatten().cloned().collect();

        assert_eq!(first, second);
        assert_eq!(graph.unresolved_imports().len(), 1);
    }

    #[test]
    fn test_transitive_chain() {
        let mut graph = graph(&[("a.ts", &["./b"]), ("b.ts", &["./c"]), ("c.ts", &[])]);
        graph.build(&resolver(ABC));

        let down = graph.transitive_dependencies(&fp("a.ts"), Direction::Outgoing, None);
        assert_eq!(set(&down.files), HashSet::from(["b.ts", "c.ts"]));
        assert!(!down.truncated);

        let up = graph.transitive_dependencies(&fp("c.ts"), Direction::Incoming, None);
        assert_eq!(set(&up.files), HashSet::from(["a.ts", "b.ts"]));
    }

    #[test]
    fn test_cycle_is_safe_and_excludes_start() {
        let mut graph = graph(&[("a.ts", &["./b"]), ("b.ts", &["./a"])]);
        graph.build(&resolver(ABC));

        let result = graph.transitive_dependencies(&fp("a.ts"), Direction::Outgoing, None);
        assert_eq!(result.files, vec![fp("b.ts")]);
    }

    #[test]
    fn test_depth_limit_sets_truncated() {
        let mut graph = graph(&[("a.ts", &["./b"]), ("b.ts", &["./c"]), ("c.ts", &[])]);
        graph.build(&resolver(ABC));

        let result = graph.transitive_dependencies(&fp("a.ts"), Direction::Outgoing, Some(1));
        assert_eq!(result.files, vec![fp("b.ts")]);
        assert!(result.truncated);

        let exact = graph.transitive_dependencies(&fp("a.ts"), Direction::Outgoing, Some(2));
        assert!(!exact.truncated);

        let zero = graph.transitive_dependencies(&fp("a.ts"), Direction::Outgoing, Some(0));
        assert!(zero.files.is_empty());
        assert!(zero.truncated);
    }

    #[test]
    fn test_invalidation_round_trip() {
        let mut graph = graph(&[("a.ts", &["./b", "./c"]), ("b.ts", &[]), ("c.ts", &[])]);
        let resolve = resolver(ABC);
        graph.build(&resolve);
        let before = graph.dependencies(&fp("a.ts"), Direction::Outgoing);

        assert!(graph.invalidate_file(&fp("a.ts")));
        assert!(graph.dependencies(&fp("a.ts"), Direction::Outgoing).is_empty());
        assert!(graph.dependencies(&fp("b.ts"), Direction::Incoming).is_empty());
        assert_eq!(graph.index_status().pending_rebuild, 1);

        graph.rebuild_file(&fp("a.ts"), &resolve);
        assert_eq!(graph.dependencies(&fp("a.ts"), Direction::Outgoing), before);
        assert_eq!(graph.dependencies(&fp("b.ts"), Direction::Incoming), vec![fp("a.ts")]);
    }

    #[test]
    fn test_invalidate_directory_cascades() {
        let mut graph = graph(&[
            ("src/a.ts", &["./b"]),
            ("src/sub/b.ts", &[]),
            ("srcx/c.ts", &[]),
        ]);
        graph.build(&resolver(&[]));

        let invalidated = graph.invalidate_directory("src");
        assert_eq!(invalidated, vec![fp("src/a.ts"), fp("src/sub/b.ts")]);
        assert_eq!(graph.rebuild_pending(&resolver(&[])), 2);
    }

    #[test]
    fn test_update_replaces_edges() {
        let mut graph = graph(&[("a.ts", &["./b"]), ("b.ts", &[]), ("c.ts", &[])]);
        let resolve = resolver(ABC);
        graph.build(&resolve);

        graph.update_file_dependencies(&fp("a.ts"), vec![import("./c")], &resolve);
        assert_eq!(graph.dependencies(&fp("a.ts"), Direction::Outgoing), vec![fp("c.ts")]);
        assert!(graph.dependencies(&fp("b.ts"), Direction::Incoming).is_empty());
        assert_eq!(graph.dependencies(&fp("c.ts"), Direction::Incoming), vec![fp("a.ts")]);
    }

    #[test]
    fn test_remove_file_leaves_unresolved_edges() {
        let mut graph = graph(&[("a.ts", &["./b"]), ("b.ts", &["./c"]), ("c.ts", &[])]);
        graph.build(&resolver(ABC));

        let importers = graph.remove_file(&fp("b.ts"));
        assert_eq!(importers, vec![fp("a.ts")]);
        assert!(graph.dependencies(&fp("a.ts"), Direction::Outgoing).is_empty());
        assert!(graph.dependencies(&fp("c.ts"), Direction::Incoming).is_empty());
        assert_eq!(graph.importers_with_unresolved(), vec![fp("a.ts")]);
        assert_eq!(graph.unresolved_imports()[0].specifier, "./b");
    }

    #[test]
    fn test_self_import_is_not_an_edge() {
        let mut graph = graph(&[("a.ts", &["./a"])]);
        graph.build(&resolver(ABC));
        assert!(graph.dependencies(&fp("a.ts"), Direction::Outgoing).is_empty());
        assert!(graph.unresolved_imports().is_empty());
    }
}
