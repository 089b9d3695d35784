//! Symbol-level call graph derived on demand.
//!
//! Only call sites are stored (per file, replaced with the file). Edges are
//! resolved at query time from the symbol index and the dependency graph,
//! so a re-indexed file can never leave stale call edges behind.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

use crate::error::{IndexError, IndexResult};
use crate::parsing::CallSite;
use crate::storage::DependencyGraph;
use crate::symbol::SymbolIndex;
use crate::types::{Direction, FilePath, Range, SymbolId};

/// Re-export chains longer than this are not followed.
const MAX_REEXPORT_HOPS: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallEdge {
    pub from: SymbolId,
    pub to: SymbolId,
    pub call_site: Range,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallNode {
    pub id: SymbolId,
    pub depth: usize,
}

/// Result of `analyze_symbol`. `visited_nodes` excludes the root.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallAnalysis {
    pub root: SymbolId,
    pub direction: Direction,
    pub visited_nodes: Vec<CallNode>,
    pub edges: Vec<CallEdge>,
    pub truncated: bool,
}

#[derive(Debug, Default)]
pub struct CallGraph {
    sites: BTreeMap<FilePath, Vec<CallSite>>,
    /// callee name -> files with a call site for it
    by_callee: BTreeMap<String, BTreeSet<FilePath>>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_file(&mut self, file: &FilePath, sites: Vec<CallSite>) {
        self.remove_file(file);
        for site in &sites {
            self.by_callee
                .entry(site.callee.clone())
                .or_default()
                .insert(file.clone());
        }
        self.sites.insert(file.clone(), sites);
    }

    pub fn remove_file(&mut self, file: &FilePath) -> bool {
        let Some(old) = self.sites.remove(file) else {
            return false;
        };
        for site in old {
            if let Some(files) = self.by_callee.get_mut(&site.callee) {
                files.remove(file);
                if files.is_empty() {
                    self.by_callee.remove(&site.callee);
                }
            }
        }
        true
    }

    pub fn sites_in_file(&self, file: &FilePath) -> &[CallSite] {
        self.sites.get(file).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn site_count(&self) -> usize {
        self.sites.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.sites.clear();
        self.by_callee.clear();
    }

    /// Bounded BFS over call edges from `name` declared in `file`.
    pub fn analyze_symbol(
        &self,
        symbols: &SymbolIndex,
        deps: &DependencyGraph,
        name: &str,
        file: &FilePath,
        direction: Direction,
        max_depth: Option<usize>,
    ) -> IndexResult<CallAnalysis> {
        let root = SymbolId::new(file.clone(), name);
        if symbols.get(&root).is_none() {
            return Err(IndexError::InvalidArgument(format!(
                "unknown symbol '{name}' in {file}"
            )));
        }

        let resolver = CalleeResolver { symbols, deps };
        let mut analysis = CallAnalysis {
            root: root.clone(),
            direction,
            visited_nodes: Vec::new(),
            edges: Vec::new(),
            truncated: false,
        };
        let mut visited = HashSet::from([root.clone()]);
        let mut queue = VecDeque::from([(root, 0usize)]);

        while let Some((current, depth)) = queue.pop_front() {
            let steps = match direction {
                Direction::Outgoing => self.callees(&resolver, &current),
                Direction::Incoming => self.callers(&resolver, &current),
            };

            for (next, call_site) in steps {
                let edge = match direction {
                    Direction::Outgoing => CallEdge {
                        from: current.clone(),
                        to: next.clone(),
                        call_site,
                    },
                    Direction::Incoming => CallEdge {
                        from: next.clone(),
                        to: current.clone(),
                        call_site,
                    },
                };

                if visited.contains(&next) {
                    if analysis.edges.iter().all(|e| e != &edge) {
                        analysis.edges.push(edge);
                    }
                    continue;
                }
                if max_depth.is_some_and(|max| depth + 1 > max) {
                    analysis.truncated = true;
                    continue;
                }

                visited.insert(next.clone());
                analysis.edges.push(edge);
                analysis.visited_nodes.push(CallNode {
                    id: next.clone(),
                    depth: depth + 1,
                });
                queue.push_back((next, depth + 1));
            }
        }

        Ok(analysis)
    }

    /// Resolved callees of the call sites whose innermost definition is
    /// named `caller`. Matching by name keeps this the mirror of `callers`,
    /// which attributes a site to its enclosing definition's id.
    fn callees(&self, resolver: &CalleeResolver<'_>, caller: &SymbolId) -> Vec<(SymbolId, Range)> {
        self.sites_in_file(&caller.file)
            .iter()
            .filter(|site| {
                resolver
                    .symbols
                    .enclosing_symbol(&caller.file, &site.range)
                    .is_some_and(|inner| inner.name == caller.name)
            })
            .filter_map(|site| {
                resolver
                    .resolve(&caller.file, site)
                    .map(|callee| (callee, site.range))
            })
            .collect()
    }

    /// Enclosing definitions of call sites that resolve to `callee`.
    ///
    /// Candidates are sites calling the name directly plus every site in a
    /// file importing the callee's file, which catches aliased imports.
    fn callers(&self, resolver: &CalleeResolver<'_>, callee: &SymbolId) -> Vec<(SymbolId, Range)> {
        let importers: BTreeSet<FilePath> = resolver
            .deps
            .dependencies(&callee.file, Direction::Incoming)
            .into_iter()
            .collect();

        let mut candidates = importers.clone();
        if let Some(files) = self.by_callee.get(&callee.name) {
            candidates.extend(files.iter().cloned());
        }

        let mut out = Vec::new();
        for file in &candidates {
            for site in self.sites_in_file(file) {
                if site.callee != callee.name && !importers.contains(file) {
                    continue;
                }
                if resolver.resolve(file, site).as_ref() != Some(callee) {
                    continue;
                }
                if let Some(owner) = resolver.symbols.enclosing_symbol(file, &site.range) {
                    out.push((SymbolId::new(file.clone(), &owner.name), site.range));
                }
            }
        }
        out
    }
}

/// Best-effort mapping of a call site to the symbol it targets.
struct CalleeResolver<'a> {
    symbols: &'a SymbolIndex,
    deps: &'a DependencyGraph,
}

impl CalleeResolver<'_> {
    fn resolve(&self, file: &FilePath, site: &CallSite) -> Option<SymbolId> {
        match site.receiver.as_deref() {
            None | Some("this") | Some("super") => {
                if self.declares(file, &site.callee) {
                    return Some(SymbolId::new(file.clone(), &site.callee));
                }
                if site.receiver.is_some() {
                    return None;
                }
                self.through_named_import(file, &site.callee)
            }
            Some(receiver) => self.through_namespace_import(file, receiver, &site.callee),
        }
    }

    fn declares(&self, file: &FilePath, name: &str) -> bool {
        self.symbols
            .symbols_in_file(file)
            .iter()
            .any(|symbol| symbol.name == name)
    }

    /// `import { a as b }` / `import b from` / `const { a } = require()` where `b` is called.
    fn through_named_import(&self, file: &FilePath, local: &str) -> Option<SymbolId> {
        self.deps.imports_of(file).iter().find_map(|import| {
            let binding = import
                .bindings
                .iter()
                .find(|b| b.local == local && !b.is_namespace())?;
            let target = self.deps.resolved_target(file, &import.specifier)?;
            self.lookup_export(target, &binding.imported, &mut HashSet::new())
        })
    }

    /// `import * as ns from` / `const ns = require()` where `ns.name()` is called.
    fn through_namespace_import(&self, file: &FilePath, receiver: &str, name: &str) -> Option<SymbolId> {
        self.deps.imports_of(file).iter().find_map(|import| {
            import
                .bindings
                .iter()
                .find(|b| b.local == receiver && b.is_namespace())?;
            let target = self.deps.resolved_target(file, &import.specifier)?;
            self.lookup_export(target, name, &mut HashSet::new())
        })
    }

    /// Find `name` exported from `file`, following re-exports.
    fn lookup_export(
        &self,
        file: &FilePath,
        name: &str,
        visited: &mut HashSet<FilePath>,
    ) -> Option<SymbolId> {
        if visited.len() >= MAX_REEXPORT_HOPS || !visited.insert(file.clone()) {
            return None;
        }

        let declared = self.symbols.symbols_in_file(file).iter().find(|symbol| {
            if name == "default" {
                symbol.default_export
            } else {
                symbol.name == name
            }
        });
        if let Some(symbol) = declared {
            return Some(SymbolId::new(file.clone(), &symbol.name));
        }

        for import in self.deps.imports_of(file).iter().filter(|i| i.reexport) {
            let Some(target) = self.deps.resolved_target(file, &import.specifier) else {
                continue;
            };
            let target = target.clone();

            if import.bindings.is_empty() {
                // export * from "x"
                if let Some(found) = self.lookup_export(&target, name, visited) {
                    return Some(found);
                }
                continue;
            }
            if let Some(binding) = import.bindings.iter().find(|b| b.local == name) {
                if let Some(found) = self.lookup_export(&target, &binding.imported, visited) {
                    return Some(found);
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parsing::{ImportKind, ImportSpec};
    use crate::types::{Symbol, SymbolKind};

    fn fp(path: &str) -> FilePath {
        FilePath::new(path).unwrap()
    }

    fn func(name: &str, start: u32, end: u32) -> Symbol {
        Symbol::new(name, SymbolKind::Function, Range::new(start, end, 1, 1)).exported()
    }

    fn call(callee: &str, at: u32) -> CallSite {
        CallSite::new(callee, Range::new(at, at + 3, 1, 1))
    }

    fn resolve_ts(_ctx: &FilePath, spec: &str) -> Option<FilePath> {
        FilePath::new(&format!("{}.ts", spec.trim_start_matches("./"))).ok()
    }

    struct Fixture {
        symbols: SymbolIndex,
        deps: DependencyGraph,
        calls: CallGraph,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                symbols: SymbolIndex::new(),
                deps: DependencyGraph::new(),
                calls: CallGraph::new(),
            }
        }

        fn file(&mut self, path: &str, symbols: Vec<Symbol>, imports: Vec<ImportSpec>, sites: Vec<CallSite>) {
            let file = fp(path);
            self.symbols.replace_file(&file, symbols);
            self.deps.set_imports(&file, imports);
            self.calls.replace_file(&file, sites);
        }

        fn analyze(&mut self, name: &str, file: &str, direction: Direction, depth: Option<usize>) -> CallAnalysis {
            self.deps.build(&resolve_ts);
            self.calls
                .analyze_symbol(&self.symbols, &self.deps, name, &fp(file), direction, depth)
                .unwrap()
        }
    }

    fn names(analysis: &CallAnalysis) -> Vec<String> {
        analysis.visited_nodes.iter().map(|n| n.id.to_string()).collect()
    }

    /// main -> helper (same file) -> format (named import) -> pad (namespace import)
    fn chain() -> Fixture {
        let mut fx = Fixture::new();
        fx.file(
            "main.ts",
            vec![func("main", 0, 50), func("helper", 60, 100)],
            vec![ImportSpec::new("./fmt", ImportKind::Named, 1).with_binding("format", "fmt")],
            vec![call("helper", 10), call("fmt", 70)],
        );
        fx.file(
            "fmt.ts",
            vec![func("format", 0, 40)],
            vec![ImportSpec::new("./pad", ImportKind::Namespace, 1).with_binding("*", "p")],
            vec![call("pad", 10).with_receiver("p")],
        );
        fx.file("pad.ts", vec![func("pad", 0, 20)], vec![], vec![]);
        fx
    }

    #[test]
    fn test_downstream_resolution() {
        let mut fx = chain();
        let analysis = fx.analyze("main", "main.ts", Direction::Outgoing, None);
        assert_eq!(
            names(&analysis),
            vec!["main.ts#helper", "fmt.ts#format", "pad.ts#pad"]
        );
        assert!(!analysis.truncated);
        assert_eq!(analysis.edges.len(), 3);
    }

    #[test]
    fn test_upstream_attributes_to_enclosing_definition() {
        let mut fx = chain();
        let analysis = fx.analyze("pad", "pad.ts", Direction::Incoming, None);
        assert_eq!(
            names(&analysis),
            vec!["fmt.ts#format", "main.ts#helper", "main.ts#main"]
        );
    }

    #[test]
    fn test_same_named_definitions_agree_both_ways() {
        // Two classes in one file, each with a constructor calling a different helper
        let mut fx = Fixture::new();
        fx.file(
            "models.ts",
            vec![
                func("constructor", 0, 30),
                func("constructor", 40, 70),
                func("load", 80, 90),
                func("save", 95, 105),
            ],
            vec![],
            vec![call("load", 10), call("save", 50)],
        );

        let down = fx.analyze("constructor", "models.ts", Direction::Outgoing, None);
        assert_eq!(names(&down), vec!["models.ts#load", "models.ts#save"]);

        let up = fx.analyze("save", "models.ts", Direction::Incoming, None);
        assert_eq!(names(&up), vec!["models.ts#constructor"]);
    }

    #[test]
    fn test_depth_truncation() {
        let mut fx = chain();
        let analysis = fx.analyze("main", "main.ts", Direction::Outgoing, Some(1));
        assert_eq!(names(&analysis), vec!["main.ts#helper"]);
        assert!(analysis.visited_nodes.iter().all(|n| n.depth <= 1));
        assert!(analysis.truncated);
    }

    #[test]
    fn test_recursion_is_cycle_safe() {
        let mut fx = Fixture::new();
        fx.file(
            "a.ts",
            vec![func("ping", 0, 20), func("pong", 30, 50)],
            vec![],
            vec![call("pong", 5), call("ping", 35), call("ping", 40)],
        );
        let analysis = fx.analyze("ping", "a.ts", Direction::Outgoing, None);
        assert_eq!(names(&analysis), vec!["a.ts#pong"]);
        // pong -> ping is reported as an edge even though ping is the root
        assert!(analysis.edges.iter().any(|e| e.to.name == "ping"));
    }

    #[test]
    fn test_reexport_chain_and_default() {
        let mut fx = Fixture::new();
        fx.file(
            "app.ts",
            vec![func("run", 0, 30)],
            vec![
                ImportSpec::new("./index", ImportKind::Named, 1).with_binding("api", "api"),
                ImportSpec::new("./logger", ImportKind::Default, 2).with_binding("default", "log"),
            ],
            vec![call("api", 5), call("log", 15)],
        );
        fx.file(
            "index.ts",
            vec![],
            vec![ImportSpec::new("./impl", ImportKind::Named, 1)
                .with_binding("client", "api")
                .as_reexport()],
            vec![],
        );
        fx.file("impl.ts", vec![func("client", 0, 10)], vec![], vec![]);
        fx.file(
            "logger.ts",
            vec![Symbol::new("write", SymbolKind::Function, Range::new(0, 10, 1, 1)).default_export()],
            vec![],
            vec![],
        );

        let analysis = fx.analyze("run", "app.ts", Direction::Outgoing, None);
        assert_eq!(names(&analysis), vec!["impl.ts#client", "logger.ts#write"]);
    }

    #[test]
    fn test_unknown_symbol_is_invalid_argument() {
        let fx = chain();
        let err = fx
            .calls
            .analyze_symbol(&fx.symbols, &fx.deps, "nope", &fp("main.ts"), Direction::Outgoing, None)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_replace_file_drops_old_sites() {
        let mut calls = CallGraph::new();
        let file = fp("a.ts");
        calls.replace_file(&file, vec![call("x", 0)]);
        calls.replace_file(&file, vec![call("y", 0)]);
        assert!(!calls.by_callee.contains_key("x"));
        assert_eq!(calls.site_count(), 1);
        assert!(calls.remove_file(&file));
        assert!(calls.by_callee.is_empty());
    }
}
