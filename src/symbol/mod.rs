//! Per-file symbol table with a name index.
//!
//! Entries are replaced wholesale per file. Containment queries work on
//! byte ranges, so "which definition holds this call" needs no live tree.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{FilePath, Range, Symbol, SymbolId};

#[derive(Debug, Default)]
struct FileSymbols {
    symbols: Vec<Symbol>,
    /// Monotonic sequence of the last replacement
    modified: u64,
}

/// Borrowed view of a symbol together with its file.
#[derive(Debug, Clone, Copy)]
pub struct SymbolRef<'a> {
    pub file: &'a FilePath,
    pub symbol: &'a Symbol,
}

impl SymbolRef<'_> {
    pub fn id(&self) -> SymbolId {
        SymbolId::new(self.file.clone(), &self.symbol.name)
    }

    pub fn to_entry(&self) -> SymbolEntry {
        SymbolEntry {
            file: self.file.clone(),
            symbol: self.symbol.clone(),
        }
    }
}

/// Owned symbol plus file, returned from queries after the lock is released.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolEntry {
    pub file: FilePath,
    #[serde(flatten)]
    pub symbol: Symbol,
}

#[derive(Debug, Default)]
pub struct SymbolIndex {
    files: BTreeMap<FilePath, FileSymbols>,
    by_name: BTreeMap<String, BTreeSet<FilePath>>,
    sequence: u64,
}

impl SymbolIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Swap in a file's symbols, replacing whatever was there.
    pub fn replace_file(&mut self, file: &FilePath, symbols: Vec<Symbol>) {
        self.remove_names(file);
        self.sequence += 1;

        for symbol in &symbols {
            self.by_name
                .entry(symbol.name.clone())
                .or_default()
                .insert(file.clone());
        }

        self.files.insert(
            file.clone(),
            FileSymbols {
                symbols,
                modified: self.sequence,
            },
        );
    }

    pub fn remove_file(&mut self, file: &FilePath) -> bool {
        self.remove_names(file);
        self.files.remove(file).is_some()
    }

    fn remove_names(&mut self, file: &FilePath) {
        let Some(existing) = self.files.get(file) else {
            return;
        };
        for symbol in &existing.symbols {
            if let Some(owners) = self.by_name.get_mut(&symbol.name) {
                owners.remove(file);
                if owners.is_empty() {
                    self.by_name.remove(&symbol.name);
                }
            }
        }
    }

    pub fn contains_file(&self, file: &FilePath) -> bool {
        self.files.contains_key(file)
    }

    pub fn symbols_in_file(&self, file: &FilePath) -> &[Symbol] {
        self.files
            .get(file)
            .map(|entry| entry.symbols.as_slice())
            .unwrap_or_default()
    }

    /// Exact name lookup across all files, in path order.
    pub fn find_by_name(&self, name: &str) -> Vec<SymbolRef<'_>> {
        let Some(owners) = self.by_name.get(name) else {
            return Vec::new();
        };
        owners
            .iter()
            .filter_map(|file| self.files.get_key_value(file))
            .flat_map(|(file, entry)| {
                entry
                    .symbols
                    .iter()
                    .filter(move |s| s.name == name)
                    .map(move |symbol| SymbolRef { file, symbol })
            })
            .collect()
    }

    /// Case-insensitive substring match on names, capped.
    pub fn search_names(&self, query: &str, cap: usize) -> Vec<SymbolRef<'_>> {
        let needle = query.to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }

        let mut out = Vec::new();
        for (name, owners) in &self.by_name {
            if !name.to_lowercase().contains(&needle) {
                continue;
            }
            for file in owners {
                let Some((file, entry)) = self.files.get_key_value(file) else {
                    continue;
                };
                for symbol in entry.symbols.iter().filter(|s| &s.name == name) {
                    if out.len() >= cap {
                        return out;
                    }
                    out.push(SymbolRef { file, symbol });
                }
            }
        }
        out
    }

    /// Definition for `id`. When several declarations share the name
    /// (overloads, one `constructor` per class) the widest range wins.
    pub fn get(&self, id: &SymbolId) -> Option<&Symbol> {
        self.files
            .get(&id.file)?
            .symbols
            .iter()
            .filter(|s| s.name == id.name)
            .max_by_key(|s| s.range.len())
    }

    /// Innermost symbol whose range contains `range`.
    pub fn enclosing_symbol(&self, file: &FilePath, range: &Range) -> Option<&Symbol> {
        self.symbols_in_file(file)
            .iter()
            .filter(|s| s.range.contains(range))
            .min_by_key(|s| s.range.len())
    }

    /// Files ordered by most recent replacement first.
    pub fn recently_modified(&self, limit: usize) -> Vec<&FilePath> {
        let mut files: Vec<(&FilePath, u64)> = self
            .files
            .iter()
            .map(|(file, entry)| (file, entry.modified))
            .collect();
        files.sort_by(|a, b| b.1.cmp(&a.1));
        files.into_iter().take(limit).map(|(file, _)| file).collect()
    }

    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn symbol_count(&self) -> usize {
        self.files.values().map(|entry| entry.symbols.len()).sum()
    }

    pub fn files(&self) -> impl Iterator<Item = &FilePath> {
        self.files.keys()
    }

    pub fn clear(&mut self) {
        self.files.clear();
        self.by_name.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SymbolKind;

    fn fp(path: &str) -> FilePath {
        FilePath::new(path).unwrap()
    }

    fn sym(name: &str, kind: SymbolKind, start: u32, end: u32) -> Symbol {
        Symbol::new(name, kind, Range::new(start, end, 1, 1))
    }

    #[test]
    fn test_replace_file_swaps_names() {
        let mut index = SymbolIndex::new();
        let file = fp("src/a.ts");

        index.replace_file(&file, vec![sym("old", SymbolKind::Function, 0, 10)]);
        assert_eq!(index.find_by_name("old").len(), 1);

        index.replace_file(&file, vec![sym("new", SymbolKind::Function, 0, 10)]);
        assert!(index.find_by_name("old").is_empty());
        assert_eq!(index.find_by_name("new")[0].file, &file);
        assert_eq!(index.symbol_count(), 1);
    }

    #[test]
    fn test_remove_file() {
        let mut index = SymbolIndex::new();
        let file = fp("a.ts");
        index.replace_file(&file, vec![sym("x", SymbolKind::Constant, 0, 5)]);

        assert!(index.remove_file(&file));
        assert!(!index.remove_file(&file));
        assert!(index.symbols_in_file(&file).is_empty());
        assert!(index.find_by_name("x").is_empty());
        assert_eq!(index.file_count(), 0);
    }

    #[test]
    fn test_enclosing_symbol_is_innermost() {
        let mut index = SymbolIndex::new();
        let file = fp("a.ts");
        index.replace_file(
            &file,
            vec![
                sym("Outer", SymbolKind::Class, 0, 100),
                sym("method", SymbolKind::Method, 10, 50),
                sym("other", SymbolKind::Method, 60, 90),
            ],
        );

        let call = Range::new(20, 25, 2, 2);
        assert_eq!(index.enclosing_symbol(&file, &call).unwrap().name, "method");

        let top = Range::new(52, 55, 3, 3);
        assert_eq!(index.enclosing_symbol(&file, &top).unwrap().name, "Outer");

        let outside = Range::new(150, 160, 9, 9);
        assert!(index.enclosing_symbol(&file, &outside).is_none());
    }

    #[test]
    fn test_search_names_case_insensitive_and_capped() {
        let mut index = SymbolIndex::new();
        index.replace_file(
            &fp("a.ts"),
            vec![
                sym("parseConfig", SymbolKind::Function, 0, 1),
                sym("ConfigLoader", SymbolKind::Class, 2, 3),
            ],
        );
        index.replace_file(&fp("b.ts"), vec![sym("config", SymbolKind::Constant, 0, 1)]);

        assert_eq!(index.search_names("CONFIG", 10).len(), 3);
        assert_eq!(index.search_names("config", 2).len(), 2);
        assert!(index.search_names("", 10).is_empty());
    }

    #[test]
    fn test_get_prefers_widest_declaration() {
        let mut index = SymbolIndex::new();
        let file = fp("a.ts");
        index.replace_file(
            &file,
            vec![
                sym("constructor", SymbolKind::Method, 10, 20),
                sym("constructor", SymbolKind::Method, 40, 90),
                sym("constructor", SymbolKind::Method, 100, 110),
            ],
        );

        let found = index.get(&SymbolId::new(file, "constructor")).unwrap();
        assert_eq!(found.range.start_byte, 40);
    }

    #[test]
    fn test_get_and_recently_modified() {
        let mut index = SymbolIndex::new();
        index.replace_file(&fp("a.ts"), vec![sym("a", SymbolKind::Function, 0, 1)]);
        index.replace_file(&fp("b.ts"), vec![sym("b", SymbolKind::Function, 0, 1)]);
        index.replace_file(&fp("a.ts"), vec![sym("a", SymbolKind::Function, 0, 1)]);

        assert!(index.get(&SymbolId::new(fp("b.ts"), "b")).is_some());
        assert!(index.get(&SymbolId::new(fp("b.ts"), "a")).is_none());

        let recent: Vec<&str> = index
            .recently_modified(5)
            .into_iter()
            .map(FilePath::as_str)
            .collect();
        assert_eq!(recent, vec!["a.ts", "b.ts"]);
    }
}
