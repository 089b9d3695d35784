//! TypeScript / JavaScript adapter built on tree-sitter
//!
//! One grammar per extension family: `ts/mts/cts`, `tsx`, and the
//! JavaScript grammar (with JSX) for `js/jsx/mjs/cjs`. A fresh
//! `tree_sitter::Parser` is created per call so the adapter stays `Sync`.

use std::collections::HashSet;

use tree_sitter::{Language, Node, Parser};

use crate::parsing::parser::{
    CallSite, ImportKind, ImportSpec, LanguageAdapter, ParseError, ParseResult, ParsedFile,
};
use crate::types::{FilePath, Range, Symbol, SymbolKind};

/// Guards against pathological nesting (minified bundles, generated code).
const MAX_DEPTH: usize = 512;

/// Signatures longer than this are cut.
const MAX_SIGNATURE_CHARS: usize = 200;

pub const TYPESCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs"];

/// Language adapter for the TypeScript and JavaScript family.
#[derive(Debug, Default, Clone)]
pub struct TypeScriptAdapter;

impl TypeScriptAdapter {
    pub fn new() -> Self {
        Self
    }

    fn language_for(path: &FilePath) -> Option<Language> {
        match path.extension()? {
            "ts" | "mts" | "cts" => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            "tsx" => Some(tree_sitter_typescript::LANGUAGE_TSX.into()),
            "js" | "jsx" | "mjs" | "cjs" => Some(tree_sitter_javascript::LANGUAGE.into()),
            _ => None,
        }
    }
}

impl LanguageAdapter for TypeScriptAdapter {
    fn name(&self) -> &str {
        "typescript"
    }

    fn supports(&self, path: &FilePath) -> bool {
        Self::language_for(path).is_some()
    }

    fn parse(&self, path: &FilePath, source: &str) -> ParseResult<ParsedFile> {
        let language = Self::language_for(path).ok_or_else(|| ParseError::Unsupported {
            path: path.to_string(),
        })?;

        let mut parser = Parser::new();
        parser
            .set_language(&language)
            .map_err(|e| ParseError::Grammar {
                reason: e.to_string(),
            })?;

        let tree = parser.parse(source, None).ok_or_else(|| ParseError::NoTree {
            path: path.to_string(),
        })?;

        let mut extractor = Extractor::new(source);
        extractor.visit(tree.root_node(), Scope::default(), 0);
        Ok(extractor.finish())
    }
}

/// Where the walk currently is.
#[derive(Debug, Clone, Copy, Default)]
struct Scope {
    exported: bool,
    default_export: bool,
    in_function: bool,
    in_class: bool,
}

impl Scope {
    fn exporting(self, default_export: bool) -> Self {
        Self {
            exported: true,
            default_export,
            ..self
        }
    }

    fn inner(self) -> Self {
        Self {
            exported: false,
            default_export: false,
            ..self
        }
    }

    fn function_body(self) -> Self {
        Self {
            in_function: true,
            in_class: false,
            ..self.inner()
        }
    }

    fn class_body(self) -> Self {
        Self {
            in_class: true,
            ..self.inner()
        }
    }
}

struct Extractor<'a> {
    code: &'a str,
    symbols: Vec<Symbol>,
    imports: Vec<ImportSpec>,
    call_sites: Vec<CallSite>,
    /// `export { a, b }` without a source marks local declarations.
    named_exports: HashSet<String>,
    /// `export default name;`
    default_export: Option<String>,
    /// Indices of bodiless `function_signature` symbols
    signatures: HashSet<usize>,
}

impl<'a> Extractor<'a> {
    fn new(code: &'a str) -> Self {
        Self {
            code,
            symbols: Vec::new(),
            imports: Vec::new(),
            call_sites: Vec::new(),
            named_exports: HashSet::new(),
            default_export: None,
            signatures: HashSet::new(),
        }
    }

    fn finish(mut self) -> ParsedFile {
        self.drop_implemented_overloads();

        for symbol in &mut self.symbols {
            if self.named_exports.contains(&symbol.name) {
                symbol.exported = true;
            }
            if self.default_export.as_deref() == Some(symbol.name.as_str()) {
                symbol.exported = true;
                symbol.default_export = true;
            }
        }

        ParsedFile {
            symbols: self.symbols,
            imports: self.imports,
            call_sites: self.call_sites,
        }
    }

    /// Overload signatures followed by an implementation collapse into it,
    /// so a name resolves to the definition that owns the body.
    fn drop_implemented_overloads(&mut self) {
        if self.signatures.is_empty() {
            return;
        }
        let implemented: HashSet<String> = self
            .symbols
            .iter()
            .enumerate()
            .filter(|(i, s)| s.kind == SymbolKind::Function && !self.signatures.contains(i))
            .map(|(_, s)| s.name.clone())
            .collect();

        let signatures = std::mem::take(&mut self.signatures);
        let symbols = std::mem::take(&mut self.symbols);
        self.symbols = symbols
            .into_iter()
            .enumerate()
            .filter(|(i, s)| !(signatures.contains(i) && implemented.contains(&s.name)))
            .map(|(_, s)| s)
            .collect();
    }

    fn text(&self, node: Node) -> &'a str {
        &self.code[node.byte_range()]
    }

    fn visit(&mut self, node: Node<'_>, scope: Scope, depth: usize) {
        if depth > MAX_DEPTH {
            tracing::debug!("[typescript] max depth reached at byte {}", node.start_byte());
            return;
        }

        match node.kind() {
            "import_statement" => self.import_statement(node),
            "export_statement" => self.export_statement(node, scope, depth),
            "function_declaration" | "generator_function_declaration" => {
                self.declare(node, node, SymbolKind::Function, scope);
                self.visit_children(node, scope.function_body(), depth);
            }
            "function_signature" => {
                let index = self.symbols.len();
                self.declare(node, node, SymbolKind::Function, scope);
                if self.symbols.len() > index {
                    self.signatures.insert(index);
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                self.declare(node, node, SymbolKind::Class, scope);
                self.visit_children(node, scope.class_body(), depth);
            }
            "method_definition" | "abstract_method_signature" => {
                if scope.in_class {
                    self.declare(node, node, SymbolKind::Method, scope.inner());
                }
                self.visit_children(node, scope.function_body(), depth);
            }
            "public_field_definition" | "field_definition" => {
                let is_function = node
                    .child_by_field_name("value")
                    .is_some_and(|v| is_function_node(v.kind()));
                if scope.in_class && is_function {
                    self.declare(node, node, SymbolKind::Method, scope.inner());
                }
                self.visit_children(node, scope.function_body(), depth);
            }
            "interface_declaration" => self.declare(node, node, SymbolKind::Interface, scope),
            "type_alias_declaration" => self.declare(node, node, SymbolKind::TypeAlias, scope),
            "enum_declaration" => self.declare(node, node, SymbolKind::Enum, scope),
            "internal_module" | "module" => {
                self.declare(node, node, SymbolKind::Module, scope);
                self.visit_children(node, scope.inner(), depth);
            }
            "lexical_declaration" | "variable_declaration" => {
                self.variable_declaration(node, scope, depth);
            }
            "call_expression" => {
                self.call_expression(node);
                self.visit_children(node, scope.inner(), depth);
            }
            kind if is_function_node(kind) => {
                self.visit_children(node, scope.function_body(), depth);
            }
            _ => self.visit_children(node, scope.inner(), depth),
        }
    }

    fn visit_children(&mut self, node: Node<'_>, scope: Scope, depth: usize) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child, scope, depth + 1);
        }
    }

    /// Record a declaration. `node` supplies the name; `span` the range.
    fn declare(&mut self, node: Node<'_>, span: Node<'_>, kind: SymbolKind, scope: Scope) {
        let name = match node.child_by_field_name("name") {
            Some(name_node) => self.text(name_node).to_string(),
            None if scope.default_export => "default".to_string(),
            None => return,
        };

        let mut symbol = Symbol::new(name, kind, node_range(span));
        if let Some(signature) = self.signature(span, body_of(span)) {
            symbol = symbol.with_signature(signature);
        }
        if let Some(doc) = self.doc_comment(span) {
            symbol = symbol.with_doc(doc);
        }
        if scope.exported {
            symbol = if scope.default_export {
                symbol.default_export()
            } else {
                symbol.exported()
            };
        }
        self.symbols.push(symbol);
    }

    fn variable_declaration(&mut self, node: Node<'_>, scope: Scope, depth: usize) {
        let is_const = node
            .child(0)
            .is_some_and(|first| self.text(first) == "const");

        let mut cursor = node.walk();
        let declarators: Vec<Node<'_>> = node
            .named_children(&mut cursor)
            .filter(|c| c.kind() == "variable_declarator")
            .collect();
        let single = declarators.len() == 1;

        for declarator in declarators {
            let value = declarator.child_by_field_name("value");

            if let Some(value) = value {
                if self.require_call(declarator, value) {
                    continue;
                }
            }

            if !scope.in_function {
                if let Some(name_node) = declarator
                    .child_by_field_name("name")
                    .filter(|n| n.kind() == "identifier")
                {
                    let kind = match value {
                        Some(v) if is_function_node(v.kind()) => SymbolKind::Function,
                        _ if is_const => SymbolKind::Constant,
                        _ => SymbolKind::Variable,
                    };
                    let span = if single { node } else { declarator };
                    let body = value.and_then(body_of);
                    let mut symbol =
                        Symbol::new(self.text(name_node), kind, node_range(span));
                    if let Some(signature) = self.signature(span, body) {
                        symbol = symbol.with_signature(signature);
                    }
                    if let Some(doc) = self.doc_comment(node) {
                        symbol = symbol.with_doc(doc);
                    }
                    if scope.exported {
                        symbol = if scope.default_export {
                            symbol.default_export()
                        } else {
                            symbol.exported()
                        };
                    }
                    self.symbols.push(symbol);
                }
            }

            if let Some(value) = value {
                self.visit(value, scope.inner(), depth + 1);
            }
        }
    }

    /// `const x = require("y")` and `const { a, b } = require("y")`.
    fn require_call(&mut self, declarator: Node<'_>, value: Node<'_>) -> bool {
        if value.kind() != "call_expression" {
            return false;
        }
        let is_require = value
            .child_by_field_name("function")
            .is_some_and(|f| f.kind() == "identifier" && self.text(f) == "require");
        if !is_require {
            return false;
        }
        let Some(specifier) = self.first_string_argument(value) else {
            return false;
        };

        let mut import = ImportSpec::new(specifier, ImportKind::Dynamic, line_of(value));
        if let Some(pattern) = declarator.child_by_field_name("name") {
            match pattern.kind() {
                "identifier" => {
                    import = import.with_binding("*", self.text(pattern));
                }
                "object_pattern" => {
                    let mut cursor = pattern.walk();
                    for part in pattern.named_children(&mut cursor) {
                        match part.kind() {
                            "shorthand_property_identifier_pattern" => {
                                let name = self.text(part);
                                import = import.with_binding(name, name);
                            }
                            "pair_pattern" => {
                                let key = part.child_by_field_name("key").map(|k| self.text(k));
                                let local =
                                    part.child_by_field_name("value").map(|v| self.text(v));
                                if let (Some(key), Some(local)) = (key, local) {
                                    import = import.with_binding(key, local);
                                }
                            }
                            _ => {}
                        }
                    }
                }
                _ => {}
            }
        }
        self.imports.push(import);
        true
    }

    fn call_expression(&mut self, node: Node<'_>) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };

        match function.kind() {
            "import" => {
                if let Some(specifier) = self.first_string_argument(node) {
                    self.imports
                        .push(ImportSpec::new(specifier, ImportKind::Dynamic, line_of(node)));
                }
            }
            "identifier" => {
                let name = self.text(function);
                if name == "require" {
                    if let Some(specifier) = self.first_string_argument(node) {
                        self.imports
                            .push(ImportSpec::new(specifier, ImportKind::Dynamic, line_of(node)));
                    }
                    return;
                }
                self.call_sites.push(CallSite::new(name, node_range(node)));
            }
            "member_expression" => {
                let Some(property) = function.child_by_field_name("property") else {
                    return;
                };
                let mut site = CallSite::new(self.text(property), node_range(node));
                if let Some(object) = function.child_by_field_name("object") {
                    if matches!(object.kind(), "identifier" | "this" | "super") {
                        site = site.with_receiver(self.text(object));
                    }
                }
                self.call_sites.push(site);
            }
            _ => {}
        }
    }

    fn first_string_argument(&self, call: Node<'_>) -> Option<String> {
        let arguments = call.child_by_field_name("arguments")?;
        let mut cursor = arguments.walk();
        let first = arguments.named_children(&mut cursor).next()?;
        if first.kind() != "string" && first.kind() != "template_string" {
            return None;
        }
        let raw = self.text(first);
        if raw.contains("${") {
            return None;
        }
        Some(unquote(raw).to_string())
    }

    fn import_statement(&mut self, node: Node<'_>) {
        let Some(source) = node.child_by_field_name("source") else {
            return;
        };
        let specifier = unquote(self.text(source));
        let line = line_of(node);

        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        let type_only = children.iter().any(|c| c.kind() == "type");
        let clause = children.iter().find(|c| c.kind() == "import_clause").copied();

        let Some(clause) = clause else {
            self.imports
                .push(ImportSpec::new(specifier, ImportKind::SideEffect, line));
            return;
        };

        let mut import = ImportSpec::new(specifier, ImportKind::Default, line);
        let mut has_named = false;
        let mut has_namespace = false;

        let mut clause_cursor = clause.walk();
        for child in clause.named_children(&mut clause_cursor) {
            match child.kind() {
                "identifier" => {
                    import = import.with_binding("default", self.text(child));
                }
                "named_imports" => {
                    has_named = true;
                    let mut named_cursor = child.walk();
                    for spec in child.named_children(&mut named_cursor) {
                        if spec.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name) = spec.child_by_field_name("name") else {
                            continue;
                        };
                        let imported = self.text(name);
                        let local = spec
                            .child_by_field_name("alias")
                            .map(|alias| self.text(alias))
                            .unwrap_or(imported);
                        import = import.with_binding(imported, local);
                    }
                }
                "namespace_import" => {
                    has_namespace = true;
                    let mut ns_cursor = child.walk();
                    if let Some(ident) = child
                        .named_children(&mut ns_cursor)
                        .find(|n| n.kind() == "identifier")
                    {
                        import = import.with_binding("*", self.text(ident));
                    }
                }
                _ => {}
            }
        }

        import.kind = if type_only {
            ImportKind::TypeOnly
        } else if has_namespace {
            ImportKind::Namespace
        } else if has_named {
            ImportKind::Named
        } else {
            ImportKind::Default
        };
        self.imports.push(import);
    }

    fn export_statement(&mut self, node: Node<'_>, scope: Scope, depth: usize) {
        let mut cursor = node.walk();
        let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
        let is_default = children.iter().any(|c| c.kind() == "default");

        if let Some(source) = node.child_by_field_name("source") {
            self.reexport(node, source, &children);
            return;
        }

        for child in children.into_iter().filter(|c| c.is_named()) {
            match child.kind() {
                "comment" => {}
                "export_clause" => {
                    let mut clause_cursor = child.walk();
                    for spec in child.named_children(&mut clause_cursor) {
                        if let Some(name) = spec.child_by_field_name("name") {
                            self.named_exports.insert(self.text(name).to_string());
                        }
                    }
                }
                "identifier" if is_default => {
                    self.default_export = Some(self.text(child).to_string());
                }
                _ => self.visit(child, scope.exporting(is_default), depth + 1),
            }
        }
    }

    fn reexport(&mut self, node: Node<'_>, source: Node<'_>, children: &[Node<'_>]) {
        let specifier = unquote(self.text(source));
        let line = line_of(node);

        if let Some(clause) = children.iter().find(|c| c.kind() == "export_clause") {
            let mut import = ImportSpec::new(specifier, ImportKind::Named, line).as_reexport();
            let mut cursor = clause.walk();
            for spec in clause.named_children(&mut cursor) {
                let Some(name) = spec.child_by_field_name("name") else {
                    continue;
                };
                let imported = self.text(name);
                let exported = spec
                    .child_by_field_name("alias")
                    .map(|alias| self.text(alias))
                    .unwrap_or(imported);
                import = import.with_binding(imported, exported);
            }
            self.imports.push(import);
            return;
        }

        let mut import = ImportSpec::new(specifier, ImportKind::Namespace, line).as_reexport();
        if let Some(ns) = children.iter().find(|c| c.kind() == "namespace_export") {
            let mut cursor = ns.walk();
            if let Some(ident) = ns.named_children(&mut cursor).last() {
                import = import.with_binding("*", self.text(ident));
            }
        }
        self.imports.push(import);
    }

    /// Declaration head up to the body, whitespace collapsed.
    fn signature(&self, node: Node<'_>, body: Option<Node<'_>>) -> Option<String> {
        let end = body.map_or(node.end_byte(), |b| b.start_byte());
        let raw = self.code.get(node.start_byte()..end)?;
        let raw = raw.lines().take(8).collect::<Vec<_>>().join(" ");
        let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
        let trimmed = collapsed.trim_end_matches(['{', ' ', ';']).trim_end_matches("=>").trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(truncate_chars(trimmed, MAX_SIGNATURE_CHARS))
    }

    /// JSDoc block immediately above the declaration (or its `export`).
    fn doc_comment(&self, node: Node<'_>) -> Option<String> {
        let anchor = match node.parent() {
            Some(parent) if parent.kind() == "export_statement" => parent,
            _ => node,
        };
        let comment = anchor.prev_named_sibling()?;
        if comment.kind() != "comment" {
            return None;
        }
        if comment.end_position().row + 1 < anchor.start_position().row {
            return None;
        }
        let text = self.text(comment);
        if !text.starts_with("/**") {
            return None;
        }

        let cleaned = text
            .trim_start_matches("/**")
            .trim_end_matches("*/")
            .lines()
            .map(|line| line.trim().trim_start_matches('*').trim())
            .filter(|line| !line.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        (!cleaned.is_empty()).then_some(cleaned)
    }
}

fn is_function_node(kind: &str) -> bool {
    matches!(
        kind,
        "arrow_function" | "function_expression" | "function" | "generator_function"
    )
}

fn body_of(node: Node) -> Option<Node> {
    node.child_by_field_name("body")
}

fn node_range(node: Node) -> Range {
    Range::new(
        node.start_byte() as u32,
        node.end_byte() as u32,
        node.start_position().row as u32 + 1,
        node.end_position().row as u32 + 1,
    )
}

fn line_of(node: Node) -> u32 {
    node.start_position().row as u32 + 1
}

fn unquote(raw: &str) -> &str {
    raw.trim_matches(|c| c == '"' || c == '\'' || c == '`')
}

fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(path: &str, code: &str) -> ParsedFile {
        let adapter = TypeScriptAdapter::new();
        adapter
            .parse(&FilePath::new(path).unwrap(), code)
            .expect("parse should succeed")
    }

    #[test]
    fn test_extracts_declarations() {
        let code = r#"
/** Adds numbers. */
export function add(a: number, b: number): number {
    return a + b;
}

export class Calculator {
    total(values: number[]) {
        return values.reduce((acc, v) => add(acc, v), 0);
    }
}

interface Shape { area(): number }
type Id = string;
enum Color { Red, Green }
const helper = (x: number) => x * 2;
"#;
        let parsed = parse("src/math.ts", code);
        let names: Vec<(&str, SymbolKind)> = parsed
            .symbols
            .iter()
            .map(|s| (s.name.as_str(), s.kind))
            .collect();

        assert!(names.contains(&("add", SymbolKind::Function)));
        assert!(names.contains(&("Calculator", SymbolKind::Class)));
        assert!(names.contains(&("total", SymbolKind::Method)));
        assert!(names.contains(&("Shape", SymbolKind::Interface)));
        assert!(names.contains(&("Id", SymbolKind::TypeAlias)));
        assert!(names.contains(&("Color", SymbolKind::Enum)));
        assert!(names.contains(&("helper", SymbolKind::Function)));

        let add = parsed.symbols.iter().find(|s| s.name == "add").unwrap();
        assert!(add.exported);
        assert_eq!(add.doc.as_deref(), Some("Adds numbers."));
        assert!(add.signature.as_deref().unwrap().starts_with("function add("));

        let helper = parsed.symbols.iter().find(|s| s.name == "helper").unwrap();
        assert!(!helper.exported);
    }

    #[test]
    fn test_extracts_imports() {
        let code = r#"
import React from "react";
import { useState, useEffect as effect } from "react";
import * as utils from "./utils";
import type { Props } from "./types";
import "./styles.css";
export { format } from "./format";
export * from "./all";
const lazy = import("./lazy");
const fs = require("fs");
"#;
        let parsed = parse("src/app.tsx", code);
        let kinds: Vec<(&str, ImportKind)> = parsed
            .imports
            .iter()
            .map(|i| (i.specifier.as_str(), i.kind))
            .collect();

        assert!(kinds.contains(&("react", ImportKind::Default)));
        assert!(kinds.contains(&("react", ImportKind::Named)));
        assert!(kinds.contains(&("./utils", ImportKind::Namespace)));
        assert!(kinds.contains(&("./types", ImportKind::TypeOnly)));
        assert!(kinds.contains(&("./styles.css", ImportKind::SideEffect)));
        assert!(kinds.contains(&("./lazy", ImportKind::Dynamic)));
        assert!(kinds.contains(&("fs", ImportKind::Dynamic)));

        let named = parsed
            .imports
            .iter()
            .find(|i| i.specifier == "react" && i.kind == ImportKind::Named)
            .unwrap();
        assert!(
            named
                .bindings
                .iter()
                .any(|b| b.imported == "useEffect" && b.local == "effect")
        );

        let reexports: Vec<&ImportSpec> = parsed.imports.iter().filter(|i| i.reexport).collect();
        assert_eq!(reexports.len(), 2);
    }

    #[test]
    fn test_extracts_call_sites() {
        let code = r#"
import * as api from "./api";

function load() {
    const data = fetchData();
    api.send(data);
    this.render();
}
"#;
        let parsed = parse("src/load.js", code);
        let callees: Vec<(&str, Option<&str>)> = parsed
            .call_sites
            .iter()
            .map(|c| (c.callee.as_str(), c.receiver.as_deref()))
            .collect();

        assert!(callees.contains(&("fetchData", None)));
        assert!(callees.contains(&("send", Some("api"))));
        assert!(callees.contains(&("render", Some("this"))));

        let load = parsed.symbols.iter().find(|s| s.name == "load").unwrap();
        assert!(parsed.call_sites.iter().all(|c| load.range.contains(&c.range)));
    }

    #[test]
    fn test_named_and_default_export_lists() {
        let code = r#"
function a() {}
function b() {}
export { a };
export default b;
"#;
        let parsed = parse("src/x.ts", code);
        let a = parsed.symbols.iter().find(|s| s.name == "a").unwrap();
        let b = parsed.symbols.iter().find(|s| s.name == "b").unwrap();
        assert!(a.exported && !a.default_export);
        assert!(b.exported && b.default_export);
        assert_eq!(parsed.exports().len(), 2);
    }

    #[test]
    fn test_overloads_collapse_into_implementation() {
        let code = r#"
export function fmt(x: string): string;
export function fmt(x: number): string;
export function fmt(x: any) {
    return helper(x);
}
function helper(x: any) { return String(x); }
declare function ambient(x: number): void;
"#;
        let parsed = parse("src/fmt.ts", code);
        let fmts: Vec<&Symbol> = parsed.symbols.iter().filter(|s| s.name == "fmt").collect();
        assert_eq!(fmts.len(), 1);
        assert_eq!(fmts[0].range.start_line, 4);
        assert!(fmts[0].exported && !fmts[0].default_export);

        // A signature with no implementation is still a declaration
        assert!(parsed.symbols.iter().any(|s| s.name == "ambient"));
    }

    #[test]
    fn test_unsupported_extension() {
        let adapter = TypeScriptAdapter::new();
        let path = FilePath::new("README.md").unwrap();
        assert!(!adapter.supports(&path));
        assert!(matches!(
            adapter.parse(&path, "# hi"),
            Err(ParseError::Unsupported { .. })
        ));
    }
}
