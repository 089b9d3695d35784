//! Language adapter boundary
//!
//! The index never parses source itself. An adapter turns `(path, source)`
//! into symbols, import/export records and call sites. Adapters are injected
//! explicitly so tests can supply fakes and several repository roots can run
//! side by side without shared parser state.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{FilePath, Range, Symbol};

#[derive(Error, Debug, Clone)]
pub enum ParseError {
    #[error("Unsupported language for {path}")]
    Unsupported { path: String },

    #[error("Failed to load grammar: {reason}")]
    Grammar { reason: String },

    #[error("Parser produced no tree for {path}")]
    NoTree { path: String },
}

pub type ParseResult<T> = Result<T, ParseError>;

/// How a module is brought into scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    /// `import { a, b as c } from "x"`
    Named,
    /// `import a from "x"`
    Default,
    /// `import * as ns from "x"` and `export * from "x"`
    Namespace,
    /// `import("x")` and `require("x")`
    Dynamic,
    /// `import type { T } from "x"`
    TypeOnly,
    /// `import "x"`
    SideEffect,
}

/// One name bound by an import. `imported` is `"default"` for default
/// imports and `"*"` for namespace imports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImportBinding {
    pub imported: String,
    pub local: String,
}

impl ImportBinding {
    pub fn new(imported: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            imported: imported.into(),
            local: local.into(),
        }
    }

    pub fn is_namespace(&self) -> bool {
        self.imported == "*"
    }

    pub fn is_default(&self) -> bool {
        self.imported == "default"
    }
}

/// An import or re-export statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSpec {
    pub specifier: String,
    pub kind: ImportKind,
    #[serde(default)]
    pub bindings: Vec<ImportBinding>,
    /// `export ... from "x"`: names flow through this file to its importers.
    #[serde(default)]
    pub reexport: bool,
    pub line: u32,
}

impl ImportSpec {
    pub fn new(specifier: impl Into<String>, kind: ImportKind, line: u32) -> Self {
        Self {
            specifier: specifier.into(),
            kind,
            bindings: Vec::new(),
            reexport: false,
            line,
        }
    }

    pub fn with_binding(mut self, imported: impl Into<String>, local: impl Into<String>) -> Self {
        self.bindings.push(ImportBinding::new(imported, local));
        self
    }

    pub fn as_reexport(mut self) -> Self {
        self.reexport = true;
        self
    }
}

/// A call expression: `callee(...)` or `receiver.callee(...)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub callee: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver: Option<String>,
    pub range: Range,
}

impl CallSite {
    pub fn new(callee: impl Into<String>, range: Range) -> Self {
        Self {
            callee: callee.into(),
            receiver: None,
            range,
        }
    }

    pub fn with_receiver(mut self, receiver: impl Into<String>) -> Self {
        self.receiver = Some(receiver.into());
        self
    }
}

/// Everything the index needs from one parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub symbols: Vec<Symbol>,
    pub imports: Vec<ImportSpec>,
    pub call_sites: Vec<CallSite>,
}

impl ParsedFile {
    /// Names this file exports.
    pub fn exports(&self) -> Vec<String> {
        self.symbols
            .iter()
            .filter(|s| s.exported)
            .map(|s| s.name.clone())
            .collect()
    }
}

/// Capability that turns source text into structural facts.
pub trait LanguageAdapter: Send + Sync {
    /// Adapter name for logging.
    fn name(&self) -> &str;

    /// Whether this adapter understands the file at all.
    fn supports(&self, path: &FilePath) -> bool;

    /// Parse a file. `ParseError::Unsupported` makes the file symbol-less.
    fn parse(&self, path: &FilePath, source: &str) -> ParseResult<ParsedFile>;
}
