use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;

use crate::error::{IndexError, IndexResult};

/// Canonical, root-relative, slash-normalized file identifier.
///
/// Every index keys on this form. Construction folds `.` and `..` segments
/// lexically and rejects anything that would climb above the repository root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FilePath(String);

impl FilePath {
    /// Build from a root-relative path string (either separator accepted).
    pub fn new(relative: &str) -> IndexResult<Self> {
        let normalized = relative.replace('\\', "/");
        let mut segments: Vec<&str> = Vec::new();

        for segment in normalized.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(IndexError::PathOutsideRoot {
                            path: relative.to_string(),
                        });
                    }
                }
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(IndexError::InvalidPath {
                path: relative.to_string(),
                reason: "path does not name a file".to_string(),
            });
        }

        Ok(Self(segments.join("/")))
    }

    /// Build from an absolute (or root-joined) filesystem path.
    pub fn from_absolute(root: &Path, path: &Path) -> IndexResult<Self> {
        let relative = lexical_relative(root, path).ok_or_else(|| IndexError::PathOutsideRoot {
            path: path.display().to_string(),
        })?;
        Self::new(&relative)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Join onto a repository root.
    pub fn to_path(&self, root: &Path) -> PathBuf {
        root.join(&self.0)
    }

    /// Final segment, e.g. `button.tsx`.
    pub fn file_name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// File name without its last extension, e.g. `button`.
    pub fn file_stem(&self) -> &str {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => name,
            Some(idx) => &name[..idx],
        }
    }

    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name();
        match name.rfind('.') {
            Some(0) | None => None,
            Some(idx) => Some(&name[idx + 1..]),
        }
    }

    /// Directory part, empty for files at the root.
    pub fn dir_name(&self) -> &str {
        match self.0.rfind('/') {
            Some(idx) => &self.0[..idx],
            None => "",
        }
    }

    /// Number of directories between the root and this file.
    pub fn depth(&self) -> usize {
        self.0.matches('/').count()
    }

    /// True when this file lives under `dir` (a root-relative directory).
    pub fn is_within(&self, dir: &str) -> bool {
        let dir = dir.trim_matches('/');
        if dir.is_empty() {
            return true;
        }
        self.0.len() > dir.len() && self.0.starts_with(dir) && self.0.as_bytes()[dir.len()] == b'/'
    }
}

impl fmt::Display for FilePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FilePath {
    type Error = IndexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<FilePath> for String {
    fn from(value: FilePath) -> Self {
        value.0
    }
}

/// Strip `root` from `path` after folding `.`/`..` in both, without touching the filesystem.
fn lexical_relative(root: &Path, path: &Path) -> Option<String> {
    let root = lexical_normalize(root);
    let path = lexical_normalize(path);
    let relative = path.strip_prefix(&root).ok()?;
    Some(relative.to_string_lossy().replace('\\', "/"))
}

pub(crate) fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push("..");
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Byte and line span of a syntax element. Lines are 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start_byte: u32,
    pub end_byte: u32,
    pub start_line: u32,
    pub end_line: u32,
}

impl Range {
    pub fn new(start_byte: u32, end_byte: u32, start_line: u32, end_line: u32) -> Self {
        Self {
            start_byte,
            end_byte,
            start_line,
            end_line,
        }
    }

    /// Interval containment on byte offsets.
    pub fn contains(&self, other: &Range) -> bool {
        self.start_byte <= other.start_byte && other.end_byte <= self.end_byte
    }

    pub fn contains_line(&self, line: u32) -> bool {
        self.start_line <= line && line <= self.end_line
    }

    pub fn len(&self) -> u32 {
        self.end_byte.saturating_sub(self.start_byte)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    Function,
    Method,
    Class,
    Interface,
    TypeAlias,
    Enum,
    Variable,
    Constant,
    Module,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SymbolKind::Function => "function",
            SymbolKind::Method => "method",
            SymbolKind::Class => "class",
            SymbolKind::Interface => "interface",
            SymbolKind::TypeAlias => "type",
            SymbolKind::Enum => "enum",
            SymbolKind::Variable => "variable",
            SymbolKind::Constant => "constant",
            SymbolKind::Module => "module",
        };
        f.write_str(name)
    }
}

/// A declared symbol as reported by the language adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub range: Range,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,
    #[serde(default)]
    pub exported: bool,
    #[serde(default)]
    pub default_export: bool,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymbolKind, range: Range) -> Self {
        Self {
            name: name.into(),
            kind,
            range,
            signature: None,
            doc: None,
            exported: false,
            default_export: false,
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn exported(mut self) -> Self {
        self.exported = true;
        self
    }

    /// `export default`; implies exported.
    pub fn default_export(mut self) -> Self {
        self.exported = true;
        self.default_export = true;
        self
    }
}

/// Stable composite key: the declaring file plus the symbol name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SymbolId {
    pub file: FilePath,
    pub name: String,
}

impl SymbolId {
    pub fn new(file: FilePath, name: impl Into<String>) -> Self {
        Self {
            file,
            name: name.into(),
        }
    }
}

impl fmt::Display for SymbolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.file, self.name)
    }
}

/// Traversal direction for graph queries.
///
/// `Outgoing` follows edges away from the start node (downstream: what it
/// imports or calls). `Incoming` follows them backwards (upstream: who
/// imports or calls it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[serde(alias = "downstream")]
    Outgoing,
    #[serde(alias = "upstream")]
    Incoming,
}

impl FromStr for Direction {
    type Err = IndexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "outgoing" | "downstream" | "out" => Ok(Direction::Outgoing),
            "incoming" | "upstream" | "in" => Ok(Direction::Incoming),
            other => Err(IndexError::InvalidArgument(format!(
                "unknown direction '{other}', expected outgoing or incoming"
            ))),
        }
    }
}
