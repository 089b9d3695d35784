//! tsconfig.json / jsconfig.json loading for path alias resolution
//!
//! Handles JSONC parsing, `extends` chains and compilation of `paths`
//! patterns into rules. Every path in the result is absolute: `baseUrl` and
//! `paths` targets are anchored to the config file that declared them, so a
//! parent config pulled in through `extends` keeps its own anchoring.

use indexmap::IndexMap;
use serde::Deserialize;
use std::cmp::Reverse;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::error::{ResolutionError, ResolutionResult};
use crate::types::lexical_normalize;

/// `extends` is a string, or an array of strings since TypeScript 5.0.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Extends {
    One(String),
    Many(Vec<String>),
}

impl Extends {
    pub fn entries(&self) -> Vec<&str> {
        match self {
            Extends::One(one) => vec![one.as_str()],
            Extends::Many(many) => many.iter().map(String::as_str).collect(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CompilerOptions {
    #[serde(rename = "baseUrl")]
    pub base_url: Option<String>,

    #[serde(default)]
    pub paths: HashMap<String, Vec<String>>,
}

/// The subset of a project config that matters for module resolution.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct TsConfig {
    pub extends: Option<Extends>,

    #[serde(default, rename = "compilerOptions")]
    pub compiler_options: CompilerOptions,
}

/// JSONC parsing via serde_json5 (comments, trailing commas).
pub fn parse_tsconfig(path: &Path, content: &str) -> ResolutionResult<TsConfig> {
    serde_json5::from_str(content).map_err(|e| ResolutionError::invalid_config(path, e.to_string()))
}

pub fn read_tsconfig(path: &Path) -> ResolutionResult<TsConfig> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ResolutionError::config_io(path, e))?;
    parse_tsconfig(path, &content)
}

/// One `paths` entry with the directory its targets are relative to.
#[derive(Debug, Clone, PartialEq)]
pub struct AliasEntry {
    pub base: PathBuf,
    pub targets: Vec<String>,
}

/// A config after its `extends` chain has been applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectiveConfig {
    pub base_url: Option<PathBuf>,
    pub paths: IndexMap<String, AliasEntry>,
}

impl EffectiveConfig {
    fn from_options(config_dir: &Path, options: &CompilerOptions) -> Self {
        let base_url = options
            .base_url
            .as_ref()
            .map(|base| lexical_normalize(&config_dir.join(base)));
        let anchor = base_url.clone().unwrap_or_else(|| config_dir.to_path_buf());

        let mut patterns: Vec<_> = options.paths.iter().collect();
        patterns.sort_by(|a, b| a.0.cmp(b.0));
        let paths = patterns
            .into_iter()
            .map(|(pattern, targets)| {
                (
                    pattern.clone(),
                    AliasEntry {
                        base: anchor.clone(),
                        targets: targets.clone(),
                    },
                )
            })
            .collect();

        Self { base_url, paths }
    }

    /// Child values override the parent's.
    fn merge(mut self, child: EffectiveConfig) -> Self {
        self.base_url = child.base_url.or(self.base_url);
        self.paths.extend(child.paths);
        self
    }
}

/// Load a config and everything it extends.
pub fn load_effective_config(path: &Path) -> ResolutionResult<EffectiveConfig> {
    let mut visited = HashSet::new();
    resolve_extends_chain(path, &mut visited)
}

/// Follow `extends` depth-first. Parents are merged in listed order and the
/// extending config wins. A parent that fails to load (missing, malformed,
/// circular) is logged and skipped.
fn resolve_extends_chain(
    path: &Path,
    visited: &mut HashSet<PathBuf>,
) -> ResolutionResult<EffectiveConfig> {
    let canonical = path
        .canonicalize()
        .map_err(|e| ResolutionError::config_io(path, e))?;

    if !visited.insert(canonical.clone()) {
        return Err(ResolutionError::CircularExtends { path: canonical });
    }

    let config = read_tsconfig(&canonical)?;
    let config_dir = canonical.parent().unwrap_or(Path::new("/")).to_path_buf();

    let mut effective = EffectiveConfig::default();
    if let Some(extends) = &config.extends {
        for entry in extends.entries() {
            let Some(parent_path) = extends_target(&config_dir, entry) else {
                tracing::debug!(
                    "[resolver] unresolvable extends '{entry}' in {}",
                    canonical.display()
                );
                continue;
            };
            match resolve_extends_chain(&parent_path, visited) {
                Ok(parent) => effective = effective.merge(parent),
                Err(e) => tracing::warn!(
                    "[resolver] skipping extends '{entry}' of {}: {e}",
                    canonical.display()
                ),
            }
        }
    }

    visited.remove(&canonical);
    Ok(effective.merge(EffectiveConfig::from_options(
        &config_dir,
        &config.compiler_options,
    )))
}

/// Locate the file named by an `extends` entry.
fn extends_target(config_dir: &Path, entry: &str) -> Option<PathBuf> {
    let with_json = |path: PathBuf| {
        if path.extension().is_none() {
            path.with_extension("json")
        } else {
            path
        }
    };

    if entry.starts_with('.') || Path::new(entry).is_absolute() {
        return Some(with_json(config_dir.join(entry)));
    }

    // Package configs: walk node_modules upwards like the compiler does
    for dir in config_dir.ancestors() {
        let package = dir.join("node_modules").join(entry);
        let candidates = [with_json(package.clone()), package.join("tsconfig.json")];
        if let Some(found) = candidates.into_iter().find(|c| c.is_file()) {
            return Some(found);
        }
    }
    None
}

/// Compiled `paths` pattern.
#[derive(Debug)]
pub struct PathRule {
    /// Original pattern (e.g., "@components/*")
    pub pattern: String,
    /// Target templates (e.g., ["src/components/*"]), tried in order
    pub targets: Vec<String>,
    base: PathBuf,
    regex: regex::Regex,
}

impl PathRule {
    pub fn new(pattern: String, entry: AliasEntry) -> ResolutionResult<Self> {
        // "@components/*" becomes "^@components/(.*)$"
        let regex_pattern = format!(
            "^{}$",
            regex::escape(&pattern.replacen('*', "(.*)", 1)).replace("\\(\\.\\*\\)", "(.*)")
        );

        let regex = regex::Regex::new(&regex_pattern).map_err(|e| ResolutionError::InvalidPattern {
            pattern: pattern.clone(),
            reason: e.to_string(),
        })?;

        if entry.targets.is_empty() {
            return Err(ResolutionError::InvalidPattern {
                pattern,
                reason: "no targets".to_string(),
            });
        }

        Ok(Self {
            pattern,
            targets: entry.targets,
            base: entry.base,
            regex,
        })
    }

    pub fn matches(&self, specifier: &str) -> bool {
        self.regex.is_match(specifier)
    }

    /// Absolute candidate paths for a specifier, one per target.
    pub fn candidates(&self, specifier: &str) -> Vec<PathBuf> {
        let Some(captures) = self.regex.captures(specifier) else {
            return Vec::new();
        };
        let captured = captures.get(1).map_or("", |m| m.as_str());

        self.targets
            .iter()
            .map(|target| lexical_normalize(&self.base.join(target.replacen('*', captured, 1))))
            .collect()
    }
}

/// Alias rules of one config file, most specific first.
#[derive(Debug)]
pub struct AliasTable {
    pub config_path: PathBuf,
    pub base_url: Option<PathBuf>,
    rules: Vec<PathRule>,
}

impl AliasTable {
    pub fn load(config_path: &Path) -> ResolutionResult<Self> {
        let effective = load_effective_config(config_path)?;
        Self::from_effective(config_path, effective)
    }

    pub fn from_effective(config_path: &Path, config: EffectiveConfig) -> ResolutionResult<Self> {
        let mut rules = Vec::with_capacity(config.paths.len());
        for (pattern, entry) in config.paths {
            match PathRule::new(pattern, entry) {
                Ok(rule) => rules.push(rule),
                Err(e) => tracing::warn!("[resolver] {}: {e}", config_path.display()),
            }
        }

        // Longer patterns with fewer wildcards win; pattern text breaks ties
        rules.sort_by(|a, b| {
            let key = |r: &PathRule| (Reverse(r.pattern.len()), r.pattern.matches('*').count());
            key(a).cmp(&key(b)).then_with(|| a.pattern.cmp(&b.pattern))
        });

        Ok(Self {
            config_path: config_path.to_path_buf(),
            base_url: config.base_url,
            rules,
        })
    }

    pub fn rules(&self) -> &[PathRule] {
        &self.rules
    }

    /// Candidates from every matching rule, in rule then target order.
    pub fn candidates(&self, specifier: &str) -> Vec<PathBuf> {
        self.rules
            .iter()
            .flat_map(|rule| rule.candidates(specifier))
            .collect()
    }
}
