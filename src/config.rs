//! Configuration module for reposcope.
//!
//! This module provides a layered configuration system that supports:
//! - Default values
//! - TOML configuration file
//! - Environment variable overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `RS_` and use double underscores
//! to separate nested levels:
//! - `RS_INDEXING__CONCURRENCY=8` sets `indexing.concurrency`
//! - `RS_SEARCH__BM25__K1=1.5` sets `search.bm25.k1`
//! - `RS_RESOLUTION__BUNDLER_ROOT=src` sets `resolution.bundler_root`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Directory holding the settings file and the default index location.
pub const CONFIG_DIR: &str = ".reposcope";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    /// Path to the index directory (relative paths are joined onto the root)
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,

    /// Workspace root directory (where .reposcope is located)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workspace_root: Option<PathBuf>,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub resolution: ResolutionConfig,

    #[serde(default)]
    pub search: SearchConfig,

    #[serde(default)]
    pub watch: WatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IndexingConfig {
    /// Upper bound on concurrent per-file work (stat, read, parse)
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Parse budget per file
    #[serde(default = "default_parse_timeout_ms")]
    pub parse_timeout_ms: u64,

    /// Files larger than this are skipped during discovery
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// File extensions picked up by discovery (without the dot)
    #[serde(default = "default_index_extensions")]
    pub extensions: Vec<String>,

    /// Patterns to ignore during indexing (gitignore syntax)
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,

    /// Persist a snapshot after cold start and on demand
    #[serde(default = "default_true")]
    pub persist: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ResolutionConfig {
    /// Extensions tried for extensionless specifiers, in priority order
    #[serde(default = "default_resolution_extensions")]
    pub extensions: Vec<String>,

    /// Project config files searched for path aliases, nearest ancestor wins
    #[serde(default = "default_config_files")]
    pub config_files: Vec<String>,

    /// Root-relative directory for bundler-style bare specifiers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundler_root: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchConfig {
    #[serde(default = "default_trigram_candidates")]
    pub max_trigram_candidates: usize,

    #[serde(default = "default_filename_candidates")]
    pub max_filename_candidates: usize,

    #[serde(default = "default_symbol_candidates")]
    pub max_symbol_candidates: usize,

    /// Below this many candidates the fallback slice is added
    #[serde(default = "default_min_candidates")]
    pub min_candidates: usize,

    #[serde(default = "default_fallback_candidates")]
    pub fallback_candidates: usize,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Total bytes read across candidates per query
    #[serde(default = "default_max_bytes_read")]
    pub max_bytes_read: usize,

    #[serde(default = "default_snippet_chars")]
    pub snippet_chars: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    #[serde(default)]
    pub bm25: Bm25Config,

    #[serde(default)]
    pub weights: FieldWeights,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct Bm25Config {
    #[serde(default = "default_k1")]
    pub k1: f64,
    #[serde(default = "default_b")]
    pub b: f64,
}

/// Multipliers keyed by where a match line sits.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct FieldWeights {
    #[serde(default = "default_weight_definition")]
    pub symbol_definition: f64,
    #[serde(default = "default_weight_signature")]
    pub signature: f64,
    #[serde(default = "default_weight_exported")]
    pub exported_member: f64,
    #[serde(default = "default_weight_body")]
    pub code_body: f64,
    #[serde(default = "default_weight_comment")]
    pub comment: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct WatchConfig {
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default level: error, warn, info, debug, trace
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module overrides, e.g. `reposcope::indexing = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

// Default value functions
fn default_version() -> u32 {
    1
}
fn default_index_path() -> PathBuf {
    PathBuf::from(".reposcope/index")
}
fn default_concurrency() -> usize {
    num_cpus::get().clamp(1, 16)
}
fn default_parse_timeout_ms() -> u64 {
    5_000
}
fn default_max_file_size() -> u64 {
    2 * 1024 * 1024
}
fn default_true() -> bool {
    true
}
fn default_index_extensions() -> Vec<String> {
    ["ts", "tsx", "mts", "cts", "js", "jsx", "mjs", "cjs", "json"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_ignore_patterns() -> Vec<String> {
    vec![
        "node_modules/**".to_string(),
        ".git/**".to_string(),
        "dist/**".to_string(),
        "build/**".to_string(),
        ".reposcope/**".to_string(),
    ]
}
fn default_resolution_extensions() -> Vec<String> {
    [
        ".ts", ".tsx", ".d.ts", ".mts", ".cts", ".js", ".jsx", ".mjs", ".cjs", ".json",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
fn default_config_files() -> Vec<String> {
    vec!["tsconfig.json".to_string(), "jsconfig.json".to_string()]
}
fn default_trigram_candidates() -> usize {
    500
}
fn default_filename_candidates() -> usize {
    200
}
fn default_symbol_candidates() -> usize {
    200
}
fn default_min_candidates() -> usize {
    20
}
fn default_fallback_candidates() -> usize {
    100
}
fn default_max_results() -> usize {
    50
}
fn default_max_bytes_read() -> usize {
    16 * 1024 * 1024
}
fn default_snippet_chars() -> usize {
    160
}
fn default_k1() -> f64 {
    1.2
}
fn default_b() -> f64 {
    0.75
}
fn default_weight_definition() -> f64 {
    3.0
}
fn default_weight_signature() -> f64 {
    2.0
}
fn default_weight_exported() -> f64 {
    1.5
}
fn default_weight_body() -> f64 {
    1.0
}
fn default_weight_comment() -> f64 {
    0.5
}
fn default_debounce_ms() -> u64 {
    500
}
fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            index_path: default_index_path(),
            workspace_root: None,
            indexing: IndexingConfig::default(),
            resolution: ResolutionConfig::default(),
            search: SearchConfig::default(),
            watch: WatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            concurrency: default_concurrency(),
            parse_timeout_ms: default_parse_timeout_ms(),
            max_file_size: default_max_file_size(),
            extensions: default_index_extensions(),
            ignore_patterns: default_ignore_patterns(),
            persist: true,
        }
    }
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            extensions: default_resolution_extensions(),
            config_files: default_config_files(),
            bundler_root: None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_trigram_candidates: default_trigram_candidates(),
            max_filename_candidates: default_filename_candidates(),
            max_symbol_candidates: default_symbol_candidates(),
            min_candidates: default_min_candidates(),
            fallback_candidates: default_fallback_candidates(),
            max_results: default_max_results(),
            max_bytes_read: default_max_bytes_read(),
            snippet_chars: default_snippet_chars(),
            timeout_ms: None,
            bm25: Bm25Config::default(),
            weights: FieldWeights::default(),
        }
    }
}

impl Default for Bm25Config {
    fn default() -> Self {
        Self {
            k1: default_k1(),
            b: default_b(),
        }
    }
}

impl Default for FieldWeights {
    fn default() -> Self {
        Self {
            symbol_definition: default_weight_definition(),
            signature: default_weight_signature(),
            exported_member: default_weight_exported(),
            code_body: default_weight_body(),
            comment: default_weight_comment(),
        }
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join("settings.toml"));

        Self::figment(&config_path)
            .extract()
            .map_err(Box::new)
            .map(|mut settings: Settings| {
                if settings.workspace_root.is_none() {
                    settings.workspace_root = Self::workspace_root();
                }
                settings
            })
    }

    /// Load configuration from a specific file (env overrides still apply)
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref()).extract().map_err(Box::new)
    }

    fn figment(config_path: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore separates nested levels; single underscores stay in field names
            .merge(Env::prefixed("RS_").map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for .reposcope from the current directory up
    fn find_workspace_config() -> Option<PathBuf> {
        Self::workspace_root().map(|root| root.join(CONFIG_DIR).join("settings.toml"))
    }

    /// Get the workspace root directory (where .reposcope is located)
    pub fn workspace_root() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        current
            .ancestors()
            .find(|ancestor| ancestor.join(CONFIG_DIR).is_dir())
            .map(Path::to_path_buf)
    }

    /// Index directory for a repository root.
    pub fn index_dir(&self, root: &Path) -> PathBuf {
        if self.index_path.is_absolute() {
            self.index_path.clone()
        } else {
            root.join(&self.index_path)
        }
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }
}
