//! Live structural model of a TypeScript/JavaScript repository.
//!
//! The index tracks symbols, import edges, call sites and trigram postings
//! per file, keeps them current as files change, and answers ranked hybrid
//! search and cycle-safe graph traversals.
//!
//! ```no_run
//! use std::sync::Arc;
//! use reposcope::{Direction, IncrementalIndexer, SearchOptions, Settings, TypeScriptAdapter};
//!
//! # async fn demo() -> reposcope::IndexResult<()> {
//! let indexer = IncrementalIndexer::new(
//!     ".",
//!     Arc::new(Settings::default()),
//!     Arc::new(TypeScriptAdapter::new()),
//! )?;
//! indexer.cold_start().await?;
//!
//! let hits = indexer.search(&["parseConfig"], &SearchOptions::default()).await?;
//! let file = indexer.file_path("src/app.ts")?;
//! let deps = indexer.transitive_dependencies(&file, Direction::Outgoing, Some(3));
//! # let _ = (hits, deps);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod indexing;
pub mod logging;
pub mod parsing;
pub mod relationship;
pub mod resolver;
pub mod search;
pub mod storage;
pub mod symbol;
pub mod trigram;
pub mod types;
pub mod utils;
pub mod watcher;

pub use config::Settings;
pub use error::{IndexError, IndexResult};
pub use indexing::{
    ColdStartStats, FileWalker, IncrementalIndexer, IndexStatus, UnresolvedImport, UpdateOutcome,
};
pub use parsing::{LanguageAdapter, ParseError, ParsedFile, TypeScriptAdapter};
pub use relationship::{CallAnalysis, CallGraph};
pub use resolver::ModuleResolver;
pub use search::{SearchOptions, SearchResponse, SearchResult};
pub use storage::{DependencyGraph, IndexPersistence, TransitiveResult};
pub use symbol::SymbolIndex;
pub use trigram::TrigramIndex;
pub use types::{Direction, FilePath, Range, Symbol, SymbolId, SymbolKind};
pub use watcher::{FileEvent, FileWatcher};
