//! Hybrid search: trigram/filename/symbol candidates ranked with BM25 and
//! structural boosts.
//!
//! Candidate collection runs against the in-memory index under the read
//! lock. Document text is then read from disk without holding any lock,
//! within a byte budget and an optional deadline.

pub mod collector;
pub mod ranking;
pub mod results;

pub use collector::{Candidate, CandidateSource, collect_candidates};
pub use ranking::{Document, MatchLocation, ScoredMatch};
pub use results::{LineMatch, PostProcess, SearchResponse, SearchResult};

use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::SearchConfig;
use crate::error::{IndexError, IndexResult};
use crate::types::{FilePath, Symbol};

/// Per-query overrides; unset fields fall back to `SearchConfig`.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    pub max_results: Option<usize>,
    /// Extensions to keep (`ts`, `.tsx`); empty keeps everything
    pub file_types: Vec<String>,
    pub group_by_file: bool,
    pub snippet_chars: Option<usize>,
    pub max_bytes_read: Option<usize>,
    pub timeout: Option<Duration>,
}

impl SearchOptions {
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = Some(max_results);
        self
    }

    pub fn grouped(mut self) -> Self {
        self.group_by_file = true;
        self
    }

    pub fn with_file_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.file_types = types.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn post_process(&self, config: &SearchConfig) -> PostProcess {
        PostProcess {
            file_types: self.file_types.clone(),
            group_by_file: self.group_by_file,
            snippet_chars: self.snippet_chars.unwrap_or(config.snippet_chars),
            max_results: self.max_results.unwrap_or(config.max_results),
        }
    }
}

/// Trim, lowercase and drop empty keywords. An empty result is an
/// invalid argument.
pub fn normalize_keywords<S: AsRef<str>>(keywords: &[S]) -> IndexResult<Vec<String>> {
    let normalized: Vec<String> = keywords
        .iter()
        .map(|k| k.as_ref().trim().to_lowercase())
        .filter(|k| !k.is_empty())
        .collect();

    if normalized.is_empty() {
        return Err(IndexError::InvalidArgument(
            "search needs at least one non-empty keyword".to_string(),
        ));
    }
    Ok(normalized)
}

/// Limits on how much text a query may load.
#[derive(Debug, Clone, Copy)]
pub struct ReadBudget {
    pub max_bytes: usize,
    pub deadline: Option<Instant>,
}

impl ReadBudget {
    pub fn new(options: &SearchOptions, config: &SearchConfig) -> Self {
        let timeout = options
            .timeout
            .or(config.timeout_ms.map(Duration::from_millis));
        Self {
            max_bytes: options.max_bytes_read.unwrap_or(config.max_bytes_read),
            deadline: timeout.map(|t| Instant::now() + t),
        }
    }
}

/// Read candidate documents in order until the budget runs out.
///
/// Returns the documents read and whether the budget cut the list short.
/// Files that vanished since indexing are skipped silently.
pub async fn read_documents(
    root: &Path,
    candidates: Vec<(FilePath, Vec<Symbol>)>,
    budget: ReadBudget,
) -> (Vec<Document>, bool) {
    let mut docs = Vec::with_capacity(candidates.len());
    let mut bytes_read = 0usize;

    for (file, symbols) in candidates {
        let path = file.to_path(root);
        let read = match budget.deadline {
            Some(deadline) => match tokio::time::timeout_at(deadline, tokio::fs::read(&path)).await {
                Ok(read) => read,
                Err(_) => {
                    crate::debug_event!("search", "timeout", "after {} documents", docs.len());
                    return (docs, true);
                }
            },
            None => tokio::fs::read(&path).await,
        };

        let bytes = match read {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!("[search] skipping {file}: {e}");
                continue;
            }
        };

        if bytes_read + bytes.len() > budget.max_bytes {
            crate::debug_event!(
                "search",
                "budget",
                "{bytes_read} bytes read, {file} would exceed {}",
                budget.max_bytes
            );
            return (docs, true);
        }
        bytes_read += bytes.len();

        docs.push(Document {
            file,
            text: String::from_utf8_lossy(&bytes).into_owned(),
            symbols,
        });
    }

    (docs, false)
}

/// Rank loaded documents and shape the response.
pub fn rank_documents(
    docs: &[Document],
    keywords: &[String],
    options: &SearchOptions,
    config: &SearchConfig,
    candidate_count: usize,
    degraded: bool,
) -> SearchResponse {
    let matches = ranking::rank(docs, keywords, &config.bm25, &config.weights);
    let (results, truncated) = results::process(matches, &options.post_process(config));
    SearchResponse {
        results,
        degraded,
        truncated,
        candidate_count,
    }
}
