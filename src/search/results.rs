//! Post-processing of ranked matches into the response shape.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashSet;

use super::ranking::{MatchLocation, ScoredMatch};
use crate::types::FilePath;

/// Secondary match folded into a grouped result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineMatch {
    pub line: u32,
    pub score: f64,
    pub location: MatchLocation,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub file: FilePath,
    pub line: u32,
    pub score: f64,
    pub location: MatchLocation,
    pub preview: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// All matches of the file, best first, when grouping by file
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub grouped_matches: Vec<LineMatch>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
    /// A read budget or the timeout cut document loading short
    pub degraded: bool,
    /// More results existed than `max_results`
    pub truncated: bool,
    pub candidate_count: usize,
}

/// Knobs for [`process`], resolved from options and config.
#[derive(Debug, Clone)]
pub struct PostProcess {
    /// Extensions to keep, without the dot; empty keeps everything
    pub file_types: Vec<String>,
    pub group_by_file: bool,
    pub snippet_chars: usize,
    pub max_results: usize,
}

/// Cut `text` to `max_chars` characters, marking the cut with `…`.
pub fn truncate_snippet(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

fn dedup_key(m: &ScoredMatch) -> String {
    let normalized = m.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        format!("{}:{}", m.file, m.line)
    } else {
        normalized
    }
}

/// Filter, dedup, group, truncate. Returns the results and whether
/// `max_results` cut anything off.
pub fn process(matches: Vec<ScoredMatch>, opts: &PostProcess) -> (Vec<SearchResult>, bool) {
    let file_types: Vec<String> = opts
        .file_types
        .iter()
        .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
        .collect();

    let mut seen = HashSet::new();
    let kept: Vec<ScoredMatch> = matches
        .into_iter()
        .filter(|m| {
            file_types.is_empty()
                || m.file
                    .extension()
                    .is_some_and(|ext| file_types.contains(&ext.to_ascii_lowercase()))
        })
        .filter(|m| seen.insert(dedup_key(m)))
        .collect();

    let mut results: Vec<SearchResult> = if opts.group_by_file {
        group_by_file(kept, opts.snippet_chars)
    } else {
        kept.into_iter()
            .map(|m| to_result(m, opts.snippet_chars))
            .collect()
    };

    let truncated = results.len() > opts.max_results;
    results.truncate(opts.max_results);
    (results, truncated)
}

fn to_result(m: ScoredMatch, snippet_chars: usize) -> SearchResult {
    SearchResult {
        preview: truncate_snippet(&m.text, snippet_chars),
        file: m.file,
        line: m.line,
        score: m.score,
        location: m.location,
        symbol: m.symbol,
        grouped_matches: Vec::new(),
    }
}

/// One result per file, led by its best match. Input is already sorted,
/// so first-seen order is score order.
fn group_by_file(matches: Vec<ScoredMatch>, snippet_chars: usize) -> Vec<SearchResult> {
    let mut groups: IndexMap<FilePath, Vec<ScoredMatch>> = IndexMap::new();
    for m in matches {
        groups.entry(m.file.clone()).or_default().push(m);
    }

    groups
        .into_values()
        .filter_map(|group| {
            let grouped: Vec<LineMatch> = group
                .iter()
                .map(|m| LineMatch {
                    line: m.line,
                    score: m.score,
                    location: m.location,
                    preview: truncate_snippet(&m.text, snippet_chars),
                })
                .collect();
            let best = group.into_iter().next()?;
            let mut result = to_result(best, snippet_chars);
            result.grouped_matches = grouped;
            Some(result)
        })
        .collect()
}
