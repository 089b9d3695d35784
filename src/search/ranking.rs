//! Scoring of candidate documents.
//!
//! Each matching line gets `bm25(file) × filename × depth × location`.
//! BM25 statistics (document frequency, average length) are computed over
//! the candidate set only, so scores are comparable within one query and
//! nowhere else.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::{Bm25Config, FieldWeights};
use crate::types::{FilePath, Symbol};

/// Where in a file a match line sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLocation {
    SymbolDefinition,
    Signature,
    ExportedMember,
    CodeBody,
    Comment,
}

impl MatchLocation {
    pub fn weight(self, weights: &FieldWeights) -> f64 {
        match self {
            MatchLocation::SymbolDefinition => weights.symbol_definition,
            MatchLocation::Signature => weights.signature,
            MatchLocation::ExportedMember => weights.exported_member,
            MatchLocation::CodeBody => weights.code_body,
            MatchLocation::Comment => weights.comment,
        }
    }
}

/// A candidate file with the text that was actually read.
#[derive(Debug, Clone)]
pub struct Document {
    pub file: FilePath,
    pub text: String,
    pub symbols: Vec<Symbol>,
}

/// One scored line, before post-processing.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredMatch {
    pub file: FilePath,
    pub line: u32,
    pub score: f64,
    pub location: MatchLocation,
    pub text: String,
    /// Innermost symbol whose range covers the line
    pub symbol: Option<String>,
}

/// Lowercased alphanumeric runs; `_` and `$` count as word characters.
fn tokens(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .filter(|token| !token.is_empty())
}

fn occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Term frequency of each keyword in a document: body text plus path.
fn term_frequencies(doc: &Document, keywords: &[String]) -> Vec<usize> {
    let text = doc.text.to_lowercase();
    let path = doc.file.as_str().to_lowercase();
    keywords
        .iter()
        .map(|keyword| occurrences(&text, keyword) + occurrences(&path, keyword))
        .collect()
}

/// BM25 score per document, in input order. `keywords` must be lowercase.
pub fn bm25_scores(docs: &[Document], keywords: &[String], params: &Bm25Config) -> Vec<f64> {
    if docs.is_empty() {
        return Vec::new();
    }

    let lengths: Vec<f64> = docs.iter().map(|doc| tokens(&doc.text).count() as f64).collect();
    let avgdl = (lengths.iter().sum::<f64>() / docs.len() as f64).max(1.0);
    let frequencies: Vec<Vec<usize>> = docs
        .iter()
        .map(|doc| term_frequencies(doc, keywords))
        .collect();

    let n = docs.len() as f64;
    let idf: Vec<f64> = (0..keywords.len())
        .map(|term| {
            let df = frequencies.iter().filter(|tf| tf[term] > 0).count() as f64;
            ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
        })
        .collect();

    frequencies
        .iter()
        .zip(&lengths)
        .map(|(tf, &dl)| {
            tf.iter()
                .zip(&idf)
                .filter(|(tf, _)| **tf > 0)
                .map(|(&tf, idf)| {
                    let tf = tf as f64;
                    let norm = params.k1 * (1.0 - params.b + params.b * dl / avgdl);
                    idf * tf * (params.k1 + 1.0) / (tf + norm)
                })
                .sum()
        })
        .collect()
}

/// 10 when a keyword is the file's basename or stem, 5 when the basename
/// contains one, 1 otherwise.
pub fn filename_multiplier(file: &FilePath, keywords: &[String]) -> f64 {
    let name = file.file_name().to_lowercase();
    let stem = file.file_stem().to_lowercase();

    if keywords.iter().any(|k| *k == name || *k == stem) {
        10.0
    } else if keywords.iter().any(|k| name.contains(k.as_str())) {
        5.0
    } else {
        1.0
    }
}

/// Shallower files win ties: `1 / (depth + 1)`.
pub fn depth_multiplier(file: &FilePath) -> f64 {
    1.0 / (file.depth() as f64 + 1.0)
}

fn is_comment(line: &str) -> bool {
    let trimmed = line.trim_start();
    if trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with("#!") {
        return true;
    }
    // Block comment continuation (` * text`, ` */`), not a generator method (`*items() {`)
    match trimmed.strip_prefix('*') {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace) || rest.starts_with('/'),
        None => false,
    }
}

fn is_export(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("export ")
        || trimmed.starts_with("module.exports")
        || trimmed.starts_with("exports.")
}

/// Classify a 1-based line of a document. Checked in order: comment,
/// definition of a matching symbol, any declaration head, export, body.
pub fn classify_line(
    line_no: u32,
    line: &str,
    symbols: &[Symbol],
    keywords: &[String],
) -> MatchLocation {
    if is_comment(line) {
        return MatchLocation::Comment;
    }

    let heads: Vec<&Symbol> = symbols
        .iter()
        .filter(|symbol| symbol.range.start_line == line_no)
        .collect();

    let defines_match = heads.iter().any(|symbol| {
        let name = symbol.name.to_lowercase();
        keywords.iter().any(|k| name.contains(k.as_str()))
    });
    if defines_match {
        MatchLocation::SymbolDefinition
    } else if !heads.is_empty() {
        MatchLocation::Signature
    } else if is_export(line) {
        MatchLocation::ExportedMember
    } else {
        MatchLocation::CodeBody
    }
}

fn enclosing_name(symbols: &[Symbol], line_no: u32) -> Option<String> {
    symbols
        .iter()
        .filter(|symbol| symbol.range.contains_line(line_no))
        .min_by_key(|symbol| symbol.range.len())
        .map(|symbol| symbol.name.clone())
}

/// Score every matching line of every document and sort descending.
///
/// The sort is stable: equal scores keep document order, then line order.
/// A document matched only through its path contributes its first line.
pub fn rank(
    docs: &[Document],
    keywords: &[String],
    params: &Bm25Config,
    weights: &FieldWeights,
) -> Vec<ScoredMatch> {
    let scores = bm25_scores(docs, keywords, params);
    let mut matches = Vec::new();

    for (doc, bm25) in docs.iter().zip(scores) {
        if bm25 <= 0.0 {
            continue;
        }
        let file_score = bm25 * filename_multiplier(&doc.file, keywords) * depth_multiplier(&doc.file);

        let mut matched_line = false;
        for (idx, line) in doc.text.lines().enumerate() {
            let lowered = line.to_lowercase();
            if !keywords.iter().any(|k| lowered.contains(k.as_str())) {
                continue;
            }
            matched_line = true;
            let line_no = idx as u32 + 1;
            let location = classify_line(line_no, line, &doc.symbols, keywords);
            matches.push(ScoredMatch {
                file: doc.file.clone(),
                line: line_no,
                score: file_score * location.weight(weights),
                location,
                text: line.trim().to_string(),
                symbol: enclosing_name(&doc.symbols, line_no),
            });
        }

        if !matched_line {
            let (idx, first) = doc
                .text
                .lines()
                .enumerate()
                .find(|(_, line)| !line.trim().is_empty())
                .unwrap_or((0, ""));
            matches.push(ScoredMatch {
                file: doc.file.clone(),
                line: idx as u32 + 1,
                score: file_score * MatchLocation::CodeBody.weight(weights),
                location: MatchLocation::CodeBody,
                text: first.trim().to_string(),
                symbol: None,
            });
        }
    }

    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches
}
