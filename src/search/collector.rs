//! Candidate collection for hybrid search.
//!
//! Sources are consulted in a fixed order and merged first-seen, so the
//! candidate list (and everything ranked from it) is deterministic.

use indexmap::IndexMap;
use serde::Serialize;

use crate::config::SearchConfig;
use crate::symbol::SymbolIndex;
use crate::trigram::TrigramIndex;
use crate::types::FilePath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateSource {
    Trigram,
    Filename,
    Symbol,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub file: FilePath,
    pub source: CandidateSource,
}

#[derive(Default)]
struct CandidateSet(IndexMap<FilePath, CandidateSource>);

impl CandidateSet {
    fn add(&mut self, file: &FilePath, source: CandidateSource) {
        if !self.0.contains_key(file) {
            self.0.insert(file.clone(), source);
        }
    }

    fn len(&self) -> usize {
        self.0.len()
    }
}

/// True when every keyword appears in the basename, the directory or the
/// full path. `keywords` must be lowercase.
fn filename_matches(file: &FilePath, keywords: &[String]) -> bool {
    let name = file.file_name().to_lowercase();
    let dir = file.dir_name().to_lowercase();
    let full = file.as_str().to_lowercase();
    keywords.iter().all(|k| {
        name.contains(k.as_str()) || dir.contains(k.as_str()) || full.contains(k.as_str())
    })
}

/// Collect candidate files for `keywords` (lowercase, non-empty).
///
/// `known_files` is every indexed file in path order; it feeds filename
/// matching and the fallback slice.
pub fn collect_candidates<'a>(
    symbols: &SymbolIndex,
    trigrams: &TrigramIndex,
    known_files: impl Iterator<Item = &'a FilePath> + Clone,
    keywords: &[String],
    config: &SearchConfig,
) -> Vec<Candidate> {
    let mut set = CandidateSet::default();

    let joined = keywords.join(" ");
    let mut trigram_hits = trigrams.search(&joined, config.max_trigram_candidates);
    if keywords.len() > 1 {
        for keyword in keywords {
            let room = config.max_trigram_candidates.saturating_sub(trigram_hits.len());
            if room == 0 {
                break;
            }
            for hit in trigrams.search(keyword, room) {
                if !trigram_hits.iter().any(|h| h.file == hit.file) {
                    trigram_hits.push(hit);
                }
            }
        }
    }
    for hit in &trigram_hits {
        set.add(&hit.file, CandidateSource::Trigram);
    }

    known_files
        .clone()
        .filter(|file| filename_matches(file, keywords))
        .take(config.max_filename_candidates)
        .for_each(|file| set.add(file, CandidateSource::Filename));

    let mut symbol_hits = 0;
    for keyword in keywords {
        let room = config.max_symbol_candidates.saturating_sub(symbol_hits);
        for found in symbols.search_names(keyword, room) {
            set.add(found.file, CandidateSource::Symbol);
            symbol_hits += 1;
        }
    }

    if set.len() < config.min_candidates {
        crate::debug_event!(
            "search",
            "fallback",
            "{} candidates below minimum {}",
            set.len(),
            config.min_candidates
        );
        known_files
            .take(config.fallback_candidates)
            .for_each(|file| set.add(file, CandidateSource::Fallback));
    }

    set.0
        .into_iter()
        .map(|(file, source)| Candidate { file, source })
        .collect()
}
