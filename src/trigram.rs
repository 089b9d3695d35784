//! Trigram posting index for approximate full-text candidate retrieval.
//!
//! Every 3-byte window of a file (ASCII case-folded) maps to the sorted list
//! of offsets where it starts. A query matches a file only when all of its
//! trigrams line up at consecutive offsets, so hits are exact substring
//! occurrences without scanning file text.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::types::FilePath;

pub type Trigram = [u8; 3];

/// First verified occurrence of a query in a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrigramHit {
    pub file: FilePath,
    pub offset: u32,
}

#[derive(Debug, Default)]
pub struct TrigramIndex {
    postings: HashMap<Trigram, BTreeMap<FilePath, Vec<u32>>>,
    /// Distinct trigrams per file, for removal
    by_file: HashMap<FilePath, Vec<Trigram>>,
}

fn fold(text: &[u8]) -> Vec<u8> {
    text.iter().map(u8::to_ascii_lowercase).collect()
}

fn trigram_at(bytes: &[u8], i: usize) -> Trigram {
    [bytes[i], bytes[i + 1], bytes[i + 2]]
}

impl TrigramIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a file's postings with those of `text`.
    pub fn index_file(&mut self, file: &FilePath, text: &str) {
        self.remove_file(file);

        let bytes = fold(text.as_bytes());
        if bytes.len() < 3 {
            self.by_file.insert(file.clone(), Vec::new());
            return;
        }

        let mut offsets: HashMap<Trigram, Vec<u32>> = HashMap::new();
        for i in 0..=bytes.len() - 3 {
            offsets.entry(trigram_at(&bytes, i)).or_default().push(i as u32);
        }

        let distinct: Vec<Trigram> = offsets.keys().copied().collect();
        for (trigram, positions) in offsets {
            self.postings
                .entry(trigram)
                .or_default()
                .insert(file.clone(), positions);
        }
        self.by_file.insert(file.clone(), distinct);
    }

    pub fn remove_file(&mut self, file: &FilePath) -> bool {
        let Some(trigrams) = self.by_file.remove(file) else {
            return false;
        };
        for trigram in trigrams {
            if let Some(files) = self.postings.get_mut(&trigram) {
                files.remove(file);
                if files.is_empty() {
                    self.postings.remove(&trigram);
                }
            }
        }
        true
    }

    /// Files containing `query` contiguously, in path order, at most `cap`.
    pub fn search(&self, query: &str, cap: usize) -> Vec<TrigramHit> {
        let needle = fold(query.as_bytes());
        if needle.len() < 3 || cap == 0 {
            return Vec::new();
        }

        let windows: Vec<Trigram> = (0..=needle.len() - 3)
            .map(|i| trigram_at(&needle, i))
            .collect();

        let mut lists = Vec::with_capacity(windows.len());
        for trigram in &windows {
            match self.postings.get(trigram) {
                Some(files) => lists.push(files),
                None => return Vec::new(),
            }
        }

        // Drive the intersection from the rarest trigram
        let Some(rarest) = lists.iter().min_by_key(|files| files.len()) else {
            return Vec::new();
        };

        let mut hits = Vec::new();
        for file in rarest.keys() {
            if !lists.iter().all(|files| files.contains_key(file)) {
                continue;
            }
            if let Some(offset) = first_aligned_offset(&lists, file) {
                hits.push(TrigramHit {
                    file: file.clone(),
                    offset,
                });
                if hits.len() >= cap {
                    break;
                }
            }
        }
        hits
    }

    /// Distinct trigrams recorded for a file.
    pub fn trigram_count(&self, file: &FilePath) -> usize {
        self.by_file.get(file).map_or(0, Vec::len)
    }

    pub fn file_count(&self) -> usize {
        self.by_file.len()
    }

    pub fn contains_file(&self, file: &FilePath) -> bool {
        self.by_file.contains_key(file)
    }

    pub fn clear(&mut self) {
        self.postings.clear();
        self.by_file.clear();
    }
}

/// Smallest offset `o` such that window `i` of the query occurs at `o + i`.
fn first_aligned_offset(lists: &[&BTreeMap<FilePath, Vec<u32>>], file: &FilePath) -> Option<u32> {
    let positions: Vec<&Vec<u32>> = lists.iter().map(|files| &files[file]).collect();
    let (first, rest) = positions.split_first()?;

    first.iter().copied().find(|&start| {
        rest.iter()
            .enumerate()
            .all(|(i, offsets)| offsets.binary_search(&(start + i as u32 + 1)).is_ok())
    })
}
