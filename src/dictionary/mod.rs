//! The dictionary candidate index (spec §4.1, §2 component 1).

pub mod scoring;

use log::{debug, warn};
use rand::Rng;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use scoring::{placement_score, rare_letter_bonus, tokenize_clue};

pub const MIN_LEN: usize = 3;
pub const MAX_LEN: usize = 15;

#[derive(Debug, Clone, Deserialize)]
struct RawMeaning {
    def: String,
    #[serde(default)]
    speech_part: Option<String>,
    #[serde(default)]
    example: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEntry {
    #[serde(default)]
    word: String,
    #[serde(default)]
    meanings: Vec<RawMeaning>,
}

#[derive(Debug, Clone)]
pub struct Meaning {
    pub def: String,
    pub speech_part: Option<String>,
    pub example: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DictionaryEntry {
    /// Canonical uppercase headword.
    pub word: String,
    pub meanings: Vec<Meaning>,
}

impl DictionaryEntry {
    fn is_noun(&self) -> bool {
        self.meanings
            .iter()
            .any(|m| m.speech_part.as_deref() == Some("noun"))
    }

    pub fn first_definition(&self) -> Option<&str> {
        self.meanings.first().map(|m| m.def.as_str())
    }
}

/// Process-wide, immutable-after-load candidate index (spec §3 "Ownership").
#[derive(Debug, Clone, Default)]
pub struct DictionaryIndex {
    by_headword: HashMap<String, DictionaryEntry>,
    by_length: HashMap<usize, Vec<String>>,
    by_first_letter: HashMap<char, Vec<String>>,
}

impl DictionaryIndex {
    pub fn empty() -> Self {
        DictionaryIndex::default()
    }

    /// Loads `a.json`..`z.json` from `dir`. Missing files are warnings; an
    /// empty resulting dictionary is a legal state (spec §4.1 "Failure").
    pub fn load_from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        let mut index = DictionaryIndex::default();

        for letter in b'a'..=b'z' {
            let letter = letter as char;
            let path = dir.join(format!("{}.json", letter));
            let contents = match fs::read_to_string(&path) {
                Ok(c) => c,
                Err(_) => {
                    warn!("dictionary file not found for letter {}: {:?}", letter, path);
                    continue;
                }
            };
            let raw: HashMap<String, RawEntry> = match serde_json::from_str(&contents) {
                Ok(v) => v,
                Err(e) => {
                    warn!("could not parse dictionary file for letter {}: {}", letter, e);
                    continue;
                }
            };
            for (headword, entry) in raw {
                index.insert_if_valid(&headword, entry);
            }
        }

        debug!("dictionary loaded: {} headwords", index.by_headword.len());
        index
    }

    fn insert_if_valid(&mut self, headword: &str, raw: RawEntry) {
        let lower = headword.to_lowercase();
        if lower.len() < MIN_LEN || lower.len() > MAX_LEN {
            return;
        }
        if !lower.chars().all(|c| c.is_ascii_alphabetic()) {
            return;
        }
        if scoring::BLACKLIST_WORDS.contains(lower.as_str()) {
            return;
        }
        if raw.meanings.is_empty() {
            return;
        }

        let meanings = raw
            .meanings
            .into_iter()
            .map(|m| Meaning {
                def: m.def,
                speech_part: m.speech_part,
                example: m.example,
            })
            .collect();

        let entry = DictionaryEntry {
            word: lower.to_uppercase(),
            meanings,
        };

        self.by_length.entry(lower.len()).or_default().push(lower.clone());
        let first = lower.chars().next().unwrap();
        self.by_first_letter.entry(first).or_default().push(lower.clone());
        self.by_headword.insert(lower, entry);
    }

    pub fn len(&self) -> usize {
        self.by_headword.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_headword.is_empty()
    }

    fn frequency_of_first_letter(&self, length: usize, letter: char) -> f64 {
        let total = self.by_length.get(&length).map(|v| v.len()).unwrap_or(0);
        if total == 0 {
            return 0.0;
        }
        let matching = self
            .by_length
            .get(&length)
            .map(|v| v.iter().filter(|w| w.starts_with(letter)).count())
            .unwrap_or(0);
        matching as f64 / total as f64
    }

    fn score_word(&self, word: &str) -> i64 {
        let first = word.chars().next().unwrap_or('a');
        let freq = self.frequency_of_first_letter(word.len(), first);
        let mut score = placement_score(word, freq);
        if let Some(entry) = self.by_headword.get(word) {
            if entry.is_noun() {
                score += 2;
            }
        }
        score
    }

    /// (a) by-length: up to `max` entries of exact length `L`, diversified by
    /// first letter (spec §4.1(a)).
    pub fn candidates_by_length(&self, length: usize, max: usize) -> Vec<(String, i64)> {
        let words = match self.by_length.get(&length) {
            Some(w) => w,
            None => return Vec::new(),
        };

        let mut scored: Vec<(String, i64)> = words
            .iter()
            .map(|w| (w.to_uppercase(), self.score_word(w)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        if scored.len() <= max {
            return scored;
        }

        let mut buckets: HashMap<char, Vec<(String, i64)>> = HashMap::new();
        for (word, score) in &scored {
            let first = word.chars().next().unwrap();
            buckets.entry(first).or_default().push((word.clone(), *score));
        }
        let num_letters = buckets.len().max(1);
        let per_bucket = (max + num_letters - 1) / num_letters;

        let mut taken: HashSet<String> = HashSet::new();
        let mut result = Vec::new();
        let mut letters: Vec<char> = buckets.keys().copied().collect();
        letters.sort();
        for letter in &letters {
            let bucket = &buckets[letter];
            for (word, score) in bucket.iter().take(per_bucket) {
                if result.len() >= max {
                    break;
                }
                taken.insert(word.clone());
                result.push((word.clone(), *score));
            }
        }
        if result.len() < max {
            for (word, score) in &scored {
                if result.len() >= max {
                    break;
                }
                if !taken.contains(word) {
                    taken.insert(word.clone());
                    result.push((word.clone(), *score));
                }
            }
        }
        result.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        result.truncate(max);
        result
    }

    /// (b) by-pattern: `pattern` is uppercase with `.` as a wildcard.
    pub fn candidates_by_pattern(
        &self,
        pattern: &str,
        clue_tokens: Option<&HashSet<String>>,
        max: usize,
    ) -> Vec<(String, i64)> {
        let length = pattern.len();
        let words = match self.by_length.get(&length) {
            Some(w) => w,
            None => return Vec::new(),
        };
        let pattern_upper: Vec<char> = pattern.chars().map(|c| c.to_ascii_uppercase()).collect();

        let mut matches: Vec<(String, i64)> = Vec::new();
        for word in words {
            let upper = word.to_uppercase();
            let matches_pattern = upper
                .chars()
                .zip(pattern_upper.iter())
                .all(|(c, &p)| p == '.' || p == c);
            if !matches_pattern {
                continue;
            }
            if let Some(tokens) = clue_tokens {
                let entry = &self.by_headword[word];
                let has_overlap = entry
                    .meanings
                    .iter()
                    .any(|m| tokens.iter().any(|t| m.def.to_lowercase().contains(t.as_str())));
                if !has_overlap {
                    continue;
                }
            }
            matches.push((upper.clone(), self.score_word(word)));
        }
        matches.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        matches.truncate(max);
        matches
    }

    /// (c) by-clue: tokenizes the clue, scores relevance against every
    /// meaning of every entry whose length is in `length_range`, dedupes by
    /// headword keeping the best meaning (spec §4.1(c)).
    pub fn candidates_by_clue(
        &self,
        clue: &str,
        max: usize,
        length_range: (usize, usize),
    ) -> Vec<(String, i64)> {
        let tokens = tokenize_clue(clue);
        if tokens.is_empty() {
            return Vec::new();
        }

        let mut best: HashMap<String, i64> = HashMap::new();
        for length in length_range.0..=length_range.1 {
            let words = match self.by_length.get(&length) {
                Some(w) => w,
                None => continue,
            };
            for word in words {
                let entry = &self.by_headword[word];
                let mut best_relevance = 0i64;
                for meaning in &entry.meanings {
                    let def_lower = meaning.def.to_lowercase();
                    let def_hits = tokens.iter().filter(|t| def_lower.contains(t.as_str())).count() as i64;
                    let example_hits = meaning
                        .example
                        .as_deref()
                        .map(|ex| {
                            let ex_lower = ex.to_lowercase();
                            tokens.iter().filter(|t| ex_lower.contains(t.as_str())).count() as i64
                        })
                        .unwrap_or(0);
                    let noun_bonus = if meaning.speech_part.as_deref() == Some("noun") { 2 } else { 0 };
                    let relevance = 10 * def_hits + 5 * example_hits + noun_bonus;
                    if relevance > best_relevance {
                        best_relevance = relevance;
                    }
                }
                if best_relevance > 0 {
                    best.insert(entry.word.clone(), best_relevance);
                }
            }
        }

        let mut results: Vec<(String, i64)> = best.into_iter().collect();
        results.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        results.truncate(max);
        results
    }

    /// Returns the first entry whose meaning definition equals `clue`
    /// case-insensitively.
    pub fn exact_clue_lookup(&self, clue: &str) -> Option<&DictionaryEntry> {
        let clue_lower = clue.to_lowercase();
        self.by_headword
            .values()
            .find(|entry| entry.meanings.iter().any(|m| m.def.to_lowercase() == clue_lower))
    }

    /// First meaning's definition, or a placeholder if the word is unknown.
    pub fn clue_for_word(&self, word: &str) -> String {
        let lower = word.to_lowercase();
        match self.by_headword.get(&lower).and_then(|e| e.first_definition()) {
            Some(def) => def.to_string(),
            None => format!("Definition related to {}", lower),
        }
    }

    pub fn entry(&self, word: &str) -> Option<&DictionaryEntry> {
        self.by_headword.get(&word.to_lowercase())
    }

    pub fn contains(&self, word: &str) -> bool {
        self.by_headword.contains_key(&word.to_lowercase())
    }

    /// Synonym-tolerant equality check: exact match first, then a
    /// shared-definition-word heuristic (supplemented feature, grounded on
    /// `dictionary_helper.py::verify_solution`).
    pub fn verify_solution(&self, solution_word: &str, expected_word: &str) -> bool {
        if solution_word.eq_ignore_ascii_case(expected_word) {
            return true;
        }
        let sol = match self.by_headword.get(&solution_word.to_lowercase()) {
            Some(e) => e,
            None => return false,
        };
        let exp = match self.by_headword.get(&expected_word.to_lowercase()) {
            Some(e) => e,
            None => return false,
        };
        for sol_meaning in &sol.meanings {
            let sol_words: HashSet<&str> = sol_meaning.def.split_whitespace().collect();
            for exp_meaning in &exp.meanings {
                let exp_words: HashSet<&str> = exp_meaning.def.split_whitespace().collect();
                if sol_words.intersection(&exp_words).count() >= 2 {
                    return true;
                }
            }
        }
        false
    }

    /// Targeted seed-variation lookup (supplemented feature, grounded on
    /// `dictionary_helper.py::get_random_word_by_letter`), seeded for
    /// determinism.
    pub fn random_word_starting_with<R: Rng>(&self, letter: char, length: usize, rng: &mut R) -> Option<String> {
        let letter = letter.to_ascii_lowercase();
        let candidates: Vec<&String> = self
            .by_first_letter
            .get(&letter)?
            .iter()
            .filter(|w| w.len() == length)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let idx = rng.gen_range(0, candidates.len());
        Some(candidates[idx].to_uppercase())
    }

    /// Highest-scoring candidate with the rare-letter bonus applied, used by
    /// the generator's seed selection (spec §4.3 step 2/5).
    pub fn best_seed_candidate(&self, length: usize, pool_size: usize) -> Option<(String, i64)> {
        self.candidates_by_length(length, pool_size)
            .into_iter()
            .map(|(w, s)| (w.clone(), s + rare_letter_bonus(&w)))
            .max_by_key(|(_, s)| *s)
    }
}
