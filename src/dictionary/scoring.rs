//! Pure scoring functions (spec §4.1 "Placement score", §2 component 2).

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

lazy_static! {
    /// Standard Scrabble-like per-letter values.
    pub static ref LETTER_SCORES: HashMap<char, i64> = {
        let mut m = HashMap::new();
        for (letters, value) in [
            ("E", 13), ("T", 12), ("A", 11), ("O", 10), ("I", 9), ("N", 8),
            ("S", 7), ("H", 6), ("R", 5), ("D", 4), ("L", 3), ("C", 2),
            ("U", 1), ("M", 1), ("W", 1), ("F", 1), ("G", 1), ("Y", 1),
            ("P", 1), ("B", 1), ("V", 1), ("K", 1), ("J", 1), ("X", 1),
            ("Q", 1), ("Z", 1),
        ] {
            m.insert(letters.chars().next().unwrap(), value);
        }
        m
    };

    /// Stopwords/pronouns/short function words excluded from the dictionary
    /// and from clue tokenization.
    pub static ref BLACKLIST_WORDS: HashSet<&'static str> = {
        [
            "a", "i", "me", "my", "we", "us", "our", "you", "your", "he",
            "him", "his", "she", "her", "it", "its", "they", "them", "their",
            "this", "that", "these", "those", "am", "is", "are", "was", "were",
            "be", "being", "been", "have", "has", "had", "do", "does", "did",
            "will", "would", "shall", "should", "may", "might", "must", "can",
            "could", "and", "but", "or", "nor", "for", "so", "yet", "as", "at",
            "by", "in", "of", "on", "to", "with", "from", "into", "about", "over",
        ]
        .iter()
        .copied()
        .collect()
    };

    pub static ref RARE_LETTERS: HashSet<char> = ['Q', 'Z', 'X', 'J', 'K', 'V'].iter().copied().collect();

    /// Weights favoring common consonants and vowels, used for weighted
    /// random seed-letter sampling (spec §4.3 step 2).
    pub static ref STARTING_LETTER_WEIGHTS: Vec<(char, u32)> = vec![
        ('a', 10), ('b', 5), ('c', 8), ('d', 7), ('e', 9), ('f', 5),
        ('g', 6), ('h', 7), ('i', 7), ('j', 3), ('k', 4), ('l', 8),
        ('m', 6), ('n', 8), ('o', 7), ('p', 7), ('q', 2), ('r', 8),
        ('s', 9), ('t', 9), ('u', 5), ('v', 4), ('w', 5), ('x', 2),
        ('y', 4), ('z', 2),
    ];

    static ref CLUE_SPLIT: Regex = Regex::new(r"[^\w]+").unwrap();
}

/// Sum of per-letter values, +2 per interior vowel, -3 if fewer than
/// L/2 unique letters, plus a rarity bonus for the first letter, clamped
/// to a minimum of 1. `first_letter_frequency` is the fraction (0.0-1.0)
/// of dictionary headwords of the same length starting with this word's
/// first letter.
pub fn placement_score(word: &str, first_letter_frequency: f64) -> i64 {
    let upper: Vec<char> = word.chars().map(|c| c.to_ascii_uppercase()).collect();
    let len = upper.len();

    let letter_sum: i64 = upper.iter().map(|c| *LETTER_SCORES.get(c).unwrap_or(&0)).sum();

    let vowel_bonus: i64 = upper
        .iter()
        .enumerate()
        .filter(|(i, c)| *i > 0 && *i < len.saturating_sub(1) && "AEIOU".contains(**c))
        .count() as i64
        * 2;

    let unique: HashSet<char> = upper.iter().copied().collect();
    let repetition_penalty = if (unique.len() as f64) < (len as f64) / 2.0 { -3 } else { 0 };

    let rarity_bonus = (10.0 - first_letter_frequency * 0.5).max(1.0).floor() as i64;

    (letter_sum + vowel_bonus + repetition_penalty + rarity_bonus).max(1)
}

pub fn rare_letter_bonus(word: &str) -> i64 {
    match word.chars().next() {
        Some(c) if RARE_LETTERS.contains(&c.to_ascii_uppercase()) => 5,
        _ => 0,
    }
}

/// Splits on non-word characters and drops blacklisted/length-<=1 tokens
/// (spec §4.1(c)).
pub fn tokenize_clue(clue: &str) -> HashSet<String> {
    CLUE_SPLIT
        .split(&clue.to_lowercase())
        .filter(|t| t.len() > 1 && !BLACKLIST_WORDS.contains(t))
        .map(|t| t.to_string())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placement_score_is_at_least_one() {
        assert!(placement_score("QAT", 0.001) >= 1);
    }

    #[test]
    fn repeated_letters_are_penalised() {
        let repetitive = placement_score("AAAA", 0.5);
        let varied = placement_score("WXYZ", 0.5);
        // AAAA: letter sum 44, vowel bonus (interior A's) +4, unique=1 < 2 -> -3, rarity ~ +9 => ~54
        // WXYZ: letter sum 4, no vowels, unique=4 !< 2 -> 0, rarity ~ +9 => ~13
        assert!(repetitive > varied);
    }

    #[test]
    fn tokenize_drops_blacklist_and_short_tokens() {
        let tokens = tokenize_clue("The cat sat on a mat!");
        assert!(tokens.contains("cat"));
        assert!(tokens.contains("sat"));
        assert!(tokens.contains("mat"));
        assert!(!tokens.contains("the"));
        assert!(!tokens.contains("on"));
        assert!(!tokens.contains("a"));
    }
}
