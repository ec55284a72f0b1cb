//! Test-only helper for building a tiny in-memory-backed dictionary without
//! touching the real dictionary file format loader's directory scan.

use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::dictionary::DictionaryIndex;

pub(crate) fn build_dictionary(entries: &[(&str, &str)]) -> DictionaryIndex {
    let mut dir = std::env::temp_dir();
    dir.push(format!("xw-solver-test-{}-{}", std::process::id(), unique_suffix()));
    fs::create_dir_all(&dir).unwrap();

    let mut by_letter: HashMap<char, String> = HashMap::new();
    for (word, def) in entries {
        let letter = word.chars().next().unwrap().to_ascii_lowercase();
        let body = by_letter.entry(letter).or_insert_with(String::new);
        if !body.is_empty() {
            body.push(',');
        }
        body.push_str(&format!(
            "\"{}\": {{\"word\": \"{}\", \"meanings\": [{{\"def\": \"{}\", \"speech_part\": \"noun\"}}]}}",
            word.to_lowercase(),
            word.to_lowercase(),
            def
        ));
    }

    for (letter, body) in &by_letter {
        let mut f = fs::File::create(dir.join(format!("{}.json", letter))).unwrap();
        f.write_all(format!("{{{}}}", body).as_bytes()).unwrap();
    }

    let index = DictionaryIndex::load_from_dir(&dir);
    let _ = fs::remove_dir_all(&dir);
    index
}

fn unique_suffix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap().subsec_nanos() as u64
}
