use lazy_static::lazy_static;
use regex::Regex;
use rust_stemmers::{Algorithm, Stemmer};
use std::collections::BTreeSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    static ref CLEAN: Regex = Regex::new(r"(?u)[^\p{L}\s]+").expect("valid regex");
    static ref STEMMER: Stemmer = Stemmer::create(Algorithm::English);
}

/// Splits text into cleaned words: NFD normalization, everything that is not
/// a letter or whitespace removed, lowercased.
pub fn parse(text: &str) -> Vec<String> {
    let decomposed = text.nfd().collect::<String>();
    CLEAN
        .replace_all(&decomposed, "")
        .to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

pub fn stem(word: &str) -> String {
    STEMMER.stem(word).into_owned()
}

/// Cleaned and stemmed words in the order they appear.
pub fn stems(text: &str) -> Vec<String> {
    parse(text).iter().map(|word| stem(word)).collect()
}

/// Sorted, deduplicated stems of a query line.
pub fn unique_stems(line: &str) -> BTreeSet<String> {
    parse(line).iter().map(|word| stem(word)).collect()
}
