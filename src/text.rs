//! Search-key normalization for song titles.
use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("static regex"));

/// Split a free-text title into lowercase search tokens with accents and
/// punctuation removed. Never fails; characters that do not survive are dropped.
pub fn normalize(input: &str) -> Vec<String> {
    let stripped: String = input.nfd().filter(|c| !is_combining_mark(*c)).collect();
    let cleaned = NON_WORD.replace_all(&stripped, "");
    cleaned
        .to_lowercase()
        .split_whitespace()
        .map(str::to_owned)
        .collect()
}

/// Tokens joined by a single space, the form persisted next to archive rows.
pub fn search_text(input: &str) -> String {
    normalize(input).join(" ")
}
