//! Key canonicalization for raw record labels.
//!
//! "Instrument Tags!" → "instrument_tags", "  Overall   Mood " → "overall_mood".

use once_cell::sync::Lazy;
use regex::Regex;

/// Anything that is neither an ASCII word character nor whitespace.
pub static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9A-Za-z_\s]").unwrap());

/// Runs of whitespace, collapsed to a single underscore.
pub static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonicalize a label: strip punctuation, trim, underscore-join words, lowercase.
pub fn canonicalize(label: &str) -> String {
    let stripped = NON_WORD.replace_all(label, "");
    WHITESPACE_RUN
        .replace_all(stripped.trim(), "_")
        .to_lowercase()
}
