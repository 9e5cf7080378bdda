//! Text metrics over redacted text, the language hint and the annotation routing rule.

use crate::redact::RedactionCounts;
use regex::Regex;
use std::sync::OnceLock;

/// Marker for the primary supported language.
pub const PRIMARY_LANG: &str = "en";
pub const UNKNOWN_LANG: &str = "unknown";

/// Non-ASCII share at or above which the hint falls back to unknown.
pub const NON_ASCII_MAX_FRACTION: f64 = 0.10;

pub const MIN_WORDS: u64 = 5;
pub const MAX_WORDS: u64 = 1000;
/// Exclusive upper bound on `token_estimate`.
pub const MAX_TOKENS: u64 = 4000;

fn terminator_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.!?]+").expect("static regex"))
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TextMetrics {
    pub n_chars: u64,
    pub n_words: u64,
    pub n_sentences: u64,
    pub n_questions: u64,
    pub n_exclaims: u64,
    pub redactions: RedactionCounts,
    pub token_estimate: u64,
}

impl TextMetrics {
    pub fn of(text: &str) -> Self {
        let n_chars = text.chars().count() as u64;
        Self {
            n_chars,
            n_words: word_count(text),
            n_sentences: sentence_count(text),
            n_questions: text.matches('?').count() as u64,
            n_exclaims: text.matches('!').count() as u64,
            redactions: RedactionCounts::of(text),
            token_estimate: token_estimate(n_chars),
        }
    }
}

/// Pieces of a split on a single space. Callers feed whitespace-collapsed text.
pub fn word_count(text: &str) -> u64 {
    text.split(' ').count() as u64
}

/// Runs of `.`, `!`, `?`, floored at one.
pub fn sentence_count(text: &str) -> u64 {
    (terminator_run().find_iter(text).count() as u64).max(1)
}

/// `ceil(n_chars / 4)`.
pub fn token_estimate(n_chars: u64) -> u64 {
    (n_chars as f64 / 4.0).ceil() as u64
}

/// `"en"` when fewer than 10% of characters are non-ASCII. Empty text is unknown.
pub fn language_hint(text: &str) -> &'static str {
    let total = text.chars().count();
    if total == 0 {
        return UNKNOWN_LANG;
    }
    let non_ascii = text.chars().filter(|c| !c.is_ascii()).count();
    if (non_ascii as f64 / total as f64) < NON_ASCII_MAX_FRACTION {
        PRIMARY_LANG
    } else {
        UNKNOWN_LANG
    }
}

/// Advisory routing flag for the external annotator.
pub fn needs_annotation(m: &TextMetrics, lang_hint: &str, require_language: bool) -> bool {
    let words_ok = (MIN_WORDS..=MAX_WORDS).contains(&m.n_words);
    let tokens_ok = m.token_estimate < MAX_TOKENS;
    let lang_ok = !require_language || lang_hint == PRIMARY_LANG;
    words_ok && tokens_ok && lang_ok
}
