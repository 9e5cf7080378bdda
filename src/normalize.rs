//! Whitespace/case normalization for canonical posts and the content fingerprint.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::OnceLock;

fn whitespace_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("static regex"))
}

fn newline_run() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n+").expect("static regex"))
}

/// Title: trim only.
pub fn normalize_title(title: Option<&str>) -> String {
    title.unwrap_or("").trim().to_string()
}

/// Body: missing → `""`, trim, collapse whitespace runs to one space, then newline runs to one
/// newline. The second pass never fires after the first; it stays to keep the step order fixed.
pub fn normalize_body(body: Option<&str>) -> String {
    let trimmed = body.unwrap_or("").trim();
    let spaced = whitespace_run().replace_all(trimmed, " ");
    newline_run().replace_all(&spaced, "\n").into_owned()
}

/// Subreddit: trim + lowercase. The `r/` prefix is kept if the scraper wrote one.
pub fn normalize_subreddit(sub: Option<&str>) -> String {
    sub.unwrap_or("").trim().to_lowercase()
}

/// Collapse every whitespace run to one space and trim. Used after redaction when enabled.
pub fn collapse_whitespace(text: &str) -> String {
    whitespace_run().replace_all(text.trim(), " ").into_owned()
}

/// Hex SHA-256 over normalized title, a unit-separator byte, and normalized body.
pub fn content_fingerprint(title: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(title.as_bytes());
    hasher.update([0x1f]);
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}
