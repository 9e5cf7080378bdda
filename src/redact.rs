//! The PII redaction chain.
//!
//! Rules run in a fixed order, each over the previous rule's output, all case-insensitive:
//!
//! | # | pattern                                   | replacement |
//! |---|-------------------------------------------|-------------|
//! | 1 | `https?://` up to the next whitespace     | `[URL]`     |
//! | 2 | `www.` up to the next whitespace          | `[URL]`     |
//! | 3 | email-like tokens                         | `[EMAIL]`   |
//! | 4 | 8+ char digit runs (`+`, space, `-`, `()`)| `[PHONE]`   |
//! | 5 | `u/<name>`                                | `u/[USER]`  |
//! | 6 | `r/<name>`                                | `r/[SUB]`   |
//!
//! URL and email rules precede the phone rule: both can carry long digit runs.
//! The chain is heuristic. Obfuscated addresses or unusual phone formats can survive it.

use regex::{Regex, RegexBuilder};

/// What a rule redacts. Each kind owns exactly one replacement token.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RedactionKind {
    Url,
    Email,
    Phone,
    Username,
    Subreddit,
}

impl RedactionKind {
    pub const ALL: [RedactionKind; 5] = [
        RedactionKind::Url,
        RedactionKind::Email,
        RedactionKind::Phone,
        RedactionKind::Username,
        RedactionKind::Subreddit,
    ];

    pub fn token(self) -> &'static str {
        match self {
            RedactionKind::Url => "[URL]",
            RedactionKind::Email => "[EMAIL]",
            RedactionKind::Phone => "[PHONE]",
            RedactionKind::Username => "u/[USER]",
            RedactionKind::Subreddit => "r/[SUB]",
        }
    }
}

/// One (matcher, replacement) pair.
#[derive(Clone, Debug)]
pub struct RedactionRule {
    pub kind: RedactionKind,
    matcher: Regex,
}

impl RedactionRule {
    fn new(kind: RedactionKind, pattern: &str) -> Self {
        let matcher = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .expect("redaction patterns are static and valid");
        Self { kind, matcher }
    }

    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    pub fn apply(&self, text: &str) -> String {
        self.matcher.replace_all(text, regex::NoExpand(self.kind.token())).into_owned()
    }
}

/// Ordered, immutable list of rules. Build once, share by reference.
#[derive(Clone, Debug)]
pub struct RedactionChain {
    rules: Vec<RedactionRule>,
}

impl Default for RedactionChain {
    fn default() -> Self {
        Self::standard()
    }
}

impl RedactionChain {
    pub fn standard() -> Self {
        let rules = vec![
            RedactionRule::new(RedactionKind::Url, r"https?://\S+"),
            RedactionRule::new(RedactionKind::Url, r"www\.\S+"),
            RedactionRule::new(RedactionKind::Email, r"[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}"),
            RedactionRule::new(RedactionKind::Phone, r"\+?\d[\d\s\-()]{6,}\d"),
            RedactionRule::new(RedactionKind::Username, r"\bu/[a-z0-9_-]+"),
            RedactionRule::new(RedactionKind::Subreddit, r"\br/[a-z0-9_]+"),
        ];
        Self { rules }
    }

    pub fn rules(&self) -> &[RedactionRule] {
        &self.rules
    }

    /// Run every rule in order.
    pub fn redact(&self, text: &str) -> String {
        let mut out = text.to_string();
        for rule in &self.rules {
            out = rule.apply(&out);
        }
        out
    }
}

/// Count replacement tokens present in already-redacted text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RedactionCounts {
    pub urls: u64,
    pub emails: u64,
    pub phones: u64,
    pub usernames: u64,
    pub subreddits: u64,
}

impl RedactionCounts {
    pub fn of(text: &str) -> Self {
        let n = |k: RedactionKind| text.matches(k.token()).count() as u64;
        Self {
            urls: n(RedactionKind::Url),
            emails: n(RedactionKind::Email),
            phones: n(RedactionKind::Phone),
            usernames: n(RedactionKind::Username),
            subreddits: n(RedactionKind::Subreddit),
        }
    }

    pub fn get(&self, kind: RedactionKind) -> u64 {
        match kind {
            RedactionKind::Url => self.urls,
            RedactionKind::Email => self.emails,
            RedactionKind::Phone => self.phones,
            RedactionKind::Username => self.usernames,
            RedactionKind::Subreddit => self.subreddits,
        }
    }

    pub fn total(&self) -> u64 {
        RedactionKind::ALL.iter().map(|k| self.get(*k)).sum()
    }
}
