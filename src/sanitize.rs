//! Canonical → sanitized: redaction chain, optional collapse, metrics, routing flag.

use crate::config::SanitizeCfg;
use crate::metrics::{language_hint, needs_annotation, TextMetrics, UNKNOWN_LANG};
use crate::normalize::collapse_whitespace;
use crate::progress::ProgressScope;
use crate::records::{CanonicalPost, SanitizedPost};
use crate::redact::RedactionChain;
use rayon::prelude::*;

/// Redact one body and compute its metrics. Returns `(text_for_llm, metrics, lang_hint)`.
pub fn redact_and_measure(body: &str, chain: &RedactionChain, cfg: &SanitizeCfg) -> (String, TextMetrics, &'static str) {
    let mut text = chain.redact(body);
    if cfg.collapse_whitespace {
        text = collapse_whitespace(&text);
    }
    let metrics = TextMetrics::of(&text);
    let lang = if cfg.language_hint { language_hint(&text) } else { UNKNOWN_LANG };
    (text, metrics, lang)
}

/// `None` for posts with an empty normalized body; they never reach annotation.
pub fn sanitize_post(post: &CanonicalPost, chain: &RedactionChain, cfg: &SanitizeCfg) -> Option<SanitizedPost> {
    if post.content.is_empty() {
        return None;
    }
    let (text_for_llm, m, lang) = redact_and_measure(&post.content, chain, cfg);
    let needs = needs_annotation(&m, lang, cfg.gates_on_language());
    Some(SanitizedPost {
        post: post.clone(),
        text_raw: post.content.clone(),
        text_for_llm,
        n_chars: m.n_chars,
        n_words: m.n_words,
        n_sentences: m.n_sentences,
        n_questions: m.n_questions,
        n_exclaims: m.n_exclaims,
        n_urls_redacted: m.redactions.urls,
        n_emails_redacted: m.redactions.emails,
        n_phones_redacted: m.redactions.phones,
        n_usernames_redacted: m.redactions.usernames,
        n_subreddits_redacted: m.redactions.subreddits,
        token_estimate: m.token_estimate,
        lang_hint: lang.to_string(),
        needs_annotation: needs,
    })
}

/// Data-parallel over posts; output keeps input order.
pub fn sanitize_all(
    posts: &[CanonicalPost],
    chain: &RedactionChain,
    cfg: &SanitizeCfg,
    progress: bool,
) -> Vec<SanitizedPost> {
    let pb = if progress { Some(ProgressScope::count("Sanitize", posts.len() as u64)) } else { None };
    let out: Vec<SanitizedPost> = posts
        .par_iter()
        .filter_map(|p| {
            let s = sanitize_post(p, chain, cfg);
            if let Some(pb) = &pb { pb.inc_items(1); }
            s
        })
        .collect();
    if let Some(pb) = pb { pb.finish(format!("sanitized {}", out.len())); }

    let skipped = posts.len() - out.len();
    let eligible = out.iter().filter(|s| s.needs_annotation).count();
    tracing::info!(
        "Sanitized {} posts ({} empty bodies skipped, {} eligible for annotation)",
        out.len(), skipped, eligible
    );
    out
}
