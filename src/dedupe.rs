//! Recency dedupe: collapse re-scrapes of the same post to one canonical record.

use crate::normalize::{content_fingerprint, normalize_body, normalize_subreddit, normalize_title};
use crate::records::{CanonicalPost, RawPost};
use crate::timestamp::Timestamp;
use std::cmp::Ordering;

/// A raw record tagged with its ingestion sequence number
/// (discovered file order, then line order within the file).
#[derive(Clone, Debug)]
pub struct Sequenced {
    pub seq: u64,
    pub raw: RawPost,
}

/// Recency rank: later `scraped_at` wins; a missing timestamp ranks below any present one;
/// equal timestamps fall back to the higher sequence number.
fn rank(a: (Option<Timestamp>, u64), b: (Option<Timestamp>, u64)) -> Ordering {
    a.0.cmp(&b.0).then(a.1.cmp(&b.1))
}

/// Pick the current record per `post_id` and normalize it. Output is sorted by `post_id`.
/// Records without a usable identifier are dropped (and counted in the returned tally).
pub fn dedupe_latest(records: Vec<Sequenced>) -> (Vec<CanonicalPost>, DedupeTally) {
    let mut tally = DedupeTally { input: records.len() as u64, ..Default::default() };
    let mut best: ahash::AHashMap<String, Sequenced> = ahash::AHashMap::with_capacity(records.len());

    for rec in records {
        let id = match rec.raw.post_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => {
                tally.missing_id += 1;
                continue;
            }
        };
        match best.get_mut(&id) {
            Some(cur) => {
                tally.superseded += 1;
                if rank((rec.raw.scraped_at, rec.seq), (cur.raw.scraped_at, cur.seq)) == Ordering::Greater {
                    *cur = rec;
                }
            }
            None => {
                best.insert(id, rec);
            }
        }
    }

    let mut out: Vec<CanonicalPost> = best.into_iter().map(|(id, rec)| canonicalize(id, rec.raw)).collect();
    out.sort_unstable_by(|a, b| a.post_id.cmp(&b.post_id));
    tally.output = out.len() as u64;
    (out, tally)
}

/// Normalize a single raw record into its canonical shape.
pub fn canonicalize(post_id: String, raw: RawPost) -> CanonicalPost {
    let title = normalize_title(raw.title.as_deref());
    let content = normalize_body(raw.content.as_deref());
    let content_hash = content_fingerprint(&title, &content);
    CanonicalPost {
        post_id,
        post_date: raw.post_date.map(|s| s.trim().to_string()).unwrap_or_default(),
        post_timestamp: raw.post_timestamp,
        post_flair: raw.post_flair.map(|s| s.trim().to_string()).unwrap_or_default(),
        title,
        url: raw.url.map(|s| s.trim().to_string()).unwrap_or_default(),
        content,
        score: raw.score.unwrap_or(0),
        num_comments: raw.num_comments.unwrap_or(0),
        subreddit: normalize_subreddit(raw.subreddit.as_deref()),
        scraped_at: raw.scraped_at,
        content_hash,
    }
}

/// Row accounting for one dedupe pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DedupeTally {
    pub input: u64,
    pub missing_id: u64,
    pub superseded: u64,
    pub output: u64,
}
