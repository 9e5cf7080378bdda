//! Left join of sanitized posts against annotator output, plus the annotation backlog.

use crate::records::{AnnotatedPost, AnnotationColumns, AnnotationRecord, AnnotationRequest, SanitizedPost};

/// Expected `urgency_0_3` range. Values outside it pass through unchanged.
pub const URGENCY_RANGE: std::ops::RangeInclusive<i64> = 0..=3;

/// Index annotations by `post_id`, keeping input order per key.
fn index_annotations(annotations: &[AnnotationRecord]) -> ahash::AHashMap<&str, Vec<&AnnotationRecord>> {
    let mut idx: ahash::AHashMap<&str, Vec<&AnnotationRecord>> = ahash::AHashMap::with_capacity(annotations.len());
    for a in annotations {
        if let Some(id) = a.post_id.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            idx.entry(id).or_default().push(a);
        }
    }
    idx
}

/// Every sanitized row appears at least once. A post with k annotations fans out to k rows
/// (annotation input order); a post with none carries null annotation columns.
pub fn join_annotations(posts: &[SanitizedPost], annotations: &[AnnotationRecord]) -> Vec<AnnotatedPost> {
    let idx = index_annotations(annotations);
    let mut out = Vec::with_capacity(posts.len());
    let mut matched_posts = 0u64;
    let mut fanned_out = 0u64;

    for p in posts {
        match idx.get(p.post.post_id.as_str()) {
            Some(list) => {
                matched_posts += 1;
                if list.len() > 1 {
                    fanned_out += 1;
                }
                for a in list {
                    if let Some(u) = a.fields.urgency_0_3 {
                        if !URGENCY_RANGE.contains(&u) {
                            tracing::warn!("post {}: urgency_0_3 = {} outside 0..=3", p.post.post_id, u);
                        }
                    }
                    out.push(AnnotatedPost { post: p.clone(), annotation: AnnotationColumns::matched(&a.fields) });
                }
            }
            None => out.push(AnnotatedPost { post: p.clone(), annotation: AnnotationColumns::default() }),
        }
    }

    let known: ahash::AHashSet<&str> = posts.iter().map(|p| p.post.post_id.as_str()).collect();
    let orphans = idx.keys().filter(|k| !known.contains(*k)).count();
    if orphans > 0 {
        tracing::debug!("{} annotated post ids have no sanitized post; dropped from join", orphans);
    }
    if fanned_out > 0 {
        tracing::warn!("{} posts have more than one annotation; join fans out", fanned_out);
    }
    tracing::info!("Joined {} posts: {} annotated, {} awaiting annotation", posts.len(), matched_posts, posts.len() as u64 - matched_posts);
    out
}

/// Posts flagged for annotation that have none yet, in sanitized order. Redacted text only.
pub fn pending_annotations(
    posts: &[SanitizedPost],
    annotations: &[AnnotationRecord],
    limit: Option<usize>,
) -> Vec<AnnotationRequest> {
    let idx = index_annotations(annotations);
    posts
        .iter()
        .filter(|p| p.needs_annotation && !idx.contains_key(p.post.post_id.as_str()))
        .take(limit.unwrap_or(usize::MAX))
        .map(|p| AnnotationRequest { post_id: p.post.post_id.clone(), text_for_llm: p.text_for_llm.clone() })
        .collect()
}
