//! Row-per-value explosions of annotation lists and the fixed safety indicator view.

use crate::records::{AnnotatedPost, KeywordRow, SafetyFlagRow, SafetyIndicatorRow, TopicRow};

pub const URGENT_BLEEDING: &str = "urgent_bleeding";
pub const URGENT_PAIN: &str = "urgent_pain";
pub const URGENT_FETAL_CONCERN: &str = "urgent_fetal_concern";
pub const MENTAL_HEALTH_CRISIS: &str = "mental_health_crisis";

/// Literals with a column in the indicator view, in column order.
pub const TRACKED_SAFETY_FLAGS: [&str; 4] = [URGENT_BLEEDING, URGENT_PAIN, URGENT_FETAL_CONCERN, MENTAL_HEALTH_CRISIS];

fn explode<'a, T>(
    rows: &'a [AnnotatedPost],
    list: impl Fn(&'a AnnotatedPost) -> Option<&'a Vec<String>>,
    make: impl Fn(String, String) -> T,
) -> Vec<T> {
    rows.iter()
        .filter_map(|r| list(r).map(|l| (r.post_id(), l)))
        .flat_map(|(id, l)| l.iter().map(move |v| (id, v.to_lowercase())))
        .map(|(id, v)| make(id.to_string(), v))
        .collect()
}

pub fn explode_keywords(rows: &[AnnotatedPost]) -> Vec<KeywordRow> {
    explode(rows, |r| r.annotation.keywords.as_ref(), |post_id, keyword| KeywordRow { post_id, keyword })
}

pub fn explode_safety_flags(rows: &[AnnotatedPost]) -> Vec<SafetyFlagRow> {
    explode(rows, |r| r.annotation.safety_flags.as_ref(), |post_id, safety_flag| SafetyFlagRow { post_id, safety_flag })
}

pub fn explode_secondary_topics(rows: &[AnnotatedPost]) -> Vec<TopicRow> {
    explode(rows, |r| r.annotation.secondary_topics.as_ref(), |post_id, topic| TopicRow { post_id, topic })
}

/// Indicators for one flag list. Matching is case-insensitive and ignores surrounding whitespace.
pub fn safety_indicators(post_id: &str, flags: &[String]) -> SafetyIndicatorRow {
    let [is_urgent_bleeding, is_urgent_pain, is_urgent_fetal_concern, is_mh_crisis] =
        TRACKED_SAFETY_FLAGS.map(|literal| flags.iter().any(|f| f.trim().eq_ignore_ascii_case(literal)));
    SafetyIndicatorRow {
        post_id: post_id.to_string(),
        is_urgent_bleeding,
        is_urgent_pain,
        is_urgent_fetal_concern,
        is_mh_crisis,
    }
}

/// One indicator row per annotated row that actually carries an annotation.
pub fn indicator_rows(rows: &[AnnotatedPost]) -> Vec<SafetyIndicatorRow> {
    rows.iter()
        .filter(|r| r.annotation.is_matched())
        .map(|r| safety_indicators(r.post_id(), r.annotation.safety_flags.as_deref().unwrap_or(&[])))
        .collect()
}
