//! Row types for every view. Field names are the column contract consumed by BI tooling.

use crate::json_utils::{opt_i64, opt_string, opt_timestamp, string_list};
use crate::timestamp::Timestamp;
use serde::{Deserialize, Serialize};

/// One scraped observation of a post. Several may share a `post_id` (re-scrapes).
/// Upper-case column names from raw-table exports are accepted too.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RawPost {
    #[serde(default, alias = "POST_ID", alias = "id", deserialize_with = "opt_string")]
    pub post_id: Option<String>,
    #[serde(default, alias = "POST_DATE", deserialize_with = "opt_string")]
    pub post_date: Option<String>,
    #[serde(default, alias = "POST_TIMESTAMP", alias = "created_utc", deserialize_with = "opt_i64")]
    pub post_timestamp: Option<i64>,
    #[serde(default, alias = "POST_FLAIR", alias = "flair", alias = "link_flair_text", deserialize_with = "opt_string")]
    pub post_flair: Option<String>,
    #[serde(default, alias = "TITLE", deserialize_with = "opt_string")]
    pub title: Option<String>,
    #[serde(default, alias = "URL", deserialize_with = "opt_string")]
    pub url: Option<String>,
    #[serde(default, alias = "CONTENT", alias = "body", alias = "selftext", deserialize_with = "opt_string")]
    pub content: Option<String>,
    #[serde(default, alias = "SCORE", deserialize_with = "opt_i64")]
    pub score: Option<i64>,
    #[serde(default, alias = "NUM_COMMENTS", deserialize_with = "opt_i64")]
    pub num_comments: Option<i64>,
    #[serde(default, alias = "SUBREDDIT", deserialize_with = "opt_string")]
    pub subreddit: Option<String>,
    #[serde(default, alias = "SCRAPED_AT", alias = "scrape_timestamp", deserialize_with = "opt_timestamp")]
    pub scraped_at: Option<Timestamp>,
}

/// The single authoritative record per `post_id`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalPost {
    pub post_id: String,
    pub post_date: String,
    pub post_timestamp: Option<i64>,
    pub post_flair: String,
    pub title: String,
    pub url: String,
    pub content: String,
    pub score: i64,
    pub num_comments: i64,
    pub subreddit: String,
    pub scraped_at: Option<Timestamp>,
    pub content_hash: String,
}

/// Canonical post plus redacted text, metrics and the routing flag.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SanitizedPost {
    #[serde(flatten)]
    pub post: CanonicalPost,
    pub text_raw: String,
    pub text_for_llm: String,
    pub n_chars: u64,
    pub n_words: u64,
    pub n_sentences: u64,
    pub n_questions: u64,
    pub n_exclaims: u64,
    pub n_urls_redacted: u64,
    pub n_emails_redacted: u64,
    pub n_phones_redacted: u64,
    pub n_usernames_redacted: u64,
    pub n_subreddits_redacted: u64,
    pub token_estimate: u64,
    pub lang_hint: String,
    pub needs_annotation: bool,
}

/// Externally produced judgment about a post. Read-only here.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct AnnotationRecord {
    #[serde(default, deserialize_with = "opt_string")]
    pub post_id: Option<String>,
    #[serde(flatten)]
    pub fields: AnnotationFields,
}

/// Annotation columns as they appear on the annotated view (null when unmatched).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationFields {
    #[serde(default, deserialize_with = "opt_string")]
    pub primary_group: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub primary_topic: Option<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub secondary_topics: Vec<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub trimester: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub sentiment: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub urgency_0_3: Option<i64>,
    #[serde(default, deserialize_with = "string_list")]
    pub keywords: Vec<String>,
    #[serde(default, deserialize_with = "string_list")]
    pub safety_flags: Vec<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub post_summary: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub care_response: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub model_name: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub model_version: Option<String>,
    #[serde(default, deserialize_with = "opt_string")]
    pub prompt_hash: Option<String>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub input_tokens: Option<i64>,
    #[serde(default, deserialize_with = "opt_i64")]
    pub output_tokens: Option<i64>,
    #[serde(default, deserialize_with = "opt_string")]
    pub annotated_at: Option<String>,
}

/// Sanitized post left-joined with zero-or-one annotation (fan-out on duplicates).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedPost {
    #[serde(flatten)]
    pub post: SanitizedPost,
    #[serde(flatten)]
    pub annotation: AnnotationColumns,
}

/// Serialized form of the annotation half of [`AnnotatedPost`]: lists are null, not `[]`,
/// when no annotation matched.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnnotationColumns {
    pub primary_group: Option<String>,
    pub primary_topic: Option<String>,
    pub secondary_topics: Option<Vec<String>>,
    pub trimester: Option<String>,
    pub sentiment: Option<String>,
    pub urgency_0_3: Option<i64>,
    pub keywords: Option<Vec<String>>,
    pub safety_flags: Option<Vec<String>>,
    pub post_summary: Option<String>,
    pub care_response: Option<String>,
    pub model_name: Option<String>,
    pub model_version: Option<String>,
    pub prompt_hash: Option<String>,
    pub input_tokens: Option<i64>,
    pub output_tokens: Option<i64>,
    pub annotated_at: Option<String>,
}

impl AnnotationColumns {
    pub fn matched(f: &AnnotationFields) -> Self {
        Self {
            primary_group: f.primary_group.clone(),
            primary_topic: f.primary_topic.clone(),
            secondary_topics: Some(f.secondary_topics.clone()),
            trimester: f.trimester.clone(),
            sentiment: f.sentiment.clone(),
            urgency_0_3: f.urgency_0_3,
            keywords: Some(f.keywords.clone()),
            safety_flags: Some(f.safety_flags.clone()),
            post_summary: f.post_summary.clone(),
            care_response: f.care_response.clone(),
            model_name: f.model_name.clone(),
            model_version: f.model_version.clone(),
            prompt_hash: f.prompt_hash.clone(),
            input_tokens: f.input_tokens,
            output_tokens: f.output_tokens,
            annotated_at: f.annotated_at.clone(),
        }
    }

    /// True when this row carries an annotation. `annotated_at` alone is not trusted;
    /// the list columns are only ever `Some` on matched rows.
    pub fn is_matched(&self) -> bool {
        self.safety_flags.is_some() || self.keywords.is_some()
    }
}

impl AnnotatedPost {
    pub fn post_id(&self) -> &str {
        &self.post.post.post_id
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRow {
    pub post_id: String,
    pub keyword: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFlagRow {
    pub post_id: String,
    pub safety_flag: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicRow {
    pub post_id: String,
    pub topic: String,
}

/// Fixed boolean view over the tracked safety categories.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyIndicatorRow {
    pub post_id: String,
    pub is_urgent_bleeding: bool,
    pub is_urgent_pain: bool,
    pub is_urgent_fetal_concern: bool,
    pub is_mh_crisis: bool,
}

/// Hand-off row for the external annotator. Carries redacted text only.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRequest {
    pub post_id: String,
    pub text_for_llm: String,
}
