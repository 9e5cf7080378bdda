mod config;
mod timestamp;
mod paths;
mod zstd_jsonl;
mod load;

mod progress;
mod concurrency;
mod util;
mod pipeline;

mod json_utils;
mod ndjson;
mod records;

mod normalize;
mod dedupe;
mod redact;
mod metrics;
mod sanitize;
mod join;
mod projection;

pub use crate::config::{parse_flag, PipelineOptions, SanitizeCfg};
pub use crate::timestamp::Timestamp;
pub use crate::pipeline::{BuildReport, Pipeline, Stage};
pub use crate::paths::{classify, discover_inputs, views, InputFile, InputFormat};

// Row types for every view.
pub use crate::records::{
    AnnotatedPost, AnnotationColumns, AnnotationFields, AnnotationRecord, AnnotationRequest, CanonicalPost,
    KeywordRow, RawPost, SafetyFlagRow, SafetyIndicatorRow, SanitizedPost, TopicRow,
};

// Stage functions, usable without the pipeline driver.
pub use crate::normalize::{collapse_whitespace, content_fingerprint, normalize_body, normalize_subreddit, normalize_title};
pub use crate::dedupe::{canonicalize, dedupe_latest, DedupeTally, Sequenced};
pub use crate::redact::{RedactionChain, RedactionCounts, RedactionKind, RedactionRule};
pub use crate::metrics::{
    language_hint, needs_annotation, sentence_count, token_estimate, word_count, TextMetrics, MAX_TOKENS, MAX_WORDS,
    MIN_WORDS, PRIMARY_LANG, UNKNOWN_LANG,
};
pub use crate::sanitize::{redact_and_measure, sanitize_all, sanitize_post};
pub use crate::join::{join_annotations, pending_annotations, URGENCY_RANGE};
pub use crate::projection::{
    explode_keywords, explode_safety_flags, explode_secondary_topics, indicator_rows, safety_indicators,
    MENTAL_HEALTH_CRISIS, TRACKED_SAFETY_FLAGS, URGENT_BLEEDING, URGENT_FETAL_CONCERN, URGENT_PAIN,
};

// Expose multiprogress and progress helpers.
pub use crate::progress::{set_global_multiprogress, ProgressScope};

// zstd validator for vetting a raw drop.
pub use crate::zstd_jsonl::validate_zst_full;

//export robust file ops from util so binaries can import from crate root.
pub use crate::util::{create_with_backoff, open_with_backoff, remove_with_backoff, replace_file_atomic_backoff};

// export NDJSON view helpers
pub use crate::ndjson::{read_view, write_view, NdjsonWriter};
