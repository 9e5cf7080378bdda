use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use walkdir::WalkDir;

/// Encoding of an input file, decided by its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputFormat {
    Ndjson,    // *.jsonl, *.ndjson
    NdjsonZst, // *.jsonl.zst, *.ndjson.zst
    Csv,       // *.csv (scraper output)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InputFile {
    pub format: InputFormat,
    pub path: PathBuf,
}

fn input_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\.(jsonl|ndjson|csv)(\.zst)?$").expect("static regex"))
}

pub fn classify(name: &str) -> Option<InputFormat> {
    let caps = input_name_re().captures(name)?;
    let zst = caps.get(2).is_some();
    match (caps[1].to_ascii_lowercase().as_str(), zst) {
        ("csv", false) => Some(InputFormat::Csv),
        ("csv", true) => None,
        (_, false) => Some(InputFormat::Ndjson),
        (_, true) => Some(InputFormat::NdjsonZst),
    }
}

/// All supported inputs under `root` (recursive), sorted by path. A single file is accepted
/// as-is when its name is supported. Hidden entries and `*.inprogress` temp files are skipped.
pub fn discover_inputs(root: &Path) -> Vec<InputFile> {
    let mut out = Vec::new();
    if root.is_file() {
        if let Some(format) = root.file_name().and_then(|n| n.to_str()).and_then(classify) {
            out.push(InputFile { format, path: root.to_path_buf() });
        }
        return out;
    }
    if !root.exists() {
        return out;
    }
    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !e.file_name().to_str().map(|s| s.starts_with('.')).unwrap_or(false));
    for entry in walker {
        if let Ok(ent) = entry {
            if !ent.file_type().is_file() {
                continue;
            }
            if let Some(format) = ent.file_name().to_str().and_then(classify) {
                out.push(InputFile { format, path: ent.path().to_path_buf() });
            }
        }
    }
    out.sort_by(|a, b| a.path.cmp(&b.path));
    out
}

/// File names of the materialized views under the output directory.
pub mod views {
    pub const CANONICAL: &str = "canonical_posts.ndjson";
    pub const SANITIZED: &str = "sanitized_posts.ndjson";
    pub const ANNOTATED: &str = "annotated_posts.ndjson";
    pub const KEYWORDS: &str = "post_keywords.ndjson";
    pub const SAFETY_FLAGS: &str = "post_safety_flags.ndjson";
    pub const SECONDARY_TOPICS: &str = "post_secondary_topics.ndjson";
    pub const SAFETY_INDICATORS: &str = "post_safety_indicators.ndjson";
    pub const ANNOTATION_QUEUE: &str = "annotation_queue.ndjson";
}
