use std::path::{Path, PathBuf};

/// Switches for the two redaction-engine variants seen in production.
/// Defaults: collapse after redaction, compute the language hint, and require it for routing.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SanitizeCfg {
    pub collapse_whitespace: bool, // collapse whitespace runs after the redaction chain
    pub language_hint: bool,       // false => lang_hint is always "unknown"
    pub require_language: bool,    // gate needs_annotation on lang_hint == "en" (only if language_hint)
}

impl Default for SanitizeCfg {
    fn default() -> Self {
        Self { collapse_whitespace: true, language_hint: true, require_language: true }
    }
}

impl SanitizeCfg {
    pub fn with_collapse_whitespace(mut self, yes: bool) -> Self {
        self.collapse_whitespace = yes;
        self
    }
    pub fn with_language_hint(mut self, yes: bool) -> Self {
        self.language_hint = yes;
        self
    }
    pub fn with_require_language(mut self, yes: bool) -> Self {
        self.require_language = yes;
        self
    }

    /// Language gating only applies when the heuristic is on.
    pub fn gates_on_language(&self) -> bool {
        self.language_hint && self.require_language
    }

    /// Apply overrides from the environment:
    /// - ETL_COLLAPSE_WHITESPACE
    /// - ETL_LANGUAGE_HINT
    /// - ETL_REQUIRE_LANGUAGE
    /// Values: 1/0, true/false, yes/no, on/off. Anything else is ignored with a warning.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(v) = env_flag("ETL_COLLAPSE_WHITESPACE") { self.collapse_whitespace = v; }
        if let Some(v) = env_flag("ETL_LANGUAGE_HINT") { self.language_hint = v; }
        if let Some(v) = env_flag("ETL_REQUIRE_LANGUAGE") { self.require_language = v; }
        self
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let raw = std::env::var(key).ok()?;
    let parsed = parse_flag(&raw);
    if parsed.is_none() {
        tracing::warn!("{} has unrecognized value {:?}; ignoring", key, raw);
    }
    parsed
}

pub fn parse_flag(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// User-facing options with sensible defaults and builder chaining.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub raw_dir: PathBuf,                 // scraped posts (.jsonl/.ndjson[.zst], .csv), searched recursively
    pub annotations: Option<PathBuf>,     // annotator output: file or directory; None => no annotations yet
    pub out_dir: PathBuf,                 // materialized views
    pub sanitize: SanitizeCfg,
    pub queue_limit: Option<usize>,       // cap on annotation_queue rows
    pub parallelism: Option<usize>,       // Some(N) to set rayon threads, None to use default
    pub file_concurrency: usize,          // limit number of input files decoded concurrently
    pub progress: bool,                   // show progress bars
    pub progress_label: Option<String>,   // optional label for the load bar

    // IO tuning
    pub read_buffer_bytes: usize,         // BufReader capacity
    pub write_buffer_bytes: usize,        // BufWriter capacity
}

impl Default for PipelineOptions {
    fn default() -> Self {
        let base = PathBuf::from("./data");
        Self {
            raw_dir: base.join("raw"),
            annotations: None,
            out_dir: base.join("views"),
            sanitize: SanitizeCfg::default(),
            queue_limit: None,
            parallelism: None,
            file_concurrency: 4,
            progress: true,
            progress_label: None,

            read_buffer_bytes: 256 * 1024,
            write_buffer_bytes: 256 * 1024,
        }
    }
}

impl PipelineOptions {
    pub fn with_raw_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.raw_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_annotations(mut self, path: impl AsRef<Path>) -> Self {
        self.annotations = Some(path.as_ref().to_path_buf());
        self
    }
    pub fn with_out_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.out_dir = dir.as_ref().to_path_buf();
        self
    }
    pub fn with_sanitize(mut self, cfg: SanitizeCfg) -> Self {
        self.sanitize = cfg;
        self
    }
    pub fn with_queue_limit(mut self, limit: usize) -> Self {
        self.queue_limit = Some(limit);
        self
    }
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }
    pub fn with_file_concurrency(mut self, n: usize) -> Self {
        self.file_concurrency = n.max(1);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_progress_label(mut self, label: impl Into<String>) -> Self {
        self.progress_label = Some(label.into());
        self
    }

    // IO buffers tuning
    pub fn with_io_read_buffer(mut self, bytes: usize) -> Self {
        self.read_buffer_bytes = bytes.max(8 * 1024);
        self
    }
    pub fn with_io_write_buffer(mut self, bytes: usize) -> Self {
        self.write_buffer_bytes = bytes.max(8 * 1024);
        self
    }
}
