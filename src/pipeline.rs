use crate::concurrency::map_limited;
use crate::config::{PipelineOptions, SanitizeCfg};
use crate::dedupe::{dedupe_latest, DedupeTally, Sequenced};
use crate::join::{join_annotations, pending_annotations};
use crate::load::{load_file, Loaded};
use crate::ndjson::{read_view, write_view};
use crate::paths::{discover_inputs, views, InputFile, InputFormat};
use crate::progress::{total_input_size, ProgressScope};
use crate::projection::{explode_keywords, explode_safety_flags, explode_secondary_topics, indicator_rows};
use crate::records::{AnnotatedPost, AnnotationRecord, CanonicalPost, RawPost, SanitizedPost};
use crate::redact::RedactionChain;
use crate::sanitize::sanitize_all;
use crate::util::{ensure_dir, init_tracing_once};
use crate::zstd_jsonl::validate_zst_full;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One materialization step. Each reads the latest materialized output of its upstream step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// raw inputs → `canonical_posts`
    Canonical,
    /// `canonical_posts` → `sanitized_posts`
    Sanitized,
    /// `sanitized_posts` + annotations → `annotated_posts`
    Annotated,
    /// `annotated_posts` → keyword / safety-flag / topic / indicator views
    Projections,
    /// `sanitized_posts` + annotations → `annotation_queue`
    Queue,
}

/// Rows written per view, plus dedupe accounting when the canonical stage ran.
#[derive(Clone, Debug, Default)]
pub struct BuildReport {
    pub views: BTreeMap<&'static str, u64>,
    pub dedupe: Option<DedupeTally>,
    pub raw_rows_skipped: u64,
    pub annotation_rows_skipped: u64,
}

impl BuildReport {
    /// Rows written to view `name` (e.g. `views::SANITIZED`), if it was written.
    pub fn rows(&self, name: &str) -> Option<u64> {
        self.views.get(name).copied()
    }
}

#[derive(Clone)]
pub struct Pipeline {
    pub(crate) opts: PipelineOptions,
    chain: RedactionChain,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self { opts: PipelineOptions::default(), chain: RedactionChain::standard() }
    }

    // -------- Builder methods --------
    pub fn raw_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_raw_dir(dir); self }
    pub fn annotations(mut self, path: impl AsRef<Path>) -> Self { self.opts = self.opts.with_annotations(path); self }
    pub fn out_dir(mut self, dir: impl AsRef<Path>) -> Self { self.opts = self.opts.with_out_dir(dir); self }
    pub fn sanitize(mut self, cfg: SanitizeCfg) -> Self { self.opts = self.opts.with_sanitize(cfg); self }
    pub fn queue_limit(mut self, limit: usize) -> Self { self.opts = self.opts.with_queue_limit(limit); self }
    pub fn parallelism(mut self, threads: usize) -> Self { self.opts = self.opts.with_parallelism(threads); self }
    pub fn file_concurrency(mut self, n: usize) -> Self { self.opts = self.opts.with_file_concurrency(n); self }
    pub fn progress(mut self, yes: bool) -> Self { self.opts = self.opts.with_progress(yes); self }
    pub fn progress_label(mut self, label: impl Into<String>) -> Self { self.opts = self.opts.with_progress_label(label); self }
    pub fn io_read_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_read_buffer(bytes); self }
    pub fn io_write_buffer(mut self, bytes: usize) -> Self { self.opts = self.opts.with_io_write_buffer(bytes); self }

    pub fn options(&self) -> &PipelineOptions {
        &self.opts
    }

    pub fn view_path(&self, name: &str) -> PathBuf {
        self.opts.out_dir.join(name)
    }

    fn prepare(&self) -> Result<()> {
        init_tracing_once();
        if let Some(n) = self.opts.parallelism { if n > 0 { rayon::ThreadPoolBuilder::new().num_threads(n).build_global().ok(); } }
        for rule in self.chain.rules() {
            tracing::debug!("redaction rule {:?}: /{}/ -> {}", rule.kind, rule.pattern(), rule.kind.token());
        }
        ensure_dir(&self.opts.out_dir)
    }

    // -------- Loading --------

    fn load_all<T: DeserializeOwned + Send>(&self, files: &[InputFile], label: &str) -> Result<Vec<Loaded<T>>> {
        let pb = if self.opts.progress {
            let label = self.opts.progress_label.clone().unwrap_or_else(|| label.to_string());
            Some(ProgressScope::bytes(label, total_input_size(files)))
        } else {
            None
        };
        let read_buf = self.opts.read_buffer_bytes;
        let loaded = map_limited(files, self.opts.file_concurrency, |f| {
            load_file::<T>(f, read_buf, |delta| { if let Some(pb) = &pb { pb.inc_bytes(delta); } })
                .with_context(|| format!("loading {}", f.path.display()))
        })?;
        if let Some(pb) = pb { pb.finish("done"); }
        Ok(loaded)
    }

    /// Every raw row under `raw_dir`, tagged with its ingestion sequence number.
    pub fn load_raw(&self) -> Result<(Vec<Sequenced>, u64)> {
        init_tracing_once();
        let files = discover_inputs(&self.opts.raw_dir);
        if files.is_empty() {
            tracing::warn!("No raw inputs found under {}. Check raw_dir.", self.opts.raw_dir.display());
        } else {
            tracing::info!("Planned {} raw files for loading.", files.len());
        }

        let loaded = self.load_all::<RawPost>(&files, "Load raw posts")?;
        let mut skipped = 0u64;
        let mut seq = 0u64;
        let mut out = Vec::new();
        for part in loaded {
            skipped += part.skipped;
            for raw in part.rows {
                out.push(Sequenced { seq, raw });
                seq += 1;
            }
        }
        Ok((out, skipped))
    }

    /// Annotator output. A missing path means nothing has been annotated yet.
    pub fn load_annotations(&self) -> Result<(Vec<AnnotationRecord>, u64)> {
        init_tracing_once();
        let path = match &self.opts.annotations {
            Some(p) if p.exists() => p,
            Some(p) => {
                tracing::info!("Annotation source {} not present; treating as empty.", p.display());
                return Ok((Vec::new(), 0));
            }
            None => return Ok((Vec::new(), 0)),
        };
        let files = discover_inputs(path);
        let loaded = self.load_all::<AnnotationRecord>(&files, "Load annotations")?;
        let mut skipped = 0u64;
        let mut out = Vec::new();
        for part in loaded {
            skipped += part.skipped;
            out.extend(part.rows);
        }
        tracing::info!("Loaded {} annotation records from {} files.", out.len(), files.len());
        Ok((out, skipped))
    }

    // -------- Full rebuild --------

    /// Recompute every view from raw input and materialize them all.
    pub fn rebuild(self) -> Result<BuildReport> {
        self.prepare()?;
        let mut report = BuildReport::default();

        let canonical = self.build_canonical(&mut report)?;
        let sanitized = sanitize_all(&canonical, &self.chain, &self.opts.sanitize, self.opts.progress);
        self.write(&mut report, views::SANITIZED, &sanitized)?;

        let annotations = self.annotations_into(&mut report)?;
        self.write_annotated_and_queue(&mut report, &sanitized, &annotations)?;
        Ok(report)
    }

    /// Rerun one stage against the latest materialized upstream view.
    pub fn run_stage(self, stage: Stage) -> Result<BuildReport> {
        self.prepare()?;
        let mut report = BuildReport::default();
        let read_buf = self.opts.read_buffer_bytes;
        match stage {
            Stage::Canonical => {
                self.build_canonical(&mut report)?;
            }
            Stage::Sanitized => {
                let canonical: Vec<CanonicalPost> = read_view(&self.view_path(views::CANONICAL), read_buf)?;
                let sanitized = sanitize_all(&canonical, &self.chain, &self.opts.sanitize, self.opts.progress);
                self.write(&mut report, views::SANITIZED, &sanitized)?;
            }
            Stage::Annotated => {
                let sanitized: Vec<SanitizedPost> = read_view(&self.view_path(views::SANITIZED), read_buf)?;
                let annotations = self.annotations_into(&mut report)?;
                let annotated = join_annotations(&sanitized, &annotations);
                self.write(&mut report, views::ANNOTATED, &annotated)?;
            }
            Stage::Projections => {
                let annotated: Vec<AnnotatedPost> = read_view(&self.view_path(views::ANNOTATED), read_buf)?;
                self.write_projections(&mut report, &annotated)?;
            }
            Stage::Queue => {
                let sanitized: Vec<SanitizedPost> = read_view(&self.view_path(views::SANITIZED), read_buf)?;
                let annotations = self.annotations_into(&mut report)?;
                let queue = pending_annotations(&sanitized, &annotations, self.opts.queue_limit);
                self.write(&mut report, views::ANNOTATION_QUEUE, &queue)?;
            }
        }
        Ok(report)
    }

    /// Decode every `.zst` raw input to EOF. Returns `(path, error)` for each that fails.
    pub fn check_raw_integrity(&self) -> Result<Vec<(PathBuf, String)>> {
        init_tracing_once();
        let files: Vec<InputFile> = discover_inputs(&self.opts.raw_dir)
            .into_iter()
            .filter(|f| f.format == InputFormat::NdjsonZst)
            .collect();
        let pb = if self.opts.progress { Some(ProgressScope::count("Integrity (full)", files.len() as u64)) } else { None };
        let results = map_limited(&files, self.opts.file_concurrency, |f| {
            let res = validate_zst_full(&f.path).err().map(|e| (f.path.clone(), e.to_string()));
            if let Some(pb) = &pb { pb.inc_items(1); }
            Ok(res)
        })?;
        if let Some(pb) = pb { pb.finish("done"); }
        Ok(results.into_iter().flatten().collect())
    }

    // -------- Stage bodies --------

    fn build_canonical(&self, report: &mut BuildReport) -> Result<Vec<CanonicalPost>> {
        let (raw, skipped) = self.load_raw()?;
        report.raw_rows_skipped = skipped;
        let (canonical, tally) = dedupe_latest(raw);
        if tally.missing_id > 0 {
            tracing::warn!("{} raw rows had no post_id and were dropped", tally.missing_id);
        }
        tracing::info!(
            "Deduped {} raw rows into {} canonical posts ({} superseded re-scrapes)",
            tally.input, tally.output, tally.superseded
        );
        report.dedupe = Some(tally);
        self.write(report, views::CANONICAL, &canonical)?;
        Ok(canonical)
    }

    fn annotations_into(&self, report: &mut BuildReport) -> Result<Vec<AnnotationRecord>> {
        let (annotations, skipped) = self.load_annotations()?;
        report.annotation_rows_skipped = skipped;
        Ok(annotations)
    }

    fn write_annotated_and_queue(
        &self,
        report: &mut BuildReport,
        sanitized: &[SanitizedPost],
        annotations: &[AnnotationRecord],
    ) -> Result<()> {
        let annotated = join_annotations(sanitized, annotations);
        self.write(report, views::ANNOTATED, &annotated)?;
        self.write_projections(report, &annotated)?;
        let queue = pending_annotations(sanitized, annotations, self.opts.queue_limit);
        self.write(report, views::ANNOTATION_QUEUE, &queue)?;
        Ok(())
    }

    fn write_projections(&self, report: &mut BuildReport, annotated: &[AnnotatedPost]) -> Result<()> {
        self.write(report, views::KEYWORDS, &explode_keywords(annotated))?;
        self.write(report, views::SAFETY_FLAGS, &explode_safety_flags(annotated))?;
        self.write(report, views::SECONDARY_TOPICS, &explode_secondary_topics(annotated))?;
        self.write(report, views::SAFETY_INDICATORS, &indicator_rows(annotated))?;
        Ok(())
    }

    fn write<T: serde::Serialize>(&self, report: &mut BuildReport, name: &'static str, rows: &[T]) -> Result<()> {
        let n = write_view(&self.view_path(name), rows, self.opts.write_buffer_bytes)?;
        tracing::info!("Materialized {} ({} rows)", name, n);
        report.views.insert(name, n);
        Ok(())
    }
}
