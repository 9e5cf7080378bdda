use anyhow::Result;
use bumpetl::{set_global_multiprogress, views, Pipeline, SanitizeCfg};
use indicatif::MultiProgress;
use std::path::PathBuf;
use std::sync::Arc;

const DATA_ROOT: &str = "./data";
const ANNOTATIONS_FILE: &str = "annotations/annotations.jsonl";

fn main() -> Result<()> {
    let base_dir = PathBuf::from(DATA_ROOT);
    let hw = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(8);
    set_global_multiprogress(Arc::new(MultiProgress::new()));

    let pipeline = Pipeline::new()
        .raw_dir(base_dir.join("raw"))
        .annotations(base_dir.join(ANNOTATIONS_FILE))
        .out_dir(base_dir.join("views"))
        .sanitize(SanitizeCfg::default().with_env_overrides())
        .parallelism(hw)
        .file_concurrency(4)
        .progress(true)
        .progress_label("Loading raw posts");

    let bad = pipeline.check_raw_integrity()?;
    for (path, err) in &bad {
        eprintln!("corrupt input {}: {}", path.display(), err);
    }

    let report = pipeline.rebuild()?;
    if let Some(t) = report.dedupe {
        println!("Raw rows: {} ({} without post_id, {} re-scrapes collapsed)", t.input, t.missing_id, t.superseded);
    }
    for name in [views::CANONICAL, views::SANITIZED, views::ANNOTATED, views::ANNOTATION_QUEUE] {
        println!("{:<28} {}", name, report.rows(name).unwrap_or(0));
    }

    Ok(())
}
