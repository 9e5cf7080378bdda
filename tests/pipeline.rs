#[path = "common/mod.rs"]
mod common;

use bumpetl::{views, Pipeline, SanitizeCfg, Stage};
use common::*;
use std::fs;
use std::path::Path;

fn pipeline_for(base: &Path, out: &Path) -> Pipeline {
    Pipeline::new()
        .raw_dir(base.join("raw"))
        .annotations(base.join("annotations").join("annotations.jsonl"))
        .out_dir(out)
        .sanitize(SanitizeCfg::default())
        .file_concurrency(2)
        .progress(false)
}

const ALL_VIEWS: [&str; 8] = [
    views::CANONICAL,
    views::SANITIZED,
    views::ANNOTATED,
    views::KEYWORDS,
    views::SAFETY_FLAGS,
    views::SECONDARY_TOPICS,
    views::SAFETY_INDICATORS,
    views::ANNOTATION_QUEUE,
];

/// Full rebuild over a mixed raw drop (jsonl + jsonl.zst + csv) with annotations:
/// - canonical holds p1 (latest scrape) p2 p4 p5, sorted; the id-less and malformed rows are gone,
/// - sanitized drops p4 (empty body) and redacts p1,
/// - annotated is a left join; projections and queue follow from it.
#[test]
fn rebuild_materializes_every_view() {
    let corpus = make_corpus_basic();
    let base = corpus.path();
    let out = base.join("views");

    let report = pipeline_for(base, &out).rebuild().unwrap();

    let tally = report.dedupe.unwrap();
    assert_eq!(tally.input, 6);
    assert_eq!(tally.missing_id, 1);
    assert_eq!(tally.superseded, 1);
    assert_eq!(tally.output, 4);
    assert_eq!(report.raw_rows_skipped, 1);

    let canonical = read_jsonl_values(&out.join(views::CANONICAL));
    let ids: Vec<&str> = canonical.iter().map(|r| r["post_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p4", "p5"]);
    assert_eq!(canonical[0]["content"], P1_LATEST);
    assert_eq!(canonical[0]["scraped_at"], "2024-05-02T08:30:00Z");
    assert_eq!(canonical[1]["subreddit"], "pregnant");
    assert_eq!(canonical[1]["title"], "Sleep tips");
    assert_eq!(canonical[3]["num_comments"], 0, "empty CSV cell defaults to zero");
    assert_eq!(canonical[3]["post_timestamp"], 1714730400);

    let sanitized = read_jsonl_values(&out.join(views::SANITIZED));
    assert_eq!(sanitized.len(), 3);
    let p1 = rows_for(&sanitized, "p1")[0];
    assert_eq!(p1["text_for_llm"], "Bleeding at 12 weeks, call me at [PHONE] or email [EMAIL] please help!");
    assert_eq!(p1["text_raw"], P1_LATEST);
    assert_eq!(p1["n_phones_redacted"], 1);
    assert_eq!(p1["n_emails_redacted"], 1);
    let p5 = rows_for(&sanitized, "p5")[0];
    assert_eq!(p5["text_for_llm"], "Visit [URL] and ask u/[USER] in r/[SUB] about cramps at 30 weeks");

    let annotated = read_jsonl_values(&out.join(views::ANNOTATED));
    assert_eq!(annotated.len(), 3);
    assert_eq!(rows_for(&annotated, "p1")[0]["urgency_0_3"], 3);
    assert!(rows_for(&annotated, "p5")[0]["primary_topic"].is_null());
    assert!(rows_for(&annotated, "p99").is_empty());

    let keywords = read_jsonl_values(&out.join(views::KEYWORDS));
    let kw: Vec<&str> = keywords.iter().map(|r| r["keyword"].as_str().unwrap()).collect();
    assert_eq!(kw, vec!["bleeding", "help", "sleep"]);

    let flags = read_jsonl_values(&out.join(views::SAFETY_FLAGS));
    assert_eq!(flags.len(), 2);

    let topics = read_jsonl_values(&out.join(views::SECONDARY_TOPICS));
    assert_eq!(topics.len(), 1);

    let indicators = read_jsonl_values(&out.join(views::SAFETY_INDICATORS));
    assert_eq!(indicators.len(), 2);
    let i1 = rows_for(&indicators, "p1")[0];
    assert_eq!(i1["is_urgent_bleeding"], true);
    assert_eq!(i1["is_mh_crisis"], true);
    assert_eq!(i1["is_urgent_pain"], false);
    let i2 = rows_for(&indicators, "p2")[0];
    assert_eq!(i2["is_urgent_bleeding"], false);

    let queue = read_jsonl_values(&out.join(views::ANNOTATION_QUEUE));
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0]["post_id"], "p5");
    assert!(queue[0].get("text_raw").is_none());
    assert!(queue[0].get("content").is_none());

    for name in ALL_VIEWS {
        assert_eq!(report.rows(name), Some(read_jsonl_values(&out.join(name)).len() as u64), "{name}");
        let mut tmp = out.join(name).into_os_string();
        tmp.push(".inprogress");
        assert!(!Path::new(&tmp).exists(), "temp file left behind for {name}");
    }
}

/// Rebuilding over the same inputs reproduces every view byte for byte.
#[test]
fn rebuild_is_deterministic() {
    let corpus = make_corpus_basic();
    let base = corpus.path();
    let out = base.join("views");

    pipeline_for(base, &out).rebuild().unwrap();
    let first: Vec<Vec<u8>> = ALL_VIEWS.iter().map(|n| fs::read(out.join(n)).unwrap()).collect();

    pipeline_for(base, &out).rebuild().unwrap();
    let second: Vec<Vec<u8>> = ALL_VIEWS.iter().map(|n| fs::read(out.join(n)).unwrap()).collect();

    assert_eq!(first, second);
}

/// Each stage rerun from the materialized upstream view writes the same bytes as the
/// full rebuild did.
#[test]
fn stage_reruns_match_full_rebuild() {
    let corpus = make_corpus_basic();
    let base = corpus.path();
    let out = base.join("views");

    pipeline_for(base, &out).rebuild().unwrap();
    let snapshot: Vec<Vec<u8>> = ALL_VIEWS.iter().map(|n| fs::read(out.join(n)).unwrap()).collect();

    for stage in [Stage::Canonical, Stage::Sanitized, Stage::Annotated, Stage::Projections, Stage::Queue] {
        let report = pipeline_for(base, &out).run_stage(stage).unwrap();
        assert!(!report.views.is_empty(), "{stage:?} wrote nothing");
    }

    let after: Vec<Vec<u8>> = ALL_VIEWS.iter().map(|n| fs::read(out.join(n)).unwrap()).collect();
    assert_eq!(snapshot, after);
}

/// A stage whose upstream view was never materialized fails instead of writing an empty view.
#[test]
fn stage_without_upstream_view_fails() {
    let corpus = make_corpus_basic();
    let base = corpus.path();
    let out = base.join("fresh_views");

    let err = pipeline_for(base, &out).run_stage(Stage::Sanitized).unwrap_err();
    assert!(err.to_string().contains("not materialized"), "{err:#}");
    assert!(!out.join(views::SANITIZED).exists());
}

/// Without annotator output every sanitized post joins to nulls, no projection rows exist,
/// and every eligible post is queued. A queue limit caps it.
#[test]
fn missing_annotations_mean_nothing_annotated() {
    let corpus = make_corpus_basic();
    let base = corpus.path();
    let out = base.join("views");

    let report = pipeline_for(base, &out)
        .annotations(base.join("annotations").join("does_not_exist.jsonl"))
        .rebuild()
        .unwrap();

    assert_eq!(report.rows(views::ANNOTATED), Some(3));
    assert_eq!(report.rows(views::KEYWORDS), Some(0));
    assert_eq!(report.rows(views::SAFETY_INDICATORS), Some(0));
    let queue = read_jsonl_values(&out.join(views::ANNOTATION_QUEUE));
    let ids: Vec<&str> = queue.iter().map(|r| r["post_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["p1", "p2", "p5"]);

    let report = pipeline_for(base, &out)
        .annotations(base.join("annotations").join("does_not_exist.jsonl"))
        .queue_limit(2)
        .run_stage(Stage::Queue)
        .unwrap();
    assert_eq!(report.rows(views::ANNOTATION_QUEUE), Some(2));
}

/// Annotator output exported as CSV (lists as Python literals) joins the same way as JSONL.
#[test]
fn csv_annotations_are_accepted() {
    let corpus = make_corpus_basic();
    let base = corpus.path();
    let out = base.join("views");
    let csv_path = base.join("annotations_csv").join("annotations.csv");
    fs::create_dir_all(csv_path.parent().unwrap()).unwrap();
    fs::write(
        &csv_path,
        "post_id,primary_topic,urgency_0_3,keywords,safety_flags,secondary_topics\n\
         p5,cramps,1,\"['Cramps', 'Third Trimester']\",\"['urgent_pain']\",\n",
    )
    .unwrap();

    pipeline_for(base, &out).annotations(&csv_path).rebuild().unwrap();

    let annotated = read_jsonl_values(&out.join(views::ANNOTATED));
    let p5 = rows_for(&annotated, "p5")[0];
    assert_eq!(p5["urgency_0_3"], 1);
    assert_eq!(p5["keywords"], serde_json::json!(["Cramps", "Third Trimester"]));
    assert_eq!(p5["secondary_topics"], serde_json::json!([]));

    let indicators = read_jsonl_values(&out.join(views::SAFETY_INDICATORS));
    assert_eq!(indicators.len(), 1);
    assert_eq!(indicators[0]["is_urgent_pain"], true);

    let queue = read_jsonl_values(&out.join(views::ANNOTATION_QUEUE));
    let ids: Vec<&str> = queue.iter().map(|r| r["post_id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["p1", "p2"]);
}

/// A corrupt compressed input is reported by the integrity check, and a rebuild still
/// completes from the readable files.
#[test]
fn corrupt_input_is_reported_and_skipped() {
    let corpus = make_corpus_basic();
    let base = corpus.path();
    add_corrupt_raw(base);
    let out = base.join("views");

    let bad = pipeline_for(base, &out).check_raw_integrity().unwrap();
    assert_eq!(bad.len(), 1);
    assert!(bad[0].0.ends_with("z_broken.jsonl.zst"));

    let report = pipeline_for(base, &out).rebuild().unwrap();
    assert_eq!(report.rows(views::CANONICAL), Some(4));
}
