#![allow(dead_code)]

use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

/// Write a compressed `.zst` file containing the provided JSONL lines.
pub fn write_zst_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let f = File::create(path).unwrap();
    let mut enc = zstd::stream::write::Encoder::new(f, 3).unwrap();
    for l in lines {
        writeln!(&mut enc, "{}", l).unwrap();
    }
    enc.finish().unwrap();
}

/// Write plain JSONL lines.
pub fn write_lines(path: &Path, lines: &[String]) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    let mut f = File::create(path).unwrap();
    for l in lines {
        writeln!(&mut f, "{}", l).unwrap();
    }
}

/// Read a JSONL file into a vector of `serde_json::Value` (skips empty lines).
pub fn read_jsonl_values(path: &Path) -> Vec<Value> {
    let f = File::open(path).unwrap();
    let r = BufReader::new(f);
    r.lines()
        .map(|l| l.unwrap())
        .filter(|s| !s.is_empty())
        .map(|s| serde_json::from_str(&s).unwrap())
        .collect()
}

/// One scraper row as JSON text.
pub fn raw_line(id: &str, scraped_at: &str, subreddit: &str, title: &str, content: &str) -> String {
    json!({
        "post_id": id, "post_date": "2024-05-01", "post_timestamp": 1714557600,
        "post_flair": "Question", "title": title, "url": format!("https://reddit.com/r/x/comments/{id}"),
        "content": content, "score": 12, "num_comments": 3,
        "subreddit": subreddit, "scraped_at": scraped_at
    })
    .to_string()
}

pub const P1_FIRST: &str = "  old   draft text  ";
pub const P1_LATEST: &str =
    "Bleeding at 12 weeks, call me at +1 (555) 123-4567 or email jane@example.com please help!";
pub const P2_BODY: &str = "I am 20 weeks along and feeling great today, any tips for sleep?";
pub const P5_BODY: &str = "Visit www.example.org and ask u/helper in r/BabyBumps about cramps at 30 weeks";

/// Build a tiny raw drop plus annotator output:
/// - `raw/2024/a_posts.jsonl`: p1 (first scrape), p2, a row without `post_id`, one malformed line.
/// - `raw/2024/b_posts.jsonl.zst`: p1 re-scraped a day later, p4 with an empty body.
/// - `raw/2024/c_scrape.csv`: p5 (pandas-style export with an unnamed index column).
/// - `annotations/annotations.jsonl`: p1 (two flags, two keywords), p2 (no flags), orphan p99.
///
/// Expected: canonical p1 p2 p4 p5; sanitized p1 p2 p5; queue p5.
pub fn make_corpus_basic() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let base = dir.path();

    write_lines(
        &base.join("raw").join("2024").join("a_posts.jsonl"),
        &[
            raw_line("p1", "2024-05-01 10:00:00", "BabyBumps", "Help", P1_FIRST),
            raw_line("p2", "2024-05-01 10:00:00", " Pregnant ", "  Sleep tips  ", P2_BODY),
            json!({"title": "no id", "content": "orphan row", "scraped_at": "2024-05-01 10:00:00"}).to_string(),
            "{not json".to_string(),
        ],
    );

    write_zst_lines(
        &base.join("raw").join("2024").join("b_posts.jsonl.zst"),
        &[
            raw_line("p1", "2024-05-02T08:30:00Z", "BabyBumps", "Help", P1_LATEST),
            raw_line("p4", "2024-05-02T08:30:00Z", "BabyBumps", "Photo only", ""),
        ],
    );

    let csv = format!(
        ",post_id,post_date,post_timestamp,post_flair,title,url,content,score,num_comments,subreddit,scraped_at\n\
         0,p5,2024-05-03,1714730400,,Cramps,https://reddit.com/r/x/comments/p5,\"{P5_BODY}\",7,,BabyBumps,2024-05-03 12:00:00\n"
    );
    fs::write(base.join("raw").join("2024").join("c_scrape.csv"), csv).unwrap();

    write_lines(
        &base.join("annotations").join("annotations.jsonl"),
        &[
            json!({
                "post_id": "p1", "primary_group": "pregnant", "primary_topic": "bleeding",
                "secondary_topics": ["Symptoms"], "trimester": "first", "sentiment": "anxious",
                "urgency_0_3": 3, "keywords": ["Bleeding", "Help"],
                "safety_flags": ["urgent_bleeding", "mental_health_crisis"],
                "post_summary": "Bleeding at 12 weeks.", "care_response": "Contact your provider now.",
                "model_name": "annotator", "model_version": "1", "prompt_hash": "abc",
                "input_tokens": 120, "output_tokens": 40, "annotated_at": "2024-05-04T00:00:00Z"
            })
            .to_string(),
            json!({
                "post_id": "p2", "primary_group": "pregnant", "primary_topic": "sleep",
                "secondary_topics": [], "urgency_0_3": 0, "keywords": ["sleep"], "safety_flags": []
            })
            .to_string(),
            json!({"post_id": "p99", "keywords": ["ghost"], "safety_flags": ["urgent_pain"]}).to_string(),
        ],
    );

    dir
}

/// Add an invalid (non-zstd) `.jsonl.zst` file to the raw drop.
pub fn add_corrupt_raw(base: &Path) {
    let p = base.join("raw").join("2024").join("z_broken.jsonl.zst");
    fs::write(p, b"this is not zstd data").unwrap();
}

/// Rows of `rows` whose `post_id` equals `id`.
pub fn rows_for<'a>(rows: &'a [Value], id: &str) -> Vec<&'a Value> {
    rows.iter().filter(|r| r["post_id"] == id).collect()
}
