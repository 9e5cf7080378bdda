//! Typed loading of raw posts and annotation records from discovered input files.

use crate::paths::{InputFile, InputFormat};
use crate::util::open_with_backoff;
use crate::zstd_jsonl::{for_each_line_with_progress, warn_decode_skip};
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::fs;
use std::io::BufReader;

/// Rows decoded from one file plus the count of rows that could not be decoded.
#[derive(Debug)]
pub struct Loaded<T> {
    pub rows: Vec<T>,
    pub skipped: u64,
}

/// Decode every row of `file` into `T`. Malformed rows are skipped and counted; an undecodable
/// file yields whatever was read before the failure.
pub fn load_file<T: DeserializeOwned>(
    file: &InputFile,
    read_buf_bytes: usize,
    on_progress: impl FnMut(u64),
) -> Result<Loaded<T>> {
    match file.format {
        InputFormat::Ndjson => load_ndjson(file, false, read_buf_bytes, on_progress),
        InputFormat::NdjsonZst => load_ndjson(file, true, read_buf_bytes, on_progress),
        InputFormat::Csv => load_csv(file, read_buf_bytes, on_progress),
    }
}

fn load_ndjson<T: DeserializeOwned>(
    file: &InputFile,
    compressed: bool,
    read_buf_bytes: usize,
    on_progress: impl FnMut(u64),
) -> Result<Loaded<T>> {
    let mut rows = Vec::new();
    let mut skipped = 0u64;
    let mut lineno = 0u64;
    for_each_line_with_progress(&file.path, compressed, read_buf_bytes, on_progress, |line| {
        lineno += 1;
        if line.trim().is_empty() {
            return Ok(());
        }
        match serde_json::from_str::<T>(line) {
            Ok(v) => rows.push(v),
            Err(e) => {
                skipped += 1;
                tracing::warn!("{}:{}: skipping malformed row: {}", file.path.display(), lineno, e);
            }
        }
        Ok(())
    })?;
    Ok(Loaded { rows, skipped })
}

/// CSV with a header row. Cells become JSON strings (empty → null) so the lenient column
/// decoders on the record types apply unchanged.
fn load_csv<T: DeserializeOwned>(
    file: &InputFile,
    read_buf_bytes: usize,
    mut on_progress: impl FnMut(u64),
) -> Result<Loaded<T>> {
    let f = open_with_backoff(&file.path, 16, 50).with_context(|| format!("open {}", file.path.display()))?;
    let size = fs::metadata(&file.path).map(|m| m.len()).unwrap_or(0);
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(BufReader::with_capacity(read_buf_bytes.max(8 * 1024), f));

    let headers: Vec<String> = match rdr.headers() {
        // Raw-table exports upper-case every column (`POST_ID`, `SCRAPED_AT`).
        Ok(h) => h.iter().map(|s| s.trim().trim_start_matches('\u{feff}').to_lowercase()).collect(),
        Err(e) => {
            warn_decode_skip(&file.path, &anyhow::Error::new(e));
            on_progress(size);
            return Ok(Loaded { rows: Vec::new(), skipped: 0 });
        }
    };

    let mut rows = Vec::new();
    let mut skipped = 0u64;
    for (i, rec) in rdr.records().enumerate() {
        let rec = match rec {
            Ok(r) => r,
            Err(e) => {
                skipped += 1;
                tracing::warn!("{}: row {}: skipping unreadable CSV record: {}", file.path.display(), i + 1, e);
                continue;
            }
        };
        let mut obj = Map::with_capacity(headers.len());
        for (h, cell) in headers.iter().zip(rec.iter()) {
            // Unnamed index columns (pandas `to_csv` default) carry nothing.
            if h.is_empty() || h.starts_with("unnamed:") {
                continue;
            }
            let v = if cell.is_empty() { Value::Null } else { Value::String(cell.to_string()) };
            obj.insert(h.clone(), v);
        }
        match serde_json::from_value::<T>(Value::Object(obj)) {
            Ok(v) => rows.push(v),
            Err(e) => {
                skipped += 1;
                tracing::warn!("{}: row {}: skipping malformed row: {}", file.path.display(), i + 1, e);
            }
        }
    }
    on_progress(size);
    Ok(Loaded { rows, skipped })
}
