use crate::util::{create_with_backoff, replace_file_atomic_backoff};
use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// NDJSON writer that stages into `<final>.inprogress` and promotes atomically on
/// `finish`. Dropping it unfinished leaves the previous final file untouched.
pub struct NdjsonWriter {
    tmp: PathBuf,
    dest: PathBuf,
    w: BufWriter<File>,
    rows: u64,
}

impl NdjsonWriter {
    pub fn create(dest: &Path, buf_bytes: usize) -> Result<Self> {
        let mut tmp = dest.as_os_str().to_owned();
        tmp.push(".inprogress");
        let tmp = PathBuf::from(tmp);
        let f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
        Ok(Self {
            tmp,
            dest: dest.to_path_buf(),
            w: BufWriter::with_capacity(buf_bytes.max(8 * 1024), f),
            rows: 0,
        })
    }

    /// Serialize one row followed by `\n`.
    pub fn write_row<T: Serialize>(&mut self, row: &T) -> Result<()> {
        serde_json::to_writer(&mut self.w, row)?;
        self.w.write_all(b"\n")?;
        self.rows += 1;
        Ok(())
    }

    /// Flush, close and promote. Returns rows written.
    pub fn finish(self) -> Result<u64> {
        let Self { tmp, dest, w, rows } = self;
        let f = w.into_inner().map_err(|e| e.into_error()).with_context(|| format!("flush {}", tmp.display()))?;
        f.sync_all().with_context(|| format!("sync {}", tmp.display()))?;
        drop(f);
        replace_file_atomic_backoff(&tmp, &dest)?;
        Ok(rows)
    }
}

/// Materialize a whole view in one shot.
pub fn write_view<T: Serialize>(dest: &Path, rows: &[T], buf_bytes: usize) -> Result<u64> {
    let mut w = NdjsonWriter::create(dest, buf_bytes)?;
    for r in rows {
        w.write_row(r)?;
    }
    let n = w.finish()?;
    tracing::debug!("wrote {} rows to {}", n, dest.display());
    Ok(n)
}

/// Read a previously materialized view. Unlike raw inputs, a bad row here is an error:
/// views are only ever written by this crate.
pub fn read_view<T: DeserializeOwned>(path: &Path, buf_bytes: usize) -> Result<Vec<T>> {
    if !path.is_file() {
        bail!("view not materialized: {}", path.display());
    }
    let mut out = Vec::new();
    let mut lineno = 0u64;
    crate::zstd_jsonl::for_each_line_with_progress(path, false, buf_bytes, |_| {}, |line| {
        lineno += 1;
        if line.trim().is_empty() {
            return Ok(());
        }
        let row = serde_json::from_str::<T>(line)
            .with_context(|| format!("{}:{}: malformed row", path.display(), lineno))?;
        out.push(row);
        Ok(())
    })?;
    Ok(out)
}
