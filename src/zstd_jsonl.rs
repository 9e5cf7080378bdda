use anyhow::Result;
use std::fs;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use zstd::stream::read::Decoder;

use crate::util::open_with_backoff;

// ----------------------------- Helpers for full-error logging ------------------------------------

#[inline]
pub(crate) fn warn_decode_skip(path: &Path, e: &anyhow::Error) {
    let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    tracing::warn!(
        "Skipping input after decode error\n  path : {}\n  error: {}\n\
         note : Rows read before the error were kept. Re-export or re-download this file \
                and rebuild; the next full rebuild recomputes every view from raw input.",
        abs.display(),
        e
    );
}

// ----------------------------- Streaming ----------------------------------

/// A `Read` wrapper that counts on-disk bytes read.
struct CountingReader<R: Read> {
    inner: R,
    counter: Arc<AtomicU64>,
}
impl<R: Read> Read for CountingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.counter.fetch_add(n as u64, Ordering::Relaxed);
        Ok(n)
    }
}

/// Stream an NDJSON file (plain or zstd) line by line with `\r?\n` stripped.
/// `on_progress(delta)` receives on-disk bytes consumed so far.
///
/// Decode failures (corrupt zstd, invalid UTF-8) log one warning, advance progress to the
/// file's size and skip the remainder of the file. Errors returned by `on_line` propagate.
pub fn for_each_line_with_progress(
    path: &Path,
    compressed: bool,
    read_buf_bytes: usize,
    mut on_progress: impl FnMut(u64),
    mut on_line: impl FnMut(&str) -> Result<()>,
) -> Result<()> {
    let mut sink_err: Option<anyhow::Error> = None;
    let mut handler = |line: &str| -> io::Result<()> {
        on_line(line).map_err(|e| {
            sink_err = Some(e);
            io::Error::new(io::ErrorKind::Other, "line handler failed")
        })
    };
    let res = stream_lines(path, compressed, read_buf_bytes, &mut on_progress, &mut handler);
    if let Some(e) = sink_err {
        return Err(e);
    }
    if let Err(e) = res {
        warn_decode_skip(path, &e);
        if let Ok(meta) = fs::metadata(path) {
            on_progress(meta.len());
        }
    }
    Ok(())
}

fn stream_lines(
    path: &Path,
    compressed: bool,
    read_buf_bytes: usize,
    on_progress: &mut impl FnMut(u64),
    on_line: &mut impl FnMut(&str) -> io::Result<()>,
) -> Result<()> {
    let file = open_with_backoff(path, 16, 50)?;
    let counter = Arc::new(AtomicU64::new(0));
    let cnt = CountingReader { inner: file, counter: counter.clone() };
    let cap = read_buf_bytes.max(8 * 1024);

    let mut reader: Box<dyn BufRead> = if compressed {
        let mut decoder = Decoder::new(cnt)?;
        decoder.window_log_max(31)?;
        Box::new(BufReader::with_capacity(cap, decoder))
    } else {
        Box::new(BufReader::with_capacity(cap, cnt))
    };

    let mut buf = String::with_capacity(16 * 1024);
    let mut last = 0u64;
    loop {
        buf.clear();
        let n = reader.read_line(&mut buf)?;
        if n == 0 {
            let cur = counter.load(Ordering::Relaxed);
            if cur > last {
                on_progress(cur - last);
            }
            break;
        }
        if buf.ends_with('\n') {
            let _ = buf.pop();
            if buf.ends_with('\r') { let _ = buf.pop(); }
        }
        let cur = counter.load(Ordering::Relaxed);
        if cur > last {
            on_progress(cur - last);
            last = cur;
        }
        on_line(&buf)?;
    }
    Ok(())
}

// ----------------------------- Integrity ----------------------------------

/// Decode an entire `.zst` input to EOF. Used to vet a raw drop before a rebuild.
pub fn validate_zst_full(path: &Path) -> Result<()> {
    let file = open_with_backoff(path, 16, 50)?;
    let mut decoder = Decoder::new(file)?;
    decoder.window_log_max(31)?;
    io::copy(&mut decoder, &mut io::sink())?;
    Ok(())
}
