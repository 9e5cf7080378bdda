//! Process-wide logging init and file operations that retry transient OS errors.

use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::thread::sleep;
use std::time::Duration;

static INIT_ONCE: std::sync::Once = std::sync::Once::new();

/// Install the fmt subscriber once. Honors `RUST_LOG`, default `info`.
pub fn init_tracing_once() {
    INIT_ONCE.call_once(|| {
        let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
        let _ = tracing_subscriber::fmt().with_env_filter(env_filter).try_init();
    });
}

const TRIES: usize = 16;
const DELAY_MS: u64 = 50;

/// Transient errors seen on Windows when AV/backup filter drivers, network volumes or
/// sharing violations get in the way:
///   5 access denied, 21 device not ready, 32 sharing violation, 33 lock violation,
///   225 AV-blocked, 433 missing device, 1006 volume altered, 1117 I/O device error,
///   1224 user-mapped section open.
fn is_retriable(e: &io::Error) -> bool {
    matches!(e.raw_os_error(), Some(5 | 21 | 32 | 33 | 225 | 433 | 1006 | 1117 | 1224))
}

/// Run `op` up to `tries` times, sleeping `delay_ms * attempt` between retriable failures.
fn retry<T>(tries: usize, delay_ms: u64, what: &str, mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    let mut last: Option<io::Error> = None;
    for attempt in 1..=tries.max(1) {
        match op() {
            Ok(v) => return Ok(v),
            Err(e) if is_retriable(&e) => {
                last = Some(e);
                sleep(Duration::from_millis(delay_ms.saturating_mul(attempt as u64)));
            }
            Err(e) => return Err(e),
        }
    }
    Err(last.unwrap_or_else(|| io::Error::new(io::ErrorKind::Other, format!("{what} failed"))))
}

pub fn open_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    retry(tries, delay_ms, "open", || File::open(path))
}

pub fn create_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> io::Result<File> {
    retry(tries, delay_ms, "create", || File::create(path))
}

/// Succeeds if the file is already gone.
pub fn remove_with_backoff(path: &Path, tries: usize, delay_ms: u64) -> Result<()> {
    retry(tries, delay_ms, "remove", || match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    })
    .with_context(|| format!("remove {}", path.display()))
}

/// Promote `tmp` to `dest`, replacing any previous `dest`. Rename first; if that keeps
/// failing (cross-device, sharing), copy + remove.
pub fn replace_file_atomic_backoff(tmp: &Path, dest: &Path) -> Result<()> {
    if let Err(rename_err) = retry(TRIES, DELAY_MS, "rename", || fs::rename(tmp, dest)) {
        tracing::debug!("rename {} -> {} failed ({}); copying", tmp.display(), dest.display(), rename_err);
        retry(TRIES, DELAY_MS, "copy", || fs::copy(tmp, dest))
            .with_context(|| format!("copy {} -> {}", tmp.display(), dest.display()))?;
        remove_with_backoff(tmp, TRIES, DELAY_MS)?;
    }
    Ok(())
}

/// Create `dir` and parents.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("create dir {}", dir.display()))
}
