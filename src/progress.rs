//! Progress reporting: an optional shared MultiProgress and a small bar wrapper.

use crate::paths::InputFile;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::fs;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Optional global MultiProgress so several bars can render together.
/// If unset, bars draw to the default terminal target.
static GLOBAL_MP: OnceLock<Arc<MultiProgress>> = OnceLock::new();

/// Install a global MultiProgress for all later bars. Additional calls are ignored.
pub fn set_global_multiprogress(mp: Arc<MultiProgress>) {
    let _ = GLOBAL_MP.set(mp);
}

fn new_bar(total: u64) -> ProgressBar {
    match GLOBAL_MP.get() {
        Some(mp) => mp.add(ProgressBar::new(total)),
        None => ProgressBar::new(total),
    }
}

const BYTES_TEMPLATE: &str = "{spinner:.green} {msg} {bytes:>10}/{total_bytes:<10} [{bar:.cyan/blue}] {percent:>3}%  \
     {bytes_per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}";
const COUNT_TEMPLATE: &str = "{spinner:.green} {msg} {pos}/{len} [{bar:.cyan/blue}] {percent:>3}%  \
     it/s: {per_sec}  elapsed: {elapsed_precise}  eta: {eta_precise}";

fn styled(total: u64, template: &str, label: &str) -> ProgressBar {
    let pb = new_bar(total);
    let style = ProgressStyle::with_template(template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ");
    pb.set_style(style);
    if !label.is_empty() {
        pb.set_message(label.to_string());
    }
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Sum of on-disk sizes; unreadable files count as zero.
pub fn total_input_size(files: &[InputFile]) -> u64 {
    files.iter().map(|f| fs::metadata(&f.path).map(|m| m.len()).unwrap_or(0)).sum()
}

/// Thin wrapper over an `indicatif` bar: `bytes(..)` for input loading, `count(..)` for rows.
pub struct ProgressScope {
    pb: ProgressBar,
}

impl ProgressScope {
    pub fn bytes<T: Into<String>>(label: T, total_bytes: u64) -> Self {
        Self { pb: styled(total_bytes, BYTES_TEMPLATE, &label.into()) }
    }
    pub fn count<T: Into<String>>(label: T, total: u64) -> Self {
        Self { pb: styled(total, COUNT_TEMPLATE, &label.into()) }
    }
    #[inline] pub fn inc_bytes(&self, delta: u64) { self.pb.inc(delta); }
    #[inline] pub fn inc_items(&self, delta: u64) { self.pb.inc(delta); }
    pub fn finish<T: Into<String>>(&self, msg: T) { self.pb.finish_with_message(msg.into()); }
}
