//! Concurrency helper: bound how many input files are decoded at once.

use anyhow::Result;
use rayon::prelude::*;

/// Map `f` over `items` with at most `limit` in flight. Results keep input order.
pub fn map_limited<I, T, F>(items: &[I], limit: usize, f: F) -> Result<Vec<T>>
where
    I: Sync,
    T: Send,
    F: Sync + Fn(&I) -> Result<T>,
{
    if limit <= 1 {
        return items.iter().map(&f).collect();
    }
    let mut out = Vec::with_capacity(items.len());
    for chunk in items.chunks(limit) {
        let part = chunk.par_iter().map(|it| f(it)).collect::<Result<Vec<_>>>()?;
        out.extend(part);
    }
    Ok(out)
}
