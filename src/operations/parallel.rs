//! Block-parallel execution over rows or columns
//!
//! Every row and column of a matrix can be fetched independently, so work is
//! split into contiguous blocks, one per worker. Each worker creates its own
//! extractor; nothing mutable is shared between blocks.

use rayon::prelude::*;
use std::ops::Range;

/// Split `0..n` into at most `threads` contiguous blocks
///
/// Block sizes differ by at most one and earlier blocks are the larger ones.
/// `threads == 0` is treated as 1, and no empty blocks are produced.
///
/// # Example
///
/// ```
/// use scranwasm::operations::parallel::partition;
///
/// assert_eq!(partition(10, 3), vec![0..4, 4..7, 7..10]);
/// assert_eq!(partition(2, 8), vec![0..1, 1..2]);
/// assert!(partition(0, 4).is_empty());
/// ```
pub fn partition(n: usize, threads: usize) -> Vec<Range<usize>> {
    let workers = threads.max(1).min(n);
    if workers == 0 {
        return Vec::new();
    }

    let base = n / workers;
    let extra = n % workers;
    let mut blocks = Vec::with_capacity(workers);
    let mut start = 0;
    for w in 0..workers {
        let len = base + usize::from(w < extra);
        blocks.push(start..start + len);
        start += len;
    }
    blocks
}

/// Run `job` on each block of `0..n` and collect the results in block order
///
/// A single block runs on the calling thread. Otherwise a bounded rayon pool
/// of `threads` workers is built; if that fails, blocks run sequentially.
/// All blocks have finished when this returns.
pub fn run<T, F>(n: usize, threads: usize, job: F) -> Vec<T>
where
    T: Send,
    F: Fn(Range<usize>) -> T + Sync,
{
    let blocks = partition(n, threads);
    if blocks.len() <= 1 {
        return blocks.into_iter().map(&job).collect();
    }

    let pool = match rayon::ThreadPoolBuilder::new()
        .num_threads(blocks.len())
        .build()
    {
        Ok(p) => p,
        Err(e) => {
            log::warn!("Could not build a {}-thread pool ({}), running sequentially", blocks.len(), e);
            return blocks.into_iter().map(&job).collect();
        }
    };

    pool.install(|| blocks.into_par_iter().map(&job).collect())
}
