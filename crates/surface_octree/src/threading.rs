//! Fixed worker pool and parallel append helpers built on rayon.
//!
//! Construction runs inside a dedicated [`WorkerPool`] so the worker count is
//! an explicit setting rather than whatever the global pool happens to be.
//! Nested rayon calls made inside [`WorkerPool::install`] use that pool.
//!
//! # Count-then-write
//!
//! [`count_then_write`] is the lock-free "parallel append" used by edge
//! construction:
//!
//! ```text
//! local produce ──► exchange counts ──► prefix sum ──► allocate total ──► scatter copy
//!  (per range)        (join)             (offsets)      (one buffer)       (disjoint)
//! ```
//!
//! Ranges are contiguous and ordered, so the output is identical for every
//! worker count.

use std::ops::Range;

use rayon::prelude::*;

use crate::error::{OctreeError, Result};

/// Dedicated rayon pool with a fixed number of workers.
pub struct WorkerPool {
  pool: rayon::ThreadPool,
}

impl WorkerPool {
  /// Create a pool with exactly `num_workers` threads.
  pub fn new(num_workers: usize) -> Result<Self> {
    if num_workers == 0 {
      return Err(OctreeError::NoWorkers);
    }
    let pool = rayon::ThreadPoolBuilder::new()
      .num_threads(num_workers)
      .thread_name(|i| format!("octree-worker-{}", i))
      .build()?;
    Ok(Self { pool })
  }

  /// Create a pool sized to the available hardware parallelism.
  pub fn default_workers() -> Result<Self> {
    let workers = std::thread::available_parallelism()
      .map(|n| n.get())
      .unwrap_or(1);
    Self::new(workers)
  }

  /// Number of worker threads.
  pub fn num_workers(&self) -> usize {
    self.pool.current_num_threads()
  }

  /// Run `op` inside the pool. Rayon calls made by `op` use this pool.
  pub fn install<R, F>(&self, op: F) -> R
  where
    F: FnOnce() -> R + Send,
    R: Send,
  {
    self.pool.install(op)
  }
}

/// Split `0..len` into at most `parts` contiguous, nearly equal ranges.
///
/// Empty ranges are never produced; `len == 0` yields no ranges.
pub fn partition_ranges(len: usize, parts: usize) -> Vec<Range<usize>> {
  let parts = parts.max(1).min(len.max(1));
  if len == 0 {
    return Vec::new();
  }
  let base = len / parts;
  let extra = len % parts;
  let mut ranges = Vec::with_capacity(parts);
  let mut start = 0;
  for i in 0..parts {
    let size = base + usize::from(i < extra);
    ranges.push(start..start + size);
    start += size;
  }
  ranges
}

/// Exclusive prefix sum of per-worker counts.
///
/// Returns the write offset of each worker and the total.
pub fn prefix_offsets(counts: &[usize]) -> (Vec<usize>, usize) {
  let mut offsets = Vec::with_capacity(counts.len());
  let mut total = 0;
  for &count in counts {
    offsets.push(total);
    total += count;
  }
  (offsets, total)
}

/// Parallel append over `0..len` without locks.
///
/// `produce` is called once per contiguous range and appends that range's
/// items to a local buffer. Buffers are concatenated in range order.
pub fn count_then_write<T, F>(len: usize, produce: F) -> Vec<T>
where
  T: Clone + Default + Send + Sync,
  F: Fn(Range<usize>, &mut Vec<T>) + Sync,
{
  let ranges = partition_ranges(len, rayon::current_num_threads());

  // Phase 1: every worker fills its own buffer.
  let locals: Vec<Vec<T>> = ranges
    .into_par_iter()
    .map(|range| {
      let mut local = Vec::new();
      produce(range, &mut local);
      local
    })
    .collect();

  // Phase 2: counts -> offsets -> one shared array sized to the total.
  let counts: Vec<usize> = locals.iter().map(Vec::len).collect();
  let (offsets, total) = prefix_offsets(&counts);
  let mut output = vec![T::default(); total];

  // Phase 3: each worker copies into its own disjoint slice.
  let mut slices = Vec::with_capacity(locals.len());
  let mut rest = output.as_mut_slice();
  for (i, &count) in counts.iter().enumerate() {
    debug_assert_eq!(total - rest.len(), offsets[i]);
    let (head, tail) = std::mem::take(&mut rest).split_at_mut(count);
    slices.push(head);
    rest = tail;
  }
  slices
    .into_par_iter()
    .zip(locals.par_iter())
    .for_each(|(dst, src)| dst.clone_from_slice(src));

  output
}

// =============================================================================
// Tests
// =============================================================================
