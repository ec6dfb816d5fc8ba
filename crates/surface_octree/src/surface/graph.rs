//! Compressed row graph for variable-length adjacency lists.

use rayon::prelude::*;

/// Variable-length rows stored back to back (CSR layout).
///
/// Row `i` is `targets[offsets[i]..offsets[i + 1]]`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Adjacency {
  offsets: Vec<usize>,
  targets: Vec<usize>,
}

impl Adjacency {
  /// Graph with `n_rows` empty rows.
  pub fn with_empty_rows(n_rows: usize) -> Self {
    Self {
      offsets: vec![0; n_rows + 1],
      targets: Vec::new(),
    }
  }

  /// Build from explicit rows.
  pub fn from_rows<R: AsRef<[usize]>>(rows: &[R]) -> Self {
    let mut offsets = Vec::with_capacity(rows.len() + 1);
    let mut targets = Vec::with_capacity(rows.iter().map(|r| r.as_ref().len()).sum());
    offsets.push(0);
    for row in rows {
      targets.extend_from_slice(row.as_ref());
      offsets.push(targets.len());
    }
    Self { offsets, targets }
  }

  /// Reverse an indexed relation.
  ///
  /// `sources[s]` lists the targets of source `s`; the result has `n_targets`
  /// rows, row `t` listing every source referring to `t` in ascending order.
  /// A source naming the same target twice appears twice.
  pub fn reverse<R>(n_targets: usize, sources: &[R]) -> Self
  where
    R: AsRef<[usize]> + Sync,
  {
    let mut pairs: Vec<(usize, usize)> = sources
      .par_iter()
      .enumerate()
      .flat_map_iter(|(s, row)| row.as_ref().iter().map(move |&t| (t, s)))
      .collect();
    pairs.par_sort_unstable();

    let mut offsets = vec![0usize; n_targets + 1];
    for &(t, _) in &pairs {
      debug_assert!(t < n_targets, "target {} out of range {}", t, n_targets);
      offsets[t + 1] += 1;
    }
    for i in 0..n_targets {
      offsets[i + 1] += offsets[i];
    }

    let targets = pairs.into_iter().map(|(_, s)| s).collect();
    Self { offsets, targets }
  }

  #[inline]
  pub fn n_rows(&self) -> usize {
    self.offsets.len().saturating_sub(1)
  }

  /// Total number of entries across all rows.
  #[inline]
  pub fn n_entries(&self) -> usize {
    self.targets.len()
  }

  #[inline]
  pub fn row(&self, i: usize) -> &[usize] {
    &self.targets[self.offsets[i]..self.offsets[i + 1]]
  }

  #[inline]
  pub fn row_len(&self, i: usize) -> usize {
    self.offsets[i + 1] - self.offsets[i]
  }

  /// Check whether row `i` contains `target`.
  #[inline]
  pub fn row_contains(&self, i: usize, target: usize) -> bool {
    self.row(i).contains(&target)
  }

  pub fn rows(&self) -> impl Iterator<Item = &[usize]> + '_ {
    (0..self.n_rows()).map(move |i| self.row(i))
  }
}
