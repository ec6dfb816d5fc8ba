//! Load redistribution of leaves across workers.
//!
//! Leaves of one tag are first partitioned by subtree, which keeps each
//! worker's share spatially compact but usually uneven. Migration then moves
//! leaves from workers above their target to workers below it:
//!
//! ```text
//! target(i) = total / n + (i < total % n)       every target within one of
//!                                               ceil(total / n)
//! plan      = greedy surplus -> deficit pairs in worker order
//! phase 1   = donors send their tail leaves over per-worker channels
//! phase 2   = receivers drain their inbox, then sort by CubeId
//! ```

use crossbeam_channel::{self as channel, Receiver, Sender};
use tracing::debug;

use super::cube::{CubeId, CubeType};
use super::MeshOctree;

/// One migration: `count` leaves from worker `from` to worker `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transfer {
  pub from: usize,
  pub to: usize,
  pub count: usize,
}

/// Leaf counts each worker should end up with.
pub fn balanced_targets(total: usize, n_workers: usize) -> Vec<usize> {
  let n = n_workers.max(1);
  let base = total / n;
  let extra = total % n;
  (0..n).map(|i| base + usize::from(i < extra)).collect()
}

/// Greedy plan moving surplus leaves to deficit workers, both in index order.
pub fn migration_plan(sizes: &[usize]) -> Vec<Transfer> {
  let total: usize = sizes.iter().sum();
  let targets = balanced_targets(total, sizes.len());

  let mut surplus: Vec<(usize, usize)> = Vec::new();
  let mut deficit: Vec<(usize, usize)> = Vec::new();
  for (i, (&size, &target)) in sizes.iter().zip(&targets).enumerate() {
    if size > target {
      surplus.push((i, size - target));
    } else if size < target {
      deficit.push((i, target - size));
    }
  }

  let mut plan = Vec::new();
  let (mut si, mut di) = (0, 0);
  while si < surplus.len() && di < deficit.len() {
    let count = surplus[si].1.min(deficit[di].1);
    plan.push(Transfer {
      from: surplus[si].0,
      to: deficit[di].0,
      count,
    });
    surplus[si].1 -= count;
    deficit[di].1 -= count;
    if surplus[si].1 == 0 {
      si += 1;
    }
    if deficit[di].1 == 0 {
      di += 1;
    }
  }
  plan
}

/// Check that every part holds one of the balanced target sizes.
pub fn is_balanced(parts: &[Vec<CubeId>]) -> bool {
  let total: usize = parts.iter().map(Vec::len).sum();
  let n = parts.len().max(1);
  let ceil = total.div_ceil(n);
  parts.iter().all(|p| p.len() + 1 >= ceil && p.len() <= ceil)
}

/// Leaves of `cube_type` under `id`, depth first in octant order.
fn subtree_leaves(octree: &MeshOctree, id: CubeId, cube_type: CubeType, out: &mut Vec<CubeId>) {
  let mut stack = vec![id];
  while let Some(id) = stack.pop() {
    let cube = octree.cube(id);
    match cube.children() {
      Some(children) => stack.extend(children.into_iter().rev()),
      None if cube.cube_type == cube_type => out.push(id),
      None => {}
    }
  }
}

/// Partition leaves of `cube_type` across `n_workers` by subtree.
///
/// The tree is opened level by level until there are at least `n_workers`
/// subtrees (or nothing left to open); consecutive subtrees go to the same
/// worker.
pub fn initial_partition(octree: &MeshOctree, cube_type: CubeType, n_workers: usize) -> Vec<Vec<CubeId>> {
  let n = n_workers.max(1);

  let mut frontier = vec![CubeId::ROOT];
  while frontier.len() < n && frontier.iter().any(|&id| !octree.cube(id).is_leaf()) {
    frontier = frontier
      .into_iter()
      .flat_map(|id| match octree.cube(id).children() {
        Some(children) => children.to_vec(),
        None => vec![id],
      })
      .collect();
  }

  let mut parts = vec![Vec::new(); n];
  let n_blocks = frontier.len();
  for (k, id) in frontier.into_iter().enumerate() {
    subtree_leaves(octree, id, cube_type, &mut parts[k * n / n_blocks]);
  }
  parts
}

/// Migrate leaves until every part is within one of `ceil(total / n)`.
///
/// Returns the number of leaves moved. Each part ends sorted by id.
#[tracing::instrument(skip_all, name = "octree::redistribute")]
pub fn redistribute(parts: &mut [Vec<CubeId>]) -> usize {
  let mut migrated = 0;

  while !is_balanced(parts) {
    let sizes: Vec<usize> = parts.iter().map(Vec::len).collect();
    let plan = migration_plan(&sizes);
    if plan.is_empty() {
      break;
    }

    let (senders, receivers): (Vec<Sender<CubeId>>, Vec<Receiver<CubeId>>) =
      (0..parts.len()).map(|_| channel::unbounded()).unzip();

    // Phase 1: donors push their tail leaves into the receivers' inboxes.
    rayon::scope(|s| {
      for (worker, part) in parts.iter_mut().enumerate() {
        let outgoing: Vec<Transfer> = plan.iter().copied().filter(|t| t.from == worker).collect();
        if outgoing.is_empty() {
          continue;
        }
        let senders = &senders;
        s.spawn(move |_| {
          for transfer in outgoing {
            let start = part.len() - transfer.count;
            for leaf in part.drain(start..) {
              let sent = senders[transfer.to].send(leaf);
              debug_assert!(sent.is_ok(), "receivers outlive the migration scope");
            }
          }
        });
      }
    });
    drop(senders);

    // Phase 2: drain without blocking.
    for (part, inbox) in parts.iter_mut().zip(&receivers) {
      part.extend(inbox.try_iter());
      part.sort_unstable();
    }

    let moved: usize = plan.iter().map(|t| t.count).sum();
    debug!(transfers = plan.len(), moved, "migration round");
    migrated += moved;
  }

  migrated
}

/// Partition and balance leaves of `cube_type` across `n_workers`.
pub fn distribute_leaves(octree: &MeshOctree, cube_type: CubeType, n_workers: usize) -> Vec<Vec<CubeId>> {
  let mut parts = initial_partition(octree, cube_type, n_workers);
  redistribute(&mut parts);
  parts
}

#[cfg(test)]
#[path = "distribution_test.rs"]
mod distribution_test;
