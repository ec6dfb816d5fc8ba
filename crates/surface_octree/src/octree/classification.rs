//! Inside/outside classification of octree leaves.
//!
//! A flood fill across face neighbours, seeded at the root boundary:
//!
//! ```text
//! 1. UNKNOWN leaves touching the root boundary      -> OUTSIDE
//! 2. OUTSIDE and INSIDE leaves spread their tag to UNKNOWN face neighbours
//! 3. UNKNOWN leaves never reached                   -> INSIDE
//! ```
//!
//! DATA leaves block the fill, so the surface separates the two regions.
//! Already classified leaves act as sources, which lets the fill re-run after
//! refinement has created UNKNOWN children of DATA cubes.

use std::collections::VecDeque;

use tracing::debug;

use super::cube::{CubeId, CubeType};
use super::MeshOctree;
use crate::constants::FACE_OFFSETS;

/// Leaves tagged by one classification run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClassifyCounts {
  pub outside: usize,
  pub inside: usize,
}

/// Tag every UNKNOWN leaf as INSIDE or OUTSIDE.
#[tracing::instrument(skip_all, name = "octree::classify_leaves")]
pub fn classify_leaves(octree: &mut MeshOctree) -> ClassifyCounts {
  let mut counts = ClassifyCounts::default();

  let leaves: Vec<CubeId> = octree.leaves().collect();
  let mut queue = VecDeque::new();
  for &id in &leaves {
    let cube = octree.cube(id);
    match cube.cube_type {
      CubeType::Unknown if cube.key.touches_root_boundary() => {
        octree.cube_mut(id).cube_type = CubeType::Outside;
        counts.outside += 1;
        queue.push_back(id);
      }
      CubeType::Inside | CubeType::Outside => queue.push_back(id),
      _ => {}
    }
  }

  let mut neighbours = Vec::new();
  while let Some(id) = queue.pop_front() {
    let tag = octree.cube(id).cube_type;
    for dir in 0..FACE_OFFSETS.len() {
      neighbours.clear();
      octree.face_neighbour_leaves(id, dir, &mut neighbours);
      for &nei in &neighbours {
        if octree.cube(nei).cube_type != CubeType::Unknown {
          continue;
        }
        octree.cube_mut(nei).cube_type = tag;
        match tag {
          CubeType::Inside => counts.inside += 1,
          _ => counts.outside += 1,
        }
        queue.push_back(nei);
      }
    }
  }

  for id in leaves {
    let cube = octree.cube_mut(id);
    if cube.cube_type == CubeType::Unknown {
      cube.cube_type = CubeType::Inside;
      counts.inside += 1;
    }
  }

  debug!(outside = counts.outside, inside = counts.inside, "classified leaves");
  counts
}
