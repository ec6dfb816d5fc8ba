//! Refinement passes over the octree arena.
//!
//! Every pass follows the same mark-then-apply loop:
//!
//! 1. **Mark** (parallel, read-only): scan leaves and collect the ids that
//!    need splitting.
//! 2. **Extend** (hex mode): add the leaf siblings of every marked cube so a
//!    parent's children are refined together.
//! 3. **Payload** (parallel, read-only): compute child tags and facet lists.
//! 4. **Apply** (sequential, ascending id): append the children to the arena.
//!
//! The loop repeats until nothing is marked. Marks are sorted before they are
//! applied, so the arena is identical for any worker count.
//!
//! # Passes
//!
//! ```text
//! refine_boundary    DATA leaf coarser than its finest facet level
//! refine_proximity   DATA leaf seeing more than one feature group
//! refine_near_data   leaf within n_layers widths of a finer DATA leaf
//! enforce_balance    leaf two or more levels coarser than a neighbour
//! refine_regions     leaf touching a region coarser than the region level
//! refine_inside      INSIDE leaf coarser than the global level
//! ```

use glam::DVec3;
use rayon::prelude::*;
use tracing::debug;
use web_time::Instant;

use super::cube::{CubeFacets, CubeId, CubeType};
use super::regions::RefinementShape;
use super::stats::PassStats;
use super::MeshOctree;
use crate::constants::{CUBE_BOX_TOLERANCE, NEIGHBOUR_OFFSETS};
use crate::geometry::{number_of_face_groups, triangle_intersects_box, BoundBox};

/// Limits shared by all passes.
#[derive(Clone, Copy, Debug)]
pub struct RefineLimits {
  /// Refine leaf siblings together.
  pub hex: bool,
  /// No cube is split at or beyond this level.
  pub max_level: u8,
}

// =============================================================================
// Apply
// =============================================================================

/// Child tags and facets of cube `id`, in octant order.
fn child_payload(octree: &MeshOctree, id: CubeId) -> [(CubeType, CubeFacets); 8] {
  let cube = octree.cube(id);
  let surface = octree.surface();

  std::array::from_fn(|octant| {
    let Some(child_key) = cube.key.child(octant as u8) else {
      return (cube.cube_type, CubeFacets::new());
    };

    let facets: CubeFacets = if cube.facets.is_empty() {
      CubeFacets::new()
    } else {
      let bounds = octree.key_bounds(&child_key);
      let bounds = bounds.inflated(CUBE_BOX_TOLERANCE * bounds.size().x);
      cube
        .facets
        .iter()
        .copied()
        .filter(|&f| triangle_intersects_box(&surface.facet_triangle(f), &bounds))
        .collect()
    };

    let cube_type = if !facets.is_empty() {
      CubeType::Data
    } else if cube.cube_type.is_classified_volume() {
      cube.cube_type
    } else {
      CubeType::Unknown
    };
    (cube_type, facets)
  })
}

/// Split the marked leaves (and, in hex mode, their leaf siblings).
///
/// Returns the number of cubes split.
pub fn refine_marked(octree: &mut MeshOctree, mut marked: Vec<CubeId>, limits: RefineLimits) -> usize {
  marked.retain(|&id| {
    let cube = octree.cube(id);
    cube.is_leaf() && cube.key.level < limits.max_level
  });

  if limits.hex {
    let siblings: Vec<CubeId> = marked
      .iter()
      .filter_map(|&id| octree.cube(id).parent)
      .filter_map(|parent| octree.cube(parent).children())
      .flatten()
      .filter(|&sibling| octree.cube(sibling).is_leaf())
      .collect();
    marked.extend(siblings);
  }

  marked.sort_unstable();
  marked.dedup();
  if marked.is_empty() {
    return 0;
  }

  let payloads: Vec<[(CubeType, CubeFacets); 8]> = {
    let tree = &*octree;
    marked.par_iter().map(|&id| child_payload(tree, id)).collect()
  };

  let mut refined = 0;
  for (id, payload) in marked.into_iter().zip(payloads) {
    if octree.split(id, payload) {
      refined += 1;
    }
  }
  refined
}

/// Run `mark` and `refine_marked` until no cube is marked.
fn refine_until_converged<M>(octree: &mut MeshOctree, limits: RefineLimits, pass: &str, mark: M) -> PassStats
where
  M: Fn(&MeshOctree, CubeId) -> bool + Sync,
{
  let start = Instant::now();
  let mut stats = PassStats::default();

  loop {
    let marked: Vec<CubeId> = {
      let tree = &*octree;
      (0..tree.n_cubes())
        .into_par_iter()
        .map(CubeId)
        .filter(|&id| tree.cube(id).is_leaf() && mark(tree, id))
        .collect()
    };
    if marked.is_empty() {
      break;
    }

    let n_marked = marked.len();
    let refined = refine_marked(octree, marked, limits);
    debug!(pass, iteration = stats.iterations, marked = n_marked, refined, "refinement iteration");
    if refined == 0 {
      break;
    }
    stats.cubes_refined += refined;
    stats.iterations += 1;
  }

  stats.micros = start.elapsed().as_micros() as u64;
  stats
}

/// Run a pass whose marks are produced per source leaf (possibly marking
/// other leaves), until nothing is marked.
fn refine_from_sources<S>(octree: &mut MeshOctree, limits: RefineLimits, pass: &str, sources: S) -> PassStats
where
  S: Fn(&MeshOctree, CubeId, &mut Vec<CubeId>) + Sync,
{
  let start = Instant::now();
  let mut stats = PassStats::default();

  loop {
    let mut marked: Vec<CubeId> = {
      let tree = &*octree;
      (0..tree.n_cubes())
        .into_par_iter()
        .map(CubeId)
        .filter(|&id| tree.cube(id).is_leaf())
        .flat_map_iter(|id| {
          let mut out = Vec::new();
          sources(tree, id, &mut out);
          out
        })
        .collect()
    };
    marked.sort_unstable();
    marked.dedup();
    if marked.is_empty() {
      break;
    }

    let n_marked = marked.len();
    let refined = refine_marked(octree, marked, limits);
    debug!(pass, iteration = stats.iterations, marked = n_marked, refined, "refinement iteration");
    if refined == 0 {
      break;
    }
    stats.cubes_refined += refined;
    stats.iterations += 1;
  }

  stats.micros = start.elapsed().as_micros() as u64;
  stats
}

// =============================================================================
// Passes
// =============================================================================

/// Finest level requested by the facets of cube `id`.
fn facet_level(octree: &MeshOctree, id: CubeId, facet_levels: &[u8]) -> u8 {
  octree
    .cube(id)
    .facets
    .iter()
    .map(|&f| facet_levels[f])
    .max()
    .unwrap_or(0)
}

/// Refine DATA leaves until each reaches the finest level of its facets.
#[tracing::instrument(skip_all, name = "octree::refine_boundary")]
pub fn refine_boundary(octree: &mut MeshOctree, facet_levels: &[u8], limits: RefineLimits) -> PassStats {
  refine_until_converged(octree, limits, "boundary", |tree, id| {
    let cube = tree.cube(id);
    cube.cube_type == CubeType::Data && cube.key.level < facet_level(tree, id, facet_levels)
  })
}

/// Refine DATA leaves that see more than one feature group within half the
/// cube diagonal of their centre, up to `extra_levels` beyond their facet
/// level.
#[tracing::instrument(skip_all, name = "octree::refine_proximity")]
pub fn refine_proximity(
  octree: &mut MeshOctree,
  facet_levels: &[u8],
  extra_levels: u8,
  limits: RefineLimits,
) -> PassStats {
  if extra_levels == 0 {
    return PassStats::default();
  }
  // The lazy edge relations must not be initialised from inside the
  // parallel marking.
  let _ = octree.surface().edge_facets();
  let _ = octree.surface().facet_edges();
  refine_until_converged(octree, limits, "proximity", |tree, id| {
    let cube = tree.cube(id);
    if cube.cube_type != CubeType::Data {
      return false;
    }
    let limit = facet_level(tree, id, facet_levels).saturating_add(extra_levels);
    if cube.key.level >= limit {
      return false;
    }
    let bounds = tree.key_bounds(&cube.key);
    let centre = bounds.center();
    let range = bounds.size().length() * 0.5;
    // Facets of neighbouring leaves count too.
    let candidates = tree.facets_in_box(&BoundBox::from_center_half_extents(centre, DVec3::splat(range)));
    candidates.len() > 1 && number_of_face_groups(&candidates, centre, range, tree.surface()) > 1
  })
}

/// Refine leaves within `n_layers` cube widths of a DATA leaf that are
/// coarser than it.
#[tracing::instrument(skip_all, name = "octree::refine_near_data")]
pub fn refine_near_data(octree: &mut MeshOctree, n_layers: usize, limits: RefineLimits) -> PassStats {
  if n_layers == 0 {
    return PassStats::default();
  }
  let n = n_layers as i32;
  refine_from_sources(octree, limits, "near_data", |tree, id, out| {
    let cube = tree.cube(id);
    if cube.cube_type != CubeType::Data {
      return;
    }
    let level = cube.key.level;
    for dz in -n..=n {
      for dy in -n..=n {
        for dx in -n..=n {
          if dx == 0 && dy == 0 && dz == 0 {
            continue;
          }
          let Some(nk) = cube.key.offset(dx, dy, dz) else {
            continue;
          };
          let nei = tree.descend(&nk);
          let nei_cube = tree.cube(nei);
          if nei_cube.is_leaf() && nei_cube.key.level < level {
            out.push(nei);
          }
        }
      }
    }
  })
}

/// Refine leaves until touching leaves differ by at most one level.
///
/// Running it again on a balanced tree refines nothing.
#[tracing::instrument(skip_all, name = "octree::enforce_balance")]
pub fn enforce_balance(octree: &mut MeshOctree, limits: RefineLimits) -> PassStats {
  refine_from_sources(octree, limits, "balance", |tree, id, out| {
    let key = tree.cube(id).key;
    if key.level < 2 {
      return;
    }
    for &(dx, dy, dz) in &NEIGHBOUR_OFFSETS {
      let Some(nk) = key.offset(dx, dy, dz) else {
        continue;
      };
      let nei = tree.descend(&nk);
      let nei_cube = tree.cube(nei);
      if nei_cube.is_leaf() && nei_cube.key.level + 1 < key.level {
        out.push(nei);
      }
    }
  })
}

/// Refine leaves touching a region until they reach the region's level.
#[tracing::instrument(skip_all, name = "octree::refine_regions")]
pub fn refine_regions(octree: &mut MeshOctree, regions: &[(RefinementShape, u8)], limits: RefineLimits) -> PassStats {
  if regions.is_empty() {
    return PassStats::default();
  }
  refine_until_converged(octree, limits, "regions", |tree, id| {
    let key = tree.cube(id).key;
    let bounds = tree.key_bounds(&key);
    regions
      .iter()
      .any(|(shape, level)| key.level < *level && shape.intersects_box(&bounds))
  })
}

/// Refine INSIDE leaves to `global_level`; children stay INSIDE.
#[tracing::instrument(skip_all, name = "octree::refine_inside")]
pub fn refine_inside(octree: &mut MeshOctree, global_level: u8, limits: RefineLimits) -> PassStats {
  refine_until_converged(octree, limits, "inside", |tree, id| {
    let cube = tree.cube(id);
    cube.cube_type == CubeType::Inside && cube.key.level < global_level
  })
}

/// Refine DATA leaves holding more than `max_facets` facets, up to
/// `max_level`.
#[tracing::instrument(skip_all, name = "octree::refine_crowded")]
pub fn refine_crowded(octree: &mut MeshOctree, max_facets: usize, limits: RefineLimits) -> PassStats {
  refine_until_converged(octree, limits, "crowded", |tree, id| {
    let cube = tree.cube(id);
    cube.cube_type == CubeType::Data && cube.facets.len() > max_facets
  })
}

#[cfg(test)]
#[path = "refinement_test.rs"]
mod refinement_test;
