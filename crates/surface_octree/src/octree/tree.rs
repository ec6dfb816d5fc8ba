//! MeshOctree - arena of cubes over a shared surface.
//!
//! Cubes live in one `Vec` indexed by [`CubeId`]; the root is entry 0 and
//! every refinement appends 8 consecutive children. Neighbours are not stored:
//! they are found from integer keys by descending from the root.

use std::sync::Arc;

use glam::DVec3;

use super::cube::{CubeFacets, CubeId, CubeType, LeafInfo, OctreeCube};
use super::stats::OctreeStats;
use super::CubeKey;
use crate::constants::{FACE_OFFSETS, MAX_OCTREE_LEVEL, NEIGHBOUR_OFFSETS, VGREAT};
use crate::geometry::{nearest_point_on_triangle, number_of_face_groups, triangle_intersects_box, BoundBox};
use crate::surface::TriSurface;

/// Nearest point on the surface found by [`MeshOctree::find_nearest_surface_point`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NearestHit {
  pub point: DVec3,
  pub facet: usize,
  pub distance: f64,
}

/// Octree over the bounding cube of a triangulated surface.
#[derive(Debug)]
pub struct MeshOctree {
  surface: Arc<TriSurface>,
  root_box: BoundBox,
  cubes: Vec<OctreeCube>,
  pub(crate) stats: OctreeStats,
}

impl MeshOctree {
  /// Octree holding only the root cube.
  pub(crate) fn new(surface: Arc<TriSurface>, root_box: BoundBox, root_type: CubeType, root_facets: CubeFacets) -> Self {
    Self {
      surface,
      root_box,
      cubes: vec![OctreeCube::new(CubeKey::ROOT, root_type, None, root_facets)],
      stats: OctreeStats::default(),
    }
  }

  // ---------------------------------------------------------------------------
  // Accessors
  // ---------------------------------------------------------------------------

  pub fn surface(&self) -> &TriSurface {
    &self.surface
  }

  /// Shared handle to the surface.
  pub fn surface_arc(&self) -> &Arc<TriSurface> {
    &self.surface
  }

  pub fn root_box(&self) -> &BoundBox {
    &self.root_box
  }

  #[inline]
  pub fn n_cubes(&self) -> usize {
    self.cubes.len()
  }

  #[inline]
  pub fn cube(&self, id: CubeId) -> &OctreeCube {
    &self.cubes[id.0]
  }

  #[inline]
  pub fn cubes(&self) -> &[OctreeCube] {
    &self.cubes
  }

  #[inline]
  pub(crate) fn cube_mut(&mut self, id: CubeId) -> &mut OctreeCube {
    &mut self.cubes[id.0]
  }

  /// Construction statistics plus current leaf counts.
  pub fn stats(&self) -> OctreeStats {
    let mut stats = self.stats;
    stats.count_leaves(self);
    stats
  }

  // ---------------------------------------------------------------------------
  // Coordinates
  // ---------------------------------------------------------------------------

  /// Edge length of cubes at `level`.
  #[inline]
  pub fn cube_size(&self, level: u8) -> f64 {
    self.root_box.size().x / (1u64 << level) as f64
  }

  /// Closed box of the cube addressed by `key`.
  pub fn key_bounds(&self, key: &CubeKey) -> BoundBox {
    let size = self.cube_size(key.level);
    let min = self.root_box.min + DVec3::new(key.x as f64, key.y as f64, key.z as f64) * size;
    BoundBox::new(min, min + DVec3::splat(size))
  }

  /// Closed box of cube `id`.
  #[inline]
  pub fn leaf_bounds(&self, id: CubeId) -> BoundBox {
    self.key_bounds(&self.cube(id).key)
  }

  // ---------------------------------------------------------------------------
  // Leaves
  // ---------------------------------------------------------------------------

  /// Leaf ids in arena order.
  pub fn leaves(&self) -> impl Iterator<Item = CubeId> + '_ {
    self
      .cubes
      .iter()
      .enumerate()
      .filter(|(_, c)| c.is_leaf())
      .map(|(i, _)| CubeId(i))
  }

  pub fn n_leaves(&self) -> usize {
    self.cubes.iter().filter(|c| c.is_leaf()).count()
  }

  /// Deepest level present in the tree.
  pub fn max_leaf_level(&self) -> u8 {
    self.cubes.iter().map(|c| c.key.level).max().unwrap_or(0)
  }

  pub fn leaf_info(&self, id: CubeId) -> LeafInfo {
    let cube = self.cube(id);
    LeafInfo {
      id,
      bounds: self.key_bounds(&cube.key),
      level: cube.key.level,
      cube_type: cube.cube_type,
    }
  }

  /// All leaves tagged `cube_type`, in arena order.
  pub fn leaves_of_type(&self, cube_type: CubeType) -> Vec<LeafInfo> {
    self
      .leaves()
      .filter(|&id| self.cube(id).cube_type == cube_type)
      .map(|id| self.leaf_info(id))
      .collect()
  }

  // ---------------------------------------------------------------------------
  // Lookup
  // ---------------------------------------------------------------------------

  /// Deepest existing cube on the path from the root to `key`.
  ///
  /// The result is either the cube addressed by `key` or a coarser leaf
  /// containing it.
  pub fn descend(&self, key: &CubeKey) -> CubeId {
    let mut id = CubeId::ROOT;
    while self.cube(id).key.level < key.level {
      let cube = self.cube(id);
      let Some(first) = cube.first_child else {
        break;
      };
      let next_level = cube.key.level + 1;
      let octant = key.ancestor_at(next_level).octant();
      id = CubeId(first.0 + octant as usize);
    }
    id
  }

  /// Leaf containing `p`, or None outside the root box.
  ///
  /// Points on a shared face go to the cube on the positive side.
  pub fn find_leaf_containing(&self, p: DVec3) -> Option<LeafInfo> {
    if !self.root_box.contains_point(p) {
      return None;
    }
    let mut id = CubeId::ROOT;
    while let Some(first) = self.cube(id).first_child {
      let centre = self.leaf_bounds(id).center();
      let octant = usize::from(p.x >= centre.x)
        | (usize::from(p.y >= centre.y) << 1)
        | (usize::from(p.z >= centre.z) << 2);
      id = CubeId(first.0 + octant);
    }
    Some(self.leaf_info(id))
  }

  /// Tag of the leaf containing `p`; OUTSIDE beyond the root box.
  pub fn classify_point(&self, p: DVec3) -> CubeType {
    self
      .find_leaf_containing(p)
      .map_or(CubeType::Outside, |leaf| leaf.cube_type)
  }

  // ---------------------------------------------------------------------------
  // Neighbours
  // ---------------------------------------------------------------------------

  /// Push the leaves under `id` whose closed boxes touch `target`.
  fn collect_touching_leaves(&self, id: CubeId, target: &CubeKey, out: &mut Vec<CubeId>) {
    let cube = self.cube(id);
    match cube.children() {
      None => out.push(id),
      Some(children) => {
        for child in children {
          if self.cube(child).key.touches(target) {
            self.collect_touching_leaves(child, target, out);
          }
        }
      }
    }
  }

  /// Leaves sharing a face, edge or corner with leaf `id`, ascending.
  pub fn neighbour_leaves(&self, id: CubeId) -> Vec<CubeId> {
    let key = self.cube(id).key;
    let mut out = Vec::new();
    for &(dx, dy, dz) in &NEIGHBOUR_OFFSETS {
      let Some(nk) = key.offset(dx, dy, dz) else {
        continue;
      };
      let nei = self.descend(&nk);
      if nei != id {
        self.collect_touching_leaves(nei, &key, &mut out);
      }
    }
    out.sort_unstable();
    out.dedup();
    out
  }

  /// Leaves sharing part of face `dir` (index into `FACE_OFFSETS`) of `id`.
  pub fn face_neighbour_leaves(&self, id: CubeId, dir: usize, out: &mut Vec<CubeId>) {
    let key = self.cube(id).key;
    let (dx, dy, dz) = FACE_OFFSETS[dir];
    let Some(nk) = key.offset(dx, dy, dz) else {
      return;
    };
    let nei = self.descend(&nk);
    self.collect_facing_leaves(nei, dir, out);
  }

  /// Leaves of the subtree under `id` on the side facing back along `dir`.
  fn collect_facing_leaves(&self, id: CubeId, dir: usize, out: &mut Vec<CubeId>) {
    let Some(children) = self.cube(id).children() else {
      out.push(id);
      return;
    };
    let axis = dir / 2;
    // Moving in +axis, the near side of the neighbour is its low side.
    let near_bit = if dir % 2 == 1 { 0 } else { 1 };
    for (octant, child) in children.into_iter().enumerate() {
      if (octant >> axis) & 1 == near_bit {
        self.collect_facing_leaves(child, dir, out);
      }
    }
  }

  // ---------------------------------------------------------------------------
  // Surface queries
  // ---------------------------------------------------------------------------

  /// Facets intersecting `bb`, ascending.
  pub fn facets_in_box(&self, bb: &BoundBox) -> Vec<usize> {
    let mut candidates = Vec::new();
    let mut stack = vec![CubeId::ROOT];
    while let Some(id) = stack.pop() {
      let cube = self.cube(id);
      if cube.facets.is_empty() || !self.leaf_bounds(id).overlaps(bb) {
        continue;
      }
      match cube.children() {
        Some(children) => stack.extend(children),
        None => candidates.extend_from_slice(&cube.facets),
      }
    }
    candidates.sort_unstable();
    candidates.dedup();
    candidates.retain(|&f| triangle_intersects_box(&self.surface.facet_triangle(f), bb));
    candidates
  }

  /// Nearest point on any facet stored in the tree.
  ///
  /// Branch and bound over cube boxes; None when the tree holds no facets.
  pub fn find_nearest_surface_point(&self, p: DVec3) -> Option<NearestHit> {
    let mut best = NearestHit {
      point: p,
      facet: usize::MAX,
      distance: VGREAT,
    };
    let mut best_sq = VGREAT;
    self.nearest_in_cube(CubeId::ROOT, p, &mut best, &mut best_sq);
    (best.facet != usize::MAX).then_some(best)
  }

  fn nearest_in_cube(&self, id: CubeId, p: DVec3, best: &mut NearestHit, best_sq: &mut f64) {
    let cube = self.cube(id);
    if cube.facets.is_empty() {
      return;
    }
    match cube.children() {
      None => {
        for &f in &cube.facets {
          let np = nearest_point_on_triangle(&self.surface.facet_triangle(f), p);
          let d = np.distance_squared(p);
          if d < *best_sq {
            *best_sq = d;
            *best = NearestHit {
              point: np,
              facet: f,
              distance: d.sqrt(),
            };
          }
        }
      }
      Some(children) => {
        let mut order: Vec<(f64, CubeId)> = children
          .iter()
          .map(|&c| (self.leaf_bounds(c).distance_squared_to_point(p), c))
          .collect();
        order.sort_by(|a, b| a.0.total_cmp(&b.0));
        for (d, child) in order {
          if d >= *best_sq {
            break;
          }
          self.nearest_in_cube(child, p, best, best_sq);
        }
      }
    }
  }

  /// Number of disjoint surface pieces passing within `range` of `p`.
  pub fn count_feature_groups_near(&self, p: DVec3, range: f64) -> usize {
    let search = BoundBox::from_center_half_extents(p, DVec3::splat(range));
    let candidates = self.facets_in_box(&search);
    number_of_face_groups(&candidates, p, range, &self.surface)
  }

  // ---------------------------------------------------------------------------
  // Verification
  // ---------------------------------------------------------------------------

  /// Check that no two touching leaves differ by more than one level.
  pub fn check_balance(&self) -> bool {
    self.leaves().all(|id| {
      let level = self.cube(id).key.level;
      self
        .neighbour_leaves(id)
        .iter()
        .all(|&n| self.cube(n).key.level.abs_diff(level) <= 1)
    })
  }

  /// Check the arena structure and that leaf volumes add up to the root.
  pub fn check_partition(&self) -> bool {
    let structure_ok = self.cubes.iter().enumerate().all(|(i, cube)| {
      let Some(children) = cube.children() else {
        return true;
      };
      children.iter().enumerate().all(|(octant, &c)| {
        let child = self.cube(c);
        child.parent == Some(CubeId(i)) && Some(child.key) == cube.key.child(octant as u8)
      })
    });

    let volume: f64 = self.leaves().map(|id| self.leaf_bounds(id).volume()).sum();
    let root_volume = self.root_box.volume();
    structure_ok && (volume - root_volume).abs() <= 1e-9 * root_volume
  }

  // ---------------------------------------------------------------------------
  // Mutation
  // ---------------------------------------------------------------------------

  /// Split leaf `id` into 8 children in octant order.
  ///
  /// Returns false (and leaves the tree untouched) at the deepest level.
  pub(crate) fn split(&mut self, id: CubeId, children: [(CubeType, CubeFacets); 8]) -> bool {
    let key = self.cube(id).key;
    if key.level >= MAX_OCTREE_LEVEL || !self.cube(id).is_leaf() {
      return false;
    }
    let first = CubeId(self.cubes.len());
    for (octant, (cube_type, facets)) in children.into_iter().enumerate() {
      let child_key = CubeKey::new(
        key.x * 2 + (octant & 1) as i32,
        key.y * 2 + ((octant >> 1) & 1) as i32,
        key.z * 2 + ((octant >> 2) & 1) as i32,
        key.level + 1,
      );
      self.cubes.push(OctreeCube::new(child_key, cube_type, Some(id), facets));
    }
    self.cube_mut(id).first_child = Some(first);
    true
  }
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;
