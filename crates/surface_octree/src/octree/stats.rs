//! Statistics from octree construction.
//!
//! Each refinement pass records how many cubes it split and how many
//! iterations it needed to converge; leaf counts are taken from the finished
//! tree.

use super::{CubeType, MeshOctree};

/// Per-pass refinement counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
	/// Cubes split by this pass, hex siblings included.
	pub cubes_refined: usize,
	/// Iterations until no cube was marked.
	pub iterations: usize,
	/// Wall time in microseconds.
	pub micros: u64,
}

impl PassStats {
	/// Fold another run of the same pass into this one.
	#[inline]
	pub fn merge(&mut self, other: PassStats) {
		self.cubes_refined += other.cubes_refined;
		self.iterations += other.iterations;
		self.micros += other.micros;
	}
}

/// Statistics from octree construction.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OctreeStats {
	/// Surface refinement (including proximity refinement).
	pub boundary: PassStats,
	/// Refinement near DATA leaves (`n_layers`).
	pub near_data: PassStats,
	/// 2:1 balance, all runs.
	pub balance: PassStats,
	/// User refinement regions.
	pub regions: PassStats,
	/// INSIDE leaves refined to the global level.
	pub inside: PassStats,
	/// Global refinement level from the maximum cell size.
	pub global_level: u8,
	/// Finest level requested by any facet.
	pub max_facet_level: u8,
	/// Leaf counts by tag.
	pub leaves_unknown: usize,
	pub leaves_data: usize,
	pub leaves_inside: usize,
	pub leaves_outside: usize,
}

impl OctreeStats {
	/// Total number of leaves.
	#[inline]
	pub fn total_leaves(&self) -> usize {
		self.leaves_unknown + self.leaves_data + self.leaves_inside + self.leaves_outside
	}

	/// Total cubes split across all passes.
	#[inline]
	pub fn total_refined(&self) -> usize {
		self.boundary.cubes_refined
			+ self.near_data.cubes_refined
			+ self.balance.cubes_refined
			+ self.regions.cubes_refined
			+ self.inside.cubes_refined
	}

	/// Replace the leaf counts with the ones of `octree`.
	pub(crate) fn count_leaves(&mut self, octree: &MeshOctree) {
		self.leaves_unknown = 0;
		self.leaves_data = 0;
		self.leaves_inside = 0;
		self.leaves_outside = 0;
		for id in octree.leaves() {
			match octree.cube(id).cube_type {
				CubeType::Unknown => self.leaves_unknown += 1,
				CubeType::Data => self.leaves_data += 1,
				CubeType::Inside => self.leaves_inside += 1,
				CubeType::Outside => self.leaves_outside += 1,
			}
		}
	}
}
