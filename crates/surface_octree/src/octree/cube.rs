//! Arena entries of the octree.

use smallvec::SmallVec;

use super::CubeKey;
use crate::geometry::BoundBox;

/// Classification tag of an octree cube.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default)]
pub enum CubeType {
  /// Not classified yet.
  #[default]
  Unknown,
  /// Touches at least one surface facet.
  Data,
  /// Enclosed by the surface.
  Inside,
  /// Connected to the root boundary without crossing the surface.
  Outside,
}

impl CubeType {
  /// Check whether the tag is INSIDE or OUTSIDE.
  #[inline]
  pub fn is_classified_volume(self) -> bool {
    matches!(self, CubeType::Inside | CubeType::Outside)
  }
}

/// Index of a cube in the octree arena.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct CubeId(pub usize);

impl CubeId {
  /// The root cube is always the first entry.
  pub const ROOT: Self = Self(0);

  #[inline]
  pub fn index(self) -> usize {
    self.0
  }
}

/// Facet labels of a cube; most leaves touch only a handful.
pub type CubeFacets = SmallVec<[usize; 8]>;

/// One cube of the arena.
///
/// Children are 8 consecutive entries starting at `first_child`, in octant
/// order. Cubes are never removed or merged.
#[derive(Clone, Debug)]
pub struct OctreeCube {
  pub key: CubeKey,
  pub cube_type: CubeType,
  pub parent: Option<CubeId>,
  pub first_child: Option<CubeId>,
  /// Facets intersecting the cube; kept on refined cubes too.
  pub facets: CubeFacets,
}

impl OctreeCube {
  pub(crate) fn new(key: CubeKey, cube_type: CubeType, parent: Option<CubeId>, facets: CubeFacets) -> Self {
    Self {
      key,
      cube_type,
      parent,
      first_child: None,
      facets,
    }
  }

  #[inline]
  pub fn is_leaf(&self) -> bool {
    self.first_child.is_none()
  }

  #[inline]
  pub fn level(&self) -> u8 {
    self.key.level
  }

  /// Id of the child in `octant`, if refined.
  #[inline]
  pub fn child(&self, octant: u8) -> Option<CubeId> {
    self.first_child.map(|first| CubeId(first.0 + octant as usize))
  }

  /// Ids of all 8 children, if refined.
  pub fn children(&self) -> Option<[CubeId; 8]> {
    self
      .first_child
      .map(|first| std::array::from_fn(|octant| CubeId(first.0 + octant)))
  }
}

/// Leaf summary returned by enumeration and point queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LeafInfo {
  pub id: CubeId,
  pub bounds: BoundBox,
  pub level: u8,
  pub cube_type: CubeType,
}
