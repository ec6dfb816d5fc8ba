//! CubeKey - integer address of a cube in the octree.
//!
//! Cubes are identified by their grid coordinates at their own level.
//! Level 0 = root (one cube), each level halves the cube edge.

use crate::constants::MAX_OCTREE_LEVEL;

/// Integer address of an octree cube.
///
/// Grid coordinates are at the cube's own level: a cube at level `l` has
/// coordinates in `0..2^l` along each axis.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct CubeKey {
  /// Level (0 = root, higher = finer).
  pub level: u8,
  /// Grid X position at this level
  pub x: i32,
  /// Grid Y position at this level
  pub y: i32,
  /// Grid Z position at this level
  pub z: i32,
}

impl CubeKey {
  /// The root cube.
  pub const ROOT: Self = Self {
    level: 0,
    x: 0,
    y: 0,
    z: 0,
  };

  pub fn new(x: i32, y: i32, z: i32, level: u8) -> Self {
    Self { level, x, y, z }
  }

  /// Number of cubes per axis at this key's level.
  #[inline]
  pub fn grid_size(&self) -> i32 {
    1 << self.level
  }

  /// Get child key (one level finer).
  ///
  /// Octant: 0-7 where bits represent +X, +Y, +Z offsets:
  /// - bit 0: X offset (0 or 1)
  /// - bit 1: Y offset (0 or 1)
  /// - bit 2: Z offset (0 or 1)
  ///
  /// Returns None at the deepest supported level.
  pub fn child(&self, octant: u8) -> Option<Self> {
    if self.level >= MAX_OCTREE_LEVEL {
      return None;
    }
    let cx = (octant & 1) as i32;
    let cy = ((octant >> 1) & 1) as i32;
    let cz = ((octant >> 2) & 1) as i32;
    Some(Self {
      level: self.level + 1,
      x: self.x * 2 + cx,
      y: self.y * 2 + cy,
      z: self.z * 2 + cz,
    })
  }

  /// Get parent key (one level coarser). Returns None for the root.
  pub fn parent(&self) -> Option<Self> {
    if self.level == 0 {
      return None;
    }
    Some(Self {
      level: self.level - 1,
      x: self.x >> 1,
      y: self.y >> 1,
      z: self.z >> 1,
    })
  }

  /// Octant of this key inside its parent.
  #[inline]
  pub fn octant(&self) -> u8 {
    ((self.x & 1) | ((self.y & 1) << 1) | ((self.z & 1) << 2)) as u8
  }

  /// Key of the ancestor at `level` (self if `level >= self.level`).
  pub fn ancestor_at(&self, level: u8) -> Self {
    if level >= self.level {
      return *self;
    }
    let shift = self.level - level;
    Self {
      level,
      x: self.x >> shift,
      y: self.y >> shift,
      z: self.z >> shift,
    }
  }

  /// Check whether `self` is `other` or lies inside it.
  pub fn is_descendant_of(&self, other: &CubeKey) -> bool {
    self.level >= other.level && self.ancestor_at(other.level) == *other
  }

  /// Same-level key shifted by `(dx, dy, dz)`, or None outside the root.
  pub fn offset(&self, dx: i32, dy: i32, dz: i32) -> Option<Self> {
    let n = self.grid_size();
    let (x, y, z) = (self.x + dx, self.y + dy, self.z + dz);
    if x < 0 || y < 0 || z < 0 || x >= n || y >= n || z >= n {
      return None;
    }
    Some(Self::new(x, y, z, self.level))
  }

  /// Check whether the closed cubes share at least one point.
  pub fn touches(&self, other: &CubeKey) -> bool {
    let level = self.level.max(other.level);
    let span = |key: &CubeKey, c: i32| {
      let scale = 1i64 << (level - key.level);
      (c as i64 * scale, (c as i64 + 1) * scale)
    };
    [(self.x, other.x), (self.y, other.y), (self.z, other.z)]
      .iter()
      .all(|&(a, b)| {
        let (a0, a1) = span(self, a);
        let (b0, b1) = span(other, b);
        a0 <= b1 && b0 <= a1
      })
  }

  /// Check whether the cube touches the boundary of the root cube.
  pub fn touches_root_boundary(&self) -> bool {
    let last = self.grid_size() - 1;
    [self.x, self.y, self.z].iter().any(|&c| c == 0 || c == last)
  }
}

#[cfg(test)]
#[path = "key_test.rs"]
mod key_test;
