//! Numeric tolerances and octree limits shared across modules.
//!
//! Predicates work in plain `f64` with two thresholds:
//!
//! ```text
//! VSMALL  near-zero magnitude (determinants, lengths, normal sums)
//! SMALL   parametric band around [0, 1] (barycentrics, line parameters)
//! ```

/// Threshold for near-zero magnitudes.
pub const VSMALL: f64 = 1.0e-300;

/// Tolerance band for barycentric and line-parameter acceptance.
pub const SMALL: f64 = 1.0e-15;

/// Sentinel for "no distance found yet".
pub const VGREAT: f64 = 1.0e300;

/// Cosine above which two adjacent patch faces are considered coplanar.
pub const COPLANAR_COSINE: f64 = 0.95;

/// Deepest refinement level a cube may reach.
///
/// Keys are `i32` per axis, so 2^MAX_OCTREE_LEVEL cubes per axis must fit.
pub const MAX_OCTREE_LEVEL: u8 = 24;

/// Relative inflation applied to cube boxes before facet intersection tests.
///
/// Makes cube boxes closed under rounding so a facet lying exactly on a shared
/// face is assigned to both cubes.
pub const CUBE_BOX_TOLERANCE: f64 = 1.0e-9;

/// Default margin added around the surface bounding box, as a fraction of its
/// largest extent.
pub const DEFAULT_ROOT_MARGIN: f64 = 0.05;

/// Smallest margin fraction, so the surface never touches the root faces.
pub const MIN_ROOT_MARGIN: f64 = 1.0e-6;

/// Face directions in octant bit order: -X, +X, -Y, +Y, -Z, +Z.
pub const FACE_OFFSETS: [(i32, i32, i32); 6] = [
  (-1, 0, 0), // -X
  (1, 0, 0),  // +X
  (0, -1, 0), // -Y
  (0, 1, 0),  // +Y
  (0, 0, -1), // -Z
  (0, 0, 1),  // +Z
];

/// All 26 neighbour directions (faces, edges and corners).
pub const NEIGHBOUR_OFFSETS: [(i32, i32, i32); 26] = {
  let mut offsets = [(0, 0, 0); 26];
  let mut i = 0;
  let mut n = 0;
  while i < 27 {
    let dx = (i % 3) as i32 - 1;
    let dy = ((i / 3) % 3) as i32 - 1;
    let dz = (i / 9) as i32 - 1;
    if dx != 0 || dy != 0 || dz != 0 {
      offsets[n] = (dx, dy, dz);
      n += 1;
    }
    i += 1;
  }
  offsets
};

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
