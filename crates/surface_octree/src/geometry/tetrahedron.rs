//! Tetrahedra, point containment and the 3x3 Cramer solve shared with the
//! triangle predicates.

use glam::{DMat3, DVec3};

use crate::constants::{SMALL, VSMALL};

/// Tetrahedron given by its four corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tetrahedron {
  pub a: DVec3,
  pub b: DVec3,
  pub c: DVec3,
  pub d: DVec3,
}

impl Tetrahedron {
  pub fn new(a: DVec3, b: DVec3, c: DVec3, d: DVec3) -> Self {
    Self { a, b, c, d }
  }

  /// Signed volume; positive when `d` lies on the normal side of `abc`.
  #[inline]
  pub fn signed_volume(&self) -> f64 {
    (self.b - self.a).cross(self.c - self.a).dot(self.d - self.a) / 6.0
  }

  /// Corner average.
  #[inline]
  pub fn centroid(&self) -> DVec3 {
    (self.a + self.b + self.c + self.d) * 0.25
  }
}

/// Solve `[c0 c1 c2] x = rhs` by Cramer's rule.
///
/// Returns `None` when `|det| < det_tolerance`.
pub(crate) fn solve_cramer(cols: [DVec3; 3], rhs: DVec3, det_tolerance: f64) -> Option<DVec3> {
  let det = DMat3::from_cols(cols[0], cols[1], cols[2]).determinant();
  if det.abs() < det_tolerance {
    return None;
  }
  let x0 = DMat3::from_cols(rhs, cols[1], cols[2]).determinant() / det;
  let x1 = DMat3::from_cols(cols[0], rhs, cols[2]).determinant() / det;
  let x2 = DMat3::from_cols(cols[0], cols[1], rhs).determinant() / det;
  Some(DVec3::new(x0, x1, x2))
}

/// Check whether `p` lies inside (or on) the tetrahedron.
///
/// Degenerate tetrahedra contain nothing.
pub fn point_in_tetrahedron(p: DVec3, tet: &Tetrahedron) -> bool {
  let v0 = tet.a - tet.d;
  let v1 = tet.b - tet.d;
  let v2 = tet.c - tet.d;
  let sp = p - tet.d;

  let Some(u) = solve_cramer([v0, v1, v2], sp, VSMALL) else {
    return false;
  };

  let in_band = |x: f64| (-SMALL..=1.0 + SMALL).contains(&x);

  if !in_band(u.x) {
    return false;
  }
  if u.y < -SMALL || u.x + u.y > 1.0 + SMALL {
    return false;
  }
  if !in_band(u.z) {
    return false;
  }
  in_band(1.0 - u.x - u.y - u.z)
}
