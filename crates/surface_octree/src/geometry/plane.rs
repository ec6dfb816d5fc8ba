//! Planes and line-plane intersection.

use glam::DVec3;

use crate::constants::{SMALL, VSMALL};

/// Plane through a reference point with a unit normal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
  /// Any point on the plane.
  pub ref_point: DVec3,
  /// Unit normal.
  pub normal: DVec3,
}

impl Plane {
  /// Create a plane; the normal is normalised (zero stays zero).
  pub fn new(ref_point: DVec3, normal: DVec3) -> Self {
    Self {
      ref_point,
      normal: normal.normalize_or_zero(),
    }
  }

  /// Signed distance of `p` along the normal.
  #[inline]
  pub fn signed_distance(&self, p: DVec3) -> f64 {
    self.normal.dot(p - self.ref_point)
  }

  /// Orthogonal projection of `p` onto the plane.
  #[inline]
  pub fn nearest_point(&self, p: DVec3) -> DVec3 {
    p - self.normal * self.signed_distance(p)
  }
}

/// Intersection of the segment `start`-`end` with a plane.
///
/// Near-parallel segments and zero-length segments never intersect. The
/// parameter is accepted within `[-SMALL, 1 + SMALL]`.
pub fn plane_intersects_edge(start: DVec3, end: DVec3, plane: &Plane) -> Option<DVec3> {
  let v = end - start;
  let length = v.length();
  if length < VSMALL {
    return None;
  }

  let n = plane.normal;
  if n.dot(v / length).abs() < SMALL {
    return None;
  }

  let t = n.dot(plane.ref_point - start) / n.dot(v);
  if t > -SMALL && t < 1.0 + SMALL {
    Some(start + v * t)
  } else {
    None
  }
}

/// Check whether `p` lies in the plane, by the angle between `p - ref_point`
/// and the plane.
pub fn vertex_in_plane(p: DVec3, plane: &Plane) -> bool {
  let mut d = p - plane.ref_point;
  let length = d.length();
  if length > VSMALL {
    d /= length;
  }
  d.dot(plane.normal).abs() < SMALL
}
