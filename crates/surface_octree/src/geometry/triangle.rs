//! Triangles: nearest point, line intersection and box overlap.

use glam::DVec3;

use super::bounds::{bound_box_line_intersection, BoundBox};
use super::edge::nearest_point_on_edge_exact;
use super::tetrahedron::solve_cramer;
use crate::constants::{SMALL, VSMALL};

/// Triangle given by its three corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
  pub a: DVec3,
  pub b: DVec3,
  pub c: DVec3,
}

impl Triangle {
  pub fn new(a: DVec3, b: DVec3, c: DVec3) -> Self {
    Self { a, b, c }
  }

  /// Area vector: half the cross product, along the right-hand normal.
  #[inline]
  pub fn area_normal(&self) -> DVec3 {
    (self.b - self.a).cross(self.c - self.a) * 0.5
  }

  /// Unit normal with a `VSMALL` floor in the denominator (zero if
  /// degenerate).
  #[inline]
  pub fn unit_normal(&self) -> DVec3 {
    let n = (self.b - self.a).cross(self.c - self.a);
    n / (n.length() + VSMALL)
  }

  #[inline]
  pub fn area(&self) -> f64 {
    self.area_normal().length()
  }

  #[inline]
  pub fn centre(&self) -> DVec3 {
    (self.a + self.b + self.c) / 3.0
  }

  /// Check for (near-)zero area relative to the longest edge.
  pub fn is_degenerate(&self) -> bool {
    let longest = (self.b - self.a)
      .length_squared()
      .max((self.c - self.b).length_squared())
      .max((self.a - self.c).length_squared());
    longest < VSMALL || self.area() <= SMALL * longest
  }

  pub fn bound_box(&self) -> BoundBox {
    BoundBox::new(self.a.min(self.b).min(self.c), self.a.max(self.b).max(self.c))
  }

  /// Corners as an array.
  #[inline]
  pub fn corners(&self) -> [DVec3; 3] {
    [self.a, self.b, self.c]
  }
}

/// Nearest point to `p` on a triangle.
///
/// Uses the barycentric decomposition of `p - a` over the two edge vectors
/// from `a`. A degenerate triangle falls back to the nearest of its three
/// edges; a projection outside the triangle is clamped onto the edge opposite
/// the violated coordinate.
pub fn nearest_point_on_triangle(tri: &Triangle, p: DVec3) -> DVec3 {
  let [p0, p1, p2] = tri.corners();

  let v0 = p1 - p0;
  let v1 = p2 - p0;
  let v2 = p - p0;

  let dot00 = v0.dot(v0);
  let dot01 = v0.dot(v1);
  let dot02 = v0.dot(v2);
  let dot11 = v1.dot(v1);
  let dot12 = v1.dot(v2);

  let det = dot00 * dot11 - dot01 * dot01;

  if det.abs() < VSMALL {
    let mut nearest = p;
    let mut dist = f64::MAX;
    for (s, e) in [(p0, p1), (p1, p2), (p2, p0)] {
      let np = nearest_point_on_edge_exact(s, e, p);
      let d = np.distance_squared(p);
      if d < dist {
        nearest = np;
        dist = d;
      }
    }
    return nearest;
  }

  let u = (dot11 * dot02 - dot01 * dot12) / det;
  let v = (dot00 * dot12 - dot01 * dot02) / det;

  let projected = p0 + v0 * u + v1 * v;

  if u >= -SMALL && v >= -SMALL && (u + v) <= 1.0 + SMALL {
    return projected;
  }

  let (start, end) = if u < -SMALL {
    (p0, p2)
  } else if v < -SMALL {
    (p0, p1)
  } else {
    (p2, p1)
  };
  clamp_onto_segment(start, end, projected)
}

fn clamp_onto_segment(start: DVec3, end: DVec3, projected: DVec3) -> DVec3 {
  let ev = end - start;
  let ed = (projected - start).dot(ev) / ev.length_squared();
  if ed > 1.0 {
    end
  } else if ed < 0.0 {
    start
  } else {
    start + ev * ed
  }
}

/// Intersection of the segment `line_start`-`line_end` with a triangle.
///
/// The line parameter and the barycentrics are accepted within a `SMALL`
/// band so hits exactly on an edge survive rounding. A segment lying in the
/// triangle's plane, or a degenerate triangle, does not intersect.
pub fn tri_line_intersection(tri: &Triangle, line_start: DVec3, line_end: DVec3) -> Option<DVec3> {
  let p0 = tri.a;
  let v = line_start - line_end;
  let v0 = tri.b - p0;
  let v1 = tri.c - p0;
  let sp = line_start - p0;

  // Relative to the column lengths so the test does not depend on model scale.
  let det_tolerance = SMALL * v0.length() * v1.length() * v.length();
  let solution = solve_cramer([v0, v1, v], sp, det_tolerance.max(VSMALL))?;
  let (u0, u1, t) = (solution.x, solution.y, solution.z);

  if t < -SMALL || t > 1.0 + SMALL {
    return None;
  }
  if u0 < -SMALL {
    return None;
  }
  if u1 < -SMALL || u0 + u1 > 1.0 + SMALL {
    return None;
  }

  Some(line_start - v * t)
}

/// Check whether a triangle touches a closed box.
///
/// Exact up to tolerance: a corner inside the box, a triangle edge crossing
/// the box, or a box edge piercing the triangle covers every configuration.
/// Degenerate triangles never touch anything.
pub fn triangle_intersects_box(tri: &Triangle, bb: &BoundBox) -> bool {
  if tri.is_degenerate() {
    return false;
  }
  if !tri.bound_box().overlaps(bb) {
    return false;
  }

  let corners = tri.corners();
  if corners.iter().any(|&p| bb.contains_point(p)) {
    return true;
  }

  for i in 0..3 {
    if bound_box_line_intersection(corners[i], corners[(i + 1) % 3], bb) {
      return true;
    }
  }

  bb
    .edges()
    .iter()
    .any(|&(s, e)| tri_line_intersection(tri, s, e).is_some())
}

#[cfg(test)]
#[path = "triangle_test.rs"]
mod triangle_test;
