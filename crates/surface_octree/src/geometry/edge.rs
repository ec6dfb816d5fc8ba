//! Undirected edges and nearest-point queries on segments and lines.

use std::hash::{Hash, Hasher};

use glam::DVec3;

use crate::constants::{SMALL, VSMALL};

/// Undirected edge between two point labels.
///
/// The stored direction is the one of the facet that registered the edge, but
/// equality and hashing ignore direction: `Edge::new(a, b) == Edge::new(b, a)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Edge {
  /// First point label.
  pub start: usize,
  /// Second point label.
  pub end: usize,
}

impl Edge {
  /// Create an edge from two point labels.
  #[inline]
  pub fn new(start: usize, end: usize) -> Self {
    Self { start, end }
  }

  /// Labels ordered low to high.
  #[inline]
  pub fn sorted(&self) -> (usize, usize) {
    if self.start <= self.end {
      (self.start, self.end)
    } else {
      (self.end, self.start)
    }
  }

  /// Check whether `label` is one of the end points.
  #[inline]
  pub fn contains(&self, label: usize) -> bool {
    self.start == label || self.end == label
  }

  /// The end point opposite `label`, if `label` is on the edge.
  #[inline]
  pub fn other_vertex(&self, label: usize) -> Option<usize> {
    if self.start == label {
      Some(self.end)
    } else if self.end == label {
      Some(self.start)
    } else {
      None
    }
  }

  /// Same edge with start and end swapped.
  #[inline]
  pub fn reversed(&self) -> Self {
    Self::new(self.end, self.start)
  }

  /// Vector from start to end.
  #[inline]
  pub fn vec(&self, points: &[DVec3]) -> DVec3 {
    points[self.end] - points[self.start]
  }

  /// Edge length.
  #[inline]
  pub fn length(&self, points: &[DVec3]) -> f64 {
    self.vec(points).length()
  }
}

impl PartialEq for Edge {
  fn eq(&self, other: &Self) -> bool {
    self.sorted() == other.sorted()
  }
}

impl Eq for Edge {}

impl Hash for Edge {
  fn hash<H: Hasher>(&self, state: &mut H) {
    self.sorted().hash(state);
  }
}

/// Projection of `p` onto the line through `edge_point0` and `edge_point1`.
///
/// Not clamped: the result may lie outside the segment, which convex
/// combination code relies on. A zero-length edge returns `edge_point0`.
pub fn nearest_point_on_edge(edge_point0: DVec3, edge_point1: DVec3, p: DVec3) -> DVec3 {
  let e = edge_point1 - edge_point0;
  let d = e.length();
  let k = p - edge_point0;

  if d < VSMALL {
    return edge_point0;
  }

  edge_point0 + (e / (d * d)) * e.dot(k)
}

/// Nearest point to `p` on the segment `edge_point0`-`edge_point1`.
pub fn nearest_point_on_edge_exact(edge_point0: DVec3, edge_point1: DVec3, p: DVec3) -> DVec3 {
  let e = edge_point1 - edge_point0;
  let d = e.length();
  let k = p - edge_point0;

  if d < VSMALL {
    return edge_point0;
  }

  let t = e.dot(k) / (d * d);
  if t > 1.0 {
    edge_point1
  } else if t < 0.0 {
    edge_point0
  } else {
    edge_point0 + e * t
  }
}

/// Distance from `p` to the line supporting the edge.
pub fn distance_from_edge(edge_point0: DVec3, edge_point1: DVec3, p: DVec3) -> f64 {
  nearest_point_on_edge(edge_point0, edge_point1, p).distance(p)
}

/// Closest pair between the segment `edge_point0`-`edge_point1` and the
/// infinite line through `lp0` and `lp1`.
///
/// Returns `(nearest_on_edge, nearest_on_line)`, or `None` when the line has
/// no direction or runs parallel to the edge.
pub fn nearest_edge_point_to_line(
  edge_point0: DVec3,
  edge_point1: DVec3,
  lp0: DVec3,
  lp1: DVec3,
) -> Option<(DVec3, DVec3)> {
  let v = lp1 - lp0;
  let d = lp0 - edge_point0;
  let e = edge_point1 - edge_point0;

  let v_mag = v.length();
  if v_mag < VSMALL {
    return None;
  }

  let e_mag = e.length();
  if e_mag < VSMALL {
    let on_line = nearest_point_on_edge(lp0, lp1, edge_point0);
    return Some((edge_point0, on_line));
  }

  if ((v / v_mag).dot(e / e_mag)).abs() > 1.0 - SMALL {
    return None;
  }

  // | v.v   -v.e | |s|   |-d.v|
  // | -v.e   e.e | |t| = | d.e|
  let a11 = v.dot(v);
  let a12 = -v.dot(e);
  let a22 = e.dot(e);
  let b1 = -d.dot(v);
  let b2 = d.dot(e);
  let det = a11 * a22 - a12 * a12;
  if det.abs() < VSMALL {
    return None;
  }
  let s = (b1 * a22 - a12 * b2) / det;
  let t = (a11 * b2 - a12 * b1) / det;

  let on_line = lp0 + v * s;
  let on_edge = if t > 1.0 {
    edge_point1
  } else if t < 0.0 {
    edge_point0
  } else {
    edge_point0 + e * t
  };

  Some((on_edge, on_line))
}

/// Check whether `p` lies on the line through `s` and `e`.
///
/// A point coinciding with `s` is on the line.
pub fn vertex_on_line(p: DVec3, s: DVec3, e: DVec3) -> bool {
  let v = (e - s).normalize_or_zero();
  let pv = p - s;
  if pv.length() < VSMALL {
    return true;
  }
  pv.normalize().dot(v).abs() > 1.0 - SMALL
}
