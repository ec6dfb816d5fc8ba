//! Polygon faces: normals, containment, convexity and coplanar patch merging.
//!
//! Faces are ordered loops of point labels into a caller-supplied point slice.
//! These helpers serve the boundary-patch stage of downstream mesh generation,
//! where octree cube faces projected onto a patch are merged back into larger
//! polygons.

use std::collections::{HashMap, HashSet};

use glam::DVec3;

use super::edge::Edge;
use super::tetrahedron::Tetrahedron;
use super::triangle::{tri_line_intersection, Triangle};
use crate::constants::{COPLANAR_COSINE, SMALL, VSMALL};

/// Polygon given as an ordered loop of point labels.
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct Face(pub Vec<usize>);

impl Face {
  pub fn new(labels: Vec<usize>) -> Self {
    Self(labels)
  }

  #[inline]
  pub fn len(&self) -> usize {
    self.0.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  #[inline]
  pub fn labels(&self) -> &[usize] {
    &self.0
  }

  /// Label following position `i` around the loop.
  #[inline]
  pub fn next_label(&self, i: usize) -> usize {
    self.0[(i + 1) % self.0.len()]
  }

  /// Label preceding position `i` around the loop.
  #[inline]
  pub fn prev_label(&self, i: usize) -> usize {
    self.0[(i + self.0.len() - 1) % self.0.len()]
  }

  /// Position of `label` in the loop.
  #[inline]
  pub fn which(&self, label: usize) -> Option<usize> {
    self.0.iter().position(|&l| l == label)
  }

  /// Directed edges in loop order; edge `i` runs from label `i` to `i + 1`.
  pub fn edges(&self) -> Vec<Edge> {
    (0..self.0.len())
      .map(|i| Edge::new(self.0[i], self.next_label(i)))
      .collect()
  }

  /// Loop with the opposite orientation, keeping the first label.
  pub fn reverse_face(&self) -> Self {
    if self.0.is_empty() {
      return self.clone();
    }
    let mut labels = Vec::with_capacity(self.0.len());
    labels.push(self.0[0]);
    labels.extend(self.0[1..].iter().rev());
    Self(labels)
  }

  /// Average of the loop's points.
  fn point_average(&self, points: &[DVec3]) -> DVec3 {
    let sum: DVec3 = self.0.iter().map(|&l| points[l]).sum();
    sum / self.0.len().max(1) as f64
  }

  /// Area vector, summed over the fan of triangles around the point average.
  pub fn area_normal(&self, points: &[DVec3]) -> DVec3 {
    match self.0.len() {
      0..=2 => DVec3::ZERO,
      3 => Triangle::new(points[self.0[0]], points[self.0[1]], points[self.0[2]]).area_normal(),
      n => {
        let centre = self.point_average(points);
        (0..n)
          .map(|i| {
            let a = points[self.0[i]];
            let b = points[self.next_label(i)];
            (a - centre).cross(b - centre) * 0.5
          })
          .sum()
      }
    }
  }

  /// Unit normal, zero for degenerate loops.
  pub fn unit_normal(&self, points: &[DVec3]) -> DVec3 {
    let n = self.area_normal(points);
    let mag = n.length();
    if mag > VSMALL {
      n / mag
    } else {
      DVec3::ZERO
    }
  }

  /// Area-weighted centre of the fan triangles (point average if degenerate).
  pub fn centre(&self, points: &[DVec3]) -> DVec3 {
    let average = self.point_average(points);
    if self.0.len() < 3 {
      return average;
    }
    let normal = self.area_normal(points).normalize_or_zero();
    let mut weighted = DVec3::ZERO;
    let mut total = 0.0;
    for i in 0..self.0.len() {
      let a = points[self.0[i]];
      let b = points[self.next_label(i)];
      let area = (a - average).cross(b - average).dot(normal).abs();
      weighted += (a + b + average) / 3.0 * area;
      total += area;
    }
    if total > VSMALL {
      weighted / total
    } else {
      average
    }
  }
}

/// Check whether two faces have an edge in common (either direction).
pub fn share_an_edge(f1: &Face, f2: &Face) -> bool {
  let edges: HashSet<Edge> = f2.edges().into_iter().collect();
  f1.edges().iter().any(|e| edges.contains(e))
}

/// Merge two faces across their shared edges into one loop.
///
/// The loop keeps the orientation of `f1`. Returns `None` when the faces share
/// no edge or the remaining boundary does not form a single simple loop.
pub fn merge_two_faces(f1: &Face, f2: &Face) -> Option<Face> {
  let e1 = f1.edges();
  let mut e2 = f2.edges();

  let shared: HashSet<Edge> = {
    let set2: HashSet<Edge> = e2.iter().copied().collect();
    e1.iter().copied().filter(|e| set2.contains(e)).collect()
  };
  if shared.is_empty() {
    return None;
  }

  // Consistent orientation traverses a shared edge in opposite directions.
  let same_direction = e1
    .iter()
    .filter(|e| shared.contains(e))
    .any(|e| e2.iter().any(|o| o.start == e.start && o.end == e.end));
  if same_direction {
    e2 = f2.reverse_face().edges();
  }

  let boundary: Vec<Edge> = e1
    .iter()
    .chain(e2.iter())
    .copied()
    .filter(|e| !shared.contains(e))
    .collect();
  if boundary.len() < 3 {
    return None;
  }

  let mut next: HashMap<usize, usize> = HashMap::with_capacity(boundary.len());
  for e in &boundary {
    if next.insert(e.start, e.end).is_some() {
      return None;
    }
  }

  let first = boundary[0].start;
  let mut labels = Vec::with_capacity(boundary.len());
  let mut current = first;
  loop {
    labels.push(current);
    current = *next.get(&current)?;
    if current == first {
      break;
    }
    if labels.len() > boundary.len() {
      return None;
    }
  }

  if labels.len() != boundary.len() {
    return None;
  }
  Some(Face(labels))
}

/// Merge coplanar neighbouring faces of one boundary patch.
///
/// Faces with fewer than three points are dropped. Each round merges the first
/// pair (in list order) that shares an edge and whose unit normals have a dot
/// product above `COPLANAR_COSINE`; the merged face goes to the front of the
/// list. Rounds repeat until nothing merges.
///
/// Pairwise scan per round: intended for per-patch face counts, not whole
/// meshes.
pub fn merge_patch_faces(faces: &[Face], points: &[DVec3]) -> Vec<Face> {
  let mut patch_faces: Vec<Face> = faces.iter().filter(|f| f.len() > 2).cloned().collect();

  loop {
    let normals: Vec<DVec3> = patch_faces.iter().map(|f| f.unit_normal(points)).collect();

    let mut merged: Option<(usize, usize, Face)> = None;
    'search: for i in 0..patch_faces.len() {
      for j in (i + 1)..patch_faces.len() {
        if normals[i].dot(normals[j]) <= COPLANAR_COSINE {
          continue;
        }
        if !share_an_edge(&patch_faces[i], &patch_faces[j]) {
          continue;
        }
        if let Some(face) = merge_two_faces(&patch_faces[i], &patch_faces[j]) {
          merged = Some((i, j, face));
          break 'search;
        }
      }
    }

    let Some((i, j, face)) = merged else {
      break;
    };

    let mut next = Vec::with_capacity(patch_faces.len() - 1);
    next.push(face);
    next.extend(
      patch_faces
        .into_iter()
        .enumerate()
        .filter(|(k, _)| *k != i && *k != j)
        .map(|(_, f)| f),
    );
    patch_faces = next;
  }

  patch_faces
}

/// Check whether the edges shared by two faces are convex.
///
/// For every vertex of `f1` also in `f2`, the signed volume of the tetrahedron
/// formed by `f2`'s local triangle and the first vertex of `f1`'s local
/// triangle not on `f2` must be negative. Faces without common vertices count
/// as convex.
pub fn is_shared_edge_convex(points: &[DVec3], f1: &Face, f2: &Face) -> bool {
  for (p_i, &label) in f1.labels().iter().enumerate() {
    let Some(pos) = f2.which(label) else {
      continue;
    };

    let tri_nei = [f2.labels()[pos], f2.next_label(pos), f2.prev_label(pos)];
    let tri_own = [label, f1.next_label(p_i), f1.prev_label(p_i)];

    let mut volume = 0.0;
    if let Some(&apex) = tri_own.iter().find(|l| !tri_nei.contains(l)) {
      let tet = Tetrahedron::new(
        points[tri_nei[0]],
        points[tri_nei[1]],
        points[tri_nei[2]],
        points[apex],
      );
      volume = tet.signed_volume();
    }

    if volume > -VSMALL {
      return false;
    }
  }

  true
}

/// Check whether `p` lies inside a convex face, given its normal.
///
/// A point within `SMALL` of a vertex is inside.
pub fn point_inside_face_with_normal(p: DVec3, face: &Face, normal: DVec3, points: &[DVec3]) -> bool {
  for (i, edge) in face.edges().iter().enumerate() {
    let vertex = points[face.labels()[i]];
    let pv = p - vertex;
    if pv.length() < SMALL {
      return true;
    }

    let inward = normal.cross(edge.vec(points)).normalize_or_zero();
    if pv.normalize().dot(inward) < -SMALL {
      return false;
    }
  }

  true
}

/// Check whether `p` lies inside a convex face, using the face's own normal.
pub fn point_inside_face(p: DVec3, face: &Face, points: &[DVec3]) -> bool {
  let normal = face.unit_normal(points);
  point_inside_face_with_normal(p, face, normal, points)
}

/// Check whether a triangle and a polygon face intersect.
///
/// Tests every triangle edge against the fan triangles of the face (around its
/// centre), then every face edge against the triangle.
pub fn do_face_and_triangle_intersect(tri: &Triangle, face: &Face, face_points: &[DVec3]) -> bool {
  let centre = face.centre(face_points);
  let corners = tri.corners();

  for i in 0..3 {
    let s = corners[i];
    let e = corners[(i + 1) % 3];
    for (p_i, &label) in face.labels().iter().enumerate() {
      let fan = Triangle::new(face_points[label], face_points[face.next_label(p_i)], centre);
      if tri_line_intersection(&fan, s, e).is_some() {
        return true;
      }
    }
  }

  face
    .edges()
    .iter()
    .any(|edge| tri_line_intersection(tri, face_points[edge.start], face_points[edge.end]).is_some())
}

#[cfg(test)]
#[path = "face_test.rs"]
mod face_test;
