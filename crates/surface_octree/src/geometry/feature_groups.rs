//! Flood-fill counts of distinct surface pieces near a point.
//!
//! Answers "how many separate sheets of the surface pass within `range` of
//! `centre`". Two facets belong to the same group when they share an edge that
//! itself comes within range; two edges when they share a point within range.
//! The octree uses this to spot thin gaps a single cube cannot resolve.

use std::collections::{HashMap, VecDeque};

use glam::DVec3;

use super::edge::nearest_point_on_edge_exact;
use super::triangle::nearest_point_on_triangle;
use crate::surface::TriSurface;

/// Sorted, deduplicated copy of the candidates that pass `in_range`.
fn filter_in_range(candidates: &[usize], in_range: impl Fn(usize) -> bool) -> Vec<usize> {
  let mut filtered: Vec<usize> = candidates.iter().copied().filter(|&c| in_range(c)).collect();
  filtered.sort_unstable();
  filtered.dedup();
  filtered
}

/// Count connected groups among the candidate facets within `range` of
/// `centre`.
///
/// Facets are connected through edges whose nearest point to `centre` is also
/// within range; edge decisions are memoised for the duration of the call.
pub fn number_of_face_groups(candidates: &[usize], centre: DVec3, range: f64, surface: &TriSurface) -> usize {
  let range_sq = range * range;
  let points = surface.points();
  let edges = surface.edges();
  let facet_edges = surface.facet_edges();
  let edge_facets = surface.edge_facets();

  let in_range = filter_in_range(candidates, |f| {
    let np = nearest_point_on_triangle(&surface.facet_triangle(f), centre);
    np.distance_squared(centre) < range_sq
  });

  let mut group: HashMap<usize, usize> = HashMap::with_capacity(in_range.len());
  let mut edge_test: HashMap<usize, bool> = HashMap::with_capacity(in_range.len());
  let mut front = VecDeque::new();
  let mut n_groups = 0;

  for &seed in &in_range {
    if group.contains_key(&seed) {
      continue;
    }
    group.insert(seed, n_groups);
    front.push_back(seed);

    while let Some(facet) = front.pop_front() {
      for &edge_i in &facet_edges[facet] {
        let edge_near = *edge_test.entry(edge_i).or_insert_with(|| {
          let e = edges[edge_i];
          let np = nearest_point_on_edge_exact(points[e.start], points[e.end], centre);
          np.distance_squared(centre) < range_sq
        });
        if !edge_near {
          continue;
        }

        for &nei in edge_facets.row(edge_i) {
          if in_range.binary_search(&nei).is_ok() && !group.contains_key(&nei) {
            group.insert(nei, n_groups);
            front.push_back(nei);
          }
        }
      }
    }

    n_groups += 1;
  }

  n_groups
}

/// Count connected groups among the candidate edges within `range` of
/// `centre`.
///
/// Edges are connected through shared points that lie within range; point
/// decisions are memoised for the duration of the call.
pub fn number_of_edge_groups(candidates: &[usize], centre: DVec3, range: f64, surface: &TriSurface) -> usize {
  let range_sq = range * range;
  let points = surface.points();
  let edges = surface.edges();
  let point_edges = surface.point_edges();

  let in_range = filter_in_range(candidates, |e| {
    let edge = edges[e];
    let np = nearest_point_on_edge_exact(points[edge.start], points[edge.end], centre);
    np.distance_squared(centre) < range_sq
  });

  let mut group: HashMap<usize, usize> = HashMap::with_capacity(in_range.len());
  let mut point_test: HashMap<usize, bool> = HashMap::with_capacity(in_range.len());
  let mut front = VecDeque::new();
  let mut n_groups = 0;

  for &seed in &in_range {
    if group.contains_key(&seed) {
      continue;
    }
    group.insert(seed, n_groups);
    front.push_back(seed);

    while let Some(edge_i) = front.pop_front() {
      let edge = edges[edge_i];
      for p in [edge.start, edge.end] {
        let point_near = *point_test
          .entry(p)
          .or_insert_with(|| points[p].distance_squared(centre) < range_sq);
        if !point_near {
          continue;
        }

        for &nei in point_edges.row(p) {
          if in_range.binary_search(&nei).is_ok() && !group.contains_key(&nei) {
            group.insert(nei, n_groups);
            front.push_back(nei);
          }
        }
      }
    }

    n_groups += 1;
  }

  n_groups
}
