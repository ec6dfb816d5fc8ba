use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use super::*;
use crate::test_utils::{
  brute_force_edge_count, non_manifold_fin, open_square, parallel_strips, tetrahedron_surface,
  unit_cube_surface,
};
use crate::threading::WorkerPool;

fn all_fixtures() -> Vec<(&'static str, TriSurface)> {
  vec![
    ("cube", unit_cube_surface()),
    ("tetrahedron", tetrahedron_surface()),
    ("strips", parallel_strips(0.01)),
    ("square", open_square()),
    ("fin", non_manifold_fin()),
  ]
}

/// Jittered n x n grid of triangles with shuffled facet order.
fn shuffled_grid(n: usize, seed: u64) -> TriSurface {
  let mut points = Vec::new();
  for j in 0..=n {
    for i in 0..=n {
      points.push(DVec3::new(i as f64, j as f64, ((i * 7 + j * 3) % 5) as f64 * 0.1));
    }
  }
  let row = n + 1;
  let mut facets = Vec::new();
  for j in 0..n {
    for i in 0..n {
      let p00 = j * row + i;
      facets.push(Facet::new(p00, p00 + 1, p00 + row + 1, 0));
      facets.push(Facet::new(p00, p00 + row + 1, p00 + row, 0));
    }
  }
  let mut rng = StdRng::seed_from_u64(seed);
  facets.shuffle(&mut rng);
  TriSurface::new(points, facets)
}

// =========================================================================
// Edges
// =========================================================================

#[test]
fn test_edge_count_matches_distinct_edges() {
  for (name, surface) in all_fixtures() {
    assert_eq!(
      surface.edges().len(),
      brute_force_edge_count(&surface),
      "{}: wrong edge count",
      name
    );
  }
}

#[test]
fn test_known_edge_counts() {
  assert_eq!(unit_cube_surface().edges().len(), 18);
  assert_eq!(tetrahedron_surface().edges().len(), 6);
  assert_eq!(open_square().edges().len(), 5);
  assert_eq!(non_manifold_fin().edges().len(), 7);
}

#[test]
fn test_edges_are_unique() {
  for (name, surface) in all_fixtures() {
    let unique: std::collections::HashSet<Edge> = surface.edges().iter().copied().collect();
    assert_eq!(unique.len(), surface.edges().len(), "{}: duplicate edge", name);
  }
}

#[test]
fn test_first_facet_owns_its_edges() {
  let surface = unit_cube_surface();
  let first = surface.facets()[0].edges();
  for (i, edge) in first.iter().enumerate() {
    assert_eq!(surface.edges()[i].start, edge.start, "owner direction is kept");
    assert_eq!(surface.edges()[i].end, edge.end);
  }
}

#[test]
fn test_edge_facets_round_trip() {
  for (name, surface) in all_fixtures() {
    for (e, &edge) in surface.edges().iter().enumerate() {
      let by_walk: Vec<usize> = (0..surface.n_facets())
        .filter(|&f| surface.facets()[f].contains_edge(edge))
        .collect();
      assert_eq!(surface.edge_facets().row(e), by_walk.as_slice(), "{}: edge {}", name, e);
    }
  }
}

#[test]
fn test_facet_edges_match_vertices() {
  for (name, surface) in all_fixtures() {
    let edges = surface.edges();
    for (f, facet) in surface.facets().iter().enumerate() {
      let labels = surface.facet_edges()[f];
      assert_eq!(labels.len(), 3);
      for (i, &e) in labels.iter().enumerate() {
        assert!(facet.contains_edge(edges[e]), "{}: facet {} edge {}", name, f, e);
        assert_eq!(edges[e], facet.edges()[i], "{}: facet edges out of order", name);
      }
    }
  }
}

#[test]
fn test_manifold_edge_valence() {
  let square = open_square();
  let valences: Vec<usize> = (0..square.edges().len()).map(|e| square.edge_facets().row_len(e)).collect();
  assert_eq!(valences.iter().filter(|&&v| v == 1).count(), 4);
  assert_eq!(valences.iter().filter(|&&v| v == 2).count(), 1);

  let cube = unit_cube_surface();
  assert!((0..cube.edges().len()).all(|e| cube.edge_facets().row_len(e) == 2));
}

#[test]
fn test_non_manifold_edge_is_tolerated() {
  let fin = non_manifold_fin();
  let hinge = fin.edges().iter().position(|&e| e == Edge::new(0, 1)).unwrap();
  assert_eq!(fin.edge_facets().row(hinge), &[0, 1, 2]);
}

#[test]
fn test_point_edges() {
  let cube = unit_cube_surface();
  // Corner 0 carries three cube edges and three face diagonals.
  assert_eq!(cube.point_edges().row_len(0), 6);
  for p in 0..cube.n_points() {
    for &e in cube.point_edges().row(p) {
      assert!(cube.edges()[e].contains(p));
    }
  }
}

#[test]
fn test_edges_independent_of_worker_count() {
  let reference = {
    let surface = shuffled_grid(12, 3);
    WorkerPool::new(1).unwrap().install(|| surface.edges().to_vec())
  };
  assert_eq!(reference.len(), brute_force_edge_count(&shuffled_grid(12, 3)));

  for workers in [2, 3, 4, 7] {
    let surface = shuffled_grid(12, 3);
    let edges = WorkerPool::new(workers).unwrap().install(|| surface.edges().to_vec());
    let exact: Vec<(usize, usize)> = edges.iter().map(|e| (e.start, e.end)).collect();
    let expected: Vec<(usize, usize)> = reference.iter().map(|e| (e.start, e.end)).collect();
    assert_eq!(exact, expected, "worker count {} changed the edge list", workers);
  }
}

// =========================================================================
// Facet neighbours
// =========================================================================

#[test]
fn test_facet_facets_exclude_self() {
  let cube = unit_cube_surface();
  for f in 0..cube.n_facets() {
    let row = cube.facet_facets().row(f);
    assert_eq!(row.len(), 3, "closed cube triangle has three neighbours");
    assert!(!row.contains(&f));
    assert!(row.windows(2).all(|w| w[0] < w[1]), "neighbours sorted and unique");
  }
}

#[test]
fn test_facet_facets_on_fin() {
  let fin = non_manifold_fin();
  assert_eq!(fin.facet_facets().row(0), &[1, 2]);
  assert_eq!(fin.facet_facets().row(1), &[0, 2]);
}

// =========================================================================
// Geometry
// =========================================================================

#[test]
fn test_cube_normals_point_outward() {
  let cube = unit_cube_surface();
  let centre = DVec3::splat(0.5);
  for f in 0..cube.n_facets() {
    let n = cube.facet_normals()[f];
    assert!((n.length() - 1.0).abs() < 1e-12);
    assert!(n.dot(cube.facet_centres()[f] - centre) > 0.0, "facet {} points inward", f);
  }
}

#[test]
fn test_corner_point_normal() {
  let cube = unit_cube_surface();
  let expected = DVec3::splat(-1.0).normalize();
  assert!((cube.point_normals()[0] - expected).length() < 1e-12);
}

#[test]
fn test_opposing_facets_give_zero_point_normal() {
  let points = vec![DVec3::ZERO, DVec3::X, DVec3::Y];
  let surface = TriSurface::new(points, vec![Facet::new(0, 1, 2, 0), Facet::new(0, 2, 1, 0)]);
  assert_eq!(surface.point_normals()[0], DVec3::ZERO);
}

#[test]
fn test_set_point_refreshes_geometry_only() {
  let mut square = open_square();
  let edges_before = square.edges().to_vec();
  assert_eq!(square.facet_normals()[0], DVec3::Z);

  // Fold the first triangle up out of the plane.
  square.set_point(1, DVec3::new(1.0, 0.0, 1.0));
  assert!(square.facet_normals()[0].z < 1.0);
  assert_eq!(square.edges(), edges_before.as_slice());
}

#[test]
fn test_append_facet_refreshes_connectivity() {
  let mut square = open_square();
  assert_eq!(square.edges().len(), 5);
  let apex = square.append_point(DVec3::new(0.5, 0.5, 1.0));
  square.append_facet(Facet::new(0, 1, apex, 1));
  assert_eq!(square.edges().len(), 7);
  assert_eq!(square.patches().len(), 2);
  assert_eq!(square.facet_patch_name(2), "patch1");
}

#[test]
fn test_bounding_box_and_area() {
  let cube = unit_cube_surface();
  let bb = cube.bounding_box().unwrap();
  assert_eq!(bb.min, DVec3::ZERO);
  assert_eq!(bb.max, DVec3::ONE);
  assert!((cube.facet_area(0) - 0.5).abs() < 1e-12);
  assert!(!cube.facet_is_degenerate(0));
  assert!(TriSurface::default().bounding_box().is_none());
}

// =========================================================================
// Patches and subsets
// =========================================================================

#[test]
fn test_patch_lookup() {
  let cube = unit_cube_surface();
  assert_eq!(cube.patch_index("xMax"), Some(5));
  assert_eq!(cube.patch_index("nope"), None);
  assert_eq!(cube.facet_patch_name(0), "zMin");
}

#[test]
fn test_subsets() {
  let mut cube = unit_cube_surface();
  cube.add_facet_to_subset("top", 2);
  cube.add_facet_to_subset("top", 3);
  cube.add_facet_to_subset("top", 99);
  let top = cube.subset("top").unwrap();
  assert_eq!(top.facets.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
  assert_eq!(cube.subsets().count(), 1);
  assert!(cube.remove_subset("top").is_some());
  assert!(cube.subset("top").is_none());
}
