//! Surface fixtures shared by the unit tests.

use glam::DVec3;

use crate::surface::{Facet, Patch, TriSurface};

// =============================================================================
// Closed surfaces
// =============================================================================

/// Corners of the unit cube `[0, 1]^3`, label = x + 2y + 4z.
fn unit_cube_points() -> Vec<DVec3> {
  (0..8)
    .map(|i| DVec3::new((i & 1) as f64, ((i >> 1) & 1) as f64, ((i >> 2) & 1) as f64))
    .collect()
}

/// Outward-oriented triangles of the unit cube, two per side, one patch per
/// side: zMin, zMax, yMin, yMax, xMin, xMax.
const UNIT_CUBE_FACETS: [[usize; 3]; 12] = [
  [0, 2, 3],
  [0, 3, 1],
  [4, 5, 7],
  [4, 7, 6],
  [0, 1, 5],
  [0, 5, 4],
  [2, 6, 7],
  [2, 7, 3],
  [0, 4, 6],
  [0, 6, 2],
  [1, 3, 7],
  [1, 7, 5],
];

const UNIT_CUBE_PATCHES: [&str; 6] = ["zMin", "zMax", "yMin", "yMax", "xMin", "xMax"];

/// Unit cube `[0, 1]^3` with 12 outward triangles.
pub fn unit_cube_surface() -> TriSurface {
  unit_cube_surface_at(DVec3::ZERO)
}

/// Unit cube translated so its minimum corner is `origin`.
pub fn unit_cube_surface_at(origin: DVec3) -> TriSurface {
  cube_surface(origin, 1.0)
}

/// Cube of edge `size` with its minimum corner at `origin`.
pub fn cube_surface(origin: DVec3, size: f64) -> TriSurface {
  let points = unit_cube_points().into_iter().map(|p| origin + p * size).collect();
  let facets = UNIT_CUBE_FACETS
    .iter()
    .enumerate()
    .map(|(i, &[a, b, c])| Facet::new(a, b, c, i / 2))
    .collect();
  let patches = UNIT_CUBE_PATCHES.iter().map(|&name| Patch::new(name)).collect();
  TriSurface::with_patches(points, facets, patches)
}

/// Tetrahedron on the origin and the three unit axes, outward facets.
pub fn tetrahedron_surface() -> TriSurface {
  let points = vec![DVec3::ZERO, DVec3::X, DVec3::Y, DVec3::Z];
  let facets = vec![
    Facet::new(0, 2, 1, 0),
    Facet::new(0, 1, 3, 0),
    Facet::new(0, 3, 2, 0),
    Facet::new(1, 2, 3, 0),
  ];
  TriSurface::new(points, facets)
}

// =============================================================================
// Open and non-manifold surfaces
// =============================================================================

/// Two unit squares in the planes z = 0 and z = `gap`, each split into two
/// quads along x = 0.5 and four triangles. Patch 0 is the lower strip.
pub fn parallel_strips(gap: f64) -> TriSurface {
  let mut points = Vec::with_capacity(12);
  let mut facets = Vec::with_capacity(8);
  for strip in 0..2 {
    let z = strip as f64 * gap;
    let base = points.len();
    for j in 0..2 {
      for i in 0..3 {
        points.push(DVec3::new(i as f64 * 0.5, j as f64, z));
      }
    }
    for i in 0..2 {
      let p00 = base + i;
      let p10 = p00 + 1;
      let p11 = p00 + 4;
      let p01 = p00 + 3;
      facets.push(Facet::new(p00, p10, p11, strip));
      facets.push(Facet::new(p00, p11, p01, strip));
    }
  }
  TriSurface::new(points, facets)
}

/// Unit square in z = 0 made of two triangles; four boundary edges.
pub fn open_square() -> TriSurface {
  let points = vec![
    DVec3::ZERO,
    DVec3::X,
    DVec3::new(1.0, 1.0, 0.0),
    DVec3::Y,
  ];
  let facets = vec![Facet::new(0, 1, 2, 0), Facet::new(0, 2, 3, 0)];
  TriSurface::new(points, facets)
}

/// Three triangles hinged on the edge 0-1.
pub fn non_manifold_fin() -> TriSurface {
  let points = vec![
    DVec3::ZERO,
    DVec3::X,
    DVec3::new(0.5, 1.0, 0.0),
    DVec3::new(0.5, -1.0, 0.0),
    DVec3::new(0.5, 0.0, 1.0),
  ];
  let facets = vec![
    Facet::new(0, 1, 2, 0),
    Facet::new(1, 0, 3, 0),
    Facet::new(0, 1, 4, 0),
  ];
  TriSurface::new(points, facets)
}

/// Distinct undirected edges found by walking every facet.
pub fn brute_force_edge_count(surface: &TriSurface) -> usize {
  let mut edges: Vec<(usize, usize)> = surface
    .facets()
    .iter()
    .flat_map(|f| f.edges())
    .map(|e| e.sorted())
    .collect();
  edges.sort_unstable();
  edges.dedup();
  edges.len()
}
