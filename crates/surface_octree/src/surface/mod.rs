//! Triangulated surface with lazily derived topology.
//!
//! [`TriSurface`] owns points, facets, patches and named facet subsets. Every
//! derived relation (point→facets, edges, facet→edges, edge→facets,
//! point→edges, facet→facets, normals, centres) is computed on first use and
//! cached until a mutation invalidates its group:
//!
//! ```text
//! connectivity  point_facets ─► edges ─► point_edges ─► facet_edges
//!                                  └──► edge_facets ─► facet_facets
//! geometry      facet_normals, facet_centres, point_normals
//! ```
//!
//! Moving points clears only the geometry group; adding facets clears both.
//!
//! # Module Structure
//!
//! - [`graph`]: `Adjacency`, compressed rows with a parallel reverse build
//! - [`addressing`]: the cache groups and the routines that fill them

pub mod addressing;
pub mod graph;

use std::collections::{BTreeMap, BTreeSet};

use glam::DVec3;
use tracing::warn;

use crate::geometry::{BoundBox, Triangle};
use addressing::{ConnectivityCache, GeometryCache};

pub use crate::geometry::Edge;
pub use graph::Adjacency;

/// Triangle of the surface: three point labels plus the patch it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Facet {
  /// Point labels; orientation gives the normal by the right-hand rule.
  pub vertices: [usize; 3],
  /// Index into the surface patches.
  pub patch: usize,
}

impl Facet {
  pub fn new(a: usize, b: usize, c: usize, patch: usize) -> Self {
    Self {
      vertices: [a, b, c],
      patch,
    }
  }

  /// Directed edges `(v0, v1)`, `(v1, v2)`, `(v2, v0)`.
  #[inline]
  pub fn edges(&self) -> [Edge; 3] {
    let [a, b, c] = self.vertices;
    [Edge::new(a, b), Edge::new(b, c), Edge::new(c, a)]
  }

  /// Check whether both end points of `edge` are vertices of the facet.
  #[inline]
  pub fn contains_edge(&self, edge: Edge) -> bool {
    self.vertices.contains(&edge.start) && self.vertices.contains(&edge.end)
  }
}

/// Named group of facets, such as one boundary region of the model.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patch {
  pub name: String,
  /// Free-form patch type, `"patch"` by default.
  pub kind: String,
}

impl Patch {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      kind: "patch".to_string(),
    }
  }

  pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
    self.kind = kind.into();
    self
  }
}

/// Named set of facet labels, used for local refinement overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FacetSubset {
  pub name: String,
  pub facets: BTreeSet<usize>,
}

impl FacetSubset {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      facets: BTreeSet::new(),
    }
  }
}

/// Triangulated surface.
#[derive(Debug, Default)]
pub struct TriSurface {
  points: Vec<DVec3>,
  facets: Vec<Facet>,
  patches: Vec<Patch>,
  subsets: BTreeMap<String, FacetSubset>,
  connectivity: ConnectivityCache,
  geometry: GeometryCache,
}

impl TriSurface {
  /// Create a surface; patches are named `patch0`, `patch1`, ... up to the
  /// highest patch index used by a facet.
  pub fn new(points: Vec<DVec3>, facets: Vec<Facet>) -> Self {
    let n_patches = facets.iter().map(|f| f.patch + 1).max().unwrap_or(0);
    let patches = (0..n_patches).map(|i| Patch::new(format!("patch{}", i))).collect();
    Self::with_patches(points, facets, patches)
  }

  /// Create a surface with explicit patches.
  ///
  /// Missing patches referenced by facets are appended with generated names.
  pub fn with_patches(points: Vec<DVec3>, facets: Vec<Facet>, mut patches: Vec<Patch>) -> Self {
    let needed = facets.iter().map(|f| f.patch + 1).max().unwrap_or(0);
    while patches.len() < needed {
      let name = format!("patch{}", patches.len());
      patches.push(Patch::new(name));
    }
    Self {
      points,
      facets,
      patches,
      ..Default::default()
    }
  }

  // ---------------------------------------------------------------------------
  // Raw data
  // ---------------------------------------------------------------------------

  #[inline]
  pub fn points(&self) -> &[DVec3] {
    &self.points
  }

  #[inline]
  pub fn facets(&self) -> &[Facet] {
    &self.facets
  }

  #[inline]
  pub fn patches(&self) -> &[Patch] {
    &self.patches
  }

  #[inline]
  pub fn n_points(&self) -> usize {
    self.points.len()
  }

  #[inline]
  pub fn n_facets(&self) -> usize {
    self.facets.len()
  }

  /// Corner coordinates of facet `f`.
  #[inline]
  pub fn facet_triangle(&self, f: usize) -> Triangle {
    let [a, b, c] = self.facets[f].vertices;
    Triangle::new(self.points[a], self.points[b], self.points[c])
  }

  pub fn facet_area(&self, f: usize) -> f64 {
    self.facet_triangle(f).area()
  }

  pub fn facet_is_degenerate(&self, f: usize) -> bool {
    self.facet_triangle(f).is_degenerate()
  }

  pub fn facet_patch_name(&self, f: usize) -> &str {
    &self.patches[self.facets[f].patch].name
  }

  /// Index of the patch called `name`.
  pub fn patch_index(&self, name: &str) -> Option<usize> {
    self.patches.iter().position(|p| p.name == name)
  }

  /// Bounding box of all points, `None` for an empty surface.
  pub fn bounding_box(&self) -> Option<BoundBox> {
    BoundBox::from_points(self.points.iter().copied())
  }

  // ---------------------------------------------------------------------------
  // Mutation
  // ---------------------------------------------------------------------------

  /// Move one point. Connectivity is kept; geometry is recomputed on demand.
  pub fn set_point(&mut self, label: usize, p: DVec3) {
    self.points[label] = p;
    self.clear_geometry();
  }

  /// Mutable access to all points. Clears the geometry caches.
  pub fn points_mut(&mut self) -> &mut [DVec3] {
    self.clear_geometry();
    &mut self.points
  }

  /// Append a point and return its label.
  pub fn append_point(&mut self, p: DVec3) -> usize {
    self.points.push(p);
    self.clear_addressing();
    self.clear_geometry();
    self.points.len() - 1
  }

  /// Append a facet and return its label. Unknown patches are created.
  pub fn append_facet(&mut self, facet: Facet) -> usize {
    while self.patches.len() <= facet.patch {
      let name = format!("patch{}", self.patches.len());
      self.patches.push(Patch::new(name));
    }
    self.facets.push(facet);
    self.clear_addressing();
    self.clear_geometry();
    self.facets.len() - 1
  }

  /// Add a patch and return its index.
  pub fn add_patch(&mut self, patch: Patch) -> usize {
    self.patches.push(patch);
    self.patches.len() - 1
  }

  // ---------------------------------------------------------------------------
  // Subsets
  // ---------------------------------------------------------------------------

  /// Create an empty subset (no-op if it exists).
  pub fn add_subset(&mut self, name: &str) {
    self.subsets
      .entry(name.to_string())
      .or_insert_with(|| FacetSubset::new(name));
  }

  /// Add facet `f` to the subset called `name`, creating the subset if needed.
  pub fn add_facet_to_subset(&mut self, name: &str, f: usize) {
    if f >= self.facets.len() {
      warn!(subset = name, facet = f, "facet label out of range, not added to subset");
      return;
    }
    self.add_subset(name);
    if let Some(subset) = self.subsets.get_mut(name) {
      subset.facets.insert(f);
    }
  }

  pub fn remove_subset(&mut self, name: &str) -> Option<FacetSubset> {
    self.subsets.remove(name)
  }

  pub fn subset(&self, name: &str) -> Option<&FacetSubset> {
    self.subsets.get(name)
  }

  /// All subsets ordered by name.
  pub fn subsets(&self) -> impl Iterator<Item = &FacetSubset> {
    self.subsets.values()
  }

  // ---------------------------------------------------------------------------
  // Cache invalidation
  // ---------------------------------------------------------------------------

  /// Drop every cached connectivity relation.
  pub fn clear_addressing(&mut self) {
    self.connectivity = ConnectivityCache::default();
  }

  /// Drop cached normals and centres.
  pub fn clear_geometry(&mut self) {
    self.geometry = GeometryCache::default();
  }
}

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;
