//! surface_octree - Surface-conforming octree for cartesian mesh generation
//!
//! This crate builds an adaptive octree over the bounding volume of a
//! triangulated surface and provides the geometric queries needed to classify
//! and refine it. Downstream mesh generators consume the result: leaves tagged
//! INSIDE / OUTSIDE / DATA, point classification and nearest-surface queries.
//!
//! # Features
//!
//! - **Surface topology**: lazily cached point, edge and facet adjacency with a
//!   count-then-write parallel edge construction
//! - **Geometric predicates**: nearest points on triangles and edges,
//!   line/plane/triangle/tetrahedron tests, feature-group flood fills
//! - **Octree refinement**: surface, proximity, region and 2:1 balance passes
//!   with optional hex-consistent sibling refinement
//! - **Classification**: inside/outside flood fill seeded at the root boundary
//! - **Load distribution**: greedy leaf migration between workers
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use surface_octree::{CubeType, OctreeCreator, OctreeSettings, TriSurface};
//!
//! let surface = Arc::new(TriSurface::new(points, facets));
//! let settings = OctreeSettings::new(0.25).with_boundary_cell_size(0.05);
//!
//! let octree = OctreeCreator::new(surface, settings)?.create_octree_boxes();
//!
//! for leaf in octree.leaves_of_type(CubeType::Inside) {
//!     println!("{:?} at level {}", leaf.bounds, leaf.level);
//! }
//! ```

pub mod constants;
pub mod error;

// Geometric predicate library
pub mod geometry;

// Triangulated surface and derived topology
pub mod surface;

// Octree spatial index
pub mod octree;

// Fixed worker pool and parallel append helpers
pub mod threading;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used items
pub use constants::{SMALL, VGREAT, VSMALL};
pub use error::OctreeError;
pub use geometry::{BoundBox, Face, Plane, Tetrahedron, Triangle};
pub use octree::{
  CubeId, CubeKey, CubeType, LeafInfo, MeshOctree, OctreeCreator, OctreeSettings, RefinementObject,
  RefinementShape,
};
pub use surface::{Adjacency, Edge, Facet, FacetSubset, Patch, TriSurface};
pub use threading::WorkerPool;
