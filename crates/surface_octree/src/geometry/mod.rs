//! Geometric predicate library.
//!
//! Stateless functions over raw `DVec3` coordinates, safe to call from any
//! worker. Degenerate input never panics: every predicate falls back to a
//! conservative answer ("no intersection", nearest vertex, zero normal).
//!
//! # Module Structure
//!
//! - [`bounds`]: `BoundBox` and the segment slab test
//! - [`edge`]: `Edge`, nearest points on segments and lines
//! - [`plane`]: `Plane`, line-plane intersection
//! - [`triangle`]: `Triangle`, nearest point, line and box intersection
//! - [`tetrahedron`]: `Tetrahedron`, point containment
//! - [`face`]: polygon faces, convexity and coplanar patch merging
//! - [`feature_groups`]: flood-fill counts of surface pieces near a point

pub mod bounds;
pub mod edge;
pub mod face;
pub mod feature_groups;
pub mod plane;
pub mod tetrahedron;
pub mod triangle;

// Re-exports
pub use bounds::{bound_box_line_intersection, BoundBox};
pub use edge::{
  distance_from_edge, nearest_edge_point_to_line, nearest_point_on_edge, nearest_point_on_edge_exact,
  vertex_on_line, Edge,
};
pub use face::{
  do_face_and_triangle_intersect, is_shared_edge_convex, merge_patch_faces, merge_two_faces,
  point_inside_face, point_inside_face_with_normal, share_an_edge, Face,
};
pub use feature_groups::{number_of_edge_groups, number_of_face_groups};
pub use plane::{plane_intersects_edge, vertex_in_plane, Plane};
pub use tetrahedron::{point_in_tetrahedron, Tetrahedron};
pub use triangle::{nearest_point_on_triangle, tri_line_intersection, triangle_intersects_box, Triangle};
