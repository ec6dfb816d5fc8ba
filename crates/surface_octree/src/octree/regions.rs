//! User refinement regions.
//!
//! A region forces every leaf it touches down to the level matching its cell
//! size. Box tests are conservative: a cube near a rounded edge of a sphere,
//! capsule or cone may be refined even if it only touches the inflated shape.

use glam::DVec3;

use crate::geometry::{bound_box_line_intersection, nearest_point_on_edge_exact, BoundBox};

/// Shape of a refinement region.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RefinementShape {
  /// Axis-aligned box.
  Box { min: DVec3, max: DVec3 },
  /// Ball.
  Sphere { centre: DVec3, radius: f64 },
  /// Capsule around the segment `start`-`end`.
  Line { start: DVec3, end: DVec3, radius: f64 },
  /// Truncated cone along `start`-`end`, radius interpolated linearly.
  Cone {
    start: DVec3,
    end: DVec3,
    start_radius: f64,
    end_radius: f64,
  },
}

impl RefinementShape {
  /// Check whether `p` lies in the closed shape.
  pub fn contains_point(&self, p: DVec3) -> bool {
    match *self {
      RefinementShape::Box { min, max } => p.cmpge(min).all() && p.cmple(max).all(),
      RefinementShape::Sphere { centre, radius } => p.distance_squared(centre) <= radius * radius,
      RefinementShape::Line { start, end, radius } => {
        nearest_point_on_edge_exact(start, end, p).distance_squared(p) <= radius * radius
      }
      RefinementShape::Cone {
        start,
        end,
        start_radius,
        end_radius,
      } => {
        let axis = end - start;
        let len_sq = axis.length_squared();
        if len_sq == 0.0 {
          return p.distance_squared(start) <= start_radius.max(end_radius).powi(2);
        }
        let t = (p - start).dot(axis) / len_sq;
        if !(0.0..=1.0).contains(&t) {
          return false;
        }
        let radius = start_radius + (end_radius - start_radius) * t;
        p.distance_squared(start + axis * t) <= radius * radius
      }
    }
  }

  /// Check whether the shape may touch `bb`.
  ///
  /// Exact for boxes and spheres; the capsule and cone tests also accept
  /// cubes within half a cube diagonal of the surface.
  pub fn intersects_box(&self, bb: &BoundBox) -> bool {
    match *self {
      RefinementShape::Box { min, max } => bb.overlaps(&BoundBox::new(min.min(max), min.max(max))),
      RefinementShape::Sphere { centre, radius } => bb.distance_squared_to_point(centre) <= radius * radius,
      RefinementShape::Line { start, end, radius } => {
        if !bound_box_line_intersection(start, end, &bb.inflated(radius)) {
          return false;
        }
        let c = bb.center();
        let half_diagonal = bb.size().length() * 0.5;
        nearest_point_on_edge_exact(start, end, c).distance(c) <= radius + half_diagonal
      }
      RefinementShape::Cone {
        start,
        end,
        start_radius,
        end_radius,
      } => {
        let max_radius = start_radius.max(end_radius);
        if !bound_box_line_intersection(start, end, &bb.inflated(max_radius)) {
          return false;
        }
        let c = bb.center();
        let half_diagonal = bb.size().length() * 0.5;
        let axis = end - start;
        let len_sq = axis.length_squared();
        let t = if len_sq > 0.0 {
          ((c - start).dot(axis) / len_sq).clamp(0.0, 1.0)
        } else {
          0.0
        };
        let radius = start_radius + (end_radius - start_radius) * t;
        (start + axis * t).distance(c) <= radius + half_diagonal
      }
    }
  }
}

/// Refinement region with its target cell size.
#[derive(Clone, Debug, PartialEq)]
pub struct RefinementObject {
  pub name: String,
  pub shape: RefinementShape,
  pub cell_size: f64,
}

impl RefinementObject {
  pub fn new(name: impl Into<String>, shape: RefinementShape, cell_size: f64) -> Self {
    Self {
      name: name.into(),
      shape,
      cell_size,
    }
  }
}
