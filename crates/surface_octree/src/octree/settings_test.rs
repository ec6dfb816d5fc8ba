use glam::DVec3;

use super::*;
use crate::octree::RefinementShape;

// =========================================================================
// Level math
// =========================================================================

/// A root of edge 8 reaches cells of edge 1 at level 3.
#[test]
fn test_exact_power_of_two() {
  assert_eq!(level_for_cell_size(8.0, 1.0, MAX_OCTREE_LEVEL), 3);
  assert_eq!(level_for_cell_size(8.0, 8.0, MAX_OCTREE_LEVEL), 0);
}

/// Cells must not exceed the requested size, so levels round up.
#[test]
fn test_level_rounds_up() {
  assert_eq!(level_for_cell_size(8.0, 0.9, MAX_OCTREE_LEVEL), 4);
  assert_eq!(level_for_cell_size(8.0, 1.1, MAX_OCTREE_LEVEL), 3);
}

#[test]
fn test_cell_larger_than_root_is_level_zero() {
  assert_eq!(level_for_cell_size(1.0, 10.0, MAX_OCTREE_LEVEL), 0);
}

#[test]
fn test_level_clamped_to_max() {
  assert_eq!(level_for_cell_size(1.0, 1.0e-12, 6), 6);
  let settings = OctreeSettings::new(1.0).with_max_level(4);
  assert_eq!(settings.level_for_cell_size(1024.0, 1.0), 4);
}

// =========================================================================
// Validation
// =========================================================================

#[test]
fn test_defaults_are_valid() {
  let settings = OctreeSettings::default();
  assert!(settings.validate().is_ok());
  assert_eq!(settings.n_layers, 1);
  assert!(!settings.hex_refinement);
  assert_eq!(settings.effective_max_level(), MAX_OCTREE_LEVEL);
}

#[test]
fn test_invalid_cell_sizes_rejected() {
  for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
    let err = OctreeSettings::new(bad).validate().unwrap_err();
    assert!(matches!(err, OctreeError::InvalidCellSize { ref setting, .. } if setting == "max_cell_size"));
  }

  let err = OctreeSettings::new(1.0)
    .with_patch_cell_size("inlet", -0.5)
    .validate()
    .unwrap_err();
  assert!(matches!(err, OctreeError::InvalidCellSize { ref setting, .. } if setting == "patch_cell_sizes[inlet]"));

  let region = RefinementObject::new(
    "wake",
    RefinementShape::Sphere {
      centre: DVec3::ZERO,
      radius: 1.0,
    },
    0.0,
  );
  assert!(OctreeSettings::new(1.0).with_refinement_object(region).validate().is_err());
}

#[test]
fn test_degenerate_root_box_rejected() {
  let flat = BoundBox::new(DVec3::ZERO, DVec3::new(1.0, 1.0, 0.0));
  let err = OctreeSettings::new(0.1).with_root_box(flat).validate().unwrap_err();
  assert!(matches!(err, OctreeError::DegenerateRootBox { .. }));

  let slab = BoundBox::new(DVec3::ZERO, DVec3::new(2.0, 1.0, 1.0));
  assert!(OctreeSettings::new(0.1).with_root_box(slab).validate().is_err());

  let cube = BoundBox::new(DVec3::splat(-4.0), DVec3::splat(4.0));
  assert!(OctreeSettings::new(1.0).with_root_box(cube).validate().is_ok());
}

#[test]
fn test_scaling_factor_validated() {
  for bad in [0.0, -2.0, f64::NAN, f64::INFINITY] {
    let err = OctreeSettings::new(1.0).with_scaling_factor(bad).validate().unwrap_err();
    assert!(matches!(err, OctreeError::InvalidScalingFactor(_)));
  }
  assert_eq!(OctreeSettings::default().scaling_factor, 1.0);
}

#[test]
fn test_scaling_factor_applies_to_levels() {
  let settings = OctreeSettings::new(1.0).with_scaling_factor(0.5);
  assert!(settings.validate().is_ok());
  assert_eq!(settings.level_for_cell_size(8.0, 1.0), 4);
  assert_eq!(settings.scaled_max_cell_size(), 0.5);
}

#[test]
fn test_zero_workers_rejected() {
  let err = OctreeSettings::new(1.0).with_workers(0).validate().unwrap_err();
  assert!(matches!(err, OctreeError::NoWorkers));
}

#[test]
fn test_margin_never_below_minimum() {
  let settings = OctreeSettings::new(1.0).with_root_margin(-0.2);
  assert!(settings.validate().is_ok());
  assert_eq!(settings.effective_root_margin(), MIN_ROOT_MARGIN);

  for margin in [0.0, f64::NAN] {
    let settings = OctreeSettings::new(1.0).with_root_margin(margin);
    assert_eq!(settings.effective_root_margin(), MIN_ROOT_MARGIN);
  }
  assert_eq!(OctreeSettings::new(1.0).with_root_margin(0.2).effective_root_margin(), 0.2);
}
