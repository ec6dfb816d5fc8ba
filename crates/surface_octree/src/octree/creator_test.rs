use super::*;
use crate::constants::MAX_OCTREE_LEVEL;
use crate::octree::{CubeKey, OctreeCube, RefinementObject};
use crate::test_utils::{cube_surface, parallel_strips, unit_cube_surface, unit_cube_surface_at};

fn root_box(half: f64) -> BoundBox {
  BoundBox::new(DVec3::splat(-half), DVec3::splat(half))
}

/// Unit cube centred on the origin.
fn centred_unit_cube() -> Arc<TriSurface> {
  Arc::new(unit_cube_surface_at(DVec3::splat(-0.5)))
}

fn build(surface: Arc<TriSurface>, settings: OctreeSettings) -> MeshOctree {
  OctreeCreator::new(surface, settings)
    .expect("valid settings")
    .create_octree_boxes()
}

/// Comparable snapshot of the arena.
fn snapshot(octree: &MeshOctree) -> Vec<(CubeKey, CubeType, Option<CubeId>, Option<CubeId>, Vec<usize>)> {
  octree
    .cubes()
    .iter()
    .map(|c: &OctreeCube| (c.key, c.cube_type, c.parent, c.first_child, c.facets.to_vec()))
    .collect()
}

// =========================================================================
// Root and levels
// =========================================================================

#[test]
fn test_explicit_root_sets_global_level() {
  let settings = OctreeSettings::new(1.0).with_root_box(root_box(4.0)).with_workers(2);
  let creator = OctreeCreator::new(centred_unit_cube(), settings).unwrap();
  assert_eq!(creator.global_level(), 3);
  assert_eq!(creator.root_box(), &root_box(4.0));
  assert!(creator.facet_levels().iter().all(|&l| l == 3));
  assert_eq!(creator.num_workers(), 2);
}

/// Without an explicit root the edge is `max_cell_size * 2^global_level`,
/// centred on the surface and covering the inflated bounding box.
#[test]
fn test_derived_root_box() {
  let settings = OctreeSettings::new(0.25).with_workers(1);
  let creator = OctreeCreator::new(Arc::new(unit_cube_surface()), settings).unwrap();

  assert_eq!(creator.global_level(), 3);
  let root = creator.root_box();
  assert!((root.size().x - 2.0).abs() < 1e-12);
  assert!(root.is_cube());
  assert!(root.center().distance(DVec3::splat(0.5)) < 1e-12);
  assert!(root.contains_box(&BoundBox::new(DVec3::splat(-0.05), DVec3::splat(1.05))));
}

/// A zero margin still leaves the surface strictly inside the root.
#[test]
fn test_zero_margin_root_encloses_surface() {
  let surface = Arc::new(unit_cube_surface());
  for margin in [0.0, -1.0] {
    let settings = OctreeSettings::new(0.25).with_root_margin(margin).with_workers(1);
    let creator = OctreeCreator::new(surface.clone(), settings).unwrap();
    let root = creator.root_box();
    assert!(root.is_cube());
    for &p in surface.points() {
      assert!(root.strictly_contains_point(p), "margin {}: {:?} on {:?}", margin, p, root);
    }
  }
}

#[test]
fn test_scaling_factor_scales_cell_sizes() {
  let settings = OctreeSettings::new(1.0)
    .with_root_box(root_box(4.0))
    .with_boundary_cell_size(0.5)
    .with_patch_cell_size("xMax", 0.25)
    .with_workers(1);
  let plain = OctreeCreator::new(centred_unit_cube(), settings.clone()).unwrap();
  let scaled = OctreeCreator::new(centred_unit_cube(), settings.with_scaling_factor(0.5)).unwrap();

  assert_eq!(plain.global_level(), 3);
  assert_eq!(scaled.global_level(), 4);
  for (&p, &s) in plain.facet_levels().iter().zip(scaled.facet_levels()) {
    assert_eq!(s, p + 1);
  }
}

/// Without an explicit root the scaled max cell sets the root edge.
#[test]
fn test_scaling_factor_derived_root() {
  let settings = OctreeSettings::new(0.5).with_scaling_factor(0.5).with_workers(1);
  let creator = OctreeCreator::new(Arc::new(unit_cube_surface()), settings).unwrap();
  assert_eq!(creator.global_level(), 3);
  assert!((creator.root_box().size().x - 2.0).abs() < 1e-12);
}

#[test]
fn test_patch_and_subset_overrides() {
  let mut surface = unit_cube_surface_at(DVec3::splat(-0.5));
  surface.add_subset("bottom");
  surface.add_facet_to_subset("bottom", 0);
  surface.add_facet_to_subset("bottom", 1);

  let settings = OctreeSettings::new(1.0)
    .with_root_box(root_box(4.0))
    .with_patch_cell_size("xMax", 0.25)
    .with_patch_cell_size("missing", 0.1)
    .with_subset_cell_size("bottom", 0.5)
    .with_subset_cell_size("nowhere", 0.1)
    .with_workers(2);
  let creator = OctreeCreator::new(Arc::new(surface), settings).unwrap();

  let levels = creator.facet_levels();
  assert_eq!(&levels[0..2], &[4, 4], "subset override");
  assert_eq!(&levels[10..12], &[5, 5], "patch override");
  assert!(levels[2..10].iter().all(|&l| l == 3), "unknown names ignored");

  let octree = creator.create_octree_boxes();
  let on_x_max = octree.find_leaf_containing(DVec3::new(0.5, 0.1, 0.1)).unwrap();
  assert_eq!(on_x_max.cube_type, CubeType::Data);
  assert_eq!(on_x_max.level, 5);
  assert_eq!(octree.stats().max_facet_level, 5);
  assert!(octree.check_balance());
}

#[test]
fn test_boundary_cell_size() {
  let settings = OctreeSettings::new(1.0)
    .with_root_box(root_box(4.0))
    .with_boundary_cell_size(0.5)
    .with_workers(2);
  let octree = build(centred_unit_cube(), settings);
  for leaf in octree.leaves_of_type(CubeType::Data) {
    assert_eq!(leaf.level, 4);
  }
}

#[test]
fn test_invalid_settings_rejected() {
  let err = OctreeCreator::new(centred_unit_cube(), OctreeSettings::new(0.0)).err();
  assert!(matches!(err, Some(crate::OctreeError::InvalidCellSize { .. })));

  let err = OctreeCreator::new(centred_unit_cube(), OctreeSettings::new(1.0).with_workers(0)).err();
  assert!(matches!(err, Some(crate::OctreeError::NoWorkers)));

  let err = OctreeCreator::new(centred_unit_cube(), OctreeSettings::new(1.0).with_scaling_factor(0.0)).err();
  assert!(matches!(err, Some(crate::OctreeError::InvalidScalingFactor(_))));
}

// =========================================================================
// Scenarios
// =========================================================================

/// Unit cube in the root [-4, 4]^3 with unit cells: the 8 level-3 cubes
/// around the origin carry the surface, nothing is enclosed.
#[test]
fn test_unit_cube_scenario() {
  let settings = OctreeSettings::new(1.0).with_root_box(root_box(4.0)).with_workers(2);
  let octree = build(centred_unit_cube(), settings);

  let data = octree.leaves_of_type(CubeType::Data);
  assert_eq!(data.len(), 8);
  for leaf in &data {
    assert_eq!(leaf.level, 3);
    assert!(leaf.bounds.contains_point(DVec3::ZERO));
  }
  assert!(octree.leaves_of_type(CubeType::Inside).is_empty());
  assert!(octree.leaves_of_type(CubeType::Unknown).is_empty());
  assert_eq!(
    octree.leaves_of_type(CubeType::Outside).len(),
    octree.n_leaves() - 8
  );

  assert!(octree.check_balance());
  assert!(octree.check_partition());

  let stats = octree.stats();
  assert_eq!(stats.global_level, 3);
  assert_eq!(stats.leaves_data, 8);
  assert_eq!(stats.total_leaves(), octree.n_leaves());
  assert!(stats.boundary.cubes_refined > 0);
}

/// A cube of edge 8 in a root of edge 16 encloses coarse cubes that are
/// refined to the global level.
#[test]
fn test_inside_leaves_refined_to_global_level() {
  let surface = Arc::new(cube_surface(DVec3::splat(-4.0), 8.0));
  let settings = OctreeSettings::new(1.0).with_root_box(root_box(8.0)).with_workers(3);
  let octree = build(surface, settings);

  let inside = octree.leaves_of_type(CubeType::Inside);
  assert!(!inside.is_empty());
  assert!(inside.iter().all(|leaf| leaf.level == 4));
  assert!(octree.stats().inside.cubes_refined > 0);
  assert!(octree.leaves_of_type(CubeType::Unknown).is_empty());

  assert_eq!(octree.classify_point(DVec3::new(0.3, 0.2, 0.1)), CubeType::Inside);
  assert_eq!(octree.classify_point(DVec3::splat(7.5)), CubeType::Outside);
  assert_eq!(octree.classify_point(DVec3::new(4.0, 0.3, 0.3)), CubeType::Data);
  assert_eq!(octree.classify_point(DVec3::splat(20.0)), CubeType::Outside);
  assert!(octree.check_balance());
  assert!(octree.check_partition());
}

#[test]
fn test_rebalancing_converged_octree_is_noop() {
  let settings = OctreeSettings::new(1.0)
    .with_root_box(root_box(4.0))
    .with_boundary_cell_size(0.125)
    .with_workers(2);
  let mut octree = build(centred_unit_cube(), settings);
  let before = snapshot(&octree);

  let limits = RefineLimits {
    hex: false,
    max_level: MAX_OCTREE_LEVEL,
  };
  let stats = enforce_balance(&mut octree, limits);
  assert_eq!(stats.cubes_refined, 0);
  assert_eq!(snapshot(&octree), before);
}

/// In hex mode a refined cube's children are all leaves or all refined.
#[test]
fn test_hex_sibling_consistency() {
  let surface = Arc::new(unit_cube_surface_at(DVec3::new(-0.3, -0.2, -0.1)));
  let settings = OctreeSettings::new(1.0)
    .with_root_box(root_box(4.0))
    .with_boundary_cell_size(0.25)
    .with_hex_refinement(true)
    .with_workers(2);
  let octree = build(surface, settings);

  for cube in octree.cubes() {
    let Some(children) = cube.children() else {
      continue;
    };
    let refined = children.iter().filter(|&&c| !octree.cube(c).is_leaf()).count();
    assert!(refined == 0 || refined == 8, "mixed siblings under {:?}", cube.key);
  }
  assert!(octree.check_balance());
  assert!(octree.check_partition());
}

/// The arena is identical for every worker count.
#[test]
fn test_worker_count_determinism() {
  let region = RefinementObject::new(
    "probe",
    RefinementShape::Line {
      start: DVec3::new(-3.0, -3.0, 0.2),
      end: DVec3::new(3.0, 2.0, 0.2),
      radius: 0.3,
    },
    0.25,
  );
  let settings = |workers: usize| {
    OctreeSettings::new(1.0)
      .with_root_box(root_box(4.0))
      .with_boundary_cell_size(0.25)
      .with_refinement_object(region.clone())
      .with_n_layers(2)
      .with_workers(workers)
  };
  let surface = Arc::new(unit_cube_surface_at(DVec3::new(-0.3, -0.2, -0.1)));

  let reference = snapshot(&build(surface.clone(), settings(1)));
  for workers in [2, 3, 4, 7] {
    let octree = build(surface.clone(), settings(workers));
    assert_eq!(snapshot(&octree), reference, "{} workers", workers);
  }
}

#[test]
fn test_region_refinement() {
  let region = RefinementObject::new(
    "ball",
    RefinementShape::Sphere {
      centre: DVec3::splat(3.0),
      radius: 0.5,
    },
    0.5,
  );
  let settings = OctreeSettings::new(2.0)
    .with_root_box(root_box(4.0))
    .with_refinement_object(region)
    .with_workers(2);
  let octree = build(centred_unit_cube(), settings);

  assert_eq!(octree.find_leaf_containing(DVec3::splat(3.0)).unwrap().level, 4);
  assert!(octree.stats().regions.cubes_refined > 0);
  assert!(octree.check_balance());
}

/// Two strips 0.01 apart: proximity refinement adds its extra levels.
#[test]
fn test_proximity_refinement() {
  let surface = Arc::new(parallel_strips(0.01));
  let plain = build(surface.clone(), OctreeSettings::new(0.5).with_workers(2));
  let refined = build(
    surface,
    OctreeSettings::new(0.5).with_proximity_extra_levels(3).with_workers(2),
  );

  assert_eq!(refined.max_leaf_level(), plain.max_leaf_level() + 3);
  assert!(refined.n_leaves() > plain.n_leaves());
  assert!(refined.check_balance());
}

#[test]
fn test_max_level_caps_refinement() {
  let settings = OctreeSettings::new(1.0)
    .with_root_box(root_box(4.0))
    .with_boundary_cell_size(0.01)
    .with_max_level(5)
    .with_workers(2);
  let octree = build(centred_unit_cube(), settings);
  assert_eq!(octree.max_leaf_level(), 5);
}

// =========================================================================
// Degenerate input
// =========================================================================

#[test]
fn test_empty_surface_root_outside() {
  let settings = OctreeSettings::new(1.0).with_workers(1);
  let creator = OctreeCreator::new(Arc::new(TriSurface::default()), settings).unwrap();
  assert_eq!(creator.global_level(), 0);

  let octree = creator.create_octree_boxes();
  assert_eq!(octree.n_cubes(), 1);
  assert_eq!(octree.cube(CubeId::ROOT).cube_type, CubeType::Outside);
  assert_eq!(octree.classify_point(DVec3::ZERO), CubeType::Outside);
}

#[test]
fn test_surface_outside_explicit_root() {
  let surface = Arc::new(unit_cube_surface_at(DVec3::splat(10.0)));
  let settings = OctreeSettings::new(1.0).with_root_box(root_box(4.0)).with_workers(1);
  let octree = build(surface, settings);
  assert_eq!(octree.n_cubes(), 1);
  assert_eq!(octree.cube(CubeId::ROOT).cube_type, CubeType::Outside);
}

#[test]
fn test_degenerate_facets_never_enter_tree() {
  let mut surface = unit_cube_surface_at(DVec3::splat(-0.5));
  let a = surface.append_point(DVec3::new(-2.0, -2.0, -2.0));
  let b = surface.append_point(DVec3::new(2.0, 2.0, 2.0));
  let sliver = surface.append_facet(crate::surface::Facet::new(a, b, b, 0));

  let settings = OctreeSettings::new(1.0).with_root_box(root_box(4.0)).with_workers(1);
  let octree = build(Arc::new(surface), settings);
  assert!(octree.cubes().iter().all(|c| !c.facets.contains(&sliver)));
}

// =========================================================================
// Search octree
// =========================================================================

#[test]
fn test_search_octree_limits_facets_per_leaf() {
  let creator = OctreeCreator::new(Arc::new(unit_cube_surface()), OctreeSettings::new(0.25).with_workers(2)).unwrap();
  let octree = creator.create_octree_with_refined_boundary(8, DEFAULT_MAX_FACETS_PER_LEAF);
  assert!(octree.leaves().all(|id| {
    let cube = octree.cube(id);
    cube.facets.len() <= DEFAULT_MAX_FACETS_PER_LEAF || cube.key.level == 8
  }));
  assert!(octree.check_partition());
}
