//! OctreeCreator - builds a [`MeshOctree`] from a surface and settings.
//!
//! # Construction order
//!
//! ```text
//! root & levels      settings -> root box, global level, per-facet levels
//! boundary           DATA leaves to their facet level (+ proximity levels)
//! near data          n_layers of leaves around DATA leaves, then balance
//! regions            refinement objects, then balance
//! classify           flood fill INSIDE / OUTSIDE
//! inside             INSIDE leaves to the global level, balance, classify
//! ```
//!
//! All passes run inside the creator's [`WorkerPool`].

use std::sync::Arc;

use glam::DVec3;
use tracing::{info, warn};

use super::classification::classify_leaves;
use super::cube::{CubeFacets, CubeId, CubeType};
use super::refinement::{
  enforce_balance, refine_boundary, refine_crowded, refine_inside, refine_near_data, refine_proximity, refine_regions,
  RefineLimits,
};
use super::regions::RefinementShape;
use super::{MeshOctree, OctreeSettings};
use crate::constants::CUBE_BOX_TOLERANCE;
use crate::error::Result;
use crate::geometry::{triangle_intersects_box, BoundBox};
use crate::surface::TriSurface;
use crate::threading::WorkerPool;

/// Default facet limit per leaf for the search octree.
pub const DEFAULT_MAX_FACETS_PER_LEAF: usize = 15;

/// Builds octrees over one surface with one set of settings.
pub struct OctreeCreator {
  surface: Arc<TriSurface>,
  settings: OctreeSettings,
  pool: WorkerPool,
  root_box: BoundBox,
  global_level: u8,
  facet_levels: Vec<u8>,
  region_levels: Vec<(RefinementShape, u8)>,
}

impl OctreeCreator {
  /// Validate `settings`, start the worker pool and derive the root cube and
  /// refinement levels.
  pub fn new(surface: Arc<TriSurface>, settings: OctreeSettings) -> Result<Self> {
    settings.validate()?;
    let pool = match settings.workers {
      Some(n) => WorkerPool::new(n)?,
      None => WorkerPool::default_workers()?,
    };

    let mut creator = Self {
      surface,
      settings,
      pool,
      root_box: BoundBox::new(DVec3::ZERO, DVec3::ONE),
      global_level: 0,
      facet_levels: Vec::new(),
      region_levels: Vec::new(),
    };
    creator.set_root_cube_size_and_ref_parameters();
    Ok(creator)
  }

  // ---------------------------------------------------------------------------
  // Accessors
  // ---------------------------------------------------------------------------

  pub fn surface(&self) -> &Arc<TriSurface> {
    &self.surface
  }

  pub fn settings(&self) -> &OctreeSettings {
    &self.settings
  }

  pub fn root_box(&self) -> &BoundBox {
    &self.root_box
  }

  /// Level at which cubes reach the scaled `max_cell_size`.
  pub fn global_level(&self) -> u8 {
    self.global_level
  }

  /// Requested level per facet (never below the global level).
  pub fn facet_levels(&self) -> &[u8] {
    &self.facet_levels
  }

  pub fn num_workers(&self) -> usize {
    self.pool.num_workers()
  }

  // ---------------------------------------------------------------------------
  // Root and levels
  // ---------------------------------------------------------------------------

  /// Derive the root box, the global level and per-facet and per-region
  /// levels from the settings.
  fn set_root_cube_size_and_ref_parameters(&mut self) {
    let settings = &self.settings;
    let max_cell = settings.scaled_max_cell_size();

    let (root_box, global_level) = match (settings.root_box, self.surface.bounding_box()) {
      (Some(root), _) => (root, settings.level_for_cell_size(root.size().x, settings.max_cell_size)),
      (None, Some(bbox)) => {
        let extent = bbox.span();
        let margin = if extent > 0.0 {
          settings.effective_root_margin() * extent
        } else {
          max_cell
        };
        let inflated = bbox.inflated(margin).span();
        let level = settings.level_for_cell_size(inflated, settings.max_cell_size);
        let size = (max_cell * (1u64 << level) as f64).max(inflated);
        (BoundBox::from_center_half_extents(bbox.center(), DVec3::splat(size * 0.5)), level)
      }
      (None, None) => (
        BoundBox::from_center_half_extents(DVec3::ZERO, DVec3::splat(max_cell * 0.5)),
        0,
      ),
    };
    let root_size = root_box.size().x;
    let level_for = |cell: f64| settings.level_for_cell_size(root_size, cell);

    let boundary_level = settings
      .boundary_cell_size
      .map_or(global_level, level_for)
      .max(global_level);
    let mut facet_levels = vec![boundary_level; self.surface.n_facets()];

    for (name, &size) in &settings.patch_cell_sizes {
      let Some(patch) = self.surface.patch_index(name) else {
        warn!(patch = %name, "unknown patch in cell size overrides, ignored");
        continue;
      };
      let level = level_for(size);
      for (f, facet) in self.surface.facets().iter().enumerate() {
        if facet.patch == patch {
          facet_levels[f] = facet_levels[f].max(level);
        }
      }
    }

    for (name, &size) in &settings.subset_cell_sizes {
      let Some(subset) = self.surface.subset(name) else {
        warn!(subset = %name, "unknown facet subset in cell size overrides, ignored");
        continue;
      };
      let level = level_for(size);
      for &f in &subset.facets {
        if let Some(slot) = facet_levels.get_mut(f) {
          *slot = (*slot).max(level);
        }
      }
    }

    self.region_levels = settings
      .refinement_objects
      .iter()
      .map(|object| (object.shape, level_for(object.cell_size)))
      .collect();

    info!(
      root_size,
      global_level,
      boundary_level,
      max_facet_level = facet_levels.iter().copied().max().unwrap_or(global_level),
      "octree levels"
    );

    self.root_box = root_box;
    self.global_level = global_level;
    self.facet_levels = facet_levels;
  }

  /// Octree with only the root cube: DATA when usable facets cross the root
  /// box, OUTSIDE otherwise.
  fn root_octree(&self) -> MeshOctree {
    let bounds = self
      .root_box
      .inflated(CUBE_BOX_TOLERANCE * self.root_box.size().x);
    let surface = &self.surface;
    let facets: CubeFacets = (0..surface.n_facets())
      .filter(|&f| !surface.facet_is_degenerate(f))
      .filter(|&f| triangle_intersects_box(&surface.facet_triangle(f), &bounds))
      .collect();

    let root_type = if facets.is_empty() {
      CubeType::Outside
    } else {
      CubeType::Data
    };
    MeshOctree::new(self.surface.clone(), self.root_box, root_type, facets)
  }

  fn limits(&self) -> RefineLimits {
    RefineLimits {
      hex: self.settings.hex_refinement,
      max_level: self.settings.effective_max_level(),
    }
  }

  // ---------------------------------------------------------------------------
  // Construction
  // ---------------------------------------------------------------------------

  /// Build the refined and classified octree.
  pub fn create_octree_boxes(&self) -> MeshOctree {
    self.pool.install(|| self.build_octree())
  }

  #[tracing::instrument(skip_all, name = "octree::create_octree_boxes")]
  fn build_octree(&self) -> MeshOctree {
    let mut octree = self.root_octree();
    octree.stats.global_level = self.global_level;
    octree.stats.max_facet_level = self.facet_levels.iter().copied().max().unwrap_or(self.global_level);

    if octree.cube(CubeId::ROOT).cube_type == CubeType::Outside {
      info!("no surface facet crosses the root box, root is OUTSIDE");
      return octree;
    }

    let limits = self.limits();
    let extra_levels = self.settings.proximity_extra_levels;

    {
      let _span = tracing::info_span!("boundary").entered();
      octree.stats.boundary = refine_boundary(&mut octree, &self.facet_levels, limits);
      let proximity = refine_proximity(&mut octree, &self.facet_levels, extra_levels, limits);
      octree.stats.boundary.merge(proximity);
    }

    {
      let _span = tracing::info_span!("near_data").entered();
      octree.stats.near_data = refine_near_data(&mut octree, self.settings.n_layers, limits);
      octree.stats.balance = enforce_balance(&mut octree, limits);
    }

    {
      let _span = tracing::info_span!("regions").entered();
      octree.stats.regions = refine_regions(&mut octree, &self.region_levels, limits);
      let balance = enforce_balance(&mut octree, limits);
      octree.stats.balance.merge(balance);
    }

    {
      let _span = tracing::info_span!("classify").entered();
      classify_leaves(&mut octree);
      octree.stats.inside = refine_inside(&mut octree, self.global_level, limits);
      let balance = enforce_balance(&mut octree, limits);
      octree.stats.balance.merge(balance);
      classify_leaves(&mut octree);
    }

    let stats = octree.stats();
    info!(
      cubes = octree.n_cubes(),
      leaves = stats.total_leaves(),
      data = stats.leaves_data,
      inside = stats.leaves_inside,
      outside = stats.leaves_outside,
      max_level = octree.max_leaf_level(),
      "octree created"
    );
    octree
  }

  /// Build a search octree: DATA leaves holding more than
  /// `max_facets_per_leaf` facets are split, up to `max_level`.
  ///
  /// No balance or classification is applied; use it for surface queries.
  pub fn create_octree_with_refined_boundary(&self, max_level: u8, max_facets_per_leaf: usize) -> MeshOctree {
    self.pool.install(|| {
      let mut octree = self.root_octree();
      if octree.cube(CubeId::ROOT).cube_type == CubeType::Outside {
        return octree;
      }
      let limits = RefineLimits {
        hex: false,
        max_level: max_level.min(self.settings.effective_max_level()),
      };
      octree.stats.boundary = refine_crowded(&mut octree, max_facets_per_leaf, limits);
      info!(
        cubes = octree.n_cubes(),
        max_level = octree.max_leaf_level(),
        "search octree created"
      );
      octree
    })
  }
}

#[cfg(test)]
#[path = "creator_test.rs"]
mod creator_test;
