//! OctreeSettings - refinement parameters for octree construction.
//!
//! Cell sizes are converted to levels against the root cube edge:
//!
//! ```text
//! level = ceil(log2(root_size / cell_size))      (clamped to max_level)
//! cube_size(level) = root_size / 2^level <= cell_size
//! ```

use std::collections::BTreeMap;

use tracing::warn;

use super::RefinementObject;
use crate::constants::{DEFAULT_ROOT_MARGIN, MAX_OCTREE_LEVEL, MIN_ROOT_MARGIN};
use crate::error::{OctreeError, Result};
use crate::geometry::BoundBox;

/// Slack on `log2` so exact powers of two do not round up a level.
const LEVEL_TOLERANCE: f64 = 1.0e-9;

/// Configuration for octree construction.
#[derive(Clone, Debug, PartialEq)]
pub struct OctreeSettings {
  /// Largest cell edge anywhere; sets the global level.
  pub max_cell_size: f64,

  /// Cell edge at the surface (defaults to `max_cell_size`).
  pub boundary_cell_size: Option<f64>,

  /// Cell edge at the facets of named patches.
  pub patch_cell_sizes: BTreeMap<String, f64>,

  /// Cell edge at the facets of named facet subsets.
  pub subset_cell_sizes: BTreeMap<String, f64>,

  /// Volumetric refinement regions.
  pub refinement_objects: Vec<RefinementObject>,

  /// Refine all siblings of a refined cube together.
  pub hex_refinement: bool,

  /// Number of cube widths around DATA leaves refined to the DATA level.
  pub n_layers: usize,

  /// Explicit root cube; derived from the surface when None.
  pub root_box: Option<BoundBox>,

  /// Margin around the surface bounding box, as a fraction of its largest
  /// extent.
  pub root_margin: f64,

  /// Extra levels allowed where a DATA leaf sees more than one surface
  /// feature (0 = off).
  pub proximity_extra_levels: u8,

  /// Deepest level any pass may reach.
  pub max_level: u8,

  /// Multiplier applied to every requested cell size.
  pub scaling_factor: f64,

  /// Worker threads (None = available parallelism).
  pub workers: Option<usize>,
}

impl OctreeSettings {
  /// Settings with the given maximum cell size and defaults elsewhere.
  pub fn new(max_cell_size: f64) -> Self {
    Self {
      max_cell_size,
      boundary_cell_size: None,
      patch_cell_sizes: BTreeMap::new(),
      subset_cell_sizes: BTreeMap::new(),
      refinement_objects: Vec::new(),
      hex_refinement: false,
      n_layers: 1,
      root_box: None,
      root_margin: DEFAULT_ROOT_MARGIN,
      proximity_extra_levels: 0,
      max_level: MAX_OCTREE_LEVEL,
      scaling_factor: 1.0,
      workers: None,
    }
  }

  pub fn with_boundary_cell_size(mut self, size: f64) -> Self {
    self.boundary_cell_size = Some(size);
    self
  }

  pub fn with_patch_cell_size(mut self, patch: impl Into<String>, size: f64) -> Self {
    self.patch_cell_sizes.insert(patch.into(), size);
    self
  }

  pub fn with_subset_cell_size(mut self, subset: impl Into<String>, size: f64) -> Self {
    self.subset_cell_sizes.insert(subset.into(), size);
    self
  }

  pub fn with_refinement_object(mut self, object: RefinementObject) -> Self {
    self.refinement_objects.push(object);
    self
  }

  pub fn with_hex_refinement(mut self, enabled: bool) -> Self {
    self.hex_refinement = enabled;
    self
  }

  pub fn with_n_layers(mut self, n_layers: usize) -> Self {
    self.n_layers = n_layers;
    self
  }

  pub fn with_root_box(mut self, root_box: BoundBox) -> Self {
    self.root_box = Some(root_box);
    self
  }

  pub fn with_root_margin(mut self, margin: f64) -> Self {
    self.root_margin = margin;
    self
  }

  pub fn with_proximity_extra_levels(mut self, levels: u8) -> Self {
    self.proximity_extra_levels = levels;
    self
  }

  pub fn with_max_level(mut self, level: u8) -> Self {
    self.max_level = level;
    self
  }

  pub fn with_scaling_factor(mut self, factor: f64) -> Self {
    self.scaling_factor = factor;
    self
  }

  pub fn with_workers(mut self, workers: usize) -> Self {
    self.workers = Some(workers);
    self
  }

  /// Reject settings that cannot produce an octree.
  pub fn validate(&self) -> Result<()> {
    check_cell_size("max_cell_size", self.max_cell_size)?;
    if let Some(size) = self.boundary_cell_size {
      check_cell_size("boundary_cell_size", size)?;
    }
    for (name, &size) in &self.patch_cell_sizes {
      check_cell_size(&format!("patch_cell_sizes[{}]", name), size)?;
    }
    for (name, &size) in &self.subset_cell_sizes {
      check_cell_size(&format!("subset_cell_sizes[{}]", name), size)?;
    }
    for object in &self.refinement_objects {
      check_cell_size(&format!("refinement_objects[{}]", object.name), object.cell_size)?;
    }

    if let Some(root) = self.root_box {
      let finite = root.min.is_finite() && root.max.is_finite();
      if !finite || root.volume() <= 0.0 || !root.is_cube() {
        return Err(OctreeError::DegenerateRootBox {
          min: root.min.to_array(),
          max: root.max.to_array(),
        });
      }
    }

    if !self.scaling_factor.is_finite() || self.scaling_factor <= 0.0 {
      return Err(OctreeError::InvalidScalingFactor(self.scaling_factor));
    }

    if self.workers == Some(0) {
      return Err(OctreeError::NoWorkers);
    }

    if !self.root_margin.is_finite() || self.root_margin < 0.0 {
      warn!(margin = self.root_margin, "invalid root margin, using the minimum");
    }
    if self.max_level > MAX_OCTREE_LEVEL {
      warn!(
        requested = self.max_level,
        limit = MAX_OCTREE_LEVEL,
        "max_level clamped to the deepest supported level"
      );
    }

    Ok(())
  }

  /// Margin fraction, never below [`MIN_ROOT_MARGIN`].
  pub fn effective_root_margin(&self) -> f64 {
    if self.root_margin.is_finite() {
      self.root_margin.max(MIN_ROOT_MARGIN)
    } else {
      MIN_ROOT_MARGIN
    }
  }

  /// Deepest level any pass may reach.
  pub fn effective_max_level(&self) -> u8 {
    self.max_level.min(MAX_OCTREE_LEVEL)
  }

  /// Level at which cubes of a `root_size` root are no larger than the
  /// scaled `cell_size`.
  pub fn level_for_cell_size(&self, root_size: f64, cell_size: f64) -> u8 {
    level_for_cell_size(root_size, cell_size * self.scaling_factor, self.effective_max_level())
  }

  /// `max_cell_size` after scaling.
  pub fn scaled_max_cell_size(&self) -> f64 {
    self.max_cell_size * self.scaling_factor
  }
}

impl Default for OctreeSettings {
  fn default() -> Self {
    Self::new(1.0)
  }
}

fn check_cell_size(setting: &str, value: f64) -> Result<()> {
  if value.is_finite() && value > 0.0 {
    Ok(())
  } else {
    Err(OctreeError::InvalidCellSize {
      setting: setting.to_string(),
      value,
    })
  }
}

/// Level at which cubes of a `root_size` root are no larger than `cell_size`,
/// clamped to `max_level`.
pub fn level_for_cell_size(root_size: f64, cell_size: f64, max_level: u8) -> u8 {
  let ratio = root_size / cell_size;
  if ratio.is_nan() || ratio <= 1.0 {
    return 0;
  }
  let level = (ratio.log2() - LEVEL_TOLERANCE).ceil();
  if level >= max_level as f64 {
    max_level
  } else {
    level as u8
  }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;
