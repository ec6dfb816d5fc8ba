//! Octree module for surface-conforming spatial subdivision.
//!
//! The octree is an arena of cubes over a cubic root box. Every refinement
//! appends 8 children; cubes are never merged or removed. Neighbours are not
//! stored: they are found from integer keys by descending from the root.
//!
//! # Level Convention
//!
//! Level 0 = root (coarsest), higher level = finer.
//!
//! ```text
//! Cube Size = root_size / 2^level
//! ```
//!
//! # Module Structure
//!
//! - [`key`]: `CubeKey` - integer address of a cube
//! - [`cube`]: `OctreeCube`, `CubeType`, `CubeId` - arena entries
//! - [`tree`]: `MeshOctree` - arena, lookup and surface queries
//! - [`settings`]: `OctreeSettings` - refinement parameters
//! - [`regions`]: `RefinementObject` - volumetric refinement regions
//! - [`refinement`]: mark-then-apply refinement passes and 2:1 balance
//! - [`classification`]: inside/outside flood fill
//! - [`creator`]: `OctreeCreator` - construction in pass order
//! - [`distribution`]: leaf redistribution across workers
//! - [`stats`]: `OctreeStats` - construction counters

pub mod classification;
pub mod creator;
pub mod cube;
pub mod distribution;
pub mod key;
pub mod refinement;
pub mod regions;
pub mod settings;
pub mod stats;
pub mod tree;

// Re-exports
pub use classification::{classify_leaves, ClassifyCounts};
pub use creator::{OctreeCreator, DEFAULT_MAX_FACETS_PER_LEAF};
pub use cube::{CubeFacets, CubeId, CubeType, LeafInfo, OctreeCube};
pub use distribution::{distribute_leaves, initial_partition, redistribute};
pub use key::CubeKey;
pub use refinement::{enforce_balance, RefineLimits};
pub use regions::{RefinementObject, RefinementShape};
pub use settings::{level_for_cell_size, OctreeSettings};
pub use stats::{OctreeStats, PassStats};
pub use tree::{MeshOctree, NearestHit};
