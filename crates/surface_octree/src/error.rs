//! Errors that abort octree construction.
//!
//! Only invalid configuration is fatal. Degenerate geometry is handled by the
//! predicates themselves and never surfaces here.

/// Fatal octree construction error.
#[derive(Debug, thiserror::Error)]
pub enum OctreeError {
  /// A cell size setting is zero, negative or not finite.
  #[error("invalid cell size {value} for {setting}")]
  InvalidCellSize {
    /// Name of the offending setting.
    setting: String,
    /// The rejected value.
    value: f64,
  },

  /// The explicit root box has no volume or is not a cube.
  #[error("root box {min:?} - {max:?} is degenerate")]
  DegenerateRootBox {
    /// Minimum corner.
    min: [f64; 3],
    /// Maximum corner.
    max: [f64; 3],
  },

  /// The cell size scaling factor is zero, negative or not finite.
  #[error("invalid scaling factor {0}")]
  InvalidScalingFactor(f64),

  /// The worker count is zero.
  #[error("worker count must be at least 1")]
  NoWorkers,

  /// The dedicated worker pool could not be created.
  #[error("failed to build worker pool: {0}")]
  ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Result alias for octree construction.
pub type Result<T> = std::result::Result<T, OctreeError>;
