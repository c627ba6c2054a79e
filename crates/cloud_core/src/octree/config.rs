//! OctreeConfig - construction settings for [`Octree::build`](super::Octree::build).

use crate::constants::{BUILD_PROGRESS_BATCH, MAX_OCTREE_LEVEL};
use crate::error::{Error, Result};

/// Configuration for octree construction.
///
/// Codes are always computed at full depth; `max_level` only bounds which
/// levels may be queried afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OctreeConfig {
  /// Deepest level that queries accept. `1..=MAX_OCTREE_LEVEL`.
  pub max_level: u8,

  /// Points coded between two progress checkpoints.
  pub progress_batch: usize,
}

impl OctreeConfig {
  pub fn with_max_level(mut self, max_level: u8) -> Self {
    self.max_level = max_level;
    self
  }

  pub fn with_progress_batch(mut self, progress_batch: usize) -> Self {
    self.progress_batch = progress_batch;
    self
  }

  /// Reject settings the octree cannot honour.
  pub fn validate(&self) -> Result<()> {
    if self.max_level == 0 || self.max_level > MAX_OCTREE_LEVEL {
      return Err(Error::InvalidLevel {
        level: self.max_level,
        max: MAX_OCTREE_LEVEL,
      });
    }
    if self.progress_batch == 0 {
      return Err(Error::InvalidArgument("progress batch must be at least 1"));
    }
    Ok(())
  }
}

impl Default for OctreeConfig {
  fn default() -> Self {
    Self {
      max_level: MAX_OCTREE_LEVEL,
      progress_batch: BUILD_PROGRESS_BATCH,
    }
  }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;
