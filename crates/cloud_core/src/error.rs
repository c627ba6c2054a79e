//! Error type shared by the octree, the tessellators and the mesh helpers.

use std::collections::TryReserveError;

use thiserror::Error;

/// Failures reported by `cloud_core` operations.
///
/// Every failing operation leaves the structure it was called on in its
/// previous, consistent state.
#[derive(Error, Debug)]
pub enum Error {
  #[error("point set is empty")]
  EmptyPointSet,

  #[error("not enough memory to allocate {what}")]
  OutOfMemory {
    what: &'static str,
    #[source]
    source: TryReserveError,
  },

  #[error("precision {precision} is below the minimum of {minimum}")]
  PrecisionTooLow { precision: u32, minimum: u32 },

  #[error("degenerate shape: {0}")]
  DegenerateShape(&'static str),

  #[error("octree level {level} is outside 0..={max}")]
  InvalidLevel { level: u8, max: u8 },

  #[error("invalid argument: {0}")]
  InvalidArgument(&'static str),

  #[error("mesh has no vertex or no triangle")]
  EmptyMesh,

  #[error("{what}: expected {expected}, got {actual}")]
  TopologyMismatch {
    what: &'static str,
    expected: usize,
    actual: usize,
  },

  #[error("operation cancelled")]
  Cancelled,
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Reserve exactly `additional` slots, mapping allocation failure to
/// [`Error::OutOfMemory`].
pub(crate) fn try_reserve<T>(
  buffer: &mut Vec<T>,
  additional: usize,
  what: &'static str,
) -> Result<()> {
  buffer
    .try_reserve_exact(additional)
    .map_err(|source| Error::OutOfMemory { what, source })
}

/// Allocate an empty vector with exactly `capacity` slots.
pub(crate) fn try_with_capacity<T>(capacity: usize, what: &'static str) -> Result<Vec<T>> {
  let mut buffer = Vec::new();
  try_reserve(&mut buffer, capacity, what)?;
  Ok(buffer)
}
