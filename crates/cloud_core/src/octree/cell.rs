//! Cell identifiers and borrowed cell views.
//!
//! A cell is identified by its truncated code and its level. Level 0 is the
//! whole bounding cube, each deeper level halves the cell size.

use std::ops::Range;

use glam::UVec3;

use super::morton::{self, CellCode};
use crate::constants::MAX_OCTREE_LEVEL;
use crate::error::{Error, Result};

/// Identifier of an octree cell - immutable value type.
///
/// The code is truncated to the cell's own level, so it has `3 * level`
/// significant bits.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct CellKey {
  level: u8,
  code: CellCode,
}

impl CellKey {
  /// The root cell (the whole bounding cube).
  pub const ROOT: CellKey = CellKey { level: 0, code: 0 };

  /// Key from a code already truncated to `level`.
  pub fn new(code: CellCode, level: u8) -> Result<Self> {
    if level > MAX_OCTREE_LEVEL {
      return Err(Error::InvalidLevel {
        level,
        max: MAX_OCTREE_LEVEL,
      });
    }
    if level < MAX_OCTREE_LEVEL && code >> (3 * level as u32) != 0 {
      return Err(Error::InvalidArgument("cell code has bits beyond its level"));
    }
    Ok(Self { level, code })
  }

  /// Key of the cell containing a full-depth point code.
  pub fn from_point_code(code: CellCode, level: u8) -> Result<Self> {
    if level > MAX_OCTREE_LEVEL {
      return Err(Error::InvalidLevel {
        level,
        max: MAX_OCTREE_LEVEL,
      });
    }
    Ok(Self {
      level,
      code: morton::truncate(code, level),
    })
  }

  /// Key of the cell at grid coordinates `pos` of `level`.
  pub fn from_position(pos: UVec3, level: u8) -> Result<Self> {
    let resolution = 1u32 << level.min(MAX_OCTREE_LEVEL);
    if pos.x >= resolution || pos.y >= resolution || pos.z >= resolution {
      return Err(Error::InvalidArgument("grid position outside the level grid"));
    }
    Self::new(morton::encode(pos), level)
  }

  pub(crate) fn from_parts(code: CellCode, level: u8) -> Self {
    debug_assert!(level <= MAX_OCTREE_LEVEL);
    Self { level, code }
  }

  #[inline]
  pub fn code(&self) -> CellCode {
    self.code
  }

  #[inline]
  pub fn level(&self) -> u8 {
    self.level
  }

  /// Grid coordinates of the cell on the `2^level` grid.
  #[inline]
  pub fn position(&self) -> UVec3 {
    morton::decode(self.code)
  }

  /// Octant of this cell inside its parent (bit 0 = +X, bit 1 = +Y, bit 2 = +Z).
  #[inline]
  pub fn octant(&self) -> u8 {
    (self.code & 7) as u8
  }

  /// Get child cell (one level deeper).
  ///
  /// Returns None at the deepest level or for an octant above 7.
  pub fn child(&self, octant: u8) -> Option<Self> {
    if self.level >= MAX_OCTREE_LEVEL || octant > 7 {
      return None;
    }
    Some(Self {
      level: self.level + 1,
      code: (self.code << 3) | octant as CellCode,
    })
  }

  /// Get parent cell (one level up).
  ///
  /// Returns None for the root.
  pub fn parent(&self) -> Option<Self> {
    if self.level == 0 {
      return None;
    }
    Some(Self {
      level: self.level - 1,
      code: self.code >> 3,
    })
  }

  /// True when `self` is `other` or one of its ancestors.
  pub fn contains(&self, other: &CellKey) -> bool {
    other.level >= self.level && other.code >> (3 * (other.level - self.level) as u32) == self.code
  }
}

/// A non-empty cell of a built octree at some level.
///
/// Borrows the octree's sorted index array: `indices` are the point indices
/// of the cell, `range` their position in the sorted arrays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OctreeCell<'a> {
  pub key: CellKey,
  pub range: Range<usize>,
  pub indices: &'a [u32],
}

impl OctreeCell<'_> {
  #[inline]
  pub fn code(&self) -> CellCode {
    self.key.code
  }

  #[inline]
  pub fn level(&self) -> u8 {
    self.key.level
  }

  /// Number of points in the cell.
  #[inline]
  pub fn len(&self) -> usize {
    self.indices.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.indices.is_empty()
  }
}

#[cfg(test)]
#[path = "cell_test.rs"]
mod cell_test;
