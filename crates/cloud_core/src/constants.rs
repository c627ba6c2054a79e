//! Shared numeric constants for the octree and the tessellators.
//!
//! # Cell Code Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         64-BIT CELL CODE                                │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │                                                                         │
//! │  bit:   63  62 61 60  59 58 57  ...   5  4  3   2  1  0                 │
//! │          │  └──┬───┘  └──┬───┘        └──┬──┘   └──┬──┘                 │
//! │       unused  level 1   level 2        level 20  level 21               │
//! │                z y x     z y x           z y x     z y x                │
//! │                                                                         │
//! ├─────────────────────────────────────────────────────────────────────────┤
//! │  Truncation at level L keeps the top 3*L used bits:                     │
//! │                                                                         │
//! │    truncated = code >> (3 * (MAX_OCTREE_LEVEL - L))                     │
//! │                                                                         │
//! │  Level 0 truncates to 0 (the whole bounding cube).                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Cell Size
//!
//! ```text
//! cell_size(L) = cube_side / 2^L
//! ```

/// Deepest octree level. 3 * 21 = 63 bits fit in a `u64` code.
pub const MAX_OCTREE_LEVEL: u8 = 21;

/// Number of grid positions per axis at the deepest level.
pub const MAX_GRID_RESOLUTION: u32 = 1 << MAX_OCTREE_LEVEL;

/// Bits used by a full-depth code.
pub const CODE_BITS: u32 = 3 * MAX_OCTREE_LEVEL as u32;

/// Lengths and radii below this are treated as zero.
pub const ZERO_TOLERANCE: f32 = 1.0e-7;

/// Smallest accepted angular precision for revolution primitives.
pub const MIN_DRAWING_PRECISION: u32 = 4;

/// Angular precision used when the caller does not pick one.
pub const DEFAULT_DRAWING_PRECISION: u32 = 24;

/// Number of points handled between two progress checkpoints while building.
pub const BUILD_PROGRESS_BATCH: usize = 65_536;

/// Bit shift applied to a full-depth code to truncate it at `level`.
#[inline(always)]
pub const fn level_shift(level: u8) -> u32 {
  3 * (MAX_OCTREE_LEVEL - level) as u32
}

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
