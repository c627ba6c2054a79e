//! Same-level adjacency queries.
//!
//! ```text
//!        ┌───┬───┬───┐
//!        │ ↖ │ ↑ │ ↗ │     26 offsets in 3D:
//!        ├───┼───┼───┤       6 faces, 12 edges, 8 corners
//!        │ ← │ ■ │ → │
//!        ├───┼───┼───┤     clipped at the border of the level grid
//!        │ ↙ │ ↓ │ ↘ │
//!        └───┴───┴───┘
//! ```

use std::collections::HashSet;

use glam::IVec3;
use smallvec::SmallVec;

use super::cell::CellKey;
use super::morton;
use super::tree::Octree;

/// Grid offsets of the cells touching a cell by a face, an edge or a corner.
pub const NEIGHBOR_OFFSETS: [IVec3; 26] = neighbor_offsets();

const fn neighbor_offsets() -> [IVec3; 26] {
  let mut out = [IVec3::ZERO; 26];
  let mut n = 0;
  let mut dz = -1;
  while dz <= 1 {
    let mut dy = -1;
    while dy <= 1 {
      let mut dx = -1;
      while dx <= 1 {
        if dx != 0 || dy != 0 || dz != 0 {
          out[n] = IVec3::new(dx, dy, dz);
          n += 1;
        }
        dx += 1;
      }
      dy += 1;
    }
    dz += 1;
  }
  out
}

/// Keys of the (possibly empty) cells adjacent to `key` on its level grid.
pub fn adjacent_keys(key: CellKey) -> SmallVec<[CellKey; 26]> {
  let resolution = 1i64 << key.level();
  let origin = key.position().as_ivec3();
  let mut out = SmallVec::new();
  for offset in NEIGHBOR_OFFSETS {
    let p = origin + offset;
    let inside = [p.x, p.y, p.z]
      .iter()
      .all(|&c| c >= 0 && (c as i64) < resolution);
    if inside {
      out.push(CellKey::from_parts(morton::encode(p.as_uvec3()), key.level()));
    }
  }
  out
}

impl Octree {
  /// Non-empty cells of the same level touching `key`.
  ///
  /// With a `filter`, a neighbor is kept only if at least one of its points
  /// (by original index) satisfies it. The query cell itself is never part
  /// of the result.
  pub fn neighbor_leaves(
    &self,
    key: CellKey,
    filter: Option<&dyn Fn(u32) -> bool>,
  ) -> HashSet<CellKey> {
    let mut out = HashSet::new();
    if self.is_empty() {
      return out;
    }
    for neighbor in adjacent_keys(key) {
      let Some(range) = self.cell_range(neighbor) else {
        continue;
      };
      let keep = match filter {
        Some(accept) => self.indices()[range].iter().any(|&i| accept(i)),
        None => true,
      };
      if keep {
        out.insert(neighbor);
      }
    }
    out
  }
}

#[cfg(test)]
#[path = "neighbors_test.rs"]
mod neighbors_test;
