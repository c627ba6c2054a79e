//! 3D Morton (Z-order) encoding of 21-bit grid coordinates into cell codes.
//!
//! Bit layout (x lowest): `... z1 y1 x1 z0 y0 x0`. This matches the octant
//! convention used by [`CellKey::child`](super::CellKey::child):
//! bit 0 = +X, bit 1 = +Y, bit 2 = +Z.

use glam::UVec3;

use crate::constants::{level_shift, MAX_GRID_RESOLUTION, MAX_OCTREE_LEVEL};

/// Bit-interleaved cell code. Full-depth codes use the low 63 bits.
pub type CellCode = u64;

/// "Insert" two 0 bits after each of the 21 low bits of x.
#[inline(always)]
fn part_1_by_2(x: u32) -> u64 {
  let mut x = (x as u64) & 0x1f_ffff;
  x = (x | (x << 32)) & 0x001f_0000_0000_ffff;
  x = (x | (x << 16)) & 0x001f_0000_ff00_00ff;
  x = (x | (x << 8)) & 0x100f_00f0_0f00_f00f;
  x = (x | (x << 4)) & 0x10c3_0c30_c30c_30c3;
  x = (x | (x << 2)) & 0x1249_2492_4924_9249;
  x
}

/// Inverse of `part_1_by_2`: keep every third bit, starting at bit 0.
#[inline(always)]
fn compact_1_by_2(x: u64) -> u32 {
  let mut x = x & 0x1249_2492_4924_9249;
  x = (x ^ (x >> 2)) & 0x10c3_0c30_c30c_30c3;
  x = (x ^ (x >> 4)) & 0x100f_00f0_0f00_f00f;
  x = (x ^ (x >> 8)) & 0x001f_0000_ff00_00ff;
  x = (x ^ (x >> 16)) & 0x001f_0000_0000_ffff;
  x = (x ^ (x >> 32)) & 0x1f_ffff;
  x as u32
}

/// Interleave grid coordinates (each below 2^21).
#[inline]
pub fn encode(pos: UVec3) -> CellCode {
  debug_assert!(
    pos.x < MAX_GRID_RESOLUTION && pos.y < MAX_GRID_RESOLUTION && pos.z < MAX_GRID_RESOLUTION,
    "grid coordinate exceeds 21 bits: {:?}",
    pos
  );
  part_1_by_2(pos.x) | (part_1_by_2(pos.y) << 1) | (part_1_by_2(pos.z) << 2)
}

/// Split a code back into grid coordinates.
///
/// Decoding a code truncated at level L yields the coordinates of the cell on
/// the `2^L` grid of that level.
#[inline]
pub fn decode(code: CellCode) -> UVec3 {
  UVec3::new(
    compact_1_by_2(code),
    compact_1_by_2(code >> 1),
    compact_1_by_2(code >> 2),
  )
}

/// Truncate a full-depth code to `level`.
#[inline(always)]
pub fn truncate(code: CellCode, level: u8) -> CellCode {
  debug_assert!(level <= MAX_OCTREE_LEVEL);
  code >> level_shift(level)
}

/// Shallowest level at which two full-depth codes fall into different cells,
/// `None` when they are identical.
#[inline]
pub fn divergence_level(a: CellCode, b: CellCode) -> Option<u8> {
  let diff = a ^ b;
  if diff == 0 {
    return None;
  }
  let top_bit = 63 - diff.leading_zeros();
  Some(MAX_OCTREE_LEVEL - (top_bit / 3) as u8)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_encode_decode_roundtrip() {
    let coords = [
      UVec3::new(0, 0, 0),
      UVec3::new(1, 2, 3),
      UVec3::new(100, 200, 300),
      UVec3::new(1000, 2000, 3000),
      UVec3::splat(MAX_GRID_RESOLUTION - 1),
    ];
    for pos in coords {
      assert_eq!(decode(encode(pos)), pos, "Round-trip failed for {:?}", pos);
    }
  }

  #[test]
  fn test_axis_bits() {
    assert_eq!(encode(UVec3::new(1, 0, 0)), 0b001);
    assert_eq!(encode(UVec3::new(0, 1, 0)), 0b010);
    assert_eq!(encode(UVec3::new(0, 0, 1)), 0b100);
    assert_eq!(encode(UVec3::new(2, 0, 0)), 0b001_000);
  }

  #[test]
  fn test_max_code_fits_63_bits() {
    let code = encode(UVec3::splat(MAX_GRID_RESOLUTION - 1));
    assert_eq!(code, (1u64 << 63) - 1);
  }

  #[test]
  fn test_truncated_code_decodes_to_coarse_grid() {
    let pos = UVec3::new(0b1011 << 17, 0b0110 << 17, 0b1111 << 17);
    let truncated = truncate(encode(pos), 4);
    assert_eq!(decode(truncated), UVec3::new(0b1011, 0b0110, 0b1111));
  }

  #[test]
  fn test_divergence_level() {
    let a = encode(UVec3::new(0, 0, 0));
    assert_eq!(divergence_level(a, a), None);

    // Top bit of x differs: split at level 1.
    let b = encode(UVec3::new(1 << 20, 0, 0));
    assert_eq!(divergence_level(a, b), Some(1));

    // Lowest bit of z differs: split at the deepest level.
    let c = encode(UVec3::new(0, 0, 1));
    assert_eq!(divergence_level(a, c), Some(MAX_OCTREE_LEVEL));
  }
}
