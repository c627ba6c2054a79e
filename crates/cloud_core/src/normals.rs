//! Compressed normal directions.
//!
//! A [`NormalTable`] quantizes unit vectors with an octahedral mapping onto a
//! square grid and keeps the decoded direction of every grid cell. It is
//! built once by the caller and passed by reference to every tessellation or
//! display call that needs to store normals compactly.
//!
//! ```text
//!   unit sphere ──(L1 normalize)──> octahedron ──(fold z<0)──> [-1,1]²
//!
//!        +Z at the grid centre, -Z on the four corners,
//!        ±X / ±Y on the edge midpoints.
//! ```
//!
//! The grid resolution is odd so that the six axis directions are encoded
//! without error.

use glam::{Vec2, Vec3};

use crate::error::{try_with_capacity, Error, Result};

/// Index of a quantized normal in a [`NormalTable`].
pub type NormalCode = u32;

/// Owned lookup table of quantized unit normals.
#[derive(Clone, Debug)]
pub struct NormalTable {
  bits: u32,
  resolution: u32,
  vectors: Vec<Vec3>,
}

impl NormalTable {
  /// 127 × 127 grid, ~1° worst-case angular error.
  pub const DEFAULT_BITS: u32 = 7;

  /// Build a table with `(2^bits - 1)²` entries. `bits` must be in `2..=15`.
  pub fn new(bits: u32) -> Result<Self> {
    if !(2..=15).contains(&bits) {
      return Err(Error::InvalidArgument("normal table bits must be in 2..=15"));
    }
    let resolution = (1u32 << bits) - 1;
    let count = (resolution * resolution) as usize;
    let mut vectors = try_with_capacity(count, "normal lookup table")?;
    vectors.extend(Self::entries(resolution));
    Ok(Self {
      bits,
      resolution,
      vectors,
    })
  }

  pub fn bits(&self) -> u32 {
    self.bits
  }

  /// Number of distinct codes.
  pub fn len(&self) -> usize {
    self.vectors.len()
  }

  pub fn is_empty(&self) -> bool {
    self.vectors.is_empty()
  }

  /// Code of the table entry closest (in octahedral space) to `n`.
  ///
  /// `n` does not need to be normalized. A zero vector encodes as +Z.
  pub fn encode(&self, n: Vec3) -> NormalCode {
    let l1 = n.x.abs() + n.y.abs() + n.z.abs();
    if !(l1 > 0.0) {
      return self.encode(Vec3::Z);
    }
    let p = n / l1;
    let mut e = Vec2::new(p.x, p.y);
    if p.z < 0.0 {
      e = Vec2::new(
        (1.0 - p.y.abs()) * sign_not_zero(p.x),
        (1.0 - p.x.abs()) * sign_not_zero(p.y),
      );
    }
    let i = Self::uv_to_cell(e.x, self.resolution);
    let j = Self::uv_to_cell(e.y, self.resolution);
    j * self.resolution + i
  }

  /// Decoded unit direction of `code`. Out-of-range codes yield `None`.
  #[inline]
  pub fn decode(&self, code: NormalCode) -> Option<Vec3> {
    self.vectors.get(code as usize).copied()
  }

  /// Round-trip `n` through the table.
  pub fn quantize(&self, n: Vec3) -> Vec3 {
    self.vectors[self.encode(n) as usize]
  }

  /// Decoded directions in code order.
  fn entries(resolution: u32) -> impl Iterator<Item = Vec3> {
    (0..resolution).flat_map(move |j| {
      (0..resolution).map(move |i| {
        decode_octahedral(Self::cell_to_uv(i, resolution), Self::cell_to_uv(j, resolution))
      })
    })
  }

  #[inline]
  fn cell_to_uv(cell: u32, resolution: u32) -> f32 {
    (cell as f32 / (resolution - 1) as f32) * 2.0 - 1.0
  }

  #[inline]
  fn uv_to_cell(uv: f32, resolution: u32) -> u32 {
    let t = (uv.clamp(-1.0, 1.0) + 1.0) * 0.5;
    ((t * (resolution - 1) as f32).round() as u32).min(resolution - 1)
  }
}

impl Default for NormalTable {
  fn default() -> Self {
    let resolution = (1u32 << Self::DEFAULT_BITS) - 1;
    let vectors = Self::entries(resolution).collect();
    Self {
      bits: Self::DEFAULT_BITS,
      resolution,
      vectors,
    }
  }
}

#[inline]
fn sign_not_zero(v: f32) -> f32 {
  if v >= 0.0 {
    1.0
  } else {
    -1.0
  }
}

fn decode_octahedral(u: f32, v: f32) -> Vec3 {
  let z = 1.0 - u.abs() - v.abs();
  let (x, y) = if z < 0.0 {
    ((1.0 - v.abs()) * sign_not_zero(u), (1.0 - u.abs()) * sign_not_zero(v))
  } else {
    (u, v)
  };
  Vec3::new(x, y, z).normalize()
}

#[cfg(test)]
#[path = "normals_test.rs"]
mod normals_test;
