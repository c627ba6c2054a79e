//! UV sphere tessellation.
//!
//! ```text
//!   0: north pole (0, 0, r)        1: south pole (0, 0, -r)
//!   rings j = 1 .. S-1 at polar angle   θ = j·π/S
//!   S vertices per ring at azimuth      φ = i·2π/S
//! ```
//!
//! Faces are a fan around each pole and a strip of quads (two triangles)
//! between consecutive rings. Normals are exact, per vertex.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use super::{check_extent, check_precision, MeshCounts, Tessellate};
use crate::constants::{DEFAULT_DRAWING_PRECISION, MIN_DRAWING_PRECISION};
use crate::error::{Error, Result};
use crate::mesh::{MeshBuilder, NormalLayout, TriMesh};
use crate::normals::NormalTable;

/// Sphere centred on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sphere {
  pub radius: f32,
  /// Number of slices and stacks.
  pub precision: u32,
}

impl Default for Sphere {
  fn default() -> Self {
    Self::new(1.0, DEFAULT_DRAWING_PRECISION)
  }
}

impl Sphere {
  /// The radius is taken as an absolute value; precision is raised to the
  /// minimum when lower.
  pub fn new(radius: f32, precision: u32) -> Self {
    Self {
      radius: radius.abs(),
      precision: precision.max(MIN_DRAWING_PRECISION),
    }
  }
}

impl Tessellate for Sphere {
  fn counts(&self) -> Result<MeshCounts> {
    check_precision(self.precision)?;
    check_extent(self.radius, "sphere radius is zero")?;
    let s = self.precision as usize;
    let vertices = s
      .checked_mul(s - 1)
      .and_then(|v| v.checked_add(2))
      .filter(|&v| v <= u32::MAX as usize)
      .ok_or(Error::InvalidArgument("sphere precision too large"))?;
    let triangles = s * ((s - 2) * 2 + 2);
    Ok(MeshCounts { vertices, triangles })
  }

  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "primitives::sphere"))]
  fn tessellate(&self, _table: &NormalTable) -> Result<TriMesh> {
    let counts = self.counts()?;
    let steps = self.precision;
    let mut builder =
      MeshBuilder::with_capacity(counts.vertices, counts.triangles, NormalLayout::PerVertex)?;

    builder.push_vertex_with_normal(Vec3::Z * self.radius, Vec3::Z);
    builder.push_vertex_with_normal(Vec3::NEG_Z * self.radius, Vec3::NEG_Z);

    let polar_step = PI / steps as f32;
    let azimuth_step = TAU / steps as f32;
    for j in 1..steps {
      let (sin_theta, cos_theta) = (polar_step * j as f32).sin_cos();
      for i in 0..steps {
        let (sin_phi, cos_phi) = (azimuth_step * i as f32).sin_cos();
        let n = Vec3::new(sin_theta * cos_phi, sin_theta * sin_phi, cos_theta).normalize();
        builder.push_vertex_with_normal(n * self.radius, n);
      }
    }

    // Index of the vertex after `a` on its ring, wrapping to `first`.
    let next = |a: u32, i: u32, first: u32| if i + 1 < steps { a + 1 } else { first };

    for i in 0..steps {
      let a = 2 + i;
      builder.push_triangle([a, next(a, i, 2), 0]);
    }
    for j in 1..steps - 1 {
      let first = 2 + (j - 1) * steps;
      for i in 0..steps {
        let a = first + i;
        let b = next(a, i, first);
        builder.push_triangle([a, a + steps, b]);
        builder.push_triangle([b + steps, b, a + steps]);
      }
    }
    let first = 2 + (steps - 2) * steps;
    for i in 0..steps {
      let a = first + i;
      builder.push_triangle([a, 1, next(a, i, first)]);
    }

    builder.finish()
  }
}

#[cfg(test)]
#[path = "sphere_test.rs"]
mod sphere_test;
