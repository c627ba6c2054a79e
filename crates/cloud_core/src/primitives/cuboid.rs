//! Box made of six independent rectangles.
//!
//! Faces are not welded: every face keeps its own four vertices and its own
//! outward normal, so edges stay sharp. Each face is a +Z facing rectangle
//! placed by a rigid transform, written straight into one pre-sized builder.

use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Affine3A, Quat, Vec3};

use super::{check_extent, MeshCounts, Tessellate};
use crate::error::Result;
use crate::mesh::{MeshBuilder, NormalLayout, TriMesh};
use crate::normals::NormalTable;

/// Axis-aligned box of size `dims`, centred on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cuboid {
  pub dims: Vec3,
}

impl Default for Cuboid {
  fn default() -> Self {
    Self::new(Vec3::ONE)
  }
}

impl Cuboid {
  pub fn new(dims: Vec3) -> Self {
    Self { dims: dims.abs() }
  }

  /// Cube with side `size`.
  pub fn cube(size: f32) -> Self {
    Self::new(Vec3::splat(size))
  }

  /// The six faces as (width, height, placement) of a +Z rectangle.
  fn faces(&self) -> [(f32, f32, Affine3A); 6] {
    let Vec3 { x, y, z } = self.dims;
    let place = |axis: Vec3, angle: f32, translation: Vec3| {
      Affine3A::from_rotation_translation(Quat::from_axis_angle(axis, angle), translation)
    };
    [
      // upper
      (x, y, Affine3A::from_translation(Vec3::new(0.0, 0.0, z * 0.5))),
      // lower
      (x, y, place(Vec3::X, -PI, Vec3::new(0.0, 0.0, -z * 0.5))),
      // left
      (z, y, place(Vec3::Y, -FRAC_PI_2, Vec3::new(-x * 0.5, 0.0, 0.0))),
      // right
      (z, y, place(Vec3::Y, FRAC_PI_2, Vec3::new(x * 0.5, 0.0, 0.0))),
      // front
      (x, z, place(Vec3::X, FRAC_PI_2, Vec3::new(0.0, -y * 0.5, 0.0))),
      // back
      (x, z, place(Vec3::X, -FRAC_PI_2, Vec3::new(0.0, y * 0.5, 0.0))),
    ]
  }
}

impl Tessellate for Cuboid {
  fn counts(&self) -> Result<MeshCounts> {
    check_extent(self.dims.x, "box width is zero")?;
    check_extent(self.dims.y, "box depth is zero")?;
    check_extent(self.dims.z, "box height is zero")?;
    Ok(MeshCounts {
      vertices: 24,
      triangles: 12,
    })
  }

  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "primitives::cuboid"))]
  fn tessellate(&self, table: &NormalTable) -> Result<TriMesh> {
    let counts = self.counts()?;
    let mut builder = MeshBuilder::with_capacity(
      counts.vertices,
      counts.triangles,
      NormalLayout::PerFace { table_size: 6 },
    )?;

    for (width, height, placement) in self.faces() {
      let (hx, hy) = (width * 0.5, height * 0.5);
      let first = builder.vertex_count() as u32;
      // Counter-clockwise seen from outside.
      for (u, v) in [(-hx, -hy), (hx, -hy), (hx, hy), (-hx, hy)] {
        builder.push_vertex(placement.transform_point3(Vec3::new(u, v, 0.0)));
      }
      let normal = builder.push_normal(table.encode(placement.transform_vector3(Vec3::Z)));
      builder.push_triangle_with_normals([first, first + 1, first + 2], [normal; 3]);
      builder.push_triangle_with_normals([first, first + 2, first + 3], [normal; 3]);
    }

    builder.finish()
  }
}
