//! Axis-aligned rectangle in the XY plane, facing +Z.

use glam::Vec3;

use super::{check_extent, MeshCounts, Tessellate};
use crate::error::Result;
use crate::mesh::{MeshBuilder, NormalLayout, TriMesh};
use crate::normals::NormalTable;

/// Rectangle of `width` along X and `height` along Y, centred on the origin.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
  pub width: f32,
  pub height: f32,
}

impl Default for Plane {
  fn default() -> Self {
    Self::new(1.0, 1.0)
  }
}

impl Plane {
  pub fn new(width: f32, height: f32) -> Self {
    Self {
      width: width.abs(),
      height: height.abs(),
    }
  }
}

impl Tessellate for Plane {
  fn counts(&self) -> Result<MeshCounts> {
    check_extent(self.width, "plane width is zero")?;
    check_extent(self.height, "plane height is zero")?;
    Ok(MeshCounts {
      vertices: 4,
      triangles: 2,
    })
  }

  fn tessellate(&self, table: &NormalTable) -> Result<TriMesh> {
    let counts = self.counts()?;
    let mut builder = MeshBuilder::with_capacity(
      counts.vertices,
      counts.triangles,
      NormalLayout::PerFace { table_size: 1 },
    )?;

    let (hx, hy) = (self.width * 0.5, self.height * 0.5);
    // Counter-clockwise seen from +Z.
    for (x, y) in [(-hx, -hy), (hx, -hy), (hx, hy), (-hx, hy)] {
      builder.push_vertex(Vec3::new(x, y, 0.0));
    }
    let up = builder.push_normal(table.encode(Vec3::Z));
    builder.push_triangle_with_normals([0, 1, 2], [up; 3]);
    builder.push_triangle_with_normals([0, 2, 3], [up; 3]);

    builder.finish()
  }
}
