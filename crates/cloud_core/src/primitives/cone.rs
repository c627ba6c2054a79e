//! Truncated cone (and cylinder) tessellation.
//!
//! ```text
//!                 top centre (1)
//!            t0 ─── t1 ─── t2 ...       top ring   (if top radius > 0)
//!            │ ╲    │ ╲    │
//!            │   ╲  │   ╲  │             one quad per step, split in two
//!            │     ╲│     ╲│
//!            b0 ─── b1 ─── b2 ...       bottom ring (if bottom radius > 0)
//!                 bottom centre (0)
//! ```
//!
//! Vertex order is bottom centre, top centre, bottom ring, top ring. A ring
//! whose radius is zero collapses onto its centre, which then becomes the
//! apex of the side fan and loses its cap.
//!
//! The lateral surface is faceted: every quad carries one normal, the exact
//! normal of the quad's plane, computed from the chord tangent and the slant
//! between the chord midpoints.

use std::f32::consts::TAU;

use glam::Vec3;

use super::{check_extent, check_precision, MeshCounts, Tessellate};
use crate::constants::{DEFAULT_DRAWING_PRECISION, MIN_DRAWING_PRECISION, ZERO_TOLERANCE};
use crate::error::{try_with_capacity, Error, Result};
use crate::mesh::{MeshBuilder, NormalLayout, TriMesh};
use crate::normals::NormalTable;

/// Cone with independent bottom and top radii along +Z.
///
/// The bottom centre sits at `(x_offset, y_offset, -height) / 2` and the top
/// centre at `(-x_offset, -y_offset, height) / 2`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Cone {
  pub bottom_radius: f32,
  pub top_radius: f32,
  pub height: f32,
  pub x_offset: f32,
  pub y_offset: f32,
  /// Number of sides.
  pub precision: u32,
}

impl Default for Cone {
  fn default() -> Self {
    Self::new(1.0, 0.0, 1.0, DEFAULT_DRAWING_PRECISION)
  }
}

/// Which rings exist, after degeneracy checks.
#[derive(Clone, Copy, Debug)]
struct Topology {
  steps: u32,
  bottom_ring: bool,
  top_ring: bool,
}

impl Cone {
  /// Radii and height are taken as absolute values; precision is raised to
  /// the minimum when lower.
  pub fn new(bottom_radius: f32, top_radius: f32, height: f32, precision: u32) -> Self {
    Self {
      bottom_radius: bottom_radius.abs(),
      top_radius: top_radius.abs(),
      height: height.abs(),
      x_offset: 0.0,
      y_offset: 0.0,
      precision: precision.max(MIN_DRAWING_PRECISION),
    }
  }

  /// Cone with equal radii.
  pub fn cylinder(radius: f32, height: f32, precision: u32) -> Self {
    Self::new(radius, radius, height, precision)
  }

  /// Shift the two centres apart laterally (skewed cone).
  pub fn with_offset(mut self, x_offset: f32, y_offset: f32) -> Self {
    self.x_offset = x_offset;
    self.y_offset = y_offset;
    self
  }

  pub fn is_cylinder(&self) -> bool {
    self.bottom_radius == self.top_radius
  }

  pub fn bottom_center(&self) -> Vec3 {
    Vec3::new(self.x_offset, self.y_offset, -self.height) * 0.5
  }

  pub fn top_center(&self) -> Vec3 {
    Vec3::new(-self.x_offset, -self.y_offset, self.height) * 0.5
  }

  fn topology(&self) -> Result<Topology> {
    check_precision(self.precision)?;
    check_extent(self.height, "cone height is zero")?;
    if !self.x_offset.is_finite() || !self.y_offset.is_finite() {
      return Err(Error::InvalidArgument("cone offset is not finite"));
    }
    if !self.bottom_radius.is_finite() || !self.top_radius.is_finite() {
      return Err(Error::DegenerateShape("cone radius is not finite"));
    }
    let bottom_ring = self.bottom_radius >= ZERO_TOLERANCE;
    let top_ring = self.top_radius >= ZERO_TOLERANCE;
    if !bottom_ring && !top_ring {
      return Err(Error::DegenerateShape("both cone radii are zero"));
    }
    Ok(Topology {
      steps: self.precision,
      bottom_ring,
      top_ring,
    })
  }

  fn counts_of(topology: Topology) -> Result<MeshCounts> {
    let steps = topology.steps as usize;
    let rings = topology.bottom_ring as usize + topology.top_ring as usize;
    let vertices = steps
      .checked_mul(rings)
      .and_then(|v| v.checked_add(2))
      .filter(|&v| v <= u32::MAX as usize)
      .ok_or(Error::InvalidArgument("cone precision too large"))?;
    // One cap fan per ring, then two side triangles per quad or one per fan.
    let triangles = steps * if rings == 2 { 4 } else { 2 };
    Ok(MeshCounts { vertices, triangles })
  }

  fn ring_point(center: Vec3, radius: f32, angle: f32) -> Vec3 {
    center + Vec3::new(angle.cos(), angle.sin(), 0.0) * radius
  }
}

impl Tessellate for Cone {
  fn counts(&self) -> Result<MeshCounts> {
    Self::counts_of(self.topology()?)
  }

  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "primitives::cone"))]
  fn tessellate(&self, table: &NormalTable) -> Result<TriMesh> {
    let topology = self.topology()?;
    let counts = Self::counts_of(topology)?;
    let steps = topology.steps;
    let mut builder = MeshBuilder::with_capacity(
      counts.vertices,
      counts.triangles,
      NormalLayout::PerFace {
        table_size: steps as usize + 2,
      },
    )?;

    let bottom_center = self.bottom_center();
    let top_center = self.top_center();
    let step = TAU / steps as f32;

    let bottom_pole = builder.push_vertex(bottom_center);
    let top_pole = builder.push_vertex(top_center);
    let down = builder.push_normal(table.encode(Vec3::NEG_Z));
    let up = builder.push_normal(table.encode(Vec3::Z));

    let bottom_first = builder.vertex_count() as u32;
    if topology.bottom_ring {
      for i in 0..steps {
        builder.push_vertex(Self::ring_point(bottom_center, self.bottom_radius, step * i as f32));
      }
    }
    let top_first = builder.vertex_count() as u32;
    if topology.top_ring {
      for i in 0..steps {
        builder.push_vertex(Self::ring_point(top_center, self.top_radius, step * i as f32));
      }
    }

    // Ring radius 0 collapses every chord onto the pole.
    let bottom_radius = if topology.bottom_ring { self.bottom_radius } else { 0.0 };
    let top_radius = if topology.top_ring { self.top_radius } else { 0.0 };
    let mut side: Vec<u32> = try_with_capacity(steps as usize, "cone side normals")?;
    for i in 0..steps {
      let (a0, a1) = (step * i as f32, step * (i + 1) as f32);
      let mid = step * (i as f32 + 0.5);
      let tangent = Vec3::new(-mid.sin(), mid.cos(), 0.0);
      let bottom_mid = (Self::ring_point(bottom_center, bottom_radius, a0)
        + Self::ring_point(bottom_center, bottom_radius, a1))
        * 0.5;
      let top_mid = (Self::ring_point(top_center, top_radius, a0)
        + Self::ring_point(top_center, top_radius, a1))
        * 0.5;
      let normal = (bottom_mid - top_mid).cross(tangent).normalize_or_zero();
      side.push(builder.push_normal(table.encode(normal)));
    }

    if topology.bottom_ring {
      for i in 0..steps {
        let next = (i + 1) % steps;
        builder.push_triangle_with_normals(
          [bottom_pole, bottom_first + next, bottom_first + i],
          [down; 3],
        );
      }
    }
    if topology.top_ring {
      for i in 0..steps {
        let next = (i + 1) % steps;
        builder.push_triangle_with_normals([top_pole, top_first + i, top_first + next], [up; 3]);
      }
    }
    for i in 0..steps {
      let next = (i + 1) % steps;
      let (b, b_next) = (bottom_first + i, bottom_first + next);
      let (t, t_next) = (top_first + i, top_first + next);
      let n = side[i as usize];
      match (topology.bottom_ring, topology.top_ring) {
        (true, true) => {
          builder.push_triangle_with_normals([b, b_next, t], [n; 3]);
          builder.push_triangle_with_normals([t, b_next, t_next], [n; 3]);
        }
        (false, true) => builder.push_triangle_with_normals([t, bottom_pole, t_next], [n; 3]),
        _ => builder.push_triangle_with_normals([b, b_next, top_pole], [n; 3]),
      }
    }

    builder.finish()
  }
}

#[cfg(test)]
#[path = "cone_test.rs"]
mod cone_test;
