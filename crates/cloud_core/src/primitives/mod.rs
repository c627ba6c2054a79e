//! Procedural tessellation of canonical solids.
//!
//! Every shape is a small parameter set behind the [`Tessellate`] interface,
//! which turns it into a [`TriMesh`] in the shape's local frame:
//!
//! | Shape    | Vertices             | Triangles          | Normals          |
//! |----------|----------------------|--------------------|------------------|
//! | Cone     | `2 + N` or `2 + 2N`  | `2N` or `4N`       | per face, faceted|
//! | Sphere   | `2 + S(S-1)`         | `S(2(S-2) + 2)`    | per vertex       |
//! | Plane    | 4                    | 2                  | per face (+Z)    |
//! | Cuboid   | 24                   | 12                 | per face         |
//!
//! Placement in the world and reuse of identical meshes live in
//! [`GenericPrimitive`] and [`PrimitiveCache`].

mod cone;
mod cuboid;
mod generic;
mod plane;
mod sphere;

pub use cone::Cone;
pub use cuboid::Cuboid;
pub use generic::{GenericPrimitive, PrimitiveCache};
pub use plane::Plane;
pub use sphere::Sphere;

use crate::constants::{MIN_DRAWING_PRECISION, ZERO_TOLERANCE};
use crate::error::{Error, Result};
use crate::mesh::TriMesh;
use crate::normals::NormalTable;

/// Exact buffer sizes of a tessellation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MeshCounts {
  pub vertices: usize,
  pub triangles: usize,
}

/// Shapes that can produce their own triangle mesh.
pub trait Tessellate {
  /// Vertex and triangle counts `tessellate` will produce.
  ///
  /// Fails exactly when `tessellate` would fail on parameter validation.
  fn counts(&self) -> Result<MeshCounts>;

  /// Build the mesh. Per-face normals are encoded with `table`.
  fn tessellate(&self, table: &NormalTable) -> Result<TriMesh>;
}

/// Closed set of supported primitives.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
  Cone(Cone),
  Sphere(Sphere),
  Plane(Plane),
  Cuboid(Cuboid),
}

impl Shape {
  /// Default display name of the shape kind.
  pub fn kind_name(&self) -> &'static str {
    match self {
      Shape::Cone(cone) if cone.is_cylinder() => "Cylinder",
      Shape::Cone(_) => "Cone",
      Shape::Sphere(_) => "Sphere",
      Shape::Plane(_) => "Plane",
      Shape::Cuboid(_) => "Box",
    }
  }

  /// Angular precision, for the shapes that have one.
  pub fn precision(&self) -> Option<u32> {
    match self {
      Shape::Cone(cone) => Some(cone.precision),
      Shape::Sphere(sphere) => Some(sphere.precision),
      Shape::Plane(_) | Shape::Cuboid(_) => None,
    }
  }

  /// Copy of the shape with another angular precision.
  ///
  /// Unlike the constructors this does not clamp: values below the minimum
  /// are rejected.
  pub fn with_precision(&self, precision: u32) -> Result<Shape> {
    check_precision(precision)?;
    match *self {
      Shape::Cone(cone) => Ok(Shape::Cone(Cone { precision, ..cone })),
      Shape::Sphere(sphere) => Ok(Shape::Sphere(Sphere { precision, ..sphere })),
      Shape::Plane(_) | Shape::Cuboid(_) => {
        Err(Error::InvalidArgument("shape has no angular precision"))
      }
    }
  }

  /// Hashable identity of the parameters.
  pub fn signature(&self) -> ShapeSignature {
    match *self {
      Shape::Cone(c) => ShapeSignature::new(
        0,
        [c.bottom_radius, c.top_radius, c.height, c.x_offset, c.y_offset],
        c.precision,
      ),
      Shape::Sphere(s) => ShapeSignature::new(1, [s.radius, 0.0, 0.0, 0.0, 0.0], s.precision),
      Shape::Plane(p) => ShapeSignature::new(2, [p.width, p.height, 0.0, 0.0, 0.0], 0),
      Shape::Cuboid(b) => ShapeSignature::new(3, [b.dims.x, b.dims.y, b.dims.z, 0.0, 0.0], 0),
    }
  }
}

impl Tessellate for Shape {
  fn counts(&self) -> Result<MeshCounts> {
    match self {
      Shape::Cone(cone) => cone.counts(),
      Shape::Sphere(sphere) => sphere.counts(),
      Shape::Plane(plane) => plane.counts(),
      Shape::Cuboid(cuboid) => cuboid.counts(),
    }
  }

  fn tessellate(&self, table: &NormalTable) -> Result<TriMesh> {
    match self {
      Shape::Cone(cone) => cone.tessellate(table),
      Shape::Sphere(sphere) => sphere.tessellate(table),
      Shape::Plane(plane) => plane.tessellate(table),
      Shape::Cuboid(cuboid) => cuboid.tessellate(table),
    }
  }
}

impl From<Cone> for Shape {
  fn from(cone: Cone) -> Self {
    Shape::Cone(cone)
  }
}

impl From<Sphere> for Shape {
  fn from(sphere: Sphere) -> Self {
    Shape::Sphere(sphere)
  }
}

impl From<Plane> for Shape {
  fn from(plane: Plane) -> Self {
    Shape::Plane(plane)
  }
}

impl From<Cuboid> for Shape {
  fn from(cuboid: Cuboid) -> Self {
    Shape::Cuboid(cuboid)
  }
}

/// Bit-exact key of a shape's parameters.
///
/// Two shapes with the same signature tessellate to identical meshes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ShapeSignature {
  kind: u8,
  params: [u32; 5],
  precision: u32,
}

impl ShapeSignature {
  fn new(kind: u8, params: [f32; 5], precision: u32) -> Self {
    Self {
      kind,
      params: params.map(f32::to_bits),
      precision,
    }
  }
}

pub(crate) fn check_precision(precision: u32) -> Result<()> {
  if precision < MIN_DRAWING_PRECISION {
    return Err(Error::PrecisionTooLow {
      precision,
      minimum: MIN_DRAWING_PRECISION,
    });
  }
  Ok(())
}

/// A length that must be finite and larger than the zero tolerance.
pub(crate) fn check_extent(value: f32, what: &'static str) -> Result<()> {
  if !value.is_finite() || value < ZERO_TOLERANCE {
    return Err(Error::DegenerateShape(what));
  }
  Ok(())
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod mod_test;
