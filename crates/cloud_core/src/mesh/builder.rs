//! Pre-sized, append-only mesh construction.
//!
//! The tessellators know their exact vertex and triangle counts up front.
//! [`MeshBuilder::with_capacity`] reserves every buffer once (reporting
//! allocation failure as an error), the generator then fills it in one pass
//! and [`MeshBuilder::finish`] checks that the announced counts were met.

use std::collections::HashMap;

use glam::Vec3;

use super::{FaceNormals, TriMesh};
use crate::error::{try_with_capacity, Error, Result};
use crate::normals::NormalCode;

/// Which normals the mesh under construction carries.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NormalLayout {
  #[default]
  None,
  /// One exact normal per vertex.
  PerVertex,
  /// A table of at most `table_size` codes plus one slot triple per triangle.
  PerFace { table_size: usize },
}

/// Append-only builder for a [`TriMesh`] of known size.
#[derive(Debug)]
pub struct MeshBuilder {
  vertices: Vec<Vec3>,
  triangles: Vec<[u32; 3]>,
  vertex_normals: Option<Vec<Vec3>>,
  face_normals: Option<FaceNormals>,
  normal_slots: HashMap<NormalCode, u32>,
  expected_vertices: usize,
  expected_triangles: usize,
}

impl MeshBuilder {
  /// Reserve room for exactly `vertices` vertices and `triangles` triangles.
  pub fn with_capacity(vertices: usize, triangles: usize, normals: NormalLayout) -> Result<Self> {
    if vertices > u32::MAX as usize {
      return Err(Error::InvalidArgument("vertex count exceeds 32-bit indices"));
    }
    let vertex_normals = match normals {
      NormalLayout::PerVertex => Some(try_with_capacity(vertices, "vertex normals")?),
      _ => None,
    };
    let face_normals = match normals {
      NormalLayout::PerFace { table_size } => Some(FaceNormals {
        codes: try_with_capacity(table_size, "normal table")?,
        indices: try_with_capacity(triangles, "face normal indices")?,
      }),
      _ => None,
    };
    Ok(Self {
      vertices: try_with_capacity(vertices, "vertices")?,
      triangles: try_with_capacity(triangles, "triangles")?,
      vertex_normals,
      face_normals,
      normal_slots: HashMap::new(),
      expected_vertices: vertices,
      expected_triangles: triangles,
    })
  }

  /// Append a vertex and return its index.
  #[inline]
  pub fn push_vertex(&mut self, position: Vec3) -> u32 {
    debug_assert!(self.vertices.len() < self.expected_vertices, "vertex buffer overflow");
    self.vertices.push(position);
    (self.vertices.len() - 1) as u32
  }

  /// Append a vertex with its exact normal (per-vertex layout).
  #[inline]
  pub fn push_vertex_with_normal(&mut self, position: Vec3, normal: Vec3) -> u32 {
    if let Some(normals) = &mut self.vertex_normals {
      normals.push(normal);
    }
    self.push_vertex(position)
  }

  /// Slot of `code` in the face normal table, adding it when new.
  pub fn push_normal(&mut self, code: NormalCode) -> u32 {
    let Some(faces) = &mut self.face_normals else {
      return 0;
    };
    *self.normal_slots.entry(code).or_insert_with(|| {
      faces.codes.push(code);
      (faces.codes.len() - 1) as u32
    })
  }

  #[inline]
  pub fn push_triangle(&mut self, triangle: [u32; 3]) {
    debug_assert!(self.triangles.len() < self.expected_triangles, "triangle buffer overflow");
    self.triangles.push(triangle);
  }

  /// Append a triangle and the normal slots of its three corners.
  #[inline]
  pub fn push_triangle_with_normals(&mut self, triangle: [u32; 3], normals: [u32; 3]) {
    if let Some(faces) = &mut self.face_normals {
      faces.indices.push(normals);
    }
    self.push_triangle(triangle);
  }

  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  pub fn triangle_count(&self) -> usize {
    self.triangles.len()
  }

  /// Check the announced counts and every index, then publish the mesh.
  pub fn finish(self) -> Result<TriMesh> {
    if self.vertices.len() != self.expected_vertices {
      return Err(Error::TopologyMismatch {
        what: "vertex count",
        expected: self.expected_vertices,
        actual: self.vertices.len(),
      });
    }
    if self.triangles.len() != self.expected_triangles {
      return Err(Error::TopologyMismatch {
        what: "triangle count",
        expected: self.expected_triangles,
        actual: self.triangles.len(),
      });
    }
    let mesh = TriMesh {
      vertices: self.vertices,
      triangles: self.triangles,
      vertex_normals: self.vertex_normals,
      face_normals: self.face_normals,
    };
    mesh.validate()?;
    Ok(mesh)
  }
}
