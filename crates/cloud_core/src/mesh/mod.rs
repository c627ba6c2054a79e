//! Indexed triangle meshes produced by the tessellators.
//!
//! ```text
//!   vertices:      [ v0 v1 v2 ... ]            Vec3
//!   triangles:     [ (a b c) ... ]             indices into vertices
//!   vertex normals [ n0 n1 n2 ... ]            optional, one per vertex
//!   face normals   codes:   [ k0 k1 ... ]      optional, deduplicated
//!                  indices: [ (i j k) ... ]    one triple per triangle
//! ```
//!
//! Every index is checked by [`TriMesh::validate`]; meshes coming out of
//! [`MeshBuilder::finish`] are always valid.

mod builder;
mod smooth;
mod subdivide;

use std::collections::HashMap;

use glam::{Affine3A, Mat3A, Vec3};

pub use builder::{MeshBuilder, NormalLayout};

use crate::bounds::BoundingBox;
use crate::error::{try_reserve, Error, Result};
use crate::normals::{NormalCode, NormalTable};

/// Per-face normals: a small table of compressed directions and, for every
/// triangle, the table slot used at each corner.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceNormals {
  pub codes: Vec<NormalCode>,
  pub indices: Vec<[u32; 3]>,
}

/// Indexed triangle mesh.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TriMesh {
  pub vertices: Vec<Vec3>,
  pub triangles: Vec<[u32; 3]>,
  pub vertex_normals: Option<Vec<Vec3>>,
  pub face_normals: Option<FaceNormals>,
}

impl TriMesh {
  pub fn new() -> Self {
    Self::default()
  }

  /// Clear all buffers, preserving capacity.
  pub fn clear(&mut self) {
    self.vertices.clear();
    self.triangles.clear();
    self.vertex_normals = None;
    self.face_normals = None;
  }

  /// Returns true if no geometry is stored.
  pub fn is_empty(&self) -> bool {
    self.vertices.is_empty() || self.triangles.is_empty()
  }

  pub fn vertex_count(&self) -> usize {
    self.vertices.len()
  }

  pub fn triangle_count(&self) -> usize {
    self.triangles.len()
  }

  /// Box around every vertex, `None` without vertices.
  pub fn bounding_box(&self) -> Option<BoundingBox> {
    BoundingBox::from_points(self.vertices.iter().copied())
  }

  /// Check every index and attribute length.
  pub fn validate(&self) -> Result<()> {
    let vertex_count = self.vertices.len();
    if let Some(bad) = self
      .triangles
      .iter()
      .flatten()
      .find(|&&i| i as usize >= vertex_count)
    {
      return Err(Error::TopologyMismatch {
        what: "triangle index below vertex count",
        expected: vertex_count,
        actual: *bad as usize,
      });
    }
    if let Some(normals) = &self.vertex_normals {
      if normals.len() != vertex_count {
        return Err(Error::TopologyMismatch {
          what: "vertex normal count",
          expected: vertex_count,
          actual: normals.len(),
        });
      }
    }
    if let Some(faces) = &self.face_normals {
      if faces.indices.len() != self.triangles.len() {
        return Err(Error::TopologyMismatch {
          what: "face normal triple count",
          expected: self.triangles.len(),
          actual: faces.indices.len(),
        });
      }
      let table_len = faces.codes.len();
      if let Some(bad) = faces
        .indices
        .iter()
        .flatten()
        .find(|&&i| i as usize >= table_len)
      {
        return Err(Error::TopologyMismatch {
          what: "face normal index below table size",
          expected: table_len,
          actual: *bad as usize,
        });
      }
    }
    Ok(())
  }

  /// Decoded normal of each corner of triangle `index`.
  pub fn face_normal(&self, index: usize, table: &NormalTable) -> Option<[Vec3; 3]> {
    let faces = self.face_normals.as_ref()?;
    let slots = faces.indices.get(index)?;
    let mut out = [Vec3::ZERO; 3];
    for (n, &slot) in out.iter_mut().zip(slots) {
      *n = table.decode(*faces.codes.get(slot as usize)?)?;
    }
    Some(out)
  }

  /// Concatenate `other` after this mesh, shifting its indices.
  ///
  /// An attribute survives only if both meshes carry it (an empty mesh adopts
  /// the attributes of `other`). Face normal tables are merged without
  /// duplicate codes.
  pub fn append(&mut self, other: &TriMesh) -> Result<()> {
    if self.vertices.is_empty() && self.triangles.is_empty() {
      *self = other.clone();
      return Ok(());
    }
    let total = self.vertices.len() + other.vertices.len();
    if total > u32::MAX as usize {
      return Err(Error::InvalidArgument("merged mesh exceeds 32-bit vertex indices"));
    }
    let shift = self.vertices.len() as u32;

    try_reserve(&mut self.vertices, other.vertices.len(), "merged vertices")?;
    try_reserve(&mut self.triangles, other.triangles.len(), "merged triangles")?;

    self.vertex_normals = match (self.vertex_normals.take(), &other.vertex_normals) {
      (Some(mut mine), Some(theirs)) => {
        try_reserve(&mut mine, theirs.len(), "merged vertex normals")?;
        mine.extend_from_slice(theirs);
        Some(mine)
      }
      _ => None,
    };

    self.face_normals = match (self.face_normals.take(), &other.face_normals) {
      (Some(mut mine), Some(theirs)) => {
        let mut slot_of: HashMap<NormalCode, u32> = mine
          .codes
          .iter()
          .enumerate()
          .map(|(slot, &code)| (code, slot as u32))
          .collect();
        let remap: Vec<u32> = theirs
          .codes
          .iter()
          .map(|&code| {
            *slot_of.entry(code).or_insert_with(|| {
              mine.codes.push(code);
              (mine.codes.len() - 1) as u32
            })
          })
          .collect();
        try_reserve(&mut mine.indices, theirs.indices.len(), "merged face normals")?;
        mine
          .indices
          .extend(theirs.indices.iter().map(|t| t.map(|s| remap[s as usize])));
        Some(mine)
      }
      _ => None,
    };

    self.vertices.extend_from_slice(&other.vertices);
    self
      .triangles
      .extend(other.triangles.iter().map(|t| t.map(|i| i + shift)));
    Ok(())
  }

  /// Copy of the mesh with `transform` applied to positions and normals.
  ///
  /// Normals go through the inverse transpose of the linear part and are
  /// renormalized; face normals are re-encoded with `table`.
  pub fn transformed(&self, transform: &Affine3A, table: &NormalTable) -> TriMesh {
    let normal_matrix: Mat3A = transform.matrix3.inverse().transpose();
    let rotate = |n: Vec3| (normal_matrix * n).normalize_or_zero();

    let face_normals = self.face_normals.as_ref().map(|faces| {
      let mut codes: Vec<NormalCode> = Vec::with_capacity(faces.codes.len());
      let mut slot_of: HashMap<NormalCode, u32> = HashMap::new();
      let remap: Vec<u32> = faces
        .codes
        .iter()
        .map(|&code| {
          let n = table.decode(code).map(rotate).unwrap_or(Vec3::Z);
          let code = table.encode(n);
          *slot_of.entry(code).or_insert_with(|| {
            codes.push(code);
            (codes.len() - 1) as u32
          })
        })
        .collect();
      FaceNormals {
        codes,
        indices: faces
          .indices
          .iter()
          .map(|t| t.map(|s| remap[s as usize]))
          .collect(),
      }
    });

    TriMesh {
      vertices: self
        .vertices
        .iter()
        .map(|&p| transform.transform_point3(p))
        .collect(),
      triangles: self.triangles.clone(),
      vertex_normals: self
        .vertex_normals
        .as_ref()
        .map(|normals| normals.iter().map(|&n| rotate(n)).collect()),
      face_normals,
    }
  }
}
