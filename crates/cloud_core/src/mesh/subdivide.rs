//! Area-driven midpoint subdivision.
//!
//! ```text
//!            C                      C
//!           / \                    / \
//!          /   \                 G3---G2
//!         /     \      ==>       / \ / \
//!        A-------B              A--G1---B
//! ```
//!
//! Triangles larger than the area limit are split into four through their
//! edge midpoints, recursively. Midpoints are shared between neighbours via an
//! edge map, and a second pass splits every unsplit triangle that borders a
//! split one so that no T-junction remains.

use std::collections::HashMap;

use glam::Vec3;

use super::TriMesh;
use crate::constants::ZERO_TOLERANCE;
use crate::error::{try_reserve, Error, Result};

/// Output buffers plus the midpoint of every split edge.
struct Subdivider {
  max_area: f32,
  vertices: Vec<Vec3>,
  triangles: Vec<[u32; 3]>,
  midpoints: HashMap<u64, u32>,
}

#[inline]
fn edge_key(a: u32, b: u32) -> u64 {
  let (lo, hi) = if a < b { (a, b) } else { (b, a) };
  ((lo as u64) << 32) | hi as u64
}

impl Subdivider {
  fn area(&self, [a, b, c]: [u32; 3]) -> f32 {
    let (pa, pb, pc) = (
      self.vertices[a as usize],
      self.vertices[b as usize],
      self.vertices[c as usize],
    );
    (pb - pa).cross(pc - pa).length() * 0.5
  }

  fn midpoint(&mut self, a: u32, b: u32) -> Result<u32> {
    let key = edge_key(a, b);
    if let Some(&index) = self.midpoints.get(&key) {
      return Ok(index);
    }
    if self.vertices.len() >= u32::MAX as usize {
      return Err(Error::InvalidArgument("subdivided mesh exceeds 32-bit vertex indices"));
    }
    let index = self.vertices.len() as u32;
    let m = (self.vertices[a as usize] + self.vertices[b as usize]) * 0.5;
    try_reserve(&mut self.vertices, 1, "subdivision vertices")?;
    self.vertices.push(m);
    self.midpoints.insert(key, index);
    Ok(index)
  }

  fn push(&mut self, triangle: [u32; 3]) -> Result<()> {
    if self.area(triangle) <= self.max_area {
      try_reserve(&mut self.triangles, 1, "subdivision triangles")?;
      self.triangles.push(triangle);
      return Ok(());
    }
    let [a, b, c] = triangle;
    let g1 = self.midpoint(a, b)?;
    let g2 = self.midpoint(b, c)?;
    let g3 = self.midpoint(c, a)?;
    self.push([a, g1, g3])?;
    self.push([b, g2, g1])?;
    self.push([c, g3, g2])?;
    self.push([g1, g2, g3])
  }

  /// Split the unsplit triangles that have a subdivided edge.
  fn fix_t_junctions(&mut self) -> Result<()> {
    let count = self.triangles.len();
    for t in 0..count {
      let [a, b, c] = self.triangles[t];
      let g1 = self.midpoints.get(&edge_key(a, b)).copied();
      let g2 = self.midpoints.get(&edge_key(b, c)).copied();
      let g3 = self.midpoints.get(&edge_key(c, a)).copied();

      match (g1, g2, g3) {
        (None, None, None) => {}
        (Some(g1), Some(g2), Some(g3)) => {
          self.triangles[t] = [a, g1, g3];
          self.push([b, g2, g1])?;
          self.push([c, g3, g2])?;
          self.push([g1, g2, g3])?;
        }
        (None, Some(g2), Some(g3)) => {
          self.triangles[t] = [c, g3, g2];
          self.push([a, g2, g3])?;
          self.push([a, b, g2])?;
        }
        (Some(g1), None, Some(g3)) => {
          self.triangles[t] = [a, g1, g3];
          self.push([b, g3, g1])?;
          self.push([b, c, g3])?;
        }
        (Some(g1), Some(g2), None) => {
          self.triangles[t] = [b, g2, g1];
          self.push([c, g1, g2])?;
          self.push([c, a, g1])?;
        }
        (Some(g), None, None) | (None, Some(g), None) | (None, None, Some(g)) => {
          // One broken edge: split through the opposite corner.
          let corners = [a, b, c];
          let opposite = if g1.is_some() {
            2
          } else if g2.is_some() {
            0
          } else {
            1
          };
          self.triangles[t] = [corners[opposite], g, corners[(opposite + 2) % 3]];
          self.push([corners[opposite], corners[(opposite + 1) % 3], g])?;
        }
      }
    }
    Ok(())
  }
}

impl TriMesh {
  /// New mesh in which no triangle is larger than `max_area`.
  ///
  /// Face normals are dropped; vertex normals, when present, are recomputed
  /// from the new faces.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "mesh::subdivide"))]
  pub fn subdivide(&self, max_area: f32) -> Result<TriMesh> {
    if max_area.is_nan() || max_area <= ZERO_TOLERANCE {
      return Err(Error::InvalidArgument("maximum triangle area must be positive"));
    }
    if self.is_empty() {
      return Err(Error::EmptyMesh);
    }
    self.validate()?;
    // Halving a non-finite edge never reaches the area limit.
    if !self.vertices.iter().all(|v| v.is_finite()) {
      return Err(Error::InvalidArgument("mesh has a non-finite vertex"));
    }

    let mut vertices = Vec::new();
    try_reserve(&mut vertices, self.vertices.len(), "subdivision vertices")?;
    vertices.extend_from_slice(&self.vertices);
    let mut triangles = Vec::new();
    try_reserve(&mut triangles, self.triangles.len(), "subdivision triangles")?;

    let mut subdivider = Subdivider {
      max_area,
      vertices,
      triangles,
      midpoints: HashMap::new(),
    };
    for &triangle in &self.triangles {
      if !subdivider.area(triangle).is_finite() {
        return Err(Error::InvalidArgument("triangle area overflows"));
      }
      subdivider.push(triangle)?;
    }
    subdivider.fix_t_junctions()?;

    tracing::debug!(
      triangles_in = self.triangles.len(),
      triangles_out = subdivider.triangles.len(),
      vertices_out = subdivider.vertices.len(),
      "mesh subdivided"
    );

    let mut mesh = TriMesh {
      vertices: subdivider.vertices,
      triangles: subdivider.triangles,
      vertex_normals: None,
      face_normals: None,
    };
    if self.vertex_normals.is_some() {
      mesh.compute_vertex_normals()?;
    }
    Ok(mesh)
  }
}

#[cfg(test)]
#[path = "subdivide_test.rs"]
mod subdivide_test;
