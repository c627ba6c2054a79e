//! Vertex normal recomputation and Laplacian smoothing.

use glam::Vec3;

use super::TriMesh;
use crate::error::{try_with_capacity, Error, Result};
use crate::progress::{self, ProgressSink};

impl TriMesh {
  /// Replace the per-vertex normals with area-weighted face normals.
  ///
  /// Each vertex accumulates the unnormalized cross product of every triangle
  /// it belongs to. Isolated vertices get a zero normal.
  pub fn compute_vertex_normals(&mut self) -> Result<()> {
    self.validate()?;
    let mut normals: Vec<Vec3> = try_with_capacity(self.vertices.len(), "vertex normals")?;
    normals.resize(self.vertices.len(), Vec3::ZERO);

    for &[a, b, c] in &self.triangles {
      let (pa, pb, pc) = (
        self.vertices[a as usize],
        self.vertices[b as usize],
        self.vertices[c as usize],
      );
      let n = (pb - pa).cross(pc - pa);
      normals[a as usize] += n;
      normals[b as usize] += n;
      normals[c as usize] += n;
    }
    for n in &mut normals {
      *n = n.normalize_or_zero();
    }
    self.vertex_normals = Some(normals);
    Ok(())
  }

  /// Move every vertex toward the average of its edge neighbours.
  ///
  /// Each iteration sums, for every vertex, the vectors towards its
  /// neighbours over all triangle edges and moves the vertex by
  /// `factor * sum / edge_count`. The progress sink is advanced once per
  /// iteration; cancelling stops after the current iteration.
  ///
  /// Returns the number of iterations applied. Vertex normals, if present,
  /// are recomputed afterwards.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "mesh::laplacian_smooth"))]
  pub fn laplacian_smooth(
    &mut self,
    iterations: u32,
    factor: f32,
    mut progress: Option<&mut dyn ProgressSink>,
  ) -> Result<u32> {
    if !factor.is_finite() || factor < 0.0 {
      return Err(Error::InvalidArgument("smoothing factor must be finite and non-negative"));
    }
    if self.is_empty() {
      return Err(Error::EmptyMesh);
    }
    self.validate()?;

    let count = self.vertices.len();
    let mut displacement: Vec<Vec3> = try_with_capacity(count, "smoothing displacements")?;
    let mut edges: Vec<u32> = try_with_capacity(count, "smoothing edge counts")?;
    displacement.resize(count, Vec3::ZERO);
    edges.resize(count, 0);

    if let Some(sink) = progress.as_mut() {
      sink.set_info("Laplacian smoothing");
      sink.start();
    }

    let mut applied = 0;
    for _ in 0..iterations {
      displacement.fill(Vec3::ZERO);
      edges.fill(0);

      for &[a, b, c] in &self.triangles {
        let (a, b, c) = (a as usize, b as usize, c as usize);
        let ab = self.vertices[b] - self.vertices[a];
        let ac = self.vertices[c] - self.vertices[a];
        let bc = self.vertices[c] - self.vertices[b];

        displacement[a] += ab + ac;
        displacement[b] += bc - ab;
        displacement[c] -= ac + bc;

        edges[a] += 2;
        edges[b] += 2;
        edges[c] += 2;
      }

      for ((p, d), &n) in self.vertices.iter_mut().zip(&displacement).zip(&edges) {
        if n != 0 {
          *p += *d * (factor / n as f32);
        }
      }
      applied += 1;

      if !progress::advance(&mut progress) {
        tracing::debug!(applied, iterations, "smoothing cancelled");
        break;
      }
    }

    if self.vertex_normals.is_some() {
      self.compute_vertex_normals()?;
    }
    Ok(applied)
  }
}

#[cfg(test)]
#[path = "smooth_test.rs"]
mod smooth_test;
