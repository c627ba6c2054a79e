//! Placed, named primitives and mesh sharing between identical shapes.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Affine3A;

use super::{Shape, ShapeSignature, Tessellate};
use crate::error::Result;
use crate::mesh::TriMesh;
use crate::normals::NormalTable;

/// A shape, its placement in the world and its tessellated mesh.
///
/// The mesh is kept in the shape's local frame and always matches the
/// current parameters: every parameter change rebuilds it from scratch, and
/// a failed rebuild leaves both the parameters and the mesh untouched.
#[derive(Clone, Debug)]
pub struct GenericPrimitive {
  name: String,
  shape: Shape,
  transform: Affine3A,
  mesh: Arc<TriMesh>,
}

impl GenericPrimitive {
  /// Tessellate `shape` and wrap it, named after the shape kind.
  pub fn new(shape: impl Into<Shape>, table: &NormalTable) -> Result<Self> {
    let shape = shape.into();
    let mesh = Arc::new(shape.tessellate(table)?);
    Ok(Self {
      name: shape.kind_name().to_owned(),
      shape,
      transform: Affine3A::IDENTITY,
      mesh,
    })
  }

  /// Like [`GenericPrimitive::new`], sharing the mesh through `cache`.
  pub fn new_cached(
    shape: impl Into<Shape>,
    table: &NormalTable,
    cache: &mut PrimitiveCache,
  ) -> Result<Self> {
    let shape = shape.into();
    let mesh = cache.get_or_tessellate(&shape, table)?;
    Ok(Self {
      name: shape.kind_name().to_owned(),
      shape,
      transform: Affine3A::IDENTITY,
      mesh,
    })
  }

  pub fn with_name(mut self, name: impl Into<String>) -> Self {
    self.name = name.into();
    self
  }

  pub fn with_transform(mut self, transform: Affine3A) -> Self {
    self.transform = transform;
    self
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn shape(&self) -> &Shape {
    &self.shape
  }

  pub fn transform(&self) -> &Affine3A {
    &self.transform
  }

  /// Mesh in the local frame.
  pub fn mesh(&self) -> &Arc<TriMesh> {
    &self.mesh
  }

  pub fn signature(&self) -> ShapeSignature {
    self.shape.signature()
  }

  /// Replace the shape and rebuild the mesh.
  pub fn set_shape(&mut self, shape: impl Into<Shape>, table: &NormalTable) -> Result<()> {
    let shape = shape.into();
    let mesh = shape.tessellate(table).inspect_err(|e| {
      tracing::warn!(name = %self.name, error = %e, "primitive rebuild failed, keeping previous mesh");
    })?;
    self.shape = shape;
    self.mesh = Arc::new(mesh);
    Ok(())
  }

  /// Change the angular precision and rebuild the mesh.
  ///
  /// Setting the current precision again is a no-op.
  pub fn set_precision(&mut self, precision: u32, table: &NormalTable) -> Result<()> {
    if self.shape.precision() == Some(precision) {
      return Ok(());
    }
    let shape = self.shape.with_precision(precision)?;
    self.set_shape(shape, table)
  }

  pub fn set_transform(&mut self, transform: Affine3A) {
    self.transform = transform;
  }

  /// Independent copy rebuilt from the parameters.
  pub fn duplicate(&self, table: &NormalTable) -> Result<Self> {
    Ok(Self {
      name: self.name.clone(),
      shape: self.shape,
      transform: self.transform,
      mesh: Arc::new(self.shape.tessellate(table)?),
    })
  }

  /// Mesh with the placement applied.
  pub fn world_mesh(&self, table: &NormalTable) -> TriMesh {
    self.mesh.transformed(&self.transform, table)
  }
}

/// Shares one mesh between all shapes with the same parameters.
///
/// Entries are keyed by the shape signature and the normal table resolution,
/// since face normal codes depend on the table.
#[derive(Debug, Default)]
pub struct PrimitiveCache {
  meshes: HashMap<(ShapeSignature, u32), Arc<TriMesh>>,
  hits: u64,
}

impl PrimitiveCache {
  pub fn new() -> Self {
    Self::default()
  }

  /// Cached mesh for `shape`, tessellating it on first use.
  pub fn get_or_tessellate(&mut self, shape: &Shape, table: &NormalTable) -> Result<Arc<TriMesh>> {
    let key = (shape.signature(), table.bits());
    if let Some(mesh) = self.meshes.get(&key) {
      self.hits += 1;
      return Ok(Arc::clone(mesh));
    }
    let mesh = Arc::new(shape.tessellate(table)?);
    self.meshes.insert(key, Arc::clone(&mesh));
    Ok(mesh)
  }

  /// Number of lookups answered without tessellating.
  pub fn hits(&self) -> u64 {
    self.hits
  }

  pub fn len(&self) -> usize {
    self.meshes.len()
  }

  pub fn is_empty(&self) -> bool {
    self.meshes.is_empty()
  }

  /// Drop meshes no primitive uses anymore.
  pub fn purge_unused(&mut self) {
    self.meshes.retain(|_, mesh| Arc::strong_count(mesh) > 1);
  }

  pub fn clear(&mut self) {
    self.meshes.clear();
  }
}

#[cfg(test)]
#[path = "generic_test.rs"]
mod generic_test;
