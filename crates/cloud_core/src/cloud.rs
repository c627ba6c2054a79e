//! Point sources consumed by the octree and the fusion algorithm.
//!
//! The core never owns the cloud it indexes: every query that needs
//! coordinates takes a [`PointSource`] by reference.

use glam::Vec3;

use crate::error::{try_with_capacity, Result};

/// RGB color with 8 bits per component.
pub type Rgb = [u8; 3];

/// Read-only, indexed access to a point set.
pub trait PointSource {
  /// Number of points.
  fn len(&self) -> usize;

  /// Position of point `index`.
  fn point(&self, index: usize) -> Vec3;

  fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Per-point color, when the source carries colors.
  fn color(&self, _index: usize) -> Option<Rgb> {
    None
  }

  /// Per-point normal, when the source carries normals.
  fn normal(&self, _index: usize) -> Option<Vec3> {
    None
  }

  /// Per-point scalar tag (visibility, class, group id...).
  fn scalar(&self, _index: usize) -> Option<f32> {
    None
  }

  fn has_colors(&self) -> bool {
    false
  }

  fn has_normals(&self) -> bool {
    false
  }
}

impl PointSource for [Vec3] {
  fn len(&self) -> usize {
    <[Vec3]>::len(self)
  }

  #[inline]
  fn point(&self, index: usize) -> Vec3 {
    self[index]
  }
}

impl PointSource for Vec<Vec3> {
  fn len(&self) -> usize {
    Vec::len(self)
  }

  #[inline]
  fn point(&self, index: usize) -> Vec3 {
    self[index]
  }
}

/// Owned point cloud with optional per-point attributes.
///
/// Attribute arrays, when present, always have one entry per point.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PointCloud {
  points: Vec<Vec3>,
  colors: Option<Vec<Rgb>>,
  normals: Option<Vec<Vec3>>,
  scalars: Option<Vec<f32>>,
}

impl PointCloud {
  pub fn new() -> Self {
    Self::default()
  }

  /// Cloud with room for `capacity` points.
  pub fn with_capacity(capacity: usize) -> Result<Self> {
    Ok(Self {
      points: try_with_capacity(capacity, "point cloud coordinates")?,
      ..Self::default()
    })
  }

  pub fn from_points(points: Vec<Vec3>) -> Self {
    Self {
      points,
      ..Self::default()
    }
  }

  /// Attach colors. Returns `false` (and leaves the cloud untouched) when the
  /// count does not match the number of points.
  pub fn set_colors(&mut self, colors: Vec<Rgb>) -> bool {
    if colors.len() != self.points.len() {
      return false;
    }
    self.colors = Some(colors);
    true
  }

  /// Attach normals (same count rule as [`PointCloud::set_colors`]).
  pub fn set_normals(&mut self, normals: Vec<Vec3>) -> bool {
    if normals.len() != self.points.len() {
      return false;
    }
    self.normals = Some(normals);
    true
  }

  /// Attach a scalar field (same count rule as [`PointCloud::set_colors`]).
  pub fn set_scalars(&mut self, scalars: Vec<f32>) -> bool {
    if scalars.len() != self.points.len() {
      return false;
    }
    self.scalars = Some(scalars);
    true
  }

  pub fn push(&mut self, point: Vec3) {
    debug_assert!(
      self.colors.is_none() && self.normals.is_none() && self.scalars.is_none(),
      "push() is only valid before attributes are attached"
    );
    self.points.push(point);
  }

  pub fn points(&self) -> &[Vec3] {
    &self.points
  }

  pub fn scalars(&self) -> Option<&[f32]> {
    self.scalars.as_deref()
  }

  /// Uniformly scale coordinates around the origin.
  ///
  /// An octree built on this cloud stays valid after calling
  /// `Octree::multiply_bounding_box` with the same factor.
  pub fn scale(&mut self, factor: f32) {
    for p in &mut self.points {
      *p *= factor;
    }
  }

  /// Translate all coordinates.
  pub fn translate(&mut self, offset: Vec3) {
    for p in &mut self.points {
      *p += offset;
    }
  }
}

impl PointSource for PointCloud {
  fn len(&self) -> usize {
    self.points.len()
  }

  #[inline]
  fn point(&self, index: usize) -> Vec3 {
    self.points[index]
  }

  fn color(&self, index: usize) -> Option<Rgb> {
    self.colors.as_ref().map(|c| c[index])
  }

  fn normal(&self, index: usize) -> Option<Vec3> {
    self.normals.as_ref().map(|n| n[index])
  }

  fn scalar(&self, index: usize) -> Option<f32> {
    self.scalars.as_ref().map(|s| s[index])
  }

  fn has_colors(&self) -> bool {
    self.colors.is_some()
  }

  fn has_normals(&self) -> bool {
    self.normals.is_some()
  }
}
