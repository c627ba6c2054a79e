//! Renderer-independent octree display geometry.
//!
//! Three ways of showing one level of an octree:
//!
//! ```text
//!   Wire            12 edges per non-empty cell
//!   MeanPoints      one point per cell at the cell's gravity centre,
//!                   carrying the mean color, normal and scalar
//!   CubePrimitives  one shared cube mesh of the level's cell size plus
//!                   one instance (cell centre, mean attributes) per cell
//! ```
//!
//! Nothing here talks to a graphics API: the output is plain buffers that a
//! renderer uploads however it likes. [`OctreeDisplay`] keeps the last
//! geometry and rebuilds it only when the level or the display type changes.

use glam::Vec3;

use crate::cloud::{PointSource, Rgb};
use crate::error::{try_with_capacity, Error, Result};
use crate::fit::{gravity_center, Moments};
use crate::mesh::TriMesh;
use crate::normals::{NormalCode, NormalTable};
use crate::octree::Octree;
use crate::primitives::{Cuboid, Tessellate};
use crate::progress::ProgressSink;

/// How an octree level is shown.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum OctreeDisplayType {
  #[default]
  Wire,
  MeanPoints,
  CubePrimitives,
}

/// Representative point of a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MeanPoint {
  pub position: Vec3,
  pub color: Option<Rgb>,
  pub normal: Option<Vec3>,
  pub scalar: Option<f32>,
}

/// Placement and attributes of one cube.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeInstance {
  pub center: Vec3,
  pub color: Option<Rgb>,
  /// Mean cell normal; meant to shade every face of the instance.
  pub normal_code: Option<NormalCode>,
  pub scalar: Option<f32>,
}

/// One cube mesh, drawn once per instance.
#[derive(Clone, Debug, PartialEq)]
pub struct CubePrimitives {
  pub cube: TriMesh,
  pub instances: Vec<CubeInstance>,
}

/// Geometry for one display type.
#[derive(Clone, Debug, PartialEq)]
pub enum DisplayGeometry {
  Wire(Vec<[Vec3; 2]>),
  MeanPoints(Vec<MeanPoint>),
  CubePrimitives(CubePrimitives),
}

impl DisplayGeometry {
  pub fn display_type(&self) -> OctreeDisplayType {
    match self {
      DisplayGeometry::Wire(_) => OctreeDisplayType::Wire,
      DisplayGeometry::MeanPoints(_) => OctreeDisplayType::MeanPoints,
      DisplayGeometry::CubePrimitives(_) => OctreeDisplayType::CubePrimitives,
    }
  }
}

// =============================================================================
// Per-subset averages
// =============================================================================

/// Component-wise mean color, `None` without colors or points.
pub fn average_color<S: PointSource + ?Sized>(cloud: &S, indices: &[u32]) -> Option<Rgb> {
  if indices.is_empty() || !cloud.has_colors() {
    return None;
  }
  let mut sum = [0f64; 3];
  for &i in indices {
    let c = cloud.color(i as usize)?;
    for (s, v) in sum.iter_mut().zip(c) {
      *s += v as f64;
    }
  }
  let n = indices.len() as f64;
  Some(sum.map(|s| (s / n) as u8))
}

/// Normalized sum of the normals, `None` without normals or when they cancel.
pub fn average_normal<S: PointSource + ?Sized>(cloud: &S, indices: &[u32]) -> Option<Vec3> {
  if indices.is_empty() || !cloud.has_normals() {
    return None;
  }
  let mut sum = Vec3::ZERO;
  for &i in indices {
    sum += cloud.normal(i as usize)?;
  }
  sum.try_normalize()
}

/// Average normal insensitive to flipped normals.
///
/// Every normal is first oriented along a reference direction, the normal of
/// the subset's least-squares plane (or the first point's normal when no
/// plane can be fitted), then summed and normalized.
pub fn robust_average_normal<S: PointSource + ?Sized>(cloud: &S, indices: &[u32]) -> Option<Vec3> {
  if indices.is_empty() || !cloud.has_normals() {
    return None;
  }
  let reference = match Moments::from_indices(cloud, indices).plane() {
    Some(plane) => plane.normal.as_vec3(),
    None => cloud.normal(indices[0] as usize)?,
  };
  let mut sum = Vec3::ZERO;
  for &i in indices {
    let n = cloud.normal(i as usize)?;
    if n.dot(reference) < 0.0 {
      sum -= n;
    } else {
      sum += n;
    }
  }
  sum.try_normalize()
}

/// Mean of the scalar tags, skipping NaN; `None` without scalars.
pub fn average_scalar<S: PointSource + ?Sized>(cloud: &S, indices: &[u32]) -> Option<f32> {
  let (sum, count) = indices
    .iter()
    .filter_map(|&i| cloud.scalar(i as usize))
    .filter(|v| !v.is_nan())
    .fold((0f64, 0usize), |(s, n), v| (s + v as f64, n + 1));
  (count > 0).then(|| (sum / count as f64) as f32)
}

// =============================================================================
// Geometry builders
// =============================================================================

fn check_cloud<S: PointSource + ?Sized>(octree: &Octree, cloud: &S) -> Result<()> {
  if cloud.len() != octree.len() {
    return Err(Error::TopologyMismatch {
      what: "cloud size against octree",
      expected: octree.len(),
      actual: cloud.len(),
    });
  }
  Ok(())
}

/// Edges of every non-empty cell of `level`.
#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "display::wire"))]
pub fn wire_segments(octree: &Octree, level: u8) -> Result<Vec<[Vec3; 2]>> {
  let cells = octree.cell_count(level)?;
  let mut segments = try_with_capacity(cells * 12, "wire segments")?;
  for cell in octree.cells_at_level(level)? {
    segments.extend(octree.cell_bbox(cell.key).edges());
  }
  Ok(segments)
}

/// Gravity centre and mean attributes of every non-empty cell of `level`.
#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "display::mean_points"))]
pub fn mean_points<S: PointSource + ?Sized>(
  octree: &Octree,
  cloud: &S,
  level: u8,
  progress: Option<&mut dyn ProgressSink>,
) -> Result<Vec<MeanPoint>> {
  check_cloud(octree, cloud)?;
  let mut points = try_with_capacity(octree.cell_count(level)?, "mean points")?;
  octree.for_each_cell_at_level(
    level,
    |cell| {
      if let Some(position) = gravity_center(cloud, cell.indices) {
        points.push(MeanPoint {
          position,
          color: average_color(cloud, cell.indices),
          normal: average_normal(cloud, cell.indices),
          scalar: average_scalar(cloud, cell.indices),
        });
      }
      true
    },
    progress,
  )?;
  Ok(points)
}

/// A cube of the level's cell size and one instance per non-empty cell.
#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "display::cube_primitives"))]
pub fn cube_primitives<S: PointSource + ?Sized>(
  octree: &Octree,
  cloud: &S,
  level: u8,
  table: &NormalTable,
  progress: Option<&mut dyn ProgressSink>,
) -> Result<CubePrimitives> {
  check_cloud(octree, cloud)?;
  let size = octree.cell_size(level)?;
  if octree.is_empty() {
    return Ok(CubePrimitives {
      cube: TriMesh::new(),
      instances: Vec::new(),
    });
  }
  let cube = Cuboid::cube(size).tessellate(table)?;
  let mut instances = try_with_capacity(octree.cell_count(level)?, "cube instances")?;
  octree.for_each_cell_at_level(
    level,
    |cell| {
      instances.push(CubeInstance {
        center: octree.cell_center(cell.key),
        color: average_color(cloud, cell.indices),
        normal_code: average_normal(cloud, cell.indices).map(|n| table.encode(n)),
        scalar: average_scalar(cloud, cell.indices),
      });
      true
    },
    progress,
  )?;
  Ok(CubePrimitives { cube, instances })
}

// =============================================================================
// Cached display state
// =============================================================================

/// Displayed level, display type and the geometry last built for them.
#[derive(Clone, Debug, Default)]
pub struct OctreeDisplay {
  level: u8,
  display_type: OctreeDisplayType,
  geometry: Option<DisplayGeometry>,
}

impl OctreeDisplay {
  pub fn new(level: u8, display_type: OctreeDisplayType) -> Self {
    Self {
      level,
      display_type,
      geometry: None,
    }
  }

  pub fn level(&self) -> u8 {
    self.level
  }

  pub fn display_type(&self) -> OctreeDisplayType {
    self.display_type
  }

  pub fn set_level(&mut self, level: u8) {
    if level != self.level {
      self.level = level;
      self.geometry = None;
    }
  }

  pub fn set_display_type(&mut self, display_type: OctreeDisplayType) {
    if display_type != self.display_type {
      self.display_type = display_type;
      self.geometry = None;
    }
  }

  /// Force a rebuild on the next [`OctreeDisplay::geometry`] call (after the
  /// octree or the cloud changed).
  pub fn invalidate(&mut self) {
    self.geometry = None;
  }

  pub fn needs_refresh(&self) -> bool {
    self.geometry.is_none()
  }

  /// Geometry for the current settings, rebuilt only when stale.
  ///
  /// A failed rebuild leaves the display stale and returns the error.
  pub fn geometry<S: PointSource + ?Sized>(
    &mut self,
    octree: &Octree,
    cloud: &S,
    table: &NormalTable,
  ) -> Result<&DisplayGeometry> {
    let geometry = match self.geometry.take() {
      Some(geometry) => geometry,
      None => {
        let geometry = match self.display_type {
          OctreeDisplayType::Wire => DisplayGeometry::Wire(wire_segments(octree, self.level)?),
          OctreeDisplayType::MeanPoints => {
            DisplayGeometry::MeanPoints(mean_points(octree, cloud, self.level, None)?)
          }
          OctreeDisplayType::CubePrimitives => DisplayGeometry::CubePrimitives(cube_primitives(
            octree, cloud, self.level, table, None,
          )?),
        };
        tracing::debug!(level = self.level, kind = ?self.display_type, "octree display rebuilt");
        geometry
      }
    };
    Ok(self.geometry.insert(geometry))
  }
}

#[cfg(test)]
#[path = "display_test.rs"]
mod display_test;
