//! The octree itself: a sorted table of full-depth cell codes.
//!
//! ```text
//!   points ──quantize──> (x, y, z) ∈ [0, 2^21)³ ──interleave──> code
//!
//!   codes:   [ c0  c1  c1' c2  c3  c3' c3'' ... ]   sorted ascending
//!   indices: [ i0  i1  i1' i2  i3  i3' i3'' ... ]   point index per code
//!              └┘  └─────┘ └┘  └─────────┘
//!               cells at some level L: runs sharing `code >> 3*(21-L)`
//! ```
//!
//! No tree node is ever stored. A cell at any level is a contiguous run of
//! the sorted arrays, found by linear grouping (enumeration) or by binary
//! search on the truncated code (lookup).

use std::iter::FusedIterator;
use std::ops::Range;

use glam::{DVec3, Vec3};
use tracing::{debug, error, warn};

use super::cell::{CellKey, OctreeCell};
use super::config::OctreeConfig;
use super::morton::{self, CellCode};
use crate::bounds::BoundingBox;
use crate::cloud::PointSource;
use crate::constants::{level_shift, MAX_GRID_RESOLUTION, MAX_OCTREE_LEVEL};
use crate::error::{try_with_capacity, Error, Result};
use crate::progress::{self, NormalizedProgress, ProgressSink};

const LEVEL_COUNT: usize = MAX_OCTREE_LEVEL as usize + 1;

/// Hierarchical cubic partition of a point set.
///
/// Built once from a [`PointSource`] and queried by level. The octree does not
/// keep the cloud: it only stores point indices, so queries needing
/// coordinates take the cloud again.
#[derive(Clone, Debug)]
pub struct Octree {
  /// Full-depth codes, sorted ascending (ties by point index).
  codes: Vec<CellCode>,
  /// Point index for each entry of `codes`.
  indices: Vec<u32>,
  /// Number of non-empty cells per level.
  cell_counts: [usize; LEVEL_COUNT],
  /// Side length of a cell per level.
  cell_sizes: [f64; LEVEL_COUNT],
  /// Grid origin (`cube.min`), kept in double precision: codes and cell
  /// limits are both derived from it with the same arithmetic.
  origin: DVec3,
  /// Cube subdivided by the tree.
  cube: BoundingBox,
  /// Tight box of the indexed points.
  points_box: BoundingBox,
  max_level: u8,
}

impl Default for Octree {
  fn default() -> Self {
    Self::new()
  }
}

impl Octree {
  /// An empty octree. Every query on it returns an empty result.
  pub fn new() -> Self {
    let origin = BoundingBox::new(Vec3::ZERO, Vec3::ZERO);
    Self {
      codes: Vec::new(),
      indices: Vec::new(),
      cell_counts: [0; LEVEL_COUNT],
      cell_sizes: [0.0; LEVEL_COUNT],
      origin: DVec3::ZERO,
      cube: origin,
      points_box: origin,
      max_level: MAX_OCTREE_LEVEL,
    }
  }

  /// Build the octree over every point of `cloud`.
  ///
  /// Fails on an empty or non-finite point set, on allocation failure, and
  /// when `progress` requests cancellation (checked once per
  /// `config.progress_batch` points). Nothing is published on failure.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "octree::build"))]
  pub fn build<S: PointSource + ?Sized>(
    cloud: &S,
    config: &OctreeConfig,
    mut progress: Option<&mut dyn ProgressSink>,
  ) -> Result<Self> {
    config.validate()?;

    let count = cloud.len();
    if count == 0 {
      error!("cannot build an octree over an empty point set");
      return Err(Error::EmptyPointSet);
    }
    if count > u32::MAX as usize {
      error!(count, "point set too large for 32-bit point indices");
      return Err(Error::InvalidArgument("point count exceeds the 32-bit index range"));
    }

    let points_box = {
      #[cfg(feature = "profiling")]
      let _span = tracing::info_span!("bounds").entered();

      let mut min = cloud.point(0);
      let mut max = min;
      for i in 0..count {
        let p = cloud.point(i);
        if !p.is_finite() {
          error!(index = i, "point has non-finite coordinates");
          return Err(Error::InvalidArgument("point coordinates must be finite"));
        }
        min = min.min(p);
        max = max.max(p);
      }
      BoundingBox::new(min, max)
    };
    let cube = points_box.cubified();
    let origin = cube.min.as_dvec3();
    let cell_sizes = cell_size_table(cube.max.x as f64 - origin.x);

    if let Some(sink) = progress.as_deref_mut() {
      sink.start();
      sink.set_info("Computing cell codes");
    }

    let mut pairs: Vec<(CellCode, u32)> = try_with_capacity(count, "octree code table")
      .inspect_err(|e| error!("{e}"))?;
    {
      #[cfg(feature = "profiling")]
      let _span = tracing::info_span!("codes").entered();

      let step = cell_sizes[MAX_OCTREE_LEVEL as usize];
      for i in 0..count {
        pairs.push((quantize(cloud.point(i), origin, step), i as u32));
        if (i + 1) % config.progress_batch == 0 && !progress::advance(&mut progress) {
          warn!(coded = i + 1, total = count, "octree construction cancelled");
          return Err(Error::Cancelled);
        }
      }
    }

    {
      #[cfg(feature = "profiling")]
      let _span = tracing::info_span!("sort").entered();
      pairs.sort_unstable();
    }

    let mut codes = try_with_capacity(count, "octree sorted codes").inspect_err(|e| error!("{e}"))?;
    let mut indices =
      try_with_capacity(count, "octree sorted indices").inspect_err(|e| error!("{e}"))?;
    for (code, index) in pairs {
      codes.push(code);
      indices.push(index);
    }
    let cell_counts = count_cells(&codes);

    debug!(
      points = count,
      cube_side = cube.size().x,
      deepest_cells = cell_counts[MAX_OCTREE_LEVEL as usize],
      "octree built"
    );

    Ok(Self {
      codes,
      indices,
      cell_counts,
      cell_sizes,
      origin,
      cube,
      points_box,
      max_level: config.max_level,
    })
  }

  /// Drop every code and reset to the empty state.
  pub fn clear(&mut self) {
    *self = Self::new();
  }

  /// Number of indexed points.
  #[inline]
  pub fn len(&self) -> usize {
    self.codes.len()
  }

  #[inline]
  pub fn is_empty(&self) -> bool {
    self.codes.is_empty()
  }

  /// Deepest level accepted by level queries.
  #[inline]
  pub fn max_level(&self) -> u8 {
    self.max_level
  }

  /// Cube subdivided by the tree (`dim_min`, `dim_max`).
  #[inline]
  pub fn cube_box(&self) -> BoundingBox {
    self.cube
  }

  /// Tight box of the indexed points (`points_min`, `points_max`).
  #[inline]
  pub fn points_box(&self) -> BoundingBox {
    self.points_box
  }

  /// Sorted full-depth codes.
  #[inline]
  pub fn codes(&self) -> &[CellCode] {
    &self.codes
  }

  /// Point indices in code order.
  #[inline]
  pub fn indices(&self) -> &[u32] {
    &self.indices
  }

  fn check_level(&self, level: u8) -> Result<()> {
    if level > self.max_level {
      return Err(Error::InvalidLevel {
        level,
        max: self.max_level,
      });
    }
    Ok(())
  }

  /// Side length of the cells of `level`.
  pub fn cell_size(&self, level: u8) -> Result<f32> {
    self.check_level(level)?;
    Ok(self.cell_sizes[level as usize] as f32)
  }

  /// Number of non-empty cells at `level`.
  pub fn cell_count(&self, level: u8) -> Result<usize> {
    self.check_level(level)?;
    Ok(self.cell_counts[level as usize])
  }

  /// Full-depth code of an arbitrary position, clamped to the cube.
  ///
  /// `None` on an empty octree.
  pub fn point_code(&self, p: Vec3) -> Option<CellCode> {
    if self.is_empty() {
      return None;
    }
    Some(quantize(p, self.origin, self.cell_sizes[MAX_OCTREE_LEVEL as usize]))
  }

  /// Lazy enumeration of the non-empty cells of `level`, in code order.
  ///
  /// One pass over the sorted codes, so a full traversal is O(N).
  pub fn cells_at_level(&self, level: u8) -> Result<CellsAtLevel<'_>> {
    self.check_level(level)?;
    Ok(CellsAtLevel {
      codes: &self.codes,
      indices: &self.indices,
      level,
      shift: level_shift(level),
      pos: 0,
    })
  }

  /// Call `visitor` once per non-empty cell of `level`.
  ///
  /// The visitor returns `false` to stop early. `progress` is advanced once
  /// per cell (as a percentage) and cancellation yields `Error::Cancelled`.
  /// Returns the number of visited cells.
  #[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "octree::for_each_cell_at_level"))]
  pub fn for_each_cell_at_level<F>(
    &self,
    level: u8,
    mut visitor: F,
    progress: Option<&mut dyn ProgressSink>,
  ) -> Result<usize>
  where
    F: FnMut(&OctreeCell<'_>) -> bool,
  {
    let cells = self.cells_at_level(level)?;
    let mut visited = 0;

    let Some(sink) = progress else {
      for cell in cells {
        visited += 1;
        if !visitor(&cell) {
          break;
        }
      }
      return Ok(visited);
    };

    sink.start();
    sink.set_info(&format!("Octree level {level}"));
    let total = self.cell_counts[level as usize] as u64;
    let mut normalized = NormalizedProgress::new(sink, total);
    for cell in cells {
      visited += 1;
      if !visitor(&cell) {
        break;
      }
      if !normalized.one_step() {
        warn!(level, visited, "cell traversal cancelled");
        return Err(Error::Cancelled);
      }
    }
    Ok(visited)
  }

  /// Position of the run of `key` in the sorted arrays, `None` if the cell
  /// holds no point.
  pub fn cell_range(&self, key: CellKey) -> Option<Range<usize>> {
    if self.codes.is_empty() {
      return None;
    }
    let shift = level_shift(key.level());
    let start = self.codes.partition_point(|&c| (c >> shift) < key.code());
    let len = self.codes[start..].partition_point(|&c| (c >> shift) == key.code());
    (len > 0).then_some(start..start + len)
  }

  /// Borrowed view of a non-empty cell.
  pub fn cell_at(&self, key: CellKey) -> Option<OctreeCell<'_>> {
    let range = self.cell_range(key)?;
    Some(OctreeCell {
      key,
      indices: &self.indices[range.clone()],
      range,
    })
  }

  /// Min and max corners of a cell in double precision.
  fn cell_limits_f64(&self, key: CellKey) -> (DVec3, DVec3) {
    let size = self.cell_sizes[key.level() as usize];
    let min = self.origin + key.position().as_dvec3() * size;
    (min, min + DVec3::splat(size))
  }

  /// Min and max corners of a cell.
  pub fn cell_limits(&self, key: CellKey) -> (Vec3, Vec3) {
    let (min, max) = self.cell_limits_f64(key);
    (min.as_vec3(), max.as_vec3())
  }

  /// Centre of a cell, rounded once from double precision so that it maps
  /// back to the cell's own code.
  pub fn cell_center(&self, key: CellKey) -> Vec3 {
    let (min, max) = self.cell_limits_f64(key);
    ((min + max) * 0.5).as_vec3()
  }

  pub fn cell_bbox(&self, key: CellKey) -> BoundingBox {
    let (min, max) = self.cell_limits(key);
    BoundingBox::new(min, max)
  }

  /// For every point (by original index), the ordinal of its cell in the
  /// enumeration order of `level`.
  pub fn cell_index_scalar_field(&self, level: u8) -> Result<Vec<f32>> {
    let mut field = try_with_capacity(self.len(), "cell index field")?;
    field.resize(self.len(), f32::NAN);
    for (ordinal, cell) in self.cells_at_level(level)?.enumerate() {
      for &i in cell.indices {
        field[i as usize] = ordinal as f32;
      }
    }
    Ok(field)
  }

  /// Level whose mean population per non-empty cell is closest to
  /// `population`. Level 1 on an empty octree.
  pub fn best_level_for_population(&self, population: usize) -> u8 {
    if self.is_empty() {
      return 1;
    }
    let target = population.max(1) as f64;
    let mean = |level: u8| self.len() as f64 / self.cell_counts[level as usize] as f64;

    // Mean population only decreases with depth.
    let mut best = 1;
    let mut best_gap = f64::INFINITY;
    for level in 1..=self.max_level {
      let density = mean(level);
      let gap = (density - target).abs();
      if gap < best_gap {
        best = level;
        best_gap = gap;
      }
      if density < target {
        break;
      }
    }
    best
  }

  /// Uniformly rescale the tree (about the origin) without recomputing codes.
  ///
  /// Valid because a uniform positive scale preserves the relative position
  /// of every point inside the cube.
  pub fn multiply_bounding_box(&mut self, factor: f32) -> Result<()> {
    if !(factor.is_finite() && factor > 0.0) {
      return Err(Error::InvalidArgument("scale factor must be finite and positive"));
    }
    self.cube = self.cube.scaled(factor);
    self.points_box = self.points_box.scaled(factor);
    self.origin *= factor as f64;
    for size in &mut self.cell_sizes {
      *size *= factor as f64;
    }
    Ok(())
  }

  /// Translate the tree without recomputing codes.
  pub fn translate_bounding_box(&mut self, offset: Vec3) -> Result<()> {
    if !offset.is_finite() {
      return Err(Error::InvalidArgument("translation must be finite"));
    }
    self.cube = self.cube.translated(offset);
    self.points_box = self.points_box.translated(offset);
    self.origin += offset.as_dvec3();
    Ok(())
  }
}

/// Lazy iterator over the cells of one level.
///
/// Produced by [`Octree::cells_at_level`]; restarting requires a new call.
#[derive(Clone, Debug)]
pub struct CellsAtLevel<'a> {
  codes: &'a [CellCode],
  indices: &'a [u32],
  level: u8,
  shift: u32,
  pos: usize,
}

impl<'a> Iterator for CellsAtLevel<'a> {
  type Item = OctreeCell<'a>;

  fn next(&mut self) -> Option<Self::Item> {
    let start = self.pos;
    let first = *self.codes.get(start)?;
    let code = first >> self.shift;

    let mut end = start + 1;
    while end < self.codes.len() && (self.codes[end] >> self.shift) == code {
      end += 1;
    }
    self.pos = end;

    Some(OctreeCell {
      key: CellKey::from_parts(code, self.level),
      range: start..end,
      indices: &self.indices[start..end],
    })
  }

  fn size_hint(&self) -> (usize, Option<usize>) {
    let remaining = self.codes.len() - self.pos;
    ((remaining > 0) as usize, Some(remaining))
  }
}

impl FusedIterator for CellsAtLevel<'_> {}

/// Full-depth code of `p` on the grid anchored at `origin`.
///
/// Positions outside the cube are clamped to its border cells.
#[inline]
fn quantize(p: Vec3, origin: DVec3, step: f64) -> CellCode {
  let axis = |v: f32, o: f64| -> u32 {
    let t = ((v as f64 - o) / step).floor();
    t.clamp(0.0, (MAX_GRID_RESOLUTION - 1) as f64) as u32
  };
  morton::encode(glam::UVec3::new(
    axis(p.x, origin.x),
    axis(p.y, origin.y),
    axis(p.z, origin.z),
  ))
}

fn cell_size_table(side: f64) -> [f64; LEVEL_COUNT] {
  let mut sizes = [0.0; LEVEL_COUNT];
  for (level, size) in sizes.iter_mut().enumerate() {
    *size = side / (1u32 << level) as f64;
  }
  sizes
}

/// Non-empty cells per level of a sorted code array, in one pass.
fn count_cells(codes: &[CellCode]) -> [usize; LEVEL_COUNT] {
  let mut counts = [0; LEVEL_COUNT];
  if codes.is_empty() {
    return counts;
  }
  // splits[l]: number of adjacent code pairs first separated at level l
  let mut splits = [0usize; LEVEL_COUNT];
  for pair in codes.windows(2) {
    if let Some(level) = morton::divergence_level(pair[0], pair[1]) {
      splits[level as usize] += 1;
    }
  }
  let mut running = 1;
  for level in 0..LEVEL_COUNT {
    running += splits[level];
    counts[level] = running;
  }
  counts
}

#[cfg(test)]
#[path = "tree_test.rs"]
mod tree_test;
