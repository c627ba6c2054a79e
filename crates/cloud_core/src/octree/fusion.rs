//! Cell fusion: grouping the cells of one level that sample the same smooth
//! surface.
//!
//! # Algorithm
//!
//! ```text
//!   leaves at `level` ──sort by population──> seeds
//!
//!   for each seed not yet grouped:
//!     open a group { seed }
//!     frontier = ungrouped neighbors of seed
//!     loop:
//!       pick candidate (closest to group centroid | discovery order)
//!       frontier empty: jump to the ungrouped leaf closest to the group
//!                       centroid, close the group if none or rejected
//!       accept if  rms(group ∪ cand)           <= max_rms
//!              and angle(n_source, n_cand)      <= max_angle
//!              and d / (h_group + h_cand) - 1   <= overlap_coef
//!       on accept: merge moments, push the candidate's ungrouped neighbors
//! ```
//!
//! The source of a candidate is the member it was discovered from, or for a
//! jump the member closest to it, so the angle bounds the bend between two
//! cells rather than the drift from the group's mean plane. The test is
//! skipped when either plane is undefined.
//!
//! Jumps let a group span cells that are not connected on the level grid; a
//! leaf rejected since the group last grew is never jumped to.
//!
//! Every candidate decision is one progress step. A cancelled run keeps every
//! group committed so far; cells never reached stay ungrouped.

use std::collections::VecDeque;

use glam::DVec3;
use tracing::{debug, warn};

use super::cell::CellKey;
use super::neighbors::adjacent_keys;
use super::tree::Octree;
use crate::cloud::PointSource;
use crate::error::{try_with_capacity, Error, Result};
use crate::fit::{Moments, PlaneFit};
use crate::progress::{self, ProgressSink};

/// Thresholds and traversal order of [`fuse_cells`].
#[derive(Clone, Debug, PartialEq)]
pub struct FusionParams {
  /// Level whose cells are fused.
  pub level: u8,
  /// Largest RMS distance of a group's points to its least-squares plane.
  pub max_rms: f64,
  /// Largest angle (degrees) between the plane normals of a candidate and the
  /// member it is reached from. Normals are unsigned, so 90 or more disables
  /// the test.
  pub max_angle_deg: f64,
  /// Tolerated relative gap between a group and a candidate.
  pub overlap_coef: f64,
  /// Grow each group towards the candidate nearest to its centroid first.
  pub closest_first: bool,
}

impl FusionParams {
  /// Thresholds that accept every merge.
  pub fn permissive(level: u8) -> Self {
    Self {
      level,
      max_rms: f64::INFINITY,
      max_angle_deg: 180.0,
      overlap_coef: f64::INFINITY,
      closest_first: true,
    }
  }

  pub fn with_level(mut self, level: u8) -> Self {
    self.level = level;
    self
  }

  pub fn with_max_rms(mut self, max_rms: f64) -> Self {
    self.max_rms = max_rms;
    self
  }

  pub fn with_max_angle_deg(mut self, max_angle_deg: f64) -> Self {
    self.max_angle_deg = max_angle_deg;
    self
  }

  pub fn with_overlap_coef(mut self, overlap_coef: f64) -> Self {
    self.overlap_coef = overlap_coef;
    self
  }

  pub fn with_closest_first(mut self, closest_first: bool) -> Self {
    self.closest_first = closest_first;
    self
  }

  pub fn validate(&self) -> Result<()> {
    if !(self.max_rms >= 0.0) {
      return Err(Error::InvalidArgument("max_rms must be non-negative"));
    }
    if !(self.max_angle_deg >= 0.0) {
      return Err(Error::InvalidArgument("max_angle_deg must be non-negative"));
    }
    if !(self.overlap_coef >= 0.0) {
      return Err(Error::InvalidArgument("overlap_coef must be non-negative"));
    }
    Ok(())
  }
}

impl Default for FusionParams {
  fn default() -> Self {
    Self {
      level: 6,
      max_rms: 0.01,
      max_angle_deg: 20.0,
      overlap_coef: 1.0,
      closest_first: true,
    }
  }
}

/// Per-point grouping produced by [`fuse_cells`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FusionResult {
  /// Group of every point (by original index), `None` if never reached.
  pub point_groups: Vec<Option<u32>>,
  /// Number of groups, ids are `0..group_count`.
  pub group_count: u32,
  /// The run was stopped by the progress sink.
  pub cancelled: bool,
}

impl FusionResult {
  /// Group ids as a scalar field, NaN for ungrouped points.
  pub fn to_scalar_field(&self) -> Vec<f32> {
    self
      .point_groups
      .iter()
      .map(|g| g.map_or(f32::NAN, |g| g as f32))
      .collect()
  }

  /// Number of points in each group.
  pub fn group_sizes(&self) -> Vec<usize> {
    let mut sizes = vec![0; self.group_count as usize];
    for g in self.point_groups.iter().flatten() {
      sizes[*g as usize] += 1;
    }
    sizes
  }
}

/// Statistics of one leaf at the fused level.
struct Leaf {
  key: CellKey,
  range: std::ops::Range<usize>,
  moments: Moments,
  centroid: DVec3,
  plane: Option<PlaneFit>,
}

/// Acceptance test state for one growing group.
struct Group {
  moments: Moments,
  centroid: DVec3,
}

impl Group {
  fn new(seed: &Leaf) -> Self {
    Self {
      moments: seed.moments,
      centroid: seed.centroid,
    }
  }

  fn absorb(&mut self, leaf: &Leaf) {
    self.moments.merge(&leaf.moments);
    self.centroid = self.moments.centroid().unwrap_or(self.centroid);
  }
}

/// Thresholds in the form used by the acceptance test.
struct Criteria {
  max_rms: f64,
  min_abs_cos: f64,
  max_ratio: f64,
  min_spread: f64,
}

impl Criteria {
  fn new(params: &FusionParams, cell_size: f64) -> Self {
    let min_abs_cos = if params.max_angle_deg >= 90.0 {
      0.0
    } else {
      params.max_angle_deg.to_radians().cos()
    };
    Self {
      max_rms: params.max_rms,
      min_abs_cos,
      max_ratio: 1.0 + params.overlap_coef,
      min_spread: 0.5 * cell_size,
    }
  }

  fn accepts(&self, group: &Group, source: &Leaf, cand: &Leaf) -> bool {
    if self.max_rms.is_finite() && group.moments.merged(&cand.moments).plane_rms() > self.max_rms {
      return false;
    }

    if self.min_abs_cos > 0.0 {
      if let (Some(a), Some(b)) = (source.plane, cand.plane) {
        if a.normal.dot(b.normal).abs() < self.min_abs_cos {
          return false;
        }
      }
    }

    if self.max_ratio.is_finite() {
      let link = cand.centroid - group.centroid;
      let d = link.length();
      if d > 1.0e-12 {
        let dir = link / d;
        let spread = |m: &Moments| (3.0 * m.variance_along(dir)).sqrt().max(self.min_spread);
        let ratio = d / (spread(&group.moments) + spread(&cand.moments));
        if ratio > self.max_ratio {
          return false;
        }
      }
    }

    true
  }
}

/// Group the cells of `params.level` into smooth patches.
///
/// `cloud` must be the point set the octree was built from. Each candidate
/// decision advances `progress` once; on cancellation the grouping committed
/// so far is returned with `cancelled` set.
#[cfg_attr(feature = "profiling", tracing::instrument(skip_all, name = "octree::fuse_cells"))]
pub fn fuse_cells<S: PointSource + ?Sized>(
  octree: &Octree,
  cloud: &S,
  params: &FusionParams,
  mut progress: Option<&mut dyn ProgressSink>,
) -> Result<FusionResult> {
  params.validate()?;
  let cell_size = octree.cell_size(params.level)? as f64;
  if cloud.len() != octree.len() {
    return Err(Error::TopologyMismatch {
      what: "cloud size against octree",
      expected: octree.len(),
      actual: cloud.len(),
    });
  }

  let mut result = FusionResult::default();
  if octree.is_empty() {
    return Ok(result);
  }

  let leaves = collect_leaves(octree, cloud, params.level)?;
  let mut leaf_group: Vec<Option<u32>> = try_with_capacity(leaves.len(), "fusion leaf groups")?;
  leaf_group.resize(leaves.len(), None);
  // Group id + 1 of the frontier a leaf currently sits in, 0 when in none.
  let mut queued: Vec<u32> = try_with_capacity(leaves.len(), "fusion frontier marks")?;
  queued.resize(leaves.len(), 0);

  // Most populated cells first, ties in code order (leaves are code-sorted).
  let mut seeds: Vec<usize> = (0..leaves.len()).collect();
  seeds.sort_by_key(|&i| std::cmp::Reverse(leaves[i].range.len()));

  let criteria = Criteria::new(params, cell_size);

  let mut members: Vec<usize> = try_with_capacity(leaves.len(), "fusion group members")?;
  let mut ungrouped: Vec<usize> = try_with_capacity(leaves.len(), "fusion ungrouped leaves")?;
  ungrouped.extend(0..leaves.len());
  // Bumped when a group opens or grows; a leaf rejected at the current
  // generation is not offered again until the group changes.
  let mut generation: u64 = 0;
  let mut rejected_at: Vec<u64> = try_with_capacity(leaves.len(), "fusion rejection marks")?;
  rejected_at.resize(leaves.len(), 0);

  if let Some(sink) = progress.as_deref_mut() {
    sink.start();
    sink.set_info(&format!("Fusing cells at level {}", params.level));
  }

  // (candidate, member it was discovered from)
  let mut frontier: VecDeque<(usize, usize)> = VecDeque::new();
  let mut jumps = 0usize;
  'seeds: for seed in seeds {
    if leaf_group[seed].is_some() {
      continue;
    }
    let gid = result.group_count;
    result.group_count += 1;
    leaf_group[seed] = Some(gid);
    let mut group = Group::new(&leaves[seed]);
    generation += 1;
    members.clear();
    members.push(seed);

    frontier.clear();
    push_neighbors(&leaves, seed, &leaf_group, gid + 1, &mut frontier, &mut queued);

    loop {
      let (cand, source, jump) =
        match next_candidate(&mut frontier, &leaves, &group, params.closest_first) {
          Some((cand, source)) => (cand, source, false),
          None => {
            ungrouped.retain(|&i| leaf_group[i].is_none());
            let eligible = |i: usize| rejected_at[i] != generation;
            let Some(cand) = nearest_to(&leaves, &ungrouped, group.centroid, eligible) else {
              break;
            };
            let source =
              nearest_to(&leaves, &members, leaves[cand].centroid, |_| true).unwrap_or(seed);
            (cand, source, true)
          }
        };
      // Leaving the frontier: a later accepted neighbor may rediscover it.
      queued[cand] = 0;
      let accepted = criteria.accepts(&group, &leaves[source], &leaves[cand]);
      if accepted {
        leaf_group[cand] = Some(gid);
        group.absorb(&leaves[cand]);
        members.push(cand);
        generation += 1;
        jumps += jump as usize;
        push_neighbors(&leaves, cand, &leaf_group, gid + 1, &mut frontier, &mut queued);
      } else {
        rejected_at[cand] = generation;
      }
      if !progress::advance(&mut progress) {
        warn!(groups = result.group_count, "cell fusion cancelled");
        result.cancelled = true;
        break 'seeds;
      }
      if jump && !accepted {
        break;
      }
    }
  }

  result.point_groups = try_with_capacity(cloud.len(), "fusion point groups")?;
  result.point_groups.resize(cloud.len(), None);
  for (leaf, group) in leaves.iter().zip(&leaf_group) {
    if let Some(g) = *group {
      for &i in &octree.indices()[leaf.range.clone()] {
        result.point_groups[i as usize] = Some(g);
      }
    }
  }

  debug!(
    level = params.level,
    cells = leaves.len(),
    groups = result.group_count,
    jumps,
    cancelled = result.cancelled,
    "cell fusion done"
  );
  Ok(result)
}

fn collect_leaves<S: PointSource + ?Sized>(
  octree: &Octree,
  cloud: &S,
  level: u8,
) -> Result<Vec<Leaf>> {
  #[cfg(feature = "profiling")]
  let _span = tracing::info_span!("collect_leaves").entered();

  let mut leaves = try_with_capacity(octree.cell_count(level)?, "fusion leaves")?;
  for cell in octree.cells_at_level(level)? {
    let moments = Moments::from_indices(cloud, cell.indices);
    leaves.push(Leaf {
      key: cell.key,
      centroid: moments.centroid().unwrap_or(DVec3::ZERO),
      plane: moments.plane(),
      moments,
      range: cell.range,
    });
  }
  Ok(leaves)
}

/// Queue the ungrouped, not yet queued neighbors of leaf `from`.
fn push_neighbors(
  leaves: &[Leaf],
  from: usize,
  leaf_group: &[Option<u32>],
  mark: u32,
  frontier: &mut VecDeque<(usize, usize)>,
  queued: &mut [u32],
) {
  for key in adjacent_keys(leaves[from].key) {
    let Ok(n) = leaves.binary_search_by_key(&key.code(), |l| l.key.code()) else {
      continue;
    };
    if leaf_group[n].is_none() && queued[n] != mark {
      queued[n] = mark;
      frontier.push_back((n, from));
    }
  }
}

/// Remove and return the next (candidate, source) pair of the frontier.
fn next_candidate(
  frontier: &mut VecDeque<(usize, usize)>,
  leaves: &[Leaf],
  group: &Group,
  closest_first: bool,
) -> Option<(usize, usize)> {
  if !closest_first {
    return frontier.pop_front();
  }
  let distance = |i: usize| leaves[i].centroid.distance_squared(group.centroid);
  let slot = (0..frontier.len()).min_by(|&a, &b| {
    let (la, lb) = (frontier[a].0, frontier[b].0);
    distance(la)
      .total_cmp(&distance(lb))
      .then(leaves[la].key.code().cmp(&leaves[lb].key.code()))
  })?;
  frontier.remove(slot)
}

/// Leaf of `among` whose centroid is closest to `target`, lowest index on
/// ties.
fn nearest_to(
  leaves: &[Leaf],
  among: &[usize],
  target: DVec3,
  keep: impl Fn(usize) -> bool,
) -> Option<usize> {
  among
    .iter()
    .copied()
    .filter(|&i| keep(i))
    .min_by(|&a, &b| {
      let (da, db) = (
        leaves[a].centroid.distance_squared(target),
        leaves[b].centroid.distance_squared(target),
      );
      da.total_cmp(&db).then(a.cmp(&b))
    })
}

#[cfg(test)]
#[path = "fusion_test.rs"]
mod fusion_test;
