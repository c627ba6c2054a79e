//! Least-squares statistics over point subsets.
//!
//! [`Moments`] accumulates first and second order sums in double precision,
//! so two subsets can be merged in O(1) and the plane fit of their union is
//! obtained without revisiting a single point. This is what keeps cell
//! fusion linear in the number of merge decisions.

use glam::{DVec3, Vec3};
use nalgebra::{Matrix3, SymmetricEigen};

use crate::cloud::PointSource;

/// Running sums for a point subset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Moments {
  count: u64,
  sum: DVec3,
  /// xx, yy, zz, xy, xz, yz
  sum_sq: [f64; 6],
}

/// Least-squares plane through a subset.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaneFit {
  /// Unit normal (sign is arbitrary).
  pub normal: DVec3,
  /// Gravity center of the subset.
  pub centroid: DVec3,
  /// Root mean square distance of the points to the plane.
  pub rms: f64,
}

impl Moments {
  pub fn new() -> Self {
    Self::default()
  }

  /// Moments of the points `indices` of `cloud`.
  pub fn from_indices<S: PointSource + ?Sized>(cloud: &S, indices: &[u32]) -> Self {
    let mut moments = Self::new();
    for &i in indices {
      moments.add(cloud.point(i as usize));
    }
    moments
  }

  /// Moments of a slice of positions.
  pub fn from_points(points: &[Vec3]) -> Self {
    let mut moments = Self::new();
    for &p in points {
      moments.add(p);
    }
    moments
  }

  pub fn add(&mut self, p: Vec3) {
    let p = p.as_dvec3();
    self.count += 1;
    self.sum += p;
    self.sum_sq[0] += p.x * p.x;
    self.sum_sq[1] += p.y * p.y;
    self.sum_sq[2] += p.z * p.z;
    self.sum_sq[3] += p.x * p.y;
    self.sum_sq[4] += p.x * p.z;
    self.sum_sq[5] += p.y * p.z;
  }

  /// Accumulate another subset into this one.
  pub fn merge(&mut self, other: &Moments) {
    self.count += other.count;
    self.sum += other.sum;
    for (a, b) in self.sum_sq.iter_mut().zip(other.sum_sq.iter()) {
      *a += b;
    }
  }

  /// Moments of the union of both subsets.
  pub fn merged(&self, other: &Moments) -> Moments {
    let mut out = *self;
    out.merge(other);
    out
  }

  pub fn count(&self) -> u64 {
    self.count
  }

  pub fn is_empty(&self) -> bool {
    self.count == 0
  }

  /// Gravity center, `None` for an empty subset.
  pub fn centroid(&self) -> Option<DVec3> {
    if self.count == 0 {
      return None;
    }
    Some(self.sum / self.count as f64)
  }

  /// Population covariance matrix.
  pub fn covariance(&self) -> Option<Matrix3<f64>> {
    let c = self.centroid()?;
    let n = self.count as f64;
    let xx = self.sum_sq[0] / n - c.x * c.x;
    let yy = self.sum_sq[1] / n - c.y * c.y;
    let zz = self.sum_sq[2] / n - c.z * c.z;
    let xy = self.sum_sq[3] / n - c.x * c.y;
    let xz = self.sum_sq[4] / n - c.x * c.z;
    let yz = self.sum_sq[5] / n - c.y * c.z;
    Some(Matrix3::new(xx, xy, xz, xy, yy, yz, xz, yz, zz))
  }

  /// Variance of the subset projected on `dir` (expected unit length).
  pub fn variance_along(&self, dir: DVec3) -> f64 {
    let Some(cov) = self.covariance() else {
      return 0.0;
    };
    let d = nalgebra::Vector3::new(dir.x, dir.y, dir.z);
    (d.transpose() * cov * d)[(0, 0)].max(0.0)
  }

  /// Least-squares plane. Needs at least 3 points spanning more than a line.
  pub fn plane(&self) -> Option<PlaneFit> {
    if self.count < 3 {
      return None;
    }
    let centroid = self.centroid()?;
    let cov = self.covariance()?;
    let eigen = SymmetricEigen::new(cov);

    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| eigen.eigenvalues[a].total_cmp(&eigen.eigenvalues[b]));
    let smallest = order[0];
    let middle = order[1];

    // Collinear (or coincident) points: the plane is not defined.
    let scale = eigen.eigenvalues[order[2]].abs().max(f64::MIN_POSITIVE);
    if eigen.eigenvalues[middle].abs() <= scale * 1.0e-12 {
      return None;
    }

    let v = eigen.eigenvectors.column(smallest);
    let normal = DVec3::new(v[0], v[1], v[2]).normalize_or_zero();
    if normal == DVec3::ZERO {
      return None;
    }

    Some(PlaneFit {
      normal,
      centroid,
      rms: eigen.eigenvalues[smallest].max(0.0).sqrt(),
    })
  }

  /// RMS distance to the best plane, 0 when fewer than 3 points or when the
  /// points are collinear (any plane through the line fits exactly).
  pub fn plane_rms(&self) -> f64 {
    self.plane().map(|p| p.rms).unwrap_or(0.0)
  }
}

/// Gravity center of a subset of `cloud`.
pub fn gravity_center<S: PointSource + ?Sized>(cloud: &S, indices: &[u32]) -> Option<Vec3> {
  Moments::from_indices(cloud, indices)
    .centroid()
    .map(|c| c.as_vec3())
}

#[cfg(test)]
#[path = "fit_test.rs"]
mod fit_test;
