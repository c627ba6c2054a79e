use glam::{DVec3, Vec3};

use super::*;

fn grid_on_plane_z(z: f32, n: usize) -> Vec<Vec3> {
  let mut pts = Vec::new();
  for i in 0..n {
    for j in 0..n {
      pts.push(Vec3::new(i as f32, j as f32, z));
    }
  }
  pts
}

#[test]
fn test_empty_moments_have_no_centroid() {
  let m = Moments::new();
  assert!(m.is_empty());
  assert!(m.centroid().is_none());
  assert!(m.plane().is_none());
  assert_eq!(m.plane_rms(), 0.0);
}

#[test]
fn test_centroid_of_symmetric_set() {
  let pts = [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
  let m = Moments::from_points(&pts);
  assert_eq!(m.centroid(), Some(DVec3::ZERO));
}

#[test]
fn test_planar_points_have_zero_rms_and_z_normal() {
  let pts = grid_on_plane_z(3.0, 5);
  let fit = Moments::from_points(&pts).plane().expect("grid is planar");

  assert!(fit.rms < 1.0e-6, "rms = {}", fit.rms);
  assert!(
    (fit.normal.z.abs() - 1.0).abs() < 1.0e-9,
    "normal = {:?}",
    fit.normal
  );
  assert!((fit.centroid.z - 3.0).abs() < 1.0e-9);
}

#[test]
fn test_two_parallel_planes_rms_is_half_gap() {
  let mut pts = grid_on_plane_z(0.0, 6);
  pts.extend(grid_on_plane_z(2.0, 6));
  let fit = Moments::from_points(&pts).plane().unwrap();

  // Best plane is z = 1, every point is exactly 1 away.
  assert!((fit.rms - 1.0).abs() < 1.0e-6, "rms = {}", fit.rms);
}

#[test]
fn test_merge_matches_single_pass() {
  let a = grid_on_plane_z(0.0, 4);
  let b = grid_on_plane_z(1.0, 3);
  let mut all = a.clone();
  all.extend(b.iter().copied());

  let merged = Moments::from_points(&a).merged(&Moments::from_points(&b));
  let direct = Moments::from_points(&all);

  assert_eq!(merged.count(), direct.count());
  let (m, d) = (merged.plane().unwrap(), direct.plane().unwrap());
  assert!((m.rms - d.rms).abs() < 1.0e-9);
  assert!((m.centroid - d.centroid).length() < 1.0e-9);
}

#[test]
fn test_collinear_points_have_no_plane() {
  let pts: Vec<Vec3> = (0..10).map(|i| Vec3::new(i as f32, 0.0, 0.0)).collect();
  let m = Moments::from_points(&pts);
  assert!(m.plane().is_none());
  assert_eq!(m.plane_rms(), 0.0);
}

#[test]
fn test_variance_along_axis() {
  let pts = [Vec3::new(-1.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)];
  let m = Moments::from_points(&pts);
  assert!((m.variance_along(DVec3::X) - 1.0).abs() < 1.0e-12);
  assert!(m.variance_along(DVec3::Y).abs() < 1.0e-12);
}

#[test]
fn test_gravity_center_of_indices() {
  let pts = vec![Vec3::ZERO, Vec3::splat(2.0), Vec3::splat(100.0)];
  let g = gravity_center(&pts, &[0, 1]).unwrap();
  assert_eq!(g, Vec3::ONE);
}
