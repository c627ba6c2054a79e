use super::*;
use crate::primitives::mod_test::{assert_closed, assert_outward};

#[test]
fn test_sphere_counts() {
  let table = NormalTable::default();
  for s in [4u32, 5, 12, 24] {
    let mesh = Sphere::new(3.0, s).tessellate(&table).unwrap();
    let s = s as usize;
    assert_eq!(mesh.vertex_count(), 2 + s * (s - 1));
    assert_eq!(mesh.triangle_count(), s * ((s - 2) * 2 + 2));
  }
}

/// Unit normals equal to the normalized positions, whatever the radius.
#[test]
fn test_sphere_normals_are_radial() {
  let table = NormalTable::default();
  for radius in [0.5f32, 1.0, 40.0] {
    let mesh = Sphere::new(radius, 10).tessellate(&table).unwrap();
    let normals = mesh.vertex_normals.as_ref().unwrap();
    assert!(mesh.face_normals.is_none());
    for (p, n) in mesh.vertices.iter().zip(normals) {
      assert!((n.length() - 1.0).abs() < 1e-5);
      assert!((*n - p.normalize()).length() < 1e-5);
      assert!((p.length() - radius).abs() < 1e-4 * radius);
    }
  }
}

#[test]
fn test_sphere_is_closed_and_outward() {
  let table = NormalTable::default();
  let mesh = Sphere::new(1.0, 9).tessellate(&table).unwrap();
  assert_closed(&mesh);
  assert_outward(&mesh);
}

#[test]
fn test_poles_come_first() {
  let table = NormalTable::default();
  let mesh = Sphere::new(2.0, 6).tessellate(&table).unwrap();
  assert_eq!(mesh.vertices[0], Vec3::new(0.0, 0.0, 2.0));
  assert_eq!(mesh.vertices[1], Vec3::new(0.0, 0.0, -2.0));
}

#[test]
fn test_sphere_rejects_bad_parameters() {
  let table = NormalTable::default();
  assert!(matches!(
    Sphere::new(0.0, 8).tessellate(&table),
    Err(Error::DegenerateShape(_))
  ));
  let low = Sphere {
    radius: 1.0,
    precision: 2,
  };
  assert!(matches!(low.tessellate(&table), Err(Error::PrecisionTooLow { .. })));
  assert_eq!(Sphere::new(1.0, 1).precision, 4);
}
