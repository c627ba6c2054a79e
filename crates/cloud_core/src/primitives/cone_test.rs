use glam::Vec3;

use super::*;
use crate::primitives::mod_test::{assert_closed, assert_face_normals_match_winding, assert_outward};

/// Hexagonal cylinder: 2 poles + 2 rings of 6, 6 + 6 cap and 12 side triangles.
#[test]
fn test_hexagonal_cylinder_counts() {
  let table = NormalTable::default();
  let mesh = Cone::new(1.0, 1.0, 2.0, 6).tessellate(&table).unwrap();
  assert_eq!(mesh.vertex_count(), 14);
  assert_eq!(mesh.triangle_count(), 24);
  assert!(mesh.vertex_normals.is_none());
  // -Z, +Z and one code per side at most.
  assert!(mesh.face_normals.as_ref().unwrap().codes.len() <= 6 + 2);
}

#[test]
fn test_cylinder_is_closed_and_outward() {
  let table = NormalTable::default();
  let mesh = Cone::cylinder(1.5, 3.0, 16).tessellate(&table).unwrap();
  assert_eq!(mesh.vertex_count(), 2 + 2 * 16);
  assert_eq!(mesh.triangle_count(), 4 * 16);
  assert_closed(&mesh);
  assert_outward(&mesh);
  assert_face_normals_match_winding(&mesh, &table);
}

#[test]
fn test_apex_cone_collapses_top_ring() {
  let table = NormalTable::default();
  for n in [4, 7, 32] {
    let mesh = Cone::new(1.0, 0.0, 2.0, n).tessellate(&table).unwrap();
    assert_eq!(mesh.vertex_count(), 2 + n as usize);
    assert_eq!(mesh.triangle_count(), 2 * n as usize);
    assert_closed(&mesh);
    assert_face_normals_match_winding(&mesh, &table);
  }
}

#[test]
fn test_inverted_cone_collapses_bottom_ring() {
  let table = NormalTable::default();
  let mesh = Cone::new(0.0, 2.0, 1.0, 12).tessellate(&table).unwrap();
  assert_eq!(mesh.vertex_count(), 14);
  assert_eq!(mesh.triangle_count(), 24);
  assert_closed(&mesh);
  assert_face_normals_match_winding(&mesh, &table);
  // The bottom centre is the apex; the top cap faces up.
  assert_eq!(mesh.vertices[0], Vec3::new(0.0, 0.0, -0.5));
}

#[test]
fn test_truncated_skewed_cone() {
  let table = NormalTable::default();
  let cone = Cone::new(2.0, 0.5, 3.0, 10).with_offset(0.4, -0.2);
  let mesh = cone.tessellate(&table).unwrap();
  assert_eq!(mesh.vertices[0], cone.bottom_center());
  assert_eq!(mesh.vertices[1], cone.top_center());
  assert_eq!(cone.bottom_center(), Vec3::new(0.2, -0.1, -1.5));
  assert_eq!(cone.top_center(), Vec3::new(-0.2, 0.1, 1.5));
  assert_closed(&mesh);
  assert_outward(&mesh);
  assert_face_normals_match_winding(&mesh, &table);
}

/// Both triangles of a side quad carry the same normal slot.
#[test]
fn test_side_quads_are_faceted() {
  let table = NormalTable::default();
  let steps = 8;
  let mesh = Cone::cylinder(1.0, 1.0, steps).tessellate(&table).unwrap();
  let faces = mesh.face_normals.as_ref().unwrap();
  let sides = &faces.indices[2 * steps as usize..];
  for quad in sides.chunks(2) {
    assert_eq!(quad[0], quad[1]);
    assert_eq!(quad[0][0], quad[0][1]);
  }
}

#[test]
fn test_construction_normalizes_parameters() {
  let cone = Cone::new(-1.0, -0.5, -2.0, 2);
  assert_eq!(cone.bottom_radius, 1.0);
  assert_eq!(cone.top_radius, 0.5);
  assert_eq!(cone.height, 2.0);
  assert_eq!(cone.precision, 4);
}

#[test]
fn test_degenerate_cones_are_rejected() {
  let table = NormalTable::default();
  assert!(matches!(
    Cone::new(1.0, 1.0, 0.0, 8).tessellate(&table),
    Err(Error::DegenerateShape(_))
  ));
  assert!(matches!(
    Cone::new(0.0, 1.0e-9, 1.0, 8).tessellate(&table),
    Err(Error::DegenerateShape(_))
  ));
  let mut low = Cone::cylinder(1.0, 1.0, 8);
  low.precision = 3;
  assert!(matches!(
    low.tessellate(&table),
    Err(Error::PrecisionTooLow {
      precision: 3,
      minimum: 4
    })
  ));
  assert!(low.counts().is_err());
}

#[test]
fn test_tessellation_is_deterministic() {
  let table = NormalTable::default();
  let cone = Cone::new(1.0, 0.3, 2.0, 24);
  assert_eq!(cone.tessellate(&table).unwrap(), cone.tessellate(&table).unwrap());
}
