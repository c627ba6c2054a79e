use std::collections::HashMap;

use glam::Vec3;

use super::*;

/// Geometric normal of triangle `t`, not normalized.
pub(super) fn cross_normal(mesh: &TriMesh, [a, b, c]: [u32; 3]) -> Vec3 {
  let (pa, pb, pc) = (
    mesh.vertices[a as usize],
    mesh.vertices[b as usize],
    mesh.vertices[c as usize],
  );
  (pb - pa).cross(pc - pa)
}

/// Every directed edge is used once and matched by its reverse.
pub(super) fn assert_closed(mesh: &TriMesh) {
  let mut directed: HashMap<(u32, u32), usize> = HashMap::new();
  for &[a, b, c] in &mesh.triangles {
    for edge in [(a, b), (b, c), (c, a)] {
      *directed.entry(edge).or_default() += 1;
    }
  }
  for (&(a, b), &count) in &directed {
    assert_eq!(count, 1, "edge {a}->{b} used {count} times");
    assert_eq!(directed.get(&(b, a)), Some(&1), "edge {a}->{b} has no twin");
  }
}

/// Every triangle of a convex solid faces away from the vertex centroid.
pub(super) fn assert_outward(mesh: &TriMesh) {
  let inside = mesh.vertices.iter().copied().sum::<Vec3>() / mesh.vertex_count() as f32;
  for &t in &mesh.triangles {
    let centroid = t.iter().map(|&i| mesh.vertices[i as usize]).sum::<Vec3>() / 3.0;
    let n = cross_normal(mesh, t);
    assert!(n.dot(centroid - inside) > 0.0, "triangle {t:?} faces inward");
  }
}

/// Stored face normals agree with the winding of their triangles.
pub(super) fn assert_face_normals_match_winding(mesh: &TriMesh, table: &NormalTable) {
  for (index, &t) in mesh.triangles.iter().enumerate() {
    let geometric = cross_normal(mesh, t).normalize();
    for n in mesh.face_normal(index, table).unwrap() {
      assert!(n.dot(geometric) > 0.99, "triangle {t:?}: {n:?} vs {geometric:?}");
    }
  }
}

// =========================================================================
// Plane
// =========================================================================

#[test]
fn test_plane_is_two_triangles_facing_up() {
  let table = NormalTable::default();
  let mesh = Plane::new(2.0, 4.0).tessellate(&table).unwrap();
  assert_eq!(mesh.vertex_count(), 4);
  assert_eq!(mesh.triangle_count(), 2);
  assert_eq!(mesh.face_normals.as_ref().unwrap().codes.len(), 1);
  let bbox = mesh.bounding_box().unwrap();
  assert_eq!(bbox.min, Vec3::new(-1.0, -2.0, 0.0));
  assert_eq!(bbox.max, Vec3::new(1.0, 2.0, 0.0));
  assert_face_normals_match_winding(&mesh, &table);
  assert!(mesh.triangles.iter().all(|&t| cross_normal(&mesh, t).z > 0.0));
}

#[test]
fn test_plane_rejects_zero_extent() {
  let table = NormalTable::default();
  assert!(matches!(
    Plane::new(0.0, 1.0).tessellate(&table),
    Err(Error::DegenerateShape(_))
  ));
}

// =========================================================================
// Box
// =========================================================================

#[test]
fn test_box_has_24_vertices_and_12_triangles() {
  let table = NormalTable::default();
  for dims in [Vec3::ONE, Vec3::new(0.1, 5.0, 2.0), Vec3::splat(1.0e3)] {
    let mesh = Cuboid::new(dims).tessellate(&table).unwrap();
    assert_eq!(mesh.vertex_count(), 24);
    assert_eq!(mesh.triangle_count(), 12);
    assert_eq!(Cuboid::new(dims).counts().unwrap().vertices, 24);

    let bbox = mesh.bounding_box().unwrap();
    assert!((bbox.size() - dims).abs().max_element() < 1e-3 * dims.max_element());
    assert!(bbox.center().length() < 1e-3 * dims.max_element());
  }
}

#[test]
fn test_box_faces_point_outward() {
  let table = NormalTable::default();
  let mesh = Cuboid::new(Vec3::new(1.0, 2.0, 3.0)).tessellate(&table).unwrap();
  assert_outward(&mesh);
  assert_face_normals_match_winding(&mesh, &table);
  // One code per face direction.
  assert_eq!(mesh.face_normals.as_ref().unwrap().codes.len(), 6);
}

#[test]
fn test_box_faces_own_consecutive_vertex_quads() {
  let table = NormalTable::default();
  let dims = Vec3::new(2.0, 4.0, 6.0);
  let mesh = Cuboid::new(dims).tessellate(&table).unwrap();
  let faces = mesh.face_normals.as_ref().unwrap();

  for (face, pair) in mesh.triangles.chunks(2).enumerate() {
    let first = 4 * face as u32;
    assert_eq!(pair, &[[first, first + 1, first + 2], [first, first + 2, first + 3]]);
    assert_eq!(faces.indices[2 * face], faces.indices[2 * face + 1]);

    let slot = faces.indices[2 * face][0];
    let normal = table.decode(faces.codes[slot as usize]).unwrap();
    let half = (normal.abs() * dims * 0.5).element_sum();
    for v in &mesh.vertices[first as usize..first as usize + 4] {
      assert!((v.dot(normal) - half).abs() < 1e-3, "face {face}");
    }
  }
}

#[test]
fn test_box_rejects_flat_dims() {
  let table = NormalTable::default();
  let flat = Cuboid::new(Vec3::new(1.0, 0.0, 1.0));
  assert!(matches!(flat.tessellate(&table), Err(Error::DegenerateShape(_))));
  assert!(Cuboid::new(Vec3::new(1.0, f32::INFINITY, 1.0)).counts().is_err());
}

// =========================================================================
// Shape
// =========================================================================

#[test]
fn test_counts_match_tessellation() {
  let table = NormalTable::default();
  let shapes: [Shape; 5] = [
    Cone::new(1.0, 0.5, 2.0, 9).into(),
    Cone::new(0.0, 0.5, 2.0, 5).into(),
    Sphere::new(2.0, 7).into(),
    Plane::default().into(),
    Cuboid::cube(3.0).into(),
  ];
  for shape in shapes {
    let counts = shape.counts().unwrap();
    let mesh = shape.tessellate(&table).unwrap();
    assert_eq!(counts.vertices, mesh.vertex_count(), "{shape:?}");
    assert_eq!(counts.triangles, mesh.triangle_count(), "{shape:?}");
  }
}

#[test]
fn test_with_precision() {
  let shape = Shape::from(Sphere::new(1.0, 8));
  assert_eq!(shape.with_precision(12).unwrap().precision(), Some(12));
  assert!(matches!(
    shape.with_precision(3),
    Err(Error::PrecisionTooLow {
      precision: 3,
      minimum: 4
    })
  ));
  assert!(Shape::from(Cuboid::default()).with_precision(8).is_err());
}

#[test]
fn test_signature_tracks_parameters() {
  let a = Shape::from(Cone::cylinder(1.0, 2.0, 8));
  let b = Shape::from(Cone::new(1.0, 1.0, 2.0, 8));
  let c = Shape::from(Cone::cylinder(1.0, 2.0, 9));
  assert_eq!(a.signature(), b.signature());
  assert_ne!(a.signature(), c.signature());
  assert_ne!(
    Shape::from(Sphere::new(1.0, 8)).signature(),
    Shape::from(Cone::cylinder(1.0, 0.0, 8)).signature()
  );
}

#[test]
fn test_kind_names() {
  assert_eq!(Shape::from(Cone::cylinder(1.0, 1.0, 8)).kind_name(), "Cylinder");
  assert_eq!(Shape::from(Cone::default()).kind_name(), "Cone");
  assert_eq!(Shape::from(Cuboid::default()).kind_name(), "Box");
}
