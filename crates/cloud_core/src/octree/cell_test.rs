use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::*;

// =========================================================================
// CellKey identity
// =========================================================================

/// Equal keys must produce equal hashes (HashSet invariant).
#[test]
fn test_key_hash_consistency() {
  let a = CellKey::new(0o123, 3).unwrap();
  let b = CellKey::new(0o123, 3).unwrap();

  let hash = |k: &CellKey| {
    let mut hasher = DefaultHasher::new();
    k.hash(&mut hasher);
    hasher.finish()
  };

  assert_eq!(a, b);
  assert_eq!(hash(&a), hash(&b), "Equal keys must have equal hashes");
}

/// Same code at a different level is a different cell.
#[test]
fn test_level_is_part_of_identity() {
  let a = CellKey::new(1, 1).unwrap();
  let b = CellKey::new(1, 2).unwrap();
  assert_ne!(a, b);
}

#[test]
fn test_new_rejects_invalid_input() {
  assert!(matches!(
    CellKey::new(0, MAX_OCTREE_LEVEL + 1),
    Err(Error::InvalidLevel { .. })
  ));
  // Level 1 codes only have 3 bits.
  assert!(CellKey::new(8, 1).is_err());
  assert!(CellKey::new(7, 1).is_ok());
  assert!(CellKey::new(1, 0).is_err());
}

// =========================================================================
// Parent / child navigation
// =========================================================================

/// All 8 octants produce children whose grid position is parent * 2 + offset.
#[test]
fn test_child_positions() {
  let parent = CellKey::from_position(UVec3::new(3, 1, 2), 2).unwrap();
  for octant in 0..8u8 {
    let child = parent.child(octant).expect("level 2 has children");
    let offset = UVec3::new(
      (octant & 1) as u32,
      ((octant >> 1) & 1) as u32,
      ((octant >> 2) & 1) as u32,
    );
    assert_eq!(child.level(), 3);
    assert_eq!(child.position(), parent.position() * 2 + offset);
    assert_eq!(child.octant(), octant);
  }
  assert!(parent.child(8).is_none());
}

#[test]
fn test_parent_child_roundtrip() {
  let cell = CellKey::from_position(UVec3::new(5, 6, 7), 4).unwrap();
  for octant in 0..8 {
    assert_eq!(cell.child(octant).unwrap().parent(), Some(cell));
  }
}

#[test]
fn test_root_has_no_parent_and_deepest_has_no_child() {
  assert!(CellKey::ROOT.parent().is_none());
  let deepest = CellKey::from_point_code(12345, MAX_OCTREE_LEVEL).unwrap();
  assert!(deepest.child(0).is_none());
}

#[test]
fn test_contains() {
  let cell = CellKey::from_position(UVec3::new(1, 0, 1), 1).unwrap();
  let grandchild = cell.child(3).unwrap().child(6).unwrap();
  assert!(cell.contains(&grandchild));
  assert!(cell.contains(&cell));
  assert!(!grandchild.contains(&cell));
  assert!(CellKey::ROOT.contains(&grandchild));

  let sibling = CellKey::from_position(UVec3::new(0, 0, 1), 1).unwrap();
  assert!(!sibling.contains(&grandchild));
}

#[test]
fn test_from_position_rejects_outside_grid() {
  assert!(CellKey::from_position(UVec3::new(2, 0, 0), 1).is_err());
  assert!(CellKey::from_position(UVec3::new(1, 1, 1), 1).is_ok());
}
