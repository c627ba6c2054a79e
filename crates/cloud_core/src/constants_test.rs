use super::*;

#[test]
fn test_code_fits_in_u64() {
  assert!(CODE_BITS < 64);
  assert_eq!(CODE_BITS, 63);
}

#[test]
fn test_level_shift_bounds() {
  assert_eq!(level_shift(MAX_OCTREE_LEVEL), 0);
  assert_eq!(level_shift(0), CODE_BITS);
  for level in 1..=MAX_OCTREE_LEVEL {
    assert_eq!(
      level_shift(level - 1) - level_shift(level),
      3,
      "Each level should consume 3 bits (level {})",
      level
    );
  }
}

#[test]
fn test_grid_resolution_is_power_of_two() {
  assert!(MAX_GRID_RESOLUTION.is_power_of_two());
  assert_eq!(MAX_GRID_RESOLUTION.trailing_zeros(), MAX_OCTREE_LEVEL as u32);
}

#[test]
fn test_precision_defaults() {
  assert!(DEFAULT_DRAWING_PRECISION >= MIN_DRAWING_PRECISION);
  assert_eq!(MIN_DRAWING_PRECISION, 4);
}
