use glam::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::progress::{CancelToken, StepLimit};

fn random_cloud(count: usize, seed: u64) -> Vec<Vec3> {
  let mut rng = StdRng::seed_from_u64(seed);
  (0..count)
    .map(|_| {
      Vec3::new(
        rng.random_range(-3.0..5.0),
        rng.random_range(0.0..1.0),
        rng.random_range(10.0..12.0),
      )
    })
    .collect()
}

fn unit_cube_corners() -> Vec<Vec3> {
  (0..8)
    .map(|i| {
      Vec3::new(
        (i & 1) as f32,
        ((i >> 1) & 1) as f32,
        ((i >> 2) & 1) as f32,
      )
    })
    .collect()
}

fn build(points: &[Vec3]) -> Octree {
  Octree::build(points, &OctreeConfig::default(), None).expect("octree builds")
}

// =========================================================================
// Construction
// =========================================================================

#[test]
fn test_empty_point_set_is_rejected() {
  let points: Vec<Vec3> = Vec::new();
  let result = Octree::build(&points, &OctreeConfig::default(), None);
  assert!(matches!(result, Err(Error::EmptyPointSet)));
}

#[test]
fn test_non_finite_point_is_rejected() {
  let points = vec![Vec3::ZERO, Vec3::new(f32::NAN, 0.0, 0.0)];
  let result = Octree::build(&points, &OctreeConfig::default(), None);
  assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[test]
fn test_bounding_boxes() {
  let points = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(4.0, 2.0, 1.0)];
  let octree = build(&points);

  assert_eq!(octree.points_box().min, Vec3::ZERO);
  assert_eq!(octree.points_box().max, Vec3::new(4.0, 2.0, 1.0));

  let cube = octree.cube_box();
  assert_eq!(cube.size(), Vec3::splat(4.0));
  assert_eq!(cube.center(), Vec3::new(2.0, 1.0, 0.5));
  assert_eq!(octree.cell_size(0).unwrap(), 4.0);
  assert_eq!(octree.cell_size(3).unwrap(), 0.5);
}

/// A single point still gets a non-degenerate cube.
#[test]
fn test_single_point() {
  let octree = build(&[Vec3::splat(7.0)]);
  assert_eq!(octree.len(), 1);
  assert_eq!(octree.cube_box().size(), Vec3::ONE);
  for level in 0..=MAX_OCTREE_LEVEL {
    assert_eq!(octree.cell_count(level).unwrap(), 1);
  }
}

#[test]
fn test_duplicate_points_are_ordered_by_index() {
  let points = vec![Vec3::ONE, Vec3::ZERO, Vec3::ONE, Vec3::ONE];
  let octree = build(&points);
  let top = octree
    .cells_at_level(1)
    .unwrap()
    .find(|c| c.len() == 3)
    .expect("three coincident points share a cell");
  assert_eq!(top.indices, &[0, 2, 3]);
}

#[test]
fn test_build_cancellation_publishes_nothing() {
  let points = random_cloud(100, 1);
  let config = OctreeConfig::default().with_progress_batch(10);
  let mut limit = StepLimit::new(3);
  let result = Octree::build(&points, &config, Some(&mut limit));
  assert!(matches!(result, Err(Error::Cancelled)));
}

#[test]
fn test_build_reports_progress_per_batch() {
  let points = random_cloud(100, 2);
  let config = OctreeConfig::default().with_progress_batch(10);
  let mut token = CancelToken::new();
  Octree::build(&points, &config, Some(&mut token)).unwrap();
  assert_eq!(token.steps(), 10);
}

// =========================================================================
// Level enumeration
// =========================================================================

/// Eight cube corners split into eight cells of one point at level 1.
#[test]
fn test_unit_cube_corners_at_level_one() {
  let points = unit_cube_corners();
  let octree = build(&points);

  let cells: Vec<_> = octree.cells_at_level(1).unwrap().collect();
  assert_eq!(cells.len(), 8);
  assert_eq!(octree.cell_count(1).unwrap(), 8);

  let mut codes: Vec<_> = cells.iter().map(|c| c.code()).collect();
  codes.dedup();
  assert_eq!(codes.len(), 8, "cells must be distinct");
  for cell in &cells {
    assert_eq!(cell.len(), 1);
    // Corner i has octant bits i.
    assert_eq!(cell.code(), cell.indices[0] as u64);
  }
}

#[test]
fn test_level_zero_holds_every_point() {
  let points = random_cloud(500, 3);
  let octree = build(&points);
  let cells: Vec<_> = octree.cells_at_level(0).unwrap().collect();
  assert_eq!(cells.len(), 1);
  assert_eq!(cells[0].len(), points.len());
  assert_eq!(cells[0].key, CellKey::ROOT);
}

/// Cells of any level partition the point set.
#[test]
fn test_every_level_partitions_the_points() {
  let points = random_cloud(2_000, 4);
  let octree = build(&points);

  for level in 0..=MAX_OCTREE_LEVEL {
    let mut seen = vec![0u32; points.len()];
    let mut cells = 0;
    for cell in octree.cells_at_level(level).unwrap() {
      cells += 1;
      assert!(!cell.is_empty());
      for &i in cell.indices {
        seen[i as usize] += 1;
      }
    }
    assert!(
      seen.iter().all(|&n| n == 1),
      "level {level}: some point is missing or duplicated"
    );
    assert_eq!(cells, octree.cell_count(level).unwrap(), "level {level}");
  }
}

#[test]
fn test_cell_counts_grow_with_depth() {
  let points = random_cloud(1_000, 5);
  let octree = build(&points);
  let mut previous = 0;
  for level in 0..=MAX_OCTREE_LEVEL {
    let count = octree.cell_count(level).unwrap();
    assert!(count >= previous);
    assert!(count <= points.len());
    previous = count;
  }
}

#[test]
fn test_levels_beyond_max_are_rejected() {
  let points = random_cloud(10, 6);
  let octree =
    Octree::build(&points, &OctreeConfig::default().with_max_level(4), None).unwrap();
  assert!(octree.cells_at_level(4).is_ok());
  assert!(matches!(
    octree.cells_at_level(5),
    Err(Error::InvalidLevel { level: 5, max: 4 })
  ));
  assert!(octree.cell_count(5).is_err());
}

#[test]
fn test_for_each_visits_every_cell_and_can_stop() {
  let points = random_cloud(300, 7);
  let octree = build(&points);
  let expected = octree.cell_count(3).unwrap();

  let mut total_points = 0;
  let visited = octree
    .for_each_cell_at_level(
      3,
      |cell| {
        total_points += cell.len();
        true
      },
      None,
    )
    .unwrap();
  assert_eq!(visited, expected);
  assert_eq!(total_points, points.len());

  let visited = octree.for_each_cell_at_level(3, |_| false, None).unwrap();
  assert_eq!(visited, 1);
}

#[test]
fn test_for_each_honours_cancellation() {
  let octree = build(&unit_cube_corners());
  let mut limit = StepLimit::new(0);
  let result = octree.for_each_cell_at_level(1, |_| true, Some(&mut limit));
  assert!(matches!(result, Err(Error::Cancelled)));
}

// =========================================================================
// Lookup and geometry
// =========================================================================

#[test]
fn test_cell_range_matches_enumeration() {
  let points = random_cloud(400, 8);
  let octree = build(&points);
  for cell in octree.cells_at_level(4).unwrap() {
    assert_eq!(octree.cell_range(cell.key), Some(cell.range.clone()));
    assert_eq!(octree.cell_at(cell.key).as_ref(), Some(&cell));
  }
}

#[test]
fn test_cell_range_of_empty_cell() {
  // Two opposite corners: the other six level-1 cells are empty.
  let octree = build(&[Vec3::ZERO, Vec3::ONE]);
  let empty = CellKey::new(0b010, 1).unwrap();
  assert!(octree.cell_range(empty).is_none());
  assert!(octree.cell_at(empty).is_none());
}

/// Points inside the limits of a cell map back to that cell's code.
#[test]
fn test_cell_limits_roundtrip() {
  let points = random_cloud(300, 9);
  let octree = build(&points);

  for level in [1u8, 4, 9, 15] {
    for cell in octree.cells_at_level(level).unwrap() {
      let (min, max) = octree.cell_limits(cell.key);
      for t in [0.25f32, 0.5, 0.75] {
        let p = min + (max - min) * t;
        let code = octree.point_code(p).unwrap();
        assert_eq!(morton::truncate(code, level), cell.code(), "level {level}");
      }
      assert!(octree.cell_bbox(cell.key).contains_point(octree.cell_center(cell.key)));
    }
  }
}

#[test]
fn test_deep_cell_centers_map_back_far_from_origin() {
  let offset = Vec3::splat(1000.0);
  let points: Vec<Vec3> = random_cloud(300, 9).into_iter().map(|p| p + offset).collect();
  let octree = build(&points);

  for level in [15u8, 18, 19, 20, 21] {
    for cell in octree.cells_at_level(level).unwrap() {
      let center = octree.cell_center(cell.key);
      let code = octree.point_code(center).unwrap();
      assert_eq!(morton::truncate(code, level), cell.code(), "level {level}");
      assert!(octree.cell_bbox(cell.key).contains_point(center), "level {level}");
    }
  }
}

#[test]
fn test_cell_members_lie_inside_limits() {
  let points = random_cloud(300, 10);
  let octree = build(&points);
  for cell in octree.cells_at_level(6).unwrap() {
    let (min, max) = octree.cell_limits(cell.key);
    let slack = Vec3::splat(1.0e-5);
    for &i in cell.indices {
      let p = points[i as usize];
      assert!(p.cmpge(min - slack).all() && p.cmple(max + slack).all());
    }
  }
}

#[test]
fn test_cell_index_scalar_field() {
  let points = unit_cube_corners();
  let octree = build(&points);
  let field = octree.cell_index_scalar_field(1).unwrap();
  // Corner i sits in the i-th cell of the code order.
  let expected: Vec<f32> = (0..8).map(|i| i as f32).collect();
  assert_eq!(field, expected);

  let coarse = octree.cell_index_scalar_field(0).unwrap();
  assert!(coarse.iter().all(|&v| v == 0.0));
}

#[test]
fn test_best_level_for_population() {
  let points = random_cloud(4_096, 11);
  let octree = build(&points);
  let level = octree.best_level_for_population(8);
  let mean = points.len() as f64 / octree.cell_count(level).unwrap() as f64;
  assert!((2.0..=32.0).contains(&mean), "level {level}, mean {mean}");
}

// =========================================================================
// Mutation without rebuild
// =========================================================================

#[test]
fn test_scale_roundtrip_is_exact_for_powers_of_two() {
  let points = random_cloud(100, 12);
  let mut octree = build(&points);
  let (cube, tight, size) = (
    octree.cube_box(),
    octree.points_box(),
    octree.cell_size(7).unwrap(),
  );

  octree.multiply_bounding_box(4.0).unwrap();
  assert_eq!(octree.cell_size(7).unwrap(), size * 4.0);
  octree.multiply_bounding_box(0.25).unwrap();

  assert_eq!(octree.cube_box(), cube);
  assert_eq!(octree.points_box(), tight);
  assert_eq!(octree.cell_size(7).unwrap(), size);
}

#[test]
fn test_scale_roundtrip_within_float_tolerance() {
  let points = random_cloud(100, 13);
  let mut octree = build(&points);
  let cube = octree.cube_box();

  octree.multiply_bounding_box(3.0).unwrap();
  octree.multiply_bounding_box(1.0 / 3.0).unwrap();

  assert!((octree.cube_box().min - cube.min).abs().max_element() < 1.0e-5);
  assert!((octree.cube_box().max - cube.max).abs().max_element() < 1.0e-5);
}

#[test]
fn test_scale_keeps_codes_consistent() {
  let points = random_cloud(200, 14);
  let mut octree = build(&points);
  octree.multiply_bounding_box(2.0).unwrap();

  for cell in octree.cells_at_level(5).unwrap() {
    let scaled_center = octree.cell_center(cell.key);
    let code = octree.point_code(scaled_center).unwrap();
    assert_eq!(morton::truncate(code, 5), cell.code());
  }
}

#[test]
fn test_translate_roundtrip() {
  let points = unit_cube_corners();
  let mut octree = build(&points);
  let (cube, tight) = (octree.cube_box(), octree.points_box());
  let offset = Vec3::new(8.0, -4.0, 0.5);

  octree.translate_bounding_box(offset).unwrap();
  assert_eq!(octree.cube_box().min, cube.min + offset);
  let key = CellKey::new(0b111, 1).unwrap();
  assert_eq!(octree.cell_limits(key).0, Vec3::splat(0.5) + offset);

  octree.translate_bounding_box(-offset).unwrap();
  assert_eq!(octree.cube_box(), cube);
  assert_eq!(octree.points_box(), tight);
}

#[test]
fn test_invalid_transforms_are_rejected() {
  let mut octree = build(&unit_cube_corners());
  assert!(octree.multiply_bounding_box(0.0).is_err());
  assert!(octree.multiply_bounding_box(-2.0).is_err());
  assert!(octree.multiply_bounding_box(f32::NAN).is_err());
  assert!(octree
    .translate_bounding_box(Vec3::new(f32::INFINITY, 0.0, 0.0))
    .is_err());
  assert_eq!(octree.cube_box().size(), Vec3::ONE);
}

// =========================================================================
// Empty tree
// =========================================================================

#[test]
fn test_queries_on_empty_tree_are_empty() {
  let mut octree = build(&unit_cube_corners());
  octree.clear();

  assert!(octree.is_empty());
  assert_eq!(octree.cells_at_level(3).unwrap().count(), 0);
  assert_eq!(octree.cell_count(3).unwrap(), 0);
  assert!(octree.point_code(Vec3::ZERO).is_none());
  assert!(octree.cell_range(CellKey::ROOT).is_none());
  assert!(octree.cell_index_scalar_field(2).unwrap().is_empty());
  assert_eq!(
    octree.for_each_cell_at_level(2, |_| true, None).unwrap(),
    0
  );
}
