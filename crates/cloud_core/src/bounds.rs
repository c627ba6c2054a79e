//! Axis-aligned bounding box shared by the octree and the mesh helpers.

use glam::Vec3;

/// Single-precision axis-aligned bounding box.
///
/// The octree keeps two of them: the tight box of the indexed points and the
/// cube enclosing it, which is what gets subdivided.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
	/// Minimum corner (inclusive).
	pub min: Vec3,
	/// Maximum corner (inclusive).
	pub max: Vec3,
}

impl BoundingBox {
	/// Create a new box from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: Vec3, max: Vec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"bounding box min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Create a new box from center and half-extents.
	pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
		Self {
			min: center - half_extents,
			max: center + half_extents,
		}
	}

	/// Tight box of a point sequence, `None` when it is empty.
	pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Option<Self> {
		let mut iter = points.into_iter();
		let first = iter.next()?;
		let (min, max) = iter.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
		Some(Self { min, max })
	}

	/// Smallest cube with the same center that contains this box.
	///
	/// A box that is flat on every axis becomes a unit cube so that cell sizes
	/// never vanish.
	pub fn cubified(&self) -> Self {
		let center = self.center();
		let mut side = self.size().max_element();
		if !(side > 0.0) {
			side = 1.0;
		}
		Self::from_center_half_extents(center, Vec3::splat(side * 0.5))
	}

	/// Inclusive containment test.
	#[inline]
	pub fn contains_point(&self, point: Vec3) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	/// Get the size of the box (max - min).
	#[inline]
	pub fn size(&self) -> Vec3 {
		self.max - self.min
	}

	/// Get the center of the box.
	#[inline]
	pub fn center(&self) -> Vec3 {
		(self.min + self.max) * 0.5
	}

	/// Both corners multiplied by `factor` (about the origin).
	#[inline]
	pub fn scaled(&self, factor: f32) -> Self {
		let (a, b) = (self.min * factor, self.max * factor);
		Self {
			min: a.min(b),
			max: a.max(b),
		}
	}

	/// Both corners moved by `offset`.
	#[inline]
	pub fn translated(&self, offset: Vec3) -> Self {
		Self {
			min: self.min + offset,
			max: self.max + offset,
		}
	}

	/// The eight corners, indexed by octant bits (bit 0 = +X, bit 1 = +Y, bit 2 = +Z).
	pub fn corners(&self) -> [Vec3; 8] {
		std::array::from_fn(|i| {
			Vec3::new(
				if i & 1 != 0 { self.max.x } else { self.min.x },
				if i & 2 != 0 { self.max.y } else { self.min.y },
				if i & 4 != 0 { self.max.z } else { self.min.z },
			)
		})
	}

	/// The twelve edges as segments between corners.
	pub fn edges(&self) -> [[Vec3; 2]; 12] {
		let c = self.corners();
		BOX_EDGES.map(|[a, b]| [c[a], c[b]])
	}
}

/// Corner pairs (octant indices) forming the edges of a box.
const BOX_EDGES: [[usize; 2]; 12] = [
	// along X
	[0, 1],
	[2, 3],
	[4, 5],
	[6, 7],
	// along Y
	[0, 2],
	[1, 3],
	[4, 6],
	[5, 7],
	// along Z
	[0, 4],
	[1, 5],
	[2, 6],
	[3, 7],
];
