//! Axis-aligned bounding box with double precision.

use glam::DVec3;

use crate::constants::{SMALL, VSMALL};

/// Double-precision axis-aligned bounding box.
///
/// Used for octree cube extents, the root box, refinement regions and facet
/// bounds. Boxes are closed: points on the boundary are contained.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundBox {
	/// Minimum corner (inclusive).
	pub min: DVec3,
	/// Maximum corner (inclusive).
	pub max: DVec3,
}

impl BoundBox {
	/// Create a new box from min and max corners.
	///
	/// # Panics
	/// Debug-asserts that min <= max on all axes.
	pub fn new(min: DVec3, max: DVec3) -> Self {
		debug_assert!(
			min.x <= max.x && min.y <= max.y && min.z <= max.z,
			"BoundBox min must be <= max on all axes"
		);
		Self { min, max }
	}

	/// Create a new box from center and half-extents.
	pub fn from_center_half_extents(center: DVec3, half_extents: DVec3) -> Self {
		Self {
			min: center - half_extents,
			max: center + half_extents,
		}
	}

	/// Smallest box containing every point, or `None` for an empty iterator.
	pub fn from_points<I>(points: I) -> Option<Self>
	where
		I: IntoIterator<Item = DVec3>,
	{
		let mut iter = points.into_iter();
		let first = iter.next()?;
		let (min, max) = iter.fold((first, first), |(min, max), p| (min.min(p), max.max(p)));
		Some(Self { min, max })
	}

	/// Check if this box overlaps with another.
	///
	/// Two boxes overlap if they share any interior or boundary points.
	#[inline]
	pub fn overlaps(&self, other: &BoundBox) -> bool {
		self.min.x <= other.max.x
			&& self.max.x >= other.min.x
			&& self.min.y <= other.max.y
			&& self.max.y >= other.min.y
			&& self.min.z <= other.max.z
			&& self.max.z >= other.min.z
	}

	/// Check if this box contains a point.
	#[inline]
	pub fn contains_point(&self, point: DVec3) -> bool {
		point.x >= self.min.x
			&& point.x <= self.max.x
			&& point.y >= self.min.y
			&& point.y <= self.max.y
			&& point.z >= self.min.z
			&& point.z <= self.max.z
	}

	/// Check if `other` lies entirely inside this box.
	#[inline]
	pub fn contains_box(&self, other: &BoundBox) -> bool {
		self.contains_point(other.min) && self.contains_point(other.max)
	}

	/// Check if `point` lies strictly inside, away from every face.
	#[inline]
	pub fn strictly_contains_point(&self, point: DVec3) -> bool {
		point.cmpgt(self.min).all() && point.cmplt(self.max).all()
	}

	/// Get the size of the box (max - min).
	#[inline]
	pub fn size(&self) -> DVec3 {
		self.max - self.min
	}

	/// Largest extent over the three axes.
	#[inline]
	pub fn span(&self) -> f64 {
		self.size().max_element()
	}

	/// Get the center of the box.
	#[inline]
	pub fn center(&self) -> DVec3 {
		(self.min + self.max) * 0.5
	}

	/// Box volume.
	#[inline]
	pub fn volume(&self) -> f64 {
		let size = self.size();
		size.x * size.y * size.z
	}

	/// Check whether the three extents agree within a relative tolerance.
	pub fn is_cube(&self) -> bool {
		let size = self.size();
		let span = size.max_element();
		span > VSMALL && (span - size.min_element()) <= 1.0e-9 * span
	}

	/// Box grown by `amount` on every side.
	#[inline]
	pub fn inflated(&self, amount: f64) -> Self {
		Self {
			min: self.min - DVec3::splat(amount),
			max: self.max + DVec3::splat(amount),
		}
	}

	/// Squared distance from `point` to the box (zero inside).
	#[inline]
	pub fn distance_squared_to_point(&self, point: DVec3) -> f64 {
		let clamped = point.clamp(self.min, self.max);
		clamped.distance_squared(point)
	}

	/// The 8 corners in octant bit order (bit 0 = +x, bit 1 = +y, bit 2 = +z).
	pub fn corners(&self) -> [DVec3; 8] {
		std::array::from_fn(|octant| {
			DVec3::new(
				if octant & 1 == 0 { self.min.x } else { self.max.x },
				if octant & 2 == 0 { self.min.y } else { self.max.y },
				if octant & 4 == 0 { self.min.z } else { self.max.z },
			)
		})
	}

	/// The 12 box edges as corner pairs.
	pub fn edges(&self) -> [(DVec3, DVec3); 12] {
		const EDGE_CORNERS: [(usize, usize); 12] = [
			(0, 1),
			(2, 3),
			(4, 5),
			(6, 7),
			(0, 2),
			(1, 3),
			(4, 6),
			(5, 7),
			(0, 4),
			(1, 5),
			(2, 6),
			(3, 7),
		];
		let corners = self.corners();
		EDGE_CORNERS.map(|(a, b)| (corners[a], corners[b]))
	}
}

/// Slab test between the segment `s`-`e` and a box.
///
/// A zero-length segment degenerates to a containment test. The parameter
/// window starts at `[-SMALL, 1 + SMALL]` so segments ending exactly on a face
/// are not lost to rounding.
pub fn bound_box_line_intersection(s: DVec3, e: DVec3, bb: &BoundBox) -> bool {
	let mut t_min = -SMALL;
	let mut t_max = 1.0 + SMALL;

	let v = e - s;
	let d = v.length();

	if d < VSMALL {
		return bb.contains_point(s);
	}

	for dir in 0..3 {
		let vd = v[dir];
		let sd = s[dir];

		if vd.abs() > SMALL * d {
			if vd >= 0.0 {
				t_min = t_min.max((bb.min[dir] - sd) / vd);
				t_max = t_max.min((bb.max[dir] - sd) / vd);
			} else {
				t_min = t_min.max((bb.max[dir] - sd) / vd);
				t_max = t_max.min((bb.min[dir] - sd) / vd);
			}
		} else if sd < bb.min[dir] || sd > bb.max[dir] {
			return false;
		}
	}

	(t_max - t_min) > -SMALL
}
