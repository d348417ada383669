//! Axis-aligned bounding boxes.
//!
//! Used for the informational scene bounds and for per-primitive extents.

use glam::Vec3A;

/// Axis-aligned bounding box stored as two corner points.
///
/// Invariant: `min <= max` componentwise for any box built through the
/// constructors below.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Corner with the smallest coordinate on every axis.
    pub min: Vec3A,
    /// Corner with the largest coordinate on every axis.
    pub max: Vec3A,
}

impl Aabb {
    /// Box containing nothing; growing it by any point yields that point.
    pub const EMPTY: Aabb = Aabb {
        min: Vec3A::splat(f32::MAX),
        max: Vec3A::splat(f32::MIN),
    };

    /// Create a box from two arbitrary corner points, sorting the
    /// coordinates so the min/max invariant holds.
    pub fn from_points(a: Vec3A, b: Vec3A) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// The smallest box containing both `self` and `other`.
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Expand the box to contain the given point.
    pub fn grow(&mut self, point: Vec3A) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Extent along each axis.
    pub fn size(&self) -> Vec3A {
        self.max - self.min
    }

    /// Center point of the box.
    pub fn center(&self) -> Vec3A {
        0.5 * (self.min + self.max)
    }

    /// Index (0=X, 1=Y, 2=Z) of the axis with the largest extent.
    pub fn longest_axis(&self) -> usize {
        let size = self.size();
        if size.x > size.y && size.x > size.z {
            0
        } else if size.y > size.z {
            1
        } else {
            2
        }
    }

    /// Whether the point lies inside the box (inclusive bounds).
    pub fn contains(&self, point: Vec3A) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }
}
