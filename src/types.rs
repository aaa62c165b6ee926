//! Common types and traits for 3D geometry.
//!
//! Coordinates are center-based: the container is centered on the origin and
//! every box is described by its center and its full extents.
//! Axis convention: `x` = width, `y` = height (vertical), `z` = depth.

use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Default numerical tolerance for floating-point comparisons.
///
/// Used for containment, floor contact and touching-face detection; see
/// [`PackingConfig::general_epsilon`](crate::optimizer::PackingConfig).
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Maximum vertical gap between a box's bottom face and a supporter's top face
/// that still counts as resting on it.
///
/// Grid-stepped coordinates accumulate floating-point error, so exact
/// coincidence is not required. This is a policy knob, see
/// [`PackingConfig::support_tolerance`](crate::optimizer::PackingConfig).
pub const SUPPORT_TOLERANCE: f64 = 0.01;

/// Represents a 3D vector or point in space.
///
/// # Examples
/// ```
/// use boxfit::types::Vec3;
///
/// let center = Vec3::new(1.0, 2.0, 3.0);
/// let size = Vec3::new(2.0, 2.0, 2.0);
/// let corner = center - size * 0.5;
/// assert_eq!(corner, Vec3::new(0.0, 1.0, 2.0));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new 3D vector.
    #[inline]
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Creates a zero vector (origin).
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Product of all components.
    #[inline]
    pub fn volume(&self) -> f64 {
        self.x * self.y * self.z
    }

    /// Checks if all components are positive and finite.
    #[inline]
    pub fn is_valid_dimension(&self) -> bool {
        self.x > 0.0
            && self.y > 0.0
            && self.z > 0.0
            && self.x.is_finite()
            && self.y.is_finite()
            && self.z.is_finite()
    }

    /// Checks if the vector fits within another vector (component-wise <=).
    ///
    /// # Parameters
    /// * `outer` - The outer vector (e.g., container dimensions)
    /// * `tolerance` - Numerical tolerance for the comparison
    #[inline]
    pub fn fits_within(&self, outer: &Self, tolerance: f64) -> bool {
        self.x <= outer.x + tolerance && self.y <= outer.y + tolerance && self.z <= outer.z + tolerance
    }

    /// Half of every component.
    #[inline]
    pub fn half(&self) -> Self {
        *self * 0.5
    }
}

impl Add for Vec3 {
    type Output = Self;

    #[inline]
    fn add(self, rhs: Self) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Vec3 {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: Self) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f64> for Vec3 {
    type Output = Self;

    #[inline]
    fn mul(self, scalar: f64) -> Self::Output {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }
}

impl From<(f64, f64, f64)> for Vec3 {
    #[inline]
    fn from(tuple: (f64, f64, f64)) -> Self {
        Self::new(tuple.0, tuple.1, tuple.2)
    }
}

/// Trait for objects with 3D extents.
pub trait Dimensional {
    /// Returns the full extents (width, height, depth).
    fn dimensions(&self) -> Vec3;

    /// Calculates the volume.
    fn volume(&self) -> f64 {
        self.dimensions().volume()
    }
}

/// Represents an Axis-Aligned Bounding Box (AABB).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl BoundingBox {
    /// Creates a bounding box from a center point and full extents.
    #[inline]
    pub fn from_center_and_size(center: Vec3, size: Vec3) -> Self {
        let half = size.half();
        Self {
            min: center - half,
            max: center + half,
        }
    }

    /// Checks if two bounding boxes intersect with positive volume.
    ///
    /// Implements the Separating Axis Theorem for AABBs. Intersections thinner
    /// than `epsilon` on any axis count as touching, not overlapping.
    #[inline]
    pub fn intersects(&self, other: &Self, epsilon: f64) -> bool {
        !(self.max.x <= other.min.x + epsilon
            || other.max.x <= self.min.x + epsilon
            || self.max.y <= other.min.y + epsilon
            || other.max.y <= self.min.y + epsilon
            || self.max.z <= other.min.z + epsilon
            || other.max.z <= self.min.z + epsilon)
    }

    /// Checks whether `self` lies inside `outer` on every axis.
    #[inline]
    pub fn is_within(&self, outer: &Self, epsilon: f64) -> bool {
        self.min.x >= outer.min.x - epsilon
            && self.min.y >= outer.min.y - epsilon
            && self.min.z >= outer.min.z - epsilon
            && self.max.x <= outer.max.x + epsilon
            && self.max.y <= outer.max.y + epsilon
            && self.max.z <= outer.max.z + epsilon
    }

    /// Checks whether the horizontal (XZ) footprints share an area.
    ///
    /// Both the X and the Z overlap must exceed `epsilon`, so footprints that
    /// only touch along an edge or a corner do not count.
    #[inline]
    pub fn footprint_overlaps(&self, other: &Self, epsilon: f64) -> bool {
        overlap_1d(self.min.x, self.max.x, other.min.x, other.max.x) > epsilon
            && overlap_1d(self.min.z, self.max.z, other.min.z, other.max.z) > epsilon
    }

    /// Returns the bottom (Y minimum).
    #[inline]
    pub fn bottom(&self) -> f64 {
        self.min.y
    }

    /// Returns the top (Y maximum).
    #[inline]
    pub fn top(&self) -> f64 {
        self.max.y
    }
}

/// Calculates the overlap length of two intervals, at least 0.0.
///
/// # Example
/// ```
/// use boxfit::types::overlap_1d;
///
/// assert_eq!(overlap_1d(0.0, 5.0, 3.0, 8.0), 2.0);
/// assert_eq!(overlap_1d(0.0, 1.0, 2.0, 3.0), 0.0);
/// ```
#[inline]
pub fn overlap_1d(a1: f64, a2: f64, b1: f64, b2: f64) -> f64 {
    (a2.min(b2) - a1.max(b1)).max(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec3_operations() {
        let a = Vec3::new(1.0, 2.0, 3.0);
        let b = Vec3::new(4.0, 5.0, 6.0);

        assert_eq!(a + b, Vec3::new(5.0, 7.0, 9.0));
        assert_eq!(b - a, Vec3::new(3.0, 3.0, 3.0));
        assert_eq!(a * 2.0, Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(b.half(), Vec3::new(2.0, 2.5, 3.0));
    }

    #[test]
    fn test_vec3_validity() {
        assert!(Vec3::new(1.0, 2.0, 3.0).is_valid_dimension());
        assert!(!Vec3::new(0.0, 2.0, 3.0).is_valid_dimension());
        assert!(!Vec3::new(1.0, -2.0, 3.0).is_valid_dimension());
        assert!(!Vec3::new(1.0, 2.0, f64::NAN).is_valid_dimension());
        assert!(!Vec3::new(f64::INFINITY, 2.0, 3.0).is_valid_dimension());
    }

    #[test]
    fn test_vec3_fits_within() {
        let small = Vec3::new(5.0, 5.0, 5.0);
        let large = Vec3::new(10.0, 10.0, 10.0);

        assert!(small.fits_within(&large, EPSILON_GENERAL));
        assert!(!large.fits_within(&small, EPSILON_GENERAL));
        assert!(large.fits_within(&large, EPSILON_GENERAL));
    }

    #[test]
    fn test_bounding_box_from_center() {
        let bb = BoundingBox::from_center_and_size(Vec3::zero(), Vec3::new(2.0, 4.0, 6.0));
        assert_eq!(bb.min, Vec3::new(-1.0, -2.0, -3.0));
        assert_eq!(bb.max, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(bb.bottom(), -2.0);
        assert_eq!(bb.top(), 2.0);
    }

    #[test]
    fn test_bounding_box_intersects() {
        let size = Vec3::new(2.0, 2.0, 2.0);
        let a = BoundingBox::from_center_and_size(Vec3::zero(), size);
        let b = BoundingBox::from_center_and_size(Vec3::new(1.0, 1.0, 1.0), size);
        let touching = BoundingBox::from_center_and_size(Vec3::new(2.0, 0.0, 0.0), size);
        let apart = BoundingBox::from_center_and_size(Vec3::new(5.0, 5.0, 5.0), size);

        assert!(a.intersects(&b, EPSILON_GENERAL));
        assert!(!a.intersects(&touching, EPSILON_GENERAL));
        assert!(!a.intersects(&apart, EPSILON_GENERAL));
    }

    #[test]
    fn test_bounding_box_footprint_overlap() {
        let size = Vec3::new(10.0, 10.0, 10.0);
        let a = BoundingBox::from_center_and_size(Vec3::zero(), size);
        // Different heights do not matter, only the XZ footprint
        let shifted = BoundingBox::from_center_and_size(Vec3::new(5.0, 30.0, 5.0), size);
        let edge = BoundingBox::from_center_and_size(Vec3::new(10.0, 0.0, 0.0), size);
        let corner = BoundingBox::from_center_and_size(Vec3::new(10.0, 0.0, 10.0), size);

        assert!(a.footprint_overlaps(&shifted, EPSILON_GENERAL));
        assert!(!a.footprint_overlaps(&edge, EPSILON_GENERAL));
        assert!(!a.footprint_overlaps(&corner, EPSILON_GENERAL));
    }

    #[test]
    fn test_bounding_box_is_within() {
        let outer = BoundingBox::from_center_and_size(Vec3::zero(), Vec3::new(10.0, 10.0, 10.0));
        let inner = BoundingBox::from_center_and_size(Vec3::new(4.0, -4.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        let poking = BoundingBox::from_center_and_size(Vec3::new(4.5, 0.0, 0.0), Vec3::new(2.0, 2.0, 2.0));

        assert!(inner.is_within(&outer, EPSILON_GENERAL));
        assert!(!poking.is_within(&outer, EPSILON_GENERAL));
    }
}
