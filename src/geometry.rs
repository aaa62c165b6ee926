//! Geometric predicates for placement feasibility.
//!
//! All functions are pure. Positions are box centers, sizes are full extents,
//! and the container is centered on the origin. `epsilon` is the general
//! tolerance of [`PackingConfig::general_epsilon`].

use crate::model::{Container, PlacedBox};
use crate::optimizer::PackingConfig;
use crate::types::{BoundingBox, Vec3};

/// Checks that a box lies inside the container on all three axes.
pub fn within_bounds(pos: Vec3, size: Vec3, container: &Container, epsilon: f64) -> bool {
    BoundingBox::from_center_and_size(pos, size).is_within(&container.bounding_box(), epsilon)
}

/// Checks whether two axis-aligned boxes overlap.
///
/// Uses Axis-Aligned Bounding Box (AABB) collision detection: the boxes do
/// NOT overlap if they are separated on at least one axis. Touching faces
/// count as separated.
///
/// # Example
/// ```
/// use boxfit::geometry::overlaps;
/// use boxfit::types::{EPSILON_GENERAL, Vec3};
///
/// let size = Vec3::new(2.0, 2.0, 2.0);
/// assert!(overlaps(Vec3::zero(), size, Vec3::new(1.0, 0.0, 0.0), size, EPSILON_GENERAL));
/// assert!(!overlaps(Vec3::zero(), size, Vec3::new(2.0, 0.0, 0.0), size, EPSILON_GENERAL));
/// ```
pub fn overlaps(pos_a: Vec3, size_a: Vec3, pos_b: Vec3, size_b: Vec3, epsilon: f64) -> bool {
    let a = BoundingBox::from_center_and_size(pos_a, size_a);
    let b = BoundingBox::from_center_and_size(pos_b, size_b);
    a.intersects(&b, epsilon)
}

/// Checks that a box is not floating.
///
/// A box is supported when its bottom face sits on the container floor, or
/// when some placed box has its top face within `tolerance` of the bottom
/// face and the two horizontal (XZ) footprints overlap.
pub fn is_supported(
    pos: Vec3,
    size: Vec3,
    container: &Container,
    placed: &[PlacedBox],
    tolerance: f64,
    epsilon: f64,
) -> bool {
    let candidate = BoundingBox::from_center_and_size(pos, size);
    if (candidate.bottom() - container.floor_y()).abs() <= epsilon {
        return true;
    }

    placed.iter().any(|p| {
        let supporter = p.bounding_box();
        (supporter.top() - candidate.bottom()).abs() <= tolerance
            && candidate.footprint_overlaps(&supporter, epsilon)
    })
}

/// Conjunction of containment, non-overlap and support, using the
/// tolerances of `config`.
pub fn can_place(
    pos: Vec3,
    size: Vec3,
    container: &Container,
    placed: &[PlacedBox],
    config: &PackingConfig,
) -> bool {
    let epsilon = config.general_epsilon;
    within_bounds(pos, size, container, epsilon)
        && !placed
            .iter()
            .any(|p| overlaps(pos, size, p.position, p.size, epsilon))
        && is_supported(pos, size, container, placed, config.support_tolerance, epsilon)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EPSILON_GENERAL, SUPPORT_TOLERANCE};

    fn container(w: f64, h: f64, d: f64) -> Container {
        Container::new(Vec3::new(w, h, d)).unwrap()
    }

    fn cube(id: usize, edge: f64, pos: (f64, f64, f64)) -> PlacedBox {
        PlacedBox::new(id, Vec3::new(edge, edge, edge), pos.into())
    }

    fn supported(pos: Vec3, size: Vec3, c: &Container, placed: &[PlacedBox]) -> bool {
        is_supported(pos, size, c, placed, SUPPORT_TOLERANCE, EPSILON_GENERAL)
    }

    #[test]
    fn within_bounds_accepts_flush_and_rejects_protruding() {
        let c = container(10.0, 10.0, 10.0);
        let size = Vec3::new(2.0, 2.0, 2.0);
        let eps = EPSILON_GENERAL;

        assert!(within_bounds(Vec3::new(-4.0, -4.0, -4.0), size, &c, eps));
        assert!(within_bounds(Vec3::new(4.0, 4.0, 4.0), size, &c, eps));
        assert!(!within_bounds(Vec3::new(4.5, 0.0, 0.0), size, &c, eps));
        assert!(!within_bounds(Vec3::new(0.0, -4.5, 0.0), size, &c, eps));
        assert!(!within_bounds(Vec3::zero(), Vec3::new(11.0, 1.0, 1.0), &c, eps));
    }

    #[test]
    fn overlap_requires_intersection_on_every_axis() {
        let size = Vec3::new(2.0, 2.0, 2.0);
        let eps = EPSILON_GENERAL;
        // Separated on z only
        assert!(!overlaps(Vec3::zero(), size, Vec3::new(0.5, 0.5, 3.0), size, eps));
        // Touching on y
        assert!(!overlaps(Vec3::zero(), size, Vec3::new(0.0, 2.0, 0.0), size, eps));
        // Contained
        assert!(overlaps(Vec3::zero(), size, Vec3::zero(), Vec3::new(1.0, 1.0, 1.0), eps));
    }

    #[test]
    fn wider_epsilon_treats_shallow_intersections_as_touching() {
        let size = Vec3::new(2.0, 2.0, 2.0);
        let shifted = Vec3::new(1.99, 0.0, 0.0);

        assert!(overlaps(Vec3::zero(), size, shifted, size, EPSILON_GENERAL));
        assert!(!overlaps(Vec3::zero(), size, shifted, size, 0.1));
    }

    #[test]
    fn floor_contact_is_supported() {
        let c = container(10.0, 10.0, 10.0);
        let size = Vec3::new(2.0, 2.0, 2.0);
        assert!(supported(Vec3::new(0.0, -4.0, 0.0), size, &c, &[]));
        assert!(!supported(Vec3::new(0.0, -3.0, 0.0), size, &c, &[]));
    }

    #[test]
    fn stacked_box_is_supported_within_tolerance() {
        let c = container(10.0, 10.0, 10.0);
        let below = [cube(1, 2.0, (0.0, -4.0, 0.0))];
        let size = Vec3::new(2.0, 2.0, 2.0);

        assert!(supported(Vec3::new(0.0, -2.0, 0.0), size, &c, &below));
        assert!(supported(Vec3::new(1.5, -1.995, 0.0), size, &c, &below));
        // Floating above the tolerance
        assert!(!supported(Vec3::new(0.0, -1.9, 0.0), size, &c, &below));
    }

    #[test]
    fn edge_contact_does_not_support() {
        let c = container(10.0, 10.0, 10.0);
        let below = [cube(1, 2.0, (0.0, -4.0, 0.0))];
        let size = Vec3::new(2.0, 2.0, 2.0);

        // Footprints only touch along x = 1
        assert!(!supported(Vec3::new(2.0, -2.0, 0.0), size, &c, &below));
    }

    #[test]
    fn can_place_combines_all_predicates() {
        let c = container(4.0, 4.0, 4.0);
        let placed = [PlacedBox::new(
            1,
            Vec3::new(4.0, 2.0, 4.0),
            Vec3::new(0.0, -1.0, 0.0),
        )];
        let slab = Vec3::new(4.0, 2.0, 4.0);
        let config = PackingConfig::default();

        assert!(!can_place(Vec3::new(0.0, -1.0, 0.0), slab, &c, &placed, &config));
        assert!(can_place(Vec3::new(0.0, 1.0, 0.0), slab, &c, &placed, &config));
        assert!(!can_place(Vec3::new(0.0, 2.0, 0.0), slab, &c, &placed, &config));
        assert!(!can_place(
            Vec3::new(0.0, 1.5, 0.0),
            Vec3::new(4.0, 1.0, 4.0),
            &c,
            &placed,
            &config
        ));
    }
}
