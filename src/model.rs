//! Data models for the packing engine.
//!
//! - `Container`: the origin-centered volume boxes are packed into
//! - `PlacedBox`: a box with its resolved center position
//!
//! Both implement the traits from the `types` module.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::DimensionError;
use crate::types::{BoundingBox, Dimensional, Vec3};

/// Validates a single dimension.
fn validate_dimension(value: f64, name: &'static str) -> Result<(), DimensionError> {
    if !value.is_finite() {
        return Err(DimensionError::NotFinite { name, value });
    }
    if value <= 0.0 {
        return Err(DimensionError::NonPositive { name, value });
    }
    Ok(())
}

/// Validates a (width, height, depth) triple.
///
/// # Examples
/// ```
/// use boxfit::model::validate_dims;
/// use boxfit::types::Vec3;
///
/// assert!(validate_dims(Vec3::new(2.0, 2.0, 2.0)).is_ok());
/// assert!(validate_dims(Vec3::new(0.0, 5.0, 5.0)).is_err());
/// ```
pub fn validate_dims(dims: Vec3) -> Result<(), DimensionError> {
    validate_dimension(dims.x, "Width")?;
    validate_dimension(dims.y, "Height")?;
    validate_dimension(dims.z, "Depth")?;
    Ok(())
}

/// The packing container.
///
/// Centered on the origin, so the valid range on each axis is
/// `[-dim/2, +dim/2]`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Container {
    pub dims: Vec3,
}

impl Container {
    /// Dimensions restored by a container reset.
    pub const DEFAULT_DIMS: Vec3 = Vec3::new(10.0, 10.0, 10.0);

    /// Creates a container after validating its dimensions.
    pub fn new(dims: Vec3) -> Result<Self, DimensionError> {
        validate_dims(dims)?;
        Ok(Self { dims })
    }

    /// Bounding box spanning `[-dim/2, +dim/2]` on every axis.
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_center_and_size(Vec3::zero(), self.dims)
    }

    /// Y coordinate of the container floor.
    #[inline]
    pub fn floor_y(&self) -> f64 {
        -self.dims.y / 2.0
    }
}

impl Default for Container {
    fn default() -> Self {
        Self {
            dims: Self::DEFAULT_DIMS,
        }
    }
}

impl Dimensional for Container {
    fn dimensions(&self) -> Vec3 {
        self.dims
    }
}

/// A box committed to the container.
///
/// Immutable once placed.
///
/// # Fields
/// * `id` - 1-based arrival number, reset whenever the state is cleared
/// * `size` - Full extents (width, height, depth)
/// * `position` - Center of the box
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct PlacedBox {
    pub id: usize,
    pub size: Vec3,
    pub position: Vec3,
}

impl PlacedBox {
    pub fn new(id: usize, size: Vec3, position: Vec3) -> Self {
        Self { id, size, position }
    }

    /// Occupied region; its `top()` is the face boxes above can rest on.
    #[inline]
    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::from_center_and_size(self.position, self.size)
    }
}

impl Dimensional for PlacedBox {
    fn dimensions(&self) -> Vec3 {
        self.size
    }
}
