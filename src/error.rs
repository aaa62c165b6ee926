//! Error types for the packing engine.
//!
//! Every error is detected before any state mutation, so a failed call leaves
//! the packing state exactly as it was.

use thiserror::Error;

use crate::types::Vec3;

/// A dimension triple that is not strictly positive and finite.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DimensionError {
    #[error("{name} must be positive, got: {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} must be finite, got: {value}")]
    NotFinite { name: &'static str, value: f64 },
}

/// Reasons a placement request fails without searching.
///
/// `NoSpace` is deliberately absent: running out of room is a regular
/// [`PlacementOutcome`](crate::engine::PlacementOutcome).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlacementError {
    /// A requested box has a non-positive or non-finite dimension.
    #[error("Invalid box dimensions: {0}")]
    InvalidDimensions(#[from] DimensionError),

    /// The box is larger than the container on at least one axis.
    #[error("Box {size:?} exceeds container {container:?}")]
    ExceedsContainer { size: Vec3, container: Vec3 },

    /// The search was cancelled through its cancellation flag.
    #[error("Placement search cancelled")]
    Cancelled,

    /// The search ran past its deadline.
    #[error("Placement search exceeded its deadline after {0}ms")]
    DeadlineExceeded(u64),
}

impl PlacementError {
    /// Stable machine-readable code for API responses.
    pub fn code(&self) -> &'static str {
        match self {
            PlacementError::InvalidDimensions(_) => "invalid_dimensions",
            PlacementError::ExceedsContainer { .. } => "exceeds_container",
            PlacementError::Cancelled => "cancelled",
            PlacementError::DeadlineExceeded(_) => "deadline_exceeded",
        }
    }
}

/// A container that cannot be used.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ContainerError {
    #[error("Invalid container: {0}")]
    InvalidContainer(#[from] DimensionError),
}

/// Statistics cannot be derived from the given container.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StatisticsError {
    #[error("Invalid container for statistics: {dims:?} has no positive volume")]
    InvalidContainer { dims: Vec3 },
}
