//! Placement search for single boxes.
//!
//! Enumerates candidate center positions on a fixed grid and returns the
//! first one that passes [`can_place`]. Enumeration order is X outer, Y
//! middle, Z inner, each axis ascending from the lowest in-bounds center.
//! The first feasible candidate in this order is always the result, which
//! makes placement reproducible for identical request histories.
//!
//! Cost is `O((W/step) · (H/step) · (D/step) · P)` for `P` placed boxes.
//! Candidates are generated on the fly, so memory stays constant however
//! fine the grid is; long searches are bounded by a [`SearchBudget`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use log::debug;

use crate::error::PlacementError;
use crate::geometry::can_place;
use crate::model::{Container, PlacedBox, validate_dims};
use crate::types::{EPSILON_GENERAL, SUPPORT_TOLERANCE, Vec3};

/// Number of candidates tested between two budget checks.
const BUDGET_CHECK_INTERVAL: u64 = 1024;

/// Configuration for the placement search.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PackingConfig {
    /// Grid step for candidate positions (smaller = finer, but slower)
    pub grid_step: f64,
    /// Vertical gap still accepted as contact between stacked boxes
    pub support_tolerance: f64,
    /// Tolerance for containment, floor contact and touching faces
    pub general_epsilon: f64,
}

impl PackingConfig {
    pub const DEFAULT_GRID_STEP: f64 = 1.0;
    pub const DEFAULT_SUPPORT_TOLERANCE: f64 = SUPPORT_TOLERANCE;
    pub const DEFAULT_GENERAL_EPSILON: f64 = EPSILON_GENERAL;

    /// Creates a builder for a custom configuration.
    pub fn builder() -> PackingConfigBuilder {
        PackingConfigBuilder::default()
    }
}

impl Default for PackingConfig {
    fn default() -> Self {
        Self {
            grid_step: Self::DEFAULT_GRID_STEP,
            support_tolerance: Self::DEFAULT_SUPPORT_TOLERANCE,
            general_epsilon: Self::DEFAULT_GENERAL_EPSILON,
        }
    }
}

/// Builder for [`PackingConfig`].
#[derive(Clone, Debug, Default)]
pub struct PackingConfigBuilder {
    config: PackingConfig,
}

impl PackingConfigBuilder {
    /// Sets the grid step.
    pub fn grid_step(mut self, step: f64) -> Self {
        self.config.grid_step = step;
        self
    }

    /// Sets the support tolerance.
    pub fn support_tolerance(mut self, tolerance: f64) -> Self {
        self.config.support_tolerance = tolerance;
        self
    }

    /// Sets the general numerical tolerance.
    pub fn general_epsilon(mut self, epsilon: f64) -> Self {
        self.config.general_epsilon = epsilon;
        self
    }

    pub fn build(self) -> PackingConfig {
        self.config
    }
}

/// Limits on how long a single search may run.
///
/// The grid is finite, so an unlimited budget always terminates; a budget
/// only bounds latency. Checked before the first candidate and then every
/// `BUDGET_CHECK_INTERVAL` candidates, whatever the shape of the grid.
#[derive(Clone, Debug, Default)]
pub struct SearchBudget {
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
}

impl SearchBudget {
    /// No deadline, no cancellation.
    pub fn unlimited() -> Self {
        Self::default()
    }

    /// Aborts once `timeout` has elapsed from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Some(Instant::now() + timeout),
            cancel: None,
        }
    }

    /// Aborts as soon as `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn check(&self, started: Instant) -> Result<(), PlacementError> {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return Err(PlacementError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(PlacementError::DeadlineExceeded(
                    started.elapsed().as_millis() as u64,
                ));
            }
        }
        Ok(())
    }
}

/// Rejects sizes that can never be placed in `container`.
///
/// Runs before any search: non-positive or non-finite dimensions first, then
/// any axis on which the box is larger than the container. The size
/// comparison has no tolerance, so a placed box never holds more volume than
/// the container.
pub fn check_placeable(size: Vec3, container: &Container) -> Result<(), PlacementError> {
    validate_dims(size)?;
    if !size.fits_within(&container.dims, 0.0) {
        return Err(PlacementError::ExceedsContainer {
            size,
            container: container.dims,
        });
    }
    Ok(())
}

/// Finds the first feasible center position for a box.
///
/// # Parameters
/// * `size` - Full extents of the box to place
/// * `container` - The current container
/// * `placed` - Boxes already committed
/// * `config` - Grid step and tolerances
/// * `budget` - Deadline and cancellation
///
/// # Returns
/// `Ok(Some(position))` for the first feasible candidate, `Ok(None)` when the
/// grid is exhausted, `Err` for impossible requests or an exhausted budget.
pub fn find_position(
    size: Vec3,
    container: &Container,
    placed: &[PlacedBox],
    config: &PackingConfig,
    budget: &SearchBudget,
) -> Result<Option<Vec3>, PlacementError> {
    check_placeable(size, container)?;

    let step = effective_step(config.grid_step);
    let epsilon = config.general_epsilon;
    let xs = axis_positions(container.dims.x, size.x, step, epsilon);
    let ys = axis_positions(container.dims.y, size.y, step, epsilon);
    let zs = axis_positions(container.dims.z, size.z, step, epsilon);

    let started = Instant::now();
    let mut checked: u64 = 0;
    for x in xs {
        for y in ys.clone() {
            for z in zs.clone() {
                if checked % BUDGET_CHECK_INTERVAL == 0 {
                    budget.check(started)?;
                }
                checked += 1;

                let candidate = Vec3::new(x, y, z);
                if can_place(candidate, size, container, placed, config) {
                    return Ok(Some(candidate));
                }
            }
        }
    }

    debug!(
        "🔍 Grid exhausted for {:?}: {} candidates checked against {} boxes",
        size,
        checked,
        placed.len()
    );
    Ok(None)
}

fn effective_step(step: f64) -> f64 {
    if step.is_finite() && step > 0.0 {
        step
    } else {
        PackingConfig::DEFAULT_GRID_STEP
    }
}

/// Candidate centers along one axis, produced lazily in ascending order.
///
/// Created by [`axis_positions`].
#[derive(Clone, Debug)]
pub struct AxisPositions {
    lo: f64,
    hi: f64,
    step: f64,
    epsilon: f64,
    index: u64,
    finished: bool,
}

impl Iterator for AxisPositions {
    type Item = f64;

    fn next(&mut self) -> Option<f64> {
        if self.finished {
            return None;
        }
        if self.hi - self.lo <= self.epsilon {
            self.finished = true;
            return Some(self.lo);
        }

        let pos = self.lo + self.index as f64 * self.step;
        if pos > self.hi + self.epsilon {
            // The grid missed the far wall
            self.finished = true;
            return Some(self.hi);
        }

        self.index += 1;
        let pos = pos.min(self.hi);
        if (pos - self.hi).abs() <= self.epsilon {
            self.finished = true;
        }
        Some(pos)
    }
}

/// Generates candidate centers along one axis.
///
/// Starts flush against the negative wall and steps by `step`; the center
/// flush against the positive wall is appended when the grid misses it.
///
/// # Parameters
/// * `container_len` - Container extent on this axis
/// * `object_len` - Box extent on this axis
/// * `step` - Grid step
/// * `epsilon` - Numerical tolerance
pub fn axis_positions(container_len: f64, object_len: f64, step: f64, epsilon: f64) -> AxisPositions {
    AxisPositions {
        lo: -container_len / 2.0 + object_len / 2.0,
        hi: container_len / 2.0 - object_len / 2.0,
        step,
        epsilon,
        index: 0,
        finished: false,
    }
}
