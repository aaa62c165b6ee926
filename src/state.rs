//! Packing state: the current container, the committed boxes and the running
//! occupied volume.

use serde::Serialize;

use crate::geometry::{overlaps, within_bounds};
use crate::model::{Container, PlacedBox};
use crate::types::{Dimensional, EPSILON_GENERAL, Vec3};

/// Mutable packing state.
///
/// `commit_placement` is the only operation that adds boxes; `resize` and
/// `clear` are the only ones that remove them.
#[derive(Clone, Debug)]
pub struct PackingState {
    container: Container,
    placed: Vec<PlacedBox>,
    occupied_volume: f64,
    epsilon: f64,
}

impl Default for PackingState {
    fn default() -> Self {
        Self::new(Container::default())
    }
}

impl PackingState {
    pub fn new(container: Container) -> Self {
        Self {
            container,
            placed: Vec::new(),
            occupied_volume: 0.0,
            epsilon: EPSILON_GENERAL,
        }
    }

    /// Sets the tolerance used when asserting committed placements.
    pub fn with_epsilon(mut self, epsilon: f64) -> Self {
        self.epsilon = epsilon;
        self
    }

    /// Replaces the container and drops every placed box.
    pub fn resize(&mut self, container: Container) {
        self.container = container;
        self.clear();
    }

    /// Drops every placed box, keeping the container.
    pub fn clear(&mut self) {
        self.placed.clear();
        self.occupied_volume = 0.0;
    }

    /// Appends a box at a position already validated by the search.
    ///
    /// Containment and overlap are asserted in debug builds only; support
    /// depends on the search's tolerance and is not re-checked.
    pub fn commit_placement(&mut self, size: Vec3, position: Vec3) -> PlacedBox {
        debug_assert!(
            within_bounds(position, size, &self.container, self.epsilon)
                && !self
                    .placed
                    .iter()
                    .any(|p| overlaps(position, size, p.position, p.size, self.epsilon)),
            "commit of infeasible placement {:?} at {:?}",
            size,
            position
        );
        let placed = PlacedBox::new(self.placed.len() + 1, size, position);
        self.occupied_volume += placed.volume();
        self.placed.push(placed);
        placed
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn placed(&self) -> &[PlacedBox] {
        &self.placed
    }

    pub fn occupied_volume(&self) -> f64 {
        self.occupied_volume
    }

    /// Read-only view for reporting.
    pub fn snapshot(&self) -> PackingSnapshot<'_> {
        PackingSnapshot {
            container: self.container,
            placed: &self.placed,
            occupied_volume: self.occupied_volume,
        }
    }
}

/// Borrowed, immutable view of a [`PackingState`].
#[derive(Clone, Copy, Debug, Serialize)]
pub struct PackingSnapshot<'a> {
    pub container: Container,
    pub placed: &'a [PlacedBox],
    pub occupied_volume: f64,
}

impl PackingSnapshot<'_> {
    pub fn item_count(&self) -> usize {
        self.placed.len()
    }
}
