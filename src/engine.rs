//! Packing engine: the request-level interface over state, search and
//! statistics.
//!
//! Requests are processed one at a time in arrival order. Every failing
//! request leaves the state untouched.

use log::{debug, info};
use serde::Serialize;

use crate::error::{ContainerError, PlacementError, StatisticsError};
use crate::model::{Container, PlacedBox};
use crate::optimizer::{PackingConfig, SearchBudget, find_position};
use crate::state::{PackingSnapshot, PackingState};
use crate::stats::Statistics;
use crate::types::Vec3;

/// Non-error result of a placement request.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlacementOutcome {
    /// The box was committed at the contained position.
    Placed(PlacedBox),
    /// The box fits dimensionally, but no grid position is feasible.
    NoSpace,
}

impl PlacementOutcome {
    pub fn is_placed(&self) -> bool {
        matches!(self, PlacementOutcome::Placed(_))
    }

    pub fn placed(&self) -> Option<&PlacedBox> {
        match self {
            PlacementOutcome::Placed(placed) => Some(placed),
            PlacementOutcome::NoSpace => None,
        }
    }
}

/// Owns the packing state and the search configuration.
#[derive(Clone, Debug)]
pub struct PackingEngine {
    state: PackingState,
    config: PackingConfig,
    default_container: Container,
}

impl Default for PackingEngine {
    fn default() -> Self {
        Self::new(PackingConfig::default(), Container::default())
    }
}

impl PackingEngine {
    /// Creates an engine starting with `default_container`.
    pub fn new(config: PackingConfig, default_container: Container) -> Self {
        Self {
            state: PackingState::new(default_container).with_epsilon(config.general_epsilon),
            config,
            default_container,
        }
    }

    pub fn config(&self) -> &PackingConfig {
        &self.config
    }

    pub fn container(&self) -> &Container {
        self.state.container()
    }

    /// Replaces the container and clears all boxes.
    pub fn set_container(&mut self, width: f64, height: f64, depth: f64) -> Result<(), ContainerError> {
        let container = Container::new(Vec3::new(width, height, depth))?;
        self.state.resize(container);
        info!("📦 Container set to {} x {} x {}", width, height, depth);
        Ok(())
    }

    /// Restores the default container and clears all boxes.
    pub fn reset_container(&mut self) {
        self.state.resize(self.default_container);
        let dims = self.default_container.dims;
        info!("🔄 Container reset to {} x {} x {}", dims.x, dims.y, dims.z);
    }

    /// Removes all boxes, keeping the container.
    pub fn clear_items(&mut self) {
        let removed = self.state.placed().len();
        self.state.clear();
        info!("🧹 Cleared {} boxes", removed);
    }

    /// Places a box with an unlimited search budget.
    pub fn try_place_box(
        &mut self,
        width: f64,
        height: f64,
        depth: f64,
    ) -> Result<PlacementOutcome, PlacementError> {
        self.try_place_box_with_budget(width, height, depth, &SearchBudget::unlimited())
    }

    /// Places a box, aborting when `budget` runs out.
    ///
    /// # Returns
    /// `Placed` with the committed box, `NoSpace` when no feasible position
    /// exists, or an error for invalid/oversized boxes and aborted searches.
    pub fn try_place_box_with_budget(
        &mut self,
        width: f64,
        height: f64,
        depth: f64,
        budget: &SearchBudget,
    ) -> Result<PlacementOutcome, PlacementError> {
        let size = Vec3::new(width, height, depth);
        let found = find_position(
            size,
            self.state.container(),
            self.state.placed(),
            &self.config,
            budget,
        )
        .inspect_err(|err| info!("⚠️ Box {:?} rejected: {}", size, err))?;

        match found {
            Some(position) => {
                let placed = self.state.commit_placement(size, position);
                debug!("✅ Box #{} {:?} placed at {:?}", placed.id, size, position);
                Ok(PlacementOutcome::Placed(placed))
            }
            None => {
                info!("🚫 No space left for box {:?}", size);
                Ok(PlacementOutcome::NoSpace)
            }
        }
    }

    /// Places each size in order, one request at a time.
    pub fn place_all<I>(&mut self, sizes: I) -> Vec<Result<PlacementOutcome, PlacementError>>
    where
        I: IntoIterator<Item = (f64, f64, f64)>,
    {
        sizes
            .into_iter()
            .map(|(w, h, d)| self.try_place_box(w, h, d))
            .collect()
    }

    pub fn statistics(&self) -> Result<Statistics, StatisticsError> {
        Statistics::from_snapshot(&self.state.snapshot())
    }

    pub fn snapshot(&self) -> PackingSnapshot<'_> {
        self.state.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{is_supported, overlaps, within_bounds};
    use crate::types::{EPSILON_GENERAL, SUPPORT_TOLERANCE};

    fn engine(w: f64, h: f64, d: f64) -> PackingEngine {
        let mut engine = PackingEngine::default();
        engine.set_container(w, h, d).unwrap();
        engine
    }

    fn placed(outcome: Result<PlacementOutcome, PlacementError>) -> PlacedBox {
        match outcome {
            Ok(PlacementOutcome::Placed(placed)) => placed,
            other => panic!("expected placement, got {:?}", other),
        }
    }

    fn assert_invariants(engine: &PackingEngine) {
        let snapshot = engine.snapshot();
        let container = snapshot.container;
        for (i, a) in snapshot.placed.iter().enumerate() {
            assert!(
                within_bounds(a.position, a.size, &container, EPSILON_GENERAL),
                "box #{} out of bounds",
                a.id
            );
            assert!(
                is_supported(
                    a.position,
                    a.size,
                    &container,
                    &snapshot.placed[..i],
                    SUPPORT_TOLERANCE,
                    EPSILON_GENERAL
                ),
                "box #{} floating",
                a.id
            );
            for b in &snapshot.placed[i + 1..] {
                assert!(
                    !overlaps(a.position, a.size, b.position, b.size, EPSILON_GENERAL),
                    "boxes #{} and #{} overlap",
                    a.id,
                    b.id
                );
            }
        }
        let sum: f64 = snapshot.placed.iter().map(|p| p.size.volume()).sum();
        assert_eq!(snapshot.occupied_volume, sum);
    }

    #[test]
    fn first_box_lands_on_floor() {
        let mut engine = engine(10.0, 10.0, 10.0);
        let first = placed(engine.try_place_box(2.0, 2.0, 2.0));

        assert_eq!(first.position.y, -4.0);
        let stats = engine.statistics().unwrap();
        assert!((stats.utilization_percent - 0.8).abs() < EPSILON_GENERAL);
        assert_eq!(stats.item_count, 1);
    }

    #[test]
    fn oversized_box_rejected_after_placements() {
        let mut engine = engine(10.0, 10.0, 10.0);
        placed(engine.try_place_box(2.0, 2.0, 2.0));
        placed(engine.try_place_box(2.0, 2.0, 2.0));

        let result = engine.try_place_box(20.0, 2.0, 2.0);
        assert!(matches!(result, Err(PlacementError::ExceedsContainer { .. })));
        assert_eq!(engine.statistics().unwrap().item_count, 2);
    }

    #[test]
    fn exact_fit_then_no_space() {
        let mut engine = engine(2.0, 2.0, 2.0);
        let only = placed(engine.try_place_box(2.0, 2.0, 2.0));

        assert_eq!(only.position, Vec3::zero());
        assert_eq!(engine.statistics().unwrap().utilization_percent, 100.0);
        assert_eq!(engine.try_place_box(1.0, 1.0, 1.0), Ok(PlacementOutcome::NoSpace));
        assert_eq!(engine.statistics().unwrap().item_count, 1);
    }

    #[test]
    fn zero_dimension_is_invalid() {
        let mut engine = engine(10.0, 10.0, 10.0);
        assert!(matches!(
            engine.try_place_box(0.0, 5.0, 5.0),
            Err(PlacementError::InvalidDimensions(_))
        ));
        assert!(matches!(
            engine.try_place_box(5.0, f64::NAN, 5.0),
            Err(PlacementError::InvalidDimensions(_))
        ));
        assert_eq!(engine.statistics().unwrap().item_count, 0);
    }

    #[test]
    fn second_slab_stacks_on_first() {
        let mut engine = engine(4.0, 4.0, 4.0);
        let bottom = placed(engine.try_place_box(4.0, 2.0, 4.0));
        let top = placed(engine.try_place_box(4.0, 2.0, 4.0));

        assert_eq!(bottom.bounding_box().bottom(), -2.0);
        assert!((top.bounding_box().bottom() - bottom.bounding_box().top()).abs() < EPSILON_GENERAL);
        assert!(!overlaps(
            bottom.position,
            bottom.size,
            top.position,
            top.size,
            EPSILON_GENERAL
        ));
        assert_invariants(&engine);
    }

    #[test]
    fn set_container_rejects_invalid_dimensions_and_keeps_state() {
        let mut engine = engine(10.0, 10.0, 10.0);
        placed(engine.try_place_box(2.0, 2.0, 2.0));

        assert!(engine.set_container(10.0, 0.0, 10.0).is_err());
        assert!(engine.set_container(-1.0, 10.0, 10.0).is_err());
        assert_eq!(engine.container().dims, Vec3::new(10.0, 10.0, 10.0));
        assert_eq!(engine.statistics().unwrap().item_count, 1);
    }

    #[test]
    fn clear_items_is_idempotent() {
        let mut engine = engine(10.0, 10.0, 10.0);
        placed(engine.try_place_box(2.0, 2.0, 2.0));
        placed(engine.try_place_box(3.0, 1.0, 2.0));

        engine.clear_items();
        engine.clear_items();
        let stats = engine.statistics().unwrap();
        assert_eq!(stats.item_count, 0);
        assert_eq!(stats.utilization_percent, 0.0);
        assert_eq!(stats.remaining_volume, stats.total_volume);
        assert_eq!(engine.container().dims, Vec3::new(10.0, 10.0, 10.0));
    }

    #[test]
    fn reset_container_restores_default() {
        let mut engine = engine(4.0, 4.0, 4.0);
        placed(engine.try_place_box(1.0, 1.0, 1.0));

        engine.reset_container();
        assert_eq!(engine.container().dims, Container::DEFAULT_DIMS);
        assert_eq!(engine.statistics().unwrap().item_count, 0);
    }

    #[test]
    fn placement_sequence_is_deterministic() {
        let sizes = [
            (2.0, 2.0, 2.0),
            (3.0, 1.0, 2.0),
            (1.0, 4.0, 1.0),
            (5.0, 2.0, 5.0),
            (2.0, 3.0, 2.0),
            (4.0, 4.0, 4.0),
        ];

        let run = || {
            let mut engine = engine(8.0, 6.0, 8.0);
            engine.place_all(sizes)
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn invariants_hold_while_filling_up() {
        let mut engine = engine(6.0, 6.0, 6.0);
        let sizes = [
            (2.0, 2.0, 2.0),
            (3.0, 1.0, 3.0),
            (1.0, 1.0, 1.0),
            (2.0, 3.0, 1.0),
            (6.0, 1.0, 6.0),
            (1.5, 2.5, 1.5),
        ];
        for _ in 0..4 {
            for outcome in engine.place_all(sizes) {
                assert!(outcome.is_ok());
            }
            assert_invariants(&engine);
        }

        let stats = engine.statistics().unwrap();
        assert!(stats.utilization_percent <= 100.0);
        assert_eq!(stats.remaining_volume + stats.occupied_volume, stats.total_volume);
    }

    #[test]
    fn no_space_when_nothing_supports_the_box() {
        let mut engine = engine(4.0, 4.0, 4.0);
        // A 1-high floor slab leaves a 3-high gap that a 4-high column cannot use
        placed(engine.try_place_box(4.0, 1.0, 4.0));
        assert_eq!(engine.try_place_box(1.0, 4.0, 1.0), Ok(PlacementOutcome::NoSpace));
        assert_invariants(&engine);
    }
}
