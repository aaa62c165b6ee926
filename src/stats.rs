//! Utilization statistics derived from a packing snapshot.

use serde::Serialize;
use utoipa::ToSchema;

use crate::error::StatisticsError;
use crate::state::PackingSnapshot;
use crate::types::Dimensional;

/// Aggregate figures for display.
///
/// # Fields
/// * `utilization_percent` - Occupied share of the container, 0.0 to 100.0
/// * `packing_efficiency` - Same share as a fraction, 0.0 to 1.0
/// * `item_count` - Number of placed boxes
/// * `remaining_volume` - Container volume not occupied by boxes
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct Statistics {
    pub utilization_percent: f64,
    pub packing_efficiency: f64,
    pub item_count: usize,
    pub remaining_volume: f64,
    pub total_volume: f64,
    pub occupied_volume: f64,
}

impl Statistics {
    /// Derives statistics from a snapshot.
    ///
    /// Fails instead of dividing by a zero, negative or non-finite volume.
    pub fn from_snapshot(snapshot: &PackingSnapshot<'_>) -> Result<Self, StatisticsError> {
        let dims = snapshot.container.dims;
        if !dims.is_valid_dimension() {
            return Err(StatisticsError::InvalidContainer { dims });
        }

        let total_volume = snapshot.container.volume();
        let occupied_volume = snapshot.occupied_volume;
        let packing_efficiency = (occupied_volume / total_volume).clamp(0.0, 1.0);

        Ok(Self {
            utilization_percent: (100.0 * occupied_volume / total_volume).clamp(0.0, 100.0),
            packing_efficiency,
            item_count: snapshot.item_count(),
            remaining_volume: (total_volume - occupied_volume).max(0.0),
            total_volume,
            occupied_volume,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Container, PlacedBox};
    use crate::types::{EPSILON_GENERAL, Vec3};

    #[test]
    fn empty_container_has_zero_utilization() {
        let snapshot = PackingSnapshot {
            container: Container::new(Vec3::new(10.0, 10.0, 10.0)).unwrap(),
            placed: &[],
            occupied_volume: 0.0,
        };
        let stats = Statistics::from_snapshot(&snapshot).unwrap();

        assert_eq!(stats.item_count, 0);
        assert_eq!(stats.utilization_percent, 0.0);
        assert_eq!(stats.remaining_volume, 1000.0);
        assert_eq!(stats.total_volume, 1000.0);
    }

    #[test]
    fn utilization_matches_occupied_share() {
        let placed = [PlacedBox::new(
            1,
            Vec3::new(2.0, 2.0, 2.0),
            Vec3::new(-4.0, -4.0, -4.0),
        )];
        let snapshot = PackingSnapshot {
            container: Container::new(Vec3::new(10.0, 10.0, 10.0)).unwrap(),
            placed: &placed,
            occupied_volume: 8.0,
        };
        let stats = Statistics::from_snapshot(&snapshot).unwrap();

        assert!((stats.utilization_percent - 0.8).abs() < EPSILON_GENERAL);
        assert!((stats.packing_efficiency - 0.008).abs() < EPSILON_GENERAL);
        assert_eq!(stats.item_count, 1);
        assert_eq!(stats.remaining_volume, 992.0);
        assert_eq!(stats.remaining_volume + stats.occupied_volume, stats.total_volume);
    }

    #[test]
    fn invalid_container_fails_closed() {
        for dims in [
            Vec3::new(0.0, 10.0, 10.0),
            Vec3::new(10.0, -1.0, 10.0),
            Vec3::new(10.0, 10.0, f64::NAN),
        ] {
            let snapshot = PackingSnapshot {
                container: Container { dims },
                placed: &[],
                occupied_volume: 0.0,
            };
            assert!(matches!(
                Statistics::from_snapshot(&snapshot),
                Err(StatisticsError::InvalidContainer { .. })
            ));
        }
    }
}
