use crate::ecs::VehicleClass;
use crate::geo::Coordinate;

use super::types::{FleetCandidate, MatchCandidate};

/// Trait for matching algorithms that pick a vehicle for a pickup point.
pub trait MatchingAlgorithm: Send + Sync {
    /// Find the best vehicle of `required_class` for `pickup`.
    /// Returns `None` when no vehicle qualifies; that is a normal outcome.
    fn find_match(
        &self,
        fleet: &[FleetCandidate],
        pickup: Coordinate,
        required_class: VehicleClass,
        max_radius_km: f64,
    ) -> Option<MatchCandidate>;
}
