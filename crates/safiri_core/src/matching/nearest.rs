use tracing::debug;

use crate::ecs::{VehicleClass, VehicleStatus};
use crate::geo::{haversine_distance_km, Coordinate};

use super::algorithm::MatchingAlgorithm;
use super::types::{FleetCandidate, MatchCandidate};

/// Vehicles farther than this from the pickup are never matched.
pub const DEFAULT_MAX_RADIUS_KM: f64 = 30.0;

/// Nearest-vehicle matching: closest available vehicle of the requested class.
///
/// # Algorithm Behavior
///
/// 1. Keeps vehicles that are `Available` and of the requested class
/// 2. Computes the great-circle distance from the pickup to each of them
/// 3. Drops candidates beyond `max_radius_km`, even if globally nearest
/// 4. Returns the minimum distance, ties broken by the lowest vehicle id
///
/// Time complexity: O(n) in the fleet size.
#[derive(Debug, Default, Clone, Copy)]
pub struct NearestMatching;

impl MatchingAlgorithm for NearestMatching {
    fn find_match(
        &self,
        fleet: &[FleetCandidate],
        pickup: Coordinate,
        required_class: VehicleClass,
        max_radius_km: f64,
    ) -> Option<MatchCandidate> {
        find_nearest(fleet, pickup, required_class, max_radius_km)
    }
}

pub fn find_nearest(
    fleet: &[FleetCandidate],
    pickup: Coordinate,
    required_class: VehicleClass,
    max_radius_km: f64,
) -> Option<MatchCandidate> {
    let best = fleet
        .iter()
        .filter(|c| c.status == VehicleStatus::Available && c.class == required_class)
        .map(|c| MatchCandidate {
            vehicle_id: c.id,
            pickup_distance_km: haversine_distance_km(pickup, c.position),
        })
        .filter(|m| m.pickup_distance_km <= max_radius_km)
        .min_by(|a, b| {
            a.pickup_distance_km
                .total_cmp(&b.pickup_distance_km)
                .then_with(|| a.vehicle_id.cmp(&b.vehicle_id))
        });

    match &best {
        Some(m) => debug!(
            vehicle = %m.vehicle_id,
            distance_km = m.pickup_distance_km,
            ?required_class,
            "nearest vehicle found"
        ),
        None => debug!(?required_class, max_radius_km, "no vehicle within radius"),
    }
    best
}
