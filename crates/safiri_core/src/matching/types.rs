use crate::ecs::{VehicleClass, VehicleId, VehicleStatus};
use crate::geo::Coordinate;

/// Read-only view of one fleet vehicle as seen by a matching algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FleetCandidate {
    pub id: VehicleId,
    pub class: VehicleClass,
    pub status: VehicleStatus,
    pub position: Coordinate,
}

/// Represents a successful match result.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCandidate {
    pub vehicle_id: VehicleId,
    pub pickup_distance_km: f64,
}
