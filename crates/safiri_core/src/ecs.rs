use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::{Component, Entity, Resource};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;
use crate::routing::{RoutePath, TransportMode};

/// Stable fleet-registry id of a vehicle (distinct from its ECS entity).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub u32);

impl fmt::Display for VehicleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleClass {
    Car,
    Bike,
}

impl fmt::Display for VehicleClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleClass::Car => f.write_str("car"),
            VehicleClass::Bike => f.write_str("bike"),
        }
    }
}

impl VehicleClass {
    /// Routing profile used for this class's animation routes and quotes.
    pub fn transport_mode(self) -> TransportMode {
        match self {
            VehicleClass::Car => TransportMode::Driving,
            VehicleClass::Bike => TransportMode::Bicycling,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Available,
    Busy,
}

/// Identity and dispatch status of a fleet vehicle. `status` is only written
/// by the trip orchestrator's dispatch and cancel paths.
#[derive(Debug, Clone, PartialEq, Eq, Component)]
pub struct Vehicle {
    pub id: VehicleId,
    pub name: String,
    pub class: VehicleClass,
    pub status: VehicleStatus,
}

/// Displayed position; only written by the animator (and fleet spawn).
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct Position(pub Coordinate);

/// Displayed heading in degrees, icon offset already applied.
#[derive(Debug, Clone, Copy, PartialEq, Default, Component)]
pub struct Heading(pub f64);

/// Endpoints of the loop a vehicle patrols while idle on the map.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct PatrolEndpoints {
    pub start: Coordinate,
    pub end: Coordinate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

impl Direction {
    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0,
        }
    }
}

/// Per-vehicle animation cursor. `progress` indexes continuously into the
/// assigned route: the integer part is the segment, the fraction the
/// interpolation factor. Always within `[0, len(path) - 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Component)]
pub struct AnimationState {
    pub progress: f64,
    pub direction: Direction,
    pub route_loaded: bool,
}

impl Default for AnimationState {
    fn default() -> Self {
        Self {
            progress: 0.0,
            direction: Direction::Forward,
            route_loaded: false,
        }
    }
}

/// Resolved patrol route, shared read-only with the route cache.
#[derive(Debug, Clone, PartialEq, Component)]
pub struct AssignedRoute(pub Arc<RoutePath>);

/// Vehicle id → entity lookup, kept in sync by fleet spawn/despawn.
#[derive(Debug, Default, Resource)]
pub struct FleetIndex {
    entities: HashMap<VehicleId, Entity>,
}

impl FleetIndex {
    pub fn insert(&mut self, id: VehicleId, entity: Entity) {
        self.entities.insert(id, entity);
    }

    pub fn remove(&mut self, id: VehicleId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    pub fn get(&self, id: VehicleId) -> Option<Entity> {
        self.entities.get(&id).copied()
    }

    pub fn contains(&self, id: VehicleId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Ids in ascending order.
    pub fn ids(&self) -> Vec<VehicleId> {
        let mut ids: Vec<_> = self.entities.keys().copied().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
