//! Fleet registry input: vehicle records, the demo fleet, seeded random
//! fleets, and reconciling the ECS world against a fresh registry snapshot.

use std::collections::HashSet;

use bevy_ecs::prelude::{Entity, World};
use bevy_ecs::world::Mut;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::clock::SimulationClock;
use crate::ecs::{
    AnimationState, AssignedRoute, FleetIndex, Heading, PatrolEndpoints, Position, Vehicle,
    VehicleClass, VehicleId, VehicleStatus,
};
use crate::geo::Coordinate;
use crate::routing::{RouteLookup, RouteProvider, RouteRequest, RouteRequester};

/// One vehicle as delivered by the fleet registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FleetRecord {
    pub id: VehicleId,
    pub name: String,
    pub class: VehicleClass,
    pub status: VehicleStatus,
    pub start: Coordinate,
    pub end: Coordinate,
}

impl FleetRecord {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        class: VehicleClass,
        start: Coordinate,
        end: Coordinate,
    ) -> Self {
        Self {
            id: VehicleId(id),
            name: name.into(),
            class,
            status: VehicleStatus::Available,
            start,
            end,
        }
    }

    fn patrol(&self) -> PatrolEndpoints {
        PatrolEndpoints {
            start: self.start,
            end: self.end,
        }
    }
}

/// The five demo vehicles patrolling central Nairobi.
pub fn nairobi_fleet() -> Vec<FleetRecord> {
    vec![
        FleetRecord::new(
            1,
            "John Kamau",
            VehicleClass::Car,
            Coordinate::new(-1.286389, 36.817223),
            Coordinate::new(-1.266389, 36.837223),
        ),
        FleetRecord::new(
            2,
            "Aisha Mwangi",
            VehicleClass::Bike,
            Coordinate::new(-1.296389, 36.807223),
            Coordinate::new(-1.276389, 36.827223),
        ),
        FleetRecord::new(
            3,
            "Peter Njoroge",
            VehicleClass::Car,
            Coordinate::new(-1.25, 36.75),
            Coordinate::new(-1.27, 36.77),
        ),
        FleetRecord::new(
            4,
            "Mary Wanjiku",
            VehicleClass::Bike,
            Coordinate::new(-1.32, 36.78),
            Coordinate::new(-1.30, 36.80),
        ),
        FleetRecord::new(
            5,
            "James Otieno",
            VehicleClass::Car,
            Coordinate::new(-1.27, 36.79),
            Coordinate::new(-1.29, 36.81),
        ),
    ]
}

const FIRST_NAMES: &[&str] = &[
    "John", "Aisha", "Peter", "Mary", "James", "Grace", "David", "Faith", "Brian", "Wanjiru",
];
const LAST_NAMES: &[&str] = &[
    "Kamau", "Mwangi", "Njoroge", "Wanjiku", "Otieno", "Ochieng", "Kiprop", "Achieng", "Mutua",
];

/// Parameters for a reproducible random fleet around a city centre.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FleetParams {
    pub count: u32,
    pub center: Coordinate,
    /// Maximum offset of a patrol start from `center`, in degrees.
    pub spread_deg: f64,
    /// Maximum offset of the patrol end from its start, in degrees.
    pub patrol_deg: f64,
    /// Fraction of vehicles that are bikes.
    pub bike_share: f64,
    pub seed: u64,
}

impl Default for FleetParams {
    fn default() -> Self {
        Self {
            count: 20,
            center: Coordinate::new(-1.286389, 36.817223),
            spread_deg: 0.05,
            patrol_deg: 0.02,
            bike_share: 0.4,
            seed: 42,
        }
    }
}

/// Generate `params.count` vehicles with ids starting at 1. The same params
/// always produce the same fleet.
pub fn generate_fleet(params: &FleetParams) -> Vec<FleetRecord> {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let spread = params.spread_deg.abs();
    let patrol = params.patrol_deg.abs();
    (1..=params.count)
        .map(|id| {
            let start = Coordinate::new(
                params.center.lat + offset(&mut rng, spread),
                params.center.lng + offset(&mut rng, spread),
            );
            let end = Coordinate::new(
                start.lat + offset(&mut rng, patrol),
                start.lng + offset(&mut rng, patrol),
            );
            let class = if rng.gen_bool(params.bike_share.clamp(0.0, 1.0)) {
                VehicleClass::Bike
            } else {
                VehicleClass::Car
            };
            let name = format!(
                "{} {}",
                FIRST_NAMES[rng.gen_range(0..FIRST_NAMES.len())],
                LAST_NAMES[rng.gen_range(0..LAST_NAMES.len())]
            );
            FleetRecord::new(id, name, class, start, end)
        })
        .collect()
}

fn offset(rng: &mut StdRng, max: f64) -> f64 {
    if max == 0.0 {
        0.0
    } else {
        rng.gen_range(-max..=max)
    }
}

/// Vehicles touched by one [`sync_fleet`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FleetDiff {
    pub added: Vec<VehicleId>,
    pub updated: Vec<VehicleId>,
    pub removed: Vec<VehicleId>,
}

impl FleetDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Reconcile the world with a registry snapshot, diffing by vehicle id.
///
/// New vehicles are spawned at their patrol start and request a route.
/// Existing vehicles keep position, animation and dispatch status; if their
/// endpoints or class changed a new route is requested and the animation
/// restarts once it arrives. Missing vehicles are despawned. Requires `FleetIndex`, `RouteProvider` and
/// `SimulationClock` resources.
pub fn sync_fleet(world: &mut World, records: &[FleetRecord]) -> FleetDiff {
    let mut diff = FleetDiff::default();
    let incoming: HashSet<VehicleId> = records.iter().map(|r| r.id).collect();

    let stale: Vec<VehicleId> = world
        .resource::<FleetIndex>()
        .ids()
        .into_iter()
        .filter(|id| !incoming.contains(id))
        .collect();
    for id in stale {
        let entity = world.resource_mut::<FleetIndex>().remove(id);
        if let Some(entity) = entity {
            world.despawn(entity);
        }
        world
            .resource_mut::<RouteProvider>()
            .cancel_requesters(|r| *r == RouteRequester::Vehicle(id));
        debug!(vehicle = %id, "vehicle removed from fleet");
        diff.removed.push(id);
    }

    for record in records {
        let existing = world.resource::<FleetIndex>().get(record.id);
        match existing {
            None => {
                let entity = world
                    .spawn((
                        Vehicle {
                            id: record.id,
                            name: record.name.clone(),
                            class: record.class,
                            status: record.status,
                        },
                        Position(record.start),
                        Heading(0.0),
                        record.patrol(),
                        AnimationState::default(),
                    ))
                    .id();
                world.resource_mut::<FleetIndex>().insert(record.id, entity);
                request_patrol_route(world, entity, record);
                diff.added.push(record.id);
            }
            Some(entity) => {
                if update_vehicle(world, entity, record) {
                    diff.updated.push(record.id);
                }
            }
        }
    }

    if !diff.is_empty() {
        info!(
            added = diff.added.len(),
            updated = diff.updated.len(),
            removed = diff.removed.len(),
            "fleet synchronised"
        );
    }
    diff
}

/// Returns true if anything about the vehicle changed.
fn update_vehicle(world: &mut World, entity: Entity, record: &FleetRecord) -> bool {
    let Some(mut entity_mut) = world.get_entity_mut(entity) else {
        return false;
    };
    let patrol_changed = entity_mut
        .get::<PatrolEndpoints>()
        .map_or(true, |p| *p != record.patrol());
    let (class_changed, name_changed) = entity_mut
        .get::<Vehicle>()
        .map_or((true, true), |v| (v.class != record.class, v.name != record.name));

    if let Some(mut vehicle) = entity_mut.get_mut::<Vehicle>() {
        vehicle.name = record.name.clone();
        vehicle.class = record.class;
    }
    if !(patrol_changed || class_changed) {
        return name_changed;
    }

    entity_mut.insert(record.patrol());
    world
        .resource_mut::<RouteProvider>()
        .cancel_requesters(|r| *r == RouteRequester::Vehicle(record.id));
    request_patrol_route(world, entity, record);
    true
}

/// Ask for the vehicle's patrol route; a cache hit is applied immediately.
fn request_patrol_route(world: &mut World, entity: Entity, record: &FleetRecord) {
    let request = RouteRequest::new(record.start, record.end, record.class.transport_mode());
    let lookup = world.resource_scope(|world, mut provider: Mut<RouteProvider>| {
        let mut clock = world.resource_mut::<SimulationClock>();
        provider.resolve(request, RouteRequester::Vehicle(record.id), &mut clock)
    });
    if let RouteLookup::Ready(summary) = lookup {
        if let Some(mut entity_mut) = world.get_entity_mut(entity) {
            entity_mut.insert((
                AssignedRoute(summary.path),
                AnimationState {
                    route_loaded: true,
                    ..Default::default()
                },
            ));
        }
    }
}
