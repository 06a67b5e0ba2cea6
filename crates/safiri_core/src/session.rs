//! Presentation-facing facade over the ECS world.
//!
//! A [`MapSession`] owns the world and the schedule. User actions are applied
//! synchronously; everything that waits (debounce windows, collaborator
//! latency, dispatch delay, timeouts, animation frames) happens when virtual
//! time is advanced with [`MapSession::advance`] or [`MapSession::run_until`].
//! Readers get plain snapshots, never references into the world.

use bevy_ecs::prelude::{Entity, Schedule, World};
use bevy_ecs::world::Mut;
use tracing::info;

use crate::animation::{AnimationConfig, AnimatorState};
use crate::clock::SimulationClock;
use crate::config::SessionConfig;
use crate::ecs::{
    AnimationState, AssignedRoute, Direction, FleetIndex, Heading, PatrolEndpoints, Position,
    Vehicle, VehicleClass, VehicleId, VehicleStatus,
};
use crate::error::{InboxError, SelectionError};
use crate::fleet::{sync_fleet, FleetDiff, FleetRecord};
use crate::geo::Coordinate;
use crate::geocode::{GeocodeLookup, Geocoder, GeocoderResource, LandmarkGeocoder, ReverseGeocoder};
use crate::inbox::{DriverInboxes, IncomingTrip};
use crate::matching::{MatchingAlgorithm, MatchingAlgorithmResource};
use crate::pricing::FareConfig;
use crate::routing::{
    DirectionsService, DirectionsServiceResource, RouteLookup, RouteProvider, RouteRequest,
    RouteRequester, StraightLineDirections,
};
use crate::runner::{run_until, session_schedule};
use crate::search_wave::{SearchWave, SearchWaveConfig, SearchWaveSnapshot};
use crate::systems::{release_vehicle_in_world, settle_context_change};
use crate::telemetry::{SessionTelemetry, TelemetrySnapshot};
use crate::trip::{
    Location, LocationSlot, TripConfig, TripContextChange, TripOrchestrator, TripPhase,
    TripSnapshot,
};

/// Display state of one fleet vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct VehicleSnapshot {
    pub id: VehicleId,
    pub name: String,
    pub class: VehicleClass,
    pub status: VehicleStatus,
    pub position: Coordinate,
    pub heading: f64,
    pub progress: f64,
    pub direction: Direction,
    pub route_loaded: bool,
    /// False while the trip display replaces fleet markers.
    pub visible: bool,
}

pub struct MapSession {
    world: World,
    schedule: Schedule,
}

impl MapSession {
    pub fn new(
        config: SessionConfig,
        directions: Box<dyn DirectionsService>,
        geocoder: Box<dyn Geocoder>,
    ) -> Self {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(SessionTelemetry::default());
        world.insert_resource(FleetIndex::default());
        world.insert_resource(RouteProvider::new(
            config.debounce_ms,
            config.directions_latency_ms,
        ));
        world.insert_resource(DirectionsServiceResource(directions));
        world.insert_resource(ReverseGeocoder::new(
            config.geocode_cache_capacity,
            config.geocode_latency_ms,
        ));
        world.insert_resource(GeocoderResource(geocoder));
        world.insert_resource(MatchingAlgorithmResource::default());
        world.insert_resource(TripOrchestrator::default());
        world.insert_resource(DriverInboxes::default());
        world.insert_resource(AnimatorState::default());
        world.insert_resource(SearchWave::default());
        world.insert_resource(config.trip);
        world.insert_resource(config.animation);
        world.insert_resource(config.fares);
        world.insert_resource(config.search_wave);
        Self {
            world,
            schedule: session_schedule(),
        }
    }

    /// Offline collaborators: straight-line directions and Nairobi landmarks.
    pub fn with_defaults(config: SessionConfig) -> Self {
        Self::new(
            config,
            Box::new(StraightLineDirections::default()),
            Box::new(LandmarkGeocoder::nairobi()),
        )
    }

    pub fn with_matching(mut self, algorithm: Box<dyn MatchingAlgorithm>) -> Self {
        self.world
            .insert_resource(MatchingAlgorithmResource::new(algorithm));
        self
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn now(&self) -> u64 {
        self.world.resource::<SimulationClock>().now()
    }

    // ---------------------------------------------------------------------
    // Time
    // ---------------------------------------------------------------------

    /// Advance virtual time by `ms`, processing every event on the way.
    pub fn advance(&mut self, ms: u64) -> usize {
        let until = self.now().saturating_add(ms);
        self.run_until(until)
    }

    pub fn run_until(&mut self, until_ms: u64) -> usize {
        run_until(&mut self.world, &mut self.schedule, until_ms)
    }

    // ---------------------------------------------------------------------
    // Fleet & map lifecycle
    // ---------------------------------------------------------------------

    pub fn load_fleet(&mut self, records: &[FleetRecord]) -> FleetDiff {
        self.refresh_fleet(records)
    }

    /// Replace the fleet with a registry snapshot, diffed by id.
    pub fn refresh_fleet(&mut self, records: &[FleetRecord]) -> FleetDiff {
        let diff = sync_fleet(&mut self.world, records);
        let mut inboxes = self.world.resource_mut::<DriverInboxes>();
        for id in &diff.removed {
            inboxes.remove_vehicle(*id);
        }
        diff
    }

    pub fn is_mounted(&self) -> bool {
        self.world.resource::<AnimatorState>().is_running()
    }

    /// Start the animation loop and re-request routes that were dropped while
    /// the map was away.
    pub fn mount_map(&mut self) {
        if self.is_mounted() {
            return;
        }
        let config = *self.world.resource::<AnimationConfig>();
        self.world
            .resource_scope(|world, mut animator: Mut<AnimatorState>| {
                let mut clock = world.resource_mut::<SimulationClock>();
                animator.start(&mut clock, &config);
            });

        let unrouted: Vec<(Entity, VehicleId, VehicleClass, PatrolEndpoints)> = self
            .world
            .query::<(Entity, &Vehicle, &PatrolEndpoints, &AnimationState)>()
            .iter(&self.world)
            .filter(|(_, _, _, state)| !state.route_loaded)
            .map(|(entity, vehicle, patrol, _)| (entity, vehicle.id, vehicle.class, *patrol))
            .collect();
        for (entity, id, class, patrol) in unrouted {
            let request = RouteRequest::new(patrol.start, patrol.end, class.transport_mode());
            if self.world.resource::<RouteProvider>().is_pending(&request.key()) {
                continue;
            }
            let lookup = self
                .world
                .resource_scope(|world, mut provider: Mut<RouteProvider>| {
                    let mut clock = world.resource_mut::<SimulationClock>();
                    provider.resolve(request, RouteRequester::Vehicle(id), &mut clock)
                });
            if let RouteLookup::Ready(summary) = lookup {
                self.world.entity_mut(entity).insert((
                    AssignedRoute(summary.path),
                    AnimationState {
                        route_loaded: true,
                        ..Default::default()
                    },
                ));
            }
        }
        info!(now = self.now(), "map mounted");
    }

    /// Stop every loop and drop pending requests. Responses already in flight
    /// still land in the route cache.
    pub fn unmount_map(&mut self) {
        self.world.resource_mut::<AnimatorState>().stop();
        self.world.resource_mut::<SearchWave>().stop();
        let routes = self.world.resource_mut::<RouteProvider>().cancel_pending();
        let geocodes = self.world.resource_mut::<ReverseGeocoder>().cancel_all();
        let was_searching = self.trip_phase() == TripPhase::Searching;
        let change = self.world.resource_mut::<TripOrchestrator>().interrupt();
        if was_searching {
            self.world.resource_mut::<SessionTelemetry>().trips_cancelled += 1;
        }
        self.settle(change);
        info!(routes, geocodes, "map unmounted");
    }

    // ---------------------------------------------------------------------
    // Location selection
    // ---------------------------------------------------------------------

    pub fn set_pickup(&mut self, location: Location) {
        self.set_location(LocationSlot::Pickup, location);
    }

    pub fn set_destination(&mut self, location: Location) {
        self.set_location(LocationSlot::Destination, location);
    }

    pub fn set_location(&mut self, slot: LocationSlot, location: Location) {
        let change = self
            .world
            .resource_mut::<TripOrchestrator>()
            .set_location(slot, location);
        self.settle(change);
    }

    pub fn clear_location(&mut self, slot: LocationSlot) {
        let change = self
            .world
            .resource_mut::<TripOrchestrator>()
            .clear_location(slot);
        self.settle(change);
    }

    /// Reverse-geocode a map click. A cached label is applied immediately;
    /// otherwise the location is set when the geocoder answers.
    pub fn click_map(&mut self, coordinate: Coordinate) -> GeocodeLookup {
        self.world.resource_mut::<SessionTelemetry>().geocode_requests += 1;
        let lookup = self
            .world
            .resource_scope(|world, mut geocoder: Mut<ReverseGeocoder>| {
                world.resource_scope(|world, service: Mut<GeocoderResource>| {
                    let mut clock = world.resource_mut::<SimulationClock>();
                    geocoder.request(coordinate, service.0.as_ref(), &mut clock)
                })
            });
        if let GeocodeLookup::Ready(label) = &lookup {
            self.world.resource_mut::<SessionTelemetry>().geocode_cache_hits += 1;
            let (_, change) = self
                .world
                .resource_mut::<TripOrchestrator>()
                .apply_map_click(Location::new(label.clone(), coordinate));
            self.settle(change);
        }
        lookup
    }

    pub fn select_vehicle_class(&mut self, class: VehicleClass) {
        self.world
            .resource_mut::<TripOrchestrator>()
            .select_vehicle_class(class);
    }

    // ---------------------------------------------------------------------
    // Trip flow
    // ---------------------------------------------------------------------

    pub fn request_price(&mut self) -> Result<(), SelectionError> {
        let config = self.world.resource::<TripConfig>().clone();
        let fares = self.world.resource::<FareConfig>().clone();
        let change = self
            .world
            .resource_scope(|world, mut trip: Mut<TripOrchestrator>| {
                world.resource_scope(|world, mut provider: Mut<RouteProvider>| {
                    let mut clock = world.resource_mut::<SimulationClock>();
                    trip.request_price(&mut provider, &mut clock, &config, &fares)
                })
            })?;
        if self.trip_phase() == TripPhase::ReadyToRequest {
            self.world.resource_mut::<SessionTelemetry>().quotes_resolved += 1;
        }
        self.settle(change);
        Ok(())
    }

    pub fn request_ride(&mut self, class: VehicleClass) -> Result<(), SelectionError> {
        let config = self.world.resource::<TripConfig>().clone();
        self.world
            .resource_scope(|world, mut trip: Mut<TripOrchestrator>| {
                let mut clock = world.resource_mut::<SimulationClock>();
                trip.request_ride(class, &mut clock, &config)
            })?;
        self.start_search_wave();
        Ok(())
    }

    pub fn retry(&mut self) -> Result<(), SelectionError> {
        let config = self.world.resource::<TripConfig>().clone();
        self.world
            .resource_scope(|world, mut trip: Mut<TripOrchestrator>| {
                let mut clock = world.resource_mut::<SimulationClock>();
                trip.retry(&mut clock, &config)
            })?;
        self.start_search_wave();
        Ok(())
    }

    pub fn cancel_trip(&mut self) -> Result<(), SelectionError> {
        let change = self.world.resource_mut::<TripOrchestrator>().cancel()?;
        self.world.resource_mut::<SessionTelemetry>().trips_cancelled += 1;
        self.settle(change);
        Ok(())
    }

    // ---------------------------------------------------------------------
    // Driver inbox
    // ---------------------------------------------------------------------

    pub fn incoming_trips(&self, vehicle: VehicleId) -> Vec<IncomingTrip> {
        self.world
            .resource::<DriverInboxes>()
            .incoming(vehicle)
            .to_vec()
    }

    pub fn active_trip(&self, vehicle: VehicleId) -> Option<IncomingTrip> {
        self.world.resource::<DriverInboxes>().active(vehicle).cloned()
    }

    pub fn accept_trip(&mut self, vehicle: VehicleId, trip_id: u64) -> Result<IncomingTrip, InboxError> {
        self.world
            .resource_mut::<DriverInboxes>()
            .accept(vehicle, trip_id)
            .cloned()
    }

    pub fn decline_trip(&mut self, vehicle: VehicleId, trip_id: u64) -> Result<IncomingTrip, InboxError> {
        self.world
            .resource_mut::<DriverInboxes>()
            .decline(vehicle, trip_id)
    }

    // ---------------------------------------------------------------------
    // Snapshots
    // ---------------------------------------------------------------------

    pub fn trip_phase(&self) -> TripPhase {
        self.world.resource::<TripOrchestrator>().phase()
    }

    pub fn trip(&self) -> TripSnapshot {
        self.world.resource::<TripOrchestrator>().snapshot()
    }

    /// Every fleet vehicle, ordered by id.
    pub fn vehicles(&self) -> Vec<VehicleSnapshot> {
        let visible = self.world.resource::<TripOrchestrator>().vehicles_visible();
        let mut vehicles: Vec<VehicleSnapshot> = self
            .world
            .iter_entities()
            .filter_map(|entity| {
                let vehicle = entity.get::<Vehicle>()?;
                let state = entity.get::<AnimationState>()?;
                Some(VehicleSnapshot {
                    id: vehicle.id,
                    name: vehicle.name.clone(),
                    class: vehicle.class,
                    status: vehicle.status,
                    position: entity.get::<Position>()?.0,
                    heading: entity.get::<Heading>().map_or(0.0, |h| h.0),
                    progress: state.progress,
                    direction: state.direction,
                    route_loaded: state.route_loaded,
                    visible,
                })
            })
            .collect();
        vehicles.sort_by_key(|v| v.id);
        vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<VehicleSnapshot> {
        self.vehicles().into_iter().find(|v| v.id == id)
    }

    pub fn search_wave(&self) -> Option<SearchWaveSnapshot> {
        self.world.resource::<SearchWave>().snapshot()
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            session: *self.world.resource::<SessionTelemetry>(),
            routes: self.world.resource::<RouteProvider>().stats(),
        }
    }

    fn start_search_wave(&mut self) {
        let Some(center) = self
            .world
            .resource::<TripOrchestrator>()
            .pickup()
            .map(|p| p.coordinate)
        else {
            return;
        };
        let config = *self.world.resource::<SearchWaveConfig>();
        self.world
            .resource_scope(|world, mut wave: Mut<SearchWave>| {
                let mut clock = world.resource_mut::<SimulationClock>();
                wave.start(center, &mut clock, &config);
            });
    }

    fn settle(&mut self, change: TripContextChange) {
        let released = self
            .world
            .resource_scope(|world, mut provider: Mut<RouteProvider>| {
                world.resource_scope(|world, mut wave: Mut<SearchWave>| {
                    let mut inboxes = world.resource_mut::<DriverInboxes>();
                    settle_context_change(&change, &mut provider, &mut wave, &mut inboxes)
                })
            });
        if let Some(id) = released {
            release_vehicle_in_world(&mut self.world, id);
        }
    }
}
