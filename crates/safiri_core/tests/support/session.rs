#![allow(dead_code)]

use safiri_core::fleet::FleetRecord;
use safiri_core::geocode::Geocoder;
use safiri_core::routing::DirectionsService;
use safiri_core::test_helpers::{
    ScriptedDirections, ScriptedGeocoder, SCENARIO_DESTINATION, SCENARIO_PICKUP,
};
use safiri_core::trip::{Location, TripPhase};
use safiri_core::{MapSession, SessionConfig};

/// Distance the scripted directions report for every route.
pub const SCENARIO_DISTANCE_M: f64 = 3200.0;
pub const SCENARIO_DURATION_S: f64 = 540.0;

/// Builder for sessions wired to scripted collaborators.
pub struct TestSessionBuilder {
    config: SessionConfig,
    directions: Box<dyn DirectionsService>,
    geocoder: Box<dyn Geocoder>,
    fleet: Vec<FleetRecord>,
    mounted: bool,
}

impl Default for TestSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestSessionBuilder {
    pub fn new() -> Self {
        Self {
            config: SessionConfig::default(),
            directions: Box::new(ScriptedDirections::ok(SCENARIO_DISTANCE_M, SCENARIO_DURATION_S)),
            geocoder: Box::new(ScriptedGeocoder::ok()),
            fleet: Vec::new(),
            mounted: false,
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_directions(mut self, directions: impl DirectionsService + 'static) -> Self {
        self.directions = Box::new(directions);
        self
    }

    pub fn with_geocoder(mut self, geocoder: impl Geocoder + 'static) -> Self {
        self.geocoder = Box::new(geocoder);
        self
    }

    pub fn with_fleet(mut self, fleet: Vec<FleetRecord>) -> Self {
        self.fleet = fleet;
        self
    }

    pub fn mounted(mut self) -> Self {
        self.mounted = true;
        self
    }

    pub fn build(self) -> MapSession {
        let mut session = MapSession::new(self.config, self.directions, self.geocoder);
        if !self.fleet.is_empty() {
            session.load_fleet(&self.fleet);
        }
        if self.mounted {
            session.mount_map();
        }
        session
    }
}

/// Enough virtual time for one debounced directions call to come back.
pub fn settle_routes(session: &mut MapSession) {
    session.advance(1_000);
}

/// Set the scenario pickup and destination and wait for the price.
pub fn priced_session(mut session: MapSession) -> MapSession {
    session.set_pickup(Location::new("Nairobi CBD", SCENARIO_PICKUP));
    session.set_destination(Location::new("Upper Hill", SCENARIO_DESTINATION));
    session.request_price().expect("price request accepted");
    settle_routes(&mut session);
    assert_eq!(session.trip_phase(), TripPhase::ReadyToRequest);
    session
}
