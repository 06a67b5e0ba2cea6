//! Trip-request state machine: location selection, pricing, dispatch and cancellation.

pub mod orchestrator;

use std::fmt;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ecs::{VehicleClass, VehicleId};
use crate::geo::Coordinate;
use crate::pricing::{FareQuote, TripQuote};
use crate::routing::RouteSummary;

pub use orchestrator::{DispatchOutcome, TripContextChange, TripOrchestrator};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TripPhase {
    /// No pickup or destination set.
    Idle,
    /// Exactly one of pickup/destination set.
    LocationsPartial,
    /// Both set, no price yet.
    LocationsSet,
    /// Waiting for a route to price the trip.
    Pricing,
    /// Fares shown for both classes.
    ReadyToRequest,
    /// Simulated dispatch in progress.
    Searching,
    NoDriverFound,
    DriverConfirmed,
    Cancelled,
}

impl fmt::Display for TripPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LocationSlot {
    Pickup,
    Destination,
}

/// A selected place: coordinate plus the label shown to the rider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub coordinate: Coordinate,
    pub label: String,
}

impl Location {
    pub fn new(label: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            label: label.into(),
        }
    }
}

/// The rider's confirmed request, created when a class is chosen.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRequest {
    pub pickup: Location,
    pub destination: Location,
    pub vehicle_class: VehicleClass,
    pub fare_estimate: FareQuote,
    pub distance_km: f64,
    pub duration_s: f64,
    pub status: TripPhase,
}

/// Payload shown when dispatch found a vehicle.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchedDriver {
    pub vehicle_id: VehicleId,
    pub name: String,
    pub class: VehicleClass,
    pub position: Coordinate,
    pub pickup_distance_km: f64,
}

/// Timers and limits of the trip flow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct TripConfig {
    pub dispatch_delay_ms: u64,
    pub quote_timeout_ms: u64,
    pub max_match_radius_km: f64,
    /// Rider label shown in driver inboxes.
    pub rider_name: String,
}

impl Default for TripConfig {
    fn default() -> Self {
        Self {
            dispatch_delay_ms: 2000,
            quote_timeout_ms: 5000,
            max_match_radius_km: crate::matching::DEFAULT_MAX_RADIUS_KM,
            rider_name: "Rider".to_string(),
        }
    }
}

/// Read-only view of the orchestrator for the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub struct TripSnapshot {
    pub phase: TripPhase,
    pub generation: u64,
    pub pickup: Option<Location>,
    pub destination: Option<Location>,
    pub selected_class: VehicleClass,
    pub quote: Option<TripQuote>,
    /// True while pricing and the last route attempt failed ("Calculating...").
    pub quote_failed: bool,
    pub route: Option<RouteSummary>,
    pub request: Option<TripRequest>,
    pub matched: Option<MatchedDriver>,
}
