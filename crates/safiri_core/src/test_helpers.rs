//! Test helpers: scripted collaborators and shared coordinates.
//!
//! Used by unit tests, integration tests and benches to drive a session
//! without any external service.

use std::sync::{Arc, Mutex};

use crate::geo::Coordinate;
use crate::geocode::{GeocodeResponse, Geocoder};
use crate::routing::{DirectionsResponse, DirectionsService, DirectionsStatus, TransportMode};

/// Pickup used by the pricing scenario (Nairobi CBD).
pub const SCENARIO_PICKUP: Coordinate = Coordinate::new(-1.2864, 36.8172);
/// Destination used by the pricing scenario.
pub const SCENARIO_DESTINATION: Coordinate = Coordinate::new(-1.2800, 36.8300);

/// Shared record of the directions calls a scripted service received.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<(Coordinate, Coordinate, TransportMode)>>>);

impl CallLog {
    fn record(&self, origin: Coordinate, destination: Coordinate, mode: TransportMode) {
        if let Ok(mut calls) = self.0.lock() {
            calls.push((origin, destination, mode));
        }
    }

    pub fn len(&self) -> usize {
        self.0.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Modes in call order.
    pub fn modes(&self) -> Vec<TransportMode> {
        self.0
            .lock()
            .map(|c| c.iter().map(|(_, _, mode)| *mode).collect())
            .unwrap_or_default()
    }
}

/// Directions stub answering with a fixed status per mode and a fixed
/// distance/duration. Successful paths are the two endpoints.
#[derive(Debug, Clone)]
pub struct ScriptedDirections {
    pub driving: DirectionsStatus,
    pub bicycling: DirectionsStatus,
    pub distance_m: f64,
    pub duration_s: f64,
    log: CallLog,
}

impl ScriptedDirections {
    pub fn ok(distance_m: f64, duration_s: f64) -> Self {
        Self {
            driving: DirectionsStatus::Ok,
            bicycling: DirectionsStatus::Ok,
            distance_m,
            duration_s,
            log: CallLog::default(),
        }
    }

    pub fn with_statuses(mut self, driving: DirectionsStatus, bicycling: DirectionsStatus) -> Self {
        self.driving = driving;
        self.bicycling = bicycling;
        self
    }

    /// Handle that keeps observing calls after the service is boxed.
    pub fn call_log(&self) -> CallLog {
        self.log.clone()
    }
}

impl DirectionsService for ScriptedDirections {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TransportMode,
    ) -> DirectionsResponse {
        self.log.record(origin, destination, mode);
        let status = match mode {
            TransportMode::Driving => self.driving,
            TransportMode::Bicycling => self.bicycling,
        };
        if status == DirectionsStatus::Ok {
            DirectionsResponse::ok(vec![origin, destination], self.distance_m, self.duration_s)
        } else {
            DirectionsResponse::failed(status)
        }
    }
}

/// Geocoder stub: a fixed status, labels derived from the coordinate.
#[derive(Debug, Clone, Copy)]
pub struct ScriptedGeocoder {
    pub status: DirectionsStatus,
}

impl ScriptedGeocoder {
    pub fn ok() -> Self {
        Self {
            status: DirectionsStatus::Ok,
        }
    }

    pub fn failing(status: DirectionsStatus) -> Self {
        Self { status }
    }

    pub fn label_for(coordinate: Coordinate) -> String {
        format!("Pin {:.4}, {:.4}", coordinate.lat, coordinate.lng)
    }
}

impl Geocoder for ScriptedGeocoder {
    fn reverse_geocode(&self, coordinate: Coordinate) -> GeocodeResponse {
        if self.status == DirectionsStatus::Ok {
            GeocodeResponse::ok(Self::label_for(coordinate))
        } else {
            GeocodeResponse::failed(self.status)
        }
    }
}
