//! Reverse geocoding of map clicks into human-readable labels.
//!
//! Lookups are served from an LRU cache keyed by the quantised coordinate.
//! Misses call the external [`Geocoder`] and deliver its answer after the
//! collaborator latency as a `GeocodeResponse` event.

use std::collections::HashMap;
use std::num::NonZeroUsize;

use bevy_ecs::prelude::Resource;
use lru::LruCache;
use tracing::{debug, warn};

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::error::GeocodeError;
use crate::geo::{haversine_distance_km, CoordKey, Coordinate};
use crate::routing::DirectionsStatus;

#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResponse {
    pub status: DirectionsStatus,
    pub label: Option<String>,
}

impl GeocodeResponse {
    pub fn ok(label: impl Into<String>) -> Self {
        Self {
            status: DirectionsStatus::Ok,
            label: Some(label.into()),
        }
    }

    pub fn failed(status: DirectionsStatus) -> Self {
        Self {
            status,
            label: None,
        }
    }
}

/// External reverse-geocoding collaborator.
pub trait Geocoder: Send + Sync {
    fn reverse_geocode(&self, coordinate: Coordinate) -> GeocodeResponse;
}

#[derive(Resource)]
pub struct GeocoderResource(pub Box<dyn Geocoder>);

/// Offline geocoder: names the nearest landmark within `radius_km`, otherwise
/// formats the coordinate.
#[derive(Debug, Clone)]
pub struct LandmarkGeocoder {
    pub landmarks: Vec<(String, Coordinate)>,
    pub radius_km: f64,
}

impl LandmarkGeocoder {
    pub fn nairobi() -> Self {
        let landmarks = [
            ("Nairobi CBD", -1.286389, 36.817223),
            ("Westlands", -1.2676, 36.8108),
            ("Kilimani", -1.2921, 36.7856),
            ("Upper Hill", -1.2995, 36.8150),
            ("Parklands", -1.2630, 36.8190),
            ("South B", -1.3100, 36.8350),
            ("Karen", -1.3197, 36.7073),
            ("Eastleigh", -1.2740, 36.8500),
        ];
        Self {
            landmarks: landmarks
                .iter()
                .map(|(name, lat, lng)| (name.to_string(), Coordinate::new(*lat, *lng)))
                .collect(),
            radius_km: 1.5,
        }
    }
}

impl Default for LandmarkGeocoder {
    fn default() -> Self {
        Self::nairobi()
    }
}

impl Geocoder for LandmarkGeocoder {
    fn reverse_geocode(&self, coordinate: Coordinate) -> GeocodeResponse {
        if !coordinate.lat.is_finite() || !coordinate.lng.is_finite() {
            return GeocodeResponse::failed(DirectionsStatus::InvalidRequest);
        }
        let nearest = self
            .landmarks
            .iter()
            .map(|(name, at)| (name, haversine_distance_km(*at, coordinate)))
            .filter(|(_, d)| *d <= self.radius_km)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        match nearest {
            Some((name, _)) => GeocodeResponse::ok(name.clone()),
            None => GeocodeResponse::ok(format!("{:.5}, {:.5}", coordinate.lat, coordinate.lng)),
        }
    }
}

/// Immediate answer to [`ReverseGeocoder::request`].
#[derive(Debug, Clone, PartialEq)]
pub enum GeocodeLookup {
    Ready(String),
    Pending { request_id: u64 },
}

#[derive(Debug)]
struct PendingGeocode {
    coordinate: Coordinate,
    response: GeocodeResponse,
}

/// Cached reverse geocoding with in-flight request tracking.
#[derive(Debug, Resource)]
pub struct ReverseGeocoder {
    cache: LruCache<CoordKey, String>,
    pending: HashMap<u64, PendingGeocode>,
    latency_ms: u64,
    next_request_id: u64,
}

impl ReverseGeocoder {
    pub fn new(capacity: usize, latency_ms: u64) -> Self {
        Self {
            cache: LruCache::new(NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN)),
            pending: HashMap::new(),
            latency_ms,
            next_request_id: 1,
        }
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn cached_len(&self) -> usize {
        self.cache.len()
    }

    pub fn request(
        &mut self,
        coordinate: Coordinate,
        service: &dyn Geocoder,
        clock: &mut SimulationClock,
    ) -> GeocodeLookup {
        if let Some(label) = self.cache.get(&coordinate.key()) {
            debug!(?coordinate, "geocode cache hit");
            return GeocodeLookup::Ready(label.clone());
        }
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        let response = service.reverse_geocode(coordinate);
        self.pending.insert(
            request_id,
            PendingGeocode {
                coordinate,
                response,
            },
        );
        clock.schedule_in(
            self.latency_ms,
            EventKind::GeocodeResponse,
            Some(EventSubject::Geocode { request_id }),
        );
        GeocodeLookup::Pending { request_id }
    }

    /// Deliver a response. `None` when the request was cancelled.
    pub fn on_response(
        &mut self,
        request_id: u64,
    ) -> Option<(Coordinate, Result<String, GeocodeError>)> {
        let PendingGeocode {
            coordinate,
            response,
        } = self.pending.remove(&request_id)?;
        let result = match (response.status, response.label) {
            (DirectionsStatus::Ok, Some(label)) if !label.trim().is_empty() => {
                self.cache.put(coordinate.key(), label.clone());
                Ok(label)
            }
            (DirectionsStatus::Ok, _) => Err(GeocodeError::Failed {
                status: DirectionsStatus::ZeroResults,
            }),
            (status, _) => Err(GeocodeError::Failed { status }),
        };
        if let Err(err) = &result {
            warn!(%err, ?coordinate, "reverse geocode failed");
        }
        Some((coordinate, result))
    }

    /// Drop all outstanding requests; their responses will be ignored.
    pub fn cancel_all(&mut self) -> usize {
        let cancelled = self.pending.len();
        self.pending.clear();
        cancelled
    }
}
