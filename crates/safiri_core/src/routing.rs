//! Route resolution: directions collaborator abstraction, session route cache
//! and the debounced, fallback-aware [`RouteProvider`].
//!
//! Two directions backends ship with the crate:
//!
//! - **`StraightLineDirections`**: great-circle polyline between the endpoints. Zero dependencies.
//! - **`OsrmDirections`** (feature `osrm`): calls a local/remote OSRM HTTP endpoint.
//!
//! Anything else (a hosted maps API, a scripted test double) plugs in through
//! the [`DirectionsService`] trait.

pub mod cache;
pub mod provider;

#[cfg(feature = "osrm")]
pub mod osrm;

use std::fmt;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geo::{haversine_distance_km, CoordKey, Coordinate};

pub use cache::RouteCache;
pub use provider::{RouteCompletion, RouteLookup, RouteProvider, RouteRequester, RouteStats};

// ---------------------------------------------------------------------------
// Core types
// ---------------------------------------------------------------------------

/// Routing profile requested from the directions collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TransportMode {
    Driving,
    Bicycling,
}

impl TransportMode {
    /// The single alternate mode tried when this one fails, if any.
    pub fn fallback(self) -> Option<TransportMode> {
        match self {
            TransportMode::Bicycling => Some(TransportMode::Driving),
            TransportMode::Driving => None,
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportMode::Driving => f.write_str("driving"),
            TransportMode::Bicycling => f.write_str("bicycling"),
        }
    }
}

/// Ordered polyline samples of a resolved route and the mode that produced them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePath {
    pub points: Vec<Coordinate>,
    pub mode: TransportMode,
}

impl RoutePath {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// A successful route resolution. The path is shared read-only with its readers.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub distance_m: f64,
    pub duration_s: f64,
    pub path: Arc<RoutePath>,
}

impl RouteSummary {
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }
}

/// Cache and debounce key: both endpoints plus the requested mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RouteKey {
    pub origin: CoordKey,
    pub destination: CoordKey,
    pub mode: TransportMode,
}

/// A route query as issued by a caller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRequest {
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// Mode the caller asked for; fallback never changes the cache key.
    pub mode: TransportMode,
}

impl RouteRequest {
    pub fn new(origin: Coordinate, destination: Coordinate, mode: TransportMode) -> Self {
        Self {
            origin,
            destination,
            mode,
        }
    }

    pub fn key(&self) -> RouteKey {
        RouteKey {
            origin: self.origin.key(),
            destination: self.destination.key(),
            mode: self.mode,
        }
    }
}

/// Status codes reported by a directions collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DirectionsStatus {
    Ok,
    NotFound,
    ZeroResults,
    OverQueryLimit,
    RequestDenied,
    InvalidRequest,
    UnknownError,
}

impl fmt::Display for DirectionsStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DirectionsStatus::Ok => "OK",
            DirectionsStatus::NotFound => "NOT_FOUND",
            DirectionsStatus::ZeroResults => "ZERO_RESULTS",
            DirectionsStatus::OverQueryLimit => "OVER_QUERY_LIMIT",
            DirectionsStatus::RequestDenied => "REQUEST_DENIED",
            DirectionsStatus::InvalidRequest => "INVALID_REQUEST",
            DirectionsStatus::UnknownError => "UNKNOWN_ERROR",
        };
        f.write_str(text)
    }
}

/// Raw answer from a directions collaborator.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectionsResponse {
    pub status: DirectionsStatus,
    pub path: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
}

impl DirectionsResponse {
    pub fn ok(path: Vec<Coordinate>, distance_m: f64, duration_s: f64) -> Self {
        Self {
            status: DirectionsStatus::Ok,
            path,
            distance_m,
            duration_s,
        }
    }

    pub fn failed(status: DirectionsStatus) -> Self {
        Self {
            status,
            path: Vec::new(),
            distance_m: 0.0,
            duration_s: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("route resolution failed ({status}) for {mode} request")]
    ResolutionFailed {
        status: DirectionsStatus,
        mode: TransportMode,
    },
}

/// Directions collaborator. Implementations must be `Send + Sync` so the
/// service can be stored as a shared ECS resource.
pub trait DirectionsService: Send + Sync {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TransportMode,
    ) -> DirectionsResponse;
}

/// ECS resource wrapping a boxed directions service.
#[derive(Resource)]
pub struct DirectionsServiceResource(pub Box<dyn DirectionsService>);

// ---------------------------------------------------------------------------
// Straight-line directions (always available)
// ---------------------------------------------------------------------------

/// Great-circle polyline between the endpoints, sampled into `samples` points.
#[derive(Debug, Clone, Copy)]
pub struct StraightLineDirections {
    pub samples: usize,
    pub driving_kmh: f64,
    pub bicycling_kmh: f64,
}

impl Default for StraightLineDirections {
    fn default() -> Self {
        Self {
            samples: 8,
            driving_kmh: 40.0,
            bicycling_kmh: 15.0,
        }
    }
}

impl DirectionsService for StraightLineDirections {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TransportMode,
    ) -> DirectionsResponse {
        let samples = self.samples.max(2);
        let path: Vec<Coordinate> = (0..samples)
            .map(|i| origin.lerp(destination, i as f64 / (samples - 1) as f64))
            .collect();
        let distance_km = haversine_distance_km(origin, destination);
        let speed_kmh = match mode {
            TransportMode::Driving => self.driving_kmh,
            TransportMode::Bicycling => self.bicycling_kmh,
        };
        let duration_s = (distance_km / speed_kmh.max(1.0)) * 3600.0;
        DirectionsResponse::ok(path, distance_km * 1000.0, duration_s)
    }
}

/// Bring a raw collaborator answer into a shape the rest of the crate can rely on:
/// finite non-negative metrics, no consecutive duplicate points, and a path that
/// at least spans the requested endpoints.
pub(crate) fn normalize_response(
    request: &RouteRequest,
    mut response: DirectionsResponse,
) -> DirectionsResponse {
    if response.status != DirectionsStatus::Ok {
        return response;
    }
    if !response.distance_m.is_finite()
        || !response.duration_s.is_finite()
        || response.distance_m < 0.0
        || response.duration_s < 0.0
    {
        return DirectionsResponse::failed(DirectionsStatus::UnknownError);
    }
    if response.path.is_empty() {
        response.path = vec![request.origin, request.destination];
    }
    response.path.dedup();
    response
}
