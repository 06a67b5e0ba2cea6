//! Directions via an OSRM HTTP endpoint (`/route/v1/{profile}/...`).

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::warn;

use super::{DirectionsResponse, DirectionsService, DirectionsStatus, TransportMode};
use crate::geo::Coordinate;

/// Calls OSRM synchronously. Latency is still simulated by the
/// [`super::RouteProvider`], so the session clock stays deterministic.
pub struct OsrmDirections {
    client: Client,
    endpoint: String,
}

impl OsrmDirections {
    pub fn new(endpoint: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(Duration::from_secs(5)).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, origin: Coordinate, destination: Coordinate, mode: TransportMode) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.endpoint,
            profile(mode),
            origin.lng,
            origin.lat,
            destination.lng,
            destination.lat,
        )
    }
}

fn profile(mode: TransportMode) -> &'static str {
    match mode {
        TransportMode::Driving => "driving",
        TransportMode::Bicycling => "cycling",
    }
}

fn status_for_code(code: &str) -> DirectionsStatus {
    match code {
        "Ok" => DirectionsStatus::Ok,
        "NoRoute" => DirectionsStatus::ZeroResults,
        "NoSegment" => DirectionsStatus::NotFound,
        "InvalidUrl" | "InvalidService" | "InvalidVersion" | "InvalidOptions" | "InvalidQuery"
        | "InvalidValue" | "TooBig" => DirectionsStatus::InvalidRequest,
        _ => DirectionsStatus::UnknownError,
    }
}

fn status_for_http(status: StatusCode) -> DirectionsStatus {
    match status {
        StatusCode::TOO_MANY_REQUESTS => DirectionsStatus::OverQueryLimit,
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DirectionsStatus::RequestDenied,
        StatusCode::BAD_REQUEST => DirectionsStatus::InvalidRequest,
        _ => DirectionsStatus::UnknownError,
    }
}

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    routes: Option<Vec<OsrmRoute>>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    distance: f64, // metres
    duration: f64, // seconds
    geometry: OsrmGeometry,
}

#[derive(Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>, // [lng, lat]
}

impl OsrmResponse {
    fn into_directions(self) -> DirectionsResponse {
        let status = status_for_code(&self.code);
        if status != DirectionsStatus::Ok {
            return DirectionsResponse::failed(status);
        }
        let Some(route) = self.routes.and_then(|routes| routes.into_iter().next()) else {
            return DirectionsResponse::failed(DirectionsStatus::ZeroResults);
        };
        let path = route
            .geometry
            .coordinates
            .iter()
            .map(|[lng, lat]| Coordinate::new(*lat, *lng))
            .collect();
        DirectionsResponse::ok(path, route.distance, route.duration)
    }
}

impl DirectionsService for OsrmDirections {
    fn route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
        mode: TransportMode,
    ) -> DirectionsResponse {
        let url = self.url(origin, destination, mode);
        let response = match self.client.get(&url).send() {
            Ok(r) => r,
            Err(err) => {
                warn!(%err, %mode, "OSRM request failed");
                return DirectionsResponse::failed(DirectionsStatus::UnknownError);
            }
        };
        // OSRM reports NoRoute and friends with a 400 and a JSON body.
        let http_status = response.status();
        match response.json::<OsrmResponse>() {
            Ok(body) => body.into_directions(),
            Err(err) => {
                warn!(%err, %http_status, %mode, "unreadable OSRM response");
                DirectionsResponse::failed(status_for_http(http_status))
            }
        }
    }
}
