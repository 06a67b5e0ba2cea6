//! Geographic primitives: coordinates, great-circle distance and bearings.
//!
//! All functions are pure. Distances use a spherical Earth of radius
//! [`EARTH_RADIUS_KM`]; bearings are initial compass bearings in `[0, 360)`.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by every distance calculation in the crate.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Quantization step for [`CoordKey`]: 1e-6 degrees (~0.11 m at the equator).
const KEY_SCALE: f64 = 1_000_000.0;

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Linear interpolation between `self` and `other`; `t` is clamped to `[0, 1]`
    /// and the endpoints are returned exactly.
    pub fn lerp(self, other: Coordinate, t: f64) -> Coordinate {
        if t <= 0.0 {
            return self;
        }
        if t >= 1.0 {
            return other;
        }
        Coordinate {
            lat: self.lat + (other.lat - self.lat) * t,
            lng: self.lng + (other.lng - self.lng) * t,
        }
    }

    /// Hashable key for this coordinate on a 1e-6 degree grid.
    pub fn key(self) -> CoordKey {
        CoordKey::from(self)
    }
}

/// Coordinate quantized to micro-degrees so it can be used as a map key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordKey {
    lat_e6: i64,
    lng_e6: i64,
}

impl From<Coordinate> for CoordKey {
    fn from(c: Coordinate) -> Self {
        Self {
            lat_e6: (c.lat * KEY_SCALE).round() as i64,
            lng_e6: (c.lng * KEY_SCALE).round() as i64,
        }
    }
}

impl From<CoordKey> for Coordinate {
    fn from(k: CoordKey) -> Self {
        Coordinate::new(k.lat_e6 as f64 / KEY_SCALE, k.lng_e6 as f64 / KEY_SCALE)
    }
}

/// Great-circle distance in kilometres (haversine formula).
pub fn haversine_distance_km(a: Coordinate, b: Coordinate) -> f64 {
    let (lat1, lon1) = (a.lat.to_radians(), a.lng.to_radians());
    let (lat2, lon2) = (b.lat.to_radians(), b.lng.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let sin_dlat = (dlat * 0.5).sin();
    let sin_dlon = (dlon * 0.5).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_KM * c
}

/// Initial compass bearing from `a` to `b` in degrees, in `[0, 360)`.
///
/// Returns `0.0` when the two points coincide; callers animating along a
/// segment should treat that as "no heading change".
pub fn bearing_degrees(a: Coordinate, b: Coordinate) -> f64 {
    if a == b {
        return 0.0;
    }
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlon = (b.lng - a.lng).to_radians();
    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    normalize_degrees(y.atan2(x).to_degrees())
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}
