//! Session configuration: every timer, rate and limit of a map session.

use serde::{Deserialize, Serialize};

use crate::animation::AnimationConfig;
use crate::error::ConfigError;
use crate::pricing::FareConfig;
use crate::search_wave::SearchWaveConfig;
use crate::trip::TripConfig;

/// Configuration for a [`crate::session::MapSession`].
///
/// Missing fields take their defaults, so `{}` is a valid configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Window in which route requests for the same key are coalesced.
    pub debounce_ms: u64,
    pub directions_latency_ms: u64,
    pub geocode_latency_ms: u64,
    pub geocode_cache_capacity: usize,
    pub trip: TripConfig,
    pub animation: AnimationConfig,
    pub fares: FareConfig,
    pub search_wave: SearchWaveConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 100,
            directions_latency_ms: 250,
            geocode_latency_ms: 150,
            geocode_cache_capacity: 256,
            trip: TripConfig::default(),
            animation: AnimationConfig::default(),
            fares: FareConfig::default(),
            search_wave: SearchWaveConfig::default(),
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn with_directions_latency_ms(mut self, latency_ms: u64) -> Self {
        self.directions_latency_ms = latency_ms;
        self
    }

    pub fn with_geocode_latency_ms(mut self, latency_ms: u64) -> Self {
        self.geocode_latency_ms = latency_ms;
        self
    }

    pub fn with_dispatch_delay_ms(mut self, delay_ms: u64) -> Self {
        self.trip.dispatch_delay_ms = delay_ms;
        self
    }

    pub fn with_quote_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.trip.quote_timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_match_radius_km(mut self, radius_km: f64) -> Self {
        self.trip.max_match_radius_km = radius_km;
        self
    }

    pub fn with_animation(mut self, animation: AnimationConfig) -> Self {
        self.animation = animation;
        self
    }

    pub fn with_fares(mut self, fares: FareConfig) -> Self {
        self.fares = fares;
        self
    }
}
