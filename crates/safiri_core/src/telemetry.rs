//! Session telemetry: counters describing what the map session has done.

use bevy_ecs::prelude::Resource;

use crate::routing::RouteStats;

/// Counters maintained by the systems. Route-level counters live on the
/// route provider and are merged in [`TelemetrySnapshot`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Resource)]
pub struct SessionTelemetry {
    pub animation_ticks: u64,
    pub geocode_requests: u64,
    pub geocode_cache_hits: u64,
    pub geocode_failures: u64,
    pub quotes_resolved: u64,
    pub quotes_defaulted: u64,
    pub matches: u64,
    pub no_driver_found: u64,
    pub trips_cancelled: u64,
    pub stale_events_dropped: u64,
}

/// Read-only view handed to the presentation layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub session: SessionTelemetry,
    pub routes: RouteStats,
}

impl TelemetrySnapshot {
    /// Stale completions dropped anywhere in the session.
    pub fn total_stale_dropped(&self) -> u64 {
        self.session.stale_events_dropped + self.routes.stale_events_dropped
    }
}
