//! Quote timeout: price with an estimate when no route came back in time.

use bevy_ecs::prelude::{Res, ResMut};
use tracing::debug;

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::pricing::FareConfig;
use crate::routing::RouteProvider;
use crate::telemetry::SessionTelemetry;
use crate::trip::TripOrchestrator;

/// Pricing waited too long: show an estimate instead of "Calculating...".
pub fn quote_timeout_system(
    event: Res<CurrentEvent>,
    fares: Res<FareConfig>,
    provider: Res<RouteProvider>,
    mut trip: ResMut<TripOrchestrator>,
    mut telemetry: ResMut<SessionTelemetry>,
) {
    if event.0.kind != EventKind::QuoteTimeout {
        return;
    }
    let Some(EventSubject::Trip { generation }) = event.0.subject else {
        return;
    };
    match trip.on_quote_timeout(generation, provider.cache(), &fares) {
        Some(_) => telemetry.quotes_defaulted += 1,
        None => {
            // Already priced, or the trip context moved on.
            telemetry.stale_events_dropped += 1;
            debug!(generation, "quote timeout ignored");
        }
    }
}
