//! Directions answer arrived: cache it, retry with the fallback mode, or deliver it.

use bevy_ecs::prelude::{Commands, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::FleetIndex;
use crate::pricing::FareConfig;
use crate::routing::{DirectionsServiceResource, RouteProvider};
use crate::systems::deliver_route_completions;
use crate::telemetry::SessionTelemetry;
use crate::trip::TripOrchestrator;

/// The directions collaborator answered. A failure may trigger the provider's
/// fallback attempt instead of completing.
#[allow(clippy::too_many_arguments)]
pub fn directions_response_system(
    mut commands: Commands,
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    service: Res<DirectionsServiceResource>,
    index: Res<FleetIndex>,
    fares: Res<FareConfig>,
    mut provider: ResMut<RouteProvider>,
    mut trip: ResMut<TripOrchestrator>,
    mut telemetry: ResMut<SessionTelemetry>,
) {
    if event.0.kind != EventKind::DirectionsResponse {
        return;
    }
    let Some(EventSubject::Route { key, token }) = event.0.subject else {
        return;
    };
    let completions = provider.on_directions_response(key, token, service.0.as_ref(), &mut clock);
    deliver_route_completions(
        completions,
        &index,
        &mut trip,
        &fares,
        &mut telemetry,
        &mut commands,
    );
}
