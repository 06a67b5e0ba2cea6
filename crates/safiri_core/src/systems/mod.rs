pub mod directions_response;
pub mod dispatch;
pub mod geocode_response;
pub mod quote_timeout;
pub mod route_debounce;

use bevy_ecs::prelude::{Commands, Entity, Query, World};
use tracing::{debug, warn};

use crate::ecs::{AnimationState, AssignedRoute, FleetIndex, Vehicle, VehicleId, VehicleStatus};
use crate::inbox::DriverInboxes;
use crate::pricing::FareConfig;
use crate::routing::{RouteCompletion, RouteProvider, RouteRequester};
use crate::search_wave::SearchWave;
use crate::telemetry::SessionTelemetry;
use crate::trip::{TripContextChange, TripOrchestrator};

/// Hand finished route resolutions to whoever asked: vehicles get their
/// patrol path (animation restarts from the start), quotes go to the trip.
pub(crate) fn deliver_route_completions(
    completions: Vec<RouteCompletion>,
    index: &FleetIndex,
    trip: &mut TripOrchestrator,
    fares: &FareConfig,
    telemetry: &mut SessionTelemetry,
    commands: &mut Commands,
) {
    for completion in completions {
        match completion.requester {
            RouteRequester::Vehicle(id) => {
                let Some(entity) = index.get(id) else {
                    debug!(vehicle = %id, "route for departed vehicle dropped");
                    continue;
                };
                match completion.result {
                    Ok(summary) => {
                        commands.entity(entity).insert((
                            AssignedRoute(summary.path),
                            AnimationState {
                                route_loaded: true,
                                ..Default::default()
                            },
                        ));
                    }
                    Err(err) => {
                        warn!(vehicle = %id, %err, "vehicle has no patrol route");
                    }
                }
            }
            RouteRequester::Quote { generation } => {
                let resolved = completion.result.is_ok();
                if !trip.on_route_resolved(generation, completion.result, fares) {
                    telemetry.stale_events_dropped += 1;
                    debug!(generation, "stale quote route dropped");
                } else if resolved {
                    telemetry.quotes_resolved += 1;
                }
            }
        }
    }
}

/// Undo the side effects of a discarded trip context: drop its quote
/// requests, stop the search display and withdraw any driver offer.
/// Returns the vehicle that must be made available again.
pub(crate) fn settle_context_change(
    change: &TripContextChange,
    provider: &mut RouteProvider,
    wave: &mut SearchWave,
    inboxes: &mut DriverInboxes,
) -> Option<VehicleId> {
    let retired = change.retired_generation;
    let dropped = provider.cancel_requesters(
        |r| matches!(r, RouteRequester::Quote { generation } if *generation <= retired),
    );
    if dropped > 0 {
        debug!(retired, dropped, "quote requests dropped");
    }
    if change.stop_search {
        wave.stop();
    }
    inboxes.withdraw(retired);
    change.released_vehicle
}

pub(crate) fn release_vehicle(
    id: VehicleId,
    index: &FleetIndex,
    vehicles: &mut Query<(Entity, &mut Vehicle)>,
) {
    let Some(entity) = index.get(id) else {
        return;
    };
    if let Ok((_, mut vehicle)) = vehicles.get_mut(entity) {
        mark_available(&mut vehicle);
    }
}

/// [`release_vehicle`] for callers holding the whole world.
pub(crate) fn release_vehicle_in_world(world: &mut World, id: VehicleId) {
    let Some(entity) = world.resource::<FleetIndex>().get(id) else {
        return;
    };
    if let Some(mut vehicle) = world.get_mut::<Vehicle>(entity) {
        mark_available(&mut vehicle);
    }
}

fn mark_available(vehicle: &mut Vehicle) {
    vehicle.status = VehicleStatus::Available;
    debug!(vehicle = %vehicle.id, "vehicle released");
}
