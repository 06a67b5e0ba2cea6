//! Simulated dispatch: match the trip against the fleet after the dispatch delay.

use bevy_ecs::prelude::{Query, Res, ResMut};
use tracing::debug;

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::{FleetIndex, Position, Vehicle, VehicleStatus};
use crate::inbox::{DriverInboxes, IncomingTrip};
use crate::matching::{FleetCandidate, MatchingAlgorithmResource};
use crate::search_wave::SearchWave;
use crate::telemetry::SessionTelemetry;
use crate::trip::{DispatchOutcome, MatchedDriver, TripConfig, TripOrchestrator};

/// Simulated dispatch delay elapsed: run the matcher against the current fleet.
#[allow(clippy::too_many_arguments)]
pub fn dispatch_system(
    event: Res<CurrentEvent>,
    config: Res<TripConfig>,
    algorithm: Res<MatchingAlgorithmResource>,
    index: Res<FleetIndex>,
    mut trip: ResMut<TripOrchestrator>,
    mut wave: ResMut<SearchWave>,
    mut inboxes: ResMut<DriverInboxes>,
    mut telemetry: ResMut<SessionTelemetry>,
    mut vehicles: Query<(&mut Vehicle, &Position)>,
) {
    if event.0.kind != EventKind::DispatchSearch {
        return;
    }
    let Some(EventSubject::Trip { generation }) = event.0.subject else {
        return;
    };
    if !trip.dispatch_is_live(generation) {
        telemetry.stale_events_dropped += 1;
        debug!(generation, "stale dispatch timer dropped");
        return;
    }
    let (Some(pickup), Some(request)) = (trip.pickup(), trip.request()) else {
        return;
    };
    let pickup = pickup.coordinate;
    let class = request.vehicle_class;

    let fleet: Vec<FleetCandidate> = vehicles
        .iter()
        .map(|(vehicle, position)| FleetCandidate {
            id: vehicle.id,
            class: vehicle.class,
            status: vehicle.status,
            position: position.0,
        })
        .collect();

    let matched = algorithm
        .find_match(&fleet, pickup, class, config.max_match_radius_km)
        .and_then(|candidate| {
            let entity = index.get(candidate.vehicle_id)?;
            let (vehicle, position) = vehicles.get(entity).ok()?;
            Some(MatchedDriver {
                vehicle_id: vehicle.id,
                name: vehicle.name.clone(),
                class: vehicle.class,
                position: position.0,
                pickup_distance_km: candidate.pickup_distance_km,
            })
        });

    match trip.on_dispatch(generation, matched) {
        Some(DispatchOutcome::Matched(driver)) => {
            if let Some(entity) = index.get(driver.vehicle_id) {
                if let Ok((mut vehicle, _)) = vehicles.get_mut(entity) {
                    vehicle.status = VehicleStatus::Busy;
                }
            }
            if let Some(request) = trip.request() {
                inboxes.push(
                    driver.vehicle_id,
                    IncomingTrip {
                        trip_id: generation,
                        rider: config.rider_name.clone(),
                        pickup: request.pickup.label.clone(),
                        destination: request.destination.label.clone(),
                        distance_km: request.distance_km,
                        fare: request.fare_estimate.clone(),
                        class: request.vehicle_class,
                    },
                );
            }
            telemetry.matches += 1;
            wave.stop();
        }
        Some(DispatchOutcome::NoDriverFound) => {
            telemetry.no_driver_found += 1;
            wave.stop();
        }
        None => {}
    }
}
