//! Reverse-geocode answer for a map click.

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};
use tracing::debug;

use crate::clock::{CurrentEvent, EventKind, EventSubject};
use crate::ecs::{FleetIndex, Vehicle};
use crate::geocode::ReverseGeocoder;
use crate::inbox::DriverInboxes;
use crate::routing::RouteProvider;
use crate::search_wave::SearchWave;
use crate::systems::{release_vehicle, settle_context_change};
use crate::telemetry::SessionTelemetry;
use crate::trip::{Location, TripOrchestrator};

/// A map-click label arrived. Success fills the next location slot; failure
/// leaves the trip untouched.
#[allow(clippy::too_many_arguments)]
pub fn geocode_response_system(
    event: Res<CurrentEvent>,
    index: Res<FleetIndex>,
    mut geocoder: ResMut<ReverseGeocoder>,
    mut trip: ResMut<TripOrchestrator>,
    mut provider: ResMut<RouteProvider>,
    mut wave: ResMut<SearchWave>,
    mut inboxes: ResMut<DriverInboxes>,
    mut telemetry: ResMut<SessionTelemetry>,
    mut vehicles: Query<(Entity, &mut Vehicle)>,
) {
    if event.0.kind != EventKind::GeocodeResponse {
        return;
    }
    let Some(EventSubject::Geocode { request_id }) = event.0.subject else {
        return;
    };
    let Some((coordinate, result)) = geocoder.on_response(request_id) else {
        telemetry.stale_events_dropped += 1;
        debug!(request_id, "cancelled geocode response dropped");
        return;
    };
    let Ok(label) = result else {
        telemetry.geocode_failures += 1;
        return;
    };

    let (slot, change) = trip.apply_map_click(Location::new(label, coordinate));
    debug!(?slot, request_id, "map click applied");
    if let Some(id) = settle_context_change(&change, &mut provider, &mut wave, &mut inboxes) {
        release_vehicle(id, &index, &mut vehicles);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::clock::SimulationClock;
    use crate::error::GeocodeError;
    use crate::geo::Coordinate;
    use crate::geocode::{GeocodeLookup, GeocodeResponse, Geocoder, LandmarkGeocoder};
    use crate::routing::DirectionsStatus;
    use crate::trip::{LocationSlot, TripPhase};

    struct Denied;

    impl Geocoder for Denied {
        fn reverse_geocode(&self, _: Coordinate) -> GeocodeResponse {
            GeocodeResponse::failed(DirectionsStatus::RequestDenied)
        }
    }

    fn world() -> World {
        let mut world = World::new();
        world.insert_resource(FleetIndex::default());
        world.insert_resource(ReverseGeocoder::new(16, 150));
        world.insert_resource(TripOrchestrator::default());
        world.insert_resource(RouteProvider::new(100, 250));
        world.insert_resource(SearchWave::default());
        world.insert_resource(DriverInboxes::default());
        world.insert_resource(SessionTelemetry::default());
        world
    }

    fn click(world: &mut World, at: Coordinate, service: &dyn Geocoder) {
        let mut clock = SimulationClock::default();
        let lookup = world
            .resource_mut::<ReverseGeocoder>()
            .request(at, service, &mut clock);
        assert!(matches!(lookup, GeocodeLookup::Pending { .. }));
        let event = clock.pop_next().expect("geocode event");
        world.insert_resource(CurrentEvent(event));
        let mut schedule = Schedule::default();
        schedule.add_systems(geocode_response_system);
        schedule.run(world);
    }

    #[test]
    fn clicks_fill_pickup_then_destination() {
        let mut world = world();
        let geocoder = LandmarkGeocoder::nairobi();
        click(&mut world, Coordinate::new(-1.2676, 36.8108), &geocoder);
        click(&mut world, Coordinate::new(-1.286389, 36.817223), &geocoder);

        let trip = world.resource::<TripOrchestrator>();
        assert_eq!(trip.phase(), TripPhase::LocationsSet);
        assert_eq!(trip.pickup().map(|l| l.label.as_str()), Some("Westlands"));
        assert_eq!(
            trip.destination().map(|l| l.label.as_str()),
            Some("Nairobi CBD")
        );
        assert_eq!(trip.click_target(), LocationSlot::Pickup);
    }

    #[test]
    fn failed_geocode_leaves_trip_unchanged() {
        let mut world = world();
        click(&mut world, Coordinate::new(-1.2676, 36.8108), &Denied);
        assert_eq!(world.resource::<TripOrchestrator>().phase(), TripPhase::Idle);
        assert_eq!(world.resource::<SessionTelemetry>().geocode_failures, 1);
        // Error type surfaced to callers of the geocoder directly.
        let err = GeocodeError::Failed {
            status: DirectionsStatus::RequestDenied,
        };
        assert_eq!(err.to_string(), "reverse geocode failed (REQUEST_DENIED)");
    }
}
