//! Route debounce window closed: hand the request to the directions collaborator.

use bevy_ecs::prelude::{Commands, Res, ResMut};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::FleetIndex;
use crate::pricing::FareConfig;
use crate::routing::{DirectionsServiceResource, RouteProvider};
use crate::systems::deliver_route_completions;
use crate::telemetry::SessionTelemetry;
use crate::trip::TripOrchestrator;

#[allow(clippy::too_many_arguments)]
pub fn route_debounce_system(
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
    if event.0.kind != EventKind::RouteDebounceElapsed {
        return;
    }
    let Some(EventSubject::Route { key, token }) = event.0.subject else {
        return;
    };
    let completions = provider.on_debounce_elapsed(key, token, service.0.as_ref(), &mut clock);
    deliver_route_completions(
        completions,
        &index,
        &mut trip,
        &fares,
        &mut telemetry,
        &mut commands,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy_ecs::prelude::{Schedule, World};

    use crate::geo::Coordinate;
    use crate::routing::{RouteRequest, RouteRequester, StraightLineDirections, TransportMode};

    #[test]
    fn flush_issues_directions_call() {
        let mut world = World::new();
        world.insert_resource(SimulationClock::default());
        world.insert_resource(DirectionsServiceResource(Box::new(
            StraightLineDirections::default(),
        )));
        world.insert_resource(FleetIndex::default());
        world.insert_resource(FareConfig::default());
        world.insert_resource(RouteProvider::new(100, 250));
        world.insert_resource(TripOrchestrator::default());
        world.insert_resource(SessionTelemetry::default());

        let request = RouteRequest::new(
            Coordinate::new(-1.2864, 36.8172),
            Coordinate::new(-1.2800, 36.8300),
            TransportMode::Driving,
        );
        world.resource_scope(|world, mut provider: bevy_ecs::world::Mut<RouteProvider>| {
            let mut clock = world.resource_mut::<SimulationClock>();
            provider.resolve(request, RouteRequester::Quote { generation: 1 }, &mut clock);
        });

        let event = world
            .resource_mut::<SimulationClock>()
            .pop_next()
            .expect("debounce event scheduled");
        assert_eq!(event.kind, EventKind::RouteDebounceElapsed);
        assert_eq!(event.timestamp, 100);
        world.insert_resource(CurrentEvent(event));

        let mut schedule = Schedule::default();
        schedule.add_systems(route_debounce_system);
        schedule.run(&mut world);

        let provider = world.resource::<RouteProvider>();
        assert_eq!(provider.stats().directions_calls, 1);
        assert!(provider.is_pending(&request.key()));
        let clock = world.resource::<SimulationClock>();
        assert_eq!(clock.next_event_time(), Some(350));
    }
}
