//! Session runner: advances the clock and routes events into the ECS.
//!
//! Clock progression and event routing happen here, outside systems. Each step
//! pops the next event from [SimulationClock], inserts it as [CurrentEvent],
//! then runs the schedule.

use bevy_ecs::prelude::{Res, Schedule, World};
use bevy_ecs::schedule::{apply_deferred, IntoSystemConfigs};

use crate::animation::animation_tick_system;
use crate::clock::{CurrentEvent, Event, EventKind, SimulationClock};
use crate::search_wave::search_wave_tick_system;
use crate::systems::{
    directions_response::directions_response_system, dispatch::dispatch_system,
    geocode_response::geocode_response_system, quote_timeout::quote_timeout_system,
    route_debounce::route_debounce_system,
};

fn is_event(kind: EventKind) -> impl Fn(Option<Res<CurrentEvent>>) -> bool + Clone {
    move |event: Option<Res<CurrentEvent>>| event.is_some_and(|e| e.0.kind == kind)
}

/// Runs one step: pops the next event, inserts it as [CurrentEvent], then runs
/// the schedule. Returns the processed event, or `None` if the clock was empty.
pub fn run_next_event(world: &mut World, schedule: &mut Schedule) -> Option<Event> {
    let event = world.resource_mut::<SimulationClock>().pop_next()?;
    world.insert_resource(CurrentEvent(event));
    schedule.run(world);
    Some(event)
}

/// Processes every event scheduled at or before `until_ms`, then moves the
/// clock to `until_ms`. Returns the number of events processed.
pub fn run_until(world: &mut World, schedule: &mut Schedule, until_ms: u64) -> usize {
    let mut steps = 0;
    loop {
        let next = world.resource::<SimulationClock>().next_event_time();
        match next {
            Some(ts) if ts <= until_ms => {
                if run_next_event(world, schedule).is_some() {
                    steps += 1;
                }
            }
            _ => break,
        }
    }
    world.resource_mut::<SimulationClock>().advance_to(until_ms);
    steps
}

/// Runs until the queue is empty or `max_steps` events were processed. The
/// animation loop reschedules itself, so stop it first to drain completely.
pub fn run_until_idle(world: &mut World, schedule: &mut Schedule, max_steps: usize) -> usize {
    let mut steps = 0;
    while steps < max_steps && run_next_event(world, schedule).is_some() {
        steps += 1;
    }
    steps
}

/// Builds the session schedule: every event-reacting system, gated on its
/// event kind, followed by [apply_deferred] so inserted components are
/// visible to the next step.
pub fn session_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.add_systems(
        (
            animation_tick_system.run_if(is_event(EventKind::AnimationTick)),
            route_debounce_system.run_if(is_event(EventKind::RouteDebounceElapsed)),
            directions_response_system.run_if(is_event(EventKind::DirectionsResponse)),
            geocode_response_system.run_if(is_event(EventKind::GeocodeResponse)),
            quote_timeout_system.run_if(is_event(EventKind::QuoteTimeout)),
            dispatch_system.run_if(is_event(EventKind::DispatchSearch)),
            search_wave_tick_system.run_if(is_event(EventKind::SearchWaveTick)),
            apply_deferred,
        )
            .chain(),
    );
    schedule
}
