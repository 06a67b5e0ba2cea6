//! Entity animator: ping-pong motion of fleet vehicles along their patrol routes.
//!
//! Each `AnimationTick` advances every vehicle's [`AnimationState`] by
//! `direction * step` route segments, bouncing at both ends of the path, and
//! recomputes the displayed [`Position`] and [`Heading`]. All new poses are
//! computed from one snapshot of the fleet before any of them is written.

use bevy_ecs::prelude::{Entity, Query, Res, ResMut, Resource};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::ecs::{
    AnimationState, AssignedRoute, Direction, Heading, Position, Vehicle, VehicleClass,
};
use crate::geo::{bearing_degrees, normalize_degrees, Coordinate};
use crate::telemetry::SessionTelemetry;
use crate::trip::TripOrchestrator;

/// Progress values this close to a bound are snapped onto it.
const BOUND_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct AnimationConfig {
    /// Route segments advanced per tick.
    pub step: f64,
    /// Virtual milliseconds between ticks (one display frame).
    pub frame_interval_ms: u64,
    /// Added to the segment bearing for two-wheelers, whose icon points backwards.
    pub two_wheeler_heading_offset_deg: f64,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            step: 0.002,
            frame_interval_ms: 16,
            two_wheeler_heading_offset_deg: 180.0,
        }
    }
}

/// Animation loop lifecycle. Ticks carrying an older generation are ignored,
/// so a stop/start pair never leaves two loops running.
#[derive(Debug, Default, Resource)]
pub struct AnimatorState {
    running: bool,
    generation: u64,
}

impl AnimatorState {
    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a fresh loop; the first tick fires one frame from now.
    pub fn start(&mut self, clock: &mut SimulationClock, config: &AnimationConfig) {
        self.generation += 1;
        self.running = true;
        clock.schedule_in(
            config.frame_interval_ms,
            EventKind::AnimationTick,
            Some(EventSubject::Loop {
                generation: self.generation,
            }),
        );
        debug!(generation = self.generation, "animation loop started");
    }

    pub fn stop(&mut self) {
        if self.running {
            debug!(generation = self.generation, "animation loop stopped");
        }
        self.running = false;
        self.generation += 1;
    }
}

/// Advance one cursor by one tick over a path of `path_len` points.
///
/// Unloaded cursors and paths shorter than two points are returned unchanged.
pub fn advance(state: AnimationState, path_len: usize, step: f64) -> AnimationState {
    if !state.route_loaded || path_len < 2 {
        return state;
    }
    let last = (path_len - 1) as f64;
    let mut progress = state.progress + state.direction.sign() * step;
    let mut direction = state.direction;
    if progress >= last - BOUND_EPSILON {
        progress = last;
        direction = Direction::Backward;
    } else if progress <= BOUND_EPSILON {
        progress = 0.0;
        direction = Direction::Forward;
    }
    AnimationState {
        progress,
        direction,
        route_loaded: true,
    }
}

/// Interpolated point and the segment it lies on, for a progress value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathSample {
    pub position: Coordinate,
    pub segment_start: Coordinate,
    pub segment_end: Coordinate,
}

/// Sample `path` at `progress`. At the final index the last segment is used
/// with an interpolation factor of 1.
pub fn sample(path: &[Coordinate], progress: f64) -> Option<PathSample> {
    if path.len() < 2 {
        return None;
    }
    let last_segment = path.len() - 2;
    let clamped = progress.clamp(0.0, (path.len() - 1) as f64);
    let segment = (clamped.floor() as usize).min(last_segment);
    let t = clamped - segment as f64;
    let segment_start = path[segment];
    let segment_end = path[segment + 1];
    Some(PathSample {
        position: segment_start.lerp(segment_end, t),
        segment_start,
        segment_end,
    })
}

/// Icon heading for a segment; `None` for a degenerate (zero-length) segment.
pub fn heading_for(sample: &PathSample, class: VehicleClass, config: &AnimationConfig) -> Option<f64> {
    if sample.segment_start == sample.segment_end {
        return None;
    }
    let bearing = bearing_degrees(sample.segment_start, sample.segment_end);
    let offset = match class {
        VehicleClass::Bike => config.two_wheeler_heading_offset_deg,
        VehicleClass::Car => 0.0,
    };
    Some(normalize_degrees(bearing + offset))
}

struct PoseUpdate {
    entity: Entity,
    state: AnimationState,
    position: Coordinate,
    heading: Option<f64>,
}

#[allow(clippy::type_complexity)]
pub fn animation_tick_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    config: Res<AnimationConfig>,
    animator: Res<AnimatorState>,
    trip: Option<Res<TripOrchestrator>>,
    mut telemetry: ResMut<SessionTelemetry>,
    mut vehicles: Query<(
        Entity,
        &Vehicle,
        &mut AnimationState,
        &mut Position,
        &mut Heading,
        Option<&AssignedRoute>,
    )>,
) {
    if event.0.kind != EventKind::AnimationTick {
        return;
    }
    let Some(EventSubject::Loop { generation }) = event.0.subject else {
        return;
    };
    if generation != animator.generation() || !animator.is_running() {
        telemetry.stale_events_dropped += 1;
        return;
    }
    clock.schedule_in(
        config.frame_interval_ms,
        EventKind::AnimationTick,
        Some(EventSubject::Loop { generation }),
    );
    telemetry.animation_ticks += 1;

    if trip.is_some_and(|t| !t.vehicles_visible()) {
        return;
    }

    // Snapshot pass: compute every pose from the current state.
    let updates: Vec<PoseUpdate> = vehicles
        .iter()
        .filter_map(|(entity, vehicle, state, _, _, route)| {
            let route = route?;
            let points = &route.0.points;
            if !state.route_loaded || points.len() < 2 {
                return None;
            }
            let next = advance(*state, points.len(), config.step);
            let pose = sample(points, next.progress)?;
            Some(PoseUpdate {
                entity,
                state: next,
                position: pose.position,
                heading: heading_for(&pose, vehicle.class, &config),
            })
        })
        .collect();

    // Apply pass.
    for update in updates {
        if let Ok((_, _, mut state, mut position, mut heading, _)) = vehicles.get_mut(update.entity)
        {
            *state = update.state;
            position.0 = update.position;
            if let Some(deg) = update.heading {
                heading.0 = deg;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn loaded() -> AnimationState {
        AnimationState {
            route_loaded: true,
            ..Default::default()
        }
    }

    fn path3() -> Vec<Coordinate> {
        vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.01),
            Coordinate::new(0.01, 0.01),
        ]
    }

    #[test]
    fn three_point_path_reaches_bound_and_flips() {
        let mut state = loaded();
        let mut ticks = 0;
        while state.direction == Direction::Forward {
            state = advance(state, 3, 0.002);
            ticks += 1;
            assert!(state.progress <= 2.0);
            assert!(ticks <= 1000, "bound not reached");
        }
        assert_eq!(ticks, 1000);
        assert_eq!(state.progress, 2.0);
        assert_eq!(state.direction, Direction::Backward);

        let next = advance(state, 3, 0.002);
        assert!(next.progress < 2.0);
        assert_eq!(next.direction, Direction::Backward);
    }

    #[test]
    fn lower_bound_flips_forward() {
        let state = AnimationState {
            progress: 0.001,
            direction: Direction::Backward,
            route_loaded: true,
        };
        let next = advance(state, 3, 0.002);
        assert_eq!(next.progress, 0.0);
        assert_eq!(next.direction, Direction::Forward);
    }

    #[test]
    fn unloaded_or_short_paths_are_untouched() {
        let unloaded = AnimationState::default();
        assert_eq!(advance(unloaded, 5, 0.002), unloaded);
        assert_eq!(advance(loaded(), 1, 0.002), loaded());
    }

    #[test]
    fn sample_interpolates_within_segment() {
        let pose = sample(&path3(), 0.5).expect("sample");
        assert!((pose.position.lng - 0.005).abs() < 1e-12);
        assert_eq!(pose.segment_start, path3()[0]);

        let end = sample(&path3(), 2.0).expect("sample at end");
        assert_eq!(end.position, path3()[2]);
        assert_eq!(end.segment_start, path3()[1]);
    }

    #[test]
    fn bike_heading_is_offset_by_half_turn() {
        let config = AnimationConfig::default();
        let pose = sample(&path3(), 0.25).expect("sample");
        let car = heading_for(&pose, VehicleClass::Car, &config).expect("car heading");
        let bike = heading_for(&pose, VehicleClass::Bike, &config).expect("bike heading");
        assert!((car - 90.0).abs() < 1e-6);
        assert!((bike - 270.0).abs() < 1e-6);
    }

    #[test]
    fn degenerate_segment_has_no_heading() {
        let p = Coordinate::new(1.0, 1.0);
        let pose = sample(&[p, p], 0.5).expect("sample");
        assert!(heading_for(&pose, VehicleClass::Car, &AnimationConfig::default()).is_none());
    }

    proptest! {
        #[test]
        fn prop_progress_stays_within_path(len in 2usize..12, ticks in 0usize..3000, step in 0.0005f64..0.5) {
            let mut state = loaded();
            for _ in 0..ticks {
                state = advance(state, len, step);
                prop_assert!(state.progress >= 0.0);
                prop_assert!(state.progress <= (len - 1) as f64);
            }
        }
    }
}
