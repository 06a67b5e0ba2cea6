//! Concentric "searching for a driver" rings around the pickup point.
//!
//! Purely visual. While active, a timer advances the ring phases; the trip
//! orchestrator only reads the result for display.

use bevy_ecs::prelude::{Res, ResMut, Resource};
use serde::{Deserialize, Serialize};

use crate::clock::{CurrentEvent, EventKind, EventSubject, SimulationClock};
use crate::geo::Coordinate;
use crate::telemetry::SessionTelemetry;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct SearchWaveConfig {
    pub ring_count: u32,
    pub period_ms: u64,
    pub max_radius_m: f64,
    pub tick_ms: u64,
}

impl Default for SearchWaveConfig {
    fn default() -> Self {
        Self {
            ring_count: 3,
            period_ms: 2000,
            max_radius_m: 400.0,
            tick_ms: 50,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveRing {
    pub radius_m: f64,
    pub opacity: f64,
}

/// Display state of the wave.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchWaveSnapshot {
    pub center: Coordinate,
    pub rings: Vec<WaveRing>,
}

#[derive(Debug, Default, Resource)]
pub struct SearchWave {
    center: Option<Coordinate>,
    started_at: u64,
    generation: u64,
    rings: Vec<WaveRing>,
}

impl SearchWave {
    pub fn is_active(&self) -> bool {
        self.center.is_some()
    }

    /// Start (or restart) the wave around `center`.
    pub fn start(&mut self, center: Coordinate, clock: &mut SimulationClock, config: &SearchWaveConfig) {
        self.generation += 1;
        self.center = Some(center);
        self.started_at = clock.now();
        self.rings = rings_at(0, config);
        clock.schedule_in(
            config.tick_ms,
            EventKind::SearchWaveTick,
            Some(EventSubject::Loop {
                generation: self.generation,
            }),
        );
    }

    pub fn stop(&mut self) {
        self.generation += 1;
        self.center = None;
        self.rings.clear();
    }

    pub fn snapshot(&self) -> Option<SearchWaveSnapshot> {
        self.center.map(|center| SearchWaveSnapshot {
            center,
            rings: self.rings.clone(),
        })
    }
}

/// Ring radii and opacities `elapsed_ms` after the wave started. Ring `i` is
/// phase-shifted by `i / ring_count` of a period.
pub fn rings_at(elapsed_ms: u64, config: &SearchWaveConfig) -> Vec<WaveRing> {
    let period = config.period_ms.max(1);
    let count = u64::from(config.ring_count.max(1));
    (0..count)
        .map(|i| {
            let shifted = (elapsed_ms + i * period / count) % period;
            let phase = shifted as f64 / period as f64;
            WaveRing {
                radius_m: phase * config.max_radius_m,
                opacity: 1.0 - phase,
            }
        })
        .collect()
}

pub fn search_wave_tick_system(
    mut clock: ResMut<SimulationClock>,
    event: Res<CurrentEvent>,
    config: Res<SearchWaveConfig>,
    mut wave: ResMut<SearchWave>,
    mut telemetry: ResMut<SessionTelemetry>,
) {
    if event.0.kind != EventKind::SearchWaveTick {
        return;
    }
    let Some(EventSubject::Loop { generation }) = event.0.subject else {
        return;
    };
    if generation != wave.generation || !wave.is_active() {
        telemetry.stale_events_dropped += 1;
        return;
    }
    let elapsed = clock.now().saturating_sub(wave.started_at);
    wave.rings = rings_at(elapsed, &config);
    clock.schedule_in(
        config.tick_ms,
        EventKind::SearchWaveTick,
        Some(EventSubject::Loop { generation }),
    );
}
