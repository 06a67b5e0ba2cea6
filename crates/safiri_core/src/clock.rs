//! Virtual millisecond clock and event queue.
//!
//! Every suspension point of the map session (animation frames, debounce
//! windows, collaborator latency, dispatch delay, quote timeout) is an
//! [`Event`] scheduled on the [`SimulationClock`]. The runner pops events in
//! time order and exposes the current one as [`CurrentEvent`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use bevy_ecs::prelude::Resource;

use crate::routing::RouteKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum EventKind {
    AnimationTick,
    RouteDebounceElapsed,
    DirectionsResponse,
    GeocodeResponse,
    QuoteTimeout,
    DispatchSearch,
    SearchWaveTick,
}

/// What an event refers to. Tokens let handlers drop stale completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventSubject {
    /// A debounced or in-flight route request; `token` identifies the attempt.
    Route { key: RouteKey, token: u64 },
    /// A timer tied to one trip context.
    Trip { generation: u64 },
    /// A pending reverse geocode.
    Geocode { request_id: u64 },
    /// A self-rescheduling loop (animation or search wave).
    Loop { generation: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub timestamp: u64,
    pub kind: EventKind,
    pub subject: Option<EventSubject>,
    seq: u64,
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap a min-heap by (timestamp, seq).
        other
            .timestamp
            .cmp(&self.timestamp)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The event currently being processed by the schedule.
#[derive(Debug, Clone, Copy, Resource)]
pub struct CurrentEvent(pub Event);

#[derive(Debug, Default, Resource)]
pub struct SimulationClock {
    now: u64,
    next_seq: u64,
    events: BinaryHeap<Event>,
}

impl SimulationClock {
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Schedule an event at an absolute time. Release builds clamp past times to `now`.
    pub fn schedule_at(&mut self, timestamp: u64, kind: EventKind, subject: Option<EventSubject>) {
        debug_assert!(
            timestamp >= self.now,
            "event timestamp must be >= current time"
        );
        let event = Event {
            timestamp: timestamp.max(self.now),
            kind,
            subject,
            seq: self.next_seq,
        };
        self.next_seq += 1;
        self.events.push(event);
    }

    /// Schedule an event `delay_ms` after the current time.
    pub fn schedule_in(&mut self, delay_ms: u64, kind: EventKind, subject: Option<EventSubject>) {
        self.schedule_at(self.now.saturating_add(delay_ms), kind, subject);
    }

    pub fn pop_next(&mut self) -> Option<Event> {
        let event = self.events.pop()?;
        self.now = event.timestamp;
        Some(event)
    }

    pub fn next_event_time(&self) -> Option<u64> {
        self.events.peek().map(|e| e.timestamp)
    }

    /// Move the clock forward without processing anything. Never moves backwards
    /// and never skips past a pending event.
    pub fn advance_to(&mut self, timestamp: u64) {
        let bound = self.next_event_time().unwrap_or(u64::MAX);
        self.now = self.now.max(timestamp.min(bound));
    }

    pub fn pending(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_pops_events_in_time_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(10, EventKind::QuoteTimeout, None);
        clock.schedule_at(5, EventKind::AnimationTick, None);
        clock.schedule_at(20, EventKind::DispatchSearch, None);

        let first = clock.pop_next().expect("first event");
        assert_eq!(first.timestamp, 5);
        assert_eq!(clock.now(), 5);

        let second = clock.pop_next().expect("second event");
        assert_eq!(second.timestamp, 10);
        assert_eq!(clock.now(), 10);

        let third = clock.pop_next().expect("third event");
        assert_eq!(third.timestamp, 20);
        assert_eq!(clock.now(), 20);

        assert!(clock.pop_next().is_none());
        assert!(clock.is_empty());
    }

    #[test]
    fn equal_timestamps_pop_in_schedule_order() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(7, EventKind::DispatchSearch, None);
        clock.schedule_at(7, EventKind::AnimationTick, None);
        clock.schedule_at(7, EventKind::QuoteTimeout, None);

        let kinds: Vec<_> = std::iter::from_fn(|| clock.pop_next())
            .map(|e| e.kind)
            .collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::DispatchSearch,
                EventKind::AnimationTick,
                EventKind::QuoteTimeout
            ]
        );
    }

    #[test]
    fn schedule_in_is_relative_to_now() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(100, EventKind::AnimationTick, None);
        clock.pop_next();
        clock.schedule_in(50, EventKind::AnimationTick, None);
        assert_eq!(clock.next_event_time(), Some(150));
    }

    #[test]
    fn advance_to_stops_at_next_pending_event() {
        let mut clock = SimulationClock::default();
        clock.schedule_at(30, EventKind::QuoteTimeout, None);
        clock.advance_to(100);
        assert_eq!(clock.now(), 30);
        clock.pop_next();
        clock.advance_to(100);
        assert_eq!(clock.now(), 100);
        clock.advance_to(10);
        assert_eq!(clock.now(), 100);
    }
}
