//! Debounced, cached route resolution with a single transport-mode fallback.
//!
//! Lifecycle of one route key:
//!
//! 1. [`RouteProvider::resolve`] answers from the cache, or parks the caller
//!    and (re)arms a debounce flush for the key.
//! 2. When the flush fires, one directions call is issued for every caller
//!    parked on that key; its answer is delivered after the collaborator
//!    latency as a `DirectionsResponse` event.
//! 3. A failed bicycling attempt is retried once as driving. Success is stored
//!    under the originally requested key; failure is reported to all callers.

use std::collections::HashMap;
use std::sync::Arc;

use bevy_ecs::prelude::Resource;
use tracing::{debug, info, warn};

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::debounce::Debouncer;
use crate::ecs::VehicleId;

use super::cache::RouteCache;
use super::{
    normalize_response, DirectionsResponse, DirectionsService, DirectionsStatus, RouteError,
    RouteKey, RoutePath, RouteRequest, RouteSummary, TransportMode,
};

/// Who is waiting for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouteRequester {
    /// A fleet vehicle waiting for its animation path.
    Vehicle(VehicleId),
    /// A fare quote for one trip context.
    Quote { generation: u64 },
}

/// Immediate answer to [`RouteProvider::resolve`].
#[derive(Debug, Clone, PartialEq)]
pub enum RouteLookup {
    Ready(RouteSummary),
    Pending,
}

/// A finished resolution addressed to one requester.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCompletion {
    pub requester: RouteRequester,
    pub key: RouteKey,
    pub result: Result<RouteSummary, RouteError>,
}

/// Counters describing how route requests were served.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteStats {
    pub directions_calls: u64,
    pub cache_hits: u64,
    pub coalesced_requests: u64,
    pub fallback_attempts: u64,
    pub resolution_failures: u64,
    pub stale_events_dropped: u64,
}

#[derive(Debug)]
struct Waiting {
    request: RouteRequest,
    requesters: Vec<RouteRequester>,
}

#[derive(Debug)]
struct InFlight {
    token: u64,
    attempt: TransportMode,
    response: DirectionsResponse,
}

/// Resolves routes on behalf of the animator and the trip orchestrator.
///
/// Owns the session's [`RouteCache`]; the cache is created with the provider
/// and discarded with it.
#[derive(Debug, Resource)]
pub struct RouteProvider {
    cache: RouteCache,
    debouncer: Debouncer<RouteKey>,
    waiting: HashMap<RouteKey, Waiting>,
    in_flight: HashMap<RouteKey, InFlight>,
    latency_ms: u64,
    next_call_token: u64,
    stats: RouteStats,
}

impl RouteProvider {
    pub fn new(debounce_ms: u64, latency_ms: u64) -> Self {
        Self {
            cache: RouteCache::new(),
            debouncer: Debouncer::new(debounce_ms),
            waiting: HashMap::new(),
            in_flight: HashMap::new(),
            latency_ms,
            next_call_token: 1,
            stats: RouteStats::default(),
        }
    }

    pub fn cache(&self) -> &RouteCache {
        &self.cache
    }

    pub fn stats(&self) -> RouteStats {
        self.stats
    }

    /// True while `key` has parked callers or an outstanding directions call.
    pub fn is_pending(&self, key: &RouteKey) -> bool {
        self.waiting.contains_key(key) || self.in_flight.contains_key(key)
    }

    /// Answer from the cache, or park `requester` until the route resolves.
    pub fn resolve(
        &mut self,
        request: RouteRequest,
        requester: RouteRequester,
        clock: &mut SimulationClock,
    ) -> RouteLookup {
        let key = request.key();
        if let Some(summary) = self.cache.get(&key) {
            self.stats.cache_hits += 1;
            debug!(?key, ?requester, "route cache hit");
            return RouteLookup::Ready(summary.clone());
        }

        let waiting = self.waiting.entry(key).or_insert_with(|| Waiting {
            request,
            requesters: Vec::new(),
        });
        if !waiting.requesters.contains(&requester) {
            waiting.requesters.push(requester);
        }

        if self.in_flight.contains_key(&key) {
            self.stats.coalesced_requests += 1;
            debug!(?key, ?requester, "joined in-flight directions call");
            return RouteLookup::Pending;
        }

        let call = self.debouncer.call(key, clock.now());
        if call.coalesced {
            self.stats.coalesced_requests += 1;
            debug!(?key, ?requester, "coalesced into pending debounce window");
        }
        clock.schedule_at(
            call.fire_at,
            EventKind::RouteDebounceElapsed,
            Some(EventSubject::Route {
                key,
                token: call.token,
            }),
        );
        RouteLookup::Pending
    }

    /// Debounce window for `key` closed. Issues the directions call unless the
    /// flush is stale or nobody is waiting any more.
    pub fn on_debounce_elapsed(
        &mut self,
        key: RouteKey,
        token: u64,
        service: &dyn DirectionsService,
        clock: &mut SimulationClock,
    ) -> Vec<RouteCompletion> {
        if !self.debouncer.fire(key, token) {
            self.stats.stale_events_dropped += 1;
            return Vec::new();
        }
        let Some(request) = self.waiting.get(&key).map(|w| w.request) else {
            return Vec::new();
        };
        if let Some(summary) = self.cache.get(&key).cloned() {
            return self.complete(key, Ok(summary));
        }
        self.issue(key, request, request.mode, service, clock);
        Vec::new()
    }

    /// The collaborator answered an outstanding call for `key`.
    pub fn on_directions_response(
        &mut self,
        key: RouteKey,
        token: u64,
        service: &dyn DirectionsService,
        clock: &mut SimulationClock,
    ) -> Vec<RouteCompletion> {
        let live = self
            .in_flight
            .get(&key)
            .is_some_and(|in_flight| in_flight.token == token);
        if !live {
            self.stats.stale_events_dropped += 1;
            return Vec::new();
        }
        let Some(InFlight {
            attempt, response, ..
        }) = self.in_flight.remove(&key)
        else {
            return Vec::new();
        };

        if response.status == DirectionsStatus::Ok {
            let summary = RouteSummary {
                distance_m: response.distance_m,
                duration_s: response.duration_s,
                path: Arc::new(RoutePath {
                    points: response.path,
                    mode: attempt,
                }),
            };
            if self.cache.put(key, summary.clone()) {
                info!(
                    ?key,
                    %attempt,
                    distance_m = summary.distance_m,
                    "route resolved and cached"
                );
            }
            return self.complete(key, Ok(summary));
        }

        let request = self.waiting.get(&key).map(|w| w.request);
        let fallback = attempt.fallback().filter(|_| attempt == key.mode);
        match (request, fallback) {
            (Some(request), Some(fallback_mode)) => {
                self.stats.fallback_attempts += 1;
                warn!(
                    ?key,
                    status = %response.status,
                    %attempt,
                    %fallback_mode,
                    "directions failed, retrying with fallback mode"
                );
                self.issue(key, request, fallback_mode, service, clock);
                Vec::new()
            }
            _ => {
                self.stats.resolution_failures += 1;
                warn!(?key, status = %response.status, %attempt, "route resolution failed");
                self.complete(
                    key,
                    Err(RouteError::ResolutionFailed {
                        status: response.status,
                        mode: attempt,
                    }),
                )
            }
        }
    }

    /// Remove parked requesters matching `predicate`. Keys left without any
    /// requester have their debounce flush cancelled. Returns how many
    /// requesters were removed.
    pub fn cancel_requesters<F>(&mut self, predicate: F) -> usize
    where
        F: Fn(&RouteRequester) -> bool,
    {
        let mut removed = 0;
        let mut emptied = Vec::new();
        for (key, waiting) in self.waiting.iter_mut() {
            let before = waiting.requesters.len();
            waiting.requesters.retain(|r| !predicate(r));
            removed += before - waiting.requesters.len();
            if waiting.requesters.is_empty() {
                emptied.push(*key);
            }
        }
        for key in emptied {
            self.waiting.remove(&key);
            if self.debouncer.cancel(&key) {
                debug!(?key, "cancelled debounced route request");
            }
        }
        removed
    }

    /// Cancel every debounced request that has not reached the collaborator yet.
    /// Outstanding calls still complete and populate the cache.
    pub fn cancel_pending(&mut self) -> usize {
        let cancelled = self.debouncer.cancel_all();
        let in_flight = &self.in_flight;
        self.waiting.retain(|key, _| in_flight.contains_key(key));
        if cancelled > 0 {
            info!(cancelled, "cancelled pending route requests");
        }
        cancelled
    }

    fn issue(
        &mut self,
        key: RouteKey,
        request: RouteRequest,
        attempt: TransportMode,
        service: &dyn DirectionsService,
        clock: &mut SimulationClock,
    ) {
        self.stats.directions_calls += 1;
        debug!(?key, %attempt, "issuing directions call");
        let raw = service.route(request.origin, request.destination, attempt);
        let response = normalize_response(&request, raw);
        let token = self.next_call_token;
        self.next_call_token += 1;
        self.in_flight.insert(
            key,
            InFlight {
                token,
                attempt,
                response,
            },
        );
        clock.schedule_in(
            self.latency_ms,
            EventKind::DirectionsResponse,
            Some(EventSubject::Route { key, token }),
        );
    }

    fn complete(
        &mut self,
        key: RouteKey,
        result: Result<RouteSummary, RouteError>,
    ) -> Vec<RouteCompletion> {
        let Some(waiting) = self.waiting.remove(&key) else {
            return Vec::new();
        };
        waiting
            .requesters
            .into_iter()
            .map(|requester| RouteCompletion {
                requester,
                key,
                result: result.clone(),
            })
            .collect()
    }
}
