use bevy_ecs::prelude::Resource;
use tracing::{debug, info, warn};

use crate::clock::{EventKind, EventSubject, SimulationClock};
use crate::ecs::{VehicleClass, VehicleId};
use crate::error::SelectionError;
use crate::geo::haversine_distance_km;
use crate::pricing::{FareConfig, QuoteSource, TripQuote};
use crate::routing::{
    RouteCache, RouteError, RouteLookup, RouteProvider, RouteRequest, RouteRequester, RouteSummary,
};

use super::{
    Location, LocationSlot, MatchedDriver, TripConfig, TripPhase, TripRequest, TripSnapshot,
};

/// What the caller must undo after the trip context was replaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TripContextChange {
    /// Generation that is no longer live; its quote requesters should be dropped.
    pub retired_generation: u64,
    /// A vehicle held by the discarded trip, to be made available again.
    pub released_vehicle: Option<VehicleId>,
    /// The search-wave should stop.
    pub stop_search: bool,
}

/// Result of a dispatch timer, for the caller to act on.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Matched(MatchedDriver),
    NoDriverFound,
}

/// The single trip being composed in this session.
///
/// Pure state machine: it schedules its own timers on the clock but never
/// touches vehicles. Changes that affect the fleet are returned to the caller.
#[derive(Debug, Resource)]
pub struct TripOrchestrator {
    phase: TripPhase,
    generation: u64,
    pickup: Option<Location>,
    destination: Option<Location>,
    selected_class: VehicleClass,
    quote: Option<TripQuote>,
    quote_error: Option<RouteError>,
    route: Option<RouteSummary>,
    request: Option<TripRequest>,
    matched: Option<MatchedDriver>,
}

impl Default for TripOrchestrator {
    fn default() -> Self {
        Self {
            phase: TripPhase::Idle,
            generation: 1,
            pickup: None,
            destination: None,
            selected_class: VehicleClass::Car,
            quote: None,
            quote_error: None,
            route: None,
            request: None,
            matched: None,
        }
    }
}

impl TripOrchestrator {
    pub fn phase(&self) -> TripPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn pickup(&self) -> Option<&Location> {
        self.pickup.as_ref()
    }

    pub fn destination(&self) -> Option<&Location> {
        self.destination.as_ref()
    }

    pub fn selected_class(&self) -> VehicleClass {
        self.selected_class
    }

    pub fn quote(&self) -> Option<&TripQuote> {
        self.quote.as_ref()
    }

    pub fn request(&self) -> Option<&TripRequest> {
        self.request.as_ref()
    }

    pub fn matched(&self) -> Option<&MatchedDriver> {
        self.matched.as_ref()
    }

    /// Fleet markers are replaced by the search/match display once a ride is requested.
    pub fn vehicles_visible(&self) -> bool {
        !matches!(
            self.phase,
            TripPhase::Searching | TripPhase::NoDriverFound | TripPhase::DriverConfirmed
        )
    }

    pub fn set_location(&mut self, slot: LocationSlot, location: Location) -> TripContextChange {
        info!(?slot, label = %location.label, "location set");
        match slot {
            LocationSlot::Pickup => self.pickup = Some(location),
            LocationSlot::Destination => self.destination = Some(location),
        }
        self.reset_context()
    }

    pub fn clear_location(&mut self, slot: LocationSlot) -> TripContextChange {
        match slot {
            LocationSlot::Pickup => self.pickup = None,
            LocationSlot::Destination => self.destination = None,
        }
        self.reset_context()
    }

    /// Slot a map click fills: pickup when pickup is empty or both are set
    /// (starting over), otherwise destination.
    pub fn click_target(&self) -> LocationSlot {
        match (&self.pickup, &self.destination) {
            (None, _) | (Some(_), Some(_)) => LocationSlot::Pickup,
            (Some(_), None) => LocationSlot::Destination,
        }
    }

    /// Apply a geocoded map click. When both locations were set, the click
    /// starts a new trip: it becomes the pickup and the destination is cleared.
    pub fn apply_map_click(&mut self, location: Location) -> (LocationSlot, TripContextChange) {
        let slot = self.click_target();
        if slot == LocationSlot::Pickup && self.pickup.is_some() {
            self.destination = None;
        }
        (slot, self.set_location(slot, location))
    }

    /// Choose the class used for the route quote and the eventual request.
    pub fn select_vehicle_class(&mut self, class: VehicleClass) {
        self.selected_class = class;
    }

    /// Start pricing the current pickup/destination pair.
    pub fn request_price(
        &mut self,
        provider: &mut RouteProvider,
        clock: &mut SimulationClock,
        config: &TripConfig,
        fares: &FareConfig,
    ) -> Result<TripContextChange, SelectionError> {
        let (pickup, destination) = self.locations()?;
        let (pickup, destination) = (pickup.coordinate, destination.coordinate);
        if !matches!(
            self.phase,
            TripPhase::LocationsSet | TripPhase::ReadyToRequest | TripPhase::Cancelled
        ) {
            return Err(SelectionError::NotReady { phase: self.phase });
        }

        let change = self.retire_generation();
        self.quote = None;
        self.quote_error = None;
        self.route = None;
        self.phase = TripPhase::Pricing;

        let request = RouteRequest::new(pickup, destination, self.selected_class.transport_mode());
        let requester = RouteRequester::Quote {
            generation: self.generation,
        };
        match provider.resolve(request, requester, clock) {
            RouteLookup::Ready(summary) => {
                self.apply_resolved(summary, fares);
            }
            RouteLookup::Pending => {
                clock.schedule_in(
                    config.quote_timeout_ms,
                    EventKind::QuoteTimeout,
                    Some(EventSubject::Trip {
                        generation: self.generation,
                    }),
                );
                debug!(generation = self.generation, "pricing pending");
            }
        }
        Ok(change)
    }

    /// A quote route finished. Returns false when the result was stale.
    pub fn on_route_resolved(
        &mut self,
        generation: u64,
        result: Result<RouteSummary, RouteError>,
        fares: &FareConfig,
    ) -> bool {
        if generation != self.generation {
            return false;
        }
        let upgradable = match self.phase {
            TripPhase::Pricing => true,
            TripPhase::ReadyToRequest => self.quote.as_ref().is_some_and(TripQuote::is_estimate),
            _ => false,
        };
        if !upgradable {
            return false;
        }
        match result {
            Ok(summary) => {
                self.apply_resolved(summary, fares);
                true
            }
            Err(err) => {
                warn!(%err, generation, "quote route failed");
                if self.phase == TripPhase::Pricing {
                    self.quote_error = Some(err);
                }
                true
            }
        }
    }

    /// The quote timer expired. Falls back to a cached route for the same
    /// pair under any mode, then to the great-circle distance.
    pub fn on_quote_timeout(
        &mut self,
        generation: u64,
        cache: &RouteCache,
        fares: &FareConfig,
    ) -> Option<QuoteSource> {
        if generation != self.generation || self.phase != TripPhase::Pricing {
            return None;
        }
        let (pickup, destination) = self.locations().ok()?;
        let (pickup, destination) = (pickup.coordinate, destination.coordinate);

        let (distance_km, duration_s, source) =
            match cache.find_pair(pickup.key(), destination.key()) {
                Some(summary) => (summary.distance_km(), summary.duration_s, QuoteSource::Cached),
                None => {
                    let distance_km = haversine_distance_km(pickup, destination);
                    (
                        distance_km,
                        distance_km * fares.car_minutes_per_km * 60.0,
                        QuoteSource::Default,
                    )
                }
            };
        warn!(
            generation,
            distance_km,
            ?source,
            "quote timed out, using estimate"
        );
        self.quote = Some(TripQuote::new(distance_km, duration_s, source, fares));
        self.phase = TripPhase::ReadyToRequest;
        Some(source)
    }

    /// Confirm a class and begin the simulated dispatch.
    pub fn request_ride(
        &mut self,
        class: VehicleClass,
        clock: &mut SimulationClock,
        config: &TripConfig,
    ) -> Result<(), SelectionError> {
        let (pickup, destination) = self.locations()?;
        if self.phase != TripPhase::ReadyToRequest {
            return Err(SelectionError::NotReady { phase: self.phase });
        }
        let Some(quote) = self.quote.as_ref() else {
            return Err(SelectionError::NotReady { phase: self.phase });
        };

        let request = TripRequest {
            pickup: pickup.clone(),
            destination: destination.clone(),
            vehicle_class: class,
            fare_estimate: quote.for_class(class).clone(),
            distance_km: quote.distance_km,
            duration_s: quote.duration_s,
            status: TripPhase::Searching,
        };
        info!(
            generation = self.generation,
            %class,
            fare = %request.fare_estimate,
            "ride requested"
        );
        self.selected_class = class;
        self.request = Some(request);
        self.begin_search(clock, config);
        Ok(())
    }

    /// Search again after an unsuccessful dispatch.
    pub fn retry(&mut self, clock: &mut SimulationClock, config: &TripConfig) -> Result<(), SelectionError> {
        if self.phase != TripPhase::NoDriverFound {
            return Err(SelectionError::NothingToRetry);
        }
        self.begin_search(clock, config);
        Ok(())
    }

    /// True when a dispatch timer for `generation` should run the matcher.
    pub fn dispatch_is_live(&self, generation: u64) -> bool {
        generation == self.generation && self.phase == TripPhase::Searching
    }

    /// Record the matcher's answer for a live dispatch.
    pub fn on_dispatch(&mut self, generation: u64, matched: Option<MatchedDriver>) -> Option<DispatchOutcome> {
        if !self.dispatch_is_live(generation) {
            return None;
        }
        let outcome = match matched {
            Some(driver) => {
                info!(
                    vehicle = %driver.vehicle_id,
                    name = %driver.name,
                    pickup_distance_km = driver.pickup_distance_km,
                    "driver confirmed"
                );
                self.phase = TripPhase::DriverConfirmed;
                self.matched = Some(driver.clone());
                DispatchOutcome::Matched(driver)
            }
            None => {
                info!(generation, "no driver found");
                self.phase = TripPhase::NoDriverFound;
                DispatchOutcome::NoDriverFound
            }
        };
        if let Some(request) = self.request.as_mut() {
            request.status = self.phase;
        }
        Some(outcome)
    }

    /// Abandon the trip. Locations are kept so the rider can price again.
    pub fn cancel(&mut self) -> Result<TripContextChange, SelectionError> {
        if !matches!(
            self.phase,
            TripPhase::Pricing
                | TripPhase::ReadyToRequest
                | TripPhase::Searching
                | TripPhase::NoDriverFound
                | TripPhase::DriverConfirmed
        ) {
            return Err(SelectionError::NothingToCancel);
        }
        info!(generation = self.generation, phase = %self.phase, "trip cancelled");
        let change = self.retire_generation();
        self.clear_trip_data();
        self.phase = TripPhase::Cancelled;
        Ok(change)
    }

    /// The map went away. Pending pricing is dropped back to the location
    /// phase and an in-progress search is cancelled. Settled phases keep
    /// their generation, so the returned change is a no-op for them.
    pub fn interrupt(&mut self) -> TripContextChange {
        match self.phase {
            TripPhase::Pricing => {
                let change = self.retire_generation();
                self.clear_trip_data();
                self.phase = self.location_phase();
                change
            }
            TripPhase::Searching => {
                let change = self.retire_generation();
                self.clear_trip_data();
                self.phase = TripPhase::Cancelled;
                change
            }
            _ => TripContextChange::default(),
        }
    }

    pub fn snapshot(&self) -> TripSnapshot {
        TripSnapshot {
            phase: self.phase,
            generation: self.generation,
            pickup: self.pickup.clone(),
            destination: self.destination.clone(),
            selected_class: self.selected_class,
            quote: self.quote.clone(),
            quote_failed: self.phase == TripPhase::Pricing && self.quote_error.is_some(),
            route: self.route.clone(),
            request: self.request.clone(),
            matched: self.matched.clone(),
        }
    }

    fn locations(&self) -> Result<(&Location, &Location), SelectionError> {
        let pickup = self.pickup.as_ref().ok_or(SelectionError::MissingPickup)?;
        let destination = self
            .destination
            .as_ref()
            .ok_or(SelectionError::MissingDestination)?;
        Ok((pickup, destination))
    }

    fn location_phase(&self) -> TripPhase {
        match (&self.pickup, &self.destination) {
            (Some(_), Some(_)) => TripPhase::LocationsSet,
            (None, None) => TripPhase::Idle,
            _ => TripPhase::LocationsPartial,
        }
    }

    fn apply_resolved(&mut self, summary: RouteSummary, fares: &FareConfig) {
        let quote = TripQuote::new(
            summary.distance_km(),
            summary.duration_s,
            QuoteSource::Resolved,
            fares,
        );
        info!(
            generation = self.generation,
            distance_km = quote.distance_km,
            car = %quote.car,
            bike = %quote.bike,
            "trip priced"
        );
        self.quote = Some(quote);
        self.quote_error = None;
        self.route = Some(summary);
        self.phase = TripPhase::ReadyToRequest;
    }

    fn begin_search(&mut self, clock: &mut SimulationClock, config: &TripConfig) {
        self.phase = TripPhase::Searching;
        if let Some(request) = self.request.as_mut() {
            request.status = TripPhase::Searching;
        }
        clock.schedule_in(
            config.dispatch_delay_ms,
            EventKind::DispatchSearch,
            Some(EventSubject::Trip {
                generation: self.generation,
            }),
        );
    }

    /// Any location edit discards the in-flight trip.
    fn reset_context(&mut self) -> TripContextChange {
        let change = self.retire_generation();
        self.clear_trip_data();
        self.phase = self.location_phase();
        change
    }

    fn retire_generation(&mut self) -> TripContextChange {
        let change = TripContextChange {
            retired_generation: self.generation,
            released_vehicle: self.matched.as_ref().map(|m| m.vehicle_id),
            stop_search: matches!(
                self.phase,
                TripPhase::Searching | TripPhase::NoDriverFound | TripPhase::DriverConfirmed
            ),
        };
        self.generation += 1;
        change
    }

    fn clear_trip_data(&mut self) {
        self.quote = None;
        self.quote_error = None;
        self.route = None;
        self.request = None;
        self.matched = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinate;
    use crate::routing::{RouteKey, RoutePath, TransportMode};
    use std::sync::Arc;

    fn westlands() -> Location {
        Location::new("Westlands", Coordinate::new(-1.2676, 36.8108))
    }

    fn cbd() -> Location {
        Location::new("Nairobi CBD", Coordinate::new(-1.2864, 36.8172))
    }

    fn summary(distance_m: f64) -> RouteSummary {
        RouteSummary {
            distance_m,
            duration_s: 600.0,
            path: Arc::new(RoutePath {
                points: vec![westlands().coordinate, cbd().coordinate],
                mode: TransportMode::Driving,
            }),
        }
    }

    fn priced() -> (TripOrchestrator, RouteProvider, SimulationClock) {
        let mut trip = TripOrchestrator::default();
        let mut provider = RouteProvider::new(100, 250);
        let mut clock = SimulationClock::default();
        trip.set_location(LocationSlot::Pickup, westlands());
        trip.set_location(LocationSlot::Destination, cbd());
        trip.request_price(
            &mut provider,
            &mut clock,
            &TripConfig::default(),
            &FareConfig::default(),
        )
        .expect("price");
        let generation = trip.generation();
        trip.on_route_resolved(generation, Ok(summary(3200.0)), &FareConfig::default());
        (trip, provider, clock)
    }

    #[test]
    fn locations_drive_phase() {
        let mut trip = TripOrchestrator::default();
        assert_eq!(trip.phase(), TripPhase::Idle);
        trip.set_location(LocationSlot::Destination, cbd());
        assert_eq!(trip.phase(), TripPhase::LocationsPartial);
        trip.set_location(LocationSlot::Pickup, westlands());
        assert_eq!(trip.phase(), TripPhase::LocationsSet);
        trip.clear_location(LocationSlot::Pickup);
        assert_eq!(trip.phase(), TripPhase::LocationsPartial);
    }

    #[test]
    fn map_clicks_alternate_and_restart() {
        let mut trip = TripOrchestrator::default();
        assert_eq!(trip.apply_map_click(westlands()).0, LocationSlot::Pickup);
        assert_eq!(trip.apply_map_click(cbd()).0, LocationSlot::Destination);
        assert_eq!(trip.phase(), TripPhase::LocationsSet);

        let third = Location::new("Kilimani", Coordinate::new(-1.2921, 36.7856));
        assert_eq!(trip.apply_map_click(third.clone()).0, LocationSlot::Pickup);
        assert_eq!(trip.pickup(), Some(&third));
        assert!(trip.destination().is_none());
        assert_eq!(trip.phase(), TripPhase::LocationsPartial);
    }

    #[test]
    fn click_with_only_destination_fills_pickup() {
        let mut trip = TripOrchestrator::default();
        trip.set_location(LocationSlot::Destination, cbd());
        let (slot, _) = trip.apply_map_click(westlands());
        assert_eq!(slot, LocationSlot::Pickup);
        assert_eq!(trip.destination(), Some(&cbd()));
    }

    #[test]
    fn pricing_requires_both_locations() {
        let mut trip = TripOrchestrator::default();
        let mut provider = RouteProvider::new(100, 250);
        let mut clock = SimulationClock::default();
        trip.set_location(LocationSlot::Pickup, westlands());
        let err = trip
            .request_price(&mut provider, &mut clock, &TripConfig::default(), &FareConfig::default())
            .unwrap_err();
        assert_eq!(err, SelectionError::MissingDestination);
        assert_eq!(trip.phase(), TripPhase::LocationsPartial);
        assert!(clock.is_empty());
    }

    #[test]
    fn resolved_route_prices_both_classes() {
        let (trip, _, _) = priced();
        assert_eq!(trip.phase(), TripPhase::ReadyToRequest);
        let quote = trip.quote().expect("quote");
        assert_eq!(quote.car.fare, 480);
        assert_eq!(quote.bike.fare, 320);
        assert_eq!(quote.source, QuoteSource::Resolved);
    }

    #[test]
    fn stale_generation_is_ignored() {
        let mut trip = TripOrchestrator::default();
        let mut provider = RouteProvider::new(100, 250);
        let mut clock = SimulationClock::default();
        trip.set_location(LocationSlot::Pickup, westlands());
        trip.set_location(LocationSlot::Destination, cbd());
        trip.request_price(&mut provider, &mut clock, &TripConfig::default(), &FareConfig::default())
            .expect("price");
        let old = trip.generation();
        trip.set_location(LocationSlot::Destination, Location::new("Karen", Coordinate::new(-1.3197, 36.7073)));

        assert!(!trip.on_route_resolved(old, Ok(summary(3200.0)), &FareConfig::default()));
        assert!(trip.on_quote_timeout(old, provider.cache(), &FareConfig::default()).is_none());
        assert_eq!(trip.phase(), TripPhase::LocationsSet);
        assert!(trip.quote().is_none());
    }

    #[test]
    fn timeout_without_cache_uses_great_circle_distance() {
        let mut trip = TripOrchestrator::default();
        let mut provider = RouteProvider::new(100, 250);
        let mut clock = SimulationClock::default();
        trip.set_location(LocationSlot::Pickup, westlands());
        trip.set_location(LocationSlot::Destination, cbd());
        trip.request_price(&mut provider, &mut clock, &TripConfig::default(), &FareConfig::default())
            .expect("price");

        let source = trip.on_quote_timeout(trip.generation(), provider.cache(), &FareConfig::default());
        assert_eq!(source, Some(QuoteSource::Default));
        let expected = haversine_distance_km(westlands().coordinate, cbd().coordinate);
        let quote = trip.quote().expect("quote");
        assert!((quote.distance_km - expected).abs() < 1e-9);
        assert_eq!(trip.phase(), TripPhase::ReadyToRequest);

        // A late success upgrades the estimate.
        assert!(trip.on_route_resolved(trip.generation(), Ok(summary(3200.0)), &FareConfig::default()));
        assert_eq!(trip.quote().map(|q| q.source), Some(QuoteSource::Resolved));
    }

    #[test]
    fn timeout_prefers_cached_pair_under_other_mode() {
        let mut cache = RouteCache::new();
        let key = RouteKey {
            origin: westlands().coordinate.key(),
            destination: cbd().coordinate.key(),
            mode: TransportMode::Bicycling,
        };
        cache.put(key, summary(5000.0));

        let mut trip = TripOrchestrator::default();
        let mut provider = RouteProvider::new(100, 250);
        let mut clock = SimulationClock::default();
        trip.set_location(LocationSlot::Pickup, westlands());
        trip.set_location(LocationSlot::Destination, cbd());
        trip.request_price(&mut provider, &mut clock, &TripConfig::default(), &FareConfig::default())
            .expect("price");
        let source = trip.on_quote_timeout(trip.generation(), &cache, &FareConfig::default());
        assert_eq!(source, Some(QuoteSource::Cached));
        assert_eq!(trip.quote().map(|q| q.car.fare), Some(750));
    }

    #[test]
    fn failed_quote_keeps_calculating() {
        let mut trip = TripOrchestrator::default();
        let mut provider = RouteProvider::new(100, 250);
        let mut clock = SimulationClock::default();
        trip.set_location(LocationSlot::Pickup, westlands());
        trip.set_location(LocationSlot::Destination, cbd());
        trip.request_price(&mut provider, &mut clock, &TripConfig::default(), &FareConfig::default())
            .expect("price");
        let err = RouteError::ResolutionFailed {
            status: crate::routing::DirectionsStatus::ZeroResults,
            mode: TransportMode::Driving,
        };
        trip.on_route_resolved(trip.generation(), Err(err), &FareConfig::default());
        assert_eq!(trip.phase(), TripPhase::Pricing);
        assert!(trip.snapshot().quote_failed);
    }

    #[test]
    fn ride_request_schedules_dispatch() {
        let (mut trip, _, mut clock) = priced();
        let now = clock.now();
        trip.request_ride(VehicleClass::Bike, &mut clock, &TripConfig::default())
            .expect("request");
        assert_eq!(trip.phase(), TripPhase::Searching);
        assert!(!trip.vehicles_visible());
        let request = trip.request().expect("request");
        assert_eq!(request.fare_estimate.fare, 320);
        assert_eq!(request.vehicle_class, VehicleClass::Bike);

        let mut dispatch_at = None;
        while let Some(event) = clock.pop_next() {
            if event.kind == EventKind::DispatchSearch {
                dispatch_at = Some(event.timestamp);
            }
        }
        assert_eq!(dispatch_at, Some(now + 2000));
    }

    #[test]
    fn no_driver_then_retry() {
        let (mut trip, _, mut clock) = priced();
        trip.request_ride(VehicleClass::Car, &mut clock, &TripConfig::default())
            .expect("request");
        let generation = trip.generation();
        assert_eq!(trip.on_dispatch(generation, None), Some(DispatchOutcome::NoDriverFound));
        assert_eq!(trip.phase(), TripPhase::NoDriverFound);
        trip.retry(&mut clock, &TripConfig::default()).expect("retry");
        assert_eq!(trip.phase(), TripPhase::Searching);
    }

    #[test]
    fn cancel_releases_matched_vehicle() {
        let (mut trip, _, mut clock) = priced();
        trip.request_ride(VehicleClass::Car, &mut clock, &TripConfig::default())
            .expect("request");
        let generation = trip.generation();
        let driver = MatchedDriver {
            vehicle_id: VehicleId(1),
            name: "John Kamau".into(),
            class: VehicleClass::Car,
            position: cbd().coordinate,
            pickup_distance_km: 2.1,
        };
        trip.on_dispatch(generation, Some(driver));
        assert_eq!(trip.phase(), TripPhase::DriverConfirmed);

        let change = trip.cancel().expect("cancel");
        assert_eq!(change.released_vehicle, Some(VehicleId(1)));
        assert!(change.stop_search);
        assert_eq!(trip.phase(), TripPhase::Cancelled);
        assert!(trip.vehicles_visible());
        assert!(trip.pickup().is_some());
        assert_eq!(trip.cancel(), Err(SelectionError::NothingToCancel));
    }

    #[test]
    fn dispatch_after_cancel_is_stale() {
        let (mut trip, _, mut clock) = priced();
        trip.request_ride(VehicleClass::Car, &mut clock, &TripConfig::default())
            .expect("request");
        let generation = trip.generation();
        trip.cancel().expect("cancel");
        assert!(trip.on_dispatch(generation, None).is_none());
        assert_eq!(trip.phase(), TripPhase::Cancelled);
    }

    #[test]
    fn request_ride_outside_ready_is_rejected() {
        let mut trip = TripOrchestrator::default();
        let mut clock = SimulationClock::default();
        trip.set_location(LocationSlot::Pickup, westlands());
        trip.set_location(LocationSlot::Destination, cbd());
        let err = trip
            .request_ride(VehicleClass::Car, &mut clock, &TripConfig::default())
            .unwrap_err();
        assert_eq!(
            err,
            SelectionError::NotReady {
                phase: TripPhase::LocationsSet
            }
        );
    }

    #[test]
    fn interrupt_drops_pending_pricing() {
        let mut trip = TripOrchestrator::default();
        let mut provider = RouteProvider::new(100, 250);
        let mut clock = SimulationClock::default();
        trip.set_location(LocationSlot::Pickup, westlands());
        trip.set_location(LocationSlot::Destination, cbd());
        trip.request_price(&mut provider, &mut clock, &TripConfig::default(), &FareConfig::default())
            .expect("price");
        let old = trip.generation();
        let change = trip.interrupt();
        assert_eq!(change.retired_generation, old);
        assert_eq!(trip.phase(), TripPhase::LocationsSet);
    }

    #[test]
    fn interrupt_keeps_settled_trip() {
        let mut trip = TripOrchestrator::default();
        trip.set_location(LocationSlot::Pickup, Location::new("A", Coordinate::new(-1.28, 36.81)));
        let generation = trip.generation();
        let change = trip.interrupt();
        assert_eq!(change, TripContextChange::default());
        assert_eq!(trip.generation(), generation);
        assert_eq!(trip.phase(), TripPhase::LocationsPartial);
    }
}
