//! Per-class fare and ETA estimates derived from a route distance.

use std::fmt;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::ecs::VehicleClass;

/// Per-kilometre rates for both vehicle classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct FareConfig {
    pub currency: String,
    pub car_rate_per_km: f64,
    pub bike_rate_per_km: f64,
    pub car_minutes_per_km: f64,
    pub bike_minutes_per_km: f64,
}

impl Default for FareConfig {
    fn default() -> Self {
        Self {
            currency: "KSH".to_string(),
            car_rate_per_km: 150.0,
            bike_rate_per_km: 100.0,
            car_minutes_per_km: 3.0,
            bike_minutes_per_km: 2.0,
        }
    }
}

impl FareConfig {
    fn rates(&self, class: VehicleClass) -> (f64, f64) {
        match class {
            VehicleClass::Car => (self.car_rate_per_km, self.car_minutes_per_km),
            VehicleClass::Bike => (self.bike_rate_per_km, self.bike_minutes_per_km),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FareQuote {
    pub class: VehicleClass,
    /// Whole currency units.
    pub fare: u32,
    pub eta_minutes: u32,
    pub currency: String,
}

impl fmt::Display for FareQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.currency, self.fare)
    }
}

/// Where a quote's distance came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteSource {
    /// The directions collaborator answered for this location pair.
    Resolved,
    /// Timed out; reused an earlier route for the same pair.
    Cached,
    /// Timed out with nothing cached; great-circle distance.
    Default,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TripQuote {
    pub distance_km: f64,
    pub duration_s: f64,
    pub car: FareQuote,
    pub bike: FareQuote,
    pub source: QuoteSource,
}

impl TripQuote {
    pub fn new(distance_km: f64, duration_s: f64, source: QuoteSource, config: &FareConfig) -> Self {
        Self {
            distance_km,
            duration_s,
            car: fare_for(VehicleClass::Car, distance_km, config),
            bike: fare_for(VehicleClass::Bike, distance_km, config),
            source,
        }
    }

    pub fn for_class(&self, class: VehicleClass) -> &FareQuote {
        match class {
            VehicleClass::Car => &self.car,
            VehicleClass::Bike => &self.bike,
        }
    }

    pub fn is_estimate(&self) -> bool {
        self.source != QuoteSource::Resolved
    }
}

/// Fare is `round(distance_km * rate)`; ETA is `round(distance_km * minutes_per_km)`.
pub fn fare_for(class: VehicleClass, distance_km: f64, config: &FareConfig) -> FareQuote {
    let (rate, minutes) = config.rates(class);
    let distance_km = distance_km.max(0.0);
    FareQuote {
        class,
        fare: (distance_km * rate).round() as u32,
        eta_minutes: (distance_km * minutes).round() as u32,
        currency: config.currency.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn car_fare_is_150_per_km_rounded() {
        let quote = fare_for(VehicleClass::Car, 3.2, &FareConfig::default());
        assert_eq!(quote.fare, 480);
        assert_eq!(quote.eta_minutes, 10);
        assert_eq!(quote.to_string(), "KSH 480");
    }

    #[test]
    fn bike_fare_is_100_per_km_rounded() {
        let quote = fare_for(VehicleClass::Bike, 5.13, &FareConfig::default());
        assert_eq!(quote.fare, 513);
        assert_eq!(quote.eta_minutes, 10);
    }

    #[test]
    fn trip_quote_prices_both_classes() {
        let quote = TripQuote::new(2.0, 300.0, QuoteSource::Resolved, &FareConfig::default());
        assert_eq!(quote.for_class(VehicleClass::Car).fare, 300);
        assert_eq!(quote.for_class(VehicleClass::Bike).fare, 200);
        assert!(!quote.is_estimate());
    }

    #[test]
    fn negative_distance_prices_as_zero() {
        let quote = fare_for(VehicleClass::Car, -1.0, &FareConfig::default());
        assert_eq!(quote.fare, 0);
    }
}
