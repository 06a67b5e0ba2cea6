//! Walk one rider through the Nairobi demo: price a trip, request a car and
//! print what the map and the driver dashboard would show.
//!
//! Run with: cargo run -p safiri_core --example scenario_run

use safiri_core::ecs::VehicleClass;
use safiri_core::fleet::nairobi_fleet;
use safiri_core::geo::Coordinate;
use safiri_core::geocode::GeocodeLookup;
use safiri_core::{MapSession, SessionConfig};

fn main() {
    let mut session = MapSession::with_defaults(SessionConfig::default());
    session.load_fleet(&nairobi_fleet());
    session.mount_map();

    // Two map clicks: pickup near the CBD, destination in Westlands.
    for click in [Coordinate::new(-1.2864, 36.8172), Coordinate::new(-1.2676, 36.8108)] {
        if let GeocodeLookup::Pending { .. } = session.click_map(click) {
            session.advance(500);
        }
    }
    let trip = session.trip();
    println!("--- Nairobi demo ---");
    println!(
        "Pickup: {}",
        trip.pickup.map(|p| p.label).unwrap_or_default()
    );
    println!(
        "Destination: {}",
        trip.destination.map(|d| d.label).unwrap_or_default()
    );

    if let Err(err) = session.request_price() {
        println!("Pricing rejected: {err}");
        return;
    }
    session.advance(1_000);
    if let Some(quote) = session.trip().quote {
        println!(
            "Quote ({:?}): {:.2} km, car {} (~{} min), bike {} (~{} min)",
            quote.source,
            quote.distance_km,
            quote.car,
            quote.car.eta_minutes,
            quote.bike,
            quote.bike.eta_minutes
        );
    }

    if let Err(err) = session.request_ride(VehicleClass::Car) {
        println!("Ride rejected: {err}");
        return;
    }
    session.advance(2_000);
    let trip = session.trip();
    println!("Trip phase after dispatch: {}", trip.phase);
    if let Some(driver) = trip.matched {
        println!(
            "Driver: {} ({}) {:.2} km from pickup",
            driver.name, driver.vehicle_id, driver.pickup_distance_km
        );
        for offer in session.incoming_trips(driver.vehicle_id) {
            println!(
                "Dashboard offer #{}: {} -> {} for {}",
                offer.trip_id, offer.pickup, offer.destination, offer.fare
            );
        }
    }

    println!("\nFleet:");
    for vehicle in session.vehicles() {
        println!(
            "  {} {:<14} {:?} {:?} at ({:.5}, {:.5}) heading {:.0}",
            vehicle.id,
            vehicle.name,
            vehicle.class,
            vehicle.status,
            vehicle.position.lat,
            vehicle.position.lng,
            vehicle.heading
        );
    }

    let telemetry = session.telemetry();
    println!(
        "\nDirections calls: {}, cache hits: {}, animation frames: {}",
        telemetry.routes.directions_calls,
        telemetry.routes.cache_hits,
        telemetry.session.animation_ticks
    );
}
