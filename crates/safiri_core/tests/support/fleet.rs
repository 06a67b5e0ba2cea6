#![allow(dead_code)]

use safiri_core::ecs::VehicleClass;
use safiri_core::fleet::FleetRecord;
use safiri_core::geo::Coordinate;
use safiri_core::trip::Location;

/// Roughly 1 km north-east of the scenario pickup.
pub const NEARBY: Coordinate = Coordinate::new(-1.2800, 36.8250);
/// Roughly 40 km north of the scenario pickup, beyond the match radius.
pub const FAR_AWAY: Coordinate = Coordinate::new(-0.9264, 36.8172);

/// A vehicle patrolling a short east-west segment starting at `start`.
pub fn vehicle_at(id: u32, name: &str, class: VehicleClass, start: Coordinate) -> FleetRecord {
    let end = Coordinate::new(start.lat, start.lng + 0.01);
    FleetRecord::new(id, name, class, start, end)
}

pub fn car_at(id: u32, start: Coordinate) -> FleetRecord {
    vehicle_at(id, &format!("Car {id}"), VehicleClass::Car, start)
}

pub fn bike_at(id: u32, start: Coordinate) -> FleetRecord {
    vehicle_at(id, &format!("Bike {id}"), VehicleClass::Bike, start)
}

pub fn location(label: &str, coordinate: Coordinate) -> Location {
    Location::new(label, coordinate)
}
