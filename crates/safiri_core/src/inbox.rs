//! Per-driver inbox of incoming trip requests.

use std::collections::HashMap;

use bevy_ecs::prelude::Resource;
use tracing::info;

use crate::ecs::{VehicleClass, VehicleId};
use crate::error::InboxError;
use crate::pricing::FareQuote;

/// A confirmed rider trip as shown on the driver dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingTrip {
    pub trip_id: u64,
    pub rider: String,
    pub pickup: String,
    pub destination: String,
    pub distance_km: f64,
    pub fare: FareQuote,
    pub class: VehicleClass,
}

#[derive(Debug, Default)]
struct Inbox {
    incoming: Vec<IncomingTrip>,
    active: Option<IncomingTrip>,
}

#[derive(Debug, Default, Resource)]
pub struct DriverInboxes {
    inboxes: HashMap<VehicleId, Inbox>,
}

impl DriverInboxes {
    pub fn push(&mut self, vehicle: VehicleId, trip: IncomingTrip) {
        info!(%vehicle, trip_id = trip.trip_id, fare = %trip.fare, "trip offered to driver");
        self.inboxes.entry(vehicle).or_default().incoming.push(trip);
    }

    /// Pending offers, oldest first.
    pub fn incoming(&self, vehicle: VehicleId) -> &[IncomingTrip] {
        self.inboxes
            .get(&vehicle)
            .map_or(&[], |inbox| inbox.incoming.as_slice())
    }

    pub fn active(&self, vehicle: VehicleId) -> Option<&IncomingTrip> {
        self.inboxes.get(&vehicle)?.active.as_ref()
    }

    /// Make an offer the driver's active trip. Only one trip can be active.
    pub fn accept(&mut self, vehicle: VehicleId, trip_id: u64) -> Result<&IncomingTrip, InboxError> {
        let inbox = self
            .inboxes
            .get_mut(&vehicle)
            .ok_or(InboxError::UnknownTrip(trip_id))?;
        let index = inbox
            .incoming
            .iter()
            .position(|t| t.trip_id == trip_id)
            .ok_or(InboxError::UnknownTrip(trip_id))?;
        if inbox.active.is_some() {
            return Err(InboxError::AlreadyActive);
        }
        let trip = inbox.incoming.remove(index);
        info!(%vehicle, trip_id, "driver accepted trip");
        Ok(inbox.active.insert(trip))
    }

    pub fn decline(&mut self, vehicle: VehicleId, trip_id: u64) -> Result<IncomingTrip, InboxError> {
        let inbox = self
            .inboxes
            .get_mut(&vehicle)
            .ok_or(InboxError::UnknownTrip(trip_id))?;
        let index = inbox
            .incoming
            .iter()
            .position(|t| t.trip_id == trip_id)
            .ok_or(InboxError::UnknownTrip(trip_id))?;
        info!(%vehicle, trip_id, "driver declined trip");
        Ok(inbox.incoming.remove(index))
    }

    /// Rider-side cancellation: remove the trip wherever it is, including an
    /// accepted one. Returns the driver it was withdrawn from.
    pub fn withdraw(&mut self, trip_id: u64) -> Option<VehicleId> {
        for (vehicle, inbox) in self.inboxes.iter_mut() {
            let before = inbox.incoming.len();
            inbox.incoming.retain(|t| t.trip_id != trip_id);
            let was_active = inbox.active.as_ref().is_some_and(|t| t.trip_id == trip_id);
            if was_active {
                inbox.active = None;
            }
            if was_active || inbox.incoming.len() != before {
                info!(%vehicle, trip_id, "trip withdrawn from driver");
                return Some(*vehicle);
            }
        }
        None
    }

    /// Drop everything held for a vehicle that left the fleet.
    pub fn remove_vehicle(&mut self, vehicle: VehicleId) {
        self.inboxes.remove(&vehicle);
    }
}
