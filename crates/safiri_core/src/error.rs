use thiserror::Error;

use crate::routing::DirectionsStatus;
use crate::trip::TripPhase;

/// A user action rejected at the API boundary. The trip state is untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("pickup location is not set")]
    MissingPickup,
    #[error("destination is not set")]
    MissingDestination,
    #[error("action not allowed while trip is {phase:?}")]
    NotReady { phase: TripPhase },
    #[error("no unmatched search to retry")]
    NothingToRetry,
    #[error("no active trip to cancel")]
    NothingToCancel,
}

/// Reverse geocoding failed; the clicked location is discarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GeocodeError {
    #[error("reverse geocode failed ({status})")]
    Failed { status: DirectionsStatus },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InboxError {
    #[error("no incoming trip with id {0}")]
    UnknownTrip(u64),
    #[error("driver already has an active trip")]
    AlreadyActive,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid session configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
