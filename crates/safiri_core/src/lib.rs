pub mod animation;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod ecs;
pub mod error;
pub mod fleet;
pub mod geo;
pub mod geocode;
pub mod inbox;
pub mod matching;
pub mod pricing;
pub mod routing;
pub mod runner;
pub mod search_wave;
pub mod session;
pub mod systems;
pub mod telemetry;
pub mod trip;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use config::SessionConfig;
pub use session::{MapSession, VehicleSnapshot};
