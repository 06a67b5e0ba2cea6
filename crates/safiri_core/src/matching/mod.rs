pub mod algorithm;
pub mod nearest;
pub mod types;

use bevy_ecs::prelude::Resource;

pub use algorithm::MatchingAlgorithm;
pub use nearest::{find_nearest, NearestMatching, DEFAULT_MAX_RADIUS_KM};
pub use types::{FleetCandidate, MatchCandidate};

/// Resource wrapper for the matching algorithm trait object.
#[derive(Resource)]
pub struct MatchingAlgorithmResource(pub Box<dyn MatchingAlgorithm>);

impl MatchingAlgorithmResource {
    pub fn new(algorithm: Box<dyn MatchingAlgorithm>) -> Self {
        Self(algorithm)
    }
}

impl Default for MatchingAlgorithmResource {
    fn default() -> Self {
        Self::new(Box::new(NearestMatching))
    }
}

impl std::ops::Deref for MatchingAlgorithmResource {
    type Target = dyn MatchingAlgorithm;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}
