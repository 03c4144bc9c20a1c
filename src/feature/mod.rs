//! Feature-track storage across the sliding window.

pub mod manager;
pub mod track;

pub use manager::{FeatureManager, MIN_DEPTH};
pub use track::{DepthStatus, FeatureObservation, FeatureTrack};
