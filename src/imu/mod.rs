pub mod preintegration;
pub mod sample;
pub mod types;

pub use preintegration::Preintegration;
pub use sample::{ImuBias, ImuNoise, ImuSample};
pub use types::{Matrix15, Matrix15x18, Matrix18, Vector15};
