//! Sliding-window keyframe state storage.

pub mod arena;
pub mod shared;

pub use arena::{KeyframeArena, KeyframeState};
pub use shared::SharedWindow;
