//! Indexed arena of keyframe-state slots.
//!
//! Residual blocks and the feature store refer to keyframes by slot index,
//! never by pointer; sliding the window compacts the arena so indices stay
//! dense and ordered oldest-first.

use nalgebra::{UnitQuaternion, Vector3};

use crate::factor::pose_to_params;

/// Full state of one keyframe: pose, velocity, and IMU biases.
#[derive(Debug, Clone)]
pub struct KeyframeState {
    pub position: Vector3<f64>,
    pub orientation: UnitQuaternion<f64>,
    pub velocity: Vector3<f64>,
    pub accel_bias: Vector3<f64>,
    pub gyro_bias: Vector3<f64>,
}

impl KeyframeState {
    /// State at the world origin with zero velocity and biases.
    pub fn origin() -> Self {
        Self {
            position: Vector3::zeros(),
            orientation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            accel_bias: Vector3::zeros(),
            gyro_bias: Vector3::zeros(),
        }
    }

    /// Marshal the pose into a 7-parameter solver block.
    pub fn pose_params(&self) -> [f64; 7] {
        pose_to_params(&self.position, &self.orientation)
    }

    /// Marshal velocity and biases into a 9-parameter solver block.
    pub fn speed_bias_params(&self) -> [f64; 9] {
        [
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
            self.accel_bias.x,
            self.accel_bias.y,
            self.accel_bias.z,
            self.gyro_bias.x,
            self.gyro_bias.y,
            self.gyro_bias.z,
        ]
    }
}

/// Fixed-capacity, densely indexed keyframe storage.
///
/// Slot 0 is always the oldest keyframe. Eviction removes a slot and shifts
/// the ones behind it down, so an index is only stable until the next slide;
/// callers re-resolve indices after sliding, mirroring how the feature store
/// re-anchors its tracks.
#[derive(Debug, Clone)]
pub struct KeyframeArena {
    slots: Vec<KeyframeState>,
    capacity: usize,
}

impl KeyframeArena {
    /// Arena holding at most `window_size + 1` keyframes (the window plus
    /// the incoming frame awaiting the keyframe decision).
    pub fn new(window_size: usize) -> Self {
        Self {
            slots: Vec::with_capacity(window_size + 1),
            capacity: window_size + 1,
        }
    }

    /// Append a keyframe state; returns its slot index.
    pub fn push(&mut self, state: KeyframeState) -> usize {
        debug_assert!(
            self.slots.len() < self.capacity,
            "keyframe arena over capacity; slide the window first"
        );
        self.slots.push(state);
        self.slots.len() - 1
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&KeyframeState> {
        self.slots.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut KeyframeState> {
        self.slots.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &KeyframeState> {
        self.slots.iter()
    }

    /// Evict the oldest keyframe (marginalization of slot 0), compacting all
    /// remaining slots down by one.
    pub fn slide_oldest(&mut self) -> Option<KeyframeState> {
        if self.slots.is_empty() {
            return None;
        }
        Some(self.slots.remove(0))
    }

    /// Evict the second-newest keyframe (the non-keyframe path: the incoming
    /// frame replaces its predecessor), keeping the newest slot.
    pub fn slide_second_newest(&mut self) -> Option<KeyframeState> {
        let n = self.slots.len();
        if n < 2 {
            return None;
        }
        Some(self.slots.remove(n - 2))
    }
}
