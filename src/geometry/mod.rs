//! Geometry utilities: SO(3) helpers for preintegration and factor Jacobians.

pub mod so3;

pub use so3::{quat_left, quat_right, skew, small_angle_quat};
