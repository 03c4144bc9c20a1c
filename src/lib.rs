//! Sliding-window visual-inertial odometry estimation core.
//!
//! This crate fuses high-rate IMU measurements with low-rate visual feature
//! tracks into the residual/Jacobian building blocks of a sliding-window
//! nonlinear least-squares problem:
//!
//! - [`imu::Preintegration`] summarizes a burst of IMU samples between two
//!   keyframes into a bias-sensitive relative-motion estimate with covariance.
//! - [`factor::ImuFactor`] and [`factor::ProjectionFactor`] produce whitened
//!   residuals and analytic Jacobians for a generic solver backend.
//! - [`factor::PoseManifold`] defines the 7-parameter ⇄ 6-DOF tangent-space
//!   update for over-parameterized poses.
//! - [`feature::FeatureManager`] owns the multi-frame feature tracks:
//!   triangulation, parallax-based keyframe gating, and window eviction.
//!
//! The optimization loop itself, sensor I/O, and the image frontend are
//! external collaborators; this crate only defines the contracts they consume.

pub mod config;
pub mod factor;
pub mod feature;
pub mod geometry;
pub mod imu;
pub mod window;
