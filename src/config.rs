//! Estimator configuration.
//!
//! All tuning knobs are owned by the enclosing pipeline and threaded into this
//! core at construction time; nothing here reads files or global state. The
//! struct derives `Deserialize` so the caller can populate it from whatever
//! calibration format it already uses.

use anyhow::{bail, Result};
use nalgebra::{UnitQuaternion, Vector3};
use serde::Deserialize;

/// Rigid camera-to-body transform for one camera.
#[derive(Debug, Clone, Deserialize)]
pub struct CameraExtrinsics {
    /// Rotation taking camera-frame vectors into the body (IMU) frame.
    pub rotation: UnitQuaternion<f64>,
    /// Camera origin expressed in the body frame.
    pub translation: Vector3<f64>,
}

impl CameraExtrinsics {
    /// Identity transform (camera and body frames coincide).
    pub fn identity() -> Self {
        Self {
            rotation: UnitQuaternion::identity(),
            translation: Vector3::zeros(),
        }
    }
}

/// Configuration consumed by the estimation core.
///
/// Defaults carry EuRoC-grade sensor values so tests and examples can run
/// without a calibration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Accelerometer noise density (m/s²/√Hz).
    pub acc_noise_density: f64,
    /// Gyroscope noise density (rad/s/√Hz).
    pub gyr_noise_density: f64,
    /// Accelerometer bias random walk (m/s³/√Hz).
    pub acc_bias_random_walk: f64,
    /// Gyroscope bias random walk (rad/s²/√Hz).
    pub gyr_bias_random_walk: f64,
    /// Gravity vector in the world frame (z-up), as it enters the inertial
    /// residual prediction.
    pub gravity: Vector3<f64>,
    /// Camera-to-body transform per camera; index 0 is the primary camera.
    pub camera_extrinsics: Vec<CameraExtrinsics>,
    /// Focal length (pixels) used to scale parallax and reprojection
    /// information; virtual, shared by all cameras.
    pub focal_length: f64,
    /// Assumed 1-sigma pixel noise of the feature frontend.
    pub pixel_sigma: f64,
    /// Keyframe admission threshold on average compensated parallax (pixels).
    pub min_parallax_px: f64,
    /// Below this many re-observed tracks in a frame, keyframe admission is
    /// forced regardless of parallax.
    pub min_tracked_features: usize,
    /// Number of keyframes in the sliding window.
    pub window_size: usize,
    /// Magnitude above which a preintegration sensitivity entry is reported
    /// as numerically unstable (warned, never fatal).
    pub sensitivity_warn_threshold: f64,
    /// Accel-bias deviation from the linearization point beyond which the
    /// caller should repropagate (m/s²).
    pub acc_bias_repropagate_threshold: f64,
    /// Gyro-bias deviation from the linearization point beyond which the
    /// caller should repropagate (rad/s).
    pub gyr_bias_repropagate_threshold: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            acc_noise_density: 2.0e-3,
            gyr_noise_density: 1.7e-4,
            acc_bias_random_walk: 3.0e-3,
            gyr_bias_random_walk: 1.9e-5,
            gravity: Vector3::new(0.0, 0.0, 9.8),
            camera_extrinsics: vec![CameraExtrinsics::identity()],
            focal_length: 460.0,
            pixel_sigma: 1.5,
            min_parallax_px: 10.0,
            min_tracked_features: 20,
            window_size: 10,
            sensitivity_warn_threshold: 1e8,
            acc_bias_repropagate_threshold: 0.10,
            gyr_bias_repropagate_threshold: 0.01,
        }
    }
}

impl EstimatorConfig {
    /// Check the configuration for values the core cannot operate with.
    pub fn validate(&self) -> Result<()> {
        if self.acc_noise_density <= 0.0
            || self.gyr_noise_density <= 0.0
            || self.acc_bias_random_walk <= 0.0
            || self.gyr_bias_random_walk <= 0.0
        {
            bail!("IMU noise densities and random walks must be positive");
        }
        if self.camera_extrinsics.is_empty() {
            bail!("at least one camera extrinsic transform is required");
        }
        if self.focal_length <= 0.0 {
            bail!("focal length must be positive, got {}", self.focal_length);
        }
        if self.pixel_sigma <= 0.0 {
            bail!("pixel sigma must be positive, got {}", self.pixel_sigma);
        }
        if self.min_parallax_px < 0.0 {
            bail!("parallax threshold must be non-negative");
        }
        if self.window_size < 4 {
            bail!(
                "window size {} too small; the parallax gate needs at least 4 frames",
                self.window_size
            );
        }
        Ok(())
    }

    /// Keyframe parallax threshold in focal-normalized image units.
    pub fn min_parallax(&self) -> f64 {
        self.min_parallax_px / self.focal_length
    }

    /// Scalar whitening factor for reprojection residuals.
    pub fn projection_information_scale(&self) -> f64 {
        self.focal_length / self.pixel_sigma
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EstimatorConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = EstimatorConfig::default();
        config.focal_length = 0.0;
        assert!(config.validate().is_err());

        let mut config = EstimatorConfig::default();
        config.camera_extrinsics.clear();
        assert!(config.validate().is_err());

        let mut config = EstimatorConfig::default();
        config.window_size = 2;
        assert!(config.validate().is_err());

        let mut config = EstimatorConfig::default();
        config.gyr_noise_density = -1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parallax_normalization() {
        let config = EstimatorConfig::default();
        let expected = config.min_parallax_px / config.focal_length;
        assert!((config.min_parallax() - expected).abs() < 1e-15);
    }
}
