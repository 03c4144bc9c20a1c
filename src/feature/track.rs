//! Per-feature observation history.

use nalgebra::{SVector, Vector2, Vector3};

/// One observation of a feature in one frame.
#[derive(Debug, Clone)]
pub struct FeatureObservation {
    /// Normalized camera ray (z = 1 plane).
    pub bearing: Vector3<f64>,
    /// Pixel coordinate.
    pub pixel: Vector2<f64>,
    /// Pixel velocity from the frontend tracker.
    pub velocity: Vector2<f64>,
    /// Per-frame camera/IMU time offset.
    pub time_offset: f64,
}

impl FeatureObservation {
    /// Decode the frontend's 7-vector layout:
    /// `[x, y, z, u, v, velocity_u, velocity_v]`.
    pub fn from_raw(raw: &SVector<f64, 7>, time_offset: f64) -> Self {
        Self {
            bearing: Vector3::new(raw[0], raw[1], raw[2]),
            pixel: Vector2::new(raw[3], raw[4]),
            velocity: Vector2::new(raw[5], raw[6]),
            time_offset,
        }
    }
}

/// Depth solve status of a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepthStatus {
    /// No depth estimate yet.
    Unsolved,
    /// Triangulated or externally set to a positive depth.
    Solved,
    /// Triangulation produced a non-viable depth; the track is collected by
    /// the failure cleanup pass.
    Failed,
}

/// A feature tracked across consecutive frames of the window.
///
/// Observations are stored in frame order, one per frame from `start_frame`
/// to `end_frame()` inclusive: the observation count always equals
/// `end_frame() - start_frame + 1`.
#[derive(Debug, Clone)]
pub struct FeatureTrack {
    pub id: u64,
    /// Window frame index of the first observation.
    pub start_frame: usize,
    pub observations: Vec<FeatureObservation>,
    /// Estimated depth in the first observing camera; `None` until
    /// triangulated or set externally. Positive whenever `status` is
    /// [`DepthStatus::Solved`].
    pub depth: Option<f64>,
    pub status: DepthStatus,
    /// Flagged by the solver's robust-loss post-pass.
    pub is_outlier: bool,
    /// Scheduled to be marginalized with the oldest keyframe.
    pub is_marginal: bool,
}

impl FeatureTrack {
    pub fn new(id: u64, start_frame: usize, first_observation: FeatureObservation) -> Self {
        Self {
            id,
            start_frame,
            observations: vec![first_observation],
            depth: None,
            status: DepthStatus::Unsolved,
            is_outlier: false,
            is_marginal: false,
        }
    }

    /// Window frame index of the most recent observation.
    pub fn end_frame(&self) -> usize {
        self.start_frame + self.observations.len() - 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(x: f64) -> FeatureObservation {
        FeatureObservation::from_raw(
            &SVector::<f64, 7>::from_column_slice(&[x, 0.0, 1.0, 100.0, 120.0, 0.5, -0.5]),
            0.0,
        )
    }

    #[test]
    fn test_raw_layout_decoding() {
        let o = obs(0.25);
        assert_eq!(o.bearing, Vector3::new(0.25, 0.0, 1.0));
        assert_eq!(o.pixel, Vector2::new(100.0, 120.0));
        assert_eq!(o.velocity, Vector2::new(0.5, -0.5));
    }

    #[test]
    fn test_span_invariant() {
        let mut track = FeatureTrack::new(7, 3, obs(0.0));
        assert_eq!(track.end_frame(), 3);

        track.observations.push(obs(0.1));
        track.observations.push(obs(0.2));
        assert_eq!(track.end_frame(), 5);
        assert_eq!(
            track.observations.len(),
            track.end_frame() - track.start_frame + 1
        );
    }
}
