//! Sliding-window feature-track store.
//!
//! Owns every track observed inside the window: admission of new frames with
//! parallax-based keyframe gating, direct linear triangulation of depth,
//! marshalling of the inverse-depth parameter vector, and the eviction
//! bookkeeping that keeps tracks consistent as the window slides.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector, RowVector4, SVector, UnitQuaternion, Vector3};
use tracing::{debug, warn};

use crate::config::{CameraExtrinsics, EstimatorConfig};
use crate::window::KeyframeArena;

use super::track::{DepthStatus, FeatureObservation, FeatureTrack};

/// Depth floor below which a triangulation is rejected as degenerate.
pub const MIN_DEPTH: f64 = 0.1;

/// A track enters the optimization once it has at least two observations and
/// starts early enough in the window to be constrained.
fn is_eligible(window_size: usize, track: &FeatureTrack) -> bool {
    track.observations.len() >= 2 && track.start_frame + 2 < window_size
}

/// Store of all feature tracks across the sliding window.
///
/// Tracks keep their insertion order; the inverse-depth parameter vector and
/// every per-track pass iterate in that order, so identical input sequences
/// always produce identical results.
pub struct FeatureManager {
    tracks: Vec<FeatureTrack>,
    /// How many tracks were re-observed (not newly created) by the latest
    /// frame.
    last_track_count: usize,
    window_size: usize,
    /// Keyframe admission threshold, focal-normalized.
    min_parallax: f64,
    /// Below this many re-observed tracks, admission is forced.
    min_track_count: usize,
    /// Rotation part of the primary camera extrinsics, for
    /// rotation-compensated parallax.
    extrinsic_rotation: UnitQuaternion<f64>,
}

impl FeatureManager {
    pub fn new(config: &EstimatorConfig) -> Self {
        Self {
            tracks: Vec::new(),
            last_track_count: 0,
            window_size: config.window_size,
            min_parallax: config.min_parallax(),
            min_track_count: config.min_tracked_features,
            extrinsic_rotation: config
                .camera_extrinsics
                .first()
                .map(|e| e.rotation)
                .unwrap_or_else(UnitQuaternion::identity),
        }
    }

    /// Drop every track.
    pub fn clear(&mut self) {
        self.tracks.clear();
        self.last_track_count = 0;
    }

    pub fn tracks(&self) -> &[FeatureTrack] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut [FeatureTrack] {
        &mut self.tracks
    }

    /// Number of tracks currently eligible for optimization.
    pub fn tracked_count(&self) -> usize {
        let window_size = self.window_size;
        self.tracks
            .iter()
            .filter(|t| is_eligible(window_size, t))
            .count()
    }

    /// Ingest one frame of frontend observations and decide whether the
    /// frame is a keyframe.
    ///
    /// `observations` maps feature id to (camera id, 7-vector
    /// `[x, y, z, u, v, vu, vv]`); `rotations` holds the world-from-body
    /// orientation of every window frame up to `frame_index - 1`, used to
    /// compensate pure rotation out of the parallax measure.
    ///
    /// Returns true when the frame should be admitted as a keyframe: either
    /// too few re-observed tracks exist to judge motion, or the average
    /// parallax of long tracks over the last two frames clears the
    /// configured threshold.
    pub fn add_frame(
        &mut self,
        frame_index: usize,
        observations: &BTreeMap<u64, (usize, SVector<f64, 7>)>,
        time_offset: f64,
        rotations: &[UnitQuaternion<f64>],
    ) -> bool {
        let mut new_tracks = 0usize;
        self.last_track_count = 0;

        for (&id, &(_camera_id, raw)) in observations {
            let obs = FeatureObservation::from_raw(&raw, time_offset);
            match self.tracks.iter_mut().find(|t| t.id == id) {
                Some(track) => {
                    debug_assert_eq!(
                        track.end_frame() + 1,
                        frame_index,
                        "track {} skipped a frame",
                        id
                    );
                    track.observations.push(obs);
                    self.last_track_count += 1;
                }
                None => {
                    self.tracks.push(FeatureTrack::new(id, frame_index, obs));
                    new_tracks += 1;
                }
            }
        }

        debug!(
            "frame {}: {} tracked, {} new features",
            frame_index, self.last_track_count, new_tracks
        );

        if frame_index < 2 || self.last_track_count < self.min_track_count {
            return true;
        }

        let mut parallax_sum = 0.0;
        let mut parallax_count = 0usize;
        for track in &self.tracks {
            if track.start_frame + 2 <= frame_index && track.end_frame() + 1 >= frame_index {
                parallax_sum += self.compensated_parallax(track, frame_index, rotations);
                parallax_count += 1;
            }
        }

        if parallax_count == 0 {
            true
        } else {
            let average = parallax_sum / parallax_count as f64;
            debug!(
                "frame {}: average parallax {:.4} over {} tracks",
                frame_index, average, parallax_count
            );
            average >= self.min_parallax
        }
    }

    /// Focal-normalized displacement of a track between the two most recent
    /// frames, with the relative rotation compensated away so pure rotation
    /// does not masquerade as parallax. The raw displacement is kept as a
    /// fallback bound in case the compensation itself degenerates.
    fn compensated_parallax(
        &self,
        track: &FeatureTrack,
        frame_index: usize,
        rotations: &[UnitQuaternion<f64>],
    ) -> f64 {
        let obs_i = &track.observations[frame_index - 2 - track.start_frame];
        let obs_j = &track.observations[frame_index - 1 - track.start_frame];

        let p_j = obs_j.bearing;
        let u_j = p_j.x / p_j.z;
        let v_j = p_j.y / p_j.z;

        let p_i = obs_i.bearing;
        let u_i = p_i.x / p_i.z;
        let v_i = p_i.y / p_i.z;
        let du = u_i - u_j;
        let dv = v_i - v_j;

        let ric = self.extrinsic_rotation;
        let p_i_comp = match (rotations.get(frame_index - 2), rotations.get(frame_index - 1)) {
            (Some(r_i), Some(r_j)) => (ric.inverse() * r_j.inverse() * r_i * ric) * p_i,
            _ => p_i,
        };
        let u_i_comp = p_i_comp.x / p_i_comp.z;
        let v_i_comp = p_i_comp.y / p_i_comp.z;
        let du_comp = u_i_comp - u_j;
        let dv_comp = v_i_comp - v_j;

        (du * du + dv * dv)
            .min(du_comp * du_comp + dv_comp * dv_comp)
            .max(0.0)
            .sqrt()
    }

    /// Normalized-bearing pairs of every track observed in both frames.
    pub fn corresponding(
        &self,
        frame_l: usize,
        frame_r: usize,
    ) -> Vec<(Vector3<f64>, Vector3<f64>)> {
        self.tracks
            .iter()
            .filter(|t| t.start_frame <= frame_l && t.end_frame() >= frame_r)
            .map(|t| {
                (
                    t.observations[frame_l - t.start_frame].bearing,
                    t.observations[frame_r - t.start_frame].bearing,
                )
            })
            .collect()
    }

    /// Triangulate every eligible track that has no depth yet.
    ///
    /// Each observation contributes its projective constraint to a linear
    /// system whose minimum-singular-vector solution is the homogeneous
    /// point in the first observing camera. Non-viable depths mark the track
    /// [`DepthStatus::Failed`]; nothing aborts.
    pub fn triangulate(&mut self, window: &KeyframeArena, extrinsics: &CameraExtrinsics) {
        let ric = extrinsics.rotation.to_rotation_matrix().into_inner();
        let tic = extrinsics.translation;

        let window_size = self.window_size;
        let mut solved = 0usize;
        let mut failed = 0usize;
        for track in &mut self.tracks {
            if !is_eligible(window_size, track) || track.depth.is_some() {
                continue;
            }
            debug_assert!(
                track.end_frame() < window.len(),
                "track observes frames outside the arena"
            );

            let anchor = match window.get(track.start_frame) {
                Some(kf) => kf,
                None => continue,
            };
            let r0 = anchor.orientation.to_rotation_matrix().into_inner() * ric;
            let t0 = anchor.position + anchor.orientation * tic;

            let mut a = DMatrix::<f64>::zeros(2 * track.observations.len(), 4);
            for (k, obs) in track.observations.iter().enumerate() {
                let kf = match window.get(track.start_frame + k) {
                    Some(kf) => kf,
                    None => continue,
                };
                let r1 = kf.orientation.to_rotation_matrix().into_inner() * ric;
                let t1 = kf.position + kf.orientation * tic;
                let t_rel = r0.transpose() * (t1 - t0);
                let r_rel = r0.transpose() * r1;

                // Projection rows of [r_relᵀ | −r_relᵀ·t_rel].
                let p_rot = r_rel.transpose();
                let p_trans = -r_rel.transpose() * t_rel;
                let row = |r: usize| {
                    RowVector4::new(p_rot[(r, 0)], p_rot[(r, 1)], p_rot[(r, 2)], p_trans[r])
                };

                let f = obs.bearing.normalize();
                a.row_mut(2 * k).copy_from(&(f.x * row(2) - f.z * row(0)));
                a.row_mut(2 * k + 1)
                    .copy_from(&(f.y * row(2) - f.z * row(1)));
            }

            let svd = a.svd(false, true);
            let v_t = match svd.v_t {
                Some(v_t) => v_t,
                None => {
                    warn!("SVD failed to converge while triangulating track {}", track.id);
                    track.status = DepthStatus::Failed;
                    failed += 1;
                    continue;
                }
            };
            let solution = v_t.row(v_t.nrows() - 1);
            let depth = solution[2] / solution[3];

            if depth.is_finite() && depth >= MIN_DEPTH {
                track.depth = Some(depth);
                track.status = DepthStatus::Solved;
                solved += 1;
            } else {
                track.depth = None;
                track.status = DepthStatus::Failed;
                failed += 1;
            }
        }

        if solved + failed > 0 {
            debug!("triangulated {} tracks ({} failed)", solved, failed);
        }
    }

    /// Flat inverse-depth parameter vector over eligible tracks, in track
    /// insertion order. Tracks without a depth marshal as the -1.0 sentinel.
    pub fn depth_vector(&self) -> DVector<f64> {
        let window_size = self.window_size;
        let values: Vec<f64> = self
            .tracks
            .iter()
            .filter(|t| is_eligible(window_size, t))
            .map(|t| t.depth.map_or(-1.0, |d| 1.0 / d))
            .collect();
        DVector::from_vec(values)
    }

    /// Write the solver's inverse-depth estimates back into the tracks.
    /// Non-positive depths mark the track failed for the cleanup pass.
    pub fn set_depths(&mut self, inverse_depths: &DVector<f64>) {
        let window_size = self.window_size;
        let mut index = 0usize;
        for track in &mut self.tracks {
            if !is_eligible(window_size, track) {
                continue;
            }
            debug_assert!(index < inverse_depths.len(), "depth vector too short");
            let Some(&inv) = inverse_depths.get(index) else {
                break;
            };
            index += 1;

            let depth = 1.0 / inv;
            if depth.is_finite() && depth > 0.0 {
                track.depth = Some(depth);
                track.status = DepthStatus::Solved;
            } else {
                track.depth = None;
                track.status = DepthStatus::Failed;
            }
        }
    }

    /// Reset every eligible track to no depth, pending re-triangulation.
    pub fn clear_depths(&mut self) {
        let window_size = self.window_size;
        for track in &mut self.tracks {
            if is_eligible(window_size, track) {
                track.depth = None;
                track.status = DepthStatus::Unsolved;
            }
        }
    }

    /// Drop tracks whose depth solve failed.
    pub fn remove_failures(&mut self) {
        self.tracks.retain(|t| t.status != DepthStatus::Failed);
    }

    /// Drop tracks flagged by the solver's outlier rejection.
    pub fn remove_outliers(&mut self) {
        self.tracks.retain(|t| !t.is_outlier);
    }

    /// Evict the oldest frame: tracks starting later shift down one frame,
    /// tracks anchored at it lose their first observation and are dropped
    /// when none remain.
    pub fn remove_back(&mut self) {
        self.tracks.retain_mut(|track| {
            if track.start_frame != 0 {
                track.start_frame -= 1;
                return true;
            }
            track.observations.remove(0);
            !track.observations.is_empty()
        });
    }

    /// Evict the oldest frame, re-anchoring each affected track's depth from
    /// the marginalized camera pose onto the new first observer.
    ///
    /// `marg_*` is the camera pose of the evicted frame, `new_*` the camera
    /// pose of the frame that becomes the track's anchor. Tracks falling
    /// under two observations are dropped; re-anchored depths that come out
    /// non-positive mark the track failed.
    pub fn remove_back_shift_depth(
        &mut self,
        marg_rotation: &UnitQuaternion<f64>,
        marg_position: &Vector3<f64>,
        new_rotation: &UnitQuaternion<f64>,
        new_position: &Vector3<f64>,
    ) {
        self.tracks.retain_mut(|track| {
            if track.start_frame != 0 {
                track.start_frame -= 1;
                return true;
            }

            let anchor_bearing = track.observations[0].bearing;
            track.observations.remove(0);
            if track.observations.len() < 2 {
                return false;
            }

            if let Some(depth) = track.depth {
                let point_marg = anchor_bearing * depth;
                let point_world = marg_rotation * point_marg + marg_position;
                let point_new = new_rotation.inverse() * (point_world - new_position);
                if point_new.z > 0.0 {
                    track.depth = Some(point_new.z);
                } else {
                    track.depth = None;
                    track.status = DepthStatus::Failed;
                }
            }
            true
        });
    }

    /// Evict the second-newest frame (`frame_count` is the index of the
    /// incoming frame): tracks starting at the incoming frame shift down,
    /// tracks spanning the evicted frame lose that observation and are
    /// dropped when none remain.
    pub fn remove_front(&mut self, frame_count: usize) {
        self.tracks.retain_mut(|track| {
            if track.start_frame == frame_count {
                track.start_frame -= 1;
                return true;
            }
            if track.end_frame() + 1 < frame_count {
                return true;
            }
            let evicted = frame_count - 1 - track.start_frame;
            track.observations.remove(evicted);
            !track.observations.is_empty()
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::KeyframeState;
    use approx::assert_relative_eq;

    fn test_config() -> EstimatorConfig {
        EstimatorConfig {
            min_tracked_features: 3,
            ..EstimatorConfig::default()
        }
    }

    fn raw_obs(x: f64, y: f64) -> SVector<f64, 7> {
        SVector::<f64, 7>::from_column_slice(&[x, y, 1.0, 460.0 * x, 460.0 * y, 0.0, 0.0])
    }

    fn frame(entries: &[(u64, f64, f64)]) -> BTreeMap<u64, (usize, SVector<f64, 7>)> {
        entries
            .iter()
            .map(|&(id, x, y)| (id, (0usize, raw_obs(x, y))))
            .collect()
    }

    fn identity_rotations(n: usize) -> Vec<UnitQuaternion<f64>> {
        vec![UnitQuaternion::identity(); n]
    }

    #[test]
    fn test_first_frames_are_keyframes() {
        let mut manager = FeatureManager::new(&test_config());
        let rotations = identity_rotations(4);

        assert!(manager.add_frame(0, &frame(&[(1, 0.0, 0.0), (2, 0.1, 0.0)]), 0.0, &rotations));
        assert!(manager.add_frame(1, &frame(&[(1, 0.0, 0.0), (2, 0.1, 0.0)]), 0.0, &rotations));
    }

    #[test]
    fn test_admission_forced_when_few_tracks() {
        let mut manager = FeatureManager::new(&test_config());
        let rotations = identity_rotations(6);

        for k in 0..3 {
            manager.add_frame(k, &frame(&[(1, 0.0, 0.0), (2, 0.1, 0.0)]), 0.0, &rotations);
        }
        // Only two re-observed tracks < min_tracked_features of 3.
        assert!(manager.add_frame(3, &frame(&[(1, 0.0, 0.0), (2, 0.1, 0.0)]), 0.0, &rotations));
    }

    fn drifting_frames(
        manager: &mut FeatureManager,
        step: f64,
        frames: usize,
        rotations: &[UnitQuaternion<f64>],
    ) -> bool {
        let mut last = false;
        for k in 0..frames {
            let x = step * k as f64;
            let obs = frame(&[
                (1, x, 0.0),
                (2, x + 0.1, 0.0),
                (3, x, 0.1),
                (4, x + 0.1, 0.1),
            ]);
            last = manager.add_frame(k, &obs, 0.0, rotations);
        }
        last
    }

    #[test]
    fn test_parallax_gate_admits_motion_and_rejects_jitter() {
        let rotations = identity_rotations(8);

        // 0.05 normalized units per frame is well over 10 px / 460 px focal.
        let mut moving = FeatureManager::new(&test_config());
        assert!(drifting_frames(&mut moving, 0.05, 5, &rotations));

        // 0.001 per frame is well under the threshold.
        let mut still = FeatureManager::new(&test_config());
        assert!(!drifting_frames(&mut still, 0.001, 5, &rotations));
    }

    #[test]
    fn test_parallax_gate_is_deterministic() {
        let rotations = identity_rotations(8);
        let run = || {
            let mut manager = FeatureManager::new(&test_config());
            (0..6)
                .map(|k| {
                    let x = 0.02 * k as f64;
                    manager.add_frame(
                        k,
                        &frame(&[(1, x, 0.0), (2, x + 0.1, 0.0), (3, x, 0.1)]),
                        0.0,
                        &rotations,
                    )
                })
                .collect::<Vec<bool>>()
        };

        assert_eq!(run(), run());
    }

    #[test]
    fn test_rotation_compensation_suppresses_pure_rotation() {
        // The camera yaws between frames; bearings move although the scene
        // is static. With the rotation compensated the parallax collapses.
        let config = test_config();
        let mut manager = FeatureManager::new(&config);

        let yaw_step = 0.02;
        let rotations: Vec<UnitQuaternion<f64>> = (0..6)
            .map(|k| UnitQuaternion::from_euler_angles(0.0, 0.0, yaw_step * k as f64))
            .collect();

        let mut admitted = Vec::new();
        for k in 0..5 {
            // Static bearings viewed through a yawing camera.
            let observations: BTreeMap<u64, (usize, SVector<f64, 7>)> = [
                (1u64, Vector3::new(0.0, 0.0, 1.0)),
                (2u64, Vector3::new(0.1, 0.0, 1.0)),
                (3u64, Vector3::new(0.0, 0.1, 1.0)),
            ]
            .into_iter()
            .map(|(id, dir)| {
                let cam = rotations[k].inverse() * dir;
                let raw = SVector::<f64, 7>::from_column_slice(&[
                    cam.x / cam.z,
                    cam.y / cam.z,
                    1.0,
                    0.0,
                    0.0,
                    0.0,
                    0.0,
                ]);
                (id, (0usize, raw))
            })
            .collect();
            admitted.push(manager.add_frame(k, &observations, 0.0, &rotations));
        }

        // Once the gate is active (frame >= 2, all tracks re-observed), the
        // compensated parallax stays below the threshold.
        assert!(!admitted[3]);
        assert!(!admitted[4]);
    }

    #[test]
    fn test_track_span_invariant_after_adding() {
        let mut manager = FeatureManager::new(&test_config());
        let rotations = identity_rotations(6);
        drifting_frames(&mut manager, 0.01, 5, &rotations);

        for track in manager.tracks() {
            assert_eq!(
                track.observations.len(),
                track.end_frame() - track.start_frame + 1
            );
        }
    }

    #[test]
    fn test_window_slide_invariant() {
        let mut manager = FeatureManager::new(&test_config());
        let rotations = identity_rotations(8);
        drifting_frames(&mut manager, 0.01, 6, &rotations);

        manager.remove_back();
        for track in manager.tracks() {
            assert!(track.end_frame() < manager.window_size);
            assert_eq!(
                track.observations.len(),
                track.end_frame() - track.start_frame + 1
            );
        }

        manager.remove_front(5);
        for track in manager.tracks() {
            assert!(track.start_frame < manager.window_size);
            assert_eq!(
                track.observations.len(),
                track.end_frame() - track.start_frame + 1
            );
        }
    }

    fn two_view_setup() -> (KeyframeArena, CameraExtrinsics, FeatureManager, Vector3<f64>) {
        let config = test_config();
        let mut manager = FeatureManager::new(&config);
        let extrinsics = CameraExtrinsics::identity();

        let mut arena = KeyframeArena::new(config.window_size);
        let mut poses = Vec::new();
        for k in 0..3 {
            let state = KeyframeState {
                position: Vector3::new(0.5 * k as f64, 0.0, 0.0),
                ..KeyframeState::origin()
            };
            poses.push(state.clone());
            arena.push(state);
        }

        // A world point five meters ahead, observed from all three frames.
        let point_world = Vector3::new(0.4, 0.2, 5.0);
        let rotations = identity_rotations(4);
        for (k, pose) in poses.iter().enumerate() {
            let cam = pose.orientation.inverse() * (point_world - pose.position);
            let raw = SVector::<f64, 7>::from_column_slice(&[
                cam.x / cam.z,
                cam.y / cam.z,
                1.0,
                0.0,
                0.0,
                0.0,
                0.0,
            ]);
            let observations = [(1u64, (0usize, raw))].into_iter().collect();
            manager.add_frame(k, &observations, 0.0, &rotations);
        }

        (arena, extrinsics, manager, point_world)
    }

    #[test]
    fn test_triangulation_recovers_true_depth() {
        let (arena, extrinsics, mut manager, point_world) = two_view_setup();

        manager.triangulate(&arena, &extrinsics);

        let track = &manager.tracks()[0];
        assert_eq!(track.status, DepthStatus::Solved);
        // The anchor camera sits at the origin, so the true depth is the
        // point's z coordinate.
        assert_relative_eq!(track.depth.unwrap(), point_world.z, epsilon = 1e-6);
    }

    #[test]
    fn test_depth_vector_round_trip() {
        let (arena, extrinsics, mut manager, _) = two_view_setup();
        manager.triangulate(&arena, &extrinsics);

        let depths = manager.depth_vector();
        assert_eq!(depths.len(), 1);

        manager.clear_depths();
        assert!(manager.tracks()[0].depth.is_none());
        assert_eq!(manager.depth_vector()[0], -1.0);

        manager.set_depths(&depths);
        assert_eq!(manager.tracks()[0].status, DepthStatus::Solved);
        assert_relative_eq!(
            manager.tracks()[0].depth.unwrap(),
            1.0 / depths[0],
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_set_depths_flags_nonpositive_as_failed() {
        let (arena, extrinsics, mut manager, _) = two_view_setup();
        manager.triangulate(&arena, &extrinsics);

        manager.set_depths(&DVector::from_vec(vec![-0.5]));
        assert_eq!(manager.tracks()[0].status, DepthStatus::Failed);
        assert!(manager.tracks()[0].depth.is_none());

        manager.remove_failures();
        assert!(manager.tracks().is_empty());
    }

    #[test]
    fn test_remove_back_shift_depth_reanchors() {
        let (arena, extrinsics, mut manager, point_world) = two_view_setup();
        manager.triangulate(&arena, &extrinsics);

        let marg = arena.get(0).unwrap().clone();
        let new = arena.get(1).unwrap().clone();
        manager.remove_back_shift_depth(
            &marg.orientation,
            &marg.position,
            &new.orientation,
            &new.position,
        );

        let track = &manager.tracks()[0];
        assert_eq!(track.start_frame, 0);
        assert_eq!(track.observations.len(), 2);
        // With identity rotations the depth is unchanged by a lateral slide.
        assert_relative_eq!(track.depth.unwrap(), point_world.z, epsilon = 1e-6);
    }

    #[test]
    fn test_remove_outliers() {
        let mut manager = FeatureManager::new(&test_config());
        let rotations = identity_rotations(6);
        drifting_frames(&mut manager, 0.01, 4, &rotations);

        let total = manager.tracks().len();
        manager.tracks_mut()[0].is_outlier = true;
        manager.remove_outliers();
        assert_eq!(manager.tracks().len(), total - 1);
    }

    #[test]
    fn test_corresponding_pairs() {
        let mut manager = FeatureManager::new(&test_config());
        let rotations = identity_rotations(6);
        drifting_frames(&mut manager, 0.01, 4, &rotations);

        let pairs = manager.corresponding(1, 3);
        assert_eq!(pairs.len(), 4);
        for (left, right) in &pairs {
            assert_relative_eq!(right.x - left.x, 0.02, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_tracked_count_matches_eligibility() {
        let mut manager = FeatureManager::new(&test_config());
        let rotations = identity_rotations(6);
        drifting_frames(&mut manager, 0.01, 3, &rotations);

        // All four tracks start at frame 0 and have 3 observations.
        assert_eq!(manager.tracked_count(), 4);
        assert_eq!(manager.depth_vector().len(), 4);

        manager.clear();
        assert!(manager.tracks().is_empty());
        assert_eq!(manager.tracked_count(), 0);
    }
}
