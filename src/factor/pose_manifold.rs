//! Tangent-space update rule for 7-parameter poses.

use nalgebra::DMatrix;

use crate::geometry::small_angle_quat;

use super::{pose_from_params, pose_to_params, Manifold};

/// Number of parameters in the global pose representation.
pub const POSE_GLOBAL_SIZE: usize = 7;
/// Degrees of freedom of a pose.
pub const POSE_LOCAL_SIZE: usize = 6;

/// Manifold for a position + unit-quaternion pose block.
///
/// A unit quaternion cannot be updated by plain addition, so the solver hands
/// increments in the 6-dimensional tangent space: the first three components
/// add to the position, the last three form a small-angle quaternion that
/// right-multiplies the orientation, which is then renormalized.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseManifold;

impl Manifold for PoseManifold {
    fn global_size(&self) -> usize {
        POSE_GLOBAL_SIZE
    }

    fn local_size(&self) -> usize {
        POSE_LOCAL_SIZE
    }

    fn plus(&self, x: &[f64], delta: &[f64], x_plus_delta: &mut [f64]) -> bool {
        debug_assert!(x.len() >= POSE_GLOBAL_SIZE);
        debug_assert!(delta.len() >= POSE_LOCAL_SIZE);
        debug_assert!(x_plus_delta.len() >= POSE_GLOBAL_SIZE);

        let (position, orientation) = pose_from_params(x);
        let dp = nalgebra::Vector3::new(delta[0], delta[1], delta[2]);
        let dtheta = nalgebra::Vector3::new(delta[3], delta[4], delta[5]);

        let new_position = position + dp;
        // from_quaternion renormalizes the product to unit norm.
        let new_orientation = nalgebra::UnitQuaternion::from_quaternion(
            orientation.into_inner() * small_angle_quat(&dtheta),
        );

        x_plus_delta[..POSE_GLOBAL_SIZE]
            .copy_from_slice(&pose_to_params(&new_position, &new_orientation));
        true
    }

    /// 7×6 embedding Jacobian: identity over the first six global
    /// coordinates, zero row for the redundant quaternion scalar. The
    /// analytic factor Jacobians already express rotation derivatives in the
    /// tangent, so no cross terms appear here.
    fn local_jacobian(&self, _x: &[f64]) -> DMatrix<f64> {
        let mut j = DMatrix::zeros(POSE_GLOBAL_SIZE, POSE_LOCAL_SIZE);
        for k in 0..POSE_LOCAL_SIZE {
            j[(k, k)] = 1.0;
        }
        j
    }
}
