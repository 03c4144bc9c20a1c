//! Residual factors and the capability contracts a solver backend consumes.
//!
//! The solver owns the optimization loop; this module owns the math it calls
//! into. Two contracts cross the boundary:
//!
//! - [`Factor`]: a residual block with per-parameter-block analytic
//!   Jacobians, each independently requestable and already whitened.
//! - [`Manifold`]: the tangent-space update rule for over-parameterized
//!   blocks (here: 7-parameter poses with 6 degrees of freedom).
//!
//! Parameter blocks are flat `f64` slices in the solver's own storage;
//! factors never own or mutate them.

pub mod imu_factor;
pub mod pose_manifold;
pub mod projection_factor;

pub use imu_factor::ImuFactor;
pub use pose_manifold::{PoseManifold, POSE_GLOBAL_SIZE, POSE_LOCAL_SIZE};
pub use projection_factor::ProjectionFactor;

use nalgebra::{DMatrix, Quaternion, UnitQuaternion, Vector3};

/// A residual block of the sliding-window problem.
pub trait Factor {
    /// Dimension of the residual vector.
    fn num_residuals(&self) -> usize;

    /// Sizes of the parameter blocks this factor reads, in call order.
    fn parameter_block_sizes(&self) -> &[usize];

    /// Evaluate the whitened residual and, on request, its Jacobians.
    ///
    /// `parameters` holds one slice per parameter block. `jacobians`, when
    /// present, holds one slot per block: a `Some` slot is replaced with the
    /// whitened `num_residuals × block_size` Jacobian, a `None` slot is
    /// skipped. Returns false only when the factor cannot produce values
    /// (degenerate covariance under a violated caller contract).
    fn evaluate(
        &self,
        parameters: &[&[f64]],
        residuals: &mut [f64],
        jacobians: Option<&mut [Option<DMatrix<f64>>]>,
    ) -> bool;
}

/// Tangent-space update rule for an over-parameterized block.
pub trait Manifold {
    /// Number of parameters in the global representation.
    fn global_size(&self) -> usize;

    /// Dimension of the tangent space.
    fn local_size(&self) -> usize;

    /// Apply a tangent-space increment: `x_plus_delta = x ⊞ delta`.
    fn plus(&self, x: &[f64], delta: &[f64], x_plus_delta: &mut [f64]) -> bool;

    /// Derivative of the global embedding w.r.t. the tangent increment at
    /// `x`, as a `global_size × local_size` matrix. The solver uses it to
    /// project full-width Jacobians into the tangent space.
    fn local_jacobian(&self, x: &[f64]) -> DMatrix<f64>;
}

/// Decode a 7-parameter pose block `[px py pz qx qy qz qw]`.
pub(crate) fn pose_from_params(params: &[f64]) -> (Vector3<f64>, UnitQuaternion<f64>) {
    debug_assert!(params.len() >= 7);
    let position = Vector3::new(params[0], params[1], params[2]);
    let orientation = UnitQuaternion::from_quaternion(Quaternion::new(
        params[6], params[3], params[4], params[5],
    ));
    (position, orientation)
}

/// Decode a 9-parameter speed/bias block `[v ba bg]`.
pub(crate) fn speed_bias_from_params(
    params: &[f64],
) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    debug_assert!(params.len() >= 9);
    (
        Vector3::new(params[0], params[1], params[2]),
        Vector3::new(params[3], params[4], params[5]),
        Vector3::new(params[6], params[7], params[8]),
    )
}

/// Encode a pose into a 7-parameter block.
pub fn pose_to_params(
    position: &Vector3<f64>,
    orientation: &UnitQuaternion<f64>,
) -> [f64; 7] {
    [
        position.x,
        position.y,
        position.z,
        orientation.i,
        orientation.j,
        orientation.k,
        orientation.w,
    ]
}
