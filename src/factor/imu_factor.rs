//! Inertial factor: the 15-dimensional preintegration residual.
//!
//! Constrains two neighboring keyframes through the preintegrated IMU motion
//! between them. Parameter blocks, in order: pose i (7), speed/bias i (9),
//! pose j (7), speed/bias j (9). The residual and every Jacobian block are
//! whitened by the square-root information of the preintegrated covariance,
//! so a generic least-squares solver can treat them as unit-weight.

use std::sync::Arc;

use nalgebra::{linalg::Cholesky, DMatrix, Matrix3, SMatrix, Vector3};
use parking_lot::RwLock;
use tracing::warn;

use crate::geometry::{quat_left, quat_right, skew};
use crate::imu::types::{Matrix15, BIAS_A, BIAS_G, POS, ROT, VEL};
use crate::imu::Preintegration;

use super::{pose_from_params, speed_bias_from_params, Factor};

const BLOCK_SIZES: [usize; 4] = [7, 9, 7, 9];

/// Residual block tying keyframes i and j to the IMU motion between them.
///
/// The preintegration is shared with the estimator, which may `repropagate`
/// it between solver passes; evaluation takes the read side of the lock, so
/// concurrent evaluations are safe as long as mutation is serialized against
/// them.
pub struct ImuFactor {
    preintegration: Arc<RwLock<Preintegration>>,
    gravity: Vector3<f64>,
}

impl ImuFactor {
    pub fn new(preintegration: Arc<RwLock<Preintegration>>, gravity: Vector3<f64>) -> Self {
        Self {
            preintegration,
            gravity,
        }
    }
}

impl Factor for ImuFactor {
    fn num_residuals(&self) -> usize {
        15
    }

    fn parameter_block_sizes(&self) -> &[usize] {
        &BLOCK_SIZES
    }

    fn evaluate(
        &self,
        parameters: &[&[f64]],
        residuals: &mut [f64],
        jacobians: Option<&mut [Option<DMatrix<f64>>]>,
    ) -> bool {
        debug_assert_eq!(parameters.len(), 4);
        debug_assert!(residuals.len() >= 15);

        let pre = self.preintegration.read();

        let (p_i, q_i) = pose_from_params(parameters[0]);
        let (v_i, ba_i, bg_i) = speed_bias_from_params(parameters[1]);
        let (p_j, q_j) = pose_from_params(parameters[2]);
        let (v_j, ba_j, bg_j) = speed_bias_from_params(parameters[3]);

        // Whitening: sqrt_info = Lᵀ where L·Lᵀ = covariance⁻¹. A covariance
        // that cannot be inverted means the engine was never fed a sample,
        // which is a caller-contract violation.
        let Some(information) = pre.covariance.try_inverse() else {
            debug_assert!(false, "preintegration covariance is singular");
            return false;
        };
        let Some(chol) = Cholesky::new(information) else {
            debug_assert!(false, "preintegration information is not positive definite");
            return false;
        };
        let sqrt_info: Matrix15 = chol.l().transpose();

        let raw = pre.evaluate(
            &self.gravity,
            &p_i,
            &q_i,
            &v_i,
            &ba_i,
            &bg_i,
            &p_j,
            &q_j,
            &v_j,
            &ba_j,
            &bg_j,
        );
        let whitened = sqrt_info * raw;
        residuals[..15].copy_from_slice(whitened.as_slice());

        let Some(jacobians) = jacobians else {
            return true;
        };

        let dt = pre.total_dt;
        let g = &self.gravity;
        let ri_inv = q_i.inverse().to_rotation_matrix().into_inner();
        let dp_dba = pre.jacobian.fixed_view::<3, 3>(POS, BIAS_A).into_owned();
        let dp_dbg = pre.jacobian.fixed_view::<3, 3>(POS, BIAS_G).into_owned();
        let dq_dbg = pre.jacobian.fixed_view::<3, 3>(ROT, BIAS_G).into_owned();
        let dv_dba = pre.jacobian.fixed_view::<3, 3>(VEL, BIAS_A).into_owned();
        let dv_dbg = pre.jacobian.fixed_view::<3, 3>(VEL, BIAS_G).into_owned();
        let corrected_q = pre.corrected_delta_q(&bg_i);

        if pre.jacobian.amax() > pre.sensitivity_warn_threshold {
            warn!(
                "numerically unstable preintegration sensitivity (max |entry| = {:.3e})",
                pre.jacobian.amax()
            );
        }

        if let Some(jac) = jacobians.first_mut().and_then(Option::as_mut) {
            let mut j = SMatrix::<f64, 15, 7>::zeros();
            j.fixed_view_mut::<3, 3>(POS, 0).copy_from(&(-ri_inv));
            j.fixed_view_mut::<3, 3>(POS, 3).copy_from(&skew(
                &(q_i.inverse() * (0.5 * g * dt * dt + p_j - p_i - v_i * dt)),
            ));
            j.fixed_view_mut::<3, 3>(ROT, 3).copy_from(
                &(-(quat_left(&(q_j.inverse() * q_i)) * quat_right(&corrected_q))
                    .fixed_view::<3, 3>(1, 1)
                    .into_owned()),
            );
            j.fixed_view_mut::<3, 3>(VEL, 3)
                .copy_from(&skew(&(q_i.inverse() * (g * dt + v_j - v_i))));
            let whitened_j = sqrt_info * j;
            if whitened_j.amax() > pre.sensitivity_warn_threshold {
                warn!(
                    "numerically unstable inertial Jacobian (max |entry| = {:.3e})",
                    whitened_j.amax()
                );
            }
            *jac = DMatrix::from_column_slice(15, 7, whitened_j.as_slice());
        }

        if let Some(jac) = jacobians.get_mut(1).and_then(Option::as_mut) {
            let mut j = SMatrix::<f64, 15, 9>::zeros();
            j.fixed_view_mut::<3, 3>(POS, 0).copy_from(&(-ri_inv * dt));
            j.fixed_view_mut::<3, 3>(POS, 3).copy_from(&(-dp_dba));
            j.fixed_view_mut::<3, 3>(POS, 6).copy_from(&(-dp_dbg));
            j.fixed_view_mut::<3, 3>(ROT, 6).copy_from(
                &(-quat_left(&(q_j.inverse() * q_i * pre.delta_q))
                    .fixed_view::<3, 3>(1, 1)
                    .into_owned()
                    * dq_dbg),
            );
            j.fixed_view_mut::<3, 3>(VEL, 0).copy_from(&(-ri_inv));
            j.fixed_view_mut::<3, 3>(VEL, 3).copy_from(&(-dv_dba));
            j.fixed_view_mut::<3, 3>(VEL, 6).copy_from(&(-dv_dbg));
            j.fixed_view_mut::<3, 3>(BIAS_A, 3)
                .copy_from(&(-Matrix3::identity()));
            j.fixed_view_mut::<3, 3>(BIAS_G, 6)
                .copy_from(&(-Matrix3::identity()));
            let whitened_j = sqrt_info * j;
            *jac = DMatrix::from_column_slice(15, 9, whitened_j.as_slice());
        }

        if let Some(jac) = jacobians.get_mut(2).and_then(Option::as_mut) {
            let mut j = SMatrix::<f64, 15, 7>::zeros();
            j.fixed_view_mut::<3, 3>(POS, 0).copy_from(&ri_inv);
            j.fixed_view_mut::<3, 3>(ROT, 3).copy_from(
                &quat_left(&(corrected_q.inverse() * q_i.inverse() * q_j))
                    .fixed_view::<3, 3>(1, 1)
                    .into_owned(),
            );
            let whitened_j = sqrt_info * j;
            *jac = DMatrix::from_column_slice(15, 7, whitened_j.as_slice());
        }

        if let Some(jac) = jacobians.get_mut(3).and_then(Option::as_mut) {
            let mut j = SMatrix::<f64, 15, 9>::zeros();
            j.fixed_view_mut::<3, 3>(VEL, 0).copy_from(&ri_inv);
            j.fixed_view_mut::<3, 3>(BIAS_A, 3)
                .copy_from(&Matrix3::identity());
            j.fixed_view_mut::<3, 3>(BIAS_G, 6)
                .copy_from(&Matrix3::identity());
            let whitened_j = sqrt_info * j;
            *jac = DMatrix::from_column_slice(15, 9, whitened_j.as_slice());
        }

        true
    }
}
