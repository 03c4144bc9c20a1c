//! Visual reprojection factor over inverse depth.
//!
//! Ties two observations of one feature together through the poses of the
//! observing keyframes, the camera-to-body extrinsics, and the feature's
//! inverse depth in its first observing frame. Parameter blocks, in order:
//! pose i (7), pose j (7), extrinsics (7), inverse depth (1).
//!
//! The 2-dimensional residual lives in a locally orthogonal tangent basis of
//! the unit sphere around the observed bearing in frame j, not in raw pixel
//! space, so bearings near the image border weigh the same as central ones.

use nalgebra::{DMatrix, Matrix2, Matrix3, SMatrix, UnitQuaternion, Vector3};

use crate::geometry::skew;

use super::{pose_from_params, Factor};

const BLOCK_SIZES: [usize; 4] = [7, 7, 7, 1];

/// Residual block for one feature co-observed by keyframes i and j.
pub struct ProjectionFactor {
    /// Normalized bearing of the feature in camera i.
    pts_i: Vector3<f64>,
    /// Normalized bearing of the feature in camera j.
    pts_j: Vector3<f64>,
    /// Orthonormal basis of the tangent plane at the observed bearing j.
    tangent_base: SMatrix<f64, 2, 3>,
    /// Fixed information scale from assumed pixel noise and focal length.
    sqrt_info: Matrix2<f64>,
}

impl ProjectionFactor {
    /// Build a factor from the two normalized-bearing observations.
    ///
    /// `information_scale` is focal_length / pixel_sigma (see
    /// [`crate::config::EstimatorConfig::projection_information_scale`]).
    pub fn new(pts_i: Vector3<f64>, pts_j: Vector3<f64>, information_scale: f64) -> Self {
        let a = pts_j.normalize();
        let mut tmp = Vector3::new(0.0, 0.0, 1.0);
        if (a - tmp).norm() < 1e-6 {
            tmp = Vector3::new(1.0, 0.0, 0.0);
        }
        let b1 = (tmp - a * a.dot(&tmp)).normalize();
        let b2 = a.cross(&b1);

        let mut tangent_base = SMatrix::<f64, 2, 3>::zeros();
        tangent_base.row_mut(0).copy_from(&b1.transpose());
        tangent_base.row_mut(1).copy_from(&b2.transpose());

        Self {
            pts_i,
            pts_j,
            tangent_base,
            sqrt_info: information_scale * Matrix2::identity(),
        }
    }

    /// Chain of transforms from the frame-i bearing to camera j.
    #[allow(clippy::too_many_arguments)]
    fn transform_chain(
        &self,
        inv_dep_i: f64,
        p_i: &Vector3<f64>,
        q_i: &UnitQuaternion<f64>,
        p_j: &Vector3<f64>,
        q_j: &UnitQuaternion<f64>,
        tic: &Vector3<f64>,
        qic: &UnitQuaternion<f64>,
    ) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
        let pts_camera_i = self.pts_i / inv_dep_i;
        let pts_imu_i = qic * pts_camera_i + tic;
        let pts_world = q_i * pts_imu_i + p_i;
        let pts_imu_j = q_j.inverse() * (pts_world - p_j);
        let pts_camera_j = qic.inverse() * (pts_imu_j - tic);
        (pts_imu_i, pts_imu_j, pts_camera_j)
    }
}

impl Factor for ProjectionFactor {
    fn num_residuals(&self) -> usize {
        2
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
        debug_assert!(residuals.len() >= 2);

        let (p_i, q_i) = pose_from_params(parameters[0]);
        let (p_j, q_j) = pose_from_params(parameters[1]);
        let (tic, qic) = pose_from_params(parameters[2]);
        let inv_dep_i = parameters[3][0];

        let (pts_imu_i, pts_imu_j, pts_camera_j) =
            self.transform_chain(inv_dep_i, &p_i, &q_i, &p_j, &q_j, &tic, &qic);

        let residual: nalgebra::Vector2<f64> = self.sqrt_info
            * (self.tangent_base * (pts_camera_j.normalize() - self.pts_j.normalize()));
        residuals[0] = residual.x;
        residuals[1] = residual.y;

        let Some(jacobians) = jacobians else {
            return true;
        };

        let ri = q_i.to_rotation_matrix().into_inner();
        let rj = q_j.to_rotation_matrix().into_inner();
        let ric = qic.to_rotation_matrix().into_inner();

        // Derivative of the sphere normalization, then projection onto the
        // tangent basis.
        let norm = pts_camera_j.norm();
        let norm3 = norm * norm * norm;
        let norm_jacobian = Matrix3::identity() / norm
            - pts_camera_j * pts_camera_j.transpose() / norm3;
        let reduce: SMatrix<f64, 2, 3> = self.sqrt_info * (self.tangent_base * norm_jacobian);

        if let Some(jac) = jacobians.first_mut().and_then(Option::as_mut) {
            let mut chain = SMatrix::<f64, 3, 6>::zeros();
            chain
                .fixed_view_mut::<3, 3>(0, 0)
                .copy_from(&(ric.transpose() * rj.transpose()));
            chain
                .fixed_view_mut::<3, 3>(0, 3)
                .copy_from(&(ric.transpose() * rj.transpose() * ri * -skew(&pts_imu_i)));
            let mut j = SMatrix::<f64, 2, 7>::zeros();
            j.fixed_view_mut::<2, 6>(0, 0).copy_from(&(reduce * chain));
            *jac = DMatrix::from_column_slice(2, 7, j.as_slice());
        }

        if let Some(jac) = jacobians.get_mut(1).and_then(Option::as_mut) {
            let mut chain = SMatrix::<f64, 3, 6>::zeros();
            chain
                .fixed_view_mut::<3, 3>(0, 0)
                .copy_from(&(-(ric.transpose() * rj.transpose())));
            chain
                .fixed_view_mut::<3, 3>(0, 3)
                .copy_from(&(ric.transpose() * skew(&pts_imu_j)));
            let mut j = SMatrix::<f64, 2, 7>::zeros();
            j.fixed_view_mut::<2, 6>(0, 0).copy_from(&(reduce * chain));
            *jac = DMatrix::from_column_slice(2, 7, j.as_slice());
        }

        if let Some(jac) = jacobians.get_mut(2).and_then(Option::as_mut) {
            let pts_camera_i = self.pts_i / inv_dep_i;
            let relative_r = ric.transpose() * rj.transpose() * ri * ric;
            let mut chain = SMatrix::<f64, 3, 6>::zeros();
            chain
                .fixed_view_mut::<3, 3>(0, 0)
                .copy_from(&(ric.transpose() * (rj.transpose() * ri - Matrix3::identity())));
            chain.fixed_view_mut::<3, 3>(0, 3).copy_from(
                &(-relative_r * skew(&pts_camera_i)
                    + skew(&(relative_r * pts_camera_i))
                    + skew(&(ric.transpose()
                        * (rj.transpose() * (ri * tic + p_i - p_j) - tic)))),
            );
            let mut j = SMatrix::<f64, 2, 7>::zeros();
            j.fixed_view_mut::<2, 6>(0, 0).copy_from(&(reduce * chain));
            *jac = DMatrix::from_column_slice(2, 7, j.as_slice());
        }

        if let Some(jac) = jacobians.get_mut(3).and_then(Option::as_mut) {
            let d = reduce
                * (ric.transpose() * rj.transpose() * ri * ric * self.pts_i)
                * (-1.0 / (inv_dep_i * inv_dep_i));
            *jac = DMatrix::from_column_slice(2, 1, d.as_slice());
        }

        true
    }
}
