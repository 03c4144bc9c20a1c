//! SO(3) helpers for IMU preintegration and manifold-aware Jacobians.
//!
//! Provides skew-symmetric matrix construction, the first-order small-angle
//! quaternion used by the midpoint integration scheme, and the left/right
//! quaternion product matrices needed to differentiate rotation residuals.

use nalgebra::{Matrix3, Matrix4, Quaternion, UnitQuaternion, Vector3};

/// Constructs the skew-symmetric matrix [v]× such that [v]× u = v × u.
///
/// ```text
/// [v]× = |  0   -v_z   v_y |
///        |  v_z   0   -v_x |
///        | -v_y  v_x    0  |
/// ```
#[inline]
pub fn skew(v: &Vector3<f64>) -> Matrix3<f64> {
    Matrix3::new(
        0.0, -v.z, v.y,
        v.z, 0.0, -v.x,
        -v.y, v.x, 0.0,
    )
}

/// First-order quaternion for a small rotation vector θ:
///
/// ```text
/// δq(θ) ≈ [1, θ/2]
/// ```
///
/// Not normalized; callers compose it with a unit quaternion and renormalize
/// the product. Valid only for small |θ|.
#[inline]
pub fn small_angle_quat(theta: &Vector3<f64>) -> Quaternion<f64> {
    Quaternion::from_parts(1.0, theta * 0.5)
}

/// Left quaternion-product matrix L(q) such that L(q) · p = q ⊗ p,
/// with coefficients ordered `[w, x, y, z]`.
///
/// ```text
/// L(q) = | w      -vᵀ        |
///        | v   w·I + [v]×    |
/// ```
///
/// The bottom-right 3×3 block is the piece rotation-residual Jacobians need.
pub fn quat_left(q: &UnitQuaternion<f64>) -> Matrix4<f64> {
    let w = q.w;
    let v = q.imag();
    let mut m = Matrix4::zeros();
    m[(0, 0)] = w;
    m.fixed_view_mut::<1, 3>(0, 1).copy_from(&(-v.transpose()));
    m.fixed_view_mut::<3, 1>(1, 0).copy_from(&v);
    m.fixed_view_mut::<3, 3>(1, 1)
        .copy_from(&(w * Matrix3::identity() + skew(&v)));
    m
}

/// Right quaternion-product matrix R(p) such that R(p) · q = q ⊗ p,
/// with coefficients ordered `[w, x, y, z]`.
///
/// ```text
/// R(p) = | w      -vᵀ        |
///        | v   w·I − [v]×    |
/// ```
pub fn quat_right(p: &UnitQuaternion<f64>) -> Matrix4<f64> {
    let w = p.w;
    let v = p.imag();
    let mut m = Matrix4::zeros();
    m[(0, 0)] = w;
    m.fixed_view_mut::<1, 3>(0, 1).copy_from(&(-v.transpose()));
    m.fixed_view_mut::<3, 1>(1, 0).copy_from(&v);
    m.fixed_view_mut::<3, 3>(1, 1)
        .copy_from(&(w * Matrix3::identity() - skew(&v)));
    m
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector4;

    fn as_wxyz(q: &Quaternion<f64>) -> Vector4<f64> {
        Vector4::new(q.w, q.i, q.j, q.k)
    }

    #[test]
    fn test_skew_cross_product() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        let u = Vector3::new(4.0, 5.0, 6.0);

        assert_relative_eq!(v.cross(&u), skew(&v) * u, epsilon = 1e-12);
    }

    #[test]
    fn test_skew_antisymmetric() {
        let v = Vector3::new(1.0, 2.0, 3.0);
        let skew_v = skew(&v);

        assert_relative_eq!(skew_v, -skew_v.transpose(), epsilon = 1e-12);
    }

    #[test]
    fn test_small_angle_matches_exp_map() {
        let theta = Vector3::new(1e-4, -2e-4, 3e-4);
        let exact = UnitQuaternion::from_scaled_axis(theta);
        let approx_q = UnitQuaternion::from_quaternion(small_angle_quat(&theta));

        assert_relative_eq!(exact.angle_to(&approx_q), 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_quat_left_reproduces_product() {
        let q = UnitQuaternion::from_euler_angles(0.3, -0.2, 0.5);
        let p = UnitQuaternion::from_euler_angles(-0.1, 0.4, 0.2);

        let product = q.into_inner() * p.into_inner();
        let via_matrix = quat_left(&q) * as_wxyz(&p.into_inner());

        assert_relative_eq!(as_wxyz(&product), via_matrix, epsilon = 1e-12);
    }

    #[test]
    fn test_quat_right_reproduces_product() {
        let q = UnitQuaternion::from_euler_angles(0.3, -0.2, 0.5);
        let p = UnitQuaternion::from_euler_angles(-0.1, 0.4, 0.2);

        let product = q.into_inner() * p.into_inner();
        let via_matrix = quat_right(&p) * as_wxyz(&q.into_inner());

        assert_relative_eq!(as_wxyz(&product), via_matrix, epsilon = 1e-12);
    }
}
