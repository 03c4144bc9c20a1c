//! IMU preintegration with closed-form covariance propagation.
//!
//! A `Preintegration` summarizes the raw IMU samples between two keyframe
//! instants into a relative-motion estimate (Δp, Δq, Δv) expressed in the
//! body frame of the first keyframe, together with:
//!
//! - a 15×15 error-state sensitivity Jacobian whose bias columns support
//!   first-order bias correction (so the optimizer never re-integrates raw
//!   samples between iterations), and
//! - a 15×15 covariance propagated through the midpoint integration scheme.
//!
//! Every raw sample is retained, so a changed linearization bias can be
//! applied exactly by replaying the buffer (`repropagate`). The buffer is
//! naturally bounded by the inter-keyframe interval.

use nalgebra::{Matrix3, UnitQuaternion, Vector3};
use tracing::warn;

use crate::geometry::{skew, small_angle_quat};

use super::sample::{ImuBias, ImuNoise, ImuSample};
use super::types::{Matrix15, Matrix15x18, Matrix18, Vector15, BIAS_A, BIAS_G, POS, ROT, VEL};

/// Result of one midpoint integration step: the advanced mean state plus the
/// discrete error-state transition and noise-input matrices linearized about
/// the step.
struct MidpointStep {
    delta_p: Vector3<f64>,
    delta_q: UnitQuaternion<f64>,
    delta_v: Vector3<f64>,
    transition: Matrix15,
    noise_input: Matrix15x18,
}

/// One midpoint integration step.
///
/// De-biases both endpoint samples against the linearization bias, advances
/// the orientation by the midpoint angular rate, and integrates position and
/// velocity with the orientation-averaged acceleration. The returned
/// `transition`/`noise_input` matrices are the discrete-time linearization of
/// this exact update about the error state [δp, δθ, δv, δba, δbg] and the
/// stacked noise inputs [na₀, ng₀, na₁, ng₁, nba, nbg].
#[allow(clippy::too_many_arguments)]
fn midpoint_step(
    dt: f64,
    acc_0: &Vector3<f64>,
    gyr_0: &Vector3<f64>,
    acc_1: &Vector3<f64>,
    gyr_1: &Vector3<f64>,
    delta_p: &Vector3<f64>,
    delta_q: &UnitQuaternion<f64>,
    delta_v: &Vector3<f64>,
    ba: &Vector3<f64>,
    bg: &Vector3<f64>,
) -> MidpointStep {
    let un_acc_0 = delta_q * (acc_0 - ba);
    let un_gyr = 0.5 * (gyr_0 + gyr_1) - bg;
    let result_q =
        UnitQuaternion::from_quaternion(delta_q.into_inner() * small_angle_quat(&(un_gyr * dt)));
    let un_acc_1 = result_q * (acc_1 - ba);
    let un_acc = 0.5 * (un_acc_0 + un_acc_1);
    let result_p = delta_p + delta_v * dt + 0.5 * un_acc * dt * dt;
    let result_v = delta_v + un_acc * dt;

    let i3 = Matrix3::identity();
    let r0 = delta_q.to_rotation_matrix().into_inner();
    let r1 = result_q.to_rotation_matrix().into_inner();
    let w_x = skew(&un_gyr);
    let a0_x = skew(&(acc_0 - ba));
    let a1_x = skew(&(acc_1 - ba));

    // Error-state transition. Position/velocity couple to the orientation
    // error through the skew of the de-biased accelerations at both
    // endpoints; bias blocks keep an identity diagonal (random walk).
    let mut f = Matrix15::zeros();
    f.fixed_view_mut::<3, 3>(POS, POS).copy_from(&i3);
    f.fixed_view_mut::<3, 3>(POS, ROT).copy_from(
        &(-0.25 * r0 * a0_x * dt * dt - 0.25 * r1 * a1_x * (i3 - w_x * dt) * dt * dt),
    );
    f.fixed_view_mut::<3, 3>(POS, VEL).copy_from(&(i3 * dt));
    f.fixed_view_mut::<3, 3>(POS, BIAS_A)
        .copy_from(&(-0.25 * (r0 + r1) * dt * dt));
    f.fixed_view_mut::<3, 3>(POS, BIAS_G)
        .copy_from(&(0.25 * r1 * a1_x * dt * dt * dt));
    f.fixed_view_mut::<3, 3>(ROT, ROT).copy_from(&(i3 - w_x * dt));
    f.fixed_view_mut::<3, 3>(ROT, BIAS_G).copy_from(&(-i3 * dt));
    f.fixed_view_mut::<3, 3>(VEL, ROT)
        .copy_from(&(-0.5 * r0 * a0_x * dt - 0.5 * r1 * a1_x * (i3 - w_x * dt) * dt));
    f.fixed_view_mut::<3, 3>(VEL, VEL).copy_from(&i3);
    f.fixed_view_mut::<3, 3>(VEL, BIAS_A)
        .copy_from(&(-0.5 * (r0 + r1) * dt));
    f.fixed_view_mut::<3, 3>(VEL, BIAS_G)
        .copy_from(&(0.5 * r1 * a1_x * dt * dt));
    f.fixed_view_mut::<3, 3>(BIAS_A, BIAS_A).copy_from(&i3);
    f.fixed_view_mut::<3, 3>(BIAS_G, BIAS_G).copy_from(&i3);

    // Noise input: the midpoint scheme samples the white noise of both
    // endpoints, so accel/gyro noise appears twice.
    let v_pos_gyr = -0.125 * r1 * a1_x * dt * dt * dt;
    let v_vel_gyr = -0.25 * r1 * a1_x * dt * dt;
    let mut v = Matrix15x18::zeros();
    v.fixed_view_mut::<3, 3>(POS, 0).copy_from(&(0.25 * r0 * dt * dt));
    v.fixed_view_mut::<3, 3>(POS, 3).copy_from(&v_pos_gyr);
    v.fixed_view_mut::<3, 3>(POS, 6).copy_from(&(0.25 * r1 * dt * dt));
    v.fixed_view_mut::<3, 3>(POS, 9).copy_from(&v_pos_gyr);
    v.fixed_view_mut::<3, 3>(ROT, 3).copy_from(&(0.5 * i3 * dt));
    v.fixed_view_mut::<3, 3>(ROT, 9).copy_from(&(0.5 * i3 * dt));
    v.fixed_view_mut::<3, 3>(VEL, 0).copy_from(&(0.5 * r0 * dt));
    v.fixed_view_mut::<3, 3>(VEL, 3).copy_from(&v_vel_gyr);
    v.fixed_view_mut::<3, 3>(VEL, 6).copy_from(&(0.5 * r1 * dt));
    v.fixed_view_mut::<3, 3>(VEL, 9).copy_from(&v_vel_gyr);
    v.fixed_view_mut::<3, 3>(BIAS_A, 12).copy_from(&(i3 * dt));
    v.fixed_view_mut::<3, 3>(BIAS_G, 15).copy_from(&(i3 * dt));

    MidpointStep {
        delta_p: result_p,
        delta_q: result_q,
        delta_v: result_v,
        transition: f,
        noise_input: v,
    }
}

/// Preintegrated IMU motion between two keyframe instants.
pub struct Preintegration {
    /// Linearization-point bias; changes only through [`Self::repropagate`].
    pub bias: ImuBias,
    /// Relative position, expressed in the frame of the first keyframe.
    pub delta_p: Vector3<f64>,
    /// Relative rotation; unit-norm after every update.
    pub delta_q: UnitQuaternion<f64>,
    /// Relative velocity, expressed in the frame of the first keyframe.
    pub delta_v: Vector3<f64>,
    /// 15×15 error-state sensitivity; its bias columns drive the first-order
    /// bias correction in [`Self::evaluate`].
    pub jacobian: Matrix15,
    /// 15×15 error-state covariance.
    pub covariance: Matrix15,
    /// Transition matrix of the most recent integration step.
    pub step_f: Matrix15,
    /// Noise-input matrix of the most recent integration step.
    pub step_v: Matrix15x18,
    /// Accumulated integration time.
    pub total_dt: f64,
    /// Magnitude above which a sensitivity entry is reported as unstable.
    pub sensitivity_warn_threshold: f64,

    noise: Matrix18,
    first_accel: Vector3<f64>,
    first_gyro: Vector3<f64>,
    prev_accel: Vector3<f64>,
    prev_gyro: Vector3<f64>,
    samples: Vec<ImuSample>,
}

impl Preintegration {
    /// Create a preintegration anchored at the keyframe whose last IMU
    /// readings are `accel`/`gyro`, linearized about the given bias.
    pub fn new(
        accel: Vector3<f64>,
        gyro: Vector3<f64>,
        bias: ImuBias,
        noise_params: ImuNoise,
    ) -> Self {
        let mut noise = Matrix18::zeros();
        let acc_n = noise_params.acc_n * noise_params.acc_n;
        let gyr_n = noise_params.gyr_n * noise_params.gyr_n;
        noise
            .fixed_view_mut::<3, 3>(0, 0)
            .copy_from(&(acc_n * Matrix3::identity()));
        noise
            .fixed_view_mut::<3, 3>(3, 3)
            .copy_from(&(gyr_n * Matrix3::identity()));
        noise
            .fixed_view_mut::<3, 3>(6, 6)
            .copy_from(&(acc_n * Matrix3::identity()));
        noise
            .fixed_view_mut::<3, 3>(9, 9)
            .copy_from(&(gyr_n * Matrix3::identity()));
        noise.fixed_view_mut::<3, 3>(12, 12).copy_from(
            &(noise_params.acc_w * noise_params.acc_w * Matrix3::identity()),
        );
        noise.fixed_view_mut::<3, 3>(15, 15).copy_from(
            &(noise_params.gyr_w * noise_params.gyr_w * Matrix3::identity()),
        );

        Self {
            bias,
            delta_p: Vector3::zeros(),
            delta_q: UnitQuaternion::identity(),
            delta_v: Vector3::zeros(),
            jacobian: Matrix15::identity(),
            covariance: Matrix15::zeros(),
            step_f: Matrix15::identity(),
            step_v: Matrix15x18::zeros(),
            total_dt: 0.0,
            sensitivity_warn_threshold: 1e8,
            noise,
            first_accel: accel,
            first_gyro: gyro,
            prev_accel: accel,
            prev_gyro: gyro,
            samples: Vec::new(),
        }
    }

    /// Override the sensitivity warning threshold (a configuration policy).
    pub fn with_warn_threshold(mut self, threshold: f64) -> Self {
        self.sensitivity_warn_threshold = threshold;
        self
    }

    /// Record one IMU sample and advance the preintegrated state by one
    /// midpoint step. The sample is retained for replay.
    pub fn push(&mut self, sample: ImuSample) {
        debug_assert!(sample.dt > 0.0, "IMU sample must advance time");
        self.samples.push(sample);
        self.propagate(sample.dt, sample.accel, sample.gyro);
    }

    /// Number of samples integrated so far.
    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// Replace the linearization bias and replay every retained sample.
    ///
    /// Needed when the optimizer moves the bias far enough that the
    /// first-order correction in [`Self::evaluate`] stops being valid; the
    /// deviation threshold is the caller's policy (see
    /// [`Self::bias_deviates`]).
    pub fn repropagate(&mut self, accel_bias: Vector3<f64>, gyro_bias: Vector3<f64>) {
        self.total_dt = 0.0;
        self.prev_accel = self.first_accel;
        self.prev_gyro = self.first_gyro;
        self.delta_p = Vector3::zeros();
        self.delta_q = UnitQuaternion::identity();
        self.delta_v = Vector3::zeros();
        self.bias = ImuBias {
            accel: accel_bias,
            gyro: gyro_bias,
        };
        self.jacobian = Matrix15::identity();
        self.covariance = Matrix15::zeros();
        self.step_f = Matrix15::identity();
        self.step_v = Matrix15x18::zeros();

        let samples = std::mem::take(&mut self.samples);
        for sample in &samples {
            self.propagate(sample.dt, sample.accel, sample.gyro);
        }
        self.samples = samples;
    }

    /// Whether `(accel_bias, gyro_bias)` has drifted from the linearization
    /// point beyond the given thresholds. Exposed as a predicate only; the
    /// caller decides when to [`Self::repropagate`].
    pub fn bias_deviates(
        &self,
        accel_bias: &Vector3<f64>,
        gyro_bias: &Vector3<f64>,
        acc_threshold: f64,
        gyr_threshold: f64,
    ) -> bool {
        (accel_bias - self.bias.accel).norm() > acc_threshold
            || (gyro_bias - self.bias.gyro).norm() > gyr_threshold
    }

    /// Relative rotation corrected to first order for a gyro bias that has
    /// moved away from the linearization point.
    pub fn corrected_delta_q(&self, gyro_bias: &Vector3<f64>) -> UnitQuaternion<f64> {
        let dq_dbg = self.jacobian.fixed_view::<3, 3>(ROT, BIAS_G).into_owned();
        let dbg = gyro_bias - self.bias.gyro;
        UnitQuaternion::from_quaternion(
            self.delta_q.into_inner() * small_angle_quat(&(dq_dbg * dbg)),
        )
    }

    /// Raw 15-dimensional inertial residual between two keyframe states.
    ///
    /// Applies the first-order bias correction to the preintegrated mean and
    /// compares it against the relative motion implied by the two states.
    /// Ordering follows the error state: [position, rotation, velocity,
    /// accel bias, gyro bias].
    #[allow(clippy::too_many_arguments)]
    pub fn evaluate(
        &self,
        gravity: &Vector3<f64>,
        p_i: &Vector3<f64>,
        q_i: &UnitQuaternion<f64>,
        v_i: &Vector3<f64>,
        ba_i: &Vector3<f64>,
        bg_i: &Vector3<f64>,
        p_j: &Vector3<f64>,
        q_j: &UnitQuaternion<f64>,
        v_j: &Vector3<f64>,
        ba_j: &Vector3<f64>,
        bg_j: &Vector3<f64>,
    ) -> Vector15 {
        debug_assert!(
            !self.samples.is_empty(),
            "evaluating a preintegration that was never fed a sample"
        );

        let dp_dba = self.jacobian.fixed_view::<3, 3>(POS, BIAS_A).into_owned();
        let dp_dbg = self.jacobian.fixed_view::<3, 3>(POS, BIAS_G).into_owned();
        let dv_dba = self.jacobian.fixed_view::<3, 3>(VEL, BIAS_A).into_owned();
        let dv_dbg = self.jacobian.fixed_view::<3, 3>(VEL, BIAS_G).into_owned();

        let dba = ba_i - self.bias.accel;
        let dbg = bg_i - self.bias.gyro;

        let corrected_q = self.corrected_delta_q(bg_i);
        let corrected_v = self.delta_v + dv_dba * dba + dv_dbg * dbg;
        let corrected_p = self.delta_p + dp_dba * dba + dp_dbg * dbg;

        let dt = self.total_dt;
        let mut residual = Vector15::zeros();
        residual.fixed_view_mut::<3, 1>(POS, 0).copy_from(
            &(q_i.inverse() * (0.5 * gravity * dt * dt + p_j - p_i - v_i * dt) - corrected_p),
        );
        residual.fixed_view_mut::<3, 1>(ROT, 0).copy_from(
            &(2.0 * (corrected_q.inverse() * (q_i.inverse() * q_j)).imag()),
        );
        residual.fixed_view_mut::<3, 1>(VEL, 0).copy_from(
            &(q_i.inverse() * (gravity * dt + v_j - v_i) - corrected_v),
        );
        residual
            .fixed_view_mut::<3, 1>(BIAS_A, 0)
            .copy_from(&(ba_j - ba_i));
        residual
            .fixed_view_mut::<3, 1>(BIAS_G, 0)
            .copy_from(&(bg_j - bg_i));
        residual
    }

    fn propagate(&mut self, dt: f64, accel: Vector3<f64>, gyro: Vector3<f64>) {
        let step = midpoint_step(
            dt,
            &self.prev_accel,
            &self.prev_gyro,
            &accel,
            &gyro,
            &self.delta_p,
            &self.delta_q,
            &self.delta_v,
            &self.bias.accel,
            &self.bias.gyro,
        );

        self.delta_p = step.delta_p;
        self.delta_q = step.delta_q;
        self.delta_v = step.delta_v;
        self.jacobian = step.transition * self.jacobian;
        self.covariance = step.transition * self.covariance * step.transition.transpose()
            + step.noise_input * self.noise * step.noise_input.transpose();
        self.step_f = step.transition;
        self.step_v = step.noise_input;
        self.total_dt += dt;
        self.prev_accel = accel;
        self.prev_gyro = gyro;

        let max_entry = self.jacobian.amax();
        if max_entry > self.sensitivity_warn_threshold {
            warn!(
                "numerically unstable preintegration sensitivity (max |entry| = {:.3e})",
                max_entry
            );
        }
    }
}
