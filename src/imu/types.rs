//! Type aliases for preintegration error-state matrices.
//!
//! The 15-dimensional error state is ordered [δp, δθ, δv, δba, δbg]; the
//! 18-dimensional noise input stacks both endpoint accel/gyro white-noise
//! samples of the midpoint scheme plus the two bias random walks.

use nalgebra::{SMatrix, SVector};

/// 15×15 matrix over the error state [δp, δθ, δv, δba, δbg].
pub type Matrix15 = SMatrix<f64, 15, 15>;

/// 15-dimensional residual/error-state vector.
pub type Vector15 = SVector<f64, 15>;

/// 15×18 noise-input matrix (error state w.r.t. the stacked noise sources).
pub type Matrix15x18 = SMatrix<f64, 15, 18>;

/// 18×18 continuous-time noise spectral-density matrix.
pub type Matrix18 = SMatrix<f64, 18, 18>;

/// Offset of the position block within the error state.
pub const POS: usize = 0;
/// Offset of the rotation-tangent block within the error state.
pub const ROT: usize = 3;
/// Offset of the velocity block within the error state.
pub const VEL: usize = 6;
/// Offset of the accel-bias block within the error state.
pub const BIAS_A: usize = 9;
/// Offset of the gyro-bias block within the error state.
pub const BIAS_G: usize = 12;
