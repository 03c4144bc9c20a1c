use nalgebra::Vector3;

/// IMU noise parameters (continuous-time spectral densities).
#[derive(Debug, Clone, Copy)]
pub struct ImuNoise {
    /// Accelerometer noise density (m/s²/√Hz).
    pub acc_n: f64,
    /// Gyroscope noise density (rad/s/√Hz).
    pub gyr_n: f64,
    /// Accelerometer bias random walk (m/s³/√Hz).
    pub acc_w: f64,
    /// Gyroscope bias random walk (rad/s²/√Hz).
    pub gyr_w: f64,
}

impl Default for ImuNoise {
    fn default() -> Self {
        // Approximate EuRoC noise values
        Self {
            acc_n: 2.0e-3,
            gyr_n: 1.7e-4,
            acc_w: 3.0e-3,
            gyr_w: 1.9e-5,
        }
    }
}

/// IMU biases.
#[derive(Debug, Clone, Copy)]
pub struct ImuBias {
    pub accel: Vector3<f64>,
    pub gyro: Vector3<f64>,
}

impl ImuBias {
    pub fn zero() -> Self {
        Self {
            accel: Vector3::zeros(),
            gyro: Vector3::zeros(),
        }
    }
}

/// Single IMU measurement: the time step since the previous sample and the
/// raw readings at its end. Immutable once recorded.
#[derive(Debug, Clone, Copy)]
pub struct ImuSample {
    pub dt: f64,
    pub accel: Vector3<f64>,
    pub gyro: Vector3<f64>,
}
