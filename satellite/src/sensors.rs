//! Measurement models layered on top of the propagated state. Sensors
//! sample environment fields or the state itself with additive gaussian
//! white noise; they never feed back into the dynamics.

use celestial::eci_to_ecef;
use magnetics::{MagneticField, MagneticModel};
use nalgebra::Vector3;
use rand::{Rng, SeedableRng, rngs::SmallRng};
use rand_distr::StandardNormal;

use crate::{SatelliteErrors, SatelliteState};

/// Three-axis magnetometer. Evaluates the field model at the satellite
/// position, rotates the reading into the body frame and corrupts each
/// axis with zero-mean gaussian noise.
#[derive(Debug, Clone)]
pub struct Magnetometer {
    field: MagneticField,
    /// Per-axis noise standard deviation, nT.
    noise_sigma: f64,
    rng: SmallRng,
}

impl Magnetometer {
    pub fn new(field: MagneticField) -> Self {
        Self {
            field,
            noise_sigma: 1e2,
            rng: SmallRng::seed_from_u64(0),
        }
    }

    pub fn with_noise_sigma(mut self, noise_sigma: f64) -> Self {
        self.noise_sigma = noise_sigma;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Body-frame field measurement, nT.
    pub fn sample(&mut self, state: &SatelliteState) -> Result<Vector3<f64>, SatelliteErrors> {
        let ecef = eci_to_ecef(state.epoch);
        let b_ecef = self.field.calculate(&(ecef * state.position))?;
        let b_eci = ecef.inverse_transform_vector(&b_ecef);
        let b_body = state.attitude.inverse_transform_vector(&b_eci);
        Ok(b_body + draw_noise(&mut self.rng, self.noise_sigma))
    }
}

/// Three-axis rate gyro measuring the body-frame spin with additive
/// gaussian noise and an optional constant bias.
#[derive(Debug, Clone)]
pub struct Gyroscope {
    /// Per-axis noise standard deviation, rad/s.
    noise_sigma: f64,
    /// Constant rate bias, rad/s, body frame.
    bias: Vector3<f64>,
    rng: SmallRng,
}

impl Gyroscope {
    pub fn new() -> Self {
        Self {
            noise_sigma: 1e-3,
            bias: Vector3::zeros(),
            rng: SmallRng::seed_from_u64(0),
        }
    }

    pub fn with_noise_sigma(mut self, noise_sigma: f64) -> Self {
        self.noise_sigma = noise_sigma;
        self
    }

    pub fn with_bias(mut self, bias: Vector3<f64>) -> Self {
        self.bias = bias;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /// Body-frame rate measurement, rad/s.
    pub fn sample(&mut self, state: &SatelliteState) -> Vector3<f64> {
        state.spin + self.bias + draw_noise(&mut self.rng, self.noise_sigma)
    }
}

impl Default for Gyroscope {
    fn default() -> Self {
        Self::new()
    }
}

fn draw_noise(rng: &mut SmallRng, sigma: f64) -> Vector3<f64> {
    Vector3::new(
        sigma * rng.sample::<f64, _>(StandardNormal),
        sigma * rng.sample::<f64, _>(StandardNormal),
        sigma * rng.sample::<f64, _>(StandardNormal),
    )
}
