//! Harris-Priester static atmosphere. Tabulated minimum and maximum
//! density profiles from 100 to 1000 km, blended by the diurnal bulge
//! that trails the subsolar point by 30 degrees of Earth rotation.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{AtmosphereErrors, AtmosphereModel};

/// Eastward lag of the diurnal bulge apex behind the Sun, radians.
const BULGE_LAG: f64 = 30.0 * std::f64::consts::PI / 180.0;

/// (altitude m, minimum density kg/m^3, maximum density kg/m^3).
const ALT_RHO: [[f64; 3]; 50] = [
    [100_000.0, 4.974e-07, 4.974e-07],
    [120_000.0, 2.490e-08, 2.490e-08],
    [130_000.0, 8.377e-09, 8.710e-09],
    [140_000.0, 3.899e-09, 4.059e-09],
    [150_000.0, 2.122e-09, 2.215e-09],
    [160_000.0, 1.263e-09, 1.344e-09],
    [170_000.0, 8.008e-10, 8.758e-10],
    [180_000.0, 5.283e-10, 6.010e-10],
    [190_000.0, 3.617e-10, 4.297e-10],
    [200_000.0, 2.557e-10, 3.162e-10],
    [210_000.0, 1.839e-10, 2.396e-10],
    [220_000.0, 1.341e-10, 1.853e-10],
    [230_000.0, 9.949e-11, 1.455e-10],
    [240_000.0, 7.488e-11, 1.157e-10],
    [250_000.0, 5.709e-11, 9.308e-11],
    [260_000.0, 4.403e-11, 7.555e-11],
    [270_000.0, 3.430e-11, 6.182e-11],
    [280_000.0, 2.697e-11, 5.095e-11],
    [290_000.0, 2.139e-11, 4.226e-11],
    [300_000.0, 1.708e-11, 3.526e-11],
    [320_000.0, 1.099e-11, 2.511e-11],
    [340_000.0, 7.214e-12, 1.819e-11],
    [360_000.0, 4.824e-12, 1.337e-11],
    [380_000.0, 3.274e-12, 9.955e-12],
    [400_000.0, 2.249e-12, 7.492e-12],
    [420_000.0, 1.558e-12, 5.684e-12],
    [440_000.0, 1.091e-12, 4.355e-12],
    [460_000.0, 7.701e-13, 3.362e-12],
    [480_000.0, 5.474e-13, 2.612e-12],
    [500_000.0, 3.916e-13, 2.042e-12],
    [520_000.0, 2.819e-13, 1.605e-12],
    [540_000.0, 2.042e-13, 1.267e-12],
    [560_000.0, 1.488e-13, 1.005e-12],
    [580_000.0, 1.092e-13, 7.997e-13],
    [600_000.0, 8.070e-14, 6.390e-13],
    [620_000.0, 6.012e-14, 5.123e-13],
    [640_000.0, 4.519e-14, 4.121e-13],
    [660_000.0, 3.430e-14, 3.325e-13],
    [680_000.0, 2.632e-14, 2.691e-13],
    [700_000.0, 2.043e-14, 2.185e-13],
    [720_000.0, 1.607e-14, 1.779e-13],
    [740_000.0, 1.281e-14, 1.452e-13],
    [760_000.0, 1.036e-14, 1.190e-13],
    [780_000.0, 8.496e-15, 9.776e-14],
    [800_000.0, 7.069e-15, 8.059e-14],
    [840_000.0, 4.680e-15, 5.741e-14],
    [880_000.0, 3.200e-15, 4.210e-14],
    [920_000.0, 2.210e-15, 3.130e-14],
    [960_000.0, 1.560e-15, 2.360e-14],
    [1_000_000.0, 1.150e-15, 1.810e-14],
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HarrisPriester {
    /// Spherical Earth radius used to turn |r| into altitude, m.
    pub earth_radius: f64,
    /// Diurnal bulge sharpness, 2 (low inclination) to 6 (polar).
    pub cosine_exponent: f64,
}

impl HarrisPriester {
    pub fn new(earth_radius: f64) -> Self {
        Self {
            earth_radius,
            cosine_exponent: 5.0,
        }
    }

    pub fn with_cosine_exponent(mut self, cosine_exponent: f64) -> Self {
        self.cosine_exponent = cosine_exponent;
        self
    }

    /// Lowest altitude covered by the density table, m.
    pub fn min_altitude() -> f64 {
        ALT_RHO[0][0]
    }

    /// Highest altitude covered by the density table, m.
    pub fn max_altitude() -> f64 {
        ALT_RHO[ALT_RHO.len() - 1][0]
    }
}

impl AtmosphereModel for HarrisPriester {
    fn density(
        &self,
        position: &Vector3<f64>,
        sun_position: &Vector3<f64>,
    ) -> Result<f64, AtmosphereErrors> {
        let altitude = position.norm() - self.earth_radius;
        let (min, max) = (Self::min_altitude(), Self::max_altitude());
        if altitude < min || altitude > max {
            return Err(AtmosphereErrors::AltitudeOutOfRange { altitude, min, max });
        }

        // apex of the diurnal bulge: Sun direction rotated east by the lag
        let sun_dir = sun_position.normalize();
        let (sin_lag, cos_lag) = BULGE_LAG.sin_cos();
        let bulge_dir = Vector3::new(
            cos_lag * sun_dir.x - sin_lag * sun_dir.y,
            sin_lag * sun_dir.x + cos_lag * sun_dir.y,
            sun_dir.z,
        );

        let cos_psi = bulge_dir.dot(&position.normalize());
        // cos^2(psi/2), raised to n/2 for cos^n(psi/2)
        let c2psi2 = 0.5 + 0.5 * cos_psi;
        let cos_pow = c2psi2.powf(0.5 * self.cosine_exponent);

        let mut i = 0;
        while i < ALT_RHO.len() - 2 && altitude > ALT_RHO[i + 1][0] {
            i += 1;
        }
        let frac = (altitude - ALT_RHO[i][0]) / (ALT_RHO[i + 1][0] - ALT_RHO[i][0]);

        // exponential in altitude between table rows
        let rho_min = ALT_RHO[i][1] * (ALT_RHO[i + 1][1] / ALT_RHO[i][1]).powf(frac);
        let rho_max = ALT_RHO[i][2] * (ALT_RHO[i + 1][2] / ALT_RHO[i][2]).powf(frac);

        Ok(rho_min + (rho_max - rho_min) * cos_pow)
    }
}
