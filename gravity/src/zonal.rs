use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{GravityErrors, GravityModel};

/// Earth's dominant zonal harmonic (EGM96, unnormalized).
pub const EARTH_J2: f64 = 1.08262668e-3;

/// Point-mass gravity plus the J2 oblateness correction, evaluated in
/// the inertial frame with z along the body's spin axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZonalGravity {
    pub mu: f64,
    pub radius: f64,
    pub j2: f64,
}

impl ZonalGravity {
    pub fn new(mu: f64, radius: f64, j2: f64) -> Self {
        Self { mu, radius, j2 }
    }
}

impl GravityModel for ZonalGravity {
    fn calculate(&self, position: &Vector3<f64>) -> Result<Vector3<f64>, GravityErrors> {
        let r = position.norm();
        if r <= f64::EPSILON {
            return Err(GravityErrors::PositionIsZero);
        }

        let central = -position * self.mu / r.powi(3);

        let z2_r2 = (position.z / r).powi(2);
        let scale = -1.5 * self.j2 * self.mu * self.radius.powi(2) / r.powi(5);
        let j2 = Vector3::new(
            scale * position.x * (1.0 - 5.0 * z2_r2),
            scale * position.y * (1.0 - 5.0 * z2_r2),
            scale * position.z * (3.0 - 5.0 * z2_r2),
        );

        Ok(central + j2)
    }
}
