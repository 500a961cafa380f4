use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{GravityErrors, GravityModel};

/// Point-mass gravity, -mu * r / |r|^3.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewtonianGravity {
    pub mu: f64,
}

impl NewtonianGravity {
    pub fn new(mu: f64) -> Self {
        Self { mu }
    }
}

impl GravityModel for NewtonianGravity {
    fn calculate(&self, position: &Vector3<f64>) -> Result<Vector3<f64>, GravityErrors> {
        let r = position.norm();
        if r <= f64::EPSILON {
            return Err(GravityErrors::PositionIsZero);
        }
        Ok(-position * self.mu / r.powi(3))
    }
}
