use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod newtonian;
pub mod zonal;

pub use newtonian::NewtonianGravity;
pub use zonal::{EARTH_J2, ZonalGravity};

#[derive(Debug, Clone, Error, PartialEq)]
pub enum GravityErrors {
    #[error("gravitational acceleration is singular at zero position")]
    PositionIsZero,
}

/// Gravity field of a central body. Input and output are in the body's
/// centered inertial frame; the zonal model assumes the body's spin axis
/// is the frame z axis.
pub trait GravityModel {
    fn calculate(&self, position: &Vector3<f64>) -> Result<Vector3<f64>, GravityErrors>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Gravity {
    Newtonian(NewtonianGravity),
    Zonal(ZonalGravity),
}

impl GravityModel for Gravity {
    fn calculate(&self, position: &Vector3<f64>) -> Result<Vector3<f64>, GravityErrors> {
        match self {
            Gravity::Newtonian(g) => g.calculate(position),
            Gravity::Zonal(g) => g.calculate(position),
        }
    }
}
