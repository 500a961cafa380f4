use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod dipole;

pub use dipole::Dipole;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum MagneticErrors {
    #[error("magnetic field is singular at the dipole center")]
    PositionIsZero,
}

/// Geomagnetic field at an Earth-fixed (ECEF) position, nanotesla.
pub trait MagneticModel {
    fn calculate(&self, position_ecef: &Vector3<f64>) -> Result<Vector3<f64>, MagneticErrors>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MagneticField {
    Dipole(Dipole),
}

impl MagneticModel for MagneticField {
    fn calculate(&self, position_ecef: &Vector3<f64>) -> Result<Vector3<f64>, MagneticErrors> {
        match self {
            MagneticField::Dipole(model) => model.calculate(position_ecef),
        }
    }
}
