use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod harris_priester;

pub use harris_priester::HarrisPriester;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum AtmosphereErrors {
    #[error("altitude {altitude} m is outside the model range [{min} m, {max} m]")]
    AltitudeOutOfRange { altitude: f64, min: f64, max: f64 },
}

/// Atmospheric density at an inertial position, kg/m^3. The Sun position
/// is needed by models with a diurnal density variation.
pub trait AtmosphereModel {
    fn density(
        &self,
        position: &Vector3<f64>,
        sun_position: &Vector3<f64>,
    ) -> Result<f64, AtmosphereErrors>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Atmosphere {
    HarrisPriester(HarrisPriester),
}

impl AtmosphereModel for Atmosphere {
    fn density(
        &self,
        position: &Vector3<f64>,
        sun_position: &Vector3<f64>,
    ) -> Result<f64, AtmosphereErrors> {
        match self {
            Atmosphere::HarrisPriester(model) => model.density(position, sun_position),
        }
    }
}
