use magnetics::MagneticErrors;
use mass_properties::MassPropertiesErrors;
use thiserror::Error;

pub mod body;
pub mod orbit;
pub mod sensors;
pub mod state;

pub use body::{SatelliteBody, SurfaceProperties};
pub use orbit::KeplerianElements;
pub use sensors::{Gyroscope, Magnetometer};
pub use state::{SatelliteState, renormalize_attitude};

#[derive(Debug, Error)]
pub enum SatelliteErrors {
    #[error("{0}")]
    MassProperties(#[from] MassPropertiesErrors),
    #[error("{0}")]
    Magnetics(#[from] MagneticErrors),
    #[error("drag area cant be negative")]
    DragAreaIsNegative,
    #[error("drag coefficient cant be less than or equal to zero")]
    DragCoefficientNotPositive,
    #[error("radiation area cant be negative")]
    SrpAreaIsNegative,
    #[error("reflectivity coefficient must be between 0 and 2")]
    ReflectivityOutOfRange,
}
