use mass_properties::{Inertia, MassProperties};
use serde::{Deserialize, Serialize};

use crate::SatelliteErrors;

/// Aerodynamic and optical surface description consumed by the drag and
/// radiation pressure contributors. Areas are effective cross sections in
/// m^2; the reflectivity coefficient Cr spans 0 (transparent) to 2
/// (perfect specular reflector).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceProperties {
    pub drag_area: f64,
    pub drag_coefficient: f64,
    pub srp_area: f64,
    pub reflectivity: f64,
}

impl SurfaceProperties {
    pub fn new(
        drag_area: f64,
        drag_coefficient: f64,
        srp_area: f64,
        reflectivity: f64,
    ) -> Result<Self, SatelliteErrors> {
        if drag_area < 0.0 {
            return Err(SatelliteErrors::DragAreaIsNegative);
        }
        if drag_coefficient <= f64::EPSILON {
            return Err(SatelliteErrors::DragCoefficientNotPositive);
        }
        if srp_area < 0.0 {
            return Err(SatelliteErrors::SrpAreaIsNegative);
        }
        if !(0.0..=2.0).contains(&reflectivity) {
            return Err(SatelliteErrors::ReflectivityOutOfRange);
        }
        Ok(Self {
            drag_area,
            drag_coefficient,
            srp_area,
            reflectivity,
        })
    }
}

impl Default for SurfaceProperties {
    /// Faces of a 0.01 m cube with typical CubeSat coefficients.
    fn default() -> Self {
        Self {
            drag_area: 1e-4,
            drag_coefficient: 2.2,
            srp_area: 1e-4,
            reflectivity: 1.3,
        }
    }
}

/// Immutable structural description of the satellite, built once and
/// shared read-only by every force and torque contributor for the whole
/// run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteBody {
    pub mass_properties: MassProperties,
    pub surfaces: SurfaceProperties,
}

impl SatelliteBody {
    pub fn new(mass_properties: MassProperties, surfaces: SurfaceProperties) -> Self {
        Self {
            mass_properties,
            surfaces,
        }
    }
}

impl Default for SatelliteBody {
    /// 1.04 kg CubeSat with a measured diagonal inertia.
    fn default() -> Self {
        Self {
            mass_properties: MassProperties {
                mass: 1.04,
                inertia: Inertia {
                    ixx: 1.9002e-3,
                    iyy: 1.9156e-3,
                    izz: 1.9496e-3,
                    ixy: 0.0,
                    ixz: 0.0,
                    iyz: 0.0,
                },
            },
            surfaces: SurfaceProperties::default(),
        }
    }
}
