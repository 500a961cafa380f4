use nalgebra::Matrix3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MassPropertiesErrors {
    #[error("Ixx cant be less than or equal to zero")]
    IxxLessThanOrEqualToZero,
    #[error("Iyy cant be less than or equal to zero")]
    IyyLessThanOrEqualToZero,
    #[error("Izz cant be less than or equal to zero")]
    IzzLessThanOrEqualToZero,
    #[error("mass cannot be less than or equal to zero")]
    MassLessThanOrEqualToZero,
    #[error("inertia tensor is singular and cannot be inverted")]
    SingularInertia,
}

/// Symmetric inertia tensor about the center of mass, body frame, kg m^2.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Inertia {
    pub ixx: f64,
    pub iyy: f64,
    pub izz: f64,
    pub ixy: f64,
    pub ixz: f64,
    pub iyz: f64,
}

impl Inertia {
    pub fn new(
        ixx: f64,
        iyy: f64,
        izz: f64,
        ixy: f64,
        ixz: f64,
        iyz: f64,
    ) -> Result<Self, MassPropertiesErrors> {
        if ixx <= f64::EPSILON {
            return Err(MassPropertiesErrors::IxxLessThanOrEqualToZero);
        }
        if iyy <= f64::EPSILON {
            return Err(MassPropertiesErrors::IyyLessThanOrEqualToZero);
        }
        if izz <= f64::EPSILON {
            return Err(MassPropertiesErrors::IzzLessThanOrEqualToZero);
        }
        Ok(Self { ixx, iyy, izz, ixy, ixz, iyz })
    }

    pub fn diagonal(ixx: f64, iyy: f64, izz: f64) -> Result<Self, MassPropertiesErrors> {
        Self::new(ixx, iyy, izz, 0.0, 0.0, 0.0)
    }

    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.ixx, self.ixy, self.ixz,
            self.ixy, self.iyy, self.iyz,
            self.ixz, self.iyz, self.izz,
        )
    }

    /// Rigid body dynamics needs I^-1 every derivative evaluation, so the
    /// inverse is taken once up front rather than in the loop.
    pub fn inverse(&self) -> Result<Matrix3<f64>, MassPropertiesErrors> {
        self.matrix()
            .try_inverse()
            .ok_or(MassPropertiesErrors::SingularInertia)
    }
}

impl Default for Inertia {
    fn default() -> Self {
        Self { ixx: 1.0, iyy: 1.0, izz: 1.0, ixy: 0.0, ixz: 0.0, iyz: 0.0 }
    }
}

/// Mass and inertia of a rigid body. Construction is the fail-fast gate for
/// nonphysical values; a value of this type is always usable for dynamics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MassProperties {
    pub mass: f64,
    pub inertia: Inertia,
}

impl MassProperties {
    pub fn new(mass: f64, inertia: Inertia) -> Result<Self, MassPropertiesErrors> {
        if mass <= f64::EPSILON {
            return Err(MassPropertiesErrors::MassLessThanOrEqualToZero);
        }
        Ok(Self { mass, inertia })
    }
}

impl Default for MassProperties {
    fn default() -> Self {
        Self { mass: 1.0, inertia: Inertia::default() }
    }
}
