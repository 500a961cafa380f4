use atmosphere::{Atmosphere, AtmosphereModel};
use celestial::{AU, CelestialBodies, EARTH_ROTATION_RATE, SPEED_OF_LIGHT};
use gravity::{Gravity, GravityModel};
use nalgebra::Vector3;
use satellite::{SatelliteBody, SatelliteState};
use serde::{Deserialize, Serialize};

use crate::DynamicsErrors;

/// Solar constant at 1 AU, W/m^2.
pub const SOLAR_FLUX_1AU: f64 = 1361.0;

/// A translational force contributor, evaluated in the inertial frame in
/// Newtons. The evaluation epoch rides inside the state. Contributors are
/// independent of each other and never mutate anything.
pub trait ForceModel {
    fn force(
        &self,
        state: &SatelliteState,
        body: &SatelliteBody,
    ) -> Result<Vector3<f64>, DynamicsErrors>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Force {
    Gravity(GravityForce),
    Drag(DragForce),
    SolarPressure(SolarPressureForce),
    ThirdBody(ThirdBodyForce),
}

impl ForceModel for Force {
    fn force(
        &self,
        state: &SatelliteState,
        body: &SatelliteBody,
    ) -> Result<Vector3<f64>, DynamicsErrors> {
        match self {
            Force::Gravity(force) => force.force(state, body),
            Force::Drag(force) => force.force(state, body),
            Force::SolarPressure(force) => force.force(state, body),
            Force::ThirdBody(force) => force.force(state, body),
        }
    }
}

/// Central-body gravity, `F = m a`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GravityForce {
    pub model: Gravity,
}

impl GravityForce {
    pub fn new(model: Gravity) -> Self {
        Self { model }
    }
}

impl ForceModel for GravityForce {
    fn force(
        &self,
        state: &SatelliteState,
        body: &SatelliteBody,
    ) -> Result<Vector3<f64>, DynamicsErrors> {
        let acceleration = self.model.calculate(&state.position)?;
        Ok(body.mass_properties.mass * acceleration)
    }
}

/// Aerodynamic drag against an atmosphere co-rotating with the Earth,
/// `F = -1/2 rho Cd A |v_rel| v_rel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DragForce {
    pub atmosphere: Atmosphere,
}

impl DragForce {
    pub fn new(atmosphere: Atmosphere) -> Self {
        Self { atmosphere }
    }
}

impl ForceModel for DragForce {
    fn force(
        &self,
        state: &SatelliteState,
        body: &SatelliteBody,
    ) -> Result<Vector3<f64>, DynamicsErrors> {
        let omega = Vector3::new(0.0, 0.0, EARTH_ROTATION_RATE);
        let v_rel = state.velocity - omega.cross(&state.position);
        let sun = celestial::sun_position(state.epoch);
        let density = self.atmosphere.density(&state.position, &sun)?;
        let dynamic = -0.5
            * density
            * body.surfaces.drag_coefficient
            * body.surfaces.drag_area
            * v_rel.norm();
        Ok(dynamic * v_rel)
    }
}

/// Solar radiation pressure on the illuminated area, zero inside the
/// geometric Earth shadow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolarPressureForce {
    /// Flux at 1 AU, W/m^2.
    pub solar_flux: f64,
}

impl SolarPressureForce {
    pub fn new() -> Self {
        Self { solar_flux: SOLAR_FLUX_1AU }
    }

    pub fn with_solar_flux(mut self, solar_flux: f64) -> Self {
        self.solar_flux = solar_flux;
        self
    }
}

impl Default for SolarPressureForce {
    fn default() -> Self {
        Self::new()
    }
}

impl ForceModel for SolarPressureForce {
    fn force(
        &self,
        state: &SatelliteState,
        body: &SatelliteBody,
    ) -> Result<Vector3<f64>, DynamicsErrors> {
        let sun = celestial::sun_position(state.epoch);
        if celestial::in_shadow(
            &state.position,
            &sun,
            CelestialBodies::Earth.radius(),
        ) {
            return Ok(Vector3::zeros());
        }
        let from_sun = state.position - sun;
        let distance = from_sun.norm();
        let pressure = self.solar_flux / SPEED_OF_LIGHT * (AU / distance).powi(2);
        let force = pressure * body.surfaces.reflectivity * body.surfaces.srp_area;
        Ok(force * from_sun / distance)
    }
}

/// Perturbing bodies with an analytic geocentric ephemeris.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ThirdBody {
    Sun,
    Moon,
}

impl ThirdBody {
    fn mu(&self) -> f64 {
        match self {
            ThirdBody::Sun => CelestialBodies::Sun.mu(),
            ThirdBody::Moon => CelestialBodies::Moon.mu(),
        }
    }

    fn position(&self, epoch: time::Epoch) -> Vector3<f64> {
        match self {
            ThirdBody::Sun => celestial::sun_position(epoch),
            ThirdBody::Moon => celestial::moon_position(epoch),
        }
    }
}

/// Differential attraction of a third body in the Earth-centered frame,
/// `a = mu (delta/|delta|^3 - s/|s|^3)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThirdBodyForce {
    pub body: ThirdBody,
}

impl ThirdBodyForce {
    pub fn new(body: ThirdBody) -> Self {
        Self { body }
    }
}

impl ForceModel for ThirdBodyForce {
    fn force(
        &self,
        state: &SatelliteState,
        body: &SatelliteBody,
    ) -> Result<Vector3<f64>, DynamicsErrors> {
        let s = self.body.position(state.epoch);
        let delta = s - state.position;
        let acceleration = self.body.mu()
            * (delta / delta.norm().powi(3) - s / s.norm().powi(3));
        Ok(body.mass_properties.mass * acceleration)
    }
}
