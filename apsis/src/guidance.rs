use nalgebra::{Matrix3, Rotation3, UnitQuaternion, Vector3};
use satellite::SatelliteState;
use serde::{Deserialize, Serialize};

/// Where the torque law should point the body. Evaluation is pure: targets
/// are recomputed from the orbital state on every call and nothing here
/// mutates between calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Guidance {
    Automatic(AutomaticGuidance),
    Dynamic(DynamicGuidance),
}

impl Guidance {
    pub fn target_attitude(&self, state: &SatelliteState) -> UnitQuaternion<f64> {
        match self {
            Guidance::Automatic(guidance) => guidance.target_attitude(state),
            Guidance::Dynamic(guidance) => guidance.target_attitude(),
        }
    }
}

/// Targets derived from the current orbital geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AutomaticGuidance {
    /// +z body at the Earth center, +y along the negative orbit normal,
    /// x completing the triad (an LVLH hold).
    Nadir,
    /// +z body at the Sun, completed against the orbit normal.
    SunPointing,
}

impl AutomaticGuidance {
    pub fn target_attitude(&self, state: &SatelliteState) -> UnitQuaternion<f64> {
        match self {
            AutomaticGuidance::Nadir => nadir_target(state),
            AutomaticGuidance::SunPointing => sun_target(state),
        }
    }
}

/// A target attitude set from outside the run, e.g. by an operator console
/// between propagations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DynamicGuidance {
    target: UnitQuaternion<f64>,
}

impl DynamicGuidance {
    pub fn new(target: UnitQuaternion<f64>) -> Self {
        Self { target }
    }

    pub fn set_target(&mut self, target: UnitQuaternion<f64>) {
        self.target = target;
    }

    pub fn target_attitude(&self) -> UnitQuaternion<f64> {
        self.target
    }
}

impl Default for DynamicGuidance {
    fn default() -> Self {
        Self::new(UnitQuaternion::identity())
    }
}

fn nadir_target(state: &SatelliteState) -> UnitQuaternion<f64> {
    let radial = state.position.norm();
    let angular_momentum = state.position.cross(&state.velocity);
    let normal = angular_momentum.norm();
    if radial <= f64::EPSILON || normal <= f64::EPSILON {
        return UnitQuaternion::identity();
    }
    let z = -state.position / radial;
    let y = -angular_momentum / normal;
    let x = y.cross(&z);
    frame_from_columns(x, y, z)
}

fn sun_target(state: &SatelliteState) -> UnitQuaternion<f64> {
    let to_sun = celestial::sun_position(state.epoch) - state.position;
    let distance = to_sun.norm();
    let angular_momentum = state.position.cross(&state.velocity);
    if distance <= f64::EPSILON {
        return UnitQuaternion::identity();
    }
    let z = to_sun / distance;
    let x = angular_momentum.cross(&z);
    let span = x.norm();
    if span <= f64::EPSILON {
        // sun along the orbit normal; any rotation about z works
        return UnitQuaternion::rotation_between(&Vector3::z(), &z)
            .unwrap_or_else(UnitQuaternion::identity);
    }
    let x = x / span;
    let y = z.cross(&x);
    frame_from_columns(x, y, z)
}

/// Body axes expressed in the inertial frame, as a body-to-inertial
/// rotation. Columns must already be orthonormal and right-handed.
fn frame_from_columns(
    x: Vector3<f64>,
    y: Vector3<f64>,
    z: Vector3<f64>,
) -> UnitQuaternion<f64> {
    let matrix = Matrix3::from_columns(&[x, y, z]);
    UnitQuaternion::from_rotation_matrix(&Rotation3::from_matrix_unchecked(matrix))
}
