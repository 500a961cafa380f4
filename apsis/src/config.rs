//! Serializable run configuration and the fail-fast validation that
//! turns it into runnable parts. Nothing propagates until the whole
//! configuration is good.

use crate::dynamics::SatelliteDynamics;
use crate::forces::{Force, GravityForce};
use crate::guidance::{DynamicGuidance, Guidance};
use crate::propagation::{
    CancelToken, IntegrationMethod, PropagationErrors, PropagationOutput, Propagator,
};
use crate::torques::Torque;
use celestial::CelestialBodies;
use gravity::{Gravity, NewtonianGravity};
use mass_properties::MassPropertiesErrors;
use nalgebra::{UnitQuaternion, Vector3};
use satellite::{KeplerianElements, SatelliteBody, SatelliteState};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::Epoch;

#[derive(Debug, Error)]
pub enum ConfigErrors {
    #[error("{0}")]
    Body(#[from] MassPropertiesErrors),
    #[error("duration must be positive and finite, got {duration} s")]
    DurationNotPositive { duration: f64 },
    #[error("fixed step size must be positive and finite, got {dt} s")]
    StepSizeNotPositive { dt: f64 },
    #[error("tolerances must be positive and finite, got rel_tol {rel_tol}, abs_tol {abs_tol}")]
    TolerancesNotPositive { rel_tol: f64, abs_tol: f64 },
    #[error("ephemeris cadence must be positive and finite, got {cadence} s")]
    CadenceNotPositive { cadence: f64 },
    #[error("a torque law must have at least one phase")]
    TorqueLawHasNoPhases,
    #[error("at most one torque law can be configured per run")]
    MultipleTorqueLaws,
    #[error("initial state has a non-finite component")]
    InitialStateNotFinite,
}

/// Where the trajectory starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InitialOrbit {
    Keplerian(KeplerianElements),
    Cartesian {
        position: Vector3<f64>,
        velocity: Vector3<f64>,
    },
}

impl InitialOrbit {
    /// Inertial position and velocity. Elements are converted with the
    /// Earth's gravitational parameter.
    pub fn state_vectors(&self) -> (Vector3<f64>, Vector3<f64>) {
        match self {
            InitialOrbit::Keplerian(elements) => elements.to_rv(CelestialBodies::Earth.mu()),
            InitialOrbit::Cartesian { position, velocity } => (*position, *velocity),
        }
    }
}

impl Default for InitialOrbit {
    /// 500 km circular orbit at the 51.6 deg station inclination.
    fn default() -> Self {
        InitialOrbit::Keplerian(KeplerianElements::new(
            CelestialBodies::Earth.radius() + 500e3,
            0.0,
            51.6_f64.to_radians(),
            0.0,
            0.0,
            0.0,
        ))
    }
}

/// Complete description of a run. `Default` is one hour of the default
/// orbit under point-mass gravity with an inertial attitude hold, RK4 at
/// 0.1 s, ephemeris sampled every second.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub epoch: Epoch,
    pub initial_orbit: InitialOrbit,
    pub initial_attitude: UnitQuaternion<f64>,
    pub initial_spin: Vector3<f64>,
    pub body: SatelliteBody,
    /// Evaluated and summed in this order.
    pub forces: Vec<Force>,
    pub torques: Vec<Torque>,
    pub guidance: Guidance,
    pub method: IntegrationMethod,
    /// Run length, s.
    pub duration: f64,
    /// Ephemeris export sampling interval, s.
    pub cadence: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            epoch: Epoch::J2000,
            initial_orbit: InitialOrbit::default(),
            initial_attitude: UnitQuaternion::identity(),
            initial_spin: Vector3::zeros(),
            body: SatelliteBody::default(),
            forces: vec![Force::Gravity(GravityForce::new(Gravity::Newtonian(
                NewtonianGravity::new(CelestialBodies::Earth.mu()),
            )))],
            torques: Vec::new(),
            guidance: Guidance::Dynamic(DynamicGuidance::default()),
            method: IntegrationMethod::default(),
            duration: 3600.0,
            cadence: 1.0,
        }
    }
}

impl SimulationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_epoch(mut self, epoch: Epoch) -> Self {
        self.epoch = epoch;
        self
    }

    pub fn with_orbit(mut self, orbit: InitialOrbit) -> Self {
        self.initial_orbit = orbit;
        self
    }

    pub fn with_attitude(mut self, attitude: UnitQuaternion<f64>) -> Self {
        self.initial_attitude = attitude;
        self
    }

    pub fn with_spin(mut self, spin: Vector3<f64>) -> Self {
        self.initial_spin = spin;
        self
    }

    pub fn with_body(mut self, body: SatelliteBody) -> Self {
        self.body = body;
        self
    }

    /// Appends a force contributor.
    pub fn with_force(mut self, force: Force) -> Self {
        self.forces.push(force);
        self
    }

    /// Replaces the whole force list.
    pub fn with_forces(mut self, forces: Vec<Force>) -> Self {
        self.forces = forces;
        self
    }

    /// Appends a torque contributor.
    pub fn with_torque(mut self, torque: Torque) -> Self {
        self.torques.push(torque);
        self
    }

    pub fn with_guidance(mut self, guidance: Guidance) -> Self {
        self.guidance = guidance;
        self
    }

    pub fn with_method(mut self, method: IntegrationMethod) -> Self {
        self.method = method;
        self
    }

    pub fn with_duration(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_cadence(mut self, cadence: f64) -> Self {
        self.cadence = cadence;
        self
    }

    /// Validates every field and assembles the runnable parts.
    pub fn build(&self) -> Result<Simulation, ConfigErrors> {
        if !(self.duration.is_finite() && self.duration > 0.0) {
            return Err(ConfigErrors::DurationNotPositive {
                duration: self.duration,
            });
        }
        match self.method {
            IntegrationMethod::Rk4 { dt } => {
                if !(dt.is_finite() && dt > 0.0) {
                    return Err(ConfigErrors::StepSizeNotPositive { dt });
                }
            }
            IntegrationMethod::DormandPrince45 { control } => {
                let good = |tol: f64| tol.is_finite() && tol > 0.0;
                if !(good(control.rel_tol) && good(control.abs_tol)) {
                    return Err(ConfigErrors::TolerancesNotPositive {
                        rel_tol: control.rel_tol,
                        abs_tol: control.abs_tol,
                    });
                }
            }
        }
        if !(self.cadence.is_finite() && self.cadence > 0.0) {
            return Err(ConfigErrors::CadenceNotPositive {
                cadence: self.cadence,
            });
        }

        // A single TorqueLawState drives the controller, so only one law
        // can be active in a run.
        let mut laws = 0;
        for torque in &self.torques {
            if let Torque::Law(law) = torque {
                if law.phases.is_empty() {
                    return Err(ConfigErrors::TorqueLawHasNoPhases);
                }
                laws += 1;
            }
        }
        if laws > 1 {
            return Err(ConfigErrors::MultipleTorqueLaws);
        }

        let (position, velocity) = self.initial_orbit.state_vectors();
        let initial = SatelliteState::new(
            self.epoch,
            position,
            velocity,
            self.initial_attitude,
            self.initial_spin,
        );
        if !state_is_finite(&initial) {
            return Err(ConfigErrors::InitialStateNotFinite);
        }

        let cancel = CancelToken::new();
        let dynamics = SatelliteDynamics::new(
            self.epoch,
            self.body.clone(),
            self.forces.clone(),
            self.torques.clone(),
            self.guidance.clone(),
        )?
        .with_cancel(cancel.clone());

        Ok(Simulation {
            dynamics,
            propagator: Propagator::new(self.method),
            initial,
            cancel,
            duration: self.duration,
            cadence: self.cadence,
        })
    }
}

fn state_is_finite(state: &SatelliteState) -> bool {
    state.position.iter().all(|x| x.is_finite())
        && state.velocity.iter().all(|x| x.is_finite())
        && state.spin.iter().all(|x| x.is_finite())
        && state.attitude.quaternion().coords.iter().all(|x| x.is_finite())
}

/// A validated, ready-to-run scenario. Clone the [`CancelToken`] before
/// calling [`run`](Simulation::run) to stop the propagation from another
/// thread.
#[derive(Debug)]
pub struct Simulation {
    pub dynamics: SatelliteDynamics,
    pub propagator: Propagator,
    pub initial: SatelliteState,
    pub cancel: CancelToken,
    pub duration: f64,
    pub cadence: f64,
}

impl Simulation {
    pub fn run(&mut self) -> Result<PropagationOutput, PropagationErrors> {
        self.propagator
            .propagate(&mut self.dynamics, &self.initial, (0.0, self.duration))
    }
}
