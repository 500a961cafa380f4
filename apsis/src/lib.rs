//! Coupled orbital and attitude propagation for a single rigid satellite.
//!
//! The crate wires the environment models (`gravity`, `atmosphere`,
//! `celestial`, `magnetics`) into a 13-state rigid-body model
//! (`dynamics::SatelliteDynamics`), integrates it with `apsis_diffeq`, and
//! records every accepted step in an [`Ephemeris`]. Configuration lives in
//! [`SimulationConfig`], which validates everything up front and hands back a
//! ready-to-run [`config::Simulation`].

use atmosphere::AtmosphereErrors;
use gravity::GravityErrors;
use thiserror::Error;

pub mod config;
pub mod dynamics;
pub mod ephemeris;
pub mod forces;
pub mod guidance;
pub mod propagation;
pub mod torques;

pub use config::{ConfigErrors, InitialOrbit, Simulation, SimulationConfig};
pub use dynamics::{SatelliteDynamics, rotational_acceleration};
pub use ephemeris::Ephemeris;
pub use forces::{
    DragForce, Force, ForceModel, GravityForce, SolarPressureForce, ThirdBody, ThirdBodyForce,
};
pub use guidance::{AutomaticGuidance, DynamicGuidance, Guidance};
pub use propagation::{
    CancelToken, IntegrationMethod, PropagationErrors, PropagationOutput, Propagator, RunSummary,
    TerminationReason,
};
pub use torques::law::{
    ControlPolicy, PdController, PhaseSpec, TorqueLaw, TorqueLawState, TransitionCondition,
};
pub use torques::scenario::TorqueScenario;
pub use torques::Torque;

/// Failures raised while evaluating the equations of motion. These mark the
/// trajectory leaving a model's validity domain; the propagator aborts the run
/// and reports them, it never retries through them.
#[derive(Debug, Error)]
pub enum DynamicsErrors {
    #[error("{0}")]
    Gravity(#[from] GravityErrors),
    #[error("{0}")]
    Atmosphere(#[from] AtmosphereErrors),
}
