use nalgebra::{UnitQuaternion, Vector3};
use satellite::{SatelliteBody, SatelliteState};
use serde::{Deserialize, Serialize};

pub mod law;
pub mod scenario;

pub use law::{TorqueLaw, TorqueLawState};
pub use scenario::TorqueScenario;

/// A body-frame torque contributor in N·m.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Torque {
    /// Scripted open-loop steps over time.
    Scenario(TorqueScenario),
    /// Closed-loop mission-phase state machine.
    Law(TorqueLaw),
}

impl Torque {
    /// Torque at `t` seconds into the run. Reads the shared control state,
    /// never writes it; law-state mutation happens on accepted steps only.
    pub fn torque(
        &self,
        t: f64,
        state: &SatelliteState,
        body: &SatelliteBody,
        law_state: &TorqueLawState,
        target: &UnitQuaternion<f64>,
    ) -> Vector3<f64> {
        match self {
            Torque::Scenario(scenario) => scenario.torque(t),
            Torque::Law(law) => law.torque(state, body, law_state, target),
        }
    }
}
