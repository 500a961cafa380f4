use nalgebra::{UnitQuaternion, Vector3};
use satellite::{SatelliteBody, SatelliteState};
use serde::{Deserialize, Serialize};

/// Quaternion-feedback attitude controller gains. Torque per axis is
/// `I · (-k_p·e - k_i·∫e - k_d·ω)` with `e` the attitude error vector, so
/// the gains are inertia-relative and carry over between bodies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PdController {
    pub k_p: f64,
    pub k_i: f64,
    pub k_d: f64,
    /// Error magnitude above which the integral is held at zero.
    pub anti_windup: f64,
}

impl Default for PdController {
    fn default() -> Self {
        Self {
            k_p: 0.01,
            k_i: 0.00001,
            k_d: 0.1,
            anti_windup: 0.0175,
        }
    }
}

/// What the active mission phase commands.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ControlPolicy {
    /// No commanded torque.
    Idle,
    /// Fixed body-frame torque.
    ConstantBias { torque: Vector3<f64> },
    /// Detumble: `τ = -gain · I ω`, an exponential rate decay.
    RateDamping { gain: f64 },
    /// Track the guidance target.
    Pd(PdController),
}

/// Condition that ends the active phase. Evaluated once per accepted step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransitionCondition {
    /// ‖ω‖ below the threshold, rad/s.
    SpinBelow { threshold: f64 },
    /// Seconds since the phase was entered.
    ElapsedInPhase { duration: f64 },
    /// Rotation angle between attitude and guidance target, rad.
    AttitudeErrorBelow { threshold: f64 },
}

/// One mission phase. A phase without a transition is terminal and holds
/// for the rest of the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub name: String,
    pub policy: ControlPolicy,
    pub transition: Option<TransitionCondition>,
}

impl PhaseSpec {
    pub fn new(
        name: impl Into<String>,
        policy: ControlPolicy,
        transition: Option<TransitionCondition>,
    ) -> Self {
        Self {
            name: name.into(),
            policy,
            transition,
        }
    }
}

/// The only control memory that crosses step boundaries. It is read during
/// derivative evaluations and written exclusively from the accepted-step
/// hook, so rejected trial steps can never move the state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorqueLawState {
    pub phase_index: usize,
    pub phase_entered_t: f64,
    pub integral_error: Vector3<f64>,
}

impl TorqueLawState {
    pub fn new(t0: f64) -> Self {
        Self {
            phase_index: 0,
            phase_entered_t: t0,
            integral_error: Vector3::zeros(),
        }
    }
}

/// Ordered mission phases driven by a per-run [`TorqueLawState`]. The phase
/// index never decreases and advances at most once per accepted step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorqueLaw {
    pub phases: Vec<PhaseSpec>,
}

impl TorqueLaw {
    pub fn new(phases: Vec<PhaseSpec>) -> Self {
        Self { phases }
    }

    /// The standard post-deployment sequence: damp rates until the body is
    /// quiet, then hold the guidance target.
    pub fn detumble_and_point() -> Self {
        Self::new(vec![
            PhaseSpec::new(
                "detumble",
                ControlPolicy::RateDamping { gain: 0.1 },
                Some(TransitionCondition::SpinBelow { threshold: 0.01 }),
            ),
            PhaseSpec::new("point", ControlPolicy::Pd(PdController::default()), None),
        ])
    }

    pub fn active_phase(&self, law_state: &TorqueLawState) -> Option<&PhaseSpec> {
        self.phases.get(law_state.phase_index)
    }

    /// Commanded body-frame torque under the active phase. Pure read of the
    /// law state.
    pub fn torque(
        &self,
        state: &SatelliteState,
        body: &SatelliteBody,
        law_state: &TorqueLawState,
        target: &UnitQuaternion<f64>,
    ) -> Vector3<f64> {
        let Some(phase) = self.active_phase(law_state) else {
            return Vector3::zeros();
        };
        let inertia = body.mass_properties.inertia.matrix();
        match &phase.policy {
            ControlPolicy::Idle => Vector3::zeros(),
            ControlPolicy::ConstantBias { torque } => *torque,
            ControlPolicy::RateDamping { gain } => -gain * (inertia * state.spin),
            ControlPolicy::Pd(controller) => {
                let error = attitude_error(&state.attitude, target);
                inertia
                    * (-controller.k_p * error
                        - controller.k_i * law_state.integral_error
                        - controller.k_d * state.spin)
            }
        }
    }

    /// Accepted-step hook: integrate the PD error, then evaluate the active
    /// transition. Advances at most one phase; entering a phase resets the
    /// integral.
    pub fn update(
        &self,
        law_state: &mut TorqueLawState,
        t: f64,
        dt: f64,
        state: &SatelliteState,
        target: &UnitQuaternion<f64>,
    ) {
        let Some(phase) = self.active_phase(law_state) else {
            return;
        };

        if let ControlPolicy::Pd(controller) = &phase.policy {
            let error = attitude_error(&state.attitude, target);
            for i in 0..3 {
                if error[i].abs() < controller.anti_windup {
                    law_state.integral_error[i] += error[i] * dt;
                } else {
                    law_state.integral_error[i] = 0.0;
                }
            }
        }

        let Some(condition) = &phase.transition else {
            return;
        };
        let met = match condition {
            TransitionCondition::SpinBelow { threshold } => state.spin.norm() < *threshold,
            TransitionCondition::ElapsedInPhase { duration } => {
                t - law_state.phase_entered_t >= *duration
            }
            TransitionCondition::AttitudeErrorBelow { threshold } => {
                state.attitude.angle_to(target) < *threshold
            }
        };
        if met && law_state.phase_index + 1 < self.phases.len() {
            law_state.phase_index += 1;
            law_state.phase_entered_t = t;
            law_state.integral_error = Vector3::zeros();
        }
    }
}

/// Vector part of the shortest-path error quaternion between the current
/// attitude and the target. The scalar part is forced non-negative so the
/// error always points along the short way around.
pub fn attitude_error(
    attitude: &UnitQuaternion<f64>,
    target: &UnitQuaternion<f64>,
) -> Vector3<f64> {
    let q = (attitude * target.inverse()).into_inner();
    let q = if q.w < 0.0 { -q } else { q };
    Vector3::new(q.i, q.j, q.k)
}
