use std::error::Error;
use std::fmt;

use apsis_diffeq::{OdeModel, state::StateArray};
use indicatif::ProgressBar;
use mass_properties::MassPropertiesErrors;
use nalgebra::{Matrix3, Quaternion, Vector3};
use satellite::{SatelliteBody, SatelliteState, renormalize_attitude};
use time::Epoch;

use crate::forces::{Force, ForceModel};
use crate::guidance::Guidance;
use crate::propagation::CancelToken;
use crate::torques::{Torque, TorqueLawState};

/// Euler's rigid-body equation, `ω̇ = I⁻¹ (τ - ω × I ω)`. The gyroscopic
/// coupling term makes spin about the intermediate axis unstable even with
/// zero applied torque.
pub fn rotational_acceleration(
    inertia: &Matrix3<f64>,
    inertia_inverse: &Matrix3<f64>,
    spin: &Vector3<f64>,
    torque: &Vector3<f64>,
) -> Vector3<f64> {
    inertia_inverse * (torque - spin.cross(&(inertia * spin)))
}

/// The coupled 13-state rigid-body model: position, velocity, attitude
/// quaternion and body spin of one satellite.
///
/// Derivative evaluation is a pure function of `(t, state)` plus the frozen
/// control state; forces and torques are summed in configuration order so
/// identical configurations reproduce identical floating-point results. All
/// cross-step mutation (quaternion renormalization, PD integral, phase
/// transitions, progress) happens in `accept_step`, which the solver calls
/// only for accepted steps.
pub struct SatelliteDynamics {
    epoch_base: Epoch,
    body: SatelliteBody,
    inertia: Matrix3<f64>,
    inertia_inverse: Matrix3<f64>,
    forces: Vec<Force>,
    torques: Vec<Torque>,
    guidance: Guidance,
    law_state: TorqueLawState,
    cancel: CancelToken,
    progress: Option<ProgressBar>,
    t_start: f64,
    last_accepted_t: f64,
}

impl SatelliteDynamics {
    pub fn new(
        epoch_base: Epoch,
        body: SatelliteBody,
        forces: Vec<Force>,
        torques: Vec<Torque>,
        guidance: Guidance,
    ) -> Result<Self, MassPropertiesErrors> {
        let inertia = body.mass_properties.inertia.matrix();
        let inertia_inverse = body.mass_properties.inertia.inverse()?;
        Ok(Self {
            epoch_base,
            body,
            inertia,
            inertia_inverse,
            forces,
            torques,
            guidance,
            law_state: TorqueLawState::new(0.0),
            cancel: CancelToken::new(),
            progress: None,
            t_start: 0.0,
            last_accepted_t: 0.0,
        })
    }

    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Rewinds the control state to the start of a run at `t0`. Makes the
    /// model reusable: two propagations from the same reset produce the
    /// same trajectory.
    pub fn reset(&mut self, t0: f64) {
        self.law_state = TorqueLawState::new(t0);
        self.t_start = t0;
        self.last_accepted_t = t0;
    }

    pub fn epoch_base(&self) -> Epoch {
        self.epoch_base
    }

    pub fn body(&self) -> &SatelliteBody {
        &self.body
    }

    pub fn law_state(&self) -> &TorqueLawState {
        &self.law_state
    }

    /// Body-frame torque command at `t`, summed over every contributor under
    /// the current guidance target.
    fn total_torque(&self, t: f64, state: &SatelliteState) -> Vector3<f64> {
        let target = self.guidance.target_attitude(state);
        let mut total = Vector3::zeros();
        for torque in &self.torques {
            total += torque.torque(t, state, &self.body, &self.law_state, &target);
        }
        total
    }
}

impl OdeModel for SatelliteDynamics {
    type State = StateArray<13>;

    fn f(
        &mut self,
        t: f64,
        state: &Self::State,
        derivative: &mut Self::State,
    ) -> Result<(), Box<dyn Error>> {
        let satellite = SatelliteState::from_array(self.epoch_base, t, state);

        let mut force = Vector3::zeros();
        for model in &self.forces {
            force += model.force(&satellite, &self.body)?;
        }
        let acceleration = force / self.body.mass_properties.mass;

        let torque = self.total_torque(t, &satellite);
        let spin_rate = rotational_acceleration(
            &self.inertia,
            &self.inertia_inverse,
            &satellite.spin,
            &torque,
        );

        // body-rate quaternion kinematics, q̇ = 1/2 q ⊗ (0, ω)
        let q_dot = satellite.attitude.into_inner()
            * Quaternion::from_parts(0.0, satellite.spin)
            * 0.5;

        derivative[0] = satellite.velocity.x;
        derivative[1] = satellite.velocity.y;
        derivative[2] = satellite.velocity.z;
        derivative[3] = acceleration.x;
        derivative[4] = acceleration.y;
        derivative[5] = acceleration.z;
        derivative[6] = q_dot.w;
        derivative[7] = q_dot.i;
        derivative[8] = q_dot.j;
        derivative[9] = q_dot.k;
        derivative[10] = spin_rate.x;
        derivative[11] = spin_rate.y;
        derivative[12] = spin_rate.z;
        Ok(())
    }

    fn accept_step(
        &mut self,
        t: f64,
        state: &mut Self::State,
    ) -> Result<(), Box<dyn Error>> {
        renormalize_attitude(state);
        let satellite = SatelliteState::from_array(self.epoch_base, t, state);
        let dt = t - self.last_accepted_t;
        let target = self.guidance.target_attitude(&satellite);
        for torque in &self.torques {
            if let Torque::Law(law) = torque {
                law.update(&mut self.law_state, t, dt, &satellite, &target);
            }
        }
        if let Some(progress) = &self.progress {
            progress.set_position((t - self.t_start).max(0.0) as u64);
        }
        self.last_accepted_t = t;
        Ok(())
    }

    fn should_stop(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl fmt::Debug for SatelliteDynamics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SatelliteDynamics")
            .field("epoch_base", &self.epoch_base)
            .field("body", &self.body)
            .field("forces", &self.forces)
            .field("torques", &self.torques)
            .field("guidance", &self.guidance)
            .field("law_state", &self.law_state)
            .field("last_accepted_t", &self.last_accepted_t)
            .finish_non_exhaustive()
    }
}
