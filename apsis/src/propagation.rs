use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use apsis_diffeq::{
    AdaptiveStepControl, ButcherTableau, Completion, FixedStepControl, MemoryResult, OdeErrors,
    RungeKutta, SolveStats,
};
use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use satellite::SatelliteState;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::DynamicsErrors;
use crate::dynamics::SatelliteDynamics;
use crate::ephemeris::Ephemeris;

/// Shared abort flag checked at step boundaries. Clone it, hand one side to
/// the dynamics and keep the other; `cancel` from any thread ends the run
/// after the step in flight.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Integrator selection. The fixed 0.1 s RK4 default matches the step the
/// attitude dynamics were tuned at; Dormand-Prince trades reproducible step
/// placement for error control.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum IntegrationMethod {
    Rk4 { dt: f64 },
    DormandPrince45 { control: AdaptiveStepControl },
}

impl Default for IntegrationMethod {
    fn default() -> Self {
        IntegrationMethod::Rk4 { dt: 0.1 }
    }
}

/// Why a run ended. Every variant leaves the ephemeris intact up to the last
/// accepted step.
#[derive(Debug)]
pub enum TerminationReason {
    /// Reached the requested end of the span.
    Completed,
    /// A model was evaluated outside its validity domain. Not retried; the
    /// position is the last accepted one.
    DomainError {
        t: f64,
        position: Vector3<f64>,
        source: DynamicsErrors,
    },
    /// Non-finite state or the bounded rejection count was exceeded.
    Diverged { t: f64 },
    /// The cancel token fired.
    Cancelled { t: f64 },
}

impl TerminationReason {
    pub fn is_completed(&self) -> bool {
        matches!(self, TerminationReason::Completed)
    }
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TerminationReason::Completed => write!(f, "completed"),
            TerminationReason::DomainError { t, position, source } => write!(
                f,
                "domain error at t = {t:.3} s (|r| = {:.1} km): {source}",
                position.norm() / 1e3
            ),
            TerminationReason::Diverged { t } => {
                write!(f, "integration diverged at t = {t:.3} s")
            }
            TerminationReason::Cancelled { t } => write!(f, "cancelled at t = {t:.3} s"),
        }
    }
}

/// Accounting for one propagation.
#[derive(Debug)]
pub struct RunSummary {
    pub started: DateTime<Utc>,
    pub finished: DateTime<Utc>,
    pub t_start: f64,
    pub t_end_requested: f64,
    pub t_end_reached: f64,
    pub steps_accepted: u64,
    pub steps_rejected: u64,
    pub termination: TerminationReason,
}

#[derive(Debug)]
pub struct PropagationOutput {
    pub ephemeris: Ephemeris,
    pub summary: RunSummary,
}

/// Failures before the first step: the run never started and there is no
/// partial output to report.
#[derive(Debug, Error)]
pub enum PropagationErrors {
    #[error("{0}")]
    Setup(OdeErrors),
}

/// Drives a [`SatelliteDynamics`] model over a time span and turns the raw
/// solver storage into an [`Ephemeris`] plus a [`RunSummary`].
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Propagator {
    pub method: IntegrationMethod,
}

impl Propagator {
    pub fn new(method: IntegrationMethod) -> Self {
        Self { method }
    }

    /// Integrates from `tspan.0` to `tspan.1` (seconds past the model's
    /// epoch base). The model's control state is rewound to `tspan.0` first,
    /// so back-to-back calls with the same inputs reproduce the same
    /// trajectory bit for bit under the fixed-step method.
    pub fn propagate(
        &self,
        dynamics: &mut SatelliteDynamics,
        initial: &SatelliteState,
        tspan: (f64, f64),
    ) -> Result<PropagationOutput, PropagationErrors> {
        let started = Utc::now();
        let (t_start, t_end) = tspan;
        dynamics.reset(t_start);

        let x0 = initial.to_array();
        let mut storage = MemoryResult::new(self.capacity_hint(t_end - t_start));
        let mut stats = SolveStats::default();
        let result = match &self.method {
            IntegrationMethod::Rk4 { dt } => {
                let mut solver = RungeKutta::new(ButcherTableau::<4>::RK4);
                solver.solve_fixed(
                    dynamics,
                    &x0,
                    tspan,
                    &FixedStepControl::new(*dt),
                    &mut storage,
                    &mut stats,
                )
            }
            IntegrationMethod::DormandPrince45 { control } => {
                let mut solver = RungeKutta::new(ButcherTableau::<7>::DORMANDPRINCE45);
                solver.solve_adaptive(dynamics, &x0, tspan, control, &mut storage, &mut stats)
            }
        };

        let epoch_base = dynamics.epoch_base();
        let mut ephemeris =
            Ephemeris::with_capacity(epoch_base + t_start, storage.len());
        for (t, state) in storage.iter() {
            ephemeris.push(SatelliteState::from_array(epoch_base, t, state));
        }
        let t_end_reached = storage.last().map_or(t_start, |(t, _)| t);

        let termination = match result {
            Ok(Completion::Finished) => TerminationReason::Completed,
            Ok(Completion::Stopped) => TerminationReason::Cancelled { t: t_end_reached },
            Err(OdeErrors::Model { t, error }) => match error.downcast::<DynamicsErrors>() {
                Ok(source) => TerminationReason::DomainError {
                    t,
                    position: ephemeris
                        .last()
                        .map_or(initial.position, |state| state.position),
                    source: *source,
                },
                Err(_) => TerminationReason::Diverged { t },
            },
            Err(OdeErrors::NonFiniteState { t }) => TerminationReason::Diverged { t },
            Err(OdeErrors::StepRejectionLimit { t, .. }) => TerminationReason::Diverged { t },
            Err(error) => return Err(PropagationErrors::Setup(error)),
        };

        Ok(PropagationOutput {
            ephemeris,
            summary: RunSummary {
                started,
                finished: Utc::now(),
                t_start,
                t_end_requested: t_end,
                t_end_reached,
                steps_accepted: stats.steps_accepted,
                steps_rejected: stats.steps_rejected,
                termination,
            },
        })
    }

    fn capacity_hint(&self, span: f64) -> usize {
        match &self.method {
            IntegrationMethod::Rk4 { dt } if *dt > 0.0 && dt.is_finite() && span > 0.0 => {
                (span / dt).ceil() as usize + 1
            }
            _ => 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forces::{DragForce, Force, GravityForce};
    use crate::guidance::{DynamicGuidance, Guidance};
    use crate::torques::law::{
        ControlPolicy, PdController, PhaseSpec, TorqueLaw, TransitionCondition,
    };
    use crate::torques::Torque;
    use approx::{assert_abs_diff_eq, assert_relative_eq};
    use atmosphere::{Atmosphere, HarrisPriester};
    use celestial::CelestialBodies;
    use gravity::{Gravity, NewtonianGravity};
    use nalgebra::UnitQuaternion;
    use satellite::SatelliteBody;
    use time::Epoch;

    fn circular_initial(altitude: f64) -> SatelliteState {
        let radius = CelestialBodies::Earth.radius() + altitude;
        let speed = (CelestialBodies::Earth.mu() / radius).sqrt();
        SatelliteState::new(
            Epoch::J2000,
            Vector3::new(radius, 0.0, 0.0),
            Vector3::new(0.0, speed, 0.0),
            UnitQuaternion::identity(),
            Vector3::zeros(),
        )
    }

    fn two_body_dynamics(torques: Vec<Torque>) -> SatelliteDynamics {
        SatelliteDynamics::new(
            Epoch::J2000,
            SatelliteBody::default(),
            vec![Force::Gravity(GravityForce::new(Gravity::Newtonian(
                NewtonianGravity::new(CelestialBodies::Earth.mu()),
            )))],
            torques,
            Guidance::Dynamic(DynamicGuidance::default()),
        )
        .unwrap()
    }

    #[test]
    fn completes_and_records_every_step() {
        let mut dynamics = two_body_dynamics(vec![]);
        let initial = circular_initial(500e3);
        let output = Propagator::new(IntegrationMethod::Rk4 { dt: 0.1 })
            .propagate(&mut dynamics, &initial, (0.0, 10.0))
            .unwrap();
        assert!(output.summary.termination.is_completed());
        assert_eq!(output.summary.steps_accepted, 100);
        // initial entry plus one per accepted step
        assert_eq!(output.ephemeris.len(), 101);
        assert_abs_diff_eq!(output.summary.t_end_reached, 10.0, epsilon = 1e-9);
        assert!(output.summary.finished >= output.summary.started);
    }

    #[test]
    fn attitude_stays_unit_norm_through_a_run() {
        let mut dynamics = two_body_dynamics(vec![]);
        let mut initial = circular_initial(500e3);
        initial.spin = Vector3::new(0.4, -0.2, 0.3);
        let output = Propagator::new(IntegrationMethod::Rk4 { dt: 0.1 })
            .propagate(&mut dynamics, &initial, (0.0, 60.0))
            .unwrap();
        for entry in output.ephemeris.iter() {
            assert_abs_diff_eq!(entry.attitude.into_inner().norm(), 1.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn zero_spin_without_torques_holds_the_attitude() {
        let mut dynamics = two_body_dynamics(vec![]);
        let initial = circular_initial(500e3);
        let output = Propagator::new(IntegrationMethod::Rk4 { dt: 0.1 })
            .propagate(&mut dynamics, &initial, (0.0, 30.0))
            .unwrap();
        for entry in output.ephemeris.iter() {
            assert!(entry.attitude.angle_to(&initial.attitude) < 1e-12);
            assert_abs_diff_eq!(entry.spin.norm(), 0.0);
        }
    }

    #[test]
    fn two_body_energy_and_momentum_hold_over_an_orbit() {
        let mu = CelestialBodies::Earth.mu();
        let mut dynamics = two_body_dynamics(vec![]);
        let initial = circular_initial(500e3);
        let radius = CelestialBodies::Earth.radius() + 500e3;
        let period = std::f64::consts::TAU * (radius.powi(3) / mu).sqrt();
        let output = Propagator::new(IntegrationMethod::Rk4 { dt: 1.0 })
            .propagate(&mut dynamics, &initial, (0.0, period))
            .unwrap();
        let first = &output.ephemeris[0];
        let last = output.ephemeris.last().unwrap();
        assert_relative_eq!(last.energy(mu), first.energy(mu), max_relative = 1e-9);
        assert_relative_eq!(
            last.angular_momentum().norm(),
            first.angular_momentum().norm(),
            max_relative = 1e-9
        );
        // periodicity: back to the starting point within meters
        assert_abs_diff_eq!(
            (last.position - first.position).norm(),
            0.0,
            epsilon = 10.0
        );
    }

    #[test]
    fn torque_free_spin_magnitude_is_constant() {
        let mut dynamics = two_body_dynamics(vec![]);
        let mut initial = circular_initial(500e3);
        initial.spin = Vector3::new(0.05, 0.02, -0.04);
        let output = Propagator::new(IntegrationMethod::Rk4 { dt: 0.1 })
            .propagate(&mut dynamics, &initial, (0.0, 120.0))
            .unwrap();
        let expected = initial.spin.norm();
        for entry in output.ephemeris.iter() {
            assert_relative_eq!(entry.spin.norm(), expected, max_relative = 1e-6);
        }
    }

    #[test]
    fn fixed_step_runs_are_bit_identical() {
        let initial = circular_initial(500e3);
        let propagator = Propagator::new(IntegrationMethod::Rk4 { dt: 0.1 });
        let mut dynamics = two_body_dynamics(vec![]);
        let a = propagator
            .propagate(&mut dynamics, &initial, (0.0, 30.0))
            .unwrap();
        let b = propagator
            .propagate(&mut dynamics, &initial, (0.0, 30.0))
            .unwrap();
        assert_eq!(a.ephemeris.len(), b.ephemeris.len());
        for (x, y) in a.ephemeris.iter().zip(b.ephemeris.iter()) {
            assert_eq!(x.position.x.to_bits(), y.position.x.to_bits());
            assert_eq!(x.position.y.to_bits(), y.position.y.to_bits());
            assert_eq!(x.position.z.to_bits(), y.position.z.to_bits());
            assert_eq!(x.spin.x.to_bits(), y.spin.x.to_bits());
        }
    }

    #[test]
    fn adaptive_method_completes_with_error_control() {
        let mut dynamics = two_body_dynamics(vec![]);
        let initial = circular_initial(500e3);
        let control = AdaptiveStepControl::default()
            .with_rel_tol(1e-9)
            .with_abs_tol(1e-6)
            .with_initial_dt(1.0);
        let output = Propagator::new(IntegrationMethod::DormandPrince45 { control })
            .propagate(&mut dynamics, &initial, (0.0, 600.0))
            .unwrap();
        assert!(output.summary.termination.is_completed());
        assert_abs_diff_eq!(output.summary.t_end_reached, 600.0, epsilon = 1e-9);
        let mu = CelestialBodies::Earth.mu();
        let drift = (output.ephemeris.last().unwrap().energy(mu)
            - output.ephemeris[0].energy(mu))
        .abs();
        assert!(drift / output.ephemeris[0].energy(mu).abs() < 1e-6);
    }

    #[test]
    fn drag_below_the_atmosphere_floor_is_a_domain_error() {
        let mut dynamics = SatelliteDynamics::new(
            Epoch::J2000,
            SatelliteBody::default(),
            vec![
                Force::Gravity(GravityForce::new(Gravity::Newtonian(
                    NewtonianGravity::new(CelestialBodies::Earth.mu()),
                ))),
                Force::Drag(DragForce::new(Atmosphere::HarrisPriester(
                    HarrisPriester::new(CelestialBodies::Earth.radius()),
                ))),
            ],
            vec![],
            Guidance::Dynamic(DynamicGuidance::default()),
        )
        .unwrap();
        // 50 km is far below the density table
        let initial = circular_initial(50e3);
        let output = Propagator::new(IntegrationMethod::Rk4 { dt: 0.1 })
            .propagate(&mut dynamics, &initial, (0.0, 10.0))
            .unwrap();
        match &output.summary.termination {
            TerminationReason::DomainError { t, position, source } => {
                assert_abs_diff_eq!(*t, 0.0, epsilon = 1e-12);
                assert_relative_eq!(
                    position.norm(),
                    initial.position.norm(),
                    max_relative = 1e-12
                );
                assert!(matches!(source, DynamicsErrors::Atmosphere(_)));
            }
            other => panic!("expected a domain error, got {other:?}"),
        }
        // the initial accepted entry survives the failure
        assert_eq!(output.ephemeris.len(), 1);
    }

    #[test]
    fn non_finite_state_reports_divergence_and_keeps_entries() {
        let mut dynamics = two_body_dynamics(vec![]);
        let mut initial = circular_initial(500e3);
        initial.velocity.x = f64::NAN;
        let output = Propagator::new(IntegrationMethod::Rk4 { dt: 0.1 })
            .propagate(&mut dynamics, &initial, (0.0, 10.0))
            .unwrap();
        assert!(matches!(
            output.summary.termination,
            TerminationReason::Diverged { .. }
        ));
        assert_eq!(output.ephemeris.len(), 1);
    }

    #[test]
    fn cancellation_keeps_the_partial_ephemeris() {
        let cancel = CancelToken::new();
        let mut dynamics = two_body_dynamics(vec![]).with_cancel(cancel.clone());
        let initial = circular_initial(500e3);
        cancel.cancel();
        let output = Propagator::new(IntegrationMethod::Rk4 { dt: 0.1 })
            .propagate(&mut dynamics, &initial, (0.0, 10.0))
            .unwrap();
        match output.summary.termination {
            TerminationReason::Cancelled { t } => {
                assert_abs_diff_eq!(t, 0.0, epsilon = 1e-12)
            }
            ref other => panic!("expected cancellation, got {other:?}"),
        }
        assert_eq!(output.ephemeris.len(), 1);
    }

    #[test]
    fn invalid_span_is_a_setup_error() {
        let mut dynamics = two_body_dynamics(vec![]);
        let initial = circular_initial(500e3);
        let result = Propagator::new(IntegrationMethod::Rk4 { dt: 0.1 }).propagate(
            &mut dynamics,
            &initial,
            (10.0, 0.0),
        );
        assert!(matches!(
            result,
            Err(PropagationErrors::Setup(OdeErrors::InvalidTspan { .. }))
        ));
    }

    #[test]
    fn detumble_then_point_converges_on_the_target() {
        let law = TorqueLaw::new(vec![
            PhaseSpec::new(
                "detumble",
                ControlPolicy::RateDamping { gain: 0.1 },
                Some(TransitionCondition::SpinBelow { threshold: 0.01 }),
            ),
            PhaseSpec::new("point", ControlPolicy::Pd(PdController::default()), None),
        ]);
        let mut dynamics = two_body_dynamics(vec![Torque::Law(law)]);
        let mut initial = circular_initial(500e3);
        initial.attitude = UnitQuaternion::from_axis_angle(&Vector3::y_axis(), 0.5);
        initial.spin = Vector3::new(0.08, -0.05, 0.06);
        let output = Propagator::new(IntegrationMethod::Rk4 { dt: 0.1 })
            .propagate(&mut dynamics, &initial, (0.0, 600.0))
            .unwrap();
        assert!(output.summary.termination.is_completed());
        // ends in the pointing phase with a small residual error
        assert_eq!(dynamics.law_state().phase_index, 1);
        let last = output.ephemeris.last().unwrap();
        assert!(last.attitude.angle_to(&UnitQuaternion::identity()) < 0.05);
        assert!(last.spin.norm() < 0.01);
    }

    #[test]
    fn phase_index_never_regresses_and_reaches_terminal() {
        let law = TorqueLaw::new(vec![
            PhaseSpec::new(
                "first",
                ControlPolicy::RateDamping { gain: 0.2 },
                Some(TransitionCondition::SpinBelow { threshold: 0.02 }),
            ),
            PhaseSpec::new(
                "second",
                ControlPolicy::Idle,
                Some(TransitionCondition::ElapsedInPhase { duration: 5.0 }),
            ),
            PhaseSpec::new("third", ControlPolicy::Idle, None),
        ]);
        let mut dynamics = two_body_dynamics(vec![Torque::Law(law)]);
        let mut initial = circular_initial(500e3);
        initial.spin = Vector3::new(0.1, 0.0, 0.0);

        // march in short windows without resetting between them, so the
        // index is observable at every window boundary
        dynamics.reset(0.0);
        let mut solver = RungeKutta::new(ButcherTableau::<4>::RK4);
        let mut stats = SolveStats::default();
        let mut x = initial.to_array();
        let mut previous = 0;
        for window in 0..24 {
            let t0 = window as f64 * 5.0;
            let mut storage = MemoryResult::new(16);
            solver
                .solve_fixed(
                    &mut dynamics,
                    &x,
                    (t0, t0 + 5.0),
                    &FixedStepControl::new(0.5),
                    &mut storage,
                    &mut stats,
                )
                .unwrap();
            let (_, last) = storage.last().unwrap();
            x = *last;
            let index = dynamics.law_state().phase_index;
            assert!(index >= previous);
            previous = index;
        }
        assert_eq!(previous, 2);
    }
}
