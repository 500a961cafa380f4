use std::{error::Error, fmt::Debug};

use thiserror::Error as ThisError;

pub mod rk;
pub mod saving;
pub mod state;
pub mod stepping;
pub mod tableau;

pub use rk::{RungeKutta, SolveStats};
pub use saving::MemoryResult;
pub use state::{OdeState, StateArray};
pub use stepping::{AdaptiveStepControl, FixedStepControl};
pub use tableau::ButcherTableau;

/// Trait for defining a dynamical system model that can be numerically
/// integrated.
///
/// Types implementing this trait define the derivative (RHS) of the ODE at a
/// given time and state. `f` must assign every component of `derivative`;
/// buffers are reused across evaluations.
pub trait OdeModel: Debug {
    type State: OdeState;

    /// Compute the derivative at time `t` and state `state`, storing the
    /// result in `derivative`.
    fn f(
        &mut self,
        t: f64,
        state: &Self::State,
        derivative: &mut Self::State,
    ) -> Result<(), Box<dyn Error>>;

    /// Called exactly once per accepted step, after acceptance and before the
    /// state is recorded. Rejected trial steps never reach this hook, so it
    /// is the one safe place for constraint projection (e.g. renormalizing an
    /// integrated quaternion) and for internal model state that must track
    /// accepted time only (controller memory, mode transitions).
    fn accept_step(
        &mut self,
        _t: f64,
        _state: &mut Self::State,
    ) -> Result<(), Box<dyn Error>> {
        Ok(())
    }

    /// Polled at step boundaries, after the accepted state is recorded.
    /// Returning `true` ends the run with `Completion::Stopped`.
    fn should_stop(&self) -> bool {
        false
    }
}

/// How a solve ended when no error occurred.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// Reached the end of the requested time span.
    Finished,
    /// The model requested a stop at a step boundary.
    Stopped,
}

#[derive(Debug, ThisError)]
pub enum OdeErrors {
    #[error("model evaluation failed at t = {t}: {error}")]
    Model { t: f64, error: Box<dyn Error> },
    #[error("state became non-finite at t = {t}")]
    NonFiniteState { t: f64 },
    #[error("step at t = {t} rejected {rejections} times (last dt = {dt:e})")]
    StepRejectionLimit { t: f64, dt: f64, rejections: u32 },
    #[error("time span end {t_end} must be greater than start {t_start}")]
    InvalidTspan { t_start: f64, t_end: f64 },
    #[error("step size must be positive and finite, got {dt}")]
    InvalidStepSize { dt: f64 },
    #[error("tableau has no embedded error estimate; use solve_fixed")]
    MethodNotEmbedded,
}
