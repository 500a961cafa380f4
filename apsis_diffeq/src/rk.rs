use std::array;
use std::mem;

use crate::{
    Completion, OdeErrors, OdeModel,
    saving::MemoryResult,
    state::OdeState,
    stepping::{AdaptiveStepControl, FixedStepControl},
    tableau::ButcherTableau,
};

/// Step counters for one solve. Counters survive a failed solve, so callers
/// can report how far the integration got.
#[derive(Debug, Default, Clone, Copy)]
pub struct SolveStats {
    pub steps_accepted: u64,
    pub steps_rejected: u64,
}

/// Explicit Runge-Kutta stepper over a preallocated set of stage buffers.
/// Nothing allocates inside the step loop.
pub struct RungeKutta<State: OdeState, const STAGES: usize> {
    tableau: ButcherTableau<STAGES>,
    /// State at the start of the current step.
    x: State,
    /// Candidate solution from the propagating weights.
    y: State,
    /// Embedded lower-order candidate for the error estimate.
    y_hat: State,
    k: [State; STAGES],
    stage: State,
    scaled: State,
}

impl<State: OdeState, const STAGES: usize> RungeKutta<State, STAGES> {
    pub fn new(tableau: ButcherTableau<STAGES>) -> Self {
        Self {
            tableau,
            x: State::default(),
            y: State::default(),
            y_hat: State::default(),
            k: array::from_fn(|_| State::default()),
            stage: State::default(),
            scaled: State::default(),
        }
    }

    /// Integrates with a constant step size. Every step is accepted; the
    /// final step is shortened to land exactly on `tspan.1`. The initial
    /// state is recorded as the first storage entry.
    pub fn solve_fixed<Model: OdeModel<State = State>>(
        &mut self,
        model: &mut Model,
        x0: &State,
        tspan: (f64, f64),
        control: &FixedStepControl,
        storage: &mut MemoryResult<State>,
        stats: &mut SolveStats,
    ) -> Result<Completion, OdeErrors> {
        let (t0, tf) = tspan;
        if !(tf > t0) {
            return Err(OdeErrors::InvalidTspan { t_start: t0, t_end: tf });
        }
        if !(control.dt > 0.0 && control.dt.is_finite()) {
            return Err(OdeErrors::InvalidStepSize { dt: control.dt });
        }

        let mut t = t0;
        self.x.clone_from(x0);
        storage.push(t, &self.x);
        if model.should_stop() {
            return Ok(Completion::Stopped);
        }

        let tiny = 1e-12 * tf.abs().max(1.0);
        while tf - t > tiny {
            let h = control.dt.min(tf - t);
            self.eval_stages(model, t, h, false)?;
            t += h;
            if !self.y.is_finite() {
                return Err(OdeErrors::NonFiniteState { t });
            }
            model
                .accept_step(t, &mut self.y)
                .map_err(|error| OdeErrors::Model { t, error })?;
            stats.steps_accepted += 1;
            storage.push(t, &self.y);
            mem::swap(&mut self.x, &mut self.y);
            if model.should_stop() {
                return Ok(Completion::Stopped);
            }
        }
        Ok(Completion::Finished)
    }

    /// Integrates with embedded-pair step-size control. A trial step is
    /// accepted when the weighted RMS error norm is at most 1; otherwise the
    /// step is halved and retried without advancing time, without touching
    /// the model hook and without recording anything. Consecutive rejections
    /// of a single step are bounded by the controller.
    pub fn solve_adaptive<Model: OdeModel<State = State>>(
        &mut self,
        model: &mut Model,
        x0: &State,
        tspan: (f64, f64),
        control: &AdaptiveStepControl,
        storage: &mut MemoryResult<State>,
        stats: &mut SolveStats,
    ) -> Result<Completion, OdeErrors> {
        if !self.tableau.is_embedded() {
            return Err(OdeErrors::MethodNotEmbedded);
        }
        let (t0, tf) = tspan;
        if !(tf > t0) {
            return Err(OdeErrors::InvalidTspan { t_start: t0, t_end: tf });
        }

        let mut t = t0;
        self.x.clone_from(x0);
        storage.push(t, &self.x);
        if model.should_stop() {
            return Ok(Completion::Stopped);
        }

        let mut h = control.initial_dt.unwrap_or((tf - t0) / 100.0);
        if let Some(max_dt) = control.max_dt {
            h = h.min(max_dt);
        }
        if let Some(min_dt) = control.min_dt {
            h = h.max(min_dt);
        }
        if !(h > 0.0 && h.is_finite()) {
            return Err(OdeErrors::InvalidStepSize { dt: h });
        }

        let tiny = 1e-12 * tf.abs().max(1.0);
        while tf - t > tiny {
            let mut h_trial = h.min(tf - t);
            let mut rejections: u32 = 0;
            loop {
                self.eval_stages(model, t, h_trial, true)?;
                // an overflowed trial counts as a failed error check, not a
                // fatal state: shrinking the step may still recover
                let error = if self.y.is_finite() {
                    self.y
                        .error_norm(&self.x, &self.y_hat, control.rel_tol, control.abs_tol)
                } else {
                    f64::INFINITY
                };
                if error <= 1.0 {
                    t += h_trial;
                    model
                        .accept_step(t, &mut self.y)
                        .map_err(|error| OdeErrors::Model { t, error })?;
                    if !self.y.is_finite() {
                        return Err(OdeErrors::NonFiniteState { t });
                    }
                    stats.steps_accepted += 1;
                    storage.push(t, &self.y);
                    mem::swap(&mut self.x, &mut self.y);
                    h = control.next_dt(h_trial, error, self.tableau.order);
                    break;
                }
                stats.steps_rejected += 1;
                rejections += 1;
                if rejections > control.max_rejections {
                    return Err(OdeErrors::StepRejectionLimit { t, dt: h_trial, rejections });
                }
                h_trial = control.rejected_dt(h_trial);
            }
            if model.should_stop() {
                return Ok(Completion::Stopped);
            }
        }
        Ok(Completion::Finished)
    }

    /// Evaluates all stages from `self.x` at time `t` with step `h`, leaving
    /// the propagated candidate in `self.y` (and the embedded candidate in
    /// `self.y_hat` when requested).
    fn eval_stages<Model: OdeModel<State = State>>(
        &mut self,
        model: &mut Model,
        t: f64,
        h: f64,
        embedded: bool,
    ) -> Result<(), OdeErrors> {
        model
            .f(t, &self.x, &mut self.k[0])
            .map_err(|error| OdeErrors::Model { t, error })?;

        for s in 1..STAGES {
            self.stage.clone_from(&self.x);
            for i in 0..s {
                let a = self.tableau.a[s][i];
                if a == 0.0 {
                    continue;
                }
                self.scaled.clone_from(&self.k[i]);
                self.scaled *= a * h;
                self.stage += &self.scaled;
            }
            let ts = t + self.tableau.c[s] * h;
            model
                .f(ts, &self.stage, &mut self.k[s])
                .map_err(|error| OdeErrors::Model { t: ts, error })?;
        }

        self.y.clone_from(&self.x);
        for s in 0..STAGES {
            let b = self.tableau.b[s];
            if b == 0.0 {
                continue;
            }
            self.scaled.clone_from(&self.k[s]);
            self.scaled *= b * h;
            self.y += &self.scaled;
        }

        if embedded {
            if let Some(b2) = self.tableau.b2 {
                self.y_hat.clone_from(&self.x);
                for s in 0..STAGES {
                    if b2[s] == 0.0 {
                        continue;
                    }
                    self.scaled.clone_from(&self.k[s]);
                    self.scaled *= b2[s] * h;
                    self.y_hat += &self.scaled;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StateArray;
    use approx::assert_abs_diff_eq;
    use std::error::Error;

    /// dy/dt = -lambda * y
    #[derive(Debug)]
    struct Decay {
        lambda: f64,
    }

    impl OdeModel for Decay {
        type State = StateArray<1>;
        fn f(
            &mut self,
            _t: f64,
            state: &Self::State,
            derivative: &mut Self::State,
        ) -> Result<(), Box<dyn Error>> {
            derivative[0] = -self.lambda * state[0];
            Ok(())
        }
    }

    /// dy/dt = y^2 blows up in finite time; large fixed steps overflow.
    #[derive(Debug)]
    struct Quadratic;

    impl OdeModel for Quadratic {
        type State = StateArray<1>;
        fn f(
            &mut self,
            _t: f64,
            state: &Self::State,
            derivative: &mut Self::State,
        ) -> Result<(), Box<dyn Error>> {
            derivative[0] = state[0] * state[0];
            Ok(())
        }
    }

    #[derive(Debug)]
    struct StopsAtHalf {
        stop: bool,
    }

    impl OdeModel for StopsAtHalf {
        type State = StateArray<1>;
        fn f(
            &mut self,
            _t: f64,
            _state: &Self::State,
            derivative: &mut Self::State,
        ) -> Result<(), Box<dyn Error>> {
            derivative[0] = 1.0;
            Ok(())
        }
        fn accept_step(
            &mut self,
            t: f64,
            _state: &mut Self::State,
        ) -> Result<(), Box<dyn Error>> {
            if t >= 0.5 {
                self.stop = true;
            }
            Ok(())
        }
        fn should_stop(&self) -> bool {
            self.stop
        }
    }

    #[test]
    fn rk4_converges_on_exponential_decay() {
        let mut solver = RungeKutta::new(ButcherTableau::<4>::RK4);
        let mut storage = MemoryResult::new(128);
        let mut stats = SolveStats::default();
        let completion = solver
            .solve_fixed(
                &mut Decay { lambda: 1.0 },
                &StateArray::new([1.0]),
                (0.0, 1.0),
                &FixedStepControl::new(0.01),
                &mut storage,
                &mut stats,
            )
            .unwrap();
        assert_eq!(completion, Completion::Finished);
        let (t_end, y_end) = storage.last().unwrap();
        assert_abs_diff_eq!(t_end, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(y_end[0], (-1.0_f64).exp(), epsilon = 1e-8);
        assert_eq!(stats.steps_accepted, 100);
    }

    #[test]
    fn fixed_lands_exactly_on_span_end() {
        let mut solver = RungeKutta::new(ButcherTableau::<4>::RK4);
        let mut storage = MemoryResult::new(8);
        let mut stats = SolveStats::default();
        solver
            .solve_fixed(
                &mut Decay { lambda: 0.5 },
                &StateArray::new([2.0]),
                (0.0, 1.0),
                &FixedStepControl::new(0.3),
                &mut storage,
                &mut stats,
            )
            .unwrap();
        // 0.3, 0.3, 0.3 then a short 0.1 step
        assert_eq!(storage.len(), 5);
        let (t_end, _) = storage.last().unwrap();
        assert_abs_diff_eq!(t_end, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn adaptive_meets_tolerance_on_decay() {
        let mut solver = RungeKutta::new(ButcherTableau::<7>::DORMANDPRINCE45);
        let mut storage = MemoryResult::new(128);
        let mut stats = SolveStats::default();
        let control = AdaptiveStepControl::default()
            .with_rel_tol(1e-6)
            .with_abs_tol(1e-9);
        let completion = solver
            .solve_adaptive(
                &mut Decay { lambda: 1.0 },
                &StateArray::new([1.0]),
                (0.0, 1.0),
                &control,
                &mut storage,
                &mut stats,
            )
            .unwrap();
        assert_eq!(completion, Completion::Finished);
        let (t_end, y_end) = storage.last().unwrap();
        assert_abs_diff_eq!(t_end, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(y_end[0], (-1.0_f64).exp(), epsilon = 1e-6);
        assert!(stats.steps_accepted > 0);
    }

    #[test]
    fn divergence_keeps_prior_entries() {
        let mut solver = RungeKutta::new(ButcherTableau::<4>::RK4);
        let mut storage = MemoryResult::new(8);
        let mut stats = SolveStats::default();
        let err = solver
            .solve_fixed(
                &mut Quadratic,
                &StateArray::new([1.0]),
                (0.0, 20.0),
                &FixedStepControl::new(5.0),
                &mut storage,
                &mut stats,
            )
            .unwrap_err();
        assert!(matches!(err, OdeErrors::NonFiniteState { .. }));
        // initial entry plus the steps accepted before overflow
        assert!(storage.len() >= 2);
        for (_, y) in storage.iter() {
            assert!(y[0].is_finite());
        }
    }

    #[test]
    fn rejection_limit_escalates() {
        let mut solver = RungeKutta::new(ButcherTableau::<7>::DORMANDPRINCE45);
        let mut storage = MemoryResult::new(8);
        let mut stats = SolveStats::default();
        // impossible tolerance: every trial fails until the bound trips
        let control = AdaptiveStepControl::default()
            .with_rel_tol(1e-300)
            .with_abs_tol(1e-300);
        let err = solver
            .solve_adaptive(
                &mut Decay { lambda: 1.0 },
                &StateArray::new([1.0]),
                (0.0, 1.0),
                &control,
                &mut storage,
                &mut stats,
            )
            .unwrap_err();
        assert!(matches!(err, OdeErrors::StepRejectionLimit { .. }));
        assert_eq!(storage.len(), 1);
        assert_eq!(stats.steps_accepted, 0);
        assert!(stats.steps_rejected > control.max_rejections as u64);
    }

    #[test]
    fn model_stop_ends_run_at_step_boundary() {
        let mut solver = RungeKutta::new(ButcherTableau::<4>::RK4);
        let mut storage = MemoryResult::new(16);
        let mut stats = SolveStats::default();
        let completion = solver
            .solve_fixed(
                &mut StopsAtHalf { stop: false },
                &StateArray::new([0.0]),
                (0.0, 1.0),
                &FixedStepControl::new(0.1),
                &mut storage,
                &mut stats,
            )
            .unwrap();
        assert_eq!(completion, Completion::Stopped);
        let (t_end, _) = storage.last().unwrap();
        assert_abs_diff_eq!(t_end, 0.5, epsilon = 1e-9);
        assert_eq!(storage.len(), 6);
    }

    #[test]
    fn fixed_solve_is_bit_reproducible() {
        let run = || {
            let mut solver = RungeKutta::new(ButcherTableau::<4>::RK4);
            let mut storage = MemoryResult::new(64);
            let mut stats = SolveStats::default();
            solver
                .solve_fixed(
                    &mut Decay { lambda: 0.7 },
                    &StateArray::new([3.0]),
                    (0.0, 2.0),
                    &FixedStepControl::new(0.05),
                    &mut storage,
                    &mut stats,
                )
                .unwrap();
            storage
        };
        let a = run();
        let b = run();
        assert_eq!(a.times(), b.times());
        for (ya, yb) in a.states().iter().zip(b.states().iter()) {
            assert_eq!(ya[0].to_bits(), yb[0].to_bits());
        }
    }

    #[test]
    fn rejects_invalid_spans_and_steps() {
        let mut solver = RungeKutta::new(ButcherTableau::<4>::RK4);
        let mut storage = MemoryResult::new(4);
        let mut stats = SolveStats::default();
        assert!(matches!(
            solver.solve_fixed(
                &mut Decay { lambda: 1.0 },
                &StateArray::new([1.0]),
                (1.0, 0.0),
                &FixedStepControl::new(0.1),
                &mut storage,
                &mut stats,
            ),
            Err(OdeErrors::InvalidTspan { .. })
        ));
        assert!(matches!(
            solver.solve_fixed(
                &mut Decay { lambda: 1.0 },
                &StateArray::new([1.0]),
                (0.0, 1.0),
                &FixedStepControl::new(0.0),
                &mut storage,
                &mut stats,
            ),
            Err(OdeErrors::InvalidStepSize { .. })
        ));
    }

    #[test]
    fn adaptive_requires_embedded_tableau() {
        let mut solver = RungeKutta::new(ButcherTableau::<4>::RK4);
        let mut storage = MemoryResult::new(4);
        let mut stats = SolveStats::default();
        assert!(matches!(
            solver.solve_adaptive(
                &mut Decay { lambda: 1.0 },
                &StateArray::new([1.0]),
                (0.0, 1.0),
                &AdaptiveStepControl::default(),
                &mut storage,
                &mut stats,
            ),
            Err(OdeErrors::MethodNotEmbedded)
        ));
    }
}
