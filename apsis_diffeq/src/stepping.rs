use serde::{Deserialize, Serialize};

/// Fixed-step control. Every step is accepted; the final step is shortened
/// to land exactly on the end of the span.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FixedStepControl {
    pub dt: f64,
}

impl FixedStepControl {
    pub fn new(dt: f64) -> Self {
        Self { dt }
    }
}

/// Adaptive step-size control for embedded Runge-Kutta pairs.
///
/// Acceptance uses the weighted RMS error norm from [`crate::OdeState`]: a
/// step passes when the norm is at most 1. Rejected steps halve `dt` and
/// retry without advancing time; a single step may be rejected at most
/// `max_rejections` times before the solve fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AdaptiveStepControl {
    pub rel_tol: f64,
    pub abs_tol: f64,
    /// Starting step size. Defaults to 1/100 of the span when unset.
    pub initial_dt: Option<f64>,
    pub min_dt: Option<f64>,
    pub max_dt: Option<f64>,
    pub max_rejections: u32,
}

impl Default for AdaptiveStepControl {
    fn default() -> Self {
        Self {
            rel_tol: 1e-3,
            abs_tol: 1e-6,
            initial_dt: None,
            min_dt: None,
            max_dt: None,
            max_rejections: 16,
        }
    }
}

impl AdaptiveStepControl {
    /// Largest allowed growth of dt from one accepted step to the next.
    const MAX_GROWTH: f64 = 5.0;

    pub fn with_rel_tol(mut self, rel_tol: f64) -> Self {
        self.rel_tol = rel_tol;
        self
    }

    pub fn with_abs_tol(mut self, abs_tol: f64) -> Self {
        self.abs_tol = abs_tol;
        self
    }

    pub fn with_initial_dt(mut self, dt: f64) -> Self {
        self.initial_dt = Some(dt);
        self
    }

    pub fn with_min_dt(mut self, min_dt: f64) -> Self {
        self.min_dt = Some(min_dt);
        self
    }

    pub fn with_max_dt(mut self, max_dt: f64) -> Self {
        self.max_dt = Some(max_dt);
        self
    }

    pub fn with_max_rejections(mut self, max_rejections: u32) -> Self {
        self.max_rejections = max_rejections;
        self
    }

    /// Proposes the step size after an accepted step with normalized error
    /// `error`, for a method of the given order.
    pub fn next_dt(&self, dt: f64, error: f64, order: usize) -> f64 {
        let error = error.max(1e-14);
        let factor = 0.9 * (1.0 / error).powf(1.0 / order as f64);
        self.clamp(dt * factor.min(Self::MAX_GROWTH))
    }

    /// Step size to retry with after a rejection.
    pub fn rejected_dt(&self, dt: f64) -> f64 {
        self.clamp(0.5 * dt)
    }

    fn clamp(&self, dt: f64) -> f64 {
        let mut dt = dt;
        if let Some(min_dt) = self.min_dt {
            dt = dt.max(min_dt);
        }
        if let Some(max_dt) = self.max_dt {
            dt = dt.min(max_dt);
        }
        dt
    }
}
