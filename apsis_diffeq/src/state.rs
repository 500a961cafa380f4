use std::{
    fmt::Debug,
    ops::{AddAssign, Deref, DerefMut, MulAssign},
};

/// Trait representing an integrable state for use in the ODE solvers.
///
/// The in-place arithmetic bounds let the stepper combine stages without
/// allocating. `error_norm` is the weighted RMS norm used for adaptive step
/// acceptance: a candidate passes when the norm is at most 1.
pub trait OdeState: Clone + Debug + Default + MulAssign<f64> + 'static
where
    for<'a> Self: AddAssign<&'a Self>,
{
    /// Number of scalar components.
    fn len(&self) -> usize;

    /// True when every component is finite.
    fn is_finite(&self) -> bool;

    /// Weighted RMS error of this candidate state against the embedded
    /// estimate. Each component is scaled by `abs_tol + rel_tol * max(|y0|,
    /// |y|)` where `y0` is the state at the start of the step.
    fn error_norm(&self, prev: &Self, embedded: &Self, rel_tol: f64, abs_tol: f64) -> f64;
}

/// A fixed-size state vector with `N` f64 components.
#[derive(Clone, Copy, Debug)]
pub struct StateArray<const N: usize>([f64; N]);

impl<const N: usize> StateArray<N> {
    pub fn new(array: [f64; N]) -> Self {
        Self(array)
    }
}

impl<const N: usize> Default for StateArray<N> {
    fn default() -> Self {
        Self([0.0; N])
    }
}

impl<const N: usize> From<[f64; N]> for StateArray<N> {
    fn from(array: [f64; N]) -> Self {
        Self(array)
    }
}

impl<const N: usize> AddAssign<&Self> for StateArray<N> {
    fn add_assign(&mut self, rhs: &Self) {
        for i in 0..N {
            self.0[i] += rhs.0[i];
        }
    }
}

impl<const N: usize> MulAssign<f64> for StateArray<N> {
    fn mul_assign(&mut self, rhs: f64) {
        for i in 0..N {
            self.0[i] *= rhs;
        }
    }
}

impl<const N: usize> Deref for StateArray<N> {
    type Target = [f64; N];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<const N: usize> DerefMut for StateArray<N> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<const N: usize> OdeState for StateArray<N> {
    fn len(&self) -> usize {
        N
    }

    fn is_finite(&self) -> bool {
        self.0.iter().all(|x| x.is_finite())
    }

    fn error_norm(&self, prev: &Self, embedded: &Self, rel_tol: f64, abs_tol: f64) -> f64 {
        if N == 0 {
            return 0.0;
        }
        let mut sum_squared = 0.0;
        for i in 0..N {
            let scale = abs_tol + rel_tol * prev.0[i].abs().max(self.0[i].abs());
            let error = (self.0[i] - embedded.0[i]) / scale;
            sum_squared += error * error;
        }
        (sum_squared / N as f64).sqrt()
    }
}
