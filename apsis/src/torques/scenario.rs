use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// One scripted torque pulse: a direction applied from `start` for
/// `duration` seconds of run time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorqueStep {
    pub start: f64,
    pub duration: f64,
    pub torque: Vector3<f64>,
}

impl TorqueStep {
    pub fn new(start: f64, duration: f64, torque: Vector3<f64>) -> Self {
        Self { start, duration, torque }
    }

    fn active_at(&self, t: f64) -> bool {
        self.start <= t && t < self.start + self.duration
    }
}

/// Open-loop magnetorquer-style torque script: on/off pulses at a fixed
/// maximum intensity. Overlapping steps sum, so a script can superpose
/// pulses on different axes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TorqueScenario {
    pub steps: Vec<TorqueStep>,
    /// Scale applied to every step vector, N·m.
    pub max_intensity: f64,
}

impl TorqueScenario {
    pub fn new(steps: Vec<TorqueStep>, max_intensity: f64) -> Self {
        Self { steps, max_intensity }
    }

    /// Spin-up, spin-down, then a diagonal push-pull pair. Handy as a
    /// dynamics checkout scenario: the satellite should end close to its
    /// initial spin.
    pub fn demo() -> Self {
        let diagonal = Vector3::new(1.0, 1.0, 1.0).normalize();
        Self::new(
            vec![
                TorqueStep::new(1.0, 20.0, Vector3::x()),
                TorqueStep::new(25.0, 20.0, -Vector3::x()),
                TorqueStep::new(50.0, 10.0, diagonal),
                TorqueStep::new(65.0, 10.0, -diagonal),
            ],
            1e-4,
        )
    }

    /// Sum of all steps active at `t`, zero outside every step.
    pub fn torque(&self, t: f64) -> Vector3<f64> {
        let mut total = Vector3::zeros();
        for step in &self.steps {
            if step.active_at(t) {
                total += self.max_intensity * step.torque;
            }
        }
        total
    }
}
