use apsis_diffeq::state::StateArray;
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use time::Epoch;

/// Full rigid-body state of the satellite: translation in the Earth
/// centered inertial frame, attitude as the body to inertial rotation,
/// spin as body-frame angular velocity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SatelliteState {
    pub epoch: Epoch,
    /// ECI position, m.
    pub position: Vector3<f64>,
    /// ECI velocity, m/s.
    pub velocity: Vector3<f64>,
    /// Body to ECI rotation.
    pub attitude: UnitQuaternion<f64>,
    /// Body-frame angular velocity, rad/s.
    pub spin: Vector3<f64>,
}

impl SatelliteState {
    pub fn new(
        epoch: Epoch,
        position: Vector3<f64>,
        velocity: Vector3<f64>,
        attitude: UnitQuaternion<f64>,
        spin: Vector3<f64>,
    ) -> Self {
        Self {
            epoch,
            position,
            velocity,
            attitude,
            spin,
        }
    }

    /// Packs the state for integration: [r(3), v(3), q(w,x,y,z), w(3)].
    pub fn to_array(&self) -> StateArray<13> {
        let q = self.attitude.quaternion();
        StateArray::new([
            self.position.x,
            self.position.y,
            self.position.z,
            self.velocity.x,
            self.velocity.y,
            self.velocity.z,
            q.w,
            q.i,
            q.j,
            q.k,
            self.spin.x,
            self.spin.y,
            self.spin.z,
        ])
    }

    /// Rebuilds a state from the packed array at `t` seconds past
    /// `epoch_base`. The attitude quaternion is normalized on the way in,
    /// so integrator drift never leaks out of the packed representation.
    pub fn from_array(epoch_base: Epoch, t: f64, array: &StateArray<13>) -> Self {
        let q = Quaternion::new(array[6], array[7], array[8], array[9]);
        Self {
            epoch: epoch_base + t,
            position: Vector3::new(array[0], array[1], array[2]),
            velocity: Vector3::new(array[3], array[4], array[5]),
            attitude: UnitQuaternion::from_quaternion(q),
            spin: Vector3::new(array[10], array[11], array[12]),
        }
    }

    /// Specific orbital energy v^2/2 - mu/r, J/kg.
    pub fn energy(&self, mu: f64) -> f64 {
        self.velocity.norm_squared() / 2.0 - mu / self.position.norm()
    }

    /// Specific orbital angular momentum r x v, m^2/s.
    pub fn angular_momentum(&self) -> Vector3<f64> {
        self.position.cross(&self.velocity)
    }
}

/// Renormalizes the attitude quaternion inside a packed state. Left
/// untouched at zero norm; the integrator's finiteness check reports that
/// case as divergence.
pub fn renormalize_attitude(array: &mut StateArray<13>) {
    let norm = (array[6] * array[6]
        + array[7] * array[7]
        + array[8] * array[8]
        + array[9] * array[9])
        .sqrt();
    if norm > 0.0 {
        for component in &mut array[6..10] {
            *component /= norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    fn example_state() -> SatelliteState {
        SatelliteState::new(
            Epoch::J2000,
            Vector3::new(7e6, 1e5, -2e5),
            Vector3::new(10.0, 7.5e3, 1.0),
            UnitQuaternion::from_euler_angles(0.1, -0.2, 0.3),
            Vector3::new(0.01, -0.02, 0.03),
        )
    }

    #[test]
    fn pack_unpack_round_trip() {
        let state = example_state();
        let array = state.to_array();
        let back = SatelliteState::from_array(Epoch::J2000, 0.0, &array);

        assert_abs_diff_eq!(state.position, back.position, epsilon = 1e-12);
        assert_abs_diff_eq!(state.velocity, back.velocity, epsilon = 1e-12);
        assert_abs_diff_eq!(state.spin, back.spin, epsilon = 1e-12);
        assert!(state.attitude.angle_to(&back.attitude) < 1e-12);
    }

    #[test]
    fn unpack_normalizes_a_drifted_quaternion() {
        let mut array = example_state().to_array();
        for component in &mut array[6..10] {
            *component *= 1.001;
        }
        let state = SatelliteState::from_array(Epoch::J2000, 0.0, &array);
        assert_abs_diff_eq!(state.attitude.norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn renormalize_restores_unit_norm_in_place() {
        let mut array = example_state().to_array();
        for component in &mut array[6..10] {
            *component *= 0.98;
        }
        renormalize_attitude(&mut array);
        let norm = (array[6] * array[6]
            + array[7] * array[7]
            + array[8] * array[8]
            + array[9] * array[9])
            .sqrt();
        assert_abs_diff_eq!(norm, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn unpack_offsets_the_epoch() {
        let array = example_state().to_array();
        let state = SatelliteState::from_array(Epoch::J2000, 120.5, &array);
        assert_abs_diff_eq!(state.epoch.seconds_j2000(), 120.5, epsilon = 1e-12);
    }

    #[test]
    fn circular_orbit_energy_and_momentum() {
        let mu: f64 = 3.986004415e14;
        let r = 7e6;
        let v = (mu / r).sqrt();
        let state = SatelliteState::new(
            Epoch::J2000,
            Vector3::new(r, 0.0, 0.0),
            Vector3::new(0.0, v, 0.0),
            UnitQuaternion::identity(),
            Vector3::zeros(),
        );
        assert_relative_eq!(state.energy(mu), -mu / (2.0 * r), max_relative = 1e-12);
        let h = state.angular_momentum();
        assert_relative_eq!(h.z, r * v, max_relative = 1e-12);
        assert_abs_diff_eq!(h.x, 0.0);
        assert_abs_diff_eq!(h.y, 0.0);
    }
}
