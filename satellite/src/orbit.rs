use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Classical orbital elements of an elliptic orbit. Lengths in meters,
/// angles in radians.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeplerianElements {
    pub semimajor_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub raan: f64,
    pub argument_of_periapsis: f64,
    pub true_anomaly: f64,
}

impl KeplerianElements {
    /// Cutoff below which the circular/equatorial degeneracies kick in.
    const ORBIT_EPSILON: f64 = 1e-8;

    pub fn new(
        semimajor_axis: f64,
        eccentricity: f64,
        inclination: f64,
        raan: f64,
        argument_of_periapsis: f64,
        true_anomaly: f64,
    ) -> Self {
        Self {
            semimajor_axis,
            eccentricity,
            inclination,
            raan,
            argument_of_periapsis,
            true_anomaly,
        }
    }

    /// Orbital period, s.
    pub fn period(&self, mu: f64) -> f64 {
        TAU * (self.semimajor_axis.powi(3) / mu).sqrt()
    }

    /// Inertial position (m) and velocity (m/s): perifocal coordinates
    /// rotated through RAAN, inclination, argument of periapsis.
    pub fn to_rv(&self, mu: f64) -> (Vector3<f64>, Vector3<f64>) {
        let e = self.eccentricity;
        let p = self.semimajor_axis * (1.0 - e * e);
        let (sin_nu, cos_nu) = self.true_anomaly.sin_cos();

        let r = p / (1.0 + e * cos_nu);
        let r_pqw = Vector3::new(r * cos_nu, r * sin_nu, 0.0);

        let scale = (mu / p).sqrt();
        let v_pqw = Vector3::new(-scale * sin_nu, scale * (e + cos_nu), 0.0);

        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), self.raan)
            * Rotation3::from_axis_angle(&Vector3::x_axis(), self.inclination)
            * Rotation3::from_axis_angle(&Vector3::z_axis(), self.argument_of_periapsis);

        (rotation * r_pqw, rotation * v_pqw)
    }

    /// Extracts elements from an inertial state with the usual quadrant
    /// checks. For circular orbits the anomaly is the argument of
    /// latitude (periapsis undefined, reported as zero); for equatorial
    /// orbits RAAN is reported as zero and angles are measured from +x.
    /// Assumes an elliptic orbit.
    pub fn from_rv(mu: f64, position: &Vector3<f64>, velocity: &Vector3<f64>) -> Self {
        let r = position.norm();
        let v2 = velocity.norm_squared();
        let rdotv = position.dot(velocity);

        let h = position.cross(velocity);
        let node = Vector3::z().cross(&h);
        let nm = node.norm();

        let e_vec = ((v2 - mu / r) * position - rdotv * velocity) / mu;
        let em = e_vec.norm();

        let energy = v2 / 2.0 - mu / r;
        let semimajor_axis = -mu / (2.0 * energy);

        let inclination = (h.z / h.norm()).clamp(-1.0, 1.0).acos();

        let equatorial = nm < Self::ORBIT_EPSILON;
        let circular = em < Self::ORBIT_EPSILON;

        let raan = if equatorial {
            0.0
        } else {
            let raw = (node.x / nm).clamp(-1.0, 1.0).acos();
            if node.y < 0.0 { TAU - raw } else { raw }
        };

        let node_dir = if equatorial { Vector3::x() } else { node / nm };

        let argument_of_periapsis = if circular {
            0.0
        } else {
            let raw = (node_dir.dot(&e_vec) / em).clamp(-1.0, 1.0).acos();
            let below_node = if equatorial { e_vec.y < 0.0 } else { e_vec.z < 0.0 };
            if below_node { TAU - raw } else { raw }
        };

        let true_anomaly = if circular {
            let raw = (node_dir.dot(position) / r).clamp(-1.0, 1.0).acos();
            let below_node = if equatorial { position.y < 0.0 } else { position.z < 0.0 };
            if below_node { TAU - raw } else { raw }
        } else {
            let raw = (e_vec.dot(position) / (em * r)).clamp(-1.0, 1.0).acos();
            if rdotv < 0.0 { TAU - raw } else { raw }
        };

        Self::new(
            semimajor_axis,
            em,
            inclination,
            raan,
            argument_of_periapsis,
            true_anomaly,
        )
    }
}
