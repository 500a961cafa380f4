//! Tilted, offset dipole approximation of the geomagnetic field
//! (Markley & Crassidis formulation, GSFC planetary constants).

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{MagneticErrors, MagneticModel};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dipole {
    /// Dipole moment scaled to field units, T m^3, ECEF.
    moment: Vector3<f64>,
    /// Displacement of the dipole center from the body center, m, ECEF.
    offset: Vector3<f64>,
}

impl Dipole {
    /// Builds a dipole from pole coordinates: reference radius `a` (m),
    /// surface field strength `b0` (gauss), north pole geocentric
    /// latitude/longitude (deg, latitude in [-90, 90]), and center
    /// offset as a fraction of `a` along the dipole axis.
    pub fn new(a: f64, b0: f64, pole_lat: f64, pole_lon: f64, offset: f64) -> Self {
        let lat = pole_lat.to_radians();
        let lon = pole_lon.to_radians();

        let gauss_to_tesla = 1e-4;
        let strength = b0 * gauss_to_tesla * a.powi(3);

        let axis = Vector3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin());

        // the moment points from the north magnetic pole to the south
        Self {
            moment: -strength * axis,
            offset: offset * a * axis,
        }
    }

    /// Builds a centered dipole from the first-degree spherical harmonic
    /// coefficients g10, g11, h11 (nT) at reference radius `a` (m).
    pub fn from_gh(a: f64, g: [f64; 2], h: f64) -> Self {
        let nt_to_tesla = 1e-9;
        Self {
            moment: nt_to_tesla * a.powi(3) * Vector3::new(g[1], h, g[0]),
            offset: Vector3::zeros(),
        }
    }

    /// GSFC tilted offset dipole for Earth.
    pub fn earth() -> Self {
        Self::new(6.3712e6, 0.306, 80.65, -72.68, 0.076)
    }
}

impl MagneticModel for Dipole {
    fn calculate(&self, position_ecef: &Vector3<f64>) -> Result<Vector3<f64>, MagneticErrors> {
        let r_dipole = position_ecef - self.offset;
        let r = r_dipole.norm();
        if r <= f64::EPSILON {
            return Err(MagneticErrors::PositionIsZero);
        }
        let b = (3.0 * self.moment.dot(&r_dipole) * r_dipole - r.powi(2) * self.moment)
            / r.powi(5);
        // tesla to nanotesla
        Ok(b * 1e9)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn centered_dipole_from_igrf_degree_one() {
        let dipole = Dipole::from_gh(6.3712e6, [-29554.63, -1669.05], 5077.99);
        let b = dipole.calculate(&Vector3::new(7e6, 0.0, 0.0)).unwrap();

        assert_relative_eq!(b.x, -2516.9172529558114, max_relative = 1e-9);
        assert_relative_eq!(b.y, -3828.7890240966663, max_relative = 1e-9);
        assert_relative_eq!(b.z, 22284.101180829042, max_relative = 1e-9);
    }

    #[test]
    fn pole_coordinates_agree_with_gh_coefficients() {
        let dipole = Dipole::earth();
        let b = dipole.calculate(&Vector3::new(7e6, 0.0, 0.0)).unwrap();

        // pole-fit constants land within ~10-20% of the g/h expansion
        assert_relative_eq!(b.x, -2516.9172529558114, max_relative = 0.2);
        assert_relative_eq!(b.y, -3828.7890240966663, max_relative = 0.2);
        assert_relative_eq!(b.z, 22284.101180829042, max_relative = 0.1);
    }

    #[test]
    fn field_falls_off_with_distance_cubed() {
        let dipole = Dipole::from_gh(6.3712e6, [-29554.63, -1669.05], 5077.99);
        let near = dipole.calculate(&Vector3::new(7e6, 0.0, 0.0)).unwrap();
        let far = dipole.calculate(&Vector3::new(14e6, 0.0, 0.0)).unwrap();
        assert_relative_eq!(near.norm() / far.norm(), 8.0, max_relative = 1e-12);
    }

    #[test]
    fn dipole_center_is_an_error() {
        let dipole = Dipole::earth();
        let offset = 0.076 * 6.3712e6;
        let axis_lat = 80.65_f64.to_radians();
        let axis_lon = -72.68_f64.to_radians();
        let center = offset
            * Vector3::new(
                axis_lat.cos() * axis_lon.cos(),
                axis_lat.cos() * axis_lon.sin(),
                axis_lat.sin(),
            );
        assert_eq!(
            dipole.calculate(&center),
            Err(MagneticErrors::PositionIsZero)
        );
    }
}
