//! Earth orientation: Greenwich mean sidereal time and the inertial to
//! Earth-fixed rotation built from it. UT1 is approximated by UTC, which
//! keeps the rotation within ~1 arcsecond of the full model.

use nalgebra::{Rotation3, Vector3};
use std::f64::consts::TAU;
use time::Epoch;

/// Mean rotation rate of the Earth, rad/s.
pub const EARTH_ROTATION_RATE: f64 = 7.2921158553e-5;

/// Greenwich mean sidereal time, radians in [0, 2*pi).
pub fn gmst(epoch: Epoch) -> f64 {
    let d = epoch.seconds_j2000() / 86400.0;
    let t = d / 36525.0;

    let theta_deg = 280.46061837 + 360.98564736629 * d + 0.000387933 * t * t
        - t * t * t / 38_710_000.0;

    theta_deg.to_radians().rem_euclid(TAU)
}

/// Rotation taking Earth-centered inertial vectors to Earth-fixed
/// (ECEF) vectors at the given epoch.
pub fn eci_to_ecef(epoch: Epoch) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), -gmst(epoch))
}
