//! Low-precision analytic geocentric ephemerides for the Sun and Moon
//! (Vallado's algorithms 29 and 31). Accuracy is on the order of 0.01 deg
//! for the Sun and 0.1 deg for the Moon, which is far tighter than the
//! perturbation models consuming these positions require.

use crate::{AU, CelestialBodies};
use nalgebra::Vector3;
use time::Epoch;

fn sin_deg(x: f64) -> f64 {
    x.to_radians().sin()
}

fn cos_deg(x: f64) -> f64 {
    x.to_radians().cos()
}

/// Mean obliquity of the ecliptic, degrees.
fn obliquity_deg(t: f64) -> f64 {
    23.439291 - 0.0130042 * t
}

/// Geocentric position of the Sun in the Earth-centered inertial frame,
/// meters.
pub fn sun_position(epoch: Epoch) -> Vector3<f64> {
    let t = epoch.tt_julian_centuries();

    let mean_longitude = 280.460 + 36000.771 * t;
    let mean_anomaly = 357.5291092 + 35999.05034 * t;

    let ecliptic_longitude = mean_longitude
        + 1.914666471 * sin_deg(mean_anomaly)
        + 0.019994643 * sin_deg(2.0 * mean_anomaly);

    let distance_au = 1.000140612
        - 0.016708617 * cos_deg(mean_anomaly)
        - 0.000139589 * cos_deg(2.0 * mean_anomaly);

    let eps = obliquity_deg(t);
    let r = distance_au * AU;

    Vector3::new(
        r * cos_deg(ecliptic_longitude),
        r * cos_deg(eps) * sin_deg(ecliptic_longitude),
        r * sin_deg(eps) * sin_deg(ecliptic_longitude),
    )
}

/// Geocentric position of the Moon in the Earth-centered inertial frame,
/// meters.
pub fn moon_position(epoch: Epoch) -> Vector3<f64> {
    let t = epoch.tt_julian_centuries();

    let longitude = 218.32 + 481267.8813 * t
        + 6.29 * sin_deg(134.9 + 477198.85 * t)
        - 1.27 * sin_deg(259.2 - 413335.38 * t)
        + 0.66 * sin_deg(235.7 + 890534.23 * t)
        + 0.21 * sin_deg(269.9 + 954397.70 * t)
        - 0.19 * sin_deg(357.5 + 35999.05 * t)
        - 0.11 * sin_deg(186.6 + 966404.05 * t);

    let latitude = 5.13 * sin_deg(93.3 + 483202.03 * t)
        + 0.28 * sin_deg(228.2 + 960400.87 * t)
        - 0.28 * sin_deg(318.3 + 6003.18 * t)
        - 0.17 * sin_deg(217.6 - 407332.20 * t);

    let parallax = 0.9508
        + 0.0518 * cos_deg(134.9 + 477198.85 * t)
        + 0.0095 * cos_deg(259.2 - 413335.38 * t)
        + 0.0078 * cos_deg(235.7 + 890534.23 * t)
        + 0.0028 * cos_deg(269.9 + 954397.70 * t);

    let eps = obliquity_deg(t);
    let r = CelestialBodies::Earth.radius() / sin_deg(parallax);

    let (sin_lon, cos_lon) = (sin_deg(longitude), cos_deg(longitude));
    let (sin_lat, cos_lat) = (sin_deg(latitude), cos_deg(latitude));
    let (sin_eps, cos_eps) = (sin_deg(eps), cos_deg(eps));

    Vector3::new(
        r * cos_lat * cos_lon,
        r * (cos_eps * cos_lat * sin_lon - sin_eps * sin_lat),
        r * (sin_eps * cos_lat * sin_lon + cos_eps * sin_lat),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn sun_at_j2000_is_near_perihelion() {
        let sun = sun_position(Epoch::J2000);
        let distance_au = sun.norm() / AU;
        // early January: close to the 0.9833 AU perihelion distance
        assert_relative_eq!(distance_au, 0.9833, epsilon = 5e-4);
        // northern winter: the Sun sits below the equatorial plane
        assert!(sun.z < 0.0);
    }

    #[test]
    fn sun_declination_at_june_solstice() {
        let epoch = Epoch::from_ymdhms(2000, 6, 21, 12, 0, 0.0).unwrap();
        let sun = sun_position(epoch);
        let declination = (sun.z / sun.norm()).asin().to_degrees();
        assert_relative_eq!(declination, 23.44, epsilon = 0.1);
    }

    #[test]
    fn sun_distance_stays_in_orbital_band() {
        for day in 0..366 {
            let sun = sun_position(Epoch::J2000 + day as f64 * 86400.0);
            let au = sun.norm() / AU;
            assert!(au > 0.983 && au < 1.0171, "day {day}: {au} AU");
        }
    }

    #[test]
    fn moon_at_j2000_distance() {
        let moon = moon_position(Epoch::J2000);
        // geocentric distance on 2000-01-01 was about 402,800 km
        assert_relative_eq!(moon.norm(), 4.028e8, epsilon = 2e6);
    }

    #[test]
    fn moon_distance_stays_in_orbital_band() {
        // perigee ~356,500 km, apogee ~406,700 km; allow series slack
        for day in 0..60 {
            let moon = moon_position(Epoch::J2000 + day as f64 * 43200.0);
            let r = moon.norm();
            assert!(r > 3.5e8 && r < 4.1e8, "sample {day}: {r} m");
        }
    }

    #[test]
    fn moon_period_is_about_a_sidereal_month() {
        // direction should nearly repeat after 27.32 days
        let a = moon_position(Epoch::J2000).normalize();
        let b = moon_position(Epoch::J2000 + 27.321661 * 86400.0).normalize();
        let angle = a.dot(&b).clamp(-1.0, 1.0).acos().to_degrees();
        assert!(angle < 4.0, "direction drifted {angle} deg");
    }
}
