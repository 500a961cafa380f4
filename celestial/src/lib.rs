use serde::{Deserialize, Serialize};

pub mod ephemeris;
pub mod rotation;
pub mod shadow;

pub use ephemeris::{moon_position, sun_position};
pub use rotation::{EARTH_ROTATION_RATE, eci_to_ecef, gmst};
pub use shadow::in_shadow;

/// One astronomical unit in meters (IAU 2012 definition).
pub const AU: f64 = 1.495978707e11;

/// Speed of light in vacuum, m/s.
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;

/// Bodies with built-in constants and, for the Sun and Moon, analytic
/// geocentric ephemerides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CelestialBodies {
    Earth,
    Sun,
    Moon,
}

impl CelestialBodies {
    /// Gravitational parameter in m^3/s^2.
    pub fn mu(&self) -> f64 {
        match self {
            CelestialBodies::Earth => 3.986004415e14,
            CelestialBodies::Sun => 1.32712440018e20,
            CelestialBodies::Moon => 4.9048695e12,
        }
    }

    /// Mean equatorial radius in meters.
    pub fn radius(&self) -> f64 {
        match self {
            CelestialBodies::Earth => 6.3781363e6,
            CelestialBodies::Sun => 6.957e8,
            CelestialBodies::Moon => 1.7374e6,
        }
    }
}
