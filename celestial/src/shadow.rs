//! Cylindrical umbra test. The occluding body casts an infinite cylinder
//! of radius equal to its own, anti-sunward; penumbra is ignored.

use nalgebra::Vector3;

/// True when `position` (body-centered inertial, meters) lies inside the
/// shadow cylinder cast by a body of `body_radius` away from the Sun at
/// `sun_position`.
pub fn in_shadow(
    position: &Vector3<f64>,
    sun_position: &Vector3<f64>,
    body_radius: f64,
) -> bool {
    let sun_dir = sun_position.normalize();
    let along = position.dot(&sun_dir);
    if along >= 0.0 {
        // sunward of the body center, including the terminator plane
        return false;
    }
    let perp = (position - along * sun_dir).norm();
    perp < body_radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AU, CelestialBodies};

    fn sun() -> Vector3<f64> {
        Vector3::new(AU, 0.0, 0.0)
    }

    #[test]
    fn antisolar_point_is_shadowed() {
        let r = CelestialBodies::Earth.radius();
        assert!(in_shadow(&Vector3::new(-7e6, 0.0, 0.0), &sun(), r));
    }

    #[test]
    fn subsolar_point_is_lit() {
        let r = CelestialBodies::Earth.radius();
        assert!(!in_shadow(&Vector3::new(7e6, 0.0, 0.0), &sun(), r));
    }

    #[test]
    fn terminator_is_lit() {
        let r = CelestialBodies::Earth.radius();
        assert!(!in_shadow(&Vector3::new(0.0, 7e6, 0.0), &sun(), r));
    }

    #[test]
    fn outside_cylinder_radius_is_lit() {
        let r = CelestialBodies::Earth.radius();
        assert!(!in_shadow(&Vector3::new(-7e6, r + 1.0, 0.0), &sun(), r));
        assert!(in_shadow(&Vector3::new(-7e6, r - 1.0, 0.0), &sun(), r));
    }
}
