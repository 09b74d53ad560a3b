//! Integrator
//!
//! Advances every living body by one fixed step and applies damping.
//! Nothing is clamped here; the collision stage corrects positions after
//! integration within the same tick.

use crate::game::body::Body;
use crate::game::settings::Settings;

/// Multiplier applied to a rate-damped quantity over `dt`.
#[inline]
fn damping(rate: f64, dt: f64) -> f64 {
    (1.0 - rate * dt).max(0.0)
}

/// Integrate all living bodies by `dt` seconds.
pub fn integrate(bodies: &mut [Body], dt: f64, settings: &Settings) {
    let linear = damping(settings.friction, dt);
    let angular = damping(settings.spin_friction, dt);

    for body in bodies.iter_mut().filter(|b| b.alive) {
        body.position += body.velocity * dt;
        body.orientation += body.angular_velocity * dt;
        body.velocity = body.velocity * linear;
        body.angular_velocity *= angular;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::body::EliminationCause;
    use crate::game::roster::Participant;

    const DT: f64 = 1.0 / 60.0;

    fn moving_body() -> Body {
        let mut body = Body::new(&Participant::new(1, "a", "red"), Vec2::ZERO, 26.0);
        body.velocity = Vec2::new(60.0, -120.0);
        body.angular_velocity = 6.0;
        body
    }

    #[test]
    fn test_position_integration() {
        let settings = Settings { friction: 0.0, spin_friction: 0.0, ..Settings::default() };
        let mut bodies = vec![moving_body()];
        integrate(&mut bodies, DT, &settings);

        assert_eq!(bodies[0].position, Vec2::new(60.0 * DT, -120.0 * DT));
        assert_eq!(bodies[0].orientation, 6.0 * DT);
        assert_eq!(bodies[0].velocity, Vec2::new(60.0, -120.0));
    }

    #[test]
    fn test_friction_damps_after_moving() {
        let settings = Settings::default();
        let mut bodies = vec![moving_body()];
        integrate(&mut bodies, DT, &settings);

        // Position uses the pre-damping velocity
        assert_eq!(bodies[0].position, Vec2::new(60.0, -120.0) * DT);
        let k = 1.0 - settings.friction * DT;
        assert_eq!(bodies[0].velocity, Vec2::new(60.0, -120.0) * k);
        assert_eq!(bodies[0].angular_velocity, 6.0 * (1.0 - settings.spin_friction * DT));
    }

    #[test]
    fn test_damping_never_reverses_motion() {
        // friction * dt > 1 would flip the sign without the clamp
        let settings = Settings { friction: 120.0, spin_friction: 120.0, ..Settings::default() };
        let mut bodies = vec![moving_body()];
        integrate(&mut bodies, 0.5, &settings);

        assert_eq!(bodies[0].velocity, Vec2::ZERO);
        assert_eq!(bodies[0].angular_velocity, 0.0);
    }

    #[test]
    fn test_dead_bodies_not_updated() {
        let mut dead = moving_body();
        dead.eliminate(1, EliminationCause::Settled, 2);
        let before = dead.clone();

        let mut bodies = vec![dead];
        integrate(&mut bodies, DT, &Settings::default());
        assert_eq!(bodies[0], before);
    }
}
