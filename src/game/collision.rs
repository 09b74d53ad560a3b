//! Collision Resolution
//!
//! Two passes per tick over living bodies: the wall pass, then the
//! pairwise pass. Corrections are applied in place, so pair order matters
//! in dense clusters; pairs are always visited as (i, j) with i < j in
//! spawn order.

use crate::core::vec2::Vec2;
use crate::game::body::Body;
use crate::game::settings::{
    Settings, BODY_RESTITUTION, IMPACT_DAMAGE_FACTOR, SPIN_KICK_FACTOR, WALL_DAMAGE_FACTOR,
    WALL_RESTITUTION,
};

/// Check if two circles overlap (touching does not count).
#[inline]
pub fn circles_overlap(pos_a: Vec2, radius_a: f64, pos_b: Vec2, radius_b: f64) -> bool {
    let combined = radius_a + radius_b;
    pos_a.distance_squared(pos_b) < combined * combined
}

/// A body bounced off the wall this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct WallContact {
    /// Index into the match's body list
    pub index: usize,
    /// Outward normal speed before the bounce
    pub impact_speed: f64,
}

/// Two bodies collided this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyContact {
    /// Lower body index
    pub first: usize,
    /// Higher body index
    pub second: usize,
    /// Closing speed along the contact normal
    pub impact_speed: f64,
}

/// Keep one body inside the arena.
///
/// Returns the outward normal speed when the body was moving into the
/// wall and got bounced (and damaged). A body already moving inward while
/// past the limit only gets its position corrected.
pub fn resolve_wall(body: &mut Body, settings: &Settings) -> Option<f64> {
    let limit = settings.wall_limit();
    let distance = body.distance_from_center();
    if distance <= limit || distance == 0.0 {
        return None;
    }

    // Positional correction only; velocity is handled below
    let normal = body.position * (1.0 / distance);
    body.position -= normal * (distance - limit);

    let normal_speed = body.velocity.dot(normal);
    if normal_speed <= 0.0 {
        return None;
    }

    // Keep the tangential part, reflect and shrink the normal part
    body.velocity -= normal * ((1.0 + WALL_RESTITUTION) * normal_speed);
    body.apply_damage(normal_speed * WALL_DAMAGE_FACTOR * settings.damage_multiplier);

    Some(normal_speed)
}

/// Run the wall pass over every living body.
pub fn resolve_wall_collisions(bodies: &mut [Body], settings: &Settings) -> Vec<WallContact> {
    bodies
        .iter_mut()
        .enumerate()
        .filter(|(_, body)| body.alive)
        .filter_map(|(index, body)| {
            resolve_wall(body, settings).map(|impact_speed| WallContact { index, impact_speed })
        })
        .collect()
}

/// Resolve an overlap between two equal-mass bodies.
///
/// Separates them symmetrically; if they are closing in, exchanges an
/// impulse along the contact normal, kicks their spin from the tangential
/// relative speed and damages both. Returns the closing speed in that case.
pub fn resolve_pair(a: &mut Body, b: &mut Body, settings: &Settings) -> Option<f64> {
    let delta = b.position - a.position;
    let distance = delta.length();
    let combined = a.radius + b.radius;
    if distance >= combined {
        return None;
    }

    // Coincident centers: any fixed axis keeps the result deterministic
    let normal = if distance > 0.0 {
        delta * (1.0 / distance)
    } else {
        Vec2::RIGHT
    };

    let half_overlap = (combined - distance) * 0.5;
    a.position -= normal * half_overlap;
    b.position += normal * half_overlap;

    let relative = b.velocity - a.velocity;
    let normal_speed = relative.dot(normal);
    if normal_speed >= 0.0 {
        // Already separating
        return None;
    }

    let impulse = -(1.0 + BODY_RESTITUTION) * 0.5 * normal_speed;
    a.velocity -= normal * impulse;
    b.velocity += normal * impulse;

    let tangential_speed = relative.dot(normal.perpendicular());
    a.angular_velocity += tangential_speed * SPIN_KICK_FACTOR;
    b.angular_velocity -= tangential_speed * SPIN_KICK_FACTOR;

    let impact_speed = -normal_speed;
    let damage = impact_speed * IMPACT_DAMAGE_FACTOR * settings.damage_multiplier;
    a.apply_damage(damage);
    b.apply_damage(damage);
    a.hits += 1;
    b.hits += 1;

    Some(impact_speed)
}

/// Run the pairwise pass over every unordered pair of living bodies.
pub fn resolve_body_collisions(bodies: &mut [Body], settings: &Settings) -> Vec<BodyContact> {
    let mut contacts = Vec::new();

    for i in 0..bodies.len() {
        for j in (i + 1)..bodies.len() {
            let (head, tail) = bodies.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];

            // Re-checked per pair: nothing dies mid-pass, but ghosts stay inert
            if !a.alive || !b.alive {
                continue;
            }

            if let Some(impact_speed) = resolve_pair(a, b, settings) {
                contacts.push(BodyContact { first: i, second: j, impact_speed });
            }
        }
    }

    contacts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::body::EliminationCause;
    use crate::game::roster::Participant;
    use crate::game::settings::STARTING_HEALTH;

    const EPS: f64 = 1e-9;

    fn body_at(id: u32, x: f64, y: f64) -> Body {
        Body::new(&Participant::new(id, "t", "red"), Vec2::new(x, y), 26.0)
    }

    #[test]
    fn test_circles_overlap() {
        assert!(circles_overlap(Vec2::ZERO, 26.0, Vec2::new(50.0, 0.0), 26.0));
        // Exactly touching is not an overlap
        assert!(!circles_overlap(Vec2::ZERO, 26.0, Vec2::new(52.0, 0.0), 26.0));
        assert!(!circles_overlap(Vec2::ZERO, 26.0, Vec2::new(60.0, 0.0), 26.0));
    }

    #[test]
    fn test_wall_inside_is_untouched() {
        let settings = Settings::default();
        let mut body = body_at(1, settings.wall_limit(), 0.0);
        body.velocity = Vec2::new(100.0, 0.0);
        let before = body.clone();

        assert_eq!(resolve_wall(&mut body, &settings), None);
        assert_eq!(body, before);
    }

    #[test]
    fn test_wall_bounce() {
        let settings = Settings::default();
        let limit = settings.wall_limit();
        let mut body = body_at(1, limit + 10.0, 0.0);
        body.velocity = Vec2::new(100.0, 30.0);

        let impact = resolve_wall(&mut body, &settings).unwrap();
        assert!((impact - 100.0).abs() < EPS);

        // Pushed back onto the limit
        assert!((body.position.x - limit).abs() < EPS);
        // Tangential kept, normal reflected and scaled
        assert!((body.velocity.x + WALL_RESTITUTION * 100.0).abs() < EPS);
        assert!((body.velocity.y - 30.0).abs() < EPS);
        // Damage from normal speed only
        let expected = STARTING_HEALTH - 100.0 * WALL_DAMAGE_FACTOR;
        assert!((body.health - expected).abs() < EPS);
    }

    #[test]
    fn test_wall_overlap_moving_inward_only_corrects_position() {
        let settings = Settings::default();
        let limit = settings.wall_limit();
        let mut body = body_at(1, 0.0, -(limit + 3.0));
        body.velocity = Vec2::new(0.0, 50.0);

        assert_eq!(resolve_wall(&mut body, &settings), None);
        assert!((body.position.y + limit).abs() < EPS);
        assert_eq!(body.velocity, Vec2::new(0.0, 50.0));
        assert_eq!(body.health, STARTING_HEALTH);
    }

    #[test]
    fn test_wall_damage_scales_with_multiplier() {
        let settings = Settings { damage_multiplier: 3.0, ..Settings::default() };
        let mut body = body_at(1, settings.wall_limit() + 1.0, 0.0);
        body.velocity = Vec2::new(50.0, 0.0);
        resolve_wall(&mut body, &settings);
        assert!((body.damage_taken - 50.0 * WALL_DAMAGE_FACTOR * 3.0).abs() < EPS);
    }

    #[test]
    fn test_head_on_restitution() {
        let settings = Settings::default();
        let mut a = body_at(1, -20.0, 0.0);
        let mut b = body_at(2, 20.0, 0.0);
        a.velocity = Vec2::new(150.0, 0.0);
        b.velocity = Vec2::new(-90.0, 0.0);

        let pre = (b.velocity - a.velocity).x;
        let impact = resolve_pair(&mut a, &mut b, &settings).unwrap();
        let post = (b.velocity - a.velocity).x;

        assert!((impact - 240.0).abs() < EPS);
        assert!((post - (-BODY_RESTITUTION * pre)).abs() < EPS);

        // Equal mass: momentum preserved
        let momentum = a.velocity.x + b.velocity.x;
        assert!((momentum - 60.0).abs() < EPS);
    }

    #[test]
    fn test_pair_symmetric_separation() {
        let settings = Settings::default();
        let mut a = body_at(1, -10.0, 0.0);
        let mut b = body_at(2, 10.0, 0.0);

        // At rest: positions corrected, no impulse, no damage
        assert_eq!(resolve_pair(&mut a, &mut b, &settings), None);
        assert!((a.position.x + 26.0).abs() < EPS);
        assert!((b.position.x - 26.0).abs() < EPS);
        assert_eq!(a.health, STARTING_HEALTH);
        assert_eq!(a.hits, 0);
    }

    #[test]
    fn test_pair_coincident_centers() {
        let settings = Settings::default();
        let mut a = body_at(1, 5.0, 5.0);
        let mut b = body_at(2, 5.0, 5.0);
        a.velocity = Vec2::new(0.0, 10.0);

        resolve_pair(&mut a, &mut b, &settings);
        assert!(a.position.is_finite() && b.position.is_finite());
        assert!(a.velocity.is_finite() && b.velocity.is_finite());
        assert!((b.position.x - a.position.x - 52.0).abs() < EPS);
    }

    #[test]
    fn test_pair_spin_kick_opposite() {
        let settings = Settings::default();
        let mut a = body_at(1, 0.0, 0.0);
        let mut b = body_at(2, 50.0, 0.0);
        // Glancing: closing along x, sliding along y
        a.velocity = Vec2::new(100.0, 40.0);
        b.velocity = Vec2::new(0.0, -40.0);

        resolve_pair(&mut a, &mut b, &settings).unwrap();
        // relative tangential speed = -80 along +y
        assert!((a.angular_velocity - (-80.0 * SPIN_KICK_FACTOR)).abs() < EPS);
        assert!((b.angular_velocity - (80.0 * SPIN_KICK_FACTOR)).abs() < EPS);
    }

    #[test]
    fn test_pair_damage_both_bodies() {
        let settings = Settings { damage_multiplier: 2.0, ..Settings::default() };
        let mut a = body_at(1, 0.0, 0.0);
        let mut b = body_at(2, 40.0, 0.0);
        a.velocity = Vec2::new(100.0, 0.0);

        resolve_pair(&mut a, &mut b, &settings).unwrap();
        let expected = 100.0 * IMPACT_DAMAGE_FACTOR * 2.0;
        assert!((a.damage_taken - expected).abs() < EPS);
        assert!((b.damage_taken - expected).abs() < EPS);
        assert_eq!((a.hits, b.hits), (1, 1));
    }

    #[test]
    fn test_dead_bodies_ignored() {
        let settings = Settings::default();
        let mut ghost = body_at(2, 10.0, 0.0);
        ghost.eliminate(1, EliminationCause::Settled, 2);
        let mut bodies = vec![body_at(1, 0.0, 0.0), ghost];
        bodies[0].velocity = Vec2::new(100.0, 0.0);

        assert!(resolve_body_collisions(&mut bodies, &settings).is_empty());
        assert_eq!(bodies[1].position, Vec2::new(10.0, 0.0));

        let mut ghosts = vec![bodies[1].clone()];
        ghosts[0].position = Vec2::new(1000.0, 0.0);
        assert!(resolve_wall_collisions(&mut ghosts, &settings).is_empty());
        assert_eq!(ghosts[0].position, Vec2::new(1000.0, 0.0));
    }

    #[test]
    fn test_pair_order_is_index_order() {
        let settings = Settings::default();
        let mut bodies = vec![body_at(1, 0.0, 0.0), body_at(2, 30.0, 0.0), body_at(3, -30.0, 0.0)];
        bodies[1].velocity = Vec2::new(-50.0, 0.0);
        bodies[2].velocity = Vec2::new(50.0, 0.0);

        let contacts = resolve_body_collisions(&mut bodies, &settings);
        let pairs: Vec<_> = contacts.iter().map(|c| (c.first, c.second)).collect();
        assert_eq!(pairs, vec![(0, 1), (0, 2)]);
    }
}
