//! Arena Initializer
//!
//! Places the roster around the arena rim and launches every body toward
//! the middle. All randomness comes from one generator seeded with
//! `Settings::seed`, drawn in a fixed order per body:
//!
//! 1. angle jitter
//! 2. radius fraction
//! 3. launch speed
//! 4. heading jitter
//! 5. angular velocity
//!
//! Bodies are visited in roster order. Changing either order changes every
//! outcome recorded with an existing seed.

use std::f64::consts::{PI, TAU};

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::body::Body;
use crate::game::roster::Participant;
use crate::game::settings::{
    Settings, LAUNCH_HEADING_JITTER, LAUNCH_SPEED_MAX, LAUNCH_SPEED_MIN, LAUNCH_SPIN_MAX,
    SPAWN_ANGLE_JITTER, SPAWN_RADIUS_BASE, SPAWN_RADIUS_RANDOM,
};
use crate::game::state::Match;

/// Spawn one body per participant.
pub fn spawn_bodies(roster: &[Participant], settings: &Settings, rng: &mut DeterministicRng) -> Vec<Body> {
    let n = roster.len();
    if n == 0 {
        return Vec::new();
    }

    let spacing = TAU / n as f64;
    let max_distance = settings.wall_limit();

    roster
        .iter()
        .enumerate()
        .map(|(i, participant)| {
            let angle = i as f64 * spacing + rng.next_signed(SPAWN_ANGLE_JITTER);
            let distance = max_distance * (SPAWN_RADIUS_BASE + SPAWN_RADIUS_RANDOM * rng.next_f64());
            let speed = rng.next_range(LAUNCH_SPEED_MIN, LAUNCH_SPEED_MAX);
            let heading = angle + PI + rng.next_signed(LAUNCH_HEADING_JITTER);
            let spin = rng.next_signed(LAUNCH_SPIN_MAX);

            let mut body = Body::new(participant, Vec2::from_polar(angle, distance), settings.body_radius);
            body.velocity = Vec2::from_polar(heading, speed);
            body.angular_velocity = spin;
            body
        })
        .collect()
}

/// Build a match from a roster without checking preconditions.
///
/// Zero participants give an ended match with no winner; one participant
/// gives an ended match won by that participant. Callers wanting a real
/// battle go through [`Match::start`].
pub fn initialize(roster: &[Participant], settings: Settings) -> Match {
    let mut rng = DeterministicRng::new(settings.seed);
    let bodies = spawn_bodies(roster, &settings, &mut rng);
    Match::from_bodies(settings, bodies)
}
