//! Simulation Tick
//!
//! One tick runs, in order: integration, the wall pass, the pairwise
//! pass, eliminations, and the termination check. The tick never reads a
//! clock; the caller supplies the fixed step.

use tracing::trace;

use crate::game::collision::{resolve_body_collisions, resolve_wall_collisions};
use crate::game::elimination::{apply_eliminations, check_termination};
use crate::game::events::GameEvent;
use crate::game::physics::integrate;
use crate::game::roster::{Participant, ParticipantId};
use crate::game::settings::Settings;
use crate::game::state::{Match, MatchError};

/// Result of a tick.
#[derive(Debug, Default)]
pub struct TickResult {
    /// Events generated this tick, ordered by (tick, priority, participant)
    pub events: Vec<GameEvent>,
    /// Whether the match has ended (this tick or earlier)
    pub match_ended: bool,
    /// Winner, once the match has ended with a survivor
    pub winner: Option<ParticipantId>,
    /// Bodies eliminated this tick
    pub eliminated: usize,
}

/// Run one simulation tick of `dt` seconds.
///
/// Ticking an ended match is a no-op that reports the final outcome.
///
/// # Determinism
///
/// Bodies are visited in spawn order in every stage and no stage draws
/// randomness, so equal matches ticked with equal steps stay bit-identical.
pub fn tick(state: &mut Match, dt: f64) -> TickResult {
    if !state.running {
        return TickResult {
            match_ended: true,
            winner: state.winner,
            ..TickResult::default()
        };
    }

    // 0. Advance tick counter
    state.tick += 1;
    let now = state.tick;

    // 1. Integrate
    integrate(&mut state.bodies, dt, &state.settings);

    // 2. Wall pass
    let wall_contacts = resolve_wall_collisions(&mut state.bodies, &state.settings);
    for contact in wall_contacts {
        let body = &state.bodies[contact.index];
        let event = GameEvent::wall_impact(now, body.id, contact.impact_speed, body.position);
        state.push_event(event);
    }

    // 3. Pairwise pass
    let body_contacts = resolve_body_collisions(&mut state.bodies, &state.settings);
    for contact in body_contacts {
        let a = &state.bodies[contact.first];
        let b = &state.bodies[contact.second];
        let point = (a.position + b.position) * 0.5;
        let event = GameEvent::body_collision(now, a.id, b.id, contact.impact_speed, point);
        state.push_event(event);
    }

    // 4. Eliminations
    let eliminated = apply_eliminations(state);

    // 5. Termination
    let match_ended = check_termination(state);

    #[cfg(feature = "debug-tracing")]
    trace!(tick = now, alive = state.alive_count, hash = %hex::encode(state.compute_hash()), "tick");
    #[cfg(not(feature = "debug-tracing"))]
    trace!(tick = now, alive = state.alive_count, "tick");

    // Impacts are pushed before eliminations; hand them out in event order
    let mut events = state.take_events();
    events.sort();

    TickResult {
        events,
        match_ended,
        winner: state.winner,
        eliminated,
    }
}

impl Match {
    /// Consume the match and return it advanced by one tick.
    pub fn advanced(mut self, dt: f64) -> Self {
        tick(&mut self, dt);
        self
    }
}

/// Tick until the match ends or `max_ticks` more ticks have run.
///
/// Returns every event produced along the way.
pub fn run_to_end(state: &mut Match, dt: f64, max_ticks: u32) -> Vec<GameEvent> {
    let mut events = Vec::new();
    for _ in 0..max_ticks {
        let result = tick(state, dt);
        events.extend(result.events);
        if result.match_ended {
            break;
        }
    }
    events
}

/// Replay a match from its roster and settings.
///
/// Returns the state after `tick_count` ticks (or at the end of the match,
/// whichever comes first) and every event produced.
pub fn replay_match(
    roster: &[Participant],
    settings: Settings,
    dt: f64,
    tick_count: u32,
) -> Result<(Match, Vec<GameEvent>), MatchError> {
    let mut state = Match::start(roster, settings)?;
    let events = run_to_end(&mut state, dt, tick_count);
    Ok((state, events))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    use crate::core::vec2::Vec2;
    use crate::game::body::{Body, EliminationCause};
    use crate::game::events::GameEventData;
    use crate::game::roster::default_roster;
    use crate::FIXED_DT;

    /// Generous cap; representative matches end well before it.
    const TICK_CAP: u32 = 10_000;

    #[test]
    fn test_tick_determinism() {
        let roster = default_roster(8);
        let mut state1 = Match::start(&roster, Settings::default()).unwrap();
        let mut state2 = Match::start(&roster, Settings::default()).unwrap();

        for _ in 0..500 {
            let r1 = tick(&mut state1, FIXED_DT);
            let r2 = tick(&mut state2, FIXED_DT);
            assert_eq!(r1.events.len(), r2.events.len());
            assert_eq!(r1.winner, r2.winner);
        }

        assert_eq!(state1.tick, state2.tick);
        assert_eq!(state1.compute_hash(), state2.compute_hash());
        for (b1, b2) in state1.bodies.iter().zip(&state2.bodies) {
            assert_eq!(b1.position.x.to_bits(), b2.position.x.to_bits());
            assert_eq!(b1.position.y.to_bits(), b2.position.y.to_bits());
            assert_eq!(b1.health.to_bits(), b2.health.to_bits());
        }
    }

    #[test]
    fn test_two_body_seed_1337_scenario() {
        let roster = default_roster(2);
        let settings = Settings::default();
        assert_eq!(settings.seed, 1337);

        let mut state = Match::start(&roster, settings.clone()).unwrap();
        run_to_end(&mut state, FIXED_DT, TICK_CAP);

        assert!(state.is_ended(), "match should end before the cap");
        let alive: Vec<&Body> = state.bodies.iter().filter(|b| b.alive).collect();
        assert_eq!(alive.len(), 1);
        assert_eq!(state.winner(), Some(alive[0].id));

        // Reproducible tick count and winner
        let mut again = Match::start(&roster, settings).unwrap();
        run_to_end(&mut again, FIXED_DT, TICK_CAP);
        assert_eq!(again.tick_count(), state.tick_count());
        assert_eq!(again.winner(), state.winner());
        assert_eq!(again.compute_hash(), state.compute_hash());
    }

    #[test]
    fn test_ended_match_tick_is_noop() {
        let mut state = Match::start(&default_roster(2), Settings::default()).unwrap();
        state.eliminate_body(0, EliminationCause::Settled);
        let result = tick(&mut state, FIXED_DT);
        assert!(result.match_ended);

        let hash = state.compute_hash();
        let tick_count = state.tick_count();
        let result = tick(&mut state, FIXED_DT);
        assert!(result.match_ended);
        assert!(result.events.is_empty());
        assert_eq!(result.winner, state.winner());
        assert_eq!(state.compute_hash(), hash);
        assert_eq!(state.tick_count(), tick_count);
    }

    #[test]
    fn test_match_ends_on_one_alive() {
        let roster = default_roster(2);
        let mut state = Match::start(&roster, Settings::default()).unwrap();
        state.eliminate_body(1, EliminationCause::Destroyed);

        let result = tick(&mut state, FIXED_DT);
        assert!(result.match_ended);
        assert_eq!(result.winner, Some(roster[0].id));
        assert!(result
            .events
            .iter()
            .any(|e| matches!(e.data, GameEventData::MatchEnded { winner: Some(id), .. } if id == roster[0].id)));
    }

    #[test]
    fn test_boundary_touch_is_not_flying_out() {
        let settings = Settings::default();
        let roster = default_roster(2);

        // Touching the wall exactly, at rest, but still spinning
        let edge = settings.arena_radius - settings.body_radius;
        let mut toucher = Body::new(&roster[0], Vec2::new(edge, 0.0), settings.body_radius);
        toucher.angular_velocity = 5.0;
        let mut other = Body::new(&roster[1], Vec2::new(-100.0, 0.0), settings.body_radius);
        other.angular_velocity = 5.0;

        let mut state = Match::from_bodies(settings.clone(), vec![toucher, other]);
        tick(&mut state, FIXED_DT);

        let body = &state.bodies[0];
        assert!(body.alive);
        assert_eq!(body.elimination_cause, None);
        // Past the wall margin, so pulled back onto the limit
        assert!((body.distance_from_center() - settings.wall_limit()).abs() < 1e-9);
    }

    #[test]
    fn test_boundary_touch_at_rest_settles_rather_than_flies_out() {
        let settings = Settings::default();
        let roster = default_roster(3);
        let edge = settings.arena_radius - settings.body_radius;

        let still = Body::new(&roster[0], Vec2::new(0.0, edge), settings.body_radius);
        let mut b = Body::new(&roster[1], Vec2::new(-100.0, 0.0), settings.body_radius);
        b.angular_velocity = 5.0;
        let mut c = Body::new(&roster[2], Vec2::new(100.0, 0.0), settings.body_radius);
        c.angular_velocity = 5.0;

        let mut state = Match::from_bodies(settings, vec![still, b, c]);
        tick(&mut state, FIXED_DT);

        assert_eq!(state.bodies[0].elimination_cause, Some(EliminationCause::Settled));
        assert!(state.is_running());
    }

    #[test]
    fn test_tick_events_sorted_elimination_before_impact() {
        let settings = Settings::default();
        let roster = default_roster(3);

        // Slams into the wall hard enough to be destroyed by the hit
        let mut doomed = Body::new(&roster[0], Vec2::new(settings.wall_limit(), 0.0), settings.body_radius);
        doomed.velocity = Vec2::new(600.0, 0.0);
        doomed.angular_velocity = 5.0;
        doomed.health = 1.0;
        let mut b = Body::new(&roster[1], Vec2::new(-100.0, 0.0), settings.body_radius);
        b.angular_velocity = 5.0;
        let mut c = Body::new(&roster[2], Vec2::new(0.0, -100.0), settings.body_radius);
        c.angular_velocity = 5.0;

        let mut state = Match::from_bodies(settings, vec![doomed, b, c]);
        let result = tick(&mut state, FIXED_DT);

        assert_eq!(result.events.len(), 2);
        assert!(matches!(
            result.events[0].data,
            GameEventData::BodyEliminated { cause: EliminationCause::Destroyed, .. }
        ));
        assert!(matches!(result.events[1].data, GameEventData::WallImpact { .. }));

        let mut sorted = result.events.clone();
        sorted.sort();
        assert!(sorted.iter().zip(&result.events).all(|(a, b)| a.data == b.data));
    }

    #[test]
    fn test_tick_events_tagged_with_tick() {
        let mut state = Match::start(&default_roster(12), Settings::default()).unwrap();
        for _ in 0..300 {
            let result = tick(&mut state, FIXED_DT);
            assert!(result.events.iter().all(|e| e.tick == state.tick_count()));
        }
    }

    #[test]
    fn test_advanced_matches_tick() {
        let roster = default_roster(4);
        let mut by_ref = Match::start(&roster, Settings::default()).unwrap();
        let mut by_value = Match::start(&roster, Settings::default()).unwrap();

        for _ in 0..50 {
            tick(&mut by_ref, FIXED_DT);
            by_value = by_value.advanced(FIXED_DT);
        }
        assert_eq!(by_ref.compute_hash(), by_value.compute_hash());
    }

    #[test]
    fn test_replay_determinism() {
        let roster = default_roster(6);
        let (final1, events1) = replay_match(&roster, Settings::default(), FIXED_DT, TICK_CAP).unwrap();
        let (final2, events2) = replay_match(&roster, Settings::default(), FIXED_DT, TICK_CAP).unwrap();

        assert_eq!(final1.compute_hash(), final2.compute_hash());
        assert_eq!(events1.len(), events2.len());
        assert!(final1.is_ended());
    }

    #[test]
    fn test_replay_rejects_small_roster() {
        assert!(matches!(
            replay_match(&default_roster(1), Settings::default(), FIXED_DT, 10),
            Err(MatchError::NotEnoughParticipants { got: 1 })
        ));
    }

    #[test]
    fn test_large_roster_terminates() {
        let mut state = Match::start(&default_roster(32), Settings::default()).unwrap();
        run_to_end(&mut state, FIXED_DT, TICK_CAP);
        assert!(state.is_ended());
        assert!(state.bodies.iter().all(|b| b.position.is_finite() && b.velocity.is_finite()));
    }

    // =========================================================================
    // Property-based tests
    // =========================================================================

    fn roster_strategy() -> impl Strategy<Value = usize> {
        2usize..12
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(24))]

        /// Equal inputs give bit-identical states at every step.
        #[test]
        fn prop_same_seed_same_match(seed in any::<u32>(), count in roster_strategy()) {
            let roster = default_roster(count);
            let settings = Settings { seed, ..Settings::default() };
            let mut a = Match::start(&roster, settings.clone()).unwrap();
            let mut b = Match::start(&roster, settings).unwrap();

            for _ in 0..400 {
                tick(&mut a, FIXED_DT);
                tick(&mut b, FIXED_DT);
                prop_assert_eq!(a.compute_hash(), b.compute_hash());
                prop_assert_eq!(a.winner(), b.winner());
            }
        }

        /// Health never rises, the living never come back, no living body
        /// sits outside the out-of-bounds radius, and the match ends.
        #[test]
        fn prop_match_invariants(seed in any::<u32>(), count in roster_strategy()) {
            let roster = default_roster(count);
            let settings = Settings { seed, ..Settings::default() };
            let oob = settings.out_of_bounds_radius();
            let mut state = Match::start(&roster, settings).unwrap();

            let mut ticks = 0;
            while state.is_running() && ticks < TICK_CAP {
                let before: Vec<(f64, bool)> = state.bodies.iter().map(|b| (b.health, b.alive)).collect();
                let alive_before = state.alive_count();

                tick(&mut state, FIXED_DT);
                ticks += 1;

                prop_assert!(state.alive_count() <= alive_before);
                for (body, (health, alive)) in state.bodies.iter().zip(before) {
                    prop_assert!(body.health <= health);
                    prop_assert!(alive || !body.alive);
                    if body.alive {
                        prop_assert!(body.distance_from_center() <= oob);
                    }
                }
                prop_assert_eq!(
                    state.alive_count() as usize,
                    state.bodies.iter().filter(|b| b.alive).count()
                );
            }

            prop_assert!(state.is_ended());
            match state.winner() {
                Some(id) => {
                    let winner = state.body(id).unwrap();
                    prop_assert!(winner.alive);
                    prop_assert_eq!(state.alive_count(), 1);
                }
                None => prop_assert_eq!(state.alive_count(), 0),
            }
        }

        /// Head-on equal-mass collision keeps `e` times the closing speed.
        #[test]
        fn prop_head_on_restitution(
            speed_a in 1.0f64..400.0,
            speed_b in 1.0f64..400.0,
            angle in 0.0f64..std::f64::consts::TAU,
        ) {
            use crate::game::collision::resolve_pair;
            use crate::game::settings::BODY_RESTITUTION;

            let settings = Settings::default();
            let roster = default_roster(2);
            let axis = Vec2::from_polar(angle, 1.0);
            let mut a = Body::new(&roster[0], axis * -20.0, settings.body_radius);
            let mut b = Body::new(&roster[1], axis * 20.0, settings.body_radius);
            a.velocity = axis * speed_a;
            b.velocity = axis * -speed_b;

            let normal = (b.position - a.position).normalize();
            let pre = (b.velocity - a.velocity).dot(normal);
            resolve_pair(&mut a, &mut b, &settings).unwrap();
            let post = (b.velocity - a.velocity).dot(normal);

            prop_assert!((post + BODY_RESTITUTION * pre).abs() < 1e-6);
        }
    }
}
