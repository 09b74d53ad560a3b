//! Elimination & Termination
//!
//! Runs after both collision passes. A body leaves the match when it has
//! flown out of the arena, lost all health, or settled (nearly stopped
//! AND nearly not spinning). Once at most one body is alive the match
//! ends.

use crate::game::body::{Body, EliminationCause};
use crate::game::settings::Settings;
use crate::game::state::Match;

/// Why `body` should be eliminated now, if at all.
///
/// Causes are checked in a fixed order: flew out, destroyed, settled.
/// A body exactly on the out-of-bounds radius is still in.
pub fn elimination_cause(body: &Body, settings: &Settings) -> Option<EliminationCause> {
    if !body.alive {
        return None;
    }
    if body.distance_from_center() > settings.out_of_bounds_radius() {
        return Some(EliminationCause::FlewOut);
    }
    if body.health <= 0.0 {
        return Some(EliminationCause::Destroyed);
    }
    // Both must be low; a slow but spinning top is still fighting
    if body.speed() < settings.settle_speed && body.angular_velocity.abs() < settings.settle_spin {
        return Some(EliminationCause::Settled);
    }
    None
}

/// Eliminate every body that qualifies, in spawn order.
///
/// Returns the number of bodies eliminated.
pub fn apply_eliminations(state: &mut Match) -> usize {
    let doomed: Vec<(usize, EliminationCause)> = state
        .bodies
        .iter()
        .enumerate()
        .filter_map(|(index, body)| elimination_cause(body, &state.settings).map(|cause| (index, cause)))
        .collect();

    for &(index, cause) in &doomed {
        state.eliminate_body(index, cause);
    }

    doomed.len()
}

/// End the match if at most one body is alive. Returns true if ended.
pub fn check_termination(state: &mut Match) -> bool {
    if state.running && state.alive_count <= 1 {
        state.finish();
    }
    !state.running
}
