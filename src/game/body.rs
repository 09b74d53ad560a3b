//! Body Model
//!
//! Mutable state of one spinning top while a match runs.

use std::fmt;
use serde::{Deserialize, Serialize};

use crate::core::hash::StateHasher;
use crate::core::vec2::Vec2;
use crate::game::roster::{Participant, ParticipantId};
use crate::game::settings::STARTING_HEALTH;

/// Why a body left the match.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum EliminationCause {
    /// Ended a tick beyond the out-of-bounds radius
    FlewOut = 0,
    /// Health dropped to zero or below
    Destroyed = 1,
    /// Both linear and angular speed fell under the settle thresholds
    Settled = 2,
}

impl fmt::Display for EliminationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EliminationCause::FlewOut => "flew out",
            EliminationCause::Destroyed => "destroyed",
            EliminationCause::Settled => "settled",
        };
        f.write_str(s)
    }
}

/// State of a single body in the match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Participant this body belongs to
    pub id: ParticipantId,

    /// Display name (pass-through)
    pub label: String,

    /// Display color (pass-through)
    pub color: String,

    /// Position relative to the arena center
    pub position: Vec2,

    /// Linear velocity (units/second)
    pub velocity: Vec2,

    /// Orientation in radians, unbounded
    pub orientation: f64,

    /// Spin rate (radians/second)
    pub angular_velocity: f64,

    /// Collision radius, constant for the match
    pub radius: f64,

    /// Remaining health; only ever decreases
    pub health: f64,

    /// Still competing?
    pub alive: bool,

    /// Tick when the body was eliminated
    pub eliminated_tick: Option<u32>,

    /// Reason for elimination
    pub elimination_cause: Option<EliminationCause>,

    /// Final standing (1 = winner), set on elimination or match end
    pub placement: Option<u32>,

    /// Total damage received
    pub damage_taken: f64,

    /// Body-body impacts this body took part in
    pub hits: u32,
}

impl Body {
    /// Create a body for `participant` at rest at `position`.
    pub fn new(participant: &Participant, position: Vec2, radius: f64) -> Self {
        Self {
            id: participant.id,
            label: participant.label.clone(),
            color: participant.color.clone(),
            position,
            velocity: Vec2::ZERO,
            orientation: 0.0,
            angular_velocity: 0.0,
            radius,
            health: STARTING_HEALTH,
            alive: true,
            eliminated_tick: None,
            elimination_cause: None,
            placement: None,
            damage_taken: 0.0,
            hits: 0,
        }
    }

    /// Current linear speed.
    #[inline]
    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Distance of the center from the arena center.
    #[inline]
    pub fn distance_from_center(&self) -> f64 {
        self.position.length()
    }

    /// Subtract `amount` from health.
    ///
    /// Negative or NaN amounts are ignored so health can never rise.
    #[inline]
    pub fn apply_damage(&mut self, amount: f64) {
        if amount > 0.0 {
            self.health -= amount;
            self.damage_taken += amount;
        }
    }

    /// Mark the body eliminated. Returns false if it already was.
    pub fn eliminate(&mut self, tick: u32, cause: EliminationCause, placement: u32) -> bool {
        if !self.alive {
            return false;
        }
        self.alive = false;
        self.eliminated_tick = Some(tick);
        self.elimination_cause = Some(cause);
        self.placement = Some(placement);
        true
    }

    /// Hash this body's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u32(self.id.get());
        hasher.update_vec2(self.position);
        hasher.update_vec2(self.velocity);
        hasher.update_f64(self.orientation);
        hasher.update_f64(self.angular_velocity);
        hasher.update_f64(self.radius);
        hasher.update_f64(self.health);
        hasher.update_bool(self.alive);
        hasher.update_u32(self.eliminated_tick.unwrap_or(u32::MAX));
        hasher.update_u32(self.hits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body() -> Body {
        Body::new(&Participant::new(1, "Alpha", "#ff0000"), Vec2::new(3.0, 4.0), 26.0)
    }

    #[test]
    fn test_new_body() {
        let b = body();
        assert!(b.alive);
        assert_eq!(b.health, STARTING_HEALTH);
        assert_eq!(b.distance_from_center(), 5.0);
        assert_eq!(b.speed(), 0.0);
        assert_eq!(b.label, "Alpha");
    }

    #[test]
    fn test_damage_never_heals() {
        let mut b = body();
        b.apply_damage(10.0);
        b.apply_damage(-5.0);
        b.apply_damage(f64::NAN);
        assert_eq!(b.health, 90.0);
        assert_eq!(b.damage_taken, 10.0);

        // Not clamped at zero
        b.apply_damage(95.0);
        assert_eq!(b.health, -5.0);
    }

    #[test]
    fn test_eliminate_once() {
        let mut b = body();
        assert!(b.eliminate(10, EliminationCause::Settled, 3));
        assert!(!b.alive);
        assert!(!b.eliminate(11, EliminationCause::Destroyed, 2));
        assert_eq!(b.eliminated_tick, Some(10));
        assert_eq!(b.elimination_cause, Some(EliminationCause::Settled));
        assert_eq!(b.placement, Some(3));
    }

    #[test]
    fn test_hash_changes_with_state() {
        let a = body();
        let mut b = body();
        b.angular_velocity = 1.0;

        let hash = |body: &Body| {
            let mut h = StateHasher::new(b"test");
            body.hash_into(&mut h);
            h.finalize()
        };
        assert_eq!(hash(&a), hash(&body()));
        assert_ne!(hash(&a), hash(&b));
    }
}
