//! Match State
//!
//! The aggregate a battle is played on: bodies in spawn order, the
//! running flag and the winner. Bodies are never removed or reordered,
//! so index order is stable for the whole match.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::core::hash::{compute_state_hash, StateHash};
use crate::game::arena;
use crate::game::body::{Body, EliminationCause};
use crate::game::events::GameEvent;
use crate::game::roster::{find_duplicate_id, Participant, ParticipantId};
use crate::game::settings::{Settings, SettingsError};

/// Minimum roster size for a battle.
pub const MIN_PARTICIPANTS: usize = 2;

/// Reasons a match cannot start.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatchError {
    /// Fewer than two participants.
    #[error("cannot start a match with {got} participant(s), need at least 2")]
    NotEnoughParticipants {
        /// Roster size supplied.
        got: usize,
    },

    /// The same id appears twice in the roster.
    #[error("participant {0} appears more than once in the roster")]
    DuplicateParticipant(ParticipantId),

    /// Settings would produce non-finite physics.
    #[error("invalid settings: {0}")]
    InvalidSettings(#[from] SettingsError),
}

/// Complete state of a match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Match {
    /// Ticks simulated so far
    pub tick: u32,

    /// Settings the match was started with
    pub settings: Settings,

    /// All bodies in spawn order (dead ones kept for rendering)
    pub bodies: Vec<Body>,

    /// Still simulating?
    pub running: bool,

    /// Sole survivor once the match has ended
    pub winner: Option<ParticipantId>,

    /// Number of bodies still alive
    pub alive_count: u32,

    /// Events generated this tick (drained by `tick`)
    #[serde(skip)]
    pub pending_events: Vec<GameEvent>,
}

impl Match {
    /// Start a battle.
    ///
    /// Refuses rosters with fewer than two participants rather than
    /// producing a degenerate one-body "winner"; callers decide whether a
    /// lone entrant wins by default.
    pub fn start(roster: &[Participant], settings: Settings) -> Result<Self, MatchError> {
        if roster.len() < MIN_PARTICIPANTS {
            return Err(MatchError::NotEnoughParticipants { got: roster.len() });
        }
        if let Some(id) = find_duplicate_id(roster) {
            return Err(MatchError::DuplicateParticipant(id));
        }
        settings.validate()?;

        let state = arena::initialize(roster, settings);
        debug!(
            bodies = state.bodies.len(),
            seed = state.settings.seed,
            "match started"
        );
        Ok(state)
    }

    /// Build a match around already placed bodies.
    ///
    /// If one body or none is alive the match ends immediately.
    pub fn from_bodies(settings: Settings, bodies: Vec<Body>) -> Self {
        let alive_count = bodies.iter().filter(|b| b.alive).count() as u32;
        let mut state = Self {
            tick: 0,
            settings,
            bodies,
            running: true,
            winner: None,
            alive_count,
            pending_events: Vec::new(),
        };
        if state.alive_count <= 1 {
            state.finish();
        }
        state
    }

    /// All bodies in spawn order.
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Body belonging to `id`.
    pub fn body(&self, id: ParticipantId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Is the match still being simulated?
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Has the match ended?
    pub fn is_ended(&self) -> bool {
        !self.running
    }

    /// Winner, once the match has ended with a survivor.
    pub fn winner(&self) -> Option<ParticipantId> {
        self.winner
    }

    /// Number of bodies still alive.
    pub fn alive_count(&self) -> u32 {
        self.alive_count
    }

    /// Ticks simulated so far.
    pub fn tick_count(&self) -> u32 {
        self.tick
    }

    /// Eliminate the body at `index`.
    ///
    /// Placement counts down from the number of bodies alive before this
    /// elimination, so the first body out of an 8-body match places 8th.
    pub fn eliminate_body(&mut self, index: usize, cause: EliminationCause) {
        let placement = self.alive_count;
        let tick = self.tick;

        let Some(body) = self.bodies.get_mut(index) else {
            return;
        };
        if !body.eliminate(tick, cause, placement) {
            return;
        }
        let id = body.id;

        self.alive_count = self.alive_count.saturating_sub(1);
        debug!(tick, body = %id, %cause, placement, "body eliminated");
        self.push_event(GameEvent::body_eliminated(tick, id, cause, placement));
    }

    /// Freeze the match and record the winner (if any body survives).
    pub fn finish(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;

        let survivor = self.bodies.iter_mut().find(|b| b.alive);
        self.winner = survivor.map(|body| {
            body.placement = Some(1);
            body.id
        });

        debug!(tick = self.tick, winner = ?self.winner, "match ended");
        self.push_event(GameEvent::match_ended(self.tick, self.winner));
    }

    /// Final standings as `(id, placement)`, best first.
    ///
    /// Bodies without a placement (match still running) sort last, in
    /// spawn order.
    pub fn placements(&self) -> Vec<(ParticipantId, u32)> {
        let mut results: Vec<_> = self
            .bodies
            .iter()
            .map(|b| (b.id, b.placement.unwrap_or(u32::MAX)))
            .collect();

        results.sort_by_key(|(_, placement)| *placement);
        results
    }

    /// Compute hash of current state for verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.tick, self.settings.seed, |hasher| {
            for body in &self.bodies {
                body.hash_into(hasher);
            }
            hasher.update_bool(self.running);
            hasher.update_u32(self.alive_count);
            hasher.update_u32(self.winner.map_or(u32::MAX, |id| id.get()));
        })
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a game event.
    pub fn push_event(&mut self, event: GameEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================
