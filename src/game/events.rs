//! Game Events
//!
//! Events generated during simulation. The renderer and audio layer use
//! them for impact feedback; transcripts keep the eliminations.

use serde::{Deserialize, Serialize};

use crate::core::vec2::Vec2;
use crate::game::body::EliminationCause;
use crate::game::roster::ParticipantId;

/// Priority for event processing order.
///
/// Lower value = processed first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum EventPriority {
    /// Eliminations first
    Elimination = 0,
    /// Then impacts
    Impact = 1,
    /// Lowest priority
    Other = 255,
}

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Two bodies collided while closing in on each other
    BodyCollision {
        /// Earlier body in spawn order
        first: ParticipantId,
        /// Later body in spawn order
        second: ParticipantId,
        /// Closing speed along the contact normal
        impact_speed: f64,
        /// Midpoint between the two centers after correction
        point: Vec2,
    },

    /// A body bounced off the arena wall
    WallImpact {
        /// Body that hit the wall
        body: ParticipantId,
        /// Outward normal speed before the bounce
        impact_speed: f64,
        /// Body position after correction
        point: Vec2,
    },

    /// A body was eliminated
    BodyEliminated {
        /// Eliminated body
        body: ParticipantId,
        /// Why it left the match
        cause: EliminationCause,
        /// Final standing (1 = winner)
        placement: u32,
    },

    /// Match ended
    MatchEnded {
        /// Sole survivor, if any
        winner: Option<ParticipantId>,
        /// Ticks simulated
        duration_ticks: u32,
    },
}

/// A game event with timing and priority.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GameEvent {
    /// Tick when event occurred
    pub tick: u32,

    /// Processing priority
    pub priority: EventPriority,

    /// Participant involved (for tie-breaking)
    pub participant: Option<ParticipantId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(tick: u32, priority: EventPriority, data: GameEventData) -> Self {
        let participant = match &data {
            GameEventData::BodyCollision { first, .. } => Some(*first),
            GameEventData::WallImpact { body, .. } => Some(*body),
            GameEventData::BodyEliminated { body, .. } => Some(*body),
            GameEventData::MatchEnded { winner, .. } => *winner,
        };

        Self {
            tick,
            priority,
            participant,
            data,
        }
    }

    /// Create body collision event.
    pub fn body_collision(
        tick: u32,
        first: ParticipantId,
        second: ParticipantId,
        impact_speed: f64,
        point: Vec2,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Impact,
            GameEventData::BodyCollision { first, second, impact_speed, point },
        )
    }

    /// Create wall impact event.
    pub fn wall_impact(tick: u32, body: ParticipantId, impact_speed: f64, point: Vec2) -> Self {
        Self::new(
            tick,
            EventPriority::Impact,
            GameEventData::WallImpact { body, impact_speed, point },
        )
    }

    /// Create body eliminated event.
    pub fn body_eliminated(
        tick: u32,
        body: ParticipantId,
        cause: EliminationCause,
        placement: u32,
    ) -> Self {
        Self::new(
            tick,
            EventPriority::Elimination,
            GameEventData::BodyEliminated { body, cause, placement },
        )
    }

    /// Create match ended event.
    pub fn match_ended(tick: u32, winner: Option<ParticipantId>) -> Self {
        Self::new(
            tick,
            EventPriority::Other,
            GameEventData::MatchEnded {
                winner,
                duration_ticks: tick,
            },
        )
    }

    /// Is this an impact (collision or wall) event?
    pub fn is_impact(&self) -> bool {
        self.priority == EventPriority::Impact
    }
}

impl PartialEq for GameEvent {
    fn eq(&self, other: &Self) -> bool {
        self.tick == other.tick
            && self.priority == other.priority
            && self.participant == other.participant
    }
}

impl Eq for GameEvent {}

impl PartialOrd for GameEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for GameEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Sort by: tick, then priority, then participant
        self.tick
            .cmp(&other.tick)
            .then(self.priority.cmp(&other.priority))
            .then(self.participant.cmp(&other.participant))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ordering() {
        let id1 = ParticipantId::new(1);
        let id2 = ParticipantId::new(2);

        let elim1 = GameEvent::body_eliminated(10, id1, EliminationCause::Settled, 3);
        let wall1 = GameEvent::wall_impact(10, id1, 12.0, Vec2::ZERO);
        let elim2 = GameEvent::body_eliminated(10, id2, EliminationCause::Destroyed, 2);

        // Same tick, but elimination < impact
        assert!(elim1 < wall1);

        // Same tick and priority, but id1 < id2
        assert!(elim1 < elim2);

        // Earlier tick always first
        let early = GameEvent::match_ended(9, None);
        assert!(early < elim1);
    }

    #[test]
    fn test_participant_extraction() {
        let id = ParticipantId::new(4);
        let event = GameEvent::body_collision(1, id, ParticipantId::new(9), 50.0, Vec2::ZERO);
        assert_eq!(event.participant, Some(id));
        assert!(event.is_impact());

        let draw = GameEvent::match_ended(100, None);
        assert_eq!(draw.participant, None);
        assert!(!draw.is_impact());
    }
}
