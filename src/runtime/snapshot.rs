//! Render Snapshots
//!
//! Read-only copies of match state for renderers and observers. A
//! snapshot never borrows the match, so it can cross task boundaries.

use serde::{Deserialize, Serialize};

use crate::game::body::Body;
use crate::game::roster::ParticipantId;
use crate::game::state::Match;

/// What a renderer needs to draw one top.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BodySnapshot {
    /// Participant id.
    pub id: ParticipantId,
    /// Display label.
    pub label: String,
    /// Display color.
    pub color: String,
    /// Position x (arena units, origin at center).
    pub x: f64,
    /// Position y.
    pub y: f64,
    /// Orientation in radians.
    pub orientation: f64,
    /// Collision radius.
    pub radius: f64,
    /// Remaining health.
    pub health: f64,
    /// Still in the match?
    pub alive: bool,
}

impl From<&Body> for BodySnapshot {
    fn from(body: &Body) -> Self {
        Self {
            id: body.id,
            label: body.label.clone(),
            color: body.color.clone(),
            x: body.position.x,
            y: body.position.y,
            orientation: body.orientation,
            radius: body.radius,
            health: body.health,
            alive: body.alive,
        }
    }
}

/// Whole-match view at one tick.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    /// Tick the snapshot was taken at.
    pub tick: u32,
    /// Match still running?
    pub running: bool,
    /// Winner, once the match has ended.
    pub winner: Option<ParticipantId>,
    /// Arena radius for scaling the view.
    pub arena_radius: f64,
    /// Every body in spawn order, eliminated ones included.
    pub bodies: Vec<BodySnapshot>,
}

impl From<&Match> for MatchSnapshot {
    fn from(state: &Match) -> Self {
        Self {
            tick: state.tick_count(),
            running: state.is_running(),
            winner: state.winner(),
            arena_radius: state.settings.arena_radius,
            bodies: state.bodies().iter().map(BodySnapshot::from).collect(),
        }
    }
}

impl MatchSnapshot {
    /// Number of bodies alive in this snapshot.
    pub fn alive_count(&self) -> usize {
        self.bodies.iter().filter(|b| b.alive).count()
    }

    /// Serialize to a single JSON line.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl Match {
    /// Snapshot of the current state for rendering.
    pub fn snapshot(&self) -> MatchSnapshot {
        MatchSnapshot::from(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::body::EliminationCause;
    use crate::game::roster::default_roster;
    use crate::game::settings::Settings;

    #[test]
    fn test_snapshot_mirrors_match() {
        let mut state = Match::start(&default_roster(3), Settings::default()).unwrap();
        state.eliminate_body(1, EliminationCause::Settled);

        let snapshot = state.snapshot();
        assert_eq!(snapshot.tick, 0);
        assert!(snapshot.running);
        assert_eq!(snapshot.arena_radius, 250.0);
        assert_eq!(snapshot.bodies.len(), 3);
        assert_eq!(snapshot.alive_count(), 2);

        let body = &state.bodies()[0];
        assert_eq!(snapshot.bodies[0].id, body.id);
        assert_eq!(snapshot.bodies[0].x, body.position.x);
        assert_eq!(snapshot.bodies[0].label, "Top 1");
    }

    #[test]
    fn test_json_line_has_no_newlines() {
        let state = Match::start(&default_roster(4), Settings::default()).unwrap();
        let line = state.snapshot().to_json_line().unwrap();
        assert!(!line.contains('\n'));

        let parsed: MatchSnapshot = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.bodies.len(), 4);
    }
}
