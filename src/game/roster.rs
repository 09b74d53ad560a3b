//! Roster
//!
//! Participants entered into a battle. Labels and colors are display
//! metadata carried through to snapshots untouched.

use std::fmt;
use serde::{Deserialize, Serialize};

/// Stable participant identifier, unique within a match.
///
/// Implements Ord so standings can tie-break deterministically.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u32);

impl ParticipantId {
    /// Create from a raw value.
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// One roster entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Stable identifier
    pub id: ParticipantId,
    /// Display name
    pub label: String,
    /// Display color (any CSS-style string, e.g. `#e6194b`)
    pub color: String,
}

impl Participant {
    /// Create a roster entry.
    pub fn new(id: u32, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            id: ParticipantId(id),
            label: label.into(),
            color: color.into(),
        }
    }
}

/// Colors handed out by [`default_roster`], cycled when there are more entrants.
pub const DEFAULT_PALETTE: [&str; 10] = [
    "#e6194b", "#3cb44b", "#ffe119", "#4363d8", "#f58231",
    "#911eb4", "#46f0f0", "#f032e6", "#bcf60c", "#fabebe",
];

/// Build a roster of `count` participants named `Top 1..=count`.
pub fn default_roster(count: usize) -> Vec<Participant> {
    (0..count)
        .map(|i| {
            Participant::new(
                i as u32 + 1,
                format!("Top {}", i + 1),
                DEFAULT_PALETTE[i % DEFAULT_PALETTE.len()],
            )
        })
        .collect()
}

/// First id that appears more than once, if any.
pub fn find_duplicate_id(roster: &[Participant]) -> Option<ParticipantId> {
    let mut seen = std::collections::BTreeSet::new();
    roster.iter().map(|p| p.id).find(|id| !seen.insert(*id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roster() {
        let roster = default_roster(12);
        assert_eq!(roster.len(), 12);
        assert_eq!(roster[0].id, ParticipantId(1));
        assert_eq!(roster[0].label, "Top 1");
        // Palette wraps
        assert_eq!(roster[10].color, roster[0].color);
        assert!(find_duplicate_id(&roster).is_none());
    }

    #[test]
    fn test_find_duplicate_id() {
        let roster = vec![
            Participant::new(1, "a", "red"),
            Participant::new(2, "b", "blue"),
            Participant::new(1, "c", "green"),
        ];
        assert_eq!(find_duplicate_id(&roster), Some(ParticipantId(1)));
    }

    #[test]
    fn test_participant_id_serializes_transparently() {
        let json = serde_json::to_string(&Participant::new(7, "x", "#fff")).unwrap();
        assert_eq!(json, r##"{"id":7,"label":"x","color":"#fff"}"##);
    }
}
