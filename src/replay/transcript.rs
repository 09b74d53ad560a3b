//! Match Transcript Recording
//!
//! Records everything needed to re-run a match and check its outcome:
//! roster, settings, the fixed step, periodic state hashes and the final
//! result. A match is a pure function of those inputs, so no per-tick
//! data is stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::core::hash::StateHash;
use crate::game::body::EliminationCause;
use crate::game::events::{GameEvent, GameEventData};
use crate::game::roster::{Participant, ParticipantId};
use crate::game::settings::{validate_timestep, Settings, SettingsError};
use crate::game::state::{Match, MatchError};
use crate::game::tick::tick;

/// Current transcript version.
pub const TRANSCRIPT_VERSION: u8 = 1;

/// Checkpoint interval in ticks (every 5 seconds at 60Hz).
pub const CHECKPOINT_INTERVAL: u32 = 300;

/// Complete record of one match.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchTranscript {
    /// Version for forward compatibility.
    pub version: u8,

    /// Inputs the match is a function of.
    pub metadata: MatchMetadata,

    /// State hash checkpoints (every `CHECKPOINT_INTERVAL` ticks).
    pub checkpoints: Vec<StateCheckpoint>,

    /// Final match result.
    pub result: Option<MatchResult>,

    /// Eliminations and the match end.
    pub events: Vec<TranscriptEvent>,
}

/// Match inputs and identity.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchMetadata {
    /// Unique match identifier.
    pub match_id: Uuid,

    /// When recording started.
    pub recorded_at: DateTime<Utc>,

    /// Roster in spawn order.
    pub roster: Vec<Participant>,

    /// Settings the match ran with.
    pub settings: Settings,

    /// Fixed step in seconds.
    pub dt: f64,

    /// Hash of `settings`, checked before replaying.
    pub settings_hash: StateHash,

    /// Hash of the state at tick 0.
    pub initial_hash: StateHash,
}

/// State checkpoint for partial verification.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateCheckpoint {
    /// Tick number.
    pub tick: u32,

    /// State hash at this tick.
    pub state_hash: StateHash,
}

/// Final match outcome.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Tick the match ended on.
    pub end_tick: u32,

    /// Sole survivor (None on a draw).
    pub winner: Option<ParticipantId>,

    /// Final standings, best first.
    pub placements: Vec<(ParticipantId, u32)>,

    /// State hash at `end_tick`.
    pub final_state_hash: StateHash,
}

/// Transcript event (subset of GameEvent; impacts are not kept).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TranscriptEvent {
    /// A top left the match.
    Eliminated {
        /// Tick when elimination occurred.
        tick: u32,
        /// Eliminated participant.
        body: ParticipantId,
        /// Why it left.
        cause: EliminationCause,
        /// Final placement.
        placement: u32,
    },

    /// The match ended.
    Ended {
        /// Tick the match ended on.
        tick: u32,
        /// Winner, if any.
        winner: Option<ParticipantId>,
    },
}

impl TranscriptEvent {
    /// Convert a GameEvent to TranscriptEvent (if relevant).
    pub fn from_game_event(event: &GameEvent) -> Option<Self> {
        match &event.data {
            GameEventData::BodyEliminated { body, cause, placement } => Some(Self::Eliminated {
                tick: event.tick,
                body: *body,
                cause: *cause,
                placement: *placement,
            }),
            GameEventData::MatchEnded { winner, .. } => Some(Self::Ended {
                tick: event.tick,
                winner: *winner,
            }),
            _ => None,
        }
    }
}

/// Errors that can occur with transcripts.
#[derive(Debug, Error)]
pub enum TranscriptError {
    /// Binary encoding or decoding failed.
    #[error("binary transcript error: {0}")]
    Binary(#[from] bincode::Error),

    /// JSON encoding or decoding failed.
    #[error("JSON transcript error: {0}")]
    Json(#[from] serde_json::Error),

    /// Version mismatch.
    #[error("transcript version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Version this build writes.
        expected: u8,
        /// Version found.
        got: u8,
    },

    /// The match could not be started.
    #[error("cannot record match: {0}")]
    Match(#[from] MatchError),

    /// Bad fixed step.
    #[error("cannot record match: {0}")]
    Timestep(#[from] SettingsError),

    /// Recording stopped before the match ended.
    #[error("match still running after {ticks} ticks")]
    Unfinished {
        /// Ticks simulated.
        ticks: u32,
    },
}

impl MatchTranscript {
    /// Create a new transcript from match metadata.
    pub fn new(metadata: MatchMetadata) -> Self {
        Self {
            version: TRANSCRIPT_VERSION,
            metadata,
            checkpoints: Vec::new(),
            result: None,
            events: Vec::new(),
        }
    }

    /// Record a state checkpoint.
    pub fn add_checkpoint(&mut self, tick: u32, state_hash: StateHash) {
        self.checkpoints.push(StateCheckpoint { tick, state_hash });
    }

    /// Record a game event if it is significant.
    pub fn record_event(&mut self, event: &GameEvent) {
        if let Some(transcript_event) = TranscriptEvent::from_game_event(event) {
            self.events.push(transcript_event);
        }
    }

    /// Finalize the transcript with match result.
    pub fn finalize(&mut self, result: MatchResult) {
        self.result = Some(result);
    }

    /// Check if transcript is complete.
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    /// Participant count.
    pub fn participant_count(&self) -> usize {
        self.metadata.roster.len()
    }

    /// Serialize to bytes using bincode.
    pub fn to_bytes(&self) -> Result<Vec<u8>, TranscriptError> {
        Ok(bincode::serialize(self)?)
    }

    /// Deserialize from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self, TranscriptError> {
        let transcript: Self = bincode::deserialize(data)?;
        transcript.check_version()?;
        Ok(transcript)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, TranscriptError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, TranscriptError> {
        let transcript: Self = serde_json::from_str(json)?;
        transcript.check_version()?;
        Ok(transcript)
    }

    fn check_version(&self) -> Result<(), TranscriptError> {
        if self.version != TRANSCRIPT_VERSION {
            return Err(TranscriptError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: self.version,
            });
        }
        Ok(())
    }
}

/// Builds a transcript alongside a running match.
///
/// Call [`observe`](Self::observe) after every tick and
/// [`finish`](Self::finish) once the match has ended.
#[derive(Debug)]
pub struct TranscriptRecorder {
    transcript: MatchTranscript,
}

impl TranscriptRecorder {
    /// Start recording `state`, which must be at tick 0.
    pub fn new(match_id: Uuid, roster: &[Participant], state: &Match, dt: f64) -> Self {
        let metadata = MatchMetadata {
            match_id,
            recorded_at: Utc::now(),
            roster: roster.to_vec(),
            settings: state.settings.clone(),
            dt,
            settings_hash: state.settings.compute_hash(),
            initial_hash: state.compute_hash(),
        };
        Self {
            transcript: MatchTranscript::new(metadata),
        }
    }

    /// Record the events of the tick just run, plus a checkpoint if due.
    pub fn observe(&mut self, state: &Match, events: &[GameEvent]) {
        for event in events {
            self.transcript.record_event(event);
        }
        if state.tick_count() > 0 && state.tick_count() % CHECKPOINT_INTERVAL == 0 {
            self.transcript.add_checkpoint(state.tick_count(), state.compute_hash());
        }
    }

    /// Close the transcript with the final result.
    ///
    /// A match that is still running is recorded as incomplete.
    pub fn finish(mut self, state: &Match) -> MatchTranscript {
        if state.is_ended() {
            self.transcript.finalize(MatchResult {
                end_tick: state.tick_count(),
                winner: state.winner(),
                placements: state.placements(),
                final_state_hash: state.compute_hash(),
            });
        }
        self.transcript
    }
}

/// Run a match to completion and record it.
pub fn record_match(
    roster: &[Participant],
    settings: Settings,
    dt: f64,
    max_ticks: u32,
) -> Result<(MatchTranscript, Match), TranscriptError> {
    validate_timestep(dt)?;
    let mut state = Match::start(roster, settings)?;
    let mut recorder = TranscriptRecorder::new(Uuid::new_v4(), roster, &state, dt);

    while state.is_running() && state.tick_count() < max_ticks {
        let result = tick(&mut state, dt);
        recorder.observe(&state, &result.events);
    }

    if state.is_running() {
        return Err(TranscriptError::Unfinished { ticks: state.tick_count() });
    }
    Ok((recorder.finish(&state), state))
}
