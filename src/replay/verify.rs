//! Verification API
//!
//! Verify a recorded match by deterministic replay: rebuild it from the
//! transcript's roster and settings, re-run it with the recorded step and
//! compare every checkpoint plus the final state.

use thiserror::Error;

use crate::core::hash::StateHash;
use crate::game::roster::ParticipantId;
use crate::game::state::{Match, MatchError};
use crate::game::tick::tick;
use crate::replay::transcript::{MatchTranscript, TRANSCRIPT_VERSION};

/// Verification result.
#[derive(Debug)]
pub struct VerificationResult {
    /// Did verification pass?
    pub valid: bool,

    /// Final state hash (from replay).
    pub computed_final_hash: StateHash,

    /// Expected final hash (from transcript).
    pub expected_final_hash: StateHash,

    /// Checkpoint verification results.
    pub checkpoint_results: Vec<CheckpointResult>,

    /// Detailed error if verification failed.
    pub error: Option<VerificationError>,
}

impl VerificationResult {
    fn failed(error: VerificationError, checkpoint_results: Vec<CheckpointResult>) -> Self {
        Self {
            valid: false,
            computed_final_hash: [0; 32],
            expected_final_hash: [0; 32],
            checkpoint_results,
            error: Some(error),
        }
    }
}

/// Result of verifying a single checkpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckpointResult {
    /// Tick number.
    pub tick: u32,
    /// Expected hash from transcript.
    pub expected: StateHash,
    /// Computed hash from replay.
    pub computed: StateHash,
    /// Did this checkpoint match?
    pub valid: bool,
}

/// Errors that can occur during verification.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VerificationError {
    /// Transcript version mismatch.
    #[error("version mismatch: expected {expected}, got {got}")]
    VersionMismatch {
        /// Expected version.
        expected: u8,
        /// Actual version.
        got: u8,
    },

    /// Transcript is incomplete.
    #[error("transcript is incomplete")]
    IncompleteTranscript,

    /// Recorded settings do not hash to the recorded settings hash.
    #[error("settings hash mismatch")]
    SettingsMismatch,

    /// The recorded roster or settings no longer start a match.
    #[error("match could not be restarted: {0}")]
    Restart(#[from] MatchError),

    /// Initial state hash mismatch.
    #[error("initial state hash mismatch")]
    InitialStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Checkpoint hash mismatch.
    #[error("checkpoint mismatch at tick {tick}")]
    CheckpointMismatch {
        /// Tick where mismatch occurred.
        tick: u32,
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },

    /// Replay ended on a different tick or with a different winner.
    #[error("result mismatch: expected end at tick {expected_tick} won by {expected_winner:?}, replay ended at tick {tick} won by {winner:?}")]
    ResultMismatch {
        /// Recorded end tick.
        expected_tick: u32,
        /// Recorded winner.
        expected_winner: Option<ParticipantId>,
        /// Replayed end tick.
        tick: u32,
        /// Replayed winner.
        winner: Option<ParticipantId>,
    },

    /// Final state hash mismatch.
    #[error("final state hash mismatch")]
    FinalStateMismatch {
        /// Expected hash.
        expected: StateHash,
        /// Computed hash.
        computed: StateHash,
    },
}

/// Verify a match transcript by full replay.
pub fn verify_transcript(transcript: &MatchTranscript) -> VerificationResult {
    if transcript.version != TRANSCRIPT_VERSION {
        return VerificationResult::failed(
            VerificationError::VersionMismatch {
                expected: TRANSCRIPT_VERSION,
                got: transcript.version,
            },
            vec![],
        );
    }

    // Check transcript is complete
    let Some(result) = &transcript.result else {
        return VerificationResult::failed(VerificationError::IncompleteTranscript, vec![]);
    };
    let metadata = &transcript.metadata;

    // 1. Settings must be the ones that were hashed
    if metadata.settings.compute_hash() != metadata.settings_hash {
        return VerificationResult::failed(VerificationError::SettingsMismatch, vec![]);
    }

    // 2. Rebuild the initial state
    let mut state = match Match::start(&metadata.roster, metadata.settings.clone()) {
        Ok(state) => state,
        Err(e) => return VerificationResult::failed(e.into(), vec![]),
    };

    let initial_hash = state.compute_hash();
    if initial_hash != metadata.initial_hash {
        return VerificationResult::failed(
            VerificationError::InitialStateMismatch {
                expected: metadata.initial_hash,
                computed: initial_hash,
            },
            vec![],
        );
    }

    // 3. Replay tick by tick with checkpoint verification
    let mut checkpoint_results = Vec::new();
    let mut checkpoints = transcript.checkpoints.iter().peekable();

    while state.is_running() && state.tick_count() < result.end_tick {
        tick(&mut state, metadata.dt);

        while let Some(checkpoint) = checkpoints.next_if(|c| c.tick <= state.tick_count()) {
            let computed = state.compute_hash();
            let valid = checkpoint.tick == state.tick_count() && computed == checkpoint.state_hash;

            checkpoint_results.push(CheckpointResult {
                tick: checkpoint.tick,
                expected: checkpoint.state_hash,
                computed,
                valid,
            });

            if !valid {
                return VerificationResult::failed(
                    VerificationError::CheckpointMismatch {
                        tick: checkpoint.tick,
                        expected: checkpoint.state_hash,
                        computed,
                    },
                    checkpoint_results,
                );
            }
        }
    }

    // 4. Same ending
    if state.is_running() || state.tick_count() != result.end_tick || state.winner() != result.winner {
        return VerificationResult::failed(
            VerificationError::ResultMismatch {
                expected_tick: result.end_tick,
                expected_winner: result.winner,
                tick: state.tick_count(),
                winner: state.winner(),
            },
            checkpoint_results,
        );
    }

    // 5. Verify final state
    let final_hash = state.compute_hash();
    let valid = final_hash == result.final_state_hash;

    VerificationResult {
        valid,
        computed_final_hash: final_hash,
        expected_final_hash: result.final_state_hash,
        checkpoint_results,
        error: if valid {
            None
        } else {
            Some(VerificationError::FinalStateMismatch {
                expected: result.final_state_hash,
                computed: final_hash,
            })
        },
    }
}
