//! Replay System
//!
//! Matches are pure functions of roster, settings and step, so a match
//! can be recorded as those inputs plus periodic state hashes and later
//! checked by re-running it.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    REPLAY                                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  transcript.rs   - Match transcript recording (JSON/bincode)│
//! │  verify.rs       - Verification by replay                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod transcript;
pub mod verify;

// Re-export key types
pub use transcript::{
    record_match, MatchMetadata, MatchResult, MatchTranscript, StateCheckpoint,
    TranscriptError, TranscriptEvent, TranscriptRecorder, CHECKPOINT_INTERVAL,
};
pub use verify::{verify_transcript, CheckpointResult, VerificationError, VerificationResult};
