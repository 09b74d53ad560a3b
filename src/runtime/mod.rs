//! Runtime Module
//!
//! Async driving of matches (non-deterministic timing, deterministic
//! results). Everything here sits outside the simulation: it decides when
//! ticks run, never what they do.

pub mod runner;
pub mod snapshot;

// Re-export key types
pub use runner::{
    MatchHandle, MatchOutcome, MatchRunner, RunMode, RunnerCommand, RunnerConfig, RunnerError,
};
pub use snapshot::{BodySnapshot, MatchSnapshot};
