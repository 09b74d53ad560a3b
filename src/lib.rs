//! # Top Battle
//!
//! Deterministic elimination battles between spinning tops in a circular
//! arena. Tops launch from the rim, collide, lose health, and drop out
//! until one remains.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    TOP BATTLE                                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── vec2.rs     - 2D vector (f64)                           │
//! │  ├── rng.rs      - Seeded 32-bit generator                   │
//! │  └── hash.rs     - State hashing for verification            │
//! │                                                              │
//! │  game/           - Simulation (deterministic)                │
//! │  ├── arena.rs    - Spawning around the rim                   │
//! │  ├── physics.rs  - Integration and damping                   │
//! │  ├── collision.rs- Wall and pairwise contacts                │
//! │  ├── elimination.rs - Elimination and termination            │
//! │  ├── tick.rs     - One simulation step                       │
//! │  └── clock.rs    - Fixed-step accumulator                    │
//! │                                                              │
//! │  replay/         - Transcripts and verification by replay    │
//! │                                                              │
//! │  runtime/        - Async driving (non-deterministic timing)  │
//! │  ├── runner.rs   - Tokio match task                          │
//! │  └── snapshot.rs - Render snapshots                          │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/` and `game/` modules are deterministic:
//! - One seeded generator, drawn only while spawning, in a fixed order
//! - Bodies visited in spawn order in every stage
//! - No system time dependencies; the caller supplies the step
//!
//! Given the same roster, settings and step, a match produces
//! bit-identical states on the same platform and build.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod game;
pub mod replay;
pub mod runtime;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use core::vec2::Vec2;
pub use game::roster::{Participant, ParticipantId};
pub use game::settings::Settings;
pub use game::state::{Match, MatchError};
pub use game::tick::{tick, TickResult};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default simulation tick rate (Hz)
pub const TICK_RATE: u32 = 60;

/// Default fixed step in seconds
pub const FIXED_DT: f64 = 1.0 / TICK_RATE as f64;
