//! Game Logic Module
//!
//! All battle simulation code. Deterministic given roster, settings and
//! a fixed step.
//!
//! ## Module Structure
//!
//! - `roster`: Participant ids and the default roster
//! - `settings`: Tunable parameters, physics constants, validation
//! - `body`: Per-top simulation state
//! - `arena`: Spawning bodies around the rim
//! - `state`: The match aggregate
//! - `physics`: Integration and damping
//! - `collision`: Wall and pairwise contact resolution
//! - `elimination`: Elimination causes and termination
//! - `tick`: One full simulation step
//! - `clock`: Fixed-step accumulator for real-time drivers
//! - `events`: Game events for feedback and replay

pub mod roster;
pub mod settings;
pub mod body;
pub mod arena;
pub mod state;
pub mod physics;
pub mod collision;
pub mod elimination;
pub mod tick;
pub mod clock;
pub mod events;

// Re-export key types
pub use roster::{Participant, ParticipantId, default_roster};
pub use settings::{Settings, SettingsError};
pub use body::{Body, EliminationCause};
pub use state::{Match, MatchError};
pub use tick::{tick, TickResult};
pub use clock::{FixedStepClock, FrameReport};
pub use events::{GameEvent, GameEventData};
