//! Core deterministic primitives.
//!
//! Everything the simulation needs that is not battle-specific:
//! the seeded generator, the vector type and state hashing.

pub mod vec2;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
