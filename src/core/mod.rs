//! Core deterministic primitives.
//!
//! Vector math, the seeded RNG and state hashing. Nothing in here knows
//! about bats or sessions.

pub mod vec2;
pub mod rng;
pub mod hash;

// Re-export core types
pub use vec2::Vec2;
pub use rng::DeterministicRng;
pub use hash::{compute_state_hash, StateHash, StateHasher};
