//! Game Logic Module
//!
//! All session simulation code. Deterministic given a seed and a tap log.
//!
//! ## Module Structure
//!
//! - `profile`: Difficulty keys and tuning profiles
//! - `state`: Bat entity, session state, outcome
//! - `trajectory`: Pure pose of a bat at an elapsed time
//! - `spawner`: Live set, population cap, spawn cadence, expiry
//! - `collision`: Tap hit detection
//! - `tick`: Tick / Hit / Miss state machine
//! - `events`: Game events for replay and feedback
//! - `input`: Tap input and the recorded tap log

pub mod profile;
pub mod state;
pub mod trajectory;
pub mod spawner;
pub mod collision;
pub mod tick;
pub mod events;
pub mod input;

// Re-export key types
pub use profile::{DifficultyKey, DifficultyProfile, ProfileError};
pub use state::{Bat, BatId, LossReason, Outcome, SessionPhase, SessionState, Side};
pub use spawner::{EntitySpawner, SpawnAttempt, SpawnConfig, Viewport};
pub use tick::StepResult;
pub use events::{GameEvent, GameEventData};
pub use input::{Tap, TapLog};
