//! # Bat Hunt Session Engine
//!
//! Deterministic session engine for Bat Hunt, a tap-to-hit arcade game:
//! bats fly across the screen, the player taps them before stamina or the
//! countdown runs out.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    BAT HUNT ENGINE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/             - Deterministic primitives                │
//! │  ├── vec2.rs       - 2D vector in viewport units             │
//! │  ├── rng.rs        - Deterministic Xorshift128+ PRNG         │
//! │  └── hash.rs       - State hashing for replay verification   │
//! │                                                              │
//! │  game/             - Session simulation (deterministic)      │
//! │  ├── profile.rs    - Difficulty keys and profiles            │
//! │  ├── state.rs      - Bat, session state, outcome             │
//! │  ├── trajectory.rs - Pure bat pose over time                 │
//! │  ├── spawner.rs    - Live set, cap, cadence, expiry          │
//! │  ├── collision.rs  - Tap hit detection                       │
//! │  ├── tick.rs       - Tick / Hit / Miss state machine         │
//! │  ├── events.rs     - Game events                             │
//! │  └── input.rs      - Taps and the tap log                    │
//! │                                                              │
//! │  session/          - Session glue (real time)                │
//! │  ├── config.rs     - Explicit session configuration          │
//! │  ├── clock.rs      - Session clocks                          │
//! │  ├── controller.rs - Synchronous controller, replay          │
//! │  ├── runner.rs     - tokio driver                            │
//! │  └── snapshot.rs   - Render snapshots, outcome records       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism Guarantee
//!
//! The `core/`, `game/` and `session::controller` code never reads a
//! clock and draws all randomness from a seeded Xorshift128+. Given the
//! same config, seed and tap log, a session produces the same state hash.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod session;

// Re-export commonly used types
pub use core::rng::DeterministicRng;
pub use core::vec2::Vec2;
pub use game::profile::{DifficultyKey, DifficultyProfile};
pub use game::state::{Outcome, SessionPhase, SessionState};
pub use game::input::Tap;
pub use session::{ConfigError, SessionConfig, SessionController, RenderSnapshot};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Countdown and stamina tick cadence (ms)
pub const TICK_INTERVAL_MS: u64 = 500;

/// Default session length (ms)
pub const DEFAULT_TIME_LIMIT_MS: u64 = 120_000;
