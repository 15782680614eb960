//! Session Layer
//!
//! Wraps the deterministic game code in a session: explicit
//! configuration, the synchronous controller, render snapshots and the
//! tokio driver that feeds it real time.
//!
//! ## Module Structure
//!
//! - `config`: SessionConfig and ConfigError
//! - `clock`: Monotonic and manual session clocks
//! - `controller`: SessionController, feedback hooks, replay
//! - `runner`: Real-time tokio driver
//! - `snapshot`: Render snapshots and outcome records

pub mod config;
pub mod clock;
pub mod controller;
pub mod runner;
pub mod snapshot;

pub use config::{ConfigError, SessionConfig};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use controller::{replay, FeedbackHooks, NoopHooks, SessionController};
pub use runner::{run_session, spawn_session, SessionHandle};
pub use snapshot::{EntitySnapshot, OutcomeRecord, RenderSnapshot, StaminaLevel};
