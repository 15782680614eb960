//! Session State Definitions
//!
//! The bat entity, the single mutable session record, and the terminal
//! outcome it collapses into.

use serde::{Serialize, Deserialize};

use crate::core::vec2::Vec2;
use crate::game::profile::DifficultyKey;

/// Upper bound of the stamina bar.
pub const MAX_STAMINA: f64 = 100.0;

// =============================================================================
// BAT ENTITY
// =============================================================================

/// Bat identifier, unique within a session (monotonic counter).
pub type BatId = u32;

/// Side of the arena a bat enters from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Side {
    /// Enters at the left edge, flies right
    Left = 0,
    /// Enters at the right edge, flies left
    Right = 1,
}

impl Side {
    /// +1 for LEFT, -1 for RIGHT.
    #[inline]
    pub fn sign(self) -> f32 {
        match self {
            Side::Left => 1.0,
            Side::Right => -1.0,
        }
    }
}

/// A single transient target.
///
/// Everything except `id` is fixed at spawn; the pose at any instant is a
/// pure function of these fields (see `game::trajectory`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bat {
    /// Unique bat ID (monotonic counter)
    pub id: BatId,

    /// Session-relative creation time (ms)
    pub spawn_time_ms: u64,

    /// Entry side
    pub side: Side,

    /// Off-screen start point
    pub origin: Vec2,

    /// Off-screen end point on the opposite side
    pub destination: Vec2,

    /// Depth in the configured range; lower is nearer
    pub depth: f32,

    /// Render and hitbox scale, derived from depth
    pub scale: f32,

    /// Profile speed at spawn time (drives bob and wing periods)
    pub speed: f32,

    /// Time to cross from origin to destination (ms)
    pub flight_duration_ms: u64,

    /// Time after which the bat self-expires (ms)
    pub lifespan_ms: u64,

    /// Points awarded for a hit before combo and multiplier
    pub point_value: u32,
}

impl Bat {
    /// Milliseconds since spawn (0 before spawn).
    #[inline]
    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.spawn_time_ms)
    }

    /// Has this bat outlived its lifespan?
    #[inline]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        self.elapsed_ms(now_ms) >= self.lifespan_ms
    }

    /// Draw order for the renderer.
    #[inline]
    pub fn z_order(&self) -> i32 {
        self.depth.round() as i32
    }
}

// =============================================================================
// SESSION PHASE
// =============================================================================

/// Current phase of the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[derive(Default)]
pub enum SessionPhase {
    /// Accepting ticks, hits and misses
    #[default]
    Active,
    /// Kill target reached
    Won,
    /// Stamina or time ran out
    Lost,
}

impl SessionPhase {
    /// WON and LOST accept no further events.
    #[inline]
    pub fn is_terminal(self) -> bool {
        !matches!(self, SessionPhase::Active)
    }
}

/// Why a session was lost.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LossReason {
    /// Stamina reached zero
    StaminaDepleted,
    /// Countdown reached zero
    TimeExpired,
}

// =============================================================================
// SESSION STATE
// =============================================================================

/// The single mutable record of a session.
///
/// Only `game::tick` mutates it. Once `phase` is terminal every event is a
/// no-op.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    /// Difficulty the session was created with
    pub difficulty: DifficultyKey,

    /// Countdown length (ms)
    pub total_time_ms: u64,

    /// Countdown remaining (ms), never negative
    pub time_remaining_ms: u64,

    /// Stamina in [0, 100]
    pub stamina: f64,

    /// Accumulated score
    pub score: u32,

    /// Bats hit so far
    pub kill_count: u32,

    /// Kills required to win
    pub kill_target: u32,

    /// Hits landed within the combo window of each other
    pub consecutive_hit_streak: u32,

    /// Time of the last hit; unset until the first hit
    pub last_hit_time_ms: Option<u64>,

    /// Current phase
    pub phase: SessionPhase,

    /// Set together with `phase = Lost`
    pub loss_reason: Option<LossReason>,
}

impl SessionState {
    /// Create a fresh ACTIVE session record.
    pub fn new(difficulty: DifficultyKey, total_time_ms: u64, initial_stamina: f64, kill_target: u32) -> Self {
        Self {
            difficulty,
            total_time_ms,
            time_remaining_ms: total_time_ms,
            stamina: initial_stamina.clamp(0.0, MAX_STAMINA),
            score: 0,
            kill_count: 0,
            kill_target,
            consecutive_hit_streak: 0,
            last_hit_time_ms: None,
            phase: SessionPhase::Active,
            loss_reason: None,
        }
    }

    /// Is the session still accepting events?
    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase == SessionPhase::Active
    }

    /// Fraction of the countdown still left, in [0, 1].
    pub fn time_fraction_remaining(&self) -> f64 {
        if self.total_time_ms == 0 {
            return 0.0;
        }
        self.time_remaining_ms as f64 / self.total_time_ms as f64
    }

    /// Build the outcome record. `None` while the session is ACTIVE.
    pub fn outcome(&self) -> Option<Outcome> {
        if !self.phase.is_terminal() {
            return None;
        }
        Some(Outcome {
            won: self.phase == SessionPhase::Won,
            score: self.score,
            kill_count: self.kill_count,
            kill_target: self.kill_target,
            time_remaining_ms: self.time_remaining_ms,
            difficulty: self.difficulty,
            loss_reason: self.loss_reason,
        })
    }
}

// =============================================================================
// OUTCOME
// =============================================================================

/// Immutable terminal record handed to navigation and persistence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// Kill target reached before stamina or time ran out
    pub won: bool,
    /// Final score
    pub score: u32,
    /// Bats hit
    pub kill_count: u32,
    /// Kills that were required
    pub kill_target: u32,
    /// Countdown left at the end (ms)
    pub time_remaining_ms: u64,
    /// Difficulty played
    pub difficulty: DifficultyKey,
    /// Present only for lost sessions
    pub loss_reason: Option<LossReason>,
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_bat(spawn_time_ms: u64, lifespan_ms: u64) -> Bat {
        Bat {
            id: 0,
            spawn_time_ms,
            side: Side::Left,
            origin: Vec2::new(-80.0, 300.0),
            destination: Vec2::new(470.0, 300.0),
            depth: 7.4,
            scale: 1.0,
            speed: 0.8,
            flight_duration_ms: 800,
            lifespan_ms,
            point_value: 100,
        }
    }

    #[test]
    fn test_bat_expiry_boundary() {
        let bat = test_bat(1000, 1000);
        assert!(!bat.is_expired(1000));
        assert!(!bat.is_expired(1999));
        assert!(bat.is_expired(2000));
        // Before spawn is never expired
        assert!(!bat.is_expired(0));
    }

    #[test]
    fn test_bat_z_order() {
        assert_eq!(test_bat(0, 1).z_order(), 7);
    }

    #[test]
    fn test_new_session_is_active() {
        let state = SessionState::new(DifficultyKey::Easy, 120_000, 100.0, 15);
        assert!(state.is_active());
        assert_eq!(state.time_remaining_ms, 120_000);
        assert_eq!(state.last_hit_time_ms, None);
        assert!(state.outcome().is_none());
    }

    #[test]
    fn test_initial_stamina_clamped() {
        let state = SessionState::new(DifficultyKey::Easy, 1000, 250.0, 15);
        assert_eq!(state.stamina, MAX_STAMINA);
    }

    #[test]
    fn test_outcome_after_terminal() {
        let mut state = SessionState::new(DifficultyKey::Hard, 120_000, 100.0, 25);
        state.phase = SessionPhase::Lost;
        state.loss_reason = Some(LossReason::TimeExpired);
        state.time_remaining_ms = 0;

        let outcome = state.outcome().unwrap();
        assert!(!outcome.won);
        assert_eq!(outcome.kill_target, 25);
        assert_eq!(outcome.difficulty, DifficultyKey::Hard);
        assert_eq!(outcome.loss_reason, Some(LossReason::TimeExpired));
    }

    #[test]
    fn test_phase_terminal() {
        assert!(!SessionPhase::Active.is_terminal());
        assert!(SessionPhase::Won.is_terminal());
        assert!(SessionPhase::Lost.is_terminal());
    }
}
