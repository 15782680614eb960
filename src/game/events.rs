//! Game Events
//!
//! Events generated while a session runs, for replay, logging and the
//! feedback hooks.

use serde::{Serialize, Deserialize};
use crate::core::vec2::Vec2;
use crate::game::state::{BatId, LossReason, Side};

/// Game event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEventData {
    /// Bat entered the live set
    BatSpawned {
        /// New bat
        bat_id: BatId,
        /// Edge it enters from
        side: Side,
        /// Depth; lower is nearer
        depth: f32,
    },

    /// Bat outlived its lifespan
    BatExpired {
        /// Expired bat
        bat_id: BatId,
    },

    /// Tap landed on a bat
    BatHit {
        /// Bat that was hit
        bat_id: BatId,
        /// Points added to the score
        awarded: u32,
        /// Streak bonus before the multiplier
        combo_bonus: u32,
        /// Streak length after this hit
        streak: u32,
        /// Score after this hit
        new_score: u32,
    },

    /// Tap landed on nothing
    Missed {
        /// Where the tap landed
        position: Vec2,
        /// Stamina removed by the miss
        stamina_lost: f64,
    },

    /// Countdown and passive drain step
    Ticked {
        /// Countdown after the tick (ms)
        time_remaining_ms: u64,
        /// Stamina after the drain
        stamina: f64,
    },

    /// Stamina crossed from above 25 to 25 or below
    LowStamina {
        /// Stamina after the crossing
        stamina: f64,
    },

    /// Session reached a terminal phase
    SessionEnded {
        /// Kill target reached
        won: bool,
        /// Why the session was lost, if it was
        loss_reason: Option<LossReason>,
    },
}

/// A game event with its session time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameEvent {
    /// Session time when the event occurred (ms)
    pub time_ms: u64,

    /// Bat involved, if any
    pub bat_id: Option<BatId>,

    /// Event data
    pub data: GameEventData,
}

impl GameEvent {
    /// Create a new event.
    pub fn new(time_ms: u64, data: GameEventData) -> Self {
        let bat_id = match &data {
            GameEventData::BatSpawned { bat_id, .. } => Some(*bat_id),
            GameEventData::BatExpired { bat_id } => Some(*bat_id),
            GameEventData::BatHit { bat_id, .. } => Some(*bat_id),
            _ => None,
        };

        Self {
            time_ms,
            bat_id,
            data,
        }
    }

    /// Create bat spawned event.
    pub fn bat_spawned(time_ms: u64, bat_id: BatId, side: Side, depth: f32) -> Self {
        Self::new(time_ms, GameEventData::BatSpawned { bat_id, side, depth })
    }

    /// Create bat expired event.
    pub fn bat_expired(time_ms: u64, bat_id: BatId) -> Self {
        Self::new(time_ms, GameEventData::BatExpired { bat_id })
    }

    /// Create bat hit event.
    pub fn bat_hit(time_ms: u64, bat_id: BatId, awarded: u32, combo_bonus: u32, streak: u32, new_score: u32) -> Self {
        Self::new(
            time_ms,
            GameEventData::BatHit {
                bat_id,
                awarded,
                combo_bonus,
                streak,
                new_score,
            },
        )
    }

    /// Create missed event.
    pub fn missed(time_ms: u64, position: Vec2, stamina_lost: f64) -> Self {
        Self::new(time_ms, GameEventData::Missed { position, stamina_lost })
    }

    /// Create ticked event.
    pub fn ticked(time_ms: u64, time_remaining_ms: u64, stamina: f64) -> Self {
        Self::new(time_ms, GameEventData::Ticked { time_remaining_ms, stamina })
    }

    /// Create low stamina event.
    pub fn low_stamina(time_ms: u64, stamina: f64) -> Self {
        Self::new(time_ms, GameEventData::LowStamina { stamina })
    }

    /// Create session ended event.
    pub fn session_ended(time_ms: u64, won: bool, loss_reason: Option<LossReason>) -> Self {
        Self::new(time_ms, GameEventData::SessionEnded { won, loss_reason })
    }

    /// Is this the terminal event?
    pub fn is_terminal(&self) -> bool {
        matches!(self.data, GameEventData::SessionEnded { .. })
    }
}
