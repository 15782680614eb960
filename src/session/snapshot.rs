//! Render Snapshots and Outcome Records
//!
//! What the session exposes to rendering (polled or pushed every frame)
//! and to navigation/persistence (once, at the end).

use chrono::{DateTime, Utc};
use serde::{Serialize, Deserialize};
use uuid::Uuid;

use crate::game::state::{Bat, Outcome, SessionPhase, SessionState};
use crate::game::trajectory;

/// Stamina bar colour band.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StaminaLevel {
    /// Above 60
    High,
    /// Above 30
    Medium,
    /// 30 or below
    Low,
}

impl StaminaLevel {
    /// Band for a stamina value.
    pub fn from_stamina(stamina: f64) -> Self {
        if stamina > 60.0 {
            StaminaLevel::High
        } else if stamina > 30.0 {
            StaminaLevel::Medium
        } else {
            StaminaLevel::Low
        }
    }
}

/// One bat as the renderer should draw it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Bat id
    pub id: u32,
    /// Horizontal position (viewport units)
    pub x: f32,
    /// Vertical position (viewport units)
    pub y: f32,
    /// Wing tilt (degrees)
    pub rotation_deg: f32,
    /// Fade in/out, 0 to 1
    pub opacity: f32,
    /// Render scale
    pub scale: f32,
    /// Draw order, the rounded depth
    pub z_order: i32,
}

impl EntitySnapshot {
    /// Pose `bat` at `now_ms`.
    pub fn capture(bat: &Bat, now_ms: u64) -> Self {
        let pose = trajectory::pose(bat, bat.elapsed_ms(now_ms));
        Self {
            id: bat.id,
            x: pose.position.x,
            y: pose.position.y,
            rotation_deg: pose.rotation_deg,
            opacity: pose.opacity,
            scale: bat.scale,
            z_order: bat.z_order(),
        }
    }
}

/// Everything the renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    /// Session time the snapshot was taken at (ms)
    pub time_ms: u64,
    /// Live bats, ordered by id
    pub entities: Vec<EntitySnapshot>,
    /// Stamina, 0 to 100
    pub stamina: f64,
    /// Stamina bar colour band
    pub stamina_level: StaminaLevel,
    /// Score so far
    pub score: u32,
    /// Bats hit so far
    pub kill_count: u32,
    /// Kills needed to win
    pub kill_target: u32,
    /// Countdown left (ms)
    pub time_remaining_ms: u64,
    /// Current streak; shown as "N× COMBO" above 1
    pub combo_count: u32,
    /// Session phase
    pub phase: SessionPhase,
}

impl RenderSnapshot {
    /// Capture the state and live set at `now_ms`.
    pub fn capture<'a, I>(state: &SessionState, live: I, now_ms: u64) -> Self
    where
        I: IntoIterator<Item = &'a Bat>,
    {
        Self {
            time_ms: now_ms,
            entities: live.into_iter().map(|bat| EntitySnapshot::capture(bat, now_ms)).collect(),
            stamina: state.stamina,
            stamina_level: StaminaLevel::from_stamina(state.stamina),
            score: state.score,
            kill_count: state.kill_count,
            kill_target: state.kill_target,
            time_remaining_ms: state.time_remaining_ms,
            combo_count: state.consecutive_hit_streak,
            phase: state.phase,
        }
    }

    /// Should the combo badge be shown?
    pub fn show_combo(&self) -> bool {
        self.combo_count > 1
    }
}

/// Outcome stamped for the navigation and persistence collaborators.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRecord {
    /// Unique session identifier
    pub session_id: Uuid,
    /// When the session ended
    pub finished_at: DateTime<Utc>,
    /// Terminal outcome
    pub outcome: Outcome,
}

impl OutcomeRecord {
    /// Stamp an outcome with the current time.
    pub fn new(session_id: Uuid, outcome: Outcome) -> Self {
        Self {
            session_id,
            finished_at: Utc::now(),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::vec2::Vec2;
    use crate::game::profile::DifficultyKey;
    use crate::game::state::Side;

    #[test]
    fn test_stamina_levels() {
        assert_eq!(StaminaLevel::from_stamina(100.0), StaminaLevel::High);
        assert_eq!(StaminaLevel::from_stamina(60.5), StaminaLevel::High);
        assert_eq!(StaminaLevel::from_stamina(60.0), StaminaLevel::Medium);
        assert_eq!(StaminaLevel::from_stamina(30.5), StaminaLevel::Medium);
        assert_eq!(StaminaLevel::from_stamina(30.0), StaminaLevel::Low);
        assert_eq!(StaminaLevel::from_stamina(0.0), StaminaLevel::Low);
    }

    #[test]
    fn test_capture() {
        let mut state = SessionState::new(DifficultyKey::Easy, 120_000, 100.0, 15);
        state.consecutive_hit_streak = 3;
        let bat = Bat {
            id: 4,
            spawn_time_ms: 1_000,
            side: Side::Right,
            origin: Vec2::new(470.0, 300.0),
            destination: Vec2::new(-80.0, 300.0),
            depth: 2.6,
            scale: 1.3,
            speed: 0.5,
            flight_duration_ms: 44_000,
            lifespan_ms: 55_000,
            point_value: 100,
        };

        let snap = RenderSnapshot::capture(&state, [&bat], 1_000);
        assert_eq!(snap.entities.len(), 1);
        let e = &snap.entities[0];
        assert_eq!((e.id, e.x, e.y), (4, 470.0, 300.0));
        assert_eq!(e.opacity, 0.0);
        assert_eq!(e.rotation_deg, 15.0);
        assert_eq!(e.z_order, 3);
        assert!(snap.show_combo());
        assert_eq!(snap.stamina_level, StaminaLevel::High);
    }

    #[test]
    fn test_outcome_record_serializes() {
        let mut state = SessionState::new(DifficultyKey::Medium, 120_000, 100.0, 20);
        state.phase = SessionPhase::Won;
        let record = OutcomeRecord::new(Uuid::new_v4(), state.outcome().unwrap());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["outcome"]["won"], true);
        assert_eq!(json["outcome"]["difficulty"], "MEDIUM");
    }
}
