//! Session State Machine
//!
//! The only code that mutates `SessionState`. Three events drive it:
//!
//! - `tick`: countdown and passive stamina drain, every 500 ms
//! - `register_hit`: score, combo, kill count and stamina recovery
//! - `register_miss`: streak reset and stamina penalty
//!
//! Every event is a no-op once the phase is WON or LOST. The event that
//! first meets a terminal condition decides the outcome; there is no
//! later re-evaluation.

use tracing::debug;

use crate::core::vec2::Vec2;
use crate::game::events::GameEvent;
use crate::game::profile::DifficultyProfile;
use crate::game::state::{BatId, LossReason, Outcome, SessionPhase, SessionState, MAX_STAMINA};

// =============================================================================
// TUNING CONSTANTS
// =============================================================================

/// Stamina drained per tick before modifiers and the profile factor.
pub const BASE_DRAIN_PER_TICK: f64 = 1.5;

/// Above this, drain runs faster.
pub const HIGH_STAMINA_THRESHOLD: f64 = 75.0;
/// Drain multiplier above the high threshold.
pub const HIGH_STAMINA_DRAIN: f64 = 1.5;

/// Below this, drain runs slower. Crossing it fires the low-stamina signal.
pub const LOW_STAMINA_THRESHOLD: f64 = 25.0;
/// Drain multiplier below the low threshold.
pub const LOW_STAMINA_DRAIN: f64 = 0.7;

/// Time fraction below which drain speeds up.
pub const TIME_PRESSURE_FRACTION: f64 = 0.3;
/// Drain multiplier under time pressure.
pub const TIME_PRESSURE_DRAIN: f64 = 1.3;

/// Streaks longer than this add 10% drain per streak step.
pub const STREAK_DRAIN_THRESHOLD: u32 = 3;

/// Combo bonus per streak step.
pub const COMBO_BONUS_PER_STEP: u32 = 5;
/// Combo bonus ceiling.
pub const MAX_COMBO_BONUS: u32 = 50;

/// Stamina recovery ceiling per hit (before the drain factor).
pub const MAX_HIT_RECOVERY: f64 = 15.0;

/// Miss penalty when no streak was running.
pub const MISS_PENALTY_COLD: f64 = 12.0;
/// Miss penalty that breaks a running streak.
pub const MISS_PENALTY_STREAK: f64 = 8.0;

// =============================================================================
// STEP RESULT
// =============================================================================

/// Result of applying one event.
#[derive(Debug)]
#[derive(Default)]
pub struct StepResult {
    /// Events generated by this step
    pub events: Vec<GameEvent>,
    /// Set exactly once, on the ACTIVE to WON/LOST transition
    pub outcome: Option<Outcome>,
    /// Stamina crossed the low threshold during this step
    pub low_stamina: bool,
}

impl StepResult {
    /// Did this step end the session?
    pub fn ended(&self) -> bool {
        self.outcome.is_some()
    }
}

fn finish(state: &mut SessionState, now_ms: u64, phase: SessionPhase, reason: Option<LossReason>, result: &mut StepResult) {
    state.phase = phase;
    state.loss_reason = reason;
    result.events.push(GameEvent::session_ended(now_ms, phase == SessionPhase::Won, reason));
    result.outcome = state.outcome();
    debug!(?phase, ?reason, score = state.score, kills = state.kill_count, "session reached terminal phase");
}

// =============================================================================
// TICK
// =============================================================================

/// Drain rate for one tick given the state before the drain is applied.
///
/// `state.time_remaining_ms` must already be decremented for this tick.
pub fn drain_rate(state: &SessionState, profile: &DifficultyProfile) -> f64 {
    let mut rate = BASE_DRAIN_PER_TICK * profile.stamina_drain_factor;

    if state.stamina > HIGH_STAMINA_THRESHOLD {
        rate *= HIGH_STAMINA_DRAIN;
    }
    if state.stamina < LOW_STAMINA_THRESHOLD {
        rate *= LOW_STAMINA_DRAIN;
    }
    if state.time_fraction_remaining() < TIME_PRESSURE_FRACTION {
        rate *= TIME_PRESSURE_DRAIN;
    }
    if state.consecutive_hit_streak > STREAK_DRAIN_THRESHOLD {
        rate *= 1.0 + 0.1 * state.consecutive_hit_streak as f64;
    }
    rate
}

/// Advance the countdown by `delta_ms` and apply passive drain.
///
/// If the countdown runs out the session is LOST and no drain is applied.
pub fn tick(state: &mut SessionState, profile: &DifficultyProfile, delta_ms: u64, now_ms: u64) -> StepResult {
    let mut result = StepResult::default();
    if !state.is_active() {
        return result;
    }

    // 1. Countdown
    state.time_remaining_ms = state.time_remaining_ms.saturating_sub(delta_ms);
    if state.time_remaining_ms == 0 {
        result.events.push(GameEvent::ticked(now_ms, 0, state.stamina));
        finish(state, now_ms, SessionPhase::Lost, Some(LossReason::TimeExpired), &mut result);
        return result;
    }

    // 2. Drain rate from the pre-drain stamina
    let rate = drain_rate(state, profile);

    #[cfg(feature = "debug-tracing")]
    tracing::trace!(rate, stamina = state.stamina, time_remaining_ms = state.time_remaining_ms, "drain");

    // 3. Apply
    let before = state.stamina;
    state.stamina = (state.stamina - rate).max(0.0);
    result.events.push(GameEvent::ticked(now_ms, state.time_remaining_ms, state.stamina));

    if before > LOW_STAMINA_THRESHOLD && state.stamina <= LOW_STAMINA_THRESHOLD {
        debug!(stamina = state.stamina, "stamina low");
        result.low_stamina = true;
        result.events.push(GameEvent::low_stamina(now_ms, state.stamina));
    }

    if state.stamina <= 0.0 {
        finish(state, now_ms, SessionPhase::Lost, Some(LossReason::StaminaDepleted), &mut result);
    }
    result
}

// =============================================================================
// HIT
// =============================================================================

/// Combo bonus for a streak length.
#[inline]
pub fn combo_bonus(streak: u32) -> u32 {
    streak.saturating_mul(COMBO_BONUS_PER_STEP).min(MAX_COMBO_BONUS)
}

/// Stamina recovered by a hit on a bat worth `point_value`.
#[inline]
pub fn hit_recovery(point_value: u32, profile: &DifficultyProfile) -> f64 {
    let raw = (point_value / 5) as f64 + 5.0;
    raw.min(MAX_HIT_RECOVERY) / profile.stamina_drain_factor
}

/// Apply a confirmed hit on `bat_id` at `now_ms`.
pub fn register_hit(
    state: &mut SessionState,
    profile: &DifficultyProfile,
    bat_id: BatId,
    point_value: u32,
    now_ms: u64,
    combo_window_ms: u64,
) -> StepResult {
    let mut result = StepResult::default();
    if !state.is_active() {
        return result;
    }

    // 1. Time since last hit
    let since_last = state.last_hit_time_ms.map(|last| now_ms.saturating_sub(last));
    state.last_hit_time_ms = Some(now_ms);

    // 2. Combo
    let bonus = match since_last {
        Some(gap) if gap < combo_window_ms => {
            state.consecutive_hit_streak += 1;
            combo_bonus(state.consecutive_hit_streak)
        }
        _ => {
            state.consecutive_hit_streak = 1;
            0
        }
    };

    // 3. Score
    let awarded = (point_value.saturating_add(bonus) as f64 * profile.score_multiplier).round() as u32;
    state.score = state.score.saturating_add(awarded);

    // 4. Kills
    state.kill_count += 1;

    // 5. Recovery
    state.stamina = (state.stamina + hit_recovery(point_value, profile)).min(MAX_STAMINA);

    debug!(
        bat_id,
        awarded,
        bonus,
        streak = state.consecutive_hit_streak,
        kills = state.kill_count,
        "bat hit"
    );
    result.events.push(GameEvent::bat_hit(
        now_ms,
        bat_id,
        awarded,
        bonus,
        state.consecutive_hit_streak,
        state.score,
    ));

    if state.kill_count >= state.kill_target {
        finish(state, now_ms, SessionPhase::Won, None, &mut result);
    }
    result
}

// =============================================================================
// MISS
// =============================================================================

/// Apply a tap that hit nothing.
///
/// The penalty is chosen from the streak as it was before this miss reset
/// it: 12 when no streak was running, 8 when one is broken.
pub fn register_miss(state: &mut SessionState, position: Vec2, now_ms: u64) -> StepResult {
    let mut result = StepResult::default();
    if !state.is_active() {
        return result;
    }

    let streak_before = state.consecutive_hit_streak;
    state.consecutive_hit_streak = 0;

    let reduction = if streak_before == 0 { MISS_PENALTY_COLD } else { MISS_PENALTY_STREAK };
    let before = state.stamina;
    state.stamina = (state.stamina - reduction).max(0.0);

    debug!(reduction, stamina = state.stamina, "missed");
    result.events.push(GameEvent::missed(now_ms, position, reduction));

    if before > LOW_STAMINA_THRESHOLD && state.stamina <= LOW_STAMINA_THRESHOLD && state.stamina > 0.0 {
        result.low_stamina = true;
        result.events.push(GameEvent::low_stamina(now_ms, state.stamina));
    }

    if state.stamina <= 0.0 {
        finish(state, now_ms, SessionPhase::Lost, Some(LossReason::StaminaDepleted), &mut result);
    }
    result
}

// =============================================================================
// TESTS
// =============================================================================
