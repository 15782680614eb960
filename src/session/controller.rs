//! Session Controller
//!
//! Synchronous glue around one session. Owns the state, the spawner and
//! the RNG, runs due ticks and spawn attempts in time order, resolves taps
//! and fires the feedback hooks.
//!
//! The controller never reads a clock: every entry point takes the session
//! time explicitly. That keeps it deterministic, which is what makes
//! `replay` possible. The async runner supplies real time.

use tracing::{debug, info};

use crate::core::hash::{compute_state_hash, StateHash};
use crate::core::rng::DeterministicRng;
use crate::game::collision;
use crate::game::events::GameEvent;
use crate::game::input::{Tap, TapLog};
use crate::game::profile::DifficultyProfile;
use crate::game::spawner::{EntitySpawner, SpawnAttempt};
use crate::game::state::{Bat, Outcome, SessionState};
use crate::game::tick::{self, StepResult};
use crate::session::config::{ConfigError, SessionConfig};
use crate::session::snapshot::RenderSnapshot;

// =============================================================================
// FEEDBACK HOOKS
// =============================================================================

/// Fire-and-forget sound and haptics hooks.
pub trait FeedbackHooks: Send {
    /// A tap hit a bat.
    fn on_hit_feedback(&mut self) {}
    /// A tap hit nothing.
    fn on_miss_feedback(&mut self) {}
    /// Stamina dropped into the low band.
    fn on_low_stamina(&mut self) {}
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHooks;

impl FeedbackHooks for NoopHooks {}

// =============================================================================
// CONTROLLER
// =============================================================================

/// One bat-hunt session.
pub struct SessionController<H: FeedbackHooks = NoopHooks> {
    config: SessionConfig,
    profile: DifficultyProfile,
    seed: u64,
    rng: DeterministicRng,
    state: SessionState,
    spawner: EntitySpawner,
    hooks: H,

    /// Session time of the last processed event
    now_ms: u64,
    started: bool,
    /// Timers cancelled; nothing fires afterwards
    torn_down: bool,
    next_tick_ms: Option<u64>,
    outcome: Option<Outcome>,
    taps: TapLog,
}

impl<H: FeedbackHooks> SessionController<H> {
    /// Build a session. Fails fast on an invalid config.
    pub fn new(config: SessionConfig, seed: u64, hooks: H) -> Result<Self, ConfigError> {
        config.validate()?;
        let profile = config.profile();
        let state = SessionState::new(
            config.difficulty,
            config.time_limit_ms,
            config.initial_stamina,
            config.kill_target(),
        );
        let spawner = EntitySpawner::new(config.spawn.clone(), config.viewport);

        Ok(Self {
            profile,
            seed,
            rng: DeterministicRng::new(seed),
            state,
            spawner,
            hooks,
            now_ms: 0,
            started: false,
            torn_down: false,
            next_tick_ms: None,
            outcome: None,
            taps: TapLog::new(),
            config,
        })
    }

    /// Start the session at `now_ms`: schedule the tick and the spawn
    /// cadence, then fire whatever is due immediately (the first burst bat).
    pub fn start(&mut self, now_ms: u64) -> Vec<GameEvent> {
        if self.started {
            return Vec::new();
        }
        self.started = true;
        self.now_ms = now_ms;
        self.next_tick_ms = Some(now_ms + self.config.tick_interval_ms);
        self.spawner.schedule(now_ms, &self.profile, &mut self.rng);

        info!(
            difficulty = %self.config.difficulty,
            kill_target = self.state.kill_target,
            seed = self.seed,
            "session started"
        );
        self.advance(now_ms)
    }

    /// Process every tick and spawn attempt due by `now_ms`, in time order,
    /// then retire expired bats.
    ///
    /// A tick and a spawn due at the same instant run tick first. Times
    /// earlier than the last processed event are treated as that event's
    /// time.
    pub fn advance(&mut self, now_ms: u64) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if !self.started || self.torn_down {
            return events;
        }
        let now_ms = now_ms.max(self.now_ms);

        loop {
            let tick_due = self.next_tick_ms.filter(|t| *t <= now_ms);
            let spawn_due = self.spawner.next_deadline().filter(|d| *d <= now_ms);

            let at_ms = match (tick_due, spawn_due) {
                (None, None) => break,
                (Some(t), Some(s)) if s < t => {
                    self.fire_spawn(s, &mut events);
                    s
                }
                (Some(t), _) => {
                    self.fire_tick(t, &mut events);
                    t
                }
                (None, Some(s)) => {
                    self.fire_spawn(s, &mut events);
                    s
                }
            };

            // Session time stops at the terminal event
            if self.torn_down {
                self.now_ms = at_ms;
                return events;
            }
        }

        self.expire(now_ms, &mut events);
        self.now_ms = now_ms;
        events
    }

    fn expire(&mut self, at_ms: u64, events: &mut Vec<GameEvent>) {
        for id in self.spawner.expire(at_ms) {
            events.push(GameEvent::bat_expired(at_ms, id));
        }
    }

    fn fire_tick(&mut self, at_ms: u64, events: &mut Vec<GameEvent>) {
        self.expire(at_ms, events);
        self.next_tick_ms = Some(at_ms + self.config.tick_interval_ms);
        let result = tick::tick(&mut self.state, &self.profile, self.config.tick_interval_ms, at_ms);
        self.apply(result, events);
    }

    fn fire_spawn(&mut self, at_ms: u64, events: &mut Vec<GameEvent>) {
        self.expire(at_ms, events);
        if let Some((deadline, SpawnAttempt::Spawned(id))) =
            self.spawner.fire_next_due(at_ms, &self.profile, &mut self.rng)
        {
            if let Some(bat) = self.spawner.get(id) {
                events.push(GameEvent::bat_spawned(deadline, id, bat.side, bat.depth));
            }
        }
    }

    fn apply(&mut self, result: StepResult, events: &mut Vec<GameEvent>) {
        if result.low_stamina && self.config.feedback_enabled {
            self.hooks.on_low_stamina();
        }
        if let Some(outcome) = result.outcome {
            info!(
                won = outcome.won,
                score = outcome.score,
                kills = outcome.kill_count,
                reason = ?outcome.loss_reason,
                "session ended"
            );
            self.outcome = Some(outcome);
            self.shutdown();
        }
        events.extend(result.events);
    }

    /// Resolve a tap.
    ///
    /// Everything due up to the tap time runs first, so the tap is judged
    /// against the bats that were on screen at that moment. Taps with
    /// non-finite coordinates and taps after the session ended are dropped.
    pub fn handle_tap(&mut self, tap: Tap) -> Vec<GameEvent> {
        let Some(tap) = tap.sanitize() else {
            return Vec::new();
        };
        if !self.started || self.torn_down {
            return Vec::new();
        }

        let at_ms = tap.timestamp_ms.max(self.now_ms);
        let mut events = self.advance(at_ms);
        if !self.state.is_active() {
            return events;
        }
        self.taps.record(Tap { timestamp_ms: at_ms, ..tap });

        let hit = collision::resolve_hit(self.spawner.live(), tap.position, at_ms, self.profile.hitbox_scale)
            .map(|bat| (bat.id, bat.point_value));

        let result = match hit {
            Some((id, point_value)) => {
                self.spawner.remove(id);
                if self.config.feedback_enabled {
                    self.hooks.on_hit_feedback();
                }
                tick::register_hit(
                    &mut self.state,
                    &self.profile,
                    id,
                    point_value,
                    at_ms,
                    self.config.combo_window_ms,
                )
            }
            None => {
                if self.config.feedback_enabled {
                    self.hooks.on_miss_feedback();
                }
                tick::register_miss(&mut self.state, tap.position, at_ms)
            }
        };
        self.apply(result, &mut events);
        events
    }

    /// Cancel the tick and every pending spawn attempt. Idempotent; later
    /// calls to `advance` and `handle_tap` are no-ops.
    pub fn shutdown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.next_tick_ms = None;
        self.spawner.cancel_schedule();
        debug!(now_ms = self.now_ms, "session timers cancelled");
    }

    /// Next instant anything is scheduled to happen, if anything is.
    pub fn next_deadline(&self) -> Option<u64> {
        if self.torn_down {
            return None;
        }
        match (self.next_tick_ms, self.spawner.next_deadline()) {
            (Some(t), Some(s)) => Some(t.min(s)),
            (t, s) => t.or(s),
        }
    }

    /// Render snapshot at `now_ms`. Read-only.
    pub fn snapshot(&self, now_ms: u64) -> RenderSnapshot {
        RenderSnapshot::capture(&self.state, self.spawner.live(), now_ms)
    }

    /// Terminal outcome, once the session has ended.
    pub fn outcome(&self) -> Option<&Outcome> {
        self.outcome.as_ref()
    }

    /// Has the session reached WON or LOST?
    pub fn is_finished(&self) -> bool {
        self.outcome.is_some()
    }

    /// Have the timers been cancelled?
    pub fn is_shut_down(&self) -> bool {
        self.torn_down
    }

    /// Current session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Profile in effect.
    pub fn profile(&self) -> &DifficultyProfile {
        &self.profile
    }

    /// Config the session was built with.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Live bats in insertion order.
    pub fn live_bats(&self) -> impl Iterator<Item = &Bat> {
        self.spawner.live()
    }

    /// Every tap accepted so far.
    pub fn tap_log(&self) -> &TapLog {
        &self.taps
    }

    /// RNG seed.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Session time of the last processed event.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Hash of the full simulation state, for replay verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.now_ms, self.seed, |h| {
            let s = &self.state;
            h.update_u8(s.phase as u8);
            h.update_u64(s.time_remaining_ms);
            h.update_f64(s.stamina);
            h.update_u32(s.score);
            h.update_u32(s.kill_count);
            h.update_u32(s.kill_target);
            h.update_u32(s.consecutive_hit_streak);
            h.update_u64(s.last_hit_time_ms.unwrap_or(u64::MAX));

            let rng = self.rng.state();
            h.update_u64(rng[0]);
            h.update_u64(rng[1]);

            for bat in self.spawner.live() {
                h.update_u32(bat.id);
                h.update_u64(bat.spawn_time_ms);
                h.update_u8(bat.side as u8);
                h.update_vec2(bat.origin);
                h.update_vec2(bat.destination);
                h.update_f32(bat.depth);
                h.update_f32(bat.scale);
                h.update_u64(bat.lifespan_ms);
            }
        })
    }

    /// Take the hooks back (e.g. to inspect recorded feedback).
    pub fn into_hooks(self) -> H {
        self.hooks
    }
}

// =============================================================================
// REPLAY
// =============================================================================

/// Re-run a session from its seed and tap log up to `end_ms`.
///
/// The session starts at time 0. Identical inputs yield an identical
/// `compute_hash()`.
pub fn replay(
    config: SessionConfig,
    seed: u64,
    taps: &[Tap],
    end_ms: u64,
) -> Result<SessionController<NoopHooks>, ConfigError> {
    let mut controller = SessionController::new(config, seed, NoopHooks)?;
    controller.start(0);
    for tap in taps {
        controller.handle_tap(*tap);
    }
    controller.advance(end_ms);
    Ok(controller)
}

// =============================================================================
// TESTS
// =============================================================================
