//! Bat Spawning and Expiry
//!
//! `EntitySpawner` exclusively owns the live set. It creates bats from the
//! seeded RNG, enforces the population cap, keeps the spawn cadence
//! (opening burst, then jittered regular attempts) and retires bats whose
//! lifespan has run out.
//!
//! Spawning is best-effort: an attempt at capacity is a silent skip and
//! the cadence carries on.

use std::collections::{BTreeMap, VecDeque};
use serde::{Serialize, Deserialize};
use tracing::debug;

use crate::core::rng::DeterministicRng;
use crate::core::vec2::Vec2;
use crate::game::profile::DifficultyProfile;
use crate::game::state::{Bat, BatId, Side};

/// Share of the flight in the lifespan (lifespan = flight / 0.8).
pub const FLIGHT_SHARE_OF_LIFESPAN: f64 = 0.8;

// =============================================================================
// CONFIG
// =============================================================================

/// Arena size as reported by the rendering collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in viewport units
    pub width: f32,
    /// Height in viewport units
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 390.0, height: 844.0 }
    }
}

/// Configuration for bat spawning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Distance beyond the viewport edge where bats appear and vanish
    pub offscreen_padding: f32,
    /// Nearest depth
    pub depth_min: f32,
    /// Farthest depth
    pub depth_max: f32,
    /// Milliseconds per (distance unit / speed unit)
    pub flight_time_scale: f32,
    /// Base points per bat
    pub point_value: u32,
    /// Gap between opening-burst spawns (ms)
    pub burst_spacing_ms: u64,
    /// Pause between the burst and the regular cycle (ms)
    pub cycle_start_delay_ms: u64,
    /// Central share of the viewport height used for spawn rows
    pub vertical_band: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            offscreen_padding: 80.0,
            depth_min: 1.0,
            depth_max: 15.0,
            flight_time_scale: 50.0,
            point_value: 100,
            burst_spacing_ms: 1500,
            cycle_start_delay_ms: 1000,
            vertical_band: 0.6,
        }
    }
}

/// Result of one spawn attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpawnAttempt {
    /// A bat was added to the live set
    Spawned(BatId),
    /// Live set was full; nothing happened
    AtCapacity,
}

// =============================================================================
// SPAWNER
// =============================================================================

/// Owner of the live bat set and the spawn schedule.
#[derive(Clone, Debug)]
pub struct EntitySpawner {
    /// Live bats. Ids are monotonic, so key order is insertion order.
    live: BTreeMap<BatId, Bat>,
    /// Next bat ID (monotonic counter)
    next_id: BatId,
    /// Pending opening-burst attempts (ascending)
    burst_deadlines: VecDeque<u64>,
    /// Next regular-cycle attempt
    cycle_deadline: Option<u64>,
    config: SpawnConfig,
    viewport: Viewport,
}

impl EntitySpawner {
    /// Create an empty spawner with nothing scheduled.
    pub fn new(config: SpawnConfig, viewport: Viewport) -> Self {
        Self {
            live: BTreeMap::new(),
            next_id: 0,
            burst_deadlines: VecDeque::new(),
            cycle_deadline: None,
            config,
            viewport,
        }
    }

    /// Live bats in insertion order.
    pub fn live(&self) -> impl Iterator<Item = &Bat> {
        self.live.values()
    }

    /// Number of live bats.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    /// Look up a live bat.
    pub fn get(&self, id: BatId) -> Option<&Bat> {
        self.live.get(&id)
    }

    /// Horizontal distance a bat covers: viewport plus padding on both sides.
    pub fn travel_distance(&self) -> f32 {
        self.viewport.width + 2.0 * self.config.offscreen_padding
    }

    /// Spawn one bat at `now_ms` unless the live set is at the cap.
    pub fn try_spawn(
        &mut self,
        now_ms: u64,
        profile: &DifficultyProfile,
        rng: &mut DeterministicRng,
    ) -> SpawnAttempt {
        if self.live.len() >= profile.max_concurrent_entities as usize {
            debug!(live = self.live.len(), "spawn skipped at capacity");
            return SpawnAttempt::AtCapacity;
        }

        let bat = self.create_bat(now_ms, profile, rng);
        let id = bat.id;
        debug!(
            id,
            side = ?bat.side,
            depth = bat.depth,
            flight_ms = bat.flight_duration_ms,
            "bat spawned"
        );
        self.live.insert(id, bat);
        SpawnAttempt::Spawned(id)
    }

    fn create_bat(&mut self, now_ms: u64, profile: &DifficultyProfile, rng: &mut DeterministicRng) -> Bat {
        let id = self.next_id;
        self.next_id += 1;

        let cfg = &self.config;
        let side = if rng.next_bool() { Side::Left } else { Side::Right };

        let travel = self.viewport.width + 2.0 * cfg.offscreen_padding;
        let origin_x = match side {
            Side::Left => -cfg.offscreen_padding,
            Side::Right => self.viewport.width + cfg.offscreen_padding,
        };
        let dest_x = origin_x + side.sign() * travel;

        let band = cfg.vertical_band.clamp(0.0, 1.0);
        let top = self.viewport.height * (1.0 - band) / 2.0;
        let y = top + rng.next_unit() * self.viewport.height * band;

        let depth = rng.next_f32_range(cfg.depth_min, cfg.depth_max);
        let scale = profile.base_scale * (0.5 + 0.5 * (1.0 - depth / cfg.depth_max));

        let flight_ms = (travel as f64 / profile.base_speed as f64
            * cfg.flight_time_scale as f64
            * FLIGHT_SHARE_OF_LIFESPAN)
            .round();
        let lifespan_ms = (flight_ms / FLIGHT_SHARE_OF_LIFESPAN).round();

        Bat {
            id,
            spawn_time_ms: now_ms,
            side,
            origin: Vec2::new(origin_x, y),
            destination: Vec2::new(dest_x, y),
            depth,
            scale,
            speed: profile.base_speed,
            flight_duration_ms: flight_ms as u64,
            lifespan_ms: lifespan_ms as u64,
            point_value: cfg.point_value,
        }
    }

    /// Remove every bat whose lifespan has elapsed. Returns their ids.
    pub fn expire(&mut self, now_ms: u64) -> Vec<BatId> {
        let expired: Vec<BatId> = self.live.values()
            .filter(|bat| bat.is_expired(now_ms))
            .map(|bat| bat.id)
            .collect();

        for id in &expired {
            self.live.remove(id);
            debug!(id, now_ms, "bat expired");
        }
        expired
    }

    /// Remove a specific bat (after a confirmed hit).
    pub fn remove(&mut self, id: BatId) -> Option<Bat> {
        self.live.remove(&id)
    }

    // =========================================================================
    // Cadence
    // =========================================================================

    /// Lay out the spawn schedule for a session starting at `start_ms`.
    ///
    /// Burst attempts land at `start + i × spacing`; the regular cycle's
    /// first attempt comes one random delay after the burst has finished
    /// and the start pause has passed.
    pub fn schedule(&mut self, start_ms: u64, profile: &DifficultyProfile, rng: &mut DeterministicRng) {
        let burst = profile.initial_burst() as u64;
        self.burst_deadlines = (0..burst)
            .map(|i| start_ms + i * self.config.burst_spacing_ms)
            .collect();

        let cycle_start = start_ms + burst * self.config.burst_spacing_ms + self.config.cycle_start_delay_ms;
        self.cycle_deadline = Some(cycle_start + Self::draw_delay(profile, rng));
    }

    fn draw_delay(profile: &DifficultyProfile, rng: &mut DeterministicRng) -> u64 {
        rng.next_delay_ms(profile.spawn_interval_min_ms, profile.spawn_interval_max_ms)
    }

    /// Earliest pending spawn attempt, if any.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.burst_deadlines.front().copied(), self.cycle_deadline) {
            (Some(b), Some(c)) => Some(b.min(c)),
            (b, c) => b.or(c),
        }
    }

    /// Run the earliest pending attempt if it is due by `now_ms`.
    ///
    /// The bat (if any) is stamped with the deadline, not `now_ms`, so a
    /// late poll produces the same bats as a punctual one. A regular
    /// attempt always draws the next delay, even at capacity.
    pub fn fire_next_due(
        &mut self,
        now_ms: u64,
        profile: &DifficultyProfile,
        rng: &mut DeterministicRng,
    ) -> Option<(u64, SpawnAttempt)> {
        let deadline = self.next_deadline().filter(|d| *d <= now_ms)?;

        let from_burst = self.burst_deadlines.front() == Some(&deadline);
        if from_burst {
            self.burst_deadlines.pop_front();
        }

        let attempt = self.try_spawn(deadline, profile, rng);

        if !from_burst {
            self.cycle_deadline = Some(deadline + Self::draw_delay(profile, rng));
        }
        Some((deadline, attempt))
    }

    /// Drop every pending attempt. Nothing fires afterwards.
    pub fn cancel_schedule(&mut self) {
        self.burst_deadlines.clear();
        self.cycle_deadline = None;
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::profile::{EASY_PROFILE, HARD_PROFILE, MEDIUM_PROFILE};
    use proptest::prelude::*;

    fn spawner() -> EntitySpawner {
        EntitySpawner::new(SpawnConfig::default(), Viewport { width: 400.0, height: 800.0 })
    }

    #[test]
    fn test_spawn_respects_cap() {
        let mut s = spawner();
        let mut rng = DeterministicRng::new(1);

        for _ in 0..EASY_PROFILE.max_concurrent_entities {
            assert!(matches!(s.try_spawn(0, &EASY_PROFILE, &mut rng), SpawnAttempt::Spawned(_)));
        }
        assert_eq!(s.try_spawn(0, &EASY_PROFILE, &mut rng), SpawnAttempt::AtCapacity);
        assert_eq!(s.live_count(), 3);
    }

    #[test]
    fn test_ids_are_unique_and_ordered() {
        let mut s = spawner();
        let mut rng = DeterministicRng::new(2);
        let mut ids = Vec::new();
        for t in 0..20 {
            if let SpawnAttempt::Spawned(id) = s.try_spawn(t, &HARD_PROFILE, &mut rng) {
                ids.push(id);
            }
            let first = s.live().next().map(|b| b.id);
            if let Some(id) = first {
                s.remove(id);
            }
        }
        let mut sorted = ids.clone();
        sorted.dedup();
        assert_eq!(ids, sorted);
        assert_eq!(ids.len(), 20);
    }

    #[test]
    fn test_spawn_geometry() {
        let mut s = spawner();
        let mut rng = DeterministicRng::new(3);
        let travel = s.travel_distance();
        assert_eq!(travel, 560.0);

        for t in 0..200 {
            let id = match s.try_spawn(t, &MEDIUM_PROFILE, &mut rng) {
                SpawnAttempt::Spawned(id) => id,
                SpawnAttempt::AtCapacity => unreachable!(),
            };
            let bat = s.remove(id).unwrap();

            // Off-screen at both ends, same row, full travel
            assert!(bat.origin.x < 0.0 || bat.origin.x > 400.0);
            assert!(bat.destination.x < 0.0 || bat.destination.x > 400.0);
            assert_eq!(bat.origin.y, bat.destination.y);
            assert_eq!((bat.destination.x - bat.origin.x).abs(), travel);
            match bat.side {
                Side::Left => assert_eq!(bat.origin.x, -80.0),
                Side::Right => assert_eq!(bat.origin.x, 480.0),
            }

            // Central 60% of the height
            assert!(bat.origin.y >= 160.0 && bat.origin.y <= 640.0, "y={}", bat.origin.y);

            // Depth range and derived scale
            assert!(bat.depth >= 1.0 && bat.depth <= 15.0);
            let expected = MEDIUM_PROFILE.base_scale * (0.5 + 0.5 * (1.0 - bat.depth / 15.0));
            assert!((bat.scale - expected).abs() < 1e-6);
            assert!(bat.scale <= MEDIUM_PROFILE.base_scale && bat.scale >= MEDIUM_PROFILE.base_scale * 0.5);
            assert_eq!(bat.spawn_time_ms, t);
        }
    }

    #[test]
    fn test_flight_and_lifespan() {
        let mut s = spawner();
        let mut rng = DeterministicRng::new(4);
        s.try_spawn(0, &EASY_PROFILE, &mut rng);
        let bat = s.live().next().unwrap();

        // 560 / 0.5 * 50 * 0.8
        assert_eq!(bat.flight_duration_ms, 44_800);
        assert_eq!(bat.lifespan_ms, 56_000);
    }

    #[test]
    fn test_unit_time_scale_matches_plain_formula() {
        let config = SpawnConfig { flight_time_scale: 1.0, ..Default::default() };
        let mut s = EntitySpawner::new(config, Viewport { width: 400.0, height: 800.0 });
        let mut rng = DeterministicRng::new(4);
        s.try_spawn(0, &MEDIUM_PROFILE, &mut rng);
        let bat = s.live().next().unwrap();

        // round(560 / 0.8 * 0.8) = 560, lifespan = 560 / 0.8
        assert_eq!(bat.flight_duration_ms, 560);
        assert_eq!(bat.lifespan_ms, 700);
    }

    #[test]
    fn test_expire_at_lifespan() {
        let mut s = spawner();
        let mut rng = DeterministicRng::new(5);
        s.try_spawn(1_000, &HARD_PROFILE, &mut rng);
        let lifespan = s.live().next().unwrap().lifespan_ms;

        assert!(s.expire(1_000 + lifespan - 1).is_empty());
        assert_eq!(s.live_count(), 1);
        assert_eq!(s.expire(1_000 + lifespan), vec![0]);
        assert_eq!(s.live_count(), 0);
    }

    #[test]
    fn test_remove() {
        let mut s = spawner();
        let mut rng = DeterministicRng::new(6);
        s.try_spawn(0, &HARD_PROFILE, &mut rng);
        assert!(s.remove(0).is_some());
        assert!(s.remove(0).is_none());
    }

    #[test]
    fn test_schedule_burst_and_cycle() {
        let mut s = spawner();
        let mut rng = DeterministicRng::new(7);
        s.schedule(10_000, &MEDIUM_PROFILE, &mut rng);

        // Burst of min(2, 4 - 1) = 2 at start and start + 1500
        assert_eq!(s.next_deadline(), Some(10_000));
        assert_eq!(s.fire_next_due(10_000, &MEDIUM_PROFILE, &mut rng), Some((10_000, SpawnAttempt::Spawned(0))));
        assert_eq!(s.next_deadline(), Some(11_500));
        assert_eq!(s.fire_next_due(11_499, &MEDIUM_PROFILE, &mut rng), None);
        assert_eq!(s.fire_next_due(11_500, &MEDIUM_PROFILE, &mut rng), Some((11_500, SpawnAttempt::Spawned(1))));

        // Regular cycle starts after 2 × 1500 + 1000, plus one jittered delay
        let first_cycle = s.next_deadline().unwrap();
        assert!((14_000 + 2_400..=14_000 + 3_600).contains(&first_cycle), "{first_cycle}");
    }

    #[test]
    fn test_cycle_redraws_delay_at_capacity() {
        let single = DifficultyProfile::new(1.0, (1_000, 2_000), 1, 1.0, 1.0, 1.0, 1.0).unwrap();
        let mut s = spawner();
        let mut rng = DeterministicRng::new(8);
        s.schedule(0, &single, &mut rng);

        // No burst for a cap of 1
        let mut deadline = s.next_deadline().unwrap();
        assert!((1_000..=3_000).contains(&deadline));

        let (_, first) = s.fire_next_due(deadline, &single, &mut rng).unwrap();
        assert!(matches!(first, SpawnAttempt::Spawned(_)));

        for _ in 0..5 {
            let previous = deadline;
            deadline = s.next_deadline().unwrap();
            assert!((previous + 1_000..=previous + 2_000).contains(&deadline));
            let (_, attempt) = s.fire_next_due(deadline, &single, &mut rng).unwrap();
            assert_eq!(attempt, SpawnAttempt::AtCapacity);
        }
        assert_eq!(s.live_count(), 1);
    }

    #[test]
    fn test_late_poll_uses_deadline_time() {
        let mut s = spawner();
        let mut rng = DeterministicRng::new(9);
        s.schedule(0, &EASY_PROFILE, &mut rng);
        let (at, _) = s.fire_next_due(5_000, &EASY_PROFILE, &mut rng).unwrap();
        assert_eq!(at, 0);
        assert_eq!(s.get(0).unwrap().spawn_time_ms, 0);
    }

    #[test]
    fn test_cancel_schedule() {
        let mut s = spawner();
        let mut rng = DeterministicRng::new(10);
        s.schedule(0, &HARD_PROFILE, &mut rng);
        s.cancel_schedule();
        assert_eq!(s.next_deadline(), None);
        assert_eq!(s.fire_next_due(u64::MAX, &HARD_PROFILE, &mut rng), None);
    }

    #[test]
    fn test_same_seed_same_bats() {
        let run = || {
            let mut s = spawner();
            let mut rng = DeterministicRng::new(42);
            for t in 0..3 {
                s.try_spawn(t * 100, &HARD_PROFILE, &mut rng);
            }
            s.live().cloned().collect::<Vec<_>>()
        };
        assert_eq!(run(), run());
    }

    proptest! {
        #[test]
        fn prop_live_set_never_exceeds_cap(
            seed in any::<u64>(),
            cap in 1u32..8,
            ops in proptest::collection::vec((0u8..3, 0u64..500), 1..200),
        ) {
            let profile = DifficultyProfile::new(1.0, (100, 200), cap, 1.0, 1.0, 1.0, 1.0).unwrap();
            let mut s = spawner();
            let mut rng = DeterministicRng::new(seed);
            let mut now = 0u64;

            for (op, dt) in ops {
                now += dt;
                match op {
                    0 => { s.try_spawn(now, &profile, &mut rng); }
                    1 => { s.expire(now); }
                    _ => {
                        let first = s.live().next().map(|b| b.id);
                        if let Some(id) = first {
                            s.remove(id);
                        }
                    }
                }
                prop_assert!(s.live_count() <= cap as usize);
            }
        }
    }
}
