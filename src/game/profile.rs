//! Difficulty Profiles
//!
//! Immutable tuning bundles, one per difficulty tier. Every formula in the
//! simulation reads its knobs from a `DifficultyProfile`; nothing reads a
//! global setting.

use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};

// =============================================================================
// ERRORS
// =============================================================================

/// Profile selection and validation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProfileError {
    /// Difficulty key is not one of EASY / MEDIUM / HARD.
    #[error("unknown difficulty: {0:?}")]
    UnknownDifficulty(String),

    /// A profile field breaks an invariant.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),
}

// =============================================================================
// DIFFICULTY KEY
// =============================================================================

/// Difficulty tier selected by the settings collaborator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
#[repr(u8)]
#[derive(Default)]
pub enum DifficultyKey {
    /// Slow, large bats with generous hitboxes
    Easy = 0,
    /// Baseline tuning
    #[default]
    Medium = 1,
    /// Fast, small bats, double points
    Hard = 2,
}

impl DifficultyKey {
    /// All tiers, easiest first.
    pub const ALL: [DifficultyKey; 3] = [DifficultyKey::Easy, DifficultyKey::Medium, DifficultyKey::Hard];

    /// Canonical upper-case name.
    pub fn as_str(self) -> &'static str {
        match self {
            DifficultyKey::Easy => "EASY",
            DifficultyKey::Medium => "MEDIUM",
            DifficultyKey::Hard => "HARD",
        }
    }

    /// Built-in profile for this tier.
    pub fn profile(self) -> DifficultyProfile {
        match self {
            DifficultyKey::Easy => EASY_PROFILE,
            DifficultyKey::Medium => MEDIUM_PROFILE,
            DifficultyKey::Hard => HARD_PROFILE,
        }
    }
}

impl fmt::Display for DifficultyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DifficultyKey {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "EASY" => Ok(DifficultyKey::Easy),
            "MEDIUM" => Ok(DifficultyKey::Medium),
            "HARD" => Ok(DifficultyKey::Hard),
            _ => Err(ProfileError::UnknownDifficulty(s.to_string())),
        }
    }
}

// =============================================================================
// PROFILE
// =============================================================================

/// Per-difficulty tuning bundle.
///
/// Construct custom profiles with [`DifficultyProfile::new`], which checks
/// the invariants; the built-in tiers are available as constants.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    /// Horizontal speed in distance units per time-scale unit
    pub base_speed: f32,
    /// Lower bound of the regular spawn delay (ms)
    pub spawn_interval_min_ms: u64,
    /// Upper bound of the regular spawn delay (ms)
    pub spawn_interval_max_ms: u64,
    /// Population cap for live bats
    pub max_concurrent_entities: u32,
    /// Multiplies passive drain, divides hit recovery
    pub stamina_drain_factor: f64,
    /// Multiplies every awarded score
    pub score_multiplier: f64,
    /// Size of a bat at the nearest depth
    pub base_scale: f32,
    /// Multiplies the hit radius
    pub hitbox_scale: f32,
}

/// EASY tier: spawn rate 4000 ms.
pub const EASY_PROFILE: DifficultyProfile = DifficultyProfile {
    base_speed: 0.5,
    spawn_interval_min_ms: 3200,
    spawn_interval_max_ms: 4800,
    max_concurrent_entities: 3,
    stamina_drain_factor: 0.8,
    score_multiplier: 1.0,
    base_scale: 1.4,
    hitbox_scale: 1.2,
};

/// MEDIUM tier: spawn rate 3000 ms.
pub const MEDIUM_PROFILE: DifficultyProfile = DifficultyProfile {
    base_speed: 0.8,
    spawn_interval_min_ms: 2400,
    spawn_interval_max_ms: 3600,
    max_concurrent_entities: 4,
    stamina_drain_factor: 1.0,
    score_multiplier: 1.5,
    base_scale: 1.2,
    hitbox_scale: 1.0,
};

/// HARD tier: spawn rate 2000 ms.
pub const HARD_PROFILE: DifficultyProfile = DifficultyProfile {
    base_speed: 1.2,
    spawn_interval_min_ms: 1600,
    spawn_interval_max_ms: 2400,
    max_concurrent_entities: 5,
    stamina_drain_factor: 1.3,
    score_multiplier: 2.0,
    base_scale: 1.0,
    hitbox_scale: 0.6,
};

impl DifficultyProfile {
    /// Build a validated profile.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        base_speed: f32,
        spawn_interval_ms: (u64, u64),
        max_concurrent_entities: u32,
        stamina_drain_factor: f64,
        score_multiplier: f64,
        base_scale: f32,
        hitbox_scale: f32,
    ) -> Result<Self, ProfileError> {
        let profile = Self {
            base_speed,
            spawn_interval_min_ms: spawn_interval_ms.0,
            spawn_interval_max_ms: spawn_interval_ms.1,
            max_concurrent_entities,
            stamina_drain_factor,
            score_multiplier,
            base_scale,
            hitbox_scale,
        };
        profile.validate()?;
        Ok(profile)
    }

    /// Check that every numeric field is positive and the interval is ordered.
    pub fn validate(&self) -> Result<(), ProfileError> {
        fn positive(name: &str, v: f64) -> Result<(), ProfileError> {
            if v.is_finite() && v > 0.0 {
                Ok(())
            } else {
                Err(ProfileError::InvalidProfile(format!("{name} must be > 0, got {v}")))
            }
        }

        positive("base_speed", self.base_speed as f64)?;
        positive("spawn_interval_min_ms", self.spawn_interval_min_ms as f64)?;
        positive("spawn_interval_max_ms", self.spawn_interval_max_ms as f64)?;
        positive("max_concurrent_entities", self.max_concurrent_entities as f64)?;
        positive("stamina_drain_factor", self.stamina_drain_factor)?;
        positive("score_multiplier", self.score_multiplier)?;
        positive("base_scale", self.base_scale as f64)?;
        positive("hitbox_scale", self.hitbox_scale as f64)?;

        if self.spawn_interval_min_ms > self.spawn_interval_max_ms {
            return Err(ProfileError::InvalidProfile(format!(
                "spawn interval min {} exceeds max {}",
                self.spawn_interval_min_ms, self.spawn_interval_max_ms
            )));
        }
        Ok(())
    }

    /// Kills needed to win: cap × multiplier.
    #[inline]
    pub fn kill_target(&self, multiplier: u32) -> u32 {
        self.max_concurrent_entities.saturating_mul(multiplier)
    }

    /// Size of the opening burst: `min(2, cap - 1)`.
    #[inline]
    pub fn initial_burst(&self) -> u32 {
        2.min(self.max_concurrent_entities.saturating_sub(1))
    }
}

// =============================================================================
// TESTS
// =============================================================================
