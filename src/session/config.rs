//! Session Configuration
//!
//! Everything a session needs is passed in explicitly through
//! `SessionConfig`. There is no process-wide settings object; the settings
//! collaborator builds a config and hands it to the controller.

use serde::{Serialize, Deserialize};

use crate::game::profile::{DifficultyKey, DifficultyProfile, ProfileError};
use crate::game::spawner::{SpawnConfig, Viewport};
use crate::game::state::MAX_STAMINA;

/// Configuration errors. Raised only while building a session.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Difficulty key is not EASY / MEDIUM / HARD.
    #[error("unknown difficulty: {0:?}")]
    UnknownDifficulty(String),

    /// Profile values break an invariant.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// Viewport is empty or not finite.
    #[error("invalid viewport {width}x{height}")]
    InvalidViewport {
        /// Reported width
        width: f32,
        /// Reported height
        height: f32,
    },

    /// Some other field is out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// JSON document could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<ProfileError> for ConfigError {
    fn from(err: ProfileError) -> Self {
        match err {
            ProfileError::UnknownDifficulty(key) => ConfigError::UnknownDifficulty(key),
            ProfileError::InvalidProfile(msg) => ConfigError::InvalidProfile(msg),
        }
    }
}

/// Configuration for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Difficulty tier, fixed for the session
    pub difficulty: DifficultyKey,
    /// Replaces the tier's built-in profile when set
    pub profile_override: Option<DifficultyProfile>,
    /// Arena size
    pub viewport: Viewport,
    /// Countdown length (ms)
    pub time_limit_ms: u64,
    /// Stamina at start
    pub initial_stamina: f64,
    /// Countdown tick cadence (ms)
    pub tick_interval_ms: u64,
    /// Kill target = population cap × this
    pub kill_target_multiplier: u32,
    /// Hits closer together than this extend the streak (ms)
    pub combo_window_ms: u64,
    /// Sound and haptics toggle
    pub feedback_enabled: bool,
    /// Spawn geometry and cadence
    pub spawn: SpawnConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            difficulty: DifficultyKey::Medium,
            profile_override: None,
            viewport: Viewport::default(),
            time_limit_ms: crate::DEFAULT_TIME_LIMIT_MS,
            initial_stamina: MAX_STAMINA,
            tick_interval_ms: crate::TICK_INTERVAL_MS,
            kill_target_multiplier: 5,
            combo_window_ms: 2_000,
            feedback_enabled: true,
            spawn: SpawnConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Default config for a difficulty given by name.
    pub fn for_difficulty(key: &str) -> Result<Self, ConfigError> {
        let difficulty: DifficultyKey = key.parse()?;
        Ok(Self {
            difficulty,
            ..Default::default()
        })
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Profile in effect for this session.
    pub fn profile(&self) -> DifficultyProfile {
        self.profile_override.unwrap_or_else(|| self.difficulty.profile())
    }

    /// Kills needed to win.
    pub fn kill_target(&self) -> u32 {
        self.profile().kill_target(self.kill_target_multiplier)
    }

    /// Check every field. Sessions are never built from an invalid config.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.profile().validate()?;

        let Viewport { width, height } = self.viewport;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::InvalidViewport { width, height });
        }

        if self.time_limit_ms == 0 {
            return Err(ConfigError::InvalidConfig("time_limit_ms must be > 0".into()));
        }
        if self.tick_interval_ms == 0 {
            return Err(ConfigError::InvalidConfig("tick_interval_ms must be > 0".into()));
        }
        if !(self.initial_stamina > 0.0 && self.initial_stamina <= MAX_STAMINA) {
            return Err(ConfigError::InvalidConfig(format!(
                "initial_stamina must be in (0, {MAX_STAMINA}], got {}",
                self.initial_stamina
            )));
        }
        if self.kill_target_multiplier == 0 {
            return Err(ConfigError::InvalidConfig("kill_target_multiplier must be > 0".into()));
        }

        let spawn = &self.spawn;
        if !(spawn.depth_min > 0.0 && spawn.depth_min < spawn.depth_max && spawn.depth_max.is_finite()) {
            return Err(ConfigError::InvalidConfig(format!(
                "depth range [{}, {}] must be positive and ordered",
                spawn.depth_min, spawn.depth_max
            )));
        }
        if !(spawn.offscreen_padding >= 0.0 && spawn.offscreen_padding.is_finite()) {
            return Err(ConfigError::InvalidConfig("offscreen_padding must be >= 0".into()));
        }
        if !(spawn.flight_time_scale > 0.0 && spawn.flight_time_scale.is_finite()) {
            return Err(ConfigError::InvalidConfig("flight_time_scale must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&spawn.vertical_band) {
            return Err(ConfigError::InvalidConfig("vertical_band must be in [0, 1]".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::profile::EASY_PROFILE;

    #[test]
    fn test_defaults_are_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.kill_target(), 20);
        assert_eq!(config.viewport, Viewport { width: 390.0, height: 844.0 });
    }

    #[test]
    fn test_defaults_use_session_constants() {
        let config = SessionConfig::default();
        assert_eq!(config.time_limit_ms, crate::DEFAULT_TIME_LIMIT_MS);
        assert_eq!(config.tick_interval_ms, crate::TICK_INTERVAL_MS);
    }

    #[test]
    fn test_for_difficulty() {
        let config = SessionConfig::for_difficulty("easy").unwrap();
        assert_eq!(config.difficulty, DifficultyKey::Easy);
        assert_eq!(config.profile(), EASY_PROFILE);
        assert_eq!(config.kill_target(), 15);

        assert!(matches!(
            SessionConfig::for_difficulty("IMPOSSIBLE"),
            Err(ConfigError::UnknownDifficulty(_))
        ));
    }

    #[test]
    fn test_from_json_partial() {
        let config = SessionConfig::from_json(r#"{"difficulty": "HARD", "viewport": {"width": 800, "height": 600}}"#).unwrap();
        assert_eq!(config.difficulty, DifficultyKey::Hard);
        assert_eq!(config.viewport.width, 800.0);
        assert_eq!(config.time_limit_ms, 120_000);
        assert_eq!(config.spawn.point_value, 100);
    }

    #[test]
    fn test_from_json_rejects_bad_input() {
        assert!(matches!(SessionConfig::from_json("{not json"), Err(ConfigError::Parse(_))));
        assert!(matches!(
            SessionConfig::from_json(r#"{"difficulty": "NIGHTMARE"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            SessionConfig::from_json(r#"{"viewport": {"width": 0, "height": 600}}"#),
            Err(ConfigError::InvalidViewport { .. })
        ));
        assert!(matches!(
            SessionConfig::from_json(r#"{"tick_interval_ms": 0}"#),
            Err(ConfigError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validate_ranges() {
        let mut config = SessionConfig { initial_stamina: 0.0, ..Default::default() };
        assert!(config.validate().is_err());
        config.initial_stamina = 100.5;
        assert!(config.validate().is_err());
        config.initial_stamina = 50.0;
        assert!(config.validate().is_ok());

        config.spawn.depth_min = 15.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_profile_override() {
        let mut bad = EASY_PROFILE;
        bad.max_concurrent_entities = 0;
        let config = SessionConfig { profile_override: Some(bad), ..Default::default() };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidProfile(_))));
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let config = SessionConfig::for_difficulty("HARD").unwrap();
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(SessionConfig::from_json(&json).unwrap(), config);
    }
}
