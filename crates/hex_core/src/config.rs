//! Tunable parameters for level generation and turn costs.
//!
//! Both structs deserialize from RON with every field optional, so a
//! config file only needs to name what it changes. This module does no IO;
//! reading files is left to the caller.

use serde::{Deserialize, Serialize};

use crate::error::{GameError, Result};
use crate::hex::HexShape;

/// Largest accepted level width or height.
pub const MAX_LEVEL_SIDE: u32 = 4096;

/// Level generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    /// Rectangle width in cells.
    pub width: u32,
    /// Rectangle height in cells.
    pub height: u32,
    /// Attempts before generation gives up.
    pub max_attempts: u32,
    /// Wall components smaller than this become floor.
    pub min_wall_group: usize,
    /// Visibility budget below which floor becomes tall grass.
    pub tall_grass_threshold: f64,
    /// Visibility budget below which floor becomes short grass.
    pub short_grass_threshold: f64,
    /// Noise sampling scale.
    pub noise_zoom: f64,
    /// Whether to place grass at all.
    pub grass: bool,
    /// Number of snakes placed on a new level.
    pub snakes: u32,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self {
            width: 48,
            height: 31,
            max_attempts: 32,
            min_wall_group: 6,
            tall_grass_threshold: 40.0,
            short_grass_threshold: 60.0,
            noise_zoom: 10.0,
            grass: true,
            snakes: 3,
        }
    }
}

impl LevelConfig {
    /// Set the board dimensions.
    #[must_use]
    pub const fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Enable or disable grass placement.
    #[must_use]
    pub const fn with_grass(mut self, grass: bool) -> Self {
        self.grass = grass;
        self
    }

    /// Set the number of snakes.
    #[must_use]
    pub const fn with_snakes(mut self, snakes: u32) -> Self {
        self.snakes = snakes;
        self
    }

    /// Set the retry limit.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Parse a RON document holding only level parameters.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::ConfigParse {
            source_name: "level config".to_string(),
            message: e.to_string(),
        })
    }

    /// The hexagon described by this config.
    #[must_use]
    pub fn shape(&self) -> HexShape {
        HexShape::new(self.width, self.height)
    }

    /// Minimum main-cave size for an attempt to be accepted.
    #[must_use]
    pub const fn min_cave_size(&self) -> usize {
        (self.width as usize * self.height as usize) / 4
    }
}

/// Game rules: level parameters plus turn costs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Level generation parameters.
    pub level: LevelConfig,
    /// Time units a step costs the player.
    pub move_cost: u32,
    /// Time units resting costs the player.
    pub rest_cost: u32,
    /// Time units casting costs the player.
    pub cast_cost: u32,
    /// Time between spike projectile moves.
    pub spike_delay: u32,
    /// Time between environment ticks.
    pub environment_delay: u32,
    /// Time between snake turns.
    pub snake_delay: u32,
    /// Smallest grass regrowth delay, in environment ticks.
    pub regrow_min: u32,
    /// Largest grass regrowth delay, in environment ticks.
    pub regrow_max: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            level: LevelConfig::default(),
            move_cost: 1,
            rest_cost: 1,
            cast_cost: 1,
            spike_delay: 1,
            environment_delay: 1,
            snake_delay: 2,
            regrow_min: 3,
            regrow_max: 5,
        }
    }
}

impl GameConfig {
    /// Replace the level parameters.
    #[must_use]
    pub fn with_level(mut self, level: LevelConfig) -> Self {
        self.level = level;
        self
    }

    /// Parse a RON document. `source_name` labels errors.
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).map_err(|e| GameError::ConfigParse {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })?;
        config.validate(source_name)?;
        Ok(config)
    }

    /// Render as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::Serialization(e.to_string()))
    }

    /// Reject configurations the generator cannot work with.
    pub fn validate(&self, source_name: &str) -> Result<()> {
        let fail = |message: &str| {
            Err(GameError::ConfigParse {
                source_name: source_name.to_string(),
                message: message.to_string(),
            })
        };
        if self.level.width < 5 || self.level.height < 5 {
            return fail("level must be at least 5x5");
        }
        if self.level.width > MAX_LEVEL_SIDE || self.level.height > MAX_LEVEL_SIDE {
            return fail("level sides must be at most 4096");
        }
        if self.level.max_attempts == 0 {
            return fail("max_attempts must be positive");
        }
        if self.regrow_min > self.regrow_max {
            return fail("regrow_min exceeds regrow_max");
        }
        if self.spike_delay == 0 || self.environment_delay == 0 || self.snake_delay == 0 {
            return fail("recurring delays must be at least 1");
        }
        if self.level.noise_zoom <= 0.0 {
            return fail("noise_zoom must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GameConfig::default();
        assert_eq!(config.level.width, 48);
        assert_eq!(config.level.height, 31);
        assert_eq!(config.level.min_cave_size(), 372);
        assert_eq!(config.snake_delay, 2);
        assert!(config.validate("default").is_ok());
    }

    #[test]
    fn test_partial_ron() {
        let config = GameConfig::from_ron_str(
            "inline",
            "(level: (width: 20, height: 13, grass: false), snake_delay: 3)",
        )
        .unwrap();
        assert_eq!(config.level.width, 20);
        assert_eq!(config.level.height, 13);
        assert!(!config.level.grass);
        assert_eq!(config.level.snakes, 3);
        assert_eq!(config.snake_delay, 3);
        assert_eq!(config.move_cost, 1);
    }

    #[test]
    fn test_level_from_ron() {
        let level = LevelConfig::from_ron("(snakes: 0, max_attempts: 4)").unwrap();
        assert_eq!(level.snakes, 0);
        assert_eq!(level.max_attempts, 4);
        assert_eq!(level.width, 48);
        assert!(LevelConfig::from_ron("(snakes: -1)").is_err());
    }

    #[test]
    fn test_ron_round_trip() {
        let config = GameConfig::default().with_level(LevelConfig::default().with_snakes(7));
        let text = config.to_ron_string().unwrap();
        let parsed = GameConfig::from_ron_str("round-trip", &text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = GameConfig::from_ron_str("broken.ron", "(level: ").unwrap_err();
        match err {
            GameError::ConfigParse { source_name, .. } => assert_eq!(source_name, "broken.ron"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_validate_rejects_inverted_regrowth() {
        let config = GameConfig {
            regrow_min: 6,
            regrow_max: 2,
            ..GameConfig::default()
        };
        assert!(config.validate("inline").is_err());
    }

    #[test]
    fn test_validate_rejects_tiny_level() {
        let config = GameConfig::default().with_level(LevelConfig::default().with_size(3, 3));
        assert!(config.validate("inline").is_err());
    }

    #[test]
    fn test_validate_rejects_oversized_level() {
        let err = GameConfig::from_ron_str("huge.ron", "(level: (width: 70000, height: 70000))")
            .unwrap_err();
        assert!(matches!(err, GameError::ConfigParse { .. }));

        let edge = GameConfig::default()
            .with_level(LevelConfig::default().with_size(MAX_LEVEL_SIDE, MAX_LEVEL_SIDE));
        assert!(edge.validate("inline").is_ok());
        assert!(edge.level.shape().rect_len() < i32::MAX as usize);
    }

    #[test]
    fn test_validate_rejects_zero_delay() {
        let config = GameConfig {
            snake_delay: 0,
            ..GameConfig::default()
        };
        assert!(config.validate("inline").is_err());
    }
}
