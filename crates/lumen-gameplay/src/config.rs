//! Player tunables loaded from TOML.
//!
//! Every section and field is optional; missing values take their defaults.
//!
//! ```toml
//! seed = 7
//!
//! [locomotion]
//! move_speed = 6.0
//!
//! [light]
//! range = 1.5
//! direction = "left_to_right"
//!
//! [light.timing]
//! active = 0.2
//! ```

use std::fs;
use std::path::Path;

use lumen_common::{ConfigError, ConfigResult, LayerMask};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::attack::CombatMasks;
use crate::extended::ExtendedConfig;
use crate::hitbox::HitboxConfig;
use crate::interaction::InteractionConfig;
use crate::locomotion::LocomotionConfig;
use crate::melee::MeleeConfig;

/// Layer of level geometry.
pub const GROUND_LAYER: LayerMask = LayerMask::layer(0);
/// Layer of hittable enemies.
pub const ENEMY_LAYER: LayerMask = LayerMask::layer(3);
/// Layer of interactables.
pub const INTERACTABLE_LAYER: LayerMask = LayerMask::layer(5);

/// Everything needed to build a player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Seed for target selection
    pub seed: u64,
    /// Movement
    pub locomotion: LocomotionConfig,
    /// Light attack
    pub light: MeleeConfig,
    /// Heavy attack
    pub heavy: ExtendedConfig,
    /// Layers used by both attacks
    pub combat: CombatMasks,
    /// Interaction focus
    pub interaction: InteractionConfig,
    /// Player health
    pub hitbox: HitboxConfig,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            locomotion: LocomotionConfig::default(),
            light: MeleeConfig::default(),
            heavy: ExtendedConfig::default(),
            combat: CombatMasks::default(),
            interaction: InteractionConfig::default(),
            hitbox: HitboxConfig::default(),
        }
    }
}

impl PlayerConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(contents: &str) -> ConfigResult<Self> {
        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&contents).map_err(|e| {
            warn!("Rejected player config {}: {e}", path.display());
            e
        })?;
        info!("Loaded player config from {}", path.display());
        Ok(config)
    }

    /// Serializes to TOML.
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Returns the first invalid value, if any.
    pub fn validate(&self) -> ConfigResult<()> {
        self.locomotion.validate()?;
        self.light.attack.validate("light")?;
        self.heavy.validate("heavy")?;
        self.interaction.validate()?;

        if !(self.hitbox.max_health > 0.0) {
            return Err(ConfigError::invalid(
                "hitbox.max_health",
                format!("must be positive, got {}", self.hitbox.max_health),
            ));
        }
        if self.combat.enemy.is_empty() {
            warn!("combat.enemy is empty; attacks will never connect");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::melee::AttackDirection;
    use std::io::Write;

    #[test]
    fn test_empty_document_is_default() {
        let config = PlayerConfig::from_toml_str("").expect("empty config");
        assert_eq!(config, PlayerConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = PlayerConfig::from_toml_str(
            r#"
            seed = 42

            [locomotion]
            move_speed = 8.0
            wall_leap = [20.0, 18.0]

            [light]
            range = 2.0
            direction = "left_to_right"

            [light.timing]
            active = 0.5

            [combat]
            enemy = 8
            "#,
        )
        .expect("valid config");

        assert_eq!(config.seed, 42);
        assert_eq!(config.locomotion.move_speed, 8.0);
        assert_eq!(config.locomotion.wall_leap, glam::Vec2::new(20.0, 18.0));
        assert_eq!(config.locomotion.dash_speed, 30.0);
        assert_eq!(config.light.attack.range, 2.0);
        assert_eq!(config.light.direction, AttackDirection::LeftToRight);
        assert_eq!(config.light.attack.timing.active, 0.5);
        assert_eq!(config.light.attack.timing.windup, 0.05);
        assert_eq!(config.combat.enemy, ENEMY_LAYER);
        assert_eq!(config.combat.obstacle, GROUND_LAYER);
    }

    #[test]
    fn test_partial_mask_tables_keep_layer_defaults() {
        let config = PlayerConfig::from_toml_str(
            r"
            [combat]
            obstacle = 3

            [interaction]
            detect_distance = 3.0
            ",
        )
        .expect("valid config");

        assert_eq!(config.combat.enemy, ENEMY_LAYER);
        assert_eq!(config.combat.obstacle, LayerMask(3));
        assert_eq!(config.interaction.detect_distance, 3.0);
        assert_eq!(config.interaction.mask, INTERACTABLE_LAYER);
    }

    #[test]
    fn test_zero_attack_duration_rejected() {
        let err = PlayerConfig::from_toml_str(
            r"
            [heavy.timing]
            active = 0.0
            ",
        )
        .expect_err("zero duration");

        assert!(matches!(
            err,
            ConfigError::Invalid { ref field, .. } if field == "heavy.timing.active"
        ));
    }

    #[test]
    fn test_malformed_document() {
        let err = PlayerConfig::from_toml_str("[locomotion\nmove_speed = 1").expect_err("bad toml");
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "seed = 3\n[hitbox]\nmax_health = 50.0").expect("write");

        let config = PlayerConfig::load(file.path()).expect("load");
        assert_eq!(config.seed, 3);
        assert_eq!(config.hitbox.max_health, 50.0);

        assert!(matches!(
            PlayerConfig::load(file.path().with_extension("missing")),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn test_toml_round_trip_keeps_defaults() {
        let text = PlayerConfig::default().to_toml_string().expect("serialize");
        let parsed = PlayerConfig::from_toml_str(&text).expect("parse");
        assert_eq!(parsed, PlayerConfig::default());
    }
}
