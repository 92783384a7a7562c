//! Heavy thrust attack.
//!
//! The hit region is a bar as thick as the attacker's collider that extends
//! along the facing axis as the active phase runs.

use glam::Vec2;
use lumen_common::{perpendicular, ConfigError, ConfigResult, EntityId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attack::{
    damage_source, log_transition, resolve_strikes, AttackAgent, AttackArea, AttackConfig,
    AttackLifecycle, AttackPhase, AttackTiming, AttackerContext, CombatMasks, CombatWorld,
    StrikeReport,
};
use crate::hitbox::AttackKind;

/// Heavy attack tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendedConfig {
    /// Shared attack tunables
    #[serde(flatten)]
    pub attack: AttackConfig,
    /// Reach at the start of the active phase, as a fraction of range
    pub min_reach_fraction: f32,
}

impl Default for ExtendedConfig {
    fn default() -> Self {
        Self {
            attack: AttackConfig {
                range: 2.5,
                damage: 25.0,
                knockback_speed: 10.0,
                knockback_duration: 0.25,
                timing: AttackTiming::new(0.25, 0.3, 0.4),
                cancel_recovery: true,
            },
            min_reach_fraction: 0.25,
        }
    }
}

impl ExtendedConfig {
    /// Validates the shared tunables and the reach fraction.
    pub fn validate(&self, field: &str) -> ConfigResult<()> {
        self.attack.validate(field)?;
        if !(0.0..=1.0).contains(&self.min_reach_fraction) {
            return Err(ConfigError::invalid(
                format!("{field}.min_reach_fraction"),
                format!("must be within [0, 1], got {}", self.min_reach_fraction),
            ));
        }
        Ok(())
    }
}

/// Heavy thrust agent.
#[derive(Debug, Clone)]
pub struct ExtendedAttackAgent {
    config: ExtendedConfig,
    lifecycle: AttackLifecycle,
    masks: CombatMasks,
    area: Option<AttackArea>,
}

impl ExtendedAttackAgent {
    /// Creates an idle agent. Call [`AttackAgent::init`] before ticking.
    #[must_use]
    pub fn new(config: ExtendedConfig) -> Self {
        let lifecycle =
            AttackLifecycle::new(config.attack.timing.clone(), config.attack.cancel_recovery);
        Self {
            config,
            lifecycle,
            masks: CombatMasks::default(),
            area: None,
        }
    }

    /// Lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> &AttackLifecycle {
        &self.lifecycle
    }

    /// Tunables.
    #[must_use]
    pub fn config(&self) -> &ExtendedConfig {
        &self.config
    }

    /// Current reach along the facing axis.
    #[must_use]
    pub fn reach(&self, fraction: f32) -> f32 {
        self.config.attack.range * fraction.clamp(0.0, 1.0).max(self.config.min_reach_fraction)
    }

    /// Hit region for the given facing and elapsed fraction.
    #[must_use]
    pub fn area_at(&self, ctx: &AttackerContext, facing: Vec2, fraction: f32) -> AttackArea {
        let across = perpendicular(facing);
        let thickness = if facing.x != 0.0 {
            ctx.collider_size.y
        } else {
            ctx.collider_size.x
        };
        let half = thickness * 0.5;

        AttackArea::from_spans(
            ctx.edge(facing),
            facing,
            across,
            (0.0, self.reach(fraction)),
            (-half, half),
        )
    }
}

impl Default for ExtendedAttackAgent {
    fn default() -> Self {
        Self::new(ExtendedConfig::default())
    }
}

impl AttackAgent for ExtendedAttackAgent {
    fn init(&mut self, masks: CombatMasks) -> ConfigResult<()> {
        self.config.validate("heavy")?;
        self.masks = masks;
        Ok(())
    }

    fn attack(&mut self, target: Option<EntityId>) -> bool {
        if !self.lifecycle.request(target) {
            return false;
        }
        self.area = None;
        debug!(?target, "heavy attack started");
        true
    }

    fn phase(&self) -> AttackPhase {
        self.lifecycle.phase()
    }

    fn range(&self) -> f32 {
        self.config.attack.range
    }

    fn attack_area(&self) -> Option<AttackArea> {
        self.area
    }

    fn tick(
        &mut self,
        dt: f32,
        ctx: &AttackerContext,
        world: &mut dyn CombatWorld,
    ) -> Vec<StrikeReport> {
        log_transition("extended", ctx.id, self.lifecycle.advance(dt));

        if !self.lifecycle.phase().can_damage() {
            self.area = None;
            return Vec::new();
        }

        let target = self.lifecycle.target().and_then(|t| world.position_of(t));
        let area = self.area_at(ctx, ctx.facing(target), self.lifecycle.elapsed_fraction());
        self.area = Some(area);

        let source = damage_source(&self.config.attack, AttackKind::Heavy, ctx);
        resolve_strikes(&mut self.lifecycle, &area, ctx, self.masks, &source, world)
    }

    fn cancel(&mut self) {
        self.lifecycle.reset();
        self.area = None;
    }
}
