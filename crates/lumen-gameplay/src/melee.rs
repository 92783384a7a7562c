//! Light melee attack with swept hit regions.
//!
//! While active, the hit region is a rectangle in front of the attacker's
//! collider. The swing profile decides which side of it shrinks as the
//! active phase runs out.

use glam::Vec2;
use lumen_common::{perpendicular, ConfigResult, EntityId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::attack::{
    damage_source, log_transition, resolve_strikes, AttackAgent, AttackArea, AttackConfig,
    AttackLifecycle, AttackPhase, AttackerContext, CombatMasks, CombatWorld, StrikeReport,
};
use crate::hitbox::AttackKind;

/// Swing profile of a melee activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackDirection {
    /// Full rectangle for the whole active phase
    #[default]
    Static,
    /// Sweeps across the facing axis from the right-hand side
    LeftToRight,
    /// Sweeps across the facing axis from the left-hand side
    RightToLeft,
    /// Shrinks along the facing axis toward the collider edge
    Outward,
}

/// Light attack tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MeleeConfig {
    /// Shared attack tunables
    #[serde(flatten)]
    pub attack: AttackConfig,
    /// Profile used by plain `attack` requests
    pub direction: AttackDirection,
}

impl Default for MeleeConfig {
    fn default() -> Self {
        Self {
            attack: AttackConfig::default(),
            direction: AttackDirection::Static,
        }
    }
}

/// Light melee agent.
#[derive(Debug, Clone)]
pub struct MeleeAttackAgent {
    config: MeleeConfig,
    lifecycle: AttackLifecycle,
    masks: CombatMasks,
    direction: AttackDirection,
    area: Option<AttackArea>,
}

impl MeleeAttackAgent {
    /// Creates an idle agent. Call [`AttackAgent::init`] before ticking.
    #[must_use]
    pub fn new(config: MeleeConfig) -> Self {
        let lifecycle =
            AttackLifecycle::new(config.attack.timing.clone(), config.attack.cancel_recovery);
        Self {
            direction: config.direction,
            config,
            lifecycle,
            masks: CombatMasks::default(),
            area: None,
        }
    }

    /// Requests an activation with a specific swing profile.
    pub fn attack_with(&mut self, target: Option<EntityId>, direction: AttackDirection) -> bool {
        if !self.lifecycle.request(target) {
            return false;
        }
        self.direction = direction;
        self.area = None;
        debug!(?direction, ?target, "melee attack started");
        true
    }

    /// Profile of the current (or last) activation.
    #[must_use]
    pub fn direction(&self) -> AttackDirection {
        self.direction
    }

    /// Lifecycle state.
    #[must_use]
    pub fn lifecycle(&self) -> &AttackLifecycle {
        &self.lifecycle
    }

    /// Tunables.
    #[must_use]
    pub fn config(&self) -> &MeleeConfig {
        &self.config
    }

    /// Hit region for the given facing and elapsed fraction.
    #[must_use]
    pub fn area_at(&self, ctx: &AttackerContext, facing: Vec2, fraction: f32) -> AttackArea {
        let range = self.config.attack.range;
        let half = range * 0.5;
        let shrink = 1.0 - fraction.clamp(0.0, 1.0);
        let across = perpendicular(facing);

        let (along, sideways) = match self.direction {
            AttackDirection::Static => ((0.0, range), (-half, half)),
            AttackDirection::LeftToRight => ((0.0, range), (-half, -half + range * shrink)),
            AttackDirection::RightToLeft => ((0.0, range), (half, half - range * shrink)),
            AttackDirection::Outward => ((0.0, range * shrink), (-half, half)),
        };

        AttackArea::from_spans(ctx.edge(facing), facing, across, along, sideways)
    }
}

impl Default for MeleeAttackAgent {
    fn default() -> Self {
        Self::new(MeleeConfig::default())
    }
}

impl AttackAgent for MeleeAttackAgent {
    fn init(&mut self, masks: CombatMasks) -> ConfigResult<()> {
        self.config.attack.validate("light")?;
        self.masks = masks;
        Ok(())
    }

    fn attack(&mut self, target: Option<EntityId>) -> bool {
        self.attack_with(target, self.config.direction)
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
        log_transition("melee", ctx.id, self.lifecycle.advance(dt));

        if !self.lifecycle.phase().can_damage() {
            self.area = None;
            return Vec::new();
        }

        let target = self.lifecycle.target().and_then(|t| world.position_of(t));
        let area = self.area_at(ctx, ctx.facing(target), self.lifecycle.elapsed_fraction());
        self.area = Some(area);

        let source = damage_source(&self.config.attack, AttackKind::Light, ctx);
        resolve_strikes(&mut self.lifecycle, &area, ctx, self.masks, &source, world)
    }

    fn cancel(&mut self) {
        self.lifecycle.reset();
        self.area = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attack::AttackTiming;
    use crate::collision::AABB;
    use crate::hitbox::{Hitbox, HitboxConfig};
    use crate::world::ArenaWorld;
    use lumen_common::LayerMask;
    use proptest::prelude::*;

    const GROUND: LayerMask = LayerMask::layer(0);
    const ENEMY: LayerMask = LayerMask::layer(3);

    fn masks() -> CombatMasks {
        CombatMasks::new(ENEMY, GROUND | ENEMY)
    }

    fn ctx() -> AttackerContext {
        AttackerContext {
            id: EntityId::from_raw(1),
            position: Vec2::ZERO,
            collider_size: Vec2::new(1.0, 2.0),
            face_dir: 1.0,
        }
    }

    fn agent(windup: f32, active: f32, recovery: f32) -> MeleeAttackAgent {
        let config = MeleeConfig {
            attack: AttackConfig {
                range: 1.5,
                timing: AttackTiming::new(windup, active, recovery),
                ..AttackConfig::default()
            },
            ..MeleeConfig::default()
        };
        let mut agent = MeleeAttackAgent::new(config);
        agent.init(masks()).expect("valid config");
        agent
    }

    fn dummy(world: &mut ArenaWorld, center: Vec2) -> EntityId {
        let hitbox = Hitbox::new(EntityId::new(), &HitboxConfig::default());
        world.add_damageable(AABB::from_center(center, Vec2::splat(0.25)), ENEMY, hitbox)
    }

    fn health(world: &ArenaWorld, id: EntityId) -> f32 {
        world.hitbox(id).map_or(0.0, Hitbox::health)
    }

    #[test]
    fn test_hits_once_per_activation() {
        let mut world = ArenaWorld::new();
        let target = dummy(&mut world, Vec2::new(1.5, 0.0));
        let mut melee = agent(0.0625, 0.5, 0.25);

        assert!(melee.attack(None));
        assert_eq!(melee.tick(0.0625, &ctx(), &mut world).len(), 1);
        assert!(melee.is_attacking());

        for _ in 0..4 {
            assert!(melee.tick(0.0625, &ctx(), &mut world).is_empty());
        }
        assert_eq!(health(&world, target), 90.0);
    }

    #[test]
    fn test_left_to_right_half_extent_at_midpoint() {
        let mut world = ArenaWorld::new();
        let mut melee = agent(0.0, 0.5, 0.25);

        assert!(melee.attack_with(None, AttackDirection::LeftToRight));
        melee.tick(0.25, &ctx(), &mut world);

        let area = melee.attack_area().expect("active area");
        assert_eq!(area.size, Vec2::new(1.5, 0.75));
        assert_eq!(area.trailing_point, Vec2::new(0.5, -0.75));
        assert_eq!(area.leading_point, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_right_to_left_mirrors_left_to_right() {
        let mut world = ArenaWorld::new();
        let mut melee = agent(0.0, 0.5, 0.25);

        melee.attack_with(None, AttackDirection::RightToLeft);
        melee.tick(0.25, &ctx(), &mut world);

        let area = melee.attack_area().expect("active area");
        assert_eq!(area.size, Vec2::new(1.5, 0.75));
        assert_eq!(area.trailing_point, Vec2::new(0.5, 0.75));
        assert_eq!(area.leading_point, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_outward_shrinks_along_facing() {
        let mut world = ArenaWorld::new();
        let mut melee = agent(0.0, 0.5, 0.25);

        melee.attack_with(None, AttackDirection::Outward);
        melee.tick(0.25, &ctx(), &mut world);

        let area = melee.attack_area().expect("active area");
        assert_eq!(area.size, Vec2::new(0.75, 1.5));
    }

    #[test]
    fn test_line_of_sight_blocks_strike() {
        let mut world = ArenaWorld::new();
        let target = dummy(&mut world, Vec2::new(1.5, 0.0));
        world.add_obstacle(AABB::new(Vec2::new(0.875, -2.0), Vec2::new(1.0, 2.0)), GROUND);
        let mut melee = agent(0.0, 0.5, 0.25);

        melee.attack(None);
        assert!(melee.tick(0.0625, &ctx(), &mut world).is_empty());
        assert_eq!(health(&world, target), 100.0);
    }

    #[test]
    fn test_struck_set_cleared_by_next_activation() {
        let mut world = ArenaWorld::new();
        let target = dummy(&mut world, Vec2::new(1.5, 0.0));
        let mut melee = agent(0.0, 0.25, 0.25);

        melee.attack(None);
        melee.tick(0.0625, &ctx(), &mut world);
        assert!(!melee.attack(None));

        while melee.phase() != AttackPhase::Idle {
            melee.tick(0.0625, &ctx(), &mut world);
        }
        assert_eq!(health(&world, target), 90.0);

        assert!(melee.attack(None));
        melee.tick(0.0625, &ctx(), &mut world);
        assert_eq!(health(&world, target), 80.0);
    }

    #[test]
    fn test_faces_locked_target() {
        let mut world = ArenaWorld::new();
        let behind = dummy(&mut world, Vec2::new(-1.5, 0.0));
        let ahead = dummy(&mut world, Vec2::new(1.5, 0.0));
        let mut melee = agent(0.0, 0.5, 0.25);

        melee.attack(Some(behind));
        melee.tick(0.0625, &ctx(), &mut world);

        let area = melee.attack_area().expect("active area");
        assert!(area.leading_point.x < 0.0);
        assert_eq!(health(&world, behind), 90.0);
        assert_eq!(health(&world, ahead), 100.0);
    }

    #[test]
    fn test_area_cleared_outside_active() {
        let mut world = ArenaWorld::new();
        let mut melee = agent(0.125, 0.5, 0.25);

        melee.attack(None);
        melee.tick(0.0625, &ctx(), &mut world);
        assert_eq!(melee.phase(), AttackPhase::Windup);
        assert!(melee.attack_area().is_none());

        melee.cancel();
        assert_eq!(melee.phase(), AttackPhase::Idle);
    }

    #[test]
    fn test_init_rejects_zero_duration() {
        let config = MeleeConfig {
            attack: AttackConfig {
                timing: AttackTiming::new(0.1, 0.0, 0.1),
                ..AttackConfig::default()
            },
            ..MeleeConfig::default()
        };
        let mut melee = MeleeAttackAgent::new(config);
        assert!(melee.init(masks()).is_err());
    }

    proptest! {
        #[test]
        fn prop_swept_extent_within_range(fraction in -1.0f32..2.0) {
            let melee = agent(0.0, 0.5, 0.25);
            for direction in [AttackDirection::LeftToRight, AttackDirection::Outward] {
                let mut melee = melee.clone();
                melee.direction = direction;
                let area = melee.area_at(&ctx(), Vec2::X, fraction);
                prop_assert!(area.size.x >= 0.0 && area.size.x <= 1.5 + 1e-5);
                prop_assert!(area.size.y >= 0.0 && area.size.y <= 1.5 + 1e-5);
            }
        }
    }
}
