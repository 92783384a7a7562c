//! The player actor.
//!
//! Owns the locomotion controller, its own hitbox, both attack agents and the
//! interaction focus, and routes input actions to them.

use glam::Vec2;
use lumen_common::{ConfigResult, EntityId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::attack::{AttackAgent, AttackerContext, CombatMasks, CombatWorld, StrikeReport};
use crate::collision::CollisionProbe;
use crate::config::PlayerConfig;
use crate::extended::ExtendedAttackAgent;
use crate::hitbox::{DamageSource, Damageable, Hitbox};
use crate::input::PlayerAction;
use crate::interaction::{InteractableDirectory, InteractionFocus};
use crate::locomotion::LocomotionController;
use crate::melee::{AttackDirection, MeleeAttackAgent};

/// Dominant movement mode, for animation and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionState {
    /// Standing or running on the ground
    #[default]
    Grounded,
    /// In the air
    Airborne,
    /// Sliding down a wall
    WallSliding,
    /// Dashing
    Dashing,
    /// Gliding
    Gliding,
    /// Pushed by a hit
    KnockedBack,
}

/// Player actor.
#[derive(Debug)]
pub struct Player {
    id: EntityId,
    locomotion: LocomotionController,
    hitbox: Hitbox,
    light: MeleeAttackAgent,
    heavy: ExtendedAttackAgent,
    focus: InteractionFocus,
    masks: CombatMasks,
    rng: fastrand::Rng,
}

impl Player {
    /// Builds a player from a validated config.
    pub fn new(id: EntityId, config: &PlayerConfig) -> ConfigResult<Self> {
        config.validate()?;

        let mut light = MeleeAttackAgent::new(config.light.clone());
        light.init(config.combat)?;
        let mut heavy = ExtendedAttackAgent::new(config.heavy.clone());
        heavy.init(config.combat)?;

        let mut locomotion = LocomotionController::new(config.locomotion.clone());
        locomotion.recalculate_movement_settings();

        info!(player = %id, seed = config.seed, "player created");

        Ok(Self {
            id,
            locomotion,
            hitbox: Hitbox::new(id, &config.hitbox),
            light,
            heavy,
            focus: InteractionFocus::new(config.interaction.clone()),
            masks: config.combat,
            rng: fastrand::Rng::with_seed(config.seed),
        })
    }

    /// Player id.
    #[must_use]
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Movement controller.
    #[must_use]
    pub fn locomotion(&self) -> &LocomotionController {
        &self.locomotion
    }

    /// Mutable movement controller.
    pub fn locomotion_mut(&mut self) -> &mut LocomotionController {
        &mut self.locomotion
    }

    /// Own hitbox.
    #[must_use]
    pub fn hitbox(&self) -> &Hitbox {
        &self.hitbox
    }

    /// Light attack agent.
    #[must_use]
    pub fn light(&self) -> &MeleeAttackAgent {
        &self.light
    }

    /// Heavy attack agent.
    #[must_use]
    pub fn heavy(&self) -> &ExtendedAttackAgent {
        &self.heavy
    }

    /// Interaction focus.
    #[must_use]
    pub fn focus(&self) -> &InteractionFocus {
        &self.focus
    }

    /// Dominant movement mode.
    #[must_use]
    pub fn motion_state(&self) -> MotionState {
        let locomotion = &self.locomotion;
        if locomotion.is_knocked_back() {
            MotionState::KnockedBack
        } else if locomotion.is_dashing() {
            MotionState::Dashing
        } else if locomotion.is_wall_sliding() {
            MotionState::WallSliding
        } else if locomotion.is_gliding() {
            MotionState::Gliding
        } else if locomotion.contacts().below {
            MotionState::Grounded
        } else {
            MotionState::Airborne
        }
    }

    /// Sets the movement axes.
    pub fn set_directional_input(&mut self, input: Vec2) {
        self.locomotion.set_directional_input(input);
    }

    /// Advances one tick: hits taken, movement, then both attacks.
    pub fn update(
        &mut self,
        dt: f32,
        probe: &mut dyn CollisionProbe,
        world: &mut dyn CombatWorld,
    ) -> Vec<StrikeReport> {
        for taken in self.hitbox.drain_damage() {
            self.locomotion.on_damage_taken(taken.amount, taken.knockback);
        }

        self.locomotion.tick(dt, probe, &mut self.hitbox);
        self.hitbox.set_position(probe.position());

        let ctx = self.attacker_context(probe);
        let mut strikes = self.light.tick(dt, &ctx, world);
        strikes.extend(self.heavy.tick(dt, &ctx, world));
        strikes
    }

    /// Routes an input action. Returns whether it was accepted.
    pub fn handle_action(
        &mut self,
        action: PlayerAction,
        dt: f32,
        probe: &dyn CollisionProbe,
        world: &dyn CombatWorld,
        directory: &mut dyn InteractableDirectory,
    ) -> bool {
        match action {
            PlayerAction::JumpDown => {
                self.locomotion.on_jump_input_down();
                true
            }
            PlayerAction::JumpUp => {
                self.locomotion.on_jump_input_up();
                true
            }
            PlayerAction::Dash => self.locomotion.on_dash(&mut self.hitbox),
            PlayerAction::Glide => {
                self.locomotion.on_glide(dt);
                self.locomotion.is_gliding()
            }
            PlayerAction::Interact => self.on_interact(probe, directory),
            PlayerAction::LightAttack(direction) => self.on_light_attack(direction, probe, world),
            PlayerAction::HeavyAttack => self.on_heavy_attack(probe, world),
        }
    }

    /// Starts a light attack on a random nearby enemy, if any.
    pub fn on_light_attack(
        &mut self,
        direction: AttackDirection,
        probe: &dyn CollisionProbe,
        world: &dyn CombatWorld,
    ) -> bool {
        if self.locomotion.is_dashing() {
            return false;
        }
        let target = self.pick_target(self.light.range(), probe, world);
        self.light.attack_with(target, direction)
    }

    /// Starts a heavy attack on a random nearby enemy, if any.
    pub fn on_heavy_attack(&mut self, probe: &dyn CollisionProbe, world: &dyn CombatWorld) -> bool {
        if self.locomotion.is_dashing() {
            return false;
        }
        let target = self.pick_target(self.heavy.range(), probe, world);
        self.heavy.attack(target)
    }

    /// Focuses the nearest interactable.
    pub fn on_interact(
        &mut self,
        probe: &dyn CollisionProbe,
        directory: &mut dyn InteractableDirectory,
    ) -> bool {
        self.focus.request(self.id, probe.position(), directory)
    }

    /// Puts the player back into a neutral state at full health.
    pub fn respawn(&mut self) {
        self.locomotion.reset();
        self.light.cancel();
        self.heavy.cancel();
        self.hitbox.reset();
        debug!(player = %self.id, "respawned");
    }

    fn attacker_context(&self, probe: &dyn CollisionProbe) -> AttackerContext {
        AttackerContext {
            id: self.id,
            position: probe.position(),
            collider_size: probe.collider_size(),
            face_dir: self.locomotion.contacts().face_dir,
        }
    }

    fn pick_target(
        &mut self,
        range: f32,
        probe: &dyn CollisionProbe,
        world: &dyn CombatWorld,
    ) -> Option<EntityId> {
        let radius = probe.collider_size().x * 0.5 + range;
        let candidates: Vec<EntityId> = world
            .overlap_circle(probe.position(), radius, self.masks.enemy)
            .into_iter()
            .filter(|&c| c != self.id)
            .collect();

        if candidates.is_empty() {
            return None;
        }
        Some(candidates[self.rng.usize(..candidates.len())])
    }
}

impl Damageable for Player {
    fn damage(&mut self, source: &DamageSource) -> bool {
        self.hitbox.damage(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attack::AttackPhase;
    use crate::collision::{ArenaProbe, AABB};
    use crate::config::{ENEMY_LAYER, GROUND_LAYER, INTERACTABLE_LAYER};
    use crate::hitbox::{AttackKind, HitboxConfig};
    use crate::interaction::{Interactable, InteractableSet, LogInteraction};
    use crate::knockback::KnockbackRequest;
    use crate::world::ArenaWorld;

    const DT: f32 = 0.0625;

    fn setup() -> (Player, ArenaProbe, ArenaWorld) {
        let mut player = Player::new(EntityId::new(), &PlayerConfig::default()).expect("player");
        let mut probe = ArenaProbe::new(Vec2::new(0.0, 1.0), Vec2::new(1.0, 2.0), 0.0);
        let mut world = ArenaWorld::new();
        player.update(DT, &mut probe, &mut world);
        (player, probe, world)
    }

    fn dummy(world: &mut ArenaWorld, center: Vec2) -> EntityId {
        let hitbox = Hitbox::new(EntityId::new(), &HitboxConfig::default());
        world.add_damageable(AABB::from_center(center, Vec2::new(0.5, 1.0)), ENEMY_LAYER, hitbox)
    }

    fn hit(damage: f32) -> DamageSource {
        DamageSource {
            attacker: EntityId::new(),
            origin: Vec2::new(-2.0, 1.0),
            kind: AttackKind::Light,
            damage,
            knockback_speed: 10.0,
            knockback_duration: 0.25,
        }
    }

    #[test]
    fn test_light_attack_locks_nearby_enemy() {
        let (mut player, mut probe, mut world) = setup();
        let enemy = dummy(&mut world, Vec2::new(-1.5, 1.0));

        assert!(player.on_light_attack(AttackDirection::Static, &probe, &world));
        assert_eq!(player.light().lifecycle().target(), Some(enemy));

        let mut strikes = Vec::new();
        for _ in 0..8 {
            strikes.extend(player.update(DT, &mut probe, &mut world));
        }
        assert_eq!(strikes.len(), 1);
        assert_eq!(strikes[0].target, enemy);
        assert_eq!(world.hitbox(enemy).map(Hitbox::health), Some(90.0));
    }

    #[test]
    fn test_attack_untargeted_without_enemies() {
        let (mut player, probe, world) = setup();
        assert!(player.on_heavy_attack(&probe, &world));
        assert_eq!(player.heavy().lifecycle().target(), None);
        assert_eq!(player.heavy().phase(), AttackPhase::Windup);
    }

    #[test]
    fn test_attacks_ignored_while_dashing() {
        let (mut player, probe, world) = setup();
        let mut set = InteractableSet::new();

        assert!(player.handle_action(PlayerAction::Dash, DT, &probe, &world, &mut set));
        assert!(!player.on_light_attack(AttackDirection::Static, &probe, &world));
        assert!(!player.on_heavy_attack(&probe, &world));
        assert!(player.hitbox().is_invulnerable());
    }

    #[test]
    fn test_damage_becomes_knockback() {
        let (mut player, mut probe, mut world) = setup();

        assert!(player.damage(&hit(15.0)));
        assert_eq!(player.hitbox().health(), 85.0);

        player.update(DT, &mut probe, &mut world);
        assert!(player.locomotion().target_velocity_x() > 0.0);
        assert_eq!(player.motion_state(), MotionState::KnockedBack);
    }

    #[test]
    fn test_dash_invulnerability_blocks_damage() {
        let (mut player, probe, world) = setup();
        let mut set = InteractableSet::new();
        player.handle_action(PlayerAction::Dash, DT, &probe, &world, &mut set);

        assert!(!player.damage(&hit(15.0)));
        assert_eq!(player.hitbox().health(), 100.0);
    }

    #[test]
    fn test_interact_focuses_nearby() {
        let (mut player, probe, world) = setup();
        let mut set = InteractableSet::new();
        let sign = set.insert(
            Interactable::new(Vec2::new(1.0, 1.0), 1.5, Box::new(LogInteraction::new("sign")))
                .with_layer(INTERACTABLE_LAYER),
        );
        set.insert(
            Interactable::new(Vec2::new(0.5, 1.0), 1.5, Box::new(LogInteraction::new("crate")))
                .with_layer(GROUND_LAYER),
        );

        assert!(player.handle_action(PlayerAction::Interact, DT, &probe, &world, &mut set));
        assert_eq!(player.focus().current(), Some(sign));
    }

    #[test]
    fn test_respawn_clears_state() {
        let (mut player, mut probe, mut world) = setup();
        player.damage(&hit(30.0));
        player.update(DT, &mut probe, &mut world);
        player.on_heavy_attack(&probe, &world);

        player.respawn();
        assert!(!player.locomotion().is_knocked_back());
        assert_eq!(player.locomotion().velocity(), Vec2::ZERO);
        assert_eq!(player.heavy().phase(), AttackPhase::Idle);
        assert_eq!(player.hitbox().health(), 100.0);
        assert_eq!(player.locomotion().knockback(), KnockbackRequest::NONE);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = PlayerConfig::default();
        config.light.attack.timing.active = 0.0;
        assert!(Player::new(EntityId::new(), &config).is_err());
    }
}
