//! Damage intake: the damageable contract and the health-carrying hitbox.

use glam::Vec2;
use lumen_common::EntityId;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::knockback::KnockbackRequest;

/// Which attack produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackKind {
    /// Quick swing from the melee agent
    Light,
    /// Extended thrust
    Heavy,
}

/// Everything a damageable needs to know about the hit it receives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageSource {
    /// Attacking actor
    pub attacker: EntityId,
    /// Attacker position at the moment of the hit
    pub origin: Vec2,
    /// Attack that landed
    pub kind: AttackKind,
    /// Damage amount
    pub damage: f32,
    /// Knockback launch speed
    pub knockback_speed: f32,
    /// Knockback duration in seconds
    pub knockback_duration: f32,
}

/// Something that can be hit.
///
/// The receiver owns health and knockback emission; the attacker only calls
/// `damage` once per activation.
pub trait Damageable {
    /// Applies a hit. Returns `false` when the hit was ignored.
    fn damage(&mut self, source: &DamageSource) -> bool;
}

/// A hit that landed on a [`Hitbox`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageTaken {
    /// Who dealt it
    pub attacker: EntityId,
    /// Health removed
    pub amount: f32,
    /// Knockback to apply to the owner
    pub knockback: KnockbackRequest,
}

/// Hitbox tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitboxConfig {
    /// Starting and maximum health
    pub max_health: f32,
}

impl Default for HitboxConfig {
    fn default() -> Self {
        Self { max_health: 100.0 }
    }
}

/// Health pool that turns incoming hits into damage events.
#[derive(Debug, Clone)]
pub struct Hitbox {
    owner: EntityId,
    position: Vec2,
    health: f32,
    max_health: f32,
    invulnerable: bool,
    pending: Vec<DamageTaken>,
}

impl Hitbox {
    /// Creates a hitbox at full health.
    #[must_use]
    pub fn new(owner: EntityId, config: &HitboxConfig) -> Self {
        Self {
            owner,
            position: Vec2::ZERO,
            health: config.max_health,
            max_health: config.max_health,
            invulnerable: false,
            pending: Vec::new(),
        }
    }

    /// Owning actor.
    #[must_use]
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Moves the hitbox along with its owner.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Current position.
    #[must_use]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Remaining health.
    #[must_use]
    pub fn health(&self) -> f32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub fn max_health(&self) -> f32 {
        self.max_health
    }

    /// Whether health has run out.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Toggles hit invulnerability.
    pub fn set_invulnerable(&mut self, invulnerable: bool) {
        self.invulnerable = invulnerable;
    }

    /// Whether incoming hits are currently ignored.
    #[must_use]
    pub fn is_invulnerable(&self) -> bool {
        self.invulnerable
    }

    /// Restores full health and drops queued hits.
    pub fn reset(&mut self) {
        self.health = self.max_health;
        self.invulnerable = false;
        self.pending.clear();
    }

    /// Takes the hits received since the last call.
    pub fn drain_damage(&mut self) -> Vec<DamageTaken> {
        std::mem::take(&mut self.pending)
    }
}

impl Damageable for Hitbox {
    fn damage(&mut self, source: &DamageSource) -> bool {
        if self.invulnerable || self.is_dead() {
            debug!(owner = %self.owner, attacker = %source.attacker, "hit ignored");
            return false;
        }

        self.health = (self.health - source.damage).max(0.0);

        let direction = (self.position - source.origin).normalize_or_zero();
        let knockback = KnockbackRequest::new(
            direction,
            source.knockback_speed,
            source.knockback_duration,
        );

        debug!(
            owner = %self.owner,
            attacker = %source.attacker,
            amount = source.damage,
            health = self.health,
            "damage taken"
        );

        self.pending.push(DamageTaken {
            attacker: source.attacker,
            amount: source.damage,
            knockback,
        });
        true
    }
}
