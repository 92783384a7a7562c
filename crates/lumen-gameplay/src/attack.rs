//! Attack lifecycle shared by every attack agent.
//!
//! This module provides:
//! - Attack phases (idle, windup, active, recovery)
//! - Phase timing and its startup validation
//! - The per-activation "already struck" bookkeeping
//! - The spatial query seam (`CombatWorld`) and hit resolution
//! - The `AttackAgent` trait implemented by the melee and extended agents

use glam::Vec2;
use lumen_common::{sign, ConfigError, ConfigResult, EntityId, LayerMask};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{ENEMY_LAYER, GROUND_LAYER};
use crate::hitbox::{AttackKind, DamageSource, Damageable};

// ============================================================================
// Attack Phases
// ============================================================================

/// Phase of an attack activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AttackPhase {
    /// Ready for a new request.
    #[default]
    Idle,
    /// Preparing to strike.
    Windup,
    /// Hit region live.
    Active,
    /// Recovering after the strike.
    Recovery,
}

impl AttackPhase {
    /// Check if the phase deals damage.
    #[must_use]
    pub fn can_damage(self) -> bool {
        self == Self::Active
    }

    /// Phase entered when this one elapses.
    #[must_use]
    pub fn next(self) -> Self {
        match self {
            Self::Idle | Self::Recovery => Self::Idle,
            Self::Windup => Self::Active,
            Self::Active => Self::Recovery,
        }
    }
}

// ============================================================================
// Attack Timing
// ============================================================================

/// Per-phase durations, in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackTiming {
    /// Duration of windup phase.
    pub windup: f32,
    /// Duration of active phase; the attack duration used for interpolation.
    pub active: f32,
    /// Duration of recovery phase.
    pub recovery: f32,
}

impl Default for AttackTiming {
    fn default() -> Self {
        Self {
            windup: 0.05,
            active: 0.2,
            recovery: 0.15,
        }
    }
}

impl AttackTiming {
    /// Create new attack timing.
    #[must_use]
    pub fn new(windup: f32, active: f32, recovery: f32) -> Self {
        Self {
            windup,
            active,
            recovery,
        }
    }

    /// Duration of a phase.
    #[must_use]
    pub fn duration_of(&self, phase: AttackPhase) -> f32 {
        match phase {
            AttackPhase::Idle => 0.0,
            AttackPhase::Windup => self.windup,
            AttackPhase::Active => self.active,
            AttackPhase::Recovery => self.recovery,
        }
    }

    /// Rejects timings that would break the elapsed-fraction math.
    pub fn validate(&self, field: &str) -> ConfigResult<()> {
        if !(self.active > 0.0) {
            return Err(ConfigError::invalid(
                format!("{field}.active"),
                format!("attack duration must be positive, got {}", self.active),
            ));
        }
        if !(self.windup >= 0.0) {
            return Err(ConfigError::invalid(
                format!("{field}.windup"),
                format!("must not be negative, got {}", self.windup),
            ));
        }
        if !(self.recovery >= 0.0) {
            return Err(ConfigError::invalid(
                format!("{field}.recovery"),
                format!("must not be negative, got {}", self.recovery),
            ));
        }
        Ok(())
    }
}

/// Tunables shared by every attack agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttackConfig {
    /// Reach beyond the collider edge.
    pub range: f32,
    /// Damage per strike.
    pub damage: f32,
    /// Knockback launch speed handed to the target.
    pub knockback_speed: f32,
    /// Knockback duration handed to the target.
    pub knockback_duration: f32,
    /// Phase durations.
    pub timing: AttackTiming,
    /// Whether a new request may cut the recovery phase short.
    pub cancel_recovery: bool,
}

impl Default for AttackConfig {
    fn default() -> Self {
        Self {
            range: 1.5,
            damage: 10.0,
            knockback_speed: 6.0,
            knockback_duration: 0.15,
            timing: AttackTiming::default(),
            cancel_recovery: false,
        }
    }
}

impl AttackConfig {
    /// Validates ranges and timing.
    pub fn validate(&self, field: &str) -> ConfigResult<()> {
        if !(self.range > 0.0) {
            return Err(ConfigError::invalid(
                format!("{field}.range"),
                format!("must be positive, got {}", self.range),
            ));
        }
        if !(self.damage >= 0.0) {
            return Err(ConfigError::invalid(
                format!("{field}.damage"),
                format!("must not be negative, got {}", self.damage),
            ));
        }
        if !(self.knockback_duration >= 0.0) {
            return Err(ConfigError::invalid(
                format!("{field}.knockback_duration"),
                format!("must not be negative, got {}", self.knockback_duration),
            ));
        }
        self.timing.validate(&format!("{field}.timing"))
    }
}

// ============================================================================
// Attack Lifecycle
// ============================================================================

/// Time-boxed phase machine plus the per-activation strike set.
#[derive(Debug, Clone)]
pub struct AttackLifecycle {
    timing: AttackTiming,
    cancel_recovery: bool,
    phase: AttackPhase,
    phase_remaining: f32,
    target: Option<EntityId>,
    struck: Vec<EntityId>,
    activations: u32,
}

impl AttackLifecycle {
    /// Creates an idle lifecycle.
    #[must_use]
    pub fn new(timing: AttackTiming, cancel_recovery: bool) -> Self {
        Self {
            timing,
            cancel_recovery,
            phase: AttackPhase::Idle,
            phase_remaining: 0.0,
            target: None,
            struck: Vec::new(),
            activations: 0,
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> AttackPhase {
        self.phase
    }

    /// Target locked when the activation started.
    #[must_use]
    pub fn target(&self) -> Option<EntityId> {
        self.target
    }

    /// Number of accepted requests so far.
    #[must_use]
    pub fn activations(&self) -> u32 {
        self.activations
    }

    /// Whether a request would be accepted right now.
    #[must_use]
    pub fn can_start(&self) -> bool {
        match self.phase {
            AttackPhase::Idle => true,
            AttackPhase::Recovery => self.cancel_recovery,
            AttackPhase::Windup | AttackPhase::Active => false,
        }
    }

    /// Starts a new activation. Returns `false` if the request is declined.
    pub fn request(&mut self, target: Option<EntityId>) -> bool {
        if !self.can_start() {
            return false;
        }

        self.struck.clear();
        self.target = target;
        self.phase = AttackPhase::Windup;
        self.phase_remaining = self.timing.windup;
        self.activations += 1;
        true
    }

    /// Counts the current phase down by `dt`.
    ///
    /// Overshoot carries into the next phase and zero-length phases are
    /// passed through. The active phase always lasts at least one call.
    /// Returns the last phase entered, if any.
    pub fn advance(&mut self, dt: f32) -> Option<AttackPhase> {
        if self.phase == AttackPhase::Idle {
            return None;
        }

        self.phase_remaining -= dt;
        let mut entered = None;

        while self.phase != AttackPhase::Idle && self.phase_remaining <= 0.0 {
            let next = self.phase.next();
            let overshoot = self.phase_remaining;
            self.phase = next;
            entered = Some(next);

            if next == AttackPhase::Idle {
                self.phase_remaining = 0.0;
                self.target = None;
                break;
            }

            self.phase_remaining = self.timing.duration_of(next) + overshoot;
            if next == AttackPhase::Active || self.timing.duration_of(next) > 0.0 {
                break;
            }
        }

        entered
    }

    /// Drops the activation and returns to idle.
    pub fn reset(&mut self) {
        self.phase = AttackPhase::Idle;
        self.phase_remaining = 0.0;
        self.target = None;
    }

    /// Configured attack (active phase) duration.
    #[must_use]
    pub fn attack_duration(&self) -> f32 {
        self.timing.active
    }

    /// Active time still to run before the strike completes.
    #[must_use]
    pub fn time_to_attack_complete(&self) -> f32 {
        match self.phase {
            AttackPhase::Windup => self.timing.active,
            AttackPhase::Active => self.phase_remaining.max(0.0),
            AttackPhase::Recovery | AttackPhase::Idle => 0.0,
        }
    }

    /// Progress through the active phase, clamped to [0, 1].
    #[must_use]
    pub fn elapsed_fraction(&self) -> f32 {
        let duration = self.attack_duration();
        if duration <= 0.0 {
            return 1.0;
        }
        (1.0 - self.time_to_attack_complete() / duration).clamp(0.0, 1.0)
    }

    /// Whether a collider was already hit by this activation.
    #[must_use]
    pub fn has_struck(&self, collider: EntityId) -> bool {
        self.struck.contains(&collider)
    }

    /// Records a hit. Returns `false` if the collider was already hit.
    pub fn record_strike(&mut self, collider: EntityId) -> bool {
        if self.has_struck(collider) {
            return false;
        }
        self.struck.push(collider);
        true
    }
}

// ============================================================================
// Spatial Queries
// ============================================================================

/// Collision layers an attacker cares about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatMasks {
    /// Layers that can be hit
    pub enemy: LayerMask,
    /// Layers that block movement and sight
    pub obstacle: LayerMask,
}

impl Default for CombatMasks {
    fn default() -> Self {
        Self::new(ENEMY_LAYER, GROUND_LAYER)
    }
}

impl CombatMasks {
    /// Creates a mask pair.
    #[must_use]
    pub const fn new(enemy: LayerMask, obstacle: LayerMask) -> Self {
        Self { enemy, obstacle }
    }

    /// Layers that block line of sight to a candidate.
    #[must_use]
    pub fn line_of_sight(&self) -> LayerMask {
        self.obstacle & !self.enemy
    }
}

/// First collider hit by a ray.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RaycastHit {
    /// Collider that was hit
    pub collider: EntityId,
    /// Distance from the ray origin
    pub distance: f32,
}

/// Spatial query interface used to resolve attacks.
pub trait CombatWorld {
    /// Colliders on `mask` overlapping the rectangle spanned by two corners.
    fn overlap_area(&self, corner_a: Vec2, corner_b: Vec2, mask: LayerMask) -> Vec<EntityId>;

    /// Colliders on `mask` overlapping a circle.
    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<EntityId>;

    /// First collider on `mask` along a ray, within `max_distance`.
    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit>;

    /// Position of a collider's owner, if it still exists.
    fn position_of(&self, collider: EntityId) -> Option<Vec2>;

    /// Damageable component attached to a collider, if any.
    fn damageable_mut(&mut self, collider: EntityId) -> Option<&mut dyn Damageable>;
}

// ============================================================================
// Attack Geometry
// ============================================================================

/// Attacker state an agent needs for one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackerContext {
    /// Attacking actor (never hit by its own attacks)
    pub id: EntityId,
    /// Collider center
    pub position: Vec2,
    /// Full collider extents
    pub collider_size: Vec2,
    /// Last horizontal facing sign
    pub face_dir: f32,
}

impl AttackerContext {
    /// Unit facing vector: toward the target when one is given, else the
    /// actor's own facing.
    #[must_use]
    pub fn facing(&self, target: Option<Vec2>) -> Vec2 {
        match target {
            Some(target) => Vec2::new(-sign(self.position.x - target.x), 0.0),
            None => Vec2::new(sign(self.face_dir), 0.0),
        }
    }

    /// Point on the collider edge in the facing direction.
    #[must_use]
    pub fn edge(&self, facing: Vec2) -> Vec2 {
        self.position + facing * self.collider_size * 0.5
    }
}

/// Rectangular hit region for the current tick.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AttackArea {
    /// Corner on the moving edge
    pub leading_point: Vec2,
    /// Opposite, anchored corner
    pub trailing_point: Vec2,
    /// Extents of the rectangle
    pub size: Vec2,
}

impl AttackArea {
    /// Builds an area from a frame: `edge` is the collider edge point,
    /// `facing` and `across` are unit axes, and the spans are offsets along
    /// them. The leading corner sits at the ends of both spans.
    #[must_use]
    pub fn from_spans(
        edge: Vec2,
        facing: Vec2,
        across: Vec2,
        along: (f32, f32),
        sideways: (f32, f32),
    ) -> Self {
        let trailing_point = edge + facing * along.0 + across * sideways.0;
        let leading_point = edge + facing * along.1 + across * sideways.1;
        Self {
            leading_point,
            trailing_point,
            size: (leading_point - trailing_point).abs(),
        }
    }
}

/// A strike delivered this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrikeReport {
    /// Collider that was hit
    pub target: EntityId,
    /// Attack that landed
    pub kind: AttackKind,
    /// Damage sent
    pub damage: f32,
    /// Whether the damageable accepted the hit
    pub accepted: bool,
}

/// Damages every visible, not-yet-struck enemy inside `area`.
pub fn resolve_strikes(
    lifecycle: &mut AttackLifecycle,
    area: &AttackArea,
    ctx: &AttackerContext,
    masks: CombatMasks,
    source: &DamageSource,
    world: &mut dyn CombatWorld,
) -> Vec<StrikeReport> {
    let mut reports = Vec::new();
    let candidates = world.overlap_area(area.leading_point, area.trailing_point, masks.enemy);

    for candidate in candidates {
        if candidate == ctx.id || lifecycle.has_struck(candidate) {
            continue;
        }

        let Some(position) = world.position_of(candidate) else {
            continue;
        };

        let heading = position - ctx.position;
        let blocked = world
            .raycast(
                ctx.position,
                heading.normalize_or_zero(),
                heading.length(),
                masks.line_of_sight(),
            )
            .is_some();
        if blocked {
            debug!(attacker = %ctx.id, target = %candidate, "line of sight blocked");
            continue;
        }

        let Some(damageable) = world.damageable_mut(candidate) else {
            continue;
        };

        let accepted = damageable.damage(source);
        lifecycle.record_strike(candidate);
        debug!(attacker = %ctx.id, target = %candidate, accepted, kind = ?source.kind, "strike");

        reports.push(StrikeReport {
            target: candidate,
            kind: source.kind,
            damage: source.damage,
            accepted,
        });
    }

    reports
}

// ============================================================================
// Attack Agents
// ============================================================================

/// Capability set shared by all attack agents.
pub trait AttackAgent {
    /// Stores the combat masks and validates tunables. Call once at startup.
    fn init(&mut self, masks: CombatMasks) -> ConfigResult<()>;

    /// Requests a new activation, optionally locked onto a target.
    fn attack(&mut self, target: Option<EntityId>) -> bool;

    /// Current lifecycle phase.
    fn phase(&self) -> AttackPhase;

    /// Whether the hit region is live.
    fn is_attacking(&self) -> bool {
        self.phase().can_damage()
    }

    /// Reach beyond the collider edge.
    fn range(&self) -> f32;

    /// Hit region computed on the most recent active tick.
    fn attack_area(&self) -> Option<AttackArea>;

    /// Advances the lifecycle and, while active, resolves hits.
    fn tick(
        &mut self,
        dt: f32,
        ctx: &AttackerContext,
        world: &mut dyn CombatWorld,
    ) -> Vec<StrikeReport>;

    /// Drops any activation in progress.
    fn cancel(&mut self);
}

/// Builds the damage payload for an agent's strike.
pub(crate) fn damage_source(
    config: &AttackConfig,
    kind: AttackKind,
    ctx: &AttackerContext,
) -> DamageSource {
    DamageSource {
        attacker: ctx.id,
        origin: ctx.position,
        kind,
        damage: config.damage,
        knockback_speed: config.knockback_speed,
        knockback_duration: config.knockback_duration,
    }
}

/// Logs a phase transition for an agent.
pub(crate) fn log_transition(agent: &'static str, owner: EntityId, phase: Option<AttackPhase>) {
    if let Some(phase) = phase {
        debug!(agent, owner = %owner, ?phase, "attack phase");
    }
}
