//! Platformer locomotion.
//!
//! The controller turns directional input and button requests into a
//! velocity, hands the resulting displacement to a [`CollisionProbe`] once per
//! tick and reconciles its state against the reported contacts.
//!
//! Modes are not a single enum. Dashing, gliding, wall sliding, knockback and
//! the air-jump count are independent timers and flags stepped in a fixed
//! order by [`LocomotionController::tick`]:
//!
//! 1. horizontal target from input
//! 2. knockback override
//! 3. horizontal smoothing
//! 4. dash override
//! 5. dash cooldown and invulnerability
//! 6. gravity and glide
//! 7. wall slide and wall stick
//! 8. probe move
//! 9. contact reconciliation

use glam::Vec2;
use lumen_common::{sign, sign_or_zero, smooth_damp, ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::collision::{CollisionProbe, ContactState};
use crate::hitbox::Hitbox;
use crate::knockback::KnockbackRequest;

// ============================================================================
// Configuration
// ============================================================================

/// Movement tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Apex height of a held jump
    pub max_jump_height: f32,
    /// Apex height of a tapped jump
    pub min_jump_height: f32,
    /// Seconds to reach the apex of a held jump
    pub time_to_jump_apex: f32,
    /// Horizontal run speed
    pub move_speed: f32,
    /// Horizontal speed while dashing
    pub dash_speed: f32,
    /// Dash length in seconds
    pub dash_duration: f32,
    /// Seconds between the end of a dash and the next one
    pub dash_cooldown: f32,
    /// Extra jumps allowed in the air
    pub max_air_jumps: u32,
    /// Vertical velocity multiplier applied while gliding
    pub glide_gravity_modifier: f32,
    /// Longest glide in seconds
    pub glide_max_duration: f32,
    /// Horizontal smoothing time in the air
    pub acceleration_time_airborne: f32,
    /// Horizontal smoothing time on the ground
    pub acceleration_time_grounded: f32,
    /// Wall jump while pushing into the wall
    pub wall_jump_climb: Vec2,
    /// Wall jump with no horizontal input
    pub wall_jump_off: Vec2,
    /// Wall jump while pushing away from the wall
    pub wall_leap: Vec2,
    /// Fastest fall while wall sliding
    pub wall_slide_speed_max: f32,
    /// Time the actor stays stuck to a wall while steering away
    pub wall_stick_time: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            max_jump_height: 4.0,
            min_jump_height: 1.0,
            time_to_jump_apex: 0.4,
            move_speed: 6.0,
            dash_speed: 30.0,
            dash_duration: 0.1,
            dash_cooldown: 2.0,
            max_air_jumps: 1,
            glide_gravity_modifier: 0.8,
            glide_max_duration: 0.8,
            acceleration_time_airborne: 0.2,
            acceleration_time_grounded: 0.1,
            wall_jump_climb: Vec2::new(7.5, 16.0),
            wall_jump_off: Vec2::new(8.5, 7.0),
            wall_leap: Vec2::new(18.0, 17.0),
            wall_slide_speed_max: 3.0,
            wall_stick_time: 0.25,
        }
    }
}

impl LocomotionConfig {
    /// Returns the first invalid field, if any.
    pub fn validate(&self) -> ConfigResult<()> {
        let positive = [
            ("locomotion.max_jump_height", self.max_jump_height),
            ("locomotion.min_jump_height", self.min_jump_height),
            ("locomotion.time_to_jump_apex", self.time_to_jump_apex),
        ];
        for (field, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::invalid(field, format!("must be positive, got {value}")));
            }
        }

        let non_negative = [
            ("locomotion.move_speed", self.move_speed),
            ("locomotion.dash_speed", self.dash_speed),
            ("locomotion.dash_duration", self.dash_duration),
            ("locomotion.dash_cooldown", self.dash_cooldown),
            ("locomotion.glide_max_duration", self.glide_max_duration),
            ("locomotion.acceleration_time_airborne", self.acceleration_time_airborne),
            ("locomotion.acceleration_time_grounded", self.acceleration_time_grounded),
            ("locomotion.wall_slide_speed_max", self.wall_slide_speed_max),
            ("locomotion.wall_stick_time", self.wall_stick_time),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(ConfigError::invalid(
                    field,
                    format!("must not be negative, got {value}"),
                ));
            }
        }

        if self.min_jump_height > self.max_jump_height {
            return Err(ConfigError::invalid(
                "locomotion.min_jump_height",
                format!(
                    "{} exceeds max_jump_height {}",
                    self.min_jump_height, self.max_jump_height
                ),
            ));
        }

        if !(self.glide_gravity_modifier > 0.0 && self.glide_gravity_modifier <= 1.0) {
            return Err(ConfigError::invalid(
                "locomotion.glide_gravity_modifier",
                format!("must be within (0, 1], got {}", self.glide_gravity_modifier),
            ));
        }

        Ok(())
    }
}

/// Jump constants derived from the configured heights and apex time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpPhysics {
    /// Downward acceleration (negative)
    pub gravity: f32,
    /// Launch speed of a held jump
    pub max_jump_velocity: f32,
    /// Vertical speed a released jump is cut down to
    pub min_jump_velocity: f32,
}

impl JumpPhysics {
    /// Derives gravity and jump velocities.
    #[must_use]
    pub fn from_config(config: &LocomotionConfig) -> Self {
        let gravity = -(2.0 * config.max_jump_height) / config.time_to_jump_apex.powi(2);
        Self {
            gravity,
            max_jump_velocity: gravity.abs() * config.time_to_jump_apex,
            min_jump_velocity: (2.0 * gravity.abs() * config.min_jump_height).sqrt(),
        }
    }
}

// ============================================================================
// State
// ============================================================================

/// Mode timers and flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocomotionState {
    /// Air jumps used since the last contact
    pub jump_count: u32,
    /// Remaining dash time
    pub dash_duration_left: f32,
    /// Remaining cooldown before the next dash
    pub dash_cooldown_left: f32,
    /// False between a dash start and its cooldown start
    pub dash_reset: bool,
    /// Remaining glide time
    pub glide_remaining: f32,
    /// Gliding right now
    pub gliding: bool,
    /// A glide may start
    pub glide_reset: bool,
    /// Sliding down a wall
    pub wall_sliding: bool,
    /// Side of the touched wall, -1 or 1
    pub wall_dir_x: f32,
    /// Remaining stick time while steering away from a wall
    pub time_to_wall_unstick: f32,
    /// Smoothing accumulator for horizontal velocity
    pub velocity_x_smoothing: f32,
}

impl LocomotionState {
    fn new(config: &LocomotionConfig) -> Self {
        Self {
            jump_count: 0,
            dash_duration_left: 0.0,
            dash_cooldown_left: 0.0,
            dash_reset: true,
            glide_remaining: 0.0,
            gliding: false,
            glide_reset: true,
            wall_sliding: false,
            wall_dir_x: 1.0,
            time_to_wall_unstick: config.wall_stick_time,
            velocity_x_smoothing: 0.0,
        }
    }
}

// ============================================================================
// Controller
// ============================================================================

/// Velocity state machine for one actor.
#[derive(Debug, Clone)]
pub struct LocomotionController {
    config: LocomotionConfig,
    physics: JumpPhysics,
    state: LocomotionState,
    velocity: Vec2,
    input: Vec2,
    contacts: ContactState,
    knockback: KnockbackRequest,
    target_velocity_x: f32,
}

impl LocomotionController {
    /// Creates a controller at rest.
    #[must_use]
    pub fn new(config: LocomotionConfig) -> Self {
        let physics = JumpPhysics::from_config(&config);
        let state = LocomotionState::new(&config);
        Self {
            config,
            physics,
            state,
            velocity: Vec2::ZERO,
            input: Vec2::ZERO,
            contacts: ContactState::default(),
            knockback: KnockbackRequest::NONE,
            target_velocity_x: 0.0,
        }
    }

    /// Recomputes gravity and jump velocities after a config change.
    pub fn recalculate_movement_settings(&mut self) {
        self.physics = JumpPhysics::from_config(&self.config);
        debug!(
            gravity = self.physics.gravity,
            max_jump = self.physics.max_jump_velocity,
            min_jump = self.physics.min_jump_velocity,
            "movement settings recalculated"
        );
    }

    /// Tunables.
    #[must_use]
    pub fn config(&self) -> &LocomotionConfig {
        &self.config
    }

    /// Mutable tunables. Call [`Self::recalculate_movement_settings`] after
    /// changing jump heights or apex time.
    pub fn config_mut(&mut self) -> &mut LocomotionConfig {
        &mut self.config
    }

    /// Sets the directional input for the next ticks.
    pub fn set_directional_input(&mut self, input: Vec2) {
        self.input = input;
    }

    /// Advances one tick.
    pub fn tick(&mut self, dt: f32, probe: &mut dyn CollisionProbe, hitbox: &mut Hitbox) {
        self.calculate_velocity(dt, hitbox);
        self.handle_wall_sliding(dt);

        self.contacts = probe.move_by(self.velocity * dt, self.input, false);

        self.reconcile_contacts(dt);
    }

    fn calculate_velocity(&mut self, dt: f32, hitbox: &mut Hitbox) {
        let mut target_x = self.input.x * self.config.move_speed;

        if self.knockback.is_active() {
            let launch = self.knockback.launch_velocity(self.contacts.face_dir);
            target_x = launch.x;
            self.velocity.y = launch.y;
            self.knockback.decay(dt);
        } else {
            self.knockback.clear();
        }
        self.target_velocity_x = target_x;

        let smooth_time = if self.contacts.below {
            self.config.acceleration_time_grounded
        } else {
            self.config.acceleration_time_airborne
        };
        self.velocity.x = smooth_damp(
            self.velocity.x,
            target_x,
            &mut self.state.velocity_x_smoothing,
            smooth_time,
            dt,
        );

        let mut dashing = false;
        if self.state.dash_duration_left > 0.0 {
            if self.contacts.on_wall() {
                self.state.dash_duration_left = 0.0;
                debug!("dash cancelled by wall");
            } else {
                self.state.dash_duration_left -= dt;
                self.velocity.x = self.config.dash_speed * self.contacts.face_dir;
                dashing = true;
            }
        }

        if dashing {
            return;
        }

        if !self.state.dash_reset {
            self.state.dash_cooldown_left = self.config.dash_cooldown;
            self.state.dash_reset = true;
            hitbox.set_invulnerable(false);
            debug!(cooldown = self.config.dash_cooldown, "dash ended");
        } else if self.state.dash_cooldown_left > 0.0 {
            self.state.dash_cooldown_left = (self.state.dash_cooldown_left - dt).max(0.0);
        }

        self.velocity.y += self.physics.gravity * dt;
        if self.state.gliding {
            self.velocity.y *= self.config.glide_gravity_modifier;
        }
    }

    fn handle_wall_sliding(&mut self, dt: f32) {
        let contacts = self.contacts;
        self.state.wall_dir_x = if contacts.left { -1.0 } else { 1.0 };

        let was_sliding = self.state.wall_sliding;
        self.state.wall_sliding = contacts.on_wall() && !contacts.below && self.velocity.y < 0.0;

        if !self.state.wall_sliding {
            self.state.time_to_wall_unstick = self.config.wall_stick_time;
            return;
        }

        if !was_sliding {
            debug!(wall_dir = self.state.wall_dir_x, "wall slide started");
        }

        self.velocity.y = self.velocity.y.max(-self.config.wall_slide_speed_max);

        if self.state.time_to_wall_unstick > 0.0 {
            self.state.velocity_x_smoothing = 0.0;
            self.velocity.x = 0.0;

            if sign_or_zero(self.input.x) == self.state.wall_dir_x {
                self.state.time_to_wall_unstick = self.config.wall_stick_time;
            } else {
                self.state.time_to_wall_unstick -= dt;
            }
        } else {
            self.state.time_to_wall_unstick = self.config.wall_stick_time;
        }
    }

    fn reconcile_contacts(&mut self, dt: f32) {
        let contacts = self.contacts;

        if contacts.vertical() {
            if contacts.sliding_down_max_slope {
                self.velocity.y += contacts.slope_normal.y * -self.physics.gravity * dt;
            } else {
                self.velocity.y = 0.0;
            }
        }

        if contacts.grounded_or_walled() {
            self.state.jump_count = 0;
            self.state.glide_reset = true;
            if self.state.gliding {
                self.state.gliding = false;
                self.state.glide_remaining = 0.0;
                debug!("glide ended by contact");
            }
        }
    }

    // ------------------------------------------------------------------------
    // Requests
    // ------------------------------------------------------------------------

    /// Jump button pressed.
    ///
    /// Wall, ground and air jumps are checked independently.
    pub fn on_jump_input_down(&mut self) {
        if self.is_dashing() {
            return;
        }

        let contacts = self.contacts;
        let input_x = sign_or_zero(self.input.x);

        if self.state.wall_sliding {
            let wall_dir = self.state.wall_dir_x;
            let jump = if input_x == wall_dir {
                self.config.wall_jump_climb
            } else if input_x == 0.0 {
                self.config.wall_jump_off
            } else {
                self.config.wall_leap
            };
            self.velocity = Vec2::new(-wall_dir * jump.x, jump.y);
            debug!(wall_dir, ?jump, "wall jump");
        }

        if contacts.below {
            if contacts.sliding_down_max_slope {
                // Jumping into the slope does nothing
                if input_x != -sign(contacts.slope_normal.x) {
                    self.velocity = self.physics.max_jump_velocity * contacts.slope_normal;
                }
            } else {
                self.velocity.y = self.physics.max_jump_velocity;
            }
        }

        if !self.state.wall_sliding
            && !contacts.below
            && !contacts.on_wall()
            && self.state.jump_count < self.config.max_air_jumps
        {
            self.velocity.y = self.physics.max_jump_velocity;
            self.state.jump_count += 1;
            debug!(jump_count = self.state.jump_count, "air jump");
        }
    }

    /// Jump button released.
    pub fn on_jump_input_up(&mut self) {
        if self.velocity.y > self.physics.min_jump_velocity {
            self.velocity.y = self.physics.min_jump_velocity;
        }
        if self.state.gliding {
            self.state.gliding = false;
            debug!("glide ended by release");
        }
    }

    /// Dash button pressed. Returns whether a dash started.
    pub fn on_dash(&mut self, hitbox: &mut Hitbox) -> bool {
        if self.state.dash_duration_left > 0.0 || self.state.dash_cooldown_left > 0.0 {
            return false;
        }

        self.state.dash_reset = false;
        self.state.dash_duration_left = self.config.dash_duration;
        hitbox.set_invulnerable(true);
        debug!(face_dir = self.contacts.face_dir, "dash started");
        true
    }

    /// Glide button held; call once per frame with the frame time.
    pub fn on_glide(&mut self, dt: f32) {
        if !self.contacts.below
            && !self.state.gliding
            && self.state.glide_reset
            && self.velocity.y <= 0.0
        {
            self.state.glide_remaining = self.config.glide_max_duration;
            self.state.gliding = true;
            debug!("glide started");
        }

        if self.state.gliding {
            if self.state.glide_remaining > 0.0 {
                self.state.glide_remaining -= dt;
            } else {
                self.state.glide_remaining = 0.0;
                self.state.gliding = false;
                self.state.glide_reset = false;
                debug!("glide exhausted");
            }
        }
    }

    /// Stores the knockback of a hit that landed.
    pub fn on_damage_taken(&mut self, amount: f32, knockback: KnockbackRequest) {
        debug!(amount, ?knockback, "knocked back");
        self.knockback = knockback;
    }

    /// Drops all motion, timers and knockback.
    pub fn reset(&mut self) {
        self.state = LocomotionState::new(&self.config);
        self.velocity = Vec2::ZERO;
        self.input = Vec2::ZERO;
        self.knockback.clear();
        self.target_velocity_x = 0.0;
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    /// Current velocity.
    #[must_use]
    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Contacts from the most recent probe move.
    #[must_use]
    pub fn contacts(&self) -> ContactState {
        self.contacts
    }

    /// Mode timers and flags.
    #[must_use]
    pub fn state(&self) -> &LocomotionState {
        &self.state
    }

    /// Horizontal target chosen in the most recent tick.
    #[must_use]
    pub fn target_velocity_x(&self) -> f32 {
        self.target_velocity_x
    }

    /// Pending knockback.
    #[must_use]
    pub fn knockback(&self) -> KnockbackRequest {
        self.knockback
    }

    /// A dash is in progress.
    #[must_use]
    pub fn is_dashing(&self) -> bool {
        self.state.dash_duration_left > 0.0
    }

    /// Gliding.
    #[must_use]
    pub fn is_gliding(&self) -> bool {
        self.state.gliding
    }

    /// Wall sliding.
    #[must_use]
    pub fn is_wall_sliding(&self) -> bool {
        self.state.wall_sliding
    }

    /// A knockback still overrides movement.
    #[must_use]
    pub fn is_knocked_back(&self) -> bool {
        self.knockback.is_active()
    }

    /// Gravity (negative).
    #[must_use]
    pub fn gravity(&self) -> f32 {
        self.physics.gravity
    }

    /// Held-jump launch speed.
    #[must_use]
    pub fn max_jump_velocity(&self) -> f32 {
        self.physics.max_jump_velocity
    }

    /// Released-jump speed cap.
    #[must_use]
    pub fn min_jump_velocity(&self) -> f32 {
        self.physics.min_jump_velocity
    }
}

impl Default for LocomotionController {
    fn default() -> Self {
        Self::new(LocomotionConfig::default())
    }
}
