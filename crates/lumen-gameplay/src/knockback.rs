//! Knockback requests produced by damage events.

use glam::Vec2;
use lumen_common::{rotate_clockwise, sign};
use serde::{Deserialize, Serialize};

/// Launch angle applied to horizontal knockback, in radians above horizontal.
pub const KNOCKBACK_ANGLE: f32 = std::f32::consts::FRAC_PI_6;

/// A knockback that overrides locomotion until its duration runs out.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct KnockbackRequest {
    /// Direction the actor is pushed in
    pub direction: Vec2,
    /// Launch speed
    pub speed: f32,
    /// Seconds remaining
    pub duration: f32,
}

impl KnockbackRequest {
    /// The inert request.
    pub const NONE: Self = Self {
        direction: Vec2::ZERO,
        speed: 0.0,
        duration: 0.0,
    };

    /// Creates a new knockback request.
    #[must_use]
    pub const fn new(direction: Vec2, speed: f32, duration: f32) -> Self {
        Self {
            direction,
            speed,
            duration,
        }
    }

    /// Whether the knockback still overrides movement.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.duration > 0.0
    }

    /// Velocity this knockback imposes for the current tick.
    ///
    /// The horizontal sign of `direction` picks the side; a purely vertical
    /// knockback is resolved to push the actor away from where it faces. The
    /// launch is `speed` tilted upward by [`KNOCKBACK_ANGLE`]. A downward
    /// `direction` replaces the vertical component with its own y.
    #[must_use]
    pub fn launch_velocity(&mut self, face_dir: f32) -> Vec2 {
        if self.direction.x == 0.0 {
            self.direction.x = -face_dir;
        }

        let dir_x = sign(self.direction.x);
        let base = Vec2::new(dir_x * self.speed, 0.0);
        let launched = rotate_clockwise(base, -dir_x * KNOCKBACK_ANGLE);

        let vertical = if self.direction.y < 0.0 {
            self.direction.y
        } else {
            launched.y
        };

        Vec2::new(launched.x, vertical)
    }

    /// Consumes `dt` seconds of the knockback.
    pub fn decay(&mut self, dt: f32) {
        self.duration -= dt;
    }

    /// Pins the request to the inert state.
    pub fn clear(&mut self) {
        *self = Self::NONE;
    }
}
