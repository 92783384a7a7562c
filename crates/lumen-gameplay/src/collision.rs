//! Collision probe contract and contact flags.
//!
//! The locomotion controller never does collision geometry itself. Once per
//! tick it hands a desired displacement to a [`CollisionProbe`], which moves
//! the actor and reports what it touched. [`ArenaProbe`] is a small
//! axis-aligned implementation used by tests and the sandbox.

use glam::Vec2;
use lumen_common::sign;
use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AABB {
    /// Minimum corner
    pub min: Vec2,
    /// Maximum corner
    pub max: Vec2,
}

impl AABB {
    /// Creates a new AABB from its minimum and maximum corners.
    #[must_use]
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates an AABB spanning two arbitrary opposite corners.
    #[must_use]
    pub fn from_corners(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates an AABB from center and half-extents.
    #[must_use]
    pub fn from_center(center: Vec2, half_extents: Vec2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Returns the center of the AABB.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns the full extents of the AABB.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    /// Checks if this AABB overlaps with another (touching edges count).
    #[must_use]
    pub fn overlaps(&self, other: &AABB) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Distance along a ray to the first intersection with this box, if any.
    ///
    /// `direction` must be normalized. Rays starting inside the box hit at 0.
    #[must_use]
    pub fn ray_distance(&self, origin: Vec2, direction: Vec2, max_distance: f32) -> Option<f32> {
        let mut t_min = 0.0_f32;
        let mut t_max = max_distance;

        for axis in 0..2 {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
            } else {
                let inv = 1.0 / d;
                let mut t1 = (lo - o) * inv;
                let mut t2 = (hi - o) * inv;
                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }
                t_min = t_min.max(t1);
                t_max = t_max.min(t2);
                if t_min > t_max {
                    return None;
                }
            }
        }

        Some(t_min)
    }
}

impl Default for AABB {
    fn default() -> Self {
        Self::new(Vec2::ZERO, Vec2::ONE)
    }
}

/// Contact flags reported by the probe for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContactState {
    /// Touching ground
    pub below: bool,
    /// Touching a ceiling
    pub above: bool,
    /// Touching a wall on the left
    pub left: bool,
    /// Touching a wall on the right
    pub right: bool,
    /// Standing on a slope steeper than the walkable limit
    pub sliding_down_max_slope: bool,
    /// Normal of the slope being slid down (zero otherwise)
    pub slope_normal: Vec2,
    /// Horizontal facing sign, always ±1
    pub face_dir: f32,
}

impl ContactState {
    /// Any side-wall contact.
    #[must_use]
    pub fn on_wall(&self) -> bool {
        self.left || self.right
    }

    /// Ground or ceiling contact.
    #[must_use]
    pub fn vertical(&self) -> bool {
        self.above || self.below
    }

    /// Contact that restores air jumps and gliding.
    #[must_use]
    pub fn grounded_or_walled(&self) -> bool {
        self.below || self.left || self.right
    }
}

impl Default for ContactState {
    fn default() -> Self {
        Self {
            below: false,
            above: false,
            left: false,
            right: false,
            sliding_down_max_slope: false,
            slope_normal: Vec2::ZERO,
            face_dir: 1.0,
        }
    }
}

/// Collision integrator interface.
///
/// Implementations move the actor by (at most) the requested displacement
/// and report the contacts for this tick. They own the actor's position.
pub trait CollisionProbe {
    /// Moves the actor and returns the contact state after the move.
    ///
    /// `input` is the raw directional input, used by implementations that
    /// support dropping through one-way platforms. `standing_still` marks
    /// moves caused by a moving platform rather than the actor.
    fn move_by(&mut self, displacement: Vec2, input: Vec2, standing_still: bool) -> ContactState;

    /// Current actor position (collider center).
    fn position(&self) -> Vec2;

    /// Full collider extents.
    fn collider_size(&self) -> Vec2;

    /// Contacts reported by the most recent move.
    fn contacts(&self) -> ContactState;
}

/// Axis-aligned arena with a floor, optional ceiling and optional walls.
///
/// Y grows upward. Side contacts are only reported on the facing side, the
/// way a probe that casts its horizontal rays along the facing direction does.
#[derive(Debug, Clone)]
pub struct ArenaProbe {
    position: Vec2,
    collider_size: Vec2,
    floor_y: f32,
    ceiling_y: Option<f32>,
    left_wall_x: Option<f32>,
    right_wall_x: Option<f32>,
    skin_width: f32,
    steep_slope: Option<Vec2>,
    contacts: ContactState,
}

impl ArenaProbe {
    /// Default contact tolerance.
    pub const SKIN_WIDTH: f32 = 0.015;

    /// Creates an arena with a floor at `floor_y` and the actor at `position`.
    #[must_use]
    pub fn new(position: Vec2, collider_size: Vec2, floor_y: f32) -> Self {
        Self {
            position,
            collider_size,
            floor_y,
            ceiling_y: None,
            left_wall_x: None,
            right_wall_x: None,
            skin_width: Self::SKIN_WIDTH,
            steep_slope: None,
            contacts: ContactState::default(),
        }
    }

    /// Adds a ceiling.
    #[must_use]
    pub fn with_ceiling(mut self, y: f32) -> Self {
        self.ceiling_y = Some(y);
        self
    }

    /// Adds walls on either side.
    #[must_use]
    pub fn with_walls(mut self, left_x: Option<f32>, right_x: Option<f32>) -> Self {
        self.left_wall_x = left_x;
        self.right_wall_x = right_x;
        self
    }

    /// Makes the floor a slope steeper than the walkable limit.
    pub fn set_steep_slope(&mut self, normal: Option<Vec2>) {
        self.steep_slope = normal.map(Vec2::normalize_or_zero);
    }

    /// Teleports the actor without reporting contacts.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }
}

impl CollisionProbe for ArenaProbe {
    fn move_by(&mut self, displacement: Vec2, _input: Vec2, _standing_still: bool) -> ContactState {
        let half = self.collider_size * 0.5;
        let mut contacts = ContactState {
            face_dir: self.contacts.face_dir,
            ..ContactState::default()
        };

        if displacement.x != 0.0 {
            contacts.face_dir = sign(displacement.x);
        }

        // Horizontal
        let mut x = self.position.x + displacement.x;
        if let Some(wall) = self.right_wall_x {
            x = x.min(wall - half.x);
            if contacts.face_dir > 0.0 && wall - (x + half.x) <= self.skin_width {
                contacts.right = true;
            }
        }
        if let Some(wall) = self.left_wall_x {
            x = x.max(wall + half.x);
            if contacts.face_dir < 0.0 && (x - half.x) - wall <= self.skin_width {
                contacts.left = true;
            }
        }

        // Vertical
        let mut y = self.position.y + displacement.y;
        if y - half.y <= self.floor_y {
            y = self.floor_y + half.y;
        }
        if displacement.y <= 0.0 && (y - half.y) - self.floor_y <= self.skin_width {
            contacts.below = true;
        }
        if let Some(ceiling) = self.ceiling_y {
            y = y.min(ceiling - half.y);
            if displacement.y > 0.0 && ceiling - (y + half.y) <= self.skin_width {
                contacts.above = true;
            }
        }

        if contacts.below {
            if let Some(normal) = self.steep_slope {
                contacts.sliding_down_max_slope = true;
                contacts.slope_normal = normal;
            }
        }

        self.position = Vec2::new(x, y);
        self.contacts = contacts;
        contacts
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn collider_size(&self) -> Vec2 {
        self.collider_size
    }

    fn contacts(&self) -> ContactState {
        self.contacts
    }
}
