//! In-memory combat world.
//!
//! A flat list of axis-aligned colliders, each on a single layer and
//! optionally carrying a [`Hitbox`]. Used by the sandbox and tests as the
//! [`CombatWorld`] behind the attack agents.

use glam::Vec2;
use lumen_common::{EntityId, LayerMask};
use tracing::debug;

use crate::attack::{CombatWorld, RaycastHit};
use crate::collision::AABB;
use crate::hitbox::{DamageTaken, Damageable, Hitbox};

/// A collider in the arena.
#[derive(Debug, Clone)]
pub struct Body {
    /// Collider id
    pub id: EntityId,
    /// World-space bounds
    pub bounds: AABB,
    /// Layer the collider lives on
    pub layer: LayerMask,
    /// Damage receiver, if any
    pub hitbox: Option<Hitbox>,
}

/// Flat collider store with brute-force queries.
#[derive(Debug, Clone, Default)]
pub struct ArenaWorld {
    bodies: Vec<Body>,
}

impl ArenaWorld {
    /// Creates an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a solid collider with no hitbox.
    pub fn add_obstacle(&mut self, bounds: AABB, layer: LayerMask) -> EntityId {
        self.insert(bounds, layer, None)
    }

    /// Adds a collider carrying a hitbox; the hitbox follows the collider.
    pub fn add_damageable(
        &mut self,
        bounds: AABB,
        layer: LayerMask,
        mut hitbox: Hitbox,
    ) -> EntityId {
        hitbox.set_position(bounds.center());
        self.insert(bounds, layer, Some(hitbox))
    }

    fn insert(&mut self, bounds: AABB, layer: LayerMask, hitbox: Option<Hitbox>) -> EntityId {
        let id = EntityId::new();
        debug!(collider = %id, ?layer, "body added");
        self.bodies.push(Body {
            id,
            bounds,
            layer,
            hitbox,
        });
        id
    }

    /// Removes a collider.
    pub fn remove(&mut self, id: EntityId) -> Option<Body> {
        let index = self.bodies.iter().position(|b| b.id == id)?;
        Some(self.bodies.remove(index))
    }

    /// Looks up a collider.
    #[must_use]
    pub fn body(&self, id: EntityId) -> Option<&Body> {
        self.bodies.iter().find(|b| b.id == id)
    }

    /// Hitbox attached to a collider.
    #[must_use]
    pub fn hitbox(&self, id: EntityId) -> Option<&Hitbox> {
        self.body(id).and_then(|b| b.hitbox.as_ref())
    }

    /// Mutable hitbox attached to a collider.
    pub fn hitbox_mut(&mut self, id: EntityId) -> Option<&mut Hitbox> {
        self.bodies
            .iter_mut()
            .find(|b| b.id == id)
            .and_then(|b| b.hitbox.as_mut())
    }

    /// Moves a collider so its center sits at `center`.
    pub fn set_center(&mut self, id: EntityId, center: Vec2) {
        if let Some(body) = self.bodies.iter_mut().find(|b| b.id == id) {
            body.bounds = AABB::from_center(center, body.bounds.size() * 0.5);
            if let Some(hitbox) = body.hitbox.as_mut() {
                hitbox.set_position(center);
            }
        }
    }

    /// Takes the hits every hitbox received since the last call, tagged with
    /// the collider that took them.
    pub fn drain_damage(&mut self) -> Vec<(EntityId, DamageTaken)> {
        let mut hits = Vec::new();
        for body in &mut self.bodies {
            let id = body.id;
            if let Some(hitbox) = body.hitbox.as_mut() {
                hits.extend(hitbox.drain_damage().into_iter().map(|hit| (id, hit)));
            }
        }
        hits
    }

    /// Number of colliders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Whether the world has no colliders.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    fn on_layer(&self, mask: LayerMask) -> impl Iterator<Item = &Body> {
        self.bodies.iter().filter(move |b| b.layer.intersects(mask))
    }
}

impl CombatWorld for ArenaWorld {
    fn overlap_area(&self, corner_a: Vec2, corner_b: Vec2, mask: LayerMask) -> Vec<EntityId> {
        let area = AABB::from_corners(corner_a, corner_b);
        self.on_layer(mask)
            .filter(|b| b.bounds.overlaps(&area))
            .map(|b| b.id)
            .collect()
    }

    fn overlap_circle(&self, center: Vec2, radius: f32, mask: LayerMask) -> Vec<EntityId> {
        self.on_layer(mask)
            .filter(|b| {
                let closest = center.clamp(b.bounds.min, b.bounds.max);
                closest.distance_squared(center) <= radius * radius
            })
            .map(|b| b.id)
            .collect()
    }

    fn raycast(
        &self,
        origin: Vec2,
        direction: Vec2,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RaycastHit> {
        if direction == Vec2::ZERO {
            return None;
        }

        self.on_layer(mask)
            .filter_map(|b| {
                b.bounds
                    .ray_distance(origin, direction, max_distance)
                    .map(|distance| RaycastHit {
                        collider: b.id,
                        distance,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn position_of(&self, collider: EntityId) -> Option<Vec2> {
        self.body(collider).map(|b| b.bounds.center())
    }

    fn damageable_mut(&mut self, collider: EntityId) -> Option<&mut dyn Damageable> {
        self.hitbox_mut(collider).map(|h| h as &mut dyn Damageable)
    }
}
