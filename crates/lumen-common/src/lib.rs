//! # Lumen Common
//!
//! Common types and helpers shared by the Lumen platformer crates.
//!
//! - ID types (`EntityId`)
//! - Physics layer masks (`LayerMask`)
//! - Math helpers (critically damped smoothing, perpendiculars, signs)
//! - Common error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod layers;
pub mod math;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::layers::*;
    pub use crate::math::*;
    pub use glam::Vec2;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id_generation() {
        let id1 = EntityId::new();
        let id2 = EntityId::new();
        assert_ne!(id1, id2);
        assert!(id1.is_valid());
    }

    #[test]
    fn test_layer_mask_combination() {
        let enemy = LayerMask::layer(3);
        let ground = LayerMask::layer(1);
        let obstacles = enemy | ground;

        assert!(obstacles.contains(enemy));
        assert_eq!(obstacles & !enemy, ground);
    }
}
