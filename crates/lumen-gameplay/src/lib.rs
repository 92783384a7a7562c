//! # Lumen Gameplay
//!
//! Locomotion and melee combat core for a 2D platformer character.
//!
//! This crate is pure simulation, stepped once per frame by the host:
//! - Locomotion controller (run, jump, wall slide, dash, glide, knockback)
//! - Collision probe contract and an axis-aligned arena fixture
//! - Attack lifecycle shared by the light melee and heavy thrust agents
//! - Hitboxes and knockback
//! - Interactable focus
//! - The player actor that ties them together, and its TOML config

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod attack;
pub mod collision;
pub mod config;
pub mod extended;
pub mod hitbox;
pub mod input;
pub mod interaction;
pub mod knockback;
pub mod locomotion;
pub mod melee;
pub mod player;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::attack::*;
    pub use crate::collision::*;
    pub use crate::config::*;
    pub use crate::extended::*;
    pub use crate::hitbox::*;
    pub use crate::input::*;
    pub use crate::interaction::*;
    pub use crate::knockback::*;
    pub use crate::locomotion::*;
    pub use crate::melee::*;
    pub use crate::player::*;
    pub use crate::world::*;
}

pub use prelude::*;
