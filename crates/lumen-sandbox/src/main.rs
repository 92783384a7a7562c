//! # Lumen Sandbox
//!
//! Headless driver for the platformer core. Builds a small arena, spawns a
//! player and plays a scripted input timeline against it.
//!
//! ```text
//! lumen [player.toml] [scenario.toml]
//! ```
//!
//! Both files are optional. `RUST_LOG=lumen=debug` shows every action.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

mod scenario;

use anyhow::{Context, Result};
use lumen_common::EntityId;
use lumen_gameplay::{Player, PlayerConfig};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::scenario::{Arena, Scenario};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("lumen=info".parse()?))
        .init();

    info!("Lumen sandbox starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => PlayerConfig::load(&path).with_context(|| format!("loading {path}"))?,
        None => PlayerConfig::default(),
    };
    let scenario = match args.next() {
        Some(path) => Scenario::load(&path)?,
        None => Scenario::default(),
    };

    let mut arena = Arena::new();
    let mut player = Player::new(EntityId::new(), &config)?;
    info!(
        player = %player.id(),
        gravity = player.locomotion().gravity(),
        jump_velocity = player.locomotion().max_jump_velocity(),
        "Spawned player"
    );

    let summary = scenario::run(&mut player, &scenario, &mut arena);

    let signpost_focused = arena
        .interactables
        .get(arena.signpost)
        .and_then(|s| s.focused_by())
        == Some(player.id());
    info!(
        ticks = summary.ticks,
        strikes = summary.strikes,
        rejected = summary.rejected,
        events = summary.events,
        damage_dealt = summary.damage_dealt,
        dummy_health = summary.dummy_health,
        signpost_focused,
        "Run complete at ({:.2}, {:.2})",
        summary.final_position.x,
        summary.final_position.y
    );

    Ok(())
}
