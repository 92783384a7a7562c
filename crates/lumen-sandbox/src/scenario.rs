//! Scripted input timelines and the arena they run in.
//!
//! A scenario is a list of steps keyed by tick. Each step can change the
//! movement axes, press or release buttons, and pick the light swing.
//! Omitted fields, `steps` included, fall back to the built-in demo.
//!
//! ```toml
//! dt = 0.0166667
//! ticks = 120
//!
//! [[steps]]
//! at = 0
//! direction = [1.0, 0.0]
//!
//! [[steps]]
//! at = 30
//! press = ["light_attack"]
//! swing = "left_to_right"
//! ```

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{ensure, Context, Result};
use glam::Vec2;
use lumen_common::EntityId;
use lumen_gameplay::{
    ArenaProbe, ArenaWorld, AttackDirection, Button, CollisionProbe, Hitbox, HitboxConfig,
    Interactable, InteractableSet, LogInteraction, Player, PlayerInput, AABB, ENEMY_LAYER,
    GROUND_LAYER, INTERACTABLE_LAYER,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// One scripted change, applied at the start of tick `at`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Step {
    /// Tick the step applies on
    pub at: u32,
    /// New movement axes
    pub direction: Option<Vec2>,
    /// Buttons that go down
    pub press: Vec<Button>,
    /// Buttons that come up
    pub release: Vec<Button>,
    /// Swing profile for following light attacks
    pub swing: Option<AttackDirection>,
}

/// A fixed-step input timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Seconds per tick
    pub dt: f32,
    /// Number of ticks to run
    pub ticks: u32,
    /// Log the player state every this many ticks (0 disables)
    pub log_every: u32,
    /// Timeline
    pub steps: Vec<Step>,
}

impl Default for Scenario {
    /// Run to the dummy, hit it twice, jump and glide, then dash back to the signpost.
    fn default() -> Self {
        let at = |at: u32| Step {
            at,
            ..Step::default()
        };

        Self {
            dt: 1.0 / 60.0,
            ticks: 300,
            log_every: 30,
            steps: vec![
                Step {
                    direction: Some(Vec2::X),
                    ..at(0)
                },
                Step {
                    direction: Some(Vec2::ZERO),
                    press: vec![Button::LightAttack],
                    swing: Some(AttackDirection::LeftToRight),
                    ..at(45)
                },
                Step {
                    release: vec![Button::LightAttack],
                    ..at(46)
                },
                Step {
                    press: vec![Button::HeavyAttack],
                    ..at(70)
                },
                Step {
                    release: vec![Button::HeavyAttack],
                    ..at(71)
                },
                Step {
                    press: vec![Button::Jump],
                    ..at(120)
                },
                Step {
                    release: vec![Button::Jump],
                    ..at(128)
                },
                Step {
                    press: vec![Button::Glide],
                    ..at(140)
                },
                Step {
                    release: vec![Button::Glide],
                    ..at(170)
                },
                Step {
                    direction: Some(Vec2::NEG_X),
                    ..at(200)
                },
                Step {
                    press: vec![Button::Dash],
                    ..at(210)
                },
                Step {
                    release: vec![Button::Dash],
                    ..at(211)
                },
                Step {
                    direction: Some(Vec2::ZERO),
                    press: vec![Button::Interact],
                    ..at(250)
                },
                Step {
                    release: vec![Button::Interact],
                    ..at(251)
                },
            ],
        }
    }
}

impl Scenario {
    /// Parses a TOML timeline.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let scenario: Self = toml::from_str(contents).context("parsing scenario")?;
        ensure!(
            scenario.dt > 0.0 && scenario.dt.is_finite(),
            "scenario dt must be positive, got {}",
            scenario.dt
        );
        Ok(scenario)
    }

    /// Reads a TOML timeline from disk.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading scenario {}", path.display()))?;
        let scenario = Self::from_toml_str(&contents)?;
        info!("Loaded scenario from {} ({} steps)", path.display(), scenario.steps.len());
        Ok(scenario)
    }

    fn steps_at(&self, tick: u32) -> impl Iterator<Item = &Step> {
        self.steps.iter().filter(move |s| s.at == tick)
    }
}

/// Flat test level: floor, two walls, one dummy and one signpost.
pub struct Arena {
    /// Player body
    pub probe: ArenaProbe,
    /// Hittable bodies
    pub world: ArenaWorld,
    /// Interactables
    pub interactables: InteractableSet,
    /// Practice dummy
    pub dummy: EntityId,
    /// Signpost
    pub signpost: EntityId,
}

impl Arena {
    /// Builds the default level with the player standing at the origin.
    #[must_use]
    pub fn new() -> Self {
        let probe = ArenaProbe::new(Vec2::new(0.0, 1.0), Vec2::new(1.0, 2.0), 0.0)
            .with_ceiling(12.0)
            .with_walls(Some(-10.0), Some(14.0));

        let mut world = ArenaWorld::new();
        world.add_obstacle(
            AABB::from_corners(Vec2::new(-10.0, -1.0), Vec2::new(14.0, 0.0)),
            GROUND_LAYER,
        );
        let dummy = world.add_damageable(
            AABB::from_center(Vec2::new(5.0, 1.0), Vec2::new(0.5, 1.0)),
            ENEMY_LAYER,
            Hitbox::new(EntityId::new(), &HitboxConfig::default()),
        );

        let mut interactables = InteractableSet::new();
        let signpost = interactables.insert(
            Interactable::new(
                Vec2::new(-3.5, 1.0),
                Interactable::DEFAULT_RADIUS,
                Box::new(LogInteraction::new("signpost")),
            )
            .with_layer(INTERACTABLE_LAYER),
        );

        Self {
            probe,
            world,
            interactables,
            dummy,
            signpost,
        }
    }
}

impl Default for Arena {
    fn default() -> Self {
        Self::new()
    }
}

/// What happened over a run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    /// Ticks simulated
    pub ticks: u32,
    /// Strikes that landed
    pub strikes: usize,
    /// Strikes a target refused
    pub rejected: usize,
    /// Interactable events raised
    pub events: usize,
    /// Health removed from world hitboxes
    pub damage_dealt: f32,
    /// Dummy health at the end
    pub dummy_health: f32,
    /// Player position at the end
    pub final_position: Vec2,
}

/// Plays a scenario to the end.
pub fn run(player: &mut Player, scenario: &Scenario, arena: &mut Arena) -> RunSummary {
    let mut input = PlayerInput::new();
    let mut held: HashSet<Button> = HashSet::new();
    let mut summary = RunSummary {
        ticks: scenario.ticks,
        strikes: 0,
        rejected: 0,
        events: 0,
        damage_dealt: 0.0,
        dummy_health: 0.0,
        final_position: Vec2::ZERO,
    };

    for tick in 0..scenario.ticks {
        for step in scenario.steps_at(tick) {
            if let Some(direction) = step.direction {
                input.set_direction(direction);
            }
            if let Some(swing) = step.swing {
                input.swing = swing;
            }
            held.extend(step.press.iter().copied());
            for button in &step.release {
                held.remove(button);
            }
        }
        for button in Button::ALL {
            input.update_button(button, held.contains(&button));
        }

        player.set_directional_input(input.direction);
        for action in input.actions() {
            let accepted = player.handle_action(
                action,
                scenario.dt,
                &arena.probe,
                &arena.world,
                &mut arena.interactables,
            );
            debug!(tick, ?action, accepted, "action");
        }
        input.end_frame();

        for strike in player.update(scenario.dt, &mut arena.probe, &mut arena.world) {
            if strike.accepted {
                summary.strikes += 1;
                info!(
                    tick,
                    target = %strike.target,
                    damage = strike.damage,
                    "hit {:?}",
                    strike.kind
                );
            } else {
                summary.rejected += 1;
            }
        }

        for (collider, hit) in arena.world.drain_damage() {
            summary.damage_dealt += hit.amount;
            debug!(tick, %collider, amount = hit.amount, knockback = ?hit.knockback, "damage");
        }

        let locator = HashMap::from([(player.id(), arena.probe.position())]);
        for event in arena.interactables.update_all(&locator) {
            summary.events += 1;
            info!(tick, ?event, "interactable");
        }

        if scenario.log_every > 0 && tick % scenario.log_every == 0 {
            let position = arena.probe.position();
            info!(
                tick,
                x = position.x,
                y = position.y,
                vx = player.locomotion().velocity().x,
                vy = player.locomotion().velocity().y,
                "{:?}",
                player.motion_state()
            );
        }
    }

    summary.dummy_health = arena
        .world
        .hitbox(arena.dummy)
        .map_or(0.0, Hitbox::health);
    summary.final_position = arena.probe.position();
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use lumen_gameplay::PlayerConfig;
    use std::io::Write;

    fn player() -> Player {
        Player::new(EntityId::new(), &PlayerConfig::default()).expect("player")
    }

    #[test]
    fn test_default_scenario_hits_dummy() {
        let mut player = player();
        let mut arena = Arena::new();

        let summary = run(&mut player, &Scenario::default(), &mut arena);

        assert!(summary.strikes >= 1);
        assert!(summary.dummy_health < 100.0);
        assert!((summary.damage_dealt - (100.0 - summary.dummy_health)).abs() < 1e-4);
        assert_eq!(summary.ticks, 300);
        assert!(arena.world.drain_damage().is_empty());
    }

    #[test]
    fn test_idle_scenario_stays_put() {
        let mut player = player();
        let mut arena = Arena::new();
        let scenario = Scenario {
            ticks: 30,
            steps: Vec::new(),
            ..Scenario::default()
        };

        let summary = run(&mut player, &scenario, &mut arena);

        assert_eq!(summary.strikes, 0);
        assert_eq!(summary.dummy_health, 100.0);
        assert_eq!(summary.damage_dealt, 0.0);
        assert!(summary.final_position.x.abs() < 1e-4);
        assert!(player.locomotion().contacts().below);
    }

    #[test]
    fn test_parse_scenario() {
        let scenario = Scenario::from_toml_str(
            r#"
            ticks = 10

            [[steps]]
            at = 2
            direction = [-1.0, 0.0]
            press = ["jump", "light_attack"]
            swing = "outward"

            [[steps]]
            at = 3
            release = ["jump"]
            "#,
        )
        .expect("scenario");

        assert_eq!(scenario.ticks, 10);
        assert_eq!(scenario.steps.len(), 2);
        assert_eq!(scenario.steps[0].direction, Some(Vec2::NEG_X));
        assert_eq!(scenario.steps[0].press, vec![Button::Jump, Button::LightAttack]);
        assert_eq!(scenario.steps[0].swing, Some(AttackDirection::Outward));
        assert_eq!(scenario.steps[1].release, vec![Button::Jump]);
        assert_eq!(scenario.steps_at(3).count(), 1);
    }

    #[test]
    fn test_bundled_data_files_parse() {
        let config = PlayerConfig::from_toml_str(include_str!("../data/player.toml"))
            .expect("player.toml");
        assert_eq!(config.seed, 7);
        assert_eq!(config.light.direction, AttackDirection::LeftToRight);

        let scenario = Scenario::from_toml_str(include_str!("../data/wall_climb.toml"))
            .expect("wall_climb.toml");
        assert_eq!(scenario.ticks, 240);
        assert_eq!(scenario.steps.len(), 5);
    }

    #[test]
    fn test_rejects_zero_dt() {
        assert!(Scenario::from_toml_str("dt = 0.0").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "ticks = 5\nlog_every = 0").expect("write");

        let scenario = Scenario::load(file.path()).expect("load");
        assert_eq!(scenario.ticks, 5);
        assert_eq!(scenario.log_every, 0);
        assert_eq!(scenario.steps, Scenario::default().steps);
    }
}
