//! Per-frame input snapshot and the actions derived from it.
//!
//! Device polling happens elsewhere; this module only sees already
//! normalized axes and button levels.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::melee::AttackDirection;

/// Discrete request sent to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerAction {
    /// Jump button pressed
    JumpDown,
    /// Jump button released
    JumpUp,
    /// Dash button pressed
    Dash,
    /// Glide button held this frame
    Glide,
    /// Interact button pressed
    Interact,
    /// Light attack with a swing profile
    LightAttack(AttackDirection),
    /// Heavy attack
    HeavyAttack,
}

/// State of a button (pressed, just pressed, released).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ButtonState {
    /// Whether the button is currently held down
    pub pressed: bool,
    /// Whether the button was just pressed this frame
    pub just_pressed: bool,
    /// Whether the button was just released this frame
    pub just_released: bool,
}

impl ButtonState {
    /// Update the button state based on whether it's currently pressed.
    pub fn update(&mut self, is_pressed: bool) {
        self.just_pressed = is_pressed && !self.pressed;
        self.just_released = !is_pressed && self.pressed;
        self.pressed = is_pressed;
    }

    /// Clear the frame-specific state.
    pub fn clear_frame(&mut self) {
        self.just_pressed = false;
        self.just_released = false;
    }
}

/// Buttons the player reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    /// Jump
    Jump,
    /// Dash
    Dash,
    /// Glide (held)
    Glide,
    /// Interact
    Interact,
    /// Light attack
    LightAttack,
    /// Heavy attack
    HeavyAttack,
}

impl Button {
    /// Every button, in dispatch order.
    pub const ALL: [Button; 6] = [
        Button::Jump,
        Button::Dash,
        Button::Glide,
        Button::Interact,
        Button::LightAttack,
        Button::HeavyAttack,
    ];
}

/// Input for one frame.
#[derive(Debug, Clone, Default)]
pub struct PlayerInput {
    /// Movement axes, each in [-1, 1]
    pub direction: Vec2,
    /// Swing profile used for light attacks
    pub swing: AttackDirection,
    jump: ButtonState,
    dash: ButtonState,
    glide: ButtonState,
    interact: ButtonState,
    light_attack: ButtonState,
    heavy_attack: ButtonState,
}

impl PlayerInput {
    /// Creates an idle input state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the movement axes, clamped to [-1, 1].
    pub fn set_direction(&mut self, direction: Vec2) {
        self.direction = direction.clamp(Vec2::NEG_ONE, Vec2::ONE);
    }

    /// Feeds the current level of a button.
    pub fn update_button(&mut self, button: Button, is_pressed: bool) {
        self.button_mut(button).update(is_pressed);
    }

    /// State of a button.
    #[must_use]
    pub fn button(&self, button: Button) -> ButtonState {
        match button {
            Button::Jump => self.jump,
            Button::Dash => self.dash,
            Button::Glide => self.glide,
            Button::Interact => self.interact,
            Button::LightAttack => self.light_attack,
            Button::HeavyAttack => self.heavy_attack,
        }
    }

    fn button_mut(&mut self, button: Button) -> &mut ButtonState {
        match button {
            Button::Jump => &mut self.jump,
            Button::Dash => &mut self.dash,
            Button::Glide => &mut self.glide,
            Button::Interact => &mut self.interact,
            Button::LightAttack => &mut self.light_attack,
            Button::HeavyAttack => &mut self.heavy_attack,
        }
    }

    /// Actions triggered this frame, in dispatch order.
    #[must_use]
    pub fn actions(&self) -> Vec<PlayerAction> {
        let mut actions = Vec::new();

        if self.jump.just_pressed {
            actions.push(PlayerAction::JumpDown);
        }
        if self.jump.just_released {
            actions.push(PlayerAction::JumpUp);
        }
        if self.dash.just_pressed {
            actions.push(PlayerAction::Dash);
        }
        if self.glide.pressed {
            actions.push(PlayerAction::Glide);
        }
        if self.interact.just_pressed {
            actions.push(PlayerAction::Interact);
        }
        if self.light_attack.just_pressed {
            actions.push(PlayerAction::LightAttack(self.swing));
        }
        if self.heavy_attack.just_pressed {
            actions.push(PlayerAction::HeavyAttack);
        }

        actions
    }

    /// Clears edge flags at the end of a frame.
    pub fn end_frame(&mut self) {
        for button in [
            &mut self.jump,
            &mut self.dash,
            &mut self.glide,
            &mut self.interact,
            &mut self.light_attack,
            &mut self.heavy_attack,
        ] {
            button.clear_frame();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_edges() {
        let mut state = ButtonState::default();

        state.update(true);
        assert!(state.pressed && state.just_pressed);

        state.update(true);
        assert!(state.pressed && !state.just_pressed);

        state.update(false);
        assert!(!state.pressed && state.just_released);
    }

    #[test]
    fn test_jump_press_and_release() {
        let mut input = PlayerInput::new();

        input.update_button(Button::Jump, true);
        assert_eq!(input.actions(), vec![PlayerAction::JumpDown]);
        input.end_frame();
        assert!(input.actions().is_empty());

        input.update_button(Button::Jump, false);
        assert_eq!(input.actions(), vec![PlayerAction::JumpUp]);
    }

    #[test]
    fn test_glide_repeats_while_held() {
        let mut input = PlayerInput::new();
        input.update_button(Button::Glide, true);
        input.end_frame();
        input.update_button(Button::Glide, true);

        assert_eq!(input.actions(), vec![PlayerAction::Glide]);
    }

    #[test]
    fn test_light_attack_carries_swing() {
        let mut input = PlayerInput::new();
        input.swing = AttackDirection::RightToLeft;
        input.update_button(Button::LightAttack, true);
        input.update_button(Button::HeavyAttack, true);

        assert_eq!(
            input.actions(),
            vec![
                PlayerAction::LightAttack(AttackDirection::RightToLeft),
                PlayerAction::HeavyAttack,
            ]
        );
    }

    #[test]
    fn test_direction_clamped() {
        let mut input = PlayerInput::new();
        input.set_direction(Vec2::new(3.0, -0.5));
        assert_eq!(input.direction, Vec2::new(1.0, -0.5));
    }
}
