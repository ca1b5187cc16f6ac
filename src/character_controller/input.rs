use bevy::input::ButtonInput;
use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

/// Below this deflection a gamepad stick is ignored.
const STICK_DEAD_ZONE: f32 = 0.1;
/// Right-stick deflection expressed in mouse pixels per second.
const GAMEPAD_LOOK_SCALE: f32 = 600.0;

/// The part of the player's intent the movement core consumes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MoveIntent {
    /// Camera-relative movement, x = right, y = forward, length <= 1.
    pub axis: Vec2,
    pub run: bool,
    /// True only on the frame the jump button went down.
    pub jump: bool,
    pub climb: bool,
}

impl MoveIntent {
    pub fn forward_held(&self) -> bool {
        self.axis.y > 0.1
    }
}

/// Everything the player asked for this frame, in named actions.
#[derive(Resource, Debug, Clone, Default, PartialEq)]
pub struct PlayerIntent {
    pub movement: MoveIntent,
    /// x = right, y = up, in mouse pixels.
    pub look: Vec2,
    pub emote_menu: bool,
    pub scroll: f32,
    /// Cursor position on the frame the primary button was clicked.
    pub click: Option<Vec2>,
    pub switch_subject: bool,
    /// Switch key that only counts inside the book menu.
    pub menu_switch: bool,
    pub interact: bool,
    pub back: bool,
    pub cycle_hat: bool,
    pub cycle_glasses: bool,
    pub cycle_pet: bool,
    pub remove_pet: bool,
}

/// Maps keyboard and mouse state to named actions.
pub fn intent_from_devices(
    keys: &ButtonInput<KeyCode>,
    mouse: &ButtonInput<MouseButton>,
    mouse_delta: Vec2,
    scroll: f32,
    cursor: Option<Vec2>,
) -> PlayerIntent {
    let up = keys.any_pressed([KeyCode::KeyW, KeyCode::ArrowUp]);
    let down = keys.any_pressed([KeyCode::KeyS, KeyCode::ArrowDown]);
    let left = keys.any_pressed([KeyCode::KeyA, KeyCode::ArrowLeft]);
    let right = keys.any_pressed([KeyCode::KeyD, KeyCode::ArrowRight]);

    let horizontal = right as i8 - left as i8;
    let vertical = up as i8 - down as i8;
    let axis = Vec2::new(horizontal as f32, vertical as f32).clamp_length_max(1.0);

    PlayerIntent {
        movement: MoveIntent {
            axis,
            run: keys.any_pressed([KeyCode::ShiftLeft, KeyCode::ShiftRight]),
            jump: keys.just_pressed(KeyCode::Space),
            climb: keys.any_pressed([KeyCode::ControlLeft, KeyCode::ControlRight]),
        },
        // Screen y grows downwards.
        look: Vec2::new(mouse_delta.x, -mouse_delta.y),
        emote_menu: keys.pressed(KeyCode::KeyB),
        scroll,
        click: mouse
            .just_pressed(MouseButton::Left)
            .then_some(cursor)
            .flatten(),
        switch_subject: keys.just_pressed(KeyCode::Tab),
        menu_switch: keys.just_pressed(KeyCode::KeyC),
        interact: keys.just_pressed(KeyCode::KeyE),
        back: keys.just_pressed(KeyCode::Escape),
        cycle_hat: keys.just_pressed(KeyCode::KeyH),
        cycle_glasses: keys.just_pressed(KeyCode::KeyG),
        cycle_pet: keys.just_pressed(KeyCode::KeyP),
        remove_pet: keys.just_pressed(KeyCode::KeyX),
    }
}

/// Folds a gamepad into an intent built from keyboard and mouse.
pub fn merge_gamepad(intent: &mut PlayerIntent, gamepad: &Gamepad, dt: f32) {
    if let (Some(x), Some(y)) = (
        gamepad.get(GamepadAxis::LeftStickX),
        gamepad.get(GamepadAxis::LeftStickY),
    ) {
        let stick = Vec2::new(x, y).clamp_length_max(1.0);
        if stick.length() > STICK_DEAD_ZONE {
            intent.movement.axis = stick;
        }
    }

    if let (Some(x), Some(y)) = (
        gamepad.get(GamepadAxis::RightStickX),
        gamepad.get(GamepadAxis::RightStickY),
    ) {
        let stick = Vec2::new(x, y);
        if stick.length() > STICK_DEAD_ZONE {
            intent.look += stick * GAMEPAD_LOOK_SCALE * dt;
        }
    }

    intent.movement.run |= gamepad.pressed(GamepadButton::RightTrigger2);
    intent.movement.climb |= gamepad.pressed(GamepadButton::LeftTrigger2);
    intent.movement.jump |= gamepad.just_pressed(GamepadButton::South);
    intent.emote_menu |= gamepad.pressed(GamepadButton::North);
    intent.interact |= gamepad.just_pressed(GamepadButton::West);
    intent.back |= gamepad.just_pressed(GamepadButton::East);
    intent.switch_subject |= gamepad.just_pressed(GamepadButton::Select);
}

pub fn gather_intent(
    time: Res<Time>,
    keys: Res<ButtonInput<KeyCode>>,
    mouse: Res<ButtonInput<MouseButton>>,
    motion: Res<AccumulatedMouseMotion>,
    scroll: Res<AccumulatedMouseScroll>,
    windows: Query<&Window, With<PrimaryWindow>>,
    gamepads: Query<&Gamepad>,
    mut intent: ResMut<PlayerIntent>,
) {
    let cursor = windows.single().ok().and_then(|window| window.cursor_position());

    let mut next = intent_from_devices(&keys, &mouse, motion.delta, scroll.delta.y, cursor);
    for gamepad in &gamepads {
        merge_gamepad(&mut next, gamepad, time.delta_secs());
    }

    *intent = next;
}
