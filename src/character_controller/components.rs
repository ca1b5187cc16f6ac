use bevy::prelude::*;

use crate::sequence::Tween;

/// A controllable character. Exactly one subject holds active control once
/// the player has picked a character.
#[derive(Component, Reflect, Debug, Default, Clone)]
#[reflect(Component)]
pub struct Subject {
    pub active_control: bool,
}

/// Tuning for locomotion and climbing.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct LocomotionConfig {
    pub walk_speed: f32,
    pub run_speed: f32,
    pub gravity: f32,
    pub jump_height: f32,
    /// Vertical velocity held while standing, so ground contact is kept.
    pub grounded_stick_velocity: f32,
    /// Heading slerp factor per second.
    pub rotation_rate: f32,
    /// Minimum move vector length that counts as movement.
    pub move_threshold: f32,
    /// Vertical velocity below which a fall starts being measured.
    pub fall_mark_velocity: f32,
    /// Drop from the fall mark after which the subject is falling.
    pub fall_threshold: f32,
    pub climb_speed: f32,
    pub climb_probe_height: f32,
    pub climb_probe_distance: f32,
    pub ledge_probe_height: f32,
    pub ledge_probe_distance: f32,
    pub ledge_mount_duration: f32,
    pub ledge_mount_speed_factor: f32,
    pub ledge_forward_nudge: f32,
    pub body_radius: f32,
    /// Height above the feet the ground probe starts from.
    pub ground_probe_height: f32,
    /// How far below the feet ground is still considered under them.
    pub ground_snap_distance: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            walk_speed: 5.0,
            run_speed: 8.0,
            gravity: -9.81,
            jump_height: 2.0,
            grounded_stick_velocity: -2.0,
            rotation_rate: 10.0,
            move_threshold: 0.1,
            fall_mark_velocity: -1.0,
            fall_threshold: 2.0,
            climb_speed: 2.0,
            climb_probe_height: 1.0,
            climb_probe_distance: 0.8,
            ledge_probe_height: 1.5,
            ledge_probe_distance: 1.0,
            ledge_mount_duration: 0.5,
            ledge_mount_speed_factor: 1.5,
            ledge_forward_nudge: 0.6,
            body_radius: 0.35,
            ground_probe_height: 0.5,
            ground_snap_distance: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Reflect, Default)]
pub enum LocomotionState {
    #[default]
    Grounded,
    Airborne,
    Climbing,
    /// Timed pull-up onto the top of a climbable surface.
    LedgeMount(Tween),
}

#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct Locomotion {
    pub state: LocomotionState,
    pub vertical_velocity: f32,
    pub grounded: bool,
    pub falling: bool,
    /// Height at which the current fall started being measured.
    pub fall_mark: Option<f32>,
    /// Cleared for every subject except the selected one.
    pub allow_movement: bool,
}

impl Default for Locomotion {
    fn default() -> Self {
        Self {
            state: LocomotionState::Grounded,
            vertical_velocity: 0.0,
            grounded: true,
            falling: false,
            fall_mark: None,
            allow_movement: false,
        }
    }
}

impl Locomotion {
    pub fn is_climbing(&self) -> bool {
        matches!(
            self.state,
            LocomotionState::Climbing | LocomotionState::LedgeMount(_)
        )
    }
}

/// Global locks that freeze the controlled subject while a menu owns input.
#[derive(Resource, Debug, Default, Clone, Copy)]
pub struct ControlLock {
    pub emote_menu: bool,
    pub menu_view: bool,
}

impl ControlLock {
    pub fn movement_locked(&self) -> bool {
        self.emote_menu || self.menu_view
    }

    pub fn camera_locked(&self) -> bool {
        self.emote_menu
    }
}
