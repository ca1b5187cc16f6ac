//! Animation parameters pushed by the movement core.
//!
//! The core writes named parameters and fires triggers; it never reads them
//! back except to avoid re-triggering an emote that is still playing. Without
//! authored clips, [`pose_from_params`] turns the parameters into a simple
//! procedural pose on the subject's body so the state machine stays visible.

use bevy::prelude::*;

use crate::character_controller::ControlSet;
use crate::character_controller::components::Subject;
use crate::game_states::AppState;
use crate::sequence::Tween;

pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<AnimationParams>()
            .add_event::<AnimationTriggered>()
            .add_systems(
                Update,
                (play_triggers, advance_emotes, pose_from_params)
                    .chain()
                    .in_set(ControlSet::Follow)
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

#[derive(Component, Reflect, Debug, Clone, PartialEq)]
#[reflect(Component)]
pub struct AnimationParams {
    pub speed: f32,
    pub is_grounded: bool,
    pub is_running: bool,
    pub is_falling: bool,
    pub is_climbing: bool,
    pub is_emoting: bool,
    pub playback_rate: f32,
}

impl Default for AnimationParams {
    fn default() -> Self {
        Self {
            speed: 0.0,
            is_grounded: true,
            is_running: false,
            is_falling: false,
            is_climbing: false,
            is_emoting: false,
            playback_rate: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationTrigger {
    Jump1,
    Jump2,
    Emote(usize),
}

#[derive(Event, Debug, Clone, Copy)]
pub struct AnimationTriggered {
    pub subject: Entity,
    pub trigger: AnimationTrigger,
}

/// Marks the mesh child that carries a subject's visible body.
#[derive(Component)]
pub struct BodyVisual;

/// A running emote on one subject. Replacing it cancels the previous one.
#[derive(Component, Debug, Clone, Copy)]
pub struct EmotePlayback {
    pub index: usize,
    pub tween: Tween,
}

const EMOTE_DURATION: f32 = 2.0;
const JUMP_SPIN_DURATION: f32 = 0.4;

/// A short procedural flourish started by a jump trigger.
#[derive(Component, Debug, Clone, Copy)]
pub struct JumpFlourish {
    pub variant: AnimationTrigger,
    pub tween: Tween,
}

fn play_triggers(
    mut commands: Commands,
    mut triggers: EventReader<AnimationTriggered>,
    mut subjects: Query<(&mut AnimationParams, Option<&EmotePlayback>), With<Subject>>,
) {
    for event in triggers.read() {
        let Ok((mut params, playing)) = subjects.get_mut(event.subject) else {
            continue;
        };

        match event.trigger {
            AnimationTrigger::Emote(index) => {
                if playing.is_some_and(|p| p.index == index && !p.tween.finished()) {
                    continue;
                }
                params.is_emoting = true;
                commands.entity(event.subject).insert(EmotePlayback {
                    index,
                    tween: Tween::new(EMOTE_DURATION),
                });
            }
            variant @ (AnimationTrigger::Jump1 | AnimationTrigger::Jump2) => {
                commands.entity(event.subject).insert(JumpFlourish {
                    variant,
                    tween: Tween::new(JUMP_SPIN_DURATION),
                });
            }
        }
    }
}

fn advance_emotes(
    time: Res<Time>,
    mut commands: Commands,
    mut subjects: Query<(Entity, &mut AnimationParams, &mut EmotePlayback)>,
) {
    for (entity, mut params, mut playback) in &mut subjects {
        playback.tween.advance(time.delta_secs());
        // Moving cancels an emote, the same way a new emote does.
        if playback.tween.finished() || params.speed > 0.0 || !params.is_grounded {
            params.is_emoting = false;
            commands.entity(entity).remove::<EmotePlayback>();
        }
    }
}

/// Procedural pose for a subject's body from its current parameters.
pub fn body_pose(params: &AnimationParams, emote: Option<&EmotePlayback>, jump: Option<&JumpFlourish>) -> Transform {
    let mut pose = Transform::from_xyz(0.0, 0.9, 0.0);

    // Lean into the run.
    pose.rotate_x(params.speed * 0.25);

    if params.is_climbing {
        pose.rotate_x(-0.3);
    }

    if params.is_falling {
        pose.scale = Vec3::new(1.1, 0.9, 1.1);
    }

    if let Some(jump) = jump {
        let turn = std::f32::consts::TAU * jump.tween.progress();
        match jump.variant {
            AnimationTrigger::Jump1 => pose.rotate_y(turn),
            _ => pose.rotate_z(turn),
        }
    }

    if let Some(emote) = emote {
        let bounce = (emote.tween.progress() * std::f32::consts::PI * 4.0).sin().abs();
        pose.translation.y += bounce * 0.2 * (emote.index as f32 + 1.0).min(3.0) / 3.0;
    }

    pose
}

fn pose_from_params(
    time: Res<Time>,
    mut commands: Commands,
    mut subjects: Query<(
        Entity,
        &AnimationParams,
        &Children,
        Option<&EmotePlayback>,
        Option<&mut JumpFlourish>,
    )>,
    mut bodies: Query<&mut Transform, With<BodyVisual>>,
) {
    for (entity, params, children, emote, jump) in &mut subjects {
        let jump = jump.and_then(|mut jump| {
            jump.tween.advance(time.delta_secs() * params.playback_rate.max(0.0));
            if jump.tween.finished() {
                commands.entity(entity).remove::<JumpFlourish>();
                None
            } else {
                Some(*jump)
            }
        });

        let pose = body_pose(params, emote, jump.as_ref());
        for child in children.iter() {
            if let Ok(mut body) = bodies.get_mut(child) {
                *body = pose;
            }
        }
    }
}
