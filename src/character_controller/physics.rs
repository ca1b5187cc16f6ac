use avian3d::prelude::SpatialQuery;
use bevy::prelude::*;

use super::components::{ControlLock, Locomotion, LocomotionConfig, Subject};
use super::input::PlayerIntent;
use super::stamina::Stamina;
use super::states::{MoveBasis, StepInput};
use crate::animation::{AnimationParams, AnimationTriggered};
use crate::camera::CameraRig;
use crate::probe::AvianProbe;

/// Runs one locomotion tick for every subject.
///
/// All subjects are stepped so that unselected ones keep settling under
/// gravity; their movement lock zeroes the player's intent.
pub fn drive_subjects(
    time: Res<Time>,
    intent: Res<PlayerIntent>,
    lock: Res<ControlLock>,
    spatial_query: SpatialQuery,
    camera_query: Query<&Transform, (With<CameraRig>, Without<Subject>)>,
    mut subjects: Query<
        (
            Entity,
            &LocomotionConfig,
            &mut Locomotion,
            &mut Stamina,
            &mut Transform,
            &mut AnimationParams,
        ),
        With<Subject>,
    >,
    mut triggers: EventWriter<AnimationTriggered>,
) {
    let dt = time.delta_secs();
    if dt <= 0.0 {
        return;
    }

    let basis = camera_query
        .single()
        .map(MoveBasis::from_camera)
        .unwrap_or_default();
    let mut rng = rand::thread_rng();

    for (entity, config, mut locomotion, mut stamina, mut transform, mut params) in &mut subjects {
        let probe = AvianProbe {
            query: &spatial_query,
            exclude: entity,
        };
        let input = StepInput {
            intent: intent.movement,
            basis,
            locked: lock.movement_locked(),
            dt,
        };

        let previous_y = transform.translation.y;
        let out = locomotion.step(config, &mut stamina, &mut transform, &input, &probe, &mut rng);
        locomotion.resolve_ground(config, &mut transform, previous_y, &probe);

        let is_emoting = params.is_emoting;
        *params = AnimationParams {
            is_emoting,
            is_grounded: locomotion.grounded,
            ..out.animation
        };

        if let Some(trigger) = out.trigger {
            triggers.write(AnimationTriggered {
                subject: entity,
                trigger,
            });
        }
    }
}

/// Draws the climb and ledge probes of the controlled subject.
pub fn debug_visualize_probes(
    mut gizmos: Gizmos,
    query: Query<(&Transform, &LocomotionConfig, &Locomotion, &Subject)>,
) {
    for (transform, config, locomotion, subject) in &query {
        if !subject.active_control {
            continue;
        }

        let chest = transform.translation + Vec3::Y * config.climb_probe_height;
        let facing = Locomotion::heading(transform);
        let color = if locomotion.is_climbing() {
            Color::srgb(0.0, 1.0, 0.0)
        } else {
            Color::srgb(1.0, 1.0, 0.0)
        };
        gizmos.line(chest, chest + *facing * config.climb_probe_distance, color);

        let head = transform.translation + Vec3::Y * config.ledge_probe_height;
        gizmos.line(
            head,
            head + Vec3::Y * config.ledge_probe_distance,
            Color::srgb(0.0, 0.0, 1.0),
        );
    }
}
