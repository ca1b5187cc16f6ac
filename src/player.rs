//! The two selectable characters and the stamina bar of whichever one is in
//! control.
//!
//! Subjects are kinematic: the locomotion core moves their `Transform`
//! directly and avian only provides the collider that probes and the
//! selection ray see.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::animation::{AnimationParams, BodyVisual};
use crate::character_controller::components::{Locomotion, LocomotionConfig, Subject};
use crate::character_controller::stamina::Stamina;
use crate::customizer::{Accessories, AccessorySlot, AccessorySocket};
use crate::game_states::AppState;
use crate::probe::GameLayer;
use crate::selection::SubjectRoster;

pub struct PlayerPlugin;

impl Plugin for PlayerPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, (setup, setup_stamina_bar))
            .add_systems(OnEnter(AppState::InGame), show_stamina_bar)
            .add_systems(Update, update_stamina_bar.run_if(in_state(AppState::InGame)));
    }
}

struct SubjectLook {
    name: &'static str,
    position: Vec3,
    color: Color,
}

const SUBJECTS: [SubjectLook; 2] = [
    SubjectLook {
        name: "male",
        position: Vec3::new(-1.5, 0.0, 0.0),
        color: Color::srgb(0.3, 0.45, 0.8),
    },
    SubjectLook {
        name: "female",
        position: Vec3::new(1.5, 0.0, 0.0),
        color: Color::srgb(0.85, 0.4, 0.6),
    },
];

const BODY_RADIUS: f32 = 0.35;
const BODY_LENGTH: f32 = 1.1;

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    mut roster: ResMut<SubjectRoster>,
) {
    let body = meshes.add(Capsule3d::new(BODY_RADIUS, BODY_LENGTH));
    let nose = meshes.add(Cuboid::new(0.12, 0.12, 0.2));
    let nose_material = materials.add(Color::srgb(0.95, 0.8, 0.6));
    let body_center = BODY_LENGTH * 0.5 + BODY_RADIUS;

    for look in SUBJECTS {
        let subject = commands
            .spawn((
                Name::new(look.name),
                Subject::default(),
                Locomotion::default(),
                LocomotionConfig {
                    body_radius: BODY_RADIUS,
                    ..default()
                },
                Stamina::default(),
                AnimationParams::default(),
                Accessories::default(),
                // Facing the camera on the selection screen.
                Transform::from_translation(look.position)
                    .with_rotation(Quat::from_rotation_y(std::f32::consts::PI)),
                Visibility::default(),
                RigidBody::Kinematic,
                Collider::compound(vec![(
                    Vec3::Y * body_center,
                    Quat::IDENTITY,
                    Collider::capsule(BODY_RADIUS, BODY_LENGTH),
                )]),
                CollisionLayers::new(GameLayer::Subject, LayerMask::ALL),
            ))
            .with_children(|parent| {
                parent
                    .spawn((
                        BodyVisual,
                        Mesh3d(body.clone()),
                        MeshMaterial3d(materials.add(look.color)),
                        Transform::from_xyz(0.0, body_center, 0.0),
                    ))
                    .with_child((
                        Mesh3d(nose.clone()),
                        MeshMaterial3d(nose_material.clone()),
                        Transform::from_xyz(0.0, 0.55, BODY_RADIUS),
                    ));
                for slot in [AccessorySlot::Hat, AccessorySlot::Glasses] {
                    parent.spawn((
                        Name::new(format!("{slot:?} socket")),
                        AccessorySocket(slot),
                        Transform::from_translation(slot.anchor()),
                        Visibility::default(),
                    ));
                }
            })
            .id();

        roster.register(subject);
    }
}

#[derive(Component)]
struct StaminaBar;

#[derive(Component)]
struct StaminaFill;

fn setup_stamina_bar(mut commands: Commands) {
    commands
        .spawn((
            Name::new("Stamina bar"),
            StaminaBar,
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(24.),
                right: Val::Px(24.),
                width: Val::Px(220.),
                height: Val::Px(14.),
                border: UiRect::all(Val::Px(2.)),
                ..default()
            },
            BorderColor(Color::srgb(0.9, 0.9, 0.9)),
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.5)),
            Visibility::Hidden,
        ))
        .with_child((
            StaminaFill,
            Node {
                width: Val::Percent(100.),
                height: Val::Percent(100.),
                ..default()
            },
            BackgroundColor(Color::srgb(0.35, 0.8, 0.35)),
        ));
}

fn show_stamina_bar(mut bars: Query<&mut Visibility, With<StaminaBar>>) {
    for mut visibility in &mut bars {
        *visibility = Visibility::Inherited;
    }
}

fn update_stamina_bar(
    roster: Res<SubjectRoster>,
    subjects: Query<&Stamina>,
    mut fills: Query<(&mut Node, &mut BackgroundColor), With<StaminaFill>>,
) {
    let Some(stamina) = roster.active().and_then(|active| subjects.get(active).ok()) else {
        return;
    };
    let fraction = stamina.fraction();

    for (mut node, mut color) in &mut fills {
        node.width = Val::Percent(fraction * 100.0);
        *color = if stamina.can_act() {
            Color::srgb(0.35, 0.8, 0.35).into()
        } else {
            Color::srgb(0.8, 0.3, 0.25).into()
        };
    }
}
