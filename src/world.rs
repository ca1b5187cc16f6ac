use avian3d::prelude::*;
use bevy::pbr::CascadeShadowConfigBuilder;
use bevy::prelude::*;

use crate::environment::{DayNightCycle, NightFixture, NightGlow};
use crate::probe::GameLayer;
use crate::proximity::{PromptHologram, ProximityPrompt};

pub(crate) struct WorldPlugin;

impl Plugin for WorldPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup);
    }
}

const LAMP_POSITIONS: [Vec3; 4] = [
    Vec3::new(-6.0, 0.0, 4.0),
    Vec3::new(6.0, 0.0, 4.0),
    Vec3::new(-6.0, 0.0, -6.0),
    Vec3::new(6.0, 0.0, -6.0),
];

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    // Ground
    commands.spawn((
        Name::new("Ground"),
        Mesh3d(meshes.add(Cuboid::new(80.0, 0.2, 80.0))),
        MeshMaterial3d(materials.add(Color::srgb(0.3, 0.45, 0.3))),
        Transform::from_xyz(0.0, -0.1, 0.0),
        RigidBody::Static,
        Collider::cuboid(80.0, 0.2, 80.0),
        CollisionLayers::new(GameLayer::Ground, LayerMask::ALL),
    ));

    // A practice wall in front of the spawn
    commands.spawn((
        Name::new("Practice wall"),
        Mesh3d(meshes.add(Cuboid::new(4.0, 3.0, 0.5))),
        MeshMaterial3d(materials.add(Color::srgb(0.35, 0.55, 0.3))),
        Transform::from_xyz(0.0, 1.5, 6.0),
        RigidBody::Static,
        Collider::cuboid(4.0, 3.0, 0.5),
        CollisionLayers::new(GameLayer::Climbable, LayerMask::ALL),
    ));

    // Sun
    let cycle = DayNightCycle::default();
    commands.spawn((
        Name::new("Sun"),
        Transform::from_rotation(cycle.sun_rotation()),
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        CascadeShadowConfigBuilder {
            first_cascade_far_bound: 200.0,
            maximum_distance: 400.0,
            ..default()
        }
        .build(),
        cycle,
    ));

    // Street lamps
    let pole = meshes.add(Cylinder::new(0.08, 3.0));
    let pole_material = materials.add(Color::srgb(0.2, 0.2, 0.22));
    let bulb = meshes.add(Sphere::new(0.18));
    let bulb_material = materials.add(StandardMaterial {
        base_color: Color::srgb(1.0, 0.9, 0.6),
        emissive: LinearRgba::rgb(4.0, 3.2, 1.6),
        ..default()
    });
    for (i, position) in LAMP_POSITIONS.into_iter().enumerate() {
        commands
            .spawn((
                Name::new(format!("Street lamp {i}")),
                Mesh3d(pole.clone()),
                MeshMaterial3d(pole_material.clone()),
                Transform::from_translation(position + Vec3::Y * 1.5),
                RigidBody::Static,
                Collider::cylinder(0.08, 3.0),
            ))
            .with_children(|parent| {
                parent.spawn((
                    NightGlow {
                        emissive: LinearRgba::rgb(4.0, 3.2, 1.6),
                    },
                    Mesh3d(bulb.clone()),
                    MeshMaterial3d(bulb_material.clone()),
                    Transform::from_xyz(0.0, 1.6, 0.0),
                ));
                parent.spawn((
                    Name::new("Lamp light"),
                    NightFixture,
                    PointLight {
                        color: Color::srgb(1.0, 0.85, 0.6),
                        intensity: 400_000.0,
                        range: 12.0,
                        shadows_enabled: false,
                        ..default()
                    },
                    Transform::from_xyz(0.0, 1.5, 0.0),
                ));
            });
    }

    // Book pedestal
    commands
        .spawn((
            Name::new("Book pedestal"),
            Mesh3d(meshes.add(Cuboid::new(0.6, 1.0, 0.6))),
            MeshMaterial3d(materials.add(Color::srgb(0.45, 0.3, 0.2))),
            Transform::from_xyz(4.0, 0.5, 2.0),
            RigidBody::Static,
            Collider::cuboid(0.6, 1.0, 0.6),
            ProximityPrompt::default(),
        ))
        .with_children(|parent| {
            parent.spawn((
                Name::new("Book"),
                Mesh3d(meshes.add(Cuboid::new(0.5, 0.08, 0.35))),
                MeshMaterial3d(materials.add(Color::srgb(0.55, 0.1, 0.1))),
                Transform::from_xyz(0.0, 0.54, 0.0),
            ));
            parent.spawn((
                Name::new("Hologram"),
                PromptHologram,
                Mesh3d(meshes.add(Cuboid::new(0.8, 0.5, 0.02))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgba(0.3, 0.8, 1.0, 0.5),
                    emissive: LinearRgba::rgb(0.3, 1.2, 2.0),
                    alpha_mode: AlphaMode::Blend,
                    ..default()
                })),
                Transform::from_xyz(0.0, 1.2, 0.0).with_scale(Vec3::splat(f32::EPSILON)),
                Visibility::Hidden,
            ));
        });
}
