use bevy::prelude::*;

use crate::character_controller::ControlSet;
use crate::proximity::MenuAction;
use crate::selection::{SelectionChanged, SubjectRoster};

pub struct PetPlugin;

impl Plugin for PetPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<FloatingPet>()
            .init_resource::<ActivePet>()
            .add_systems(Startup, setup_catalog)
            .add_systems(
                Update,
                (apply_menu_actions, retarget_pets, float_after_target)
                    .chain()
                    .in_set(ControlSet::Follow),
            );
    }
}

#[derive(Clone)]
pub struct PetLook {
    pub name: &'static str,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

#[derive(Resource, Default)]
pub struct PetCatalog {
    pub looks: Vec<PetLook>,
}

/// At most one pet exists at a time.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ActivePet {
    pub entity: Option<Entity>,
    pub index: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetChange {
    /// Despawn `previous` (if any) and spawn pet `index`.
    Spawn { index: usize, previous: Option<Entity> },
    Remove(Entity),
    /// Nothing to do.
    Keep,
}

impl ActivePet {
    /// Decides what activating pet `index` does. Any index outside the
    /// catalog removes the current pet.
    pub fn activate(&self, index: usize, available: usize, has_subject: bool) -> PetChange {
        if !has_subject {
            return PetChange::Keep;
        }
        if index < available {
            return PetChange::Spawn {
                index,
                previous: self.entity,
            };
        }
        self.remove()
    }

    pub fn remove(&self) -> PetChange {
        self.entity.map_or(PetChange::Keep, PetChange::Remove)
    }

    /// Index `P` should activate next; wraps through "no pet".
    pub fn next_index(&self) -> usize {
        self.index.map_or(0, |index| index + 1)
    }
}

/// Bobbing companion that trails the controlled subject.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct FloatingPet {
    /// World-space offset from the target, not rotated with it.
    pub offset: Vec3,
    pub follow_speed: f32,
    pub float_amplitude: f32,
    pub float_frequency: f32,
    pub target: Option<Entity>,
}

impl Default for FloatingPet {
    fn default() -> Self {
        Self {
            offset: Vec3::new(0.0, 1.5, -2.0),
            follow_speed: 3.0,
            float_amplitude: 0.2,
            float_frequency: 2.0,
            target: None,
        }
    }
}

impl FloatingPet {
    pub fn goal(&self, target: Vec3, elapsed: f32) -> Vec3 {
        let bob = (elapsed * self.float_frequency).sin() * self.float_amplitude;
        target + self.offset + Vec3::Y * bob
    }

    pub fn follow(&self, pet: &mut Transform, target: Vec3, elapsed: f32, dt: f32) {
        let goal = self.goal(target, elapsed);
        pet.translation = pet.translation.lerp(goal, (self.follow_speed * dt).min(1.0));
        if pet.translation.distance_squared(target) > f32::EPSILON {
            pet.look_at(target, Vec3::Y);
        }
    }
}

fn setup_catalog(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut look = |name, mesh: Mesh, color: Color| PetLook {
        name,
        mesh: meshes.add(mesh),
        material: materials.add(StandardMaterial {
            base_color: color,
            emissive: color.to_linear() * 2.0,
            ..default()
        }),
    };

    let looks = vec![
        look("Wisp", Sphere::new(0.25).into(), Color::srgb(0.4, 0.8, 1.0)),
        look("Cube", Cuboid::from_length(0.35).into(), Color::srgb(1.0, 0.6, 0.2)),
        look("Star", Torus::new(0.1, 0.25).into(), Color::srgb(1.0, 0.9, 0.3)),
    ];

    commands.insert_resource(PetCatalog { looks });
}

fn apply_menu_actions(
    mut commands: Commands,
    mut actions: EventReader<MenuAction>,
    roster: Res<SubjectRoster>,
    catalog: Res<PetCatalog>,
    mut active: ResMut<ActivePet>,
    subjects: Query<&Transform>,
) {
    for action in actions.read() {
        let change = match action {
            MenuAction::CyclePet => {
                active.activate(active.next_index(), catalog.looks.len(), roster.active().is_some())
            }
            MenuAction::RemovePet => active.remove(),
            _ => continue,
        };

        match change {
            PetChange::Spawn { index, previous } => {
                if let Some(previous) = previous {
                    commands.entity(previous).despawn();
                }
                let target = roster.active();
                let start = target
                    .and_then(|t| subjects.get(t).ok())
                    .map_or(Vec3::ZERO, |t| t.translation);
                let pet = FloatingPet {
                    target,
                    ..default()
                };
                let look = &catalog.looks[index];
                let entity = commands
                    .spawn((
                        Name::new(look.name),
                        Mesh3d(look.mesh.clone()),
                        MeshMaterial3d(look.material.clone()),
                        Transform::from_translation(start + pet.offset),
                        pet,
                    ))
                    .id();
                *active = ActivePet {
                    entity: Some(entity),
                    index: Some(index),
                };
                info!("PET: activated {}", look.name);
            }
            PetChange::Remove(entity) => {
                commands.entity(entity).despawn();
                *active = ActivePet::default();
                info!("PET: removed");
            }
            PetChange::Keep => {
                if roster.active().is_none() {
                    warn!("PET: no active subject to follow");
                }
            }
        }
    }
}

fn retarget_pets(mut changes: EventReader<SelectionChanged>, mut pets: Query<&mut FloatingPet>) {
    for change in changes.read() {
        for mut pet in &mut pets {
            pet.target = Some(change.current);
        }
        info!("PET: following {:?}", change.current);
    }
}

fn float_after_target(
    time: Res<Time>,
    mut pets: Query<(&FloatingPet, &mut Transform)>,
    targets: Query<&Transform, Without<FloatingPet>>,
) {
    for (pet, mut transform) in &mut pets {
        let Some(target) = pet.target.and_then(|t| targets.get(t).ok()) else {
            continue;
        };
        pet.follow(
            &mut transform,
            target.translation,
            time.elapsed_secs(),
            time.delta_secs(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activating_replaces_the_existing_pet() {
        let old = Entity::from_raw(4);
        let active = ActivePet {
            entity: Some(old),
            index: Some(0),
        };
        assert_eq!(
            active.activate(1, 3, true),
            PetChange::Spawn {
                index: 1,
                previous: Some(old)
            }
        );
    }

    #[test]
    fn invalid_index_removes_the_pet() {
        let old = Entity::from_raw(4);
        let active = ActivePet {
            entity: Some(old),
            index: Some(2),
        };
        assert_eq!(active.activate(active.next_index(), 3, true), PetChange::Remove(old));
        assert_eq!(ActivePet::default().activate(9, 3, true), PetChange::Keep);
    }

    #[test]
    fn no_subject_means_no_change() {
        let active = ActivePet::default();
        assert_eq!(active.activate(0, 3, false), PetChange::Keep);
    }

    #[test]
    fn pet_settles_above_and_behind_with_a_bob() {
        let pet = FloatingPet::default();
        let target = Vec3::new(5.0, 0.0, 5.0);
        let mut transform = Transform::default();

        for _ in 0..600 {
            pet.follow(&mut transform, target, 0.0, 1.0 / 60.0);
        }
        assert!(transform.translation.distance(target + pet.offset) < 1e-3);

        let peak = pet.goal(target, std::f32::consts::FRAC_PI_4);
        assert!((peak.y - (pet.offset.y + pet.float_amplitude)).abs() < 1e-5);

        let to_target = (target - transform.translation).normalize();
        assert!(transform.forward().dot(to_target) > 0.999);
    }
}
