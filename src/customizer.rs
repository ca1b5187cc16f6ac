use bevy::prelude::*;

use crate::character_controller::ControlSet;
use crate::proximity::MenuAction;
use crate::selection::SubjectRoster;

pub struct CustomizerPlugin;

impl Plugin for CustomizerPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Accessories>()
            .add_systems(Startup, setup_catalog)
            .add_systems(
                Update,
                (apply_menu_actions, equip_accessories)
                    .chain()
                    .in_set(ControlSet::Follow),
            );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum AccessorySlot {
    Hat,
    Glasses,
}

impl AccessorySlot {
    /// Where the slot sits relative to the subject's feet.
    pub fn anchor(self) -> Vec3 {
        match self {
            AccessorySlot::Hat => Vec3::new(0.0, 1.85, 0.0),
            AccessorySlot::Glasses => Vec3::new(0.0, 1.6, 0.22),
        }
    }
}

/// What a subject is wearing. `None` means the slot is empty.
#[derive(Component, Reflect, Debug, Default, Clone, Copy, PartialEq, Eq)]
#[reflect(Component)]
pub struct Accessories {
    pub hat: Option<usize>,
    pub glasses: Option<usize>,
}

impl Accessories {
    pub fn get(&self, slot: AccessorySlot) -> Option<usize> {
        match slot {
            AccessorySlot::Hat => self.hat,
            AccessorySlot::Glasses => self.glasses,
        }
    }

    /// Equips item `index` in `slot`, replacing what was there. An index past
    /// the end of the catalog leaves the slot empty.
    pub fn change(&mut self, slot: AccessorySlot, index: usize, available: usize) -> Option<usize> {
        let equipped = (index < available).then_some(index);
        match slot {
            AccessorySlot::Hat => self.hat = equipped,
            AccessorySlot::Glasses => self.glasses = equipped,
        }
        equipped
    }

    pub fn change_hat(&mut self, index: usize, available: usize) -> Option<usize> {
        self.change(AccessorySlot::Hat, index, available)
    }

    pub fn change_glasses(&mut self, index: usize, available: usize) -> Option<usize> {
        self.change(AccessorySlot::Glasses, index, available)
    }

    /// Next item in the slot; cycling past the last one takes it off.
    pub fn cycle(&mut self, slot: AccessorySlot, available: usize) -> Option<usize> {
        let next = self.get(slot).map_or(0, |current| current + 1);
        self.change(slot, next, available)
    }
}

#[derive(Clone)]
pub struct AccessoryLook {
    pub name: &'static str,
    pub mesh: Handle<Mesh>,
    pub material: Handle<StandardMaterial>,
}

#[derive(Resource, Default)]
pub struct AccessoryCatalog {
    pub hats: Vec<AccessoryLook>,
    pub glasses: Vec<AccessoryLook>,
}

impl AccessoryCatalog {
    pub fn looks(&self, slot: AccessorySlot) -> &[AccessoryLook] {
        match slot {
            AccessorySlot::Hat => &self.hats,
            AccessorySlot::Glasses => &self.glasses,
        }
    }
}

/// The attachment point on a subject that accessories are parented to.
#[derive(Component, Debug, Clone, Copy)]
pub struct AccessorySocket(pub AccessorySlot);

#[derive(Component)]
struct Equipped;

fn setup_catalog(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mut look = |name, mesh: Mesh, color: Color| AccessoryLook {
        name,
        mesh: meshes.add(mesh),
        material: materials.add(color),
    };

    let hats = vec![
        look("Beanie", Sphere::new(0.2).into(), Color::srgb(0.8, 0.2, 0.2)),
        look("Top hat", Cylinder::new(0.15, 0.35).into(), Color::srgb(0.1, 0.1, 0.1)),
        look("Cone", Cone::new(0.18, 0.4).into(), Color::srgb(0.9, 0.8, 0.2)),
    ];
    let glasses = vec![
        look("Shades", Cuboid::new(0.35, 0.08, 0.05).into(), Color::srgb(0.05, 0.05, 0.05)),
        look("Visor", Cuboid::new(0.4, 0.12, 0.04).into(), Color::srgba(0.2, 0.6, 0.9, 0.6)),
    ];

    commands.insert_resource(AccessoryCatalog { hats, glasses });
}

fn apply_menu_actions(
    mut actions: EventReader<MenuAction>,
    roster: Res<SubjectRoster>,
    catalog: Res<AccessoryCatalog>,
    mut subjects: Query<&mut Accessories>,
) {
    for action in actions.read() {
        let slot = match action {
            MenuAction::CycleHat => AccessorySlot::Hat,
            MenuAction::CycleGlasses => AccessorySlot::Glasses,
            _ => continue,
        };
        let Some(mut accessories) = roster.active().and_then(|active| subjects.get_mut(active).ok())
        else {
            continue;
        };

        match accessories.cycle(slot, catalog.looks(slot).len()) {
            Some(index) => info!("CUSTOMIZE: {:?} -> {}", slot, catalog.looks(slot)[index].name),
            None => info!("CUSTOMIZE: {:?} removed", slot),
        }
    }
}

/// Respawns the visible items of every subject whose accessories changed.
fn equip_accessories(
    mut commands: Commands,
    catalog: Res<AccessoryCatalog>,
    subjects: Query<(&Accessories, &Children), Changed<Accessories>>,
    sockets: Query<(&AccessorySocket, Option<&Children>)>,
    equipped: Query<(), With<Equipped>>,
) {
    for (accessories, children) in &subjects {
        for child in children.iter() {
            let Ok((socket, items)) = sockets.get(child) else {
                continue;
            };

            if let Some(items) = items {
                for item in items.iter() {
                    if equipped.contains(item) {
                        commands.entity(item).despawn();
                    }
                }
            }

            let Some(look) = accessories
                .get(socket.0)
                .and_then(|index| catalog.looks(socket.0).get(index))
            else {
                continue;
            };
            commands.entity(child).with_child((
                Name::new(look.name),
                Equipped,
                Mesh3d(look.mesh.clone()),
                MeshMaterial3d(look.material.clone()),
                Transform::IDENTITY,
            ));
        }
    }
}
