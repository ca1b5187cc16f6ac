//! Procedural climbing tower: blocks placed on a rising spiral.

use avian3d::prelude::*;
use bevy::prelude::*;
use rand::Rng;

use crate::character_controller::ControlSet;
use crate::game_states::AppState;
use crate::probe::GameLayer;
use crate::selection::SubjectRoster;

/// More blocks are added once the player is this close to the top.
const EXTEND_MARGIN: f32 = 8.0;
const EXTEND_COUNT: usize = 5;

pub struct LevelGenPlugin;

impl Plugin for LevelGenPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<LevelGenerator>()
            .add_systems(Startup, (setup_level_assets, spawn_initial_level).chain())
            .add_systems(
                Update,
                extend_level
                    .in_set(ControlSet::Follow)
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    Platform,
    Climb,
    Obstacle,
}

impl SegmentKind {
    pub const ALL: [SegmentKind; 3] = [SegmentKind::Platform, SegmentKind::Climb, SegmentKind::Obstacle];

    fn layer(self) -> GameLayer {
        match self {
            SegmentKind::Climb => GameLayer::Climbable,
            SegmentKind::Platform | SegmentKind::Obstacle => GameLayer::Default,
        }
    }
}

/// One placed block. `position` is the center of its box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelSegment {
    pub kind: SegmentKind,
    pub position: Vec3,
    pub size: Vec3,
}

impl LevelSegment {
    pub fn overlaps(&self, position: Vec3, size: Vec3) -> bool {
        let gap = (position - self.position).abs();
        let reach = (size + self.size) * 0.5;
        gap.cmplt(reach).all()
    }
}

#[derive(Resource, Debug, Clone)]
pub struct LevelGenerator {
    /// Block sizes per kind, indexed like [`SegmentKind::ALL`].
    pub pools: [Vec<Vec3>; 3],
    pub initial_segments: usize,
    pub min_gap: f32,
    pub max_gap: f32,
    pub spiral_radius: f32,
    /// Degrees.
    pub angle_step: f32,
    /// Center of the spiral at ground height.
    pub origin: Vec3,
    pub current_angle: f32,
    pub current_height: f32,
    pub segments: Vec<LevelSegment>,
}

impl Default for LevelGenerator {
    fn default() -> Self {
        Self {
            pools: [
                vec![Vec3::new(3.0, 0.5, 3.0), Vec3::new(4.0, 0.5, 2.5)],
                vec![Vec3::new(2.0, 4.0, 0.6), Vec3::new(2.5, 6.0, 0.6)],
                vec![Vec3::new(1.0, 1.0, 1.0), Vec3::new(1.5, 2.0, 1.5)],
            ],
            initial_segments: 10,
            min_gap: 2.0,
            max_gap: 5.0,
            spiral_radius: 4.0,
            angle_step: 45.0,
            origin: Vec3::new(0.0, 0.0, 14.0),
            current_angle: 0.0,
            current_height: 0.0,
            segments: Vec::new(),
        }
    }
}

impl LevelGenerator {
    /// Places the next block, or None when the drawn kind has no sizes.
    pub fn spawn_next<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Option<LevelSegment> {
        let kind_index = rng.gen_range(0..SegmentKind::ALL.len());
        let pool = &self.pools[kind_index];
        if pool.is_empty() {
            return None;
        }
        let size = pool[rng.gen_range(0..pool.len())];

        let (low, high) = (self.min_gap.min(self.max_gap), self.min_gap.max(self.max_gap));
        self.current_height += rng.gen_range(low..=high) + size.y;
        self.current_angle += self.angle_step;

        let angle = self.current_angle.to_radians();
        let mut position = self.origin
            + Vec3::new(
                angle.cos() * self.spiral_radius,
                self.current_height,
                angle.sin() * self.spiral_radius,
            );

        if self.segments.iter().any(|s| s.overlaps(position, size)) {
            position.y += size.y * 1.5;
        }

        let segment = LevelSegment {
            kind: SegmentKind::ALL[kind_index],
            position,
            size,
        };
        self.segments.push(segment);
        Some(segment)
    }

    pub fn generate<R: Rng + ?Sized>(&mut self, count: usize, rng: &mut R) -> Vec<LevelSegment> {
        (0..count).filter_map(|_| self.spawn_next(rng)).collect()
    }

    /// Height of the highest block edge placed so far.
    pub fn top(&self) -> f32 {
        self.segments
            .iter()
            .map(|s| s.position.y + s.size.y * 0.5)
            .fold(self.origin.y, f32::max)
    }
}

#[derive(Resource)]
struct LevelMaterials {
    platform: Handle<StandardMaterial>,
    climb: Handle<StandardMaterial>,
    obstacle: Handle<StandardMaterial>,
}

impl LevelMaterials {
    fn get(&self, kind: SegmentKind) -> Handle<StandardMaterial> {
        match kind {
            SegmentKind::Platform => self.platform.clone(),
            SegmentKind::Climb => self.climb.clone(),
            SegmentKind::Obstacle => self.obstacle.clone(),
        }
    }
}

fn setup_level_assets(mut commands: Commands, mut materials: ResMut<Assets<StandardMaterial>>) {
    commands.insert_resource(LevelMaterials {
        platform: materials.add(Color::srgb(0.55, 0.5, 0.45)),
        climb: materials.add(Color::srgb(0.35, 0.55, 0.3)),
        obstacle: materials.add(Color::srgb(0.6, 0.3, 0.25)),
    });
}

fn spawn_segment(
    commands: &mut Commands,
    meshes: &mut Assets<Mesh>,
    materials: &LevelMaterials,
    segment: &LevelSegment,
) {
    commands.spawn((
        Name::new(format!("{:?} segment", segment.kind)),
        Mesh3d(meshes.add(Cuboid::from_size(segment.size))),
        MeshMaterial3d(materials.get(segment.kind)),
        Transform::from_translation(segment.position),
        RigidBody::Static,
        Collider::cuboid(segment.size.x, segment.size.y, segment.size.z),
        CollisionLayers::new(segment.kind.layer(), LayerMask::ALL),
    ));
}

fn spawn_initial_level(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    materials: Res<LevelMaterials>,
    mut generator: ResMut<LevelGenerator>,
) {
    let count = generator.initial_segments;
    let segments = generator.generate(count, &mut rand::thread_rng());
    for segment in &segments {
        spawn_segment(&mut commands, &mut meshes, &materials, segment);
    }
    info!("LEVEL: placed {} initial segments", segments.len());
}

fn extend_level(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    materials: Res<LevelMaterials>,
    mut generator: ResMut<LevelGenerator>,
    roster: Res<SubjectRoster>,
    subjects: Query<&Transform>,
) {
    let Some(subject) = roster.active().and_then(|active| subjects.get(active).ok()) else {
        return;
    };
    if subject.translation.y < generator.top() - EXTEND_MARGIN {
        return;
    }

    let segments = generator.generate(EXTEND_COUNT, &mut rand::thread_rng());
    for segment in &segments {
        spawn_segment(&mut commands, &mut meshes, &materials, segment);
    }
    info!("LEVEL: extended to {:.1} m", generator.top());
}
