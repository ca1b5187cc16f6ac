//! Which subject the player controls.
//!
//! The roster is the only registry of candidate subjects; everything that
//! needs "the player" asks it (or listens for [`SelectionChanged`]) instead of
//! looking entities up by name.

use avian3d::prelude::*;
use bevy::prelude::*;

use crate::camera::CameraRig;
use crate::character_controller::ControlSet;
use crate::character_controller::components::{Locomotion, Subject};
use crate::character_controller::input::PlayerIntent;
use crate::game_states::AppState;
use crate::probe::GameLayer;

const PICK_DISTANCE: f32 = 200.0;
const HIGHLIGHT_SCALE: f32 = 1.1;

pub struct SelectionPlugin;

impl Plugin for SelectionPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SubjectRoster>()
            .add_event::<SelectionChanged>()
            .add_event::<SwitchSubject>()
            .add_systems(
                Update,
                (
                    pick_subject,
                    request_switch.run_if(in_state(AppState::InGame)),
                    apply_selection,
                )
                    .chain()
                    .in_set(ControlSet::Menus),
            );
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionKind {
    /// First pick; the subject keeps its own pose.
    Initial,
    /// Control moves to another subject, which takes over the previous pose.
    Switch,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionChanged {
    pub previous: Option<Entity>,
    pub current: Entity,
    pub kind: SelectionKind,
}

/// Explicit request to hand control to the next candidate.
#[derive(Event, Debug, Clone, Copy, Default)]
pub struct SwitchSubject;

#[derive(Resource, Debug, Default, Clone)]
pub struct SubjectRoster {
    candidates: Vec<Entity>,
    active: Option<Entity>,
}

impl SubjectRoster {
    pub fn register(&mut self, candidate: Entity) {
        if !self.candidates.contains(&candidate) {
            self.candidates.push(candidate);
        }
    }

    pub fn candidates(&self) -> &[Entity] {
        &self.candidates
    }

    pub fn active(&self) -> Option<Entity> {
        self.active
    }

    pub fn select(&mut self, candidate: Entity) -> Option<SelectionChanged> {
        if !self.candidates.contains(&candidate) || self.active == Some(candidate) {
            return None;
        }

        let previous = self.active.replace(candidate);
        Some(SelectionChanged {
            previous,
            current: candidate,
            kind: if previous.is_some() {
                SelectionKind::Switch
            } else {
                SelectionKind::Initial
            },
        })
    }

    /// Hands control to the candidate after the active one.
    pub fn switch(&mut self) -> Option<SelectionChanged> {
        let active = self.active?;
        let index = self.candidates.iter().position(|c| *c == active)?;
        let next = self.candidates[(index + 1) % self.candidates.len()];
        self.select(next)
    }
}

/// Grants or revokes control on one subject.
pub fn grant_control(active: bool, subject: &mut Subject, locomotion: &mut Locomotion) {
    subject.active_control = active;
    locomotion.allow_movement = active;
}

pub fn active_count<'a>(subjects: impl IntoIterator<Item = &'a Subject>) -> usize {
    subjects.into_iter().filter(|s| s.active_control).count()
}

/// Walks up from a hit collider to the candidate that owns it.
pub fn owning_candidate(
    hit: Entity,
    candidates: &[Entity],
    parent_of: impl Fn(Entity) -> Option<Entity>,
) -> Option<Entity> {
    let mut current = Some(hit);
    while let Some(entity) = current {
        if candidates.contains(&entity) {
            return Some(entity);
        }
        current = parent_of(entity);
    }
    None
}

fn pick_subject(
    intent: Res<PlayerIntent>,
    camera_query: Query<(&Camera, &GlobalTransform), With<CameraRig>>,
    spatial_query: SpatialQuery,
    parents: Query<&ChildOf>,
    visibility: Query<&Visibility>,
    mut roster: ResMut<SubjectRoster>,
    mut changes: EventWriter<SelectionChanged>,
) {
    let Some(cursor) = intent.click else {
        return;
    };
    let Ok((camera, camera_transform)) = camera_query.single() else {
        return;
    };
    let Ok(ray) = camera.viewport_to_world(camera_transform, cursor) else {
        return;
    };

    let filter = SpatialQueryFilter::from_mask(GameLayer::Subject);
    let Some(hit) = spatial_query.cast_ray(ray.origin, ray.direction, PICK_DISTANCE, true, &filter)
    else {
        return;
    };

    let Some(picked) = owning_candidate(hit.entity, roster.candidates(), |e| {
        parents.get(e).ok().map(ChildOf::parent)
    }) else {
        return;
    };
    // Subjects put away after a switch keep their colliders.
    if visibility.get(picked).is_ok_and(|v| *v == Visibility::Hidden) {
        return;
    }

    if let Some(change) = roster.select(picked) {
        changes.write(change);
    }
}

fn request_switch(
    intent: Res<PlayerIntent>,
    mut requests: EventReader<SwitchSubject>,
    mut roster: ResMut<SubjectRoster>,
    mut changes: EventWriter<SelectionChanged>,
) {
    let requested = requests.read().count() > 0 || intent.switch_subject;
    if !requested {
        return;
    }

    if let Some(change) = roster.switch() {
        changes.write(change);
    }
}

fn apply_selection(
    mut changes: EventReader<SelectionChanged>,
    mut subjects: Query<(
        Entity,
        &Name,
        &mut Subject,
        &mut Locomotion,
        &mut Transform,
        &mut Visibility,
    )>,
    mut rig_query: Query<&mut CameraRig>,
    mut next_state: ResMut<NextState<AppState>>,
) {
    for change in changes.read() {
        let previous_pose = change
            .previous
            .and_then(|previous| subjects.get(previous).ok())
            .map(|(_, _, _, _, transform, _)| *transform);

        for (entity, name, mut subject, mut locomotion, mut transform, mut visibility) in &mut subjects {
            let active = entity == change.current;
            grant_control(active, &mut subject, &mut locomotion);

            *visibility = if active {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            };
            transform.scale = Vec3::splat(if active { HIGHLIGHT_SCALE } else { 1.0 });

            if active {
                if let (SelectionKind::Switch, Some(pose)) = (change.kind, previous_pose) {
                    transform.translation = pose.translation;
                    transform.rotation = pose.rotation;
                    locomotion.vertical_velocity = 0.0;
                }
                info!("SELECT: {:?} control -> {}", change.kind, name);
            }
        }

        debug_assert_eq!(
            active_count(subjects.iter().map(|(_, _, subject, ..)| subject)),
            1,
            "exactly one subject holds control after a selection"
        );

        if let (Ok(mut rig), Ok((_, _, _, _, transform, _))) =
            (rig_query.single_mut(), subjects.get(change.current))
        {
            rig.retarget(change.current, transform.rotation);
        }

        next_state.set(AppState::InGame);
    }
}
