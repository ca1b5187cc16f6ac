pub mod climb;
pub mod components;
pub mod input;
pub mod physics;
pub mod stamina;
pub mod states;

use bevy::prelude::*;

use crate::game_states::AppState;
use components::{ControlLock, Locomotion, LocomotionConfig, Subject};
use input::PlayerIntent;
use stamina::Stamina;

pub struct CharacterControllerPlugin;

/// Ordering of the per-frame gameplay work.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlSet {
    /// Device state becomes a [`PlayerIntent`].
    Input,
    /// Menus and selection consume the intent.
    Menus,
    /// Subjects move.
    Movement,
    /// Camera and followers react to where subjects ended up.
    Follow,
}

impl Plugin for CharacterControllerPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<Subject>()
            .register_type::<Locomotion>()
            .register_type::<LocomotionConfig>()
            .register_type::<Stamina>()
            .init_resource::<PlayerIntent>()
            .init_resource::<ControlLock>()
            .configure_sets(
                Update,
                (
                    ControlSet::Input,
                    ControlSet::Menus,
                    ControlSet::Movement,
                    ControlSet::Follow,
                )
                    .chain(),
            )
            .add_systems(Update, input::gather_intent.in_set(ControlSet::Input))
            .add_systems(
                Update,
                (physics::drive_subjects, physics::debug_visualize_probes)
                    .chain()
                    .in_set(ControlSet::Movement)
                    .run_if(in_state(AppState::InGame)),
            );
    }
}
