mod animation;
mod camera;
mod character_controller;
mod customizer;
mod emote;
mod environment;
mod game_states;
mod level_gen;
mod pet;
mod player;
mod probe;
mod proximity;
mod selection;
mod sequence;
mod world;

use bevy::prelude::*;
use bevy_inspector_egui::bevy_egui::EguiPlugin;
use bevy_inspector_egui::quick::WorldInspectorPlugin;

fn main() {
    App::new()
        .add_plugins(DefaultPlugins.set(WindowPlugin {
            primary_window: Some(Window {
                title: "Ascent".into(),
                ..default()
            }),
            ..default()
        }))
        .add_plugins(EguiPlugin {
            enable_multipass_for_primary_context: true,
        })
        .add_plugins(WorldInspectorPlugin::new())
        .add_plugins(probe::PhysicsPlugin)
        .add_plugins(game_states::GameStatePlugin)
        .add_plugins(character_controller::CharacterControllerPlugin)
        .add_plugins(animation::AnimationPlugin)
        .add_plugins(camera::CameraPlugin)
        .add_plugins(selection::SelectionPlugin)
        .add_plugins(emote::EmotePlugin)
        .add_plugins(proximity::ProximityPlugin)
        .add_plugins(customizer::CustomizerPlugin)
        .add_plugins(pet::PetPlugin)
        .add_plugins(environment::EnvironmentPlugin)
        .add_plugins(level_gen::LevelGenPlugin)
        .add_plugins(world::WorldPlugin)
        .add_plugins(player::PlayerPlugin)
        .run();
}
