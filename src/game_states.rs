use bevy::app::{App, Plugin};
use bevy::prelude::{AppExtStates, States};

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq, Hash, States)]
pub enum AppState {
    /// Both subjects are on display and nobody moves until one is clicked.
    #[default]
    CharacterSelect,
    InGame,
}

pub struct GameStatePlugin;

impl Plugin for GameStatePlugin {
    fn build(&self, app: &mut App) {
        app.init_state::<AppState>();
    }
}
