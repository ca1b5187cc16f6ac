use bevy::prelude::*;
use bevy::window::{CursorGrabMode, PrimaryWindow};

use crate::animation::{AnimationParams, AnimationTrigger, AnimationTriggered, EmotePlayback};
use crate::character_controller::ControlSet;
use crate::character_controller::components::ControlLock;
use crate::character_controller::input::PlayerIntent;
use crate::game_states::AppState;
use crate::selection::SubjectRoster;

pub const EMOTES: [&str; 4] = ["Wave", "Dance", "Cheer", "Bow"];

const NORMAL_BUTTON: Color = Color::srgb(0.15, 0.15, 0.15);
const HOVERED_BUTTON: Color = Color::srgb(0.25, 0.25, 0.25);
const PRESSED_BUTTON: Color = Color::srgb(0.35, 0.75, 0.35);

pub struct EmotePlugin;

impl Plugin for EmotePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(EmoteWheel::new(EMOTES.len()))
            .add_event::<EmoteChoice>()
            .add_systems(Startup, setup_wheel)
            .add_systems(OnEnter(AppState::InGame), capture_cursor)
            .add_systems(
                Update,
                (hold_to_open, wheel_buttons, show_wheel)
                    .chain()
                    .in_set(ControlSet::Menus)
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

/// Hold-to-open radial emote menu.
///
/// Releasing the key plays whatever is hovered, or the default emote when
/// nothing is. Clicking a button plays it immediately.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct EmoteWheel {
    pub open: bool,
    pub hovered: Option<usize>,
    pub default_index: usize,
    pub count: usize,
}

impl EmoteWheel {
    pub fn new(count: usize) -> Self {
        Self {
            open: false,
            hovered: None,
            default_index: 0,
            count,
        }
    }

    pub fn open(&mut self) {
        self.open = true;
        self.hovered = None;
    }

    pub fn hover_enter(&mut self, index: usize) {
        if self.open && index < self.count {
            self.hovered = Some(index);
        }
    }

    pub fn hover_exit(&mut self, index: usize) {
        if self.hovered == Some(index) {
            self.hovered = None;
        }
    }

    /// Closes the wheel and returns the emote to play. None if it was not open.
    pub fn close(&mut self) -> Option<usize> {
        if !self.open {
            return None;
        }
        self.open = false;
        Some(self.hovered.take().unwrap_or(self.default_index))
    }

    pub fn click(&mut self, index: usize) -> Option<usize> {
        if !self.open {
            return None;
        }
        self.open = false;
        self.hovered = None;
        Some(index)
    }

    pub fn trigger_for(&self, index: usize) -> Option<AnimationTrigger> {
        (index < self.count).then_some(AnimationTrigger::Emote(index))
    }
}

#[derive(Component)]
struct EmotePanel;

#[derive(Component)]
struct EmoteButton(usize);

fn setup_wheel(mut commands: Commands) {
    commands
        .spawn((
            Name::new("Emote wheel"),
            EmotePanel,
            Node {
                width: Val::Percent(100.),
                height: Val::Percent(100.),
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                column_gap: Val::Px(12.),
                ..default()
            },
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            for (index, label) in EMOTES.iter().enumerate() {
                parent
                    .spawn((
                        Button,
                        EmoteButton(index),
                        Node {
                            width: Val::Px(120.),
                            height: Val::Px(120.),
                            justify_content: JustifyContent::Center,
                            align_items: AlignItems::Center,
                            ..default()
                        },
                        BorderRadius::MAX,
                        BackgroundColor(NORMAL_BUTTON),
                    ))
                    .with_children(|parent| {
                        parent.spawn((
                            Text::new(*label),
                            TextFont {
                                font_size: 24.0,
                                ..default()
                            },
                            TextColor(Color::srgb(0.9, 0.9, 0.9)),
                        ));
                    });
            }
        });
}

fn hold_to_open(
    intent: Res<PlayerIntent>,
    mut held: Local<bool>,
    mut wheel: ResMut<EmoteWheel>,
    mut lock: ResMut<ControlLock>,
    mut played: EventWriter<EmoteChoice>,
    windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let was_held = std::mem::replace(&mut *held, intent.emote_menu);

    if intent.emote_menu && !was_held {
        wheel.open();
        lock.emote_menu = true;
        set_cursor_free(windows, true);
        info!("EMOTE: wheel open");
    } else if !intent.emote_menu && was_held {
        lock.emote_menu = false;
        if let Some(index) = wheel.close() {
            set_cursor_free(windows, false);
            played.write(EmoteChoice(index));
        }
    }
}

#[derive(Event, Debug, Clone, Copy)]
struct EmoteChoice(usize);

fn wheel_buttons(
    mut wheel: ResMut<EmoteWheel>,
    mut lock: ResMut<ControlLock>,
    mut buttons: Query<(&Interaction, &EmoteButton, &mut BackgroundColor), Changed<Interaction>>,
    mut choices: EventReader<EmoteChoice>,
    roster: Res<SubjectRoster>,
    mut subjects: Query<&mut AnimationParams>,
    mut commands: Commands,
    mut triggers: EventWriter<AnimationTriggered>,
    windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let mut chosen: Vec<usize> = choices.read().map(|choice| choice.0).collect();

    for (interaction, button, mut color) in &mut buttons {
        match *interaction {
            Interaction::Pressed => {
                *color = PRESSED_BUTTON.into();
                if let Some(index) = wheel.click(button.0) {
                    chosen.push(index);
                }
            }
            Interaction::Hovered => {
                *color = HOVERED_BUTTON.into();
                wheel.hover_enter(button.0);
            }
            Interaction::None => {
                *color = NORMAL_BUTTON.into();
                wheel.hover_exit(button.0);
            }
        }
    }

    if chosen.is_empty() {
        return;
    }
    // A click closes the wheel while the key may still be down.
    lock.emote_menu = wheel.open;
    if !wheel.open {
        set_cursor_free(windows, false);
    }

    let Some(subject) = roster.active() else {
        return;
    };
    for index in chosen {
        match wheel.trigger_for(index) {
            Some(trigger) => {
                info!("EMOTE: playing #{} ({})", index + 1, EMOTES[index]);
                triggers.write(AnimationTriggered { subject, trigger });
            }
            None => {
                warn!("EMOTE: no emote #{}, clearing", index + 1);
                if let Ok(mut params) = subjects.get_mut(subject) {
                    params.is_emoting = false;
                }
                commands.entity(subject).remove::<EmotePlayback>();
            }
        }
    }
}

fn show_wheel(wheel: Res<EmoteWheel>, mut panels: Query<&mut Visibility, With<EmotePanel>>) {
    if !wheel.is_changed() {
        return;
    }
    for mut visibility in &mut panels {
        *visibility = if wheel.open {
            Visibility::Inherited
        } else {
            Visibility::Hidden
        };
    }
}

fn capture_cursor(windows: Query<&mut Window, With<PrimaryWindow>>) {
    set_cursor_free(windows, false);
}

pub(crate) fn set_cursor_free(mut windows: Query<&mut Window, With<PrimaryWindow>>, free: bool) {
    let Ok(mut window) = windows.single_mut() else {
        return;
    };
    window.cursor_options.visible = free;
    window.cursor_options.grab_mode = if free {
        CursorGrabMode::None
    } else {
        CursorGrabMode::Locked
    };
}
