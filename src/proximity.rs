//! A world object that offers a menu when the controlled subject walks up to it.

use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::character_controller::ControlSet;
use crate::character_controller::components::{ControlLock, Subject};
use crate::character_controller::input::PlayerIntent;
use crate::emote::set_cursor_free;
use crate::game_states::AppState;
use crate::selection::{SelectionChanged, SwitchSubject};
use crate::sequence::{Tween, smoothstep};

const SCALE_IN_DURATION: f32 = 0.35;
const SCALE_OUT_DURATION: f32 = 0.25;

pub struct ProximityPlugin;

impl Plugin for ProximityPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<ProximityPrompt>()
            .add_event::<MenuAction>()
            .add_systems(Startup, setup_book_panel)
            .add_systems(
                Update,
                (retarget_prompts, track_proximity, book_view, scale_holograms)
                    .chain()
                    .in_set(ControlSet::Menus)
                    .run_if(in_state(AppState::InGame)),
            );
    }
}

/// Something the player picked in the book menu.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    CycleHat,
    CycleGlasses,
    CyclePet,
    RemovePet,
}

#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct ScaleFade {
    pub from: f32,
    pub to: f32,
    pub tween: Tween,
}

#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct ProximityPrompt {
    pub activation_distance: f32,
    pub visible: bool,
    pub in_menu_view: bool,
    pub fade: Option<ScaleFade>,
    pub target: Option<Entity>,
}

impl Default for ProximityPrompt {
    fn default() -> Self {
        Self {
            activation_distance: 2.5,
            visible: false,
            in_menu_view: false,
            fade: None,
            target: None,
        }
    }
}

impl ProximityPrompt {
    /// Shows or hides the prompt for a target `distance` away. Frozen while
    /// the menu view is open. Returns true when visibility flipped.
    pub fn update(&mut self, distance: f32) -> bool {
        if self.in_menu_view {
            return false;
        }

        let near = distance < self.activation_distance;
        if near == self.visible {
            return false;
        }

        self.visible = near;
        self.fade = Some(if near {
            ScaleFade {
                from: 0.0,
                to: 1.0,
                tween: Tween::new(SCALE_IN_DURATION),
            }
        } else {
            ScaleFade {
                from: 1.0,
                to: 0.0,
                tween: Tween::new(SCALE_OUT_DURATION),
            }
        });
        true
    }

    /// Current hologram scale after advancing the running fade by `dt`.
    pub fn scale(&mut self, dt: f32) -> f32 {
        let Some(fade) = &mut self.fade else {
            return if self.visible { 1.0 } else { 0.0 };
        };

        let progress = fade.tween.advance(dt);
        let scale = smoothstep(fade.from, fade.to, progress);
        if fade.tween.finished() {
            self.fade = None;
        }
        scale
    }

    pub fn open_menu(&mut self) -> bool {
        if !self.visible || self.in_menu_view {
            return false;
        }
        self.in_menu_view = true;
        true
    }

    pub fn close_menu(&mut self) -> bool {
        std::mem::replace(&mut self.in_menu_view, false)
    }
}

/// The floating sign scaled in and out by its parent prompt.
#[derive(Component)]
pub struct PromptHologram;

#[derive(Component)]
struct BookPanel;

fn setup_book_panel(mut commands: Commands) {
    commands
        .spawn((
            Name::new("Book panel"),
            BookPanel,
            Node {
                position_type: PositionType::Absolute,
                bottom: Val::Px(24.),
                left: Val::Px(24.),
                padding: UiRect::all(Val::Px(16.)),
                flex_direction: FlexDirection::Column,
                row_gap: Val::Px(6.),
                ..default()
            },
            BackgroundColor(Color::srgba(0.1, 0.08, 0.05, 0.85)),
            Visibility::Hidden,
        ))
        .with_children(|parent| {
            for line in [
                "H  next hat",
                "G  next glasses",
                "P  next pet",
                "X  dismiss pet",
                "C  switch character",
                "Esc  close",
            ] {
                parent.spawn((
                    Text::new(line),
                    TextFont {
                        font_size: 20.0,
                        ..default()
                    },
                    TextColor(Color::srgb(0.95, 0.9, 0.8)),
                ));
            }
        });
}

fn retarget_prompts(mut changes: EventReader<SelectionChanged>, mut prompts: Query<&mut ProximityPrompt>) {
    for change in changes.read() {
        for mut prompt in &mut prompts {
            prompt.target = Some(change.current);
        }
    }
}

fn track_proximity(
    mut prompts: Query<(&mut ProximityPrompt, &Transform), Without<Subject>>,
    subjects: Query<&Transform, With<Subject>>,
) {
    for (mut prompt, transform) in &mut prompts {
        let Some(target) = prompt.target.and_then(|target| subjects.get(target).ok()) else {
            continue;
        };
        let distance = target.translation.distance(transform.translation);
        prompt.update(distance);
    }
}

fn book_view(
    intent: Res<PlayerIntent>,
    mut lock: ResMut<ControlLock>,
    mut prompts: Query<&mut ProximityPrompt>,
    mut panels: Query<&mut Visibility, With<BookPanel>>,
    mut actions: EventWriter<MenuAction>,
    mut switches: EventWriter<SwitchSubject>,
    windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    let mut changed = None;
    for mut prompt in &mut prompts {
        if intent.interact && prompt.open_menu() {
            info!("BOOK: menu view opened");
            changed = Some(true);
        } else if intent.back && prompt.close_menu() {
            info!("BOOK: menu view closed");
            changed = Some(false);
        }
    }

    let in_view = prompts.iter().any(|prompt| prompt.in_menu_view);
    lock.menu_view = in_view;

    if let Some(open) = changed {
        set_cursor_free(windows, open);
        for mut visibility in &mut panels {
            *visibility = if open {
                Visibility::Inherited
            } else {
                Visibility::Hidden
            };
        }
    }

    if !in_view {
        return;
    }
    for (pressed, action) in [
        (intent.cycle_hat, MenuAction::CycleHat),
        (intent.cycle_glasses, MenuAction::CycleGlasses),
        (intent.cycle_pet, MenuAction::CyclePet),
        (intent.remove_pet, MenuAction::RemovePet),
    ] {
        if pressed {
            actions.write(action);
        }
    }
    if intent.menu_switch {
        switches.write(SwitchSubject);
    }
}

fn scale_holograms(
    time: Res<Time>,
    mut prompts: Query<(&mut ProximityPrompt, &Children)>,
    mut holograms: Query<(&mut Transform, &mut Visibility), With<PromptHologram>>,
) {
    for (mut prompt, children) in &mut prompts {
        let scale = prompt.scale(time.delta_secs());
        for child in children.iter() {
            if let Ok((mut transform, mut visibility)) = holograms.get_mut(child) {
                transform.scale = Vec3::splat(scale.max(f32::EPSILON));
                *visibility = if scale > 0.0 {
                    Visibility::Inherited
                } else {
                    Visibility::Hidden
                };
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settle(prompt: &mut ProximityPrompt) -> f32 {
        let mut scale = 0.0;
        for _ in 0..60 {
            scale = prompt.scale(1.0 / 60.0);
        }
        scale
    }

    #[test]
    fn approaching_scales_the_prompt_in() {
        let mut prompt = ProximityPrompt::default();
        assert!(!prompt.update(3.0));
        assert_eq!(prompt.scale(0.1), 0.0);

        assert!(prompt.update(2.0));
        assert!(prompt.visible);
        let early = prompt.scale(0.1);
        assert!(early > 0.0 && early < 1.0);
        assert_eq!(settle(&mut prompt), 1.0);
        assert!(prompt.fade.is_none());
    }

    #[test]
    fn leaving_scales_it_out_faster() {
        let mut prompt = ProximityPrompt::default();
        prompt.update(1.0);
        settle(&mut prompt);

        assert!(prompt.update(2.5));
        assert!(!prompt.visible);
        assert_eq!(prompt.fade.map(|f| f.tween.duration), Some(SCALE_OUT_DURATION));
        assert_eq!(settle(&mut prompt), 0.0);
    }

    #[test]
    fn a_new_fade_replaces_the_running_one() {
        let mut prompt = ProximityPrompt::default();
        prompt.update(1.0);
        prompt.scale(0.1);
        prompt.update(5.0);

        let fade = prompt.fade.unwrap();
        assert_eq!((fade.from, fade.to), (1.0, 0.0));
        assert_eq!(fade.tween.elapsed, 0.0);
    }

    #[test]
    fn menu_opens_only_when_visible_and_freezes_proximity() {
        let mut prompt = ProximityPrompt::default();
        assert!(!prompt.open_menu());

        prompt.update(1.0);
        assert!(prompt.open_menu());
        assert!(!prompt.open_menu());

        assert!(!prompt.update(10.0));
        assert!(prompt.visible);

        assert!(prompt.close_menu());
        assert!(!prompt.close_menu());
        assert!(prompt.update(10.0));
    }
}
