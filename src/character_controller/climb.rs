//! Wall climbing and the ledge pull-up.

use bevy::prelude::*;

use super::components::{Locomotion, LocomotionConfig, LocomotionState};
use super::input::MoveIntent;
use super::stamina::Stamina;
use crate::probe::{ProbeMask, SpatialProbe};
use crate::sequence::Tween;

/// Horizontal facing of a transform (+Z forward).
pub fn facing(transform: &Transform) -> Dir3 {
    let forward = transform.rotation * Vec3::Z;
    Dir3::new(Vec3::new(forward.x, 0.0, forward.z)).unwrap_or(Dir3::Z)
}

impl Locomotion {
    /// True when a climbable surface is right in front of the chest.
    pub fn wall_ahead(config: &LocomotionConfig, transform: &Transform, probe: &impl SpatialProbe) -> bool {
        let origin = transform.translation + Vec3::Y * config.climb_probe_height;
        probe
            .probe(
                origin,
                facing(transform),
                config.climb_probe_distance,
                ProbeMask::Climbable,
            )
            .is_some()
    }

    /// Nothing overhead is read as "at the top of the wall". Overhangs fool it.
    pub fn at_ledge(config: &LocomotionConfig, transform: &Transform, probe: &impl SpatialProbe) -> bool {
        let origin = transform.translation + Vec3::Y * config.ledge_probe_height;
        probe
            .probe(origin, Dir3::Y, config.ledge_probe_distance, ProbeMask::Solid)
            .is_none()
    }

    pub fn try_start_climb(
        &mut self,
        config: &LocomotionConfig,
        stamina: &Stamina,
        transform: &Transform,
        intent: &MoveIntent,
        probe: &impl SpatialProbe,
    ) -> bool {
        if !self.allow_movement || self.is_climbing() || !stamina.can_act() {
            return false;
        }
        if !(intent.climb && intent.forward_held()) {
            return false;
        }
        if !Self::wall_ahead(config, transform, probe) {
            return false;
        }

        self.state = LocomotionState::Climbing;
        self.vertical_velocity = 0.0;
        self.falling = false;
        self.fall_mark = None;
        true
    }

    /// One tick on the wall. Returns the animation playback rate.
    pub(crate) fn climb_tick(
        &mut self,
        config: &LocomotionConfig,
        stamina: &Stamina,
        transform: &mut Transform,
        intent: &MoveIntent,
        probe: &impl SpatialProbe,
        dt: f32,
    ) -> f32 {
        if !Self::wall_ahead(config, transform, probe) {
            if Self::at_ledge(config, transform, probe) {
                self.start_ledge_mount(config);
            } else {
                self.exit_climb();
            }
            return 1.0;
        }

        if !stamina.can_act() {
            self.exit_climb();
            return 1.0;
        }

        if intent.climb && intent.forward_held() {
            transform.translation.y += config.climb_speed * dt;
            1.0
        } else {
            // Hang in place with the climb cycle paused.
            0.0
        }
    }

    pub fn start_ledge_mount(&mut self, config: &LocomotionConfig) {
        self.state = LocomotionState::LedgeMount(Tween::new(config.ledge_mount_duration));
        self.vertical_velocity = 0.0;
    }

    /// Advances a running pull-up. Input has no say until it completes.
    pub(crate) fn ledge_mount_tick(&mut self, config: &LocomotionConfig, transform: &mut Transform, dt: f32) {
        let LocomotionState::LedgeMount(mut mount) = self.state else {
            return;
        };

        let before = mount.elapsed;
        mount.advance(dt);
        let rise_time = mount.elapsed - before;
        transform.translation.y += config.climb_speed * config.ledge_mount_speed_factor * rise_time;

        if mount.finished() {
            transform.translation += *facing(transform) * config.ledge_forward_nudge;
            self.state = LocomotionState::Grounded;
            self.vertical_velocity = 0.0;
            self.falling = false;
            self.fall_mark = None;
        } else {
            self.state = LocomotionState::LedgeMount(mount);
        }
    }

    pub fn exit_climb(&mut self) {
        self.state = if self.grounded {
            LocomotionState::Grounded
        } else {
            LocomotionState::Airborne
        };
        self.falling = !self.grounded;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::testing::BoxWorld;

    fn climb_intent() -> MoveIntent {
        MoveIntent {
            axis: Vec2::Y,
            climb: true,
            ..default()
        }
    }

    /// A 4 m wall whose near face is 0.5 m in front of the origin.
    fn wall() -> BoxWorld {
        BoxWorld::default().with_floor(0.0).with_box(
            Vec3::new(0.0, 2.0, 1.0),
            Vec3::new(4.0, 4.0, 1.0),
            &[ProbeMask::Climbable, ProbeMask::Solid, ProbeMask::Ground],
        )
    }

    fn allowed() -> Locomotion {
        Locomotion {
            allow_movement: true,
            ..default()
        }
    }

    #[test]
    fn climb_needs_every_condition() {
        let config = LocomotionConfig::default();
        let world = wall();
        let at_wall = Transform::default();
        let stamina = Stamina::default();

        assert!(allowed().try_start_climb(&config, &stamina, &at_wall, &climb_intent(), &world));

        let no_modifier = MoveIntent { climb: false, ..climb_intent() };
        assert!(!allowed().try_start_climb(&config, &stamina, &at_wall, &no_modifier, &world));

        let no_forward = MoveIntent { axis: Vec2::ZERO, ..climb_intent() };
        assert!(!allowed().try_start_climb(&config, &stamina, &at_wall, &no_forward, &world));

        let tired = Stamina { value: 0.0, ..default() };
        assert!(!allowed().try_start_climb(&config, &tired, &at_wall, &climb_intent(), &world));

        let mut locked = allowed();
        locked.allow_movement = false;
        assert!(!locked.try_start_climb(&config, &stamina, &at_wall, &climb_intent(), &world));

        let far_away = Transform::from_xyz(0.0, 0.0, -5.0);
        assert!(!allowed().try_start_climb(&config, &stamina, &far_away, &climb_intent(), &world));

        let facing_away = Transform::from_rotation(Quat::from_rotation_y(std::f32::consts::PI));
        assert!(!allowed().try_start_climb(&config, &stamina, &facing_away, &climb_intent(), &world));
    }

    #[test]
    fn entering_a_climb_resets_vertical_state() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion {
            vertical_velocity: -4.0,
            falling: true,
            fall_mark: Some(3.0),
            ..allowed()
        };
        assert!(locomotion.try_start_climb(
            &config,
            &Stamina::default(),
            &Transform::default(),
            &climb_intent(),
            &wall()
        ));
        assert_eq!(locomotion.state, LocomotionState::Climbing);
        assert_eq!(locomotion.vertical_velocity, 0.0);
        assert!(!locomotion.falling);
        assert!(locomotion.fall_mark.is_none());
    }

    #[test]
    fn releasing_input_holds_position() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion {
            state: LocomotionState::Climbing,
            ..allowed()
        };
        let mut transform = Transform::from_xyz(0.0, 1.0, 0.0);

        let rate = locomotion.climb_tick(
            &config,
            &Stamina::default(),
            &mut transform,
            &MoveIntent::default(),
            &wall(),
            0.1,
        );
        assert_eq!(rate, 0.0);
        assert_eq!(transform.translation.y, 1.0);
        assert_eq!(locomotion.state, LocomotionState::Climbing);

        let rate = locomotion.climb_tick(
            &config,
            &Stamina::default(),
            &mut transform,
            &climb_intent(),
            &wall(),
            0.1,
        );
        assert_eq!(rate, 1.0);
        assert!((transform.translation.y - 1.2).abs() < 1e-5);
    }

    #[test]
    fn empty_stamina_lets_go() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion {
            state: LocomotionState::Climbing,
            grounded: false,
            ..allowed()
        };
        let mut transform = Transform::from_xyz(0.0, 1.0, 0.0);
        locomotion.climb_tick(
            &config,
            &Stamina { value: 0.0, ..default() },
            &mut transform,
            &climb_intent(),
            &wall(),
            0.1,
        );
        assert_eq!(locomotion.state, LocomotionState::Airborne);
        assert!(locomotion.falling);
    }

    #[test]
    fn topping_out_starts_a_ledge_mount() {
        let config = LocomotionConfig::default();
        let mut locomotion = Locomotion {
            state: LocomotionState::Climbing,
            grounded: false,
            ..allowed()
        };
        // Chest probe passes over the 4 m wall top.
        let mut transform = Transform::from_xyz(0.0, 3.1, 0.0);
        locomotion.climb_tick(
            &config,
            &Stamina::default(),
            &mut transform,
            &climb_intent(),
            &wall(),
            0.1,
        );
        assert!(matches!(locomotion.state, LocomotionState::LedgeMount(_)));
    }

    #[test]
    fn losing_the_wall_under_a_ceiling_drops_off() {
        let config = LocomotionConfig::default();
        let world = BoxWorld::default().with_box(
            Vec3::new(0.0, 3.0, 0.0),
            Vec3::new(4.0, 0.5, 4.0),
            &[ProbeMask::Solid],
        );
        let mut locomotion = Locomotion {
            state: LocomotionState::Climbing,
            grounded: false,
            ..allowed()
        };
        let mut transform = Transform::from_xyz(0.0, 0.5, 0.0);
        locomotion.climb_tick(
            &config,
            &Stamina::default(),
            &mut transform,
            &climb_intent(),
            &world,
            0.1,
        );
        assert_eq!(locomotion.state, LocomotionState::Airborne);
    }

    #[test]
    fn ledge_mount_rises_then_steps_forward() {
        let config = LocomotionConfig::default();
        let mut locomotion = allowed();
        locomotion.start_ledge_mount(&config);
        let mut transform = Transform::from_xyz(0.0, 3.0, 0.0);

        for _ in 0..10 {
            locomotion.ledge_mount_tick(&config, &mut transform, 0.1);
        }

        assert_eq!(locomotion.state, LocomotionState::Grounded);
        let rise = config.climb_speed * config.ledge_mount_speed_factor * config.ledge_mount_duration;
        assert!((transform.translation.y - (3.0 + rise)).abs() < 1e-4);
        assert!((transform.translation.z - config.ledge_forward_nudge).abs() < 1e-5);
    }
}
