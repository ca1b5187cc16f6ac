//! Per-tick locomotion: grounded movement, jumping, gravity, falling, and the
//! hand-off into and out of climbing.

use bevy::prelude::*;
use rand::Rng;

use super::climb::facing;
use super::components::{Locomotion, LocomotionConfig, LocomotionState};
use super::input::MoveIntent;
use super::stamina::{Stamina, StaminaActivity};
use crate::animation::{AnimationParams, AnimationTrigger};
use crate::probe::{ProbeMask, SpatialProbe};

/// Ground-plane directions the movement axis is expressed in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveBasis {
    pub forward: Vec3,
    pub right: Vec3,
}

impl Default for MoveBasis {
    fn default() -> Self {
        Self {
            forward: Vec3::Z,
            right: Vec3::NEG_X,
        }
    }
}

impl MoveBasis {
    /// Flattens a camera's orientation onto the ground plane.
    pub fn from_camera(camera: &Transform) -> Self {
        let flat = |v: Vec3| Vec3::new(v.x, 0.0, v.z).normalize_or_zero();
        Self {
            forward: flat(*camera.forward()),
            right: flat(*camera.right()),
        }
    }

    pub fn world_move(&self, axis: Vec2) -> Vec3 {
        self.right * axis.x + self.forward * axis.y
    }
}

#[derive(Debug, Clone, Copy)]
pub struct StepInput {
    pub intent: MoveIntent,
    pub basis: MoveBasis,
    /// A menu currently owns the player's input.
    pub locked: bool,
    pub dt: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutput {
    pub animation: AnimationParams,
    pub trigger: Option<AnimationTrigger>,
}

impl Locomotion {
    /// Advances one subject by one tick.
    ///
    /// Ground contact is read from the previous [`Locomotion::resolve_ground`]
    /// and re-established by the caller after the move has been applied.
    pub fn step<R: Rng + ?Sized>(
        &mut self,
        config: &LocomotionConfig,
        stamina: &mut Stamina,
        transform: &mut Transform,
        input: &StepInput,
        probe: &impl SpatialProbe,
        rng: &mut R,
    ) -> StepOutput {
        let dt = input.dt;
        let allowed = self.allow_movement && !input.locked;
        let intent = if allowed { input.intent } else { MoveIntent::default() };

        match self.state {
            LocomotionState::LedgeMount(_) => {
                self.ledge_mount_tick(config, transform, dt);
                return self.output(0.0, false, 1.0, None);
            }
            LocomotionState::Climbing => {
                let rate = self.climb_tick(config, stamina, transform, &intent, probe, dt);
                if self.is_climbing() {
                    stamina.tick(
                        StaminaActivity {
                            climbing: true,
                            intent: intent.axis.length(),
                            ..default()
                        },
                        dt,
                    );
                    return self.output(0.0, false, rate, None);
                }
            }
            LocomotionState::Grounded | LocomotionState::Airborne => {}
        }

        if self.grounded && self.vertical_velocity < 0.0 {
            self.vertical_velocity = config.grounded_stick_velocity;
        }

        let movement = input.basis.world_move(intent.axis);
        let moving = movement.length() >= config.move_threshold;
        if moving {
            let target = Quat::from_rotation_y(f32::atan2(movement.x, movement.z));
            let t = (config.rotation_rate * dt).min(1.0);
            transform.rotation = transform.rotation.slerp(target, t);
        }

        let running = intent.run && stamina.can_act();
        let speed = if running { config.run_speed } else { config.walk_speed };
        let horizontal = movement.normalize_or_zero() * speed * dt;
        if !self.blocked(config, transform, horizontal, probe) {
            transform.translation += horizontal;
        }

        let trigger = if intent.jump {
            self.try_jump(config, stamina, rng)
        } else {
            None
        };

        if trigger.is_none() && self.try_start_climb(config, stamina, transform, &intent, probe) {
            return self.output(0.0, false, 1.0, None);
        }

        self.vertical_velocity += config.gravity * dt;
        transform.translation.y += self.vertical_velocity * dt;

        self.track_fall(config, transform.translation.y);

        stamina.tick(
            StaminaActivity {
                running: intent.run,
                climbing: false,
                grounded: self.grounded,
                intent: intent.axis.length(),
            },
            dt,
        );

        let speed_param = movement.length() * if running { 1.0 } else { 0.5 };
        self.output(speed_param, running, 1.0, trigger)
    }

    /// Launches a jump if the subject stands on ground with stamina left.
    pub fn try_jump<R: Rng + ?Sized>(
        &mut self,
        config: &LocomotionConfig,
        stamina: &mut Stamina,
        rng: &mut R,
    ) -> Option<AnimationTrigger> {
        if !self.allow_movement || !self.grounded || self.is_climbing() || !stamina.can_act() {
            return None;
        }

        self.vertical_velocity = (config.jump_height * -2.0 * config.gravity).sqrt();
        self.grounded = false;
        self.state = LocomotionState::Airborne;
        stamina.drain(stamina.jump_cost);

        Some(if rng.gen_bool(0.5) {
            AnimationTrigger::Jump1
        } else {
            AnimationTrigger::Jump2
        })
    }

    /// Snaps the feet onto ground under them and records contact.
    ///
    /// `previous_y` is the feet height before this tick's move. The probe
    /// starts above whichever is higher and reaches past the current feet, so
    /// a long frame cannot carry the subject through a thin floor.
    pub fn resolve_ground(
        &mut self,
        config: &LocomotionConfig,
        transform: &mut Transform,
        previous_y: f32,
        probe: &impl SpatialProbe,
    ) {
        if matches!(self.state, LocomotionState::LedgeMount(_)) {
            self.grounded = false;
            return;
        }

        let feet = transform.translation;
        let origin = Vec3::new(feet.x, feet.y.max(previous_y), feet.z)
            + Vec3::Y * config.ground_probe_height;
        let reach = origin.y - feet.y + config.ground_snap_distance;
        let hit = probe.probe(origin, Dir3::NEG_Y, reach, ProbeMask::Ground);

        let contact = hit.filter(|_| self.vertical_velocity <= 0.0);
        self.grounded = contact.is_some();

        // A climber leaving the floor must not be pulled back onto it.
        if let Some(hit) = contact {
            if self.state != LocomotionState::Climbing {
                transform.translation.y = origin.y - hit.distance;
            }
        }

        match self.state {
            LocomotionState::Grounded | LocomotionState::Airborne => {
                self.state = if self.grounded {
                    LocomotionState::Grounded
                } else {
                    LocomotionState::Airborne
                };
            }
            _ => {}
        }

        if self.grounded {
            self.fall_mark = None;
            self.falling = false;
        }
    }

    fn blocked(
        &self,
        config: &LocomotionConfig,
        transform: &Transform,
        horizontal: Vec3,
        probe: &impl SpatialProbe,
    ) -> bool {
        let Ok(direction) = Dir3::new(horizontal) else {
            return false;
        };
        // Knee height, so the ground itself never blocks.
        let origin = transform.translation + Vec3::Y * config.ground_probe_height;
        probe
            .probe(
                origin,
                direction,
                horizontal.length() + config.body_radius,
                ProbeMask::Solid,
            )
            .is_some()
    }

    fn track_fall(&mut self, config: &LocomotionConfig, y: f32) {
        if self.grounded || self.is_climbing() {
            self.fall_mark = None;
            self.falling = false;
            return;
        }

        if self.fall_mark.is_none() && self.vertical_velocity < config.fall_mark_velocity {
            self.fall_mark = Some(y);
        }

        if let Some(mark) = self.fall_mark {
            if mark - y > config.fall_threshold {
                self.falling = true;
            }
        }
    }

    fn output(
        &self,
        speed: f32,
        running: bool,
        playback_rate: f32,
        trigger: Option<AnimationTrigger>,
    ) -> StepOutput {
        StepOutput {
            animation: AnimationParams {
                speed,
                is_grounded: self.grounded,
                is_running: running,
                is_falling: self.falling,
                is_climbing: self.is_climbing(),
                is_emoting: false,
                playback_rate,
            },
            trigger,
        }
    }

    /// Direction the subject faces on the ground plane.
    pub fn heading(transform: &Transform) -> Dir3 {
        facing(transform)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::testing::BoxWorld;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    const DT: f32 = 1.0 / 60.0;

    fn controlled() -> Locomotion {
        Locomotion {
            allow_movement: true,
            ..default()
        }
    }

    fn input(intent: MoveIntent) -> StepInput {
        StepInput {
            intent,
            basis: MoveBasis::default(),
            locked: false,
            dt: DT,
        }
    }

    fn tick(
        locomotion: &mut Locomotion,
        stamina: &mut Stamina,
        transform: &mut Transform,
        step_input: &StepInput,
        world: &BoxWorld,
        rng: &mut StdRng,
    ) -> StepOutput {
        let config = LocomotionConfig::default();
        let previous_y = transform.translation.y;
        let out = locomotion.step(&config, stamina, transform, step_input, world, rng);
        locomotion.resolve_ground(&config, transform, previous_y, world);
        out
    }

    #[test]
    fn jump_sets_projectile_velocity_and_costs_stamina() {
        let config = LocomotionConfig {
            jump_height: 1.0,
            ..default()
        };
        let mut stamina = Stamina {
            value: 50.0,
            jump_cost: 20.0,
            ..default()
        };
        let mut locomotion = controlled();
        let mut rng = StdRng::seed_from_u64(7);

        let trigger = locomotion.try_jump(&config, &mut stamina, &mut rng);

        assert!(matches!(trigger, Some(AnimationTrigger::Jump1 | AnimationTrigger::Jump2)));
        assert_eq!(stamina.value, 30.0);
        assert_eq!(locomotion.vertical_velocity, (2.0_f32 * 1.0 * 9.81).sqrt());
        assert_eq!(locomotion.state, LocomotionState::Airborne);
    }

    #[test]
    fn jump_is_denied_without_ground_stamina_or_control() {
        let config = LocomotionConfig::default();
        let mut rng = StdRng::seed_from_u64(1);

        let mut airborne = Locomotion {
            grounded: false,
            ..controlled()
        };
        assert!(airborne.try_jump(&config, &mut Stamina::default(), &mut rng).is_none());

        let mut tired = Stamina { value: 0.0, ..default() };
        assert!(controlled().try_jump(&config, &mut tired, &mut rng).is_none());

        let mut locked = Locomotion::default();
        let mut stamina = Stamina::default();
        assert!(locked.try_jump(&config, &mut stamina, &mut rng).is_none());
        assert_eq!(stamina.value, stamina.max);
        assert_eq!(locked.vertical_velocity, 0.0);
    }

    #[test]
    fn both_jump_variants_are_chosen() {
        let config = LocomotionConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        let mut seen = (false, false);
        for _ in 0..64 {
            let mut locomotion = controlled();
            match locomotion.try_jump(&config, &mut Stamina::default(), &mut rng) {
                Some(AnimationTrigger::Jump1) => seen.0 = true,
                Some(AnimationTrigger::Jump2) => seen.1 = true,
                other => panic!("unexpected trigger {other:?}"),
            }
        }
        assert_eq!(seen, (true, true));
    }

    #[test]
    fn step_jump_then_gravity_brings_the_subject_back_down() {
        let world = BoxWorld::default().with_floor(0.0);
        let mut locomotion = controlled();
        let mut stamina = Stamina::default();
        let mut transform = Transform::default();
        let mut rng = StdRng::seed_from_u64(3);

        let jump = MoveIntent { jump: true, ..default() };
        let out = tick(&mut locomotion, &mut stamina, &mut transform, &input(jump), &world, &mut rng);
        assert!(out.trigger.is_some());
        assert!(!locomotion.grounded);

        let mut peak: f32 = 0.0;
        for _ in 0..180 {
            tick(&mut locomotion, &mut stamina, &mut transform, &input(default()), &world, &mut rng);
            peak = peak.max(transform.translation.y);
        }

        let config = LocomotionConfig::default();
        assert!((peak - config.jump_height).abs() < 0.15, "peak {peak}");
        assert!(locomotion.grounded);
        assert_eq!(locomotion.state, LocomotionState::Grounded);
        assert!(transform.translation.y.abs() < 1e-4);
    }

    #[test]
    fn running_moves_faster_and_drains_stamina() {
        let world = BoxWorld::default().with_floor(0.0);
        let mut rng = StdRng::seed_from_u64(0);

        let mut walk = Transform::default();
        let mut walker = controlled();
        let mut walker_stamina = Stamina::default();
        let forward = MoveIntent { axis: Vec2::Y, ..default() };

        let mut run = Transform::default();
        let mut runner = controlled();
        let mut runner_stamina = Stamina::default();
        let sprint = MoveIntent { run: true, ..forward };

        for _ in 0..60 {
            tick(&mut walker, &mut walker_stamina, &mut walk, &input(forward), &world, &mut rng);
            tick(&mut runner, &mut runner_stamina, &mut run, &input(sprint), &world, &mut rng);
        }

        assert!((walk.translation.z - 5.0).abs() < 0.05, "{}", walk.translation.z);
        assert!((run.translation.z - 8.0).abs() < 0.05, "{}", run.translation.z);
        assert_eq!(walker_stamina.value, walker_stamina.max);
        assert!((runner_stamina.value - 90.0).abs() < 0.05);
    }

    #[test]
    fn exhausted_runner_falls_back_to_walking() {
        let world = BoxWorld::default().with_floor(0.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut locomotion = controlled();
        let mut stamina = Stamina { value: 0.0, ..default() };
        let mut transform = Transform::default();
        let sprint = MoveIntent {
            axis: Vec2::Y,
            run: true,
            ..default()
        };

        let out = tick(&mut locomotion, &mut stamina, &mut transform, &input(sprint), &world, &mut rng);

        assert!(!out.animation.is_running);
        assert!((transform.translation.z - 5.0 * DT).abs() < 1e-5);
    }

    #[test]
    fn heading_turns_toward_the_move_direction() {
        let world = BoxWorld::default().with_floor(0.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut locomotion = controlled();
        let mut stamina = Stamina::default();
        let mut transform = Transform::default();
        // Default basis maps +x on the stick to world -X.
        let strafe = MoveIntent { axis: Vec2::X, ..default() };

        for _ in 0..120 {
            tick(&mut locomotion, &mut stamina, &mut transform, &input(strafe), &world, &mut rng);
        }

        let heading = Locomotion::heading(&transform);
        assert!(heading.dot(Vec3::NEG_X) > 0.999, "{heading:?}");
    }

    #[test]
    fn locked_subject_ignores_input_and_idles() {
        let world = BoxWorld::default().with_floor(0.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut locomotion = Locomotion::default();
        let mut stamina = Stamina::default();
        let mut transform = Transform::default();
        let everything = MoveIntent {
            axis: Vec2::Y,
            run: true,
            jump: true,
            climb: true,
        };

        for _ in 0..30 {
            let out = tick(&mut locomotion, &mut stamina, &mut transform, &input(everything), &world, &mut rng);
            assert_eq!(out.animation.speed, 0.0);
            assert!(out.trigger.is_none());
        }

        assert_eq!(transform.translation, Vec3::ZERO);
        assert_eq!(stamina.value, stamina.max);

        let mut menu = controlled();
        let locked_input = StepInput { locked: true, ..input(everything) };
        let out = tick(&mut menu, &mut stamina, &mut transform, &locked_input, &world, &mut rng);
        assert_eq!(out.animation.speed, 0.0);
        assert_eq!(transform.translation, Vec3::ZERO);
    }

    #[test]
    fn long_drop_marks_the_subject_as_falling() {
        let world = BoxWorld::default().with_floor(-20.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut locomotion = Locomotion {
            grounded: false,
            state: LocomotionState::Airborne,
            ..controlled()
        };
        let mut stamina = Stamina::default();
        let mut transform = Transform::default();

        let mut falling_seen = false;
        for _ in 0..240 {
            tick(&mut locomotion, &mut stamina, &mut transform, &input(default()), &world, &mut rng);
            falling_seen |= locomotion.falling;
        }

        assert!(falling_seen);
        assert!(locomotion.grounded);
        assert!(!locomotion.falling);
        assert!(locomotion.fall_mark.is_none());
    }

    #[test]
    fn short_hop_never_counts_as_falling() {
        let world = BoxWorld::default().with_floor(0.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut locomotion = controlled();
        let mut stamina = Stamina::default();
        let mut transform = Transform::default();

        let config = LocomotionConfig::default();
        assert!(config.jump_height <= config.fall_threshold);

        let jump = MoveIntent { jump: true, ..default() };
        tick(&mut locomotion, &mut stamina, &mut transform, &input(jump), &world, &mut rng);
        for _ in 0..120 {
            tick(&mut locomotion, &mut stamina, &mut transform, &input(default()), &world, &mut rng);
            assert!(!locomotion.falling);
        }
    }

    #[test]
    fn long_frame_does_not_sink_through_a_thin_floor() {
        let world = BoxWorld::default().with_box(
            Vec3::new(0.0, -0.1, 0.0),
            Vec3::new(50.0, 0.2, 50.0),
            &[ProbeMask::Ground, ProbeMask::Solid],
        );
        let config = LocomotionConfig::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut locomotion = controlled();
        let mut stamina = Stamina::default();
        let mut transform = Transform::default();

        tick(&mut locomotion, &mut stamina, &mut transform, &input(default()), &world, &mut rng);
        assert!(locomotion.grounded);

        for _ in 0..8 {
            let slow = StepInput { dt: 0.25, ..input(default()) };
            let previous_y = transform.translation.y;
            locomotion.step(&config, &mut stamina, &mut transform, &slow, &world, &mut rng);
            locomotion.resolve_ground(&config, &mut transform, previous_y, &world);

            assert!(locomotion.grounded);
            assert_eq!(locomotion.state, LocomotionState::Grounded);
            assert!(transform.translation.y.abs() < 1e-4, "{}", transform.translation.y);
        }
    }

    #[test]
    fn fast_fall_lands_on_a_thin_floor() {
        let world = BoxWorld::default().with_box(
            Vec3::new(0.0, -0.1, 0.0),
            Vec3::new(50.0, 0.2, 50.0),
            &[ProbeMask::Ground, ProbeMask::Solid],
        );
        let config = LocomotionConfig::default();
        let mut rng = StdRng::seed_from_u64(0);
        let mut locomotion = Locomotion {
            grounded: false,
            state: LocomotionState::Airborne,
            ..controlled()
        };
        let mut stamina = Stamina::default();
        let mut transform = Transform::from_xyz(0.0, 60.0, 0.0);

        for _ in 0..40 {
            let slow = StepInput { dt: 0.25, ..input(default()) };
            let previous_y = transform.translation.y;
            locomotion.step(&config, &mut stamina, &mut transform, &slow, &world, &mut rng);
            locomotion.resolve_ground(&config, &mut transform, previous_y, &world);
        }

        assert!(locomotion.grounded);
        assert!(transform.translation.y.abs() < 1e-4, "{}", transform.translation.y);
    }

    #[test]
    fn walls_block_horizontal_motion() {
        let world = BoxWorld::default().with_floor(0.0).with_box(
            Vec3::new(0.0, 1.0, 1.0),
            Vec3::new(4.0, 2.0, 0.5),
            &[ProbeMask::Solid],
        );
        let mut rng = StdRng::seed_from_u64(0);
        let mut locomotion = controlled();
        let mut stamina = Stamina::default();
        let mut transform = Transform::default();
        let forward = MoveIntent { axis: Vec2::Y, ..default() };

        for _ in 0..120 {
            tick(&mut locomotion, &mut stamina, &mut transform, &input(forward), &world, &mut rng);
        }

        assert!(transform.translation.z < 0.75);
    }

    #[test]
    fn climbing_up_a_wall_ends_standing_on_top() {
        let config = LocomotionConfig::default();
        let world = BoxWorld::default().with_floor(0.0).with_box(
            Vec3::new(0.0, 1.5, 1.0),
            Vec3::new(4.0, 3.0, 1.0),
            &[ProbeMask::Climbable, ProbeMask::Solid, ProbeMask::Ground],
        );
        let mut rng = StdRng::seed_from_u64(0);
        let mut locomotion = controlled();
        let mut stamina = Stamina::default();
        let mut transform = Transform::default();
        let climb = MoveIntent {
            axis: Vec2::Y,
            climb: true,
            ..default()
        };

        let mut climbed = false;
        let mut mounted = false;
        for frame in 0..400 {
            // Input noise mid-climb must not break the pull-up.
            let step_input = if mounted && frame % 2 == 0 {
                input(MoveIntent { axis: Vec2::NEG_Y, jump: true, ..default() })
            } else {
                input(climb)
            };
            let previous_y = transform.translation.y;
            let out = locomotion.step(&config, &mut stamina, &mut transform, &step_input, &world, &mut rng);
            climbed |= out.animation.is_climbing;
            if mounted && !locomotion.is_climbing() {
                break;
            }
            mounted |= matches!(locomotion.state, LocomotionState::LedgeMount(_));
            locomotion.resolve_ground(&config, &mut transform, previous_y, &world);
        }

        assert!(climbed);
        assert!(mounted);
        assert_eq!(locomotion.state, LocomotionState::Grounded);
        assert!(!locomotion.is_climbing());
        assert!(transform.translation.y > 3.0, "{}", transform.translation.y);
        assert!(stamina.value < stamina.max);
    }
}
