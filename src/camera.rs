use bevy::math::StableInterpolate;
use bevy::prelude::*;

use crate::character_controller::ControlSet;
use crate::character_controller::components::ControlLock;
use crate::character_controller::input::PlayerIntent;

/// Orbiting follow camera behind the controlled subject.
///
/// Angles are in degrees. The rig only ever holds a non-owning reference to
/// its target and can be pointed at another subject at any time.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct CameraRig {
    pub target: Option<Entity>,
    /// Offset from the target before yaw/pitch are applied. -Z is behind.
    pub offset: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub pitch_min: f32,
    pub pitch_max: f32,
    /// Degrees per pixel of look input.
    pub rotation_speed: f32,
    /// Decay rate of the follow lag (the lower the lazier).
    pub smooth_speed: f32,
    /// Height above the target's origin the camera looks at.
    pub look_height: f32,
    pub zoom: f32,
    pub zoom_min: f32,
    pub zoom_max: f32,
    pub zoom_speed: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            target: None,
            offset: Vec3::new(0.0, 2.0, -4.0),
            yaw: 0.0,
            pitch: 0.0,
            pitch_min: -20.0,
            pitch_max: 60.0,
            rotation_speed: 0.1,
            smooth_speed: 10.0,
            look_height: 1.5,
            zoom: 1.0,
            zoom_min: 0.5,
            zoom_max: 2.5,
            zoom_speed: 0.1,
        }
    }
}

impl CameraRig {
    pub fn apply_look(&mut self, look: Vec2) {
        // Mouse right turns the view right, which is a negative turn about +Y.
        self.yaw -= look.x * self.rotation_speed;
        self.pitch -= look.y * self.rotation_speed;
        self.pitch = self.pitch.clamp(self.pitch_min, self.pitch_max);
    }

    pub fn apply_zoom(&mut self, scroll: f32) {
        self.zoom = (self.zoom - scroll * self.zoom_speed).clamp(self.zoom_min, self.zoom_max);
    }

    pub fn orbit(&self) -> Quat {
        Quat::from_euler(
            EulerRot::YXZ,
            self.yaw.to_radians(),
            self.pitch.to_radians(),
            0.0,
        )
    }

    pub fn desired_position(&self, target: Vec3) -> Vec3 {
        target + self.orbit() * (self.offset * self.zoom)
    }

    pub fn focus(&self, target: Vec3) -> Vec3 {
        target + Vec3::Y * self.look_height
    }

    /// Points the rig at a new subject. The camera glides over from where it
    /// is; the orbit swings behind the new subject's heading.
    pub fn retarget(&mut self, target: Entity, heading: Quat) {
        self.target = Some(target);
        let (yaw, _, _) = heading.to_euler(EulerRot::YXZ);
        self.yaw = yaw.to_degrees();
    }

    /// Moves `camera` one tick closer to its spot behind `target`.
    pub fn advance(&self, camera: &mut Transform, target: Vec3, dt: f32) {
        let desired = self.desired_position(target);
        camera
            .translation
            .smooth_nudge(&desired, self.smooth_speed, dt);
        camera.look_at(self.focus(target), Vec3::Y);
    }
}

pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<CameraRig>()
            .add_systems(Startup, spawn_camera)
            .add_systems(Update, third_person_camera.in_set(ControlSet::Follow));
    }
}

pub fn spawn_camera(mut commands: Commands) {
    commands.spawn((
        Name::new("Camera"),
        Camera3d::default(),
        DistanceFog {
            color: Color::srgb_u8(43, 44, 100),
            falloff: FogFalloff::Exponential { density: 15e-3 },
            ..default()
        },
        Transform::from_xyz(0.0, 4.0, -10.0).looking_at(Vec3::new(0.0, 1.0, 0.0), Vec3::Y),
        CameraRig::default(),
    ));
}

pub fn third_person_camera(
    time: Res<Time>,
    intent: Res<PlayerIntent>,
    lock: Res<ControlLock>,
    targets: Query<&Transform, Without<CameraRig>>,
    mut camera_query: Query<(&mut Transform, &mut CameraRig)>,
) {
    let Ok((mut camera_transform, mut rig)) = camera_query.single_mut() else {
        return;
    };
    if lock.camera_locked() {
        return;
    }
    let Some(target) = rig.target else {
        return;
    };
    let Ok(target_transform) = targets.get(target) else {
        return;
    };

    rig.apply_look(intent.look);
    rig.apply_zoom(intent.scroll);
    rig.advance(&mut camera_transform, target_transform.translation, time.delta_secs());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pitch_is_clamped() {
        let mut rig = CameraRig::default();
        rig.apply_look(Vec2::new(0.0, -10_000.0));
        assert_eq!(rig.pitch, 60.0);
        rig.apply_look(Vec2::new(0.0, 10_000.0));
        assert_eq!(rig.pitch, -20.0);
    }

    #[test]
    fn yaw_accumulates_without_limit() {
        let mut rig = CameraRig::default();
        for _ in 0..10 {
            rig.apply_look(Vec2::new(500.0, 0.0));
        }
        assert!((rig.yaw + 500.0).abs() < 1e-3);
    }

    #[test]
    fn default_orbit_sits_behind_and_above() {
        let rig = CameraRig::default();
        let target = Vec3::new(3.0, 0.0, 3.0);
        assert_eq!(rig.desired_position(target), target + Vec3::new(0.0, 2.0, -4.0));
    }

    #[test]
    fn camera_converges_and_looks_above_the_target() {
        let rig = CameraRig::default();
        let target = Vec3::new(10.0, 0.0, 0.0);
        let mut camera = Transform::from_xyz(0.0, 10.0, 0.0);

        for _ in 0..300 {
            rig.advance(&mut camera, target, 1.0 / 60.0);
        }

        assert!(camera.translation.distance(rig.desired_position(target)) < 1e-3);
        let to_focus = (rig.focus(target) - camera.translation).normalize();
        assert!(camera.forward().dot(to_focus) > 0.9999);
    }

    #[test]
    fn retargeting_keeps_the_camera_where_it_is() {
        let mut rig = CameraRig::default();
        let mut camera = Transform::from_xyz(1.0, 2.0, 3.0);
        rig.retarget(Entity::from_raw(7), Quat::from_rotation_y(1.0));
        assert_eq!(rig.target, Some(Entity::from_raw(7)));
        assert!((rig.yaw - 1.0_f32.to_degrees()).abs() < 1e-3);

        let before = camera.translation;
        rig.advance(&mut camera, Vec3::new(20.0, 0.0, 0.0), 1.0 / 60.0);
        let jump = camera.translation.distance(before);
        let gap = before.distance(rig.desired_position(Vec3::new(20.0, 0.0, 0.0)));
        assert!(jump < gap * 0.5);
    }

    #[test]
    fn scroll_zoom_stays_in_range() {
        let mut rig = CameraRig::default();
        rig.apply_zoom(1_000.0);
        assert_eq!(rig.zoom, rig.zoom_min);
        rig.apply_zoom(-1_000.0);
        assert_eq!(rig.zoom, rig.zoom_max);
    }
}
