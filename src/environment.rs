use bevy::prelude::*;

pub struct EnvironmentPlugin;

impl Plugin for EnvironmentPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<DayNightCycle>()
            .init_resource::<NightEnvironment>()
            .add_systems(
                Update,
                (rotate_sun, track_night, adopt_new_fixtures).chain(),
            );
    }
}

/// The sun is below the horizon for angles in (180, 360).
pub fn is_night(sun_angle: f32) -> bool {
    sun_angle > 180.0 && sun_angle < 360.0
}

/// Spins the directional light it sits on about the X axis.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct DayNightCycle {
    /// Degrees in [0, 360). 90 is noon.
    pub sun_angle: f32,
    /// Degrees per second.
    pub rotation_speed: f32,
}

impl Default for DayNightCycle {
    fn default() -> Self {
        Self {
            sun_angle: 50.0,
            rotation_speed: 3.0,
        }
    }
}

impl DayNightCycle {
    pub fn advance(&mut self, dt: f32) {
        self.sun_angle = (self.sun_angle + self.rotation_speed * dt).rem_euclid(360.0);
    }

    /// Light orientation for the current angle; it points down during the day.
    pub fn sun_rotation(&self) -> Quat {
        Quat::from_rotation_x(-self.sun_angle.to_radians())
    }
}

/// Lights and props that only run at night, like street lamps.
#[derive(Component, Debug, Default, Clone, Copy)]
pub struct NightFixture;

/// A mesh whose material only emits light at night, like a lamp bulb.
#[derive(Component, Debug, Clone, Copy)]
pub struct NightGlow {
    pub emissive: LinearRgba,
}

impl NightGlow {
    pub fn emissive_for(&self, night: bool) -> LinearRgba {
        if night {
            self.emissive
        } else {
            LinearRgba::BLACK
        }
    }
}

#[derive(Resource, Debug, Clone)]
pub struct NightEnvironment {
    pub timer: Timer,
    /// None until the first evaluation.
    pub is_night: Option<bool>,
}

impl Default for NightEnvironment {
    fn default() -> Self {
        Self {
            timer: Timer::from_seconds(1.0, TimerMode::Repeating),
            is_night: None,
        }
    }
}

impl NightEnvironment {
    /// Returns the new state only when it differs from the last one.
    pub fn evaluate(&mut self, sun_angle: f32) -> Option<bool> {
        let night = is_night(sun_angle);
        (self.is_night.replace(night) != Some(night)).then_some(night)
    }

    pub fn night(&self) -> bool {
        self.is_night.unwrap_or(false)
    }
}

fn fixture_visibility(night: bool) -> Visibility {
    if night {
        Visibility::Inherited
    } else {
        Visibility::Hidden
    }
}

fn rotate_sun(time: Res<Time>, mut suns: Query<(&mut DayNightCycle, &mut Transform, &mut DirectionalLight)>) {
    for (mut cycle, mut transform, mut light) in &mut suns {
        cycle.advance(time.delta_secs());
        transform.rotation = cycle.sun_rotation();
        light.shadows_enabled = !is_night(cycle.sun_angle);
    }
}

fn set_glow(
    materials: &mut Assets<StandardMaterial>,
    glow: &NightGlow,
    material: &MeshMaterial3d<StandardMaterial>,
    night: bool,
) {
    if let Some(material) = materials.get_mut(&material.0) {
        material.emissive = glow.emissive_for(night);
    }
}

fn track_night(
    time: Res<Time>,
    mut environment: ResMut<NightEnvironment>,
    suns: Query<&DayNightCycle>,
    mut fixtures: Query<&mut Visibility, With<NightFixture>>,
    glows: Query<(&NightGlow, &MeshMaterial3d<StandardMaterial>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let first = environment.is_night.is_none();
    if !environment.timer.tick(time.delta()).just_finished() && !first {
        return;
    }
    let Ok(cycle) = suns.single() else {
        return;
    };
    let Some(night) = environment.evaluate(cycle.sun_angle) else {
        return;
    };

    info!("NIGHT: switching to {}", if night { "night" } else { "day" });
    for mut visibility in &mut fixtures {
        *visibility = fixture_visibility(night);
    }
    for (glow, material) in &glows {
        set_glow(&mut materials, glow, material, night);
    }
}

fn adopt_new_fixtures(
    environment: Res<NightEnvironment>,
    mut fixtures: Query<&mut Visibility, Added<NightFixture>>,
    glows: Query<(&NightGlow, &MeshMaterial3d<StandardMaterial>), Added<NightGlow>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for mut visibility in &mut fixtures {
        *visibility = fixture_visibility(environment.night());
    }
    for (glow, material) in &glows {
        set_glow(&mut materials, glow, material, environment.night());
    }
}
