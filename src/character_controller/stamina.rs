use bevy::prelude::*;

/// What a subject spent its tick doing, as far as stamina is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StaminaActivity {
    pub running: bool,
    pub climbing: bool,
    pub grounded: bool,
    /// Magnitude of the movement intent this tick.
    pub intent: f32,
}

/// Bounded resource gating running, jumping and climbing.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
pub struct Stamina {
    pub value: f32,
    pub max: f32,
    /// Drain per second while running with movement input.
    pub run_drain: f32,
    /// Drain per second while clinging to a wall.
    pub climb_drain: f32,
    /// Instant cost of a jump.
    pub jump_cost: f32,
    /// Regen per second while standing still on the ground.
    pub regen_rate: f32,
    /// Intent magnitude below which the subject counts as idle.
    pub regen_threshold: f32,
}

impl Default for Stamina {
    fn default() -> Self {
        Self {
            value: 100.0,
            max: 100.0,
            run_drain: 10.0,
            climb_drain: 15.0,
            jump_cost: 20.0,
            regen_rate: 15.0,
            regen_threshold: 0.1,
        }
    }
}

impl Stamina {
    pub fn can_act(&self) -> bool {
        self.value > 0.0
    }

    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            self.value / self.max
        }
    }

    pub fn drain(&mut self, amount: f32) {
        self.value -= amount;
        self.clamp();
    }

    pub fn drain_over(&mut self, rate: f32, dt: f32) {
        self.drain(rate * dt);
    }

    pub fn regen(&mut self, dt: f32) {
        self.value += self.regen_rate * dt;
        self.clamp();
    }

    /// Applies the per-tick drain/regen rule for `activity`.
    pub fn tick(&mut self, activity: StaminaActivity, dt: f32) {
        let moving = activity.intent >= self.regen_threshold;

        if activity.climbing {
            self.drain_over(self.climb_drain, dt);
        } else if activity.running && activity.intent > 0.0 {
            self.drain_over(self.run_drain, dt);
        } else if activity.grounded && !activity.running && !moving {
            self.regen(dt);
        }

        self.clamp();
    }

    fn clamp(&mut self) {
        self.value = self.value.clamp(0.0, self.max.max(0.0));
    }
}
