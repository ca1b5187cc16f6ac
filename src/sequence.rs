//! Resumable multi-tick sequences.
//!
//! Anything that used to be a coroutine (ledge mount, emote playback, prompt
//! scale-in/out) is a [`Tween`] owned by the thing it animates and advanced
//! once per frame by the owning system. Replacing the tween cancels the old
//! one, so two sequences never write the same state in the same frame.

use bevy::prelude::*;

#[derive(Debug, Clone, Copy, PartialEq, Reflect)]
pub struct Tween {
    pub elapsed: f32,
    pub duration: f32,
}

impl Tween {
    pub fn new(duration: f32) -> Self {
        Self {
            elapsed: 0.0,
            duration: duration.max(0.0),
        }
    }

    /// Advances by `dt` seconds and returns the progress in `[0, 1]`.
    pub fn advance(&mut self, dt: f32) -> f32 {
        self.elapsed = (self.elapsed + dt.max(0.0)).min(self.duration);
        self.progress()
    }

    pub fn progress(&self) -> f32 {
        if self.duration <= f32::EPSILON {
            1.0
        } else {
            (self.elapsed / self.duration).clamp(0.0, 1.0)
        }
    }

    pub fn finished(&self) -> bool {
        self.elapsed >= self.duration
    }
}

/// Hermite smoothstep between `from` and `to`.
pub fn smoothstep(from: f32, to: f32, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    let t = t * t * (3.0 - 2.0 * t);
    from + (to - from) * t
}
