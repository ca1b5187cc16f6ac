//! Spatial probe interface.
//!
//! The movement core only ever asks "does a ray from here hit anything on
//! these layers, and how far away?". In game that question is answered by
//! avian's [`SpatialQuery`]; in tests by [`testing::BoxWorld`].

use avian3d::prelude::*;
use bevy::prelude::*;

pub(crate) struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(PhysicsPlugins::default());
    }
}

/// Collision layers used by colliders and probes.
#[derive(PhysicsLayer, Clone, Copy, Debug, Default)]
pub enum GameLayer {
    #[default]
    Default,
    Ground,
    Climbable,
    Subject,
}

/// Layer filter for a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeMask {
    /// Surfaces a subject can cling to.
    Climbable,
    /// Anything that stands under a subject's feet.
    Ground,
    /// Anything that blocks horizontal motion.
    Solid,
}

impl ProbeMask {
    pub fn layers(self) -> LayerMask {
        match self {
            ProbeMask::Climbable => GameLayer::Climbable.into(),
            ProbeMask::Ground => [GameLayer::Default, GameLayer::Ground, GameLayer::Climbable].into(),
            ProbeMask::Solid => [GameLayer::Default, GameLayer::Climbable].into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeHit {
    pub distance: f32,
    pub entity: Option<Entity>,
}

pub trait SpatialProbe {
    fn probe(
        &self,
        origin: Vec3,
        direction: Dir3,
        max_distance: f32,
        mask: ProbeMask,
    ) -> Option<ProbeHit>;
}

/// Probes the avian world on behalf of one subject, never hitting itself.
pub struct AvianProbe<'a, 'w, 's> {
    pub query: &'a SpatialQuery<'w, 's>,
    pub exclude: Entity,
}

impl SpatialProbe for AvianProbe<'_, '_, '_> {
    fn probe(
        &self,
        origin: Vec3,
        direction: Dir3,
        max_distance: f32,
        mask: ProbeMask,
    ) -> Option<ProbeHit> {
        let filter = SpatialQueryFilter::from_mask(mask.layers())
            .with_excluded_entities([self.exclude]);

        self.query
            .cast_ray(origin, direction, max_distance, true, &filter)
            .map(|hit| ProbeHit {
                distance: hit.distance,
                entity: Some(hit.entity),
            })
    }
}
