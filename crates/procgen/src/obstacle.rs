//! Floating obstacles: idle bobbing driven purely by the tick count.

use glam::Vec3;
use hecs::World;
use serde::{Deserialize, Serialize};

use engine_core::{world_transform, Transform};
use physics::{PhysicsCollider, PhysicsWorld};

/// Tag for entities the probe can collide with and score near-misses on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Obstacle;

/// Bobbing state. The phase advances a fixed step per tick, independent of tick length.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FloatingObstacle {
    pub float_phase: f32,
}

impl FloatingObstacle {
    /// Offset to apply this tick, then advance the phase.
    ///
    /// NOTE: the phase step ignores `tick_seconds` while the amplitude scales with it,
    /// so the bobbing frequency follows the tick rate.
    pub fn step(&mut self, tick_seconds: f32, config: &FloatConfig) -> Vec3 {
        let offset = self.float_phase.sin() * tick_seconds * config.axis();
        self.float_phase += config.phase_step;
        offset
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FloatConfig {
    /// Phase advance per tick, in radians (one degree by default).
    pub phase_step: f32,
    /// Direction of displacement (not normalised; its length scales the motion).
    pub axis: [f32; 3],
}

impl Default for FloatConfig {
    fn default() -> Self {
        Self {
            phase_step: 1.0f32.to_radians(),
            axis: [1.0, 1.0, 1.0],
        }
    }
}

impl FloatConfig {
    pub fn axis(&self) -> Vec3 {
        Vec3::from_array(self.axis)
    }
}

/// Advance every floating obstacle by one tick and re-pose its collider.
pub fn update_floating_obstacles(
    world: &mut World,
    physics: &mut PhysicsWorld,
    tick_seconds: f32,
    config: &FloatConfig,
) {
    let mut moved = Vec::new();
    for (entity, (transform, float, collider)) in
        world.query_mut::<(&mut Transform, &mut FloatingObstacle, Option<&PhysicsCollider>)>()
    {
        transform.translate(float.step(tick_seconds, config));
        if let Some(collider) = collider {
            moved.push((entity, collider.0));
        }
    }

    for (entity, collider) in moved {
        if let Some(pose) = world_transform(world, entity) {
            physics.set_collider_pose(collider, &pose);
        }
    }
}
