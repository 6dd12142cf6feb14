//! The probe: a kinematic body falling down the corridor, a little faster as the run goes on.

use std::time::Duration;

use engine_core::{SimClock, Transform, Velocity};
use glam::Vec3;
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Spawn position at the start of every run.
    pub start: [f32; 3],
    /// Initial speed along -Y, in units per second.
    pub start_speed: f32,
    /// Speed added every `speedup_interval_secs`.
    pub speed_gain: f32,
    pub speedup_interval_secs: f32,
    /// Radius of the solid body; touching anything inside it ends the run.
    pub body_radius: f32,
    /// Obstacles within this radius score a near-miss.
    pub near_miss_radius: f32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            start: [0.0, -1.0, 0.0],
            start_speed: 40.0,
            speed_gain: 2.0,
            speedup_interval_secs: 5.0,
            body_radius: 1.0,
            near_miss_radius: 4.0,
        }
    }
}

/// Marker for the probe entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeBody {
    pub radius: f32,
}

#[derive(Debug)]
pub struct Probe {
    pub entity: Entity,
    speedup_interval_ticks: u64,
    ticks_since_speedup: u64,
}

impl Probe {
    /// Spawn a fresh probe at the configured start, heading down the corridor.
    pub fn spawn(world: &mut World, config: &ProbeConfig, clock: &SimClock) -> Self {
        let mut transform = Transform::from_position(Vec3::from_array(config.start));
        transform.look_along(Vec3::NEG_Y);
        let entity = world.spawn((
            transform,
            Velocity::new(Vec3::NEG_Y * config.start_speed),
            ProbeBody {
                radius: config.body_radius,
            },
        ));
        Self {
            entity,
            speedup_interval_ticks: clock
                .ticks_for(Duration::from_secs_f32(config.speedup_interval_secs.max(0.0))),
            ticks_since_speedup: 0,
        }
    }

    /// Integrate one tick of motion and apply any due speed-up.
    pub fn advance(&mut self, world: &mut World, config: &ProbeConfig, dt: f32) {
        let Ok((transform, velocity)) = world.query_one_mut::<(&mut Transform, &mut Velocity)>(self.entity)
        else {
            return;
        };
        transform.translate(velocity.linear * dt);

        self.ticks_since_speedup += 1;
        if self.ticks_since_speedup >= self.speedup_interval_ticks {
            self.ticks_since_speedup = 0;
            let speed = velocity.speed() + config.speed_gain;
            velocity.linear = velocity.linear.normalize_or_zero() * speed;
            log::debug!("Probe speed now {:.1}", speed);
        }
    }

    pub fn position(&self, world: &World) -> Option<Vec3> {
        world.get::<&Transform>(self.entity).ok().map(|t| t.position)
    }

    pub fn speed(&self, world: &World) -> f32 {
        world
            .get::<&Velocity>(self.entity)
            .map(|v| v.speed())
            .unwrap_or(0.0)
    }

    pub fn despawn(self, world: &mut World) {
        let _ = world.despawn(self.entity);
    }
}
