//! Common ECS components used across the engine.

use glam::Vec3;

/// Velocity component for moving entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct Velocity {
    pub linear: Vec3,
}

impl Velocity {
    pub fn new(linear: Vec3) -> Self {
        Self { linear }
    }

    /// Current speed in units per second.
    pub fn speed(&self) -> f32 {
        self.linear.length()
    }
}

/// Remaining lifetime, counted in simulation ticks, for transient entities and overlays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lifetime {
    pub remaining_ticks: u32,
}

impl Lifetime {
    pub fn new(ticks: u32) -> Self {
        Self {
            remaining_ticks: ticks,
        }
    }

    /// Consume one tick. Returns true once the lifetime has run out.
    pub fn tick(&mut self) -> bool {
        self.remaining_ticks = self.remaining_ticks.saturating_sub(1);
        self.remaining_ticks == 0
    }

    pub fn is_expired(&self) -> bool {
        self.remaining_ticks == 0
    }
}
