//! Fixed-timestep simulation clock.
//!
//! Everything in the corridor simulation advances in whole ticks; wall time never
//! enters the simulation, so a run is reproducible from its tick count alone.

use std::time::Duration;

/// Counts fixed simulation ticks.
#[derive(Debug, Clone)]
pub struct SimClock {
    /// Length of one tick.
    fixed_timestep: Duration,
    /// Ticks advanced since creation or the last reset.
    tick_count: u64,
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new(60.0)
    }
}

impl SimClock {
    /// Create a clock ticking at `hz` ticks per second.
    pub fn new(hz: f64) -> Self {
        let hz = if hz > 0.0 { hz } else { 60.0 };
        Self {
            fixed_timestep: Duration::from_secs_f64(1.0 / hz),
            tick_count: 0,
        }
    }

    /// Advance one tick and return the new tick number.
    pub fn advance(&mut self) -> u64 {
        self.tick_count += 1;
        self.tick_count
    }

    /// Get the fixed timestep in seconds.
    pub fn timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Ticks advanced so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Simulated time elapsed, in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        (self.fixed_timestep.as_secs_f64() * self.tick_count as f64) as f32
    }

    /// Number of ticks covering `duration`, never less than one.
    pub fn ticks_for(&self, duration: Duration) -> u64 {
        let ticks = (duration.as_secs_f64() / self.fixed_timestep.as_secs_f64()).round() as u64;
        ticks.max(1)
    }

    /// Restart counting from zero.
    pub fn reset(&mut self) {
        self.tick_count = 0;
    }
}
