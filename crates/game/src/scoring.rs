//! Scoreboard: passive points for survival time, bonus points for near-misses.

use std::time::Duration;

use engine_core::{Lifetime, SimClock};
use glam::Vec3;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Passive points awarded every `interval_ms` of simulated time.
    pub points_per_interval: u64,
    pub interval_ms: u64,
    /// Bonus for passing close to an obstacle.
    pub near_miss_points: u64,
    /// How long a bonus popup stays up.
    pub popup_secs: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            points_per_interval: 1,
            interval_ms: 100,
            near_miss_points: 100,
            popup_secs: 10.0,
        }
    }
}

/// A floating "+N" marker where a bonus was earned.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    pub text: String,
    pub position: Vec3,
    pub lifetime: Lifetime,
}

#[derive(Debug)]
pub struct Scoreboard {
    config: ScoringConfig,
    points: u64,
    interval_ticks: u64,
    ticks_since_award: u64,
    popup_ticks: u32,
    popups: Vec<Popup>,
}

impl Scoreboard {
    pub fn new(config: ScoringConfig, clock: &SimClock) -> Self {
        let interval_ticks = clock.ticks_for(Duration::from_millis(config.interval_ms));
        let popup_ticks = clock
            .ticks_for(Duration::from_secs_f32(config.popup_secs.max(0.0)))
            .min(u32::MAX as u64) as u32;
        Self {
            config,
            points: 0,
            interval_ticks,
            ticks_since_award: 0,
            popup_ticks,
            popups: Vec::new(),
        }
    }

    /// Advance one tick: award survival points when due and age popups.
    pub fn tick(&mut self) {
        self.ticks_since_award += 1;
        if self.ticks_since_award >= self.interval_ticks {
            self.ticks_since_award = 0;
            self.points += self.config.points_per_interval;
        }
        self.popups.retain_mut(|popup| !popup.lifetime.tick());
    }

    /// Award the near-miss bonus and put a popup where it happened.
    pub fn award_near_miss(&mut self, position: Vec3) {
        let bonus = self.config.near_miss_points;
        self.points += bonus;
        self.popups.push(Popup {
            text: format!("+{bonus}"),
            position,
            lifetime: Lifetime::new(self.popup_ticks),
        });
    }

    pub fn points(&self) -> u64 {
        self.points
    }

    pub fn popups(&self) -> &[Popup] {
        &self.popups
    }

    pub fn reset(&mut self) {
        self.points = 0;
        self.ticks_since_award = 0;
        self.popups.clear();
    }
}
