//! Corridor generation tunables. Deserialized from the `corridor` section of the game config.

use serde::{Deserialize, Serialize};

use crate::error::CorridorError;
use crate::obstacle::FloatConfig;
use crate::placement::PlacementPolicy;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorridorConfig {
    /// Segments appended per generate call.
    pub segments_per_burst: usize,
    /// Eviction triggers once more than this many segments are live.
    pub window_ceiling: usize,
    /// Segments kept (the newest) after an eviction.
    pub window_retain: usize,
    /// Uniform scale applied to every segment.
    pub segment_scale: f32,
    /// Segments are rotated about the extension axis by a multiple of this angle.
    pub rotation_step_degrees: f32,
    /// Number of distinct rotation multiples, `0..rotation_steps`.
    pub rotation_steps: u32,
    /// How far ahead of the probe the corridor edge must stay.
    pub lookahead_margin: f32,
    pub placement: PlacementPolicy,
    pub float: FloatConfig,
}

impl Default for CorridorConfig {
    fn default() -> Self {
        Self {
            segments_per_burst: 3,
            window_ceiling: 10,
            window_retain: 5,
            segment_scale: 5.0,
            rotation_step_degrees: 30.0,
            rotation_steps: 12,
            lookahead_margin: 500.0,
            placement: PlacementPolicy::default(),
            float: FloatConfig::default(),
        }
    }
}

impl CorridorConfig {
    pub fn validate(&self) -> Result<(), CorridorError> {
        let invalid = |msg: String| Err(CorridorError::InvalidConfig(msg));
        if self.segments_per_burst == 0 {
            return invalid("segments_per_burst must be at least 1".into());
        }
        if self.window_retain > self.window_ceiling {
            return invalid(format!(
                "window_retain ({}) exceeds window_ceiling ({})",
                self.window_retain, self.window_ceiling
            ));
        }
        if self.rotation_steps == 0 {
            return invalid("rotation_steps must be at least 1".into());
        }
        if !(self.segment_scale > 0.0) {
            return invalid(format!("segment_scale must be positive, got {}", self.segment_scale));
        }
        if self.lookahead_margin < 0.0 {
            return invalid(format!(
                "lookahead_margin must not be negative, got {}",
                self.lookahead_margin
            ));
        }
        Ok(())
    }
}
