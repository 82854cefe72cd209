//! Emission points
//!
//! Grid-anchored oscillating sources that drive the field height locally.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// An oscillating source in normalized grid space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmissionPoint {
    /// Position in [0, 1]², u is left-right, v is bottom-top
    pub uv: Vec2,
    /// Oscillation period in seconds
    pub period: f32,
    /// Width of the legacy on/off gate in seconds
    #[serde(default = "default_on_duration")]
    pub on_duration: f32,
}

fn default_on_duration() -> f32 {
    0.05
}

impl EmissionPoint {
    pub fn new(u: f32, v: f32, period: f32) -> Self {
        Self {
            uv: Vec2::new(u, v),
            period,
            on_duration: default_on_duration(),
        }
    }

    /// Phase within the current cycle, in [0, 1)
    #[inline]
    pub fn phase(&self, t: f64) -> f64 {
        if self.period <= 0.0 {
            return 0.0;
        }
        let period = self.period as f64;
        t.rem_euclid(period) / period
    }

    /// Sinusoidal drive value in [-1, 1]
    #[inline]
    pub fn drive(&self, t: f64) -> f32 {
        if self.period <= 0.0 {
            return 0.0;
        }
        (self.phase(t) * TAU).sin() as f32
    }

    /// Legacy square drive: 1 during the first `on_duration` of each cycle
    #[inline]
    pub fn gate(&self, t: f64) -> f32 {
        if self.period <= 0.0 {
            return 0.0;
        }
        let cycle_time = t.rem_euclid(self.period as f64);
        if cycle_time < self.on_duration as f64 { 1.0 } else { 0.0 }
    }
}

impl Default for EmissionPoint {
    fn default() -> Self {
        Self::new(0.5, 0.5, 1.0)
    }
}
