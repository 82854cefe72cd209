//! Scene rotation
//!
//! A signed period in seconds: the sign picks the direction, zero disables.
//! Phase is kept as elapsed time modulo the period (f64) so a full revolution
//! lands back on the starting angle even after many small increments.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Seconds per revolution, negative for clockwise, 0 = stopped
    period: f64,
    /// Angle the rotation started from
    base: f64,
    /// Seconds into the current revolution
    elapsed: f64,
}

impl Rotation {
    pub fn period(&self) -> f64 {
        self.period
    }

    pub fn is_enabled(&self) -> bool {
        self.period != 0.0
    }

    /// Current scene angle in [0, 2π)
    pub fn angle(&self) -> f32 {
        let turn = if self.period == 0.0 {
            0.0
        } else {
            self.elapsed / self.period.abs() * self.period.signum()
        };
        (self.base + turn * TAU).rem_euclid(TAU) as f32
    }

    /// Enable, reverse or disable continuous rotation.
    ///
    /// The current angle is kept so toggling never jumps the scene.
    pub fn toggle(&mut self, enabled: bool, period: f64, reverse: bool) {
        let angle = self.angle() as f64;
        self.base = angle;
        self.elapsed = 0.0;
        self.period = if enabled && period != 0.0 {
            let magnitude = period.abs();
            if reverse { -magnitude } else { magnitude }
        } else {
            0.0
        };
    }

    /// Set a signed period directly (sign = direction)
    pub fn set_period(&mut self, period: f64) {
        self.toggle(period != 0.0, period, period < 0.0);
    }

    pub fn disable(&mut self) {
        self.toggle(false, 0.0, false);
    }

    /// Advance by real time
    pub fn advance(&mut self, dt: f64) {
        if self.period == 0.0 {
            return;
        }
        self.elapsed = (self.elapsed + dt).rem_euclid(self.period.abs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn angular_distance(a: f32, b: f32) -> f32 {
        let d = (a - b).rem_euclid(std::f32::consts::TAU);
        d.min(std::f32::consts::TAU - d)
    }

    #[test]
    fn test_full_revolution_returns_to_start() {
        let mut rot = Rotation::default();
        rot.toggle(true, 900.0, false);
        let start = rot.angle();
        let dt = 1.0 / 60.0;
        for _ in 0..(900 * 60) {
            rot.advance(dt);
        }
        assert!(angular_distance(rot.angle(), start) < 1e-4);
    }

    #[test]
    fn test_direction_follows_sign() {
        let mut fwd = Rotation::default();
        fwd.toggle(true, 100.0, false);
        fwd.advance(25.0);
        assert!((fwd.angle() - std::f32::consts::FRAC_PI_2).abs() < 1e-5);

        let mut rev = Rotation::default();
        rev.toggle(true, 100.0, true);
        assert!(rev.period() < 0.0);
        rev.advance(25.0);
        assert!((rev.angle() - 3.0 * std::f32::consts::FRAC_PI_2).abs() < 1e-5);
    }

    #[test]
    fn test_disable_freezes_angle() {
        let mut rot = Rotation::default();
        rot.set_period(40.0);
        rot.advance(10.0);
        let angle = rot.angle();
        rot.disable();
        assert!(!rot.is_enabled());
        rot.advance(10.0);
        assert_eq!(rot.angle(), angle);
    }
}
