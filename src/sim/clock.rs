//! Fixed-timestep accumulator
//!
//! Decouples physics stepping from display refresh. Real time is accumulated
//! every frame and converted into whole simulation steps.

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_FRAME_DT, MAX_SUBSTEPS};

/// What happens to accumulated time that doesn't make a full step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Keep the remainder for the next frame (no long-run drift)
    #[default]
    Carry,
    /// At most one step per frame, remainder dropped (legacy timing)
    Discard,
}

#[derive(Debug, Clone)]
pub struct FixedStepClock {
    step: f64,
    accumulator: f64,
    policy: RemainderPolicy,
    dropped: f64,
}

impl FixedStepClock {
    pub fn new(step: f64, policy: RemainderPolicy) -> Self {
        Self {
            step,
            accumulator: 0.0,
            policy,
            dropped: 0.0,
        }
    }

    /// Step length in seconds
    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn policy(&self) -> RemainderPolicy {
        self.policy
    }

    /// Time accumulated but not yet consumed by a step
    pub fn pending(&self) -> f64 {
        self.accumulator
    }

    /// Real time thrown away by the frame clamp or the substep cap
    pub fn dropped(&self) -> f64 {
        self.dropped
    }

    /// Feed one frame's elapsed time, returning how many steps to run
    pub fn advance(&mut self, dt: f64) -> u32 {
        if self.step <= 0.0 {
            return 0;
        }
        if dt > MAX_FRAME_DT {
            self.drop_time(dt - MAX_FRAME_DT, "frame clamp");
        }
        self.accumulator += dt.clamp(0.0, MAX_FRAME_DT);

        match self.policy {
            RemainderPolicy::Carry => {
                let mut steps = 0;
                while self.accumulator >= self.step && steps < MAX_SUBSTEPS {
                    self.accumulator -= self.step;
                    steps += 1;
                }
                // Too far behind: drop whole steps rather than spiral
                if self.accumulator >= self.step {
                    let kept = self.accumulator % self.step;
                    self.drop_time(self.accumulator - kept, "substep cap");
                    self.accumulator = kept;
                }
                steps
            }
            RemainderPolicy::Discard => {
                if self.accumulator >= self.step {
                    self.accumulator = 0.0;
                    1
                } else {
                    0
                }
            }
        }
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
    }

    fn drop_time(&mut self, secs: f64, reason: &str) {
        self.dropped += secs;
        log::debug!("clock: dropped {secs:.4}s ({reason}), {:.3}s total", self.dropped);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_carry_keeps_remainder() {
        let mut clock = FixedStepClock::new(0.125, RemainderPolicy::Carry);
        assert_eq!(clock.advance(0.1875), 1);
        assert_eq!(clock.pending(), 0.0625);
        assert_eq!(clock.advance(0.1875), 2);
        assert_eq!(clock.pending(), 0.0);
    }

    #[test]
    fn test_discard_drops_remainder() {
        let mut clock = FixedStepClock::new(0.1, RemainderPolicy::Discard);
        assert_eq!(clock.advance(0.15), 1);
        assert_eq!(clock.pending(), 0.0);
        assert_eq!(clock.advance(0.15), 1);
        assert_eq!(clock.advance(0.05), 0);
    }

    #[test]
    fn test_carry_has_no_drift_over_slow_frames() {
        let step = 1.0 / 60.0;
        let mut carry = FixedStepClock::new(step, RemainderPolicy::Carry);
        let mut discard = FixedStepClock::new(step, RemainderPolicy::Discard);
        let frame = 1.0 / 45.0;
        let (mut a, mut b) = (0, 0);
        for _ in 0..450 {
            a += carry.advance(frame);
            b += discard.advance(frame);
        }
        // 10 seconds of frames
        assert!((a as i64 - 600).abs() <= 1);
        assert!(b < 500);
    }

    #[test]
    fn test_substep_cap() {
        let mut clock = FixedStepClock::new(0.01, RemainderPolicy::Carry);
        assert_eq!(clock.advance(10.0), MAX_SUBSTEPS);
        assert!(clock.pending() < 0.01);
    }

    #[test]
    fn test_dropped_time_is_tracked() {
        let mut clock = FixedStepClock::new(0.01, RemainderPolicy::Carry);
        clock.advance(0.05);
        assert_eq!(clock.dropped(), 0.0);

        clock.advance(1.0);
        let consumed = MAX_SUBSTEPS as f64 * 0.01;
        let expected = (1.0 - MAX_FRAME_DT) + (MAX_FRAME_DT - consumed - clock.pending());
        assert!((clock.dropped() - expected).abs() < 1e-9);
    }
}
