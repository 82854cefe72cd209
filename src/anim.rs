//! Preemptible linear transitions of a scalar parameter
//!
//! Driven by the frame delta handed in by the caller, never a wall clock.

/// Linear interpolation of one `f32` over time
#[derive(Debug, Clone, PartialEq)]
pub struct ParamAnimator {
    value: f32,
    transition: Option<Transition>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Transition {
    from: f32,
    to: f32,
    duration: f64,
    elapsed: f64,
}

impl ParamAnimator {
    pub fn new(value: f32) -> Self {
        Self {
            value,
            transition: None,
        }
    }

    /// Live value
    pub fn value(&self) -> f32 {
        self.value
    }

    /// Target of the running transition, or the live value when idle
    pub fn target(&self) -> f32 {
        self.transition.map_or(self.value, |t| t.to)
    }

    pub fn is_active(&self) -> bool {
        self.transition.is_some()
    }

    /// Start moving toward `target`, replacing any running transition.
    /// The new transition starts from the live value; a non-positive
    /// duration jumps straight there.
    pub fn transition_to(&mut self, target: f32, duration: f64) {
        if duration <= 0.0 {
            self.value = target;
            self.transition = None;
            return;
        }
        self.transition = Some(Transition {
            from: self.value,
            to: target,
            duration,
            elapsed: 0.0,
        });
    }

    /// Advance by `dt` seconds and return the live value
    pub fn tick(&mut self, dt: f64) -> f32 {
        if let Some(t) = self.transition.as_mut() {
            t.elapsed += dt.max(0.0);
            if t.elapsed >= t.duration {
                self.value = t.to;
                self.transition = None;
            } else {
                let progress = (t.elapsed / t.duration) as f32;
                self.value = crate::lerp(t.from, t.to, progress);
            }
        }
        self.value
    }

    /// Stop where it is
    pub fn cancel(&mut self) {
        self.transition = None;
    }

    /// Jump to `value`, dropping any transition
    pub fn set(&mut self, value: f32) {
        self.value = value;
        self.transition = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_midpoint() {
        let mut anim = ParamAnimator::new(0.2);
        anim.transition_to(0.7, 5.0);
        let v = anim.tick(2.5);
        assert!((v - 0.45).abs() < 1e-6);
        assert!(anim.is_active());
    }

    #[test]
    fn test_completes_at_target() {
        let mut anim = ParamAnimator::new(0.2);
        anim.transition_to(0.7, 5.0);
        for _ in 0..10 {
            anim.tick(0.6);
        }
        assert_eq!(anim.value(), 0.7);
        assert!(!anim.is_active());
    }

    #[test]
    fn test_retarget_starts_from_live_value() {
        let mut anim = ParamAnimator::new(0.0);
        anim.transition_to(1.0, 4.0);
        anim.tick(1.0);
        assert!((anim.value() - 0.25).abs() < 1e-6);

        anim.transition_to(0.0, 1.0);
        assert!((anim.value() - 0.25).abs() < 1e-6);
        anim.tick(0.5);
        assert!((anim.value() - 0.125).abs() < 1e-6);
    }

    #[test]
    fn test_cancel_freezes() {
        let mut anim = ParamAnimator::new(0.0);
        anim.transition_to(1.0, 2.0);
        anim.tick(1.0);
        anim.cancel();
        assert_eq!(anim.tick(5.0), 0.5);
        assert_eq!(anim.target(), 0.5);
    }

    #[test]
    fn test_zero_duration_jumps() {
        let mut anim = ParamAnimator::new(0.3);
        anim.transition_to(0.6, 0.0);
        assert_eq!(anim.value(), 0.6);
        assert!(!anim.is_active());
    }
}
