//! Emitter choreography
//!
//! Repositions the emission points: one on the left half of the grid, one on
//! the right, both kept inside configurable margins. Placements can be asked
//! to keep clear of the camera's view centre. A burst is a rapid series of
//! such placements driven by a short-interval timer.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::camera::PlaneMapping;
use super::sampling::{chance, exceed, sample_bounded, uniform};
use super::timer::{Interval, Scheduler, TimerId, TimerSpec};
use super::Task;
use crate::input::Command;
use crate::sim::EmissionPoint;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterConfig {
    /// Number of emission points, fixed for the session
    pub count: usize,
    /// Keep-out band along the left/right grid edges (uv)
    pub border_outer: f32,
    /// Keep-out band either side of the vertical centre line (uv)
    pub border_inner: f32,
    pub margin_top: f32,
    pub margin_bottom: f32,
    /// Oscillation period range, seconds
    pub period_range: [f32; 2],
    /// Chance the second point gets its own period
    pub out_of_phase_probability: f64,
    /// Chance a routine change becomes a burst
    pub burst_probability: f64,
    /// Placements per burst
    pub burst_count: [u32; 2],
    /// Delay between burst placements, seconds
    pub burst_interval: [f64; 2],
    pub retry_budget: u32,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            count: 2,
            border_outer: 0.1,
            border_inner: 0.05,
            margin_top: 0.2,
            margin_bottom: 0.2,
            period_range: [0.6, 2.0],
            out_of_phase_probability: 0.15,
            burst_probability: 0.1,
            burst_count: [6, 14],
            burst_interval: [0.04, 0.3],
            retry_budget: 50,
        }
    }
}

impl EmitterConfig {
    /// Starting layout: points spread left/right of centre, one shared period
    pub fn initial_points(&self) -> Vec<EmissionPoint> {
        (0..self.count)
            .map(|i| {
                let u = if i % 2 == 0 { 0.35 } else { 0.65 };
                EmissionPoint::new(u, 0.5, 1.0)
            })
            .collect()
    }
}

/// Region around the camera view centre that placements keep out of
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewExclusion {
    /// View centre in world space
    pub center: Vec2,
    pub radius: f32,
    pub mapping: PlaneMapping,
}

/// Result of one placement pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmitterOutcome {
    pub placed: usize,
    /// Points that used the best candidate after the retry budget ran out
    pub fallbacks: usize,
    pub out_of_phase: bool,
}

/// What `randomize_emitters` decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmitterChange {
    Placed(EmitterOutcome),
    Burst { count: u32 },
}

#[derive(Debug, Clone)]
pub struct EmitterChoreographer {
    config: EmitterConfig,
    active_burst: Option<TimerId>,
}

impl EmitterChoreographer {
    pub fn new(config: EmitterConfig) -> Self {
        Self {
            config,
            active_burst: None,
        }
    }

    pub fn config(&self) -> &EmitterConfig {
        &self.config
    }

    /// Burst timer still running
    pub fn is_bursting(&self, scheduler: &Scheduler<Task>) -> bool {
        self.active_burst.is_some_and(|id| scheduler.is_active(id))
    }

    /// Place every point once.
    ///
    /// Even indices go left of centre, odd indices right. With `avoid` each
    /// point is resampled until it is farther than the exclusion radius from
    /// the view centre (bounded retries, best candidate on exhaustion).
    pub fn randomize_emitters_once<R: Rng + ?Sized>(
        &self,
        emitters: &mut [EmissionPoint],
        avoid: Option<&ViewExclusion>,
        rng: &mut R,
    ) -> EmitterOutcome {
        if emitters.is_empty() {
            return EmitterOutcome::default();
        }
        let cfg = &self.config;
        let v_range = (cfg.margin_bottom, 1.0 - cfg.margin_top);
        let left = (cfg.border_outer, 0.5 - cfg.border_inner);
        let right = (0.5 + cfg.border_inner, 1.0 - cfg.border_outer);

        let mut outcome = EmitterOutcome::default();
        for (i, point) in emitters.iter_mut().enumerate() {
            let (u_lo, u_hi) = if i % 2 == 0 { left } else { right };
            let sampled = sample_bounded(
                rng,
                cfg.retry_budget,
                "emitter placement",
                |r| Vec2::new(uniform(r, u_lo, u_hi), uniform(r, v_range.0, v_range.1)),
                |uv| match avoid {
                    Some(view) => exceed(
                        view.mapping.uv_to_world(*uv).distance(view.center),
                        view.radius,
                    ),
                    None => 0.0,
                },
            );
            point.uv = sampled.value;
            outcome.placed += 1;
            if !sampled.satisfied {
                outcome.fallbacks += 1;
            }
        }

        let [p_lo, p_hi] = cfg.period_range;
        let period = uniform(rng, p_lo, p_hi);
        for point in emitters.iter_mut() {
            point.period = period;
        }
        if emitters.len() > 1 && chance(rng, cfg.out_of_phase_probability) {
            emitters[1].period = uniform(rng, p_lo, p_hi);
            outcome.out_of_phase = true;
        }

        log::debug!(
            "emitters: {} placed, period {period:.2}s{}",
            outcome.placed,
            if outcome.out_of_phase { ", out of phase" } else { "" }
        );
        outcome
    }

    /// Schedule `count` view-avoiding placements at short random intervals.
    ///
    /// A burst already in flight is replaced. `follow_up` is dispatched after
    /// the final placement.
    pub fn randomize_emitters_burst(
        &mut self,
        scheduler: &mut Scheduler<Task>,
        count: u32,
        follow_up: Option<Command>,
    ) -> Option<TimerId> {
        if let Some(previous) = self.active_burst.take() {
            scheduler.cancel(previous);
        }
        if count == 0 {
            return None;
        }
        let [min, max] = self.config.burst_interval;
        let spec = TimerSpec::every(Interval::Range { min, max }).max_fires(count);
        let id = scheduler.schedule(spec, Task::BurstStep { follow_up });
        self.active_burst = Some(id);
        log::info!("emitters: burst of {count}");
        Some(id)
    }

    /// Forget a burst once its last placement has run
    pub fn burst_finished(&mut self, id: TimerId) {
        if self.active_burst == Some(id) {
            self.active_burst = None;
        }
    }

    /// Routine change: occasionally a burst, usually a single placement
    pub fn randomize_emitters<R: Rng + ?Sized>(
        &mut self,
        emitters: &mut [EmissionPoint],
        avoid: Option<&ViewExclusion>,
        scheduler: &mut Scheduler<Task>,
        rng: &mut R,
    ) -> EmitterChange {
        if !emitters.is_empty() && chance(rng, self.config.burst_probability) {
            let [lo, hi] = self.config.burst_count;
            let count = if hi > lo { rng.random_range(lo..=hi) } else { lo };
            self.randomize_emitters_burst(scheduler, count, None);
            return EmitterChange::Burst { count };
        }
        EmitterChange::Placed(self.randomize_emitters_once(emitters, avoid, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn choreo(config: EmitterConfig) -> EmitterChoreographer {
        EmitterChoreographer::new(config)
    }

    #[test]
    fn test_no_points_is_noop() {
        let c = choreo(EmitterConfig::default());
        let mut rng = Pcg32::seed_from_u64(1);
        let outcome = c.randomize_emitters_once(&mut [], None, &mut rng);
        assert_eq!(outcome, EmitterOutcome::default());
    }

    #[test]
    fn test_left_right_and_margins() {
        let cfg = EmitterConfig::default();
        let c = choreo(cfg.clone());
        let mut rng = Pcg32::seed_from_u64(2);
        let mut points = cfg.initial_points();
        for _ in 0..200 {
            c.randomize_emitters_once(&mut points, None, &mut rng);
            let (l, r) = (points[0].uv, points[1].uv);
            assert!(l.x >= 0.1 && l.x <= 0.45);
            assert!(r.x >= 0.55 && r.x <= 0.9);
            for p in &points {
                assert!(p.uv.y >= 0.2 && p.uv.y <= 0.8);
                assert!(p.period >= 0.6 && p.period <= 2.0);
            }
        }
    }

    #[test]
    fn test_avoid_view_keeps_clear() {
        let c = choreo(EmitterConfig::default());
        let mut rng = Pcg32::seed_from_u64(3);
        let mut points = EmitterConfig::default().initial_points();
        let mapping = PlaneMapping::default();
        let view = ViewExclusion {
            center: mapping.uv_to_world(Vec2::new(0.3, 0.5)),
            radius: 6.0,
            mapping,
        };
        for _ in 0..200 {
            let outcome = c.randomize_emitters_once(&mut points, Some(&view), &mut rng);
            if outcome.fallbacks > 0 {
                continue;
            }
            for p in &points {
                assert!(mapping.uv_to_world(p.uv).distance(view.center) > view.radius);
            }
        }
    }

    #[test]
    fn test_shared_period_unless_out_of_phase() {
        let mut rng = Pcg32::seed_from_u64(4);
        let mut points = EmitterConfig::default().initial_points();

        let in_phase = choreo(EmitterConfig {
            out_of_phase_probability: 0.0,
            ..Default::default()
        });
        let outcome = in_phase.randomize_emitters_once(&mut points, None, &mut rng);
        assert!(!outcome.out_of_phase);
        assert_eq!(points[0].period, points[1].period);

        let split = choreo(EmitterConfig {
            out_of_phase_probability: 1.0,
            ..Default::default()
        });
        let outcome = split.randomize_emitters_once(&mut points, None, &mut rng);
        assert!(outcome.out_of_phase);
    }

    #[test]
    fn test_burst_fires_count_times() {
        let mut c = choreo(EmitterConfig::default());
        let mut sched = Scheduler::new(5);
        let id = c
            .randomize_emitters_burst(&mut sched, 4, Some(Command::ResetSimulation))
            .unwrap();
        assert!(c.is_bursting(&sched));
        let mut fired = Vec::new();
        for _ in 0..100 {
            sched.advance(0.05);
            while let Some(f) = sched.pop_due() {
                fired.push(f);
            }
        }
        assert_eq!(fired.len(), 4);
        assert!(fired.iter().all(|f| f.id == id));
        assert!(fired[3].last);
        assert_eq!(
            fired[3].task,
            Task::BurstStep {
                follow_up: Some(Command::ResetSimulation)
            }
        );
        c.burst_finished(id);
        assert!(!c.is_bursting(&sched));
    }

    #[test]
    fn test_new_burst_replaces_old() {
        let mut c = choreo(EmitterConfig::default());
        let mut sched = Scheduler::new(5);
        let first = c.randomize_emitters_burst(&mut sched, 10, None).unwrap();
        let second = c.randomize_emitters_burst(&mut sched, 2, None).unwrap();
        assert!(!sched.is_active(first));
        assert!(sched.is_active(second));
        assert_eq!(c.randomize_emitters_burst(&mut sched, 0, None), None);
        assert!(!sched.is_active(second));
    }

    #[test]
    fn test_routine_change_burst_or_place() {
        let mut rng = Pcg32::seed_from_u64(6);
        let mut sched = Scheduler::new(6);
        let mut points = EmitterConfig::default().initial_points();

        let mut always = choreo(EmitterConfig {
            burst_probability: 1.0,
            ..Default::default()
        });
        match always.randomize_emitters(&mut points, None, &mut sched, &mut rng) {
            EmitterChange::Burst { count } => assert!((6..=14).contains(&count)),
            other => panic!("expected burst, got {other:?}"),
        }

        let mut never = choreo(EmitterConfig {
            burst_probability: 0.0,
            ..Default::default()
        });
        assert!(matches!(
            never.randomize_emitters(&mut points, None, &mut sched, &mut rng),
            EmitterChange::Placed(_)
        ));
    }
}
