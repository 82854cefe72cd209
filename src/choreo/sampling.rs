//! Bounded-retry constrained sampling
//!
//! Candidates are drawn until one satisfies every constraint or the retry
//! budget runs out. Constraints are expressed as a penalty: 0 means
//! satisfied, larger means further off. On exhaustion the lowest-penalty
//! candidate seen is returned with `satisfied == false` and a warning is
//! logged. Sampling never loops unboundedly and never fails.

use rand::Rng;

/// Outcome of a bounded sampling run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sampled<T> {
    pub value: T,
    /// Candidates drawn, at least 1
    pub attempts: u32,
    /// False when the budget ran out and the best candidate was used
    pub satisfied: bool,
    /// Penalty of the returned candidate
    pub penalty: f32,
}

/// Draw with `draw` until `penalty` returns 0, at most `budget` times
pub fn sample_bounded<T, R, D, P>(
    rng: &mut R,
    budget: u32,
    label: &str,
    mut draw: D,
    penalty: P,
) -> Sampled<T>
where
    R: Rng + ?Sized,
    D: FnMut(&mut R) -> T,
    P: Fn(&T) -> f32,
{
    let budget = budget.max(1);

    let first = draw(rng);
    let first_score = penalty(&first);
    if first_score <= 0.0 {
        return Sampled {
            value: first,
            attempts: 1,
            satisfied: true,
            penalty: 0.0,
        };
    }
    let (mut best, mut best_score) = (first, first_score);

    for attempt in 2..=budget {
        let candidate = draw(rng);
        let score = penalty(&candidate);
        if score <= 0.0 {
            return Sampled {
                value: candidate,
                attempts: attempt,
                satisfied: true,
                penalty: 0.0,
            };
        }
        if score < best_score {
            best = candidate;
            best_score = score;
        }
    }

    log::warn!(
        "{label}: no candidate met constraints in {budget} tries, using best (penalty {best_score:.3})"
    );
    Sampled {
        value: best,
        attempts: budget,
        satisfied: false,
        penalty: best_score,
    }
}

/// Uniform sample in `[lo, hi)`, or `lo` for an empty range
#[inline]
pub fn uniform<R: Rng + ?Sized>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Same for f64
#[inline]
pub fn uniform_f64<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Bernoulli trial that tolerates out-of-range probabilities
#[inline]
pub fn chance<R: Rng + ?Sized>(rng: &mut R, p: f64) -> bool {
    p > 0.0 && rng.random::<f64>() < p
}

/// Random direction sign
#[inline]
pub fn random_sign<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    if rng.random::<bool>() { 1.0 } else { -1.0 }
}

/// Per-call probability approximating an event every `mean_interval` seconds
/// when called every `call_period` seconds. Non-positive means disable.
#[inline]
pub fn per_call_probability(call_period: f64, mean_interval: f64) -> f64 {
    if call_period <= 0.0 || mean_interval <= 0.0 {
        return 0.0;
    }
    (call_period / mean_interval).min(1.0)
}

/// Penalty for "`value` must exceed `min`"
#[inline]
pub fn exceed(value: f32, min: f32) -> f32 {
    if value > min { 0.0 } else { (min - value).max(f32::EPSILON) }
}

/// Penalty for "`value` must not exceed `max`"
#[inline]
pub fn at_most(value: f32, max: f32) -> f32 {
    (value - max).max(0.0)
}
