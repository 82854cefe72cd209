//! Cooperative timer queue
//!
//! Deferred, repeatable tasks driven by the main update tick. Timers live in
//! generational slots; a time-ordered heap holds their next due time. Every
//! arm gets a fresh token, so re-armed or cancelled timers leave only stale
//! heap entries behind, which are skipped when popped.
//!
//! Guarantees:
//! - A cancelled timer never fires, even when cancelled by a task popped
//!   earlier in the same tick (liveness is checked per pop)
//! - Immediate timers fire on the next pop, deferred ones after one interval
//! - Range intervals are re-sampled at every arm
//! - `max_fires` cancels the timer after its last firing
//! - A repeating timer fires at most once per `advance`, whatever its interval

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

/// Shortest re-arm delay after a firing, so zero intervals wait for the next advance
const MIN_REARM: f64 = 1e-6;

/// Delay between firings, in seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interval {
    Fixed(f64),
    /// Uniform in `[min, max)`
    Range { min: f64, max: f64 },
}

impl Interval {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match *self {
            Interval::Fixed(secs) => secs.max(0.0),
            Interval::Range { min, max } => {
                if max > min {
                    rng.random_range(min..max).max(0.0)
                } else {
                    min.max(0.0)
                }
            }
        }
    }
}

/// How a timer fires
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimerSpec {
    pub interval: Interval,
    /// Fire on the next tick instead of waiting one interval
    pub immediate: bool,
    /// Stop after this many firings
    pub max_fires: Option<u32>,
}

impl TimerSpec {
    pub fn every(interval: Interval) -> Self {
        Self {
            interval,
            immediate: false,
            max_fires: None,
        }
    }

    pub fn immediate(mut self, immediate: bool) -> Self {
        self.immediate = immediate;
        self
    }

    pub fn max_fires(mut self, count: u32) -> Self {
        self.max_fires = Some(count);
        self
    }
}

/// Handle to a scheduled timer; goes stale once the timer ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId {
    slot: u32,
    generation: u32,
}

/// One firing handed back to the dispatcher
#[derive(Debug, Clone, PartialEq)]
pub struct Fired<T> {
    pub id: TimerId,
    pub task: T,
    /// 1-based firing count
    pub count: u32,
    /// This was the final firing of a `max_fires` timer
    pub last: bool,
}

#[derive(Debug)]
struct Timer<T> {
    spec: TimerSpec,
    task: T,
    due: f64,
    arm: u64,
    fires: u32,
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    timer: Option<Timer<T>>,
}

#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    due: f64,
    arm: u64,
    slot: u32,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    // Reversed: BinaryHeap is a max-heap, we want earliest due (then earliest arm) on top
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .total_cmp(&self.due)
            .then_with(|| other.arm.cmp(&self.arm))
    }
}

/// Time-ordered queue of cancellable tasks
#[derive(Debug)]
pub struct Scheduler<T> {
    now: f64,
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    queue: BinaryHeap<QueueEntry>,
    next_arm: u64,
    rng: Pcg32,
}

impl<T> Scheduler<T> {
    pub fn new(seed: u64) -> Self {
        Self {
            now: 0.0,
            slots: Vec::new(),
            free: Vec::new(),
            queue: BinaryHeap::new(),
            next_arm: 0,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Scheduler clock in seconds
    pub fn now(&self) -> f64 {
        self.now
    }

    /// Move the clock forward; due timers are then drained with `pop_due`
    pub fn advance(&mut self, dt: f64) {
        self.now += dt.max(0.0);
    }

    /// Number of live timers
    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.timer.is_some()).count()
    }

    pub fn schedule(&mut self, spec: TimerSpec, task: T) -> TimerId {
        let slot = match self.free.pop() {
            Some(slot) => slot,
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    timer: None,
                });
                (self.slots.len() - 1) as u32
            }
        };
        let delay = if spec.immediate {
            0.0
        } else {
            spec.interval.sample(&mut self.rng)
        };
        let arm = self.take_arm();
        let due = self.now + delay;
        let entry = &mut self.slots[slot as usize];
        entry.timer = Some(Timer {
            spec,
            task,
            due,
            arm,
            fires: 0,
        });
        self.queue.push(QueueEntry { due, arm, slot });
        log::debug!("timer {slot} armed, due in {delay:.3}s");
        TimerId {
            slot,
            generation: entry.generation,
        }
    }

    /// Cancel a timer. Returns false if it had already ended.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        if self.timer(id).is_none() {
            return false;
        }
        self.release(id.slot);
        log::debug!("timer {} cancelled", id.slot);
        true
    }

    /// Re-arm one interval from now without firing
    pub fn reset(&mut self, id: TimerId) -> bool {
        let Some(interval) = self.timer(id).map(|t| t.spec.interval) else {
            return false;
        };
        let delay = interval.sample(&mut self.rng);
        self.rearm(id.slot, self.now + delay);
        true
    }

    /// Re-arm to fire on the next pop
    pub fn trigger(&mut self, id: TimerId) -> bool {
        if self.timer(id).is_none() {
            return false;
        }
        self.rearm(id.slot, self.now);
        true
    }

    pub fn is_active(&self, id: TimerId) -> bool {
        self.timer(id).is_some()
    }

    /// Seconds until the timer next fires
    pub fn due_in(&self, id: TimerId) -> Option<f64> {
        self.timer(id).map(|t| (t.due - self.now).max(0.0))
    }

    /// Firings so far
    pub fn fire_count(&self, id: TimerId) -> Option<u32> {
        self.timer(id).map(|t| t.fires)
    }

    fn timer(&self, id: TimerId) -> Option<&Timer<T>> {
        self.slots
            .get(id.slot as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.timer.as_ref())
    }

    fn take_arm(&mut self) -> u64 {
        let arm = self.next_arm;
        self.next_arm += 1;
        arm
    }

    fn rearm(&mut self, slot: u32, due: f64) {
        let arm = self.take_arm();
        if let Some(timer) = self.slots[slot as usize].timer.as_mut() {
            timer.due = due;
            timer.arm = arm;
            self.queue.push(QueueEntry { due, arm, slot });
        }
    }

    fn release(&mut self, slot: u32) {
        let entry = &mut self.slots[slot as usize];
        entry.timer = None;
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot);
    }
}

impl<T: Clone> Scheduler<T> {
    /// Pop the next timer due at the current time, if any.
    ///
    /// Call in a loop; anything the caller cancels between pops is honoured.
    pub fn pop_due(&mut self) -> Option<Fired<T>> {
        loop {
            let top = *self.queue.peek()?;
            if top.due > self.now {
                return None;
            }
            self.queue.pop();

            let slot = &mut self.slots[top.slot as usize];
            let generation = slot.generation;
            let Some(timer) = slot.timer.as_mut() else {
                continue;
            };
            if timer.arm != top.arm {
                // superseded by a reset/trigger
                continue;
            }

            timer.fires += 1;
            let count = timer.fires;
            let last = timer.spec.max_fires.is_some_and(|max| count >= max);
            let task = timer.task.clone();
            let interval = timer.spec.interval;
            let id = TimerId {
                slot: top.slot,
                generation,
            };

            if last {
                self.release(top.slot);
            } else {
                let delay = interval.sample(&mut self.rng).max(MIN_REARM);
                self.rearm(top.slot, self.now + delay);
            }
            return Some(Fired {
                id,
                task,
                count,
                last,
            });
        }
    }
}
