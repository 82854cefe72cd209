//! Procedural choreography
//!
//! Randomized, constraint-satisfying changes to camera, emitter placement and
//! rotation, driven by timers:
//! - `timer`: deferred and repeating tasks advanced from the update tick
//! - `sampling`: bounded-retry candidate search
//! - `camera` / `emitters`: what a change does
//! - `sequencer`: when changes happen without an operator

pub mod camera;
pub mod emitters;
pub mod sampling;
pub mod sequencer;
pub mod timer;

use crate::input::Command;

pub use camera::{CamOutcome, CameraChoreographer, CameraConfig, CameraMode, CameraPose, PlaneMapping};
pub use emitters::{EmitterChange, EmitterChoreographer, EmitterConfig, EmitterOutcome, ViewExclusion};
pub use sampling::{Sampled, sample_bounded};
pub use sequencer::{Sequencer, SequencerConfig};
pub use timer::{Fired, Interval, Scheduler, TimerId, TimerSpec};

/// Work carried by a timer, dispatched by the session when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Sequencer view timer
    ChangeView,
    /// Sequencer emitter timer
    ChangeEmitters,
    /// One placement of a burst; `follow_up` runs after the last one
    BurstStep { follow_up: Option<Command> },
}
