//! Wavefield - a wave-field installation core
//!
//! Core modules:
//! - `sim`: Wave-field integration (ping-pong buffers, emitters, fixed-step clock)
//! - `choreo`: Autonomous camera/emitter choreography and the timer queue driving it
//! - `anim`: Preemptible scalar transitions
//! - `session`: Composition root owning all live state
//! - `renderer`: GPU-facing packing of field and emitter data
//! - `settings` / `persistence`: Persisted operator choices
//! - `config`, `params`, `input`: Startup configuration, live tuning, operator commands

pub mod anim;
pub mod choreo;
pub mod config;
pub mod error;
pub mod input;
pub mod params;
pub mod persistence;
pub mod renderer;
pub mod session;
pub mod settings;
pub mod sim;

pub use config::Config;
pub use error::WaveError;
pub use input::Command;
pub use session::{FrameView, Session};
pub use settings::Settings;

use glam::Vec2;

/// Installation constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Longest frame delta accepted from the host (seconds)
    pub const MAX_FRAME_DT: f64 = 0.25;

    /// Default grid resolution (cells per side)
    pub const DEFAULT_RESOLUTION: usize = 256;

    /// World-space size of the simulated plane
    pub const PLANE_EXTENT: [f32; 2] = [40.0, 40.0];

    /// Wave-speed presets selectable by the operator (c must stay below 1/sqrt(2))
    pub const SPEED_STEPS: [f32; 6] = [0.2, 0.3, 0.4, 0.5, 0.6, 0.7];
    /// Speed index used when nothing was persisted
    pub const DEFAULT_SPEED_INDEX: usize = 4;
}

/// Schlick's bias curve on [0, 1]
///
/// `bias(t, 0.5) == t`; smaller `a` bends the curve down, larger bends it up.
#[inline]
pub fn bias(t: f32, a: f32) -> f32 {
    t / ((1.0 / a - 2.0) * (1.0 - t) + 1.0)
}

/// Schlick's gain curve on [0, 1] (bias mirrored around 0.5)
#[inline]
pub fn gain(t: f32, a: f32) -> f32 {
    let k = 1.0 / a - 2.0;
    if t < 0.5 {
        t / (k * (1.0 - 2.0 * t) + 1.0)
    } else {
        (k * (1.0 - 2.0 * t) - t) / (k * (1.0 - 2.0 * t) - 1.0)
    }
}

/// Linear interpolation
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Inverse of `lerp`, clamped to [0, 1]
#[inline]
pub fn inverse_lerp_clamped(a: f32, b: f32, value: f32) -> f32 {
    if (b - a).abs() <= f32::EPSILON {
        return if value >= b { 1.0 } else { 0.0 };
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Rotate a 2D vector counter-clockwise by `angle` radians
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    let (s, c) = angle.sin_cos();
    Vec2::new(c * v.x - s * v.y, s * v.x + c * v.y)
}
