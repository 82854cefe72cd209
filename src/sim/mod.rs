//! Wave-field simulation module
//!
//! Pure numerical core, no rendering or platform dependencies:
//! - Fixed timestep only
//! - Double-buffered state, never read and written in the same pass
//! - Emission points sampled at simulation time, not wall time

pub mod clock;
pub mod emitter;
pub mod field;
pub mod pingpong;
pub mod rotation;

pub use clock::{FixedStepClock, RemainderPolicy};
pub use emitter::EmissionPoint;
pub use field::{
    FieldCell, IntegrationMode, LegacyParams, WaveParams, energy, max_abs_height, step_field,
};
pub use pingpong::{BufferRole, PingPong};
pub use rotation::Rotation;
