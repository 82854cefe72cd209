//! Crate error type
//!
//! Choreography never fails (it falls back and logs); the only fatal
//! condition is failing to allocate the field buffers. Storage and parse
//! errors are reported to the caller, who may ignore them.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WaveError {
    /// Field buffers could not be allocated
    #[error("failed to allocate {cells} field cells")]
    Allocation { cells: usize },

    /// Grid resolution of zero was requested
    #[error("field resolution must be non-zero")]
    ZeroResolution,

    /// A repeating interval that would fire on every frame
    #[error("{name} must be positive, got {value}")]
    NonPositiveInterval { name: &'static str, value: f64 },

    /// Parameter name not present in the registry
    #[error("unknown parameter `{0}`")]
    UnknownParam(String),

    /// Settings store could not be written
    #[error("storage: {0}")]
    Io(#[from] std::io::Error),

    /// Config or settings payload could not be (de)serialized
    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),
}
