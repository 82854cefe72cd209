//! GPU-facing data layouts
//!
//! Plain `Pod` structs so hosts can upload them with `bytemuck::bytes_of` /
//! `cast_slice` straight into uniform or storage buffers.

use bytemuck::{Pod, Zeroable};

use crate::session::FrameView;
use crate::sim::{EmissionPoint, FieldCell};

/// Maximum emitters in the uniform array
pub const MAX_EMITTERS: usize = 8;

// ============================================================================
// GPU DATA STRUCTURES (must match shader)
// ============================================================================

/// Per-frame scene globals
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SceneUniform {
    pub texel_size: [f32; 2],    // offset 0, 1/resolution
    pub time: f32,               // offset 8
    pub rotation: f32,           // offset 12
    pub wave_speed: f32,         // offset 16
    pub damping: f32,            // offset 20
    pub emitter_count: u32,      // offset 24
    pub _pad: u32,               // offset 28
    pub camera_pos: [f32; 4],    // offset 32, w = tilt
    pub camera_target: [f32; 4], // offset 48, w unused
}

/// Emitter position and current drive: `[u, v, drive, period]`
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct EmitterUniform {
    pub pos_drive: [f32; 4],
}

impl EmitterUniform {
    pub fn new(point: &EmissionPoint, t: f64) -> Self {
        Self {
            pos_drive: [point.uv.x, point.uv.y, point.drive(t), point.period],
        }
    }
}

/// Fixed-size emitter array; entries past `MAX_EMITTERS` are dropped
pub fn pack_emitters(points: &[EmissionPoint], t: f64) -> [EmitterUniform; MAX_EMITTERS] {
    let mut packed = [EmitterUniform::default(); MAX_EMITTERS];
    for (slot, point) in packed.iter_mut().zip(points) {
        *slot = EmitterUniform::new(point, t);
    }
    packed
}

/// Field buffer as raw bytes (two f32 channels per cell)
pub fn field_bytes(cells: &[FieldCell]) -> &[u8] {
    bytemuck::cast_slice(cells)
}

impl SceneUniform {
    pub fn from_view(view: &FrameView<'_>) -> Self {
        let texel = 1.0 / view.resolution.max(1) as f32;
        let pose = view.camera;
        Self {
            texel_size: [texel, texel],
            time: view.sim_time as f32,
            rotation: view.rotation,
            wave_speed: view.wave_speed,
            damping: view.damping,
            emitter_count: view.emitters.len().min(MAX_EMITTERS) as u32,
            _pad: 0,
            camera_pos: pose.position.extend(pose.tilt).to_array(),
            camera_target: pose.target.extend(0.0).to_array(),
        }
    }
}
