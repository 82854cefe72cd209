//! Wave-field integration kernel
//!
//! One call advances the whole grid by one step, reading a previous buffer and
//! writing into a distinct output buffer. Two formulations exist:
//! - `IntegrationMode::Wave`: discrete wave equation, the canonical one
//! - `IntegrationMode::Legacy`: corner-weighted local average with explicit
//!   attack/decay constants (kept for the older look, parameters not shared)

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::emitter::EmissionPoint;
use crate::{bias, lerp};

/// Height and vertical velocity of one grid point
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct FieldCell {
    pub height: f32,
    pub velocity: f32,
}

/// Constants of the legacy energy-decay integrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LegacyParams {
    /// How strongly a cell is pulled toward its neighbourhood average
    pub attack: f32,
    /// Velocity retention per step
    pub decay: f32,
    /// Height retention per step
    pub energy_reduce: f32,
    /// Weight of the diagonal neighbours relative to the edge neighbours
    pub corner_effect: f32,
    /// Divisor applied to the weighted neighbour sum
    pub average_divider: f32,
}

impl Default for LegacyParams {
    fn default() -> Self {
        Self {
            attack: 1.0,
            decay: 0.999,
            energy_reduce: 0.9989,
            corner_effect: 0.75,
            average_divider: 7.0,
        }
    }
}

/// Integration formulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum IntegrationMode {
    /// `v' = (v + ∆h·c²)·damping`, `h' = h + v'`
    Wave { c: f32, damping: f32 },
    Legacy(LegacyParams),
}

impl Default for IntegrationMode {
    fn default() -> Self {
        IntegrationMode::Wave {
            c: 0.6,
            damping: 1.0,
        }
    }
}

/// Per-step simulation parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveParams {
    pub mode: IntegrationMode,
    /// Emitter falloff radius in cells
    pub point_radius: f32,
    /// Height an emitter drives toward at full swing
    pub point_effect: f32,
    /// Width of the border falloff band, normalized to the grid size
    pub border: f32,
    /// Bias applied to the border falloff curve
    pub border_bias: f32,
}

impl Default for WaveParams {
    fn default() -> Self {
        Self {
            mode: IntegrationMode::default(),
            point_radius: 4.0,
            point_effect: 3.0,
            border: 0.03,
            border_bias: 0.25,
        }
    }
}

impl WaveParams {
    /// Wave speed if running the canonical formulation
    pub fn wave_speed(&self) -> Option<f32> {
        match self.mode {
            IntegrationMode::Wave { c, .. } => Some(c),
            IntegrationMode::Legacy(_) => None,
        }
    }

    /// Set the wave speed; ignored in legacy mode
    pub fn set_wave_speed(&mut self, speed: f32) {
        if let IntegrationMode::Wave { c, .. } = &mut self.mode {
            *c = speed;
        }
    }

    pub fn damping(&self) -> Option<f32> {
        match self.mode {
            IntegrationMode::Wave { damping, .. } => Some(damping),
            IntegrationMode::Legacy(_) => None,
        }
    }

    pub fn set_damping(&mut self, value: f32) {
        if let IntegrationMode::Wave { damping, .. } = &mut self.mode {
            *damping = value;
        }
    }
}

/// Blend weight of an emitter at distance `d` (cells) from its centre
#[inline]
pub fn point_weight(d: f32, radius: f32) -> f32 {
    if radius <= 0.0 {
        return if d <= 0.5 { 1.0 } else { 0.0 };
    }
    (1.0 - d / radius).clamp(0.0, 1.0)
}

/// Height multiplier for a cell at normalized position `uv`
#[inline]
pub fn border_decay(uv: Vec2, border: f32, border_bias: f32) -> f32 {
    if border <= 0.0 {
        return 1.0;
    }
    let edge = uv.x.min(1.0 - uv.x).min(uv.y).min(1.0 - uv.y);
    let t = (edge / border).clamp(0.0, 1.0);
    bias(t, border_bias)
}

/// Advance the field one step from `read` into `write`.
///
/// Both slices must hold `resolution * resolution` cells. Neighbours outside
/// the grid sample the nearest edge cell.
pub fn step_field(
    read: &[FieldCell],
    write: &mut [FieldCell],
    resolution: usize,
    params: &WaveParams,
    emitters: &[EmissionPoint],
    t: f64,
) {
    let n = resolution;
    debug_assert_eq!(read.len(), n * n);
    debug_assert_eq!(write.len(), n * n);
    if n == 0 {
        return;
    }
    let last = n - 1;
    let inv_n = 1.0 / n as f32;

    // Emitter centre in cell units and the height it drives toward this step
    let drives: Vec<(Vec2, f32)> = emitters
        .iter()
        .map(|p| (p.uv * n as f32, p.drive(t) * params.point_effect))
        .collect();

    for y in 0..n {
        let up = (y + 1).min(last);
        let down = y.saturating_sub(1);
        for x in 0..n {
            let left = x.saturating_sub(1);
            let right = (x + 1).min(last);
            let idx = y * n + x;
            let cell = read[idx];

            let edges = read[y * n + left].height
                + read[y * n + right].height
                + read[up * n + x].height
                + read[down * n + x].height;

            let mut next = match params.mode {
                IntegrationMode::Wave { c, damping } => {
                    let laplacian = edges - 4.0 * cell.height;
                    let velocity = (cell.velocity + laplacian * c * c) * damping;
                    FieldCell {
                        height: cell.height + velocity,
                        velocity,
                    }
                }
                IntegrationMode::Legacy(p) => {
                    let corners = read[up * n + left].height
                        + read[up * n + right].height
                        + read[down * n + left].height
                        + read[down * n + right].height;
                    let average = (edges + p.corner_effect * corners) / p.average_divider;
                    let velocity = (cell.velocity + (average - cell.height) * p.attack) * p.decay;
                    FieldCell {
                        height: (cell.height + velocity) * p.energy_reduce,
                        velocity,
                    }
                }
            };

            let centre = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
            for &(pos, target) in &drives {
                let w = point_weight(centre.distance(pos), params.point_radius);
                if w > 0.0 {
                    next.height = lerp(next.height, target, w);
                }
            }

            next.height *= border_decay(centre * inv_n, params.border, params.border_bias);
            write[idx] = next;
        }
    }
}

/// Largest absolute height in a buffer
pub fn max_abs_height(cells: &[FieldCell]) -> f32 {
    cells.iter().fold(0.0, |m, c| m.max(c.height.abs()))
}

/// Sum of squared heights and velocities
pub fn energy(cells: &[FieldCell]) -> f64 {
    cells
        .iter()
        .map(|c| (c.height as f64).powi(2) + (c.velocity as f64).powi(2))
        .sum()
}
