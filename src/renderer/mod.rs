//! Render-facing data
//!
//! The drawing itself belongs to the host. This module supplies what a line
//! renderer needs from the simulation:
//! - packed GPU layouts (`uniforms`)
//! - height sampling with optional smoothing
//! - the displacement curve applied to sampled heights
//! - the reveal sweep that wipes the field in and out

pub mod uniforms;

pub use uniforms::{EmitterUniform, MAX_EMITTERS, SceneUniform, field_bytes, pack_emitters};

use serde::{Deserialize, Serialize};

use crate::sim::FieldCell;
use crate::{gain, inverse_lerp_clamped};

/// Shaping of sampled heights into vertical offsets
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplaceParams {
    /// Overall height multiplier
    pub height_scale: f32,
    /// Gain curve parameter; below 0.5 flattens small heights
    pub gain: f32,
    /// Absolute offset limit
    pub limit: f32,
    /// 0 samples one cell, 1 applies the full 3x3 gaussian
    pub smoothing: f32,
}

impl Default for DisplaceParams {
    fn default() -> Self {
        Self {
            height_scale: 1.0,
            gain: 0.13,
            limit: 2.0,
            smoothing: 0.0,
        }
    }
}

impl DisplaceParams {
    /// Vertical offset for a sampled height
    #[inline]
    pub fn displace(&self, h: f32) -> f32 {
        let shaped = self.height_scale * h * gain(h.abs(), self.gain);
        shaped.clamp(-self.limit, self.limit)
    }
}

const GAUSS_3X3: [[f32; 3]; 3] = [
    [0.0625, 0.125, 0.0625],
    [0.125, 0.25, 0.125],
    [0.0625, 0.125, 0.0625],
];

/// Height at (x, y) blended toward a 3x3 gaussian by `smoothing`.
/// Neighbours outside the grid clamp to the edge.
pub fn sample_height(cells: &[FieldCell], resolution: usize, x: usize, y: usize, smoothing: f32) -> f32 {
    if resolution == 0 || cells.len() < resolution * resolution {
        return 0.0;
    }
    let last = resolution - 1;
    let (x, y) = (x.min(last), y.min(last));
    let s = smoothing.clamp(0.0, 1.0);

    let mut sum = 0.0;
    for (dy, row) in GAUSS_3X3.iter().enumerate() {
        for (dx, &w) in row.iter().enumerate() {
            let identity = if dx == 1 && dy == 1 { 1.0 } else { 0.0 };
            let weight = identity + (w - identity) * s;
            if weight == 0.0 {
                continue;
            }
            let sx = (x + dx).saturating_sub(1).min(last);
            let sy = (y + dy).saturating_sub(1).min(last);
            sum += weight * cells[sy * resolution + sx].height;
        }
    }
    sum
}

/// Looping left-to-right wipe over the field
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevealSweep {
    pub enabled: bool,
    /// Loop length in seconds
    pub period: f64,
    /// Fraction of the loop spent wiping in (and again wiping out)
    pub rel_duration: f32,
    /// Softness of the wipe edge, uv
    pub edge_width: f32,
}

impl Default for RevealSweep {
    fn default() -> Self {
        Self {
            enabled: false,
            period: 3.0,
            rel_duration: 0.33,
            edge_width: 0.001,
        }
    }
}

impl RevealSweep {
    /// Visible u-range `(left, right)` at time `t`; the full plane when disabled
    pub fn window(&self, t: f64) -> (f32, f32) {
        if !self.enabled || self.period <= 0.0 {
            return (0.0, 1.0);
        }
        let phase = (t.rem_euclid(self.period) / self.period) as f32;
        let right = inverse_lerp_clamped(0.0, self.rel_duration, phase);
        let left = inverse_lerp_clamped(1.0 - self.rel_duration, 1.0, phase);
        (left, right)
    }

    /// Height multiplier for a point at `u` given the current window
    pub fn mask(&self, u: f32, (left, right): (f32, f32)) -> f32 {
        let w = self.edge_width.max(f32::EPSILON);
        smoothstep(left, left + w, u) * smoothstep(right, right - w, u)
    }
}

/// Hermite step; `edge0 > edge1` gives the falling edge
#[inline]
fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_displace_odd_and_limited() {
        let p = DisplaceParams::default();
        assert_eq!(p.displace(0.0), 0.0);
        assert!((p.displace(0.8) + p.displace(-0.8)).abs() < 1e-6);
        assert!(p.displace(0.8) > 0.0);
        assert_eq!(p.displace(50.0), p.limit);
        assert_eq!(p.displace(-50.0), -p.limit);
    }

    #[test]
    fn test_displace_flattens_small_heights() {
        let p = DisplaceParams::default();
        // gain < 0.5 pushes small magnitudes toward zero
        assert!(p.displace(0.1) < 0.1 * 0.1);
    }

    #[test]
    fn test_sample_height_smoothing() {
        let res = 3;
        let mut cells = vec![FieldCell::default(); 9];
        cells[4].height = 1.0;
        assert_eq!(sample_height(&cells, res, 1, 1, 0.0), 1.0);
        assert!((sample_height(&cells, res, 1, 1, 1.0) - 0.25).abs() < 1e-6);
        assert!((sample_height(&cells, res, 0, 0, 1.0) - 0.0625).abs() < 1e-6);
        assert_eq!(sample_height(&cells, 0, 0, 0, 1.0), 0.0);
    }

    #[test]
    fn test_sample_height_uniform_field_unchanged() {
        let cells = vec![
            FieldCell {
                height: 0.5,
                velocity: 0.0
            };
            16
        ];
        for s in [0.0, 0.5, 1.0] {
            assert!((sample_height(&cells, 4, 0, 3, s) - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn test_reveal_window() {
        let sweep = RevealSweep {
            enabled: true,
            period: 10.0,
            rel_duration: 0.5,
            edge_width: 0.01,
        };
        assert_eq!(sweep.window(0.0), (0.0, 0.0));
        let (left, right) = sweep.window(2.5);
        assert_eq!(left, 0.0);
        assert!((right - 0.5).abs() < 1e-6);
        let (left, right) = sweep.window(7.5);
        assert!((left - 0.5).abs() < 1e-6);
        assert_eq!(right, 1.0);

        let window = sweep.window(2.5);
        assert_eq!(sweep.mask(0.25, window), 1.0);
        assert_eq!(sweep.mask(0.75, window), 0.0);
        assert_eq!(RevealSweep::default().window(1.0), (0.0, 1.0));
    }
}
