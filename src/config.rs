//! Installation configuration
//!
//! One serde tree read from JSON. Every level has `#[serde(default)]`, so a
//! file only needs the values it changes.

use serde::{Deserialize, Serialize};

use crate::choreo::{CameraConfig, EmitterConfig, SequencerConfig};
use crate::consts::{DEFAULT_RESOLUTION, PLANE_EXTENT, SIM_DT};
use crate::error::WaveError;
use crate::renderer::{DisplaceParams, RevealSweep};
use crate::sim::{RemainderPolicy, WaveParams};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Grid cells per side
    pub resolution: usize,
    /// Simulation step in seconds
    pub step: f64,
    pub remainder: RemainderPolicy,
    pub wave: WaveParams,
    /// World-space size of the plane
    pub plane_extent: [f32; 2],
    /// Seconds to glide between speed presets
    pub speed_transition: f64,
    /// Period used when the operator toggles rotation on
    pub manual_rotation_period: f64,
    pub camera: CameraConfig,
    pub emitters: EmitterConfig,
    pub sequencer: SequencerConfig,
    pub displace: DisplaceParams,
    pub reveal: RevealSweep,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            step: SIM_DT,
            remainder: RemainderPolicy::default(),
            wave: WaveParams::default(),
            plane_extent: PLANE_EXTENT,
            speed_transition: 5.0,
            manual_rotation_period: 900.0,
            camera: CameraConfig::default(),
            emitters: EmitterConfig::default(),
            sequencer: SequencerConfig::default(),
            displace: DisplaceParams::default(),
            reveal: RevealSweep::default(),
        }
    }
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, WaveError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, WaveError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot start with
    pub fn validate(&self) -> Result<(), WaveError> {
        if self.resolution == 0 {
            return Err(WaveError::ZeroResolution);
        }
        let [view_min, view_max] = self.sequencer.view_interval;
        let intervals = [
            ("sequencer.view_interval", view_min.min(view_max)),
            ("sequencer.emitter_interval", self.sequencer.emitter_interval),
        ];
        for (name, value) in intervals {
            if value.is_nan() || value <= 0.0 {
                return Err(WaveError::NonPositiveInterval { name, value });
            }
        }
        Ok(())
    }
}
