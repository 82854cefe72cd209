//! Operator preferences that survive restarts
//!
//! Persisted through a `KeyValueStore` as one JSON document.

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_SPEED_INDEX, SPEED_STEPS};
use crate::error::WaveError;
use crate::persistence::KeyValueStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Index into the wave speed table
    pub speed_index: usize,
    /// Autonomous sequence was running when last saved
    pub sequence_running: bool,
    /// Last curated camera view
    pub special_view_index: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            speed_index: DEFAULT_SPEED_INDEX,
            sequence_running: true,
            special_view_index: 0,
        }
    }
}

impl Settings {
    /// Storage key
    pub const STORAGE_KEY: &'static str = "wavefield_settings";

    /// Wave speed for the stored index, clamped to the table
    pub fn wave_speed(&self) -> f32 {
        SPEED_STEPS[self.speed_index.min(SPEED_STEPS.len() - 1)]
    }

    /// Step the speed index, staying inside the table. Returns true if it moved.
    pub fn shift_speed(&mut self, offset: isize) -> bool {
        let max = SPEED_STEPS.len() as isize - 1;
        let next = (self.speed_index as isize + offset).clamp(0, max) as usize;
        let moved = next != self.speed_index;
        self.speed_index = next;
        moved
    }

    /// Load from `store`, falling back to defaults when missing or unreadable
    pub fn load(store: &dyn KeyValueStore) -> Self {
        if let Some(json) = store.get(Self::STORAGE_KEY) {
            match serde_json::from_str::<Self>(&json) {
                Ok(mut settings) => {
                    settings.speed_index = settings.speed_index.min(SPEED_STEPS.len() - 1);
                    log::info!("Loaded settings");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring stored settings: {e}"),
            }
        }
        log::info!("Using default settings");
        Self::default()
    }

    pub fn save(&self, store: &mut dyn KeyValueStore) -> Result<(), WaveError> {
        let json = serde_json::to_string(self)?;
        store.set(Self::STORAGE_KEY, &json)?;
        log::info!("Settings saved");
        Ok(())
    }
}
