//! Player preferences
//!
//! Stored as one JSON blob in LocalStorage, separate from account records.
//! Native builds always start from the defaults and never write.

use serde::{Deserialize, Serialize};

/// LocalStorage key for the preferences blob
#[cfg(target_arch = "wasm32")]
const STORAGE_KEY: &str = "claw_machine_settings";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Scales every other volume, 0.0 - 1.0
    pub master_volume: f32,
    pub sfx_volume: f32,
    pub music_volume: f32,
    /// New sessions start muted
    pub muted: bool,
    /// Silence audio while the window is unfocused
    pub mute_on_blur: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            master_volume: 0.8,
            sfx_volume: 1.0,
            music_volume: 0.5,
            muted: false,
            mute_on_blur: true,
        }
    }
}

impl Settings {
    /// Effects gain after master scaling; 0 when muted
    pub fn effective_sfx(&self, muted: bool) -> f32 {
        self.scaled(self.sfx_volume, muted)
    }

    /// Music gain after master scaling; 0 when muted
    pub fn effective_music(&self, muted: bool) -> f32 {
        self.scaled(self.music_volume, muted)
    }

    fn scaled(&self, channel: f32, muted: bool) -> f32 {
        if muted {
            return 0.0;
        }
        (self.master_volume * channel).clamp(0.0, 1.0)
    }

    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let stored = storage().and_then(|s| s.get_item(STORAGE_KEY).ok().flatten());
        let Some(json) = stored else {
            log::info!("No saved settings, using defaults");
            return Self::default();
        };
        serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Discarding unreadable settings: {}", e);
            Self::default()
        })
    }

    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let Some(storage) = storage() else {
            return;
        };
        match serde_json::to_string(self) {
            Ok(json) => {
                if storage.set_item(STORAGE_KEY, &json).is_err() {
                    log::warn!("Settings not saved (storage full or blocked)");
                }
            }
            Err(e) => log::warn!("Settings not serializable: {}", e),
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {}
}

#[cfg(target_arch = "wasm32")]
fn storage() -> Option<web_sys::Storage> {
    web_sys::window()?.local_storage().ok().flatten()
}
