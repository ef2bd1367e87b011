//! User settings and preferences
//!
//! Persisted separately from scenarios and replays. The simulation re-reads
//! sensitivity and theme whenever a paused scenario resumes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::{LIVE_RENDER_BUDGET_MICROS, REPLAY_RENDER_BUDGET_MICROS};
use crate::persistence;

/// User settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Aim ===
    /// Mouse resolution in counts per inch
    pub dpi: f32,
    /// Mouse travel for a full turn
    pub cm_per_360: f32,

    // === Look ===
    /// Name of the colour theme handed to the renderer
    pub theme: String,

    // === Metronome ===
    pub metronome_enabled: bool,
    pub metronome_bpm: f32,

    // === Behaviour ===
    /// Pause the scenario when the window loses focus
    pub pause_on_focus_loss: bool,
    /// Minimum time between renders during live play
    pub live_render_budget_micros: u64,
    /// Minimum time between renders during replay playback
    pub replay_render_budget_micros: u64,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    pub muted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dpi: 800.0,
            cm_per_360: 45.0,

            theme: "default".to_string(),

            metronome_enabled: false,
            metronome_bpm: 120.0,

            pause_on_focus_loss: true,
            live_render_budget_micros: LIVE_RENDER_BUDGET_MICROS,
            replay_render_budget_micros: REPLAY_RENDER_BUDGET_MICROS,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
        }
    }
}

impl Settings {
    /// Degrees of camera rotation per mouse count
    pub fn degrees_per_count(&self) -> f32 {
        let counts_per_360 = self.cm_per_360 / 2.54 * self.dpi;
        if counts_per_360 <= 0.0 {
            log::warn!(
                "invalid sensitivity (dpi {}, cm/360 {}); using defaults",
                self.dpi,
                self.cm_per_360
            );
            return Settings::default().degrees_per_count();
        }
        360.0 / counts_per_360
    }

    /// Load settings from a JSON file, falling back to defaults
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            log::info!("No settings at {}, using defaults", path.display());
            return Self::default();
        }
        match persistence::load_json(path) {
            Ok(settings) => {
                log::info!("Loaded settings from {}", path.display());
                settings
            }
            Err(err) => {
                log::warn!("{err}; using default settings");
                Self::default()
            }
        }
    }

    /// Save settings to a JSON file
    pub fn save(&self, path: &Path) {
        match persistence::save_json(path, self) {
            Ok(()) => log::info!("Settings saved"),
            Err(err) => log::warn!("{err}"),
        }
    }
}
