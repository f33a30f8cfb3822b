//! Configuration for scrimctl.
//!
//! Settings are read from `scrimctl.toml`, found in:
//! 1. the directory passed with `--config <dir>`, or
//! 2. **XDG_CONFIG_HOME**/scrimctl/scrimctl.toml
//!
//! A missing file is not an error: every field is optional and falls back to the
//! built-in defaults.
//!
//! ```toml
//! shade_opaque = false          # Use an opaque (1.0) shade scrim instead of 0.6
//! keyguard_behind_alpha = 0.2   # Behind scrim opacity on the lock screen (0.0-1.0)
//! darken_while_dragging = true  # Darken the keyguard while the shade is dragged
//! frame_interval_ms = 16        # Simulated display refresh interval (1-1000)ms
//!
//! [doze]
//! always_on = false                     # Always-on display
//! display_needs_blanking = false        # Panel needs a black frame to change power mode
//! controls_screen_off = true            # Scrims animate the screen off
//! wallpaper_aod_duration_ms = 60000     # Ambient wallpaper time in AOD before fading
//! wallpaper_fade_out_duration_ms = 400  # Length of that fade
//! ```

pub mod loading;
pub mod validation;

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::common::constants::*;
use crate::controller::ControllerSettings;
use crate::state::DozeParameters;

pub use loading::{get_config_path, get_custom_config_dir, load, load_from_path, set_config_dir};

/// Doze behavior, the `[doze]` table.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct DozeConfig {
    pub always_on: Option<bool>,
    pub display_needs_blanking: Option<bool>,
    pub controls_screen_off: Option<bool>,
    pub wallpaper_aod_duration_ms: Option<u64>,
    pub wallpaper_fade_out_duration_ms: Option<u64>,
}

impl DozeConfig {
    /// Resolve the table into doze parameters, filling in defaults.
    pub fn parameters(&self) -> DozeParameters {
        DozeParameters {
            always_on: self.always_on.unwrap_or(DEFAULT_ALWAYS_ON),
            display_needs_blanking: self
                .display_needs_blanking
                .unwrap_or(DEFAULT_DISPLAY_NEEDS_BLANKING),
            controls_screen_off: self
                .controls_screen_off
                .unwrap_or(DEFAULT_CONTROLS_SCREEN_OFF),
            wallpaper_aod_duration: Duration::from_millis(
                self.wallpaper_aod_duration_ms
                    .unwrap_or(DEFAULT_WALLPAPER_AOD_DURATION_MS),
            ),
            wallpaper_fade_out_duration: Duration::from_millis(
                self.wallpaper_fade_out_duration_ms
                    .unwrap_or(DEFAULT_WALLPAPER_FADE_OUT_DURATION_MS),
            ),
        }
    }
}

/// Contents of `scrimctl.toml`.
///
/// Fields are kept optional so that the file only needs to mention what differs from
/// the defaults; use [`ScrimConfig::controller_settings`] to resolve them.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
pub struct ScrimConfig {
    /// Use a fully opaque scrim behind the bouncer and shade.
    pub shade_opaque: Option<bool>,
    pub keyguard_behind_alpha: Option<f32>,
    pub darken_while_dragging: Option<bool>,
    /// Frame interval of the simulated display.
    pub frame_interval_ms: Option<u64>,
    #[serde(default)]
    pub doze: DozeConfig,
}

impl ScrimConfig {
    /// Load the configuration from the active search path.
    pub fn load() -> anyhow::Result<Self> {
        load()
    }

    /// Behind opacity of the bouncer and shade states.
    pub fn default_scrim_alpha(&self) -> f32 {
        if self.shade_opaque.unwrap_or(DEFAULT_SHADE_OPAQUE) {
            BUSY_SCRIM_ALPHA
        } else {
            GAR_SCRIM_ALPHA
        }
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms.unwrap_or(DEFAULT_FRAME_INTERVAL_MS))
    }

    /// Resolve the settings the controller is built with.
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            default_scrim_alpha: self.default_scrim_alpha(),
            keyguard_behind_alpha: self.keyguard_behind_alpha.unwrap_or(KEYGUARD_SCRIM_ALPHA),
            darken_while_dragging: self
                .darken_while_dragging
                .unwrap_or(DEFAULT_DARKEN_WHILE_DRAGGING),
            doze: self.doze.parameters(),
        }
    }

    /// Print the resolved configuration.
    pub fn log_config(&self) {
        let source = get_config_path()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|_| "defaults".to_string());
        let settings = self.controller_settings();
        let doze = settings.doze;

        log_block_start!("Loaded configuration ({source})");
        log_indented!("Shade scrim alpha: {}", settings.default_scrim_alpha);
        log_indented!("Keyguard behind alpha: {}", settings.keyguard_behind_alpha);
        log_indented!("Darken while dragging: {}", settings.darken_while_dragging);
        log_indented!("Frame interval: {}ms", self.frame_interval().as_millis());
        log_indented!(
            "Doze: always_on={}, display_needs_blanking={}, controls_screen_off={}",
            doze.always_on,
            doze.display_needs_blanking,
            doze.controls_screen_off
        );
        log_indented!(
            "Ambient wallpaper: {}ms in AOD, {}ms fade",
            doze.wallpaper_aod_duration.as_millis(),
            doze.wallpaper_fade_out_duration.as_millis()
        );
    }
}

#[cfg(test)]
mod tests;
