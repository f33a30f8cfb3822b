//! Application-wide constants.
//!
//! Timing and opacity values used by the state catalog, the blanking sequence and the
//! configuration defaults. Durations are kept as `Duration` so that call sites never
//! have to guess the unit.

use std::time::Duration;

// # Animation timing

/// General scrim animation duration.
pub const ANIMATION_DURATION: Duration = Duration::from_millis(220);

/// Longer duration, used when going to or pulsing in the always-on display.
pub const ANIMATION_DURATION_LONG: Duration = Duration::from_millis(1000);

/// Duration of the keyguard reveal when waking up from the always-on display.
pub const ANIMATION_DURATION_WAKEUP: Duration = Duration::from_millis(500);

/// Duration of the unlock fade when the keyguard is not fading away on its own.
pub const FADE_KEYGUARD_DURATION: Duration = Duration::from_millis(300);

/// Start delay applied to the unlock fade when a slow unlock transition is required.
pub const FADE_KEYGUARD_START_DELAY: Duration = Duration::from_millis(100);

// # Blanking

/// Delay used to wait until a frame has actually reached the display.
pub const BLANKING_FRAME_DELAY: Duration = Duration::from_millis(32);

/// Reveal delay after blanking while the screen is on.
pub const BLANKING_REVEAL_DELAY_SCREEN_ON: Duration = Duration::from_millis(32);

/// Reveal delay after blanking while the screen is off, so that the display power
/// mode change reaches the lower levels before content is revealed.
pub const BLANKING_REVEAL_DELAY_SCREEN_OFF: Duration = Duration::from_millis(500);

// # Opacity

/// Default behind-scrim opacity on the keyguard.
pub const KEYGUARD_SCRIM_ALPHA: f32 = 0.2;

/// Behind-scrim opacity while pulsing with the wake-lock screen sensor active.
pub const WAKE_SENSOR_SCRIM_ALPHA: f32 = 0.6;

/// Default scrim opacity when the shade is configured to be opaque.
pub const BUSY_SCRIM_ALPHA: f32 = 1.0;

/// Default scrim opacity that still keeps text on top legible.
pub const GAR_SCRIM_ALPHA: f32 = 0.6;

/// Opacity of the auxiliary scrim under an expanded auxiliary surface.
pub const AUXILIARY_SCRIM_ALPHA: f32 = 0.6;

/// Minimum contrast of the main color against white for dark text to be supported.
pub const DARK_TEXT_CONTRAST_THRESHOLD: f64 = 4.5;

// # Resources

/// Tag passed to the wake lock on acquire and release.
pub const WAKE_LOCK_TAG: &str = "ScrimController";

// # Configuration defaults

pub const DEFAULT_SHADE_OPAQUE: bool = false;
pub const DEFAULT_DARKEN_WHILE_DRAGGING: bool = true;
pub const DEFAULT_FRAME_INTERVAL_MS: u64 = 16;
pub const DEFAULT_ALWAYS_ON: bool = false;
pub const DEFAULT_DISPLAY_NEEDS_BLANKING: bool = false;
pub const DEFAULT_CONTROLS_SCREEN_OFF: bool = true;
pub const DEFAULT_WALLPAPER_AOD_DURATION_MS: u64 = 60_000;
pub const DEFAULT_WALLPAPER_FADE_OUT_DURATION_MS: u64 = 400;

// # Validation limits

pub const MINIMUM_FRAME_INTERVAL_MS: u64 = 1;
pub const MAXIMUM_FRAME_INTERVAL_MS: u64 = 1000;
pub const MAXIMUM_WALLPAPER_AOD_DURATION_MS: u64 = 3_600_000;
pub const MAXIMUM_WALLPAPER_FADE_OUT_DURATION_MS: u64 = 10_000;

#[cfg(test)]
pub mod test_constants {
    pub const TEST_DEFAULT_SCRIM_ALPHA: f32 = 0.6;
    pub const TEST_EPSILON: f32 = 1e-6;
}
