//! Configuration validation functionality.
//!
//! Rejects values the controller cannot work with: opacities outside `[0, 1]` (NaN
//! included), a frame interval outside its supported range and wallpaper durations
//! beyond their limits.

use anyhow::Result;

use super::ScrimConfig;
use crate::common::constants::*;

/// Validate every field that is set.
pub fn validate_config(config: &ScrimConfig) -> Result<()> {
    if let Some(alpha) = config.keyguard_behind_alpha {
        validate_alpha(alpha, "keyguard_behind_alpha")?;
    }

    if let Some(interval_ms) = config.frame_interval_ms
        && !(MINIMUM_FRAME_INTERVAL_MS..=MAXIMUM_FRAME_INTERVAL_MS).contains(&interval_ms)
    {
        anyhow::bail!(
            "frame_interval_ms ({} ms) must be between {} and {} milliseconds",
            interval_ms,
            MINIMUM_FRAME_INTERVAL_MS,
            MAXIMUM_FRAME_INTERVAL_MS
        );
    }

    if let Some(duration_ms) = config.doze.wallpaper_aod_duration_ms
        && duration_ms > MAXIMUM_WALLPAPER_AOD_DURATION_MS
    {
        anyhow::bail!(
            "doze.wallpaper_aod_duration_ms ({} ms) must not exceed {} milliseconds",
            duration_ms,
            MAXIMUM_WALLPAPER_AOD_DURATION_MS
        );
    }

    if let Some(duration_ms) = config.doze.wallpaper_fade_out_duration_ms
        && duration_ms > MAXIMUM_WALLPAPER_FADE_OUT_DURATION_MS
    {
        anyhow::bail!(
            "doze.wallpaper_fade_out_duration_ms ({} ms) must not exceed {} milliseconds",
            duration_ms,
            MAXIMUM_WALLPAPER_FADE_OUT_DURATION_MS
        );
    }

    Ok(())
}

fn validate_alpha(alpha: f32, field_name: &str) -> Result<()> {
    // NaN fails the range check as well
    if !(0.0..=1.0).contains(&alpha) {
        anyhow::bail!("{field_name} ({alpha}) must be between 0.0 and 1.0");
    }
    Ok(())
}
