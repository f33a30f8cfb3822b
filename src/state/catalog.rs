//! State catalog: resolves a [`ScrimState`] into per-layer targets.
//!
//! The static part of every entry (tints, default opacities, durations) is fixed. A few
//! environment facts change at runtime and affect several entries at once, such as
//! whether the wallpaper supports ambient mode or whether a backdrop is shown. Those
//! live in a single [`EnvironmentOverrides`] record owned by the catalog and are read
//! back every time a descriptor is resolved, so that every consumer sees the same facts.
//!
//! A descriptor also depends on the state being left: waking from `Aod` into
//! `Keyguard` uses a longer reveal and may need blanking, and unlocking straight
//! from `Aod` fades out of black.

use serde::Serialize;
use std::time::Duration;

use super::ScrimState;
use crate::common::color::Color;
use crate::common::constants::*;
use crate::layer::{PerLayer, ScrimLayer};

/// Doze behavior of the device, normally provided by the power subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DozeParameters {
    /// Always-on display is enabled.
    pub always_on: bool,
    /// The panel cannot switch power modes without showing artifacts and must be
    /// blanked first.
    pub display_needs_blanking: bool,
    /// The scrims animate the screen off instead of the display color fade.
    pub controls_screen_off: bool,
    /// How long an ambient wallpaper stays visible in AOD before fading away.
    pub wallpaper_aod_duration: Duration,
    /// Duration of the wallpaper fade once the AOD timeout fires.
    pub wallpaper_fade_out_duration: Duration,
}

impl Default for DozeParameters {
    fn default() -> Self {
        Self {
            always_on: DEFAULT_ALWAYS_ON,
            display_needs_blanking: DEFAULT_DISPLAY_NEEDS_BLANKING,
            controls_screen_off: DEFAULT_CONTROLS_SCREEN_OFF,
            wallpaper_aod_duration: Duration::from_millis(DEFAULT_WALLPAPER_AOD_DURATION_MS),
            wallpaper_fade_out_duration: Duration::from_millis(
                DEFAULT_WALLPAPER_FADE_OUT_DURATION_MS,
            ),
        }
    }
}

/// Runtime environment facts shared by every catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EnvironmentOverrides {
    pub wallpaper_supports_ambient_mode: bool,
    pub wake_lock_screen_sensor_active: bool,
    pub keyguard_fading_away: bool,
    pub keyguard_fading_away_duration: Duration,
    pub has_backdrop: bool,
    /// Front scrim opacity in AOD, lowered in dark environments.
    pub aod_front_alpha: f32,
    pub docked: bool,
    pub launching_affordance_with_preview: bool,
}

/// Fully resolved targets for one state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateDescriptor {
    pub state: ScrimState,
    /// Target opacity per layer. The notifications entry is unused: that layer follows
    /// quick settings expansion instead.
    pub alpha: PerLayer<f32>,
    pub tint: PerLayer<Color>,
    pub duration: Duration,
    pub animate_change: bool,
    pub blanks_screen: bool,
    pub low_power: bool,
}

/// Catalog of named states and the overrides that parameterize them.
#[derive(Debug, Clone)]
pub struct StateCatalog {
    default_scrim_alpha: f32,
    keyguard_behind_alpha: f32,
    doze: DozeParameters,
    overrides: EnvironmentOverrides,
}

impl StateCatalog {
    pub fn new(default_scrim_alpha: f32, keyguard_behind_alpha: f32, doze: DozeParameters) -> Self {
        Self {
            default_scrim_alpha,
            keyguard_behind_alpha,
            doze,
            overrides: EnvironmentOverrides::default(),
        }
    }

    pub fn default_scrim_alpha(&self) -> f32 {
        self.default_scrim_alpha
    }

    pub fn keyguard_behind_alpha(&self) -> f32 {
        self.keyguard_behind_alpha
    }

    pub fn set_keyguard_behind_alpha(&mut self, alpha: f32) {
        self.keyguard_behind_alpha = alpha;
    }

    pub fn doze(&self) -> &DozeParameters {
        &self.doze
    }

    pub fn doze_mut(&mut self) -> &mut DozeParameters {
        &mut self.doze
    }

    pub fn overrides(&self) -> &EnvironmentOverrides {
        &self.overrides
    }

    pub fn overrides_mut(&mut self) -> &mut EnvironmentOverrides {
        &mut self.overrides
    }

    /// Front opacity of `state` under the current overrides.
    pub fn front_alpha(&self, state: ScrimState) -> f32 {
        match state {
            ScrimState::BouncerScrimmed => self.default_scrim_alpha,
            ScrimState::Aod => {
                if self.doze.always_on || self.overrides.docked {
                    self.overrides.aod_front_alpha
                } else {
                    1.0
                }
            }
            ScrimState::Pulsing => self.overrides.aod_front_alpha,
            _ => 0.0,
        }
    }

    /// Behind opacity of `state` under the current overrides.
    pub fn behind_alpha(&self, state: ScrimState) -> f32 {
        match state {
            ScrimState::Keyguard => self.keyguard_behind_alpha,
            ScrimState::Bouncer | ScrimState::ShadeLocked | ScrimState::AuxiliaryExpanded => {
                self.default_scrim_alpha
            }
            ScrimState::Aod => {
                if self.overrides.wallpaper_supports_ambient_mode && !self.overrides.has_backdrop
                {
                    0.0
                } else {
                    1.0
                }
            }
            ScrimState::Pulsing => {
                if self.overrides.wake_lock_screen_sensor_active {
                    WAKE_SENSOR_SCRIM_ALPHA
                } else {
                    self.behind_alpha(ScrimState::Aod)
                }
            }
            _ => 0.0,
        }
    }

    /// Auxiliary opacity of `state`.
    pub fn auxiliary_alpha(&self, state: ScrimState) -> f32 {
        match state {
            ScrimState::AuxiliaryExpanded => AUXILIARY_SCRIM_ALPHA,
            _ => 0.0,
        }
    }

    /// Behind tint of `state` when entered from anywhere but AOD.
    ///
    /// The expansion model blends between the bouncer and shade-locked tints.
    pub fn behind_tint(&self, state: ScrimState) -> Color {
        match state {
            ScrimState::Keyguard
            | ScrimState::ShadeLocked
            | ScrimState::Aod
            | ScrimState::Pulsing
            | ScrimState::Unlocked => Color::BLACK,
            _ => Color::TRANSPARENT,
        }
    }

    /// Resolve `state` as entered from `previous`.
    pub fn descriptor(&self, state: ScrimState, previous: ScrimState) -> StateDescriptor {
        let from_aod = previous == ScrimState::Aod;

        let mut tint = PerLayer::splat(Color::TRANSPARENT);
        tint.set(ScrimLayer::Behind, self.behind_tint(state));
        let mut duration = ANIMATION_DURATION;
        let mut animate_change = true;
        let mut blanks_screen = false;

        match state {
            ScrimState::Keyguard => {
                tint.set(ScrimLayer::Front, Color::BLACK);
                tint.set(ScrimLayer::Auxiliary, Color::BLACK);
                if from_aod {
                    duration = ANIMATION_DURATION_WAKEUP;
                    blanks_screen = self.doze.display_needs_blanking;
                }
            }
            ScrimState::Aod => {
                tint.set(ScrimLayer::Front, Color::BLACK);
                tint.set(ScrimLayer::Auxiliary, Color::BLACK);
                duration = ANIMATION_DURATION_LONG;
                animate_change = self.doze.controls_screen_off;
                blanks_screen = self.doze.display_needs_blanking;
            }
            ScrimState::Pulsing => {
                tint.set(ScrimLayer::Front, Color::BLACK);
                duration = if self.overrides.wake_lock_screen_sensor_active {
                    ANIMATION_DURATION_LONG
                } else {
                    ANIMATION_DURATION
                };
                blanks_screen = self.doze.display_needs_blanking;
            }
            ScrimState::Unlocked => {
                duration = if self.overrides.keyguard_fading_away {
                    self.overrides.keyguard_fading_away_duration
                } else {
                    FADE_KEYGUARD_DURATION
                };
                animate_change = !self.overrides.launching_affordance_with_preview;
                if from_aod {
                    // Fade out of black when unlocking straight from AOD
                    tint.set(ScrimLayer::Front, Color::BLACK);
                    tint.set(ScrimLayer::Auxiliary, Color::BLACK);
                    blanks_screen = true;
                }
            }
            ScrimState::AuxiliaryExpanded => {
                tint.set(ScrimLayer::Auxiliary, Color::BLACK);
            }
            ScrimState::Uninitialized
            | ScrimState::Bouncer
            | ScrimState::BouncerScrimmed
            | ScrimState::ShadeLocked
            | ScrimState::BrightnessMirror => {}
        }

        StateDescriptor {
            state,
            alpha: PerLayer::new(
                self.front_alpha(state),
                self.behind_alpha(state),
                0.0,
                self.auxiliary_alpha(state),
            ),
            tint,
            duration,
            animate_change,
            blanks_screen,
            low_power: state.is_low_power(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> StateCatalog {
        StateCatalog::new(GAR_SCRIM_ALPHA, KEYGUARD_SCRIM_ALPHA, DozeParameters::default())
    }

    #[test]
    fn test_keyguard_descriptor() {
        let descriptor = catalog().descriptor(ScrimState::Keyguard, ScrimState::Unlocked);
        assert_eq!(*descriptor.alpha.get(ScrimLayer::Behind), KEYGUARD_SCRIM_ALPHA);
        assert_eq!(*descriptor.alpha.get(ScrimLayer::Front), 0.0);
        assert_eq!(*descriptor.tint.get(ScrimLayer::Behind), Color::BLACK);
        assert_eq!(descriptor.duration, ANIMATION_DURATION);
        assert!(!descriptor.blanks_screen);
    }

    #[test]
    fn test_keyguard_from_aod_wakes_up_slower() {
        let mut catalog = catalog();
        let descriptor = catalog.descriptor(ScrimState::Keyguard, ScrimState::Aod);
        assert_eq!(descriptor.duration, ANIMATION_DURATION_WAKEUP);
        assert!(!descriptor.blanks_screen);

        catalog.doze_mut().display_needs_blanking = true;
        let descriptor = catalog.descriptor(ScrimState::Keyguard, ScrimState::Aod);
        assert!(descriptor.blanks_screen);
    }

    #[test]
    fn test_aod_front_alpha_depends_on_always_on() {
        let mut catalog = catalog();
        catalog.overrides_mut().aod_front_alpha = 0.5;
        assert_eq!(catalog.front_alpha(ScrimState::Aod), 1.0);

        catalog.doze_mut().always_on = true;
        assert_eq!(catalog.front_alpha(ScrimState::Aod), 0.5);

        catalog.doze_mut().always_on = false;
        catalog.overrides_mut().docked = true;
        assert_eq!(catalog.front_alpha(ScrimState::Aod), 0.5);
    }

    #[test]
    fn test_aod_behind_alpha_follows_wallpaper_and_backdrop() {
        let mut catalog = catalog();
        assert_eq!(catalog.behind_alpha(ScrimState::Aod), 1.0);

        catalog.overrides_mut().wallpaper_supports_ambient_mode = true;
        assert_eq!(catalog.behind_alpha(ScrimState::Aod), 0.0);

        catalog.overrides_mut().has_backdrop = true;
        assert_eq!(catalog.behind_alpha(ScrimState::Aod), 1.0);
    }

    #[test]
    fn test_pulsing_with_sensor_active() {
        let mut catalog = catalog();
        catalog.overrides_mut().wake_lock_screen_sensor_active = true;
        let descriptor = catalog.descriptor(ScrimState::Pulsing, ScrimState::Aod);
        assert_eq!(*descriptor.alpha.get(ScrimLayer::Behind), WAKE_SENSOR_SCRIM_ALPHA);
        assert_eq!(descriptor.duration, ANIMATION_DURATION_LONG);
        assert!(descriptor.low_power);
    }

    #[test]
    fn test_unlocked_from_aod_blanks() {
        let descriptor = catalog().descriptor(ScrimState::Unlocked, ScrimState::Aod);
        assert!(descriptor.blanks_screen);
        assert_eq!(*descriptor.tint.get(ScrimLayer::Front), Color::BLACK);

        let descriptor = catalog().descriptor(ScrimState::Unlocked, ScrimState::Keyguard);
        assert!(!descriptor.blanks_screen);
        assert_eq!(*descriptor.tint.get(ScrimLayer::Front), Color::TRANSPARENT);
        assert_eq!(descriptor.duration, FADE_KEYGUARD_DURATION);
    }

    #[test]
    fn test_unlocked_uses_fading_away_duration() {
        let mut catalog = catalog();
        catalog.overrides_mut().keyguard_fading_away = true;
        catalog.overrides_mut().keyguard_fading_away_duration = Duration::from_millis(150);
        catalog.overrides_mut().launching_affordance_with_preview = true;

        let descriptor = catalog.descriptor(ScrimState::Unlocked, ScrimState::Keyguard);
        assert_eq!(descriptor.duration, Duration::from_millis(150));
        assert!(!descriptor.animate_change);
    }

    #[test]
    fn test_auxiliary_expanded() {
        let descriptor = catalog().descriptor(ScrimState::AuxiliaryExpanded, ScrimState::Unlocked);
        assert_eq!(*descriptor.alpha.get(ScrimLayer::Auxiliary), AUXILIARY_SCRIM_ALPHA);
        assert_eq!(*descriptor.alpha.get(ScrimLayer::Behind), GAR_SCRIM_ALPHA);
        assert_eq!(*descriptor.tint.get(ScrimLayer::Auxiliary), Color::BLACK);
    }

    #[test]
    fn test_no_descriptor_is_nan() {
        let catalog = catalog();
        for state in ScrimState::ALL {
            for previous in ScrimState::ALL {
                let descriptor = catalog.descriptor(state, previous);
                for (layer, alpha) in descriptor.alpha.iter() {
                    assert!(!alpha.is_nan(), "{state} from {previous}: {layer} is NaN");
                }
            }
        }
    }
}
