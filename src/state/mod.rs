//! Named visual and power states of the scrims.
//!
//! This module defines the [`ScrimState`] enum and re-exports the catalog that resolves
//! each state into concrete per-layer targets. States fall into three groups:
//!
//! - **Keyguard family**: `Keyguard`, `Bouncer`, `BouncerScrimmed`, `ShadeLocked`
//! - **Low-power family**: `Aod`, `Pulsing` (these hold the wake lock on entry)
//! - **Unlocked family**: `Unlocked`, `AuxiliaryExpanded`, `BrightnessMirror`
//!
//! `Uninitialized` is a bootstrap sentinel only. The controller starts in it and can
//! never transition back to it.

pub mod catalog;

pub use catalog::{DozeParameters, EnvironmentOverrides, StateCatalog, StateDescriptor};

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named scrim state.
#[derive(Debug, PartialEq, Eq, Hash, Copy, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScrimState {
    /// Bootstrap value before the first transition.
    Uninitialized,

    /// On the lock screen.
    Keyguard,

    /// Showing the bouncer on the lock screen.
    Bouncer,

    /// Showing the bouncer over an occluding surface.
    BouncerScrimmed,

    /// Shade expanded on top of the lock screen.
    ShadeLocked,

    /// Only the brightness slider is visible.
    BrightnessMirror,

    /// Always-on display (dozing).
    Aod,

    /// Pulsing a notification while dozing.
    Pulsing,

    /// Unlocked, shade collapsed or being dragged.
    Unlocked,

    /// An auxiliary surface (such as an expanded bubble stack) is shown.
    AuxiliaryExpanded,
}

impl fmt::Display for ScrimState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl ScrimState {
    /// Every state, sentinel included, in declaration order.
    pub const ALL: [ScrimState; 10] = [
        ScrimState::Uninitialized,
        ScrimState::Keyguard,
        ScrimState::Bouncer,
        ScrimState::BouncerScrimmed,
        ScrimState::ShadeLocked,
        ScrimState::BrightnessMirror,
        ScrimState::Aod,
        ScrimState::Pulsing,
        ScrimState::Unlocked,
        ScrimState::AuxiliaryExpanded,
    ];

    /// Returns the name used in logs and dumps.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Uninitialized => "UNINITIALIZED",
            Self::Keyguard => "KEYGUARD",
            Self::Bouncer => "BOUNCER",
            Self::BouncerScrimmed => "BOUNCER_SCRIMMED",
            Self::ShadeLocked => "SHADE_LOCKED",
            Self::BrightnessMirror => "BRIGHTNESS_MIRROR",
            Self::Aod => "AOD",
            Self::Pulsing => "PULSING",
            Self::Unlocked => "UNLOCKED",
            Self::AuxiliaryExpanded => "AUXILIARY_EXPANDED",
        }
    }

    /// Returns true for states where the device may sleep and the display runs in a
    /// low-power mode.
    pub fn is_low_power(&self) -> bool {
        matches!(self, Self::Aod | Self::Pulsing)
    }

    /// Returns true for states whose behind scrim darkens as the shade is pulled down.
    pub fn darkens_with_expansion(&self) -> bool {
        matches!(self, Self::Unlocked | Self::AuxiliaryExpanded)
    }

    /// Returns true for states whose behind scrim is revealed as the shade is pulled.
    pub fn reveals_with_expansion(&self) -> bool {
        matches!(self, Self::Keyguard | Self::ShadeLocked | Self::Pulsing)
    }

    /// Returns true if panel expansion changes this state's scrim opacity.
    pub fn tracks_panel_expansion(&self) -> bool {
        self.darkens_with_expansion() || self.reveals_with_expansion()
    }

    /// Returns true if quick settings expansion changes this state's scrim opacity.
    pub fn tracks_qs_expansion(&self) -> bool {
        matches!(
            self,
            Self::ShadeLocked | Self::Keyguard | Self::Pulsing | Self::AuxiliaryExpanded
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_low_power_states() {
        let low_power: Vec<_> = ScrimState::ALL
            .into_iter()
            .filter(ScrimState::is_low_power)
            .collect();
        assert_eq!(low_power, vec![ScrimState::Aod, ScrimState::Pulsing]);
    }

    #[test]
    fn test_expansion_groups_are_disjoint() {
        for state in ScrimState::ALL {
            assert!(
                !(state.darkens_with_expansion() && state.reveals_with_expansion()),
                "{state} both darkens and reveals"
            );
        }
    }

    #[test]
    fn test_qs_tracking_excludes_unlocked() {
        assert!(!ScrimState::Unlocked.tracks_qs_expansion());
        assert!(ScrimState::Unlocked.tracks_panel_expansion());
        assert!(ScrimState::AuxiliaryExpanded.tracks_qs_expansion());
    }

    #[test]
    fn test_serde_names() {
        let state: ScrimState = serde_json::from_str("\"auxiliary_expanded\"").unwrap();
        assert_eq!(state, ScrimState::AuxiliaryExpanded);
        assert_eq!(serde_json::to_string(&ScrimState::Aod).unwrap(), "\"aod\"");
    }
}
