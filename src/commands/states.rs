//! Implementation of the `states` command.
//!
//! Prints what every state resolves to with the current configuration. States are shown
//! as entered from `Unlocked` (`Unlocked` itself from `Keyguard`). When waking from
//! `Aod` changes the result, an extra row shows that variant.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::common::color::Color;
use crate::config::ScrimConfig;
use crate::layer::ScrimLayer;
use crate::state::ScrimState;
use crate::state::catalog::{StateCatalog, StateDescriptor};

/// One resolved catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateRow {
    pub state: ScrimState,
    pub from: ScrimState,
    pub front_alpha: f32,
    pub behind_alpha: f32,
    pub auxiliary_alpha: f32,
    pub front_tint: Color,
    pub behind_tint: Color,
    pub duration_ms: u64,
    pub animate: bool,
    pub blanks_screen: bool,
    pub low_power: bool,
}

impl StateRow {
    fn new(descriptor: &StateDescriptor, from: ScrimState) -> Self {
        Self {
            state: descriptor.state,
            from,
            front_alpha: *descriptor.alpha.get(ScrimLayer::Front),
            behind_alpha: *descriptor.alpha.get(ScrimLayer::Behind),
            auxiliary_alpha: *descriptor.alpha.get(ScrimLayer::Auxiliary),
            front_tint: *descriptor.tint.get(ScrimLayer::Front),
            behind_tint: *descriptor.tint.get(ScrimLayer::Behind),
            duration_ms: descriptor.duration.as_millis() as u64,
            animate: descriptor.animate_change,
            blanks_screen: descriptor.blanks_screen,
            low_power: descriptor.low_power,
        }
    }
}

/// Resolve every state against the catalog built from `config`.
pub fn state_rows(config: &ScrimConfig) -> Vec<StateRow> {
    let settings = config.controller_settings();
    let catalog = StateCatalog::new(
        settings.default_scrim_alpha,
        settings.keyguard_behind_alpha,
        settings.doze,
    );

    let mut rows = Vec::new();
    for state in ScrimState::ALL {
        if state == ScrimState::Uninitialized {
            continue;
        }
        let from = if state == ScrimState::Unlocked {
            ScrimState::Keyguard
        } else {
            ScrimState::Unlocked
        };
        let descriptor = catalog.descriptor(state, from);
        rows.push(StateRow::new(&descriptor, from));

        if state != ScrimState::Aod {
            let from_aod = catalog.descriptor(state, ScrimState::Aod);
            if from_aod != descriptor {
                rows.push(StateRow::new(&from_aod, ScrimState::Aod));
            }
        }
    }
    rows
}

/// Handle the `states` command.
///
/// # Arguments
/// * `json` - Print the rows as JSON instead of the log layout
pub fn handle_states_command(json: bool) -> Result<()> {
    if json {
        crate::logger::Log::set_enabled(false);
        let rows = state_rows(&super::load_config()?);
        let output =
            serde_json::to_string_pretty(&rows).context("Failed to serialize the state catalog")?;
        println!("{output}");
        return Ok(());
    }

    log_version!();
    let rows = state_rows(&super::load_config()?);

    log_block_start!("State catalog:");
    for row in &rows {
        log_pipe!();
        if row.from == ScrimState::Aod {
            log_decorated!("{} (from {})", row.state, row.from);
        } else {
            log_decorated!("{}", row.state);
        }
        log_indented!(
            "front {:.2} {}  behind {:.2} {}  auxiliary {:.2}",
            row.front_alpha,
            row.front_tint,
            row.behind_alpha,
            row.behind_tint,
            row.auxiliary_alpha
        );
        let mut flags = Vec::new();
        if !row.animate {
            flags.push("instant");
        }
        if row.blanks_screen {
            flags.push("blanks screen");
        }
        if row.low_power {
            flags.push("low power");
        }
        if flags.is_empty() {
            log_indented!("{}ms", row.duration_ms);
        } else {
            log_indented!("{}ms, {}", row.duration_ms, flags.join(", "));
        }
    }
    log_end!();
    Ok(())
}

/// Display detailed help for the states command.
pub fn display_help() {
    log_version!();
    log_block_start!("states - Print the resolved targets of every state");
    log_block_start!("Usage: scrimctl states [--json] [--config <dir>]");
    log_block_start!("Description:");
    log_indented!("Shows per-layer opacity and tint, animation duration and flags");
    log_indented!("for each state using the active configuration. Entering a state");
    log_indented!("from AOD is listed separately when it differs.");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::*;

    fn row(rows: &[StateRow], state: ScrimState, from: ScrimState) -> Option<StateRow> {
        rows.iter()
            .find(|row| row.state == state && row.from == from)
            .cloned()
    }

    #[test]
    fn test_every_state_but_uninitialized_is_listed() {
        let rows = state_rows(&ScrimConfig::default());
        for state in ScrimState::ALL {
            let listed = rows.iter().any(|row| row.state == state);
            assert_eq!(listed, state != ScrimState::Uninitialized, "{state}");
        }
    }

    #[test]
    fn test_unlocked_is_entered_from_keyguard() {
        let rows = state_rows(&ScrimConfig::default());
        let unlocked = row(&rows, ScrimState::Unlocked, ScrimState::Keyguard).unwrap();
        assert_eq!(unlocked.behind_alpha, 0.0);
        assert_eq!(unlocked.front_alpha, 0.0);
    }

    #[test]
    fn test_keyguard_uses_configured_alpha() {
        let config = ScrimConfig {
            keyguard_behind_alpha: Some(0.5),
            ..ScrimConfig::default()
        };
        let rows = state_rows(&config);
        let keyguard = row(&rows, ScrimState::Keyguard, ScrimState::Unlocked).unwrap();
        assert_eq!(keyguard.behind_alpha, 0.5);
        assert_eq!(keyguard.front_alpha, 0.0);
        assert!(keyguard.animate);
    }

    #[test]
    fn test_waking_from_aod_gets_own_row() {
        let rows = state_rows(&ScrimConfig::default());
        let from_unlocked = row(&rows, ScrimState::Keyguard, ScrimState::Unlocked).unwrap();
        let from_aod = row(&rows, ScrimState::Keyguard, ScrimState::Aod).unwrap();
        assert_eq!(
            from_aod.duration_ms,
            ANIMATION_DURATION_WAKEUP.as_millis() as u64
        );
        assert_ne!(from_aod.duration_ms, from_unlocked.duration_ms);
    }

    #[test]
    fn test_aod_is_low_power() {
        let rows = state_rows(&ScrimConfig::default());
        let aod = row(&rows, ScrimState::Aod, ScrimState::Unlocked).unwrap();
        assert!(aod.low_power);
        assert_eq!(aod.front_tint, Color::BLACK);
    }
}
