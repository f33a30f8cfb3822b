//! Command-line command handlers for scrimctl.
//!
//! Each command is implemented in its own submodule. Commands load the configuration
//! themselves, so that `--config` set up by `main` applies to all of them.

pub mod help;
pub mod simulate;
pub mod states;

use anyhow::{Context, Result};

use crate::config::ScrimConfig;

/// Load the configuration and print it when debug output is on.
pub(crate) fn load_config() -> Result<ScrimConfig> {
    let config = ScrimConfig::load().context("Failed to load configuration")?;
    if crate::logger::Log::is_debug_enabled() {
        config.log_config();
    }
    Ok(config)
}
