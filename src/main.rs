//! Main entry point for the scrimctl command-line tool.
//!
//! Parses the command line, applies the global flags (`--debug`, `--config`, `--log`)
//! and dispatches to the command handlers in [`scrimctl::commands`]. Errors from a
//! command are reported through the logger and turn into a non-zero exit status.

use anyhow::Result;

use scrimctl::args::{self, CliAction, ParsedArgs};
use scrimctl::commands;
use scrimctl::config;
use scrimctl::logger::{Log, LoggerGuard};
use scrimctl::{log_end, log_error_exit};

/// Apply the flags shared by every command.
///
/// The returned guard keeps file logging alive and must outlive the command.
fn apply_global_flags(
    debug_enabled: bool,
    config_dir: Option<String>,
    log_file: Option<String>,
) -> Result<Option<LoggerGuard>> {
    Log::set_debug(debug_enabled);
    if let Some(dir) = config_dir {
        config::set_config_dir(Some(dir))?;
    }

    match log_file {
        Some(path) => {
            Log::set_timestamps(true);
            Ok(Some(Log::start_file_logging(path)?))
        }
        None => Ok(None),
    }
}

fn run(action: CliAction) -> Result<()> {
    match action {
        CliAction::ShowVersion => {
            args::display_version_info();
            Ok(())
        }
        CliAction::ShowHelp | CliAction::ShowHelpDueToError => {
            args::display_help();
            Ok(())
        }
        CliAction::HelpCommand { command } => commands::help::run_help_command(command.as_deref()),
        CliAction::States {
            debug_enabled,
            config_dir,
            json,
        } => {
            apply_global_flags(debug_enabled, config_dir, None)?;
            commands::states::handle_states_command(json)
        }
        CliAction::Simulate {
            debug_enabled,
            config_dir,
            scenario,
            json,
            log_file,
        } => {
            // Keep the guard alive for the duration of the simulation
            let _log_guard = apply_global_flags(debug_enabled, config_dir, log_file)?;
            commands::simulate::handle_simulate_command(&scenario, json)
        }
    }
}

fn main() {
    let parsed_args = ParsedArgs::from_env();
    let show_error_status = parsed_args.action == CliAction::ShowHelpDueToError;

    if let Err(e) = run(parsed_args.action) {
        Log::set_enabled(true);
        log_error_exit!("{e:#}");
        log_end!();
        std::process::exit(1);
    }

    if show_error_status {
        std::process::exit(2);
    }
}
