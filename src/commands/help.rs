//! Help command implementation for scrimctl.
//!
//! Dispatches `scrimctl help [COMMAND]` to the detailed help of each command.

use anyhow::Result;

/// Run the help command (dispatcher)
///
/// # Arguments
/// * `command` - Optional command name to get help for (None = general help)
pub fn run_help_command(command: Option<&str>) -> Result<()> {
    match command {
        None => display_general_help(),
        Some("simulate" | "sim") => super::simulate::display_help(),
        Some("states" | "st") => super::states::display_help(),
        Some("help") => display_help_help(),
        Some(unknown) => {
            log_warning!("Unknown command: {unknown}");
            display_general_help();
        }
    }
    Ok(())
}

/// Display general help focused on commands (for the help command)
fn display_general_help() {
    log_version!();
    log_block_start!("Available Commands:");
    log_indented!("simulate, sim <file>   Replay a scenario and print the frame trace");
    log_indented!("states, st             Print the resolved targets of every state");
    log_indented!("help [COMMAND]         Show detailed help for a command");
    log_pipe!();
    log_info!("Use 'scrimctl help <command>' to see detailed help for a specific command.");
    log_indented!("Use 'scrimctl --help' to see all options and general usage.");
    log_end!();
}

/// Display help for the help command itself
fn display_help_help() {
    log_version!();
    log_block_start!("help - Display help information");
    log_block_start!("Usage: scrimctl help [COMMAND]");
    log_block_start!("Examples:");
    log_indented!("scrimctl help");
    log_indented!("scrimctl help simulate");
    log_end!();
}
