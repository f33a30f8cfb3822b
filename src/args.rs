//! Command-line argument parsing and processing.
//!
//! This module turns the raw argument list into a [`CliAction`] for `main`. It supports
//! the `simulate`, `states` and `help` commands, the global `--config` and `--debug`
//! flags, and the standard help and version flags. Unknown options lead to the help
//! screen instead of a hard failure.

/// Represents the parsed command-line arguments and their intended actions.
#[derive(Debug, PartialEq)]
pub enum CliAction {
    /// Replay a scenario file against the simulated surfaces.
    Simulate {
        debug_enabled: bool,
        config_dir: Option<String>,
        scenario: String,
        /// Print the trace as JSON instead of the log layout.
        json: bool,
        /// Also write the log output to this file.
        log_file: Option<String>,
    },
    /// Print the resolved state catalog.
    States {
        debug_enabled: bool,
        config_dir: Option<String>,
        json: bool,
    },
    /// Show detailed help for a command.
    HelpCommand { command: Option<String> },

    /// Display help information and exit
    ShowHelp,
    /// Display version information and exit
    ShowVersion,
    /// Show help due to unknown arguments and exit
    ShowHelpDueToError,
}

/// Result of parsing command-line arguments.
pub struct ParsedArgs {
    pub action: CliAction,
}

impl ParsedArgs {
    /// Parse command-line arguments into a structured result.
    ///
    /// Flags may appear before or after the command.
    ///
    /// # Arguments
    /// * `args` - Iterator over command-line arguments (typically from std::env::args())
    ///
    /// # Returns
    /// ParsedArgs containing the determined action
    pub fn parse<I, S>(args: I) -> ParsedArgs
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut debug_enabled = false;
        let mut display_help = false;
        let mut display_version = false;
        let mut json = false;
        let mut unknown_arg_found = false;
        let mut config_dir: Option<String> = None;
        let mut log_file: Option<String> = None;
        let mut positionals: Vec<String> = Vec::new();

        let args_vec: Vec<String> = args
            .into_iter()
            .skip(1)
            .map(|s| s.as_ref().to_string())
            .collect();

        let mut idx = 0;
        while idx < args_vec.len() {
            let arg = args_vec[idx].as_str();
            match arg {
                "--help" | "-h" => display_help = true,
                "--version" | "-V" | "-v" => display_version = true,
                "--debug" | "-d" => debug_enabled = true,
                "--json" | "-j" => json = true,
                "--config" | "-c" | "--log" | "-l" => {
                    let Some(value) = args_vec.get(idx + 1) else {
                        log_warning!("Missing value for {arg}");
                        return ParsedArgs {
                            action: CliAction::ShowHelpDueToError,
                        };
                    };
                    if matches!(arg, "--config" | "-c") {
                        config_dir = Some(value.clone());
                    } else {
                        log_file = Some(value.clone());
                    }
                    idx += 1;
                }
                _ if arg.starts_with('-') => {
                    if !unknown_arg_found {
                        log_warning!("Unknown argument: {arg}");
                        unknown_arg_found = true;
                    }
                }
                _ => positionals.push(arg.to_string()),
            }
            idx += 1;
        }

        // Version and help take precedence over everything else
        if display_version {
            return ParsedArgs {
                action: CliAction::ShowVersion,
            };
        }
        if display_help {
            return ParsedArgs {
                action: CliAction::ShowHelp,
            };
        }
        if unknown_arg_found {
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        let mut positionals = positionals.into_iter();
        let action = match positionals.next().as_deref() {
            None => CliAction::ShowHelp,
            Some("simulate" | "sim") => {
                let Some(scenario) = positionals.next() else {
                    log_warning!("Missing scenario file. Usage: scrimctl simulate <scenario.toml>");
                    return ParsedArgs {
                        action: CliAction::ShowHelpDueToError,
                    };
                };
                CliAction::Simulate {
                    debug_enabled,
                    config_dir,
                    scenario,
                    json,
                    log_file,
                }
            }
            Some("states" | "st") => CliAction::States {
                debug_enabled,
                config_dir,
                json,
            },
            Some("help") => {
                return ParsedArgs {
                    action: CliAction::HelpCommand {
                        command: positionals.next(),
                    },
                };
            }
            Some(unknown) => {
                log_warning!("Unknown command: {unknown}");
                CliAction::ShowHelpDueToError
            }
        };

        if let Some(extra) = positionals.next() {
            log_warning!("Unexpected argument: {extra}");
            return ParsedArgs {
                action: CliAction::ShowHelpDueToError,
            };
        }

        ParsedArgs { action }
    }

    /// Convenience method to parse from std::env::args()
    pub fn from_env() -> ParsedArgs {
        Self::parse(std::env::args())
    }
}

/// Displays version information using custom logging style.
pub fn display_version_info() {
    log_version!();
    log_pipe!();
    log_indented!(env!("CARGO_PKG_DESCRIPTION"));
    log_end!();
}

/// Displays custom help message using logger methods.
pub fn display_help() {
    log_version!();
    log_block_start!(env!("CARGO_PKG_DESCRIPTION"));
    log_block_start!("Usage:");
    log_indented!("scrimctl [OPTIONS] <COMMAND>");
    log_block_start!("Options:");
    log_indented!("-c, --config <dir>     Use custom configuration directory");
    log_indented!("-d, --debug            Enable detailed debug output");
    log_indented!("-j, --json             Print machine-readable JSON");
    log_indented!("-l, --log <file>       Also write output to a log file");
    log_indented!("-h, --help             Print help information");
    log_indented!("-V, --version          Print version information");
    log_block_start!("Commands:");
    log_indented!("simulate, sim <file>   Replay a scenario and print the frame trace");
    log_indented!("states, st             Print the resolved targets of every state");
    log_indented!("help [COMMAND]         Show detailed help for a command");
    log_end!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_no_args() {
        let parsed = ParsedArgs::parse(vec!["scrimctl"]);
        assert_eq!(parsed.action, CliAction::ShowHelp);
    }

    #[test]
    fn test_parse_simulate() {
        let parsed = ParsedArgs::parse(vec!["scrimctl", "simulate", "unlock.toml"]);
        assert_eq!(
            parsed.action,
            CliAction::Simulate {
                debug_enabled: false,
                config_dir: None,
                scenario: "unlock.toml".to_string(),
                json: false,
                log_file: None,
            }
        );
    }

    #[test]
    fn test_parse_simulate_with_flags_anywhere() {
        let parsed = ParsedArgs::parse(vec![
            "scrimctl",
            "-d",
            "sim",
            "aod.toml",
            "--json",
            "--config",
            "/tmp/scrim",
            "-l",
            "trace.log",
        ]);
        assert_eq!(
            parsed.action,
            CliAction::Simulate {
                debug_enabled: true,
                config_dir: Some("/tmp/scrim".to_string()),
                scenario: "aod.toml".to_string(),
                json: true,
                log_file: Some("trace.log".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_simulate_without_scenario() {
        let parsed = ParsedArgs::parse(vec!["scrimctl", "simulate"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_states() {
        let parsed = ParsedArgs::parse(vec!["scrimctl", "states", "--json"]);
        assert_eq!(
            parsed.action,
            CliAction::States {
                debug_enabled: false,
                config_dir: None,
                json: true,
            }
        );
    }

    #[test]
    fn test_parse_help_command() {
        let parsed = ParsedArgs::parse(vec!["scrimctl", "help", "simulate"]);
        assert_eq!(
            parsed.action,
            CliAction::HelpCommand {
                command: Some("simulate".to_string())
            }
        );
    }

    #[test]
    fn test_parse_help_and_version_flags() {
        assert_eq!(
            ParsedArgs::parse(vec!["scrimctl", "-h"]).action,
            CliAction::ShowHelp
        );
        assert_eq!(
            ParsedArgs::parse(vec!["scrimctl", "states", "--help"]).action,
            CliAction::ShowHelp
        );
        assert_eq!(
            ParsedArgs::parse(vec!["scrimctl", "--version"]).action,
            CliAction::ShowVersion
        );
    }

    #[test]
    fn test_version_takes_precedence() {
        let parsed = ParsedArgs::parse(vec!["scrimctl", "--help", "-V"]);
        assert_eq!(parsed.action, CliAction::ShowVersion);
    }

    #[test]
    fn test_parse_unknown_flag() {
        let parsed = ParsedArgs::parse(vec!["scrimctl", "states", "--bogus"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_unknown_command() {
        let parsed = ParsedArgs::parse(vec!["scrimctl", "daemon"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_config_without_value() {
        let parsed = ParsedArgs::parse(vec!["scrimctl", "states", "--config"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }

    #[test]
    fn test_parse_extra_positional() {
        let parsed = ParsedArgs::parse(vec!["scrimctl", "simulate", "a.toml", "b.toml"]);
        assert_eq!(parsed.action, CliAction::ShowHelpDueToError);
    }
}
