//! Structured logging system with visual formatting.
//!
//! This module provides the logging used across scrimctl. Output follows a box-drawing
//! layout: blocks are opened with `┣`, nested details are indented under `┃`, and the
//! semantic levels (`[INFO]`, `[WARNING]`, `[ERROR]`, `[DEBUG]`) carry a colored tag.
//!
//! Every macro renders one [`LineStyle`] through [`Log::emit`], which owns the enable
//! switches, the optional timestamp prefix and the routing to stdout or a log file.
//! The logger supports runtime enable/disable for quiet operation in tests and in the
//! JSON trace mode of the simulator, and a separate debug switch so that the per-frame
//! controller chatter stays silent unless `--debug` was requested.

use std::fmt;
use std::io::Write;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Sender, channel};

static LOGGING_ENABLED: AtomicBool = AtomicBool::new(true);
static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static TIMESTAMPS_ENABLED: AtomicBool = AtomicBool::new(false);

// Channel for routing output to file when a log file is active
static LOG_CHANNEL: OnceLock<Sender<LogMessage>> = OnceLock::new();

enum LogMessage {
    Formatted(String),
    Shutdown,
}

/// Shape of a single logged line.
///
/// - **`BlockStart`**: opens a new conceptual block (state change, scenario step).
///   An empty pipe `┃` for spacing, then `┣ message`.
/// - **`Decorated`**: a line inside the current block, `┣ message`.
/// - **`Indented`**: nested detail, `┃   message`.
/// - **`Pipe`**: a single empty `┃` line for vertical spacing.
/// - **`Version`** / **`End`**: header and final marker of a CLI run.
/// - **`Info`**, **`Warning`**, **`Error`**, **`Debug`**: semantic levels with a colored
///   `[LEVEL]` tag. `Debug` lines only print when debug output is enabled.
/// - **`ErrorExit`**: an error that ends the current flow, drawn with a closing corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    BlockStart,
    Decorated,
    Indented,
    Pipe,
    Version,
    End,
    Info,
    Warning,
    Error,
    ErrorExit,
    Debug,
}

impl LineStyle {
    fn level_tag(self) -> Option<(&'static str, &'static str)> {
        match self {
            LineStyle::Info => Some(("32", "INFO")),
            LineStyle::Warning => Some(("33", "WARNING")),
            LineStyle::Error | LineStyle::ErrorExit => Some(("31", "ERROR")),
            LineStyle::Debug => Some(("36", "DEBUG")),
            _ => None,
        }
    }

    /// Render `message` in this style, one `prefix` per output line.
    pub fn render(self, prefix: &str, message: fmt::Arguments<'_>) -> String {
        if let Some((color, tag)) = self.level_tag() {
            let corner = if self == LineStyle::ErrorExit {
                format!("{prefix}┃\n{prefix}┗")
            } else {
                format!("{prefix}┣")
            };
            return format!("{corner}[\x1b[{color}m{tag}\x1b[0m] {message}\n");
        }
        match self {
            LineStyle::BlockStart => format!("{prefix}┃\n{prefix}┣ {message}\n"),
            LineStyle::Decorated => format!("{prefix}┣ {message}\n"),
            LineStyle::Indented => format!("{prefix}┃   {message}\n"),
            LineStyle::Pipe => format!("{prefix}┃\n"),
            LineStyle::Version => {
                format!("{prefix}┏ scrimctl v{} ━━╸\n", env!("CARGO_PKG_VERSION"))
            }
            _ => format!("{prefix}╹\n"),
        }
    }
}

/// Main logging interface. See [`LineStyle`] for the layout conventions.
pub struct Log;

impl Log {
    /// Enable or disable logging temporarily.
    pub fn set_enabled(enabled: bool) {
        LOGGING_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if logging is currently enabled.
    pub fn is_enabled() -> bool {
        LOGGING_ENABLED.load(Ordering::SeqCst)
    }

    /// Enable or disable `log_debug!` output.
    pub fn set_debug(enabled: bool) {
        DEBUG_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Check if debug output is enabled.
    pub fn is_debug_enabled() -> bool {
        Self::is_enabled() && DEBUG_ENABLED.load(Ordering::SeqCst)
    }

    /// Prefix every line with a wall-clock timestamp.
    pub fn set_timestamps(enabled: bool) {
        TIMESTAMPS_ENABLED.store(enabled, Ordering::SeqCst);
    }

    /// Write one line in `style`. Used by the logging macros.
    pub fn emit(style: LineStyle, message: fmt::Arguments<'_>) {
        let enabled = if style == LineStyle::Debug {
            Self::is_debug_enabled()
        } else {
            Self::is_enabled()
        };
        if enabled {
            write_output(&style.render(&Self::get_timestamp_prefix(), message));
        }
    }

    /// Start file logging to the specified path.
    ///
    /// Output is written by a background thread until the returned guard is dropped.
    /// Color codes are stripped from everything written to the file.
    pub fn start_file_logging(file_path: String) -> anyhow::Result<LoggerGuard> {
        let (tx, rx) = channel();

        LOG_CHANNEL
            .set(tx.clone())
            .map_err(|_| anyhow::anyhow!("Logger channel already initialized"))?;

        let handle = std::thread::spawn(move || {
            let mut file = std::fs::File::create(&file_path)?;

            while let Ok(LogMessage::Formatted(text)) = rx.recv() {
                file.write_all(text.as_bytes())?;
            }
            file.flush()?;

            Ok::<(), anyhow::Error>(())
        });

        Ok(LoggerGuard {
            tx,
            handle: Some(handle),
        })
    }

    /// Timestamp prefix for each line, or an empty string when timestamps are off.
    pub fn get_timestamp_prefix() -> String {
        if TIMESTAMPS_ENABLED.load(Ordering::SeqCst) {
            format!("[{}] ", chrono::Local::now().format("%H:%M:%S%.3f"))
        } else {
            String::new()
        }
    }
}

/// Guard for file logging that ensures clean shutdown.
pub struct LoggerGuard {
    tx: Sender<LogMessage>,
    handle: Option<std::thread::JoinHandle<anyhow::Result<()>>>,
}

impl Drop for LoggerGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(LogMessage::Shutdown);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn strip_ansi_codes(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '\x1b' && chars.peek() == Some(&'[') {
            // Skip up to and including the terminating 'm'
            chars.by_ref().find(|&c| c == 'm');
        } else {
            result.push(ch);
        }
    }

    result
}

/// Route rendered output to the log file when one is active, stdout otherwise.
pub fn write_output(text: &str) {
    if let Some(tx) = LOG_CHANNEL.get() {
        let _ = tx.send(LogMessage::Formatted(strip_ansi_codes(text)));
    } else {
        let mut stdout = std::io::stdout().lock();
        let _ = stdout.write_all(text.as_bytes());
        let _ = stdout.flush();
    }
}

// # Logging Macros
//
// Each macro takes either a format string with arguments or a single `Display` value.

#[doc(hidden)]
#[macro_export]
macro_rules! __log_line {
    ($style:ident, $fmt:literal $($arg:tt)*) => {
        $crate::logger::Log::emit(
            $crate::logger::LineStyle::$style,
            format_args!($fmt $($arg)*),
        )
    };
    ($style:ident, $expr:expr) => {
        $crate::logger::Log::emit($crate::logger::LineStyle::$style, format_args!("{}", $expr))
    };
}

/// Log a line inside the current block.
#[macro_export]
macro_rules! log_decorated {
    ($($arg:tt)+) => { $crate::__log_line!(Decorated, $($arg)+) };
}

/// Log an indented detail line.
#[macro_export]
macro_rules! log_indented {
    ($($arg:tt)+) => { $crate::__log_line!(Indented, $($arg)+) };
}

/// Log an empty pipe line for vertical spacing.
#[macro_export]
macro_rules! log_pipe {
    () => { $crate::__log_line!(Pipe, "") };
}

/// Open a new block.
#[macro_export]
macro_rules! log_block_start {
    ($($arg:tt)+) => { $crate::__log_line!(BlockStart, $($arg)+) };
}

/// Log the application version header.
#[macro_export]
macro_rules! log_version {
    () => { $crate::__log_line!(Version, "") };
}

/// Log the final termination marker.
#[macro_export]
macro_rules! log_end {
    () => { $crate::__log_line!(End, "") };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)+) => { $crate::__log_line!(Info, $($arg)+) };
}

#[macro_export]
macro_rules! log_warning {
    ($($arg:tt)+) => { $crate::__log_line!(Warning, $($arg)+) };
}

#[macro_export]
macro_rules! log_error {
    ($($arg:tt)+) => { $crate::__log_line!(Error, $($arg)+) };
}

/// Log an error that ends the current flow.
#[macro_export]
macro_rules! log_error_exit {
    ($($arg:tt)+) => { $crate::__log_line!(ErrorExit, $($arg)+) };
}

/// Log a debug message. Silent unless `Log::set_debug(true)` was called.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)+) => { $crate::__log_line!(Debug, $($arg)+) };
}
