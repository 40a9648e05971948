//! Tagged, leveled logging for the control surface
//!
//! Standard log levels (Error/Warning/Info/Debug/Verbose) with per-module
//! debug control via `--debug-<module>` flags and colored console output.
//!
//! ## Usage
//!
//! ```ignore
//! use tradedeck::logger::{self, LogTag};
//!
//! logger::info(LogTag::Webserver, "Gateway listening");
//! logger::debug(LogTag::Cache, "portfolio entry stale");   // only with --debug-cache
//! ```

use colored::*;
use std::io::{stdout, ErrorKind, Write};

use crate::arguments;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,   // gated by --debug-<module>
    Verbose = 4, // gated by --verbose
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Verbose => "VERBOSE",
        }
    }
}

/// Source module of a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    Webserver,
    Cache,
    Control,
    Scheduler,
    Dispatcher,
    Daemon,
    Config,
    System,
}

impl LogTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::Webserver => "WEBSERVER",
            LogTag::Cache => "CACHE",
            LogTag::Control => "CONTROL",
            LogTag::Scheduler => "SCHEDULER",
            LogTag::Dispatcher => "DISPATCHER",
            LogTag::Daemon => "DAEMON",
            LogTag::Config => "CONFIG",
            LogTag::System => "SYSTEM",
        }
    }

    /// Key used for `--debug-<module>` flag matching
    pub fn debug_key(&self) -> &'static str {
        match self {
            LogTag::Webserver => "webserver",
            LogTag::Cache => "cache",
            LogTag::Control | LogTag::Dispatcher => "control",
            LogTag::Scheduler => "scheduler",
            LogTag::Daemon => "daemon",
            LogTag::Config | LogTag::System => "system",
        }
    }
}

/// Initialize the logger. Arguments must be parsed first so debug flags apply.
pub fn init() {
    info(LogTag::System, "Logger initialized");
}

pub fn error(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Error, message);
}

pub fn warning(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Warning, message);
}

pub fn info(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Info, message);
}

/// Only shown when the matching `--debug-<module>` flag is set
pub fn debug(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Debug, message);
}

/// Only shown with `--verbose`
pub fn verbose(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Verbose, message);
}

fn should_log(tag: &LogTag, level: LogLevel) -> bool {
    match level {
        // Errors always log
        LogLevel::Error | LogLevel::Warning | LogLevel::Info => true,
        LogLevel::Debug => {
            arguments::is_debug_enabled(tag.debug_key()) || arguments::is_verbose_enabled()
        }
        LogLevel::Verbose => arguments::is_verbose_enabled(),
    }
}

fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if !should_log(&tag, level) {
        return;
    }

    let time = chrono::Local::now().format("%H:%M:%S").to_string();
    let tag_str = format_tag(&tag);
    let level_str = format_level(level);

    let line = format!("{} [{}] [{}] {}", time.dimmed(), tag_str, level_str, message);
    print_stdout_safe(&line);
}

fn format_tag(tag: &LogTag) -> ColoredString {
    let padded = format!("{:<10}", tag.as_str());
    match tag {
        LogTag::Webserver => padded.cyan(),
        LogTag::Cache => padded.blue(),
        LogTag::Control | LogTag::Dispatcher => padded.magenta(),
        LogTag::Scheduler => padded.yellow(),
        LogTag::Daemon => padded.green(),
        LogTag::Config | LogTag::System => padded.white(),
    }
}

fn format_level(level: LogLevel) -> ColoredString {
    let s = format!("{:<7}", level.as_str());
    match level {
        LogLevel::Error => s.red().bold(),
        LogLevel::Warning => s.yellow(),
        LogLevel::Info => s.green(),
        LogLevel::Debug => s.blue(),
        LogLevel::Verbose => s.dimmed(),
    }
}

/// Print that tolerates a closed pipe (e.g. `tradedeck | head`)
fn print_stdout_safe(line: &str) {
    let mut out = stdout();
    if let Err(e) = writeln!(out, "{}", line) {
        if e.kind() == ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
    }
}
