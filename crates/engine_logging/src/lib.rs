#![deny(missing_docs)]
//! Shared logging utilities for the dealflow workspace.
//!
//! This crate provides the `flow_*` logging macros used across the codebase,
//! the process logger initializer used by the host, and a minimal test
//! initializer for the global logger.

use std::fs::File;
use std::path::{Path, PathBuf};

pub use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Default log file, relative to the current working directory.
pub const DEFAULT_LOG_FILE: &str = "./dealflow.log";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! flow_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! flow_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! flow_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! flow_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! flow_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    /// Write to [`DEFAULT_LOG_FILE`].
    File,
    /// Write to the terminal.
    Terminal,
    /// Write to both file and terminal.
    Both,
}

/// Installs the process-wide logger.
///
/// A log file that cannot be created is reported on stderr and replaced by a
/// terminal logger, so [`LogDestination::File`] still logs somewhere.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    initialize_with_path(destination, level, Path::new(DEFAULT_LOG_FILE));
}

/// Same as [`initialize`] with an explicit log file path.
pub fn initialize_with_path(destination: LogDestination, level: LevelFilter, path: &Path) {
    let _ = CombinedLogger::init(build_loggers(destination, level, path));
}

fn build_loggers(
    destination: LogDestination,
    level: LevelFilter,
    path: &Path,
) -> Vec<Box<dyn SharedLogger>> {
    let config = build_config();
    let mut terminal = matches!(destination, LogDestination::Terminal | LogDestination::Both);

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if matches!(destination, LogDestination::File | LogDestination::Both) {
        match create_file_logger(level, config.clone(), path.to_path_buf()) {
            Some(file_logger) => loggers.push(file_logger),
            None => terminal = true,
        }
    }
    if terminal {
        loggers.push(TermLogger::new(
            level,
            config,
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    loggers
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    log_path: PathBuf,
) -> Option<Box<WriteLogger<File>>> {
    match File::create(&log_path) {
        Ok(file) => Some(WriteLogger::new(level, config, file)),
        Err(err) => {
            eprintln!(
                "Warning: Could not create log file at {:?}: {}; logging to the terminal",
                log_path, err
            );
            None
        }
    }
}
