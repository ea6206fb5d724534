//! Logging to the terminal and the session log file

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use std::fmt::Arguments;
use colored::{ColoredString, Colorize};
use fern::{Dispatch, FormatCallback};
use log::{info, Level, Record};
use thiserror::Error;

use crate::session::{self, Session};

pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

/// Dependencies which are too verbose below `Info`.
const QUIET_TARGETS: [&str; 2] = ["image", "csv"];

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("The minimum log level must include Info messages, found {0}")]
    InvalidMinLogLevel(LevelFilter),

    #[error("Cannot open the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("A logger has already been set: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Send log records to stdout and to the session's log file.
///
/// Each line starts with the seconds elapsed since the session epoch and a
/// level tag. Debug and trace lines also include the record's target.
///
/// `min_level` must be `Info` or more verbose. Only one logger can be set per
/// process.
pub fn logger_init(min_level: LevelFilter, session: &Session) -> Result<(), LoggerInitError> {
    if min_level < Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(min_level));
    }

    let log_file = fern::log_file(&session.log_file_path)
        .map_err(LoggerInitError::LogFileInitError)?;

    QUIET_TARGETS
        .iter()
        .fold(Dispatch::new().level(min_level), |d, t| d.level_for(*t, LevelFilter::Info))
        .format(format_record)
        .chain(std::io::stdout())
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;

    info!("Logging to {:?} at {:?}", session.log_file_path, min_level);
    if let Some(e) = session::epoch() {
        info!("Session epoch {}", e);
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn format_record(out: FormatCallback, message: &Arguments, record: &Record) {
    let t = session::elapsed_seconds().unwrap_or(std::f64::NAN);

    if record.level() > Level::Info {
        out.finish(format_args!(
            "[{:10.6} {}] {}: {}", t, level_tag(record.level()), record.target(), message
        ))
    }
    else {
        out.finish(format_args!("[{:10.6} {}] {}", t, level_tag(record.level()), message))
    }
}

fn level_tag(level: Level) -> ColoredString {
    match level {
        Level::Trace => "TRC".dimmed().italic(),
        Level::Debug => "DBG".dimmed(),
        Level::Info => "INF".normal(),
        Level::Warn => "WRN".yellow(),
        Level::Error => "ERR".red().bold()
    }
}
