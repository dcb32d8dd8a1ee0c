//! Subscriber setup for the `tracing` events emitted by every crate.

use std::env;
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Level filter used when no level is passed.
pub const TRACE_ENV: &str = "TRACKOPT_TRACE";
/// `pretty` (default) or `json`.
pub const LOG_FORMAT_ENV: &str = "TRACKOPT_LOG_FORMAT";
/// Optional file receiving a copy of every event.
pub const LOG_FILE_ENV: &str = "TRACKOPT_LOG_FILE";

#[derive(Debug)]
pub enum LoggingError {
    InvalidFilter(String),
    InvalidFormat(String),
    LogFile(io::Error),
    Init(String),
}

impl LoggingError {
    pub fn code(&self) -> &'static str {
        match self {
            LoggingError::InvalidFilter(_) => "LOGGING_INVALID_FILTER",
            LoggingError::InvalidFormat(_) => "LOGGING_INVALID_FORMAT",
            LoggingError::LogFile(_) => "LOGGING_LOG_FILE",
            LoggingError::Init(_) => "LOGGING_INIT",
        }
    }
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::InvalidFilter(detail) => {
                write!(f, "[{}] Invalid log filter: {detail}", self.code())
            }
            LoggingError::InvalidFormat(format) => write!(
                f,
                "[{}] Invalid {LOG_FORMAT_ENV} '{format}' (expected 'json' or 'pretty')",
                self.code()
            ),
            LoggingError::LogFile(err) => {
                write!(f, "[{}] Failed to open log file: {err}", self.code())
            }
            LoggingError::Init(detail) => {
                write!(f, "[{}] Failed to initialize logging: {detail}", self.code())
            }
        }
    }
}

impl std::error::Error for LoggingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoggingError::LogFile(err) => Some(err),
            _ => None,
        }
    }
}

fn open_log_file(path: &str) -> Result<File, LoggingError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(LoggingError::LogFile)
}

fn map_init_err<E: fmt::Display>(err: E) -> LoggingError {
    LoggingError::Init(err.to_string())
}

/// Filter for `level`, where `off` (any case) silences everything.
fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if level.eq_ignore_ascii_case("off") {
        Ok(EnvFilter::default().add_directive(LevelFilter::OFF.into()))
    } else {
        EnvFilter::try_new(level).map_err(|err| LoggingError::InvalidFilter(err.to_string()))
    }
}

/// Install a global subscriber writing to stderr.
///
/// When `level` is `None`, [`TRACE_ENV`] is read; if it is unset too,
/// logging stays off. Returns `Ok(false)` when a subscriber is already
/// installed.
pub fn enable_logging(level: Option<&str>) -> Result<bool, LoggingError> {
    if tracing::dispatcher::has_been_set() {
        return Ok(false);
    }

    let level_value = level
        .map(str::to_string)
        .or_else(|| env::var(TRACE_ENV).ok())
        .unwrap_or_else(|| "off".to_string());
    let filter = build_filter(&level_value)?;

    let format = env::var(LOG_FORMAT_ENV).unwrap_or_else(|_| "pretty".to_string());
    let log_file = env::var(LOG_FILE_ENV).ok();
    let use_json = format.eq_ignore_ascii_case("json");
    if !use_json && !format.eq_ignore_ascii_case("pretty") {
        return Err(LoggingError::InvalidFormat(format));
    }

    if use_json {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .json();
        let base = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer);
        if let Some(path) = log_file {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(open_log_file(&path)?)
                .with_ansi(false)
                .json();
            base.with(file_layer).try_init().map_err(map_init_err)?;
        } else {
            base.try_init().map_err(map_init_err)?;
        }
    } else {
        let stderr_layer = tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .pretty();
        let base = tracing_subscriber::registry()
            .with(filter)
            .with(stderr_layer);
        if let Some(path) = log_file {
            let file_layer = tracing_subscriber::fmt::layer()
                .with_writer(open_log_file(&path)?)
                .with_ansi(false)
                .pretty();
            base.with(file_layer).try_init().map_err(map_init_err)?;
        } else {
            base.try_init().map_err(map_init_err)?;
        }
    }

    Ok(true)
}
