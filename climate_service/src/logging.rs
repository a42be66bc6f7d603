//! Structured logging for the climate query service.
//!
//! Thin facade over `tracing`: every event carries the subsystem that
//! produced it and, when relevant, the station code it concerns. Output goes
//! to the console and optionally to an append-only log file.

use crate::model::QueryError;
use std::fmt;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as log_fmt, EnvFilter, Layer};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    /// Parses the names accepted in the config file.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "debug" => Some(LogLevel::Debug),
            "info" => Some(LogLevel::Info),
            "warn" | "warning" => Some(LogLevel::Warning),
            "error" => Some(LogLevel::Error),
            _ => None,
        }
    }

    fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

// ---------------------------------------------------------------------------
// Log Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogSource {
    Http,
    Database,
    System,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::Http => write!(f, "HTTP"),
            LogSource::Database => write!(f, "DB"),
            LogSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Caller or dataset condition the service reports but cannot fix
    /// (bad date input, empty dataset).
    Expected,
    /// Indicates a broken deployment: unreadable file, schema drift, failing SQL.
    Unexpected,
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Initialization
// ---------------------------------------------------------------------------

/// Installs the global subscriber.
///
/// `RUST_LOG`, when set, overrides `min_level`. Events always go to stderr;
/// with `log_file` set they are also appended to that file, without colour
/// codes. Calling this more than once keeps the first subscriber.
pub fn init_logger(
    min_level: LogLevel,
    log_file: Option<&str>,
    console_timestamps: bool,
) -> std::io::Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(min_level.as_filter().into())
        .from_env_lossy();

    let console = log_fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let console = if console_timestamps {
        console.boxed()
    } else {
        console.without_time().boxed()
    };

    let file = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                log_fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(file)
        .try_init();

    if result.is_err() {
        debug(LogSource::System, None, "logger already initialized");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

pub fn info(source: LogSource, station: Option<&str>, message: &str) {
    tracing::info!(source = %source, station = station.unwrap_or("-"), "{}", message);
}

pub fn warn(source: LogSource, station: Option<&str>, message: &str) {
    tracing::warn!(source = %source, station = station.unwrap_or("-"), "{}", message);
}

pub fn error(source: LogSource, station: Option<&str>, message: &str) {
    tracing::error!(source = %source, station = station.unwrap_or("-"), "{}", message);
}

pub fn debug(source: LogSource, station: Option<&str>, message: &str) {
    tracing::debug!(source = %source, station = station.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

pub fn classify_query_failure(err: &QueryError) -> FailureType {
    match err {
        QueryError::MalformedInput(_) | QueryError::NoData(_) => FailureType::Expected,
        QueryError::StorageUnavailable { .. }
        | QueryError::SchemaMismatch(_)
        | QueryError::CorruptDate(_) => FailureType::Unexpected,
        QueryError::Storage(_) => FailureType::Unknown,
    }
}

/// Logs a failed operation at a level matching its classification.
pub fn log_query_failure(operation: &str, err: &QueryError) {
    let failure_type = classify_query_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => warn(LogSource::Database, None, &message),
        FailureType::Unexpected | FailureType::Unknown => {
            error(LogSource::Database, None, &message)
        }
    }
}
