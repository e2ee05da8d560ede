//! Logging setup for binaries: console plus daily-rolling log files.

use std::path::PathBuf;
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

#[derive(Debug, Error)]
pub enum LogSetupError {
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },

    #[error("Failed to create log directory '{path}': {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create log file appender: {0}")]
    Appender(String),

    #[error("Logging already initialized")]
    AlreadyInitialized,
}

/// Where and how much to log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG`.
    pub level: String,
    pub directory: PathBuf,
    /// Files are named `<file_prefix>.<date>.log`.
    pub file_prefix: String,
    /// Number of daily files kept.
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: PathBuf::from("logs"),
            file_prefix: "cleaning".to_string(),
            max_log_files: 5,
        }
    }
}

impl LogConfig {
    pub fn new(level: &str, file_prefix: &str) -> Self {
        Self {
            level: level.to_string(),
            file_prefix: file_prefix.to_string(),
            ..Self::default()
        }
    }

    fn env_filter(&self) -> Result<EnvFilter, LogSetupError> {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .map_err(|e| LogSetupError::Filter {
                filter: self.level.clone(),
                reason: e.to_string(),
            })
    }
}

/// Install the global subscriber. Warnings and errors also go to stderr.
/// Can only succeed once per process.
pub fn setup_logging(config: &LogConfig) -> Result<(), LogSetupError> {
    if LOG_GUARD.get().is_some() {
        return Err(LogSetupError::AlreadyInitialized);
    }

    let env_filter = config.env_filter()?;

    std::fs::create_dir_all(&config.directory).map_err(|source| LogSetupError::Directory {
        path: config.directory.clone(),
        source,
    })?;

    let file_appender = tracing_appender::rolling::Builder::new()
        .rotation(tracing_appender::rolling::Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .filename_suffix("log")
        .max_log_files(config.max_log_files)
        .build(&config.directory)
        .map_err(|e| LogSetupError::Appender(e.to_string()))?;

    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);
    LOG_GUARD
        .set(guard)
        .map_err(|_| LogSetupError::AlreadyInitialized)?;

    let console_writer = std::io::stdout.and(std::io::stderr.with_max_level(Level::WARN));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(true)
        .with_writer(console_writer);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(file_writer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|_| LogSetupError::AlreadyInitialized)
}
