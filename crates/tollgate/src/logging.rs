//! # Logging Infrastructure
//!
//! Structured logging with tracing for observability.
//!
//! The library crates only emit `tracing` events. This module installs a
//! subscriber for hosts that want one: pretty, JSON or compact output on
//! stdout, optionally mirrored to a daily-rolling file.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tollgate::logging::{init_logging, LogConfig};
//!
//! let _guard = init_logging(&LogConfig::default()).expect("Failed to initialize logging");
//! tracing::info!("guard started");
//! ```
//!
//! ## From the configuration file
//!
//! ```
//! use tollgate::logging::{LogConfig, LogFormat, LogLevel};
//! use tollgate_core::config::LoggingConfig;
//!
//! let settings = LoggingConfig {
//!     level: "debug".to_string(),
//!     format: "json".to_string(),
//!     file: None,
//! };
//! let config = LogConfig::from_settings(&settings).expect("valid settings");
//! assert_eq!(config.level, LogLevel::Debug);
//! assert_eq!(config.format, LogFormat::Json);
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use tollgate_core::config::LoggingConfig;
use tollgate_core::config_loader::expand_path;
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Error type for logging initialization failures.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// Failed to create log file or directory
    #[error("Failed to create log file: {0}")]
    FileCreation(String),
    /// Failed to initialize the subscriber
    #[error("Failed to initialize logging: {0}")]
    SubscriberInit(String),
    /// Invalid configuration
    #[error("Invalid log configuration: {0}")]
    InvalidConfig(String),
}

/// Log level configuration.
///
/// Each level includes all messages from more severe levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogLevel {
    /// Most verbose: trace, debug, info, warn, error
    Trace,
    /// Verbose: debug, info, warn, error
    Debug,
    /// Standard: info, warn, error
    #[default]
    Info,
    /// Quiet: warn, error
    Warn,
    /// Quietest: error only
    Error,
}

impl LogLevel {
    /// Convert to tracing Level.
    #[must_use]
    pub const fn as_tracing_level(self) -> Level {
        match self {
            Self::Trace => Level::TRACE,
            Self::Debug => Level::DEBUG,
            Self::Info => Level::INFO,
            Self::Warn => Level::WARN,
            Self::Error => Level::ERROR,
        }
    }

    /// Get the string representation for env filter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" => Ok(Self::Warn),
            "error" => Ok(Self::Error),
            other => Err(LogError::InvalidConfig(format!("unknown log level '{other}'"))),
        }
    }
}

/// Log output format configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable pretty format (default).
    #[default]
    Pretty,
    /// JSON structured format, one object per line.
    Json,
    /// Compact single-line format.
    Compact,
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
            Self::Compact => write!(f, "compact"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            "compact" => Ok(Self::Compact),
            other => Err(LogError::InvalidConfig(format!("unknown log format '{other}'"))),
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Minimum severity. `RUST_LOG` takes precedence when set.
    pub level: LogLevel,

    /// Output format for log messages.
    pub format: LogFormat,

    /// Optional file path for logging.
    ///
    /// When set, logs are written to this file in addition to stdout. The
    /// directory is created if it doesn't exist.
    pub file_path: Option<PathBuf>,
}

impl LogConfig {
    /// Build a logging configuration from the `[logging]` table.
    ///
    /// # Errors
    ///
    /// [`LogError::InvalidConfig`] for an unknown level or format, or a file
    /// path that cannot be expanded.
    pub fn from_settings(settings: &LoggingConfig) -> Result<Self, LogError> {
        let file_path = settings
            .file
            .as_deref()
            .map(expand_path)
            .transpose()
            .map_err(|e| LogError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            level: settings.level.parse()?,
            format: settings.format.parse()?,
            file_path,
        })
    }
}

/// Guard that flushes logs on drop.
///
/// Keep it alive for as long as logging is needed; dropping it stops the
/// background file writer.
pub struct LogGuard {
    guard: Option<tracing_appender::non_blocking::WorkerGuard>,
}

impl LogGuard {
    const fn new(guard: Option<tracing_appender::non_blocking::WorkerGuard>) -> Self {
        Self { guard }
    }
}

impl std::fmt::Debug for LogGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogGuard")
            .field("has_file_guard", &self.guard.is_some())
            .finish()
    }
}

/// Initialize the logging system.
///
/// # Errors
///
/// Returns [`LogError`] if:
/// - The log file directory cannot be created
/// - The subscriber cannot be initialized (e.g., already initialized)
pub fn init_logging(config: &LogConfig) -> Result<LogGuard, LogError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.level.as_str()))
        .map_err(|e| LogError::InvalidConfig(e.to_string()))?;

    let (file_writer, guard) = if let Some(ref path) = config.file_path {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| std::path::Path::new("."));
        std::fs::create_dir_all(dir)
            .map_err(|e| LogError::FileCreation(format!("{}: {}", dir.display(), e)))?;

        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .ok_or_else(|| LogError::InvalidConfig("Invalid log file name".to_string()))?;

        let file_appender = tracing_appender::rolling::daily(dir, filename);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        (Some(non_blocking), Some(guard))
    } else {
        (None, None)
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match config.format {
        LogFormat::Pretty => {
            let file_layer = file_writer.map(|writer| {
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
            });
            registry
                .with(fmt::layer().pretty().with_target(true))
                .with(file_layer)
                .try_init()
        }
        LogFormat::Json => {
            let file_layer =
                file_writer.map(|writer| fmt::layer().json().with_writer(writer).with_target(true));
            registry
                .with(fmt::layer().json().with_target(true).with_current_span(true))
                .with(file_layer)
                .try_init()
        }
        LogFormat::Compact => {
            let file_layer = file_writer.map(|writer| {
                fmt::layer()
                    .compact()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
            });
            registry
                .with(fmt::layer().compact().with_target(true))
                .with(file_layer)
                .try_init()
        }
    };
    result.map_err(|e| LogError::SubscriberInit(e.to_string()))?;

    Ok(LogGuard::new(guard))
}
