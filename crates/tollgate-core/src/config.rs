//! Configuration types for the Tollgate transfer guard.
//!
//! Configuration is stored in TOML format at `~/.tollgate/config.toml`.
//!
//! # Examples
//!
//! ```
//! use tollgate_core::config::Config;
//! use tollgate_core::clock::TimeBase;
//!
//! let config = Config::default();
//! assert_eq!(config.guardian.timelock_period, 86_400);
//! assert!(config.guardian.enforce_timelock);
//! assert_eq!(config.clock.time_base, TimeBase::BlockNumber);
//! ```
//!
//! # Default TOML Output
//!
//! ```toml
//! [guardian]
//! timelock_period = 86400
//! enforce_timelock = true
//!
//! [clock]
//! time_base = "block_number"
//!
//! [logging]
//! level = "info"
//! format = "pretty"
//! ```

use crate::clock::TimeBase;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Log levels accepted in `logging.level`.
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Log formats accepted in `logging.format`.
pub const LOG_FORMATS: [&str; 3] = ["pretty", "json", "compact"];

/// Top-level configuration.
///
/// # Examples
///
/// ```
/// use tollgate_core::config::Config;
///
/// let toml_str = r#"
/// [guardian]
/// timelock_period = 100
///
/// [clock]
/// time_base = "timestamp"
/// "#;
///
/// let config: Config = toml::from_str(toml_str).expect("valid TOML");
/// assert_eq!(config.guardian.timelock_period, 100);
/// assert!(config.guardian.enforce_timelock);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Guardian registry settings.
    #[serde(default)]
    pub guardian: GuardianConfig,

    /// Time source settings.
    #[serde(default)]
    pub clock: ClockConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[must_use]
const fn default_timelock_period() -> u64 {
    86_400
}

#[must_use]
const fn default_enforce_timelock() -> bool {
    true
}

/// Guardian registry settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuardianConfig {
    /// Delay between proposing and executing a refund, in clock units.
    ///
    /// Default: 86400
    #[serde(default = "default_timelock_period")]
    pub timelock_period: u64,

    /// Whether `execute_refund` waits for the timelock to elapse.
    ///
    /// Default: `true`
    #[serde(default = "default_enforce_timelock")]
    pub enforce_timelock: bool,
}

impl Default for GuardianConfig {
    fn default() -> Self {
        Self {
            timelock_period: default_timelock_period(),
            enforce_timelock: default_enforce_timelock(),
        }
    }
}

/// Time source settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClockConfig {
    /// Which counter windows and timelocks are measured in.
    #[serde(default)]
    pub time_base: TimeBase,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Minimum level: trace, debug, info, warn or error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format: pretty, json or compact.
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional log file. Logs go to stdout when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if:
    /// - `logging.level` is not a known level
    /// - `logging.format` is not a known format
    /// - `logging.file` is set but empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.logging.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.level",
                &self.logging.level,
            ));
        }

        let format = self.logging.format.to_ascii_lowercase();
        if !LOG_FORMATS.contains(&format.as_str()) {
            return Err(ConfigError::invalid_value(
                "logging.format",
                &self.logging.format,
            ));
        }

        if self.logging.file.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::invalid_value("logging.file", "<empty>"));
        }

        Ok(())
    }

    /// Generates the default configuration as a TOML string.
    ///
    /// ```
    /// use tollgate_core::config::Config;
    ///
    /// let toml = Config::default_toml();
    /// assert!(toml.contains("[guardian]"));
    /// assert!(toml.contains("[clock]"));
    /// ```
    #[must_use]
    pub fn default_toml() -> String {
        r#"[guardian]
# Delay between proposing and executing a refund, in clock units
timelock_period = 86400
enforce_timelock = true

[clock]
# "block_number" or "timestamp"
time_base = "block_number"

[logging]
level = "info"
format = "pretty"
# file = "~/.tollgate/tollgate.log"
"#
        .to_string()
    }

    /// Creates a configuration builder for customizing values.
    #[must_use]
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }
}

/// Builder for creating customized [`Config`] instances.
///
/// ```
/// use tollgate_core::config::ConfigBuilder;
/// use tollgate_core::clock::TimeBase;
///
/// let config = ConfigBuilder::new()
///     .timelock_period(10)
///     .enforce_timelock(false)
///     .time_base(TimeBase::Timestamp)
///     .build();
///
/// assert_eq!(config.guardian.timelock_period, 10);
/// assert!(!config.guardian.enforce_timelock);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Creates a new configuration builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Sets the refund timelock period.
    #[must_use]
    pub const fn timelock_period(mut self, period: u64) -> Self {
        self.config.guardian.timelock_period = period;
        self
    }

    /// Enables or disables the timelock check on refund execution.
    #[must_use]
    pub const fn enforce_timelock(mut self, enforce: bool) -> Self {
        self.config.guardian.enforce_timelock = enforce;
        self
    }

    /// Sets the clock base.
    #[must_use]
    pub const fn time_base(mut self, base: TimeBase) -> Self {
        self.config.clock.time_base = base;
        self
    }

    /// Sets the log level.
    #[must_use]
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Builds the final configuration.
    #[must_use]
    pub fn build(self) -> Config {
        self.config
    }
}
