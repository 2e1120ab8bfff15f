//! Loading and saving the configuration file.
//!
//! Configuration lives at `~/.tollgate/config.toml` unless a different base
//! directory is given. A missing file yields [`Config::default`].
//!
//! # Examples
//!
//! ```no_run
//! use tollgate_core::config_loader::ConfigLoader;
//!
//! let loader = ConfigLoader::new().expect("home directory");
//! if !loader.exists() {
//!     loader.write_default().expect("write default config");
//! }
//! let config = loader.load().expect("load config");
//! println!("timelock: {}", config.guardian.timelock_period);
//! ```

use crate::config::Config;
use crate::error::ConfigError;
use std::fs;
use std::path::{Path, PathBuf};

/// Name of the configuration file inside the base directory.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Name of the base directory inside the home directory.
const BASE_DIR_NAME: &str = ".tollgate";

/// Reads and writes `config.toml` under a base directory.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    base_dir: PathBuf,
}

impl ConfigLoader {
    /// Creates a loader rooted at `~/.tollgate`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoHomeDirectory`] if the home directory cannot
    /// be determined.
    pub fn new() -> Result<Self, ConfigError> {
        let base_dir = default_base_dir()?;
        Ok(Self { base_dir })
    }

    /// Creates a loader rooted at `base_dir`.
    #[must_use]
    pub const fn with_base_dir(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Full path of the configuration file.
    #[must_use]
    pub fn config_path(&self) -> PathBuf {
        self.base_dir.join(CONFIG_FILE_NAME)
    }

    /// The base directory.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Loads the configuration, falling back to defaults when the file is
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, is not valid
    /// TOML, or fails [`Config::validate`].
    pub fn load(&self) -> Result<Config, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            tracing::debug!(path = %config_path.display(), "no configuration file, using defaults");
            return Ok(Config::default());
        }

        Self::load_from_path(&config_path)
    }

    /// Loads the configuration, failing when the file is missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::FileNotFound`] if the file does not exist, and
    /// the same errors as [`ConfigLoader::load`] otherwise.
    pub fn load_required(&self) -> Result<Config, ConfigError> {
        let config_path = self.config_path();

        if !config_path.exists() {
            return Err(ConfigError::file_not_found(
                config_path.display().to_string(),
            ));
        }

        Self::load_from_path(&config_path)
    }

    /// Writes `config` to the configuration file, creating the base
    /// directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or any filesystem operation fails.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        self.ensure_base_dir()?;

        let config_path = self.config_path();

        let toml_str = toml::to_string_pretty(config).map_err(|e| {
            ConfigError::parse_failed(format!("failed to serialize configuration: {e}"))
        })?;

        fs::write(&config_path, toml_str).map_err(|e| {
            ConfigError::io(
                format!("failed to write configuration to {}", config_path.display()),
                e,
            )
        })?;

        Ok(())
    }

    /// Writes the commented default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any filesystem operation fails.
    pub fn write_default(&self) -> Result<(), ConfigError> {
        self.ensure_base_dir()?;

        let config_path = self.config_path();

        fs::write(&config_path, Config::default_toml()).map_err(|e| {
            ConfigError::io(
                format!(
                    "failed to write default configuration to {}",
                    config_path.display()
                ),
                e,
            )
        })?;

        Ok(())
    }

    /// Returns `true` if the configuration file exists.
    #[must_use]
    pub fn exists(&self) -> bool {
        self.config_path().exists()
    }

    fn ensure_base_dir(&self) -> Result<(), ConfigError> {
        if !self.base_dir.exists() {
            fs::create_dir_all(&self.base_dir).map_err(|e| {
                ConfigError::io(
                    format!(
                        "failed to create base directory {}",
                        self.base_dir.display()
                    ),
                    e,
                )
            })?;
        }
        Ok(())
    }

    fn load_from_path(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)
            .map_err(|e| ConfigError::io(format!("failed to read {}", path.display()), e))?;

        let config: Config = toml::from_str(&content).map_err(|e| {
            ConfigError::parse_failed(format!("invalid TOML in {}: {e}", path.display()))
        })?;

        config.validate()?;
        Ok(config)
    }
}

/// Expands a leading `~` to the home directory.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if the path starts with `~` and
/// the home directory cannot be determined.
pub fn expand_path(path: &str) -> Result<PathBuf, ConfigError> {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
        Ok(home.join(rest))
    } else if path == "~" {
        dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)
    } else {
        Ok(PathBuf::from(path))
    }
}

/// The default base directory, `~/.tollgate`.
///
/// # Errors
///
/// Returns [`ConfigError::NoHomeDirectory`] if the home directory cannot be
/// determined.
pub fn default_base_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDirectory)?;
    Ok(home.join(BASE_DIR_NAME))
}

/// Loads the configuration from the default location.
///
/// # Errors
///
/// See [`ConfigLoader::new`] and [`ConfigLoader::load`].
pub fn load_config() -> Result<Config, ConfigError> {
    ConfigLoader::new()?.load()
}
