//! Service configuration.
//!
//! Settings come from an optional TOML file, then from the environment
//! (a `.env` file in the working directory is loaded first). Environment
//! variables win over the file; anything unset falls back to the defaults
//! below.
//!
//! ```toml
//! database_path = "Resources/hawaii.sqlite"
//! bind_address = "127.0.0.1:5000"
//! window_days = 365
//! open_end_sentinel = "none"
//!
//! [logging]
//! level = "info"
//! file = "climate_service.log"
//! timestamps = true
//! ```

use crate::logging::LogLevel;
use crate::model::DEFAULT_WINDOW_DAYS;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const ENV_DATABASE_PATH: &str = "CLIMATE_DATABASE_PATH";
pub const ENV_BIND_ADDRESS: &str = "CLIMATE_BIND_ADDRESS";
pub const ENV_LOG_LEVEL: &str = "CLIMATE_LOG_LEVEL";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{}'", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file '{}'", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    /// SQLite file holding the `station` and `measurement` tables.
    pub database_path: PathBuf,
    pub bind_address: String,
    /// Length of the trailing precipitation / temperature window.
    pub window_days: u32,
    /// Path segment that stands for "no end date" in
    /// `/api/v1.0/user_dates/{start}/{end}`. Compared case-insensitively.
    pub open_end_sentinel: String,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("Resources/hawaii.sqlite"),
            bind_address: "127.0.0.1:5000".to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
            open_end_sentinel: "none".to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            timestamps: true,
        }
    }
}

impl ServiceConfig {
    pub fn from_toml(path: &Path, text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies overrides from a variable lookup. Takes a closure rather than
    /// reading the process environment so tests stay isolated.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            self.database_path = PathBuf::from(path);
        }
        if let Some(addr) = lookup(ENV_BIND_ADDRESS) {
            self.bind_address = addr;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_days == 0 {
            return Err(ConfigError::Invalid {
                field: "window_days",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.open_end_sentinel.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "open_end_sentinel",
                reason: "must not be empty".to_string(),
            });
        }
        if self.bind_address.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "bind_address",
                reason: "must not be empty".to_string(),
            });
        }
        self.log_level()?;
        Ok(())
    }

    pub fn log_level(&self) -> Result<LogLevel, ConfigError> {
        LogLevel::parse(&self.logging.level).ok_or_else(|| ConfigError::Invalid {
            field: "logging.level",
            reason: format!(
                "'{}' is not one of debug, info, warn, error",
                self.logging.level
            ),
        })
    }
}

/// Loads configuration from `path` (skipped if the file does not exist),
/// `.env`, and the process environment, then validates the result.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let mut config = if path.exists() {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        ServiceConfig::from_toml(path, &text)?
    } else {
        ServiceConfig::default()
    };

    dotenv::dotenv().ok();
    config.apply_overrides(|key| std::env::var(key).ok());
    config.validate()?;
    Ok(config)
}
