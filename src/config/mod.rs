//! Application configuration loading and validation.
//!
//! The top-level `Config` aggregates logging, broker, sensor and warmup
//! settings. It is loaded once at startup from a TOML file and stays
//! immutable afterwards. Every section has full defaults, so an empty file
//! (or a missing section) yields a runnable configuration apart from the
//! broker address, which must be set explicitly.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use validator::Validate;

use self::{logger::LoggerConfig, mqtt::MqttConfig, sensors::SensorConfig, warmup::WarmupConfig};

pub mod logger;
pub mod mqtt;
pub mod sensors;
pub mod warmup;

/// Timestamped console messages for the window before the tracing
/// subscriber exists, used during configuration loading.
#[macro_export]
macro_rules! print_info {
    ($($arg:tt)*) => {
        println!("{}  {} {}",
            console::style(
                time::OffsetDateTime::now_utc()
                    .format(&time::format_description::parse(
                        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
                    ).unwrap())
                    .unwrap()
            ).dim(),
            console::style("INFO").green(),
            format_args!($($arg)*)
        );
    };
}

#[macro_export]
macro_rules! print_error {
    ($($arg:tt)*) => {
        println!("{}  {} {}",
            console::style(
                time::OffsetDateTime::now_utc()
                    .format(&time::format_description::parse(
                        "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]Z"
                    ).unwrap())
                    .unwrap()
            ).dim(),
            console::style("ERROR").red(),
            format_args!($($arg)*)
        );
    };
}

/// Errors that can occur while locating, parsing or validating the
/// configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Generic configuration error with a descriptive message.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error while accessing the configuration file.
    #[error("IO error while reading configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Failure to parse the TOML configuration file.
    #[error("Parse error while reading configuration: {0}")]
    Parse(String),

    /// Validation failure after successful parsing.
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level application configuration.
#[derive(Serialize, Deserialize, Debug, Validate, Clone, Default)]
#[serde(default)]
pub struct Config {
    /// Logging subsystem configuration.
    #[validate(nested)]
    pub logger: LoggerConfig,

    /// Broker connection and publishing configuration.
    #[validate(nested)]
    pub mqtt: MqttConfig,

    /// Which sensors to bring up.
    #[validate(nested)]
    pub sensors: SensorConfig,

    /// Startup warmup timing.
    #[validate(nested)]
    pub warmup: WarmupConfig,
}

impl Config {
    /// Locates and loads the configuration file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be found, read, parsed or
    /// validated.
    pub fn new() -> Result<Self, ConfigError> {
        let config_path = Self::config_path()?;
        Self::load(&config_path)
    }

    /// Determines the configuration file path.
    ///
    /// Priority:
    /// 1. `ENVIRO_MQTT_CONFIG` environment variable
    /// 2. `./configuration.toml`
    /// 3. `/etc/enviro-mqtt/config.toml`
    fn config_path() -> Result<PathBuf, ConfigError> {
        if let Ok(config_path) = std::env::var("ENVIRO_MQTT_CONFIG") {
            let path = PathBuf::from(config_path);
            print_info!("Using config from ENVIRO_MQTT_CONFIG: {}", path.display());
            return Ok(path);
        }

        for fallback in [
            Path::new("configuration.toml"),
            Path::new("/etc/enviro-mqtt/config.toml"),
        ] {
            if fallback.exists() {
                print_info!("Using config path: {}", fallback.display());
                return Ok(fallback.to_path_buf());
            }
        }

        Err(ConfigError::Config(
            "No configuration file found.".to_string(),
        ))
    }

    /// Loads and validates the configuration at `path`.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        print_info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::Config(path.to_string_lossy().to_string()));
        }

        let config_str = fs::read_to_string(path)?;
        let config: Config =
            toml::from_str(&config_str).map_err(|e| ConfigError::Parse(e.to_string()))?;

        config
            .validate()
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        Ok(config)
    }
}
