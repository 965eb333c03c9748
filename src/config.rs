//! Configuration for the heatmap engine.

use crate::core::window::DEFAULT_YEAR_OPTIONS;
use crate::core::zone::Zone;
use crate::source::SyntheticConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Largest accepted `events_per_day`; a batch holds this many events per
/// window day.
pub const MAX_EVENTS_PER_DAY: u32 = 1_000;

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pause between two synthetic batches
    #[serde(with = "duration_serde")]
    pub batch_interval: Duration,

    /// Synthetic batch size as a multiple of the window's day count
    pub events_per_day: u32,

    /// How many recent years the year filter offers
    pub year_options: usize,

    /// IANA zone defining local midnight; the system zone when unset
    pub timezone: Option<String>,

    /// Fixed seed for the synthetic generator
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            batch_interval: Duration::from_secs(3),
            events_per_day: 2,
            year_options: DEFAULT_YEAR_OPTIONS,
            timezone: None,
            seed: None,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("event-heatmap")
            .join("config.json")
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.year_options == 0 {
            return Err(ConfigError::InvalidValue(
                "year_options must be at least 1".to_string(),
            ));
        }
        if self.events_per_day > MAX_EVENTS_PER_DAY {
            return Err(ConfigError::InvalidValue(format!(
                "events_per_day must be at most {MAX_EVENTS_PER_DAY}, got {}",
                self.events_per_day
            )));
        }
        if self.batch_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "batch_interval must be positive".to_string(),
            ));
        }
        self.zone().map(|_| ())
    }

    /// Zone that defines local midnight.
    pub fn zone(&self) -> Result<Zone, ConfigError> {
        Zone::from_name(self.timezone.as_deref())
            .map_err(|e| ConfigError::InvalidValue(e.to_string()))
    }

    /// Settings for the synthetic event source.
    pub fn synthetic(&self) -> SyntheticConfig {
        SyntheticConfig {
            interval: self.batch_interval,
            events_per_day: self.events_per_day,
            seed: self.seed,
        }
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    InvalidValue(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::InvalidValue(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration, in milliseconds.
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.batch_interval, Duration::from_secs(3));
        assert_eq!(config.year_options, 5);
        assert_eq!(config.events_per_day, 2);
        assert!(config.validate().is_ok());
        assert_eq!(config.zone().unwrap(), Zone::Local);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: Config =
            serde_json::from_str(r#"{"batch_interval": 250, "timezone": "Europe/Berlin"}"#)
                .unwrap();
        assert_eq!(config.batch_interval, Duration::from_millis(250));
        assert_eq!(config.year_options, 5);
        assert_eq!(config.zone().unwrap(), Zone::Named(chrono_tz::Europe::Berlin));
        assert_eq!(config.synthetic().interval, Duration::from_millis(250));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = Config {
            year_options: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let config = Config {
            timezone: Some("Nowhere/Special".to_string()),
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_events_per_day_is_bounded() {
        let at_limit = Config {
            events_per_day: MAX_EVENTS_PER_DAY,
            ..Config::default()
        };
        assert!(at_limit.validate().is_ok());

        let oversized = Config {
            events_per_day: u32::MAX,
            ..Config::default()
        };
        assert!(matches!(
            oversized.validate(),
            Err(ConfigError::InvalidValue(_))
        ));
    }
}
