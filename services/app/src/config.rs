//! services/app/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;

/// Storage file used when `CINNARIOS_STORAGE_PATH` is unset.
pub const DEFAULT_STORAGE_PATH: &str = "./cinnarios-storage.json";

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub log_level: Level,
    /// `None` keeps everything in memory for the lifetime of the process.
    pub storage_path: Option<PathBuf>,
    /// Simulated round trip of every identity call.
    pub auth_latency: Duration,
    /// Probability in `[0, 1]` that an identity call fails with a network error.
    pub auth_failure_rate: f64,
    /// Group calendar days by the local time zone instead of UTC.
    pub use_local_time: bool,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable lookup.
    pub fn from_vars<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let log_level_str = var("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Storage ---
        let storage_path = match var("CINNARIOS_STORAGE_PATH") {
            None => Some(PathBuf::from(DEFAULT_STORAGE_PATH)),
            Some(path) if path.trim().is_empty() || path == ":memory:" => None,
            Some(path) => Some(PathBuf::from(path)),
        };

        // --- Simulated Identity Service ---
        let auth_latency = match var("CINNARIOS_AUTH_LATENCY_MS") {
            None => Duration::from_millis(1500),
            Some(raw) => raw.trim().parse::<u64>().map(Duration::from_millis).map_err(|e| {
                ConfigError::InvalidValue("CINNARIOS_AUTH_LATENCY_MS".to_string(), e.to_string())
            })?,
        };

        let auth_failure_rate = match var("CINNARIOS_AUTH_FAILURE_RATE") {
            None => 0.1,
            Some(raw) => {
                let rate = raw.trim().parse::<f64>().map_err(|e| {
                    ConfigError::InvalidValue(
                        "CINNARIOS_AUTH_FAILURE_RATE".to_string(),
                        e.to_string(),
                    )
                })?;
                if !(0.0..=1.0).contains(&rate) {
                    return Err(ConfigError::InvalidValue(
                        "CINNARIOS_AUTH_FAILURE_RATE".to_string(),
                        format!("{} is outside 0..=1", rate),
                    ));
                }
                rate
            }
        };

        let use_local_time = match var("CINNARIOS_USE_LOCAL_TIME") {
            None => false,
            Some(raw) => match raw.trim().to_lowercase().as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                other => {
                    return Err(ConfigError::InvalidValue(
                        "CINNARIOS_USE_LOCAL_TIME".to_string(),
                        format!("'{}' is not a boolean", other),
                    ))
                }
            },
        };

        Ok(Self {
            log_level,
            storage_path,
            auth_latency,
            auth_failure_rate,
            use_local_time,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.log_level, Level::INFO);
        assert_eq!(config.storage_path, Some(PathBuf::from(DEFAULT_STORAGE_PATH)));
        assert_eq!(config.auth_latency, Duration::from_millis(1500));
        assert_eq!(config.auth_failure_rate, 0.1);
        assert!(!config.use_local_time);
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("RUST_LOG", "debug"),
            ("CINNARIOS_STORAGE_PATH", ":memory:"),
            ("CINNARIOS_AUTH_LATENCY_MS", "0"),
            ("CINNARIOS_AUTH_FAILURE_RATE", "0"),
            ("CINNARIOS_USE_LOCAL_TIME", "true"),
        ])
        .unwrap();
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.storage_path, None);
        assert_eq!(config.auth_latency, Duration::ZERO);
        assert_eq!(config.auth_failure_rate, 0.0);
        assert!(config.use_local_time);
    }

    #[test]
    fn test_invalid_values() {
        assert!(matches!(
            config_from(&[("CINNARIOS_AUTH_FAILURE_RATE", "1.5")]),
            Err(ConfigError::InvalidValue(name, _)) if name == "CINNARIOS_AUTH_FAILURE_RATE"
        ));
        assert!(config_from(&[("CINNARIOS_AUTH_LATENCY_MS", "soon")]).is_err());
        assert!(config_from(&[("RUST_LOG", "loud")]).is_err());
        assert!(config_from(&[("CINNARIOS_USE_LOCAL_TIME", "maybe")]).is_err());
    }
}
