//! Main application configuration
//!
//! This module defines the primary configuration structures for the epa-engine
//! batch runner, including environment variable loading and validation.

use crate::config::rating::RatingConfig;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub batch: BatchSettings,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Batch execution settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    /// Size of the per-team worker pool
    pub worker_threads: usize,
    /// Recompute carry against other teams' preliminary ratings
    pub two_phase: bool,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "epa-engine".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            worker_threads: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            two_phase: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file, then apply environment overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(threads) = env::var("WORKER_THREADS") {
            self.batch.worker_threads = threads
                .parse()
                .map_err(|_| anyhow!("Invalid WORKER_THREADS value: {}", threads))?;
        }
        if let Ok(two_phase) = env::var("TWO_PHASE") {
            self.batch.two_phase = two_phase
                .parse()
                .map_err(|_| anyhow!("Invalid TWO_PHASE value: {}", two_phase))?;
        }
        if let Ok(cutoff) = env::var("LEGACY_CUTOFF_SEASON") {
            self.rating.legacy_cutoff_season = cutoff
                .parse()
                .map_err(|_| anyhow!("Invalid LEGACY_CUTOFF_SEASON value: {}", cutoff))?;
        }
        if let Ok(epsilon) = env::var("EPA_EPSILON") {
            self.rating.epsilon = epsilon
                .parse()
                .map_err(|_| anyhow!("Invalid EPA_EPSILON value: {}", epsilon))?;
        }
        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    if config.batch.worker_threads == 0 {
        return Err(anyhow!("Worker threads must be greater than 0"));
    }

    config.rating.validate()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
        assert!(config.batch.worker_threads > 0);
        assert!(!config.batch.two_phase);
    }

    #[test]
    fn test_invalid_log_level() {
        let mut config = AppConfig::default();
        config.service.log_level = "loud".to_string();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let mut config = AppConfig::default();
        config.batch.worker_threads = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_invalid_rating_config_rejected() {
        let mut config = AppConfig::default();
        config.rating.dominance_divisor = 0.0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_toml_round_trip_sections() {
        let toml_str = r#"
            [service]
            log_level = "debug"

            [batch]
            worker_threads = 2
            two_phase = true

            [rating]
            legacy_cutoff_season = 2010
        "#;
        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.service.log_level, "debug");
        assert_eq!(config.service.name, "epa-engine");
        assert_eq!(config.batch.worker_threads, 2);
        assert!(config.batch.two_phase);
        assert_eq!(config.rating.legacy_cutoff_season, 2010);
        assert!(validate_config(&config).is_ok());
    }
}
