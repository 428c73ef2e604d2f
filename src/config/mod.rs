#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

use crate::utils::error::{Result, SongError};
use crate::utils::logger::LogFormat;
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const JOURNAL_MODES: [&str; 6] = ["DELETE", "TRUNCATE", "PERSIST", "MEMORY", "WAL", "OFF"];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub enrichment: EnrichmentConfig,
    pub service: ServiceConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub journal_mode: Option<String>,
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("songs.db"),
            journal_mode: Some("WAL".to_string()),
            busy_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnrichmentConfig {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// End-to-end deadline per service operation; unbounded when absent.
    pub operation_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

fn parse_env_number(key: &str, value: &str) -> Result<u64> {
    value.trim().parse().map_err(|_| SongError::Config {
        message: format!("{} must be a non-negative integer, got '{}'", key, value),
    })
}

impl AppConfig {
    /// Defaults, then the TOML file (if given), then `.env` and the process
    /// environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };

        if let Err(e) = dotenvy::dotenv() {
            tracing::debug!("No .env file loaded: {}", e);
        }
        config.apply_env_from(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Overrides fields from `DB_PATH`, `EXTERNAL_API_BASE_URL`,
    /// `EXTERNAL_API_TIMEOUT_SECS`, `OPERATION_TIMEOUT_SECS`, `LOG_LEVEL` and
    /// `LOG_FORMAT`. Empty values are ignored.
    pub fn apply_env_from<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.is_empty());

        if let Some(path) = get("DB_PATH") {
            self.database.path = PathBuf::from(path);
        }
        if let Some(url) = get("EXTERNAL_API_BASE_URL") {
            self.enrichment.base_url = url;
        }
        if let Some(secs) = get("EXTERNAL_API_TIMEOUT_SECS") {
            self.enrichment.timeout_secs = parse_env_number("EXTERNAL_API_TIMEOUT_SECS", &secs)?;
        }
        if let Some(secs) = get("OPERATION_TIMEOUT_SECS") {
            self.service.operation_timeout_secs =
                Some(parse_env_number("OPERATION_TIMEOUT_SECS", &secs)?);
        }
        if let Some(level) = get("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = get("LOG_FORMAT") {
            self.logging.format = format;
        }
        Ok(())
    }

    pub fn operation_timeout(&self) -> Option<Duration> {
        self.service.operation_timeout_secs.map(Duration::from_secs)
    }

    pub fn log_format(&self) -> LogFormat {
        LogFormat::parse(&self.logging.format).unwrap_or(LogFormat::Compact)
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("database.path", &self.database.path.to_string_lossy())?;

        if let Some(mode) = &self.database.journal_mode {
            if !JOURNAL_MODES.contains(&mode.to_ascii_uppercase().as_str()) {
                return Err(SongError::validation(
                    "database.journal_mode",
                    format!(
                        "Unsupported journal mode '{}'. Valid modes: {}",
                        mode,
                        JOURNAL_MODES.join(", ")
                    ),
                ));
            }
        }

        validation::validate_url("enrichment.base_url", &self.enrichment.base_url)?;
        validation::validate_positive_number("enrichment.timeout_secs", self.enrichment.timeout_secs, 1)?;

        if let Some(secs) = self.service.operation_timeout_secs {
            validation::validate_positive_number("service.operation_timeout_secs", secs, 1)?;
        }

        if LogFormat::parse(&self.logging.format).is_none() {
            return Err(SongError::validation(
                "logging.format",
                format!("Unsupported log format '{}'. Use compact or json", self.logging.format),
            ));
        }
        validation::validate_non_empty_string("logging.level", &self.logging.level)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.enrichment.base_url, "http://localhost:3000");
        assert_eq!(config.enrichment.timeout_secs, 5);
        assert_eq!(config.operation_timeout(), None);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_env_from(lookup(&[
                ("DB_PATH", "/tmp/library.db"),
                ("EXTERNAL_API_BASE_URL", "http://music-info:8081"),
                ("EXTERNAL_API_TIMEOUT_SECS", "9"),
                ("OPERATION_TIMEOUT_SECS", "30"),
                ("LOG_FORMAT", ""),
            ]))
            .unwrap();

        assert_eq!(config.database.path, PathBuf::from("/tmp/library.db"));
        assert_eq!(config.enrichment.base_url, "http://music-info:8081");
        assert_eq!(config.enrichment.timeout_secs, 9);
        assert_eq!(config.operation_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.logging.format, "compact");
    }

    #[test]
    fn test_env_rejects_bad_numbers() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env_from(lookup(&[("EXTERNAL_API_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, SongError::Config { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.enrichment.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.journal_mode = Some("wal; DROP TABLE songs".to_string());
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.database.journal_mode = Some("truncate".to_string());
        assert!(config.validate().is_ok());
    }
}
