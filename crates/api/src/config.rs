//! Daemon configuration: pipeline settings plus the binary-only knobs.

use std::path::PathBuf;
use std::time::Duration;

use shelfwatch_infra::{ConfigError, PipelineConfig};
use shelfwatch_observability::LogFormat;

const DEFAULT_STATUS_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, PartialEq)]
pub struct DaemonConfig {
    pub pipeline: PipelineConfig,
    /// JSON catalog to load; the built-in sample is used when unset.
    pub catalog_path: Option<PathBuf>,
    pub log_format: LogFormat,
    pub status_interval: Duration,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            pipeline: PipelineConfig::default(),
            catalog_path: None,
            log_format: LogFormat::default(),
            status_interval: DEFAULT_STATUS_INTERVAL,
        }
    }
}

impl DaemonConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let pipeline = PipelineConfig::from_lookup(&lookup)?;

        let catalog_path = lookup("SHELFWATCH_CATALOG")
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
            .map(PathBuf::from);

        let log_format = match lookup("SHELFWATCH_LOG_FORMAT") {
            Some(raw) if !raw.trim().is_empty() => raw.parse::<LogFormat>().map_err(|_| {
                let expected = "expected json or pretty";
                ConfigError::invalid("SHELFWATCH_LOG_FORMAT", raw.clone(), expected)
            })?,
            _ => LogFormat::default(),
        };

        let status_interval = match lookup("SHELFWATCH_STATUS_SECS") {
            Some(raw) if !raw.trim().is_empty() => {
                let secs: u64 = raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                    ConfigError::invalid("SHELFWATCH_STATUS_SECS", raw.clone(), e.to_string())
                })?;
                if secs == 0 {
                    return Err(ConfigError::invalid(
                        "SHELFWATCH_STATUS_SECS",
                        raw,
                        "must be greater than zero",
                    ));
                }
                Duration::from_secs(secs)
            }
            _ => DEFAULT_STATUS_INTERVAL,
        };

        Ok(Self {
            pipeline,
            catalog_path,
            log_format,
            status_interval,
        })
    }
}
