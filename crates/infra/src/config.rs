//! Pipeline configuration.

use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::pipeline::retry::RetryPolicy;
use crate::read_model::{MAX_ALERTS, MAX_FORECASTS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var}: cannot parse '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(var: &'static str, value: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            var,
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Settings for the simulator/forecaster pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub tick_interval: Duration,
    pub forecast_window_days: u32,
    pub max_alerts: usize,
    pub max_forecasts: usize,
    /// Ledger attempts per tick, first call included.
    pub append_attempts: u32,
    pub retry_base_delay: Duration,
    pub restart_backoff: Duration,
    pub seed: Option<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(15),
            forecast_window_days: 30,
            max_alerts: MAX_ALERTS,
            max_forecasts: MAX_FORECASTS,
            append_attempts: 3,
            retry_base_delay: Duration::from_millis(200),
            restart_backoff: Duration::from_secs(1),
            seed: None,
        }
    }
}

impl PipelineConfig {
    /// Read `SHELFWATCH_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let d = Self::default();
        Ok(Self {
            tick_interval: Duration::from_secs(positive(
                &lookup,
                "SHELFWATCH_TICK_SECS",
                d.tick_interval.as_secs(),
            )?),
            forecast_window_days: positive(
                &lookup,
                "SHELFWATCH_FORECAST_WINDOW_DAYS",
                d.forecast_window_days,
            )?,
            max_alerts: positive(&lookup, "SHELFWATCH_MAX_ALERTS", d.max_alerts)?,
            max_forecasts: positive(&lookup, "SHELFWATCH_MAX_FORECASTS", d.max_forecasts)?,
            append_attempts: positive(&lookup, "SHELFWATCH_APPEND_RETRIES", d.append_attempts)?,
            retry_base_delay: Duration::from_millis(parse(
                &lookup,
                "SHELFWATCH_RETRY_BASE_MS",
                d.retry_base_delay.as_millis() as u64,
            )?),
            restart_backoff: Duration::from_millis(parse(
                &lookup,
                "SHELFWATCH_RESTART_BACKOFF_MS",
                d.restart_backoff.as_millis() as u64,
            )?),
            seed: match lookup("SHELFWATCH_SEED") {
                Some(raw) if !raw.trim().is_empty() => {
                    Some(raw.trim().parse().map_err(|e: std::num::ParseIntError| {
                        ConfigError::invalid("SHELFWATCH_SEED", raw.clone(), e.to_string())
                    })?)
                }
                _ => None,
            },
        })
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval = interval;
        self
    }

    pub fn with_forecast_window_days(mut self, days: u32) -> Self {
        self.forecast_window_days = days;
        self
    }

    pub fn with_capacities(mut self, max_alerts: usize, max_forecasts: usize) -> Self {
        self.max_alerts = max_alerts;
        self.max_forecasts = max_forecasts;
        self
    }

    pub fn with_retry(mut self, attempts: u32, base_delay: Duration) -> Self {
        self.append_attempts = attempts;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn with_restart_backoff(mut self, backoff: Duration) -> Self {
        self.restart_backoff = backoff;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn forecast_window(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.forecast_window_days))
    }

    /// Exponential backoff for ledger calls, capped at 25x the base delay.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::exponential(
            self.append_attempts,
            self.retry_base_delay,
            self.retry_base_delay.saturating_mul(25),
        )
    }
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::invalid(var, raw.clone(), e.to_string())),
        _ => Ok(default),
    }
}

fn positive<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + Default + Copy + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    let value = parse(lookup, var, default)?;
    if value <= T::default() {
        return Err(ConfigError::invalid(var, value.to_string(), "must be greater than zero"));
    }
    Ok(value)
}
