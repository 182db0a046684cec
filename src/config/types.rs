//! Configuration types.
//!
//! This module defines the cache configuration struct and the enums used to
//! set up logging.

use std::time::Duration;

use serde::Deserialize;

use crate::config::constants::{
    DEFAULT_TTL_SECS, DNS_PORT, DNS_TIMEOUT_SECS, MIN_INTERVAL, RETRY_INTERVAL_SECS,
    STALE_HOST_AFTER, SWEEP_INTERVAL,
};

/// Logging level for the application.
///
/// Controls the verbosity of log output, from most restrictive (Error) to most
/// verbose (Trace).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format.
///
/// - `Plain`: Human-readable format with colors (default)
/// - `Json`: Structured JSON format for machine parsing
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    #[default]
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Cache configuration.
///
/// Every field has a default matching the constants in
/// [`crate::config`]. Durations are expressed in whole seconds when the struct
/// is deserialized.
///
/// # Examples
///
/// ```
/// use dns_cache::CacheConfig;
/// use std::time::Duration;
///
/// let config = CacheConfig {
///     retry_interval: Duration::from_secs(2),
///     ..Default::default()
/// };
/// assert_eq!(config.default_ttl, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// TTL floor, also used for OS resolver results
    #[serde(with = "seconds")]
    pub default_ttl: Duration,

    /// Delay before retrying a failed refresh
    #[serde(with = "seconds")]
    pub retry_interval: Duration,

    /// Inactivity after which implicit hosts are evicted
    #[serde(with = "seconds")]
    pub stale_after: Duration,

    /// Period of the eviction sweep
    #[serde(with = "seconds")]
    pub sweep_interval: Duration,

    /// Per-exchange timeout handed to the transport
    #[serde(with = "seconds")]
    pub query_timeout: Duration,

    /// Port nameservers listen on
    pub dns_port: u16,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            retry_interval: Duration::from_secs(RETRY_INTERVAL_SECS),
            stale_after: STALE_HOST_AFTER,
            sweep_interval: SWEEP_INTERVAL,
            query_timeout: Duration::from_secs(DNS_TIMEOUT_SECS),
            dns_port: DNS_PORT,
        }
    }
}

impl CacheConfig {
    /// Raises the TTL floor, retry delay and sweep period to at least
    /// [`MIN_INTERVAL`] so refresh and sweep loops always wait between rounds.
    ///
    /// Resolvers apply this to the configuration they are given.
    pub fn normalized(mut self) -> Self {
        self.default_ttl = self.default_ttl.max(MIN_INTERVAL);
        self.retry_interval = self.retry_interval.max(MIN_INTERVAL);
        self.sweep_interval = self.sweep_interval.max(MIN_INTERVAL);
        self
    }

    /// TTL floor in whole seconds, as compared against record TTLs. Never zero.
    pub(crate) fn default_ttl_secs(&self) -> u32 {
        u32::try_from(self.default_ttl.as_secs())
            .unwrap_or(u32::MAX)
            .max(1)
    }
}

mod seconds {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_matches_constants() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(60));
        assert_eq!(config.retry_interval, Duration::from_secs(10));
        assert_eq!(config.stale_after, Duration::from_secs(1800));
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
        assert_eq!(config.dns_port, 53);
        assert_eq!(config.default_ttl_secs(), 60);
    }

    #[test]
    fn test_config_deserializes_seconds_with_defaults() {
        let config: CacheConfig =
            serde_json::from_str(r#"{"default_ttl": 30, "stale_after": 120}"#)
                .expect("config should parse");
        assert_eq!(config.default_ttl, Duration::from_secs(30));
        assert_eq!(config.stale_after, Duration::from_secs(120));
        // Unspecified fields keep their defaults
        assert_eq!(config.retry_interval, Duration::from_secs(10));
        assert_eq!(config.dns_port, 53);
    }

    #[test]
    fn test_normalized_raises_zero_intervals() {
        let config = CacheConfig {
            default_ttl: Duration::ZERO,
            retry_interval: Duration::ZERO,
            sweep_interval: Duration::from_millis(5),
            stale_after: Duration::ZERO,
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.default_ttl, MIN_INTERVAL);
        assert_eq!(config.retry_interval, MIN_INTERVAL);
        assert_eq!(config.sweep_interval, MIN_INTERVAL);
        // Staleness is a threshold, not a wait, so zero is kept
        assert_eq!(config.stale_after, Duration::ZERO);

        let defaults = CacheConfig::default();
        assert_eq!(defaults.clone().normalized(), defaults);
    }

    #[test]
    fn test_sub_second_ttl_floor_rounds_up() {
        let config = CacheConfig {
            default_ttl: Duration::from_millis(500),
            ..Default::default()
        };
        assert_eq!(config.default_ttl_secs(), 1);
    }

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(log::LevelFilter::from(LogLevel::Warn), log::LevelFilter::Warn);
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn test_log_format_deserializes_lowercase() {
        let format: LogFormat = serde_json::from_str("\"json\"").expect("format should parse");
        assert_eq!(format, LogFormat::Json);
        assert_eq!(LogFormat::default(), LogFormat::Plain);
    }
}
