//! Worker pool configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Sizing of the default worker pool.
///
/// The pool starts with no worker threads, spawns one whenever a job arrives
/// and every thread is busy (up to `max_threads`), and lets a thread exit after
/// it has been idle for `keep_alive_ms`. Jobs beyond `max_threads` wait inside
/// the pool; submission itself never blocks.
///
/// Every field has a default, so `{}` is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    pub max_threads: usize,
    pub keep_alive_ms: u64,
    pub thread_name: String,
}

impl PoolConfig {
    pub const DEFAULT_MAX_THREADS: usize = 512;
    pub const DEFAULT_KEEP_ALIVE_MS: u64 = 60_000;

    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        let config: PoolConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_threads == 0 {
            return Err(ConfigError::Invalid("max_threads must be at least 1".into()));
        }
        if self.thread_name.trim().is_empty() {
            return Err(ConfigError::Invalid("thread_name must not be empty".into()));
        }
        Ok(())
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }

    pub fn with_max_threads(mut self, max_threads: usize) -> Self {
        self.max_threads = max_threads;
        self
    }

    pub fn with_keep_alive(mut self, keep_alive: Duration) -> Self {
        self.keep_alive_ms = u64::try_from(keep_alive.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_threads: Self::DEFAULT_MAX_THREADS,
            keep_alive_ms: Self::DEFAULT_KEEP_ALIVE_MS,
            thread_name: "calcq-worker".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn empty_object_uses_defaults() {
        let config = PoolConfig::from_json_str("{}").unwrap();
        assert_eq!(config, PoolConfig::default());
        assert_eq!(config.keep_alive(), Duration::from_secs(60));
    }

    #[test]
    fn fields_override_defaults() {
        let config =
            PoolConfig::from_json_str(r#"{"max_threads": 4, "keep_alive_ms": 250}"#).unwrap();
        assert_eq!(config.max_threads, 4);
        assert_eq!(config.keep_alive(), Duration::from_millis(250));
        assert_eq!(config.thread_name, "calcq-worker");
    }

    #[rstest]
    #[case::zero_threads(r#"{"max_threads": 0}"#)]
    #[case::blank_name(r#"{"thread_name": "  "}"#)]
    fn invalid_values_are_rejected(#[case] raw: &str) {
        assert!(matches!(
            PoolConfig::from_json_str(raw),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            PoolConfig::from_json_str("{max_threads:"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        assert!(matches!(
            PoolConfig::from_path("/definitely/not/here/calcq.json"),
            Err(ConfigError::Io(_))
        ));
    }

    #[test]
    fn builders_adjust_fields() {
        let config = PoolConfig::default()
            .with_max_threads(2)
            .with_keep_alive(Duration::from_millis(10));
        assert_eq!(config.max_threads, 2);
        assert_eq!(config.keep_alive_ms, 10);
    }
}
