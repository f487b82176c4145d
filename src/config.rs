use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::crawl::{FAILURE_DELAY, MAX_CONSECUTIVE_FAILURES};
use crate::dhlottery::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
use crate::error::LottoError;

pub const DEFAULT_CONFIG_FILE: &str = "lotto-sync.json";
pub const DEFAULT_DATA_FILE: &str = "winning_numbers.js";

/// On-disk config shape; every field optional.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub data_file: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub max_consecutive_failures: Option<u32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub failure_delay_ms: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub data_file: Utf8PathBuf,
    pub base_url: String,
    pub max_consecutive_failures: u32,
    pub timeout: Duration,
    pub failure_delay: Duration,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            data_file: Utf8PathBuf::from(DEFAULT_DATA_FILE),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_consecutive_failures: MAX_CONSECUTIVE_FAILURES,
            timeout: DEFAULT_TIMEOUT,
            failure_delay: FAILURE_DELAY,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// Resolves configuration. An absent default config file silently
    /// yields the defaults; an explicitly requested path that cannot be
    /// read is an error.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, LottoError> {
        let (config_path, required) = match path {
            Some(path) => (PathBuf::from(path), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        };

        if !config_path.exists() {
            if required {
                return Err(LottoError::ConfigRead(config_path));
            }
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| LottoError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| LottoError::ConfigParse(err.to_string()))?;

        Ok(Self::resolve_config(config))
    }

    pub fn resolve_config(config: Config) -> ResolvedConfig {
        let defaults = ResolvedConfig::default();
        ResolvedConfig {
            data_file: config
                .data_file
                .map(Utf8PathBuf::from)
                .unwrap_or(defaults.data_file),
            base_url: config.base_url.unwrap_or(defaults.base_url),
            max_consecutive_failures: config
                .max_consecutive_failures
                .unwrap_or(defaults.max_consecutive_failures),
            timeout: config
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            failure_delay: config
                .failure_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.failure_delay),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_resolves_to_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default());
        assert_eq!(resolved.data_file, DEFAULT_DATA_FILE);
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
        assert_eq!(resolved.max_consecutive_failures, MAX_CONSECUTIVE_FAILURES);
        assert_eq!(resolved.timeout, DEFAULT_TIMEOUT);
        assert_eq!(resolved.failure_delay, FAILURE_DELAY);
    }

    #[test]
    fn partial_config_keeps_remaining_defaults() {
        let config = Config {
            data_file: Some("data/draws.js".to_string()),
            timeout_secs: Some(10),
            ..Config::default()
        };
        let resolved = ConfigLoader::resolve_config(config);
        assert_eq!(resolved.data_file, "data/draws.js");
        assert_eq!(resolved.timeout, Duration::from_secs(10));
        assert_eq!(resolved.base_url, DEFAULT_BASE_URL);
    }
}
