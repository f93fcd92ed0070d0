//! # Configuration
//!
//! [`AppConfig`] holds every tunable of the system. Values come from, in order of
//! precedence:
//!
//! 1. `SHELFWATCH_*` environment variables
//! 2. an optional TOML file
//! 3. built-in defaults
//!
//! ```toml
//! api_base_url = "http://127.0.0.1:5001"
//! stream_endpoint = "http://127.0.0.1:5000/api/v1/result"
//! tick_period_ms = 2500
//! ```

use crate::dispatch::MAX_UPLOAD_BYTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const ENV_PREFIX: &str = "SHELFWATCH_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config TOML: {0}")]
    Parse(String),

    #[error("Invalid value {value:?} for {key}")]
    InvalidValue { key: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Base URL of the upload/query/listing backend.
    pub api_base_url: String,
    /// Server-sent events endpoint for analysis results.
    pub stream_endpoint: String,
    pub tick_period_ms: u64,
    pub max_upload_bytes: u64,
    /// Capacity of the simulator request channel.
    pub channel_buffer: usize,
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5001".into(),
            stream_endpoint: "http://127.0.0.1:5000/api/v1/result".into(),
            tick_period_ms: 2500,
            max_upload_bytes: MAX_UPLOAD_BYTES,
            channel_buffer: 32,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Reads `path` if given, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_toml_str(&content)?
            }
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Overrides fields from `lookup`, which maps a full variable name such as
    /// `SHELFWATCH_TICK_PERIOD_MS` to its value.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        let var = |name: &str| lookup(&format!("{ENV_PREFIX}{name}"));

        if let Some(value) = var("API_BASE_URL") {
            self.api_base_url = value;
        }
        if let Some(value) = var("STREAM_ENDPOINT") {
            self.stream_endpoint = value;
        }
        override_parsed(&mut self.tick_period_ms, "TICK_PERIOD_MS", var("TICK_PERIOD_MS"))?;
        override_parsed(
            &mut self.max_upload_bytes,
            "MAX_UPLOAD_BYTES",
            var("MAX_UPLOAD_BYTES"),
        )?;
        override_parsed(&mut self.channel_buffer, "CHANNEL_BUFFER", var("CHANNEL_BUFFER"))?;
        override_parsed(
            &mut self.request_timeout_secs,
            "REQUEST_TIMEOUT_SECS",
            var("REQUEST_TIMEOUT_SECS"),
        )?;
        Ok(())
    }

    pub fn tick_period(&self) -> Duration {
        Duration::from_millis(self.tick_period_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let zero = |key: &str| ConfigError::InvalidValue {
            key: key.to_string(),
            value: "0".into(),
        };
        if self.tick_period_ms == 0 {
            return Err(zero("tick_period_ms"));
        }
        if self.channel_buffer == 0 {
            return Err(zero("channel_buffer"));
        }
        if self.request_timeout_secs == 0 {
            return Err(zero("request_timeout_secs"));
        }
        // The limit can be lowered, never raised past 50 MiB.
        if self.max_upload_bytes == 0 || self.max_upload_bytes > MAX_UPLOAD_BYTES {
            return Err(ConfigError::InvalidValue {
                key: "max_upload_bytes".into(),
                value: self.max_upload_bytes.to_string(),
            });
        }
        Ok(())
    }
}

fn override_parsed<T: FromStr>(
    field: &mut T,
    name: &str,
    value: Option<String>,
) -> Result<(), ConfigError> {
    if let Some(value) = value {
        *field = value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: format!("{ENV_PREFIX}{name}"),
                value,
            })?;
    }
    Ok(())
}
