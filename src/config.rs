//! Explorer configuration with TOML file support.

use std::{path::Path, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{aggregator::AggregatorConfig, logging::LogFormat};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Settings for talking to one network.
///
/// Every field has a default, so an empty file is a valid config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    pub network_name: String,
    pub rpc_url: String,
    /// Lockup accounts are `<hash>.<lockup_suffix>`.
    pub lockup_suffix: String,
    pub request_timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub log_format: LogFormat,
    pub log_level: String,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            network_name: "testnet".to_owned(),
            rpc_url: "https://rpc.testnet.near.org".to_owned(),
            lockup_suffix: "lockup.near".to_owned(),
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
            log_format: LogFormat::Human,
            log_level: "info".to_owned(),
        }
    }
}

impl ExplorerConfig {
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rpc_url.trim().is_empty() {
            return Err(ConfigError::Invalid("rpc_url must not be empty".to_owned()));
        }
        if self.lockup_suffix.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "lockup_suffix must not be empty".to_owned(),
            ));
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "request_timeout_secs must be positive".to_owned(),
            ));
        }
        if self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "connect_timeout_secs must be positive".to_owned(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn aggregator_config(&self) -> AggregatorConfig {
        AggregatorConfig {
            network_name: self.network_name.clone(),
            lockup_suffix: self.lockup_suffix.clone(),
        }
    }
}
