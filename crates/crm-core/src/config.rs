use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_DATA_FILE, DEFAULT_POLL_INTERVAL_SECS,
    DEFAULT_POLL_MAX_INTERVAL_SECS, DEFAULT_REQUEST_TIMEOUT_SECS, ENV_API_URL, ENV_DATA_FILE,
};
use crate::error::{CrmError, Result};

/// Core configuration, loadable from a JSON file. Every field has a default
/// so `{}` is a valid config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct CoreConfig {
    /// Base URL every API route is resolved against
    pub api_base_url: String,
    /// Static JSON payload with users/prospects/leads/visits/sales
    pub data_file: PathBuf,
    pub request_timeout_secs: u64,
    pub poll: PollConfig,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PollConfig {
    pub interval_secs: u64,
    /// Upper bound for the failure backoff
    pub max_interval_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            poll: PollConfig::default(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            max_interval_secs: DEFAULT_POLL_MAX_INTERVAL_SECS,
        }
    }
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_interval(&self) -> Duration {
        Duration::from_secs(self.max_interval_secs.max(self.interval_secs))
    }
}

impl CoreConfig {
    /// Load config from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CrmError::io(path, e))?;
        let config = Self::from_json(&content)?;
        Ok(config)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: CoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `CRM_API_URL` / `CRM_DATA_FILE` overrides from the environment
    pub fn apply_env(self) -> Result<Self> {
        self.with_overrides(
            std::env::var(ENV_API_URL).ok(),
            std::env::var(ENV_DATA_FILE).ok(),
        )
    }

    /// Replace the base URL and data file with any non-blank override, then
    /// validate the result
    pub fn with_overrides(
        mut self,
        api_url: Option<String>,
        data_file: Option<String>,
    ) -> Result<Self> {
        if let Some(url) = api_url.filter(|url| !url.trim().is_empty()) {
            self.api_base_url = url;
        }
        if let Some(path) = data_file.filter(|path| !path.trim().is_empty()) {
            self.data_file = PathBuf::from(path);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return Err(CrmError::Config {
                message: format!("apiBaseUrl must be an http(s) URL, got {:?}", self.api_base_url),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(CrmError::Config {
                message: "requestTimeoutSecs must be greater than zero".to_string(),
            });
        }
        if self.poll.interval_secs == 0 {
            return Err(CrmError::Config {
                message: "poll.intervalSecs must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}
