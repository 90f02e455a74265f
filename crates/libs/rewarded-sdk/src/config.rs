use rewarded_core::{
    RetryPolicy, API_VERSION, CUSTOM_DATA_MAX_LENGTH_BYTES, MAX_RETRIES, REQUEST_TIMEOUT_DELAY_MS,
    RETRY_TIMES_MS, SDK_VERSION,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode config: {0}")]
    Decode(#[from] toml::de::Error),
    #[error("failed to encode config: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RewardedConfig {
    pub sdk_version: String,
    pub api_version: String,
    pub custom_data_max_length_bytes: usize,
    pub completion: CompletionConfig,
}

impl Default for RewardedConfig {
    fn default() -> Self {
        Self {
            sdk_version: SDK_VERSION.to_owned(),
            api_version: API_VERSION.to_owned(),
            custom_data_max_length_bytes: CUSTOM_DATA_MAX_LENGTH_BYTES,
            completion: CompletionConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CompletionConfig {
    pub max_retries: u32,
    pub request_timeout_ms: u64,
    pub retry_times_ms: Vec<u64>,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            request_timeout_ms: REQUEST_TIMEOUT_DELAY_MS,
            retry_times_ms: RETRY_TIMES_MS.to_vec(),
        }
    }
}

impl CompletionConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry_times_ms.iter().copied().map(Duration::from_millis).collect(),
            self.max_retries,
            Duration::from_millis(self.request_timeout_ms),
        )
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_retries == 0 {
            return Err(ConfigError::Invalid("completion.max_retries must be >= 1".to_owned()));
        }
        if self.retry_times_ms.is_empty() {
            return Err(ConfigError::Invalid(
                "completion.retry_times_ms must not be empty".to_owned(),
            ));
        }
        if let Some(short) =
            self.retry_times_ms.iter().find(|delay| **delay < self.request_timeout_ms)
        {
            return Err(ConfigError::Invalid(format!(
                "completion.retry_times_ms entry {short} is below request_timeout_ms {}",
                self.request_timeout_ms
            )));
        }
        if self.retry_times_ms.windows(2).any(|pair| pair[1] < pair[0]) {
            return Err(ConfigError::Invalid(
                "completion.retry_times_ms must be ascending".to_owned(),
            ));
        }
        Ok(())
    }
}

impl RewardedConfig {
    pub fn from_toml(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_toml(&raw)
    }

    pub fn example_toml() -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(&Self::default())?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sdk_version.trim().is_empty() || self.api_version.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "sdk_version and api_version must not be empty".to_owned(),
            ));
        }
        self.completion.validate()
    }
}
