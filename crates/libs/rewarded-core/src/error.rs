use crate::types::AdUnitId;
use serde::{Deserialize, Serialize};

/// Codes handed to listener callbacks.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ErrorCode {
    AdNotAvailable,
    RewardNotSelected,
    RewardedCurrenciesParsingError,
    NetworkError,
    NetworkNoFill,
    AdapterConfigurationError,
    VideoPlaybackError,
    Unspecified,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AdNotAvailable => "ad_not_available",
            Self::RewardNotSelected => "reward_not_selected",
            Self::RewardedCurrenciesParsingError => "rewarded_currencies_parsing_error",
            Self::NetworkError => "network_error",
            Self::NetworkNoFill => "network_no_fill",
            Self::AdapterConfigurationError => "adapter_configuration_error",
            Self::VideoPlaybackError => "video_playback_error",
            Self::Unspecified => "unspecified",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("network error (status {status:?}): {message}")]
pub struct NetworkError {
    pub status: Option<u16>,
    pub message: String,
}

impl NetworkError {
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: None, message: message.into() }
    }

    pub fn with_status(status: u16, message: impl Into<String>) -> Self {
        Self { status: Some(status), message: message.into() }
    }

    pub fn is_server_error(&self) -> bool {
        self.status.is_some_and(is_server_error_status)
    }
}

pub(crate) fn is_server_error_status(status: u16) -> bool {
    (500..=599).contains(&status)
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RewardedError {
    #[error("no rewarded ad is available for ad unit {0}")]
    AdNotAvailable(AdUnitId),
    #[error("ad unit {0} offers several rewards and none has been selected")]
    RewardNotSelected(AdUnitId),
    #[error("rewarded currencies header is malformed: {0}")]
    RewardedCurrenciesParsing(String),
    #[error(transparent)]
    Network(#[from] NetworkError),
    #[error("adapter configuration error: {0}")]
    AdapterConfiguration(String),
    #[error("rewarded ad manager is no longer running")]
    ManagerStopped,
}

impl RewardedError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AdNotAvailable(_) => ErrorCode::AdNotAvailable,
            Self::RewardNotSelected(_) => ErrorCode::RewardNotSelected,
            Self::RewardedCurrenciesParsing(_) => ErrorCode::RewardedCurrenciesParsingError,
            Self::Network(_) => ErrorCode::NetworkError,
            Self::AdapterConfiguration(_) => ErrorCode::AdapterConfigurationError,
            Self::ManagerStopped => ErrorCode::Unspecified,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_as_machine_strings() {
        let encoded =
            serde_json::to_string(&ErrorCode::RewardedCurrenciesParsingError).expect("encode");
        assert_eq!(encoded, "\"rewarded_currencies_parsing_error\"");
        assert_eq!(ErrorCode::AdNotAvailable.as_str(), "ad_not_available");
    }

    #[test]
    fn only_5xx_statuses_count_as_server_errors() {
        assert!(NetworkError::with_status(500, "internal").is_server_error());
        assert!(NetworkError::with_status(599, "edge").is_server_error());
        assert!(!NetworkError::with_status(499, "client").is_server_error());
        assert!(!NetworkError::with_status(600, "unknown").is_server_error());
        assert!(!NetworkError::new("connection reset").is_server_error());
    }

    #[test]
    fn error_variants_map_to_listener_codes() {
        let id = AdUnitId::from("unit");
        assert_eq!(RewardedError::AdNotAvailable(id.clone()).code(), ErrorCode::AdNotAvailable);
        assert_eq!(RewardedError::RewardNotSelected(id).code(), ErrorCode::RewardNotSelected);
        assert_eq!(
            RewardedError::from(NetworkError::new("timeout")).code(),
            ErrorCode::NetworkError
        );
    }
}
