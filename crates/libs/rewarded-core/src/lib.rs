pub mod completion;
pub mod currency;
pub mod error;
pub mod registry;
pub mod reward;
pub mod types;

pub use completion::{
    build_completion_url, CompletionRequest, CompletionState, CompletionUrlParams, RetryPolicy,
    API_VERSION, MAX_RETRIES, REQUEST_TIMEOUT_DELAY_MS, RETRY_TIMES_MS, SDK_VERSION,
};
pub use currency::{
    choose_reward, parse_reward_offer, RewardHeaders, RewardOffer, COMPLETION_URL_HEADER,
    LEGACY_CURRENCY_AMOUNT_HEADER, LEGACY_CURRENCY_NAME_HEADER, REWARDED_CURRENCIES_HEADER,
};
pub use error::{ErrorCode, NetworkError, RewardedError};
pub use registry::{AdUnitRegistry, RegistryEntry};
pub use reward::Reward;
pub use types::{AdUnitId, AdapterKey};

/// Upper bound on custom data forwarded to the completion URL before a warning is logged.
pub const CUSTOM_DATA_MAX_LENGTH_BYTES: usize = 8192;
