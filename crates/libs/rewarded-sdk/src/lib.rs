pub mod adapter;
pub mod api;
pub mod completion;
pub mod config;
pub mod event;
pub mod lifecycle;
pub mod manager;
pub mod runtime;

pub use adapter::{AdapterLoadRequest, AdapterRegistry, RewardedAdAdapter};
pub use api::{AdRequester, AdResponse, RequestParameters, RewardedAdListener};
pub use completion::{
    drive_completion_request, CompletionDispatcher, CompletionOutcome, CompletionTransport,
    LocalCompletionDispatcher, TransportFuture,
};
pub use config::{CompletionConfig, ConfigError, RewardedConfig};
pub use event::{AdEventSink, AdapterEvent, ManagerEvent, ResponseSink};
pub use lifecycle::{AdUnitState, ManagerMethod};
pub use manager::RewardedAdManager;
pub use runtime::{spawn_manager, ManagerHandle};

pub use rewarded_core::{AdUnitId, AdapterKey, ErrorCode, NetworkError, Reward, RewardedError};
