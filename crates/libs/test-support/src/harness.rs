use crate::adapter::{FakeAdapters, FAKE_ADAPTER_CLASS, SECOND_ADAPTER_CLASS};
use crate::listener::RecordingListener;
use crate::network::{RecordingDispatcher, ScriptedRequester};
use rewarded_core::{
    AdUnitId, COMPLETION_URL_HEADER, LEGACY_CURRENCY_AMOUNT_HEADER, LEGACY_CURRENCY_NAME_HEADER,
    REWARDED_CURRENCIES_HEADER,
};
use rewarded_sdk::{AdResponse, AdapterRegistry, RewardedAdManager, RewardedConfig};

pub fn unit(id: &str) -> AdUnitId {
    AdUnitId::from(id)
}

pub fn multi_currency_response(rewards_json: &str) -> AdResponse {
    AdResponse::new(FAKE_ADAPTER_CLASS).with_header(REWARDED_CURRENCIES_HEADER, rewards_json)
}

pub fn legacy_response(name: &str, amount: &str) -> AdResponse {
    AdResponse::new(FAKE_ADAPTER_CLASS)
        .with_header(LEGACY_CURRENCY_NAME_HEADER, name)
        .with_header(LEGACY_CURRENCY_AMOUNT_HEADER, amount)
}

pub fn with_completion_url(response: AdResponse, url: &str) -> AdResponse {
    response.with_header(COMPLETION_URL_HEADER, url)
}

/// A manager wired to fakes, with handles kept for inspection.
pub struct Harness {
    pub manager: RewardedAdManager,
    pub requester: ScriptedRequester,
    pub adapters: FakeAdapters,
    pub listener: RecordingListener,
    pub completions: RecordingDispatcher,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(RewardedConfig::default())
    }

    pub fn with_config(config: RewardedConfig) -> Self {
        crate::init_logging();
        let requester = ScriptedRequester::new();
        let adapters = FakeAdapters::new();
        let listener = RecordingListener::new();
        let completions = RecordingDispatcher::new();

        let registry = adapters.register(AdapterRegistry::new(), FAKE_ADAPTER_CLASS);
        let registry = adapters.register(registry, SECOND_ADAPTER_CLASS);
        let mut manager = RewardedAdManager::new(
            config,
            registry,
            Box::new(requester.clone()),
            Box::new(completions.clone()),
        );
        manager.set_listener(Box::new(listener.clone()));
        Self { manager, requester, adapters, listener, completions }
    }

    /// Scripts `response` for `ad_unit_id` and loads it.
    pub fn load_with(&mut self, ad_unit_id: &AdUnitId, response: AdResponse) {
        self.requester.script(ad_unit_id, Ok(response));
        self.manager.load_ad(ad_unit_id.clone(), Default::default());
    }
}

impl Default for Harness {
    fn default() -> Self {
        Self::new()
    }
}
