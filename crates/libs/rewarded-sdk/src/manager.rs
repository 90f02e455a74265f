use crate::adapter::{AdapterLoadRequest, AdapterRegistry, RewardedAdAdapter};
use crate::api::{AdRequester, AdResponse, RequestParameters, RewardedAdListener};
use crate::completion::CompletionDispatcher;
use crate::config::RewardedConfig;
use crate::event::{AdapterEvent, EventQueue, ManagerEvent};
use crate::lifecycle::{self, AdUnitState, ManagerMethod};
use rewarded_core::{
    choose_reward, AdUnitId, AdUnitRegistry, AdapterKey, CompletionRequest, CompletionUrlParams,
    ErrorCode, NetworkError, Reward, RewardedError,
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tokio::sync::Notify;

struct ManagedAdapter {
    adapter: Box<dyn RewardedAdAdapter>,
    ad_unit_id: AdUnitId,
    loaded: bool,
}

/// Owns every ad unit's registry entry and adapter. All mutation goes through
/// `&mut self`; adapters and the request layer only post events to the queue,
/// which is drained before and after each public call.
pub struct RewardedAdManager {
    config: RewardedConfig,
    registry: AdUnitRegistry,
    adapter_factory: AdapterRegistry,
    adapters: BTreeMap<AdapterKey, ManagedAdapter>,
    pending_loads: BTreeMap<AdUnitId, RequestParameters>,
    next_adapter_key: u64,
    events: EventQueue,
    requester: Box<dyn AdRequester>,
    dispatcher: Box<dyn CompletionDispatcher>,
    listener: Option<Box<dyn RewardedAdListener>>,
}

impl RewardedAdManager {
    pub fn new(
        config: RewardedConfig,
        adapter_factory: AdapterRegistry,
        requester: Box<dyn AdRequester>,
        dispatcher: Box<dyn CompletionDispatcher>,
    ) -> Self {
        Self {
            config,
            registry: AdUnitRegistry::new(),
            adapter_factory,
            adapters: BTreeMap::new(),
            pending_loads: BTreeMap::new(),
            next_adapter_key: 1,
            events: EventQueue::new(),
            requester,
            dispatcher,
            listener: None,
        }
    }

    pub fn set_listener(&mut self, listener: Box<dyn RewardedAdListener>) {
        self.listener = Some(listener);
    }

    pub fn config(&self) -> &RewardedConfig {
        &self.config
    }

    pub fn registry(&self) -> &AdUnitRegistry {
        &self.registry
    }

    pub(crate) fn wake_handle(&self) -> Arc<Notify> {
        self.events.wake_handle()
    }

    pub fn ad_unit_state(&self, ad_unit_id: &AdUnitId) -> AdUnitState {
        let showing = self.registry.currently_showing_ad_unit_id() == Some(ad_unit_id);
        let adapter = self.adapter_for(ad_unit_id);
        let loading = self.pending_loads.contains_key(ad_unit_id)
            || adapter.is_some_and(|managed| !managed.loaded);
        let ready = adapter.is_some_and(|managed| managed.loaded && managed.adapter.is_ready());
        AdUnitState::derive(showing, loading, ready)
    }

    pub fn has_ad(&self, ad_unit_id: &AdUnitId) -> bool {
        self.registry.contains(ad_unit_id)
            && self
                .adapter_for(ad_unit_id)
                .is_some_and(|managed| managed.loaded && managed.adapter.is_ready())
    }

    pub fn available_rewards(&self, ad_unit_id: &AdUnitId) -> BTreeSet<Reward> {
        self.registry.available_rewards(ad_unit_id)
    }

    pub fn selected_reward(&self, ad_unit_id: &AdUnitId) -> Option<&Reward> {
        self.registry.selected_reward(ad_unit_id)
    }

    /// Silently ignored unless `reward` is one of the unit's available rewards.
    pub fn select_reward(&mut self, ad_unit_id: &AdUnitId, reward: &Reward) -> bool {
        self.process_pending_events();
        let selected = self.registry.select_reward(ad_unit_id, reward);
        if !selected {
            log::debug!("ignoring selection of {reward:?} for ad unit {ad_unit_id}");
        }
        selected
    }

    /// Requests an ad unless one is pending, loaded or showing for this unit.
    pub fn load_ad(&mut self, ad_unit_id: AdUnitId, params: RequestParameters) {
        self.process_pending_events();
        let state = self.ad_unit_state(&ad_unit_id);
        if !lifecycle::is_method_legal(ManagerMethod::LoadAd, state) {
            log::debug!("not loading ad unit {ad_unit_id} in state {}", state.as_str());
            return;
        }

        log::info!("requesting rewarded ad for ad unit {ad_unit_id}");
        let responses = self.events.response_sink(ad_unit_id.clone());
        self.requester.request(&ad_unit_id, &params, responses);
        self.pending_loads.insert(ad_unit_id, params);
        self.process_pending_events();
    }

    pub fn show_ad(
        &mut self,
        ad_unit_id: &AdUnitId,
        custom_data: Option<String>,
    ) -> Result<(), RewardedError> {
        self.process_pending_events();
        let result = self.start_showing(ad_unit_id, custom_data);
        if let Err(err) = &result {
            log::warn!("cannot show ad unit {ad_unit_id}: {err}");
            let code = err.code();
            self.notify(|listener| listener.on_rewarded_ad_show_error(ad_unit_id, code));
        }
        self.process_pending_events();
        result
    }

    /// Invalidates every adapter and wipes the registry.
    pub fn reset(&mut self) {
        for (_, mut managed) in std::mem::take(&mut self.adapters) {
            managed.adapter.invalidate();
        }
        self.pending_loads.clear();
        self.registry.clear();
    }

    pub fn process_pending_events(&mut self) -> usize {
        let mut handled = 0;
        while let Some(event) = self.events.try_next() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    fn handle_event(&mut self, event: ManagerEvent) {
        match event {
            ManagerEvent::AdResponse { ad_unit_id, result } => {
                self.on_ad_response(ad_unit_id, result)
            }
            ManagerEvent::Adapter { key, event } => self.on_adapter_event(key, event),
        }
    }

    fn on_ad_response(&mut self, ad_unit_id: AdUnitId, result: Result<AdResponse, NetworkError>) {
        let Some(params) = self.pending_loads.remove(&ad_unit_id) else {
            log::debug!("dropping response for ad unit {ad_unit_id} with no pending load");
            return;
        };
        let response = match result {
            Ok(response) => response,
            Err(err) => {
                log::warn!("ad request for ad unit {ad_unit_id} failed: {err}");
                self.fail_load(&ad_unit_id, ErrorCode::NetworkError);
                return;
            }
        };

        let headers = response.reward_headers();
        let offer = match headers.reward_offer() {
            Ok(offer) => offer,
            Err(err) => {
                log::warn!("ad unit {ad_unit_id}: {err}");
                self.fail_load(&ad_unit_id, err.code());
                return;
            }
        };
        let mut adapter = match self.adapter_factory.instantiate(&response.base_ad_class_name) {
            Ok(adapter) => adapter,
            Err(err) => {
                log::warn!("ad unit {ad_unit_id}: {err}");
                self.fail_load(&ad_unit_id, err.code());
                return;
            }
        };

        self.release_adapter(&ad_unit_id);
        let key = AdapterKey(self.next_adapter_key);
        self.next_adapter_key += 1;

        self.registry.apply_reward_offer(&ad_unit_id, offer);
        self.registry
            .update_ad_unit_to_server_completion_url_mapping(&ad_unit_id, headers.completion_url);
        self.registry.update_ad_unit_to_customer_id_mapping(&ad_unit_id, params.customer_id);
        self.registry.update_ad_unit_to_custom_data_mapping(&ad_unit_id, None);
        self.registry.update_ad_unit_ad_adapter_mapping(&ad_unit_id, key, adapter.class_name());

        let request = AdapterLoadRequest {
            ad_unit_id: ad_unit_id.clone(),
            broadcast_identifier: key.0,
            server_extras: response.server_extras,
        };
        if let Err(err) = adapter.load(request, self.events.adapter_sink(key)) {
            log::warn!("adapter {} failed to start loading: {err}", adapter.class_name());
            adapter.invalidate();
            self.fail_load(&ad_unit_id, err.code());
            return;
        }
        log::debug!("ad unit {ad_unit_id} loading through {} as {key}", adapter.class_name());
        self.adapters.insert(key, ManagedAdapter { adapter, ad_unit_id, loaded: false });
    }

    fn on_adapter_event(&mut self, key: AdapterKey, event: AdapterEvent) {
        let Some(ad_unit_id) = self.adapters.get(&key).map(|managed| managed.ad_unit_id.clone())
        else {
            log::debug!("ignoring {event:?} from released {key}");
            return;
        };
        match event {
            AdapterEvent::Loaded => {
                if let Some(managed) = self.adapters.get_mut(&key) {
                    managed.loaded = true;
                }
                log::info!("rewarded ad loaded for ad unit {ad_unit_id}");
                self.notify(|listener| listener.on_rewarded_ad_load_success(&ad_unit_id));
            }
            AdapterEvent::LoadFailed(code) => self.fail_load(&ad_unit_id, code),
            AdapterEvent::ShowFailed(code) => {
                if self.registry.currently_showing_ad_unit_id() == Some(&ad_unit_id) {
                    self.registry.set_currently_showing_ad_unit_id(None);
                }
                self.notify(|listener| listener.on_rewarded_ad_show_error(&ad_unit_id, code));
            }
            AdapterEvent::Clicked => {
                self.notify(|listener| listener.on_rewarded_ad_clicked(&ad_unit_id))
            }
            AdapterEvent::Completed(reward) => self.on_rewarded_ad_completed(key, reward),
            AdapterEvent::Closed => {
                log::info!("rewarded ad closed for ad unit {ad_unit_id}");
                self.release_adapter(&ad_unit_id);
                self.registry.remove(&ad_unit_id);
                self.notify(|listener| listener.on_rewarded_ad_closed(&ad_unit_id));
            }
        }
    }

    fn on_rewarded_ad_completed(&mut self, key: AdapterKey, network_reward: Reward) {
        let Some(managed) = self.adapters.get(&key) else {
            return;
        };
        let class_name = managed.adapter.class_name().to_owned();
        log::info!(
            "rewarded ad completed on network {} through {class_name}",
            managed.adapter.ad_network_id()
        );

        let showing = self.registry.currently_showing_ad_unit_id().cloned();
        if let Some(ad_unit_id) = showing.as_ref() {
            if let Some(url) = self.registry.server_completion_url(ad_unit_id) {
                let chosen =
                    choose_reward(self.registry.selected_reward(ad_unit_id), &network_reward);
                let amount = chosen.amount().to_string();
                let params = CompletionUrlParams {
                    base_url: url,
                    customer_id: self.registry.customer_id(ad_unit_id),
                    reward_name: Some(chosen.label()),
                    reward_amount: Some(&amount),
                    class_name: Some(&class_name),
                    custom_data: self.registry.custom_data(ad_unit_id),
                    sdk_version: &self.config.sdk_version,
                    api_version: &self.config.api_version,
                };
                match CompletionRequest::from_params(&params, self.config.completion.retry_policy())
                {
                    Some(request) => {
                        log::info!("reporting completion for ad unit {ad_unit_id} to server");
                        self.dispatcher.dispatch(request);
                    }
                    None => log::warn!("completion url for ad unit {ad_unit_id} is unusable"),
                }
                return;
            }
        }

        let ad_unit_ids = match showing {
            Some(ad_unit_id) => BTreeSet::from([ad_unit_id]),
            None => self.registry.ad_unit_ids_for_adapter_class(&class_name),
        };
        let chosen = choose_reward(self.registry.last_shown_reward(&class_name), &network_reward);
        self.notify(|listener| listener.on_rewarded_ad_completed(&ad_unit_ids, &chosen));
    }

    fn start_showing(
        &mut self,
        ad_unit_id: &AdUnitId,
        custom_data: Option<String>,
    ) -> Result<(), RewardedError> {
        lifecycle::ensure_method_legal(
            ManagerMethod::ShowAd,
            self.ad_unit_state(ad_unit_id),
            ad_unit_id,
        )?;
        let needs_selection = self.registry.entry(ad_unit_id).is_some_and(|entry| {
            entry.available_rewards.len() > 1 && entry.selected_reward.is_none()
        });
        if needs_selection {
            return Err(RewardedError::RewardNotSelected(ad_unit_id.clone()));
        }

        if let Some(data) = custom_data.as_deref() {
            if data.len() > self.config.custom_data_max_length_bytes {
                log::warn!(
                    "custom data for ad unit {ad_unit_id} is {} bytes, above the {} byte limit",
                    data.len(),
                    self.config.custom_data_max_length_bytes
                );
            }
        }

        let key = self
            .registry
            .adapter_key(ad_unit_id)
            .ok_or_else(|| RewardedError::AdNotAvailable(ad_unit_id.clone()))?;
        let managed = self
            .adapters
            .get_mut(&key)
            .ok_or_else(|| RewardedError::AdNotAvailable(ad_unit_id.clone()))?;

        self.registry.update_ad_unit_to_custom_data_mapping(ad_unit_id, custom_data);
        let reward = self.registry.selected_reward(ad_unit_id).cloned();
        self.registry.record_last_shown_reward(managed.adapter.class_name(), reward);
        self.registry.set_currently_showing_ad_unit_id(Some(ad_unit_id.clone()));
        if let Err(err) = managed.adapter.show() {
            self.registry.set_currently_showing_ad_unit_id(None);
            return Err(err);
        }

        log::info!("showing rewarded ad for ad unit {ad_unit_id}");
        self.notify(|listener| listener.on_rewarded_ad_started(ad_unit_id));
        Ok(())
    }

    fn fail_load(&mut self, ad_unit_id: &AdUnitId, code: ErrorCode) {
        self.pending_loads.remove(ad_unit_id);
        self.release_adapter(ad_unit_id);
        self.registry.remove(ad_unit_id);
        self.notify(|listener| listener.on_rewarded_ad_load_failure(ad_unit_id, code));
    }

    fn release_adapter(&mut self, ad_unit_id: &AdUnitId) {
        let Some(key) = self.registry.adapter_key(ad_unit_id) else {
            return;
        };
        if let Some(mut managed) = self.adapters.remove(&key) {
            managed.adapter.invalidate();
        }
    }

    fn adapter_for(&self, ad_unit_id: &AdUnitId) -> Option<&ManagedAdapter> {
        self.registry.adapter_key(ad_unit_id).and_then(|key| self.adapters.get(&key))
    }

    fn notify(&mut self, callback: impl FnOnce(&mut dyn RewardedAdListener)) {
        if let Some(listener) = self.listener.as_mut() {
            callback(listener.as_mut());
        }
    }
}
