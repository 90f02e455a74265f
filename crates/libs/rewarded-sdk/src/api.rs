use crate::event::ResponseSink;
use rewarded_core::{AdUnitId, ErrorCode, Reward, RewardHeaders};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RequestParameters {
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub user_data_keywords: Option<String>,
    #[serde(default)]
    pub customer_id: Option<String>,
}

/// Ad response as handed over by the ad-request layer.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdResponse {
    pub base_ad_class_name: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub server_extras: BTreeMap<String, String>,
}

impl AdResponse {
    pub fn new(base_ad_class_name: impl Into<String>) -> Self {
        Self { base_ad_class_name: base_ad_class_name.into(), ..Self::default() }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn reward_headers(&self) -> RewardHeaders {
        RewardHeaders::from_headers(&self.headers)
    }
}

/// The ad-request network layer. Responses come back through the sink, never by
/// calling into the manager.
pub trait AdRequester {
    fn request(
        &mut self,
        ad_unit_id: &AdUnitId,
        params: &RequestParameters,
        responses: ResponseSink,
    );
}

pub trait RewardedAdListener {
    fn on_rewarded_ad_load_success(&mut self, _ad_unit_id: &AdUnitId) {}

    fn on_rewarded_ad_load_failure(&mut self, _ad_unit_id: &AdUnitId, _error: ErrorCode) {}

    fn on_rewarded_ad_started(&mut self, _ad_unit_id: &AdUnitId) {}

    fn on_rewarded_ad_show_error(&mut self, _ad_unit_id: &AdUnitId, _error: ErrorCode) {}

    fn on_rewarded_ad_clicked(&mut self, _ad_unit_id: &AdUnitId) {}

    fn on_rewarded_ad_closed(&mut self, _ad_unit_id: &AdUnitId) {}

    fn on_rewarded_ad_completed(&mut self, _ad_unit_ids: &BTreeSet<AdUnitId>, _reward: &Reward) {}
}
