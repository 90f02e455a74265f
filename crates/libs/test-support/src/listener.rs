use rewarded_core::{AdUnitId, ErrorCode, Reward};
use rewarded_sdk::RewardedAdListener;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ListenerCall {
    LoadSuccess(AdUnitId),
    LoadFailure(AdUnitId, ErrorCode),
    Started(AdUnitId),
    ShowError(AdUnitId, ErrorCode),
    Clicked(AdUnitId),
    Closed(AdUnitId),
    Completed(BTreeSet<AdUnitId>, Reward),
}

/// Listener whose clones share one call log.
#[derive(Clone, Debug, Default)]
pub struct RecordingListener {
    calls: Rc<RefCell<Vec<ListenerCall>>>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<ListenerCall> {
        self.calls.borrow().clone()
    }

    pub fn take(&self) -> Vec<ListenerCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    pub fn completions(&self) -> Vec<(BTreeSet<AdUnitId>, Reward)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|call| match call {
                ListenerCall::Completed(ids, reward) => Some((ids.clone(), reward.clone())),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: ListenerCall) {
        self.calls.borrow_mut().push(call);
    }
}

impl RewardedAdListener for RecordingListener {
    fn on_rewarded_ad_load_success(&mut self, ad_unit_id: &AdUnitId) {
        self.record(ListenerCall::LoadSuccess(ad_unit_id.clone()));
    }

    fn on_rewarded_ad_load_failure(&mut self, ad_unit_id: &AdUnitId, error: ErrorCode) {
        self.record(ListenerCall::LoadFailure(ad_unit_id.clone(), error));
    }

    fn on_rewarded_ad_started(&mut self, ad_unit_id: &AdUnitId) {
        self.record(ListenerCall::Started(ad_unit_id.clone()));
    }

    fn on_rewarded_ad_show_error(&mut self, ad_unit_id: &AdUnitId, error: ErrorCode) {
        self.record(ListenerCall::ShowError(ad_unit_id.clone(), error));
    }

    fn on_rewarded_ad_clicked(&mut self, ad_unit_id: &AdUnitId) {
        self.record(ListenerCall::Clicked(ad_unit_id.clone()));
    }

    fn on_rewarded_ad_closed(&mut self, ad_unit_id: &AdUnitId) {
        self.record(ListenerCall::Closed(ad_unit_id.clone()));
    }

    fn on_rewarded_ad_completed(&mut self, ad_unit_ids: &BTreeSet<AdUnitId>, reward: &Reward) {
        self.record(ListenerCall::Completed(ad_unit_ids.clone(), reward.clone()));
    }
}
