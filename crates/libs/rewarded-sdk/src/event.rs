use crate::api::AdResponse;
use rewarded_core::{AdUnitId, AdapterKey, ErrorCode, NetworkError, Reward};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

/// What an adapter reports about its creative.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdapterEvent {
    Loaded,
    LoadFailed(ErrorCode),
    ShowFailed(ErrorCode),
    Clicked,
    Completed(Reward),
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ManagerEvent {
    Adapter { key: AdapterKey, event: AdapterEvent },
    AdResponse { ad_unit_id: AdUnitId, result: Result<AdResponse, NetworkError> },
}

/// Queue every adapter and network callback goes through before touching manager
/// state. Senders may live on any thread; only the owning manager drains it.
pub(crate) struct EventQueue {
    tx: mpsc::UnboundedSender<ManagerEvent>,
    rx: mpsc::UnboundedReceiver<ManagerEvent>,
    wake: Arc<Notify>,
}

impl EventQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx, wake: Arc::new(Notify::new()) }
    }

    pub(crate) fn adapter_sink(&self, key: AdapterKey) -> AdEventSink {
        AdEventSink { key, tx: self.tx.clone(), wake: Arc::clone(&self.wake) }
    }

    pub(crate) fn response_sink(&self, ad_unit_id: AdUnitId) -> ResponseSink {
        ResponseSink { ad_unit_id, tx: self.tx.clone(), wake: Arc::clone(&self.wake) }
    }

    pub(crate) fn wake_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wake)
    }

    pub(crate) fn try_next(&mut self) -> Option<ManagerEvent> {
        self.rx.try_recv().ok()
    }
}

#[derive(Clone, Debug)]
pub struct AdEventSink {
    key: AdapterKey,
    tx: mpsc::UnboundedSender<ManagerEvent>,
    wake: Arc<Notify>,
}

impl AdEventSink {
    pub fn key(&self) -> AdapterKey {
        self.key
    }

    /// Returns false once the manager is gone.
    pub fn emit(&self, event: AdapterEvent) -> bool {
        let sent = self.tx.send(ManagerEvent::Adapter { key: self.key, event }).is_ok();
        self.wake.notify_one();
        sent
    }
}

/// One-shot delivery slot for the ad response of a single load request.
#[derive(Debug)]
pub struct ResponseSink {
    ad_unit_id: AdUnitId,
    tx: mpsc::UnboundedSender<ManagerEvent>,
    wake: Arc<Notify>,
}

impl ResponseSink {
    pub fn ad_unit_id(&self) -> &AdUnitId {
        &self.ad_unit_id
    }

    pub fn deliver(self, result: Result<AdResponse, NetworkError>) -> bool {
        let sent =
            self.tx.send(ManagerEvent::AdResponse { ad_unit_id: self.ad_unit_id, result }).is_ok();
        self.wake.notify_one();
        sent
    }
}
