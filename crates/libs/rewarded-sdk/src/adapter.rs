use crate::event::AdEventSink;
use rewarded_core::{AdUnitId, RewardedError};
use std::collections::BTreeMap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdapterLoadRequest {
    pub ad_unit_id: AdUnitId,
    pub broadcast_identifier: u64,
    pub server_extras: BTreeMap<String, String>,
}

/// One creative type. Results are reported through the [`AdEventSink`] handed to
/// `load`, either before `load` returns or later from another task.
pub trait RewardedAdAdapter {
    fn class_name(&self) -> &str;

    fn ad_network_id(&self) -> &str;

    fn broadcast_identifier(&self) -> u64;

    fn load(&mut self, request: AdapterLoadRequest, events: AdEventSink)
        -> Result<(), RewardedError>;

    fn is_ready(&self) -> bool;

    fn show(&mut self) -> Result<(), RewardedError>;

    fn invalidate(&mut self);
}

pub type AdapterConstructor = Box<dyn Fn() -> Box<dyn RewardedAdAdapter>>;

/// Maps well-known adapter class names to constructors.
#[derive(Default)]
pub struct AdapterRegistry {
    constructors: BTreeMap<String, AdapterConstructor>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&mut self, class_name: impl Into<String>, constructor: F)
    where
        F: Fn() -> Box<dyn RewardedAdAdapter> + 'static,
    {
        self.constructors.insert(class_name.into(), Box::new(constructor));
    }

    pub fn with<F>(mut self, class_name: impl Into<String>, constructor: F) -> Self
    where
        F: Fn() -> Box<dyn RewardedAdAdapter> + 'static,
    {
        self.register(class_name, constructor);
        self
    }

    pub fn contains(&self, class_name: &str) -> bool {
        self.constructors.contains_key(class_name)
    }

    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.constructors.keys().map(String::as_str)
    }

    pub fn instantiate(
        &self,
        class_name: &str,
    ) -> Result<Box<dyn RewardedAdAdapter>, RewardedError> {
        let trimmed = class_name.trim();
        if trimmed.is_empty() {
            return Err(RewardedError::AdapterConfiguration(
                "ad response did not name an adapter class".to_owned(),
            ));
        }
        self.constructors
            .get(trimmed)
            .map(|constructor| constructor())
            .ok_or_else(|| {
                RewardedError::AdapterConfiguration(format!("unknown adapter class {trimmed}"))
            })
    }
}
