use crate::currency::{parse_legacy_amount, RewardOffer};
use crate::reward::Reward;
use crate::types::{AdUnitId, AdapterKey};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RegistryEntry {
    pub adapter: Option<AdapterKey>,
    pub adapter_class: Option<String>,
    pub available_rewards: BTreeSet<Reward>,
    pub selected_reward: Option<Reward>,
    pub server_completion_url: Option<String>,
    pub custom_data: Option<String>,
    pub customer_id: Option<String>,
}

/// Per ad-unit reward bookkeeping. Reads on unknown ids return empty values;
/// writes create the entry on demand.
#[derive(Clone, Debug, Default)]
pub struct AdUnitRegistry {
    entries: BTreeMap<AdUnitId, RegistryEntry>,
    currently_showing: Option<AdUnitId>,
    last_shown_reward: BTreeMap<String, Reward>,
}

impl AdUnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, id: &AdUnitId) -> Option<&RegistryEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &AdUnitId) -> bool {
        self.entries.contains_key(id)
    }

    pub fn ad_unit_ids(&self) -> impl Iterator<Item = &AdUnitId> {
        self.entries.keys()
    }

    fn entry_mut(&mut self, id: &AdUnitId) -> &mut RegistryEntry {
        self.entries.entry(id.clone()).or_default()
    }

    pub fn update_ad_unit_ad_adapter_mapping(
        &mut self,
        id: &AdUnitId,
        adapter: AdapterKey,
        adapter_class: impl Into<String>,
    ) {
        let entry = self.entry_mut(id);
        entry.adapter = Some(adapter);
        entry.adapter_class = Some(adapter_class.into());
    }

    pub fn adapter_key(&self, id: &AdUnitId) -> Option<AdapterKey> {
        self.entries.get(id).and_then(|entry| entry.adapter)
    }

    pub fn adapter_class(&self, id: &AdUnitId) -> Option<&str> {
        self.entries.get(id).and_then(|entry| entry.adapter_class.as_deref())
    }

    /// Ad units whose mapped adapter has the given class name.
    pub fn ad_unit_ids_for_adapter_class(&self, adapter_class: &str) -> BTreeSet<AdUnitId> {
        self.entries
            .iter()
            .filter(|(_, entry)| entry.adapter_class.as_deref() == Some(adapter_class))
            .map(|(id, _)| id.clone())
            .collect()
    }

    pub fn update_ad_unit_reward_mapping(&mut self, id: &AdUnitId, label: &str, amount: &str) {
        let reward = Reward::success(label, parse_legacy_amount(Some(amount)));
        self.entry_mut(id).selected_reward = Some(reward);
    }

    /// Replaces the available rewards and the selection with a freshly parsed offer.
    pub fn apply_reward_offer(&mut self, id: &AdUnitId, offer: RewardOffer) {
        let entry = self.entry_mut(id);
        entry.available_rewards = offer.available;
        entry.selected_reward = offer.selected;
    }

    /// Accepts the selection only when `reward` is one of the unit's available rewards.
    pub fn select_reward(&mut self, id: &AdUnitId, reward: &Reward) -> bool {
        let Some(entry) = self.entries.get_mut(id) else {
            return false;
        };
        if !entry.available_rewards.contains(reward) {
            return false;
        }
        entry.selected_reward = Some(reward.clone());
        true
    }

    pub fn available_rewards(&self, id: &AdUnitId) -> BTreeSet<Reward> {
        self.entries.get(id).map(|entry| entry.available_rewards.clone()).unwrap_or_default()
    }

    pub fn selected_reward(&self, id: &AdUnitId) -> Option<&Reward> {
        self.entries.get(id).and_then(|entry| entry.selected_reward.as_ref())
    }

    pub fn exists_in_available_rewards(&self, id: &AdUnitId, label: &str, amount: u32) -> bool {
        self.entries.get(id).is_some_and(|entry| {
            entry.available_rewards.iter().any(|reward| reward.matches(label, amount))
        })
    }

    pub fn update_ad_unit_to_server_completion_url_mapping(
        &mut self,
        id: &AdUnitId,
        url: Option<String>,
    ) {
        self.entry_mut(id).server_completion_url = url;
    }

    pub fn server_completion_url(&self, id: &AdUnitId) -> Option<&str> {
        self.entries
            .get(id)
            .and_then(|entry| entry.server_completion_url.as_deref())
            .filter(|url| !url.is_empty())
    }

    pub fn update_ad_unit_to_custom_data_mapping(&mut self, id: &AdUnitId, data: Option<String>) {
        self.entry_mut(id).custom_data = data;
    }

    pub fn custom_data(&self, id: &AdUnitId) -> Option<&str> {
        self.entries.get(id).and_then(|entry| entry.custom_data.as_deref())
    }

    pub fn update_ad_unit_to_customer_id_mapping(
        &mut self,
        id: &AdUnitId,
        customer_id: Option<String>,
    ) {
        self.entry_mut(id).customer_id = customer_id;
    }

    pub fn customer_id(&self, id: &AdUnitId) -> Option<&str> {
        self.entries.get(id).and_then(|entry| entry.customer_id.as_deref())
    }

    pub fn set_currently_showing_ad_unit_id(&mut self, id: Option<AdUnitId>) {
        self.currently_showing = id;
    }

    pub fn currently_showing_ad_unit_id(&self) -> Option<&AdUnitId> {
        self.currently_showing.as_ref()
    }

    /// `None` forgets the class's previous reward so a later completion falls
    /// back to the network reward.
    pub fn record_last_shown_reward(&mut self, adapter_class: &str, reward: Option<Reward>) {
        match reward {
            Some(reward) => {
                self.last_shown_reward.insert(adapter_class.to_owned(), reward);
            }
            None => {
                self.last_shown_reward.remove(adapter_class);
            }
        }
    }

    pub fn last_shown_reward(&self, adapter_class: &str) -> Option<&Reward> {
        self.last_shown_reward.get(adapter_class)
    }

    /// Drops the unit's entry and releases the showing slot if it held this unit.
    pub fn remove(&mut self, id: &AdUnitId) -> Option<RegistryEntry> {
        if self.currently_showing.as_ref() == Some(id) {
            self.currently_showing = None;
        }
        self.entries.remove(id)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.currently_showing = None;
        self.last_shown_reward.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::parse_reward_offer;

    fn unit(id: &str) -> AdUnitId {
        AdUnitId::from(id)
    }

    #[test]
    fn reads_on_unknown_ad_units_are_empty() {
        let registry = AdUnitRegistry::new();
        let id = unit("missing");
        assert!(registry.available_rewards(&id).is_empty());
        assert!(registry.selected_reward(&id).is_none());
        assert!(registry.server_completion_url(&id).is_none());
        assert!(!registry.exists_in_available_rewards(&id, "Coins", 1));
    }

    #[test]
    fn adapter_mapping_is_last_write_wins() {
        let mut registry = AdUnitRegistry::new();
        let id = unit("unit");
        registry.update_ad_unit_ad_adapter_mapping(&id, AdapterKey(1), "FirstAdapter");
        registry.update_ad_unit_ad_adapter_mapping(&id, AdapterKey(2), "SecondAdapter");
        assert_eq!(registry.adapter_key(&id), Some(AdapterKey(2)));
        assert_eq!(registry.adapter_class(&id), Some("SecondAdapter"));
    }

    #[test]
    fn selection_requires_membership_in_available_rewards() {
        let mut registry = AdUnitRegistry::new();
        let id = unit("unit");
        let offer = parse_reward_offer(
            Some(r#"{"rewards":[{"name":"Coins","amount":8},{"name":"Energy","amount":20}]}"#),
            None,
            None,
        )
        .expect("offer");
        registry.apply_reward_offer(&id, offer);

        assert!(!registry.select_reward(&id, &Reward::success("Coins", 9)));
        assert!(!registry.select_reward(&unit("other"), &Reward::success("Coins", 8)));
        assert!(registry.selected_reward(&id).is_none());

        assert!(registry.select_reward(&id, &Reward::success("Energy", 20)));
        assert_eq!(registry.selected_reward(&id), Some(&Reward::success("Energy", 20)));
    }

    #[test]
    fn availability_reflects_only_the_latest_offer() {
        let mut registry = AdUnitRegistry::new();
        let id = unit("unit");
        let first = parse_reward_offer(
            Some(r#"{"rewards":[{"name":"Coins","amount":8},{"name":"Gems","amount":3}]}"#),
            None,
            None,
        )
        .expect("first offer");
        let second = parse_reward_offer(
            Some(r#"{"rewards":[{"name":"Coins","amount":10},{"name":"Energy","amount":20}]}"#),
            None,
            None,
        )
        .expect("second offer");
        registry.apply_reward_offer(&id, first);
        assert!(registry.exists_in_available_rewards(&id, "Gems", 3));
        registry.apply_reward_offer(&id, second);

        assert!(registry.exists_in_available_rewards(&id, "Coins", 10));
        assert!(registry.exists_in_available_rewards(&id, "Energy", 20));
        assert!(!registry.exists_in_available_rewards(&id, "Gems", 3));
        assert!(!registry.exists_in_available_rewards(&id, "Coins", 8));
        assert!(!registry.exists_in_available_rewards(&id, "Energy", 21));
    }

    #[test]
    fn recording_no_reward_forgets_the_class_reward() {
        let mut registry = AdUnitRegistry::new();
        registry.record_last_shown_reward("Fullscreen", Some(Reward::success("Coins", 15)));
        registry.record_last_shown_reward("Other", Some(Reward::success("Gems", 2)));
        registry.record_last_shown_reward("Fullscreen", None);
        assert!(registry.last_shown_reward("Fullscreen").is_none());
        assert_eq!(registry.last_shown_reward("Other"), Some(&Reward::success("Gems", 2)));
    }

    #[test]
    fn reward_mapping_with_bad_amount_uses_zero() {
        let mut registry = AdUnitRegistry::new();
        let id = unit("unit");
        registry.update_ad_unit_reward_mapping(&id, "Gems", "NaN");
        assert_eq!(registry.selected_reward(&id), Some(&Reward::success("Gems", 0)));
    }

    #[test]
    fn ad_units_are_grouped_by_adapter_class() {
        let mut registry = AdUnitRegistry::new();
        registry.update_ad_unit_ad_adapter_mapping(&unit("a"), AdapterKey(1), "Fullscreen");
        registry.update_ad_unit_ad_adapter_mapping(&unit("b"), AdapterKey(2), "Fullscreen");
        registry.update_ad_unit_ad_adapter_mapping(&unit("c"), AdapterKey(3), "Other");
        let ids = registry.ad_unit_ids_for_adapter_class("Fullscreen");
        assert_eq!(ids, BTreeSet::from([unit("a"), unit("b")]));
    }

    #[test]
    fn removing_the_showing_unit_clears_the_showing_slot() {
        let mut registry = AdUnitRegistry::new();
        let id = unit("unit");
        registry.update_ad_unit_to_custom_data_mapping(&id, Some("data".to_owned()));
        registry.set_currently_showing_ad_unit_id(Some(id.clone()));
        assert!(registry.remove(&id).is_some());
        assert!(registry.currently_showing_ad_unit_id().is_none());
        assert!(!registry.contains(&id));
    }

    #[test]
    fn empty_server_completion_url_reads_as_absent() {
        let mut registry = AdUnitRegistry::new();
        let id = unit("unit");
        registry.update_ad_unit_to_server_completion_url_mapping(&id, Some(String::new()));
        assert!(registry.contains(&id));
        assert!(registry.server_completion_url(&id).is_none());
    }

    #[test]
    fn clear_wipes_every_entry() {
        let mut registry = AdUnitRegistry::new();
        registry.update_ad_unit_reward_mapping(&unit("a"), "Coins", "1");
        registry.set_currently_showing_ad_unit_id(Some(unit("a")));
        registry.record_last_shown_reward("Fullscreen", Some(Reward::success("Coins", 1)));
        registry.clear();
        assert_eq!(registry.ad_unit_ids().count(), 0);
        assert!(registry.currently_showing_ad_unit_id().is_none());
        assert!(registry.last_shown_reward("Fullscreen").is_none());
    }
}
