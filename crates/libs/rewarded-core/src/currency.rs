use crate::error::RewardedError;
use crate::reward::{Reward, NO_REWARD_AMOUNT};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};

pub const REWARDED_CURRENCIES_HEADER: &str = "x-rewarded-currencies";
pub const LEGACY_CURRENCY_NAME_HEADER: &str = "x-rewarded-video-currency-name";
pub const LEGACY_CURRENCY_AMOUNT_HEADER: &str = "x-rewarded-video-currency-amount";
pub const COMPLETION_URL_HEADER: &str = "x-rewarded-video-completion-url";

#[derive(Debug, Deserialize)]
struct RewardedCurrencies {
    rewards: Vec<CurrencyEntry>,
}

#[derive(Debug, Deserialize)]
struct CurrencyEntry {
    name: String,
    amount: u32,
}

/// Reward-related headers extracted from an ad response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewardHeaders {
    pub rewarded_currencies: Option<String>,
    pub legacy_currency_name: Option<String>,
    pub legacy_currency_amount: Option<String>,
    pub completion_url: Option<String>,
}

impl RewardHeaders {
    /// Header names are matched case-insensitively.
    pub fn from_headers(headers: &BTreeMap<String, String>) -> Self {
        let lookup = |name: &str| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .map(|(_, value)| value.clone())
        };
        Self {
            rewarded_currencies: lookup(REWARDED_CURRENCIES_HEADER),
            legacy_currency_name: lookup(LEGACY_CURRENCY_NAME_HEADER),
            legacy_currency_amount: lookup(LEGACY_CURRENCY_AMOUNT_HEADER),
            completion_url: lookup(COMPLETION_URL_HEADER).filter(|url| !url.trim().is_empty()),
        }
    }

    pub fn reward_offer(&self) -> Result<RewardOffer, RewardedError> {
        parse_reward_offer(
            self.rewarded_currencies.as_deref(),
            self.legacy_currency_name.as_deref(),
            self.legacy_currency_amount.as_deref(),
        )
    }
}

/// Rewards offered by one ad response.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RewardOffer {
    pub available: BTreeSet<Reward>,
    /// Set when the offer is unambiguous: a single JSON reward or the legacy pair.
    pub selected: Option<Reward>,
}

impl RewardOffer {
    pub fn is_empty(&self) -> bool {
        self.available.is_empty()
    }

    pub fn requires_selection(&self) -> bool {
        self.available.len() > 1 && self.selected.is_none()
    }
}

/// The JSON header wins over the legacy pair whenever it is present. A malformed
/// JSON header fails the whole offer.
pub fn parse_reward_offer(
    rewarded_currencies: Option<&str>,
    legacy_name: Option<&str>,
    legacy_amount: Option<&str>,
) -> Result<RewardOffer, RewardedError> {
    if let Some(raw) = rewarded_currencies.filter(|raw| !raw.trim().is_empty()) {
        return parse_multi_currency(raw);
    }

    let Some(name) = legacy_name else {
        return Ok(RewardOffer::default());
    };
    let reward = Reward::success(name, parse_legacy_amount(legacy_amount));
    Ok(RewardOffer { available: BTreeSet::from([reward.clone()]), selected: Some(reward) })
}

fn parse_multi_currency(raw: &str) -> Result<RewardOffer, RewardedError> {
    let parsed: RewardedCurrencies = serde_json::from_str(raw)
        .map_err(|err| RewardedError::RewardedCurrenciesParsing(err.to_string()))?;
    if parsed.rewards.is_empty() {
        return Err(RewardedError::RewardedCurrenciesParsing(
            "rewards array must not be empty".to_owned(),
        ));
    }

    let available: BTreeSet<Reward> = parsed
        .rewards
        .into_iter()
        .map(|entry| Reward::success(entry.name, entry.amount))
        .collect();
    let selected = match available.len() {
        1 => available.iter().next().cloned(),
        _ => None,
    };
    Ok(RewardOffer { available, selected })
}

/// Non-numeric or negative amounts collapse to zero.
pub fn parse_legacy_amount(raw: Option<&str>) -> u32 {
    match raw.map(str::trim).map(str::parse::<u32>) {
        Some(Ok(amount)) => amount,
        Some(Err(_)) => {
            log::warn!("invalid rewarded currency amount {raw:?}, using {NO_REWARD_AMOUNT}");
            NO_REWARD_AMOUNT
        }
        None => NO_REWARD_AMOUNT,
    }
}

/// A failed network reward always propagates. Otherwise the client-resolved reward
/// takes priority over whatever the network asserted.
pub fn choose_reward(client_reward: Option<&Reward>, network_reward: &Reward) -> Reward {
    if !network_reward.is_success() {
        return network_reward.clone();
    }
    client_reward.unwrap_or(network_reward).clone()
}
