use rewarded_core::{AdUnitId, RewardedError};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum ManagerMethod {
    LoadAd,
    ShowAd,
}

impl ManagerMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoadAd => "load_ad",
            Self::ShowAd => "show_ad",
        }
    }
}

/// Per ad-unit state, derived from registry contents rather than stored.
/// Completion, close and failure are transitions back to `NoAd` or `HasAd`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AdUnitState {
    NoAd,
    Loading,
    HasAd,
    Showing,
}

impl AdUnitState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NoAd => "no_ad",
            Self::Loading => "loading",
            Self::HasAd => "has_ad",
            Self::Showing => "showing",
        }
    }

    pub fn derive(showing: bool, loading: bool, ready: bool) -> Self {
        if showing {
            Self::Showing
        } else if loading {
            Self::Loading
        } else if ready {
            Self::HasAd
        } else {
            Self::NoAd
        }
    }
}

pub fn is_method_legal(method: ManagerMethod, state: AdUnitState) -> bool {
    legal_states_for_method(method).contains(&state)
}

/// A refused `load_ad` is silent at the manager; a refused `show_ad` surfaces as
/// `AdNotAvailable`.
pub fn ensure_method_legal(
    method: ManagerMethod,
    state: AdUnitState,
    ad_unit_id: &AdUnitId,
) -> Result<(), RewardedError> {
    if is_method_legal(method, state) {
        return Ok(());
    }
    log::debug!(
        "{} not legal for ad unit {} in state {}",
        method.as_str(),
        ad_unit_id,
        state.as_str()
    );
    Err(RewardedError::AdNotAvailable(ad_unit_id.clone()))
}

fn legal_states_for_method(method: ManagerMethod) -> &'static [AdUnitState] {
    use AdUnitState as S;
    match method {
        ManagerMethod::LoadAd => &[S::NoAd],
        ManagerMethod::ShowAd => &[S::HasAd],
    }
}
