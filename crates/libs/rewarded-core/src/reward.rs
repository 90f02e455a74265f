use serde::{Deserialize, Serialize};

pub const NO_REWARD_LABEL: &str = "";
pub const NO_REWARD_AMOUNT: u32 = 0;

/// A currency grant for completing a rewarded ad.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Reward {
    label: String,
    amount: u32,
    success: bool,
}

impl Reward {
    pub fn success(label: impl Into<String>, amount: u32) -> Self {
        Self { label: label.into(), amount, success: true }
    }

    pub fn failure() -> Self {
        Self { label: NO_REWARD_LABEL.to_owned(), amount: NO_REWARD_AMOUNT, success: false }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn amount(&self) -> u32 {
        self.amount
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn matches(&self, label: &str, amount: u32) -> bool {
        self.label == label && self.amount == amount
    }
}
