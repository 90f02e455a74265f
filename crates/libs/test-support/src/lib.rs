//! Scriptable fakes for driving a `RewardedAdManager` in tests.

pub mod adapter;
pub mod harness;
pub mod listener;
pub mod network;

pub use adapter::{FakeAdapters, LoadBehaviour, FAKE_ADAPTER_CLASS, SECOND_ADAPTER_CLASS};
pub use harness::{legacy_response, multi_currency_response, unit, with_completion_url, Harness};
pub use listener::{ListenerCall, RecordingListener};
pub use network::{RecordingDispatcher, ScriptedRequester, ScriptedTransport};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}
