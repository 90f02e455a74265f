use crate::error::{is_server_error_status, NetworkError};
use std::time::Duration;

pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const API_VERSION: &str = "6";

pub const MAX_RETRIES: u32 = 17;
pub const REQUEST_TIMEOUT_DELAY_MS: u64 = 1_000;
pub const RETRY_TIMES_MS: [u64; 5] = [5_000, 10_000, 20_000, 40_000, 60_000];

/// Delay table for completion retries. Attempt `n` waits `retry_times[n]`, measured
/// from the start of that attempt; indices outside the table clamp to the last entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    retry_times: Vec<Duration>,
    max_retries: u32,
    request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_times: RETRY_TIMES_MS.iter().copied().map(Duration::from_millis).collect(),
            max_retries: MAX_RETRIES,
            request_timeout: Duration::from_millis(REQUEST_TIMEOUT_DELAY_MS),
        }
    }
}

impl RetryPolicy {
    pub fn new(retry_times: Vec<Duration>, max_retries: u32, request_timeout: Duration) -> Self {
        Self { retry_times, max_retries, request_timeout }
    }

    pub fn retry_times(&self) -> &[Duration] {
        &self.retry_times
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn retry_delay(&self, retry_count: i64) -> Duration {
        let Some(last) = self.retry_times.last() else {
            return self.request_timeout;
        };
        usize::try_from(retry_count)
            .ok()
            .and_then(|index| self.retry_times.get(index))
            .copied()
            .unwrap_or(*last)
    }

    /// Every retry delay must leave room for the request to time out first.
    pub fn retries_outlast_request_timeout(&self) -> bool {
        self.retry_times.iter().all(|delay| *delay >= self.request_timeout)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompletionUrlParams<'a> {
    pub base_url: &'a str,
    pub customer_id: Option<&'a str>,
    pub reward_name: Option<&'a str>,
    pub reward_amount: Option<&'a str>,
    pub class_name: Option<&'a str>,
    pub custom_data: Option<&'a str>,
    pub sdk_version: &'a str,
    pub api_version: &'a str,
}

/// Returns `None` when there is nothing to report: no base url or no reward.
///
/// Values are percent-encoded exactly once here, so custom data that arrives
/// already encoded ends up double-encoded on the wire.
pub fn build_completion_url(params: &CompletionUrlParams<'_>) -> Option<String> {
    if params.base_url.trim().is_empty() {
        return None;
    }
    let reward_name = params.reward_name?;
    let reward_amount = params.reward_amount?;

    let mut url = params.base_url.to_owned();
    push_param(&mut url, "customer_id", params.customer_id.unwrap_or_default());
    push_param(&mut url, "rcn", reward_name);
    push_param(&mut url, "rca", reward_amount);
    push_param(&mut url, "nv", params.sdk_version);
    push_param(&mut url, "v", params.api_version);
    push_param(&mut url, "cec", params.class_name.unwrap_or_default());
    if let Some(custom_data) = params.custom_data.filter(|value| !value.is_empty()) {
        push_param(&mut url, "rcd", custom_data);
    }
    Some(url)
}

fn push_param(url: &mut String, key: &str, value: &str) {
    url.push('&');
    url.push_str(key);
    url.push('=');
    url.push_str(&percent_encode(value));
}

fn percent_encode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect::<String>().replace('+', "%20")
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CompletionState {
    /// An attempt is outstanding.
    Pending,
    /// The last attempt asked for another one after the given delay.
    RetryScheduled(Duration),
    Stopped,
}

/// Retry bookkeeping for a single completion report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionRequest {
    url: String,
    policy: RetryPolicy,
    retry_count: u32,
    should_stop: bool,
    next_delay: Duration,
    state: CompletionState,
}

impl CompletionRequest {
    pub fn new(url: impl Into<String>, policy: RetryPolicy) -> Self {
        Self {
            url: url.into(),
            policy,
            retry_count: 0,
            should_stop: false,
            next_delay: Duration::ZERO,
            state: CompletionState::Pending,
        }
    }

    pub fn from_params(params: &CompletionUrlParams<'_>, policy: RetryPolicy) -> Option<Self> {
        build_completion_url(params).map(|url| Self::new(url, policy))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    pub fn should_stop(&self) -> bool {
        self.should_stop
    }

    pub fn state(&self) -> CompletionState {
        self.state
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Starts the next attempt and returns how long to wait before the one after it.
    /// `None` means the request is finished and nothing may be sent.
    pub fn begin_attempt(&mut self) -> Option<Duration> {
        if self.should_stop || self.retry_count >= self.policy.max_retries {
            self.state = CompletionState::Stopped;
            return None;
        }
        self.next_delay = self.policy.retry_delay(i64::from(self.retry_count));
        self.retry_count += 1;
        self.state = CompletionState::Pending;
        Some(self.next_delay)
    }

    pub fn on_response(&mut self, status: u16) {
        self.should_stop = !is_server_error_status(status);
        self.settle();
    }

    pub fn on_error_response(&mut self, error: &NetworkError) {
        self.should_stop = !error.is_server_error();
        self.settle();
    }

    fn settle(&mut self) {
        self.state = if self.should_stop || self.retry_count >= self.policy.max_retries {
            CompletionState::Stopped
        } else {
            CompletionState::RetryScheduled(self.next_delay)
        };
    }
}
