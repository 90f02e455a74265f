use rewarded_core::{CompletionRequest, NetworkError};
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use tokio::time::Instant;

pub type TransportFuture = Pin<Box<dyn Future<Output = Result<u16, NetworkError>>>>;

/// Fires a completion GET and resolves to the HTTP status. Request timeouts are
/// the transport's concern.
pub trait CompletionTransport {
    fn get(&self, url: &str) -> TransportFuture;
}

/// Receives completion requests built by the manager.
pub trait CompletionDispatcher {
    fn dispatch(&mut self, request: CompletionRequest);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletionOutcome {
    pub attempts: u32,
    /// True when the server answered with something other than a 5xx.
    pub accepted: bool,
}

/// Runs one completion request to the end: at most one attempt in flight, each
/// following attempt no earlier than its retry delay after the previous start.
pub async fn drive_completion_request(
    mut request: CompletionRequest,
    transport: Rc<dyn CompletionTransport>,
) -> CompletionOutcome {
    let mut accepted = false;
    while let Some(delay) = request.begin_attempt() {
        let next_attempt = Instant::now() + delay;
        match transport.get(request.url()).await {
            Ok(status) => {
                request.on_response(status);
                accepted = request.should_stop();
                let attempt = request.retry_count();
                if accepted {
                    log::debug!("completion attempt {attempt} got status {status}");
                } else {
                    log::warn!("completion attempt {attempt} got server error {status}");
                }
            }
            Err(err) => {
                log::warn!("completion attempt {} failed: {err}", request.retry_count());
                request.on_error_response(&err);
            }
        }
        if request.should_stop() {
            break;
        }
        if request.retry_count() >= request.policy().max_retries() {
            log::error!("completion retries exhausted after {} attempts", request.retry_count());
            break;
        }
        tokio::time::sleep_until(next_attempt).await;
    }
    CompletionOutcome { attempts: request.retry_count(), accepted }
}

/// Spawns every request onto the current `LocalSet`.
pub struct LocalCompletionDispatcher {
    transport: Rc<dyn CompletionTransport>,
}

impl LocalCompletionDispatcher {
    pub fn new(transport: Rc<dyn CompletionTransport>) -> Self {
        Self { transport }
    }
}

impl CompletionDispatcher for LocalCompletionDispatcher {
    fn dispatch(&mut self, request: CompletionRequest) {
        let transport = Rc::clone(&self.transport);
        tokio::task::spawn_local(async move {
            let outcome = drive_completion_request(request, transport).await;
            log::info!(
                "completion request finished attempts={} accepted={}",
                outcome.attempts,
                outcome.accepted
            );
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rewarded_core::RetryPolicy;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::time::Duration;

    struct ScriptedTransport {
        replies: RefCell<VecDeque<Result<u16, NetworkError>>>,
        sent_at: RefCell<Vec<Instant>>,
    }

    impl ScriptedTransport {
        fn new(replies: Vec<Result<u16, NetworkError>>) -> Rc<Self> {
            Rc::new(Self {
                replies: RefCell::new(replies.into()),
                sent_at: RefCell::new(Vec::new()),
            })
        }
    }

    impl CompletionTransport for ScriptedTransport {
        fn get(&self, _url: &str) -> TransportFuture {
            self.sent_at.borrow_mut().push(Instant::now());
            let reply = self.replies.borrow_mut().pop_front().unwrap_or(Ok(503));
            Box::pin(std::future::ready(reply))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_after_server_errors_stops_retrying() {
        let transport = ScriptedTransport::new(vec![Ok(500), Ok(502), Ok(200)]);
        let request = CompletionRequest::new("testUrl", RetryPolicy::default());
        let outcome = drive_completion_request(request, transport.clone()).await;

        assert_eq!(outcome, CompletionOutcome { attempts: 3, accepted: true });
        let sent_at = transport.sent_at.borrow();
        assert_eq!(sent_at[1] - sent_at[0], Duration::from_secs(5));
        assert_eq!(sent_at[2] - sent_at[1], Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn client_error_stops_after_one_attempt() {
        let transport = ScriptedTransport::new(vec![Ok(404)]);
        let request = CompletionRequest::new("testUrl", RetryPolicy::default());
        let outcome = drive_completion_request(request, transport.clone()).await;
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.accepted);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_server_errors_exhaust_the_retry_budget() {
        let transport = ScriptedTransport::new(Vec::new());
        let policy = RetryPolicy::new(
            vec![Duration::from_secs(2), Duration::from_secs(4)],
            4,
            Duration::from_secs(1),
        );
        let outcome =
            drive_completion_request(CompletionRequest::new("testUrl", policy), transport.clone())
                .await;
        assert_eq!(outcome, CompletionOutcome { attempts: 4, accepted: false });
        let sent_at = transport.sent_at.borrow();
        assert_eq!(sent_at[3] - sent_at[2], Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn transport_error_without_status_stops() {
        let transport = ScriptedTransport::new(vec![Err(NetworkError::new("dns failure"))]);
        let request = CompletionRequest::new("testUrl", RetryPolicy::default());
        let outcome = drive_completion_request(request, transport).await;
        assert_eq!(outcome, CompletionOutcome { attempts: 1, accepted: false });
    }
}
