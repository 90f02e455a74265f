use rewarded_core::{AdUnitId, CompletionRequest, NetworkError};
use rewarded_sdk::{
    AdRequester, AdResponse, CompletionDispatcher, CompletionTransport, RequestParameters,
    ResponseSink, TransportFuture,
};
use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;
use tokio::time::Instant;

#[derive(Debug, Default)]
struct RequesterState {
    scripted: BTreeMap<AdUnitId, VecDeque<Result<AdResponse, NetworkError>>>,
    waiting: Vec<ResponseSink>,
    requests: Vec<(AdUnitId, RequestParameters)>,
}

/// Answers from a per-ad-unit script, or parks the request until `respond`.
#[derive(Clone, Debug, Default)]
pub struct ScriptedRequester {
    state: Rc<RefCell<RequesterState>>,
}

impl ScriptedRequester {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply delivered synchronously from inside the next request.
    pub fn script(&self, ad_unit_id: &AdUnitId, reply: Result<AdResponse, NetworkError>) {
        self.state.borrow_mut().scripted.entry(ad_unit_id.clone()).or_default().push_back(reply);
    }

    /// Delivers to the oldest parked request for the unit.
    pub fn respond(&self, ad_unit_id: &AdUnitId, reply: Result<AdResponse, NetworkError>) -> bool {
        let sink = {
            let mut state = self.state.borrow_mut();
            let Some(position) =
                state.waiting.iter().position(|sink| sink.ad_unit_id() == ad_unit_id)
            else {
                return false;
            };
            state.waiting.remove(position)
        };
        sink.deliver(reply)
    }

    pub fn requests(&self) -> Vec<(AdUnitId, RequestParameters)> {
        self.state.borrow().requests.clone()
    }

    pub fn request_count(&self, ad_unit_id: &AdUnitId) -> usize {
        self.state.borrow().requests.iter().filter(|(id, _)| id == ad_unit_id).count()
    }
}

impl AdRequester for ScriptedRequester {
    fn request(
        &mut self,
        ad_unit_id: &AdUnitId,
        params: &RequestParameters,
        responses: ResponseSink,
    ) {
        let reply = {
            let mut state = self.state.borrow_mut();
            state.requests.push((ad_unit_id.clone(), params.clone()));
            state.scripted.get_mut(ad_unit_id).and_then(VecDeque::pop_front)
        };
        match reply {
            Some(reply) => {
                responses.deliver(reply);
            }
            None => self.state.borrow_mut().waiting.push(responses),
        }
    }
}

/// Keeps every completion request instead of sending it.
#[derive(Clone, Debug, Default)]
pub struct RecordingDispatcher {
    requests: Rc<RefCell<Vec<CompletionRequest>>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.borrow().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests.borrow().iter().map(|request| request.url().to_owned()).collect()
    }
}

impl CompletionDispatcher for RecordingDispatcher {
    fn dispatch(&mut self, request: CompletionRequest) {
        self.requests.borrow_mut().push(request);
    }
}

/// Replies with scripted statuses, then `fallback` once the script runs dry.
#[derive(Debug)]
pub struct ScriptedTransport {
    replies: RefCell<VecDeque<Result<u16, NetworkError>>>,
    fallback: u16,
    sent: RefCell<Vec<(String, Instant)>>,
}

impl ScriptedTransport {
    pub fn new(replies: Vec<Result<u16, NetworkError>>, fallback: u16) -> Rc<Self> {
        Rc::new(Self {
            replies: RefCell::new(replies.into()),
            fallback,
            sent: RefCell::new(Vec::new()),
        })
    }

    pub fn sent(&self) -> Vec<(String, Instant)> {
        self.sent.borrow().clone()
    }

    pub fn attempts(&self) -> usize {
        self.sent.borrow().len()
    }
}

impl CompletionTransport for ScriptedTransport {
    fn get(&self, url: &str) -> TransportFuture {
        self.sent.borrow_mut().push((url.to_owned(), Instant::now()));
        let reply = self.replies.borrow_mut().pop_front().unwrap_or(Ok(self.fallback));
        Box::pin(std::future::ready(reply))
    }
}
