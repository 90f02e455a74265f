use rewarded_core::{ErrorCode, RewardedError};
use rewarded_sdk::{
    AdEventSink, AdapterEvent, AdapterLoadRequest, AdapterRegistry, RewardedAdAdapter,
};
use std::cell::RefCell;
use std::rc::Rc;

pub const FAKE_ADAPTER_CLASS: &str = "com.example.FakeRewardedVideo";
pub const SECOND_ADAPTER_CLASS: &str = "com.example.OtherRewardedVideo";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LoadBehaviour {
    /// Reports `Loaded` from inside `load`.
    #[default]
    Immediate,
    /// Waits for [`FakeAdapters::finish_load`].
    Deferred,
    /// Reports `LoadFailed` from inside `load`.
    Fail(ErrorCode),
    /// Returns an error from `load` itself.
    Reject,
}

#[derive(Debug, Default)]
struct Instance {
    class_name: String,
    request: Option<AdapterLoadRequest>,
    sink: Option<AdEventSink>,
    ready: bool,
    shows: u32,
    invalidated: bool,
}

#[derive(Debug, Default)]
struct State {
    instances: Vec<Instance>,
    load: LoadBehaviour,
    fail_show: bool,
}

/// Shared view over every fake adapter the manager has constructed.
#[derive(Clone, Debug, Default)]
pub struct FakeAdapters {
    state: Rc<RefCell<State>>,
}

impl FakeAdapters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, registry: AdapterRegistry, class_name: &'static str) -> AdapterRegistry {
        let handle = self.clone();
        registry.with(class_name, move || {
            let index = handle.push_instance(class_name);
            Box::new(FakeAdapter { handle: handle.clone(), index, class_name })
                as Box<dyn RewardedAdAdapter>
        })
    }

    pub fn set_load_behaviour(&self, behaviour: LoadBehaviour) {
        self.state.borrow_mut().load = behaviour;
    }

    /// Makes later `show` calls report `ShowFailed(VideoPlaybackError)`.
    pub fn set_fail_show(&self, fail: bool) {
        self.state.borrow_mut().fail_show = fail;
    }

    pub fn count(&self) -> usize {
        self.state.borrow().instances.len()
    }

    pub fn latest(&self) -> Option<usize> {
        self.count().checked_sub(1)
    }

    pub fn class_name(&self, index: usize) -> Option<String> {
        self.state.borrow().instances.get(index).map(|instance| instance.class_name.clone())
    }

    pub fn load_request(&self, index: usize) -> Option<AdapterLoadRequest> {
        self.state.borrow().instances.get(index).and_then(|instance| instance.request.clone())
    }

    pub fn shows(&self, index: usize) -> u32 {
        self.state.borrow().instances.get(index).map_or(0, |instance| instance.shows)
    }

    pub fn is_invalidated(&self, index: usize) -> bool {
        self.state.borrow().instances.get(index).is_some_and(|instance| instance.invalidated)
    }

    pub fn set_ready(&self, index: usize, ready: bool) {
        if let Some(instance) = self.state.borrow_mut().instances.get_mut(index) {
            instance.ready = ready;
        }
    }

    /// Posts an event through the sink the adapter was loaded with.
    pub fn emit(&self, index: usize, event: AdapterEvent) -> bool {
        let sink =
            self.state.borrow().instances.get(index).and_then(|instance| instance.sink.clone());
        sink.is_some_and(|sink| sink.emit(event))
    }

    pub fn finish_load(&self, index: usize) -> bool {
        self.set_ready(index, true);
        self.emit(index, AdapterEvent::Loaded)
    }

    fn push_instance(&self, class_name: &str) -> usize {
        let mut state = self.state.borrow_mut();
        state.instances.push(Instance { class_name: class_name.to_owned(), ..Instance::default() });
        state.instances.len() - 1
    }
}

struct FakeAdapter {
    handle: FakeAdapters,
    index: usize,
    class_name: &'static str,
}

impl FakeAdapter {
    fn with_instance<T>(&self, f: impl FnOnce(&mut Instance) -> T) -> Option<T> {
        self.handle.state.borrow_mut().instances.get_mut(self.index).map(f)
    }
}

impl RewardedAdAdapter for FakeAdapter {
    fn class_name(&self) -> &str {
        self.class_name
    }

    fn ad_network_id(&self) -> &str {
        "fake-network"
    }

    fn broadcast_identifier(&self) -> u64 {
        self.with_instance(|instance| instance.request.as_ref().map(|r| r.broadcast_identifier))
            .flatten()
            .unwrap_or_default()
    }

    fn load(
        &mut self,
        request: AdapterLoadRequest,
        events: AdEventSink,
    ) -> Result<(), RewardedError> {
        let behaviour = self.handle.state.borrow().load;
        log::debug!("fake adapter {} loading {}", self.index, request.ad_unit_id);
        self.with_instance(|instance| {
            instance.request = Some(request);
            instance.sink = Some(events.clone());
        });
        match behaviour {
            LoadBehaviour::Immediate => {
                self.with_instance(|instance| instance.ready = true);
                events.emit(AdapterEvent::Loaded);
            }
            LoadBehaviour::Deferred => {}
            LoadBehaviour::Fail(code) => {
                events.emit(AdapterEvent::LoadFailed(code));
            }
            LoadBehaviour::Reject => {
                return Err(RewardedError::AdapterConfiguration(
                    "fake adapter refused to load".to_owned(),
                ));
            }
        }
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.with_instance(|instance| instance.ready && !instance.invalidated).unwrap_or(false)
    }

    fn show(&mut self) -> Result<(), RewardedError> {
        let fail = self.handle.state.borrow().fail_show;
        let sink = self.with_instance(|instance| {
            instance.shows += 1;
            instance.sink.clone()
        });
        if fail {
            if let Some(sink) = sink.flatten() {
                sink.emit(AdapterEvent::ShowFailed(ErrorCode::VideoPlaybackError));
            }
        }
        Ok(())
    }

    fn invalidate(&mut self) {
        self.with_instance(|instance| {
            instance.invalidated = true;
            instance.ready = false;
        });
    }
}
