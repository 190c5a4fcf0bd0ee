//! Scripted in-memory device for tests and demos

use super::{
    DeviceProvider, DeviceSession, FinalizeRequest, PrepareRequest, PreparedSlate,
    SignedOperation,
};
use crate::error::DeviceError;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Interaction observed by a [`MockDevice`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    Opened(String),
    AppOpened(String),
    PrepareSubscribed(String),
    Finalized(String),
    Closed(String),
}

enum PrepareScript {
    Items(Vec<Result<PreparedSlate, DeviceError>>),
    Pending,
}

#[derive(Default)]
struct MockState {
    events: Vec<DeviceEvent>,
    open_responses: VecDeque<Result<(), DeviceError>>,
    app_responses: VecDeque<Result<(), DeviceError>>,
    prepare_scripts: VecDeque<PrepareScript>,
    finalize_responses: VecDeque<Result<SignedOperation, DeviceError>>,
    last_prepare_request: Option<PrepareRequest>,
    last_finalize_request: Option<FinalizeRequest>,
}

/// Device whose answers are queued up front by the test
#[derive(Clone, Default)]
pub struct MockDevice {
    device_id: String,
    state: Arc<Mutex<MockState>>,
}

impl MockDevice {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_state<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> Option<R> {
        self.state.lock().ok().map(|mut state| f(&mut state))
    }

    pub fn push_open_response(&self, response: Result<(), DeviceError>) {
        self.with_state(|state| state.open_responses.push_back(response));
    }

    pub fn push_app_response(&self, response: Result<(), DeviceError>) {
        self.with_state(|state| state.app_responses.push_back(response));
    }

    /// Queue the items the next preparation stream yields, in order
    pub fn push_prepare_items(&self, items: Vec<Result<PreparedSlate, DeviceError>>) {
        self.with_state(|state| state.prepare_scripts.push_back(PrepareScript::Items(items)));
    }

    /// Queue a preparation stream that never yields
    pub fn push_pending_prepare(&self) {
        self.with_state(|state| state.prepare_scripts.push_back(PrepareScript::Pending));
    }

    pub fn push_finalize_response(&self, response: Result<SignedOperation, DeviceError>) {
        self.with_state(|state| state.finalize_responses.push_back(response));
    }

    pub fn events(&self) -> Vec<DeviceEvent> {
        self.with_state(|state| state.events.clone()).unwrap_or_default()
    }

    pub fn last_prepare_request(&self) -> Option<PrepareRequest> {
        self.with_state(|state| state.last_prepare_request.clone()).flatten()
    }

    pub fn last_finalize_request(&self) -> Option<FinalizeRequest> {
        self.with_state(|state| state.last_finalize_request.clone()).flatten()
    }

    fn record(&self, event: DeviceEvent) {
        self.with_state(|state| state.events.push(event));
    }

    fn unconfigured(what: &str) -> DeviceError {
        DeviceError::Unsupported(format!("mock {} response not configured", what))
    }
}

#[async_trait]
impl DeviceProvider for MockDevice {
    async fn open(&self, device_id: &str) -> Result<Arc<dyn DeviceSession>, DeviceError> {
        self.record(DeviceEvent::Opened(device_id.to_string()));
        let response = self
            .with_state(|state| state.open_responses.pop_front())
            .flatten()
            .unwrap_or(Ok(()));
        response?;
        Ok(Arc::new(MockDevice {
            device_id: device_id.to_string(),
            state: Arc::clone(&self.state),
        }))
    }
}

#[async_trait]
impl DeviceSession for MockDevice {
    fn device_id(&self) -> &str {
        &self.device_id
    }

    async fn open_app(&self, app_name: &str) -> Result<(), DeviceError> {
        self.record(DeviceEvent::AppOpened(app_name.to_string()));
        self.with_state(|state| state.app_responses.pop_front())
            .flatten()
            .unwrap_or(Ok(()))
    }

    fn prepare_transaction(
        &self,
        request: PrepareRequest,
    ) -> BoxStream<'static, Result<PreparedSlate, DeviceError>> {
        self.record(DeviceEvent::PrepareSubscribed(self.device_id.clone()));
        let script = self
            .with_state(|state| {
                state.last_prepare_request = Some(request);
                state.prepare_scripts.pop_front()
            })
            .flatten();
        match script {
            Some(PrepareScript::Items(items)) => stream::iter(items).boxed(),
            Some(PrepareScript::Pending) => stream::pending().boxed(),
            None => stream::iter(vec![Err(Self::unconfigured("prepare"))]).boxed(),
        }
    }

    async fn finalize_transaction(
        &self,
        request: FinalizeRequest,
    ) -> Result<SignedOperation, DeviceError> {
        self.record(DeviceEvent::Finalized(self.device_id.clone()));
        self.with_state(|state| {
            state.last_finalize_request = Some(request);
            state.finalize_responses.pop_front()
        })
        .flatten()
        .unwrap_or_else(|| Err(Self::unconfigured("finalize")))
    }

    async fn close(&self) {
        self.record(DeviceEvent::Closed(self.device_id.clone()));
    }
}
