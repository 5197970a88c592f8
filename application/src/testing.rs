//! Test doubles shared by the service and use case tests.

use crate::ports::agent_runtime::{AgentRuntime, AgentRuntimeError, TurnContext};
use crate::ports::connection::{Connection, DeliveryError};
use crate::ports::meeting_store::{MeetingStore, StoreError};
use crate::services::event_broker::EventSink;
use async_trait::async_trait;
use council_domain::{
    AgentId, ConnectionId, DomainEvent, MeetingId, Participant, Run, RunStatusKind,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{Notify, mpsc};

/// Connection that forwards frames into a channel, or fails on demand
pub(crate) struct TestConnection {
    id: ConnectionId,
    tx: mpsc::UnboundedSender<Arc<str>>,
    failing: AtomicBool,
}

impl TestConnection {
    pub(crate) fn new(id: &str) -> (Arc<Self>, mpsc::UnboundedReceiver<Arc<str>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = Self {
            id: ConnectionId::new(id),
            tx,
            failing: AtomicBool::new(false),
        };
        (Arc::new(conn), rx)
    }

    pub(crate) fn failing(id: &str) -> (Arc<Self>, mpsc::UnboundedReceiver<Arc<str>>) {
        let (conn, rx) = Self::new(id);
        conn.fail_from_now_on();
        (conn, rx)
    }

    pub(crate) fn fail_from_now_on(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl Connection for TestConnection {
    fn id(&self) -> &ConnectionId {
        &self.id
    }

    async fn send(&self, frame: Arc<str>) -> Result<(), DeliveryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DeliveryError::Closed);
        }
        self.tx.send(frame).map_err(|_| DeliveryError::Closed)
    }
}

/// Connection whose sends block until released, after the greeting
pub(crate) struct GatedConnection {
    inner: Arc<TestConnection>,
    greeted: AtomicBool,
    pub(crate) entered: Notify,
    pub(crate) release: Notify,
}

impl GatedConnection {
    pub(crate) fn new(id: &str) -> (Arc<Self>, mpsc::UnboundedReceiver<Arc<str>>) {
        let (inner, rx) = TestConnection::new(id);
        let conn = Self {
            inner,
            greeted: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        };
        (Arc::new(conn), rx)
    }
}

#[async_trait]
impl Connection for GatedConnection {
    fn id(&self) -> &ConnectionId {
        self.inner.id()
    }

    async fn send(&self, frame: Arc<str>) -> Result<(), DeliveryError> {
        if self.greeted.swap(true, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        self.inner.send(frame).await
    }
}

/// Event sink that records everything it is handed
#[derive(Default)]
pub(crate) struct RecordingSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl RecordingSink {
    pub(crate) fn events(&self) -> Vec<DomainEvent> {
        self.events.lock().unwrap().clone()
    }

    pub(crate) fn run_statuses(&self) -> Vec<RunStatusKind> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                DomainEvent::RunStatus(r) => Some(r.status),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn event_types(&self) -> Vec<String> {
        self.events()
            .iter()
            .map(|e| e.event_type().to_string())
            .collect()
    }
}

impl EventSink for RecordingSink {
    fn emit_event(&self, event: DomainEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Store with fixed seating that records saved runs
#[derive(Default)]
pub(crate) struct MockStore {
    seating: HashMap<MeetingId, Vec<Participant>>,
    pub(crate) saved: Mutex<Vec<Run>>,
}

impl MockStore {
    pub(crate) fn with_meeting(mut self, meeting_id: &str, participants: Vec<Participant>) -> Self {
        self.seating.insert(MeetingId::new(meeting_id), participants);
        self
    }
}

#[async_trait]
impl MeetingStore for MockStore {
    async fn load_participants(
        &self,
        meeting_id: &MeetingId,
    ) -> Result<Vec<Participant>, StoreError> {
        self.seating
            .get(meeting_id)
            .cloned()
            .ok_or_else(|| StoreError::MeetingNotFound(meeting_id.to_string()))
    }

    async fn save_run(&self, run: &Run) -> Result<(), StoreError> {
        self.saved.lock().unwrap().push(run.clone());
        Ok(())
    }
}

/// Runtime that echoes the speaker and records every context it receives
#[derive(Default)]
pub(crate) struct EchoRuntime {
    pub(crate) contexts: Mutex<Vec<TurnContext>>,
    pub(crate) fail: AtomicBool,
}

#[async_trait]
impl AgentRuntime for EchoRuntime {
    async fn invoke_agent(
        &self,
        agent_id: &AgentId,
        context: &TurnContext,
    ) -> Result<String, AgentRuntimeError> {
        self.contexts.lock().unwrap().push(context.clone());
        if self.fail.load(Ordering::SeqCst) {
            return Err(AgentRuntimeError::Unavailable("offline".into()));
        }
        Ok(format!("{} speaks in round {}", agent_id, context.round))
    }
}
