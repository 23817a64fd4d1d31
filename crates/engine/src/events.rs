//! The event emitter (spec §4.10) — lifecycle narration for observability.
//!
//! Emission is synchronous and must never block the orchestrator path, so
//! [`EventEmitter::emit`] takes `&self` and returns nothing: a sink that
//! wants to do real I/O should hand events to a channel and drain it on its
//! own task, buffering or dropping under backpressure.

use std::sync::{Arc, Mutex};

use uuid::Uuid;

/// Named lifecycle events, exactly the set in spec §4.10.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    WorkflowStart,
    WorkflowFinish,
    WorkflowStall,
    WorkflowCancelled,
    NodeStart,
    NodeRetry,
    NodeFallback,
    NodeFinish,
    NodeError,
}

#[derive(Debug, Clone)]
pub struct Event {
    pub kind: EventKind,
    pub run_id: Uuid,
    pub blueprint_id: String,
    pub node_id: Option<String>,
    pub attempt: Option<u32>,
    pub error: Option<String>,
}

impl Event {
    pub fn workflow(kind: EventKind, run_id: Uuid, blueprint_id: impl Into<String>) -> Self {
        Self {
            kind,
            run_id,
            blueprint_id: blueprint_id.into(),
            node_id: None,
            attempt: None,
            error: None,
        }
    }

    pub fn node(
        kind: EventKind,
        run_id: Uuid,
        blueprint_id: impl Into<String>,
        node_id: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            run_id,
            blueprint_id: blueprint_id.into(),
            node_id: Some(node_id.into()),
            attempt: None,
            error: None,
        }
    }

    pub fn with_attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

pub trait EventEmitter: Send + Sync {
    fn emit(&self, event: Event);
}

/// Default emitter: discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEmitter;

impl EventEmitter for NullEmitter {
    fn emit(&self, _event: Event) {}
}

/// Bounded-channel emitter: a non-blocking `try_send`, dropping the event
/// (rather than stalling the pipeline) if the sink is backed up.
pub struct ChannelEmitter {
    sender: tokio::sync::mpsc::Sender<Event>,
}

impl ChannelEmitter {
    pub fn new(capacity: usize) -> (Self, tokio::sync::mpsc::Receiver<Event>) {
        let (sender, receiver) = tokio::sync::mpsc::channel(capacity);
        (Self { sender }, receiver)
    }
}

impl EventEmitter for ChannelEmitter {
    fn emit(&self, event: Event) {
        if self.sender.try_send(event).is_err() {
            tracing::debug!("event sink backed up; dropping event");
        }
    }
}

/// In-memory emitter used by tests to assert on emitted event ordering.
#[derive(Clone, Default)]
pub struct RecordingEmitter {
    events: Arc<Mutex<Vec<Event>>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn kinds(&self) -> Vec<EventKind> {
        self.events.lock().unwrap().iter().map(|e| e.kind.clone()).collect()
    }
}

impl EventEmitter for RecordingEmitter {
    fn emit(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }
}
